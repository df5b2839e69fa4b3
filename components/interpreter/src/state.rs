//! The register file
//!
//! Registers are split three ways. [`IntState`] is everything a continuation
//! captures; [`TransientState`] is scratch that capture and restore discard;
//! [`ReadOnlyState`] is fixed once bootstrap finishes.

use std::rc::Rc;

use bytecode_system::{Method, MethodSeek, TranslationUnit};
use core_types::{Number, ProcessPtr, StreamPtr, Symbol, TraceFrame};
use memory_manager::ObjectPtr;

use crate::persistent::PList;
use crate::vm::Vm;
use crate::wind::WindFrame;

/// A host routine reachable through `CPP n`.
pub type NativeFn = Rc<dyn Fn(&mut Vm)>;

/// Persistent registers.
#[derive(Debug, Clone, Default)]
pub struct IntState {
    /// Lexical scopes
    pub lex: PList<ObjectPtr>,
    /// Dynamic scopes
    pub dyn_: PList<ObjectPtr>,
    /// Pending arguments
    pub arg: PList<ObjectPtr>,
    /// Scratch storage
    pub sto: PList<ObjectPtr>,
    /// Installed exception handlers
    pub hand: PList<ObjectPtr>,
    /// The cursor being executed
    pub cont: MethodSeek,
    /// Saved cursors
    pub stack: PList<MethodSeek>,
    /// Active wind frames, innermost first
    pub wind: PList<Rc<WindFrame>>,
    /// Current line
    pub line: i64,
    /// Current file
    pub file: String,
    /// Saved (line, file) pairs
    pub trace: PList<TraceFrame>,
    /// Translation units of the active frames
    pub trns: PList<Rc<TranslationUnit>>,
}

impl IntState {
    /// Calls `f` on every object these registers keep alive.
    pub fn visit(&self, f: &mut dyn FnMut(&ObjectPtr)) {
        for stack in [&self.lex, &self.dyn_, &self.arg, &self.sto, &self.hand] {
            for obj in stack.iter() {
                f(obj);
            }
        }
        for frame in self.wind.iter() {
            frame.visit(f);
        }
    }

    /// Saves the current (line, file) onto the backtrace.
    pub fn push_trace(&mut self) {
        self.trace.push(TraceFrame::new(self.line, self.file.clone()));
    }

    /// Restores (line, file) from the backtrace. Returns `false` when the
    /// backtrace is empty.
    pub fn pop_trace(&mut self) -> bool {
        match self.trace.pop() {
            Some(frame) => {
                self.line = frame.line;
                self.file = frame.file;
                true
            }
            None => false,
        }
    }

    /// Saves the current cursor and starts executing `next`.
    pub fn jump(&mut self, next: MethodSeek) {
        let prev = std::mem::replace(&mut self.cont, next);
        self.stack.push(prev);
    }

    /// Like [`IntState::jump`], but an exhausted cursor is dropped instead
    /// of saved, so loops built from jumps run in constant stack depth.
    pub fn tail_jump(&mut self, next: MethodSeek) {
        if self.cont.at_end() {
            self.cont = next;
        } else {
            self.jump(next);
        }
    }
}

/// Scratch registers.
#[derive(Debug, Clone)]
pub struct TransientState {
    /// General-purpose object register
    pub ptr: Option<ObjectPtr>,
    /// Receiver register
    pub slf: Option<ObjectPtr>,
    /// Result register
    pub ret: Option<ObjectPtr>,
    /// Error flag
    pub err0: bool,
    /// Secondary error flag
    pub err1: bool,
    /// Symbol register
    pub sym: Symbol,
    /// Number register
    pub num0: Number,
    /// Secondary number register
    pub num1: Number,
    /// String register
    pub str0: String,
    /// Secondary string register
    pub str1: String,
    /// Method register
    pub mthd: Option<Method>,
    /// Secondary method register
    pub mthdz: Option<Method>,
    /// Stream register
    pub strm: Option<StreamPtr>,
    /// Process register
    pub prcs: Option<ProcessPtr>,
    /// Boolean flag
    pub flag: bool,
}

impl Default for TransientState {
    fn default() -> Self {
        TransientState {
            ptr: None,
            slf: None,
            ret: None,
            err0: false,
            err1: false,
            sym: Symbol::EMPTY,
            num0: Number::default(),
            num1: Number::default(),
            str0: String::new(),
            str1: String::new(),
            mthd: None,
            mthdz: None,
            strm: None,
            prcs: None,
            flag: false,
        }
    }
}

impl TransientState {
    /// Calls `f` on the object registers that hold a value.
    pub fn visit(&self, f: &mut dyn FnMut(&ObjectPtr)) {
        for reg in [&self.ptr, &self.slf, &self.ret].into_iter().flatten() {
            f(reg);
        }
    }
}

/// Registers fixed after bootstrap.
pub struct ReadOnlyState {
    /// Native callback table
    pub natives: Vec<NativeFn>,
    /// Literal table, indexed by [`crate::Lit`]
    pub lit: Box<[ObjectPtr]>,
    /// Ground translation unit
    pub gtu: Rc<TranslationUnit>,
}

impl std::fmt::Debug for ReadOnlyState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ReadOnlyState")
            .field("natives", &self.natives.len())
            .field("lit", &self.lit)
            .field("gtu", &self.gtu)
            .finish()
    }
}
