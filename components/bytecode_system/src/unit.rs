//! Translation units, method references and code cursors
//!
//! A translation unit is an append-only list of method bodies. Bodies are
//! immutable once added and shared by reference, so a [`Method`] or a
//! [`MethodSeek`] cursor never copies instructions.

use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use log::debug;

use crate::instruction::{FunctionIndex, Instruction};

/// An append-only table of method bodies. Index 0 is the unit's main body.
#[derive(Default)]
pub struct TranslationUnit {
    methods: RefCell<Vec<Rc<[Instruction]>>>,
}

impl TranslationUnit {
    /// An empty unit.
    pub fn new() -> Self {
        Self::default()
    }

    /// A unit whose main body is `main`.
    pub fn with_main(main: Vec<Instruction>) -> Rc<Self> {
        let unit = Rc::new(Self::new());
        unit.push_method(main);
        unit
    }

    /// A unit built from several bodies, index 0 first.
    pub fn from_methods(methods: Vec<Vec<Instruction>>) -> Rc<Self> {
        let unit = Rc::new(Self::new());
        for body in methods {
            unit.push_method(body);
        }
        debug!("built translation unit with {} method(s)", unit.len());
        unit
    }

    /// Appends a body and returns its index.
    pub fn push_method(&self, body: Vec<Instruction>) -> FunctionIndex {
        let mut methods = self.methods.borrow_mut();
        let index = FunctionIndex(methods.len() as u32);
        methods.push(body.into());
        index
    }

    /// The body at `index`.
    pub fn method(&self, index: FunctionIndex) -> Option<Rc<[Instruction]>> {
        self.methods.borrow().get(index.0 as usize).cloned()
    }

    /// Number of bodies.
    pub fn len(&self) -> usize {
        self.methods.borrow().len()
    }

    /// Returns `true` when no body has been added.
    pub fn is_empty(&self) -> bool {
        self.methods.borrow().is_empty()
    }

    /// Snapshot of all bodies, index order.
    pub fn methods(&self) -> Vec<Rc<[Instruction]>> {
        self.methods.borrow().clone()
    }
}

impl fmt::Debug for TranslationUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TranslationUnit")
            .field("methods", &self.len())
            .finish()
    }
}

/// A (unit, index) pair naming one method body.
#[derive(Clone)]
pub struct Method {
    unit: Rc<TranslationUnit>,
    index: FunctionIndex,
}

impl Method {
    /// Names body `index` of `unit`.
    pub fn new(unit: Rc<TranslationUnit>, index: FunctionIndex) -> Self {
        Self { unit, index }
    }

    /// The owning unit.
    pub fn unit(&self) -> &Rc<TranslationUnit> {
        &self.unit
    }

    /// The body index.
    pub fn index(&self) -> FunctionIndex {
        self.index
    }

    /// The instructions, or `None` for an index past the end of the unit.
    pub fn code(&self) -> Option<Rc<[Instruction]>> {
        self.unit.method(self.index)
    }

    /// A cursor positioned at the first instruction.
    pub fn seek(&self) -> MethodSeek {
        MethodSeek {
            code: self.code().unwrap_or_else(|| Rc::from(Vec::new())),
            method: Some(self.clone()),
            pos: 0,
        }
    }
}

impl PartialEq for Method {
    fn eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.unit, &other.unit) && self.index == other.index
    }
}

impl fmt::Debug for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Method({:p}, {})", Rc::as_ptr(&self.unit), self.index)
    }
}

/// A position inside a method body. `pos` is the next instruction to run.
#[derive(Clone)]
pub struct MethodSeek {
    method: Option<Method>,
    code: Rc<[Instruction]>,
    pos: usize,
}

impl MethodSeek {
    /// A cursor over no code at all.
    pub fn empty() -> Self {
        Self {
            method: None,
            code: Rc::from(Vec::new()),
            pos: 0,
        }
    }

    /// A cursor over free-standing code.
    pub fn from_code(code: Rc<[Instruction]>) -> Self {
        Self {
            method: None,
            code,
            pos: 0,
        }
    }

    /// Returns `true` when every instruction has been consumed.
    pub fn at_end(&self) -> bool {
        self.pos >= self.code.len()
    }

    /// Returns the next instruction and advances past it.
    pub fn advance(&mut self) -> Option<&Instruction> {
        let inst = self.code.get(self.pos)?;
        self.pos += 1;
        Some(inst)
    }

    /// The next instruction without advancing.
    pub fn peek(&self) -> Option<&Instruction> {
        self.code.get(self.pos)
    }

    /// The method this cursor walks, if it came from one.
    pub fn method(&self) -> Option<&Method> {
        self.method.as_ref()
    }

    /// Index of the next instruction.
    pub fn position(&self) -> usize {
        self.pos
    }

    /// Length of the underlying body.
    pub fn len(&self) -> usize {
        self.code.len()
    }

    /// Returns `true` for an empty body.
    pub fn is_empty(&self) -> bool {
        self.code.is_empty()
    }
}

impl Default for MethodSeek {
    fn default() -> Self {
        Self::empty()
    }
}

impl fmt::Debug for MethodSeek {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MethodSeek")
            .field("method", &self.method)
            .field("pos", &self.pos)
            .field("len", &self.code.len())
            .finish()
    }
}
