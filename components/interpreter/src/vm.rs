//! The execution engine
//!
//! [`Vm`] owns the heap, the symbol table and the three register groups.
//! Execution is a flat loop: take the next instruction from `%cont`, run it,
//! and when the cursor runs dry pop the next one off `%stack`. Calls,
//! returns, continuation jumps and error raising are all expressed as
//! cursor pushes, so the host stack never grows with the program's.

use std::fmt;
use std::rc::Rc;

use bytecode_system::{Instruction, Method, Opcode, TranslationUnit};
use core_types::{ErrorKind, Number, Protection, StreamPtr, Symbol, SymbolTable, TraceFrame};
use log::{debug, log, trace, Level};
use memory_manager::{collect, Collector, Heap, ObjectPtr, Prim};

use crate::config::VmConfig;
use crate::dispatch;
use crate::dump::StateDump;
use crate::error::VmError;
use crate::ground::{self, Gtu};
use crate::literals::{self, Bootstrap, Lit};
use crate::natives;
use crate::persistent::PList;
use crate::state::{IntState, NativeFn, ReadOnlyState, TransientState};

/// Why the engine was hard-killed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HaltReason {
    /// The terminate native ran, or a lookup fell through every fallback
    Terminated,
    /// The panic native ran
    Panicked,
}

/// A prototype-object register machine.
///
/// # Example
///
/// ```
/// use bytecode_system::{asm, TranslationUnit};
/// use interpreter::Vm;
///
/// let mut vm = Vm::new().unwrap();
/// let code = asm::assemble("INT 7\nYLDC 5 %ptr\nLOAD %num0\nMOV %ptr %ret\nUNTR\n").unwrap();
/// vm.eval(TranslationUnit::from_methods(code));
/// vm.run().unwrap();
/// assert_eq!(vm.ret_number(), Some(7i64.into()));
/// ```
pub struct Vm {
    pub(crate) heap: Heap,
    pub(crate) symbols: SymbolTable,
    pub(crate) state: IntState,
    pub(crate) trans: TransientState,
    pub(crate) reader: ReadOnlyState,
    pub(crate) collector: Collector,
    pub(crate) global: ObjectPtr,
    pub(crate) halt: Option<HaltReason>,
    pub(crate) trace_markers: Vec<PList<TraceFrame>>,
    pub(crate) config: VmConfig,
    pub(crate) steps: u64,
    pub(crate) last_dump: Option<StateDump>,
    host: Rc<TranslationUnit>,
}

impl Vm {
    /// An engine with the default configuration.
    pub fn new() -> Result<Self, VmError> {
        Self::with_config(VmConfig::default())
    }

    /// Bootstraps the object graph and the ground unit.
    ///
    /// The global object ends up as the only lexical and dynamic scope.
    pub fn with_config(config: VmConfig) -> Result<Self, VmError> {
        let heap = Heap::new();
        let mut symbols = SymbolTable::new();
        let Bootstrap { lit, global } = literals::bootstrap(&heap, &mut symbols);
        let gtu = ground::build()?;

        let mut state = IntState::default();
        state.lex.push(global.clone());
        state.dyn_.push(global.clone());

        let mut collector = Collector::with_settings(config.gc_countdown, config.gc_limit);
        collector.set_tracing(config.gc_tracing);

        debug!(
            "engine bootstrapped: {} object(s), {} symbol(s)",
            heap.live_count(),
            symbols.len()
        );

        Ok(Vm {
            heap,
            symbols,
            state,
            trans: TransientState::default(),
            reader: ReadOnlyState {
                natives: natives::table(),
                lit,
                gtu,
            },
            collector,
            global,
            halt: None,
            trace_markers: Vec::new(),
            config,
            steps: 0,
            last_dump: None,
            host: Rc::new(TranslationUnit::new()),
        })
    }

    // ---- entry points ----

    /// Enters `unit` the way a source file is entered.
    ///
    /// Method 0 runs as a full call frame in a fresh scope cloned from the
    /// global object, so it must finish with `RET`.
    pub fn load(&mut self, unit: Rc<TranslationUnit>) {
        let main = Method::new(Rc::clone(&unit), Gtu::Empty.index());
        let scope = self.heap.clone_object(&self.global);
        let again = self.method_object(main.clone(), &self.global);
        let caller = self.state.lex.peek().cloned();

        scope.put_protected(Symbol::SELF, scope.clone(), Protection::ASSIGN | Protection::DELETE);
        scope.put_protected(Symbol::AGAIN, again, Protection::ASSIGN | Protection::DELETE);
        if let Some(caller) = caller {
            scope.put_protected(Symbol::CALLER, caller, Protection::empty());
        }
        self.state.lex.push(scope);
        match self.state.dyn_.peek().cloned() {
            Some(top) => self.state.dyn_.push(self.heap.clone_object(&top)),
            None => self.trans.err0 = true,
        }
        self.state.push_trace();
        self.state.trns.push(unit);
        self.state.jump(main.seek());
        debug!("loaded translation unit with {} method(s)", main.unit().len());
    }

    /// Enters `unit` in the current scope. Method 0 must finish with `UNTR`.
    pub fn eval(&mut self, unit: Rc<TranslationUnit>) {
        let main = Method::new(Rc::clone(&unit), Gtu::Empty.index());
        self.state.trns.push(unit);
        self.state.jump(main.seek());
    }

    /// Runs one instruction. Returns `false` once there is nothing left.
    pub fn step(&mut self) -> bool {
        loop {
            if let Some(inst) = self.state.cont.advance().cloned() {
                trace!("{}", inst);
                dispatch::execute(self, &inst);
                self.steps += 1;
                self.gc_tick();
                return true;
            }
            match self.state.stack.pop() {
                Some(next) => self.state.cont = next,
                None => return false,
            }
        }
    }

    /// Returns `true` when the cursor is exhausted and no cursor is saved.
    pub fn is_idling(&self) -> bool {
        self.state.cont.at_end() && self.state.stack.is_empty()
    }

    /// Runs until idle.
    ///
    /// # Errors
    ///
    /// [`VmError::StepLimit`] when `max_steps` instructions ran first;
    /// [`VmError::Terminated`] or [`VmError::Panicked`] after a hard kill.
    pub fn run(&mut self) -> Result<(), VmError> {
        let start = self.steps;
        while self.step() {
            if let Some(max) = self.config.max_steps {
                if self.steps - start >= max && !self.is_idling() {
                    return Err(VmError::StepLimit(max));
                }
            }
        }
        match self.halt.take() {
            Some(HaltReason::Terminated) => Err(VmError::Terminated),
            Some(HaltReason::Panicked) => Err(VmError::Panicked),
            None => Ok(()),
        }
    }

    /// Abandons all pending code. The first reason given sticks until the
    /// next [`Vm::run`] reports it.
    pub fn hard_kill(&mut self, reason: HaltReason) {
        debug!("hard kill ({:?}) at {}:{}", reason, self.state.file, self.state.line);
        self.state.cont = Gtu::Empty.seek(&self.reader.gtu);
        self.state.stack = PList::new();
        self.halt.get_or_insert(reason);
    }

    /// Logs every register at `level`, keeps the dump for
    /// [`Vm::last_dump`], then hard-kills.
    pub fn fatal(&mut self, level: Level, what: &str, reason: HaltReason) {
        let dump = self.dump_state();
        match serde_json::to_string_pretty(&dump) {
            Ok(json) => log!(level, "{} at {}:{}\n{}", what, self.state.file, self.state.line, json),
            Err(_) => log!(level, "{} at {}:{}\n{:?}", what, self.state.file, self.state.line, dump),
        }
        self.last_dump = Some(dump);
        self.hard_kill(reason);
    }

    // ---- memory ----

    /// Runs a full trace from every register and the literal table.
    /// Returns the number of objects freed.
    pub fn collect_garbage(&mut self) -> usize {
        let mut roots: Vec<ObjectPtr> = Vec::new();
        {
            let mut keep = |obj: &ObjectPtr| roots.push(obj.clone());
            self.state.visit(&mut keep);
            self.trans.visit(&mut keep);
        }
        roots.extend(self.reader.lit.iter().cloned());
        roots.push(self.global.clone());

        let freed = collect(&self.heap, roots.iter());
        drop(roots);
        self.collector.record(freed, self.heap.live_count());
        freed
    }

    fn gc_tick(&mut self) {
        let heap = &self.heap;
        if self.collector.tick(|| heap.live_count()) {
            self.collect_garbage();
        }
    }

    // ---- error raising ----

    /// Raises a clone of `err.<kind>` whose `message` is `msg`.
    pub fn throw_error(&mut self, kind: ErrorKind, msg: &str) {
        let message = self.garnish_string(msg);
        self.trans.sym = self.symbols.intern(kind.name());
        self.trans.ret = Some(message);
        self.state.jump(Gtu::ErrorMessage.seek(&self.reader.gtu));
    }

    /// Raises a clone of `err.<kind>`.
    pub fn throw_error_bare(&mut self, kind: ErrorKind) {
        self.trans.sym = self.symbols.intern(kind.name());
        self.state.jump(Gtu::Error.seek(&self.reader.gtu));
    }

    /// Raises `obj` after attaching a backtrace to it.
    pub fn throw_object(&mut self, obj: ObjectPtr) {
        self.trans.slf = Some(obj);
        self.state.jump(Gtu::ThrowObj.seek(&self.reader.gtu));
    }

    // ---- garnishing ----

    /// A literal table entry.
    pub fn lit(&self, lit: Lit) -> ObjectPtr {
        self.reader.lit[lit.index()].clone()
    }

    /// A new number object.
    pub fn garnish_number(&self, value: impl Into<Number>) -> ObjectPtr {
        let obj = self.heap.clone_object(&self.lit(Lit::Number));
        obj.set_prim(Prim::Number(value.into()));
        obj
    }

    /// A new string object.
    pub fn garnish_string(&self, value: impl Into<String>) -> ObjectPtr {
        let obj = self.heap.clone_object(&self.lit(Lit::String));
        obj.set_prim(Prim::Str(value.into()));
        obj
    }

    /// A new symbol object.
    pub fn garnish_symbol(&self, sym: Symbol) -> ObjectPtr {
        let obj = self.heap.clone_object(&self.lit(Lit::Symbol));
        obj.set_prim(Prim::Symbol(sym));
        obj
    }

    /// `True` or `False`.
    pub fn garnish_bool(&self, value: bool) -> ObjectPtr {
        self.lit(if value { Lit::True } else { Lit::False })
    }

    /// `Nil`.
    pub fn garnish_nil(&self) -> ObjectPtr {
        self.lit(Lit::Nil)
    }

    /// A new stream object cloned from `Stream`.
    pub fn garnish_stream(&mut self, stream: StreamPtr) -> ObjectPtr {
        let proto = self
            .global
            .get(self.symbols.intern("Stream"))
            .unwrap_or_else(|| self.lit(Lit::Object));
        let obj = self.heap.clone_object(&proto);
        obj.set_prim(Prim::Stream(stream));
        obj
    }

    /// An array object holding `items` at keys 1, 3, 5, ...
    pub fn garnish_array(&self, items: Vec<ObjectPtr>) -> ObjectPtr {
        let arr = self.heap.clone_object(&self.lit(Lit::Array));
        let len = items.len() as i64;
        for (i, item) in items.into_iter().enumerate() {
            arr.put_protected(Symbol::natural(2 * i as i64 + 1), item, Protection::empty());
        }
        arr.put_protected(Symbol::LOWER_BOUND, self.garnish_number(0i64), Protection::empty());
        arr.put_protected(Symbol::UPPER_BOUND, self.garnish_number(len), Protection::empty());
        arr
    }

    /// A method object over `method` closing over `closure`.
    pub fn method_object(&self, method: Method, closure: &ObjectPtr) -> ObjectPtr {
        let obj = self.heap.clone_object(&self.lit(Lit::Method));
        obj.set_prim(Prim::Method(method));
        obj.put_protected(Symbol::CLOSURE, closure.clone(), Protection::empty());
        obj
    }

    /// Compiles `code` into a host-owned method closing over the global
    /// object. A trailing `RET` is appended.
    pub fn define_method(&mut self, mut code: Vec<Instruction>) -> Result<ObjectPtr, VmError> {
        code.push(Instruction::bare(Opcode::Ret)?);
        let index = self.host.push_method(code);
        let method = Method::new(Rc::clone(&self.host), index);
        Ok(self.method_object(method, &self.global))
    }

    /// Appends a native and returns its `CPP` index.
    pub fn register_native(&mut self, native: impl Fn(&mut Vm) + 'static) -> usize {
        let native: NativeFn = Rc::new(native);
        self.reader.natives.push(native);
        self.reader.natives.len() - 1
    }

    /// Binds `argv` on the global object to an array of strings.
    pub fn bind_argv(&mut self, args: &[String]) {
        let items = args.iter().map(|a| self.garnish_string(a.as_str())).collect();
        let argv = self.garnish_array(items);
        let sym = self.symbols.intern("argv");
        self.global.put_protected(sym, argv, Protection::empty());
    }

    // ---- inspection ----

    /// Interns `name`.
    pub fn intern(&mut self, name: &str) -> Symbol {
        self.symbols.intern(name)
    }

    /// The symbol table.
    pub fn symbols(&self) -> &SymbolTable {
        &self.symbols
    }

    /// A serializable copy of every register.
    pub fn dump_state(&self) -> StateDump {
        StateDump::capture(self)
    }

    /// The register dump taken by the most recent fatal fault.
    pub fn last_dump(&self) -> Option<&StateDump> {
        self.last_dump.as_ref()
    }

    /// The heap.
    pub fn heap(&self) -> &Heap {
        &self.heap
    }

    /// The global object.
    pub fn global(&self) -> &ObjectPtr {
        &self.global
    }

    /// `%ret`.
    pub fn ret(&self) -> Option<&ObjectPtr> {
        self.trans.ret.as_ref()
    }

    /// The number primitive of `%ret`, if any.
    pub fn ret_number(&self) -> Option<Number> {
        match self.trans.ret.as_ref()?.prim() {
            Prim::Number(n) => Some(n),
            _ => None,
        }
    }

    /// `%err0`.
    pub fn err0(&self) -> bool {
        self.trans.err0
    }

    /// Persistent registers.
    pub fn state(&self) -> &IntState {
        &self.state
    }

    /// Scratch registers.
    pub fn transient(&self) -> &TransientState {
        &self.trans
    }

    /// Scratch registers, for embedders priming a call.
    pub fn transient_mut(&mut self) -> &mut TransientState {
        &mut self.trans
    }

    /// The collector's pacing state.
    pub fn collector(&self) -> &Collector {
        &self.collector
    }

    /// Instructions executed so far.
    pub fn steps(&self) -> u64 {
        self.steps
    }

    /// Active configuration.
    pub fn config(&self) -> &VmConfig {
        &self.config
    }
}

impl fmt::Debug for Vm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Vm")
            .field("steps", &self.steps)
            .field("live", &self.heap.live_count())
            .field("cont", &self.state.cont)
            .field("halt", &self.halt)
            .finish()
    }
}
