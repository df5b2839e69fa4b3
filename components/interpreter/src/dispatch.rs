//! Instruction semantics
//!
//! [`execute`] runs one instruction against the engine. Local faults (a
//! missing operand register, an empty stack, a primitive of the wrong kind)
//! set `%err0` and leave everything else alone; the program decides whether
//! to raise with `THROQ` or `THROA`.

use std::rc::Rc;

use bytecode_system::{Instruction, Method, MethodSeek, Opcode, Reg};
use core_types::{ArithOp, ErrorKind, Number, Protection, Symbol, TraceFrame};
use log::{error, Level};
use memory_manager::{lookup, ObjectPtr, Prim};

use crate::continuation::Snapshot;
use crate::ground::Gtu;
use crate::literals::Lit;
use crate::persistent::PList;
use crate::state::{IntState, TransientState};
use crate::vm::{HaltReason, Vm};
use crate::wind::{resolve_thunks, Thunk, WindFrame};

fn get_object(trans: &TransientState, reg: Reg) -> Option<ObjectPtr> {
    match reg {
        Reg::Ptr => trans.ptr.clone(),
        Reg::Slf => trans.slf.clone(),
        Reg::Ret => trans.ret.clone(),
        _ => None,
    }
}

fn set_object(trans: &mut TransientState, reg: Reg, value: Option<ObjectPtr>) -> bool {
    let slot = match reg {
        Reg::Ptr => &mut trans.ptr,
        Reg::Slf => &mut trans.slf,
        Reg::Ret => &mut trans.ret,
        _ => return false,
    };
    *slot = value;
    true
}

fn stack(state: &mut IntState, reg: Reg) -> Option<&mut PList<ObjectPtr>> {
    match reg {
        Reg::Lex => Some(&mut state.lex),
        Reg::Dyn => Some(&mut state.dyn_),
        Reg::Arg => Some(&mut state.arg),
        Reg::Sto => Some(&mut state.sto),
        Reg::Hand => Some(&mut state.hand),
        _ => None,
    }
}

fn method_of(obj: &ObjectPtr) -> Option<Method> {
    match obj.prim() {
        Prim::Method(m) => Some(m),
        _ => None,
    }
}

fn seek_of(method: Option<&Method>) -> MethodSeek {
    method.map(Method::seek).unwrap_or_default()
}

/// Runs `inst`.
pub(crate) fn execute(vm: &mut Vm, inst: &Instruction) {
    let ok = match inst.opcode() {
        Opcode::Mov => mov(vm, inst),
        Opcode::Push => push(vm, inst),
        Opcode::Pop => pop(vm, inst, true),
        Opcode::Peek => pop(vm, inst, false),
        Opcode::Getl | Opcode::Getd => {
            let top = if inst.opcode() == Opcode::Getl {
                vm.state.lex.peek().cloned()
            } else {
                vm.state.dyn_.peek().cloned()
            };
            match (top, inst.reg(0)) {
                (Some(top), Some(r)) => set_object(&mut vm.trans, r, Some(top)),
                _ => false,
            }
        }
        Opcode::Eswap => {
            std::mem::swap(&mut vm.trans.err0, &mut vm.trans.err1);
            true
        }
        Opcode::Eclr => {
            vm.trans.err0 = false;
            true
        }
        Opcode::Eset => {
            vm.trans.err0 = true;
            true
        }
        Opcode::Sym => match inst.string(0) {
            Some(name) => {
                vm.trans.sym = vm.symbols.intern(name);
                true
            }
            None => false,
        },
        Opcode::Symn => match inst.long(0) {
            Some(n) => {
                vm.trans.sym = Symbol::from_index(n);
                true
            }
            None => false,
        },
        Opcode::Num => set_num0(vm, inst.string(0).and_then(Number::parse_integer)),
        Opcode::Float => set_num0(vm, inst.string(0).and_then(Number::parse_float)),
        Opcode::Cmplx => {
            let parsed = match (inst.string(0), inst.string(1)) {
                (Some(re), Some(im)) => Number::complex(re, im),
                _ => None,
            };
            set_num0(vm, parsed)
        }
        Opcode::Int => set_num0(vm, inst.long(0).map(Number::from)),
        Opcode::Nswap => {
            std::mem::swap(&mut vm.trans.num0, &mut vm.trans.num1);
            true
        }
        Opcode::Str => match inst.string(0) {
            Some(s) => {
                vm.trans.str0 = s.to_string();
                true
            }
            None => false,
        },
        Opcode::Sswap => {
            std::mem::swap(&mut vm.trans.str0, &mut vm.trans.str1);
            true
        }
        Opcode::Adds => {
            let tail = vm.trans.str1.clone();
            vm.trans.str0.push_str(&tail);
            true
        }
        Opcode::Call => call(vm, inst.long(0).unwrap_or(0), true),
        Opcode::Xcall0 => call(vm, inst.long(0).unwrap_or(0), false),
        Opcode::Xcall => {
            if let Some(method) = vm.trans.ptr.as_ref().and_then(method_of) {
                vm.state.trns.push(Rc::clone(method.unit()));
                vm.state.jump(method.seek());
            }
            true
        }
        Opcode::Ret => ret(vm),
        Opcode::Clone => match vm.trans.slf.clone() {
            Some(slf) => {
                vm.trans.ret = Some(vm.heap.clone_object(&slf));
                true
            }
            None => false,
        },
        Opcode::Rtrv => retrieve(vm),
        Opcode::Rtrvd => match vm.trans.slf.as_ref().and_then(|s| s.get(vm.trans.sym)) {
            Some(value) => {
                vm.trans.ret = Some(value);
                true
            }
            None => false,
        },
        Opcode::Expd => inst.reg(0).map_or(false, |r| expand(vm, r)),
        Opcode::Load => inst.reg(0).map_or(false, |r| load(vm, r)),
        Opcode::Mthd => match (vm.state.trns.peek(), inst.function(0)) {
            (Some(unit), Some(index)) => {
                vm.trans.mthd = Some(Method::new(Rc::clone(unit), index));
                true
            }
            _ => false,
        },
        Opcode::Mswap => {
            std::mem::swap(&mut vm.trans.mthd, &mut vm.trans.mthdz);
            true
        }
        Opcode::Setf => set_field(vm),
        Opcode::Del => delete_field(vm),
        Opcode::Cpp => {
            let native = inst
                .long(0)
                .and_then(|n| usize::try_from(n).ok())
                .and_then(|n| vm.reader.natives.get(n).cloned());
            match native {
                Some(native) => {
                    (*native)(vm);
                    true
                }
                None => false,
            }
        }
        Opcode::Bol => {
            vm.trans.ret = Some(vm.garnish_bool(vm.trans.flag));
            true
        }
        Opcode::Test => {
            vm.trans.flag = vm.trans.slf == vm.trans.ptr;
            true
        }
        Opcode::Branch => {
            let target = if vm.trans.flag {
                seek_of(vm.trans.mthd.as_ref())
            } else {
                seek_of(vm.trans.mthdz.as_ref())
            };
            vm.state.tail_jump(target);
            true
        }
        Opcode::Goto => {
            let target = seek_of(vm.trans.mthd.as_ref());
            vm.state.tail_jump(target);
            true
        }
        Opcode::Ccall => match vm.trans.slf.clone() {
            Some(slf) => {
                slf.set_prim(Snapshot::capture(&vm.state).into_prim());
                vm.state.arg.push(slf);
                vm.state.jump(Gtu::CallOne.seek(&vm.reader.gtu));
                true
            }
            None => false,
        },
        Opcode::Cgoto => resume(vm, false),
        Opcode::Cret => resume(vm, true),
        Opcode::Wnd => wind(vm),
        Opcode::Unwnd => vm.state.wind.pop().is_some(),
        Opcode::Throw => throw(vm),
        Opcode::Throq => {
            if vm.trans.err0 {
                vm.state.jump(Gtu::Throw.seek(&vm.reader.gtu));
            }
            true
        }
        Opcode::Throa => {
            if vm.trans.err0 {
                let msg = inst.string(0).unwrap_or_default().to_string();
                vm.throw_error(ErrorKind::TypeError, &msg);
            }
            true
        }
        Opcode::Arith => {
            let result = inst
                .long(0)
                .ok_or(())
                .and_then(|code| ArithOp::from_code(code).map_err(|_| ()))
                .and_then(|op| vm.trans.num0.apply(op, &vm.trans.num1).map_err(|_| ()));
            match result {
                Ok(n) => {
                    vm.trans.num0 = n;
                    true
                }
                Err(()) => false,
            }
        }
        Opcode::Locfn => match inst.string(0) {
            Some(file) => {
                vm.state.file = file.to_string();
                true
            }
            None => false,
        },
        Opcode::Locln => match inst.long(0) {
            Some(line) => {
                vm.state.line = line;
                true
            }
            None => false,
        },
        Opcode::Locrt => {
            backtrace(vm);
            true
        }
        Opcode::Nret => {
            vm.state.trace.push(TraceFrame::sentinel());
            vm.state.jump(Gtu::Return.seek(&vm.reader.gtu));
            true
        }
        Opcode::Untr => vm.state.trns.pop().is_some(),
        Opcode::Yld | Opcode::Yldc => {
            let literal = inst
                .long(0)
                .and_then(|i| usize::try_from(i).ok())
                .and_then(|i| vm.reader.lit.get(i).cloned());
            match (literal, inst.reg(1)) {
                (Some(obj), Some(r)) => {
                    let obj = if inst.opcode() == Opcode::Yldc {
                        vm.heap.clone_object(&obj)
                    } else {
                        obj
                    };
                    set_object(&mut vm.trans, r, Some(obj))
                }
                _ => false,
            }
        }
        Opcode::Arr => array(vm, inst.long(0).unwrap_or(0)),
        Opcode::Dict => dict(vm, inst.long(0).unwrap_or(0)),
        Opcode::Xxx => marker(vm, inst.long(0).unwrap_or(-1)),
    };
    if !ok {
        vm.trans.err0 = true;
    }
}

fn set_num0(vm: &mut Vm, value: Option<Number>) -> bool {
    match value {
        Some(n) => {
            vm.trans.num0 = n;
            true
        }
        None => false,
    }
}

fn mov(vm: &mut Vm, inst: &Instruction) -> bool {
    match (inst.reg(0), inst.reg(1)) {
        (Some(src), Some(dst)) => {
            let value = get_object(&vm.trans, src);
            set_object(&mut vm.trans, dst, value)
        }
        _ => false,
    }
}

fn push(vm: &mut Vm, inst: &Instruction) -> bool {
    let (Some(r), Some(s)) = (inst.reg(0), inst.reg(1)) else {
        return false;
    };
    let (Some(value), Some(list)) = (get_object(&vm.trans, r), stack(&mut vm.state, s)) else {
        return false;
    };
    list.push(value);
    true
}

/// `POP` when `remove`, `PEEK` otherwise.
fn pop(vm: &mut Vm, inst: &Instruction, remove: bool) -> bool {
    let (Some(r), Some(s)) = (inst.reg(0), inst.reg(1)) else {
        return false;
    };
    let Some(list) = stack(&mut vm.state, s) else {
        return false;
    };
    let value = if remove { list.pop() } else { list.peek().cloned() };
    match value {
        Some(value) => set_object(&mut vm.trans, r, Some(value)),
        None => false,
    }
}

/// `CALL n` and `XCALL0 n`.
///
/// A method object (a method primitive plus a direct `closure` slot) gets a
/// fresh frame: a clone of the current dynamic scope, a clone of its closure
/// as the lexical scope with `self`, `again` and `caller` bound, a backtrace
/// entry and `$1..$n` popped from `%arg`, last argument first. Anything else
/// is its own result and the arguments are discarded.
fn call(vm: &mut Vm, args: i64, enter: bool) -> bool {
    let target = vm.trans.ptr.clone();
    let method = target.as_ref().and_then(method_of);
    let closure = target.as_ref().and_then(|t| t.get(Symbol::CLOSURE));
    let (Some(target), Some(method), Some(closure)) = (target, method, closure) else {
        for _ in 0..args {
            vm.state.arg.pop();
        }
        vm.trans.ret = vm.trans.ptr.clone();
        return true;
    };

    let mut ok = true;
    match vm.state.dyn_.peek().cloned() {
        Some(top) => {
            let frame = vm.heap.clone_object(&top);
            vm.state.dyn_.push(frame);
        }
        None => ok = false,
    }

    let caller = vm.state.lex.peek().cloned();
    let scope = vm.heap.clone_object(&closure);
    let bound = Protection::ASSIGN | Protection::DELETE;
    let slf = vm.trans.slf.clone().unwrap_or_else(|| vm.lit(Lit::Nil));
    scope.put_protected(Symbol::SELF, slf, bound);
    scope.put_protected(Symbol::AGAIN, target, bound);
    if let Some(caller) = caller {
        scope.put_protected(Symbol::CALLER, caller, Protection::empty());
    }
    vm.state.lex.push(scope);
    vm.state.push_trace();

    if let Some(frame) = vm.state.dyn_.peek().cloned() {
        for index in (1..=args).rev() {
            let Some(arg) = vm.state.arg.pop() else {
                ok = false;
                break;
            };
            let sym = vm.symbols.argument(index as usize);
            frame.put_protected(sym, arg, Protection::empty());
        }
    }

    if enter {
        vm.state.trns.push(Rc::clone(method.unit()));
        vm.state.jump(method.seek());
    }
    ok
}

fn ret(vm: &mut Vm) -> bool {
    let lex = vm.state.lex.pop().is_some();
    let dyn_ = vm.state.dyn_.pop().is_some();
    let trace = vm.state.pop_trace();
    let trns = vm.state.trns.pop().is_some();
    lex && dyn_ && trace && trns
}

/// `RTRV`: `%slf.%sym`, then `%slf.missing`, then `meta.missed` from the
/// lexical scope, then termination.
fn retrieve(vm: &mut Vm) -> bool {
    let Some(slf) = vm.trans.slf.clone() else {
        return false;
    };
    let sym = vm.trans.sym;
    if let Some(value) = lookup(&slf, sym) {
        vm.trans.ret = Some(value);
        return true;
    }
    if let Some(missing) = lookup(&slf, Symbol::MISSING) {
        vm.trans.ret = Some(missing);
        vm.state.jump(Gtu::Missing.seek(&vm.reader.gtu));
        return true;
    }
    let meta = vm
        .state
        .lex
        .peek()
        .and_then(|lex| lookup(lex, Symbol::META));
    let missed = meta.as_ref().and_then(|m| lookup(m, Symbol::MISSED));
    match (meta, missed) {
        (Some(meta), Some(missed)) => {
            vm.trans.slf = Some(meta);
            vm.trans.ptr = Some(missed);
            vm.state.jump(Gtu::CallZero.seek(&vm.reader.gtu));
        }
        _ => {
            let what = format!(
                "no slot `{}` on {:?} and no `missing` or `missed` fallback",
                vm.symbols.name(sym),
                slf
            );
            vm.fatal(Level::Error, &what, HaltReason::Terminated);
        }
    }
    true
}

/// `EXPD r`: `%ptr`'s primitive into `r`.
fn expand(vm: &mut Vm, reg: Reg) -> bool {
    let Some(prim) = vm.trans.ptr.as_ref().map(ObjectPtr::prim) else {
        return false;
    };
    let t = &mut vm.trans;
    match (reg, prim) {
        (Reg::Sym, Prim::Symbol(s)) => t.sym = s,
        (Reg::Num0, Prim::Number(n)) => t.num0 = n,
        (Reg::Num1, Prim::Number(n)) => t.num1 = n,
        (Reg::Str0, Prim::Str(s)) => t.str0 = s,
        (Reg::Str1, Prim::Str(s)) => t.str1 = s,
        (Reg::Mthd, Prim::Method(m)) => t.mthd = Some(m),
        (Reg::Mthdz, Prim::Method(m)) => t.mthdz = Some(m),
        (Reg::Strm, Prim::Stream(s)) => t.strm = Some(s),
        (Reg::Prcs, Prim::Process(p)) => t.prcs = Some(p),
        _ => return false,
    }
    true
}

/// `LOAD r`: `r` into `%ptr`'s primitive.
fn load(vm: &mut Vm, reg: Reg) -> bool {
    let t = &vm.trans;
    let Some(ptr) = t.ptr.as_ref() else {
        return false;
    };
    let prim = match reg {
        Reg::Sym => Prim::Symbol(t.sym),
        Reg::Num0 => Prim::Number(t.num0.clone()),
        Reg::Num1 => Prim::Number(t.num1.clone()),
        Reg::Str0 => Prim::Str(t.str0.clone()),
        Reg::Str1 => Prim::Str(t.str1.clone()),
        Reg::Mthd => match &t.mthd {
            Some(m) => Prim::Method(m.clone()),
            None => return false,
        },
        Reg::Mthdz => match &t.mthdz {
            Some(m) => Prim::Method(m.clone()),
            None => return false,
        },
        Reg::Strm => match &t.strm {
            Some(s) => Prim::Stream(Rc::clone(s)),
            None => return false,
        },
        Reg::Prcs => match &t.prcs {
            Some(p) => Prim::Process(Rc::clone(p)),
            None => return false,
        },
        _ => return false,
    };
    ptr.set_prim(prim);
    true
}

fn set_field(vm: &mut Vm) -> bool {
    let (Some(slf), Some(ptr)) = (vm.trans.slf.clone(), vm.trans.ptr.clone()) else {
        return false;
    };
    if let Err(e) = slf.put(vm.trans.sym, ptr) {
        vm.throw_error(ErrorKind::ProtectedError, e.message());
    }
    true
}

fn delete_field(vm: &mut Vm) -> bool {
    let Some(slf) = vm.trans.slf.clone() else {
        return false;
    };
    if let Err(e) = slf.remove(vm.trans.sym) {
        vm.throw_error(ErrorKind::ProtectedError, e.message());
    }
    true
}

/// `CGOTO` and `CRET`: reinstates the continuation in `%ptr` and schedules
/// the wind thunks between here and there.
///
/// Scratch registers start over; `%ret` is `Nil` unless `keep_ret`.
fn resume(vm: &mut Vm, keep_ret: bool) -> bool {
    let Some(snap) = vm.trans.ptr.as_ref().and_then(Snapshot::from_object) else {
        return false;
    };
    let old = vm.state.wind.clone();
    vm.state = snap.restore();
    let ret = if keep_ret {
        vm.trans.ret.take()
    } else {
        Some(vm.garnish_nil())
    };
    vm.trans = TransientState::default();
    vm.trans.ret = ret;
    let new = vm.state.wind.clone();
    resolve_thunks(&mut vm.state, &vm.heap, &vm.reader.gtu, &old, &new);
    true
}

/// `WND`: `%slf` is the before method, `%ptr` the after method.
fn wind(vm: &mut Vm) -> bool {
    let (Some(slf), Some(ptr)) = (vm.trans.slf.as_ref(), vm.trans.ptr.as_ref()) else {
        return false;
    };
    let Some(dyn_) = vm.state.dyn_.peek() else {
        return false;
    };
    let thunk = |obj: &ObjectPtr| -> Option<Thunk> {
        Some(Thunk {
            method: method_of(obj)?,
            lex: obj.get(Symbol::CLOSURE)?,
            dyn_: dyn_.clone(),
        })
    };
    let (Some(before), Some(after)) = (thunk(slf), thunk(ptr)) else {
        return false;
    };
    vm.state.wind.push(Rc::new(WindFrame { before, after }));
    true
}

/// `THROW`: schedules every installed handler, innermost first, with the
/// panic routine beneath them all.
fn throw(vm: &mut Vm) -> bool {
    let Some(exc) = vm.trans.slf.clone() else {
        return false;
    };
    let handlers: Vec<ObjectPtr> = vm.state.hand.iter().cloned().collect();
    vm.state.jump(Gtu::Panic.seek(&vm.reader.gtu));
    for handler in handlers.into_iter().rev() {
        vm.state.arg.push(exc.clone());
        vm.state.sto.push(handler);
        vm.state.jump(Gtu::Handler.seek(&vm.reader.gtu));
    }
    true
}

/// `LOCRT`: the backtrace as a `parent`-linked chain of stack frames.
fn backtrace(vm: &mut Vm) {
    let proto = vm.lit(Lit::SFrame);
    let mut top: Option<ObjectPtr> = None;
    let mut last: Option<ObjectPtr> = None;
    let frames: Vec<TraceFrame> = vm
        .state
        .trace
        .iter()
        .filter(|f| !f.file.is_empty())
        .cloned()
        .collect();
    for frame in frames {
        let obj = vm.heap.clone_object(&proto);
        obj.put_protected(Symbol::LINE, vm.garnish_number(frame.line), Protection::empty());
        obj.put_protected(Symbol::FILE, vm.garnish_string(frame.file), Protection::empty());
        match &last {
            Some(prev) => prev.put_protected(Symbol::PARENT, obj.clone(), Protection::DELETE),
            None => top = Some(obj.clone()),
        }
        last = Some(obj);
    }
    vm.trans.ret = Some(top.unwrap_or_else(|| vm.garnish_nil()));
}

/// `ARR n`: element `i` of the `n` popped arguments lands at natural key
/// `2i + 1`.
fn array(vm: &mut Vm, n: i64) -> bool {
    let mut items = Vec::with_capacity(n.max(0) as usize);
    let mut ok = true;
    for _ in 0..n {
        match vm.state.arg.pop() {
            Some(item) => items.push(item),
            None => {
                ok = false;
                break;
            }
        }
    }
    items.reverse();
    vm.trans.ret = Some(vm.garnish_array(items));
    ok
}

/// `DICT n`: pops `n` (value, key) pairs into a fresh copy of the backing
/// store.
fn dict(vm: &mut Vm, n: i64) -> bool {
    let proto = vm.lit(Lit::Dict);
    let Some(impl0) = proto.get(Symbol::IMPL) else {
        return false;
    };
    let backing = vm.heap.clone_object(&impl0);
    backing.copy_from(&impl0);
    let dict = vm.heap.clone_object(&proto);
    dict.put_protected(Symbol::IMPL, backing.clone(), Protection::empty());

    for _ in 0..n {
        let (Some(value), Some(key)) = (vm.state.arg.pop(), vm.state.arg.pop()) else {
            return false;
        };
        match key.prim() {
            Prim::Symbol(sym) => backing.put_protected(sym, value, Protection::empty()),
            _ => {
                vm.throw_error(ErrorKind::TypeError, "Symbol expected");
                return true;
            }
        }
    }
    vm.trans.ret = Some(dict);
    true
}

/// `XXX 0` saves the backtrace; `XXX 1` checks it is unchanged.
fn marker(vm: &mut Vm, mode: i64) -> bool {
    match mode {
        0 => {
            vm.trace_markers.push(vm.state.trace.clone());
            true
        }
        1 => {
            let Some(saved) = vm.trace_markers.pop() else {
                return false;
            };
            let same = saved.len() == vm.state.trace.len()
                && saved.iter().zip(vm.state.trace.iter()).all(|(a, b)| a == b);
            if !same {
                error!(
                    "backtrace marker mismatch: saved {:?}, now {:?}",
                    saved, vm.state.trace
                );
                vm.hard_kill(HaltReason::Terminated);
            }
            true
        }
        _ => false,
    }
}
