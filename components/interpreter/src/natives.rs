//! Built-in native callbacks
//!
//! Reached through `CPP n`. Each routine gets the whole [`Vm`] and reports
//! local faults through `%err0`, like any instruction.

use std::rc::Rc;

use core_types::{ErrorKind, Protection, Symbol};
use log::Level;
use memory_manager::{origin, ObjectPtr};

use crate::ground::Gtu;
use crate::literals::Lit;
use crate::state::NativeFn;
use crate::vm::{HaltReason, Vm};

/// Hard kill.
pub const TERMINATE: usize = 0;
/// Register dump, then hard kill.
pub const PANIC: usize = 1;
/// Full collection; freed count into `%ret`.
pub const GC_RUN: usize = 2;
/// `%num0` 0: live count, 1: soft limit; into `%ret`.
pub const GC_TOTAL: usize = 3;
/// Collector logging on when `%num0` is non-zero.
pub const GC_TRACE: usize = 4;
/// Writes `%str0` to `%strm`.
pub const STREAM_PUTS: usize = 5;
/// Reads a line from `%strm` into a string in `%ret`.
pub const STREAM_GETS: usize = 6;
/// `%str0` = text of `%num0`.
pub const NUM_TO_STRING: usize = 7;
/// `%str0` = name of `%sym`.
pub const SYM_NAME: usize = 8;
/// `%sym` = fresh generated symbol.
pub const GENSYM: usize = 9;
/// `%ret` = the object in `%slf`'s hierarchy that holds `%sym`; raises
/// `SlotError` when none does.
pub const ORIGIN: usize = 10;
/// Calls the method on top of `%sto` once per direct key of `%slf`, with
/// the key as a symbol object. The method ends up in `%ret`.
pub const OBJECT_KEYS: usize = 11;
/// Adds the protection bits in `%num0` (1 assign, 2 delete) to the slot
/// `%sym` of `%slf`; raises `SlotError` when the slot is absent.
pub const PROT_VAR: usize = 12;
/// `%ret` = whether slot `%sym` of `%slf` is protected. With `%num0` 0 any
/// bit counts; with 1 every bit in `%num1` must be set.
pub const PROT_IS: usize = 13;
/// `%ret` = whether `%slf` holds `%sym` directly.
pub const HAS_SLOT: usize = 14;
/// Calls `%ptr` forever.
pub const LOOP_DO: usize = 15;
/// Points `%mthd`/`%mthdz` at the body and exit of a `while` loop.
pub const WHILE_REGS: usize = 16;
/// Points `%mthd` at the condition of a `while` loop. Push the condition,
/// the body and a seed result onto `%sto`, then `GOTO`.
pub const WHILE_REGS_ZERO: usize = 17;

/// The built-in table, in index order.
pub(crate) fn table() -> Vec<NativeFn> {
    let natives: [fn(&mut Vm); 18] = [
        terminate,
        panic,
        gc_run,
        gc_total,
        gc_trace,
        stream_puts,
        stream_gets,
        num_to_string,
        sym_name,
        gensym,
        slot_origin,
        object_keys,
        prot_var,
        prot_is,
        has_slot,
        loop_do,
        while_regs,
        while_regs_zero,
    ];
    natives
        .into_iter()
        .map(|f| Rc::new(f) as NativeFn)
        .collect()
}

fn terminate(vm: &mut Vm) {
    vm.fatal(Level::Warn, "terminate", HaltReason::Terminated);
}

fn panic(vm: &mut Vm) {
    vm.fatal(Level::Error, "panic", HaltReason::Panicked);
}

fn gc_run(vm: &mut Vm) {
    let freed = vm.collect_garbage();
    vm.trans.ret = Some(vm.garnish_number(freed as i64));
}

fn gc_total(vm: &mut Vm) {
    let value = match vm.trans.num0.to_i64() {
        Some(0) => vm.heap.live_count(),
        Some(1) => vm.collector.limit(),
        _ => {
            vm.trans.err0 = true;
            return;
        }
    };
    vm.trans.ret = Some(vm.garnish_number(value as i64));
}

fn gc_trace(vm: &mut Vm) {
    let on = !vm.trans.num0.is_zero();
    vm.collector.set_tracing(on);
}

fn stream_puts(vm: &mut Vm) {
    let Some(strm) = vm.trans.strm.clone() else {
        vm.trans.err0 = true;
        return;
    };
    let written = strm.borrow_mut().write_str(&vm.trans.str0);
    if written.is_err() {
        vm.trans.err0 = true;
    }
}

fn stream_gets(vm: &mut Vm) {
    let Some(strm) = vm.trans.strm.clone() else {
        vm.trans.err0 = true;
        return;
    };
    let line = strm.borrow_mut().read_line();
    match line {
        Ok(Some(text)) => vm.trans.ret = Some(vm.garnish_string(text)),
        Ok(None) => vm.trans.ret = Some(vm.lit(Lit::Nil)),
        Err(e) => vm.throw_error(ErrorKind::InputError, &e.to_string()),
    }
}

fn num_to_string(vm: &mut Vm) {
    vm.trans.str0 = vm.trans.num0.to_string();
}

fn sym_name(vm: &mut Vm) {
    vm.trans.str0 = vm.symbols.name(vm.trans.sym);
}

fn gensym(vm: &mut Vm) {
    vm.trans.sym = vm.symbols.gensym();
}

fn slot_origin(vm: &mut Vm) {
    let Some(slf) = vm.trans.slf.clone() else {
        vm.trans.err0 = true;
        return;
    };
    match origin(&slf, vm.trans.sym) {
        Some(found) => vm.trans.ret = Some(found),
        None => vm.throw_error(ErrorKind::SlotError, "Cannot find origin of nonexistent slot"),
    }
}

fn object_keys(vm: &mut Vm) {
    let Some(slf) = vm.trans.slf.clone() else {
        vm.trans.err0 = true;
        return;
    };
    vm.state.jump(Gtu::KeyTerm.seek(&vm.reader.gtu));
    // Pushed last runs first, so walk backwards to visit keys in order.
    for key in slf.direct_keys().into_iter().rev() {
        let obj = vm.garnish_symbol(key);
        vm.state.arg.push(obj);
        vm.state.jump(Gtu::Keys.seek(&vm.reader.gtu));
    }
}

fn protection_of(n: &core_types::Number) -> Option<Protection> {
    n.to_i64().map(|n| Protection::from_bits_truncate((n & 3) as u8))
}

fn prot_var(vm: &mut Vm) {
    let (Some(slf), Some(mask)) = (vm.trans.slf.clone(), protection_of(&vm.trans.num0)) else {
        vm.trans.err0 = true;
        return;
    };
    let sym = vm.trans.sym;
    if !slf.add_protection(sym, mask) {
        slot_error(vm, slf, sym);
    }
}

/// Raises a clone of `err.SlotError` naming the object and slot.
fn slot_error(vm: &mut Vm, obj: ObjectPtr, sym: Symbol) {
    let name = vm.symbols.intern(ErrorKind::SlotError.name());
    let Some(proto) = vm.lit(Lit::Err).get(name) else {
        vm.throw_error_bare(ErrorKind::SlotError);
        return;
    };
    let err = vm.heap.clone_object(&proto);
    let slot_name = vm.garnish_symbol(sym);
    let instance_key = vm.symbols.intern("objectInstance");
    let slot_key = vm.symbols.intern("slotName");
    err.put_protected(instance_key, obj, Protection::empty());
    err.put_protected(slot_key, slot_name, Protection::empty());
    vm.throw_object(err);
}

fn prot_is(vm: &mut Vm) {
    let Some(slf) = vm.trans.slf.clone() else {
        vm.trans.err0 = true;
        return;
    };
    let sym = vm.trans.sym;
    let answer = match vm.trans.num0.to_i64() {
        Some(0) => slf.has_any_protection(sym),
        Some(1) => match protection_of(&vm.trans.num1) {
            Some(mask) => slf.is_protected(sym, mask),
            None => {
                vm.trans.err0 = true;
                return;
            }
        },
        _ => {
            vm.trans.err0 = true;
            return;
        }
    };
    vm.trans.ret = Some(vm.garnish_bool(answer));
}

fn has_slot(vm: &mut Vm) {
    let Some(slf) = vm.trans.slf.as_ref() else {
        vm.trans.err0 = true;
        return;
    };
    let answer = slf.has_direct(vm.trans.sym);
    vm.trans.ret = Some(vm.garnish_bool(answer));
}

fn loop_do(vm: &mut Vm) {
    vm.state.tail_jump(Gtu::LoopDo.seek(&vm.reader.gtu));
}

fn while_regs(vm: &mut Vm) {
    vm.trans.mthd = Some(Gtu::WhileAgain.method(&vm.reader.gtu));
    vm.trans.mthdz = Some(Gtu::PopTwo.method(&vm.reader.gtu));
}

fn while_regs_zero(vm: &mut Vm) {
    vm.trans.mthd = Some(Gtu::WhileDo.method(&vm.reader.gtu));
}
