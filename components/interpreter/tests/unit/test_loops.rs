//! Looping natives and key iteration driven through whole programs

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use interpreter::natives::{LOOP_DO, OBJECT_KEYS, WHILE_REGS_ZERO};
use interpreter::{HaltReason, Vm, VmError};
use memory_manager::Prim;

use super::{define, eval};

/// Binds `cond` to a method answering `count < limit` and `body` to one
/// that bumps the count and returns it.
fn counted(vm: &mut Vm, limit: i64) -> Rc<Cell<i64>> {
    let count = Rc::new(Cell::new(0));
    let c = Rc::clone(&count);
    let below = vm.register_native(move |vm| {
        let answer = vm.garnish_bool(c.get() < limit);
        vm.transient_mut().ret = Some(answer);
    });
    let c = Rc::clone(&count);
    let bump = vm.register_native(move |vm| {
        c.set(c.get() + 1);
        let n = vm.garnish_number(c.get());
        vm.transient_mut().ret = Some(n);
    });
    define(vm, "cond", &format!("CPP {}\n", below));
    define(vm, "body", &format!("CPP {}\n", bump));
    count
}

fn while_program() -> String {
    format!(
        "GETL %slf\nSYM \"cond\"\nRTRV\nPUSH %ret %sto\n\
         SYM \"body\"\nRTRV\nPUSH %ret %sto\n\
         YLD 0 %slf\nPUSH %slf %sto\n\
         CPP {}\nGOTO\nUNTR\n",
        WHILE_REGS_ZERO
    )
}

#[test]
fn test_while_runs_body_until_condition_fails() {
    let mut vm = Vm::new().unwrap();
    let count = counted(&mut vm, 3);
    eval(&mut vm, &while_program()).unwrap();
    assert_eq!(count.get(), 3);
    assert_eq!(vm.ret_number(), Some(3i64.into()));
    assert!(vm.state().sto.is_empty());
    assert_eq!(vm.state().lex.len(), 1);
    assert!(vm.is_idling());
}

#[test]
fn test_while_with_false_condition_skips_body() {
    let mut vm = Vm::new().unwrap();
    let count = counted(&mut vm, 0);
    eval(&mut vm, &while_program()).unwrap();
    assert_eq!(count.get(), 0);
    assert_eq!(vm.ret().map(|r| r.prim()), Some(Prim::Nil));
    assert!(vm.state().sto.is_empty());
}

#[test]
fn test_loop_do_repeats_in_constant_depth() {
    let mut vm = Vm::new().unwrap();
    let depths = Rc::new(RefCell::new(Vec::new()));
    let d = Rc::clone(&depths);
    let tick = vm.register_native(move |vm| {
        d.borrow_mut().push(vm.state().stack.len());
        if d.borrow().len() == 5 {
            vm.hard_kill(HaltReason::Terminated);
        }
    });
    define(&mut vm, "body", &format!("CPP {}\n", tick));
    let result = eval(
        &mut vm,
        &format!("GETL %slf\nSYM \"body\"\nRTRV\nMOV %ret %ptr\nCPP {}\nUNTR\n", LOOP_DO),
    );
    assert!(matches!(result, Err(VmError::Terminated)));
    let depths = depths.borrow();
    assert_eq!(depths.len(), 5);
    assert!(depths.iter().all(|&d| d == depths[0]));
}

#[test]
fn test_object_keys_visits_direct_keys_in_order() {
    let mut vm = Vm::new().unwrap();
    let seen = Rc::new(RefCell::new(Vec::new()));
    let s = Rc::clone(&seen);
    let record = vm.register_native(move |vm| {
        if let Some(Prim::Symbol(sym)) = vm.ret().map(|r| r.prim()) {
            s.borrow_mut().push(sym);
        }
    });
    let visit = define(
        &mut vm,
        "visit",
        &format!("GETD %slf\nSYM \"$1\"\nRTRV\nCPP {}\n", record),
    );

    let target = vm.heap().allocate();
    for name in ["b", "a", "c"] {
        let sym = vm.intern(name);
        target.put(sym, vm.garnish_nil()).unwrap();
    }
    let sym = vm.intern("target");
    vm.global().put(sym, target.clone()).unwrap();

    eval(
        &mut vm,
        &format!(
            "GETL %slf\nSYM \"visit\"\nRTRV\nPUSH %ret %sto\n\
             SYM \"target\"\nRTRV\nMOV %ret %slf\nCPP {}\nUNTR\n",
            OBJECT_KEYS
        ),
    )
    .unwrap();

    assert_eq!(*seen.borrow(), target.direct_keys());
    assert_eq!(seen.borrow().len(), 3);
    assert_eq!(vm.ret(), Some(&visit));
    assert!(vm.state().sto.is_empty());
    assert!(vm.state().arg.is_empty());
}
