//! Continuation capture and escape through full programs

use core_types::Number;
use interpreter::{Lit, Vm};
use memory_manager::Prim;

use super::{define, eval, store_arg_body};

const ESCAPE: &str = "\
MTHD #1
YLDC 8 %ptr
LOAD %mthd
MOV %ptr %slf
GETL %ptr
SYMN 5
SETF
MOV %slf %ptr
YLDC 13 %slf
CCALL
UNTR
.method
INT 42
YLDC 5 %ptr
LOAD %num0
PUSH %ptr %sto
GETD %slf
SYM \"$1\"
RTRV
MOV %ret %ptr
POP %ret %sto
CRET
";

#[test]
fn test_cret_escapes_with_value() {
    let mut vm = Vm::new().unwrap();
    eval(&mut vm, ESCAPE).unwrap();
    assert_eq!(vm.ret_number(), Some(Number::from(42i64)));
    let state = vm.state();
    assert_eq!(state.lex.len(), 1);
    assert_eq!(state.dyn_.len(), 1);
    assert!(state.trace.is_empty());
    assert!(state.trns.is_empty());
    assert!(state.stack.is_empty());
    assert!(state.sto.is_empty());
}

#[test]
fn test_cgoto_resets_scratch_registers() {
    let mut vm = Vm::new().unwrap();
    define(&mut vm, "keep", &store_arg_body("k"));
    eval(
        &mut vm,
        "GETL %slf\nSYM \"keep\"\nRTRV\nMOV %ret %ptr\nYLDC 13 %slf\nCCALL\nUNTR\n",
    )
    .unwrap();
    let k = vm.global().get(vm.symbols().find("k").unwrap()).unwrap();
    assert!(matches!(k.prim(), Prim::Continuation(_)));

    eval(
        &mut vm,
        "STR \"scratch\"\nINT 5\nGETL %slf\nSYM \"k\"\nRTRV\nMOV %ret %ptr\nCGOTO\n",
    )
    .unwrap();
    assert_eq!(vm.transient().str0, "");
    assert_eq!(vm.transient().num0, Number::default());
    assert_eq!(vm.ret(), Some(&vm.lit(Lit::Nil)));
    assert!(vm.state().trns.is_empty());
}

#[test]
fn test_continuation_can_be_reentered() {
    let mut vm = Vm::new().unwrap();
    define(&mut vm, "keep", &store_arg_body("k"));
    let counter = std::rc::Rc::new(std::cell::Cell::new(0));
    let seen = counter.clone();
    let tick = vm.register_native(move |_| seen.set(seen.get() + 1));
    eval(
        &mut vm,
        &format!(
            "GETL %slf\nSYM \"keep\"\nRTRV\nMOV %ret %ptr\nYLDC 13 %slf\nCCALL\nCPP {}\nUNTR\n",
            tick
        ),
    )
    .unwrap();
    assert_eq!(counter.get(), 1);
    for expected in 2..=3 {
        eval(&mut vm, "GETL %slf\nSYM \"k\"\nRTRV\nMOV %ret %ptr\nCGOTO\n").unwrap();
        assert_eq!(counter.get(), expected);
    }
    assert_eq!(vm.state().lex.len(), 1);
}

#[test]
fn test_ccall_without_receiver_sets_err0() {
    let mut vm = Vm::new().unwrap();
    eval(&mut vm, "CCALL\nUNTR\n").unwrap();
    assert!(vm.err0());
    assert!(vm.state().arg.is_empty());
}
