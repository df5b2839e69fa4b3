//! Raising, handling and backtraces

use core_types::{ErrorKind, Symbol};
use interpreter::{Lit, Vm, VmError};
use memory_manager::{ObjectPtr, Prim};

use super::{define, eval, store_arg_body};

fn install_handler(vm: &mut Vm) {
    define(vm, "h", &format!("{}CPP 0\n", store_arg_body("caught")));
}

fn caught(vm: &mut Vm) -> ObjectPtr {
    let sym = vm.intern("caught");
    vm.global().get(sym).expect("handler ran")
}

fn prototype(vm: &mut Vm, kind: ErrorKind) -> ObjectPtr {
    let sym = vm.intern(kind.name());
    vm.lit(Lit::Err).get(sym).unwrap()
}

#[test]
fn test_throa_reaches_handler() {
    let mut vm = Vm::new().unwrap();
    install_handler(&mut vm);
    let result = eval(
        &mut vm,
        "GETL %slf\nSYM \"h\"\nRTRV\nPUSH %ret %hand\nESET\nTHROA \"boom\"\nUNTR\n",
    );
    assert!(matches!(result, Err(VmError::Terminated)));
    let exc = caught(&mut vm);
    assert_eq!(exc.get(Symbol::PARENT), Some(prototype(&mut vm, ErrorKind::TypeError)));
    let message = exc.get(Symbol::MESSAGE).unwrap();
    assert_eq!(message.prim(), Prim::Str("boom".to_string()));
    assert!(vm.state().hand.is_empty());
}

#[test]
fn test_protected_assignment_raises() {
    let mut vm = Vm::new().unwrap();
    install_handler(&mut vm);
    // Inside a call `self` is assign-protected on the lexical scope.
    define(
        &mut vm,
        "f",
        "GETL %slf\nSYMN 2\nGETL %ptr\nSETF\n",
    );
    let result = eval(
        &mut vm,
        "GETL %slf\nSYM \"h\"\nRTRV\nPUSH %ret %hand\nSYM \"f\"\nRTRV\nMOV %ret %ptr\nCALL 0\nUNTR\n",
    );
    assert!(matches!(result, Err(VmError::Terminated)));
    let exc = caught(&mut vm);
    assert_eq!(
        exc.get(Symbol::PARENT),
        Some(prototype(&mut vm, ErrorKind::ProtectedError))
    );
    let message = exc.get(Symbol::MESSAGE).unwrap();
    assert_eq!(message.prim(), Prim::Str("Assign-protected variable".to_string()));
}

#[test]
fn test_backtrace_attached_to_error() {
    let mut vm = Vm::new().unwrap();
    install_handler(&mut vm);
    define(&mut vm, "f", "LOCLN 10\nESET\nTHROA \"bad\"\n");
    let code = bytecode_system::asm::assemble(
        "LOCFN \"main.pvm\"\nLOCLN 2\nGETL %slf\nSYM \"h\"\nRTRV\nPUSH %ret %hand\n\
         LOCLN 3\nSYM \"f\"\nRTRV\nMOV %ret %ptr\nCALL 0\nRET\n",
    )
    .unwrap();
    vm.load(bytecode_system::TranslationUnit::from_methods(code));
    assert!(matches!(vm.run(), Err(VmError::Terminated)));

    let exc = caught(&mut vm);
    let frame = exc.get(Symbol::STACK).unwrap();
    let line = frame.get(Symbol::LINE).unwrap();
    assert_eq!(line.prim(), Prim::Number(3i64.into()));
    let file = frame.get(Symbol::FILE).unwrap();
    assert_eq!(file.prim(), Prim::Str("main.pvm".to_string()));
    // The frame pushed by `load` itself has no file and is skipped.
    assert_eq!(frame.get(Symbol::PARENT), Some(vm.lit(Lit::SFrame)));
}

#[test]
fn test_unhandled_throw_panics() {
    let mut vm = Vm::new().unwrap();
    assert!(vm.last_dump().is_none());
    let result = eval(&mut vm, "ESET\nTHROA \"nobody listens\"\nUNTR\n");
    assert!(matches!(result, Err(VmError::Panicked)));
    assert!(vm.last_dump().is_some());
}

#[test]
fn test_unresolved_lookup_dumps_registers() {
    let mut vm = Vm::new().unwrap();
    let result = eval(&mut vm, "GETL %slf\nSYM \"nowhere\"\nRTRV\nUNTR\n");
    assert!(matches!(result, Err(VmError::Terminated)));
    let global = vm.global().id().to_string();
    let dump = vm.last_dump().expect("dump kept");
    assert_eq!(dump.sym, "nowhere");
    assert_eq!(dump.slf, Some(global));
    assert_eq!(dump.lex.len(), 1);
    // Taken while RTRV, the third instruction, was running.
    assert_eq!(dump.steps, 2);
    assert_eq!(dump.cursor.position, 3);
}

#[test]
fn test_throq_only_when_flagged() {
    let mut vm = Vm::new().unwrap();
    eval(&mut vm, "YLDC 13 %slf\nTHROQ\nUNTR\n").unwrap();
    let result = eval(&mut vm, "YLDC 13 %slf\nESET\nTHROQ\nUNTR\n");
    assert!(matches!(result, Err(VmError::Panicked)));
}
