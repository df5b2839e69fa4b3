//! Contract tests verifying the engine API the command line and the
//! integration suite build on.

use std::cell::RefCell;
use std::rc::Rc;

use bytecode_system::{asm, TranslationUnit};
use core_types::{Number, Symbol};
use interpreter::{Gtu, Lit, Vm, VmConfig, VmError};
use memory_manager::Prim;

fn unit(text: &str) -> Rc<TranslationUnit> {
    TranslationUnit::from_methods(asm::assemble(text).unwrap())
}

/// Contract: a fresh engine is idle with the global scope on both scope stacks
#[test]
fn contract_fresh_engine() {
    let vm = Vm::new().unwrap();
    assert!(vm.is_idling());
    assert_eq!(vm.state().lex.peek(), Some(vm.global()));
    assert_eq!(vm.state().dyn_.peek(), Some(vm.global()));
    assert_eq!(vm.steps(), 0);
    assert!(!vm.err0());
}

/// Contract: every literal and ground routine is addressable
#[test]
fn contract_tables_complete() {
    let vm = Vm::new().unwrap();
    for (i, lit) in Lit::ALL.iter().enumerate() {
        assert_eq!(lit.index(), i);
        vm.lit(*lit);
    }
    assert_eq!(Gtu::ALL.len(), 23);
    assert_eq!(vm.lit(Lit::Nil).prim(), Prim::Nil);
}

/// Contract: eval runs method 0 in the current scope and leaves nothing behind
#[test]
fn contract_eval_in_place() {
    let mut vm = Vm::new().unwrap();
    vm.eval(unit("GETL %slf\nSYM \"answer\"\nINT 42\nYLDC 5 %ptr\nLOAD %num0\nSETF\nUNTR\n"));
    vm.run().unwrap();
    let sym = vm.symbols().find("answer").unwrap();
    let answer = vm.global().get(sym).unwrap();
    assert_eq!(answer.prim(), Prim::Number(Number::from(42i64)));
    assert!(vm.state().trns.is_empty());
    assert!(vm.is_idling());
}

/// Contract: load runs method 0 as a call frame in a fresh scope
#[test]
fn contract_load_scopes() {
    let mut vm = Vm::new().unwrap();
    vm.load(unit("GETL %slf\nSYM \"local\"\nGETL %ptr\nSETF\nRET\n"));
    vm.run().unwrap();
    assert_eq!(vm.state().lex.len(), 1);
    assert_eq!(vm.state().dyn_.len(), 1);
    assert!(vm.state().trace.is_empty());
    assert!(vm.symbols().find("local").and_then(|s| vm.global().get(s)).is_none());
}

/// Contract: host methods are callable objects closed over the global scope
#[test]
fn contract_define_method() {
    let mut vm = Vm::new().unwrap();
    let body = asm::assemble("INT 9\nYLDC 5 %ptr\nLOAD %num0\nMOV %ptr %ret\n")
        .unwrap()
        .remove(0);
    let method = vm.define_method(body).unwrap();
    assert!(matches!(method.prim(), Prim::Method(_)));
    assert_eq!(method.get(Symbol::CLOSURE), Some(vm.global().clone()));
    assert_eq!(method.get(Symbol::PARENT), Some(vm.lit(Lit::Method)));

    let sym = vm.intern("nine");
    vm.global().put(sym, method).unwrap();
    vm.eval(unit("GETL %slf\nSYM \"nine\"\nRTRV\nMOV %ret %ptr\nCALL 0\nUNTR\n"));
    vm.run().unwrap();
    assert_eq!(vm.ret_number(), Some(Number::from(9i64)));
}

/// Contract: registered natives get fresh `CPP` indices after the built-ins
#[test]
fn contract_register_native() {
    let mut vm = Vm::new().unwrap();
    let seen = Rc::new(RefCell::new(Vec::new()));
    let log = Rc::clone(&seen);
    let index = vm.register_native(move |vm| log.borrow_mut().push(vm.transient().str0.clone()));
    assert!(index > interpreter::natives::WHILE_REGS_ZERO);
    vm.eval(unit(&format!("STR \"a\"\nCPP {0}\nSTR \"b\"\nCPP {0}\nUNTR\n", index)));
    vm.run().unwrap();
    assert_eq!(*seen.borrow(), vec!["a".to_string(), "b".to_string()]);
}

/// Contract: unknown natives set `%err0` instead of faulting the host
#[test]
fn contract_unknown_native() {
    let mut vm = Vm::new().unwrap();
    vm.eval(unit("CPP 9999\nUNTR\n"));
    vm.run().unwrap();
    assert!(vm.err0());
}

/// Contract: lookups fall back to the receiver's `missing` method
#[test]
fn contract_missing_fallback() {
    let mut vm = Vm::new().unwrap();
    let body = asm::assemble("GETD %slf\nSYM \"$1\"\nRTRV\n").unwrap().remove(0);
    let missing = vm.define_method(body).unwrap();
    let target = vm.heap().clone_object(&vm.lit(Lit::Object));
    target.put(Symbol::MISSING, missing).unwrap();
    let sym = vm.intern("target");
    vm.global().put(sym, target).unwrap();

    vm.eval(unit(
        "GETL %slf\nSYM \"target\"\nRTRV\nMOV %ret %slf\nSYM \"nowhere\"\nRTRV\nUNTR\n",
    ));
    vm.run().unwrap();
    let nowhere = vm.symbols().find("nowhere").unwrap();
    assert_eq!(vm.ret().map(|r| r.prim()), Some(Prim::Symbol(nowhere)));
}

/// Contract: a lookup with no fallback terminates the program
#[test]
fn contract_unresolved_lookup_terminates() {
    let mut vm = Vm::new().unwrap();
    vm.eval(unit("GETL %slf\nSYM \"nowhere\"\nRTRV\nUNTR\n"));
    assert!(matches!(vm.run(), Err(VmError::Terminated)));
    assert!(vm.is_idling());
}

/// Contract: the step limit stops a program that never idles
#[test]
fn contract_step_limit() {
    let config = VmConfig {
        max_steps: Some(100),
        ..VmConfig::default()
    };
    let mut vm = Vm::with_config(config).unwrap();
    vm.eval(unit("MTHD #0\nGOTO\n"));
    assert!(matches!(vm.run(), Err(VmError::StepLimit(100))));
    assert_eq!(vm.steps(), 100);
}

/// Contract: `argv` is an array of strings bound on the global object
#[test]
fn contract_bind_argv() {
    let mut vm = Vm::new().unwrap();
    vm.bind_argv(&["prog".to_string(), "x".to_string()]);
    let argv = vm.global().get(vm.symbols().find("argv").unwrap()).unwrap();
    assert_eq!(argv.get(Symbol::PARENT), Some(vm.lit(Lit::Array)));
    let upper = argv.get(Symbol::UPPER_BOUND).unwrap();
    assert_eq!(upper.prim(), Prim::Number(Number::from(2i64)));
    let second = argv.get(Symbol::natural(3)).unwrap();
    assert_eq!(second.prim(), Prim::Str("x".to_string()));
}

/// Contract: register dumps serialize to JSON with every register present
#[test]
fn contract_dump_json() {
    let mut vm = Vm::new().unwrap();
    vm.eval(unit("STR \"note\"\nUNTR\n"));
    vm.run().unwrap();
    let json = serde_json::to_value(vm.dump_state()).unwrap();
    for key in ["ptr", "slf", "ret", "lex", "dyn", "arg", "sto", "hand", "err0", "str0", "trace"] {
        assert!(json.get(key).is_some(), "missing {}", key);
    }
    assert_eq!(json["str0"], "note");
    assert_eq!(json["steps"], 2);
}
