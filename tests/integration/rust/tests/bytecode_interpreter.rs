//! Bytecode and Interpreter Integration Tests
//!
//! Assembled programs exercising calls, scopes and slot lookup.

use core_types::{Number, Symbol};
use integration_tests::{define, eval, global};
use interpreter::{Vm, VmError};
use memory_manager::{lookup, Prim};

const SUB: &str = "\
GETD %slf
SYM \"$1\"
RTRV
MOV %ret %ptr
EXPD %num0
NSWAP
SYM \"$2\"
RTRV
MOV %ret %ptr
EXPD %num0
NSWAP
ARITH 2
YLDC 5 %ptr
LOAD %num0
MOV %ptr %ret
";

const PUSH_50_8: &str = "\
INT 50
YLDC 5 %ptr
LOAD %num0
PUSH %ptr %arg
INT 8
YLDC 5 %ptr
LOAD %num0
PUSH %ptr %arg
";

/// Test: arguments bind to `$1`, `$2` in push order
#[test]
fn test_arguments_bind_in_push_order() {
    let mut vm = Vm::new().unwrap();
    define(&mut vm, "sub", SUB);
    eval(
        &mut vm,
        &format!("{}GETL %slf\nSYM \"sub\"\nRTRV\nMOV %ret %ptr\nCALL 2\nUNTR\n", PUSH_50_8),
    )
    .unwrap();
    assert_eq!(vm.ret_number(), Some(Number::from(42i64)));
    assert!(vm.state().arg.is_empty());
    assert_eq!(vm.state().lex.len(), 1);
    assert_eq!(vm.state().dyn_.len(), 1);
}

/// Test: calling a non-method yields the object itself and drops the arguments
#[test]
fn test_calling_plain_object() {
    let mut vm = Vm::new().unwrap();
    eval(
        &mut vm,
        &format!("{}YLDC 13 %ptr\nCALL 2\nUNTR\n", PUSH_50_8),
    )
    .unwrap();
    assert!(vm.state().arg.is_empty());
    assert_eq!(vm.ret().map(|r| r.prim()), Some(Prim::Nil));
}

/// Test: arguments are visible from nested calls through the dynamic scope
#[test]
fn test_dynamic_scope_inherits_arguments() {
    let mut vm = Vm::new().unwrap();
    // `inner` takes no arguments of its own and still sees the caller's `$1`.
    define(&mut vm, "inner", "GETD %slf\nSYM \"$1\"\nRTRV\n");
    define(
        &mut vm,
        "outer",
        "GETL %slf\nSYM \"inner\"\nRTRV\nMOV %ret %ptr\nCALL 0\n",
    );
    eval(
        &mut vm,
        "STR \"deep\"\nYLDC 4 %ptr\nLOAD %str0\nPUSH %ptr %arg\n\
         GETL %slf\nSYM \"outer\"\nRTRV\nMOV %ret %ptr\nCALL 1\nUNTR\n",
    )
    .unwrap();
    assert_eq!(vm.ret().map(|r| r.prim()), Some(Prim::Str("deep".to_string())));
}

/// Test: the closure's lexical scope is what a method sees, not the caller's
#[test]
fn test_lexical_scope_from_closure() {
    let mut vm = Vm::new().unwrap();
    define(&mut vm, "peek_hidden", "GETL %slf\nSYM \"hidden\"\nRTRV\n");
    define(
        &mut vm,
        "hide",
        "GETL %slf\nSYM \"hidden\"\nGETL %ptr\nSETF\n\
         SYM \"peek_hidden\"\nRTRV\nMOV %ret %ptr\nCALL 0\n",
    );
    // `peek_hidden` closes over the global scope, where `hidden` was never set.
    let result = eval(
        &mut vm,
        "GETL %slf\nSYM \"hide\"\nRTRV\nMOV %ret %ptr\nCALL 0\nUNTR\n",
    );
    assert!(matches!(result, Err(VmError::Terminated)));
}

/// Test: slot lookup falls back to `missing`, then `meta.missed`
#[test]
fn test_lookup_fallback_order() {
    let mut vm = Vm::new().unwrap();
    let meta = lookup(vm.global(), Symbol::META).unwrap();
    let missed = define(&mut vm, "missed_impl", "YLD 2 %ret\n");
    meta.put(Symbol::MISSED, missed).unwrap();
    let missing = define(&mut vm, "missing_impl", "GETD %slf\nSYM \"$1\"\nRTRV\n");

    // No `missing` anywhere on the chain: `meta.missed` answers.
    eval(&mut vm, "YLDC 13 %slf\nSYM \"ghost\"\nRTRV\nUNTR\n").unwrap();
    assert_eq!(vm.ret(), Some(&vm.lit(interpreter::Lit::True)));

    // A `missing` method takes priority and receives the symbol.
    let target = vm.heap().clone_object(&vm.lit(interpreter::Lit::Object));
    target.put(Symbol::MISSING, missing).unwrap();
    let sym = vm.intern("target");
    vm.global().put(sym, target.clone()).unwrap();
    eval(
        &mut vm,
        "GETL %slf\nSYM \"target\"\nRTRV\nMOV %ret %slf\nSYM \"ghost\"\nRTRV\nUNTR\n",
    )
    .unwrap();
    let ghost = vm.symbols().find("ghost").unwrap();
    assert_eq!(vm.ret().map(|r| r.prim()), Some(Prim::Symbol(ghost)));

    // A real slot wins over both.
    let value = vm.garnish_number(5i64);
    target.put(ghost, value.clone()).unwrap();
    eval(
        &mut vm,
        "GETL %slf\nSYM \"target\"\nRTRV\nMOV %ret %slf\nSYM \"ghost\"\nRTRV\nUNTR\n",
    )
    .unwrap();
    assert_eq!(vm.ret(), Some(&value));
    assert!(global(&mut vm, "ghost").is_none());
}

/// Test: `BRANCH` picks `%mthd` on identity and `%mthdz` otherwise
#[test]
fn test_branch_on_identity() {
    let branch = |setup: &str| {
        format!(
            "GETL %slf\n{}\nTEST\nMTHD #2\nMSWAP\nMTHD #1\nBRANCH\nUNTR\n\
             .method\nSTR \"same\"\n.method\nSTR \"different\"\n",
            setup
        )
    };
    let mut vm = Vm::new().unwrap();
    eval(&mut vm, &branch("GETL %ptr")).unwrap();
    assert_eq!(vm.transient().str0, "same");
    eval(&mut vm, &branch("YLDC 13 %ptr")).unwrap();
    assert_eq!(vm.transient().str0, "different");
}
