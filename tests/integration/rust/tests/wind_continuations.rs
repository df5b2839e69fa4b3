//! Dynamic-wind and continuation integration tests
//!
//! Thunk methods record labels through natives so the order in which a
//! continuation jump runs them can be checked directly.

use integration_tests::{define, eval, store_arg, Recorder};
use interpreter::Vm;

/// Installs a bracket whose thunks are `global.<before>` / `global.<after>`.
fn install(before: &str, after: &str) -> String {
    format!(
        "GETL %slf\nSYM \"{after}\"\nRTRV\nPUSH %ret %sto\n\
         SYM \"{before}\"\nRTRV\nMOV %ret %slf\nPOP %ptr %sto\nWND\n"
    )
}

const CAPTURE: &str = "GETL %slf\nSYM \"keep\"\nRTRV\nMOV %ret %ptr\nYLDC 13 %slf\nCCALL\n";
const JUMP: &str = "GETL %slf\nSYM \"k\"\nRTRV\nMOV %ret %ptr\nCGOTO\n";

fn setup() -> (Vm, Recorder) {
    let mut vm = Vm::new().unwrap();
    let rec = Recorder::default();
    rec.method(&mut vm, "bA", "before A");
    rec.method(&mut vm, "aA", "after A");
    rec.method(&mut vm, "bB", "before B");
    rec.method(&mut vm, "aB", "after B");
    define(&mut vm, "keep", &store_arg("k"));
    (vm, rec)
}

/// Test: jumping into two brackets runs their before-thunks outermost first
#[test]
fn test_entering_runs_befores_outermost_first() {
    let (mut vm, rec) = setup();
    let mark = rec.native(&mut vm, "mark");
    let program = format!(
        "{}{}{}CPP {}\nUNWND\nUNWND\nUNTR\n",
        install("bA", "aA"),
        install("bB", "aB"),
        CAPTURE,
        mark
    );
    eval(&mut vm, &program).unwrap();
    assert_eq!(rec.take(), vec!["mark"]);
    assert!(vm.state().wind.is_empty());

    eval(&mut vm, JUMP).unwrap();
    assert_eq!(rec.take(), vec!["before A", "before B", "mark"]);

    // Re-entry repeats the same schedule.
    eval(&mut vm, JUMP).unwrap();
    assert_eq!(rec.take(), vec!["before A", "before B", "mark"]);
    assert!(vm.state().wind.is_empty());
    assert_eq!(vm.state().lex.len(), 1);
    assert!(vm.state().trns.is_empty());
}

/// Test: jumping out of two brackets runs their after-thunks innermost first
#[test]
fn test_leaving_runs_afters_innermost_first() {
    let (mut vm, rec) = setup();
    eval(&mut vm, &format!("{}UNTR\n", CAPTURE)).unwrap();
    assert!(rec.take().is_empty());

    let program = format!("{}{}{}", install("bA", "aA"), install("bB", "aB"), JUMP);
    eval(&mut vm, &program).unwrap();
    assert_eq!(rec.take(), vec!["after B", "after A"]);
    assert!(vm.state().wind.is_empty());
    assert_eq!(vm.state().dyn_.len(), 1);
}

/// Test: brackets shared by both sides of a jump run nothing
#[test]
fn test_shared_brackets_are_skipped() {
    let (mut vm, rec) = setup();
    let mark = rec.native(&mut vm, "mark");
    // Leaves A installed after the unit finishes.
    let program = format!("{}{}CPP {}\nUNTR\n", install("bA", "aA"), CAPTURE, mark);
    eval(&mut vm, &program).unwrap();
    assert_eq!(rec.take(), vec!["mark"]);
    assert_eq!(vm.state().wind.len(), 1);

    let program = format!("{}{}", install("bB", "aB"), JUMP);
    eval(&mut vm, &program).unwrap();
    assert_eq!(rec.take(), vec!["after B", "mark"]);
    assert_eq!(vm.state().wind.len(), 1);
}

/// Test: thunks do not disturb the value a `CRET` carries
#[test]
fn test_cret_value_survives_thunks() {
    let (mut vm, rec) = setup();
    eval(&mut vm, &format!("{}UNTR\n", CAPTURE)).unwrap();

    let program = format!(
        "{}INT 42\nYLDC 5 %ret\nMOV %ret %ptr\nLOAD %num0\nPUSH %ptr %sto\n\
         GETL %slf\nSYM \"k\"\nRTRV\nMOV %ret %ptr\nPOP %ret %sto\nCRET\n",
        install("bA", "aA")
    );
    eval(&mut vm, &program).unwrap();
    assert_eq!(rec.take(), vec!["after A"]);
    assert_eq!(vm.ret_number(), Some(42i64.into()));
}
