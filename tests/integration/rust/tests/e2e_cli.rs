//! End-to-end tests through the driver runtime

use std::fs;

use bytecode_system::UnitHeader;
use interpreter::{VmConfig, VmError};
use vm_cli::repl::{handle_line, Outcome};
use vm_cli::runtime::assemble_file;
use vm_cli::{CliError, Runtime};

const GREET: &str = "\
LOCFN \"greet.pvma\"
LOCLN 1
GETL %slf
SYM \"stdout\"
RTRV
MOV %ret %ptr
EXPD %strm
STR \"hello\"
CPP 5
RET
";

/// Test: a compiled program writes through the standard streams
#[test]
fn test_compiled_program_runs() {
    let dir = tempfile::tempdir().unwrap();
    let src = dir.path().join("greet.pvma");
    let out = dir.path().join("greet.pvm");
    fs::write(&src, GREET).unwrap();
    assemble_file(&src, &out, &UnitHeader::default()).unwrap();

    let mut rt = Runtime::new(VmConfig::default()).unwrap();
    rt.run_file(&out, &[]).unwrap();
    assert!(!rt.vm().err0());
    assert!(rt.vm().is_idling());
}

/// Test: runaway programs stop at the step limit
#[test]
fn test_step_limit_from_config() {
    let dir = tempfile::tempdir().unwrap();
    let src = dir.path().join("spin.pvma");
    fs::write(&src, "MTHD #0\nGOTO\n").unwrap();

    let config = VmConfig {
        max_steps: Some(1_000),
        ..VmConfig::default()
    };
    let mut rt = Runtime::new(config).unwrap();
    let err = rt.run_file(&src, &[]).unwrap_err();
    assert!(matches!(err, CliError::Vm(VmError::StepLimit(1_000))));
}

/// Test: a REPL session keeps its scope and reports errors without dying
#[test]
fn test_repl_session() {
    let mut rt = Runtime::new(VmConfig::default()).unwrap();
    let lines = [
        "GETL %slf\nSYM \"x\"\nSTR \"kept\"\nYLDC 4 %ptr\nLOAD %str0\nSETF",
        "NOT_AN_OPCODE",
        "GETL %slf\nSYM \"x\"\nRTRV",
    ];
    assert!(matches!(handle_line(&mut rt, lines[0]), Ok(Outcome::Show(_))));
    assert!(handle_line(&mut rt, lines[1]).is_err());
    assert_eq!(
        handle_line(&mut rt, lines[2]).unwrap(),
        Outcome::Show("\"kept\"".to_string())
    );
    assert_eq!(handle_line(&mut rt, ".exit").unwrap(), Outcome::Exit);
}

/// Test: a panicking program leaves a dump with its last location
#[test]
fn test_panic_dump() {
    let dir = tempfile::tempdir().unwrap();
    let src = dir.path().join("boom.pvma");
    fs::write(&src, "LOCFN \"boom.pvma\"\nLOCLN 7\nESET\nTHROA \"boom\"\nRET\n").unwrap();

    let mut rt = Runtime::new(VmConfig::default()).unwrap();
    assert!(matches!(
        rt.run_file(&src, &[]),
        Err(CliError::Vm(VmError::Panicked))
    ));
    let dump: serde_json::Value = serde_json::from_str(&rt.dump_json().unwrap()).unwrap();
    assert_eq!(dump["trace"][0], "boom.pvma:7");
}
