//! Tests for Opcode, Reg and the operand validator

use bytecode_system::{Instruction, InstructionError, Opcode, Operand, OperandKind, Reg};

#[test]
fn test_opcode_count() {
    assert_eq!(Opcode::ALL.len(), 0x38);
    assert_eq!(Opcode::Del.byte(), 0x33);
    assert_eq!(Opcode::Mswap.byte(), 0x38);
}

#[test]
fn test_long_operand_opcodes() {
    for op in [
        Opcode::Int,
        Opcode::Call,
        Opcode::Xcall0,
        Opcode::Symn,
        Opcode::Cpp,
        Opcode::Arith,
        Opcode::Locln,
        Opcode::Arr,
        Opcode::Dict,
        Opcode::Xxx,
    ] {
        assert_eq!(op.operand_kinds(), &[OperandKind::Long], "{}", op);
    }
}

#[test]
fn test_string_operand_opcodes() {
    for op in [
        Opcode::Sym,
        Opcode::Num,
        Opcode::Float,
        Opcode::Str,
        Opcode::Throa,
        Opcode::Locfn,
    ] {
        assert_eq!(op.operand_kinds(), &[OperandKind::Str], "{}", op);
    }
}

#[test]
fn test_stack_register_operand() {
    let ok = Instruction::new(Opcode::Pop, vec![Reg::Slf.into(), Reg::Hand.into()]);
    assert!(ok.is_ok());
    let bad = Instruction::new(Opcode::Pop, vec![Reg::Slf.into(), Reg::Ret.into()]);
    assert_eq!(
        bad,
        Err(InstructionError::Kind {
            opcode: Opcode::Pop,
            position: 1,
            expected: OperandKind::StackReg
        })
    );
}

#[test]
fn test_any_register_operand() {
    let inst = Instruction::new(Opcode::Expd, vec![Reg::Num1.into()]).unwrap();
    assert_eq!(inst.reg(0), Some(Reg::Num1));
    assert!(Instruction::new(Opcode::Load, vec![Operand::Long(1)]).is_err());
}
