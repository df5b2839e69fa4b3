//! Contract compliance tests for bytecode_system
//!
//! Every opcode survives encode/decode with representative operands, and the
//! byte values of opcodes and registers stay fixed.

use bytecode_system::codec::{decode_sequence, encode_sequence};
use bytecode_system::{FunctionIndex, Instruction, Opcode, Operand, OperandKind, Reg};

fn sample(kind: OperandKind) -> Operand {
    match kind {
        OperandKind::ObjectReg => Operand::Reg(Reg::Slf),
        OperandKind::StackReg => Operand::Reg(Reg::Hand),
        OperandKind::AnyReg => Operand::Reg(Reg::Str1),
        OperandKind::Long => Operand::Long(-123_456),
        OperandKind::Str => Operand::Str("na\0me".to_string()),
        OperandKind::Function => Operand::Func(FunctionIndex(77)),
    }
}

#[test]
fn test_every_opcode_round_trips() {
    let code: Vec<Instruction> = Opcode::ALL
        .iter()
        .map(|&op| {
            let operands = op.operand_kinds().iter().map(|&k| sample(k)).collect();
            Instruction::new(op, operands).unwrap()
        })
        .collect();
    let bytes = encode_sequence(&code).unwrap();
    assert_eq!(decode_sequence(&bytes).unwrap(), code);
}

#[test]
fn test_register_bytes_are_fixed() {
    assert_eq!(Reg::Ptr.byte(), 0x01);
    assert_eq!(Reg::Hand.byte(), 0x18);
    assert_eq!(Reg::Gtu.byte(), 0x1E);
}

#[test]
fn test_opcode_bytes_are_fixed() {
    assert_eq!(Opcode::Mov.byte(), 0x01);
    assert_eq!(Opcode::Call.byte(), 0x0E);
    assert_eq!(Opcode::Throw.byte(), 0x26);
    assert_eq!(Opcode::Yldc.byte(), 0x32);
}
