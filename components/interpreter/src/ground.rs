//! The ground translation unit
//!
//! Small fixed routines the engine jumps into for its own protocols: error
//! raising, `missing` dispatch, handler invocation, the bookkeeping around
//! wind thunks, and the loop drivers behind the looping natives. Index
//! order is fixed by [`Gtu`].

use std::rc::Rc;

use bytecode_system::{
    FunctionIndex, Instruction, InstructionError, Method, MethodSeek, Opcode, Operand, Reg,
    TranslationUnit,
};
use core_types::Symbol;

use crate::literals::Lit;
use crate::natives;

/// Ground routines, by method index.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Gtu {
    /// No code; the hard-kill target
    Empty = 0,
    /// `RET`
    Return,
    /// `THROW`
    Throw,
    /// Native terminate
    Terminate,
    /// Calls the innermost pending handler with the thrown object
    Handler,
    /// `CALL 1`
    CallOne,
    /// `CALL 0`
    CallZero,
    /// Calls `%ret` as a `missing` method with `%sym` as its argument
    Missing,
    /// True literal into `%ret`
    True,
    /// False literal into `%ret`
    False,
    /// Nil literal into `%ret`
    Nil,
    /// Throws a clone of `err.<%sym>` with `message` = `%ret`
    ErrorMessage,
    /// Throws a clone of `err.<%sym>`
    Error,
    /// Throws `%slf` after attaching a backtrace
    ThrowObj,
    /// Native panic
    Panic,
    /// Saves `%ret` on `%sto`
    Stored,
    /// Restores `%ret` from `%sto`
    Unstored,
    /// Calls `%ptr` with itself as receiver, then loops again
    LoopDo,
    /// Calls the method on top of `%sto` with the pending key
    Keys,
    /// Pops the key visitor off `%sto` into `%ret`
    KeyTerm,
    /// Tests the loop condition and branches to the body or out
    WhileDo,
    /// Leaves a `while` loop, keeping the last body result in `%ret`
    PopTwo,
    /// Runs the loop body once, then goes back to the condition
    WhileAgain,
}

impl Gtu {
    /// Every routine in index order.
    pub const ALL: [Gtu; 23] = [
        Gtu::Empty,
        Gtu::Return,
        Gtu::Throw,
        Gtu::Terminate,
        Gtu::Handler,
        Gtu::CallOne,
        Gtu::CallZero,
        Gtu::Missing,
        Gtu::True,
        Gtu::False,
        Gtu::Nil,
        Gtu::ErrorMessage,
        Gtu::Error,
        Gtu::ThrowObj,
        Gtu::Panic,
        Gtu::Stored,
        Gtu::Unstored,
        Gtu::LoopDo,
        Gtu::Keys,
        Gtu::KeyTerm,
        Gtu::WhileDo,
        Gtu::PopTwo,
        Gtu::WhileAgain,
    ];

    /// The method index.
    pub fn index(self) -> FunctionIndex {
        FunctionIndex(self as u32)
    }

    /// This routine as a method of `gtu`.
    pub fn method(self, gtu: &Rc<TranslationUnit>) -> Method {
        Method::new(Rc::clone(gtu), self.index())
    }

    /// A cursor at the start of this routine.
    pub fn seek(self, gtu: &Rc<TranslationUnit>) -> MethodSeek {
        self.method(gtu).seek()
    }

    fn body(self) -> Result<Vec<Instruction>, InstructionError> {
        use Reg::{Arg, Hand, Ptr, Ret, Slf, Sto};
        let native = |n: usize| Operand::Long(n as i64);

        let i = |op: Opcode, operands: Vec<Operand>| Instruction::new(op, operands);
        let long = |n: i64| Operand::Long(n);
        let lit = |l: Lit| Operand::Long(l.index() as i64);
        let reg = Operand::Reg;

        let attach_stack = || -> Result<Vec<Instruction>, InstructionError> {
            Ok(vec![
                i(Opcode::Push, vec![reg(Slf), reg(Sto)])?,
                i(Opcode::Locrt, vec![])?,
                i(Opcode::Pop, vec![reg(Slf), reg(Sto)])?,
                i(Opcode::Symn, vec![long(Symbol::STACK.index())])?,
                i(Opcode::Mov, vec![reg(Ret), reg(Ptr)])?,
                i(Opcode::Setf, vec![])?,
                i(Opcode::Throw, vec![])?,
            ])
        };

        let code = match self {
            Gtu::Empty => Vec::new(),
            Gtu::Return => vec![i(Opcode::Ret, vec![])?],
            Gtu::Throw => vec![i(Opcode::Throw, vec![])?],
            Gtu::Terminate => vec![i(Opcode::Cpp, vec![native(natives::TERMINATE)])?],
            Gtu::Handler => vec![
                i(Opcode::Pop, vec![reg(Slf), reg(Hand)])?,
                i(Opcode::Peek, vec![reg(Slf), reg(Arg)])?,
                i(Opcode::Pop, vec![reg(Ptr), reg(Sto)])?,
                i(Opcode::Call, vec![long(1)])?,
            ],
            Gtu::CallOne => vec![i(Opcode::Call, vec![long(1)])?],
            Gtu::CallZero => vec![i(Opcode::Call, vec![long(0)])?],
            Gtu::Missing => vec![
                i(Opcode::Yldc, vec![lit(Lit::Symbol), reg(Ptr)])?,
                i(Opcode::Load, vec![reg(Reg::Sym)])?,
                i(Opcode::Push, vec![reg(Ptr), reg(Arg)])?,
                i(Opcode::Mov, vec![reg(Ret), reg(Ptr)])?,
                i(Opcode::Call, vec![long(1)])?,
            ],
            Gtu::True => vec![i(Opcode::Yld, vec![lit(Lit::True), reg(Ret)])?],
            Gtu::False => vec![i(Opcode::Yld, vec![lit(Lit::False), reg(Ret)])?],
            Gtu::Nil => vec![i(Opcode::Yld, vec![lit(Lit::Nil), reg(Ret)])?],
            Gtu::ErrorMessage => {
                let mut code = vec![
                    i(Opcode::Push, vec![reg(Ret), reg(Sto)])?,
                    i(Opcode::Yld, vec![lit(Lit::Err), reg(Slf)])?,
                    i(Opcode::Rtrv, vec![])?,
                    i(Opcode::Pop, vec![reg(Ptr), reg(Sto)])?,
                    i(Opcode::Mov, vec![reg(Ret), reg(Slf)])?,
                    i(Opcode::Clone, vec![])?,
                    i(Opcode::Mov, vec![reg(Ret), reg(Slf)])?,
                    i(Opcode::Symn, vec![long(Symbol::MESSAGE.index())])?,
                    i(Opcode::Setf, vec![])?,
                ];
                code.extend(attach_stack()?);
                code
            }
            Gtu::Error => {
                let mut code = vec![
                    i(Opcode::Yld, vec![lit(Lit::Err), reg(Slf)])?,
                    i(Opcode::Rtrv, vec![])?,
                    i(Opcode::Mov, vec![reg(Ret), reg(Slf)])?,
                    i(Opcode::Clone, vec![])?,
                    i(Opcode::Mov, vec![reg(Ret), reg(Slf)])?,
                ];
                code.extend(attach_stack()?);
                code
            }
            Gtu::ThrowObj => attach_stack()?,
            Gtu::Panic => vec![i(Opcode::Cpp, vec![native(natives::PANIC)])?],
            Gtu::Stored => vec![i(Opcode::Push, vec![reg(Ret), reg(Sto)])?],
            Gtu::Unstored => vec![i(Opcode::Pop, vec![reg(Ret), reg(Sto)])?],
            Gtu::LoopDo => vec![
                i(Opcode::Push, vec![reg(Ptr), reg(Sto)])?,
                i(Opcode::Mov, vec![reg(Ptr), reg(Slf)])?,
                i(Opcode::Call, vec![long(0)])?,
                i(Opcode::Pop, vec![reg(Ptr), reg(Sto)])?,
                i(Opcode::Cpp, vec![native(natives::LOOP_DO)])?,
            ],
            Gtu::Keys => vec![
                i(Opcode::Peek, vec![reg(Ptr), reg(Sto)])?,
                i(Opcode::Call, vec![long(1)])?,
            ],
            Gtu::KeyTerm => vec![i(Opcode::Pop, vec![reg(Ret), reg(Sto)])?],
            // %sto holds the last body result over the body over the condition.
            Gtu::WhileDo => vec![
                i(Opcode::Pop, vec![reg(Ret), reg(Sto)])?,
                i(Opcode::Pop, vec![reg(Slf), reg(Sto)])?,
                i(Opcode::Peek, vec![reg(Ptr), reg(Sto)])?,
                i(Opcode::Push, vec![reg(Slf), reg(Sto)])?,
                i(Opcode::Push, vec![reg(Ret), reg(Sto)])?,
                i(Opcode::Call, vec![long(0)])?,
                i(Opcode::Yld, vec![lit(Lit::True), reg(Ptr)])?,
                i(Opcode::Mov, vec![reg(Ret), reg(Slf)])?,
                i(Opcode::Test, vec![])?,
                i(Opcode::Cpp, vec![native(natives::WHILE_REGS)])?,
                i(Opcode::Branch, vec![])?,
            ],
            Gtu::PopTwo => vec![
                i(Opcode::Pop, vec![reg(Ret), reg(Sto)])?,
                i(Opcode::Pop, vec![reg(Ptr), reg(Sto)])?,
                i(Opcode::Pop, vec![reg(Ptr), reg(Sto)])?,
            ],
            Gtu::WhileAgain => vec![
                i(Opcode::Pop, vec![reg(Ret), reg(Sto)])?,
                i(Opcode::Peek, vec![reg(Slf), reg(Sto)])?,
                i(Opcode::Peek, vec![reg(Ptr), reg(Sto)])?,
                i(Opcode::Call, vec![long(0)])?,
                i(Opcode::Push, vec![reg(Ret), reg(Sto)])?,
                i(Opcode::Cpp, vec![native(natives::WHILE_REGS_ZERO)])?,
                i(Opcode::Goto, vec![])?,
            ],
        };
        Ok(code)
    }
}

/// Builds the ground unit.
pub fn build() -> Result<Rc<TranslationUnit>, InstructionError> {
    let methods = Gtu::ALL
        .iter()
        .map(|g| g.body())
        .collect::<Result<Vec<_>, _>>()?;
    Ok(TranslationUnit::from_methods(methods))
}
