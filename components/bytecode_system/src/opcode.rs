//! Opcodes, registers and the operand validator
//!
//! Every opcode has a fixed list of operand kinds. Both the instruction
//! constructor and the binary codec check operands against that list.

use std::fmt;

/// The kinds of operand an instruction can carry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OperandKind {
    /// One of `%ptr`, `%slf`, `%ret`
    ObjectReg,
    /// One of `%lex`, `%dyn`, `%arg`, `%sto`, `%hand`
    StackReg,
    /// Any register
    AnyReg,
    /// A signed integer with a 32-bit magnitude
    Long,
    /// A string
    Str,
    /// An index into the current translation unit
    Function,
}

macro_rules! opcodes {
    ($($name:ident = $byte:literal, $mnemonic:literal, [$($kind:ident),*];)*) => {
        /// The instruction set.
        ///
        /// Byte values are part of the compiled-file format.
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        #[repr(u8)]
        pub enum Opcode {
            $(
                #[doc = $mnemonic]
                $name = $byte,
            )*
        }

        impl Opcode {
            /// Every opcode in byte order.
            pub const ALL: &'static [Opcode] = &[$(Opcode::$name),*];

            /// Decodes an opcode byte.
            pub fn from_byte(byte: u8) -> Option<Opcode> {
                match byte {
                    $($byte => Some(Opcode::$name),)*
                    _ => None,
                }
            }

            /// The assembler mnemonic.
            pub fn mnemonic(self) -> &'static str {
                match self {
                    $(Opcode::$name => $mnemonic,)*
                }
            }

            /// Looks an opcode up by mnemonic (case-insensitive).
            pub fn from_mnemonic(text: &str) -> Option<Opcode> {
                let upper = text.to_ascii_uppercase();
                match upper.as_str() {
                    $($mnemonic => Some(Opcode::$name),)*
                    _ => None,
                }
            }

            /// The operand kinds this opcode expects, in order.
            pub fn operand_kinds(self) -> &'static [OperandKind] {
                match self {
                    $(Opcode::$name => &[$(OperandKind::$kind),*],)*
                }
            }
        }
    };
}

opcodes! {
    Mov = 0x01, "MOV", [ObjectReg, ObjectReg];
    Push = 0x02, "PUSH", [ObjectReg, StackReg];
    Pop = 0x03, "POP", [ObjectReg, StackReg];
    Getl = 0x04, "GETL", [ObjectReg];
    Getd = 0x05, "GETD", [ObjectReg];
    Eswap = 0x06, "ESWAP", [];
    Eclr = 0x07, "ECLR", [];
    Eset = 0x08, "ESET", [];
    Sym = 0x09, "SYM", [Str];
    Num = 0x0A, "NUM", [Str];
    Int = 0x0B, "INT", [Long];
    Float = 0x0C, "FLOAT", [Str];
    Nswap = 0x0D, "NSWAP", [];
    Call = 0x0E, "CALL", [Long];
    Xcall = 0x0F, "XCALL", [];
    Xcall0 = 0x10, "XCALL0", [Long];
    Ret = 0x11, "RET", [];
    Clone = 0x12, "CLONE", [];
    Rtrv = 0x13, "RTRV", [];
    Rtrvd = 0x14, "RTRVD", [];
    Str = 0x15, "STR", [Str];
    Sswap = 0x16, "SSWAP", [];
    Expd = 0x17, "EXPD", [AnyReg];
    Mthd = 0x18, "MTHD", [Function];
    Load = 0x19, "LOAD", [AnyReg];
    Setf = 0x1A, "SETF", [];
    Peek = 0x1B, "PEEK", [ObjectReg, StackReg];
    Symn = 0x1C, "SYMN", [Long];
    Cpp = 0x1D, "CPP", [Long];
    Bol = 0x1E, "BOL", [];
    Test = 0x1F, "TEST", [];
    Branch = 0x20, "BRANCH", [];
    Ccall = 0x21, "CCALL", [];
    Cgoto = 0x22, "CGOTO", [];
    Cret = 0x23, "CRET", [];
    Wnd = 0x24, "WND", [];
    Unwnd = 0x25, "UNWND", [];
    Throw = 0x26, "THROW", [];
    Throq = 0x27, "THROQ", [];
    Adds = 0x28, "ADDS", [];
    Arith = 0x29, "ARITH", [Long];
    Throa = 0x2A, "THROA", [Str];
    Locfn = 0x2B, "LOCFN", [Str];
    Locln = 0x2C, "LOCLN", [Long];
    Locrt = 0x2D, "LOCRT", [];
    Nret = 0x2E, "NRET", [];
    Untr = 0x2F, "UNTR", [];
    Cmplx = 0x30, "CMPLX", [Str, Str];
    Yld = 0x31, "YLD", [Long, ObjectReg];
    Yldc = 0x32, "YLDC", [Long, ObjectReg];
    Del = 0x33, "DEL", [];
    Arr = 0x34, "ARR", [Long];
    Dict = 0x35, "DICT", [Long];
    Xxx = 0x36, "XXX", [Long];
    Goto = 0x37, "GOTO", [];
    Mswap = 0x38, "MSWAP", [];
}

impl Opcode {
    /// The opcode byte.
    pub fn byte(self) -> u8 {
        self as u8
    }
}

impl fmt::Display for Opcode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.mnemonic())
    }
}

/// VM register identifiers.
///
/// Byte values are part of the compiled-file format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum Reg {
    /// General-purpose object register
    Ptr = 0x01,
    /// Object register holding the receiver
    Slf = 0x02,
    /// Object register holding results
    Ret = 0x03,
    /// Lexical scope stack
    Lex = 0x04,
    /// Dynamic scope stack
    Dyn = 0x05,
    /// Argument stack
    Arg = 0x06,
    /// Scratch storage stack
    Sto = 0x07,
    /// Code cursor
    Cont = 0x08,
    /// Call stack
    Stack = 0x09,
    /// Error flag
    Err0 = 0x0A,
    /// Secondary error flag
    Err1 = 0x0B,
    /// Symbol register
    Sym = 0x0C,
    /// Number register
    Num0 = 0x0D,
    /// Secondary number register
    Num1 = 0x0E,
    /// String register
    Str0 = 0x0F,
    /// Secondary string register
    Str1 = 0x10,
    /// Method register
    Mthd = 0x11,
    /// Native callback table
    Cpp = 0x12,
    /// Stream register
    Strm = 0x13,
    /// Process register
    Prcs = 0x14,
    /// Secondary method register
    Mthdz = 0x15,
    /// Boolean flag
    Flag = 0x16,
    /// Wind-frame list
    Wind = 0x17,
    /// Handler stack
    Hand = 0x18,
    /// Current line
    Line = 0x19,
    /// Current file
    File = 0x1A,
    /// Backtrace
    Trace = 0x1B,
    /// Translation-unit marker stack
    Trns = 0x1C,
    /// Literal table
    Lit = 0x1D,
    /// Ground translation unit
    Gtu = 0x1E,
}

const REG_NAMES: [(Reg, &str); 30] = [
    (Reg::Ptr, "ptr"),
    (Reg::Slf, "slf"),
    (Reg::Ret, "ret"),
    (Reg::Lex, "lex"),
    (Reg::Dyn, "dyn"),
    (Reg::Arg, "arg"),
    (Reg::Sto, "sto"),
    (Reg::Cont, "cont"),
    (Reg::Stack, "stack"),
    (Reg::Err0, "err0"),
    (Reg::Err1, "err1"),
    (Reg::Sym, "sym"),
    (Reg::Num0, "num0"),
    (Reg::Num1, "num1"),
    (Reg::Str0, "str0"),
    (Reg::Str1, "str1"),
    (Reg::Mthd, "mthd"),
    (Reg::Cpp, "cpp"),
    (Reg::Strm, "strm"),
    (Reg::Prcs, "prcs"),
    (Reg::Mthdz, "mthdz"),
    (Reg::Flag, "flag"),
    (Reg::Wind, "wind"),
    (Reg::Hand, "hand"),
    (Reg::Line, "line"),
    (Reg::File, "file"),
    (Reg::Trace, "trace"),
    (Reg::Trns, "trns"),
    (Reg::Lit, "lit"),
    (Reg::Gtu, "gtu"),
];

impl Reg {
    /// Decodes a register byte.
    pub fn from_byte(byte: u8) -> Option<Reg> {
        REG_NAMES
            .iter()
            .map(|&(reg, _)| reg)
            .find(|&reg| reg as u8 == byte)
    }

    /// The register byte.
    pub fn byte(self) -> u8 {
        self as u8
    }

    /// Lower-case assembler name (without the `%`).
    pub fn name(self) -> &'static str {
        REG_NAMES
            .iter()
            .find(|&&(reg, _)| reg == self)
            .map(|&(_, name)| name)
            .unwrap_or("?")
    }

    /// Looks a register up by assembler name.
    pub fn from_name(name: &str) -> Option<Reg> {
        let lower = name.to_ascii_lowercase();
        REG_NAMES
            .iter()
            .find(|&&(_, n)| n == lower)
            .map(|&(reg, _)| reg)
    }

    /// `%ptr`, `%slf` and `%ret`.
    pub fn is_object(self) -> bool {
        matches!(self, Reg::Ptr | Reg::Slf | Reg::Ret)
    }

    /// `%lex`, `%dyn`, `%arg`, `%sto` and `%hand`.
    pub fn is_stack(self) -> bool {
        matches!(self, Reg::Lex | Reg::Dyn | Reg::Arg | Reg::Sto | Reg::Hand)
    }

    /// Returns `true` when `self` may fill an operand of `kind`.
    pub fn fits(self, kind: OperandKind) -> bool {
        match kind {
            OperandKind::ObjectReg => self.is_object(),
            OperandKind::StackReg => self.is_stack(),
            OperandKind::AnyReg => true,
            _ => false,
        }
    }
}

impl fmt::Display for Reg {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "%{}", self.name())
    }
}
