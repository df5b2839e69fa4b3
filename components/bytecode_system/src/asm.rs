//! Text assembler and disassembler
//!
//! One instruction per line:
//!
//! ```text
//! ; comment
//! INT 40
//! PUSH %ptr, %arg
//! STR "line\n"
//! MTHD #1
//! .method
//! RET
//! ```
//!
//! A `.method` line closes the current body and starts the next one; the
//! first body is index 0.

use std::fmt::Write as _;
use std::iter::Peekable;
use std::str::CharIndices;

use thiserror::Error;

use crate::instruction::{FunctionIndex, Instruction, InstructionError, Operand};
use crate::opcode::{Opcode, Reg};

/// Assembler failures, tagged with the 1-based source line.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AsmError {
    /// Unknown mnemonic
    #[error("line {line}: unknown mnemonic `{name}`")]
    UnknownMnemonic {
        /// Source line
        line: usize,
        /// The word that was read
        name: String,
    },
    /// Malformed operand text
    #[error("line {line}: {message}")]
    Syntax {
        /// Source line
        line: usize,
        /// What went wrong
        message: String,
    },
    /// Operands do not fit the opcode
    #[error("line {line}: {source}")]
    Operands {
        /// Source line
        line: usize,
        /// Validator error
        source: InstructionError,
    },
}

/// Assembles `source` into method bodies.
///
/// # Examples
///
/// ```
/// use bytecode_system::asm::assemble;
///
/// let methods = assemble("INT 2\n.method\nRET ; body 1\n").unwrap();
/// assert_eq!(methods.len(), 2);
/// assert_eq!(methods[1][0].to_string(), "RET");
/// ```
pub fn assemble(source: &str) -> Result<Vec<Vec<Instruction>>, AsmError> {
    let mut methods = vec![Vec::new()];
    for (i, raw) in source.lines().enumerate() {
        let line = i + 1;
        let text = raw.trim();
        if text.is_empty() || text.starts_with(';') {
            continue;
        }
        if text.eq_ignore_ascii_case(".method") {
            methods.push(Vec::new());
            continue;
        }
        let (word, rest) = match text.find(char::is_whitespace) {
            Some(split) => (&text[..split], &text[split..]),
            None => (text, ""),
        };
        let opcode = Opcode::from_mnemonic(word).ok_or_else(|| AsmError::UnknownMnemonic {
            line,
            name: word.to_string(),
        })?;
        let operands = parse_operands(rest, line)?;
        let inst = Instruction::new(opcode, operands)
            .map_err(|source| AsmError::Operands { line, source })?;
        if let Some(body) = methods.last_mut() {
            body.push(inst);
        }
    }
    Ok(methods)
}

/// Prints method bodies in the syntax [`assemble`] reads.
pub fn disassemble<B: AsRef<[Instruction]>>(methods: &[B]) -> String {
    let mut out = String::new();
    for (i, body) in methods.iter().enumerate() {
        if i > 0 {
            out.push_str(".method\n");
        }
        for inst in body.as_ref() {
            let _ = writeln!(out, "{}", inst);
        }
    }
    out
}

fn syntax(line: usize, message: impl Into<String>) -> AsmError {
    AsmError::Syntax {
        line,
        message: message.into(),
    }
}

fn parse_operands(text: &str, line: usize) -> Result<Vec<Operand>, AsmError> {
    let mut operands = Vec::new();
    let mut chars = text.char_indices().peekable();
    while let Some(&(start, ch)) = chars.peek() {
        match ch {
            c if c.is_whitespace() || c == ',' => {
                chars.next();
            }
            ';' => break,
            '"' => {
                chars.next();
                operands.push(Operand::Str(parse_string(&mut chars, line)?));
            }
            _ => {
                let end = word_end(&mut chars, text.len());
                operands.push(parse_word(&text[start..end], line)?);
            }
        }
    }
    Ok(operands)
}

fn word_end(chars: &mut Peekable<CharIndices<'_>>, len: usize) -> usize {
    while let Some(&(i, c)) = chars.peek() {
        if c.is_whitespace() || c == ',' || c == ';' {
            return i;
        }
        chars.next();
    }
    len
}

fn parse_word(word: &str, line: usize) -> Result<Operand, AsmError> {
    if let Some(name) = word.strip_prefix('%') {
        return Reg::from_name(name)
            .map(Operand::Reg)
            .ok_or_else(|| syntax(line, format!("unknown register `{}`", word)));
    }
    if let Some(index) = word.strip_prefix('#') {
        return index
            .parse::<u32>()
            .map(|i| Operand::Func(FunctionIndex(i)))
            .map_err(|_| syntax(line, format!("bad function index `{}`", word)));
    }
    word.parse::<i64>()
        .map(Operand::Long)
        .map_err(|_| syntax(line, format!("bad operand `{}`", word)))
}

fn parse_string(chars: &mut Peekable<CharIndices<'_>>, line: usize) -> Result<String, AsmError> {
    let mut out = String::new();
    loop {
        let (_, c) = chars
            .next()
            .ok_or_else(|| syntax(line, "unterminated string"))?;
        match c {
            '"' => return Ok(out),
            '\\' => {
                let (_, e) = chars
                    .next()
                    .ok_or_else(|| syntax(line, "unterminated escape"))?;
                out.push(match e {
                    'n' => '\n',
                    't' => '\t',
                    '\\' => '\\',
                    '"' => '"',
                    '0' => '\0',
                    other => return Err(syntax(line, format!("unknown escape `\\{}`", other))),
                });
            }
            c => out.push(c),
        }
    }
}
