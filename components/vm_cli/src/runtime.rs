//! Runtime orchestration for the driver
//!
//! Wraps a [`Vm`] and the file formats it reads: assembly text and
//! compiled units, told apart by the compiled-unit magic.

use std::path::Path;
use std::rc::Rc;

use bytecode_system::{asm, codec, Instruction, Opcode, TranslationUnit, UnitHeader};
use interpreter::{HaltReason, Lit, Vm, VmConfig, VmError};
use log::debug;
use memory_manager::{ObjectPtr, Prim};

use crate::error::{CliError, CliResult};

/// Method bodies read from a source or compiled file.
pub fn read_methods(path: &Path) -> CliResult<Vec<Vec<Instruction>>> {
    let bytes = std::fs::read(path)?;
    if codec::is_compiled(&bytes) {
        let (header, methods) = codec::decode_unit(&bytes)?;
        debug!(
            "{}: compiled unit, module {:?}, package {:?}",
            path.display(),
            header.module,
            header.package
        );
        return Ok(methods);
    }
    let text = String::from_utf8(bytes).map_err(|_| CliError::NotSource(path.to_path_buf()))?;
    Ok(asm::assemble(&text)?)
}

/// Assembles `input` into a compiled unit at `output`. Returns the number
/// of methods written.
pub fn assemble_file(input: &Path, output: &Path, header: &UnitHeader) -> CliResult<usize> {
    let text = std::fs::read_to_string(input)?;
    let methods = asm::assemble(&text)?;
    let bytes = codec::encode_unit(header, methods.iter().map(Vec::as_slice))?;
    std::fs::write(output, bytes)?;
    Ok(methods.len())
}

/// Assembly text for either kind of unit file.
pub fn disassemble_file(path: &Path) -> CliResult<String> {
    let methods = read_methods(path)?;
    Ok(asm::disassemble(&methods))
}

/// Main runtime that owns the engine
pub struct Runtime {
    vm: Vm,
}

impl Runtime {
    /// Create a new runtime instance
    ///
    /// # Example
    /// ```
    /// use interpreter::VmConfig;
    /// use vm_cli::Runtime;
    ///
    /// let mut runtime = Runtime::new(VmConfig::default()).unwrap();
    /// let shown = runtime.eval_line("INT 6\nYLDC 5 %ptr\nLOAD %num0\nMOV %ptr %ret").unwrap();
    /// assert_eq!(shown, "6");
    /// ```
    pub fn new(config: VmConfig) -> CliResult<Self> {
        Ok(Runtime {
            vm: Vm::with_config(config)?,
        })
    }

    /// Loads and runs a unit file as a full frame.
    ///
    /// `argv` is bound to the file name followed by `args`.
    pub fn run_file(&mut self, path: &Path, args: &[String]) -> CliResult<()> {
        let methods = read_methods(path)?;
        let mut argv = vec![path.display().to_string()];
        argv.extend(args.iter().cloned());
        self.vm.bind_argv(&argv);
        self.vm.load(TranslationUnit::from_methods(methods));
        self.vm.run()?;
        Ok(())
    }

    /// Evaluates assembly text in the current scope and describes `%ret`.
    ///
    /// `UNTR` is appended to method 0 when missing.
    pub fn eval_line(&mut self, source: &str) -> CliResult<String> {
        let mut methods = asm::assemble(source)?;
        if let Some(main) = methods.first_mut() {
            if main.last().map(Instruction::opcode) != Some(Opcode::Untr) {
                main.push(Instruction::bare(Opcode::Untr)?);
            }
        }
        self.vm.eval(TranslationUnit::from_methods(methods));
        match self.vm.run() {
            Ok(()) => Ok(self.describe_ret()),
            Err(err @ VmError::StepLimit(_)) => {
                self.abandon();
                Err(err.into())
            }
            Err(err) => Err(err.into()),
        }
    }

    /// Drops whatever code is still pending.
    pub fn abandon(&mut self) {
        self.vm.hard_kill(HaltReason::Terminated);
        // Reports the kill just requested; nothing else is pending.
        let _ = self.vm.run();
    }

    /// Register dump as pretty JSON.
    pub fn dump_json(&self) -> CliResult<String> {
        Ok(serde_json::to_string_pretty(&self.vm.dump_state())?)
    }

    /// Full collection; returns the freed count.
    pub fn collect(&mut self) -> usize {
        self.vm.collect_garbage()
    }

    /// The engine.
    pub fn vm(&self) -> &Vm {
        &self.vm
    }

    /// The engine, mutably.
    pub fn vm_mut(&mut self) -> &mut Vm {
        &mut self.vm
    }

    /// Short text for `%ret`.
    pub fn describe_ret(&self) -> String {
        match self.vm.ret() {
            Some(obj) => self.describe(obj),
            None => "nil".to_string(),
        }
    }

    fn describe(&self, obj: &ObjectPtr) -> String {
        for (lit, text) in [(Lit::Nil, "nil"), (Lit::True, "true"), (Lit::False, "false")] {
            if *obj == self.vm.lit(lit) {
                return text.to_string();
            }
        }
        match obj.prim() {
            Prim::Nil => format!("<object {}>", obj.id()),
            Prim::Number(n) => n.to_string(),
            Prim::Str(s) => format!("{:?}", s),
            Prim::Symbol(sym) => format!("'{}", self.vm.symbols().name(sym)),
            other => format!("<{} {}>", other.kind_name(), obj.id()),
        }
    }
}
