//! `protovm` entry point
//!
//! Parses arguments, installs the logger and dispatches to the runtime.

use std::process::ExitCode;

use bytecode_system::UnitHeader;
use clap::Parser;
use vm_cli::runtime::{assemble_file, disassemble_file};
use vm_cli::{Cli, CliResult, Command, Runtime};

fn main() -> ExitCode {
    let cli = Cli::parse();
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(cli.log_filter()))
        .init();

    match execute(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("protovm: {}", e);
            ExitCode::FAILURE
        }
    }
}

fn execute(cli: &Cli) -> CliResult<()> {
    match &cli.command {
        Some(Command::Run { file, args }) => {
            let mut runtime = Runtime::new(cli.vm_config()?)?;
            let result = runtime.run_file(file, args);
            if cli.dump {
                println!("{}", runtime.dump_json()?);
            }
            result
        }
        Some(Command::Asm {
            input,
            output,
            module,
            package,
        }) => {
            let header = UnitHeader {
                module: module.clone(),
                package: package.clone(),
            };
            let count = assemble_file(input, output, &header)?;
            log::info!("wrote {} method(s) to {}", count, output.display());
            Ok(())
        }
        Some(Command::Disasm { file }) => {
            print!("{}", disassemble_file(file)?);
            Ok(())
        }
        Some(Command::Repl) | None => {
            let mut runtime = Runtime::new(cli.vm_config()?)?;
            vm_cli::repl::run_repl(&mut runtime)?;
            if cli.dump {
                println!("{}", runtime.dump_json()?);
            }
            Ok(())
        }
    }
}
