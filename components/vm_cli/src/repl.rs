//! REPL (Read-Eval-Print Loop) implementation
//!
//! Each line is assembled on its own and evaluated in the scope left by the
//! previous ones.

use rustyline::error::ReadlineError;
use rustyline::DefaultEditor;

use crate::error::{CliError, CliResult};
use crate::runtime::Runtime;

/// What the loop should do after a line.
#[derive(Debug, PartialEq, Eq)]
pub enum Outcome {
    /// Print this and keep going
    Show(String),
    /// Keep going silently
    Quiet,
    /// Leave the loop
    Exit,
}

/// Run the interactive REPL
pub fn run_repl(runtime: &mut Runtime) -> CliResult<()> {
    let mut editor = DefaultEditor::new()
        .map_err(|e| CliError::Repl(format!("failed to initialize editor: {}", e)))?;

    println!("protovm {}", env!("CARGO_PKG_VERSION"));
    println!("Type instructions, .help for commands, or .exit to quit.");

    loop {
        match editor.readline("pvm> ") {
            Ok(line) => {
                if !line.trim().is_empty() {
                    let _ = editor.add_history_entry(line.as_str());
                }
                match handle_line(runtime, &line) {
                    Ok(Outcome::Show(text)) => println!("{}", text),
                    Ok(Outcome::Quiet) => {}
                    Ok(Outcome::Exit) => break,
                    Err(e) => eprintln!("error: {}", e),
                }
            }
            Err(ReadlineError::Interrupted) => {
                println!("Press Ctrl-D or type .exit to quit");
            }
            Err(ReadlineError::Eof) => break,
            Err(err) => {
                return Err(CliError::Repl(format!("readline error: {}", err)));
            }
        }
    }

    Ok(())
}

/// Handles one input line.
pub fn handle_line(runtime: &mut Runtime, line: &str) -> CliResult<Outcome> {
    let trimmed = line.trim();
    if trimmed.is_empty() || trimmed.starts_with(';') {
        return Ok(Outcome::Quiet);
    }
    if trimmed.starts_with('.') && !trimmed.starts_with(".method") {
        return command(runtime, trimmed);
    }
    Ok(Outcome::Show(runtime.eval_line(line)?))
}

fn command(runtime: &mut Runtime, command: &str) -> CliResult<Outcome> {
    let text = match command {
        ".exit" | ".quit" => return Ok(Outcome::Exit),
        ".help" => [
            "REPL commands:",
            "  .help     show this message",
            "  .dump     print the register dump",
            "  .gc       run a full collection",
            "  .exit     leave the REPL",
        ]
        .join("\n"),
        ".dump" => runtime.dump_json()?,
        ".gc" => {
            let freed = runtime.collect();
            format!(
                "freed {} object(s), {} live",
                freed,
                runtime.vm().heap().live_count()
            )
        }
        _ => format!("unknown command {}; type .help", command),
    };
    Ok(Outcome::Show(text))
}
