use std::fs;
use std::path::PathBuf;
use std::process::ExitCode;

use clap::error::ErrorKind;
use clap::Parser;
use colored::Colorize;
use miette::{Diagnostic, IntoDiagnostic, Result};

use bcpu::output::{file_message, message, MsgColor};
use bcpu::{AsmError, DebugMap};

/// Assembler for the bcpu instruction set.
#[derive(Parser)]
#[command(version)]
struct Args {
    /// Assembly source to read
    input: PathBuf,
    /// Destination for the binary program image
    output: PathBuf,
    /// Also write debug information to `<output>.dbg`
    #[arg(short, long)]
    debug: bool,
}

fn main() -> Result<ExitCode> {
    let args = match Args::try_parse() {
        Ok(args) => args,
        Err(error) => {
            // Help and version go to stdout and succeed, anything else is a usage error
            let _ = error.print();
            return Ok(match error.kind() {
                ErrorKind::DisplayHelp | ErrorKind::DisplayVersion => ExitCode::SUCCESS,
                _ => ExitCode::FAILURE,
            });
        }
    };

    file_message(MsgColor::Green, "Assembling", &args.input);
    let src = fs::read_to_string(&args.input).into_diagnostic()?;
    let path = args.input.to_string_lossy();

    let air = match bcpu::assemble(&src, &path) {
        Ok(air) => air,
        Err(error) => {
            report(&error);
            file_message(MsgColor::Red, "Failed", &args.input);
            return Ok(ExitCode::FAILURE);
        }
    };
    message(MsgColor::Green, "Finished", "emit binary");

    // Serialize before writing anything
    let bytes = air.image().to_bytes();
    let debug = args
        .debug
        .then(|| (DebugMap::path_for(&args.output), air.debug_map(&src, &path).to_json()));

    fs::write(&args.output, bytes).into_diagnostic()?;
    if let Some((debug_path, json)) = debug {
        if let Err(error) = fs::write(&debug_path, json) {
            // No partial artifacts
            let _ = fs::remove_file(&args.output);
            return Err(error).into_diagnostic();
        }
        file_message(MsgColor::Green, "Saved", &debug_path);
    }
    file_message(MsgColor::Green, "Saved", &args.output);
    Ok(ExitCode::SUCCESS)
}

/// Print an assembly error as `path:line: message`, followed by its diagnostic code and help.
fn report(error: &AsmError) {
    eprintln!("{error}");
    if let Some(help) = error.help() {
        eprintln!("  {} {help}", "help:".cyan());
    }
    if let Some(code) = error.code() {
        eprintln!("  {} {code}", "code:".dimmed());
    }
}
