use std::fs;
use std::path::PathBuf;
use std::process::ExitCode;

use clap::error::ErrorKind;
use clap::Parser;
use miette::{IntoDiagnostic, Result};

use bcpu::debugger::{CommandReader, Debugger};
use bcpu::env::Env;
use bcpu::output::{file_message, message, MsgColor, Output};
use bcpu::{DebugMap, Image};

/// Step through a bcpu program image alongside its source.
#[derive(Parser)]
#[command(version)]
struct Args {
    /// Program image written by `basm --debug`
    program: PathBuf,
    /// Read debugger commands from argument before stdin, separated by `;` or newlines
    #[arg(short, long)]
    command: Option<String>,
    /// Produce minimal output, suited for blackbox tests
    #[arg(short, long)]
    minimal: bool,
}

fn main() -> Result<ExitCode> {
    let args = match Args::try_parse() {
        Ok(args) => args,
        Err(error) => {
            let _ = error.print();
            return Ok(match error.kind() {
                ErrorKind::DisplayHelp | ErrorKind::DisplayVersion => ExitCode::SUCCESS,
                _ => ExitCode::FAILURE,
            });
        }
    };
    let env = Env::from_env();
    Output::set_minimal(args.minimal);

    let debug_path = DebugMap::path_for(&args.program);
    if !debug_path.is_file() {
        eprintln!(
            "debug information not found, run the assembler with the -d flag to generate debug information"
        );
        return Ok(ExitCode::FAILURE);
    }

    let image = Image::from_bytes(&fs::read(&args.program).into_diagnostic()?)?;
    let debug_map = DebugMap::from_json(&fs::read_to_string(&debug_path).into_diagnostic()?)?;
    if !args.minimal {
        file_message(MsgColor::Green, "Debugging", &args.program);
        message(MsgColor::Cyan, "Help", "type 'help' for a list of commands");
    }

    let mut debugger = Debugger::new(image, debug_map, env);
    debugger.run(&mut CommandReader::stdin(args.command));
    Ok(ExitCode::SUCCESS)
}
