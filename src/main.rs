//! listdupes - resumable duplicate file finder
//!
//! Entry point for the listdupes CLI application.

use clap::Parser;
use listdupes::{cli::Cli, duplicates::FinderError, error::ExitCode};

fn main() {
    let cli = Cli::parse();

    match listdupes::run_app(cli) {
        Ok(outcome) => {
            if !outcome.final_message.is_empty() {
                eprintln!("{}", outcome.final_message);
            }
            std::process::exit(outcome.exit_code.as_i32());
        }
        Err(err) => {
            if err
                .downcast_ref::<FinderError>()
                .is_some_and(|e| matches!(e, FinderError::Interrupted))
            {
                eprintln!("You have quit the program.");
                std::process::exit(ExitCode::Interrupted.as_i32());
            }

            let exit_code = ExitCode::Degraded;
            eprintln!("[{}] Error: {:#}", exit_code.code_prefix(), err);
            std::process::exit(exit_code.as_i32());
        }
    }
}
