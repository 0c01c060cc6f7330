use git_cadence::{cli, ui};
use std::process::ExitCode;

fn main() -> ExitCode {
    match cli::main() {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::FAILURE,
        Err(e) => {
            ui::print_error(&format!("Error: {e:#}"));
            ExitCode::FAILURE
        }
    }
}
