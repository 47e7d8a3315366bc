use std::process::ExitCode;

fn main() -> ExitCode {
    movemate_cli::run()
}
