use std::process::ExitCode;

fn main() -> ExitCode {
    salescope_cli::run()
}
