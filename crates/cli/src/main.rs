use std::process::ExitCode;

fn main() -> ExitCode {
    cartwheel_cli::run()
}
