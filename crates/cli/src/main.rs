use std::process::ExitCode;

fn main() -> ExitCode {
    storeagent_cli::run()
}
