use std::process::ExitCode;

fn main() -> ExitCode {
    proposal_cli::run()
}
