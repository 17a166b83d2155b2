use std::process::ExitCode;

fn main() -> ExitCode {
    gestor_cli::run()
}
