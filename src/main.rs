use std::process::ExitCode;

fn main() -> ExitCode {
    tubemute_lib::run()
}
