use std::process::ExitCode;

use pywise::main as pywise_main;

fn main() -> ExitCode {
    pywise_main(std::env::args_os())
}
