#[macro_use]
extern crate colorify;

use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::{env, io};

use log::LevelFilter;

use synacor_vm::{Interpreter, Program, VmError};

fn main() -> ExitCode {
    let mut trace = false;
    let mut path = None;

    for arg in env::args().skip(1) {
        match arg.as_str() {
            "--trace" => trace = true,
            other => path = Some(PathBuf::from(other)),
        }
    }

    let mut builder = env_logger::Builder::new();
    builder.filter_level(if trace {
        LevelFilter::Trace
    } else {
        LevelFilter::Info
    });
    if let Ok(spec) = env::var("RUST_LOG") {
        builder.parse_filters(&spec);
    }
    builder.init();

    let path = match path {
        Some(path) => path,
        None => {
            printlnc!(red: "usage: synacor-vm <path-to-binary> [--trace]");
            return ExitCode::FAILURE;
        }
    };

    match run(&path) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            log::error!("{}", err);
            printlnc!(red: "program exited with an error: {}", err);
            ExitCode::FAILURE
        }
    }
}

fn run(path: &Path) -> Result<(), VmError> {
    let program = Program::load(path)?;
    let mut interpreter = Interpreter::new(program.into_memory());

    let mut stdin = io::stdin();
    let mut stdout = io::stdout();
    interpreter.run(&mut stdin, &mut stdout)
}
