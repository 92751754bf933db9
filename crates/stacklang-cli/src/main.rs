use std::{env, fs, path::Path, process::ExitCode, time::Instant};

use stacklang::{
    Diagnostic, Error, ProfilingTracer, Program, RunError, Runner, StderrTracer, StdInput, StdPrint, compile_reporting,
};

const USAGE: &str = "usage:
  stacklang compile <source> <output>
  stacklang run <bytecode> [--trace|--profile]
  stacklang exec <source> [--trace|--profile]";

/// Execution mode selected by the trailing flag of `run` and `exec`.
#[derive(Debug, Clone, Copy)]
enum Mode {
    Plain,
    Trace,
    Profile,
}

impl Mode {
    fn from_flag(flag: Option<&str>) -> Option<Self> {
        match flag {
            None => Some(Self::Plain),
            Some("--trace") => Some(Self::Trace),
            Some("--profile") => Some(Self::Profile),
            Some(_) => None,
        }
    }
}

fn main() -> ExitCode {
    let args: Vec<String> = env::args().skip(1).collect();
    let args: Vec<&str> = args.iter().map(String::as_str).collect();
    match args.as_slice() {
        ["compile", source, output] => compile_file(source, output),
        ["run", path, flag @ ..] if flag.len() <= 1 => match Mode::from_flag(flag.first().copied()) {
            Some(mode) => run_bytecode(path, mode),
            None => usage(),
        },
        ["exec", path, flag @ ..] if flag.len() <= 1 => match Mode::from_flag(flag.first().copied()) {
            Some(mode) => exec_source(path, mode),
            None => usage(),
        },
        _ => usage(),
    }
}

fn usage() -> ExitCode {
    eprintln!("{USAGE}");
    ExitCode::FAILURE
}

fn compile_file(source: &str, output: &str) -> ExitCode {
    let Some(code) = read_file(source) else {
        return ExitCode::FAILURE;
    };
    let program = match compile_reporting(&code, print_diagnostic) {
        Ok(program) => program,
        Err(err) => return report_compile_error(&err),
    };

    let written = if is_binary(output) {
        match program.dump() {
            Ok(bytes) => fs::write(output, bytes),
            Err(err) => {
                eprintln!("error: failed to serialize program: {err}");
                return ExitCode::FAILURE;
            }
        }
    } else {
        fs::write(output, program.to_string())
    };
    if let Err(err) = written {
        eprintln!("error: failed to write {output}: {err}");
        return ExitCode::FAILURE;
    }
    ExitCode::SUCCESS
}

fn run_bytecode(path: &str, mode: Mode) -> ExitCode {
    let loaded = if is_binary(path) {
        let Ok(bytes) = fs::read(path) else {
            println!("File '{path}' does not exist");
            return ExitCode::FAILURE;
        };
        Program::load(&bytes).map(Runner::from_program).map_err(Error::from)
    } else {
        let Some(text) = read_file(path) else {
            return ExitCode::FAILURE;
        };
        Runner::from_bytecode(&text)
    };
    match loaded {
        Ok(runner) => execute(&runner, mode),
        Err(err) => {
            eprintln!("error: {err}");
            ExitCode::FAILURE
        }
    }
}

fn exec_source(path: &str, mode: Mode) -> ExitCode {
    let Some(code) = read_file(path) else {
        return ExitCode::FAILURE;
    };
    match compile_reporting(&code, print_diagnostic) {
        Ok(program) => execute(&Runner::from_program(program), mode),
        Err(err) => report_compile_error(&err),
    }
}

fn execute(runner: &Runner, mode: Mode) -> ExitCode {
    let mut print = StdPrint::new();
    let start = Instant::now();
    let result = match mode {
        Mode::Plain => runner.run(&mut StdInput, &mut print),
        Mode::Trace => runner.run_traced(&mut StdInput, &mut print, StderrTracer::new()).map(drop),
        Mode::Profile => runner
            .run_traced(&mut StdInput, &mut print, ProfilingTracer::new())
            .map(|tracer| {
                eprintln!("{}", tracer.report());
                eprintln!("time taken: {:?}", start.elapsed());
            }),
    };
    drop(print);
    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => report_run_error(&err),
    }
}

/// Type errors go to stdout one per line as the compiler finds them.
fn print_diagnostic(diagnostic: &Diagnostic) {
    println!("{diagnostic}");
}

/// Prints syntax errors on stdout; type errors were already printed as they were found.
fn report_compile_error(err: &Error) -> ExitCode {
    if !matches!(err, Error::Compile(_)) {
        println!("{err}");
    }
    ExitCode::FAILURE
}

fn report_run_error(err: &RunError) -> ExitCode {
    eprintln!("Error: {err}");
    ExitCode::FAILURE
}

fn is_binary(path: &str) -> bool {
    Path::new(path).extension().is_some_and(|ext| ext == "bin")
}

fn read_file(file_path: &str) -> Option<String> {
    match fs::read_to_string(file_path) {
        Ok(contents) => Some(contents),
        Err(_) => {
            println!("File '{file_path}' does not exist");
            None
        }
    }
}
