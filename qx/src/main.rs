#[macro_use]
extern crate clap;

use clap::Arg;
use qcpu::Vm;
use std::fs::File;
use std::io::prelude::*;
use std::io::BufReader;
use std::path::{Path, PathBuf};

#[derive(Debug)]
enum IOErrorContext {
    ReadInput,
    WriteOutput,
}

#[derive(Debug)]
enum Error {
    Qasm(qasm::Error),
    Io(std::io::Error, IOErrorContext, PathBuf),
}

impl std::fmt::Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Error::Io(err, context, path) => writeln!(
                f,
                "{} file \"{}\" failed: {}",
                match context {
                    IOErrorContext::ReadInput => "Reading input",
                    IOErrorContext::WriteOutput => "Writing output",
                },
                path.display(),
                err
            ),
            Error::Qasm(err) => write!(f, "Assembling input failed: {}", err),
        }
    }
}

const SYS_WRITE_CHAR: u16 = 0x06;
const SYS_READ_CHAR: u16 = 0x07;

fn bind_host_syscalls(vm: &mut Vm) {
    vm.bind(SYS_WRITE_CHAR, |state: &mut qcpu::VmState, _arg: qcpu::Arg| {
        let byte = (state.registers.x & 0x00FF) as u8;
        print!("{}", byte as char);
        let _ = std::io::stdout().flush();
    });

    vm.bind(SYS_READ_CHAR, |state: &mut qcpu::VmState, _arg: qcpu::Arg| {
        let mut byte = [0u8; 1];
        match std::io::stdin().read_exact(&mut byte) {
            Ok(()) => state.registers.x = byte[0] as u16,
            Err(_) => state.flags.exit = 0,
        }
    });
}

fn read_to_string(path: &Path) -> Result<String, Error> {
    let file =
        File::open(path).map_err(|err| Error::Io(err, IOErrorContext::ReadInput, path.to_owned()))?;
    let mut contents = String::new();
    BufReader::new(file)
        .read_to_string(&mut contents)
        .map_err(|err| Error::Io(err, IOErrorContext::ReadInput, path.to_owned()))?;
    Ok(contents)
}

fn read_image(path: &Path) -> Result<Vec<u8>, Error> {
    let file =
        File::open(path).map_err(|err| Error::Io(err, IOErrorContext::ReadInput, path.to_owned()))?;
    let mut bytes = Vec::new();
    BufReader::new(file)
        .read_to_end(&mut bytes)
        .map_err(|err| Error::Io(err, IOErrorContext::ReadInput, path.to_owned()))?;
    Ok(bytes)
}

fn run_image(path: &Path) -> Result<i32, Error> {
    let image = read_image(path)?;
    let mut vm = Vm::new();
    bind_host_syscalls(&mut vm);
    vm.load(&image)
        .map_err(|err| Error::Io(std::io::Error::new(std::io::ErrorKind::InvalidData, err.to_string()), IOErrorContext::ReadInput, path.to_owned()))?;
    Ok(vm.run())
}

fn assemble_to_file(source_path: &Path, output_path: &Path) -> Result<(), Error> {
    let source = read_to_string(source_path)?;
    let image = qasm::assemble(&source).map_err(Error::Qasm)?;

    let mut output_file = File::create(output_path)
        .map_err(|err| Error::Io(err, IOErrorContext::WriteOutput, output_path.to_owned()))?;
    output_file
        .write_all(&image)
        .map_err(|err| Error::Io(err, IOErrorContext::WriteOutput, output_path.to_owned()))?;
    Ok(())
}

fn main() {
    env_logger::init();

    let matches = app_from_crate!()
        .arg(
            Arg::with_name("ARG1")
                .help("An image to run, or a source file to assemble")
                .required(true)
                .index(1),
        )
        .arg(
            Arg::with_name("ARG2")
                .help("When given, ARG1 is treated as assembly source and written to this path as a byte image")
                .index(2),
        )
        .get_matches();

    let arg1 = Path::new(matches.value_of("ARG1").unwrap());
    let arg2 = matches.value_of("ARG2").map(Path::new);

    let result = match arg2 {
        Some(output) => assemble_to_file(arg1, output),
        None => run_image(arg1).map(|exit_code| {
            println!("Exit code: {}", exit_code);
        }),
    };

    if let Err(err) = result {
        eprintln!("{}", err);
        std::process::exit(1);
    }
}
