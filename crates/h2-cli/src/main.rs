//! `h2`: assemble a source file into `h2.blk`, or run `h2.blk`.
//!
//! ```text
//! h2 [-l level] [-v]... [-b block] source.fth    assemble
//! h2 [-l level] [-v]... [-b block]               run on stdin/stdout
//! ```

use clap::{ArgAction, Parser};
use h2_codegen::SymbolTable;
use h2_compiler::{assemble_with, load_image, read_source, save_image, AssemblerOptions, Error, BLOCK_FILE};
use h2_types::{LogLevel, LogRecord};
use h2_vm::{Exit, Machine, StdHost, VmOptions};
use std::io;
use std::path::{Path, PathBuf};
use std::process;
use std::thread;
use std::time::Duration;

/// How long the driver sleeps when the image is waiting for input.
const POLL_INTERVAL: Duration = Duration::from_millis(10);

const LEVELS: [LogLevel; 5] = [
    LogLevel::Fatal,
    LogLevel::Error,
    LogLevel::Warning,
    LogLevel::Info,
    LogLevel::Debug,
];

#[derive(Parser, Debug)]
#[command(name = "h2", about = "H2 assembler and simulator")]
/// Assemble a source file into a block file, or run the block file when no
/// source is given.
struct Args {
    /// Log level: fatal, error, warning, info or debug.
    #[arg(short = 'l', long = "log", value_name = "LEVEL", default_value = "warning", value_parser = parse_level)]
    log: LogLevel,
    /// Raise the log level one step per occurrence.
    #[arg(short = 'v', action = ArgAction::Count)]
    verbose: u8,
    /// Block file to write when assembling and to load when running.
    #[arg(short = 'b', long = "block", value_name = "FILE", default_value = BLOCK_FILE)]
    block: PathBuf,
    /// Source file to assemble.
    source: Option<PathBuf>,
}

fn parse_level(name: &str) -> Result<LogLevel, String> {
    LogLevel::from_name(name).ok_or_else(|| format!("unknown log level: {name}"))
}

impl Args {
    fn options(&self) -> AssemblerOptions {
        let index = (self.log as usize + usize::from(self.verbose)).min(LEVELS.len() - 1);
        AssemblerOptions {
            log_level: LEVELS[index],
        }
    }
}

fn print_log(records: &[LogRecord]) {
    for record in records {
        eprintln!("{record}");
    }
}

fn assemble_file(args: &Args, source: &Path) -> Result<i32, Error> {
    let text = read_source(source)?;
    let mut symbols = SymbolTable::new();
    let mut log = args.options().logger();
    let assembled = assemble_with(&text, &source.display().to_string(), &mut symbols, &mut log);
    print_log(&log.take_records());
    let assembled = assembled?;
    save_image(&assembled.program(), &args.block)?;
    Ok(0)
}

fn run_block(args: &Args) -> Result<i32, Error> {
    let image = load_image(&args.block)?;
    let mut machine = Machine::from_image(&image);
    let mut host = StdHost::new(io::stdin().lock(), io::stdout().lock(), &args.block);
    let options = VmOptions::default();
    loop {
        match machine.run(&mut host, &options)? {
            Exit::Yield => thread::sleep(POLL_INTERVAL),
            exit => return Ok(exit.code()),
        }
    }
}

fn main() {
    let args = Args::parse();

    let result = match &args.source {
        Some(source) => assemble_file(&args, source),
        None => run_block(&args),
    };
    match result {
        Ok(code) => process::exit(code),
        Err(e) => {
            eprintln!("[{}] {e}", LogLevel::Fatal);
            process::exit(1);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::error::ErrorKind;
    use clap::CommandFactory;

    fn args(list: &[&str]) -> Result<Args, clap::Error> {
        Args::try_parse_from(std::iter::once("h2").chain(list.iter().copied()))
    }

    #[test]
    fn test_command_definition() {
        Args::command().debug_assert();
    }

    #[test]
    fn test_no_arguments_runs_the_default_block() {
        let parsed = args(&[]).unwrap();
        assert_eq!(parsed.source, None);
        assert_eq!(parsed.block, PathBuf::from("h2.blk"));
        assert_eq!(parsed.options().log_level, LogLevel::Warning);
    }

    #[test]
    fn test_source_and_options() {
        let parsed = args(&["-l", "info", "-b", "out.blk", "prog.fth"]).unwrap();
        assert_eq!(parsed.source, Some(PathBuf::from("prog.fth")));
        assert_eq!(parsed.block, PathBuf::from("out.blk"));
        assert_eq!(parsed.options().log_level, LogLevel::Info);

        let parsed = args(&["--log", "fatal", "--block", "x.blk"]).unwrap();
        assert_eq!(parsed.block, PathBuf::from("x.blk"));
        assert_eq!(parsed.options().log_level, LogLevel::Fatal);
    }

    #[test]
    fn test_verbosity_counts_up_from_the_level() {
        assert_eq!(args(&["-v"]).unwrap().options().log_level, LogLevel::Info);
        assert_eq!(args(&["-vv"]).unwrap().options().log_level, LogLevel::Debug);
        assert_eq!(args(&["-v", "-v", "-v"]).unwrap().options().log_level, LogLevel::Debug);
        assert_eq!(args(&["-l", "error", "-v"]).unwrap().options().log_level, LogLevel::Warning);
    }

    #[test]
    fn test_bad_arguments() {
        assert!(args(&["-l"]).is_err());
        assert!(args(&["-l", "loud"]).unwrap_err().to_string().contains("loud"));
        assert!(args(&["-x"]).unwrap_err().to_string().contains("-x"));
        assert!(args(&["a.fth", "b.fth"]).unwrap_err().to_string().contains("b.fth"));
        assert_eq!(args(&["--help"]).unwrap_err().kind(), ErrorKind::DisplayHelp);
    }

    #[test]
    fn test_assemble_then_run_from_block() {
        let dir = std::env::temp_dir();
        let id = std::process::id();
        let source = dir.join(format!("h2-cli-{id}.fth"));
        let block = dir.join(format!("h2-cli-{id}.blk"));
        std::fs::write(&source, "2 3 + (bye)").unwrap();

        let parsed = args(&["-b", block.to_str().unwrap(), source.to_str().unwrap()]).unwrap();
        assert_eq!(assemble_file(&parsed, &source).unwrap(), 0);
        let image = load_image(&block).unwrap();
        std::fs::remove_file(&source).unwrap();
        std::fs::remove_file(&block).unwrap();

        let mut host = h2_vm::BufferHost::new("");
        let exit = Machine::from_image(&image).run(&mut host, &VmOptions::default()).unwrap();
        assert_eq!(exit.code(), 5);
    }

    #[test]
    fn test_assembly_failure_writes_nothing() {
        let dir = std::env::temp_dir();
        let id = std::process::id();
        let source = dir.join(format!("h2-cli-bad-{id}.fth"));
        let block = dir.join(format!("h2-cli-bad-{id}.blk"));
        std::fs::write(&source, "nowhere").unwrap();

        let parsed = args(&["-b", block.to_str().unwrap(), source.to_str().unwrap()]).unwrap();
        let err = assemble_file(&parsed, &source).unwrap_err();
        std::fs::remove_file(&source).unwrap();
        assert!(matches!(err, Error::Diagnostic(_)));
        assert!(err.to_string().contains("E200"), "{err}");
        assert!(!block.exists());
    }
}
