//! H2 toolchain pipeline.
//!
//! ```text
//! source → Lexer → Parser → AST → Code Generator (+ Symbol Table) → image → VM
//! ```
//!
//! Each stage is one recovery boundary: the first error ends the stage and
//! comes back as a structured [`H2Error`].

use h2_codegen::{Assembled, SymbolTable};
use h2_types::ast::Program;
use h2_types::{CompileErrors, H2Error, Image, ImageError, LogLevel, LogRecord, Logger, SourceFile};
use h2_vm::{Exit, Host, Machine, VmError, VmOptions};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fs::File;
use std::io;
use std::path::Path;
use thiserror::Error;

pub use h2_codegen::{Symbol, SymbolKind};

/// Default block file written by the assembler and read by the simulator.
pub const BLOCK_FILE: &str = "h2.blk";

/// Everything that can go wrong between a file on disk and a halted machine.
#[derive(Debug, Error)]
pub enum Error {
    #[error("{0}")]
    Diagnostic(#[from] H2Error),

    #[error(transparent)]
    Image(#[from] ImageError),

    #[error(transparent)]
    Vm(#[from] VmError),

    #[error("{path}: {source}")]
    Io {
        path: String,
        #[source]
        source: io::Error,
    },
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssemblerOptions {
    pub log_level: LogLevel,
}

impl AssemblerOptions {
    pub fn logger(&self) -> Logger {
        Logger::new(self.log_level)
    }
}

// ══════════════════════════════════════════════════════════════════════════════
// Pipeline
// ══════════════════════════════════════════════════════════════════════════════

/// Lex and parse a source file.
pub fn parse(source: &str, name: &str) -> Result<Program, H2Error> {
    h2_parser::parse(&SourceFile::new(name, source))
}

/// Assemble with a fresh symbol table and default options.
pub fn assemble(source: &str, name: &str) -> Result<Assembled, H2Error> {
    let mut symbols = SymbolTable::new();
    let mut log = AssemblerOptions::default().logger();
    assemble_with(source, name, &mut symbols, &mut log)
}

/// Assemble into an existing symbol table, so a later unit can refer to
/// this one's words. The logger's level selects how much is traced.
pub fn assemble_with(
    source: &str,
    name: &str,
    symbols: &mut SymbolTable,
    log: &mut Logger,
) -> Result<Assembled, H2Error> {
    let file = SourceFile::new(name, source);
    let program = h2_parser::parse(&file)?;
    log.log_with(LogLevel::Debug, || program.print_tree().trim_end().to_string());
    h2_codegen::assemble(&program, symbols, log).map_err(|e| e.to_diagnostic(&file))
}

/// Hex SHA-256 of an image in its on-disk byte order.
pub fn image_hash(image: &Image) -> String {
    Sha256::digest(image.to_bytes())
        .iter()
        .map(|b| format!("{b:02x}"))
        .collect()
}

/// Load an image into a fresh machine and run it.
pub fn run_image(image: &Image, host: &mut impl Host, options: &VmOptions) -> Result<Exit, VmError> {
    Machine::from_image(image).run(host, options)
}

// ══════════════════════════════════════════════════════════════════════════════
// Structured result
// ══════════════════════════════════════════════════════════════════════════════

/// The outcome of one compilation, serialisable for tooling.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompileResult {
    pub success: bool,
    /// Cells up to the final program counter, as written to a block file.
    pub image: Option<Vec<u16>>,
    pub image_hash: Option<String>,
    pub symbols: Option<SymbolTable>,
    pub errors: CompileErrors,
    pub log: Vec<LogRecord>,
}

pub fn compile_to_result(source: &str, name: &str) -> CompileResult {
    compile_to_result_with(source, name, &AssemblerOptions::default())
}

pub fn compile_to_result_with(source: &str, name: &str, options: &AssemblerOptions) -> CompileResult {
    let mut symbols = SymbolTable::new();
    let mut log = options.logger();
    match assemble_with(source, name, &mut symbols, &mut log) {
        Ok(assembled) => {
            let program = assembled.program();
            CompileResult {
                success: true,
                image_hash: Some(image_hash(&program)),
                image: Some(program.cells().to_vec()),
                symbols: Some(symbols),
                errors: CompileErrors::empty(),
                log: log.take_records(),
            }
        }
        Err(error) => {
            let mut errors = CompileErrors::empty();
            errors.push_error(error);
            CompileResult {
                success: false,
                image: None,
                image_hash: None,
                symbols: None,
                errors,
                log: log.take_records(),
            }
        }
    }
}

// ══════════════════════════════════════════════════════════════════════════════
// Block files
// ══════════════════════════════════════════════════════════════════════════════

fn io_error(path: &Path, source: io::Error) -> Error {
    Error::Io {
        path: path.display().to_string(),
        source,
    }
}

/// Read a source file. Bytes that are not UTF-8 decode to U+FFFD rather
/// than failing, so they surface as lexer errors or string contents.
pub fn read_source(path: &Path) -> Result<String, Error> {
    let bytes = std::fs::read(path).map_err(|e| io_error(path, e))?;
    Ok(String::from_utf8_lossy(&bytes).into_owned())
}

pub fn load_image(path: &Path) -> Result<Image, Error> {
    let file = File::open(path).map_err(|e| io_error(path, e))?;
    Ok(Image::read_from(io::BufReader::new(file))?)
}

pub fn save_image(image: &Image, path: &Path) -> Result<(), Error> {
    let file = File::create(path).map_err(|e| io_error(path, e))?;
    Ok(image.write_to(io::BufWriter::new(file))?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_image_hash_is_stable_hex() {
        let image = Image::new(vec![8; 8]).unwrap();
        let hash = image_hash(&image);
        assert_eq!(hash.len(), 64);
        assert!(hash.chars().all(|c| c.is_ascii_hexdigit()));
        assert_eq!(hash, image_hash(&image.clone()));
        assert_ne!(hash, image_hash(&Image::new(vec![8; 9]).unwrap()));
    }

    #[test]
    fn test_options_default_to_warnings() {
        let options = AssemblerOptions::default();
        assert_eq!(options.log_level, LogLevel::Warning);
        let json = serde_json::to_string(&options).unwrap();
        assert_eq!(json, r#"{"log_level":"warning"}"#);
    }

    #[test]
    fn test_read_source_accepts_non_utf8_bytes() {
        let path = std::env::temp_dir().join(format!("h2-latin1-{}.fth", std::process::id()));
        std::fs::write(&path, b"location s \"caf\xe9\" 1 (bye)").unwrap();
        let source = read_source(&path);
        std::fs::remove_file(&path).unwrap();

        let source = source.unwrap();
        assert!(source.contains("caf\u{fffd}"));
        assert!(assemble(&source, "latin1.fth").is_ok());
    }

    #[test]
    fn test_assembly_error_becomes_diagnostic() {
        let err = assemble("1\nnowhere", "t.fth").unwrap_err();
        assert_eq!(err.code, h2_types::ErrorCode::UNDEFINED_SYMBOL);
        assert_eq!(err.file, "t.fth");
        assert_eq!(err.span.start_line, 2);
        assert_eq!(err.source_line, "nowhere");
    }
}
