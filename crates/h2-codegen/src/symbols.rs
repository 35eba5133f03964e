//! Symbol table: labels, words, constants and variables by name.

use crate::error::{AssemblyError, AssemblyResult};
use h2_types::Span;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::io::{self, Write};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SymbolKind {
    /// A code address captured with `name:`.
    Label,
    /// A word entry point.
    Call,
    Constant,
    /// A byte address of a storage cell.
    Variable,
}

impl fmt::Display for SymbolKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            SymbolKind::Label => "label",
            SymbolKind::Call => "call",
            SymbolKind::Constant => "constant",
            SymbolKind::Variable => "variable",
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Symbol {
    pub id: String,
    pub value: u16,
    pub kind: SymbolKind,
    /// Resolvable by the assembler but not a dictionary word in the image.
    pub hidden: bool,
}

/// A flat list of symbols. Names are unique; nothing is ever removed.
///
/// A table may outlive one assembly pass so several units can share it.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SymbolTable {
    symbols: Vec<Symbol>,
}

impl SymbolTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn lookup(&self, id: &str) -> Option<&Symbol> {
        self.symbols.iter().find(|s| s.id == id)
    }

    /// Add a symbol, failing if the name is already taken.
    pub fn add(
        &mut self,
        kind: SymbolKind,
        id: &str,
        value: u16,
        hidden: bool,
        span: Span,
    ) -> AssemblyResult<()> {
        if self.lookup(id).is_some() {
            return Err(AssemblyError::DuplicateSymbol {
                name: id.to_string(),
                span,
            });
        }
        self.symbols.push(Symbol {
            id: id.to_string(),
            value,
            kind,
            hidden,
        });
        Ok(())
    }

    pub fn iter(&self) -> impl Iterator<Item = &Symbol> {
        self.symbols.iter()
    }

    pub fn len(&self) -> usize {
        self.symbols.len()
    }

    pub fn is_empty(&self) -> bool {
        self.symbols.is_empty()
    }

    /// One `kind id value visibility` line per symbol, value printed signed.
    pub fn print(&self, mut out: impl Write) -> io::Result<()> {
        for s in &self.symbols {
            let visibility = if s.hidden { "hidden" } else { "visible" };
            writeln!(out, "{} {} {} {}", s.kind, s.id, s.value as i16, visibility)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn span() -> Span {
        Span::point(1, 1)
    }

    #[test]
    fn test_add_and_lookup() {
        let mut t = SymbolTable::new();
        t.add(SymbolKind::Constant, "ten", 10, false, span()).unwrap();
        t.add(SymbolKind::Call, "square", 0x20, true, span()).unwrap();
        let s = t.lookup("square").unwrap();
        assert_eq!(s.kind, SymbolKind::Call);
        assert_eq!(s.value, 0x20);
        assert!(s.hidden);
        assert!(t.lookup("Square").is_none());
        assert_eq!(t.len(), 2);
    }

    #[test]
    fn test_duplicate_is_an_error() {
        let mut t = SymbolTable::new();
        t.add(SymbolKind::Label, "x", 1, false, span()).unwrap();
        let err = t
            .add(SymbolKind::Constant, "x", 2, false, Span::point(3, 4))
            .unwrap_err();
        assert_eq!(
            err,
            AssemblyError::DuplicateSymbol {
                name: "x".into(),
                span: Span::point(3, 4)
            }
        );
        assert_eq!(t.lookup("x").unwrap().value, 1);
    }

    #[test]
    fn test_print_format() {
        let mut t = SymbolTable::new();
        t.add(SymbolKind::Constant, "minus-one", 0xFFFF, false, span()).unwrap();
        t.add(SymbolKind::Variable, "buf", 0x40, true, span()).unwrap();
        let mut out = Vec::new();
        t.print(&mut out).unwrap();
        assert_eq!(
            String::from_utf8(out).unwrap(),
            "constant minus-one -1 visible\nvariable buf 64 hidden\n"
        );
    }

    #[test]
    fn test_json_shape() {
        let mut t = SymbolTable::new();
        t.add(SymbolKind::Call, "dup", 9, false, span()).unwrap();
        let json = serde_json::to_string(&t).unwrap();
        assert_eq!(
            json,
            r#"{"symbols":[{"id":"dup","value":9,"kind":"call","hidden":false}]}"#
        );
    }
}
