//! Core parser infrastructure: token cursor, accept/expect helpers, errors.

use h2_lexer::{Lexer, Token, TokenKind};
use h2_types::ast::{Ident, Operand, Program};
use h2_types::{ErrorCode, H2Error, Result, SourceFile, Span};

/// The H2 parser.
///
/// Holds exactly one token of lookahead; the next token is lexed when the
/// current one is accepted.
pub struct Parser<'src> {
    lexer: Lexer<'src>,
    current: Token,
    previous_span: Span,
    source_file: &'src SourceFile,
}

impl<'src> Parser<'src> {
    pub fn new(source_file: &'src SourceFile) -> Self {
        Self {
            lexer: Lexer::new(source_file),
            current: Token::new(TokenKind::Eoi, Span::point(1, 1)),
            previous_span: Span::point(1, 1),
            source_file,
        }
    }

    /// `program := statements end-of-input`
    pub fn parse(mut self) -> Result<Program> {
        self.current = self.lexer.next_token()?;
        let start = self.current_span();
        let statements = self.statements()?;
        self.expect(&TokenKind::Eoi)?;
        Ok(Program {
            statements,
            span: start.merge(self.previous_span),
        })
    }

    // ── Token Cursor ──────────────────────────────────────────────────────────

    pub(crate) fn peek_kind(&self) -> &TokenKind {
        &self.current.kind
    }

    pub(crate) fn current_span(&self) -> Span {
        self.current.span
    }

    pub(crate) fn previous_span(&self) -> Span {
        self.previous_span
    }

    /// Consume the current token and lex the next one.
    pub(crate) fn advance(&mut self) -> Result<Token> {
        let next = if self.current.kind == TokenKind::Eoi {
            self.current.clone()
        } else {
            self.lexer.next_token()?
        };
        let token = std::mem::replace(&mut self.current, next);
        self.previous_span = token.span;
        Ok(token)
    }

    /// Consume the current token if it is exactly `kind`.
    pub(crate) fn accept(&mut self, kind: &TokenKind) -> Result<Option<Token>> {
        if self.peek_kind() == kind {
            self.advance().map(Some)
        } else {
            Ok(None)
        }
    }

    pub(crate) fn expect(&mut self, kind: &TokenKind) -> Result<Token> {
        match self.accept(kind)? {
            Some(token) => Ok(token),
            None => Err(self.unexpected(&kind.describe())),
        }
    }

    pub(crate) fn accept_literal(&mut self) -> Result<Option<(u16, Span)>> {
        if let TokenKind::Literal(n) = *self.peek_kind() {
            let span = self.advance()?.span;
            return Ok(Some((n, span)));
        }
        Ok(None)
    }

    pub(crate) fn accept_identifier(&mut self) -> Result<Option<Ident>> {
        if let TokenKind::Identifier(name) = self.peek_kind() {
            let name = name.clone();
            let span = self.advance()?.span;
            return Ok(Some(Ident::new(name, span)));
        }
        Ok(None)
    }

    pub(crate) fn accept_string(&mut self) -> Result<Option<(String, Span)>> {
        if let TokenKind::Str(text) = self.peek_kind() {
            let text = text.clone();
            let span = self.advance()?.span;
            return Ok(Some((text, span)));
        }
        Ok(None)
    }

    // ── Composite Helpers ─────────────────────────────────────────────────────

    pub(crate) fn expect_literal(&mut self) -> Result<(u16, Span)> {
        match self.accept_literal()? {
            Some(lit) => Ok(lit),
            None => Err(self.unexpected("literal")),
        }
    }

    pub(crate) fn expect_identifier(&mut self) -> Result<Ident> {
        match self.accept_identifier()? {
            Some(id) => Ok(id),
            None => Err(self.unexpected("identifier")),
        }
    }

    /// An identifier, or a string standing in for a name.
    pub(crate) fn expect_name(&mut self) -> Result<Ident> {
        if let Some(id) = self.accept_identifier()? {
            return Ok(id);
        }
        match self.accept_string()? {
            Some((text, span)) => Ok(Ident::new(text, span)),
            None => Err(self.unexpected("identifier or string")),
        }
    }

    /// A literal or a symbol name, in that order of preference.
    pub(crate) fn expect_literal_or_identifier(&mut self) -> Result<Operand> {
        if let Some((n, _)) = self.accept_literal()? {
            return Ok(Operand::Literal(n));
        }
        match self.accept_identifier()? {
            Some(id) => Ok(Operand::Symbol(id)),
            None => Err(self.unexpected("literal or identifier")),
        }
    }

    // ── Errors ────────────────────────────────────────────────────────────────

    pub(crate) fn unexpected(&self, expected: &str) -> H2Error {
        self.error_at(
            ErrorCode::UNEXPECTED_TOKEN,
            format!("expected {expected}, got {}", self.current.kind),
            self.current_span(),
        )
    }

    pub(crate) fn error_at(&self, code: ErrorCode, message: impl Into<String>, span: Span) -> H2Error {
        H2Error::at(self.source_file, code, message, span)
    }
}
