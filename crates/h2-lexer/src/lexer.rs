//! Core H2 lexer.
//!
//! - Whitespace, `\` line comments and `( ... )` comments are skipped
//! - A `(` directly followed by a non-space starts a word, so `(save)` and
//!   `(bye)` are mnemonics rather than comments
//! - Any other run of graphic characters is a word, classified as number,
//!   keyword, label or identifier in that order
//! - `:` and `;` are tracked so nested definitions fail while lexing
//!
//! Every error is fatal: lexing of that input stops at the first one.

use h2_types::{ErrorCode, H2Error, Result, SourceFile, Span};

use crate::token::{Token, TokenKind};

/// Words and strings must be shorter than this many bytes.
pub const MAX_ID_LENGTH: usize = 256;

pub struct Lexer<'src> {
    source: &'src [u8],
    source_file: &'src SourceFile,
    pos: usize,
    /// 1-based.
    line: u32,
    /// 1-based.
    col: u32,
    in_definition: bool,
    finished: bool,
}

impl<'src> Lexer<'src> {
    pub fn new(source_file: &'src SourceFile) -> Self {
        Self {
            source: source_file.as_bytes(),
            source_file,
            pos: 0,
            line: 1,
            col: 1,
            in_definition: false,
            finished: false,
        }
    }

    /// Lex the entire input. The stream always ends with [`TokenKind::Eoi`].
    pub fn lex(mut self) -> Result<Vec<Token>> {
        let mut tokens = Vec::new();
        loop {
            let token = self.next_token()?;
            let done = token.kind == TokenKind::Eoi;
            tokens.push(token);
            if done {
                return Ok(tokens);
            }
        }
    }

    /// Scan one token. Once the end of input is reached every further call
    /// returns [`TokenKind::Eoi`] again.
    pub fn next_token(&mut self) -> Result<Token> {
        if self.finished {
            return Ok(Token::new(TokenKind::Eoi, self.current_span()));
        }
        self.skip_trivia()?;

        let (start_line, start_col) = (self.line, self.col);
        let kind = match self.peek() {
            None => {
                self.finished = true;
                TokenKind::Eoi
            }
            Some(b'"') => self.scan_string()?,
            Some(ch) if ch.is_ascii_graphic() => self.scan_word()?,
            Some(ch) => {
                return Err(self.error(
                    ErrorCode::INVALID_CHARACTER,
                    format!("invalid character: 0x{ch:02x}"),
                    self.current_span(),
                ));
            }
        };
        Ok(Token::new(kind, self.span_from(start_line, start_col)))
    }

    // ─────────────────────────────────────────────────────────────
    // Character-level helpers
    // ─────────────────────────────────────────────────────────────

    fn peek(&self) -> Option<u8> {
        self.source.get(self.pos).copied()
    }

    fn peek_at(&self, offset: usize) -> Option<u8> {
        self.source.get(self.pos + offset).copied()
    }

    fn advance(&mut self) -> Option<u8> {
        let ch = self.peek()?;
        self.pos += 1;
        if ch == b'\n' {
            self.line += 1;
            self.col = 1;
        } else {
            self.col += 1;
        }
        Some(ch)
    }

    fn current_span(&self) -> Span {
        Span::point(self.line, self.col)
    }

    fn span_from(&self, start_line: u32, start_col: u32) -> Span {
        Span::new(
            start_line,
            start_col,
            self.line,
            self.col.saturating_sub(1).max(1),
        )
    }

    fn error(&self, code: ErrorCode, message: impl Into<String>, span: Span) -> H2Error {
        H2Error::at(self.source_file, code, message, span)
    }

    // ─────────────────────────────────────────────────────────────
    // Whitespace & comments
    // ─────────────────────────────────────────────────────────────

    fn skip_trivia(&mut self) -> Result<()> {
        loop {
            match self.peek() {
                Some(b' ' | b'\t' | b'\r' | b'\n' | 0x0B) => {
                    self.advance();
                }
                Some(b'\\') => self.skip_line_comment()?,
                Some(b'(') if self.peek_at(1).is_some_and(|c| c.is_ascii_whitespace() || c == 0x0B) => {
                    self.skip_paren_comment()?
                }
                _ => return Ok(()),
            }
        }
    }

    /// `\` to end of line. The newline must be present.
    fn skip_line_comment(&mut self) -> Result<()> {
        let span = self.current_span();
        loop {
            match self.advance() {
                Some(b'\n') => return Ok(()),
                Some(_) => {}
                None => {
                    return Err(self.error(
                        ErrorCode::UNTERMINATED_COMMENT,
                        "'\\' comment terminated by end of input",
                        span,
                    ))
                }
            }
        }
    }

    fn skip_paren_comment(&mut self) -> Result<()> {
        let span = self.current_span();
        loop {
            match self.advance() {
                Some(b')') => return Ok(()),
                Some(_) => {}
                None => {
                    return Err(self.error(
                        ErrorCode::UNTERMINATED_COMMENT,
                        "'(' comment terminated by end of input",
                        span,
                    ))
                }
            }
        }
    }

    // ─────────────────────────────────────────────────────────────
    // Tokens
    // ─────────────────────────────────────────────────────────────

    fn scan_string(&mut self) -> Result<TokenKind> {
        let span = self.current_span();
        self.advance();
        let start = self.pos;
        loop {
            match self.peek() {
                Some(b'"') => break,
                Some(_) => {
                    if self.pos - start >= MAX_ID_LENGTH - 1 {
                        return Err(self.error(
                            ErrorCode::IDENTIFIER_TOO_LONG,
                            format!("string longer than {} bytes", MAX_ID_LENGTH - 1),
                            span,
                        ));
                    }
                    self.advance();
                }
                None => {
                    return Err(self.error(
                        ErrorCode::UNTERMINATED_STRING,
                        "string terminated by end of input",
                        span,
                    ))
                }
            }
        }
        let text = String::from_utf8_lossy(&self.source[start..self.pos]).into_owned();
        self.advance();
        Ok(TokenKind::Str(text))
    }

    fn scan_word(&mut self) -> Result<TokenKind> {
        let span = self.current_span();
        let start = self.pos;
        while self.peek().is_some_and(|c| c.is_ascii_graphic()) {
            if self.pos - start >= MAX_ID_LENGTH - 1 {
                return Err(self.error(
                    ErrorCode::IDENTIFIER_TOO_LONG,
                    format!("word longer than {} bytes", MAX_ID_LENGTH - 1),
                    span,
                ));
            }
            self.advance();
        }
        // Graphic characters are ASCII, so this never fails.
        let word = std::str::from_utf8(&self.source[start..self.pos]).unwrap_or_default();

        if let Some(n) = parse_number(word) {
            return Ok(TokenKind::Literal(n));
        }

        if let Some(kind) = TokenKind::from_keyword(word) {
            match kind {
                TokenKind::Define if self.in_definition => {
                    return Err(self.error(
                        ErrorCode::NESTED_DEFINITION,
                        "nested definitions are not allowed",
                        span,
                    ));
                }
                TokenKind::Define => self.in_definition = true,
                TokenKind::EndDefine if !self.in_definition => {
                    return Err(self.error(
                        ErrorCode::UNMATCHED_END_DEFINITION,
                        "';' does not terminate a word definition",
                        span,
                    ));
                }
                TokenKind::EndDefine => self.in_definition = false,
                _ => {}
            }
            return Ok(kind);
        }

        match word.strip_suffix(':') {
            Some(label) if !label.is_empty() => Ok(TokenKind::Label(label.to_string())),
            _ => Ok(TokenKind::Identifier(word.to_string())),
        }
    }
}

/// Parse `[-][$]digits`. Decimal unless prefixed with `$`; the value
/// wraps to 16 bits and `-` negates in two's complement.
pub fn parse_number(word: &str) -> Option<u16> {
    let (negate, rest) = match word.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, word),
    };
    let (radix, digits) = match rest.strip_prefix('$') {
        Some(hex) => (16, hex),
        None => (10, rest),
    };
    if digits.is_empty() {
        return None;
    }
    let mut value: u32 = 0;
    for c in digits.chars() {
        let digit = c.to_digit(radix)?;
        value = value.wrapping_mul(radix).wrapping_add(digit);
    }
    let value = value as u16;
    Some(if negate { value.wrapping_neg() } else { value })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_number() {
        assert_eq!(parse_number("0"), Some(0));
        assert_eq!(parse_number("1234"), Some(1234));
        assert_eq!(parse_number("-1"), Some(0xFFFF));
        assert_eq!(parse_number("$ff"), Some(0xFF));
        assert_eq!(parse_number("$FFFF"), Some(0xFFFF));
        assert_eq!(parse_number("-$10"), Some(0xFFF0));
        assert_eq!(parse_number("65536"), Some(0));
        assert_eq!(parse_number("-"), None);
        assert_eq!(parse_number("$"), None);
        assert_eq!(parse_number("-$"), None);
        assert_eq!(parse_number("12a"), None);
        assert_eq!(parse_number("$-5"), None);
        assert_eq!(parse_number("+5"), None);
    }
}
