//! Word definitions, constant/variable declarations and directives.

use crate::parser::Parser;
use h2_lexer::TokenKind;
use h2_types::ast::*;
use h2_types::{ErrorCode, Result};

impl<'src> Parser<'src> {
    /// `: name statements ; { immediate | hidden | inline }`
    pub(crate) fn definition(&mut self) -> Result<Statement> {
        let start = self.advance()?.span;
        let name = self.expect_name()?;
        let body = self.statements()?;
        self.expect(&TokenKind::EndDefine)?;

        let mut flags = DefineFlags::NONE;
        loop {
            let flag = match self.peek_kind() {
                TokenKind::Immediate => DefineFlags::IMMEDIATE,
                TokenKind::Hidden => DefineFlags::HIDDEN,
                TokenKind::Inline => DefineFlags::INLINE,
                _ => break,
            };
            let token = self.advance()?;
            if flags.contains(flag) {
                return Err(self.error_at(
                    ErrorCode::FLAG_ALREADY_SET,
                    format!("{} bit already set on word '{}'", flag, name.name),
                    token.span,
                ));
            }
            flags.insert(flag);
        }

        Ok(Statement::Definition(Definition {
            name,
            body,
            flags,
            span: start.merge(self.previous_span()),
        }))
    }

    /// `constant|variable|location name (literal | string) [hidden]`
    pub(crate) fn declaration(&mut self, kind: DeclarationKind) -> Result<Statement> {
        let start = self.advance()?.span;
        let name = self.expect_identifier()?;
        let value = if let Some((n, _)) = self.accept_literal()? {
            DeclValue::Literal(n)
        } else if let Some((text, _)) = self.accept_string()? {
            DeclValue::Str(text)
        } else {
            return Err(self.unexpected("literal or string"));
        };
        let hidden = self.accept(&TokenKind::Hidden)?.is_some();
        Ok(Statement::Declaration(Declaration {
            kind,
            name,
            value,
            hidden,
            span: start.merge(self.previous_span()),
        }))
    }

    pub(crate) fn directive(&mut self) -> Result<Statement> {
        let keyword = self.advance()?;
        let kind = match keyword.kind {
            TokenKind::Pwd => DirectiveKind::Pwd(self.expect_literal_or_identifier()?),
            TokenKind::Pc => DirectiveKind::Pc(self.expect_literal_or_identifier()?),
            TokenKind::Allocate => DirectiveKind::Allocate(self.expect_literal_or_identifier()?),
            TokenKind::Mode => DirectiveKind::Mode(self.expect_literal()?.0),
            TokenKind::Set => {
                let location = self.expect_literal_or_identifier()?;
                let value = match self.accept_string()? {
                    Some((text, span)) => Operand::Symbol(Ident::new(text, span)),
                    None => self.expect_literal_or_identifier()?,
                };
                DirectiveKind::Set { location, value }
            }
            _ => DirectiveKind::BuiltIn,
        };
        Ok(Statement::Directive(Directive {
            kind,
            span: keyword.span.merge(self.previous_span()),
        }))
    }
}
