//! Statement lists and structured control flow.

use crate::parser::Parser;
use h2_lexer::TokenKind;
use h2_types::ast::*;
use h2_types::{ErrorCode, Result};

impl<'src> Parser<'src> {
    /// Parse statements until a token that cannot start one.
    ///
    /// The terminating token (`then`, `next`, `;`, end of input, ...) is left
    /// for the caller to expect.
    pub(crate) fn statements(&mut self) -> Result<Vec<Statement>> {
        let mut block = Vec::new();
        while let Some(stmt) = self.statement()? {
            block.push(stmt);
        }
        Ok(block)
    }

    fn statement(&mut self) -> Result<Option<Statement>> {
        let span = self.current_span();
        let stmt = match self.peek_kind().clone() {
            TokenKind::Call => self.jump(JumpKind::Call)?,
            TokenKind::Branch => self.jump(JumpKind::Branch)?,
            TokenKind::ZeroBranch => self.jump(JumpKind::ZeroBranch)?,
            TokenKind::Literal(value) => {
                self.advance()?;
                Statement::Literal(Literal { value, span })
            }
            TokenKind::Label(name) => {
                self.advance()?;
                Statement::Label(Ident::new(name, span))
            }
            TokenKind::Constant => self.declaration(DeclarationKind::Constant)?,
            TokenKind::Variable => self.declaration(DeclarationKind::Variable)?,
            TokenKind::Location => self.declaration(DeclarationKind::Location)?,
            TokenKind::If => self.if_stmt()?,
            TokenKind::Define => self.definition()?,
            TokenKind::Char => self.char_stmt()?,
            TokenKind::Begin => self.begin_loop()?,
            TokenKind::For => self.for_loop()?,
            TokenKind::Quote => {
                self.advance()?;
                Statement::Quote(self.expect_name()?)
            }
            TokenKind::Identifier(name) => {
                self.advance()?;
                Statement::CallWord(Ident::new(name, span))
            }
            TokenKind::Pwd
            | TokenKind::Set
            | TokenKind::Pc
            | TokenKind::Mode
            | TokenKind::Allocate
            | TokenKind::BuiltIn => self.directive()?,
            TokenKind::Instruction(instruction) => {
                self.advance()?;
                Statement::Instruction(InstructionStmt { instruction, span })
            }
            _ => return Ok(None),
        };
        Ok(Some(stmt))
    }

    /// `call|branch|0branch (literal | string | identifier)`
    fn jump(&mut self, kind: JumpKind) -> Result<Statement> {
        let start = self.advance()?.span;
        let target = if let Some((n, _)) = self.accept_literal()? {
            Operand::Literal(n)
        } else if let Some((text, span)) = self.accept_string()? {
            Operand::Symbol(Ident::new(text, span))
        } else {
            Operand::Symbol(self.expect_identifier()?)
        };
        Ok(Statement::Jump(Jump {
            kind,
            target,
            span: start.merge(self.previous_span()),
        }))
    }

    /// `if statements [else statements] then`
    fn if_stmt(&mut self) -> Result<Statement> {
        let start = self.advance()?.span;
        let then_body = self.statements()?;
        let else_body = match self.accept(&TokenKind::Else)? {
            Some(_) => Some(self.statements()?),
            None => None,
        };
        self.expect(&TokenKind::Then)?;
        Ok(Statement::If(IfStmt {
            then_body,
            else_body,
            span: start.merge(self.previous_span()),
        }))
    }

    /// `begin statements (until | again | while statements repeat)`
    fn begin_loop(&mut self) -> Result<Statement> {
        let start = self.advance()?.span;
        let mut node = BeginLoop {
            kind: BeginKind::Until,
            body: self.statements()?,
            repeat_body: Vec::new(),
            span: start,
        };
        if self.accept(&TokenKind::Again)?.is_some() {
            node.kind = BeginKind::Again;
        } else if self.accept(&TokenKind::While)?.is_some() {
            node.kind = BeginKind::WhileRepeat;
            node.repeat_body = self.statements()?;
            self.expect(&TokenKind::Repeat)?;
        } else {
            self.expect(&TokenKind::Until)?;
        }
        node.span = start.merge(self.previous_span());
        Ok(Statement::Begin(node))
    }

    /// `for statements [aft statements then statements] next`
    fn for_loop(&mut self) -> Result<Statement> {
        let start = self.advance()?.span;
        let body = self.statements()?;
        let aft = match self.accept(&TokenKind::Aft)? {
            Some(_) => {
                let aft_body = self.statements()?;
                self.expect(&TokenKind::Then)?;
                let then_body = self.statements()?;
                Some(AftClause {
                    aft_body,
                    then_body,
                })
            }
            None => None,
        };
        self.expect(&TokenKind::Next)?;
        Ok(Statement::For(ForLoop {
            body,
            aft,
            span: start.merge(self.previous_span()),
        }))
    }

    /// `[char] c` where `c` is a one-character identifier.
    fn char_stmt(&mut self) -> Result<Statement> {
        let start = self.advance()?.span;
        let id = self.expect_identifier()?;
        match id.name.as_bytes() {
            [ch] => Ok(Statement::Char(CharLit {
                ch: *ch,
                span: start.merge(id.span),
            })),
            _ => Err(self.error_at(
                ErrorCode::EXPECTED_SINGLE_CHARACTER,
                format!("expected single character, got identifier: {}", id.name),
                id.span,
            )),
        }
    }
}
