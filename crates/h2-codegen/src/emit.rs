//! Lowering of statements to machine code.

use crate::assembler::{Assembler, AssemblerMode};
use crate::builtins::{built_in_words, DO_CONST, DO_NEXT, DO_VAR, R_MINUS_ONE};
use crate::error::{AssemblyError, AssemblyResult};
use crate::symbols::SymbolKind;
use h2_types::ast::*;
use h2_types::isa::{
    CODE_EXIT, CODE_FROMR, CODE_RAT, CODE_RDROP, CODE_TOR, CODE_T_N1, MAX_PROGRAM, OP_0BRANCH,
    OP_BRANCH, OP_CALL, OP_LITERAL,
};
use h2_types::Span;

impl<'a> Assembler<'a> {
    pub fn emit_block(&mut self, block: &[Statement]) -> AssemblyResult<()> {
        for stmt in block {
            self.emit_statement(stmt)?;
        }
        Ok(())
    }

    fn emit_statement(&mut self, stmt: &Statement) -> AssemblyResult<()> {
        self.check_overflow(stmt.span())?;

        match stmt {
            Statement::Label(id) => {
                let here = self.here();
                self.symbols.add(SymbolKind::Label, &id.name, here, false, id.span)?;
            }
            Statement::Jump(jump) => self.emit_jump(jump)?,
            Statement::Declaration(decl) => match decl.kind {
                DeclarationKind::Constant => self.emit_constant(decl)?,
                DeclarationKind::Variable | DeclarationKind::Location => self.emit_variable(decl)?,
            },
            Statement::Literal(lit) => self.generate_literal(lit.value),
            Statement::Instruction(i) => self.generate(i.instruction.encoding()),
            Statement::If(stmt) => self.emit_if(stmt)?,
            Statement::Begin(stmt) => self.emit_begin(stmt)?,
            Statement::For(stmt) => self.emit_for(stmt)?,
            Statement::Definition(def) => self.emit_definition(def)?,
            Statement::Char(c) => self.generate(OP_LITERAL | c.ch as u16),
            Statement::Quote(id) => {
                let symbol = self
                    .symbols
                    .lookup(&id.name)
                    .filter(|s| matches!(s.kind, SymbolKind::Call | SymbolKind::Label))
                    .ok_or_else(|| AssemblyError::NotCallable {
                        name: id.name.clone(),
                        span: id.span,
                    })?;
                let address = symbol.value << 1;
                self.generate_literal(address);
            }
            Statement::CallWord(id) => self.emit_call_word(id)?,
            Statement::Directive(d) => self.emit_directive(d)?,
        }
        Ok(())
    }

    fn lookup(&self, id: &Ident) -> AssemblyResult<(SymbolKind, u16)> {
        self.symbols
            .lookup(&id.name)
            .map(|s| (s.kind, s.value))
            .ok_or_else(|| AssemblyError::UndefinedSymbol {
                name: id.name.clone(),
                span: id.span,
            })
    }

    fn operand_value(&self, op: &Operand) -> AssemblyResult<u16> {
        match op {
            Operand::Literal(n) => Ok(*n),
            Operand::Symbol(id) => Ok(self.lookup(id)?.1),
        }
    }

    /// Emit a dictionary header: the link cell, then the counted name.
    fn emit_header(&mut self, name: &str, bits: u16, span: Span) -> AssemblyResult<()> {
        let link = self.hole();
        self.fix(link, self.pwd | bits);
        self.pwd = link << 1;
        self.pack_string(name, span)?;
        Ok(())
    }

    fn headers_enabled(&self) -> bool {
        self.mode.contains(AssemblerMode::HEADER)
    }

    fn optimizing(&self) -> bool {
        self.mode.contains(AssemblerMode::OPTIMIZE)
    }

    fn built_in(&self, word: &'static str, decl: &Declaration) -> AssemblyResult<u16> {
        self.symbols
            .lookup(word)
            .map(|s| s.value)
            .ok_or_else(|| AssemblyError::MissingBuiltIn {
                word,
                name: decl.name.name.clone(),
                span: decl.span,
            })
    }

    // ── Jumps and calls ─────────────────────────────────────────────────────

    fn emit_jump(&mut self, jump: &Jump) -> AssemblyResult<()> {
        let address = match &jump.target {
            Operand::Literal(n) => *n,
            Operand::Symbol(id) => {
                let (kind, value) = self.lookup(id)?;
                if kind == SymbolKind::Call && jump.kind != JumpKind::Call {
                    return Err(AssemblyError::BranchToCall {
                        name: id.name.clone(),
                        span: id.span,
                    });
                }
                value
            }
        };
        if address >= MAX_PROGRAM {
            return Err(AssemblyError::JumpOutOfRange {
                address,
                span: jump.span,
            });
        }
        let op = match jump.kind {
            JumpKind::Branch => OP_BRANCH,
            JumpKind::ZeroBranch => OP_0BRANCH,
            JumpKind::Call => OP_CALL,
        };
        self.generate(op | address);
        Ok(())
    }

    fn emit_call_word(&mut self, id: &Ident) -> AssemblyResult<()> {
        match self.lookup(id)? {
            (SymbolKind::Call, address) => self.generate(OP_CALL | address),
            (SymbolKind::Constant | SymbolKind::Variable, value) => self.generate_literal(value),
            (SymbolKind::Label, _) => {
                return Err(AssemblyError::NotCallable {
                    name: id.name.clone(),
                    span: id.span,
                })
            }
        }
        Ok(())
    }

    // ── Declarations ────────────────────────────────────────────────────────

    fn emit_constant(&mut self, decl: &Declaration) -> AssemblyResult<()> {
        let value = match decl.value {
            DeclValue::Literal(n) => n,
            DeclValue::Str(_) => {
                return Err(AssemblyError::InvalidConstant {
                    name: decl.name.name.clone(),
                    span: decl.span,
                })
            }
        };
        if self.headers_enabled() && self.built_ins_defined && !decl.hidden {
            let do_const = self.built_in(DO_CONST, decl)?;
            self.emit_header(&decl.name.name, 0, decl.span)?;
            self.generate(OP_CALL | do_const);
            let cell = self.hole();
            self.fix(cell, value);
        }
        self.symbols
            .add(SymbolKind::Constant, &decl.name.name, value, false, decl.name.span)
    }

    /// Variables and locations both reserve storage; a visible variable also
    /// gets a dictionary word that pushes the storage address.
    fn emit_variable(&mut self, decl: &Declaration) -> AssemblyResult<()> {
        let is_location = decl.kind == DeclarationKind::Location;
        if !is_location {
            if self.headers_enabled() && self.built_ins_defined && !decl.hidden {
                let do_var = self.built_in(DO_VAR, decl)?;
                self.emit_header(&decl.name.name, 0, decl.span)?;
                self.generate(OP_CALL | do_var);
            } else if !decl.hidden {
                return Err(AssemblyError::MissingBuiltIn {
                    word: DO_VAR,
                    name: decl.name.name.clone(),
                    span: decl.span,
                });
            }
        }

        self.here();
        let cell = match &decl.value {
            DeclValue::Literal(n) => {
                let cell = self.hole();
                self.fix(cell, *n);
                cell
            }
            DeclValue::Str(s) => self.pack_string(s, decl.span)?,
        };
        // Loads ignore the lowest address bit, so the symbol holds a byte address.
        self.symbols.add(
            SymbolKind::Variable,
            &decl.name.name,
            cell << 1,
            is_location,
            decl.name.span,
        )
    }

    // ── Control flow ────────────────────────────────────────────────────────

    fn emit_if(&mut self, stmt: &IfStmt) -> AssemblyResult<()> {
        let skip = self.hole();
        self.emit_block(&stmt.then_body)?;
        match &stmt.else_body {
            Some(else_body) => {
                let exit = self.hole();
                self.fix(skip, OP_0BRANCH | (exit + 1));
                self.emit_block(else_body)?;
                let end = self.here();
                self.fix(exit, OP_BRANCH | end);
            }
            None => {
                let end = self.here();
                self.fix(skip, OP_0BRANCH | end);
            }
        }
        Ok(())
    }

    fn emit_begin(&mut self, stmt: &BeginLoop) -> AssemblyResult<()> {
        let start = self.here();
        self.emit_block(&stmt.body)?;
        match stmt.kind {
            BeginKind::Again => self.generate(OP_BRANCH | start),
            BeginKind::Until => self.generate(OP_0BRANCH | start),
            BeginKind::WhileRepeat => {
                let exit = self.hole();
                self.emit_block(&stmt.repeat_body)?;
                self.generate(OP_BRANCH | start);
                let end = self.here();
                self.fix(exit, OP_0BRANCH | end);
            }
        }
        Ok(())
    }

    /// `r> 1- >r`, or a call to `r1-` when optimizing and it exists.
    fn generate_loop_decrement(&mut self) {
        match self.symbols.lookup(R_MINUS_ONE).map(|s| s.value) {
            Some(address) if self.optimizing() => self.generate(OP_CALL | address),
            _ => {
                self.generate(CODE_FROMR);
                self.generate(CODE_T_N1);
                self.generate(CODE_TOR);
            }
        }
    }

    /// The counter is tested before it is decremented, so a count of `n`
    /// runs the body `n + 1` times.
    fn emit_for(&mut self, stmt: &ForLoop) -> AssemblyResult<()> {
        let Some(aft) = &stmt.aft else {
            return self.emit_for_next(&stmt.body);
        };

        self.generate(CODE_TOR);
        self.emit_block(&stmt.body)?;
        let skip = self.hole();
        self.generate(CODE_RAT);
        self.generate_loop_decrement();
        let exit = self.hole();
        self.emit_block(&aft.aft_body)?;
        let then = self.here();
        self.fix(skip, OP_BRANCH | then);
        self.emit_block(&aft.then_body)?;
        self.generate(OP_BRANCH | (skip + 1));
        let end = self.here();
        self.fix(exit, OP_0BRANCH | end);
        self.generate(CODE_RDROP);
        Ok(())
    }

    fn emit_for_next(&mut self, body: &[Statement]) -> AssemblyResult<()> {
        let do_next = self.symbols.lookup(DO_NEXT).map(|s| s.value);
        self.generate(CODE_TOR);
        let start = self.here();
        self.emit_block(body)?;
        match do_next {
            Some(address) if self.optimizing() => {
                self.generate(OP_CALL | address);
                self.generate(start << 1);
            }
            _ => {
                self.generate(CODE_RAT);
                let exit = self.hole();
                self.generate_loop_decrement();
                self.generate(OP_BRANCH | start);
                let end = self.here();
                self.fix(exit, OP_0BRANCH | end);
                self.generate(CODE_RDROP);
            }
        }
        Ok(())
    }

    // ── Definitions ─────────────────────────────────────────────────────────

    fn emit_definition(&mut self, def: &Definition) -> AssemblyResult<()> {
        let hidden = def.flags.contains(DefineFlags::HIDDEN);
        if !def.flags.is_empty() && !self.headers_enabled() {
            return Err(AssemblyError::FlagsWithoutHeaders {
                name: def.name.name.clone(),
                span: def.span,
            });
        }
        if self.headers_enabled() && !hidden {
            self.emit_header(&def.name.name, def.flags.header_bits(), def.name.span)?;
        }
        let entry = self.here();
        self.symbols
            .add(SymbolKind::Call, &def.name.name, entry, hidden, def.name.span)?;
        if self.in_definition {
            return Err(AssemblyError::NestedDefinition {
                name: def.name.name.clone(),
                span: def.span,
            });
        }
        self.in_definition = true;
        self.emit_block(&def.body)?;
        self.generate(CODE_EXIT);
        self.in_definition = false;
        Ok(())
    }

    // ── Directives ──────────────────────────────────────────────────────────

    fn emit_directive(&mut self, d: &Directive) -> AssemblyResult<()> {
        match &d.kind {
            DirectiveKind::Set { location, value } => {
                let location = self.operand_value(location)?;
                let value = match value {
                    Operand::Literal(n) => *n,
                    Operand::Symbol(id) => self.set_value(id)?,
                };
                self.fix(location >> 1, value);
            }
            DirectiveKind::Pwd(op) => self.pwd = self.operand_value(op)?,
            DirectiveKind::Pc(op) => {
                let pc = self.operand_value(op)?;
                self.set_pc(pc);
            }
            DirectiveKind::Mode(mode) => self.mode = AssemblerMode(*mode),
            DirectiveKind::Allocate(op) => {
                let bytes = self.operand_value(op)?;
                self.set_pc(self.pc().wrapping_add(bytes >> 1));
            }
            DirectiveKind::BuiltIn => self.emit_built_ins(d.span)?,
        }
        Ok(())
    }

    /// Value for `.set`: a symbol (word addresses converted to bytes) or one
    /// of the pseudo-symbols `$pc` and `$pwd`.
    fn set_value(&mut self, id: &Ident) -> AssemblyResult<u16> {
        if let Some(symbol) = self.symbols.lookup(&id.name) {
            return Ok(match symbol.kind {
                SymbolKind::Call => symbol.value << 1,
                _ => symbol.value,
            });
        }
        match id.name.as_str() {
            "$pc" => Ok(self.pc() << 1),
            "$pwd" => Ok(self.pwd),
            _ => Err(AssemblyError::UndefinedSymbol {
                name: id.name.clone(),
                span: id.span,
            }),
        }
    }

    /// Emit the built-in word table. Only effective in header mode.
    fn emit_built_ins(&mut self, span: Span) -> AssemblyResult<()> {
        if !self.headers_enabled() {
            return Ok(());
        }
        if self.built_ins_defined {
            return Err(AssemblyError::BuiltInsRedefined { span });
        }
        self.built_ins_defined = true;

        for word in built_in_words().into_iter().filter(|w| w.compile) {
            if !word.hidden {
                let bits = if word.inline {
                    DefineFlags::INLINE.header_bits()
                } else {
                    0
                };
                self.emit_header(word.name, bits, span)?;
            }
            let entry = self.here();
            self.symbols
                .add(SymbolKind::Call, word.name, entry, word.hidden, span)?;
            for &code in &word.code {
                self.generate(code);
            }
            self.generate(CODE_EXIT);
        }
        Ok(())
    }
}
