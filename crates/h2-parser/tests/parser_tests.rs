//! Parser tests: every statement form, control-flow nesting, directives,
//! definition flags and syntax errors.

use h2_parser::parse;
use h2_types::ast::*;
use h2_types::isa::Instruction;
use h2_types::{ErrorCode, H2Error, SourceFile};

// ─────────────────────────────────────────────────────────────────────
// Helpers
// ─────────────────────────────────────────────────────────────────────

fn parse_ok(source: &str) -> Vec<Statement> {
    let sf = SourceFile::new("test.fth", source);
    parse(&sf)
        .unwrap_or_else(|e| panic!("parse failed: {e}"))
        .statements
}

fn parse_err(source: &str) -> H2Error {
    let sf = SourceFile::new("test.fth", source);
    parse(&sf).expect_err("parse should fail")
}

fn single(source: &str) -> Statement {
    let mut stmts = parse_ok(source);
    assert_eq!(stmts.len(), 1, "expected one statement in {source:?}");
    stmts.remove(0)
}

fn literal_values(block: &[Statement]) -> Vec<u16> {
    block
        .iter()
        .map(|s| match s {
            Statement::Literal(l) => l.value,
            other => panic!("expected literal, got {other:?}"),
        })
        .collect()
}

fn symbol(op: &Operand) -> &str {
    match op {
        Operand::Symbol(id) => &id.name,
        Operand::Literal(n) => panic!("expected symbol, got literal {n}"),
    }
}

// ─────────────────────────────────────────────────────────────────────
// Simple statements
// ─────────────────────────────────────────────────────────────────────

#[test]
fn test_empty_program() {
    assert!(parse_ok("").is_empty());
    assert!(parse_ok("\\ only a comment\n").is_empty());
}

#[test]
fn test_literals_instructions_and_calls() {
    let stmts = parse_ok("1 2 + square");
    assert_eq!(stmts.len(), 4);
    assert!(matches!(stmts[0], Statement::Literal(Literal { value: 1, .. })));
    assert!(matches!(
        stmts[2],
        Statement::Instruction(InstructionStmt { instruction: Instruction::Add, .. })
    ));
    match &stmts[3] {
        Statement::CallWord(id) => assert_eq!(id.name, "square"),
        other => panic!("expected call, got {other:?}"),
    }
}

#[test]
fn test_label() {
    match single("start:") {
        Statement::Label(id) => assert_eq!(id.name, "start"),
        other => panic!("expected label, got {other:?}"),
    }
}

#[test]
fn test_jump_targets() {
    let stmts = parse_ok("call start branch 8 0branch \"loop\"");
    let jumps: Vec<&Jump> = stmts
        .iter()
        .map(|s| match s {
            Statement::Jump(j) => j,
            other => panic!("expected jump, got {other:?}"),
        })
        .collect();
    assert_eq!(jumps[0].kind, JumpKind::Call);
    assert_eq!(symbol(&jumps[0].target), "start");
    assert_eq!(jumps[1].kind, JumpKind::Branch);
    assert_eq!(jumps[1].target, Operand::Literal(8));
    assert_eq!(jumps[2].kind, JumpKind::ZeroBranch);
    assert_eq!(symbol(&jumps[2].target), "loop");
}

#[test]
fn test_declarations() {
    let stmts = parse_ok("constant ten 10 variable greeting \"hi\" hidden location buf 0");
    let decls: Vec<&Declaration> = stmts
        .iter()
        .map(|s| match s {
            Statement::Declaration(d) => d,
            other => panic!("expected declaration, got {other:?}"),
        })
        .collect();
    assert_eq!(decls[0].kind, DeclarationKind::Constant);
    assert_eq!(decls[0].value, DeclValue::Literal(10));
    assert!(!decls[0].hidden);
    assert_eq!(decls[1].kind, DeclarationKind::Variable);
    assert_eq!(decls[1].value, DeclValue::Str("hi".into()));
    assert!(decls[1].hidden);
    assert_eq!(decls[2].kind, DeclarationKind::Location);
    assert_eq!(decls[2].name.name, "buf");
}

#[test]
fn test_char_and_quote() {
    let stmts = parse_ok("[char] A ' emit ' \"odd name\"");
    assert!(matches!(stmts[0], Statement::Char(CharLit { ch: b'A', .. })));
    match (&stmts[1], &stmts[2]) {
        (Statement::Quote(a), Statement::Quote(b)) => {
            assert_eq!(a.name, "emit");
            assert_eq!(b.name, "odd name");
        }
        other => panic!("expected quotes, got {other:?}"),
    }
}

// ─────────────────────────────────────────────────────────────────────
// Control flow
// ─────────────────────────────────────────────────────────────────────

#[test]
fn test_if_then() {
    match single("if 1 then") {
        Statement::If(i) => {
            assert_eq!(literal_values(&i.then_body), [1]);
            assert!(i.else_body.is_none());
        }
        other => panic!("expected if, got {other:?}"),
    }
}

#[test]
fn test_if_else_then() {
    match single("if 1 else 2 3 then") {
        Statement::If(i) => {
            assert_eq!(literal_values(&i.then_body), [1]);
            assert_eq!(literal_values(i.else_body.as_deref().unwrap()), [2, 3]);
        }
        other => panic!("expected if, got {other:?}"),
    }
}

#[test]
fn test_begin_forms_are_retyped() {
    let kinds: Vec<BeginKind> = parse_ok("begin 1 until begin 2 again begin 3 while 4 repeat")
        .into_iter()
        .map(|s| match s {
            Statement::Begin(b) => b.kind,
            other => panic!("expected begin, got {other:?}"),
        })
        .collect();
    assert_eq!(kinds, [BeginKind::Until, BeginKind::Again, BeginKind::WhileRepeat]);

    match single("begin 3 while 4 5 repeat") {
        Statement::Begin(b) => {
            assert_eq!(literal_values(&b.body), [3]);
            assert_eq!(literal_values(&b.repeat_body), [4, 5]);
        }
        other => panic!("expected begin, got {other:?}"),
    }
}

#[test]
fn test_for_next_and_aft() {
    match single("for 1 next") {
        Statement::For(f) => {
            assert_eq!(literal_values(&f.body), [1]);
            assert!(f.aft.is_none());
        }
        other => panic!("expected for, got {other:?}"),
    }
    match single("for 1 aft 2 then 3 next") {
        Statement::For(f) => {
            let aft = f.aft.expect("aft clause");
            assert_eq!(literal_values(&f.body), [1]);
            assert_eq!(literal_values(&aft.aft_body), [2]);
            assert_eq!(literal_values(&aft.then_body), [3]);
        }
        other => panic!("expected for, got {other:?}"),
    }
}

#[test]
fn test_nested_control_flow() {
    match single(": f for begin dup if drop then again next ;") {
        Statement::Definition(d) => match &d.body[..] {
            [Statement::For(f)] => match &f.body[..] {
                [Statement::Begin(b)] => {
                    assert_eq!(b.kind, BeginKind::Again);
                    assert!(matches!(b.body[1], Statement::If(_)));
                }
                other => panic!("unexpected for body {other:?}"),
            },
            other => panic!("unexpected definition body {other:?}"),
        },
        other => panic!("expected definition, got {other:?}"),
    }
}

// ─────────────────────────────────────────────────────────────────────
// Definitions
// ─────────────────────────────────────────────────────────────────────

#[test]
fn test_definition_with_flags() {
    match single(": square dup * ; immediate inline") {
        Statement::Definition(d) => {
            assert_eq!(d.name.name, "square");
            assert_eq!(d.body.len(), 2);
            assert!(d.flags.contains(DefineFlags::IMMEDIATE));
            assert!(d.flags.contains(DefineFlags::INLINE));
            assert!(!d.flags.contains(DefineFlags::HIDDEN));
        }
        other => panic!("expected definition, got {other:?}"),
    }
}

#[test]
fn test_definition_named_by_string() {
    match single(": \"2*\" 1 lshift ; hidden") {
        Statement::Definition(d) => {
            assert_eq!(d.name.name, "2*");
            assert_eq!(d.flags, DefineFlags::HIDDEN);
        }
        other => panic!("expected definition, got {other:?}"),
    }
}

#[test]
fn test_flag_set_twice() {
    let err = parse_err(": a ; hidden inline hidden");
    assert_eq!(err.code, ErrorCode::FLAG_ALREADY_SET);
    assert_eq!(err.span.start_col, 21);
}

// ─────────────────────────────────────────────────────────────────────
// Directives
// ─────────────────────────────────────────────────────────────────────

#[test]
fn test_directives() {
    let stmts = parse_ok(".mode 3 .pc start .pwd 0 .allocate 32 .built-in .set 16 $pc .set x \"y\" .set x 5");
    let kinds: Vec<DirectiveKind> = stmts
        .into_iter()
        .map(|s| match s {
            Statement::Directive(d) => d.kind,
            other => panic!("expected directive, got {other:?}"),
        })
        .collect();
    assert_eq!(kinds[0], DirectiveKind::Mode(3));
    assert!(matches!(&kinds[1], DirectiveKind::Pc(op) if symbol(op) == "start"));
    assert_eq!(kinds[2], DirectiveKind::Pwd(Operand::Literal(0)));
    assert_eq!(kinds[3], DirectiveKind::Allocate(Operand::Literal(32)));
    assert_eq!(kinds[4], DirectiveKind::BuiltIn);
    match &kinds[5] {
        DirectiveKind::Set { location, value } => {
            assert_eq!(*location, Operand::Literal(16));
            assert_eq!(symbol(value), "$pc");
        }
        other => panic!("expected .set, got {other:?}"),
    }
    assert!(matches!(&kinds[6], DirectiveKind::Set { value, .. } if symbol(value) == "y"));
    assert!(matches!(&kinds[7], DirectiveKind::Set { value: Operand::Literal(5), .. }));
}

#[test]
fn test_mode_requires_literal() {
    assert_eq!(parse_err(".mode fast").code, ErrorCode::UNEXPECTED_TOKEN);
}

// ─────────────────────────────────────────────────────────────────────
// Errors
// ─────────────────────────────────────────────────────────────────────

#[test]
fn test_missing_then() {
    let err = parse_err("if 1 2");
    assert_eq!(err.code, ErrorCode::UNEXPECTED_TOKEN);
    assert_eq!(err.message, "expected 'then', got end of input");
}

#[test]
fn test_stray_terminator_at_top_level() {
    let err = parse_err("1\n2 then");
    assert_eq!(err.code, ErrorCode::UNEXPECTED_TOKEN);
    assert_eq!(err.span.start_line, 2);
    assert_eq!(err.message, "expected end of input, got 'then'");
}

#[test]
fn test_char_needs_single_character() {
    assert_eq!(parse_err("[char] ab").code, ErrorCode::EXPECTED_SINGLE_CHARACTER);
    assert_eq!(parse_err("[char] 7").code, ErrorCode::UNEXPECTED_TOKEN);
}

#[test]
fn test_declaration_needs_value() {
    assert_eq!(parse_err("constant x dup").code, ErrorCode::UNEXPECTED_TOKEN);
    assert_eq!(parse_err("variable 5 5").code, ErrorCode::UNEXPECTED_TOKEN);
}

#[test]
fn test_lexer_errors_surface_through_parse() {
    assert_eq!(parse_err("1 \"open").code, ErrorCode::UNTERMINATED_STRING);
    assert_eq!(parse_err(": a : b ; ;").code, ErrorCode::NESTED_DEFINITION);
}

#[test]
fn test_print_tree_of_parsed_program() {
    let sf = SourceFile::new("test.fth", ": f if 1 else 2 then ;");
    let tree = parse(&sf).unwrap().print_tree();
    assert_eq!(
        tree,
        "program\n  definition f\n    if\n      literal 1\n    else\n      literal 2\n  ;\n"
    );
}
