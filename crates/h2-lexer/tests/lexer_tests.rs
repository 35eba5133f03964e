//! Lexer tests: word classification, numbers, strings, comments, the
//! definition nesting check and error reporting.

use h2_lexer::{Lexer, Token, TokenKind};
use h2_types::isa::Instruction;
use h2_types::{ErrorCode, H2Error, SourceFile};

// ─────────────────────────────────────────────────────────────────────
// Helpers
// ─────────────────────────────────────────────────────────────────────

fn tokens(source: &str) -> Vec<Token> {
    let sf = SourceFile::new("test.fth", source);
    Lexer::new(&sf).lex().expect("lexing failed")
}

/// Token kinds without the final Eoi.
fn kinds(source: &str) -> Vec<TokenKind> {
    let mut kinds: Vec<_> = tokens(source).into_iter().map(|t| t.kind).collect();
    assert_eq!(kinds.pop(), Some(TokenKind::Eoi));
    kinds
}

fn lex_error(source: &str) -> H2Error {
    let sf = SourceFile::new("test.fth", source);
    Lexer::new(&sf).lex().expect_err("lexing should fail")
}

fn ident(s: &str) -> TokenKind {
    TokenKind::Identifier(s.to_string())
}

// ─────────────────────────────────────────────────────────────────────
// Classification
// ─────────────────────────────────────────────────────────────────────

#[test]
fn test_empty_input_is_just_eoi() {
    assert!(kinds("").is_empty());
    assert!(kinds("  \n\t \r\n").is_empty());
}

#[test]
fn test_numbers() {
    assert_eq!(
        kinds("0 42 -1 $ff -$10 $FFFF 70000"),
        vec![
            TokenKind::Literal(0),
            TokenKind::Literal(42),
            TokenKind::Literal(0xFFFF),
            TokenKind::Literal(0xFF),
            TokenKind::Literal(0xFFF0),
            TokenKind::Literal(0xFFFF),
            TokenKind::Literal(70000u32 as u16),
        ]
    );
}

#[test]
fn test_number_like_words_are_identifiers() {
    assert_eq!(kinds("- $ 1+ 2drop $fg"), vec![ident("-"), ident("$"), ident("1+"), ident("2drop"), ident("$fg")]);
}

#[test]
fn test_keywords_and_mnemonics() {
    assert_eq!(
        kinds(": inc 1 + ; immediate"),
        vec![
            TokenKind::Define,
            ident("inc"),
            TokenKind::Literal(1),
            TokenKind::Instruction(Instruction::Add),
            TokenKind::EndDefine,
            TokenKind::Immediate,
        ]
    );
    assert_eq!(
        kinds(".pc .pwd .set .mode .allocate .built-in [char] '"),
        vec![
            TokenKind::Pc,
            TokenKind::Pwd,
            TokenKind::Set,
            TokenKind::Mode,
            TokenKind::Allocate,
            TokenKind::BuiltIn,
            TokenKind::Char,
            TokenKind::Quote,
        ]
    );
}

#[test]
fn test_keywords_are_case_sensitive() {
    assert_eq!(kinds("DUP If"), vec![ident("DUP"), ident("If")]);
}

#[test]
fn test_labels() {
    assert_eq!(
        kinds("start: x:y :"),
        vec![TokenKind::Label("start".into()), ident("x:y"), TokenKind::Define]
    );
}

#[test]
fn test_single_colon_suffix_only_stripped_once() {
    assert_eq!(kinds("a::"), vec![TokenKind::Label("a:".into())]);
}

// ─────────────────────────────────────────────────────────────────────
// Strings and comments
// ─────────────────────────────────────────────────────────────────────

#[test]
fn test_string_keeps_raw_bytes() {
    assert_eq!(
        kinds("\"hello, world\" \"\" \"a\\b\""),
        vec![
            TokenKind::Str("hello, world".into()),
            TokenKind::Str(String::new()),
            TokenKind::Str("a\\b".into()),
        ]
    );
}

#[test]
fn test_comments_are_skipped() {
    let src = "1 \\ line comment\n( block\ncomment ) 2 ( x ) 3";
    assert_eq!(
        kinds(src),
        vec![TokenKind::Literal(1), TokenKind::Literal(2), TokenKind::Literal(3)]
    );
}

#[test]
fn test_paren_without_space_is_a_word() {
    assert_eq!(
        kinds("(save) (bye) (foo)"),
        vec![
            TokenKind::Instruction(Instruction::Save),
            TokenKind::Instruction(Instruction::Bye),
            ident("(foo)"),
        ]
    );
    assert_eq!(kinds("("), vec![ident("(")]);
}

#[test]
fn test_line_numbers_advance_through_comments() {
    let toks = tokens("1\n( a\nb )\n\\ c\n2");
    assert_eq!(toks[0].span.start_line, 1);
    assert_eq!(toks[1].kind, TokenKind::Literal(2));
    assert_eq!(toks[1].span.start_line, 5);
}

#[test]
fn test_token_columns() {
    let toks = tokens("  dup   swap");
    assert_eq!(toks[0].span.start_col, 3);
    assert_eq!(toks[0].span.end_col, 5);
    assert_eq!(toks[1].span.start_col, 9);
}

// ─────────────────────────────────────────────────────────────────────
// Errors
// ─────────────────────────────────────────────────────────────────────

#[test]
fn test_unterminated_string() {
    let err = lex_error("1 2\n\"abc");
    assert_eq!(err.code, ErrorCode::UNTERMINATED_STRING);
    assert_eq!(err.span.start_line, 2);
    assert_eq!(err.source_line, "\"abc");
}

#[test]
fn test_unterminated_comments() {
    assert_eq!(lex_error("1 ( never closed").code, ErrorCode::UNTERMINATED_COMMENT);
    assert_eq!(lex_error("1 \\ no newline").code, ErrorCode::UNTERMINATED_COMMENT);
}

#[test]
fn test_invalid_character() {
    let err = lex_error("dup \u{7f} drop");
    assert_eq!(err.code, ErrorCode::INVALID_CHARACTER);
    assert_eq!(err.span.start_col, 5);
}

#[test]
fn test_form_feed_is_not_whitespace() {
    let err = lex_error("dup \u{c} drop");
    assert_eq!(err.code, ErrorCode::INVALID_CHARACTER);
    assert_eq!(err.span.start_col, 5);

    // Vertical tab separates words; any space opens a comment.
    assert_eq!(kinds("1\u{b}2"), vec![TokenKind::Literal(1), TokenKind::Literal(2)]);
    assert_eq!(kinds("(\u{c}note ) 3"), vec![TokenKind::Literal(3)]);
}

#[test]
fn test_word_too_long() {
    let ok = "a".repeat(255);
    assert_eq!(kinds(&ok), vec![ident(&ok)]);
    let err = lex_error(&"a".repeat(256));
    assert_eq!(err.code, ErrorCode::IDENTIFIER_TOO_LONG);
}

#[test]
fn test_string_too_long() {
    let err = lex_error(&format!("\"{}\"", "x".repeat(300)));
    assert_eq!(err.code, ErrorCode::IDENTIFIER_TOO_LONG);
}

#[test]
fn test_nested_definition() {
    let err = lex_error(": a : b ; ;");
    assert_eq!(err.code, ErrorCode::NESTED_DEFINITION);
    assert_eq!(err.span.start_col, 5);
}

#[test]
fn test_unmatched_semicolon() {
    assert_eq!(lex_error("1 ;").code, ErrorCode::UNMATCHED_END_DEFINITION);
    assert_eq!(lex_error(": a ; ;").code, ErrorCode::UNMATCHED_END_DEFINITION);
}

#[test]
fn test_sequential_definitions_are_fine() {
    assert_eq!(kinds(": a ; : b ;").len(), 6);
}

// ─────────────────────────────────────────────────────────────────────
// Pull interface
// ─────────────────────────────────────────────────────────────────────

#[test]
fn test_next_token_after_end_keeps_returning_eoi() {
    let sf = SourceFile::new("test.fth", "dup");
    let mut lexer = Lexer::new(&sf);
    assert_eq!(
        lexer.next_token().unwrap().kind,
        TokenKind::Instruction(Instruction::Dup)
    );
    assert_eq!(lexer.next_token().unwrap().kind, TokenKind::Eoi);
    assert_eq!(lexer.next_token().unwrap().kind, TokenKind::Eoi);
}
