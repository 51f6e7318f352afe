//! Unit tests for the lexer module.

use super::{lexer::tokenize, tokens::TokenKind};

fn kinds(source: &str) -> Vec<TokenKind> {
    tokenize(source, Some("test.lang".to_string()))
        .unwrap()
        .into_iter()
        .map(|token| token.kind)
        .collect()
}

#[test]
fn test_tokenize_keywords() {
    let tokens = kinds("let const fn macro generic module import struct union enum type extern");

    assert_eq!(
        tokens,
        vec![
            TokenKind::Let,
            TokenKind::Const,
            TokenKind::Fn,
            TokenKind::Macro,
            TokenKind::Generic,
            TokenKind::Module,
            TokenKind::Import,
            TokenKind::Struct,
            TokenKind::Union,
            TokenKind::Enum,
            TokenKind::Type,
            TokenKind::Extern,
            TokenKind::EOF,
        ]
    );
}

#[test]
fn test_tokenize_literal_keywords() {
    let tokens = kinds("true false nil");
    assert_eq!(
        tokens,
        vec![TokenKind::True, TokenKind::False, TokenKind::Nil, TokenKind::EOF]
    );
}

#[test]
fn test_tokenize_identifiers() {
    let tokens = tokenize("foo baz_123 _underscore CamelCase", Some("test.lang".to_string())).unwrap();

    assert_eq!(tokens[0].kind, TokenKind::Identifier);
    assert_eq!(tokens[0].value, "foo");
    assert_eq!(tokens[1].value, "baz_123");
    assert_eq!(tokens[2].value, "_underscore");
    assert_eq!(tokens[3].value, "CamelCase");
    assert_eq!(tokens[4].kind, TokenKind::EOF);
}

#[test]
fn test_tokenize_numbers() {
    let tokens = tokenize("42 3.14 0x1F 1_000", Some("test.lang".to_string())).unwrap();

    assert_eq!(tokens[0].kind, TokenKind::Number);
    assert_eq!(tokens[0].value, "42");
    assert_eq!(tokens[1].value, "3.14");
    assert_eq!(tokens[2].value, "0x1F");
    assert_eq!(tokens[3].value, "1000");
}

#[test]
fn test_tokenize_string_escapes() {
    let tokens = tokenize(r#""a\tb\n" "say \"hi\"" "\x41""#, Some("test.lang".to_string())).unwrap();

    assert_eq!(tokens[0].kind, TokenKind::String);
    assert_eq!(tokens[0].value, "a\tb\n");
    assert_eq!(tokens[1].value, "say \"hi\"");
    assert_eq!(tokens[2].value, "A");
}

#[test]
fn test_string_span_covers_quotes() {
    let tokens = tokenize("  \"abc\"", Some("test.lang".to_string())).unwrap();

    assert_eq!(tokens[0].span.start.0, 2);
    assert_eq!(tokens[0].span.end.0, 7);
}

#[test]
fn test_tokenize_operators() {
    let tokens = kinds("+ - * / % << >> <<= >>= & | ^ ~ ! && || == != < <= > >=");

    assert_eq!(
        tokens,
        vec![
            TokenKind::Plus,
            TokenKind::Dash,
            TokenKind::Star,
            TokenKind::Slash,
            TokenKind::Percent,
            TokenKind::ShiftLeft,
            TokenKind::ShiftRight,
            TokenKind::ShiftLeftEquals,
            TokenKind::ShiftRightEquals,
            TokenKind::Ampersand,
            TokenKind::Pipe,
            TokenKind::Caret,
            TokenKind::Tilde,
            TokenKind::Not,
            TokenKind::And,
            TokenKind::Or,
            TokenKind::Equals,
            TokenKind::NotEquals,
            TokenKind::Less,
            TokenKind::LessEquals,
            TokenKind::Greater,
            TokenKind::GreaterEquals,
            TokenKind::EOF,
        ]
    );
}

#[test]
fn test_tokenize_punctuation() {
    let tokens = kinds("a::b ?: ? : -> ++ -- += %=");

    assert_eq!(
        tokens,
        vec![
            TokenKind::Identifier,
            TokenKind::ColonColon,
            TokenKind::Identifier,
            TokenKind::Elvis,
            TokenKind::Question,
            TokenKind::Colon,
            TokenKind::Arrow,
            TokenKind::PlusPlus,
            TokenKind::MinusMinus,
            TokenKind::PlusEquals,
            TokenKind::PercentEquals,
            TokenKind::EOF,
        ]
    );
}

#[test]
fn test_tokenize_directives_and_attributes() {
    let tokens = kinds("@if(X) $include $assert $echo");

    assert_eq!(
        tokens,
        vec![
            TokenKind::At,
            TokenKind::If,
            TokenKind::OpenParen,
            TokenKind::Identifier,
            TokenKind::CloseParen,
            TokenKind::CtInclude,
            TokenKind::CtAssert,
            TokenKind::CtEcho,
            TokenKind::EOF,
        ]
    );
}

#[test]
fn test_comments_are_skipped() {
    let tokens = kinds("a // line comment\n/* block\ncomment */ b");
    assert_eq!(
        tokens,
        vec![TokenKind::Identifier, TokenKind::Identifier, TokenKind::EOF]
    );
}

#[test]
fn test_unknown_directive_is_an_error() {
    let result = tokenize("$unknown", Some("test.lang".to_string()));
    assert!(result.is_err());
}

#[test]
fn test_unrecognised_character() {
    let error = tokenize("let a = #;", Some("test.lang".to_string())).unwrap_err();

    assert_eq!(error.get_error_name(), "UnrecognisedToken");
    assert_eq!(error.get_position().0, 8);
}
