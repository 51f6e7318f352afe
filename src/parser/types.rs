//! Type annotation parsing.
//!
//! Handles named types (optionally module qualified), pointers and
//! arrays. Like expressions it uses NUD/LED handlers with binding powers,
//! so `u8*[4]` reads as an array of four byte pointers.

use std::collections::HashMap;

use crate::{
    ast::types::TypeExpr,
    errors::errors::{Error, ErrorImpl},
    lexer::tokens::TokenKind,
};

use super::{decl::parse_path_segments, lookups::BindingPower, parser::Parser};

pub type TypeNUDHandler = fn(&mut Parser) -> Result<TypeExpr, Error>;
pub type TypeLEDHandler = fn(&mut Parser, TypeExpr, BindingPower) -> Result<TypeExpr, Error>;

pub type TypeNUDLookup = HashMap<TokenKind, TypeNUDHandler>;
pub type TypeLEDLookup = HashMap<TokenKind, TypeLEDHandler>;
pub type TypeBPLookup = HashMap<TokenKind, BindingPower>;

pub fn create_token_type_lookups(parser: &mut Parser) {
    parser.type_nud(TokenKind::Identifier, parse_symbol_type);
    parser.type_led(TokenKind::Star, BindingPower::Call, parse_pointer_type);
    parser.type_led(TokenKind::OpenBracket, BindingPower::Call, parse_array_type);
}

pub fn parse_symbol_type(parser: &mut Parser) -> Result<TypeExpr, Error> {
    let start = parser.current_token().span.start.clone();
    let mut segments = parse_path_segments(parser)?;

    // Segments are never empty, the first identifier is required
    let name = segments.pop().unwrap_or_default();
    let path = if segments.is_empty() {
        None
    } else {
        Some(segments.join("::"))
    };

    Ok(TypeExpr::Named {
        path,
        name,
        span: parser.span_from(&start),
    })
}

pub fn parse_pointer_type(
    parser: &mut Parser,
    left: TypeExpr,
    _bp: BindingPower,
) -> Result<TypeExpr, Error> {
    parser.expect(TokenKind::Star)?;
    Ok(TypeExpr::Pointer(Box::new(left)))
}

pub fn parse_array_type(
    parser: &mut Parser,
    left: TypeExpr,
    _bp: BindingPower,
) -> Result<TypeExpr, Error> {
    parser.expect(TokenKind::OpenBracket)?;

    let len = if parser.current_token_kind() == TokenKind::Number {
        let token = parser.advance().clone();
        let parsed = match token.value.strip_prefix("0x") {
            Some(hex) => u64::from_str_radix(hex, 16),
            None => token.value.parse::<u64>(),
        };

        match parsed {
            Ok(len) => Some(len),
            Err(_) => {
                return Err(Error::new(
                    ErrorImpl::NumberParseError { token: token.value },
                    token.span.start,
                ))
            }
        }
    } else {
        None
    };

    parser.expect(TokenKind::CloseBracket)?;

    Ok(TypeExpr::Array(Box::new(left), len))
}

pub fn parse_type(parser: &mut Parser, bp: BindingPower) -> Result<TypeExpr, Error> {
    // First parse NUD
    let token_kind = parser.current_token_kind();
    let nud = match parser.get_type_nud_lookup().get(&token_kind) {
        Some(handler) => *handler,
        None => {
            return Err(Error::new(
                ErrorImpl::UnexpectedTokenDetailed {
                    token: parser.current_token().value.clone(),
                    message: String::from("expected a type"),
                },
                parser.get_position(),
            ))
        }
    };

    let mut left = nud(parser)?;

    // While LED and current BP is less than BP of current token, continue parsing lhs
    loop {
        let token_kind = parser.current_token_kind();
        let token_bp = match parser.get_type_bp_lookup().get(&token_kind) {
            Some(token_bp) if *token_bp > bp => *token_bp,
            _ => break,
        };

        let led = match parser.get_type_led_lookup().get(&token_kind) {
            Some(handler) => *handler,
            None => break,
        };

        left = led(parser, left, token_bp)?;
    }

    Ok(left)
}
