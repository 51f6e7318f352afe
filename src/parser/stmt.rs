use crate::{
    ast::{ast::DeclSlot, statements::Stmt},
    errors::errors::Error,
    lexer::tokens::TokenKind,
    parser::{expr::parse_expr, lookups::BindingPower},
};

use super::{
    decl::{parse_block_body, parse_var_decl},
    parser::Parser,
};

pub fn parse_stmt(parser: &mut Parser) -> Result<Stmt, Error> {
    if let Some(handler) = parser.get_stmt_lookup().get(&parser.current_token_kind()) {
        let handler = *handler;
        return handler(parser);
    }

    let expr = parse_expr(parser, BindingPower::Default)?;

    parser.expect(TokenKind::Semicolon)?;

    Ok(Stmt::Expr(expr))
}

pub fn parse_local_var_stmt(parser: &mut Parser) -> Result<Stmt, Error> {
    let decl = parse_var_decl(parser, true)?;
    Ok(Stmt::Local(DeclSlot::Parsed(Box::new(decl))))
}

pub fn parse_if_stmt(parser: &mut Parser) -> Result<Stmt, Error> {
    let start = parser.advance().span.start.clone();

    let cond = parse_expr(parser, BindingPower::Default)?;
    let then_body = parse_stmt(parser)?;

    let else_body = if parser.eat(TokenKind::Else) {
        Some(Box::new(parse_stmt(parser)?))
    } else {
        None
    };

    Ok(Stmt::If {
        cond,
        then_body: Box::new(then_body),
        else_body,
        span: parser.span_from(&start),
    })
}

pub fn parse_while_stmt(parser: &mut Parser) -> Result<Stmt, Error> {
    let start = parser.advance().span.start.clone();

    let cond = parse_expr(parser, BindingPower::Default)?;
    let body = parse_stmt(parser)?;

    Ok(Stmt::While {
        cond,
        body: Box::new(body),
        span: parser.span_from(&start),
    })
}

/// `break;` and `continue;`
pub fn parse_break_stmt(parser: &mut Parser) -> Result<Stmt, Error> {
    let token = parser.advance().clone();
    parser.expect(TokenKind::Semicolon)?;

    let span = parser.span_from(&token.span.start);
    if token.kind == TokenKind::Break {
        Ok(Stmt::Break(span))
    } else {
        Ok(Stmt::Continue(span))
    }
}

pub fn parse_block_stmt(parser: &mut Parser) -> Result<Stmt, Error> {
    let start = parser.current_token().span.start.clone();
    let body = parse_block_body(parser)?;

    Ok(Stmt::Block {
        body,
        span: parser.span_from(&start),
    })
}

pub fn parse_return_stmt(parser: &mut Parser) -> Result<Stmt, Error> {
    let start = parser.advance().span.start.clone();

    let value = if parser.current_token_kind() != TokenKind::Semicolon {
        Some(parse_expr(parser, BindingPower::Default)?)
    } else {
        None
    };

    parser.expect(TokenKind::Semicolon)?;

    Ok(Stmt::Return {
        value,
        span: parser.span_from(&start),
    })
}
