use crate::{
    ast::{
        ast::{ConstValue, DeclSlot},
        declarations::{Decl, DeclKind, FuncDecl},
        expressions::{BinaryOp, Expr, ExprKind, PostUnaryOp, UnaryOp},
    },
    errors::errors::{Error, ErrorImpl},
    lexer::tokens::{Token, TokenKind},
};

use super::{
    decl::{parse_block_body, parse_params, parse_path_segments, parse_return_type},
    lookups::BindingPower,
    parser::Parser,
    types::parse_type,
};

pub fn parse_expr(parser: &mut Parser, bp: BindingPower) -> Result<Expr, Error> {
    // First parse NUD
    let token_kind = parser.current_token_kind();
    let nud = match parser.get_nud_lookup().get(&token_kind) {
        Some(nud) => *nud,
        None => {
            return Err(Error::new(
                ErrorImpl::UnexpectedToken {
                    token: parser.current_token().value.clone(),
                },
                parser.get_position(),
            ))
        }
    };

    let mut left = nud(parser)?;

    // While LED and current BP is less than BP of current token, continue parsing lhs
    loop {
        let token_kind = parser.current_token_kind();
        let token_bp = *parser
            .get_bp_lookup()
            .get(&token_kind)
            .unwrap_or(&BindingPower::Default);

        if token_bp <= bp {
            break;
        }

        let led = match parser.get_led_lookup().get(&token_kind) {
            Some(led) => *led,
            None => break,
        };

        left = led(parser, left, token_bp)?;
    }

    Ok(left)
}

fn parse_number(token: &Token) -> Result<ConstValue, Error> {
    let error = || {
        Error::new(
            ErrorImpl::NumberParseError {
                token: token.value.clone(),
            },
            token.span.start.clone(),
        )
    };

    let value = &token.value;
    if let Some(hex) = value.strip_prefix("0x").or_else(|| value.strip_prefix("0X")) {
        i128::from_str_radix(hex, 16)
            .map(ConstValue::Int)
            .map_err(|_| error())
    } else if value.contains(['.', 'e', 'E']) {
        value.parse::<f64>().map(ConstValue::Float).map_err(|_| error())
    } else {
        value.parse::<i128>().map(ConstValue::Int).map_err(|_| error())
    }
}

pub fn parse_primary_expr(parser: &mut Parser) -> Result<Expr, Error> {
    let token = parser.current_token().clone();

    let kind = match token.kind {
        TokenKind::Number => ExprKind::Const(parse_number(&token)?),
        TokenKind::String => ExprKind::Const(ConstValue::String(token.value.clone())),
        TokenKind::True => ExprKind::Const(ConstValue::Bool(true)),
        TokenKind::False => ExprKind::Const(ConstValue::Bool(false)),
        TokenKind::Nil => ExprKind::Const(ConstValue::Nil),
        TokenKind::Identifier => {
            let mut segments = parse_path_segments(parser)?;
            let name = segments.pop().unwrap_or_default();
            let path = if segments.is_empty() {
                None
            } else {
                Some(segments.join("::"))
            };

            return Ok(Expr::new(
                ExprKind::Identifier {
                    path,
                    name,
                    decl: None,
                },
                parser.span_from(&token.span.start),
            ));
        }
        _ => {
            return Err(Error::new(
                ErrorImpl::UnexpectedToken { token: token.value },
                token.span.start,
            ))
        }
    };

    parser.advance();
    Ok(Expr::new(kind, token.span))
}

fn binary_op(kind: TokenKind) -> Option<BinaryOp> {
    let op = match kind {
        TokenKind::Plus => BinaryOp::Add,
        TokenKind::Dash => BinaryOp::Sub,
        TokenKind::Star => BinaryOp::Mul,
        TokenKind::Slash => BinaryOp::Div,
        TokenKind::Percent => BinaryOp::Mod,
        TokenKind::Ampersand => BinaryOp::BitAnd,
        TokenKind::Pipe => BinaryOp::BitOr,
        TokenKind::Caret => BinaryOp::BitXor,
        TokenKind::ShiftLeft => BinaryOp::Shl,
        TokenKind::ShiftRight => BinaryOp::Shr,
        TokenKind::And => BinaryOp::And,
        TokenKind::Or => BinaryOp::Or,
        TokenKind::Equals => BinaryOp::Eq,
        TokenKind::NotEquals => BinaryOp::NotEq,
        TokenKind::Less => BinaryOp::Less,
        TokenKind::LessEquals => BinaryOp::LessEq,
        TokenKind::Greater => BinaryOp::Greater,
        TokenKind::GreaterEquals => BinaryOp::GreaterEq,
        TokenKind::Assignment => BinaryOp::Assign,
        TokenKind::PlusEquals => BinaryOp::AddAssign,
        TokenKind::MinusEquals => BinaryOp::SubAssign,
        TokenKind::StarEquals => BinaryOp::MulAssign,
        TokenKind::SlashEquals => BinaryOp::DivAssign,
        TokenKind::PercentEquals => BinaryOp::ModAssign,
        TokenKind::AmpersandEquals => BinaryOp::BitAndAssign,
        TokenKind::PipeEquals => BinaryOp::BitOrAssign,
        TokenKind::CaretEquals => BinaryOp::BitXorAssign,
        TokenKind::ShiftLeftEquals => BinaryOp::ShlAssign,
        TokenKind::ShiftRightEquals => BinaryOp::ShrAssign,
        _ => return None,
    };
    Some(op)
}

fn make_binary(operator: &Token, left: Expr, right: Expr) -> Result<Expr, Error> {
    let op = binary_op(operator.kind).ok_or_else(|| {
        Error::new(
            ErrorImpl::UnexpectedToken {
                token: operator.value.clone(),
            },
            operator.span.start.clone(),
        )
    })?;

    let span = left.span.join(&right.span);
    Ok(Expr::new(
        ExprKind::Binary {
            op,
            left: Box::new(left),
            right: Box::new(right),
        },
        span,
    ))
}

pub fn parse_binary_expr(parser: &mut Parser, left: Expr, bp: BindingPower) -> Result<Expr, Error> {
    let operator_token = parser.advance().clone();
    let right = parse_expr(parser, bp)?;

    make_binary(&operator_token, left, right)
}

/// Assignments are right associative.
pub fn parse_assignment_expr(parser: &mut Parser, left: Expr, _bp: BindingPower) -> Result<Expr, Error> {
    let operator_token = parser.advance().clone();
    let right = parse_expr(parser, BindingPower::Comma)?;

    make_binary(&operator_token, left, right)
}

pub fn parse_elvis_expr(parser: &mut Parser, left: Expr, _bp: BindingPower) -> Result<Expr, Error> {
    parser.advance();
    let right = parse_expr(parser, BindingPower::Assignment)?;

    let span = left.span.join(&right.span);
    Ok(Expr::new(
        ExprKind::Binary {
            op: BinaryOp::Elvis,
            left: Box::new(left),
            right: Box::new(right),
        },
        span,
    ))
}

pub fn parse_ternary_expr(parser: &mut Parser, cond: Expr, _bp: BindingPower) -> Result<Expr, Error> {
    parser.advance();
    let then_expr = parse_expr(parser, BindingPower::Comma)?;
    parser.expect(TokenKind::Colon)?;
    let else_expr = parse_expr(parser, BindingPower::Assignment)?;

    let span = cond.span.join(&else_expr.span);
    Ok(Expr::new(
        ExprKind::Conditional {
            cond: Box::new(cond),
            then_expr: Box::new(then_expr),
            else_expr: Box::new(else_expr),
        },
        span,
    ))
}

pub fn parse_prefix_expr(parser: &mut Parser) -> Result<Expr, Error> {
    let operator_token = parser.advance().clone();
    let op = match operator_token.kind {
        TokenKind::Dash => UnaryOp::Neg,
        TokenKind::Not => UnaryOp::Not,
        TokenKind::Tilde => UnaryOp::BitNot,
        TokenKind::Ampersand => UnaryOp::AddressOf,
        TokenKind::Star => UnaryOp::Deref,
        TokenKind::PlusPlus => UnaryOp::Inc,
        _ => UnaryOp::Dec,
    };

    let rhs = parse_expr(parser, BindingPower::Unary)?;

    Ok(Expr::new(
        ExprKind::Unary {
            op,
            inner: Box::new(rhs),
        },
        parser.span_from(&operator_token.span.start),
    ))
}

pub fn parse_postfix_expr(parser: &mut Parser, left: Expr, _bp: BindingPower) -> Result<Expr, Error> {
    let operator_token = parser.advance().clone();
    let op = if operator_token.kind == TokenKind::PlusPlus {
        PostUnaryOp::Inc
    } else {
        PostUnaryOp::Dec
    };

    let span = left.span.join(&operator_token.span);
    Ok(Expr::new(
        ExprKind::PostUnary {
            op,
            inner: Box::new(left),
        },
        span,
    ))
}

pub fn parse_grouping_expr(parser: &mut Parser) -> Result<Expr, Error> {
    parser.advance();
    let expr = parse_expr(parser, BindingPower::Default)?;
    parser.expect(TokenKind::CloseParen)?;

    Ok(expr)
}

/// Comma separated expressions up to `close`, which is consumed.
fn parse_expr_list(parser: &mut Parser, close: TokenKind) -> Result<Vec<Expr>, Error> {
    let mut items = vec![];

    while parser.current_token_kind() != close {
        items.push(parse_expr(parser, BindingPower::Comma)?);

        if !parser.eat(TokenKind::Comma) {
            break;
        }
    }

    parser.expect(close)?;
    Ok(items)
}

pub fn parse_call_expr(parser: &mut Parser, left: Expr, _bp: BindingPower) -> Result<Expr, Error> {
    parser.advance();
    let args = parse_expr_list(parser, TokenKind::CloseParen)?;

    let start = left.span.start.clone();
    Ok(Expr::new(
        ExprKind::Call {
            callee: Box::new(left),
            args,
            expansion: None,
        },
        parser.span_from(&start),
    ))
}

pub fn parse_subscript_expr(parser: &mut Parser, left: Expr, _bp: BindingPower) -> Result<Expr, Error> {
    parser.advance();
    let index = parse_expr(parser, BindingPower::Default)?;
    parser.expect(TokenKind::CloseBracket)?;

    let start = left.span.start.clone();
    Ok(Expr::new(
        ExprKind::Subscript {
            base: Box::new(left),
            index: Box::new(index),
        },
        parser.span_from(&start),
    ))
}

pub fn parse_member_expr(parser: &mut Parser, left: Expr, _bp: BindingPower) -> Result<Expr, Error> {
    parser.advance();
    let error = parser.unexpected("expected a member name after `.`");
    let member = parser.expect_error(TokenKind::Identifier, Some(error))?.value;

    let start = left.span.start.clone();
    Ok(Expr::new(
        ExprKind::Access {
            base: Box::new(left),
            member,
        },
        parser.span_from(&start),
    ))
}

pub fn parse_initializer_list_expr(parser: &mut Parser) -> Result<Expr, Error> {
    let start = parser.advance().span.start.clone();
    let elements = parse_expr_list(parser, TokenKind::CloseBracket)?;

    Ok(Expr::new(
        ExprKind::InitializerList { elements },
        parser.span_from(&start),
    ))
}

pub fn parse_struct_value_expr(parser: &mut Parser) -> Result<Expr, Error> {
    // new Point { x: 1, y: 2 } or new Point { 1, 2 }
    let start = parser.advance().span.start.clone();
    let target = parse_type(parser, BindingPower::Default)?;
    let open = parser.expect(TokenKind::OpenCurly)?.span.start;

    let named = parser.current_token_kind() == TokenKind::Identifier
        && parser.peek_kind(1) == TokenKind::Colon;

    let init_kind = if named {
        let mut fields = vec![];

        while parser.current_token_kind() != TokenKind::CloseCurly {
            let field_name = parser.expect(TokenKind::Identifier)?.value;
            parser.expect(TokenKind::Colon)?;
            let field_value = parse_expr(parser, BindingPower::Comma)?;

            fields.push((field_name, field_value));

            if !parser.eat(TokenKind::Comma) {
                break;
            }
        }

        parser.expect(TokenKind::CloseCurly)?;
        ExprKind::StructInitValues { fields }
    } else {
        ExprKind::InitializerList {
            elements: parse_expr_list(parser, TokenKind::CloseCurly)?,
        }
    };

    let init = Expr::new(init_kind, parser.span_from(&open));

    Ok(Expr::new(
        ExprKind::StructValue {
            target,
            init: Box::new(init),
        },
        parser.span_from(&start),
    ))
}

pub fn parse_cast_expr(parser: &mut Parser) -> Result<Expr, Error> {
    // cast(value, Type)
    let start = parser.advance().span.start.clone();
    parser.expect(TokenKind::OpenParen)?;
    let inner = parse_expr(parser, BindingPower::Comma)?;
    parser.expect(TokenKind::Comma)?;
    let target = parse_type(parser, BindingPower::Default)?;
    parser.expect(TokenKind::CloseParen)?;

    Ok(Expr::new(
        ExprKind::Cast {
            target,
            inner: Box::new(inner),
        },
        parser.span_from(&start),
    ))
}

pub fn parse_sizeof_expr(parser: &mut Parser) -> Result<Expr, Error> {
    let start = parser.advance().span.start.clone();
    parser.expect(TokenKind::OpenParen)?;
    let target = parse_type(parser, BindingPower::Default)?;
    parser.expect(TokenKind::CloseParen)?;

    Ok(Expr::new(ExprKind::Sizeof { target }, parser.span_from(&start)))
}

pub fn parse_try_expr(parser: &mut Parser) -> Result<Expr, Error> {
    // try value else fallback
    let start = parser.advance().span.start.clone();
    let inner = parse_expr(parser, BindingPower::Ternary)?;

    let else_expr = if parser.eat(TokenKind::Else) {
        Some(Box::new(parse_expr(parser, BindingPower::Ternary)?))
    } else {
        None
    };

    Ok(Expr::new(
        ExprKind::Try {
            inner: Box::new(inner),
            else_expr,
        },
        parser.span_from(&start),
    ))
}

pub fn parse_lambda_expr(parser: &mut Parser) -> Result<Expr, Error> {
    // fn (a: i32) -> i32 { ... }
    let start = parser.advance().span.start.clone();
    let params = parse_params(parser)?;
    let ret = parse_return_type(parser)?;
    let body = parse_block_body(parser)?;
    let span = parser.span_from(&start);

    let decl = Decl::new(
        String::from("<lambda>"),
        DeclKind::Func(FuncDecl {
            owner: None,
            params,
            ret,
            body: Some(body),
            is_extern: false,
            is_lambda: true,
        }),
        span.clone(),
    );

    Ok(Expr::new(ExprKind::Lambda(DeclSlot::Parsed(Box::new(decl))), span))
}
