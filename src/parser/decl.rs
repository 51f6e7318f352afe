//! Top level declarations.

use crate::{
    ast::{
        ast::Attribute,
        declarations::{
            Decl, DeclKind, EnumDecl, EnumVariant, Field, FuncDecl, GenericDecl, ImportDecl, Param,
            StructDecl, VarDecl, VarKind,
        },
        statements::Stmt,
        types::TypeExpr,
    },
    errors::errors::Error,
    lexer::tokens::TokenKind,
};

use super::{expr::parse_expr, lookups::BindingPower, parser::Parser, stmt::parse_stmt, types::parse_type};

/// `ident (:: ident)*`
pub fn parse_path_segments(parser: &mut Parser) -> Result<Vec<String>, Error> {
    let mut segments = vec![parser.expect(TokenKind::Identifier)?.value];

    while parser.current_token_kind() == TokenKind::ColonColon
        && parser.peek_kind(1) == TokenKind::Identifier
    {
        parser.advance();
        segments.push(parser.advance().value.clone());
    }

    Ok(segments)
}

pub fn parse_path(parser: &mut Parser) -> Result<String, Error> {
    Ok(parse_path_segments(parser)?.join("::"))
}

/// Zero or more `@name` or `@name(args)`.
pub fn parse_attributes(parser: &mut Parser) -> Result<Vec<Attribute>, Error> {
    let mut attributes = vec![];

    while parser.current_token_kind() == TokenKind::At {
        let start = parser.advance().span.start.clone();

        // `if` is a keyword but a valid attribute name
        let name = match parser.current_token_kind() {
            TokenKind::If => {
                parser.advance();
                String::from("if")
            }
            _ => {
                let error = parser.unexpected("expected an attribute name after `@`");
                parser.expect_error(TokenKind::Identifier, Some(error))?.value
            }
        };

        let mut args = vec![];
        if parser.eat(TokenKind::OpenParen) {
            while parser.current_token_kind() != TokenKind::CloseParen {
                args.push(parse_expr(parser, BindingPower::Comma)?);

                if !parser.eat(TokenKind::Comma) {
                    break;
                }
            }
            parser.expect(TokenKind::CloseParen)?;
        }

        attributes.push(Attribute {
            name,
            args,
            span: parser.span_from(&start),
        });
    }

    Ok(attributes)
}

pub fn parse_decl(parser: &mut Parser) -> Result<Decl, Error> {
    let attributes = parse_attributes(parser)?;
    parse_decl_with_attributes(parser, attributes)
}

pub fn parse_decl_with_attributes(
    parser: &mut Parser,
    attributes: Vec<Attribute>,
) -> Result<Decl, Error> {
    let handler = match parser.get_decl_lookup().get(&parser.current_token_kind()) {
        Some(handler) => *handler,
        None => return Err(parser.unexpected("expected a declaration")),
    };

    let mut decl = handler(parser)?;
    decl.attributes = attributes;
    Ok(decl)
}

/// `let name: Type = value;` or `const NAME = value;`
pub fn parse_var_decl(parser: &mut Parser, local: bool) -> Result<Decl, Error> {
    let start_token = parser.advance().clone();
    let is_constant = start_token.kind == TokenKind::Const;

    let error = parser.unexpected("expected identifier during variable declaration");
    let variable_name = parser.expect_error(TokenKind::Identifier, Some(error))?.value;

    let type_expr = if parser.eat(TokenKind::Colon) {
        Some(parse_type(parser, BindingPower::Default)?)
    } else {
        None
    };

    let init = if parser.eat(TokenKind::Assignment) {
        Some(parse_expr(parser, BindingPower::Default)?)
    } else if type_expr.is_none() {
        return Err(parser.unexpected("expected rhs or explicit type"));
    } else {
        None
    };

    if is_constant && init.is_none() {
        return Err(parser.unexpected("expected rhs in constant definition"));
    }

    parser.expect(TokenKind::Semicolon)?;

    let kind = match (local, is_constant) {
        (false, false) => VarKind::Global,
        (false, true) => VarKind::Const,
        (true, false) => VarKind::Local,
        (true, true) => VarKind::LocalConst,
    };

    Ok(Decl::new(
        variable_name,
        DeclKind::Var(VarDecl {
            kind,
            type_expr,
            init,
        }),
        parser.span_from(&start_token.span.start),
    ))
}

pub fn parse_global_var_decl(parser: &mut Parser) -> Result<Decl, Error> {
    parse_var_decl(parser, false)
}

/// `(name: Type, ...)`
pub fn parse_params(parser: &mut Parser) -> Result<Vec<Param>, Error> {
    parser.expect(TokenKind::OpenParen)?;

    let mut parameters = Vec::new();
    while parser.current_token_kind() != TokenKind::CloseParen {
        let name_token = parser.expect(TokenKind::Identifier)?;
        parser.expect(TokenKind::Colon)?;
        let type_expr = parse_type(parser, BindingPower::Default)?;

        parameters.push(Param {
            name: name_token.value,
            type_expr,
            span: parser.span_from(&name_token.span.start),
        });

        if !parser.eat(TokenKind::Comma) {
            break;
        }
    }

    parser.expect(TokenKind::CloseParen)?;
    Ok(parameters)
}

/// Optional `-> Type`.
pub fn parse_return_type(parser: &mut Parser) -> Result<Option<TypeExpr>, Error> {
    if parser.eat(TokenKind::Arrow) {
        Ok(Some(parse_type(parser, BindingPower::Default)?))
    } else {
        Ok(None)
    }
}

/// `{ stmt* }`
pub fn parse_block_body(parser: &mut Parser) -> Result<Vec<Stmt>, Error> {
    parser.expect(TokenKind::OpenCurly)?;

    let mut statements = Vec::new();
    while parser.current_token_kind() != TokenKind::CloseCurly {
        if !parser.has_tokens() {
            return Err(parser.unexpected("expected `}` before end of file"));
        }
        statements.push(parse_stmt(parser)?);
    }

    parser.expect(TokenKind::CloseCurly)?;
    Ok(statements)
}

/// Name, parameters, return type and body shared by functions and macros.
fn parse_function_parts(parser: &mut Parser) -> Result<(String, FuncDecl), Error> {
    let first = parser.expect(TokenKind::Identifier)?;

    // fn Point.len(...) declares a method on Point
    let (owner, name) = if parser.eat(TokenKind::Dot) {
        let name = parser.expect(TokenKind::Identifier)?.value;
        let owner = TypeExpr::Named {
            path: None,
            name: first.value,
            span: first.span,
        };
        (Some(owner), name)
    } else {
        (None, first.value)
    };

    let params = parse_params(parser)?;
    let ret = parse_return_type(parser)?;

    let body = if parser.eat(TokenKind::Semicolon) {
        None
    } else {
        Some(parse_block_body(parser)?)
    };

    Ok((
        name,
        FuncDecl {
            owner,
            params,
            ret,
            body,
            is_extern: false,
            is_lambda: false,
        },
    ))
}

pub fn parse_fn_decl(parser: &mut Parser) -> Result<Decl, Error> {
    let start = parser.advance().span.start.clone();
    let (name, func) = parse_function_parts(parser)?;

    Ok(Decl::new(name, DeclKind::Func(func), parser.span_from(&start)))
}

pub fn parse_extern_decl(parser: &mut Parser) -> Result<Decl, Error> {
    let start = parser.advance().span.start.clone();
    parser.expect(TokenKind::Fn)?;
    let (name, mut func) = parse_function_parts(parser)?;
    func.is_extern = true;

    Ok(Decl::new(name, DeclKind::Func(func), parser.span_from(&start)))
}

pub fn parse_macro_decl(parser: &mut Parser) -> Result<Decl, Error> {
    let start = parser.advance().span.start.clone();
    let (name, func) = parse_function_parts(parser)?;

    Ok(Decl::new(name, DeclKind::Macro(func), parser.span_from(&start)))
}

pub fn parse_generic_decl(parser: &mut Parser) -> Result<Decl, Error> {
    // generic max<T>(a: T, b: T) -> T { ... }
    let start = parser.advance().span.start.clone();
    let name = parser.expect(TokenKind::Identifier)?.value;

    parser.expect(TokenKind::Less)?;
    let mut type_params = vec![];
    while parser.current_token_kind() != TokenKind::Greater {
        type_params.push(parser.expect(TokenKind::Identifier)?.value);

        if !parser.eat(TokenKind::Comma) {
            break;
        }
    }
    parser.expect(TokenKind::Greater)?;

    let params = parse_params(parser)?;
    let ret = parse_return_type(parser)?;
    let body = Some(parse_block_body(parser)?);

    Ok(Decl::new(
        name,
        DeclKind::Generic(GenericDecl {
            type_params,
            func: FuncDecl {
                owner: None,
                params,
                ret,
                body,
                is_extern: false,
                is_lambda: false,
            },
        }),
        parser.span_from(&start),
    ))
}

pub fn parse_struct_decl(parser: &mut Parser) -> Result<Decl, Error> {
    let start_token = parser.advance().clone();
    let is_union = start_token.kind == TokenKind::Union;

    let identifier = parser.expect(TokenKind::Identifier)?.value;

    parser.expect(TokenKind::OpenCurly)?;

    let mut fields = Vec::new();
    while parser.current_token_kind() != TokenKind::CloseCurly {
        let name_token = parser.expect(TokenKind::Identifier)?;
        parser.expect(TokenKind::Colon)?;
        let type_expr = parse_type(parser, BindingPower::Default)?;

        fields.push(Field {
            name: name_token.value,
            type_expr,
            span: parser.span_from(&name_token.span.start),
            ty: None,
        });

        if !parser.eat(TokenKind::Comma) {
            break;
        }
    }

    parser.expect(TokenKind::CloseCurly)?;

    Ok(Decl::new(
        identifier,
        DeclKind::Struct(StructDecl {
            is_union,
            fields,
            size: None,
        }),
        parser.span_from(&start_token.span.start),
    ))
}

pub fn parse_enum_decl(parser: &mut Parser) -> Result<Decl, Error> {
    // enum Color : u8 { Red, Green = 4 }
    let start = parser.advance().span.start.clone();
    let identifier = parser.expect(TokenKind::Identifier)?.value;

    let backing = if parser.eat(TokenKind::Colon) {
        Some(parse_type(parser, BindingPower::Default)?)
    } else {
        None
    };

    parser.expect(TokenKind::OpenCurly)?;

    let mut variants = vec![];
    while parser.current_token_kind() != TokenKind::CloseCurly {
        let name_token = parser.expect(TokenKind::Identifier)?;
        let value = if parser.eat(TokenKind::Assignment) {
            Some(parse_expr(parser, BindingPower::Comma)?)
        } else {
            None
        };

        variants.push(EnumVariant {
            name: name_token.value,
            value,
            span: parser.span_from(&name_token.span.start),
            resolved: None,
        });

        if !parser.eat(TokenKind::Comma) {
            break;
        }
    }

    parser.expect(TokenKind::CloseCurly)?;

    Ok(Decl::new(
        identifier,
        DeclKind::Enum(EnumDecl { backing, variants }),
        parser.span_from(&start),
    ))
}

pub fn parse_typedef_decl(parser: &mut Parser) -> Result<Decl, Error> {
    // type Size = u64;
    let start = parser.advance().span.start.clone();
    let identifier = parser.expect(TokenKind::Identifier)?.value;
    parser.expect(TokenKind::Assignment)?;
    let target = parse_type(parser, BindingPower::Default)?;
    parser.expect(TokenKind::Semicolon)?;

    Ok(Decl::new(identifier, DeclKind::Typedef(target), parser.span_from(&start)))
}

pub fn parse_attribute_decl(parser: &mut Parser) -> Result<Decl, Error> {
    let start = parser.advance().span.start.clone();
    let identifier = parser.expect(TokenKind::Identifier)?.value;
    parser.expect(TokenKind::Semicolon)?;

    Ok(Decl::new(identifier, DeclKind::Attribute, parser.span_from(&start)))
}

pub fn parse_import_decl(parser: &mut Parser) -> Result<Decl, Error> {
    let start = parser.advance().span.start.clone();
    let path = parse_path(parser)?;
    parser.expect(TokenKind::Semicolon)?;

    Ok(Decl::new(
        path.clone(),
        DeclKind::Import(ImportDecl { path, module: None }),
        parser.span_from(&start),
    ))
}

/// Parenthesised directive arguments followed by `;`.
fn parse_directive_args(parser: &mut Parser) -> Result<Vec<crate::ast::expressions::Expr>, Error> {
    parser.expect(TokenKind::OpenParen)?;

    let mut args = vec![];
    while parser.current_token_kind() != TokenKind::CloseParen {
        args.push(parse_expr(parser, BindingPower::Comma)?);

        if !parser.eat(TokenKind::Comma) {
            break;
        }
    }

    parser.expect(TokenKind::CloseParen)?;
    parser.expect(TokenKind::Semicolon)?;
    Ok(args)
}

pub fn parse_ct_include_decl(parser: &mut Parser) -> Result<Decl, Error> {
    let start = parser.advance().span.start.clone();
    let mut args = parse_directive_args(parser)?;

    if args.len() != 1 {
        return Err(parser.unexpected("`$include` takes exactly one file name"));
    }

    Ok(Decl::new(
        String::from("$include"),
        DeclKind::CtInclude(args.remove(0)),
        parser.span_from(&start),
    ))
}

pub fn parse_ct_assert_decl(parser: &mut Parser) -> Result<Decl, Error> {
    let start = parser.advance().span.start.clone();
    let mut args = parse_directive_args(parser)?;

    if args.is_empty() || args.len() > 2 {
        return Err(parser.unexpected("`$assert` takes a condition and an optional message"));
    }

    let message = if args.len() == 2 { args.pop() } else { None };
    let cond = args.remove(0);

    Ok(Decl::new(
        String::from("$assert"),
        DeclKind::CtAssert { cond, message },
        parser.span_from(&start),
    ))
}

pub fn parse_ct_echo_decl(parser: &mut Parser) -> Result<Decl, Error> {
    let start = parser.advance().span.start.clone();
    let mut args = parse_directive_args(parser)?;

    if args.len() != 1 {
        return Err(parser.unexpected("`$echo` takes exactly one argument"));
    }

    Ok(Decl::new(
        String::from("$echo"),
        DeclKind::CtEcho(args.remove(0)),
        parser.span_from(&start),
    ))
}
