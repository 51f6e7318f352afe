//! Parser state and the file level entry point.
//!
//! The parser is a Pratt parser. It keeps lookup tables for:
//! - Declaration handlers (top level)
//! - Statement handlers (inside bodies)
//! - NUD (null denotation) handlers for prefix expressions
//! - LED (left denotation) handlers for infix and postfix expressions
//! - Binding powers for operator precedence
//! - Type parsing handlers

use std::{collections::HashMap, rc::Rc};

use crate::{
    ast::{ast::Attribute, declarations::Decl},
    errors::errors::{Error, ErrorImpl},
    lexer::{
        lexer::tokenize,
        tokens::{Token, TokenKind},
    },
    Position, Span,
};

use super::{
    decl::{parse_attributes, parse_decl, parse_decl_with_attributes, parse_path},
    lookups::{
        create_token_lookups, BPLookup, BindingPower, DeclHandler, DeclLookup, LEDHandler,
        LEDLookup, NUDHandler, NUDLookup, StmtHandler, StmtLookup,
    },
    types::{
        create_token_type_lookups, TypeBPLookup, TypeLEDHandler, TypeLEDLookup, TypeNUDHandler,
        TypeNUDLookup,
    },
};

/// `module a::b @if(...);` at the top of a file.
#[derive(Debug, Clone)]
pub struct ModuleHeader {
    pub name: String,
    pub attributes: Vec<Attribute>,
    pub span: Span,
}

/// Everything one source file declares.
#[derive(Debug, Clone)]
pub struct ParsedFile {
    pub module: Option<ModuleHeader>,
    pub decls: Vec<Decl>,
}

/// The main parser structure that maintains parsing state.
pub struct Parser {
    /// The list of tokens to parse, always terminated by EOF
    tokens: Vec<Token>,
    /// Current position in the token stream
    pos: usize,
    /// The name of the source file being parsed
    file: Rc<String>,
    decl_lookup: DeclLookup,
    stmt_lookup: StmtLookup,
    nud_lookup: NUDLookup,
    led_lookup: LEDLookup,
    binding_power_lookup: BPLookup,
    type_nud_lookup: TypeNUDLookup,
    type_led_lookup: TypeLEDLookup,
    type_binding_power_lookup: TypeBPLookup,
}

impl Parser {
    pub fn new(tokens: Vec<Token>, file: Rc<String>) -> Self {
        let mut tokens = tokens;
        if tokens.last().map(|token| token.kind) != Some(TokenKind::EOF) {
            let end = tokens
                .last()
                .map(|token| token.span.end.clone())
                .unwrap_or_else(|| Position(0, Rc::clone(&file)));
            tokens.push(Token {
                kind: TokenKind::EOF,
                value: String::from("EOF"),
                span: Span {
                    start: end.clone(),
                    end,
                },
            });
        }

        Parser {
            tokens,
            pos: 0,
            file,
            decl_lookup: HashMap::new(),
            stmt_lookup: HashMap::new(),
            nud_lookup: HashMap::new(),
            led_lookup: HashMap::new(),
            binding_power_lookup: HashMap::new(),
            type_nud_lookup: HashMap::new(),
            type_led_lookup: HashMap::new(),
            type_binding_power_lookup: HashMap::new(),
        }
    }

    /// Returns the current token without advancing.
    pub fn current_token(&self) -> &Token {
        &self.tokens[self.pos.min(self.tokens.len() - 1)]
    }

    pub fn current_token_kind(&self) -> TokenKind {
        self.current_token().kind
    }

    /// Kind of the token `n` places ahead.
    pub fn peek_kind(&self, n: usize) -> TokenKind {
        self.tokens[(self.pos + n).min(self.tokens.len() - 1)].kind
    }

    /// Advances to the next token and returns the previous token.
    pub fn advance(&mut self) -> &Token {
        let index = self.pos.min(self.tokens.len() - 1);
        if self.pos < self.tokens.len() - 1 {
            self.pos += 1;
        }
        &self.tokens[index]
    }

    /// Expects a token of the specified kind, with optional custom error.
    pub fn expect_error(
        &mut self,
        expected_kind: TokenKind,
        error: Option<Error>,
    ) -> Result<Token, Error> {
        let token = self.current_token();
        if token.kind != expected_kind {
            match error {
                Some(error) => Err(error),
                None => Err(Error::new(
                    ErrorImpl::UnexpectedToken {
                        token: token.value.clone(),
                    },
                    token.span.start.clone(),
                )),
            }
        } else {
            Ok(self.advance().clone())
        }
    }

    pub fn expect(&mut self, expected_kind: TokenKind) -> Result<Token, Error> {
        self.expect_error(expected_kind, None)
    }

    /// Consumes the current token if it has the given kind.
    pub fn eat(&mut self, kind: TokenKind) -> bool {
        if self.current_token_kind() == kind {
            self.advance();
            true
        } else {
            false
        }
    }

    /// An `UnexpectedTokenDetailed` error at the current token.
    pub fn unexpected(&self, message: &str) -> Error {
        Error::new(
            ErrorImpl::UnexpectedTokenDetailed {
                token: self.current_token().value.clone(),
                message: String::from(message),
            },
            self.get_position(),
        )
    }

    pub fn has_tokens(&self) -> bool {
        self.current_token_kind() != TokenKind::EOF
    }

    pub fn get_decl_lookup(&self) -> &DeclLookup {
        &self.decl_lookup
    }

    pub fn get_stmt_lookup(&self) -> &StmtLookup {
        &self.stmt_lookup
    }

    pub fn get_nud_lookup(&self) -> &NUDLookup {
        &self.nud_lookup
    }

    pub fn get_led_lookup(&self) -> &LEDLookup {
        &self.led_lookup
    }

    pub fn get_bp_lookup(&self) -> &BPLookup {
        &self.binding_power_lookup
    }

    pub fn get_type_bp_lookup(&self) -> &TypeBPLookup {
        &self.type_binding_power_lookup
    }

    pub fn get_type_nud_lookup(&self) -> &TypeNUDLookup {
        &self.type_nud_lookup
    }

    pub fn get_type_led_lookup(&self) -> &TypeLEDLookup {
        &self.type_led_lookup
    }

    /// Registers a left denotation (infix or postfix) handler for a token.
    pub fn led(&mut self, kind: TokenKind, binding_power: BindingPower, led_fn: LEDHandler) {
        self.binding_power_lookup.insert(kind, binding_power);
        self.led_lookup.insert(kind, led_fn);
    }

    /// Registers a null denotation (prefix) handler for a token.
    ///
    /// Prefix handlers do not touch the binding power table, so a token
    /// such as `-` can be both prefix and infix.
    pub fn nud(&mut self, kind: TokenKind, nud_fn: NUDHandler) {
        self.nud_lookup.insert(kind, nud_fn);
    }

    pub fn stmt(&mut self, kind: TokenKind, stmt_fn: StmtHandler) {
        self.stmt_lookup.insert(kind, stmt_fn);
    }

    pub fn decl(&mut self, kind: TokenKind, decl_fn: DeclHandler) {
        self.decl_lookup.insert(kind, decl_fn);
    }

    pub fn type_led(
        &mut self,
        kind: TokenKind,
        binding_power: BindingPower,
        led_fn: TypeLEDHandler,
    ) {
        self.type_binding_power_lookup.insert(kind, binding_power);
        self.type_led_lookup.insert(kind, led_fn);
    }

    pub fn type_nud(&mut self, kind: TokenKind, nud_fn: TypeNUDHandler) {
        self.type_nud_lookup.insert(kind, nud_fn);
    }

    /// Returns the current position in the source file.
    pub fn get_position(&self) -> Position {
        self.current_token().span.start.clone()
    }

    /// End of the most recently consumed token.
    pub fn previous_end(&self) -> Position {
        if self.pos == 0 {
            return Position(0, Rc::clone(&self.file));
        }
        self.tokens[(self.pos - 1).min(self.tokens.len() - 1)].span.end.clone()
    }

    /// Span from `start` to the end of the most recently consumed token.
    pub fn span_from(&self, start: &Position) -> Span {
        Span {
            start: start.clone(),
            end: self.previous_end(),
        }
    }
}

/// `@if(X) module a::b;` or `module a::b @if(X);`
fn parse_module_header(
    parser: &mut Parser,
    mut attributes: Vec<Attribute>,
) -> Result<ModuleHeader, Error> {
    let start = parser.expect(TokenKind::Module)?.span.start;
    let name = parse_path(parser)?;
    attributes.extend(parse_attributes(parser)?);
    parser.expect(TokenKind::Semicolon)?;

    Ok(ModuleHeader {
        name,
        attributes,
        span: parser.span_from(&start),
    })
}

/// Parses a stream of tokens into the declarations of one file.
///
/// Returns the parser (with state after parsing) alongside the result.
pub fn parse(tokens: Vec<Token>, file: Rc<String>) -> (Parser, Result<ParsedFile, Error>) {
    let mut parser = Parser::new(tokens, Rc::clone(&file));
    create_token_lookups(&mut parser);
    create_token_type_lookups(&mut parser);

    // Leading attributes belong to the header if one follows, else to the first declaration
    let mut leading = match parse_attributes(&mut parser) {
        Ok(attributes) => attributes,
        Err(error) => return (parser, Err(error)),
    };

    let module = if parser.current_token_kind() == TokenKind::Module {
        match parse_module_header(&mut parser, std::mem::take(&mut leading)) {
            Ok(header) => Some(header),
            Err(error) => return (parser, Err(error)),
        }
    } else {
        None
    };

    let mut decls = vec![];

    if !leading.is_empty() {
        match parse_decl_with_attributes(&mut parser, leading) {
            Ok(decl) => decls.push(decl),
            Err(error) => return (parser, Err(error)),
        }
    }

    while parser.has_tokens() {
        match parse_decl(&mut parser) {
            Ok(decl) => decls.push(decl),
            Err(error) => return (parser, Err(error)),
        }
    }

    (parser, Ok(ParsedFile { module, decls }))
}

/// Tokenizes and parses `source` in one step.
pub fn parse_source(source: &str, file: &str) -> Result<ParsedFile, Error> {
    let tokens = tokenize(source, Some(file.to_string()))?;
    let (_, result) = parse(tokens, Rc::new(file.to_string()));
    result
}
