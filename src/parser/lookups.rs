use std::collections::HashMap;

use crate::{
    ast::{declarations::Decl, expressions::Expr, statements::Stmt},
    errors::errors::Error,
    lexer::tokens::TokenKind,
};

use super::{decl::*, expr::*, parser::Parser, stmt::*};

#[derive(PartialEq, PartialOrd, Clone, Copy, Debug)]
pub enum BindingPower {
    Default,
    Comma,
    Assignment,
    Ternary,
    LogicalOr,
    LogicalAnd,
    BitwiseOr,
    BitwiseXor,
    BitwiseAnd,
    Equality,
    Relational,
    Shift,
    Additive,
    Multiplicative,
    Unary,
    Call,
    Member,
    Primary,
}

pub type DeclHandler = fn(&mut Parser) -> Result<Decl, Error>;
pub type StmtHandler = fn(&mut Parser) -> Result<Stmt, Error>;
pub type NUDHandler = fn(&mut Parser) -> Result<Expr, Error>;
pub type LEDHandler = fn(&mut Parser, Expr, BindingPower) -> Result<Expr, Error>;

pub fn create_token_lookups(parser: &mut Parser) {
    // Assignment
    parser.led(TokenKind::Assignment, BindingPower::Assignment, parse_assignment_expr);
    parser.led(TokenKind::PlusEquals, BindingPower::Assignment, parse_assignment_expr);
    parser.led(TokenKind::MinusEquals, BindingPower::Assignment, parse_assignment_expr);
    parser.led(TokenKind::StarEquals, BindingPower::Assignment, parse_assignment_expr);
    parser.led(TokenKind::SlashEquals, BindingPower::Assignment, parse_assignment_expr);
    parser.led(TokenKind::PercentEquals, BindingPower::Assignment, parse_assignment_expr);
    parser.led(TokenKind::AmpersandEquals, BindingPower::Assignment, parse_assignment_expr);
    parser.led(TokenKind::PipeEquals, BindingPower::Assignment, parse_assignment_expr);
    parser.led(TokenKind::CaretEquals, BindingPower::Assignment, parse_assignment_expr);
    parser.led(TokenKind::ShiftLeftEquals, BindingPower::Assignment, parse_assignment_expr);
    parser.led(TokenKind::ShiftRightEquals, BindingPower::Assignment, parse_assignment_expr);

    // Ternary and elvis
    parser.led(TokenKind::Question, BindingPower::Ternary, parse_ternary_expr);
    parser.led(TokenKind::Elvis, BindingPower::Ternary, parse_elvis_expr);

    // Logical
    parser.led(TokenKind::Or, BindingPower::LogicalOr, parse_binary_expr);
    parser.led(TokenKind::And, BindingPower::LogicalAnd, parse_binary_expr);

    // Bitwise
    parser.led(TokenKind::Pipe, BindingPower::BitwiseOr, parse_binary_expr);
    parser.led(TokenKind::Caret, BindingPower::BitwiseXor, parse_binary_expr);
    parser.led(TokenKind::Ampersand, BindingPower::BitwiseAnd, parse_binary_expr);

    // Equality and relational
    parser.led(TokenKind::Equals, BindingPower::Equality, parse_binary_expr);
    parser.led(TokenKind::NotEquals, BindingPower::Equality, parse_binary_expr);
    parser.led(TokenKind::Less, BindingPower::Relational, parse_binary_expr);
    parser.led(TokenKind::LessEquals, BindingPower::Relational, parse_binary_expr);
    parser.led(TokenKind::Greater, BindingPower::Relational, parse_binary_expr);
    parser.led(TokenKind::GreaterEquals, BindingPower::Relational, parse_binary_expr);

    // Shift, additive and multiplicative
    parser.led(TokenKind::ShiftLeft, BindingPower::Shift, parse_binary_expr);
    parser.led(TokenKind::ShiftRight, BindingPower::Shift, parse_binary_expr);
    parser.led(TokenKind::Plus, BindingPower::Additive, parse_binary_expr);
    parser.led(TokenKind::Dash, BindingPower::Additive, parse_binary_expr);
    parser.led(TokenKind::Star, BindingPower::Multiplicative, parse_binary_expr);
    parser.led(TokenKind::Slash, BindingPower::Multiplicative, parse_binary_expr);
    parser.led(TokenKind::Percent, BindingPower::Multiplicative, parse_binary_expr);

    // Call, subscript and postfix
    parser.led(TokenKind::OpenParen, BindingPower::Call, parse_call_expr);
    parser.led(TokenKind::OpenBracket, BindingPower::Call, parse_subscript_expr);
    parser.led(TokenKind::PlusPlus, BindingPower::Call, parse_postfix_expr);
    parser.led(TokenKind::MinusMinus, BindingPower::Call, parse_postfix_expr);

    // Member
    parser.led(TokenKind::Dot, BindingPower::Member, parse_member_expr);

    // Literals and symbols
    parser.nud(TokenKind::Number, parse_primary_expr);
    parser.nud(TokenKind::Identifier, parse_primary_expr);
    parser.nud(TokenKind::String, parse_primary_expr);
    parser.nud(TokenKind::True, parse_primary_expr);
    parser.nud(TokenKind::False, parse_primary_expr);
    parser.nud(TokenKind::Nil, parse_primary_expr);

    // Prefix
    parser.nud(TokenKind::Dash, parse_prefix_expr);
    parser.nud(TokenKind::Not, parse_prefix_expr);
    parser.nud(TokenKind::Tilde, parse_prefix_expr);
    parser.nud(TokenKind::Ampersand, parse_prefix_expr);
    parser.nud(TokenKind::Star, parse_prefix_expr);
    parser.nud(TokenKind::PlusPlus, parse_prefix_expr);
    parser.nud(TokenKind::MinusMinus, parse_prefix_expr);

    parser.nud(TokenKind::OpenParen, parse_grouping_expr);
    parser.nud(TokenKind::OpenBracket, parse_initializer_list_expr);
    parser.nud(TokenKind::New, parse_struct_value_expr);
    parser.nud(TokenKind::Cast, parse_cast_expr);
    parser.nud(TokenKind::Sizeof, parse_sizeof_expr);
    parser.nud(TokenKind::Try, parse_try_expr);
    parser.nud(TokenKind::Fn, parse_lambda_expr);

    // Statements
    parser.stmt(TokenKind::Const, parse_local_var_stmt);
    parser.stmt(TokenKind::Let, parse_local_var_stmt);
    parser.stmt(TokenKind::If, parse_if_stmt);
    parser.stmt(TokenKind::While, parse_while_stmt);
    parser.stmt(TokenKind::Break, parse_break_stmt);
    parser.stmt(TokenKind::Continue, parse_break_stmt);
    parser.stmt(TokenKind::OpenCurly, parse_block_stmt);
    parser.stmt(TokenKind::Return, parse_return_stmt);

    // Declarations
    parser.decl(TokenKind::Const, parse_global_var_decl);
    parser.decl(TokenKind::Let, parse_global_var_decl);
    parser.decl(TokenKind::Fn, parse_fn_decl);
    parser.decl(TokenKind::Extern, parse_extern_decl);
    parser.decl(TokenKind::Macro, parse_macro_decl);
    parser.decl(TokenKind::Generic, parse_generic_decl);
    parser.decl(TokenKind::Struct, parse_struct_decl);
    parser.decl(TokenKind::Union, parse_struct_decl);
    parser.decl(TokenKind::Enum, parse_enum_decl);
    parser.decl(TokenKind::Type, parse_typedef_decl);
    parser.decl(TokenKind::Attribute, parse_attribute_decl);
    parser.decl(TokenKind::Import, parse_import_decl);
    parser.decl(TokenKind::CtInclude, parse_ct_include_decl);
    parser.decl(TokenKind::CtAssert, parse_ct_assert_decl);
    parser.decl(TokenKind::CtEcho, parse_ct_echo_decl);
}

// Lookup tables inside parser struct, so it's easier
pub type DeclLookup = HashMap<TokenKind, DeclHandler>;
pub type StmtLookup = HashMap<TokenKind, StmtHandler>;
pub type NUDLookup = HashMap<TokenKind, NUDHandler>;
pub type LEDLookup = HashMap<TokenKind, LEDHandler>;
pub type BPLookup = HashMap<TokenKind, BindingPower>;
