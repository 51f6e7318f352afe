use lazy_static::lazy_static;
use std::{collections::HashMap, fmt::Display};

use crate::Span;

lazy_static! {
    pub static ref RESERVED_LOOKUP: HashMap<&'static str, TokenKind> = {
        let mut map = HashMap::new();
        map.insert("let", TokenKind::Let);
        map.insert("const", TokenKind::Const);
        map.insert("new", TokenKind::New);
        map.insert("import", TokenKind::Import);
        map.insert("module", TokenKind::Module);
        map.insert("return", TokenKind::Return);
        map.insert("fn", TokenKind::Fn);
        map.insert("macro", TokenKind::Macro);
        map.insert("generic", TokenKind::Generic);
        map.insert("if", TokenKind::If);
        map.insert("else", TokenKind::Else);
        map.insert("while", TokenKind::While);
        map.insert("break", TokenKind::Break);
        map.insert("continue", TokenKind::Continue);
        map.insert("struct", TokenKind::Struct);
        map.insert("union", TokenKind::Union);
        map.insert("enum", TokenKind::Enum);
        map.insert("type", TokenKind::Type);
        map.insert("attribute", TokenKind::Attribute);
        map.insert("extern", TokenKind::Extern);
        map.insert("cast", TokenKind::Cast);
        map.insert("sizeof", TokenKind::Sizeof);
        map.insert("try", TokenKind::Try);
        map.insert("true", TokenKind::True);
        map.insert("false", TokenKind::False);
        map.insert("nil", TokenKind::Nil);
        map.insert("$include", TokenKind::CtInclude);
        map.insert("$assert", TokenKind::CtAssert);
        map.insert("$echo", TokenKind::CtEcho);
        map
    };
}

#[derive(Debug, PartialEq, Eq, Clone, Copy, Hash)]
pub enum TokenKind {
    EOF,
    Number,
    String,
    Identifier,

    Tilde,
    At,

    OpenBracket,
    CloseBracket,
    OpenCurly,
    CloseCurly,
    OpenParen,
    CloseParen,

    Assignment, // =
    Equals,     // ==
    Not,        // !
    NotEquals,  // !=

    Less,
    LessEquals,
    Greater,
    GreaterEquals,
    ShiftLeft,
    ShiftRight,

    Or,
    And,
    Pipe,
    Ampersand,
    Caret,

    Dot,
    Semicolon,
    Colon,
    ColonColon,
    Question,
    Elvis, // ?:
    Comma,
    Arrow,

    PlusPlus,
    MinusMinus,
    PlusEquals,
    MinusEquals,
    SlashEquals,
    StarEquals,
    PercentEquals,
    AmpersandEquals,
    PipeEquals,
    CaretEquals,
    ShiftLeftEquals,
    ShiftRightEquals,

    Plus,
    Dash,
    Slash,
    Star,
    Percent,

    // Reserved
    Let,
    Const,
    New,
    Import,
    Module,
    Fn,
    Macro,
    Generic,
    Return,
    If,
    Else,
    While,
    Break,
    Continue,
    Struct,
    Union,
    Enum,
    Type,
    Attribute,
    Extern,
    Cast,
    Sizeof,
    Try,
    True,
    False,
    Nil,

    // Compile time directives
    CtInclude,
    CtAssert,
    CtEcho,
}

impl Display for TokenKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:?}", self)
    }
}

#[derive(Debug, Clone)]
pub struct Token {
    pub kind: TokenKind,
    pub value: String,
    pub span: Span,
}

impl Display for Token {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Token {{\nkind: {},\nvalue: {}}}", self.kind, self.value)
    }
}

impl Token {
    pub fn is_one_of_many(&self, tokens: &[TokenKind]) -> bool {
        tokens.contains(&self.kind)
    }
}
