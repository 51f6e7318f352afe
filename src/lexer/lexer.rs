use std::rc::Rc;

use lazy_static::lazy_static;
use regex::Regex;

use crate::{
    errors::errors::{Error, ErrorImpl},
    Position, Span, MK_DEFAULT_HANDLER, MK_TOKEN,
};

use super::tokens::{Token, TokenKind, RESERVED_LOOKUP};

pub type RegexHandler = fn(&mut Lexer, &Regex) -> Result<(), Error>;

pub struct RegexPattern {
    regex: Regex,
    handler: RegexHandler,
}

macro_rules! pattern {
    ($regex:literal, $handler:expr) => {
        RegexPattern {
            regex: Regex::new(concat!("^", $regex)).unwrap(),
            handler: $handler,
        }
    };
}

lazy_static! {
    // Longer operators come before their prefixes.
    static ref PATTERNS: Vec<RegexPattern> = vec![
        pattern!("\\s+", skip_handler),
        pattern!("//[^\n]*", skip_handler),
        pattern!("(?s)/\\*.*?\\*/", skip_handler),
        pattern!("\\$?[a-zA-Z_][a-zA-Z0-9_]*", symbol_handler),
        pattern!("0[xX][0-9a-fA-F_]+", number_handler),
        pattern!("[0-9][0-9_]*(\\.[0-9]+)?([eE][+-]?[0-9]+)?", number_handler),
        pattern!("\"(\\\\.|[^\"\\\\])*\"", string_handler),
        pattern!("\\[", MK_DEFAULT_HANDLER!(TokenKind::OpenBracket, "[")),
        pattern!("\\]", MK_DEFAULT_HANDLER!(TokenKind::CloseBracket, "]")),
        pattern!("\\{", MK_DEFAULT_HANDLER!(TokenKind::OpenCurly, "{")),
        pattern!("\\}", MK_DEFAULT_HANDLER!(TokenKind::CloseCurly, "}")),
        pattern!("\\(", MK_DEFAULT_HANDLER!(TokenKind::OpenParen, "(")),
        pattern!("\\)", MK_DEFAULT_HANDLER!(TokenKind::CloseParen, ")")),
        pattern!("<<=", MK_DEFAULT_HANDLER!(TokenKind::ShiftLeftEquals, "<<=")),
        pattern!(">>=", MK_DEFAULT_HANDLER!(TokenKind::ShiftRightEquals, ">>=")),
        pattern!("<<", MK_DEFAULT_HANDLER!(TokenKind::ShiftLeft, "<<")),
        pattern!(">>", MK_DEFAULT_HANDLER!(TokenKind::ShiftRight, ">>")),
        pattern!("==", MK_DEFAULT_HANDLER!(TokenKind::Equals, "==")),
        pattern!("!=", MK_DEFAULT_HANDLER!(TokenKind::NotEquals, "!=")),
        pattern!("!", MK_DEFAULT_HANDLER!(TokenKind::Not, "!")),
        pattern!("=", MK_DEFAULT_HANDLER!(TokenKind::Assignment, "=")),
        pattern!("<=", MK_DEFAULT_HANDLER!(TokenKind::LessEquals, "<=")),
        pattern!("<", MK_DEFAULT_HANDLER!(TokenKind::Less, "<")),
        pattern!(">=", MK_DEFAULT_HANDLER!(TokenKind::GreaterEquals, ">=")),
        pattern!(">", MK_DEFAULT_HANDLER!(TokenKind::Greater, ">")),
        pattern!("\\|\\|", MK_DEFAULT_HANDLER!(TokenKind::Or, "||")),
        pattern!("&&", MK_DEFAULT_HANDLER!(TokenKind::And, "&&")),
        pattern!("\\|=", MK_DEFAULT_HANDLER!(TokenKind::PipeEquals, "|=")),
        pattern!("&=", MK_DEFAULT_HANDLER!(TokenKind::AmpersandEquals, "&=")),
        pattern!("\\^=", MK_DEFAULT_HANDLER!(TokenKind::CaretEquals, "^=")),
        pattern!("\\|", MK_DEFAULT_HANDLER!(TokenKind::Pipe, "|")),
        pattern!("&", MK_DEFAULT_HANDLER!(TokenKind::Ampersand, "&")),
        pattern!("\\^", MK_DEFAULT_HANDLER!(TokenKind::Caret, "^")),
        pattern!("~", MK_DEFAULT_HANDLER!(TokenKind::Tilde, "~")),
        pattern!("@", MK_DEFAULT_HANDLER!(TokenKind::At, "@")),
        pattern!("\\.", MK_DEFAULT_HANDLER!(TokenKind::Dot, ".")),
        pattern!(";", MK_DEFAULT_HANDLER!(TokenKind::Semicolon, ";")),
        pattern!("::", MK_DEFAULT_HANDLER!(TokenKind::ColonColon, "::")),
        pattern!(":", MK_DEFAULT_HANDLER!(TokenKind::Colon, ":")),
        pattern!("\\?:", MK_DEFAULT_HANDLER!(TokenKind::Elvis, "?:")),
        pattern!("\\?", MK_DEFAULT_HANDLER!(TokenKind::Question, "?")),
        pattern!(",", MK_DEFAULT_HANDLER!(TokenKind::Comma, ",")),
        pattern!("\\+\\+", MK_DEFAULT_HANDLER!(TokenKind::PlusPlus, "++")),
        pattern!("->", MK_DEFAULT_HANDLER!(TokenKind::Arrow, "->")),
        pattern!("--", MK_DEFAULT_HANDLER!(TokenKind::MinusMinus, "--")),
        pattern!("\\+=", MK_DEFAULT_HANDLER!(TokenKind::PlusEquals, "+=")),
        pattern!("-=", MK_DEFAULT_HANDLER!(TokenKind::MinusEquals, "-=")),
        pattern!("\\*=", MK_DEFAULT_HANDLER!(TokenKind::StarEquals, "*=")),
        pattern!("/=", MK_DEFAULT_HANDLER!(TokenKind::SlashEquals, "/=")),
        pattern!("%=", MK_DEFAULT_HANDLER!(TokenKind::PercentEquals, "%=")),
        pattern!("\\+", MK_DEFAULT_HANDLER!(TokenKind::Plus, "+")),
        pattern!("-", MK_DEFAULT_HANDLER!(TokenKind::Dash, "-")),
        pattern!("/", MK_DEFAULT_HANDLER!(TokenKind::Slash, "/")),
        pattern!("\\*", MK_DEFAULT_HANDLER!(TokenKind::Star, "*")),
        pattern!("%", MK_DEFAULT_HANDLER!(TokenKind::Percent, "%")),
    ];
}

pub struct Lexer<'a> {
    tokens: Vec<Token>,
    source: &'a str,
    pos: usize,
    file: Rc<String>,
}

impl<'a> Lexer<'a> {
    pub fn new(source: &'a str, file: Option<String>) -> Lexer<'a> {
        let file_name = if let Some(file) = file {
            Rc::new(file)
        } else {
            Rc::new(String::from("shell"))
        };

        Lexer {
            pos: 0,
            tokens: vec![],
            source,
            file: file_name,
        }
    }

    pub fn advance_n(&mut self, n: usize) {
        self.pos += n;
    }

    pub fn push(&mut self, token: Token) {
        self.tokens.push(token);
    }

    pub fn at(&self) -> char {
        self.remainder().chars().next().unwrap_or('\0')
    }

    pub fn remainder(&self) -> &'a str {
        &self.source[self.pos..]
    }

    pub fn at_eof(&self) -> bool {
        self.pos >= self.source.len()
    }

    pub fn position(&self) -> Position {
        Position(self.pos as u32, Rc::clone(&self.file))
    }

    /// Span covering the next `len` bytes.
    pub fn span_of(&self, len: usize) -> Span {
        Span {
            start: self.position(),
            end: Position((self.pos + len) as u32, Rc::clone(&self.file)),
        }
    }

    fn matched(&self, regex: &Regex) -> &'a str {
        regex.find(self.remainder()).map(|m| m.as_str()).unwrap_or("")
    }
}

fn number_handler(lexer: &mut Lexer, regex: &Regex) -> Result<(), Error> {
    let matched = lexer.matched(regex);

    lexer.push(MK_TOKEN!(
        TokenKind::Number,
        matched.replace('_', ""),
        lexer.span_of(matched.len())
    ));
    lexer.advance_n(matched.len());
    Ok(())
}

fn skip_handler(lexer: &mut Lexer, regex: &Regex) -> Result<(), Error> {
    let matched = lexer.matched(regex);
    lexer.advance_n(matched.len());
    Ok(())
}

fn string_handler(lexer: &mut Lexer, regex: &Regex) -> Result<(), Error> {
    let matched = lexer.matched(regex);
    let span = lexer.span_of(matched.len());
    let string_literal = &matched[1..matched.len() - 1];

    let mut result = String::new();
    let mut chars = string_literal.chars().peekable();

    while let Some(ch) = chars.next() {
        if ch != '\\' {
            result.push(ch);
            continue;
        }

        match chars.next() {
            Some('n') => result.push('\n'),
            Some('t') => result.push('\t'),
            Some('r') => result.push('\r'),
            Some('0') => result.push('\0'),
            Some('\\') => result.push('\\'),
            Some('"') => result.push('"'),
            Some('x') => {
                let mut hex = String::new();
                while hex.len() < 2 {
                    match chars.peek() {
                        Some(ch) if ch.is_ascii_hexdigit() => {
                            hex.push(*ch);
                            chars.next();
                        }
                        _ => break,
                    }
                }

                let byte = u8::from_str_radix(&hex, 16).map_err(|_| {
                    Error::new(
                        ErrorImpl::UnrecognisedToken {
                            token: format!("\\x{}", hex),
                        },
                        span.start.clone(),
                    )
                })?;
                result.push(byte as char);
            }
            Some(other) => {
                // Unknown escapes keep the backslash
                result.push('\\');
                result.push(other);
            }
            None => result.push('\\'),
        }
    }

    lexer.push(MK_TOKEN!(TokenKind::String, result, span));
    lexer.advance_n(matched.len());
    Ok(())
}

fn symbol_handler(lexer: &mut Lexer, regex: &Regex) -> Result<(), Error> {
    let value = lexer.matched(regex);
    let span = lexer.span_of(value.len());

    if let Some(kind) = RESERVED_LOOKUP.get(value) {
        lexer.push(MK_TOKEN!(*kind, String::from(value), span));
    } else if value.starts_with('$') {
        return Err(Error::new(
            ErrorImpl::UnrecognisedToken {
                token: String::from(value),
            },
            span.start,
        ));
    } else {
        lexer.push(MK_TOKEN!(TokenKind::Identifier, String::from(value), span));
    }

    lexer.advance_n(value.len());
    Ok(())
}

pub fn tokenize(source: &str, file: Option<String>) -> Result<Vec<Token>, Error> {
    let mut lex = Lexer::new(source, file);

    while !lex.at_eof() {
        let pattern = PATTERNS
            .iter()
            .find(|pattern| pattern.regex.is_match(lex.remainder()));

        match pattern {
            Some(pattern) => (pattern.handler)(&mut lex, &pattern.regex)?,
            None => {
                return Err(Error::new(
                    ErrorImpl::UnrecognisedToken {
                        token: lex.at().to_string(),
                    },
                    lex.position(),
                ))
            }
        }
    }

    let span = lex.span_of(0);
    lex.push(MK_TOKEN!(TokenKind::EOF, String::from("EOF"), span));
    Ok(lex.tokens)
}
