//! Lexical analysis.
//!
//! Converts source text into tokens using an ordered table of anchored
//! regex patterns. Keywords and `$` directives are recognised through
//! `RESERVED_LOOKUP`; comments and whitespace are skipped.

pub mod lexer;
pub mod tokens;

#[cfg(test)]
mod tests;
