//! Parser module for building the declaration tree of a source file.
//!
//! It uses a Pratt parser for expressions with NUD (null denotation) and
//! LED (left denotation) functions and binding powers for precedence.
//! Declarations and statements are dispatched through lookup tables keyed
//! on the leading token.

pub mod decl;
pub mod expr;
pub mod lookups;
pub mod parser;
pub mod stmt;
pub mod types;

#[cfg(test)]
mod tests;
