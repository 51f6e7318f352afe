//! Error types shared by every phase.
//!
//! Lexer and parser failures are returned directly as `Err(Error)`.
//! Semantic errors are collected by [`Diagnostics`] so a single run can
//! report many of them.

pub mod diagnostics;
pub mod errors;

pub use diagnostics::Diagnostics;

#[cfg(test)]
mod tests;
