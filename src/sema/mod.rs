//! Semantic analysis.
//!
//! - context: per-task analysis state and scope lookup
//! - cast: conversion rules
//! - expr: expression typing and constant folding
//! - decl: declarations and type resolution
//! - stmt: statements and function bodies
//! - passes: the per-module pipeline
pub mod cast;
pub mod context;
pub mod decl;
pub mod expr;
pub mod passes;
pub mod stmt;

pub use context::SemaContext;
pub use passes::AnalysisStage;

#[cfg(test)]
mod tests;
