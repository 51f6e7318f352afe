//! Type annotations as written in source.
//!
//! These are resolved into `types::types::Type` during analysis.

use std::fmt::Display;

use crate::Span;

#[derive(Debug, Clone)]
pub enum TypeExpr {
    /// `i32`, `Point`, `geo::Point`
    Named {
        path: Option<String>,
        name: String,
        span: Span,
    },
    /// `T*`
    Pointer(Box<TypeExpr>),
    /// `T[N]`, or `T[]` when the length is absent.
    Array(Box<TypeExpr>, Option<u64>),
}

impl TypeExpr {
    pub fn span(&self) -> &Span {
        match self {
            TypeExpr::Named { span, .. } => span,
            TypeExpr::Pointer(inner) | TypeExpr::Array(inner, _) => inner.span(),
        }
    }
}

impl Display for TypeExpr {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TypeExpr::Named { path: Some(path), name, .. } => write!(f, "{}::{}", path, name),
            TypeExpr::Named { name, .. } => write!(f, "{}", name),
            TypeExpr::Pointer(inner) => write!(f, "{}*", inner),
            TypeExpr::Array(inner, Some(len)) => write!(f, "{}[{}]", inner, len),
            TypeExpr::Array(inner, None) => write!(f, "{}[]", inner),
        }
    }
}
