use std::fmt::Display;

use crate::{types::types::Type, Span};

use super::{declarations::Decl, expressions::Expr};

/// Index of a declaration in the session's arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct DeclId(pub usize);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ModuleId(pub usize);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct UnitId(pub usize);

/// Memoised, cycle-safe analysis state shared by expressions and
/// declarations. Moves forward only.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum Resolution {
    #[default]
    Unresolved,
    InProgress,
    Resolved(Type),
    /// Failed and already reported.
    Poisoned,
}

impl Resolution {
    pub fn ty(&self) -> Option<&Type> {
        match self {
            Resolution::Resolved(ty) => Some(ty),
            _ => None,
        }
    }

    pub fn is_resolved(&self) -> bool {
        matches!(self, Resolution::Resolved(_))
    }

    pub fn is_poisoned(&self) -> bool {
        matches!(self, Resolution::Poisoned)
    }
}

/// A folded compile time value.
#[derive(Debug, Clone, PartialEq)]
pub enum ConstValue {
    Nil,
    Bool(bool),
    Int(i128),
    Float(f64),
    String(String),
}

impl Display for ConstValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConstValue::Nil => write!(f, "nil"),
            ConstValue::Bool(value) => write!(f, "{}", value),
            ConstValue::Int(value) => write!(f, "{}", value),
            ConstValue::Float(value) => write!(f, "{}", value),
            ConstValue::String(value) => write!(f, "{}", value),
        }
    }
}

/// `@name(args)` in front of a declaration or on a module header.
#[derive(Debug, Clone)]
pub struct Attribute {
    pub name: String,
    pub args: Vec<Expr>,
    pub span: Span,
}

/// A declaration written inside a body. It moves into the arena the
/// first time it is analysed.
#[derive(Debug, Clone)]
pub enum DeclSlot {
    Parsed(Box<Decl>),
    Registered(DeclId),
}
