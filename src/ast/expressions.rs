use std::fmt::Display;

use crate::{types::types::Type, Span};

use super::{
    ast::{ConstValue, DeclId, DeclSlot, Resolution},
    statements::Stmt,
    types::TypeExpr,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOp {
    Add,
    Sub,
    Mul,
    Div,
    Mod,
    BitAnd,
    BitOr,
    BitXor,
    Shl,
    Shr,
    And,
    Or,
    Eq,
    NotEq,
    Less,
    LessEq,
    Greater,
    GreaterEq,
    Elvis,
    Assign,
    AddAssign,
    SubAssign,
    MulAssign,
    DivAssign,
    ModAssign,
    BitAndAssign,
    BitOrAssign,
    BitXorAssign,
    ShlAssign,
    ShrAssign,
}

impl BinaryOp {
    /// The arithmetic operator behind a compound assignment.
    pub fn base_op(self) -> Option<BinaryOp> {
        let op = match self {
            BinaryOp::AddAssign => BinaryOp::Add,
            BinaryOp::SubAssign => BinaryOp::Sub,
            BinaryOp::MulAssign => BinaryOp::Mul,
            BinaryOp::DivAssign => BinaryOp::Div,
            BinaryOp::ModAssign => BinaryOp::Mod,
            BinaryOp::BitAndAssign => BinaryOp::BitAnd,
            BinaryOp::BitOrAssign => BinaryOp::BitOr,
            BinaryOp::BitXorAssign => BinaryOp::BitXor,
            BinaryOp::ShlAssign => BinaryOp::Shl,
            BinaryOp::ShrAssign => BinaryOp::Shr,
            _ => return None,
        };
        Some(op)
    }

    pub fn symbol(self) -> &'static str {
        match self {
            BinaryOp::Add => "+",
            BinaryOp::Sub => "-",
            BinaryOp::Mul => "*",
            BinaryOp::Div => "/",
            BinaryOp::Mod => "%",
            BinaryOp::BitAnd => "&",
            BinaryOp::BitOr => "|",
            BinaryOp::BitXor => "^",
            BinaryOp::Shl => "<<",
            BinaryOp::Shr => ">>",
            BinaryOp::And => "&&",
            BinaryOp::Or => "||",
            BinaryOp::Eq => "==",
            BinaryOp::NotEq => "!=",
            BinaryOp::Less => "<",
            BinaryOp::LessEq => "<=",
            BinaryOp::Greater => ">",
            BinaryOp::GreaterEq => ">=",
            BinaryOp::Elvis => "?:",
            BinaryOp::Assign => "=",
            BinaryOp::AddAssign => "+=",
            BinaryOp::SubAssign => "-=",
            BinaryOp::MulAssign => "*=",
            BinaryOp::DivAssign => "/=",
            BinaryOp::ModAssign => "%=",
            BinaryOp::BitAndAssign => "&=",
            BinaryOp::BitOrAssign => "|=",
            BinaryOp::BitXorAssign => "^=",
            BinaryOp::ShlAssign => "<<=",
            BinaryOp::ShrAssign => ">>=",
        }
    }
}

impl Display for BinaryOp {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.symbol())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnaryOp {
    Neg,
    BitNot,
    Not,
    AddressOf,
    Deref,
    Inc,
    Dec,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PostUnaryOp {
    Inc,
    Dec,
}

#[derive(Debug, Clone)]
pub struct Expr {
    pub kind: ExprKind,
    pub span: Span,
    pub resolve: Resolution,
}

#[derive(Debug, Clone)]
pub enum ExprKind {
    Const(ConstValue),
    Identifier {
        path: Option<String>,
        name: String,
        decl: Option<DeclId>,
    },
    Binary {
        op: BinaryOp,
        left: Box<Expr>,
        right: Box<Expr>,
    },
    Unary {
        op: UnaryOp,
        inner: Box<Expr>,
    },
    PostUnary {
        op: PostUnaryOp,
        inner: Box<Expr>,
    },
    Call {
        callee: Box<Expr>,
        args: Vec<Expr>,
        /// The analysed macro body, for macro calls.
        expansion: Option<Vec<Stmt>>,
    },
    Cast {
        target: TypeExpr,
        inner: Box<Expr>,
    },
    /// Implicit conversion of a runtime value, inserted by the cast rules.
    Conversion {
        inner: Box<Expr>,
    },
    Conditional {
        cond: Box<Expr>,
        then_expr: Box<Expr>,
        else_expr: Box<Expr>,
    },
    Subscript {
        base: Box<Expr>,
        index: Box<Expr>,
    },
    Access {
        base: Box<Expr>,
        member: String,
    },
    MethodRef {
        decl: DeclId,
    },
    /// `new T { ... }`
    StructValue {
        target: TypeExpr,
        init: Box<Expr>,
    },
    /// `{ x: 1, y: 2 }`
    StructInitValues {
        fields: Vec<(String, Expr)>,
    },
    /// `[1, 2, 3]` or the positional form of `new T { 1, 2 }`
    InitializerList {
        elements: Vec<Expr>,
    },
    Sizeof {
        target: TypeExpr,
    },
    Try {
        inner: Box<Expr>,
        else_expr: Option<Box<Expr>>,
    },
    TypeRef(Type),
    Lambda(DeclSlot),
}

impl Expr {
    pub fn new(kind: ExprKind, span: Span) -> Self {
        Expr {
            kind,
            span,
            resolve: Resolution::Unresolved,
        }
    }

    /// An already analysed constant.
    pub fn constant(value: ConstValue, ty: Type, span: Span) -> Self {
        Expr {
            kind: ExprKind::Const(value),
            span,
            resolve: Resolution::Resolved(ty),
        }
    }

    pub fn ty(&self) -> Option<&Type> {
        self.resolve.ty()
    }

    pub fn const_value(&self) -> Option<&ConstValue> {
        match &self.kind {
            ExprKind::Const(value) => Some(value),
            _ => None,
        }
    }

    pub fn is_constant(&self) -> bool {
        matches!(self.kind, ExprKind::Const(_))
    }

    /// Moves the node out, leaving a poisoned placeholder behind.
    pub fn take(&mut self) -> Expr {
        let placeholder = Expr {
            kind: ExprKind::Const(ConstValue::Nil),
            span: self.span.clone(),
            resolve: Resolution::Poisoned,
        };
        std::mem::replace(self, placeholder)
    }
}
