use crate::Span;

use super::{ast::DeclSlot, expressions::Expr};

#[derive(Debug, Clone)]
pub enum Stmt {
    Block {
        body: Vec<Stmt>,
        span: Span,
    },
    Expr(Expr),
    /// `let` or `const` inside a body.
    Local(DeclSlot),
    Return {
        value: Option<Expr>,
        span: Span,
    },
    If {
        cond: Expr,
        then_body: Box<Stmt>,
        else_body: Option<Box<Stmt>>,
        span: Span,
    },
    While {
        cond: Expr,
        body: Box<Stmt>,
        span: Span,
    },
    Break(Span),
    Continue(Span),
}

impl Stmt {
    pub fn span(&self) -> Option<&Span> {
        match self {
            Stmt::Block { span, .. }
            | Stmt::Return { span, .. }
            | Stmt::If { span, .. }
            | Stmt::While { span, .. }
            | Stmt::Break(span)
            | Stmt::Continue(span) => Some(span),
            Stmt::Expr(expr) => Some(&expr.span),
            Stmt::Local(DeclSlot::Parsed(decl)) => Some(&decl.span),
            Stmt::Local(DeclSlot::Registered(_)) => None,
        }
    }
}
