//! Expression analysis and constant folding.
//!
//! Every expression moves through `Resolution` at most once. Successful
//! analysis may rewrite the node in place, most often into a folded
//! `Const`.

use std::cmp::Ordering;

use crate::{
    ast::{
        ast::{ConstValue, DeclId, DeclSlot, Resolution},
        declarations::{Decl, DeclKind, VarDecl, VarKind},
        expressions::{BinaryOp, Expr, ExprKind, PostUnaryOp, UnaryOp},
        statements::Stmt,
        types::TypeExpr,
    },
    errors::errors::ErrorImpl,
    types::types::{IntKind, Signature, Type},
    Span,
};

use super::{
    cast::{can_cast, cast, cast_arithmetic, cast_to_runtime, round_to, wrap_to, CastKind},
    context::SemaContext,
    decl::{analyse_decl, ensure_analysed, resolve_type, size_of, TypeSize},
    stmt::{analyse_nested_body, analyse_stmts, check_condition},
};

/// Result of analysing one node: its type and an optional replacement.
struct Analysed {
    ty: Type,
    rewrite: Option<ExprKind>,
}

impl Analysed {
    fn new(ty: Type) -> Self {
        Analysed { ty, rewrite: None }
    }

    fn constant(value: ConstValue, ty: Type) -> Self {
        Analysed {
            ty,
            rewrite: Some(ExprKind::Const(value)),
        }
    }

    fn rewrite(kind: ExprKind, ty: Type) -> Self {
        Analysed {
            ty,
            rewrite: Some(kind),
        }
    }
}

/// Analyses `expr`, memoised and cycle safe.
pub fn analyse_expr(ctx: &mut SemaContext, expr: &mut Expr) -> bool {
    match expr.resolve {
        Resolution::Resolved(_) => return true,
        Resolution::Poisoned => return false,
        Resolution::InProgress => {
            let error = ErrorImpl::RecursiveResolution {
                name: describe(expr),
            };
            ctx.report(error, &expr.span);
            expr.resolve = Resolution::Poisoned;
            return false;
        }
        Resolution::Unresolved => {}
    }

    expr.resolve = Resolution::InProgress;

    match analyse_kind(ctx, expr) {
        Some(Analysed { ty, rewrite }) => {
            if let Some(kind) = rewrite {
                expr.kind = kind;
            }
            expr.resolve = Resolution::Resolved(ty);
            true
        }
        None => {
            expr.resolve = Resolution::Poisoned;
            false
        }
    }
}

fn describe(expr: &Expr) -> String {
    match &expr.kind {
        ExprKind::Identifier { name, .. } => name.clone(),
        _ => String::from("expression"),
    }
}

/// Type of an analysed expression.
fn type_of(expr: &Expr) -> Type {
    expr.ty().cloned().unwrap_or(Type::Void)
}

pub fn const_type(value: &ConstValue) -> Type {
    match value {
        ConstValue::Nil => Type::void_pointer(),
        ConstValue::Bool(_) => Type::Bool,
        ConstValue::Int(_) => Type::ComptimeInt,
        ConstValue::Float(_) => Type::ComptimeFloat,
        ConstValue::String(_) => Type::String,
    }
}

/// Folded `!value`.
pub fn is_falsy(value: &ConstValue) -> bool {
    match value {
        ConstValue::Nil => true,
        ConstValue::Bool(value) => !value,
        ConstValue::Int(value) => *value == 0,
        ConstValue::Float(value) => *value == 0.0,
        ConstValue::String(value) => value.is_empty(),
    }
}

fn analyse_kind(ctx: &mut SemaContext, expr: &mut Expr) -> Option<Analysed> {
    let span = expr.span.clone();

    match &mut expr.kind {
        ExprKind::Const(value) => Some(Analysed::new(const_type(value))),
        ExprKind::Identifier { path, name, decl } => {
            analyse_identifier(ctx, path.as_deref(), name, decl, &span)
        }
        ExprKind::Binary { op, left, right } => analyse_binary(ctx, *op, left, right, &span),
        ExprKind::Unary { op, inner } => analyse_unary(ctx, *op, inner, &span),
        ExprKind::PostUnary { op, inner } => {
            let op = match op {
                PostUnaryOp::Inc => UnaryOp::Inc,
                PostUnaryOp::Dec => UnaryOp::Dec,
            };
            analyse_unary(ctx, op, inner, &span)
        }
        ExprKind::Call {
            callee,
            args,
            expansion,
        } => analyse_call(ctx, callee, args, expansion, &span),
        ExprKind::Cast { target, inner } => analyse_cast(ctx, target, inner),
        ExprKind::Conversion { inner } => {
            if !analyse_expr(ctx, inner) {
                return None;
            }
            Some(Analysed::new(type_of(inner)))
        }
        ExprKind::Conditional {
            cond,
            then_expr,
            else_expr,
        } => analyse_conditional(ctx, cond, then_expr, else_expr, &span),
        ExprKind::Subscript { base, index } => analyse_subscript(ctx, base, index),
        ExprKind::Access { base, member } => analyse_access(ctx, base, member, &span),
        ExprKind::MethodRef { decl } => {
            let decl = *decl;
            if !ensure_analysed(ctx, decl) {
                return None;
            }
            ctx.session.decls[decl].ty().cloned().map(Analysed::new)
        }
        ExprKind::StructValue { target, init } => analyse_struct_value(ctx, target, init, &span),
        ExprKind::StructInitValues { .. } => {
            ctx.report(ErrorImpl::CannotInferType, &span);
            None
        }
        ExprKind::InitializerList { elements } => analyse_initializer_list(ctx, elements, &span),
        ExprKind::Sizeof { target } => {
            let ty = resolve_type(ctx, target)?;
            match size_of(ctx.session, &ty) {
                TypeSize::Bytes(size) => Some(Analysed::constant(
                    ConstValue::Int(size as i128),
                    Type::ComptimeInt,
                )),
                TypeSize::Failed => None,
                TypeSize::Unsized => {
                    ctx.report(ErrorImpl::NoSize { type_: ty.to_string() }, &span);
                    None
                }
                TypeSize::TooLarge => {
                    ctx.report(ErrorImpl::TypeTooLarge { type_: ty.to_string() }, &span);
                    None
                }
            }
        }
        ExprKind::Try { inner, else_expr } => {
            if !analyse_expr(ctx, inner) {
                return None;
            }
            let ty = type_of(inner);
            if let Some(else_expr) = else_expr {
                if !analyse_expr(ctx, else_expr) || !cast(ctx, else_expr, &ty, CastKind::Implicit) {
                    return None;
                }
            }
            Some(Analysed::new(ty))
        }
        ExprKind::TypeRef(_) => Some(Analysed::new(Type::TypeInfo)),
        ExprKind::Lambda(slot) => analyse_lambda(ctx, slot),
    }
}

fn analyse_identifier(
    ctx: &mut SemaContext,
    path: Option<&str>,
    name: &str,
    slot: &mut Option<DeclId>,
    span: &Span,
) -> Option<Analysed> {
    let found = match path {
        Some(path) => ctx.find_path_ident(path, name),
        None => ctx.find_ident(name),
    };

    let Some(id) = found else {
        let name = match path {
            Some(path) => format!("{}::{}", path, name),
            None => name.to_string(),
        };
        ctx.report(ErrorImpl::UnknownIdentifier { name }, span);
        return None;
    };

    *slot = Some(id);
    if !ensure_analysed(ctx, id) {
        return None;
    }

    let decl = &ctx.session.decls[id];
    let ty = decl.ty()?.clone();

    let outcome = match &decl.kind {
        DeclKind::Var(var) => match var.init.as_ref().and_then(Expr::const_value) {
            Some(value) if var.kind.is_const() => Ok(Analysed::constant(value.clone(), ty)),
            _ => Ok(Analysed::new(ty)),
        },
        DeclKind::Func(_) | DeclKind::Macro(_) | DeclKind::Generic(_) => Ok(Analysed::new(ty)),
        DeclKind::Struct(_) | DeclKind::Enum(_) | DeclKind::Typedef(_) => {
            Ok(Analysed::rewrite(ExprKind::TypeRef(ty), Type::TypeInfo))
        }
        _ => Err(format!("using {} '{}' as a value", decl.kind_name(), name)),
    };

    match outcome {
        Ok(analysed) => Some(analysed),
        Err(feature) => {
            ctx.report(ErrorImpl::UnsupportedFeature { feature }, span);
            None
        }
    }
}

fn binop_error(ctx: &mut SemaContext, left: &Type, op: BinaryOp, right: &Type, span: &Span) {
    let error = ErrorImpl::CannotPerformBinop {
        left: left.to_string(),
        op: op.symbol().to_string(),
        right: right.to_string(),
    };
    ctx.report(error, span);
}

fn analyse_binary(
    ctx: &mut SemaContext,
    op: BinaryOp,
    left: &mut Expr,
    right: &mut Expr,
    span: &Span,
) -> Option<Analysed> {
    if !analyse_expr(ctx, left) || !analyse_expr(ctx, right) {
        return None;
    }

    match op {
        BinaryOp::Add | BinaryOp::Sub => analyse_add_sub(ctx, op, left, right, span),
        BinaryOp::Mul | BinaryOp::Div => {
            let ty = cast_arithmetic(ctx, left, right, op.symbol(), span)?;
            fold_arithmetic(ctx, op, left, right, ty, span)
        }
        BinaryOp::Mod => {
            let ty = cast_arithmetic(ctx, left, right, op.symbol(), span)?;
            if !ty.is_integer() {
                binop_error(ctx, &ty, op, &ty, span);
                return None;
            }
            fold_arithmetic(ctx, op, left, right, ty, span)
        }
        BinaryOp::BitAnd | BinaryOp::BitOr | BinaryOp::BitXor => {
            analyse_bitwise(ctx, op, left, right, span)
        }
        BinaryOp::Shl | BinaryOp::Shr => analyse_shift(ctx, op, left, right, span),
        BinaryOp::And | BinaryOp::Or => analyse_logical(ctx, op, left, right, span),
        BinaryOp::Eq
        | BinaryOp::NotEq
        | BinaryOp::Less
        | BinaryOp::LessEq
        | BinaryOp::Greater
        | BinaryOp::GreaterEq => analyse_comparison(ctx, op, left, right, span),
        BinaryOp::Elvis => analyse_elvis(ctx, left, right),
        BinaryOp::Assign => {
            if !is_lvalue(ctx, left) {
                ctx.report(ErrorImpl::NotAssignable, &left.span);
                return None;
            }
            let ty = type_of(left);
            if !cast(ctx, right, &ty, CastKind::ImplicitAssign) {
                return None;
            }
            Some(Analysed::new(ty))
        }
        _ => analyse_compound_assign(ctx, op, left, right, span),
    }
}

fn analyse_add_sub(
    ctx: &mut SemaContext,
    op: BinaryOp,
    left: &mut Expr,
    right: &mut Expr,
    span: &Span,
) -> Option<Analysed> {
    let (left_type, right_type) = (type_of(left), type_of(right));

    if !left_type.is_pointer() && !right_type.is_pointer() {
        let ty = cast_arithmetic(ctx, left, right, op.symbol(), span)?;
        return fold_arithmetic(ctx, op, left, right, ty, span);
    }

    // Pointer difference
    if left_type.is_pointer() && right_type.is_pointer() {
        let same_pointee = matches!(
            (left_type.pointee(), right_type.pointee()),
            (Some(a), Some(b)) if a.same_as(b)
        );
        if op == BinaryOp::Sub && same_pointee {
            return Some(Analysed::new(Type::Int(IntKind::I64)));
        }
        binop_error(ctx, &left_type, op, &right_type, span);
        return None;
    }

    // Pointer arithmetic, `int + ptr` only for addition
    let (pointer, offset) = if left_type.is_pointer() {
        (left_type.clone(), right)
    } else if op == BinaryOp::Add {
        (right_type.clone(), left)
    } else {
        binop_error(ctx, &left_type, op, &right_type, span);
        return None;
    };

    if !type_of(offset).is_integer() {
        binop_error(ctx, &left_type, op, &right_type, span);
        return None;
    }
    if !cast_to_runtime(ctx, offset) {
        return None;
    }

    Some(Analysed::new(pointer))
}

/// Folds `+ - * / %` once both operands share the type `ty`.
fn fold_arithmetic(
    ctx: &mut SemaContext,
    op: BinaryOp,
    left: &Expr,
    right: &Expr,
    ty: Type,
    span: &Span,
) -> Option<Analysed> {
    match (left.const_value(), right.const_value()) {
        (Some(ConstValue::Int(a)), Some(ConstValue::Int(b))) => {
            let (a, b) = (*a, *b);
            let value = match op {
                BinaryOp::Add => a.wrapping_add(b),
                BinaryOp::Sub => a.wrapping_sub(b),
                BinaryOp::Mul => a.wrapping_mul(b),
                BinaryOp::Div if b == 0 => {
                    ctx.report(ErrorImpl::DivisionByZero, span);
                    return None;
                }
                BinaryOp::Div => a.wrapping_div(b),
                BinaryOp::Mod if b == 0 => {
                    ctx.report(ErrorImpl::ModByZero, span);
                    return None;
                }
                BinaryOp::Mod => a.wrapping_rem(b),
                _ => return Some(Analysed::new(ty)),
            };
            Some(Analysed::constant(ConstValue::Int(wrap_to(&ty, value)), ty))
        }
        (Some(ConstValue::Float(a)), Some(ConstValue::Float(b))) => {
            let (a, b) = (*a, *b);
            let value = match op {
                BinaryOp::Add => a + b,
                BinaryOp::Sub => a - b,
                BinaryOp::Mul => a * b,
                BinaryOp::Div if b == 0.0 => {
                    ctx.report(ErrorImpl::DivisionByZero, span);
                    return None;
                }
                BinaryOp::Div => a / b,
                _ => return Some(Analysed::new(ty)),
            };
            Some(Analysed::constant(ConstValue::Float(round_to(&ty, value)), ty))
        }
        (_, Some(ConstValue::Int(0))) if op == BinaryOp::Div => {
            ctx.report(ErrorImpl::DivisionByZero, span);
            None
        }
        (_, Some(ConstValue::Float(value))) if op == BinaryOp::Div && *value == 0.0 => {
            ctx.report(ErrorImpl::DivisionByZero, span);
            None
        }
        (_, Some(ConstValue::Int(0))) if op == BinaryOp::Mod => {
            ctx.report(ErrorImpl::ModByZero, span);
            None
        }
        _ => Some(Analysed::new(ty)),
    }
}

fn analyse_bitwise(
    ctx: &mut SemaContext,
    op: BinaryOp,
    left: &mut Expr,
    right: &mut Expr,
    span: &Span,
) -> Option<Analysed> {
    let (left_type, right_type) = (type_of(left), type_of(right));

    if left_type.is_bool() && right_type.is_bool() {
        return match (left.const_value(), right.const_value()) {
            (Some(ConstValue::Bool(a)), Some(ConstValue::Bool(b))) => {
                let value = match op {
                    BinaryOp::BitAnd => a & b,
                    BinaryOp::BitOr => a | b,
                    _ => a ^ b,
                };
                Some(Analysed::constant(ConstValue::Bool(value), left_type))
            }
            _ => Some(Analysed::new(left_type)),
        };
    }

    if !left_type.is_integer() || !right_type.is_integer() {
        binop_error(ctx, &left_type, op, &right_type, span);
        return None;
    }

    let ty = cast_arithmetic(ctx, left, right, op.symbol(), span)?;
    match (left.const_value(), right.const_value()) {
        (Some(ConstValue::Int(a)), Some(ConstValue::Int(b))) => {
            let value = match op {
                BinaryOp::BitAnd => a & b,
                BinaryOp::BitOr => a | b,
                _ => a ^ b,
            };
            Some(Analysed::constant(ConstValue::Int(wrap_to(&ty, value)), ty))
        }
        _ => Some(Analysed::new(ty)),
    }
}

fn analyse_shift(
    ctx: &mut SemaContext,
    op: BinaryOp,
    left: &mut Expr,
    right: &mut Expr,
    span: &Span,
) -> Option<Analysed> {
    let (left_type, right_type) = (type_of(left), type_of(right));

    if !left_type.is_integer() || !right_type.is_integer() {
        binop_error(ctx, &left_type, op, &right_type, span);
        return None;
    }

    let width = left_type.bit_width().unwrap_or(i128::BITS) as i128;
    if let Some(ConstValue::Int(amount)) = right.const_value() {
        if !(0..width).contains(amount) {
            let error = ErrorImpl::ShiftOutOfRange {
                amount: *amount,
                type_: left_type.to_string(),
            };
            ctx.report(error, &right.span);
            return None;
        }
    }

    if let (Some(ConstValue::Int(value)), Some(ConstValue::Int(amount))) =
        (left.const_value(), right.const_value())
    {
        let amount = *amount as u32;
        let shifted = match op {
            BinaryOp::Shl => value.wrapping_shl(amount),
            _ => value.wrapping_shr(amount),
        };
        return Some(Analysed::constant(
            ConstValue::Int(wrap_to(&left_type, shifted)),
            left_type,
        ));
    }

    if !cast_to_runtime(ctx, left) || !cast_to_runtime(ctx, right) {
        return None;
    }

    Some(Analysed::new(type_of(left)))
}

fn analyse_logical(
    ctx: &mut SemaContext,
    op: BinaryOp,
    left: &mut Expr,
    right: &mut Expr,
    span: &Span,
) -> Option<Analysed> {
    let (left_type, right_type) = (type_of(left), type_of(right));

    if !left_type.is_bool() || !right_type.is_bool() {
        binop_error(ctx, &left_type, op, &right_type, span);
        return None;
    }

    match (left.const_value(), right.const_value()) {
        (Some(ConstValue::Bool(a)), Some(ConstValue::Bool(b))) => {
            let value = match op {
                BinaryOp::And => *a && *b,
                _ => *a || *b,
            };
            Some(Analysed::constant(ConstValue::Bool(value), Type::Bool))
        }
        _ => Some(Analysed::new(Type::Bool)),
    }
}

fn compare<T: PartialOrd>(op: BinaryOp, a: T, b: T) -> bool {
    let ordering = a.partial_cmp(&b);
    match op {
        BinaryOp::Eq => ordering == Some(Ordering::Equal),
        BinaryOp::NotEq => ordering != Some(Ordering::Equal),
        BinaryOp::Less => ordering == Some(Ordering::Less),
        BinaryOp::LessEq => matches!(ordering, Some(Ordering::Less | Ordering::Equal)),
        BinaryOp::Greater => ordering == Some(Ordering::Greater),
        BinaryOp::GreaterEq => matches!(ordering, Some(Ordering::Greater | Ordering::Equal)),
        _ => false,
    }
}

fn analyse_comparison(
    ctx: &mut SemaContext,
    op: BinaryOp,
    left: &mut Expr,
    right: &mut Expr,
    span: &Span,
) -> Option<Analysed> {
    let (left_type, right_type) = (type_of(left), type_of(right));
    let equality = matches!(op, BinaryOp::Eq | BinaryOp::NotEq);

    if left_type.is_number() && right_type.is_number() {
        cast_arithmetic(ctx, left, right, op.symbol(), span)?;
    } else if left_type.is_pointer() && right_type.is_pointer() {
        if !left_type.same_as(&right_type) {
            let unified = if can_cast(&right_type, &left_type, CastKind::Implicit) {
                cast(ctx, right, &left_type, CastKind::Implicit)
            } else if can_cast(&left_type, &right_type, CastKind::Implicit) {
                cast(ctx, left, &right_type, CastKind::Implicit)
            } else {
                binop_error(ctx, &left_type, op, &right_type, span);
                return None;
            };
            if !unified {
                return None;
            }
        }
    } else {
        let comparable = left_type.same_as(&right_type)
            && match left_type.canonical() {
                Type::Bool | Type::Enum { .. } => true,
                Type::String => equality,
                _ => false,
            };
        if !comparable {
            binop_error(ctx, &left_type, op, &right_type, span);
            return None;
        }
    }

    let folded = match (left.const_value(), right.const_value()) {
        (Some(ConstValue::Int(a)), Some(ConstValue::Int(b))) => Some(compare(op, a, b)),
        (Some(ConstValue::Float(a)), Some(ConstValue::Float(b))) => Some(compare(op, a, b)),
        (Some(ConstValue::Bool(a)), Some(ConstValue::Bool(b))) => Some(compare(op, a, b)),
        (Some(ConstValue::String(a)), Some(ConstValue::String(b))) => Some(compare(op, a, b)),
        (Some(ConstValue::Nil), Some(ConstValue::Nil)) => Some(compare(op, 0, 0)),
        _ => None,
    };

    if let Some(value) = folded {
        return Some(Analysed::constant(ConstValue::Bool(value), Type::Bool));
    }

    if !cast_to_runtime(ctx, left) || !cast_to_runtime(ctx, right) {
        return None;
    }

    Some(Analysed::new(Type::Bool))
}

/// `a ?: b`, the left value when it is truthy, else the right.
fn analyse_elvis(ctx: &mut SemaContext, left: &mut Expr, right: &mut Expr) -> Option<Analysed> {
    let ty = type_of(left);

    if !(ty.is_bool() || ty.is_pointer() || ty.is_number()) {
        let error = ErrorImpl::CannotCast {
            from: ty.to_string(),
            to: Type::Bool.to_string(),
        };
        ctx.report(error, &left.span);
        return None;
    }

    if !cast(ctx, right, &ty, CastKind::Implicit) {
        return None;
    }

    let truthy = left.const_value().map(|value| !is_falsy(value));
    match truthy {
        Some(true) => Some(Analysed::rewrite(left.take().kind, ty)),
        Some(false) => Some(Analysed::rewrite(right.take().kind, ty)),
        None => Some(Analysed::new(ty)),
    }
}

fn analyse_compound_assign(
    ctx: &mut SemaContext,
    op: BinaryOp,
    left: &mut Expr,
    right: &mut Expr,
    span: &Span,
) -> Option<Analysed> {
    let base = op.base_op()?;

    if !is_lvalue(ctx, left) {
        ctx.report(ErrorImpl::NotAssignable, &left.span);
        return None;
    }

    let (ty, right_type) = (type_of(left), type_of(right));
    let integer_only = matches!(
        base,
        BinaryOp::Mod | BinaryOp::BitAnd | BinaryOp::BitOr | BinaryOp::BitXor | BinaryOp::Shl | BinaryOp::Shr
    );

    let valid = if ty.is_pointer() {
        matches!(base, BinaryOp::Add | BinaryOp::Sub) && right_type.is_integer()
    } else if matches!(base, BinaryOp::Shl | BinaryOp::Shr) {
        ty.is_integer() && right_type.is_integer()
    } else if integer_only {
        ty.is_integer()
    } else {
        ty.is_number()
    };

    if !valid {
        binop_error(ctx, &ty, op, &right_type, span);
        return None;
    }

    let converted = if ty.is_pointer() || matches!(base, BinaryOp::Shl | BinaryOp::Shr) {
        cast_to_runtime(ctx, right)
    } else {
        cast(ctx, right, &ty, CastKind::Implicit)
    };
    if !converted {
        return None;
    }

    match right.const_value() {
        Some(ConstValue::Int(0)) if base == BinaryOp::Div => {
            ctx.report(ErrorImpl::DivisionByZero, span);
            None
        }
        Some(ConstValue::Float(value)) if base == BinaryOp::Div && *value == 0.0 => {
            ctx.report(ErrorImpl::DivisionByZero, span);
            None
        }
        Some(ConstValue::Int(0)) if base == BinaryOp::Mod => {
            ctx.report(ErrorImpl::ModByZero, span);
            None
        }
        _ => Some(Analysed::new(ty)),
    }
}

/// Variables, elements, fields and dereferenced pointers.
fn is_lvalue(ctx: &SemaContext, expr: &Expr) -> bool {
    match &expr.kind {
        ExprKind::Identifier { decl: Some(id), .. } => matches!(
            &ctx.session.decls[*id].kind,
            DeclKind::Var(var) if !var.kind.is_const()
        ),
        ExprKind::Subscript { .. } => true,
        ExprKind::Unary {
            op: UnaryOp::Deref, ..
        } => true,
        ExprKind::Access { base, .. } => {
            let base = base.ty().map(Type::canonical);
            let target = match base {
                Some(Type::Pointer(inner)) => Some(inner.canonical()),
                other => other,
            };
            matches!(target, Some(Type::Struct { .. }))
        }
        _ => false,
    }
}

fn analyse_unary(
    ctx: &mut SemaContext,
    op: UnaryOp,
    inner: &mut Expr,
    span: &Span,
) -> Option<Analysed> {
    if !analyse_expr(ctx, inner) {
        return None;
    }

    let ty = type_of(inner);

    match op {
        UnaryOp::Neg => {
            if !ty.may_negate() {
                ctx.report(ErrorImpl::CannotNegate { type_: ty.to_string() }, span);
                return None;
            }
            match inner.const_value() {
                Some(ConstValue::Int(value)) => Some(Analysed::constant(
                    ConstValue::Int(wrap_to(&ty, value.wrapping_neg())),
                    ty,
                )),
                Some(ConstValue::Float(value)) => {
                    Some(Analysed::constant(ConstValue::Float(-value), ty))
                }
                _ => Some(Analysed::new(ty)),
            }
        }
        UnaryOp::BitNot => match inner.const_value() {
            Some(ConstValue::Int(value)) if ty.is_integer() => {
                Some(Analysed::constant(ConstValue::Int(wrap_to(&ty, !value)), ty))
            }
            Some(ConstValue::Bool(value)) => Some(Analysed::constant(ConstValue::Bool(!value), ty)),
            _ if ty.is_integer() || ty.is_bool() => Some(Analysed::new(ty)),
            _ => {
                ctx.report(ErrorImpl::CannotBitNegate { type_: ty.to_string() }, span);
                None
            }
        },
        UnaryOp::Not => {
            if let Some(value) = inner.const_value() {
                return Some(Analysed::constant(
                    ConstValue::Bool(is_falsy(value)),
                    Type::Bool,
                ));
            }
            match ty.canonical() {
                Type::Pointer(_)
                | Type::Array(..)
                | Type::VarArray(_)
                | Type::Bool
                | Type::Int(_)
                | Type::Float(_) => Some(Analysed::new(Type::Bool)),
                _ => {
                    ctx.report(ErrorImpl::CannotUseNot { type_: ty.to_string() }, span);
                    None
                }
            }
        }
        UnaryOp::AddressOf => {
            if !is_lvalue(ctx, inner) {
                ctx.report(ErrorImpl::CannotTakeAddress, span);
                return None;
            }
            Some(Analysed::new(Type::pointer_to(ty)))
        }
        UnaryOp::Deref => match ty.pointee() {
            Some(pointee) if !pointee.is_void() => Some(Analysed::new(pointee.clone())),
            _ => {
                ctx.report(ErrorImpl::CannotDereference { type_: ty.to_string() }, span);
                None
            }
        },
        UnaryOp::Inc | UnaryOp::Dec => {
            if !is_lvalue(ctx, inner) {
                ctx.report(ErrorImpl::NotAssignable, span);
                return None;
            }
            if !matches!(ty.canonical(), Type::Int(_) | Type::Float(_) | Type::Pointer(_)) {
                ctx.report(ErrorImpl::CannotIncrement { type_: ty.to_string() }, span);
                return None;
            }
            Some(Analysed::new(ty))
        }
    }
}

enum Callee {
    Function(Signature),
    Macro(Signature),
}

fn analyse_call(
    ctx: &mut SemaContext,
    callee: &mut Expr,
    args: &mut [Expr],
    expansion: &mut Option<Vec<Stmt>>,
    span: &Span,
) -> Option<Analysed> {
    let name = describe(callee);

    if !analyse_expr(ctx, callee) {
        return None;
    }

    let id = match &callee.kind {
        ExprKind::Identifier { decl: Some(id), .. } => *id,
        ExprKind::MethodRef { decl } => *decl,
        _ => {
            if let Some(Type::Function(_)) = callee.ty().map(Type::canonical) {
                let feature = String::from("calling an expression that is not a name");
                ctx.report(ErrorImpl::UnsupportedFeature { feature }, span);
            } else {
                ctx.report(ErrorImpl::CannotBeCalled { name }, span);
            }
            return None;
        }
    };

    let decl = &ctx.session.decls[id];
    let signature = match decl.ty().map(Type::canonical) {
        Some(Type::Function(signature)) => Some(signature.as_ref().clone()),
        _ => None,
    };

    let target = match (&decl.kind, signature) {
        (DeclKind::Func(_), Some(signature)) | (DeclKind::Var(_), Some(signature)) => {
            Ok(Callee::Function(signature))
        }
        (DeclKind::Macro(_), Some(signature)) => Ok(Callee::Macro(signature)),
        (DeclKind::Generic(_), _) => Err(ErrorImpl::UnsupportedFeature {
            feature: format!("calling generic '{}'", name),
        }),
        _ => Err(ErrorImpl::CannotBeCalled { name: name.clone() }),
    };

    match target {
        Ok(Callee::Function(signature)) => {
            check_arguments(ctx, &name, &signature, args, span)?;
            Some(Analysed::new(signature.ret))
        }
        Ok(Callee::Macro(signature)) => {
            check_arguments(ctx, &name, &signature, args, span)?;
            expand_macro(ctx, id, &name, &signature, args, expansion, span)?;
            Some(Analysed::new(signature.ret))
        }
        Err(error) => {
            ctx.report(error, span);
            None
        }
    }
}

fn check_arguments(
    ctx: &mut SemaContext,
    name: &str,
    signature: &Signature,
    args: &mut [Expr],
    span: &Span,
) -> Option<()> {
    if args.len() != signature.params.len() {
        let error = ErrorImpl::ArgumentCountMismatch {
            name: name.to_string(),
            expected: signature.params.len(),
            received: args.len(),
        };
        ctx.report(error, span);
        return None;
    }

    for (arg, param) in args.iter_mut().zip(&signature.params) {
        if !analyse_expr(ctx, arg) || !cast(ctx, arg, param, CastKind::ImplicitAssign) {
            return None;
        }
    }

    Some(())
}

/// Analyses a copy of the macro body with the arguments bound as locals.
/// Constant arguments stay constant inside the body.
fn expand_macro(
    ctx: &mut SemaContext,
    macro_id: DeclId,
    name: &str,
    signature: &Signature,
    args: &[Expr],
    expansion: &mut Option<Vec<Stmt>>,
    span: &Span,
) -> Option<()> {
    let limit = ctx.session.options.max_macro_depth;
    if ctx.macro_depth >= limit {
        let error = ErrorImpl::MacroRecursionLimit {
            name: name.to_string(),
            limit,
        };
        ctx.report(error, span);
        return None;
    }

    let decl = &ctx.session.decls[macro_id];
    let unit = decl.unit?;
    let (params, mut body) = match &decl.kind {
        DeclKind::Macro(func) => (
            func.params
                .iter()
                .map(|param| (param.name.clone(), param.span.clone()))
                .collect::<Vec<_>>(),
            func.body.clone().unwrap_or_default(),
        ),
        _ => return None,
    };

    let mut guard = ctx.enter_macro(macro_id, unit, signature.ret.clone());

    for ((param, param_span), (ty, arg)) in params.into_iter().zip(signature.params.iter().zip(args)) {
        let (kind, init) = if arg.is_constant() {
            (VarKind::LocalConst, Some(arg.clone()))
        } else {
            (VarKind::Param, None)
        };
        let mut local = Decl::new(
            param.clone(),
            DeclKind::Var(VarDecl {
                kind,
                type_expr: None,
                init,
            }),
            param_span.clone(),
        );
        local.resolve = Resolution::Resolved(ty.clone());
        local.unit = Some(guard.unit);
        local.module = Some(guard.module);

        let id = guard.session.decls.alloc(local);
        if !guard.bind_local(&param, id) {
            guard.report(ErrorImpl::DuplicateDefinition { name: param }, &param_span);
            return None;
        }
    }

    let analysed = analyse_stmts(&mut guard, &mut body);
    drop(guard);

    *expansion = Some(body);
    analysed.then_some(())
}

/// `cast(value, T)` collapses into the converted value.
fn analyse_cast(ctx: &mut SemaContext, target: &TypeExpr, inner: &mut Expr) -> Option<Analysed> {
    let ty = resolve_type(ctx, target)?;

    if !analyse_expr(ctx, inner) || !cast(ctx, inner, &ty, CastKind::Explicit) {
        return None;
    }

    Some(Analysed::rewrite(inner.take().kind, ty))
}

fn analyse_conditional(
    ctx: &mut SemaContext,
    cond: &mut Expr,
    then_expr: &mut Expr,
    else_expr: &mut Expr,
    span: &Span,
) -> Option<Analysed> {
    if !check_condition(ctx, cond) {
        return None;
    }
    if !analyse_expr(ctx, then_expr) || !analyse_expr(ctx, else_expr) {
        return None;
    }

    let (then_type, else_type) = (type_of(then_expr), type_of(else_expr));

    let ty = if then_type.same_as(&else_type) {
        then_type
    } else if let Some(common) = Type::promote(&then_type, &else_type) {
        if !cast(ctx, then_expr, &common, CastKind::Implicit)
            || !cast(ctx, else_expr, &common, CastKind::Implicit)
        {
            return None;
        }
        common
    } else if can_cast(&else_type, &then_type, CastKind::Implicit) {
        if !cast(ctx, else_expr, &then_type, CastKind::Implicit) {
            return None;
        }
        then_type
    } else if can_cast(&then_type, &else_type, CastKind::Implicit) {
        if !cast(ctx, then_expr, &else_type, CastKind::Implicit) {
            return None;
        }
        else_type
    } else {
        let error = ErrorImpl::IncompatibleBranches {
            left: then_type.to_string(),
            right: else_type.to_string(),
        };
        ctx.report(error, span);
        return None;
    };

    if let Some(ConstValue::Bool(value)) = cond.const_value() {
        let chosen = if *value { then_expr } else { else_expr };
        return Some(Analysed::rewrite(chosen.take().kind, ty));
    }

    if ty.is_comptime() {
        if !cast_to_runtime(ctx, then_expr) {
            return None;
        }
        let ty = type_of(then_expr);
        if !cast(ctx, else_expr, &ty, CastKind::Implicit) {
            return None;
        }
        return Some(Analysed::new(ty));
    }

    Some(Analysed::new(ty))
}

fn analyse_subscript(ctx: &mut SemaContext, base: &mut Expr, index: &mut Expr) -> Option<Analysed> {
    if !analyse_expr(ctx, base) || !analyse_expr(ctx, index) {
        return None;
    }

    let (base_type, index_type) = (type_of(base), type_of(index));

    if !index_type.is_integer() {
        let error = ErrorImpl::CannotCast {
            from: index_type.to_string(),
            to: Type::Int(IntKind::I64).to_string(),
        };
        ctx.report(error, &index.span);
        return None;
    }

    let element = match base_type.canonical() {
        Type::Array(element, len) => {
            if let Some(ConstValue::Int(value)) = index.const_value() {
                if *value < 0 || *value >= *len as i128 {
                    let error = ErrorImpl::IndexOutOfBounds {
                        index: *value,
                        len: *len,
                    };
                    ctx.report(error, &index.span);
                    return None;
                }
            }
            element.as_ref().clone()
        }
        Type::VarArray(element) => element.as_ref().clone(),
        Type::Pointer(element) if !element.is_void() => element.as_ref().clone(),
        Type::String => Type::Int(IntKind::U8),
        _ => {
            let error = ErrorImpl::CannotIndex {
                type_: base_type.to_string(),
            };
            ctx.report(error, &base.span);
            return None;
        }
    };

    if !cast_to_runtime(ctx, index) {
        return None;
    }

    Some(Analysed::new(element))
}

fn no_such_member(ctx: &mut SemaContext, ty: &Type, member: &str, span: &Span) {
    let error = ErrorImpl::NoSuchMember {
        type_: ty.to_string(),
        member: member.to_string(),
    };
    ctx.report(error, span);
}

fn analyse_access(
    ctx: &mut SemaContext,
    base: &mut Expr,
    member: &str,
    span: &Span,
) -> Option<Analysed> {
    if !analyse_expr(ctx, base) {
        return None;
    }

    if let ExprKind::TypeRef(ty) = &base.kind {
        let ty = ty.clone();
        return analyse_type_member(ctx, &ty, member, span);
    }

    let base_type = type_of(base);
    let target = match base_type.canonical() {
        Type::Pointer(inner) => inner.canonical().clone(),
        other => other.clone(),
    };

    match &target {
        Type::Struct { decl, .. } => {
            let decl = *decl;
            if !ensure_analysed(ctx, decl) {
                return None;
            }
            let field = match &ctx.session.decls[decl].kind {
                DeclKind::Struct(decl) => decl
                    .fields
                    .iter()
                    .find(|field| field.name == member)
                    .and_then(|field| field.ty.clone()),
                _ => None,
            };
            match field {
                Some(ty) => Some(Analysed::new(ty)),
                None => {
                    no_such_member(ctx, &base_type, member, span);
                    None
                }
            }
        }
        Type::Array(_, len) if member == "len" => Some(Analysed::constant(
            ConstValue::Int(*len as i128),
            Type::Int(IntKind::U64),
        )),
        Type::VarArray(_) | Type::String if member == "len" => {
            Some(Analysed::new(Type::Int(IntKind::U64)))
        }
        _ => {
            no_such_member(ctx, &base_type, member, span);
            None
        }
    }
}

/// `Enum.Variant` or `Type.method`.
fn analyse_type_member(
    ctx: &mut SemaContext,
    ty: &Type,
    member: &str,
    span: &Span,
) -> Option<Analysed> {
    if let Type::Enum { decl, .. } = ty.canonical() {
        let decl = *decl;
        if !ensure_analysed(ctx, decl) {
            return None;
        }
        let value = match &ctx.session.decls[decl].kind {
            DeclKind::Enum(decl) => decl
                .variants
                .iter()
                .find(|variant| variant.name == member)
                .and_then(|variant| variant.resolved),
            _ => None,
        };
        if let Some(value) = value {
            return Some(Analysed::constant(ConstValue::Int(value), ty.clone()));
        }
    }

    let owner_name = ty.canonical().to_string();
    let method = ctx.visible_modules().into_iter().find_map(|module| {
        ctx.session
            .module(module)
            .methods
            .iter()
            .copied()
            .find(|id| {
                let decl = &ctx.session.decls[*id];
                let owner = match &decl.kind {
                    DeclKind::Func(func) | DeclKind::Macro(func) => func.owner.as_ref(),
                    _ => None,
                };
                decl.name == member
                    && matches!(owner, Some(TypeExpr::Named { name, .. }) if *name == owner_name)
            })
    });

    let Some(method) = method else {
        no_such_member(ctx, ty, member, span);
        return None;
    };

    if !ensure_analysed(ctx, method) {
        return None;
    }
    let method_type = ctx.session.decls[method].ty()?.clone();

    Some(Analysed::rewrite(
        ExprKind::MethodRef { decl: method },
        method_type,
    ))
}

fn analyse_struct_value(
    ctx: &mut SemaContext,
    target: &TypeExpr,
    init: &mut Expr,
    span: &Span,
) -> Option<Analysed> {
    let ty = resolve_type(ctx, target)?;

    match (ty.canonical().clone(), &mut init.kind) {
        (Type::Struct { decl, .. }, ExprKind::StructInitValues { fields }) => {
            let field_types = struct_fields(ctx, decl)?;
            for (name, value) in fields.iter_mut() {
                let Some((_, field_type)) = field_types.iter().find(|(field, _)| field == name)
                else {
                    no_such_member(ctx, &ty, name, &value.span);
                    return None;
                };
                if !analyse_expr(ctx, value)
                    || !cast(ctx, value, field_type, CastKind::ImplicitAssign)
                {
                    return None;
                }
            }
        }
        (Type::Struct { decl, .. }, ExprKind::InitializerList { elements }) => {
            let field_types = struct_fields(ctx, decl)?;
            if elements.len() > field_types.len() {
                cannot_initialize(ctx, &ty, span);
                return None;
            }
            for (value, (_, field_type)) in elements.iter_mut().zip(&field_types) {
                if !analyse_expr(ctx, value)
                    || !cast(ctx, value, field_type, CastKind::ImplicitAssign)
                {
                    return None;
                }
            }
        }
        (Type::Array(element, len), ExprKind::InitializerList { elements }) => {
            if elements.len() as u64 > len {
                cannot_initialize(ctx, &ty, span);
                return None;
            }
            for value in elements.iter_mut() {
                if !analyse_expr(ctx, value) || !cast(ctx, value, &element, CastKind::ImplicitAssign)
                {
                    return None;
                }
            }
        }
        _ => {
            cannot_initialize(ctx, &ty, span);
            return None;
        }
    }

    init.resolve = Resolution::Resolved(ty.clone());
    Some(Analysed::new(ty))
}

fn cannot_initialize(ctx: &mut SemaContext, ty: &Type, span: &Span) {
    let error = ErrorImpl::CannotInitialize {
        type_: ty.to_string(),
    };
    ctx.report(error, span);
}

fn struct_fields(ctx: &mut SemaContext, decl: DeclId) -> Option<Vec<(String, Type)>> {
    if !ensure_analysed(ctx, decl) {
        return None;
    }

    match &ctx.session.decls[decl].kind {
        DeclKind::Struct(decl) => decl
            .fields
            .iter()
            .map(|field| field.ty.clone().map(|ty| (field.name.clone(), ty)))
            .collect(),
        _ => None,
    }
}

/// `[a, b, c]` takes the common type of its elements.
fn analyse_initializer_list(
    ctx: &mut SemaContext,
    elements: &mut [Expr],
    span: &Span,
) -> Option<Analysed> {
    if elements.is_empty() {
        ctx.report(ErrorImpl::CannotInferType, span);
        return None;
    }

    for element in elements.iter_mut() {
        if !analyse_expr(ctx, element) || !cast_to_runtime(ctx, element) {
            return None;
        }
    }

    let mut common = type_of(&elements[0]);
    for element in elements.iter().skip(1) {
        let ty = type_of(element);
        if common.same_as(&ty) {
            continue;
        }
        common = match Type::promote(&common, &ty) {
            Some(promoted) => promoted,
            None => {
                let error = ErrorImpl::IncompatibleBranches {
                    left: common.to_string(),
                    right: ty.to_string(),
                };
                ctx.report(error, &element.span);
                return None;
            }
        };
    }

    for element in elements.iter_mut() {
        if !cast(ctx, element, &common, CastKind::Implicit) {
            return None;
        }
    }

    Some(Analysed::new(Type::Array(
        Box::new(common),
        elements.len() as u64,
    )))
}

/// Lambdas register on first sight. Inside a body they are analysed at
/// once, at global scope they wait for the lambda pass.
fn analyse_lambda(ctx: &mut SemaContext, slot: &mut DeclSlot) -> Option<Analysed> {
    let id = ctx.register_slot(slot);

    if !analyse_decl(ctx.session, id) {
        return None;
    }
    let ty = ctx.session.decls[id].ty()?.clone();

    if ctx.function.is_some() || ctx.evaluating_macro.is_some() {
        if !analyse_nested_body(ctx.session, id, ctx.macro_depth) {
            return None;
        }
        let unit = ctx.unit;
        ctx.session.unit_mut(unit).lambdas.push(id);
    } else {
        let module = ctx.module;
        ctx.session.module_mut(module).lambdas.push(id);
    }

    Some(Analysed::new(ty))
}
