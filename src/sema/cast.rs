//! Conversion rules between types.
//!
//! A cast either rewrites a constant in place (range checked, or wrapped
//! for explicit casts) or wraps a runtime value in a `Conversion` node.

use crate::{
    ast::{
        ast::{ConstValue, Resolution},
        expressions::{Expr, ExprKind},
    },
    errors::errors::ErrorImpl,
    types::types::{FloatKind, IntKind, Type},
    Span,
};

use super::context::SemaContext;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CastKind {
    Implicit,
    /// Implicit, plus the conversions only allowed on assignment.
    ImplicitAssign,
    Explicit,
}

enum Converted {
    Constant(ConstValue),
    Runtime,
}

/// Converts an analysed expression to `target`, reporting on failure.
pub fn cast(ctx: &mut SemaContext, expr: &mut Expr, target: &Type, kind: CastKind) -> bool {
    let from = match expr.ty() {
        Some(ty) => ty.clone(),
        None => return false,
    };

    if from.same_as(target) {
        expr.resolve = Resolution::Resolved(target.clone());
        return true;
    }

    match convert(&from, target, expr.const_value(), kind) {
        Ok(Converted::Constant(value)) => {
            expr.kind = ExprKind::Const(value);
            expr.resolve = Resolution::Resolved(target.clone());
            true
        }
        Ok(Converted::Runtime) => {
            let span = expr.span.clone();
            let inner = expr.take();
            *expr = Expr {
                kind: ExprKind::Conversion {
                    inner: Box::new(inner),
                },
                span,
                resolve: Resolution::Resolved(target.clone()),
            };
            true
        }
        Err(error) => {
            ctx.report(error, &expr.span);
            false
        }
    }
}

/// Whether a runtime value of `from` converts to `to`.
pub fn can_cast(from: &Type, to: &Type, kind: CastKind) -> bool {
    from.same_as(to) || convert(from, to, None, kind).is_ok()
}

/// Promotes both operands to their common arithmetic type.
pub fn cast_arithmetic(
    ctx: &mut SemaContext,
    left: &mut Expr,
    right: &mut Expr,
    op: &str,
    span: &Span,
) -> Option<Type> {
    let left_type = left.ty()?.clone();
    let right_type = right.ty()?.clone();

    let common = match Type::promote(&left_type, &right_type) {
        Some(common) => common,
        None => {
            ctx.report(
                ErrorImpl::CannotPerformBinop {
                    left: left_type.to_string(),
                    op: op.to_string(),
                    right: right_type.to_string(),
                },
                span,
            );
            return None;
        }
    };

    // Keep alias names where one side already has the common type
    let common = if left_type.same_as(&common) {
        left_type
    } else if right_type.same_as(&common) {
        right_type
    } else {
        common
    };

    if !cast(ctx, left, &common, CastKind::Implicit) || !cast(ctx, right, &common, CastKind::Implicit)
    {
        return None;
    }

    Some(common)
}

/// Gives untyped constants a concrete type: `i32` when the value fits,
/// then `i64`, then `u64`. Untyped floats become `f64`.
pub fn cast_to_runtime(ctx: &mut SemaContext, expr: &mut Expr) -> bool {
    let target = match (expr.ty().map(Type::canonical), expr.const_value()) {
        (Some(Type::ComptimeInt), Some(ConstValue::Int(value))) => {
            let kind = [IntKind::I32, IntKind::I64, IntKind::U64]
                .into_iter()
                .find(|kind| kind.contains(*value));

            match kind {
                Some(kind) => Type::Int(kind),
                None => {
                    let error = ErrorImpl::ConstantOutOfRange {
                        value: value.to_string(),
                        type_: String::from("u64"),
                    };
                    ctx.report(error, &expr.span);
                    return false;
                }
            }
        }
        (Some(Type::ComptimeInt), _) => Type::Int(IntKind::I64),
        (Some(Type::ComptimeFloat), _) => Type::Float(FloatKind::F64),
        (Some(_), _) => return true,
        (None, _) => return false,
    };

    cast(ctx, expr, &target, CastKind::Implicit)
}

/// Truncates integer constants to the width of `ty`.
pub fn wrap_to(ty: &Type, value: i128) -> i128 {
    match ty.int_kind() {
        Some(kind) => kind.wrap(value),
        None => value,
    }
}

/// Rounds float constants to the precision of `ty`.
pub fn round_to(ty: &Type, value: f64) -> f64 {
    match ty.canonical() {
        Type::Float(FloatKind::F32) => value as f32 as f64,
        _ => value,
    }
}

fn convert(
    from: &Type,
    to: &Type,
    value: Option<&ConstValue>,
    kind: CastKind,
) -> Result<Converted, ErrorImpl> {
    let explicit = kind == CastKind::Explicit;
    let cannot = || ErrorImpl::CannotCast {
        from: from.to_string(),
        to: to.to_string(),
    };
    let out_of_range = |value: i128| ErrorImpl::ConstantOutOfRange {
        value: value.to_string(),
        type_: to.to_string(),
    };

    match (from.canonical(), to.canonical()) {
        // Integer to integer, constants are range checked unless explicit
        (Type::ComptimeInt | Type::Int(_), Type::Int(target)) => match value {
            Some(ConstValue::Int(value)) => {
                if target.contains(*value) {
                    Ok(Converted::Constant(ConstValue::Int(*value)))
                } else if explicit {
                    Ok(Converted::Constant(ConstValue::Int(target.wrap(*value))))
                } else {
                    Err(out_of_range(*value))
                }
            }
            _ => match from.canonical() {
                Type::Int(source)
                    if !explicit && (source.min() < target.min() || source.max() > target.max()) =>
                {
                    Err(cannot())
                }
                _ => Ok(Converted::Runtime),
            },
        },

        (Type::ComptimeInt | Type::Int(_), Type::Float(_) | Type::ComptimeFloat) => match value {
            Some(ConstValue::Int(value)) => Ok(Converted::Constant(ConstValue::Float(round_to(
                to,
                *value as f64,
            )))),
            _ => Ok(Converted::Runtime),
        },

        (Type::ComptimeFloat | Type::Float(_), Type::Float(target)) => match value {
            Some(ConstValue::Float(value)) => {
                Ok(Converted::Constant(ConstValue::Float(round_to(to, *value))))
            }
            _ => match from.canonical() {
                Type::Float(source) if !explicit && source.bits() > target.bits() => Err(cannot()),
                _ => Ok(Converted::Runtime),
            },
        },

        (Type::ComptimeFloat | Type::Float(_), Type::Int(target)) if explicit => match value {
            Some(ConstValue::Float(value)) => Ok(Converted::Constant(ConstValue::Int(
                target.wrap(value.trunc() as i128),
            ))),
            _ => Ok(Converted::Runtime),
        },

        (Type::Bool, Type::Int(_)) if explicit => match value {
            Some(ConstValue::Bool(value)) => Ok(Converted::Constant(ConstValue::Int(*value as i128))),
            _ => Ok(Converted::Runtime),
        },

        (Type::ComptimeInt | Type::Int(_), Type::Bool) if explicit => match value {
            Some(ConstValue::Int(value)) => Ok(Converted::Constant(ConstValue::Bool(*value != 0))),
            _ => Ok(Converted::Runtime),
        },

        // nil and void pointers convert freely, anything else needs `cast`
        (Type::Pointer(source), Type::Pointer(target)) => {
            if source.is_void() || target.is_void() || explicit {
                match value {
                    Some(ConstValue::Nil) => Ok(Converted::Constant(ConstValue::Nil)),
                    _ => Ok(Converted::Runtime),
                }
            } else {
                Err(cannot())
            }
        }

        (Type::Pointer(_), Type::Int(_)) | (Type::Int(_) | Type::ComptimeInt, Type::Pointer(_))
            if explicit =>
        {
            Ok(Converted::Runtime)
        }

        (Type::Enum { .. }, Type::Int(target)) if explicit => match value {
            Some(ConstValue::Int(value)) => {
                Ok(Converted::Constant(ConstValue::Int(target.wrap(*value))))
            }
            _ => Ok(Converted::Runtime),
        },

        (Type::ComptimeInt | Type::Int(_), Type::Enum { backing, .. }) if explicit => match value {
            Some(ConstValue::Int(value)) => {
                Ok(Converted::Constant(ConstValue::Int(backing.wrap(*value))))
            }
            _ => Ok(Converted::Runtime),
        },

        (Type::Array(element, _), Type::VarArray(target))
            if kind != CastKind::Implicit && element.same_as(target) =>
        {
            Ok(Converted::Runtime)
        }

        (Type::String, Type::Pointer(target))
            if explicit && matches!(target.canonical(), Type::Int(IntKind::U8 | IntKind::I8)) =>
        {
            Ok(Converted::Runtime)
        }

        _ => Err(cannot()),
    }
}
