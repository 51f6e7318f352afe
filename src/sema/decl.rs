use std::collections::HashSet;

use tracing::trace;

use crate::{
    ast::{
        ast::{ConstValue, DeclId, Resolution},
        declarations::{DeclKind, VarKind},
        expressions::Expr,
        types::TypeExpr,
    },
    errors::errors::ErrorImpl,
    session::Session,
    types::types::{IntKind, Signature, Type},
    Span,
};

use super::{
    cast::{cast, cast_to_runtime, CastKind},
    context::SemaContext,
    expr::analyse_expr,
};

/// Analyses a global declaration in a fresh context for its unit.
///
/// Memoised: a resolved declaration returns at once, a poisoned one fails
/// silently. Meeting a declaration that is still in progress reports a
/// single recursion error; the outer analysis then poisons it.
pub fn analyse_decl(session: &mut Session, id: DeclId) -> bool {
    let decl = &session.decls[id];
    if decl.resolve.is_resolved() {
        return true;
    }
    if decl.resolve.is_poisoned() {
        return false;
    }
    if decl.resolve == Resolution::InProgress {
        let error = ErrorImpl::RecursiveResolution {
            name: decl.name.clone(),
        };
        let span = decl.span.clone();
        session.report(error, &span);
        return false;
    }

    let Some(unit) = decl.unit else {
        return false;
    };

    trace!(name = %decl.name, kind = decl.kind_name(), "analysing declaration");
    session.decls[id].resolve = Resolution::InProgress;

    let mut ctx = SemaContext::new(session, unit);
    let result = analyse_decl_kind(&mut ctx, id);

    session.decls[id].resolve = match result {
        Some(ty) => Resolution::Resolved(ty),
        None => Resolution::Poisoned,
    };

    session.decls[id].resolve.is_resolved()
}

/// `analyse_decl` from inside an expression.
pub fn ensure_analysed(ctx: &mut SemaContext, id: DeclId) -> bool {
    analyse_decl(ctx.session, id)
}

enum Tag {
    Var,
    Function { is_macro: bool },
    Struct,
    Enum,
    Typedef,
    Opaque,
}

fn analyse_decl_kind(ctx: &mut SemaContext, id: DeclId) -> Option<Type> {
    let tag = match &ctx.session.decls[id].kind {
        DeclKind::Var(_) => Tag::Var,
        DeclKind::Func(_) => Tag::Function { is_macro: false },
        DeclKind::Macro(_) => Tag::Function { is_macro: true },
        DeclKind::Struct(_) => Tag::Struct,
        DeclKind::Enum(_) => Tag::Enum,
        DeclKind::Typedef(_) => Tag::Typedef,
        DeclKind::Generic(_)
        | DeclKind::Attribute
        | DeclKind::Import(_)
        | DeclKind::CtInclude(_)
        | DeclKind::CtAssert { .. }
        | DeclKind::CtEcho(_) => Tag::Opaque,
    };

    match tag {
        Tag::Var => analyse_var(ctx, id),
        Tag::Function { is_macro } => analyse_signature(ctx, id, is_macro),
        Tag::Struct => analyse_struct(ctx, id),
        Tag::Enum => analyse_enum(ctx, id),
        Tag::Typedef => analyse_typedef(ctx, id),
        Tag::Opaque => Some(Type::Void),
    }
}

/// Resolves a written type to a semantic type.
///
/// Struct names resolve without analysing the struct, so structs may
/// point at themselves. Enums and typedefs are analysed first.
pub fn resolve_type(ctx: &mut SemaContext, type_expr: &TypeExpr) -> Option<Type> {
    match type_expr {
        TypeExpr::Named { path, name, span } => {
            if path.is_none() {
                if let Some(builtin) = Type::builtin(name) {
                    return Some(builtin);
                }
            }

            let found = match path {
                Some(path) => ctx.find_path_ident(path, name),
                None => ctx.find_ident(name),
            };
            let Some(id) = found else {
                let error = ErrorImpl::UnknownType {
                    type_: type_expr.to_string(),
                };
                ctx.report(error, span);
                return None;
            };

            let decl = &ctx.session.decls[id];
            match &decl.kind {
                DeclKind::Struct(decl_struct) => Some(Type::Struct {
                    decl: id,
                    name: decl.name.clone(),
                    is_union: decl_struct.is_union,
                }),
                DeclKind::Enum(_) | DeclKind::Typedef(_) => {
                    if !ensure_analysed(ctx, id) {
                        return None;
                    }
                    ctx.session.decls[id].ty().cloned()
                }
                _ => {
                    let error = ErrorImpl::NotAType {
                        name: type_expr.to_string(),
                    };
                    ctx.report(error, span);
                    None
                }
            }
        }
        TypeExpr::Pointer(inner) => resolve_type(ctx, inner).map(Type::pointer_to),
        TypeExpr::Array(inner, Some(len)) => {
            resolve_type(ctx, inner).map(|inner| Type::Array(Box::new(inner), *len))
        }
        TypeExpr::Array(inner, None) => {
            resolve_type(ctx, inner).map(|inner| Type::VarArray(Box::new(inner)))
        }
    }
}

/// Outcome of a size query.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TypeSize {
    Bytes(u64),
    Unsized,
    /// Larger than `u64::MAX` bytes.
    TooLarge,
    /// The type's declaration failed; that failure is already reported.
    Failed,
}

/// Size in bytes. Struct fields are laid out without padding.
pub fn size_of(session: &mut Session, ty: &Type) -> TypeSize {
    if let Some(size) = ty.builtin_size() {
        return TypeSize::Bytes(size);
    }

    match ty.canonical() {
        Type::Array(inner, len) => match size_of(session, inner) {
            TypeSize::Bytes(size) => size
                .checked_mul(*len)
                .map_or(TypeSize::TooLarge, TypeSize::Bytes),
            other => other,
        },
        Type::Struct { decl, .. } => {
            if !analyse_decl(session, *decl) {
                return TypeSize::Failed;
            }
            match &session.decls[*decl].kind {
                DeclKind::Struct(decl) => decl.size.map_or(TypeSize::Unsized, TypeSize::Bytes),
                _ => TypeSize::Unsized,
            }
        }
        Type::Enum { backing, .. } => TypeSize::Bytes(backing.bits() as u64 / 8),
        _ => TypeSize::Unsized,
    }
}

/// Globals, constants and locals.
pub fn analyse_var(ctx: &mut SemaContext, id: DeclId) -> Option<Type> {
    let (kind, type_expr, mut init) = match &mut ctx.session.decls[id].kind {
        DeclKind::Var(var) => (var.kind, var.type_expr.clone(), var.init.take()),
        _ => return None,
    };

    let result = var_type(ctx, kind, type_expr.as_ref(), init.as_mut());

    if let DeclKind::Var(var) = &mut ctx.session.decls[id].kind {
        var.init = init;
    }

    result
}

fn var_type(
    ctx: &mut SemaContext,
    kind: VarKind,
    type_expr: Option<&TypeExpr>,
    init: Option<&mut Expr>,
) -> Option<Type> {
    let declared = match type_expr {
        Some(type_expr) => Some(resolve_type(ctx, type_expr)?),
        None => None,
    };

    let Some(init) = init else {
        return declared;
    };

    if !analyse_expr(ctx, init) {
        return None;
    }

    let ty = match declared {
        Some(ty) => {
            if !cast(ctx, init, &ty, CastKind::ImplicitAssign) {
                return None;
            }
            ty
        }
        None => {
            let ty = init.ty()?.clone();
            if ty.is_void() || ty == Type::TypeInfo {
                ctx.report(ErrorImpl::CannotInferType, &init.span);
                return None;
            }

            if kind.is_const() {
                ty
            } else {
                if !cast_to_runtime(ctx, init) {
                    return None;
                }
                init.ty()?.clone()
            }
        }
    };

    if kind.is_const() && !init.is_constant() {
        ctx.report(ErrorImpl::ExpectedConstant, &init.span);
        return None;
    }

    Some(ty)
}

/// Functions, methods, lambdas and macros: owner, parameters and return
/// type. Bodies are analysed by a later pass.
fn analyse_signature(ctx: &mut SemaContext, id: DeclId, is_macro: bool) -> Option<Type> {
    let decl = &ctx.session.decls[id];
    let (name, span) = (decl.name.clone(), decl.span.clone());
    let func = match &decl.kind {
        DeclKind::Func(func) | DeclKind::Macro(func) => func,
        _ => return None,
    };

    let owner = func.owner.clone();
    let params = func
        .params
        .iter()
        .map(|param| param.type_expr.clone())
        .collect::<Vec<_>>();
    let ret = func.ret.clone();
    let (is_extern, has_body) = (func.is_extern, func.body.is_some());

    if !is_macro {
        if is_extern && has_body {
            ctx.report(ErrorImpl::ExternWithBody { name }, &span);
            return None;
        }
        if !is_extern && !has_body {
            ctx.report(ErrorImpl::MissingBody { name }, &span);
            return None;
        }
    }

    if let Some(owner) = &owner {
        resolve_type(ctx, owner)?;
    }

    let mut param_types = Vec::with_capacity(params.len());
    for param in &params {
        param_types.push(resolve_type(ctx, param)?);
    }

    let ret = match &ret {
        Some(ret) => resolve_type(ctx, ret)?,
        None => Type::Void,
    };

    Some(Type::Function(Box::new(Signature {
        params: param_types,
        ret,
    })))
}

fn analyse_struct(ctx: &mut SemaContext, id: DeclId) -> Option<Type> {
    let decl = &ctx.session.decls[id];
    let name = decl.name.clone();
    let (is_union, fields) = match &decl.kind {
        DeclKind::Struct(decl) => (
            decl.is_union,
            decl.fields
                .iter()
                .map(|field| (field.name.clone(), field.type_expr.clone(), field.span.clone()))
                .collect::<Vec<_>>(),
        ),
        _ => return None,
    };

    let mut seen = HashSet::new();
    let mut types = Vec::with_capacity(fields.len());
    let mut size = 0u64;

    for (field_name, type_expr, span) in &fields {
        if !seen.insert(field_name.as_str()) {
            let error = ErrorImpl::DuplicateDefinition {
                name: field_name.clone(),
            };
            ctx.report(error, span);
            return None;
        }

        let ty = resolve_type(ctx, type_expr)?;
        let field_size = match size_of(ctx.session, &ty) {
            TypeSize::Bytes(size) => size,
            TypeSize::Failed => return None,
            TypeSize::Unsized => {
                ctx.report(ErrorImpl::NoSize { type_: ty.to_string() }, span);
                return None;
            }
            TypeSize::TooLarge => {
                ctx.report(ErrorImpl::TypeTooLarge { type_: ty.to_string() }, span);
                return None;
            }
        };

        let next = if is_union {
            Some(size.max(field_size))
        } else {
            size.checked_add(field_size)
        };
        size = match next {
            Some(next) => next,
            None => {
                ctx.report(ErrorImpl::TypeTooLarge { type_: name.clone() }, span);
                return None;
            }
        };
        types.push(ty);
    }

    if let DeclKind::Struct(decl) = &mut ctx.session.decls[id].kind {
        for (field, ty) in decl.fields.iter_mut().zip(types) {
            field.ty = Some(ty);
        }
        decl.size = Some(size);
    }

    Some(Type::Struct {
        decl: id,
        name,
        is_union,
    })
}

/// Variants count up from zero, or from the last explicit value.
fn analyse_enum(ctx: &mut SemaContext, id: DeclId) -> Option<Type> {
    let decl = &mut ctx.session.decls[id];
    let name = decl.name.clone();
    let (backing, mut values, variants) = match &mut decl.kind {
        DeclKind::Enum(decl) => (
            decl.backing.clone(),
            decl.variants
                .iter_mut()
                .map(|variant| variant.value.take())
                .collect::<Vec<_>>(),
            decl.variants
                .iter()
                .map(|variant| (variant.name.clone(), variant.span.clone()))
                .collect::<Vec<_>>(),
        ),
        _ => return None,
    };

    let resolved = enum_values(ctx, backing.as_ref(), &variants, &mut values);

    let mut result = None;
    if let DeclKind::Enum(decl) = &mut ctx.session.decls[id].kind {
        for (variant, value) in decl.variants.iter_mut().zip(values) {
            variant.value = value;
        }

        if let Some((backing, resolved)) = resolved {
            for (variant, value) in decl.variants.iter_mut().zip(resolved) {
                variant.resolved = Some(value);
            }
            result = Some(Type::Enum {
                decl: id,
                name,
                backing,
            });
        }
    }

    result
}

fn enum_values(
    ctx: &mut SemaContext,
    backing: Option<&TypeExpr>,
    variants: &[(String, Span)],
    values: &mut [Option<Expr>],
) -> Option<(IntKind, Vec<i128>)> {
    let backing = match backing {
        Some(type_expr) => {
            let ty = resolve_type(ctx, type_expr)?;
            match ty.canonical() {
                Type::Int(kind) => *kind,
                _ => {
                    let error = ErrorImpl::CannotCast {
                        from: ty.to_string(),
                        to: String::from("an integer type"),
                    };
                    ctx.report(error, type_expr.span());
                    return None;
                }
            }
        }
        None => IntKind::I32,
    };

    let mut seen = HashSet::new();
    let mut resolved = Vec::with_capacity(variants.len());
    let mut next = 0i128;

    for ((name, span), value) in variants.iter().zip(values.iter_mut()) {
        if !seen.insert(name.as_str()) {
            ctx.report(ErrorImpl::DuplicateDefinition { name: name.clone() }, span);
            return None;
        }

        if let Some(value) = value {
            if !analyse_expr(ctx, value) {
                return None;
            }
            next = match (value.const_value(), value.ty()) {
                (Some(ConstValue::Int(number)), Some(ty)) if ty.is_integer() => *number,
                _ => {
                    ctx.report(ErrorImpl::ExpectedConstant, &value.span);
                    return None;
                }
            };
        }

        if !backing.contains(next) {
            let error = ErrorImpl::ConstantOutOfRange {
                value: next.to_string(),
                type_: backing.name().to_string(),
            };
            ctx.report(error, span);
            return None;
        }

        resolved.push(next);
        next += 1;
    }

    Some((backing, resolved))
}

fn analyse_typedef(ctx: &mut SemaContext, id: DeclId) -> Option<Type> {
    let decl = &ctx.session.decls[id];
    let name = decl.name.clone();
    let target = match &decl.kind {
        DeclKind::Typedef(target) => target.clone(),
        _ => return None,
    };

    let target = resolve_type(ctx, &target)?;
    Some(Type::Alias {
        name,
        target: Box::new(target),
    })
}
