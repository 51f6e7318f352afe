use tracing::trace;

use crate::{
    ast::{
        ast::{DeclId, DeclSlot, Resolution},
        declarations::{Decl, DeclKind, VarDecl, VarKind},
        expressions::Expr,
        statements::Stmt,
    },
    errors::errors::ErrorImpl,
    session::Session,
    types::types::Type,
    Span,
};

use super::{
    cast::{cast, CastKind},
    context::SemaContext,
    decl::{analyse_decl, analyse_var},
    expr::analyse_expr,
};

/// Analyses every statement, even after a failure, so one run reports
/// as many errors as possible.
pub fn analyse_stmts(ctx: &mut SemaContext, body: &mut [Stmt]) -> bool {
    let mut ok = true;
    for stmt in body.iter_mut() {
        ok &= analyse_stmt(ctx, stmt);
    }
    ok
}

pub fn analyse_stmt(ctx: &mut SemaContext, stmt: &mut Stmt) -> bool {
    match stmt {
        Stmt::Block { body, .. } => {
            ctx.push_scope();
            let ok = analyse_stmts(ctx, body);
            ctx.pop_scope();
            ok
        }
        Stmt::Expr(expr) => analyse_expr(ctx, expr),
        Stmt::Local(slot) => analyse_local(ctx, slot),
        Stmt::Return { value, span } => analyse_return(ctx, value.as_mut(), span),
        Stmt::If {
            cond,
            then_body,
            else_body,
            ..
        } => {
            let mut ok = check_condition(ctx, cond);
            ok &= analyse_scoped(ctx, then_body);
            if let Some(else_body) = else_body {
                ok &= analyse_scoped(ctx, else_body);
            }
            ok
        }
        Stmt::While { cond, body, .. } => {
            let mut ok = check_condition(ctx, cond);
            ctx.loop_depth += 1;
            ok &= analyse_scoped(ctx, body);
            ctx.loop_depth -= 1;
            ok
        }
        Stmt::Break(span) => check_in_loop(ctx, "break", span),
        Stmt::Continue(span) => check_in_loop(ctx, "continue", span),
    }
}

fn analyse_scoped(ctx: &mut SemaContext, stmt: &mut Stmt) -> bool {
    ctx.push_scope();
    let ok = analyse_stmt(ctx, stmt);
    ctx.pop_scope();
    ok
}

/// Conditions must convert to `bool`.
pub fn check_condition(ctx: &mut SemaContext, cond: &mut Expr) -> bool {
    analyse_expr(ctx, cond) && cast(ctx, cond, &Type::Bool, CastKind::Implicit)
}

fn check_in_loop(ctx: &mut SemaContext, keyword: &str, span: &Span) -> bool {
    if ctx.loop_depth > 0 {
        return true;
    }

    let error = ErrorImpl::OutsideLoop {
        keyword: keyword.to_string(),
    };
    ctx.report(error, span);
    false
}

/// `let` and `const` in a body. The name is bound after the initializer
/// is analysed, so it cannot refer to itself.
fn analyse_local(ctx: &mut SemaContext, slot: &mut DeclSlot) -> bool {
    let id = ctx.register_slot(slot);

    let decl = &ctx.session.decls[id];
    let (name, span) = (decl.name.clone(), decl.span.clone());

    let ok = if decl.resolve == Resolution::Unresolved {
        ctx.session.decls[id].resolve = Resolution::InProgress;
        let result = analyse_var(ctx, id);
        ctx.session.decls[id].resolve = match result {
            Some(ty) => Resolution::Resolved(ty),
            None => Resolution::Poisoned,
        };
        ctx.session.decls[id].resolve.is_resolved()
    } else {
        decl.resolve.is_resolved()
    };

    if !ctx.bind_local(&name, id) {
        ctx.report(ErrorImpl::DuplicateDefinition { name }, &span);
        return false;
    }

    ok
}

fn analyse_return(ctx: &mut SemaContext, value: Option<&mut Expr>, span: &Span) -> bool {
    let rtype = ctx.rtype.clone().unwrap_or(Type::Void);

    match value {
        Some(value) if rtype.is_void() => {
            ctx.report(ErrorImpl::UnexpectedReturnValue, &value.span);
            false
        }
        Some(value) => {
            analyse_expr(ctx, value) && cast(ctx, value, &rtype, CastKind::ImplicitAssign)
        }
        None if !rtype.is_void() => {
            let error = ErrorImpl::MissingReturnValue {
                type_: rtype.to_string(),
            };
            ctx.report(error, span);
            false
        }
        None => true,
    }
}

/// Analyses the body of a function, method or lambda whose signature
/// is already resolved. `@test` functions are skipped unless testing.
pub fn analyse_function_body(session: &mut Session, id: DeclId) -> bool {
    analyse_nested_body(session, id, 0)
}

/// A body met while expanding macros. Expansions inside it count on top
/// of `macro_depth`.
pub fn analyse_nested_body(session: &mut Session, id: DeclId, macro_depth: usize) -> bool {
    if !analyse_decl(session, id) {
        return false;
    }

    let decl = &session.decls[id];
    let Some(unit) = decl.unit else {
        return false;
    };
    let Some(Type::Function(signature)) = decl.ty().map(Type::canonical) else {
        return false;
    };
    let signature = signature.as_ref().clone();

    if decl.has_attribute("test") && !session.options.testing {
        trace!(name = %decl.name, "skipping test function");
        return true;
    }

    let params = match &decl.kind {
        DeclKind::Func(func) => func
            .params
            .iter()
            .map(|param| (param.name.clone(), param.span.clone()))
            .collect::<Vec<_>>(),
        _ => return true,
    };

    let body = match &mut session.decls[id].kind {
        DeclKind::Func(func) => func.body.take(),
        _ => None,
    };
    let Some(mut body) = body else {
        return true;
    };

    let mut ctx = SemaContext::new(session, unit);
    ctx.function = Some(id);
    ctx.rtype = Some(signature.ret.clone());
    ctx.macro_depth = macro_depth;
    ctx.push_scope();

    let mut ok = true;
    for ((name, span), ty) in params.into_iter().zip(signature.params) {
        let mut param = Decl::new(
            name.clone(),
            DeclKind::Var(VarDecl {
                kind: VarKind::Param,
                type_expr: None,
                init: None,
            }),
            span.clone(),
        );
        param.resolve = Resolution::Resolved(ty);
        param.unit = Some(ctx.unit);
        param.module = Some(ctx.module);

        let param = ctx.session.decls.alloc(param);
        if !ctx.bind_local(&name, param) {
            ctx.report(ErrorImpl::DuplicateDefinition { name }, &span);
            ok = false;
        }
    }

    ok &= analyse_stmts(&mut ctx, &mut body);

    if let DeclKind::Func(func) = &mut session.decls[id].kind {
        func.body = Some(body);
    }

    ok
}
