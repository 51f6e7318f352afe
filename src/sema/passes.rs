//! The analysis pipeline.
//!
//! Every module advances through the same ordered stages. A pass may
//! force another module up to a stage out of order, for example a parent
//! synthesised while resolving the hierarchy.

use std::path::{Path, PathBuf};

use tracing::{debug, info, instrument, trace};

use crate::{
    ast::{
        ast::{Attribute, ConstValue, ModuleId, Resolution, UnitId},
        declarations::{Decl, DeclKind},
    },
    errors::errors::ErrorImpl,
    session::Session,
    types::types::Type,
};

use super::{
    context::SemaContext,
    decl::analyse_decl,
    expr::analyse_expr,
    stmt::analyse_function_body,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum AnalysisStage {
    NotStarted,
    ModuleHierarchy,
    ModuleTop,
    Imports,
    RegisterGlobals,
    ConditionalUnits,
    ConditionalDecls,
    CtAssert,
    CtEcho,
    Decls,
    Lambda,
    Functions,
}

impl AnalysisStage {
    pub const PIPELINE: [AnalysisStage; 11] = [
        AnalysisStage::ModuleHierarchy,
        AnalysisStage::ModuleTop,
        AnalysisStage::Imports,
        AnalysisStage::RegisterGlobals,
        AnalysisStage::ConditionalUnits,
        AnalysisStage::ConditionalDecls,
        AnalysisStage::CtAssert,
        AnalysisStage::CtEcho,
        AnalysisStage::Decls,
        AnalysisStage::Lambda,
        AnalysisStage::Functions,
    ];

    pub fn next(self) -> AnalysisStage {
        match self {
            AnalysisStage::NotStarted => AnalysisStage::ModuleHierarchy,
            AnalysisStage::ModuleHierarchy => AnalysisStage::ModuleTop,
            AnalysisStage::ModuleTop => AnalysisStage::Imports,
            AnalysisStage::Imports => AnalysisStage::RegisterGlobals,
            AnalysisStage::RegisterGlobals => AnalysisStage::ConditionalUnits,
            AnalysisStage::ConditionalUnits => AnalysisStage::ConditionalDecls,
            AnalysisStage::ConditionalDecls => AnalysisStage::CtAssert,
            AnalysisStage::CtAssert => AnalysisStage::CtEcho,
            AnalysisStage::CtEcho => AnalysisStage::Decls,
            AnalysisStage::Decls => AnalysisStage::Lambda,
            AnalysisStage::Lambda | AnalysisStage::Functions => AnalysisStage::Functions,
        }
    }
}

/// Runs every stage, in order, over every module. Modules created while
/// a stage runs are picked up by that same stage.
pub fn analyse(session: &mut Session) {
    for stage in AnalysisStage::PIPELINE {
        let mut index = 0;
        while index < session.modules.len() {
            analyse_stage(session, ModuleId(index), stage);
            index += 1;
        }
    }
}

/// Advances `module` one stage at a time until it reaches `target`.
/// A module already at or past `target` is left alone.
pub fn analyse_stage(session: &mut Session, module: ModuleId, target: AnalysisStage) {
    while session.module(module).stage < target {
        let stage = session.module(module).stage.next();
        session.module_mut(module).stage = stage;
        run_pass(session, module, stage);
    }
}

fn run_pass(session: &mut Session, module: ModuleId, stage: AnalysisStage) {
    let name = session.module(module).name.clone();
    debug!(module = %name, ?stage, "pass started");

    match stage {
        AnalysisStage::NotStarted => {}
        AnalysisStage::ModuleHierarchy => resolve_hierarchy(session, module),
        AnalysisStage::ModuleTop => {
            find_top(session, module);
        }
        AnalysisStage::Imports => process_imports(session, module),
        AnalysisStage::RegisterGlobals => register_globals(session, module),
        AnalysisStage::ConditionalUnits => conditional_units(session, module),
        AnalysisStage::ConditionalDecls => conditional_decls(session, module),
        AnalysisStage::CtAssert => ct_assert(session, module),
        AnalysisStage::CtEcho => ct_echo(session, module),
        AnalysisStage::Decls => analyse_decls(session, module),
        AnalysisStage::Lambda => analyse_lambdas(session, module),
        AnalysisStage::Functions => analyse_functions(session, module),
    }

    debug!(module = %name, ?stage, errors = session.error_count(), "pass finished");
}

/// Links `a::b::c` to `a::b`, creating the parent when no file declared it.
#[instrument(skip_all, name = "hierarchy")]
fn resolve_hierarchy(session: &mut Session, module: ModuleId) {
    let Some(parent_path) = session.module(module).parent_path().map(str::to_string) else {
        return;
    };

    let parent = match session.find_module(&parent_path) {
        Some(parent) => parent,
        None => {
            trace!(module = %parent_path, "synthesising parent module");
            let parent = session.add_module(&parent_path, true);
            analyse_stage(session, parent, AnalysisStage::ModuleHierarchy);
            parent
        }
    };

    session.module_mut(module).parent = Some(parent);
    session.module_mut(parent).children.push(module);
}

/// Root of the module's hierarchy, cached on first use.
pub fn find_top(session: &mut Session, module: ModuleId) -> ModuleId {
    if let Some(top) = session.module(module).top {
        return top;
    }

    let mut current = module;
    while let Some(parent) = session.module(current).parent {
        current = parent;
    }

    session.module_mut(module).top = Some(current);
    current
}

#[instrument(skip_all, name = "imports")]
fn process_imports(session: &mut Session, module: ModuleId) {
    let units = session.module(module).units.clone();

    for unit in units {
        let imports = session.unit(unit).imports.clone();

        for id in imports {
            let decl = &session.decls[id];
            let span = decl.span.clone();
            let DeclKind::Import(import) = &decl.kind else {
                continue;
            };
            let path = import.path.clone();

            let target = match session.find_module(&path) {
                None => {
                    session.report(ErrorImpl::ModuleNotFound { name: path }, &span);
                    session.decls[id].resolve = Resolution::Poisoned;
                    continue;
                }
                Some(target) if target == module => {
                    session.report(ErrorImpl::ImportSelf { name: path }, &span);
                    session.decls[id].resolve = Resolution::Poisoned;
                    continue;
                }
                Some(target) => target,
            };

            trace!(module = %path, "imported");
            if let DeclKind::Import(import) = &mut session.decls[id].kind {
                import.module = Some(target);
            }
            session.decls[id].resolve = Resolution::Resolved(Type::Void);

            let imports = &mut session.module_mut(module).imports;
            if !imports.contains(&target) {
                imports.push(target);
            }
        }
    }
}

/// Adds a declaration to its unit and, unless it is a method, to the
/// module's symbol table. Directives are queued for their passes.
fn register_decl(session: &mut Session, unit: UnitId, mut decl: Decl) {
    if matches!(decl.kind, DeclKind::CtInclude(_)) {
        session.unit_mut(unit).includes.push(decl);
        return;
    }
    if matches!(decl.kind, DeclKind::CtAssert { .. }) {
        session.unit_mut(unit).asserts.push(decl);
        return;
    }
    if matches!(decl.kind, DeclKind::CtEcho(_)) {
        session.unit_mut(unit).echoes.push(decl);
        return;
    }
    if matches!(decl.kind, DeclKind::Import(_)) {
        session.report(ErrorImpl::ImportInInclude, &decl.span);
        return;
    }

    let module = session.unit(unit).module;
    decl.unit = Some(unit);
    decl.module = Some(module);

    let name = decl.name.clone();
    let span = decl.span.clone();
    let is_method = decl.is_method();
    trace!(name = %name, kind = decl.kind_name(), "registering");

    let bucket = match &decl.kind {
        DeclKind::Attribute => Bucket::Attributes,
        DeclKind::Enum(_) => Bucket::Enums,
        DeclKind::Struct(_) | DeclKind::Typedef(_) => Bucket::Types,
        DeclKind::Macro(_) if is_method => Bucket::MacroMethods,
        DeclKind::Macro(_) => Bucket::Macros,
        DeclKind::Func(_) if is_method => Bucket::Methods,
        DeclKind::Func(_) => Bucket::Functions,
        DeclKind::Generic(_) => Bucket::Generics,
        _ => Bucket::Vars,
    };

    let id = session.decls.alloc(decl);
    let target = session.unit_mut(unit);
    match bucket {
        Bucket::Attributes => target.attributes.push(id),
        Bucket::Enums => target.enums.push(id),
        Bucket::Types => target.types.push(id),
        Bucket::Macros => target.macros.push(id),
        Bucket::Methods => target.methods.push(id),
        Bucket::MacroMethods => target.macro_methods.push(id),
        Bucket::Vars => target.vars.push(id),
        Bucket::Functions => target.functions.push(id),
        Bucket::Generics => target.generics.push(id),
    }

    if is_method {
        session.module_mut(module).methods.push(id);
        return;
    }

    if session.module(module).symbols.contains_key(&name) {
        session.report(ErrorImpl::DuplicateDefinition { name }, &span);
        session.decls[id].resolve = Resolution::Poisoned;
        return;
    }
    session.module_mut(module).symbols.insert(name, id);
}

enum Bucket {
    Attributes,
    Enums,
    Types,
    Macros,
    Methods,
    MacroMethods,
    Vars,
    Functions,
    Generics,
}

fn register_pending(session: &mut Session, unit: UnitId) {
    let pending = std::mem::take(&mut session.unit_mut(unit).pending);
    for decl in pending {
        register_decl(session, unit, decl);
    }
}

#[instrument(skip_all, name = "register_globals")]
fn register_globals(session: &mut Session, module: ModuleId) {
    let units = session.module(module).units.clone();

    for unit in units {
        // Gated units wait for their gate
        if session.unit(unit).if_attr.is_some() {
            continue;
        }
        register_pending(session, unit);
        process_includes(session, unit);
    }
}

/// Drains the unit's `$include` queue. Included files may queue more.
fn process_includes(session: &mut Session, unit: UnitId) {
    loop {
        let includes = std::mem::take(&mut session.unit_mut(unit).includes);
        if includes.is_empty() {
            break;
        }

        for include in includes {
            let Some(decls) = load_include(session, unit, include) else {
                continue;
            };

            for decl in decls {
                if decl.is_conditional() {
                    session.unit_mut(unit).conditionals.push(decl);
                } else {
                    register_decl(session, unit, decl);
                }
            }
        }
    }
}

/// Evaluates the file name, loads and parses the file. The path is
/// relative to the directory of the file holding the directive.
fn load_include(session: &mut Session, unit: UnitId, mut decl: Decl) -> Option<Vec<Decl>> {
    if let Some(attribute) = decl.attributes.iter().find(|attribute| attribute.name != "if") {
        let error = ErrorImpl::InvalidAttribute {
            name: attribute.name.clone(),
            target: String::from("$include"),
        };
        let span = attribute.span.clone();
        session.report(error, &span);
        return None;
    }

    let DeclKind::CtInclude(filename) = &mut decl.kind else {
        return None;
    };

    let mut ctx = SemaContext::new(session, unit);
    if !analyse_expr(&mut ctx, filename) {
        return None;
    }

    let name = match filename.const_value() {
        Some(ConstValue::String(name)) => name.clone(),
        _ => {
            ctx.report(ErrorImpl::ExpectedConstantString, &filename.span);
            return None;
        }
    };

    let path = match Path::new(decl.span.file()).parent() {
        Some(dir) => dir.join(&name),
        None => PathBuf::from(&name),
    };
    let shown = path.display().to_string();

    let content = match session.load_source(&path) {
        Ok(content) => content,
        Err(reason) => {
            let error = ErrorImpl::FailedToLoadFile {
                file: shown,
                reason,
            };
            session.report(error, &decl.span);
            return None;
        }
    };

    session.includes_used += 1;
    if session.includes_used > session.options.max_includes {
        let max = session.options.max_includes;
        session.report(ErrorImpl::TooManyIncludes { max }, &decl.span);
        return None;
    }

    trace!(file = %shown, count = session.includes_used, "included");

    match session.parse_fragment(&content, &shown) {
        Ok(decls) => Some(decls),
        Err(error) => {
            session.diagnostics.report(error);
            None
        }
    }
}

/// Evaluates an `@if` gate to a constant bool. Errors are reported and
/// give `None`.
fn evaluate_gate(session: &mut Session, unit: UnitId, attribute: &mut Attribute) -> Option<bool> {
    let mut ctx = SemaContext::new(session, unit);

    let [cond] = attribute.args.as_mut_slice() else {
        ctx.report(ErrorImpl::ExpectedOneParameter, &attribute.span);
        return None;
    };

    if !analyse_expr(&mut ctx, cond) {
        return None;
    }

    match (cond.const_value(), cond.ty()) {
        (Some(ConstValue::Bool(value)), Some(ty)) if ty.is_bool() => Some(*value),
        _ => {
            ctx.report(ErrorImpl::ExpectedConstantBool, &cond.span);
            None
        }
    }
}

/// Units with a module level `@if` contribute their declarations only
/// when the gate holds.
#[instrument(skip_all, name = "conditional_units")]
fn conditional_units(session: &mut Session, module: ModuleId) {
    let units = session.module(module).units.clone();

    for unit in units {
        let Some(mut gate) = session.unit_mut(unit).if_attr.take() else {
            continue;
        };

        let admitted = evaluate_gate(session, unit, &mut gate);
        trace!(file = %session.unit(unit).file, ?admitted, "unit gate");
        session.unit_mut(unit).if_attr = Some(gate);

        if admitted == Some(true) {
            register_pending(session, unit);
            process_includes(session, unit);
        } else {
            let target = session.unit_mut(unit);
            target.pending.clear();
            target.conditionals.clear();
        }
    }
}

/// Declarations gated with `@if`. Admitted declarations may include
/// files holding further gated declarations, so this runs to a fixpoint.
#[instrument(skip_all, name = "conditional_decls")]
fn conditional_decls(session: &mut Session, module: ModuleId) {
    let units = session.module(module).units.clone();

    for unit in units {
        loop {
            let conditionals = std::mem::take(&mut session.unit_mut(unit).conditionals);
            if conditionals.is_empty() {
                break;
            }

            for mut decl in conditionals {
                let gate = decl
                    .attributes
                    .iter_mut()
                    .find(|attribute| attribute.name == "if");
                let admitted = match gate {
                    Some(gate) => evaluate_gate(session, unit, gate),
                    None => Some(true),
                };

                trace!(name = %decl.name, ?admitted, "declaration gate");
                if admitted == Some(true) {
                    register_decl(session, unit, decl);
                }
            }

            process_includes(session, unit);
        }
    }
}

/// Checks `$assert`s. The first failure in a module stops the rest of
/// that module's asserts.
#[instrument(skip_all, name = "ct_assert")]
fn ct_assert(session: &mut Session, module: ModuleId) {
    let units = session.module(module).units.clone();

    for unit in units {
        let mut asserts = std::mem::take(&mut session.unit_mut(unit).asserts);

        let mut ctx = SemaContext::new(session, unit);
        let passed = asserts.iter_mut().all(|decl| check_assert(&mut ctx, decl));

        session.unit_mut(unit).asserts = asserts;
        if !passed {
            break;
        }
    }
}

fn check_assert(ctx: &mut SemaContext, decl: &mut Decl) -> bool {
    let span = decl.span.clone();
    let DeclKind::CtAssert { cond, message } = &mut decl.kind else {
        return true;
    };

    if !analyse_expr(ctx, cond) {
        return false;
    }
    let holds = match (cond.const_value(), cond.ty()) {
        (Some(ConstValue::Bool(value)), Some(ty)) if ty.is_bool() => *value,
        _ => {
            ctx.report(ErrorImpl::ExpectedConstantBool, &cond.span);
            return false;
        }
    };

    let message = match message {
        Some(message) => {
            if !analyse_expr(ctx, message) {
                return false;
            }
            match message.const_value() {
                Some(ConstValue::String(text)) => text.clone(),
                _ => {
                    ctx.report(ErrorImpl::ExpectedConstantString, &message.span);
                    return false;
                }
            }
        }
        None => String::from("Compile time assert failed."),
    };

    if !holds {
        ctx.report(ErrorImpl::CtAssertFailed { message }, &span);
        return false;
    }

    true
}

/// Prints `$echo` values. The first failure in a module stops the rest.
#[instrument(skip_all, name = "ct_echo")]
fn ct_echo(session: &mut Session, module: ModuleId) {
    let units = session.module(module).units.clone();

    for unit in units {
        let mut echoes = std::mem::take(&mut session.unit_mut(unit).echoes);

        let mut ctx = SemaContext::new(session, unit);
        let passed = echoes.iter_mut().all(|decl| check_echo(&mut ctx, decl));

        session.unit_mut(unit).echoes = echoes;
        if !passed {
            break;
        }
    }
}

fn check_echo(ctx: &mut SemaContext, decl: &mut Decl) -> bool {
    let DeclKind::CtEcho(value) = &mut decl.kind else {
        return true;
    };

    if !analyse_expr(ctx, value) {
        return false;
    }

    let Some(text) = value.const_value().map(ConstValue::to_string) else {
        ctx.report(ErrorImpl::ExpectedConstant, &value.span);
        return false;
    };

    info!(file = %decl.span.file(), "{}", text);
    ctx.session.echoes.push(text);
    true
}

/// Signatures, types and global values, in a fixed kind order.
#[instrument(skip_all, name = "decls")]
fn analyse_decls(session: &mut Session, module: ModuleId) {
    let units = session.module(module).units.clone();

    for unit in units {
        for id in session.unit(unit).analysis_order() {
            analyse_decl(session, id);
        }
    }
}

/// Bodies of lambdas found at global scope.
#[instrument(skip_all, name = "lambdas")]
fn analyse_lambdas(session: &mut Session, module: ModuleId) {
    while let Some(id) = session.module_mut(module).lambdas.pop() {
        if !analyse_function_body(session, id) {
            continue;
        }
        if let Some(unit) = session.decls[id].unit {
            session.unit_mut(unit).lambdas.push(id);
        }
    }
}

/// Method bodies, then function bodies.
#[instrument(skip_all, name = "functions")]
fn analyse_functions(session: &mut Session, module: ModuleId) {
    let units = session.module(module).units.clone();

    for unit in units {
        let target = session.unit(unit);
        let bodies = target
            .methods
            .iter()
            .chain(target.functions.iter())
            .copied()
            .collect::<Vec<_>>();

        for id in bodies {
            if session.decls[id].resolve.is_resolved() {
                analyse_function_body(session, id);
            }
        }
    }
}
