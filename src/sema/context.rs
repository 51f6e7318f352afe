use std::{
    collections::HashMap,
    ops::{Deref, DerefMut},
};

use crate::{
    ast::{
        ast::{DeclId, DeclSlot, ModuleId, UnitId},
        declarations::{Decl, DeclKind},
    },
    errors::errors::ErrorImpl,
    session::Session,
    types::types::Type,
    Span,
};

/// Short lived analysis state for one sub-task: a gate, a directive, a
/// declaration or a function body. Dropped as soon as the task is done.
pub struct SemaContext<'s> {
    pub session: &'s mut Session,
    pub unit: UnitId,
    pub module: ModuleId,
    scopes: Vec<HashMap<String, DeclId>>,
    /// Function whose body is being analysed.
    pub function: Option<DeclId>,
    /// Expected type of `return` values.
    pub rtype: Option<Type>,
    pub evaluating_macro: Option<DeclId>,
    pub macro_depth: usize,
    pub loop_depth: usize,
}

impl<'s> SemaContext<'s> {
    pub fn new(session: &'s mut Session, unit: UnitId) -> Self {
        let module = session.unit(unit).module;
        SemaContext {
            session,
            unit,
            module,
            scopes: vec![],
            function: None,
            rtype: None,
            evaluating_macro: None,
            macro_depth: 0,
            loop_depth: 0,
        }
    }

    pub fn report(&mut self, error: ErrorImpl, span: &Span) {
        self.session.report(error, span);
    }

    pub fn push_scope(&mut self) {
        self.scopes.push(HashMap::new());
    }

    pub fn pop_scope(&mut self) {
        self.scopes.pop();
    }

    /// Binds a local in the innermost scope. Returns false when the name
    /// is already bound in that scope.
    pub fn bind_local(&mut self, name: &str, id: DeclId) -> bool {
        if self.scopes.is_empty() {
            self.push_scope();
        }

        match self.scopes.last_mut() {
            Some(scope) if scope.contains_key(name) => false,
            Some(scope) => {
                scope.insert(name.to_string(), id);
                true
            }
            None => false,
        }
    }

    /// Locals, innermost first, then the current module, then every
    /// imported module in import order.
    pub fn find_ident(&self, name: &str) -> Option<DeclId> {
        for scope in self.scopes.iter().rev() {
            if let Some(id) = scope.get(name) {
                return Some(*id);
            }
        }

        let module = self.session.module(self.module);
        if let Some(id) = module.symbols.get(name) {
            return Some(*id);
        }

        module
            .imports
            .iter()
            .find_map(|import| self.session.module(*import).symbols.get(name).copied())
    }

    /// `path::name`, looked up only in the module called `path`. That module
    /// must be the current one or one of its imports.
    pub fn find_path_ident(&self, path: &str, name: &str) -> Option<DeclId> {
        let target = self.visible_module(path)?;
        self.session.module(target).symbols.get(name).copied()
    }

    fn visible_module(&self, path: &str) -> Option<ModuleId> {
        let module = self.session.module(self.module);
        if module.name == path {
            return Some(self.module);
        }

        module
            .imports
            .iter()
            .copied()
            .find(|import| self.session.module(*import).name == path)
    }

    /// Modules whose methods are visible from here.
    pub fn visible_modules(&self) -> Vec<ModuleId> {
        let mut modules = vec![self.module];
        modules.extend(self.session.module(self.module).imports.iter().copied());
        modules
    }

    /// Moves a declaration written inside a body into the arena, once.
    pub fn register_slot(&mut self, slot: &mut DeclSlot) -> DeclId {
        match slot {
            DeclSlot::Registered(id) => *id,
            DeclSlot::Parsed(decl) => {
                let placeholder = Decl::new(String::new(), DeclKind::Attribute, decl.span.clone());
                let mut decl = std::mem::replace(decl.as_mut(), placeholder);
                decl.unit = Some(self.unit);
                decl.module = Some(self.module);

                let id = self.session.decls.alloc(decl);
                *slot = DeclSlot::Registered(id);
                id
            }
        }
    }

    /// Swaps in a clean macro evaluation context, with name lookup starting
    /// from the unit that declared the macro. Everything is restored when
    /// the guard drops, on every exit path.
    pub fn enter_macro<'c>(
        &'c mut self,
        macro_decl: DeclId,
        unit: UnitId,
        rtype: Type,
    ) -> MacroContextGuard<'c, 's> {
        let saved_unit = std::mem::replace(&mut self.unit, unit);
        let saved_module = std::mem::replace(&mut self.module, self.session.unit(unit).module);
        let saved_macro = self.evaluating_macro.replace(macro_decl);
        let saved_rtype = self.rtype.replace(rtype);
        let saved_scopes = std::mem::replace(&mut self.scopes, vec![HashMap::new()]);
        let saved_loop_depth = std::mem::take(&mut self.loop_depth);
        self.macro_depth += 1;

        MacroContextGuard {
            ctx: self,
            saved_unit,
            saved_module,
            saved_macro,
            saved_rtype,
            saved_scopes,
            saved_loop_depth,
        }
    }
}

pub struct MacroContextGuard<'c, 's> {
    ctx: &'c mut SemaContext<'s>,
    saved_unit: UnitId,
    saved_module: ModuleId,
    saved_macro: Option<DeclId>,
    saved_rtype: Option<Type>,
    saved_scopes: Vec<HashMap<String, DeclId>>,
    saved_loop_depth: usize,
}

impl<'c, 's> Deref for MacroContextGuard<'c, 's> {
    type Target = SemaContext<'s>;

    fn deref(&self) -> &Self::Target {
        self.ctx
    }
}

impl<'c, 's> DerefMut for MacroContextGuard<'c, 's> {
    fn deref_mut(&mut self) -> &mut Self::Target {
        self.ctx
    }
}

impl Drop for MacroContextGuard<'_, '_> {
    fn drop(&mut self) {
        self.ctx.unit = self.saved_unit;
        self.ctx.module = self.saved_module;
        self.ctx.evaluating_macro = self.saved_macro.take();
        self.ctx.rtype = self.saved_rtype.take();
        self.ctx.scopes = std::mem::take(&mut self.saved_scopes);
        self.ctx.loop_depth = self.saved_loop_depth;
        self.ctx.macro_depth -= 1;
    }
}
