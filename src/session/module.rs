use std::{collections::HashMap, rc::Rc};

use crate::{
    ast::{
        ast::{Attribute, DeclId, ModuleId, UnitId},
        declarations::Decl,
    },
    sema::passes::AnalysisStage,
};

/// A named module such as `std::io`.
///
/// Modules form a strict tree. `parent` and `top` are plain ids into the
/// session's module list, so the tree never owns upwards.
#[derive(Debug)]
pub struct Module {
    pub name: String,
    pub parent: Option<ModuleId>,
    pub children: Vec<ModuleId>,
    pub units: Vec<UnitId>,
    /// Root of the tree this module lives in, cached by the top pass.
    pub top: Option<ModuleId>,
    pub symbols: HashMap<String, DeclId>,
    pub methods: Vec<DeclId>,
    /// Modules named by the import declarations of every unit.
    pub imports: Vec<ModuleId>,
    /// Lambdas found outside function bodies, analysed by the lambda pass.
    pub lambdas: Vec<DeclId>,
    pub stage: AnalysisStage,
    /// Created to fill a gap in the hierarchy rather than from a file.
    pub synthetic: bool,
}

impl Module {
    pub fn new(name: String, synthetic: bool) -> Self {
        Module {
            name,
            parent: None,
            children: vec![],
            units: vec![],
            top: None,
            symbols: HashMap::new(),
            methods: vec![],
            imports: vec![],
            lambdas: vec![],
            stage: AnalysisStage::NotStarted,
            synthetic,
        }
    }

    /// `a::b::c` gives `a::b`, a root gives `None`.
    pub fn parent_path(&self) -> Option<&str> {
        self.name.rfind("::").map(|index| &self.name[..index])
    }
}

/// One source file's worth of declarations.
#[derive(Debug)]
pub struct CompilationUnit {
    pub file: Rc<String>,
    pub module: ModuleId,
    /// `@if(...)` on the module header.
    pub if_attr: Option<Attribute>,

    pub attributes: Vec<DeclId>,
    pub enums: Vec<DeclId>,
    pub types: Vec<DeclId>,
    pub macros: Vec<DeclId>,
    pub methods: Vec<DeclId>,
    pub macro_methods: Vec<DeclId>,
    pub vars: Vec<DeclId>,
    pub functions: Vec<DeclId>,
    pub generics: Vec<DeclId>,
    pub imports: Vec<DeclId>,
    pub lambdas: Vec<DeclId>,

    /// Parsed but not yet registered.
    pub pending: Vec<Decl>,
    /// Waiting for their `@if` gate.
    pub conditionals: Vec<Decl>,
    pub includes: Vec<Decl>,
    pub asserts: Vec<Decl>,
    pub echoes: Vec<Decl>,
}

impl CompilationUnit {
    pub fn new(file: Rc<String>, module: ModuleId) -> Self {
        CompilationUnit {
            file,
            module,
            if_attr: None,
            attributes: vec![],
            enums: vec![],
            types: vec![],
            macros: vec![],
            methods: vec![],
            macro_methods: vec![],
            vars: vec![],
            functions: vec![],
            generics: vec![],
            imports: vec![],
            lambdas: vec![],
            pending: vec![],
            conditionals: vec![],
            includes: vec![],
            asserts: vec![],
            echoes: vec![],
        }
    }

    /// Every registered declaration in analysis order.
    pub fn analysis_order(&self) -> Vec<DeclId> {
        [
            &self.attributes,
            &self.enums,
            &self.types,
            &self.macros,
            &self.methods,
            &self.macro_methods,
            &self.vars,
            &self.functions,
            &self.generics,
        ]
        .into_iter()
        .flatten()
        .copied()
        .collect()
    }
}
