use std::{
    path::{Path, PathBuf},
    rc::Rc,
};

use tracing::{debug, trace};

use crate::{
    ast::{
        ast::{ModuleId, UnitId},
        declarations::{Decl, DeclKind},
    },
    errors::{
        errors::{Error, ErrorImpl},
        Diagnostics,
    },
    parser::parser::parse_source,
    sema::passes,
    Span,
};

use super::{
    arena::DeclArena,
    loader::{FragmentParser, SourceLoader, SourceParser},
    module::{CompilationUnit, Module},
};

pub const MAX_INCLUDES: usize = 1024;

#[derive(Debug, Clone)]
pub struct SessionOptions {
    pub max_includes: usize,
    /// Analyse the bodies of `@test` functions.
    pub testing: bool,
    pub max_macro_depth: usize,
}

impl Default for SessionOptions {
    fn default() -> Self {
        SessionOptions {
            max_includes: MAX_INCLUDES,
            testing: false,
            max_macro_depth: 64,
        }
    }
}

/// Whole program state for one compilation run.
pub struct Session {
    pub options: SessionOptions,
    pub modules: Vec<Module>,
    pub units: Vec<CompilationUnit>,
    pub decls: DeclArena,
    pub diagnostics: Diagnostics,
    pub includes_used: usize,
    /// Output of `$echo`, in evaluation order.
    pub echoes: Vec<String>,
    loader: Box<dyn SourceLoader>,
    parser: Box<dyn FragmentParser>,
}

impl Session {
    pub fn new(options: SessionOptions, loader: Box<dyn SourceLoader>) -> Self {
        Session::with_parser(options, loader, Box::new(SourceParser))
    }

    pub fn with_parser(
        options: SessionOptions,
        loader: Box<dyn SourceLoader>,
        parser: Box<dyn FragmentParser>,
    ) -> Self {
        Session {
            options,
            modules: vec![],
            units: vec![],
            decls: DeclArena::default(),
            diagnostics: Diagnostics::new(),
            includes_used: 0,
            echoes: vec![],
            loader,
            parser,
        }
    }

    pub fn find_module(&self, name: &str) -> Option<ModuleId> {
        self.modules
            .iter()
            .position(|module| module.name == name)
            .map(ModuleId)
    }

    pub fn add_module(&mut self, name: &str, synthetic: bool) -> ModuleId {
        self.modules.push(Module::new(name.to_string(), synthetic));
        ModuleId(self.modules.len() - 1)
    }

    pub fn module(&self, id: ModuleId) -> &Module {
        &self.modules[id.0]
    }

    pub fn module_mut(&mut self, id: ModuleId) -> &mut Module {
        &mut self.modules[id.0]
    }

    pub fn unit(&self, id: UnitId) -> &CompilationUnit {
        &self.units[id.0]
    }

    pub fn unit_mut(&mut self, id: UnitId) -> &mut CompilationUnit {
        &mut self.units[id.0]
    }

    /// Parses a top level source file into a new compilation unit.
    ///
    /// The module comes from the `module` header, or the file stem when
    /// there is none. Syntax errors are returned, not reported.
    pub fn add_source(&mut self, file: &str, content: &str) -> Result<UnitId, Error> {
        let parsed = parse_source(content, file)?;
        let file = Rc::new(file.to_string());

        let (module_name, header_attributes) = match parsed.module {
            Some(header) => (header.name, header.attributes),
            None => (file_stem(&file), vec![]),
        };

        let module = match self.find_module(&module_name) {
            Some(module) => module,
            None => self.add_module(&module_name, false),
        };

        let unit_id = UnitId(self.units.len());
        let mut unit = CompilationUnit::new(Rc::clone(&file), module);

        for attribute in header_attributes {
            if attribute.name != "if" || unit.if_attr.is_some() {
                return Err(Error::new(
                    ErrorImpl::InvalidAttribute {
                        name: attribute.name,
                        target: String::from("module"),
                    },
                    attribute.span.start,
                ));
            }
            unit.if_attr = Some(attribute);
        }

        for mut decl in parsed.decls {
            if let DeclKind::Import(_) = decl.kind {
                if let Some(attribute) = decl.attributes.first() {
                    return Err(Error::new(
                        ErrorImpl::InvalidAttribute {
                            name: attribute.name.clone(),
                            target: String::from("import"),
                        },
                        attribute.span.start.clone(),
                    ));
                }

                decl.unit = Some(unit_id);
                decl.module = Some(module);
                let id = self.decls.alloc(decl);
                unit.imports.push(id);
            } else if decl.is_conditional() {
                unit.conditionals.push(decl);
            } else {
                unit.pending.push(decl);
            }
        }

        debug!(
            file = %file,
            module = %module_name,
            declarations = unit.pending.len(),
            conditionals = unit.conditionals.len(),
            "added source"
        );

        self.units.push(unit);
        self.modules[module.0].synthetic = false;
        self.modules[module.0].units.push(unit_id);

        Ok(unit_id)
    }

    /// Loads `path` through the session's loader and adds it.
    pub fn load_file(&mut self, path: &Path) -> Result<UnitId, Error> {
        let display = path.display().to_string();
        let content = self.loader.load(path).map_err(|reason| {
            Error::new(
                ErrorImpl::FailedToLoadFile {
                    file: display.clone(),
                    reason,
                },
                crate::Position(0, Rc::new(display.clone())),
            )
        })?;

        self.add_source(&display, &content)
    }

    pub(crate) fn load_source(&self, path: &Path) -> Result<String, String> {
        trace!(path = %path.display(), "loading");
        self.loader.load(path)
    }

    pub(crate) fn parse_fragment(&self, source: &str, file: &str) -> Result<Vec<Decl>, Error> {
        self.parser.parse_declarations(source, file)
    }

    /// Runs every analysis pass over every module.
    pub fn analyse(&mut self) -> bool {
        passes::analyse(self);
        !self.has_errors()
    }

    pub fn report(&mut self, error: ErrorImpl, span: &Span) {
        self.diagnostics.report(Error::new(error, span.start.clone()));
    }

    pub fn has_errors(&self) -> bool {
        self.diagnostics.has_errors()
    }

    pub fn error_count(&self) -> usize {
        self.diagnostics.error_count()
    }
}

fn file_stem(file: &str) -> String {
    PathBuf::from(file)
        .file_stem()
        .map(|stem| stem.to_string_lossy().into_owned())
        .unwrap_or_else(|| file.to_string())
}
