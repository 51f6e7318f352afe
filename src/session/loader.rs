//! Source loading and fragment parsing used by `$include`.

use std::{
    collections::HashMap,
    fs,
    path::{Path, PathBuf},
};

use crate::{
    ast::declarations::Decl,
    errors::errors::{Error, ErrorImpl},
    parser::parser::parse_source,
};

pub trait SourceLoader {
    /// Returns the file content or a human readable reason.
    fn load(&self, path: &Path) -> Result<String, String>;
}

/// Reads from the file system.
#[derive(Debug, Default)]
pub struct FsLoader;

impl SourceLoader for FsLoader {
    fn load(&self, path: &Path) -> Result<String, String> {
        fs::read_to_string(path).map_err(|error| error.to_string())
    }
}

/// Serves files from memory, keyed by the exact path requested.
#[derive(Debug, Default)]
pub struct MemoryLoader {
    files: HashMap<PathBuf, String>,
}

impl MemoryLoader {
    pub fn new() -> Self {
        MemoryLoader::default()
    }

    pub fn insert(&mut self, path: impl Into<PathBuf>, content: impl Into<String>) {
        self.files.insert(path.into(), content.into());
    }

    pub fn with(mut self, path: impl Into<PathBuf>, content: impl Into<String>) -> Self {
        self.insert(path, content);
        self
    }
}

impl SourceLoader for MemoryLoader {
    fn load(&self, path: &Path) -> Result<String, String> {
        self.files
            .get(path)
            .cloned()
            .ok_or_else(|| String::from("No such file or directory"))
    }
}

/// Turns included source into declarations.
pub trait FragmentParser {
    fn parse_declarations(&self, source: &str, file: &str) -> Result<Vec<Decl>, Error>;
}

/// The lexer and parser of this crate.
#[derive(Debug, Default)]
pub struct SourceParser;

impl FragmentParser for SourceParser {
    fn parse_declarations(&self, source: &str, file: &str) -> Result<Vec<Decl>, Error> {
        let parsed = parse_source(source, file)?;

        // An included file continues the including module
        if let Some(header) = parsed.module {
            return Err(Error::new(
                ErrorImpl::UnexpectedTokenDetailed {
                    token: String::from("module"),
                    message: String::from("included files cannot declare a module"),
                },
                header.span.start,
            ));
        }

        Ok(parsed.decls)
    }
}
