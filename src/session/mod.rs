//! Program wide state: modules, compilation units, the declaration arena
//! and the collaborators used to load and parse included files.

pub mod arena;
pub mod loader;
pub mod module;
pub mod session;

pub use arena::DeclArena;
pub use loader::{FragmentParser, FsLoader, MemoryLoader, SourceLoader, SourceParser};
pub use module::{CompilationUnit, Module};
pub use session::{Session, SessionOptions, MAX_INCLUDES};
