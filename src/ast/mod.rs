/// AST (Abstract Syntax Tree) module
///
/// Submodules:
/// - ast: ids, resolution status and shared node pieces
/// - expressions: expression nodes and operators
/// - statements: statements inside function and macro bodies
/// - declarations: top level declarations
/// - types: type annotations as written in source
pub mod ast;
pub mod declarations;
pub mod expressions;
pub mod statements;
pub mod types;
