use crate::{types::types::Type, Span};

use super::{
    ast::{Attribute, ModuleId, Resolution, UnitId},
    expressions::Expr,
    statements::Stmt,
    types::TypeExpr,
};

#[derive(Debug, Clone)]
pub struct Decl {
    pub name: String,
    pub span: Span,
    pub attributes: Vec<Attribute>,
    pub kind: DeclKind,
    pub resolve: Resolution,
    pub unit: Option<UnitId>,
    pub module: Option<ModuleId>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VarKind {
    Global,
    Const,
    Local,
    LocalConst,
    Param,
}

impl VarKind {
    pub fn is_const(self) -> bool {
        matches!(self, VarKind::Const | VarKind::LocalConst)
    }
}

#[derive(Debug, Clone)]
pub struct VarDecl {
    pub kind: VarKind,
    pub type_expr: Option<TypeExpr>,
    pub init: Option<Expr>,
}

#[derive(Debug, Clone)]
pub struct Param {
    pub name: String,
    pub type_expr: TypeExpr,
    pub span: Span,
}

#[derive(Debug, Clone)]
pub struct FuncDecl {
    /// Type name for methods, `fn Point.len(...)`.
    pub owner: Option<TypeExpr>,
    pub params: Vec<Param>,
    pub ret: Option<TypeExpr>,
    pub body: Option<Vec<Stmt>>,
    pub is_extern: bool,
    pub is_lambda: bool,
}

#[derive(Debug, Clone)]
pub struct GenericDecl {
    pub type_params: Vec<String>,
    pub func: FuncDecl,
}

#[derive(Debug, Clone)]
pub struct Field {
    pub name: String,
    pub type_expr: TypeExpr,
    pub span: Span,
    pub ty: Option<Type>,
}

#[derive(Debug, Clone)]
pub struct StructDecl {
    pub is_union: bool,
    pub fields: Vec<Field>,
    pub size: Option<u64>,
}

#[derive(Debug, Clone)]
pub struct EnumVariant {
    pub name: String,
    pub value: Option<Expr>,
    pub span: Span,
    pub resolved: Option<i128>,
}

#[derive(Debug, Clone)]
pub struct EnumDecl {
    pub backing: Option<TypeExpr>,
    pub variants: Vec<EnumVariant>,
}

#[derive(Debug, Clone)]
pub struct ImportDecl {
    pub path: String,
    pub module: Option<ModuleId>,
}

#[derive(Debug, Clone)]
pub enum DeclKind {
    Var(VarDecl),
    Func(FuncDecl),
    Macro(FuncDecl),
    Generic(GenericDecl),
    Struct(StructDecl),
    Enum(EnumDecl),
    Typedef(TypeExpr),
    Attribute,
    Import(ImportDecl),
    CtInclude(Expr),
    CtAssert {
        cond: Expr,
        message: Option<Expr>,
    },
    CtEcho(Expr),
}

impl Decl {
    pub fn new(name: String, kind: DeclKind, span: Span) -> Self {
        Decl {
            name,
            span,
            attributes: vec![],
            kind,
            resolve: Resolution::Unresolved,
            unit: None,
            module: None,
        }
    }

    pub fn ty(&self) -> Option<&Type> {
        self.resolve.ty()
    }

    pub fn attribute(&self, name: &str) -> Option<&Attribute> {
        self.attributes.iter().find(|attribute| attribute.name == name)
    }

    pub fn has_attribute(&self, name: &str) -> bool {
        self.attribute(name).is_some()
    }

    /// Gated by `@if(...)`.
    pub fn is_conditional(&self) -> bool {
        self.has_attribute("if")
    }

    pub fn is_method(&self) -> bool {
        match &self.kind {
            DeclKind::Func(func) | DeclKind::Macro(func) => func.owner.is_some(),
            _ => false,
        }
    }

    pub fn kind_name(&self) -> &'static str {
        match &self.kind {
            DeclKind::Var(_) => "variable",
            DeclKind::Func(_) => "function",
            DeclKind::Macro(_) => "macro",
            DeclKind::Generic(_) => "generic",
            DeclKind::Struct(decl) if decl.is_union => "union",
            DeclKind::Struct(_) => "struct",
            DeclKind::Enum(_) => "enum",
            DeclKind::Typedef(_) => "type",
            DeclKind::Attribute => "attribute",
            DeclKind::Import(_) => "import",
            DeclKind::CtInclude(_) => "$include",
            DeclKind::CtAssert { .. } => "$assert",
            DeclKind::CtEcho(_) => "$echo",
        }
    }
}
