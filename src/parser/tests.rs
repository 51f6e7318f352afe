use crate::{
    ast::{
        ast::{ConstValue, DeclSlot},
        declarations::{DeclKind, VarKind},
        expressions::{BinaryOp, ExprKind, UnaryOp},
        statements::Stmt,
        types::TypeExpr,
    },
    errors::errors::ErrorImpl,
};

use super::parser::{parse_source, ParsedFile};

fn parse_ok(source: &str) -> ParsedFile {
    parse_source(source, "test.sema").unwrap()
}

fn global_init(file: &ParsedFile, index: usize) -> &ExprKind {
    match &file.decls[index].kind {
        DeclKind::Var(var) => &var.init.as_ref().unwrap().kind,
        other => panic!("expected a variable, found {:?}", other),
    }
}

#[test]
fn test_parse_variable_declaration() {
    let file = parse_ok("let x = 42;");

    assert_eq!(file.decls.len(), 1);
    assert_eq!(file.decls[0].name, "x");
    match &file.decls[0].kind {
        DeclKind::Var(var) => assert_eq!(var.kind, VarKind::Global),
        other => panic!("unexpected {:?}", other),
    }
}

#[test]
fn test_parse_const_declaration() {
    let file = parse_ok("const PI = 3.14;");

    match global_init(&file, 0) {
        ExprKind::Const(ConstValue::Float(value)) => assert!((value - 3.14).abs() < 1e-9),
        other => panic!("unexpected {:?}", other),
    }
}

#[test]
fn test_const_requires_value() {
    assert!(parse_source("const X: i32;", "test.sema").is_err());
    assert!(parse_source("let y;", "test.sema").is_err());
}

#[test]
fn test_parse_function_declaration() {
    let file = parse_ok("fn add(a: i32, b: i32) -> i32 { return a + b; }");

    match &file.decls[0].kind {
        DeclKind::Func(func) => {
            assert_eq!(func.params.len(), 2);
            assert_eq!(func.ret.as_ref().unwrap().to_string(), "i32");
            assert_eq!(func.body.as_ref().unwrap().len(), 1);
            assert!(!func.is_extern);
        }
        other => panic!("unexpected {:?}", other),
    }
}

#[test]
fn test_parse_method_and_extern() {
    let file = parse_ok("fn Point.len(self: Point*) -> i32 { return 0; } extern fn puts(s: string) -> i32;");

    assert!(file.decls[0].is_method());
    assert_eq!(file.decls[0].name, "len");
    match &file.decls[1].kind {
        DeclKind::Func(func) => {
            assert!(func.is_extern);
            assert!(func.body.is_none());
        }
        other => panic!("unexpected {:?}", other),
    }
}

#[test]
fn test_parse_if_else_and_while() {
    let file = parse_ok("fn f(x: i32) { if x > 0 { x = 1; } else { x = 2; } while x < 10 { x += 1; break; } }");

    let body = match &file.decls[0].kind {
        DeclKind::Func(func) => func.body.as_ref().unwrap(),
        other => panic!("unexpected {:?}", other),
    };

    assert!(matches!(body[0], Stmt::If { else_body: Some(_), .. }));
    match &body[1] {
        Stmt::While { body, .. } => match body.as_ref() {
            Stmt::Block { body, .. } => assert!(matches!(body[1], Stmt::Break(_))),
            other => panic!("unexpected {:?}", other),
        },
        other => panic!("unexpected {:?}", other),
    }
}

#[test]
fn test_parse_local_declarations() {
    let file = parse_ok("fn f() { let a: i32 = 1; const B = 2; }");

    let body = match &file.decls[0].kind {
        DeclKind::Func(func) => func.body.as_ref().unwrap(),
        other => panic!("unexpected {:?}", other),
    };

    match &body[1] {
        Stmt::Local(DeclSlot::Parsed(decl)) => match &decl.kind {
            DeclKind::Var(var) => assert_eq!(var.kind, VarKind::LocalConst),
            other => panic!("unexpected {:?}", other),
        },
        other => panic!("unexpected {:?}", other),
    }
}

#[test]
fn test_parse_struct_union_enum() {
    let file = parse_ok("struct Point { x: i32, y: i32 } union U { a: u8, b: u64 } enum Color: u8 { Red, Green = 4, }");

    match &file.decls[0].kind {
        DeclKind::Struct(decl) => {
            assert!(!decl.is_union);
            assert_eq!(decl.fields.len(), 2);
        }
        other => panic!("unexpected {:?}", other),
    }
    assert_eq!(file.decls[1].kind_name(), "union");
    match &file.decls[2].kind {
        DeclKind::Enum(decl) => {
            assert_eq!(decl.variants.len(), 2);
            assert!(decl.variants[1].value.is_some());
            assert_eq!(decl.backing.as_ref().unwrap().to_string(), "u8");
        }
        other => panic!("unexpected {:?}", other),
    }
}

#[test]
fn test_parse_types() {
    let file = parse_ok("let a: u8*[4] = nil; let b: geo::Point = nil; type Bytes = u8[];");

    match &file.decls[0].kind {
        DeclKind::Var(var) => {
            let ty = var.type_expr.as_ref().unwrap();
            assert!(matches!(ty, TypeExpr::Array(_, Some(4))));
            assert_eq!(ty.to_string(), "u8*[4]");
        }
        other => panic!("unexpected {:?}", other),
    }
    match &file.decls[1].kind {
        DeclKind::Var(var) => match var.type_expr.as_ref().unwrap() {
            TypeExpr::Named { path, name, .. } => {
                assert_eq!(path.as_deref(), Some("geo"));
                assert_eq!(name, "Point");
            }
            other => panic!("unexpected {:?}", other),
        },
        other => panic!("unexpected {:?}", other),
    }
    match &file.decls[2].kind {
        DeclKind::Typedef(target) => assert!(matches!(target, TypeExpr::Array(_, None))),
        other => panic!("unexpected {:?}", other),
    }
}

#[test]
fn test_parse_struct_instantiation() {
    let file = parse_ok("let p = new Point { x: 10, y: 20 }; let q = new Point { 1, 2 };");

    match global_init(&file, 0) {
        ExprKind::StructValue { init, .. } => match &init.kind {
            ExprKind::StructInitValues { fields } => assert_eq!(fields.len(), 2),
            other => panic!("unexpected {:?}", other),
        },
        other => panic!("unexpected {:?}", other),
    }
    match global_init(&file, 1) {
        ExprKind::StructValue { init, .. } => {
            assert!(matches!(init.kind, ExprKind::InitializerList { .. }))
        }
        other => panic!("unexpected {:?}", other),
    }
}

#[test]
fn test_binary_precedence() {
    let file = parse_ok("let result = 5 + 3 * 2;");

    match global_init(&file, 0) {
        ExprKind::Binary { op, right, .. } => {
            assert_eq!(*op, BinaryOp::Add);
            assert!(matches!(right.kind, ExprKind::Binary { op: BinaryOp::Mul, .. }));
        }
        other => panic!("unexpected {:?}", other),
    }
}

#[test]
fn test_prefix_binds_tighter_than_binary() {
    let file = parse_ok("let n = -a + b;");

    match global_init(&file, 0) {
        ExprKind::Binary { op, left, .. } => {
            assert_eq!(*op, BinaryOp::Add);
            assert!(matches!(left.kind, ExprKind::Unary { op: UnaryOp::Neg, .. }));
        }
        other => panic!("unexpected {:?}", other),
    }
}

#[test]
fn test_assignment_is_right_associative() {
    let file = parse_ok("fn f() { a = b = 1; }");

    let body = match &file.decls[0].kind {
        DeclKind::Func(func) => func.body.as_ref().unwrap(),
        other => panic!("unexpected {:?}", other),
    };

    match &body[0] {
        Stmt::Expr(expr) => match &expr.kind {
            ExprKind::Binary { op, right, .. } => {
                assert_eq!(*op, BinaryOp::Assign);
                assert!(matches!(right.kind, ExprKind::Binary { op: BinaryOp::Assign, .. }));
            }
            other => panic!("unexpected {:?}", other),
        },
        other => panic!("unexpected {:?}", other),
    }
}

#[test]
fn test_ternary_and_elvis() {
    let file = parse_ok("let t = a ? 1 : 2; let e = a ?: b;");

    assert!(matches!(global_init(&file, 0), ExprKind::Conditional { .. }));
    assert!(matches!(
        global_init(&file, 1),
        ExprKind::Binary { op: BinaryOp::Elvis, .. }
    ));
}

#[test]
fn test_call_member_subscript() {
    let file = parse_ok("let x = point.items[2](1, 2);");

    match global_init(&file, 0) {
        ExprKind::Call { callee, args, .. } => {
            assert_eq!(args.len(), 2);
            match &callee.kind {
                ExprKind::Subscript { base, .. } => {
                    assert!(matches!(base.kind, ExprKind::Access { .. }))
                }
                other => panic!("unexpected {:?}", other),
            }
        }
        other => panic!("unexpected {:?}", other),
    }
}

#[test]
fn test_qualified_identifier() {
    let file = parse_ok("let x = std::io::value;");

    match global_init(&file, 0) {
        ExprKind::Identifier { path, name, .. } => {
            assert_eq!(path.as_deref(), Some("std::io"));
            assert_eq!(name, "value");
        }
        other => panic!("unexpected {:?}", other),
    }
}

#[test]
fn test_cast_sizeof_lambda() {
    let file = parse_ok("let c = cast(x, u8*); let s = sizeof(Point); let f = fn (a: i32) -> i32 { return a; };");

    match global_init(&file, 0) {
        ExprKind::Cast { target, .. } => assert_eq!(target.to_string(), "u8*"),
        other => panic!("unexpected {:?}", other),
    }
    assert!(matches!(global_init(&file, 1), ExprKind::Sizeof { .. }));
    match global_init(&file, 2) {
        ExprKind::Lambda(DeclSlot::Parsed(decl)) => assert_eq!(decl.name, "<lambda>"),
        other => panic!("unexpected {:?}", other),
    }
}

#[test]
fn test_module_header_and_attributes() {
    let file = parse_ok("module geo::shapes @if(LINUX);\n@test fn check() {}\nimport std::io;");

    let header = file.module.as_ref().unwrap();
    assert_eq!(header.name, "geo::shapes");
    assert_eq!(header.attributes[0].name, "if");
    assert_eq!(header.attributes[0].args.len(), 1);

    assert!(file.decls[0].has_attribute("test"));
    match &file.decls[1].kind {
        DeclKind::Import(import) => assert_eq!(import.path, "std::io"),
        other => panic!("unexpected {:?}", other),
    }
}

#[test]
fn test_compile_time_directives() {
    let file = parse_ok("@if(X) $include(\"other.sema\");\n$assert(1 < 2, \"ordered\");\n$echo(4);");

    assert!(file.decls[0].is_conditional());
    assert!(matches!(file.decls[0].kind, DeclKind::CtInclude(_)));
    match &file.decls[1].kind {
        DeclKind::CtAssert { message, .. } => assert!(message.is_some()),
        other => panic!("unexpected {:?}", other),
    }
    assert!(matches!(file.decls[2].kind, DeclKind::CtEcho(_)));
}

#[test]
fn test_parse_generic_and_macro() {
    let file = parse_ok("generic max<T>(a: T, b: T) -> T { return a; } macro twice(x: i32) { return x * 2; }");

    match &file.decls[0].kind {
        DeclKind::Generic(decl) => assert_eq!(decl.type_params, vec![String::from("T")]),
        other => panic!("unexpected {:?}", other),
    }
    assert!(matches!(file.decls[1].kind, DeclKind::Macro(_)));
}

#[test]
fn test_parse_empty_program() {
    let file = parse_ok("");

    assert!(file.module.is_none());
    assert!(file.decls.is_empty());
}

#[test]
fn test_parse_syntax_error_missing_semicolon() {
    let error = parse_source("let x = 42", "test.sema").unwrap_err();

    assert!(matches!(error.get_kind(), ErrorImpl::UnexpectedToken { .. }));
}

#[test]
fn test_statement_at_top_level_is_rejected() {
    let error = parse_source("return 42;", "test.sema").unwrap_err();

    assert_eq!(error.get_error_name(), "UnexpectedTokenDetailed");
}

#[test]
fn test_leading_attributes() {
    let header = parse_ok("@if(DEBUG) module app::core;").module.unwrap();
    assert_eq!(header.name, "app::core");
    assert_eq!(header.attributes.len(), 1);

    let file = parse_ok("@test fn check() {}");
    assert!(file.module.is_none());
    assert!(file.decls[0].has_attribute("test"));
}
