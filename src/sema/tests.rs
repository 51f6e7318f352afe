use crate::{
    ast::{
        ast::ConstValue,
        declarations::{Decl, DeclKind},
        expressions::Expr,
    },
    errors::errors::ErrorImpl,
    session::{MemoryLoader, Session, SessionOptions},
    types::types::{IntKind, Type},
};

use super::decl::analyse_decl;

fn analyse(source: &str) -> Session {
    analyse_with(SessionOptions::default(), MemoryLoader::new(), "main.sema", source)
}

fn analyse_with(
    options: SessionOptions,
    loader: MemoryLoader,
    file: &str,
    source: &str,
) -> Session {
    let mut session = Session::new(options, Box::new(loader));
    session.add_source(file, source).unwrap();
    session.analyse();
    session
}

fn error_names(session: &Session) -> Vec<&str> {
    session
        .diagnostics
        .errors()
        .iter()
        .map(|error| error.get_error_name())
        .collect()
}

fn global<'a>(session: &'a Session, name: &str) -> &'a Decl {
    let module = session.find_module("main").unwrap();
    let id = session.module(module).symbols[name];
    &session.decls[id]
}

fn value_of(session: &Session, name: &str) -> ConstValue {
    match &global(session, name).kind {
        DeclKind::Var(var) => var
            .init
            .as_ref()
            .and_then(Expr::const_value)
            .cloned()
            .unwrap(),
        other => panic!("expected a variable, found {:?}", other),
    }
}

#[test]
fn test_folds_arithmetic_and_comparisons() {
    let session = analyse("const A = 2 + 3; const B = 7 % 3; const C = 5 > 3; const D = 7 / 2;");

    assert!(!session.has_errors());
    assert_eq!(value_of(&session, "A"), ConstValue::Int(5));
    assert_eq!(value_of(&session, "B"), ConstValue::Int(1));
    assert_eq!(value_of(&session, "C"), ConstValue::Bool(true));
    assert_eq!(value_of(&session, "D"), ConstValue::Int(3));
    assert_eq!(global(&session, "C").ty(), Some(&Type::Bool));
}

#[test]
fn test_constants_refer_to_later_constants() {
    let session = analyse("const A = B * 2; const B = 21;");

    assert!(!session.has_errors());
    assert_eq!(value_of(&session, "A"), ConstValue::Int(42));
}

#[test]
fn test_mod_by_constant_zero() {
    let session = analyse("fn f(x: i32) -> i32 { return x % 0; }");

    assert_eq!(error_names(&session), vec!["ModByZero"]);
}

#[test]
fn test_division_by_zero_in_constant() {
    let session = analyse("const A = 1 / 0;");

    assert_eq!(error_names(&session), vec!["DivisionByZero"]);
}

#[test]
fn test_not_on_constants() {
    let session = analyse("const A = !nil; const B = !\"\"; const C = !\"a\"; const D = !0;");

    assert!(!session.has_errors());
    assert_eq!(value_of(&session, "A"), ConstValue::Bool(true));
    assert_eq!(value_of(&session, "B"), ConstValue::Bool(true));
    assert_eq!(value_of(&session, "C"), ConstValue::Bool(false));
    assert_eq!(value_of(&session, "D"), ConstValue::Bool(true));
}

#[test]
fn test_recursive_constants_report_once() {
    let session = analyse("const A = B; const B = A;");

    assert_eq!(error_names(&session), vec!["RecursiveResolution"]);
    assert!(global(&session, "A").resolve.is_poisoned());
    assert!(global(&session, "B").resolve.is_poisoned());
}

#[test]
fn test_analysis_is_idempotent() {
    let mut session = analyse("let x: i8 = 300; const Y = 1;");
    assert_eq!(error_names(&session), vec!["ConstantOutOfRange"]);

    session.analyse();
    let module = session.find_module("main").unwrap();
    for id in session.module(module).symbols.values().copied().collect::<Vec<_>>() {
        analyse_decl(&mut session, id);
    }

    assert_eq!(session.error_count(), 1);
    assert_eq!(value_of(&session, "Y"), ConstValue::Int(1));
}

#[test]
fn test_untyped_globals_take_runtime_types() {
    let session = analyse("let a = 1; let b = 3000000000; let c = 1.5; const D = 1;");

    assert!(!session.has_errors());
    assert_eq!(global(&session, "a").ty(), Some(&Type::Int(IntKind::I32)));
    assert_eq!(global(&session, "b").ty(), Some(&Type::Int(IntKind::I64)));
    assert!(global(&session, "c").ty().unwrap().is_float());
    assert_eq!(global(&session, "D").ty(), Some(&Type::ComptimeInt));
}

#[test]
fn test_explicit_casts_wrap_constants() {
    let session = analyse("const A = cast(300, u8); const B = cast(3.7, i32); const C = cast(-1, u16);");

    assert!(!session.has_errors());
    assert_eq!(value_of(&session, "A"), ConstValue::Int(44));
    assert_eq!(value_of(&session, "B"), ConstValue::Int(3));
    assert_eq!(value_of(&session, "C"), ConstValue::Int(65535));
}

#[test]
fn test_implicit_constant_out_of_range() {
    let session = analyse("let a: u8 = 256; let b: i8 = -128;");

    assert_eq!(error_names(&session), vec!["ConstantOutOfRange"]);
}

#[test]
fn test_runtime_narrowing_needs_cast() {
    let session = analyse(
        "fn narrow(x: i64) -> i32 { return x; }
         fn widen(x: i32) -> i64 { return x; }
         fn explicit(x: i64) -> i32 { return cast(x, i32); }",
    );

    assert_eq!(error_names(&session), vec!["CannotCast"]);
}

#[test]
fn test_shift_out_of_range() {
    let session = analyse("fn f(x: u8) -> u8 { return x << 8; } const A = 1 << 4;");

    assert_eq!(error_names(&session), vec!["ShiftOutOfRange"]);
    assert_eq!(value_of(&session, "A"), ConstValue::Int(16));
}

#[test]
fn test_enum_values_count_up() {
    let session = analyse(
        "enum Color: u8 { Red, Green = 4, Blue }
         const B = cast(Color.Blue, i32);
         const R = cast(Color.Red, i32);",
    );

    assert!(!session.has_errors());
    assert_eq!(value_of(&session, "B"), ConstValue::Int(5));
    assert_eq!(value_of(&session, "R"), ConstValue::Int(0));
}

#[test]
fn test_enum_value_out_of_backing_range() {
    let session = analyse("enum Small: u8 { A = 255, B }");

    assert_eq!(error_names(&session), vec!["ConstantOutOfRange"]);
}

#[test]
fn test_enum_duplicate_variant() {
    let session = analyse("enum E { A, A }");

    assert_eq!(error_names(&session), vec!["DuplicateDefinition"]);
}

#[test]
fn test_struct_and_union_sizes() {
    let session = analyse(
        "struct P { x: i32, y: u8 }
         union U { a: u8, b: u64 }
         struct Q { p: P, n: u16[3] }
         const SP = sizeof(P);
         const SU = sizeof(U);
         const SQ = sizeof(Q);",
    );

    assert!(!session.has_errors());
    assert_eq!(value_of(&session, "SP"), ConstValue::Int(5));
    assert_eq!(value_of(&session, "SU"), ConstValue::Int(8));
    assert_eq!(value_of(&session, "SQ"), ConstValue::Int(11));
}

#[test]
fn test_self_referencing_struct_through_pointer() {
    let session = analyse("struct Node { value: i32, next: Node* } const S = sizeof(Node);");

    assert!(!session.has_errors());
    assert_eq!(value_of(&session, "S"), ConstValue::Int(12));
}

#[test]
fn test_struct_fields_and_values() {
    let session = analyse(
        "struct Point { x: i32, y: i32 }
         fn sum(p: Point*) -> i32 { return p.x + p.y; }
         fn make() -> Point { return new Point { x: 1, y: 2 }; }
         fn bad() -> i32 { let p = new Point { 1, 2 }; return p.z; }",
    );

    assert_eq!(error_names(&session), vec!["NoSuchMember"]);
}

#[test]
fn test_macro_expansion() {
    let session = analyse(
        "macro twice(x: i32) -> i32 { return x * 2; }
         fn f(y: i32) -> i32 { return twice(4) + twice(y); }",
    );

    assert!(!session.has_errors());
}

#[test]
fn test_macro_recursion_limit() {
    let options = SessionOptions {
        max_macro_depth: 8,
        ..SessionOptions::default()
    };
    let session = analyse_with(
        options,
        MemoryLoader::new(),
        "main.sema",
        "macro forever(x: i32) -> i32 { return forever(x); }
         fn f() -> i32 { return forever(1); }",
    );

    assert_eq!(error_names(&session), vec!["MacroRecursionLimit"]);
}

#[test]
fn test_macro_body_cannot_see_caller_locals() {
    let session = analyse(
        "macro peek() -> i32 { return y; }
         fn f() -> i32 { let y = 1; return peek(); }",
    );

    assert_eq!(error_names(&session), vec!["UnknownIdentifier"]);
}

#[test]
fn test_global_lambda_is_analysed_by_lambda_pass() {
    let session = analyse("let f = fn (a: i32) -> i32 { return a; };");

    assert!(!session.has_errors());
    let unit = &session.units[0];
    assert_eq!(unit.lambdas.len(), 1);
    assert!(session.modules[0].lambdas.is_empty());
}

#[test]
fn test_lambda_inside_function() {
    let session = analyse("fn g() { let h = fn () -> i32 { return; }; }");

    assert_eq!(error_names(&session), vec!["MissingReturnValue"]);
}

#[test]
fn test_break_outside_loop() {
    let session = analyse(
        "fn ok() { while true { break; } }
         fn bad() { continue; }",
    );

    assert_eq!(error_names(&session), vec!["OutsideLoop"]);
}

#[test]
fn test_return_value_mismatch() {
    let session = analyse(
        "fn a() { return 1; }
         fn b() -> i32 { return; }",
    );

    assert_eq!(
        error_names(&session),
        vec!["UnexpectedReturnValue", "MissingReturnValue"]
    );
}

#[test]
fn test_calling_a_constant() {
    let session = analyse("const X = 1; fn f() { X(); }");

    assert_eq!(error_names(&session), vec!["CannotBeCalled"]);
}

#[test]
fn test_argument_count_mismatch() {
    let session = analyse(
        "fn add(a: i32, b: i32) -> i32 { return a + b; }
         fn f() -> i32 { return add(1); }",
    );

    assert_eq!(error_names(&session), vec!["ArgumentCountMismatch"]);
}

#[test]
fn test_assign_to_constant() {
    let session = analyse("const X = 1; fn f() { X = 2; }");

    assert_eq!(error_names(&session), vec!["NotAssignable"]);
}

#[test]
fn test_extern_and_body_rules() {
    let session = analyse("extern fn puts(s: string) -> i32; fn missing() -> i32;");

    assert_eq!(error_names(&session), vec!["MissingBody"]);
}

#[test]
fn test_methods_resolve_through_owner() {
    let session = analyse(
        "struct Point { x: i32 }
         fn Point.get(self: Point*) -> i32 { return self.x; }
         fn f(p: Point*) -> i32 { return Point.get(p); }",
    );

    assert!(!session.has_errors());
}

#[test]
fn test_test_functions_skipped_unless_testing() {
    let source = "@test fn check() { return 1; }";

    let session = analyse(source);
    assert!(!session.has_errors());

    let options = SessionOptions {
        testing: true,
        ..SessionOptions::default()
    };
    let session = analyse_with(options, MemoryLoader::new(), "main.sema", source);
    assert_eq!(error_names(&session), vec!["UnexpectedReturnValue"]);
}

#[test]
fn test_ct_assert_stops_at_first_failure() {
    let session = analyse("$assert(1 < 2, \"ordered\"); $assert(1 > 2, \"backwards\"); $assert(false);");

    assert_eq!(error_names(&session), vec!["CtAssertFailed"]);
    match session.diagnostics.errors()[0].get_kind() {
        ErrorImpl::CtAssertFailed { message } => assert_eq!(message, "backwards"),
        other => panic!("unexpected {:?}", other),
    }
}

#[test]
fn test_ct_assert_default_message() {
    let session = analyse("$assert(false);");

    match session.diagnostics.errors()[0].get_kind() {
        ErrorImpl::CtAssertFailed { message } => {
            assert_eq!(message, "Compile time assert failed.")
        }
        other => panic!("unexpected {:?}", other),
    }
}

#[test]
fn test_ct_assert_needs_constant_bool() {
    let session = analyse("$assert(1);");

    assert_eq!(error_names(&session), vec!["ExpectedConstantBool"]);
}

#[test]
fn test_ct_echo_collects_values() {
    let session = analyse("const NAME = \"core\"; $echo(NAME); $echo(2 + 2);");

    assert!(!session.has_errors());
    assert_eq!(session.echoes, vec![String::from("core"), String::from("4")]);
}

#[test]
fn test_conditional_declarations() {
    let session = analyse(
        "const DEBUG = false;
         @if(DEBUG) fn debug_only() {}
         @if(!DEBUG) fn release() {}",
    );

    assert!(!session.has_errors());
    let module = session.find_module("main").unwrap();
    let symbols = &session.module(module).symbols;
    assert!(symbols.contains_key("release"));
    assert!(!symbols.contains_key("debug_only"));
}

#[test]
fn test_gate_must_be_constant() {
    let session = analyse(
        "fn check() -> bool { return true; }
         @if(check()) const X = 1;
         @if(1) const Y = 1;",
    );

    assert_eq!(
        error_names(&session),
        vec!["ExpectedConstantBool", "ExpectedConstantBool"]
    );
}

#[test]
fn test_include_relative_to_including_file() {
    let loader = MemoryLoader::new().with("src/util.sema", "const X = 41;");
    let session = analyse_with(
        SessionOptions::default(),
        loader,
        "src/main.sema",
        "$include(\"util.sema\"); const Y = X + 1;",
    );

    assert!(!session.has_errors());
    assert_eq!(value_of(&session, "Y"), ConstValue::Int(42));
}

#[test]
fn test_include_cap() {
    let loader = || {
        MemoryLoader::new()
            .with("a.sema", "$include(\"b.sema\");")
            .with("b.sema", "const B = 1;")
    };
    let source = "$include(\"a.sema\");";

    let capped = SessionOptions {
        max_includes: 1,
        ..SessionOptions::default()
    };
    let session = analyse_with(capped, loader(), "main.sema", source);
    assert_eq!(error_names(&session), vec!["TooManyIncludes"]);

    let enough = SessionOptions {
        max_includes: 2,
        ..SessionOptions::default()
    };
    let session = analyse_with(enough, loader(), "main.sema", source);
    assert!(!session.has_errors());
    assert_eq!(session.includes_used, 2);
}

#[test]
fn test_missing_include() {
    let session = analyse("$include(\"nowhere.sema\");");

    assert_eq!(error_names(&session), vec!["FailedToLoadFile"]);
}

#[test]
fn test_include_name_must_be_constant_string() {
    let session = analyse("$include(4);");

    assert_eq!(error_names(&session), vec!["ExpectedConstantString"]);
}

#[test]
fn test_duplicate_global() {
    let session = analyse("const A = 1; const A = 2;");

    assert_eq!(error_names(&session), vec!["DuplicateDefinition"]);
}

#[test]
fn test_array_size_overflow() {
    let session = analyse("const S = sizeof(i64[3000000000000000000]);");

    assert_eq!(error_names(&session), vec!["TypeTooLarge"]);
}

#[test]
fn test_struct_size_overflow() {
    let session = analyse(
        "struct Big { a: u64[2000000000000000000], b: u64[2000000000000000000] }
         const S = sizeof(Big);",
    );

    assert_eq!(error_names(&session), vec!["TypeTooLarge"]);
    assert!(global(&session, "Big").resolve.is_poisoned());
}

#[test]
fn test_macro_depth_counts_through_lambdas() {
    let options = SessionOptions {
        max_macro_depth: 8,
        ..SessionOptions::default()
    };
    let session = analyse_with(
        options,
        MemoryLoader::new(),
        "main.sema",
        "macro m() -> i32 { let f = fn () -> i32 { return m(); }; return 1; }
         fn g() -> i32 { return m(); }",
    );

    assert_eq!(error_names(&session), vec!["MacroRecursionLimit"]);
}
