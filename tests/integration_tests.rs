//! End to end runs of the analyser over in-memory sources.
//!
//! Each test builds a session, adds one or more files and runs every
//! pass, then inspects modules, symbols and diagnostics.

use sema::{
    ast::{ast::ConstValue, declarations::DeclKind, expressions::Expr},
    errors::errors::ErrorImpl,
    session::{MemoryLoader, Session, SessionOptions},
};

fn session_with(loader: MemoryLoader) -> Session {
    Session::new(SessionOptions::default(), Box::new(loader))
}

fn analyse_files(files: &[(&str, &str)]) -> Session {
    analyse_files_with(MemoryLoader::new(), files)
}

fn analyse_files_with(loader: MemoryLoader, files: &[(&str, &str)]) -> Session {
    let mut session = session_with(loader);
    for (file, source) in files {
        session.add_source(file, source).unwrap();
    }
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

fn value_of(session: &Session, module: &str, name: &str) -> ConstValue {
    let module = session.find_module(module).unwrap();
    let id = session.module(module).symbols[name];
    match &session.decls[id].kind {
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
fn test_module_hierarchy_synthesises_parents() {
    let session = analyse_files(&[("circle.sema", "module geo::shapes::circle; const R = 2;")]);

    assert!(!session.has_errors());
    assert_eq!(session.modules.len(), 3);

    let circle = session.find_module("geo::shapes::circle").unwrap();
    let shapes = session.find_module("geo::shapes").unwrap();
    let geo = session.find_module("geo").unwrap();

    assert_eq!(session.module(circle).parent, Some(shapes));
    assert_eq!(session.module(shapes).parent, Some(geo));
    assert_eq!(session.module(geo).parent, None);
    assert_eq!(session.module(shapes).children, vec![circle]);

    assert!(!session.module(circle).synthetic);
    assert!(session.module(shapes).synthetic);
    assert!(session.module(geo).synthetic);

    assert_eq!(session.module(circle).top, Some(geo));
    assert_eq!(session.module(geo).top, Some(geo));
}

#[test]
fn test_declared_parent_is_not_synthesised() {
    let session = analyse_files(&[
        ("child.sema", "module app::net;"),
        ("app.sema", "module app;"),
    ]);

    assert_eq!(session.modules.len(), 2);
    let app = session.find_module("app").unwrap();
    assert!(!session.module(app).synthetic);
    assert_eq!(session.module(app).children.len(), 1);
}

#[test]
fn test_module_defaults_to_file_stem() {
    let session = analyse_files(&[("src/tools.sema", "const X = 1;")]);

    assert!(session.find_module("tools").is_some());
    assert_eq!(value_of(&session, "tools", "X"), ConstValue::Int(1));
}

#[test]
fn test_units_share_their_module() {
    let session = analyse_files(&[
        ("a.sema", "module core; const B = A + 1;"),
        ("b.sema", "module core; const A = 1;"),
    ]);

    assert!(!session.has_errors());
    let core = session.find_module("core").unwrap();
    assert_eq!(session.module(core).units.len(), 2);
    assert_eq!(value_of(&session, "core", "B"), ConstValue::Int(2));
}

#[test]
fn test_imports_make_symbols_visible() {
    let session = analyse_files(&[
        ("app.sema", "module app; import util; const V = BASE + 2; const W = util::BASE;"),
        ("util.sema", "module util; const BASE = 40;"),
    ]);

    assert!(!session.has_errors());
    assert_eq!(value_of(&session, "app", "V"), ConstValue::Int(42));
    assert_eq!(value_of(&session, "app", "W"), ConstValue::Int(40));

    let app = session.find_module("app").unwrap();
    let util = session.find_module("util").unwrap();
    assert_eq!(session.module(app).imports, vec![util]);
}

#[test]
fn test_symbols_need_an_import() {
    let session = analyse_files(&[
        ("app.sema", "module app; const V = BASE;"),
        ("util.sema", "module util; const BASE = 40;"),
    ]);

    assert_eq!(error_names(&session), vec!["UnknownIdentifier"]);
}

#[test]
fn test_duplicate_imports_are_merged() {
    let session = analyse_files(&[
        ("a.sema", "module app; import util;"),
        ("b.sema", "module app; import util;"),
        ("util.sema", "module util;"),
    ]);

    assert!(!session.has_errors());
    let app = session.find_module("app").unwrap();
    assert_eq!(session.module(app).imports.len(), 1);
}

#[test]
fn test_import_errors() {
    let session = analyse_files(&[("app.sema", "module app; import missing; import app;")]);

    assert_eq!(error_names(&session), vec!["ModuleNotFound", "ImportSelf"]);
}

#[test]
fn test_false_unit_gate_registers_nothing() {
    let session = analyse_files(&[
        ("feature.sema", "module feature @if(false); const X = 1; fn f() -> i32 { return nope; }"),
        ("main.sema", "const Y = 1;"),
    ]);

    assert!(!session.has_errors());
    let feature = session.find_module("feature").unwrap();
    assert!(session.module(feature).symbols.is_empty());
}

#[test]
fn test_false_unit_gate_drops_nested_conditionals() {
    let session = analyse_files(&[(
        "feature.sema",
        "module feature @if(false); const X = 1; @if(true) const Y = 2;",
    )]);

    assert!(!session.has_errors());
    let feature = session.find_module("feature").unwrap();
    assert!(session.module(feature).symbols.is_empty());
    assert!(session.units[0].conditionals.is_empty());
}

#[test]
fn test_unit_gate_reads_imported_constant() {
    let session = analyse_files(&[
        ("flags.sema", "module flags; const ENABLED = true; const DISABLED = false;"),
        ("on.sema", "module on @if(flags::ENABLED); import flags; const X = 1;"),
        ("off.sema", "module off @if(flags::DISABLED); import flags; const X = 1;"),
    ]);

    assert!(!session.has_errors());
    let on = session.find_module("on").unwrap();
    let off = session.find_module("off").unwrap();
    assert!(session.module(on).symbols.contains_key("X"));
    assert!(session.module(off).symbols.is_empty());
}

#[test]
fn test_unit_gate_rejects_other_attributes() {
    let mut session = session_with(MemoryLoader::new());
    let error = session
        .add_source("main.sema", "module app @test;")
        .unwrap_err();

    assert_eq!(error.get_error_name(), "InvalidAttribute");
}

#[test]
fn test_conditional_declaration_includes_file() {
    let loader = MemoryLoader::new().with("lib/extra.sema", "const EXTRA = 7;");
    let session = analyse_files_with(
        loader,
        &[(
            "lib/main.sema",
            "const WANT = true; @if(WANT) $include(\"extra.sema\"); const TOTAL = EXTRA + 1;",
        )],
    );

    assert!(!session.has_errors());
    assert_eq!(value_of(&session, "main", "TOTAL"), ConstValue::Int(8));
}

#[test]
fn test_nested_includes_stay_relative() {
    let loader = MemoryLoader::new()
        .with("src/first.sema", "$include(\"second.sema\"); const A = 1;")
        .with("src/second.sema", "const B = 2;");
    let session = analyse_files_with(
        loader,
        &[("src/main.sema", "$include(\"first.sema\"); const C = A + B;")],
    );

    assert!(!session.has_errors());
    assert_eq!(session.includes_used, 2);
    assert_eq!(value_of(&session, "main", "C"), ConstValue::Int(3));
}

#[test]
fn test_include_cap_counts_every_directive() {
    let loader = MemoryLoader::new()
        .with("one.sema", "const ONE = 1;")
        .with("two.sema", "const TWO = 2;")
        .with("three.sema", "const THREE = 3;");
    let options = SessionOptions {
        max_includes: 2,
        ..SessionOptions::default()
    };
    let mut session = Session::new(options, Box::new(loader));
    session
        .add_source(
            "main.sema",
            "$include(\"one.sema\"); $include(\"two.sema\"); $include(\"three.sema\");",
        )
        .unwrap();
    session.analyse();

    assert_eq!(error_names(&session), vec!["TooManyIncludes"]);
    let module = session.find_module("main").unwrap();
    assert!(session.module(module).symbols.contains_key("TWO"));
    assert!(!session.module(module).symbols.contains_key("THREE"));
}

#[test]
fn test_included_file_cannot_import() {
    let loader = MemoryLoader::new().with("inc.sema", "import util;");
    let session = analyse_files_with(
        loader,
        &[("main.sema", "$include(\"inc.sema\");"), ("util.sema", "module util;")],
    );

    assert_eq!(error_names(&session), vec!["ImportInInclude"]);
}

#[test]
fn test_included_file_cannot_declare_module() {
    let loader = MemoryLoader::new().with("inc.sema", "module other; const X = 1;");
    let session = analyse_files_with(loader, &[("main.sema", "$include(\"inc.sema\");")]);

    assert_eq!(error_names(&session), vec!["UnexpectedTokenDetailed"]);
}

#[test]
fn test_include_rejects_other_attributes() {
    let loader = MemoryLoader::new().with("inc.sema", "const X = 1;");
    let session = analyse_files_with(loader, &[("main.sema", "@test $include(\"inc.sema\");")]);

    assert_eq!(error_names(&session), vec!["InvalidAttribute"]);
}

#[test]
fn test_methods_through_imports() {
    let session = analyse_files(&[
        (
            "geo.sema",
            "module geo; struct Point { x: i32 } fn Point.double(self: Point*) -> i32 { return self.x * 2; }",
        ),
        (
            "app.sema",
            "module app; import geo; fn f(p: geo::Point*) -> i32 { return geo::Point.double(p); }",
        ),
    ]);

    assert!(!session.has_errors());
    let geo = session.find_module("geo").unwrap();
    assert_eq!(session.module(geo).methods.len(), 1);
    assert!(!session.module(geo).symbols.contains_key("double"));
}

#[test]
fn test_asserts_stop_per_module() {
    let session = analyse_files(&[
        ("a.sema", "module a; $assert(false, \"first\"); $assert(false, \"second\");"),
        ("b.sema", "module b; $assert(false, \"third\");"),
    ]);

    let messages = session
        .diagnostics
        .errors()
        .iter()
        .filter_map(|error| match error.get_kind() {
            ErrorImpl::CtAssertFailed { message } => Some(message.as_str()),
            _ => None,
        })
        .collect::<Vec<_>>();
    assert_eq!(messages, vec!["first", "third"]);
}

#[test]
fn test_echo_order_follows_modules() {
    let session = analyse_files(&[
        ("a.sema", "module a; $echo(\"building a\");"),
        ("b.sema", "module b; import a; $echo(a::NAME); $echo(1.5);"),
        ("a2.sema", "module a; const NAME = \"a\";"),
    ]);

    assert!(!session.has_errors());
    assert_eq!(session.echoes, vec!["building a", "a", "1.5"]);
}

#[test]
fn test_errors_are_collected_across_modules() {
    let session = analyse_files(&[
        ("a.sema", "module a; fn f() { break; } const X: u8 = 999;"),
        ("b.sema", "module b; fn g() -> i32 { return missing; }"),
    ]);

    assert_eq!(
        error_names(&session),
        vec!["ConstantOutOfRange", "OutsideLoop", "UnknownIdentifier"]
    );
    assert_eq!(session.error_count(), 3);
}

#[test]
fn test_syntax_errors_are_returned() {
    let mut session = session_with(MemoryLoader::new());
    let error = session.add_source("main.sema", "let x = 42").unwrap_err();

    assert!(!session.has_errors());
    assert_eq!(error.get_position().1.as_str(), "main.sema");
}

#[test]
fn test_load_file_through_loader() {
    let loader = MemoryLoader::new().with("lib/core.sema", "module core; const V = 3;");
    let mut session = session_with(loader);
    session.load_file(std::path::Path::new("lib/core.sema")).unwrap();
    assert!(session.analyse());

    assert_eq!(value_of(&session, "core", "V"), ConstValue::Int(3));
    assert_eq!(
        session
            .load_file(std::path::Path::new("lib/none.sema"))
            .unwrap_err()
            .get_error_name(),
        "FailedToLoadFile"
    );
}
