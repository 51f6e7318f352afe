//! Unit tests for error handling.

use crate::errors::errors::{Error, ErrorImpl, ErrorTip};
use crate::errors::Diagnostics;
use crate::Position;
use std::rc::Rc;

#[test]
fn test_error_creation() {
    let error = Error::new(
        ErrorImpl::UnrecognisedToken {
            token: "#".to_string(),
        },
        Position(10, Rc::new("test.lang".to_string())),
    );

    assert_eq!(error.get_error_name(), "UnrecognisedToken");
}

#[test]
fn test_error_position() {
    let pos = Position(42, Rc::new("test.lang".to_string()));
    let error = Error::new(
        ErrorImpl::UnexpectedToken {
            token: "identifier".to_string(),
        },
        pos.clone(),
    );

    assert_eq!(error.get_position().0, 42);
}

#[test]
fn test_binop_message_names_both_types() {
    let error = Error::new(
        ErrorImpl::CannotPerformBinop {
            left: "bool".to_string(),
            op: "+".to_string(),
            right: "i32".to_string(),
        },
        Position::null(),
    );

    assert_eq!(error.get_error_name(), "CannotPerformBinop");
    assert_eq!(error.message(), "Cannot perform 'bool' + 'i32'");
}

#[test]
fn test_call_errors_share_wording() {
    let wrong_kind = Error::new(
        ErrorImpl::CannotBeCalled {
            name: "x".to_string(),
        },
        Position::null(),
    );
    let wrong_count = Error::new(
        ErrorImpl::ArgumentCountMismatch {
            name: "add".to_string(),
            expected: 2,
            received: 3,
        },
        Position::null(),
    );

    assert!(wrong_kind.message().contains("cannot be called"));
    assert!(wrong_count.message().contains("cannot be called"));
}

#[test]
fn test_conditional_gate_messages() {
    assert_eq!(ErrorImpl::ExpectedOneParameter.to_string(), "Expected one parameter.");
    assert_eq!(
        ErrorImpl::ExpectedConstantBool.to_string(),
        "Expected a constant boolean expression."
    );
    assert_eq!(
        ErrorImpl::ExpectedConstantString.to_string(),
        "A compile time string was expected."
    );
}

#[test]
fn test_error_tip_none() {
    let error = Error::new(
        ErrorImpl::UnrecognisedToken {
            token: "#".to_string(),
        },
        Position(0, Rc::new("test.lang".to_string())),
    );

    assert!(matches!(error.get_tip(), ErrorTip::None));
}

#[test]
fn test_error_tip_suggestion() {
    let error = Error::new(
        ErrorImpl::TooManyIncludes { max: 4 },
        Position(0, Rc::new("test.lang".to_string())),
    );

    match error.get_tip() {
        ErrorTip::Suggestion(tip) => assert!(tip.contains('4')),
        _ => panic!("Expected suggestion tip"),
    }
}

#[test]
fn test_error_tip_display() {
    let tip = ErrorTip::Suggestion("Try this instead".to_string());
    assert_eq!(tip.to_string(), "Try this instead");

    let tip = ErrorTip::None;
    assert_eq!(tip.to_string(), "");
}

#[test]
fn test_error_display_includes_location() {
    let error = Error::new(
        ErrorImpl::DivisionByZero,
        Position(7, Rc::new("main.lang".to_string())),
    );

    assert_eq!(error.to_string(), "main.lang:7: division by zero");
}

#[test]
fn test_diagnostics_count_reports() {
    let mut diagnostics = Diagnostics::new();
    assert!(!diagnostics.has_errors());

    diagnostics.report(Error::new(ErrorImpl::ModByZero, Position::null()));
    diagnostics.report(Error::new(ErrorImpl::NotAssignable, Position::null()));

    assert_eq!(diagnostics.error_count(), 2);
    assert_eq!(diagnostics.errors()[1].get_error_name(), "NotAssignable");
}
