use std::fmt::Display;

use thiserror::Error;

use crate::Position;

#[derive(Debug, Clone)]
pub struct Error {
    internal_error: ErrorImpl,
    position: Position,
}

impl Error {
    pub fn new(error_impl: ErrorImpl, position: Position) -> Self {
        Error {
            internal_error: error_impl,
            position,
        }
    }

    pub fn get_position(&self) -> &Position {
        &self.position
    }

    pub fn get_kind(&self) -> &ErrorImpl {
        &self.internal_error
    }

    /// The rendered diagnostic message.
    pub fn message(&self) -> String {
        self.internal_error.to_string()
    }

    pub fn get_error_name(&self) -> &str {
        match &self.internal_error {
            ErrorImpl::UnrecognisedToken { .. } => "UnrecognisedToken",
            ErrorImpl::UnexpectedToken { .. } => "UnexpectedToken",
            ErrorImpl::UnexpectedTokenDetailed { .. } => "UnexpectedTokenDetailed",
            ErrorImpl::NumberParseError { .. } => "NumberParseError",
            ErrorImpl::UnknownIdentifier { .. } => "UnknownIdentifier",
            ErrorImpl::UnknownType { .. } => "UnknownType",
            ErrorImpl::NotAType { .. } => "NotAType",
            ErrorImpl::RecursiveResolution { .. } => "RecursiveResolution",
            ErrorImpl::DuplicateDefinition { .. } => "DuplicateDefinition",
            ErrorImpl::CannotPerformBinop { .. } => "CannotPerformBinop",
            ErrorImpl::DivisionByZero => "DivisionByZero",
            ErrorImpl::ModByZero => "ModByZero",
            ErrorImpl::ShiftOutOfRange { .. } => "ShiftOutOfRange",
            ErrorImpl::CannotNegate { .. } => "CannotNegate",
            ErrorImpl::CannotBitNegate { .. } => "CannotBitNegate",
            ErrorImpl::CannotUseNot { .. } => "CannotUseNot",
            ErrorImpl::CannotDereference { .. } => "CannotDereference",
            ErrorImpl::CannotTakeAddress => "CannotTakeAddress",
            ErrorImpl::CannotIncrement { .. } => "CannotIncrement",
            ErrorImpl::NotAssignable => "NotAssignable",
            ErrorImpl::CannotCast { .. } => "CannotCast",
            ErrorImpl::ConstantOutOfRange { .. } => "ConstantOutOfRange",
            ErrorImpl::CannotBeCalled { .. } => "CannotBeCalled",
            ErrorImpl::ArgumentCountMismatch { .. } => "ArgumentCountMismatch",
            ErrorImpl::MacroRecursionLimit { .. } => "MacroRecursionLimit",
            ErrorImpl::NoSuchMember { .. } => "NoSuchMember",
            ErrorImpl::CannotIndex { .. } => "CannotIndex",
            ErrorImpl::IndexOutOfBounds { .. } => "IndexOutOfBounds",
            ErrorImpl::CannotInitialize { .. } => "CannotInitialize",
            ErrorImpl::CannotInferType => "CannotInferType",
            ErrorImpl::NoSize { .. } => "NoSize",
            ErrorImpl::TypeTooLarge { .. } => "TypeTooLarge",
            ErrorImpl::IncompatibleBranches { .. } => "IncompatibleBranches",
            ErrorImpl::ExpectedConstant => "ExpectedConstant",
            ErrorImpl::MissingReturnValue { .. } => "MissingReturnValue",
            ErrorImpl::UnexpectedReturnValue => "UnexpectedReturnValue",
            ErrorImpl::OutsideLoop { .. } => "OutsideLoop",
            ErrorImpl::ExternWithBody { .. } => "ExternWithBody",
            ErrorImpl::MissingBody { .. } => "MissingBody",
            ErrorImpl::ModuleNotFound { .. } => "ModuleNotFound",
            ErrorImpl::ImportSelf { .. } => "ImportSelf",
            ErrorImpl::ImportInInclude => "ImportInInclude",
            ErrorImpl::ExpectedOneParameter => "ExpectedOneParameter",
            ErrorImpl::ExpectedConstantBool => "ExpectedConstantBool",
            ErrorImpl::ExpectedConstantString => "ExpectedConstantString",
            ErrorImpl::InvalidAttribute { .. } => "InvalidAttribute",
            ErrorImpl::FailedToLoadFile { .. } => "FailedToLoadFile",
            ErrorImpl::TooManyIncludes { .. } => "TooManyIncludes",
            ErrorImpl::CtAssertFailed { .. } => "CtAssertFailed",
            ErrorImpl::UnsupportedFeature { .. } => "UnsupportedFeature",
        }
    }

    pub fn get_tip(&self) -> ErrorTip {
        match &self.internal_error {
            ErrorImpl::UnrecognisedToken { .. } => ErrorTip::None,
            ErrorImpl::UnexpectedToken { token } => ErrorTip::Suggestion(format!(
                "Unexpected token: `{}`, did you miss a semicolon?",
                token
            )),
            ErrorImpl::UnexpectedTokenDetailed { token, message } => {
                ErrorTip::Suggestion(format!("Unexpected token: `{}`, {}", token, message))
            }
            ErrorImpl::NumberParseError { token } => ErrorTip::Suggestion(format!(
                "Invalid number: `{}`, is it above the integer limit?",
                token
            )),
            ErrorImpl::UnknownIdentifier { name } => ErrorTip::Suggestion(format!(
                "`{}` is not declared in this scope or in any imported module",
                name
            )),
            ErrorImpl::UnknownType { type_ } => {
                ErrorTip::Suggestion(format!("Unknown type `{}` found", type_))
            }
            ErrorImpl::RecursiveResolution { name } => ErrorTip::Suggestion(format!(
                "`{}` depends on its own value",
                name
            )),
            ErrorImpl::DuplicateDefinition { name } => {
                ErrorTip::Suggestion(format!("Rename one of the definitions of `{}`", name))
            }
            ErrorImpl::DivisionByZero | ErrorImpl::ModByZero => {
                ErrorTip::Suggestion(String::from("The right hand side is a constant zero"))
            }
            ErrorImpl::NotAssignable => ErrorTip::Suggestion(String::from(
                "Only variables, fields, elements and dereferenced pointers can be assigned",
            )),
            ErrorImpl::CannotCast { .. } => ErrorTip::Suggestion(String::from(
                "Use `cast(value, Type)` for an explicit conversion",
            )),
            ErrorImpl::ArgumentCountMismatch { expected, received, .. } => {
                ErrorTip::Suggestion(format!("Expected {} arguments, received {}", expected, received))
            }
            ErrorImpl::ImportInInclude => ErrorTip::Suggestion(String::from(
                "Move the import into the including file",
            )),
            ErrorImpl::TooManyIncludes { max } => ErrorTip::Suggestion(format!(
                "At most {} files may be included in one compilation",
                max
            )),
            ErrorImpl::UnsupportedFeature { .. } => ErrorTip::Suggestion(String::from(
                "This construct is recognised, but cannot be analysed yet",
            )),
            _ => ErrorTip::None,
        }
    }
}

impl Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}: {}", self.position.1, self.position.0, self.internal_error)
    }
}

pub enum ErrorTip {
    None,
    Suggestion(String),
}

impl Display for ErrorTip {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ErrorTip::None => write!(f, ""),
            ErrorTip::Suggestion(suggestion) => write!(f, "{}", suggestion),
        }
    }
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ErrorImpl {
    #[error("unrecognised token: {token:?}")]
    UnrecognisedToken { token: String },
    #[error("unexpected token: {token:?}")]
    UnexpectedToken { token: String },
    #[error("unexpected token ({message:?}): {token:?}")]
    UnexpectedTokenDetailed { token: String, message: String },
    #[error("error parsing number: {token:?}")]
    NumberParseError { token: String },

    #[error("unknown identifier '{name}'")]
    UnknownIdentifier { name: String },
    #[error("unknown type {type_} found")]
    UnknownType { type_: String },
    #[error("'{name}' is not a type")]
    NotAType { name: String },
    #[error("recursive resolution of '{name}'")]
    RecursiveResolution { name: String },
    #[error("'{name}' is already defined")]
    DuplicateDefinition { name: String },

    #[error("Cannot perform '{left}' {op} '{right}'")]
    CannotPerformBinop { left: String, op: String, right: String },
    #[error("division by zero")]
    DivisionByZero,
    #[error("% by zero")]
    ModByZero,
    #[error("shift amount {amount} is out of range for '{type_}'")]
    ShiftOutOfRange { amount: i128, type_: String },
    #[error("cannot negate '{type_}'")]
    CannotNegate { type_: String },
    #[error("cannot bit negate '{type_}'")]
    CannotBitNegate { type_: String },
    #[error("cannot use 'not' on '{type_}'")]
    CannotUseNot { type_: String },
    #[error("cannot dereference '{type_}'")]
    CannotDereference { type_: String },
    #[error("cannot take the address of this expression")]
    CannotTakeAddress,
    #[error("cannot increment or decrement '{type_}'")]
    CannotIncrement { type_: String },
    #[error("expression is not assignable")]
    NotAssignable,
    #[error("cannot cast '{from}' to '{to}'")]
    CannotCast { from: String, to: String },
    #[error("constant {value} does not fit in '{type_}'")]
    ConstantOutOfRange { value: String, type_: String },

    #[error("'{name}' cannot be called")]
    CannotBeCalled { name: String },
    #[error("'{name}' cannot be called with {received} arguments, expected {expected}")]
    ArgumentCountMismatch { name: String, expected: usize, received: usize },
    #[error("macro '{name}' expands deeper than {limit} levels")]
    MacroRecursionLimit { name: String, limit: usize },

    #[error("'{type_}' has no member '{member}'")]
    NoSuchMember { type_: String, member: String },
    #[error("cannot index into '{type_}'")]
    CannotIndex { type_: String },
    #[error("index {index} is out of bounds for length {len}")]
    IndexOutOfBounds { index: i128, len: u64 },
    #[error("cannot initialize '{type_}' with this initializer")]
    CannotInitialize { type_: String },
    #[error("cannot infer the type of this expression")]
    CannotInferType,
    #[error("'{type_}' has no size")]
    NoSize { type_: String },
    #[error("'{type_}' is too large")]
    TypeTooLarge { type_: String },
    #[error("branches have incompatible types '{left}' and '{right}'")]
    IncompatibleBranches { left: String, right: String },
    #[error("expected a compile time constant")]
    ExpectedConstant,

    #[error("missing return value of type '{type_}'")]
    MissingReturnValue { type_: String },
    #[error("cannot return a value from a function returning void")]
    UnexpectedReturnValue,
    #[error("'{keyword}' used outside of a loop")]
    OutsideLoop { keyword: String },
    #[error("extern function '{name}' cannot have a body")]
    ExternWithBody { name: String },
    #[error("function '{name}' has no body")]
    MissingBody { name: String },

    #[error("module '{name}' could not be found")]
    ModuleNotFound { name: String },
    #[error("module '{name}' cannot import itself")]
    ImportSelf { name: String },
    #[error("imports are not allowed in included files")]
    ImportInInclude,

    #[error("Expected one parameter.")]
    ExpectedOneParameter,
    #[error("Expected a constant boolean expression.")]
    ExpectedConstantBool,
    #[error("A compile time string was expected.")]
    ExpectedConstantString,
    #[error("Invalid attribute '{name}' for '{target}'.")]
    InvalidAttribute { name: String, target: String },
    #[error("Failed to load file {file}: {reason}")]
    FailedToLoadFile { file: String, reason: String },
    #[error("This exceeds the maximum number of includes ({max}).")]
    TooManyIncludes { max: usize },
    #[error("{message}")]
    CtAssertFailed { message: String },

    #[error("unsupported feature: {feature}")]
    UnsupportedFeature { feature: String },
}
