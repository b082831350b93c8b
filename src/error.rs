// src/error.rs

use thiserror::Error;

/// Errors raised while evaluating a script line.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum EvalError {
    #[error("Unknown operator: '{0}'")]
    UnknownOperator(String),
    #[error("Invalid result reference: ${0}")]
    InvalidResultReference(i64),
    #[error(transparent)]
    Parse(#[from] ParseError),
    #[error("Empty pipeline segment")]
    EmptyPipelineSegment,
    #[error("Arity mismatch: '{operator}' takes {expected} argument(s), got {got}")]
    ArityMismatch {
        operator: String,
        expected: usize,
        got: usize,
    },
    #[error("Unknown parameter '{key}' for operator '{operator}'")]
    UnknownParameter { operator: String, key: String },
    #[error("Operator '{0}' is already registered")]
    DuplicateOperator(String),
    #[error("Type error: {0}")]
    TypeError(String),
    #[error("'{operator}' failed: {message}")]
    OperatorFailed { operator: String, message: String },
    #[error("I/O error: {0}")]
    Io(String),
}

impl From<std::io::Error> for EvalError {
    fn from(e: std::io::Error) -> Self {
        EvalError::Io(e.to_string())
    }
}

#[derive(Debug, Clone, PartialEq, Error)]
#[error("Parse error at column {col}: {kind}")]
pub struct ParseError {
    pub kind: ParseErrorKind,
    pub col: usize,
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum ParseErrorKind {
    #[error("Unexpected character: '{0}'")]
    UnexpectedChar(char),
    #[error("Unterminated string")]
    UnterminatedString,
    #[error("Invalid escape sequence: '\\{0}'")]
    InvalidEscape(char),
    #[error("Unbalanced '[' in list literal")]
    UnbalancedBracket,
    #[error("Nested lists are not supported")]
    NestedList,
    #[error("Empty list element")]
    EmptyListElement,
    #[error("Expected an operator name")]
    MissingOperator,
    #[error("Missing value for argument '{0}'")]
    MissingValue(String),
}

/// A batch run failure, tagged with the 1-based script line it happened on.
#[derive(Debug, Clone, PartialEq, Error)]
#[error("line {line}: {error}")]
pub struct ScriptError {
    pub line: usize,
    pub error: EvalError,
}
