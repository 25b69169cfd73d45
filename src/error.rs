//! Error types for content-stream interpretation.

use thiserror::Error;

/// Primary error type surfaced by the stream engine.
///
/// Operator handlers report failures through this enum; the engine routes
/// them to the device's `operator_error` hook, whose default policy recovers
/// from the "missing" kinds and propagates the rest.
#[derive(Error, Debug)]
pub enum EngineError {
    /// An operator handler found fewer or wrong-typed operands than it needs.
    #[error("operator {operator}: missing or malformed operand")]
    MissingOperand { operator: String },

    /// A named resource was not found in the effective resource scope.
    #[error("missing {kind} resource: {name}")]
    MissingResource { kind: &'static str, name: String },

    /// No codec is available to decode an image at runtime.
    #[error("no image reader available for {0}")]
    MissingImageReader(String),

    /// A restore was attempted with nothing left to pop.
    #[error("cannot restore graphics state: stack is empty")]
    EmptyGraphicsStack,

    /// A TJ array element of an unexpected variant.
    #[error("malformed TJ array: unexpected {0} element")]
    MalformedTextArray(&'static str),

    /// The tokenizer hit bytes it cannot interpret.
    #[error("invalid token at position {pos}: {msg}")]
    Lexer { pos: usize, msg: String },

    /// An engine entry point was called in a state it does not support.
    #[error("{0}")]
    InvalidState(&'static str),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

/// Convenience Result alias for engine operations.
pub type Result<T> = std::result::Result<T, EngineError>;
