//! Error types for parsing and JSON decoding
//!
//! Every failure is fatal: a parse either produces a complete tree or one of
//! these errors, never a partial result.
use std::fmt;

/// The shape of a delimiter mismatch
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DelimiterIssue {
    /// An opening delimiter was never closed
    UnclosedOpen(String),
    /// A closing delimiter had no matching open
    ExtraClose(String),
    /// An open and close delimiter that don't pair
    MismatchedPair {
        /// The opening glyph
        open: String,
        /// The closing glyph that arrived instead of a valid closer
        close: String,
    },
}

impl fmt::Display for DelimiterIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DelimiterIssue::UnclosedOpen(open) => write!(f, "'{open}' was never closed"),
            DelimiterIssue::ExtraClose(close) => write!(f, "'{close}' has no matching open"),
            DelimiterIssue::MismatchedPair { open, close } => {
                write!(f, "'{open}' closed by '{close}'")
            }
        }
    }
}

/// A fatal parse failure
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ParseError {
    /// Input that no registered token matches
    #[error("unrecognized input {found:?} at offset {offset}")]
    Lexical {
        /// The unmatched leading text
        found: String,
        /// Byte offset into the trimmed input
        offset: usize,
    },

    /// A registered token whose regex pattern does not compile
    #[error("token '{id}' has an invalid pattern: {detail}")]
    Pattern {
        /// The offending token definition's id
        id: String,
        /// The regex engine's explanation
        detail: String,
    },

    /// An operator or marker with no valid operand where one is required
    #[error("missing operand near '{symbol}'")]
    MissingOperand {
        /// The display glyph or name of the token that lacked an operand
        symbol: String,
    },

    /// Unbalanced or mispaired delimiters
    #[error("mismatched delimiters: {0}")]
    DelimiterMismatch(DelimiterIssue),

    /// A delimiter pair that disallows empty content closed with no children
    #[error("empty group '{open}' is not allowed")]
    EmptyGroup {
        /// The opening glyph
        open: String,
    },

    /// A resolved application whose argument count disagrees with its declaration
    #[error("'{name}' expects {expected} argument(s), found {found}")]
    Arity {
        /// The function name or head description
        name: String,
        /// Declared argument count
        expected: usize,
        /// Arguments actually supplied
        found: usize,
    },

    /// Two function descriptors that cannot be reconciled
    #[error("incompatible function types: {reason}")]
    IncompatibleFunction {
        /// Which part of the descriptors disagreed
        reason: String,
    },
}

/// A failure while decoding a JSON tree
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum JsonError {
    /// A `kind` with no registered decoder
    #[error("unknown node kind {kind:?}")]
    UnknownKind {
        /// The unrecognized kind string
        kind: String,
    },

    /// Structurally invalid node JSON
    #[error("malformed node: {detail}")]
    Malformed {
        /// What was missing or mistyped
        detail: String,
    },
}

impl JsonError {
    pub(crate) fn malformed(detail: impl Into<String>) -> Self {
        JsonError::Malformed {
            detail: detail.into(),
        }
    }
}
