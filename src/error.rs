//! Error types.
//!
//! Malformed markup is never an error: every input renders to some
//! well-formed fragment. The variants here only describe defects in the
//! engine itself.

use thiserror::Error;

/// Internal invariant violation inside the engine.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Error {
    #[error("closed </{found}> while <{expected}> is open")]
    MismatchedClose {
        expected: &'static str,
        found: &'static str,
    },

    #[error("closed </{0}> with no open element")]
    CloseWithoutOpen(&'static str),

    #[error("{count} element(s) left open at end of output, innermost <{innermost}>")]
    Unclosed {
        count: usize,
        innermost: &'static str,
    },

    #[error("document tree nested deeper than {0}")]
    DepthExceeded(usize),
}

/// Result type alias for engine operations.
pub type Result<T> = std::result::Result<T, Error>;
