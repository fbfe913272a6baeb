use routex_dsa::{Method, PoolExhausted, TrieError};
use thiserror::Error;

/// Registration failures. Always returned to the caller, never swallowed.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RouterError {
    /// The `(method, pattern)` pair is already registered.
    #[error("duplicate route: {method} {pattern}")]
    DuplicateRoute { method: Method, pattern: String },

    #[error("invalid route pattern {pattern:?}: {fault}")]
    InvalidPattern { pattern: String, fault: PatternFault },

    /// The trie node pool could not grow. Fatal for the registration.
    #[error("route storage exhausted: {0}")]
    PoolExhaustion(#[from] PoolExhausted),
}

/// Why a pattern was rejected.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PatternFault {
    #[error("pattern is empty")]
    Empty,
    #[error("pattern must start with '/'")]
    MissingLeadingSlash,
    #[error("pattern is {len} bytes, limit is {max}")]
    TooLong { len: usize, max: usize },
    #[error("pattern contains a query string")]
    QueryString,
    #[error("pattern contains an empty segment")]
    EmptySegment,
    #[error("parameter segment has no name")]
    EmptyParamName,
    #[error("pattern declares {count} parameters, limit is {max}")]
    TooManyParams { count: usize, max: usize },
    #[error("parameter `:{requested}` conflicts with `:{existing}` at the same position")]
    ParamConflict { existing: String, requested: String },
}

impl RouterError {
    pub(crate) fn invalid(pattern: &str, fault: PatternFault) -> Self {
        RouterError::InvalidPattern {
            pattern: pattern.to_string(),
            fault,
        }
    }

    pub(crate) fn duplicate(method: Method, pattern: &str) -> Self {
        RouterError::DuplicateRoute {
            method,
            pattern: pattern.to_string(),
        }
    }

    /// Lifts a trie-level failure into the public taxonomy.
    pub(crate) fn from_trie(err: TrieError, method: Method, pattern: &str) -> Self {
        match err {
            TrieError::Duplicate => RouterError::duplicate(method, pattern),
            TrieError::ParamConflict { existing, requested } => {
                RouterError::invalid(pattern, PatternFault::ParamConflict { existing, requested })
            }
            TrieError::Exhausted(e) => RouterError::PoolExhaustion(e),
        }
    }
}

/// No overlay, cached, dynamic or fallback route matched.
///
/// A normal negative result, mapped to a 404 by the connection layer.
#[derive(Error, Debug, Clone, Copy, Default, PartialEq, Eq)]
#[error("no route matched")]
pub struct NotFound;
