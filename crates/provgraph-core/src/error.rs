//! Error types shared by every provenance graph algorithm.
//!
//! All failures are local to a single call: the algorithms are pure,
//! in-memory and deterministic, so nothing here is retryable.

use std::fmt;

/// Machine-readable error codes for scripted callers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCode {
    NodeNotFound,
    EdgeNotFound,
    EmptyGraph,
    InvalidMerge,
    MissingWeight,
    CycleResolutionFailed,
    CycleBudgetExceeded,
}

impl ErrorCode {
    /// Stable code identifier (`G####`) for machine parsing.
    #[must_use]
    pub const fn code(self) -> &'static str {
        match self {
            Self::NodeNotFound => "G1001",
            Self::EdgeNotFound => "G1002",
            Self::EmptyGraph => "G1003",
            Self::InvalidMerge => "G2001",
            Self::MissingWeight => "G2002",
            Self::CycleResolutionFailed => "G3001",
            Self::CycleBudgetExceeded => "G3002",
        }
    }

    /// Optional remediation hint surfaced by the CLI.
    #[must_use]
    pub const fn hint(self) -> Option<&'static str> {
        match self {
            Self::CycleBudgetExceeded => {
                Some("Raise `dagify.max_cycles` or split the graph before dagifying.")
            }
            Self::CycleResolutionFailed => Some("Raise `dagify.max_iterations`."),
            Self::MissingWeight => Some("Every two-hop ancestor needs a numeric `weight`."),
            _ => None,
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

/// Errors raised by graph operations.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum GraphError {
    /// An operation referenced a node key absent from the graph.
    #[error("node not found: {key}")]
    NodeNotFound { key: String },

    /// `remove_edge` was asked to drop an edge that does not exist.
    #[error("edge not found: {from} -> {to}")]
    EdgeNotFound { from: String, to: String },

    /// Ranking or impact analysis was requested on a graph with no nodes.
    #[error("graph has no nodes")]
    EmptyGraph,

    /// A node cannot be merged with itself.
    #[error("cannot merge node '{key}' with itself")]
    InvalidMerge { key: String },

    /// A node needed for ancestor weighing has no `weight` attribute.
    #[error("node '{key}' has no weight attribute")]
    MissingWeight { key: String },

    /// Dagify hit its iteration cap while cycles remained.
    #[error("cycle resolution failed after {iterations} iterations ({remaining_cycles} cycles left)")]
    CycleResolutionFailed {
        iterations: usize,
        remaining_cycles: usize,
    },

    /// Elementary-cycle enumeration produced more cycles than allowed.
    #[error("elementary cycle enumeration exceeded the budget of {limit} cycles")]
    CycleBudgetExceeded { limit: usize },
}

impl GraphError {
    /// The stable [`ErrorCode`] for this error.
    #[must_use]
    pub const fn code(&self) -> ErrorCode {
        match self {
            Self::NodeNotFound { .. } => ErrorCode::NodeNotFound,
            Self::EdgeNotFound { .. } => ErrorCode::EdgeNotFound,
            Self::EmptyGraph => ErrorCode::EmptyGraph,
            Self::InvalidMerge { .. } => ErrorCode::InvalidMerge,
            Self::MissingWeight { .. } => ErrorCode::MissingWeight,
            Self::CycleResolutionFailed { .. } => ErrorCode::CycleResolutionFailed,
            Self::CycleBudgetExceeded { .. } => ErrorCode::CycleBudgetExceeded,
        }
    }

    pub(crate) fn node_not_found(key: &str) -> Self {
        Self::NodeNotFound {
            key: key.to_string(),
        }
    }
}

/// Convenience alias used throughout the workspace.
pub type Result<T> = std::result::Result<T, GraphError>;
