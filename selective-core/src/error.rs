//! Error types for the selective engine.
//!
//! The engine has exactly two failure modes, both caused by misuse:
//!
//! - [`Error::Scope`]: an accessor needed a container but the context it was
//!   called through has none attached.
//! - [`Error::Contract`]: a dynamic selector, comparator, or updater turned out
//!   not to be a function.
//!
//! All in-memory state transitions are total, so there are no transient or
//! retryable errors.

use thiserror::Error;

/// Result alias used throughout the crate.
pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Errors raised synchronously at the point of misuse.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Error {
    /// No container is reachable through the context.
    #[error("`{accessor}` must be used within an active container scope{}", describe_context(.context))]
    Scope {
        /// The accessor that was called.
        accessor: &'static str,
        /// Label of the context, if it was created with one.
        context: Option<String>,
    },

    /// A dynamic argument that must be callable was not.
    #[error("{argument} must be a function")]
    Contract {
        /// Name of the offending argument (`selector`, `compare`, ...).
        argument: &'static str,
    },
}

impl Error {
    pub(crate) fn scope(accessor: &'static str, context: Option<&str>) -> Self {
        Self::Scope {
            accessor,
            context: context.map(str::to_owned),
        }
    }

    pub(crate) fn contract(argument: &'static str) -> Self {
        Self::Contract { argument }
    }

    /// True for [`Error::Scope`].
    pub fn is_scope(&self) -> bool {
        matches!(self, Self::Scope { .. })
    }

    /// True for [`Error::Contract`].
    pub fn is_contract(&self) -> bool {
        matches!(self, Self::Contract { .. })
    }
}

fn describe_context(context: &Option<String>) -> String {
    match context {
        Some(label) => format!(" (context `{label}`)"),
        None => String::new(),
    }
}
