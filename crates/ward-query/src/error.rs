//! Execution faults.

use std::fmt;

use thiserror::Error;

/// Category of an execution fault.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FaultKind {
    /// Connection could not be established or was dropped.
    Transport,
    /// The request exceeded its deadline.
    Timeout,
    /// The store refused the statement (syntax, permissions, bad input).
    Rejected,
    /// The store failed while running the statement.
    Remote,
    /// The store answered with a body that is not a row set.
    Decode,
}

impl fmt::Display for FaultKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Transport => write!(f, "transport"),
            Self::Timeout => write!(f, "timeout"),
            Self::Rejected => write!(f, "rejected"),
            Self::Remote => write!(f, "remote"),
            Self::Decode => write!(f, "decode"),
        }
    }
}

/// A failed query execution.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{kind} fault: {message}")]
pub struct QueryFault {
    pub kind: FaultKind,
    pub message: String,
}

impl QueryFault {
    pub fn new(kind: FaultKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    pub fn transport(message: impl Into<String>) -> Self {
        Self::new(FaultKind::Transport, message)
    }

    pub fn timeout(message: impl Into<String>) -> Self {
        Self::new(FaultKind::Timeout, message)
    }

    pub fn rejected(message: impl Into<String>) -> Self {
        Self::new(FaultKind::Rejected, message)
    }

    pub fn remote(message: impl Into<String>) -> Self {
        Self::new(FaultKind::Remote, message)
    }

    pub fn decode(message: impl Into<String>) -> Self {
        Self::new(FaultKind::Decode, message)
    }

    /// Whether running the same statement again could succeed.
    ///
    /// A statement the store rejected will be rejected again.
    pub fn is_retryable(&self) -> bool {
        !matches!(self.kind, FaultKind::Rejected)
    }
}
