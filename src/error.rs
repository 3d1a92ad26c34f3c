//! Error types for stack operations
//!
//! Every variant here is a precondition violation: the offending call is
//! logged and becomes a no-op, the stack is left untouched.

use crate::window::{WindowId, WindowKind};
use thiserror::Error;

/// Reasons a stack operation was rejected.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StackError {
    /// No factory is registered for the requested kind
    #[error("no window factory registered for kind '{0}'")]
    NotRegistered(WindowKind),

    /// No live window of this kind is in the stack
    #[error("no live window of kind '{0}'")]
    NotFound(WindowKind),

    /// A window of this kind is already live in the stack
    #[error("a window of kind '{0}' is already open")]
    AlreadyOpen(WindowKind),

    /// The window is not part of the live stack
    #[error("window {id} ('{kind}') is not in the stack")]
    NotLive { id: WindowId, kind: WindowKind },

    /// The window already reached its terminal closed state
    #[error("window {id} ('{kind}') is already closed")]
    WindowClosed { id: WindowId, kind: WindowKind },

    /// The window is live but hidden, so it cannot take focus
    #[error("window {id} ('{kind}') is hidden")]
    WindowHidden { id: WindowId, kind: WindowKind },

    /// A close-all pass is already running
    #[error("close-all is already in progress")]
    AlreadyClosingAll,
}

pub type StackResult<T> = std::result::Result<T, StackError>;
