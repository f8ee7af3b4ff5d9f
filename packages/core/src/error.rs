//! Runtime errors
//!
//! Every instruction returns [`Result`]; none of these errors is recoverable for the render
//! pass that raised it.

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RuntimeError {
    /// Static metadata touched outside the first template pass, or instructions issued in the
    /// wrong order (e.g. i18n apply after bindings).
    #[error("Phase violation: {0}")]
    PhaseViolation(String),

    /// A first-pass node was declared somewhere other than the next free declaration slot.
    #[error("index {index} expected to be at the end of arr (length {expected})")]
    IndexMismatch { index: usize, expected: usize },

    #[error("No TNode found at index {0}")]
    MissingTNode(usize),

    #[error("Unknown view {0}")]
    UnknownView(usize),

    #[error("Slot {index} does not hold {expected}")]
    UnexpectedSlot {
        index: usize,
        expected: &'static str,
    },

    #[error("Invalid operation: {0}")]
    InvalidOperation(String),

    /// An i18n placeholder index does not fit in the bits left next to the opcode.
    #[error("Index {index} is too big and will overflow")]
    IndexOverflow { index: usize },

    #[error("Circular dep for {token}")]
    CircularDependency { token: String },

    #[error("No provider for {token}!")]
    NoProvider { token: String },

    /// Raised only when dev-mode assertions are enabled.
    #[error("Assertion failed: {0}")]
    AssertionFailed(String),

    #[error("Unsupported value for styling binding: {0}")]
    UnsupportedBinding(String),

    #[error("Invalid runtime configuration: {0}")]
    Config(String),
}

pub type Result<T> = std::result::Result<T, RuntimeError>;
