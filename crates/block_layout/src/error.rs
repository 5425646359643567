//! Error types for block construction, measurement and solving.
//!
//! Structural mistakes are caught when a block is built ([`BlockError`]), so
//! the solver itself only fails when the injected width function does, when
//! the cost configuration is unusable, or when asked to solve an id that the
//! arena never handed out.

use crate::block::BlockId;

/// Structural error detected while constructing a block.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum BlockError {
    /// A choice was built without any option.
    #[error("choice block needs at least one option")]
    EmptyChoice,

    /// A line, stack, wrap or verbatim block was built without children.
    #[error("{kind} block needs at least one element")]
    EmptyComposite { kind: &'static str },

    /// Text content contained a line break; multi-line content belongs in a
    /// verbatim block.
    #[error("text block content contains a line break: {content:?}")]
    MultilineText { content: String },

    /// A break multiplier that is negative or not finite.
    #[error("break multiplier must be finite and non-negative, got {value}")]
    InvalidBreakMult { value: f64 },

    /// An id that was not allocated by this arena.
    #[error("{0:?} does not belong to this arena")]
    UnknownBlock(BlockId),

    /// The arena ran out of 32-bit ids.
    #[error("block arena is full ({count} blocks)")]
    ArenaFull { count: usize },
}

/// Failure reported by a width function.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum WidthError {
    /// The text cannot be mapped to a column count.
    #[error("cannot measure {text:?}: {reason}")]
    Unmeasurable { text: String, reason: String },
}

impl WidthError {
    /// Build a [`WidthError::Unmeasurable`] for `text`.
    pub fn unmeasurable(text: &str, reason: impl Into<String>) -> Self {
        WidthError::Unmeasurable {
            text: text.to_owned(),
            reason: reason.into(),
        }
    }
}

/// Invalid cost configuration.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ConfigError {
    /// A weight that is negative, NaN or infinite.
    #[error("cost weight `{name}` must be finite and non-negative, got {value}")]
    InvalidWeight { name: &'static str, value: f64 },
}

/// Error returned by [`crate::render`] and [`crate::Solver::evaluate`].
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum LayoutError {
    #[error(transparent)]
    Width(#[from] WidthError),

    #[error(transparent)]
    Config(#[from] ConfigError),

    /// The root handed to the solver is not in the arena.
    #[error("root {0:?} does not belong to the arena")]
    UnknownRoot(BlockId),
}
