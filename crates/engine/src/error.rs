//! Engine error taxonomy.
//!
//! Only failures the caller can act on surface as `Err`. A denied permission
//! is recovered inside `open` (message sent, state unchanged) and a failing
//! click handler is isolated and logged, so neither appears here.

use thiserror::Error;

/// Errors surfaced by engine operations.
#[derive(Debug, Error)]
pub enum MenuError {
    /// Computing or displaying a menu's content failed. The user's display
    /// has already been closed; re-opening is up to the caller.
    #[error("failed to render menu {name:?}")]
    Render {
        /// Display name of the menu that failed to render.
        name: String,
        /// Underlying host failure.
        #[source]
        source: anyhow::Error,
    },
}
