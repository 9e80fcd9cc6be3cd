//! Menu navigation and dispatch engine.
//!
//! Ties the pure pieces from `gridmenu-core` to a displaying [`Host`]:
//! opening a menu for a user (permission gate, history push, page layout,
//! grid handoff), routing clicks back to registered handlers, and walking
//! the per-user navigation history when a back control is clicked.
//!
//! The engine serializes all work for one user behind that user's session
//! lock; operations for different users run in parallel.

pub mod engine;
pub mod error;
pub mod event;
pub mod history;
pub mod host;
pub mod menu;
pub mod registry;

pub use engine::{CloseToken, MenuEngine, OpenOutcome, RefreshOutcome, NO_PERMISSION_MESSAGE};
pub use error::MenuError;
pub use event::{ClickDecision, ClickEvent};
pub use history::History;
pub use host::Host;
pub use menu::{Menu, MenuBuilder, MenuContent, MenuId, SharedMenu};
pub use registry::{ClickHandler, ClickRegistry};
