#![warn(missing_docs)]
//! Core primitives for paged grid menus: grid sizes, item model, static-slot
//! layout math, and the paginator.
//!
//! Everything in this crate is pure data and pure functions; the stateful
//! engine lives in `gridmenu-engine`.

pub mod item;
pub mod layout;
pub mod paginate;
pub mod size;

// Re-export commonly used types
pub use item::{Fingerprint, ItemKey, ItemKeyError, MenuItem};
pub use paginate::{paginate, PageLayout, PageRequest};
pub use size::GridSize;
