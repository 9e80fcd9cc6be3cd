//! Host abstraction.
//!
//! The engine never talks to a real display: everything it needs from the
//! surrounding environment is behind this trait. A game server with
//! container UIs, a terminal, or a test double all fit.

use gridmenu_core::{GridSize, MenuItem};

/// The environment that displays grids and delivers interactions.
pub trait Host {
    /// A user session. Cheap to clone; used as the key partitioning all
    /// engine state.
    type User: Clone + Eq + std::hash::Hash + Send;
    /// A displayable grid under construction.
    type Grid;

    /// Allocate an empty displayable grid with the given title.
    fn create_grid(&self, title: &str, size: GridSize) -> anyhow::Result<Self::Grid>;

    /// Write one cell of a grid under construction.
    fn set_cell(&self, grid: &mut Self::Grid, slot: usize, item: &MenuItem);

    /// Present a fully populated grid to the user, replacing whatever they
    /// were viewing.
    fn show(&self, grid: Self::Grid, user: &Self::User) -> anyhow::Result<()>;

    /// Rewrite one cell of the grid currently shown to the user.
    fn update_shown_cell(
        &self,
        user: &Self::User,
        slot: usize,
        item: &MenuItem,
    ) -> anyhow::Result<()>;

    /// Close whatever display the user currently has open.
    fn close(&self, user: &Self::User);

    /// Whether the user holds the named permission.
    fn has_permission(&self, user: &Self::User, permission: &str) -> bool;

    /// Deliver a plain text message to the user.
    fn send_message(&self, user: &Self::User, message: &str);
}
