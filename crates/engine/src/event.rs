//! Interaction events and engine decisions.

use gridmenu_core::MenuItem;

/// One click on a cell of a managed grid.
///
/// The host adapter builds this from its native interaction event and only
/// forwards clicks that landed on a grid the engine opened; clicks on empty
/// cells need not be forwarded at all. The event is immutable: the engine
/// answers with a [`ClickDecision`] and the adapter applies it.
#[derive(Debug, Clone)]
pub struct ClickEvent<U> {
    /// The interacting user.
    pub user: U,
    /// Grid index of the clicked cell.
    pub slot: usize,
    /// The content the cell held at click time.
    pub item: MenuItem,
}

/// What the host adapter should do with the interaction it forwarded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClickDecision {
    /// Not engine business: no menu is open for the user, or the slot is
    /// marked takable. The host keeps its default slot-mutation behavior.
    PassThrough,
    /// The engine handled the click; the host must cancel its default
    /// slot mutation.
    Consumed,
    /// The click was a back control: the previous menu in the user's
    /// history has been reopened. Default behavior must be cancelled.
    ReopenedPrevious,
}
