//! Page layout computation.
//!
//! Given a grid size, a set of reserved static slots, and an ordered item
//! sequence, [`paginate`] computes the slot map for one page: static slots
//! filled with border filler then overwritten by bound buttons, every other
//! slot filled with the page's window of the item sequence. The computation
//! is a pure function of its inputs, so rendering the same request twice
//! yields an identical slot map.

use std::collections::BTreeMap;

use crate::item::MenuItem;
use crate::layout::dedupe_and_clamp;
use crate::size::GridSize;

/// Inputs for one page-layout computation.
#[derive(Debug)]
pub struct PageRequest<'a> {
    /// Grid size.
    pub size: GridSize,
    /// Reserved slots, as supplied by the caller; may contain duplicates and
    /// out-of-range indices, which are normalized away.
    pub static_slots: &'a [usize],
    /// Filler written to every static slot before buttons are placed.
    pub border: Option<&'a MenuItem>,
    /// The full ordered content sequence being paged.
    pub items: &'a [MenuItem],
    /// Buttons bound to specific slots. A button bound to a slot that is not
    /// static is silently dropped.
    pub buttons: &'a BTreeMap<usize, MenuItem>,
    /// Page to lay out. Not clamped: callers gate page advancement on
    /// [`PageLayout::is_last_page`].
    pub page: usize,
}

/// Result of one page-layout computation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageLayout {
    /// Slot index to content for the requested page.
    pub slots: BTreeMap<usize, MenuItem>,
    /// Index of the last page: `ceil(items / capacity) - 1`, or `-1` when
    /// there is no dynamic content at all (no items, or no room for any).
    pub number_of_pages: i32,
    /// Dynamic slots available per page after normalizing static slots.
    pub capacity: usize,
}

impl PageLayout {
    /// Whether `page` is at or past the last page of this layout.
    ///
    /// `>=` rather than `==` so the degenerate no-content layout (last page
    /// index `-1`) reads as last and callers never advance into nothing.
    pub fn is_last_page(&self, page: usize) -> bool {
        page as i32 >= self.number_of_pages
    }
}

/// Compute the slot map for one page.
pub fn paginate(request: &PageRequest<'_>) -> PageLayout {
    let grid_slots = request.size.slots();
    let static_slots = dedupe_and_clamp(request.static_slots, request.size);
    let capacity = grid_slots - static_slots.len();

    let number_of_pages = if capacity == 0 || request.items.is_empty() {
        -1
    } else {
        (request.items.len().div_ceil(capacity)) as i32 - 1
    };

    let mut slots: BTreeMap<usize, MenuItem> = BTreeMap::new();

    if let Some(border) = request.border {
        for &slot in &static_slots {
            slots.insert(slot, border.clone());
        }
    }

    let mut is_static = vec![false; grid_slots];
    for &slot in &static_slots {
        is_static[slot] = true;
    }

    let mut dynamic_index = 0;
    for slot in 0..grid_slots {
        if is_static[slot] {
            continue;
        }
        let item_index = dynamic_index + capacity * request.page;
        if item_index < request.items.len() {
            slots.insert(slot, request.items[item_index].clone());
            dynamic_index += 1;
        }
    }

    for (&slot, button) in request.buttons {
        if slot < grid_slots && is_static[slot] {
            slots.insert(slot, button.clone());
        }
    }

    PageLayout {
        slots,
        number_of_pages,
        capacity,
    }
}
