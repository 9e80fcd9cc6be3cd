//! Static-slot layout math.
//!
//! A "static" slot is a grid index reserved for border or button content and
//! excluded from pagination. These functions compute the usual reserved
//! regions (edges of the grid) plus a couple of button presets, and normalize
//! arbitrary caller-supplied slot lists. All of them are pure and total for
//! any [`GridSize`].

use crate::size::{GridSize, ROW_WIDTH};

/// Slots of the top row: `[0, min(9, slots))`.
pub fn top_slots(size: GridSize) -> Vec<usize> {
    (0..ROW_WIDTH.min(size.slots())).collect()
}

/// Slots of the bottom row: `[slots - 9, slots)`.
pub fn bottom_slots(size: GridSize) -> Vec<usize> {
    let slots = size.slots();
    (slots.saturating_sub(ROW_WIDTH)..slots).collect()
}

/// Leftmost slot of every row.
pub fn left_slots(size: GridSize) -> Vec<usize> {
    (0..size.rows()).map(|row| row * ROW_WIDTH).collect()
}

/// Rightmost slot of every row.
pub fn right_slots(size: GridSize) -> Vec<usize> {
    (0..size.rows())
        .map(|row| row * ROW_WIDTH + (ROW_WIDTH - 1))
        .collect()
}

/// Full border: union of top, bottom, left, and right slots, deduplicated
/// and in ascending order.
pub fn standard_slots(size: GridSize) -> Vec<usize> {
    let mut all = top_slots(size);
    all.extend(bottom_slots(size));
    all.extend(left_slots(size));
    all.extend(right_slots(size));
    all.sort_unstable();
    all.dedup();
    all
}

/// Three adjacent bottom-row slots centered in the row, the usual spot for
/// previous/info/next page buttons.
pub fn middle_buttons(size: GridSize) -> Vec<usize> {
    let center = size.slots() - ROW_WIDTH + ROW_WIDTH / 2;
    vec![center - 1, center, center + 1]
}

/// Bottom-row corners plus the bottom-row center.
pub fn spread_buttons(size: GridSize) -> Vec<usize> {
    let first = size.slots() - ROW_WIDTH;
    vec![first, first + ROW_WIDTH / 2, first + ROW_WIDTH - 1]
}

/// Normalize a caller-supplied slot list: drop duplicates (first occurrence
/// wins, order preserved) and drop indices outside `[0, slots)`.
pub fn dedupe_and_clamp(slots: &[usize], size: GridSize) -> Vec<usize> {
    let limit = size.slots();
    let mut seen = vec![false; limit];
    let mut out = Vec::with_capacity(slots.len().min(limit));
    for &slot in slots {
        if slot < limit && !seen[slot] {
            seen[slot] = true;
            out.push(slot);
        }
    }
    out
}
