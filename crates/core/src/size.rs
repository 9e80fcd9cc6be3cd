//! Legal grid sizes: 1 to 6 rows of 9 slots.

use serde::{Deserialize, Serialize};

/// Number of slots in one grid row.
pub const ROW_WIDTH: usize = 9;

/// The six slot counts a displayable grid may have (9 through 54).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum GridSize {
    /// 9 slots (1 row).
    Smallest,
    /// 18 slots (2 rows).
    Small,
    /// 27 slots (3 rows).
    Normal,
    /// 36 slots (4 rows).
    Large,
    /// 45 slots (5 rows).
    Larger,
    /// 54 slots (6 rows).
    Largest,
}

impl GridSize {
    /// All sizes, smallest first.
    pub const ALL: [GridSize; 6] = [
        GridSize::Smallest,
        GridSize::Small,
        GridSize::Normal,
        GridSize::Large,
        GridSize::Larger,
        GridSize::Largest,
    ];

    /// Total slot count for this size.
    pub fn slots(self) -> usize {
        self.rows() * ROW_WIDTH
    }

    /// Number of 9-slot rows.
    pub fn rows(self) -> usize {
        match self {
            GridSize::Smallest => 1,
            GridSize::Small => 2,
            GridSize::Normal => 3,
            GridSize::Large => 4,
            GridSize::Larger => 5,
            GridSize::Largest => 6,
        }
    }

    /// Size with exactly `rows` rows, if legal.
    pub fn from_rows(rows: usize) -> Option<GridSize> {
        match rows {
            1 => Some(GridSize::Smallest),
            2 => Some(GridSize::Small),
            3 => Some(GridSize::Normal),
            4 => Some(GridSize::Large),
            5 => Some(GridSize::Larger),
            6 => Some(GridSize::Largest),
            _ => None,
        }
    }

    /// Size with exactly `slots` slots, if legal.
    pub fn from_slots(slots: usize) -> Option<GridSize> {
        if slots % ROW_WIDTH != 0 {
            return None;
        }
        Self::from_rows(slots / ROW_WIDTH)
    }
}
