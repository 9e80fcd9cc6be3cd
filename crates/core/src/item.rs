//! Item model for grid cells.
//!
//! A [`MenuItem`] is the value held by one cell of a menu grid: a material
//! key plus the display metadata that matters for click matching. The
//! [`Fingerprint`] derived from it is the value-equality key used to match an
//! incoming click back to a registered handler; purely cosmetic state (the
//! tooltip-visibility flag) is deliberately excluded from it.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

use crate::size::GridSize;

/// Default namespace used when a key omits an explicit namespace.
pub const DEFAULT_NAMESPACE: &str = "menu";

/// Error returned when parsing an invalid [`ItemKey`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{0}")]
pub struct ItemKeyError(String);

/// A namespaced key of the form `namespace:path`, identifying a material or
/// a custom item tag.
///
/// Ordering is lexical by `(namespace, path)` and is stable across runs.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ItemKey {
    namespace: String,
    path: String,
}

impl ItemKey {
    /// Parse an item key.
    ///
    /// Accepts either `namespace:path` or a bare `path`, which uses
    /// [`DEFAULT_NAMESPACE`].
    pub fn parse(input: &str) -> Result<Self, ItemKeyError> {
        let input = input.trim();
        if input.is_empty() {
            return Err(ItemKeyError("ItemKey cannot be empty".into()));
        }

        let (namespace, path) = match input.split_once(':') {
            Some((ns, p)) => (ns, p),
            None => (DEFAULT_NAMESPACE, input),
        };

        validate_segment(namespace, "namespace", 64)?;
        validate_segment(path, "path", 128)?;

        Ok(Self {
            namespace: namespace.to_string(),
            path: path.to_string(),
        })
    }

    /// Key namespace.
    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    /// Key path.
    pub fn path(&self) -> &str {
        &self.path
    }
}

impl fmt::Display for ItemKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.namespace, self.path)
    }
}

impl FromStr for ItemKey {
    type Err = ItemKeyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

fn validate_segment(segment: &str, what: &str, max_len: usize) -> Result<(), ItemKeyError> {
    if segment.is_empty() {
        return Err(ItemKeyError(format!("ItemKey {what} cannot be empty")));
    }
    if segment.len() > max_len {
        return Err(ItemKeyError(format!(
            "ItemKey {what} too long (max {max_len})"
        )));
    }
    if !segment
        .chars()
        .all(|c| matches!(c, 'a'..='z' | '0'..='9' | '_' | '-' | '.' | '/'))
    {
        return Err(ItemKeyError(format!(
            "ItemKey {what} has invalid characters (allowed: a-z0-9_./-)"
        )));
    }
    Ok(())
}

/// The content value of one grid cell.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MenuItem {
    /// Material key.
    pub material: ItemKey,
    /// Stack amount (1 for plain UI items).
    pub amount: u32,
    /// Optional display name shown as the cell title.
    pub name: Option<String>,
    /// Lore lines shown under the name.
    pub lore: Vec<String>,
    /// Optional persisted identifier tag, used to re-identify items
    /// independently of their display state.
    pub item_id: Option<String>,
    /// Enchantments keyed by enchantment id, sorted for stable comparison.
    pub enchantments: BTreeMap<ItemKey, u8>,
    /// Hide the tooltip entirely. Cosmetic only: never part of the
    /// fingerprint.
    pub hide_tooltip: bool,
    /// Marks this item as the menu's back control.
    pub back_button: bool,
}

impl MenuItem {
    /// Create a bare item of the given material.
    pub fn new(material: ItemKey) -> Self {
        Self {
            material,
            amount: 1,
            name: None,
            lore: Vec::new(),
            item_id: None,
            enchantments: BTreeMap::new(),
            hide_tooltip: false,
            back_button: false,
        }
    }

    /// Set the display name.
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Set the stack amount.
    pub fn with_amount(mut self, amount: u32) -> Self {
        self.amount = amount;
        self
    }

    /// Append a lore line.
    pub fn with_lore_line(mut self, line: impl Into<String>) -> Self {
        self.lore.push(line.into());
        self
    }

    /// Set the persisted identifier tag.
    pub fn with_item_id(mut self, id: impl Into<String>) -> Self {
        self.item_id = Some(id.into());
        self
    }

    /// Add an enchantment at the given level.
    pub fn with_enchantment(mut self, enchantment: ItemKey, level: u8) -> Self {
        self.enchantments.insert(enchantment, level);
        self
    }

    /// Hide the tooltip. Does not affect click matching.
    pub fn with_hidden_tooltip(mut self) -> Self {
        self.hide_tooltip = true;
        self
    }

    /// Mark this item as the menu's back control.
    pub fn as_back_button(mut self) -> Self {
        self.back_button = true;
        self
    }

    /// Check whether this item carries the given persisted identifier.
    pub fn has_item_id(&self, id: &str) -> bool {
        self.item_id.as_deref() == Some(id)
    }

    /// Compute the value-equality key used for click matching.
    pub fn fingerprint(&self) -> Fingerprint {
        Fingerprint {
            material: self.material.clone(),
            amount: self.amount,
            name: self.name.clone(),
            lore: self.lore.clone(),
            item_id: self.item_id.clone(),
            enchantments: self.enchantments.clone(),
        }
    }

    /// Value-equality comparison per the fingerprint rules: same material,
    /// amount, name, lore, identifier tag, and enchantments. The
    /// tooltip-visibility flag is ignored.
    pub fn is_similar(&self, other: &MenuItem) -> bool {
        self.fingerprint() == other.fingerprint()
    }

    /// Map every slot of a grid to a copy of `filler`.
    ///
    /// Mirrors the "fill the whole menu with one material" helper used for
    /// backgrounds.
    pub fn fill(filler: &MenuItem, size: GridSize) -> BTreeMap<usize, MenuItem> {
        (0..size.slots()).map(|i| (i, filler.clone())).collect()
    }
}

/// Value-equality key over the click-relevant dimensions of a [`MenuItem`].
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Fingerprint {
    material: ItemKey,
    amount: u32,
    name: Option<String>,
    lore: Vec<String>,
    item_id: Option<String>,
    enchantments: BTreeMap<ItemKey, u8>,
}
