//! Per-user navigation history.
//!
//! A stack of shared menu handles: the top is the menu the user is viewing,
//! the entry under it is where a back control returns to. One `History`
//! belongs to exactly one user session; the engine serializes access through
//! the session lock.

use crate::menu::SharedMenu;
use std::sync::Arc;

/// Stack of previously opened menus for one user, most recent on top.
pub struct History<U> {
    stack: Vec<SharedMenu<U>>,
}

impl<U> Default for History<U> {
    fn default() -> Self {
        Self::new()
    }
}

impl<U> History<U> {
    /// Create an empty history.
    pub fn new() -> Self {
        Self { stack: Vec::new() }
    }

    /// Push `menu` unless it already is the current top. Returns whether an
    /// entry was actually added.
    ///
    /// Comparison is by handle identity: reopening the menu the user is
    /// already viewing (a page turn, a refresh) must not grow the stack.
    pub fn push(&mut self, menu: SharedMenu<U>) -> bool {
        let is_current = self
            .stack
            .last()
            .is_some_and(|top| Arc::ptr_eq(top, &menu));
        if !is_current {
            self.stack.push(menu);
        }
        !is_current
    }

    /// Drop the top entry unconditionally. Undoes a `push` whose menu never
    /// reached the user.
    pub(crate) fn pop_current(&mut self) {
        self.stack.pop();
    }

    /// The menu the user is currently in, if any.
    pub fn current(&self) -> Option<&SharedMenu<U>> {
        self.stack.last()
    }

    /// The menu a back control would return to, if any.
    pub fn previous(&self) -> Option<&SharedMenu<U>> {
        self.stack.len().checked_sub(2).map(|i| &self.stack[i])
    }

    /// Pop the current menu and return the new top.
    ///
    /// With fewer than two entries nothing is popped and `None` is returned.
    pub fn pop_to_previous(&mut self) -> Option<SharedMenu<U>> {
        if self.stack.len() < 2 {
            return None;
        }
        self.stack.pop();
        self.stack.last().cloned()
    }

    /// Whether a back control has somewhere to go.
    pub fn has_previous(&self) -> bool {
        self.stack.len() > 1
    }

    /// Number of entries, current menu included.
    pub fn depth(&self) -> usize {
        self.stack.len()
    }

    /// Drop the entire stack.
    pub fn clear(&mut self) {
        self.stack.clear();
    }
}

impl<U> std::fmt::Debug for History<U> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("History").field("depth", &self.stack.len()).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::menu::Menu;
    use gridmenu_core::GridSize;

    fn menu(name: &str) -> SharedMenu<u32> {
        Menu::builder(name, GridSize::Smallest).build()
    }

    #[test]
    fn empty_history_has_no_entries() {
        let history: History<u32> = History::new();
        assert!(history.current().is_none());
        assert!(history.previous().is_none());
        assert!(!history.has_previous());
    }

    #[test]
    fn duplicate_current_push_is_a_no_op() {
        let mut history = History::new();
        let a = menu("a");
        let b = menu("b");

        history.push(a.clone());
        history.push(b.clone());
        history.push(b.clone());

        assert_eq!(history.depth(), 2);
        assert!(Arc::ptr_eq(history.current().unwrap(), &b));
        assert!(Arc::ptr_eq(history.previous().unwrap(), &a));
    }

    #[test]
    fn pop_returns_the_new_top() {
        let mut history = History::new();
        let a = menu("a");
        let b = menu("b");
        history.push(a.clone());
        history.push(b);

        let popped = history.pop_to_previous().unwrap();
        assert!(Arc::ptr_eq(&popped, &a));
        assert!(Arc::ptr_eq(history.current().unwrap(), &a));
        assert_eq!(history.depth(), 1);
    }

    #[test]
    fn pop_with_single_entry_leaves_it_in_place() {
        let mut history = History::new();
        let a = menu("a");
        history.push(a.clone());

        assert!(history.pop_to_previous().is_none());
        assert_eq!(history.depth(), 1);
        assert!(Arc::ptr_eq(history.current().unwrap(), &a));
    }

    #[test]
    fn distinct_menus_with_equal_names_both_push() {
        let mut history = History::new();
        history.push(menu("same"));
        history.push(menu("same"));
        assert_eq!(history.depth(), 2);
    }

    #[test]
    fn clear_empties_the_stack() {
        let mut history = History::new();
        history.push(menu("a"));
        history.push(menu("b"));
        history.clear();
        assert_eq!(history.depth(), 0);
        assert!(history.current().is_none());
    }
}
