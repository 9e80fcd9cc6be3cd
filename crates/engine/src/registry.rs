//! Click-handler registry.
//!
//! Binds content fingerprints to handler callbacks for one menu. The
//! registry lives inside its [`Menu`](crate::Menu), so bindings expire with
//! the menu instead of accumulating in a process-wide map.
//!
//! Each handler sits behind its own mutex: the engine snapshots the matching
//! handlers while it holds the menu lock, then invokes them with no engine
//! lock held, so a handler is free to turn pages or open other menus.

use std::sync::{Arc, Mutex, PoisonError};

use gridmenu_core::{Fingerprint, MenuItem};

use crate::event::ClickEvent;

/// Callback invoked when a cell whose content matches a registered
/// fingerprint is clicked. A returned `Err` is logged and isolated; it never
/// stops sibling handlers.
pub type ClickHandler<U> = Box<dyn FnMut(&ClickEvent<U>) -> anyhow::Result<()> + Send>;

/// A handler slot shared between the registry and an in-flight dispatch.
pub type HandlerSlot<U> = Arc<Mutex<ClickHandler<U>>>;

/// Registration-ordered fingerprint-to-handler bindings for one menu.
pub struct ClickRegistry<U> {
    bindings: Vec<(Fingerprint, HandlerSlot<U>)>,
}

impl<U> Default for ClickRegistry<U> {
    fn default() -> Self {
        Self::new()
    }
}

impl<U> ClickRegistry<U> {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self {
            bindings: Vec::new(),
        }
    }

    /// Bind `handler` to content matching `item`.
    ///
    /// Re-registering on an equal fingerprint replaces the old handler,
    /// keeping the position of the first registration. A dispatch already in
    /// flight keeps running the handlers it matched at click time.
    pub fn register(&mut self, item: &MenuItem, handler: ClickHandler<U>) {
        let fingerprint = item.fingerprint();
        let slot = Arc::new(Mutex::new(handler));
        if let Some(binding) = self
            .bindings
            .iter_mut()
            .find(|(existing, _)| *existing == fingerprint)
        {
            binding.1 = slot;
        } else {
            self.bindings.push((fingerprint, slot));
        }
    }

    /// Number of registered bindings.
    pub fn len(&self) -> usize {
        self.bindings.len()
    }

    /// Whether the registry holds no bindings.
    pub fn is_empty(&self) -> bool {
        self.bindings.is_empty()
    }

    /// Snapshot the handlers whose fingerprint matches the clicked content,
    /// in registration order.
    pub fn matching(&self, clicked: &MenuItem) -> Vec<HandlerSlot<U>> {
        let clicked = clicked.fingerprint();
        self.bindings
            .iter()
            .filter(|(fingerprint, _)| *fingerprint == clicked)
            .map(|(_, slot)| slot.clone())
            .collect()
    }

    /// Invoke a snapshot of handlers against one click, in order. Returns
    /// the number of handlers invoked.
    ///
    /// Handler failures are logged and do not stop later matches. Callers
    /// must not hold the owning menu's lock: handlers may re-enter the
    /// engine.
    pub fn invoke_all(handlers: &[HandlerSlot<U>], event: &ClickEvent<U>) -> usize {
        for slot in handlers {
            let mut handler = slot.lock().unwrap_or_else(PoisonError::into_inner);
            if let Err(err) = (*handler)(event) {
                tracing::error!(slot = event.slot, error = %err, "click handler failed");
            }
        }
        handlers.len()
    }

    /// Match and invoke in one step; test and single-threaded convenience.
    pub fn dispatch(&self, event: &ClickEvent<U>) -> usize {
        Self::invoke_all(&self.matching(&event.item), event)
    }
}

impl<U> std::fmt::Debug for ClickRegistry<U> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClickRegistry")
            .field("bindings", &self.bindings.len())
            .finish()
    }
}
