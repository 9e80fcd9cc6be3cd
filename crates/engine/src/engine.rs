//! The open/click/close state machine.
//!
//! All state is partitioned by user: every user has one session holding their
//! navigation history, the id of the menu whose grid they are viewing, and
//! the slot map of the last render. Each step of an engine operation that
//! reads or writes a session locks it, so state transitions on one user are
//! serialized step by step while different users proceed in parallel.
//!
//! User hooks and click handlers run with no engine lock held, so they may
//! re-enter the engine (turn a page and reopen, open a submenu) freely. The
//! session lock is therefore released before dispatch and retaken afterwards;
//! a click is not one atomic session transaction.

use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use gridmenu_core::{GridSize, MenuItem};

use crate::error::MenuError;
use crate::event::{ClickDecision, ClickEvent};
use crate::history::History;
use crate::host::Host;
use crate::menu::{ClickHook, HookSlot, MenuId, SharedMenu};
use crate::registry::ClickRegistry;

/// Message sent to a user who opens a menu without its required permission.
pub const NO_PERMISSION_MESSAGE: &str = "You don't have permission to open this menu.";

/// How an `open` call ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OpenOutcome {
    /// The menu was rendered and handed to the host.
    Opened,
    /// The user lacks the menu's required permission; a message was sent and
    /// nothing changed.
    PermissionDenied,
}

/// How a `refresh_cell` call ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefreshOutcome {
    /// The displayed cell was rewritten.
    Updated,
    /// The user is not viewing a managed grid; nothing was written.
    NotViewing,
}

/// Proof of a close in flight; redeem it with [`MenuEngine::finish_close`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[must_use = "pass the token to finish_close after the host settles"]
pub struct CloseToken(u64);

struct Session<U> {
    history: History<U>,
    viewing: Option<MenuId>,
    rendered: BTreeMap<usize, MenuItem>,
    next_close_token: u64,
    pending_close: Option<u64>,
}

impl<U> Default for Session<U> {
    fn default() -> Self {
        Self {
            history: History::new(),
            viewing: None,
            rendered: BTreeMap::new(),
            next_close_token: 0,
            pending_close: None,
        }
    }
}

type SharedSession<U> = Arc<Mutex<Session<U>>>;

/// The menu navigation and dispatch engine.
pub struct MenuEngine<H: Host> {
    host: H,
    sessions: Mutex<HashMap<H::User, SharedSession<H::User>>>,
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    // A panicking user hook must not wedge the session forever.
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

impl<H: Host> MenuEngine<H> {
    /// Create an engine driving the given host.
    pub fn new(host: H) -> Self {
        Self {
            host,
            sessions: Mutex::new(HashMap::new()),
        }
    }

    /// The host this engine drives.
    pub fn host(&self) -> &H {
        &self.host
    }

    /// Open `menu` for `user`: permission gate, history push, render, and
    /// handoff to the host.
    ///
    /// A denied permission is recovered here (message sent, state unchanged)
    /// and reported as [`OpenOutcome::PermissionDenied`]. A render or
    /// handoff failure closes the user's display and surfaces as
    /// [`MenuError::Render`]; re-opening is up to the caller.
    pub fn open(
        &self,
        user: &H::User,
        menu: &SharedMenu<H::User>,
    ) -> Result<OpenOutcome, MenuError> {
        let session = self.session(user);
        let mut session = lock(&session);
        let mut state = lock(menu);

        if let Some(permission) = state.permission() {
            if !self.host.has_permission(user, permission) {
                self.host.send_message(user, NO_PERMISSION_MESSAGE);
                return Ok(OpenOutcome::PermissionDenied);
            }
        }

        // An open between close and finish_close is a navigation transition,
        // not an exit: keep the history.
        session.pending_close = None;

        let pushed = session.history.push(menu.clone());

        let slots = state.render();
        match self.hand_to_host(user, state.title(), state.size(), &slots) {
            Ok(()) => {
                session.viewing = Some(state.id());
                session.rendered = slots;
                Ok(OpenOutcome::Opened)
            }
            Err(source) => {
                // The menu never reached the user: it must not stay in the
                // history for back navigation to land on.
                if pushed {
                    session.history.pop_current();
                }
                session.viewing = None;
                session.rendered = BTreeMap::new();
                self.host.close(user);
                tracing::error!(
                    menu = state.name(),
                    error = %source,
                    "menu render failed; display closed"
                );
                Err(MenuError::Render {
                    name: state.name().to_string(),
                    source,
                })
            }
        }
    }

    fn hand_to_host(
        &self,
        user: &H::User,
        title: &str,
        size: GridSize,
        slots: &BTreeMap<usize, MenuItem>,
    ) -> anyhow::Result<()> {
        let mut grid = self.host.create_grid(title, size)?;
        for (&slot, item) in slots {
            self.host.set_cell(&mut grid, slot, item);
        }
        self.host.show(grid, user)
    }

    /// Route one click on a managed grid.
    ///
    /// The menu's own click hook always runs first. A back control then
    /// short-circuits into reopening the previous history entry; any other
    /// content goes through the menu's click registry. The returned decision
    /// tells the host adapter whether to cancel its default slot mutation.
    pub fn on_click(&self, event: &ClickEvent<H::User>) -> ClickDecision {
        let Some(session_arc) = self.existing_session(&event.user) else {
            return ClickDecision::PassThrough;
        };
        let session = lock(&session_arc);
        let Some(menu_arc) = session.history.current().cloned() else {
            return ClickDecision::PassThrough;
        };

        let (takable, is_back, click_hook, handlers) = {
            let state = lock(&menu_arc);
            if session.viewing != Some(state.id()) {
                return ClickDecision::PassThrough;
            }
            // The render cache is authoritative for the back flag; the
            // host-reported item is the fallback.
            let is_back = session
                .rendered
                .get(&event.slot)
                .map_or(event.item.back_button, |cell| cell.back_button);
            (
                state.is_takable(event.slot),
                is_back,
                state.click_hook_handle(),
                state.matching_handlers(&event.item),
            )
        };

        if takable {
            return ClickDecision::PassThrough;
        }

        // The menu's own hook runs for every consumed click, before any
        // back handling or registered handler, and with no lock held.
        drop(session);
        self.run_click_hook(click_hook, event);

        if is_back {
            let previous = {
                let mut session = lock(&session_arc);
                session.history.pop_to_previous()
            };
            if let Some(previous) = previous {
                if let Err(err) = self.open(&event.user, &previous) {
                    tracing::error!(error = %err, "failed to reopen previous menu");
                }
                return ClickDecision::ReopenedPrevious;
            }
            // Back control with nowhere to go: swallow the click.
            return ClickDecision::Consumed;
        }

        ClickRegistry::invoke_all(&handlers, event);
        ClickDecision::Consumed
    }

    fn run_click_hook(
        &self,
        hook: Option<HookSlot<ClickHook<H::User>>>,
        event: &ClickEvent<H::User>,
    ) {
        if let Some(hook) = hook {
            let mut hook = lock(&hook);
            (*hook)(event);
        }
    }

    /// Return the user to the previous menu in their history, if any.
    ///
    /// Same path as a clicked back control. Returns `true` when a previous
    /// menu existed and a reopen was attempted.
    pub fn back(&self, user: &H::User) -> Result<bool, MenuError> {
        let Some(session_arc) = self.existing_session(user) else {
            return Ok(false);
        };
        let previous = {
            let mut session = lock(&session_arc);
            session.history.pop_to_previous()
        };
        match previous {
            Some(previous) => self.open(user, &previous).map(|_| true),
            None => Ok(false),
        }
    }

    /// Handle the user's display closing: run the menu's close hook and
    /// start the exit debounce.
    ///
    /// The returned token must be redeemed with [`MenuEngine::finish_close`]
    /// strictly after the synchronous close handling (and any synchronous
    /// re-open) has settled; only then is the history actually cleared.
    pub fn on_close(&self, user: &H::User) -> Option<CloseToken> {
        let session_arc = self.existing_session(user)?;
        let (close_hook, token) = {
            let mut session = lock(&session_arc);
            session.viewing?;
            let close_hook = session
                .history
                .current()
                .map(|menu| lock(menu).close_hook_handle());
            session.viewing = None;
            session.rendered = BTreeMap::new();
            let token = session.next_close_token;
            session.next_close_token += 1;
            session.pending_close = Some(token);
            (close_hook.flatten(), token)
        };

        if let Some(hook) = close_hook {
            let mut hook = lock(&hook);
            (*hook)(user);
        }
        Some(CloseToken(token))
    }

    /// Finish a close: clear the user's history unless a new menu was opened
    /// for them since [`MenuEngine::on_close`] issued the token.
    pub fn finish_close(&self, user: &H::User, token: CloseToken) {
        let Some(session_arc) = self.existing_session(user) else {
            return;
        };
        let mut session = lock(&session_arc);
        if session.pending_close == Some(token.0) {
            session.pending_close = None;
            session.history.clear();
        }
    }

    /// Rewrite one cell of the grid the user is currently viewing, on behalf
    /// of `menu`.
    ///
    /// Lets application code refresh a live cell (a countdown, a toggle)
    /// without a full reopen. Does nothing when the user is no longer
    /// viewing a managed grid, or is viewing a different menu than the one
    /// the refresh was scheduled for.
    pub fn refresh_cell(
        &self,
        user: &H::User,
        menu: &SharedMenu<H::User>,
        slot: usize,
        item: MenuItem,
    ) -> Result<RefreshOutcome, MenuError> {
        let Some(session_arc) = self.existing_session(user) else {
            return Ok(RefreshOutcome::NotViewing);
        };
        let mut session = lock(&session_arc);
        if session.viewing != Some(lock(menu).id()) {
            return Ok(RefreshOutcome::NotViewing);
        }
        if let Err(source) = self.host.update_shown_cell(user, slot, &item) {
            self.host.close(user);
            session.viewing = None;
            session.rendered = BTreeMap::new();
            let name = session
                .history
                .current()
                .map(|menu| lock(menu).name().to_string())
                .unwrap_or_default();
            tracing::error!(slot, error = %source, "cell refresh failed; display closed");
            return Err(MenuError::Render { name, source });
        }
        session.rendered.insert(slot, item);
        Ok(RefreshOutcome::Updated)
    }

    /// The menu currently at the top of the user's history, if any.
    pub fn current_menu(&self, user: &H::User) -> Option<SharedMenu<H::User>> {
        let session_arc = self.existing_session(user)?;
        let session = lock(&session_arc);
        session.history.current().cloned()
    }

    /// Whether a back control has somewhere to go for this user.
    pub fn has_previous(&self, user: &H::User) -> bool {
        self.existing_session(user)
            .is_some_and(|session| lock(&session).history.has_previous())
    }

    fn session(&self, user: &H::User) -> SharedSession<H::User> {
        let mut sessions = lock(&self.sessions);
        sessions.entry(user.clone()).or_default().clone()
    }

    fn existing_session(&self, user: &H::User) -> Option<SharedSession<H::User>> {
        lock(&self.sessions).get(user).cloned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::menu::Menu;
    use gridmenu_core::ItemKey;
    use std::collections::HashSet;
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

    fn item(name: &str) -> MenuItem {
        MenuItem::new(ItemKey::parse("menu:paper").unwrap()).with_name(name)
    }

    /// In-memory host: grids are slot maps, "showing" stores the grid under
    /// the user key.
    #[derive(Default)]
    struct TestHost {
        permissions: Mutex<HashSet<(u32, String)>>,
        shown: Mutex<HashMap<u32, (String, BTreeMap<usize, MenuItem>)>>,
        messages: Mutex<Vec<(u32, String)>>,
        closes: AtomicUsize,
        fail_create: AtomicBool,
    }

    impl TestHost {
        fn grant(&self, user: u32, permission: &str) {
            lock(&self.permissions).insert((user, permission.to_string()));
        }

        fn shown_title(&self, user: u32) -> Option<String> {
            lock(&self.shown).get(&user).map(|(title, _)| title.clone())
        }

        fn shown_cell(&self, user: u32, slot: usize) -> Option<MenuItem> {
            lock(&self.shown)
                .get(&user)
                .and_then(|(_, cells)| cells.get(&slot).cloned())
        }
    }

    impl Host for TestHost {
        type User = u32;
        type Grid = (String, BTreeMap<usize, MenuItem>);

        fn create_grid(&self, title: &str, _size: GridSize) -> anyhow::Result<Self::Grid> {
            if self.fail_create.load(Ordering::SeqCst) {
                anyhow::bail!("grid allocation refused");
            }
            Ok((title.to_string(), BTreeMap::new()))
        }

        fn set_cell(&self, grid: &mut Self::Grid, slot: usize, item: &MenuItem) {
            grid.1.insert(slot, item.clone());
        }

        fn show(&self, grid: Self::Grid, user: &u32) -> anyhow::Result<()> {
            lock(&self.shown).insert(*user, grid);
            Ok(())
        }

        fn update_shown_cell(&self, user: &u32, slot: usize, item: &MenuItem) -> anyhow::Result<()> {
            let mut shown = lock(&self.shown);
            let grid = shown
                .get_mut(user)
                .ok_or_else(|| anyhow::anyhow!("nothing shown"))?;
            grid.1.insert(slot, item.clone());
            Ok(())
        }

        fn close(&self, user: &u32) {
            self.closes.fetch_add(1, Ordering::SeqCst);
            lock(&self.shown).remove(user);
        }

        fn has_permission(&self, user: &u32, permission: &str) -> bool {
            lock(&self.permissions).contains(&(*user, permission.to_string()))
        }

        fn send_message(&self, user: &u32, message: &str) {
            lock(&self.messages).push((*user, message.to_string()));
        }
    }

    #[test]
    fn open_renders_and_shows() {
        let engine = MenuEngine::new(TestHost::default());
        let menu = Menu::builder("warps", GridSize::Smallest)
            .items(|| (0..3).map(|i| item(&format!("warp {i}"))).collect())
            .build();

        let outcome = engine.open(&7, &menu).unwrap();
        assert_eq!(outcome, OpenOutcome::Opened);
        assert_eq!(engine.host().shown_title(7).as_deref(), Some("warps"));
        assert_eq!(
            engine.host().shown_cell(7, 0).unwrap().name.as_deref(),
            Some("warp 0")
        );
        assert!(Arc::ptr_eq(&engine.current_menu(&7).unwrap(), &menu));
    }

    #[test]
    fn permission_gate_aborts_without_state_change() {
        let engine = MenuEngine::new(TestHost::default());
        let menu = Menu::builder("admin", GridSize::Smallest)
            .permission("menus.admin")
            .build();

        let outcome = engine.open(&7, &menu).unwrap();
        assert_eq!(outcome, OpenOutcome::PermissionDenied);
        assert!(engine.current_menu(&7).is_none());
        assert!(engine.host().shown_title(7).is_none());
        assert_eq!(
            lock(&engine.host().messages).as_slice(),
            &[(7, NO_PERMISSION_MESSAGE.to_string())]
        );

        engine.host().grant(7, "menus.admin");
        assert_eq!(engine.open(&7, &menu).unwrap(), OpenOutcome::Opened);
    }

    #[test]
    fn render_failure_closes_the_display() {
        let engine = MenuEngine::new(TestHost::default());
        let menu = Menu::builder("broken", GridSize::Smallest).build();

        engine.host().fail_create.store(true, Ordering::SeqCst);
        let err = engine.open(&7, &menu).unwrap_err();
        assert!(matches!(err, MenuError::Render { .. }));
        assert_eq!(engine.host().closes.load(Ordering::SeqCst), 1);
        assert!(engine.host().shown_title(7).is_none());
        // The menu never reached the user and must not linger on the stack.
        assert!(engine.current_menu(&7).is_none());
    }

    #[test]
    fn failed_open_does_not_become_a_back_target() {
        let engine = MenuEngine::new(TestHost::default());
        let root = Menu::builder("root", GridSize::Smallest).build();
        let broken = Menu::builder("broken", GridSize::Smallest).build();
        engine.open(&7, &root).unwrap();

        engine.host().fail_create.store(true, Ordering::SeqCst);
        assert!(engine.open(&7, &broken).is_err());
        engine.host().fail_create.store(false, Ordering::SeqCst);

        // The root stays current; there is nothing for back to skip over.
        assert!(Arc::ptr_eq(&engine.current_menu(&7).unwrap(), &root));
        assert!(!engine.has_previous(&7));
    }

    #[test]
    fn unknown_user_click_passes_through() {
        let engine = MenuEngine::new(TestHost::default());
        let event = ClickEvent {
            user: 99,
            slot: 0,
            item: item("anything"),
        };
        assert_eq!(engine.on_click(&event), ClickDecision::PassThrough);
    }

    #[test]
    fn takable_slot_passes_through() {
        let engine = MenuEngine::new(TestHost::default());
        let menu = Menu::builder("trade", GridSize::Smallest)
            .takable_slots([4])
            .build();
        engine.open(&7, &menu).unwrap();

        let event = ClickEvent {
            user: 7,
            slot: 4,
            item: item("offer"),
        };
        assert_eq!(engine.on_click(&event), ClickDecision::PassThrough);
    }

    #[test]
    fn own_hook_runs_before_registered_handler() {
        let order = Arc::new(Mutex::new(Vec::new()));
        let entry = item("Entry").with_item_id("entry");

        let hook_order = order.clone();
        let handler_order = order.clone();
        let menu = Menu::builder("list", GridSize::Smallest)
            .on_click(move |_| lock(&hook_order).push("hook"))
            .handler(entry.clone(), move |_| {
                lock(&handler_order).push("handler");
                Ok(())
            })
            .build();

        let engine = MenuEngine::new(TestHost::default());
        engine.open(&7, &menu).unwrap();
        let decision = engine.on_click(&ClickEvent {
            user: 7,
            slot: 2,
            item: entry,
        });

        assert_eq!(decision, ClickDecision::Consumed);
        assert_eq!(lock(&order).as_slice(), &["hook", "handler"]);
    }

    #[test]
    fn back_with_no_history_is_a_safe_no_op() {
        let engine = MenuEngine::new(TestHost::default());
        let menu = Menu::builder("root", GridSize::Smallest).build();
        engine.open(&7, &menu).unwrap();

        let decision = engine.on_click(&ClickEvent {
            user: 7,
            slot: 0,
            item: item("Back").as_back_button(),
        });
        assert_eq!(decision, ClickDecision::Consumed);
        assert!(Arc::ptr_eq(&engine.current_menu(&7).unwrap(), &menu));
        assert!(!engine.back(&7).unwrap());
    }

    #[test]
    fn close_then_finish_clears_history() {
        let engine = MenuEngine::new(TestHost::default());
        let menu = Menu::builder("root", GridSize::Smallest).build();
        engine.open(&7, &menu).unwrap();

        let token = engine.on_close(&7).unwrap();
        engine.finish_close(&7, token);
        assert!(engine.current_menu(&7).is_none());
    }

    #[test]
    fn reopen_between_close_and_finish_keeps_history() {
        let engine = MenuEngine::new(TestHost::default());
        let root = Menu::builder("root", GridSize::Smallest).build();
        let child = Menu::builder("child", GridSize::Smallest).build();
        engine.open(&7, &root).unwrap();

        // The host swaps containers: close fires, then the new open, then
        // the deferred check.
        let token = engine.on_close(&7).unwrap();
        engine.open(&7, &child).unwrap();
        engine.finish_close(&7, token);

        assert!(Arc::ptr_eq(&engine.current_menu(&7).unwrap(), &child));
        assert!(engine.has_previous(&7));
    }

    #[test]
    fn close_hook_fires_once_per_close() {
        let closes = Arc::new(AtomicUsize::new(0));
        let counter = closes.clone();
        let menu = Menu::builder("root", GridSize::Smallest)
            .on_close(move |_user: &u32| {
                counter.fetch_add(1, Ordering::SeqCst);
            })
            .build();

        let engine = MenuEngine::new(TestHost::default());
        engine.open(&7, &menu).unwrap();
        let token = engine.on_close(&7).unwrap();
        assert_eq!(closes.load(Ordering::SeqCst), 1);

        // A second close without a menu open yields no token and no hook.
        assert!(engine.on_close(&7).is_none());
        assert_eq!(closes.load(Ordering::SeqCst), 1);
        engine.finish_close(&7, token);
    }

    #[test]
    fn refresh_cell_updates_only_while_viewing() {
        let engine = MenuEngine::new(TestHost::default());
        let menu = Menu::builder("status", GridSize::Smallest).build();
        engine.open(&7, &menu).unwrap();

        let outcome = engine.refresh_cell(&7, &menu, 3, item("tick 42")).unwrap();
        assert_eq!(outcome, RefreshOutcome::Updated);
        assert_eq!(
            engine.host().shown_cell(7, 3).unwrap().name.as_deref(),
            Some("tick 42")
        );

        let token = engine.on_close(&7).unwrap();
        engine.finish_close(&7, token);
        let outcome = engine.refresh_cell(&7, &menu, 3, item("tick 43")).unwrap();
        assert_eq!(outcome, RefreshOutcome::NotViewing);
    }

    #[test]
    fn stale_refresh_for_a_superseded_menu_is_rejected() {
        let engine = MenuEngine::new(TestHost::default());
        let countdown = Menu::builder("countdown", GridSize::Smallest).build();
        let shop = Menu::builder("shop", GridSize::Smallest)
            .content(|| BTreeMap::from([(3, item("shop entry"))]))
            .build();

        engine.open(&7, &countdown).unwrap();
        engine.open(&7, &shop).unwrap();

        // A refresher scheduled while the countdown was up fires late: the
        // shop's grid must not be touched.
        let outcome = engine
            .refresh_cell(&7, &countdown, 3, item("countdown 9"))
            .unwrap();
        assert_eq!(outcome, RefreshOutcome::NotViewing);
        assert_eq!(
            engine.host().shown_cell(7, 3).unwrap().name.as_deref(),
            Some("shop entry")
        );

        // The same call addressed to the displayed menu goes through.
        let outcome = engine.refresh_cell(&7, &shop, 3, item("sold out")).unwrap();
        assert_eq!(outcome, RefreshOutcome::Updated);
        assert_eq!(
            engine.host().shown_cell(7, 3).unwrap().name.as_deref(),
            Some("sold out")
        );
    }
}
