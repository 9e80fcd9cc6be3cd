//! The menu model.
//!
//! One concrete [`Menu`] type covers both plain and paginated menus.
//! Required pieces are the name, the grid size, and a content source;
//! everything else (permission, title texture, takable slots, hooks) is an
//! optional capability carried as a field. Click-handler bindings live in a
//! registry owned by the menu itself, so they expire with it.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

use gridmenu_core::{paginate, GridSize, MenuItem, PageRequest};

use crate::event::ClickEvent;
use crate::registry::{ClickHandler, ClickRegistry, HandlerSlot};

/// Unique handle for one menu instance, issued at build time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct MenuId(u64);

static NEXT_MENU_ID: AtomicU64 = AtomicU64::new(1);

/// A menu handle shared between application code and the engine's
/// navigation history.
pub type SharedMenu<U> = Arc<Mutex<Menu<U>>>;

/// Produces the full slot map of a plain menu, called on every render.
pub type ContentProvider = Box<dyn FnMut() -> BTreeMap<usize, MenuItem> + Send>;

/// Produces the ordered content sequence of a paginated menu, called on
/// every render.
pub type ItemsProvider = Box<dyn FnMut() -> Vec<MenuItem> + Send>;

/// The menu's own click hook; runs for every click on the menu, before any
/// registered handler.
pub type ClickHook<U> = Box<dyn FnMut(&ClickEvent<U>) + Send>;

/// The menu's close hook.
pub type CloseHook<U> = Box<dyn FnMut(&U) + Send>;

/// Shared handle to a hook, so the engine can run it without holding the
/// menu lock. Hooks may re-enter the engine (turn pages, open menus).
pub type HookSlot<F> = Arc<Mutex<F>>;

/// Where a menu's cell content comes from.
pub enum MenuContent {
    /// The provider hands back the complete slot map.
    Plain(ContentProvider),
    /// The paginator lays a page of the item sequence into the grid.
    Paginated(Paged),
}

/// Pagination state and inputs for a paginated menu.
pub struct Paged {
    items: ItemsProvider,
    static_slots: Vec<usize>,
    border: Option<MenuItem>,
    buttons: BTreeMap<usize, MenuItem>,
    page: usize,
    number_of_pages: i32,
}

/// A menu a user can open, navigate, and click through.
pub struct Menu<U> {
    id: MenuId,
    name: String,
    size: GridSize,
    texture: Option<String>,
    permission: Option<String>,
    takable_slots: BTreeSet<usize>,
    content: MenuContent,
    registry: ClickRegistry<U>,
    click_hook: Option<HookSlot<ClickHook<U>>>,
    close_hook: Option<HookSlot<CloseHook<U>>>,
}

impl<U> Menu<U> {
    /// Start building a menu with the two required attributes.
    pub fn builder(name: impl Into<String>, size: GridSize) -> MenuBuilder<U> {
        MenuBuilder::new(name.into(), size)
    }

    /// The handle identifying this menu instance.
    pub fn id(&self) -> MenuId {
        self.id
    }

    /// Display name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Grid size.
    pub fn size(&self) -> GridSize {
        self.size
    }

    /// Title shown on the grid: the texture override when set, the name
    /// otherwise.
    pub fn title(&self) -> &str {
        self.texture.as_deref().unwrap_or(&self.name)
    }

    /// Permission required to open this menu, if any.
    pub fn permission(&self) -> Option<&str> {
        self.permission.as_deref()
    }

    /// Whether the user may freely take from / place into this slot.
    pub fn is_takable(&self, slot: usize) -> bool {
        self.takable_slots.contains(&slot)
    }

    /// Bind a click handler to cells holding content similar to `item`.
    pub fn on_item_click(&mut self, item: &MenuItem, handler: ClickHandler<U>) {
        self.registry.register(item, handler);
    }

    /// Compute the slot map for the current render.
    ///
    /// For paginated menus this also recomputes the page count as a side
    /// effect, which is why a render is needed before `is_last_page` means
    /// anything.
    pub fn render(&mut self) -> BTreeMap<usize, MenuItem> {
        match &mut self.content {
            MenuContent::Plain(provider) => provider(),
            MenuContent::Paginated(paged) => {
                let items = (paged.items)();
                let layout = paginate(&PageRequest {
                    size: self.size,
                    static_slots: &paged.static_slots,
                    border: paged.border.as_ref(),
                    items: &items,
                    buttons: &paged.buttons,
                    page: paged.page,
                });
                paged.number_of_pages = layout.number_of_pages;
                layout.slots
            }
        }
    }

    /// Current page index. Always 0 for plain menus.
    pub fn page(&self) -> usize {
        match &self.content {
            MenuContent::Plain(_) => 0,
            MenuContent::Paginated(paged) => paged.page,
        }
    }

    /// Set the current page. No-op for plain menus; not clamped, so gate
    /// advancement on [`Menu::is_last_page`].
    pub fn set_page(&mut self, page: usize) {
        if let MenuContent::Paginated(paged) = &mut self.content {
            paged.page = page;
        }
    }

    /// Index of the last page as of the most recent render; `-1` when there
    /// is no paginated content.
    pub fn number_of_pages(&self) -> i32 {
        match &self.content {
            MenuContent::Plain(_) => -1,
            MenuContent::Paginated(paged) => paged.number_of_pages,
        }
    }

    /// Whether the current page is at or past the last one. True for plain
    /// and empty menus, so "next page" controls gated on this never advance.
    pub fn is_last_page(&self) -> bool {
        self.page() as i32 >= self.number_of_pages()
    }

    pub(crate) fn click_hook_handle(&self) -> Option<HookSlot<ClickHook<U>>> {
        self.click_hook.clone()
    }

    pub(crate) fn close_hook_handle(&self) -> Option<HookSlot<CloseHook<U>>> {
        self.close_hook.clone()
    }

    pub(crate) fn matching_handlers(&self, clicked: &MenuItem) -> Vec<HandlerSlot<U>> {
        self.registry.matching(clicked)
    }
}

impl<U> std::fmt::Debug for Menu<U> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Menu")
            .field("id", &self.id)
            .field("name", &self.name)
            .field("size", &self.size)
            .field("bindings", &self.registry.len())
            .finish()
    }
}

/// Assembles a [`Menu`]; see [`Menu::builder`].
pub struct MenuBuilder<U> {
    name: String,
    size: GridSize,
    texture: Option<String>,
    permission: Option<String>,
    takable_slots: BTreeSet<usize>,
    plain_provider: Option<ContentProvider>,
    items_provider: Option<ItemsProvider>,
    static_slots: Vec<usize>,
    border: Option<MenuItem>,
    buttons: BTreeMap<usize, MenuItem>,
    click_hook: Option<ClickHook<U>>,
    close_hook: Option<CloseHook<U>>,
    handlers: Vec<(MenuItem, ClickHandler<U>)>,
}

impl<U> MenuBuilder<U> {
    fn new(name: String, size: GridSize) -> Self {
        Self {
            name,
            size,
            texture: None,
            permission: None,
            takable_slots: BTreeSet::new(),
            plain_provider: None,
            items_provider: None,
            static_slots: Vec::new(),
            border: None,
            buttons: BTreeMap::new(),
            click_hook: None,
            close_hook: None,
            handlers: Vec::new(),
        }
    }

    /// Override the grid title without changing the menu's name.
    pub fn texture(mut self, texture: impl Into<String>) -> Self {
        self.texture = Some(texture.into());
        self
    }

    /// Require a permission to open the menu.
    pub fn permission(mut self, permission: impl Into<String>) -> Self {
        self.permission = Some(permission.into());
        self
    }

    /// Allow free item placement/removal on these slots.
    pub fn takable_slots(mut self, slots: impl IntoIterator<Item = usize>) -> Self {
        self.takable_slots.extend(slots);
        self
    }

    /// Supply the complete slot map of a plain menu.
    pub fn content<F>(mut self, provider: F) -> Self
    where
        F: FnMut() -> BTreeMap<usize, MenuItem> + Send + 'static,
    {
        self.plain_provider = Some(Box::new(provider));
        self
    }

    /// Supply the ordered item sequence of a paginated menu. Setting this
    /// makes the menu paginated; a plain content provider is then ignored.
    pub fn items<F>(mut self, provider: F) -> Self
    where
        F: FnMut() -> Vec<MenuItem> + Send + 'static,
    {
        self.items_provider = Some(Box::new(provider));
        self
    }

    /// Reserve slots for border and buttons (paginated menus).
    pub fn static_slots(mut self, slots: impl IntoIterator<Item = usize>) -> Self {
        self.static_slots.extend(slots);
        self
    }

    /// Filler written to every static slot (paginated menus).
    pub fn border(mut self, border: MenuItem) -> Self {
        self.border = Some(border);
        self
    }

    /// Place a button on a static slot (paginated menus). Buttons bound to
    /// non-static slots are dropped at render time.
    pub fn button(mut self, slot: usize, button: MenuItem) -> Self {
        self.buttons.insert(slot, button);
        self
    }

    /// The menu's own click hook, run for every click before any registered
    /// handler.
    pub fn on_click<F>(mut self, hook: F) -> Self
    where
        F: FnMut(&ClickEvent<U>) + Send + 'static,
    {
        self.click_hook = Some(Box::new(hook));
        self
    }

    /// The menu's close hook.
    pub fn on_close<F>(mut self, hook: F) -> Self
    where
        F: FnMut(&U) + Send + 'static,
    {
        self.close_hook = Some(Box::new(hook));
        self
    }

    /// Bind a click handler to cells holding content similar to `item`.
    pub fn handler<F>(mut self, item: MenuItem, handler: F) -> Self
    where
        F: FnMut(&ClickEvent<U>) -> anyhow::Result<()> + Send + 'static,
    {
        self.handlers.push((item, Box::new(handler)));
        self
    }

    /// Build the menu and wrap it in its shared handle.
    pub fn build(self) -> SharedMenu<U> {
        let content = if let Some(items) = self.items_provider {
            MenuContent::Paginated(Paged {
                items,
                static_slots: self.static_slots,
                border: self.border,
                buttons: self.buttons,
                page: 0,
                number_of_pages: -1,
            })
        } else {
            MenuContent::Plain(
                self.plain_provider
                    .unwrap_or_else(|| Box::new(BTreeMap::new)),
            )
        };

        let mut registry = ClickRegistry::new();
        for (item, handler) in self.handlers {
            registry.register(&item, handler);
        }

        Arc::new(Mutex::new(Menu {
            id: MenuId(NEXT_MENU_ID.fetch_add(1, Ordering::Relaxed)),
            name: self.name,
            size: self.size,
            texture: self.texture,
            permission: self.permission,
            takable_slots: self.takable_slots,
            content,
            registry,
            click_hook: self.click_hook.map(|hook| Arc::new(Mutex::new(hook))),
            close_hook: self.close_hook.map(|hook| Arc::new(Mutex::new(hook))),
        }))
    }
}
