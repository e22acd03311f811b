//! Ingredient Item Component
//!
//! One row of the list. Holds a frozen snapshot of its ingredient; assigning
//! new data swaps the snapshot and, when mounted, re-tags and relabels the
//! row in place. While mounted it listens for `(Ingredient, update)` and
//! applies payloads whose identity matches its `Ingredient-{id}` marker.
//!
//! The identity marker, the name marker and the check marker live in
//! separate slots: a name is free text and may look like either of the
//! others.

use std::cell::RefCell;
use std::rc::{Rc, Weak};

use tokio::task::{spawn_local, JoinHandle};
use tracing::{debug, warn};

use super::{ClassList, Component, NoticeBar};
use crate::hub::{Action, Subscription};
use crate::mco::IngredientMco;
use crate::models::{Entity, Ingredient, IngredientPatch};

/// Marker class of a checked row
pub const DONE_CLASS: &str = "done";

#[derive(Default)]
struct ItemState {
    data: Option<Rc<Ingredient>>,
    identity: Option<String>,
    names: ClassList,
    flags: ClassList,
    label: String,
    checked: bool,
    mounted: bool,
}

struct ItemInner {
    state: RefCell<ItemState>,
    subscription: RefCell<Option<Subscription>>,
    mco: IngredientMco,
    notices: NoticeBar,
}

#[derive(Clone)]
pub struct IngredientItem(Rc<ItemInner>);

impl IngredientItem {
    pub fn new(mco: IngredientMco, notices: NoticeBar) -> Self {
        Self(Rc::new(ItemInner {
            state: RefCell::new(ItemState::default()),
            subscription: RefCell::new(None),
            mco,
            notices,
        }))
    }

    pub fn data(&self) -> Option<Rc<Ingredient>> {
        self.0.state.borrow().data.clone()
    }

    /// Replace the snapshot; refresh the view if mounted
    pub fn set_data(&self, data: Ingredient) {
        let (old, mounted) = {
            let mut state = self.0.state.borrow_mut();
            let old = state.data.replace(Rc::new(data));
            (old, state.mounted)
        };
        if mounted {
            self.refresh(old.as_deref());
        }
    }

    /// Swap the markers tied to `old` for the current ones and rewrite the
    /// label
    fn refresh(&self, old: Option<&Ingredient>) {
        let mut state = self.0.state.borrow_mut();
        if let Some(old) = old {
            state.names.remove(&old.name);
        }

        if let Some(data) = state.data.clone() {
            state.identity = Some(data.identity_tag());
            state.names.add(&data.name);
            state.label = data.label();
        }
    }

    pub fn label(&self) -> String {
        self.0.state.borrow().label.clone()
    }

    /// Rendered `Ingredient-{id}` marker, set once mounted with data
    pub fn identity(&self) -> Option<String> {
        self.0.state.borrow().identity.clone()
    }

    pub fn has_identity(&self, tag: &str) -> bool {
        self.0.state.borrow().identity.as_deref() == Some(tag)
    }

    /// Every marker in render order: identity, name, state flags
    pub fn classes(&self) -> ClassList {
        let state = self.0.state.borrow();
        let mut classes = ClassList::default();
        if let Some(identity) = &state.identity {
            classes.add(identity);
        }
        for class in state.names.iter().chain(state.flags.iter()) {
            classes.add(class);
        }
        classes
    }

    pub fn has_class(&self, class: &str) -> bool {
        let state = self.0.state.borrow();
        state.identity.as_deref() == Some(class)
            || state.names.contains(class)
            || state.flags.contains(class)
    }

    pub fn is_checked(&self) -> bool {
        self.0.state.borrow().checked
    }

    fn set_checked(&self, checked: bool) {
        let mut state = self.0.state.borrow_mut();
        state.checked = checked;
        state.flags.toggle(DONE_CLASS, checked);
    }

    /// Row as the terminal renderer prints it
    pub fn render_line(&self) -> String {
        let state = self.0.state.borrow();
        let mark = if state.checked { "[x]" } else { "[ ]" };
        match &state.data {
            Some(data) => format!("{} {}  #{}", mark, state.label, data.id),
            None => format!("{} {}", mark, state.label),
        }
    }

    /// Flip the check mark and confirm with the server.
    ///
    /// The mark and the local data change right away; the update carries the
    /// same name and quantity, so the confirming hub event leaves the row
    /// unchanged. If the update fails the mark is reverted and a notice is
    /// posted. Returns `None` when the item has no data yet.
    pub fn toggle_check(&self) -> Option<JoinHandle<()>> {
        let current = self.data()?;
        let checked = !self.is_checked();
        self.set_checked(checked);

        let patch = IngredientPatch::from(current.as_ref());
        self.set_data(current.patched(&patch));

        let mco = self.0.mco.clone();
        let notices = self.0.notices.clone();
        let weak = Rc::downgrade(&self.0);
        Some(spawn_local(async move {
            if let Err(err) = mco.update(current.id, patch).await {
                warn!(id = current.id, %err, "check update failed");
                notices.error(format!("Cannot update {}: {}", current.name, err));
                if let Some(inner) = weak.upgrade() {
                    IngredientItem(inner).set_checked(!checked);
                }
            }
        }))
    }

    /// Ask the server to delete this ingredient. The row stays until the
    /// list is next rebuilt.
    pub fn request_delete(&self) -> Option<JoinHandle<()>> {
        let current = self.data()?;
        let mco = self.0.mco.clone();
        let notices = self.0.notices.clone();
        Some(spawn_local(async move {
            if let Err(err) = mco.delete(current.id).await {
                warn!(id = current.id, %err, "delete failed");
                notices.error(format!("Cannot delete {}: {}", current.name, err));
            }
        }))
    }

    fn on_update(weak: &Weak<ItemInner>, updated: &Ingredient) {
        let Some(inner) = weak.upgrade() else {
            return;
        };
        let item = IngredientItem(inner);
        if item.has_identity(&updated.identity_tag()) {
            debug!(id = updated.id, "item update from hub");
            item.set_data(updated.clone());
        }
    }
}

impl Component for IngredientItem {
    fn on_mount(&self) {
        self.0.state.borrow_mut().mounted = true;

        let weak = Rc::downgrade(&self.0);
        let subscription = self
            .0
            .mco
            .hub()
            .subscribe::<Ingredient, _>(Action::Update, move |updated| {
                IngredientItem::on_update(&weak, updated)
            });
        let previous = self.0.subscription.replace(Some(subscription));
        drop(previous);

        self.refresh(None);
    }

    fn on_unmount(&self) {
        let subscription = self.0.subscription.borrow_mut().take();
        drop(subscription);
        self.0.state.borrow_mut().mounted = false;
    }

    fn is_mounted(&self) -> bool {
        self.0.state.borrow().mounted
    }
}
