//! Ingredient List Component
//!
//! Fetches the collection on mount and renders one item per ingredient.
//! A `(Ingredient, create)` event triggers a full refetch; updates are left
//! to the items themselves and deletes are not mirrored until the next
//! refetch.

use std::cell::{Cell, RefCell};
use std::rc::{Rc, Weak};

use tokio::task::{spawn_local, JoinHandle};
use tracing::{debug, warn};

use super::{Component, IngredientItem, Mounted, NoticeBar};
use crate::error::Result;
use crate::hub::{Action, Subscription};
use crate::mco::IngredientMco;
use crate::models::{identity_tag, Ingredient};

struct ListInner {
    mco: IngredientMco,
    notices: NoticeBar,
    children: RefCell<Vec<Mounted<IngredientItem>>>,
    subscription: RefCell<Option<Subscription>>,
    /// Background refetches not yet awaited by `idle`
    pending: RefCell<Vec<JoinHandle<()>>>,
    mounted: Cell<bool>,
    /// Generation of the most recently issued refetch
    issued: Cell<u64>,
    /// Generation whose result is currently rendered
    applied: Cell<u64>,
}

#[derive(Clone)]
pub struct IngredientList(Rc<ListInner>);

impl IngredientList {
    pub fn new(mco: IngredientMco, notices: NoticeBar) -> Self {
        Self(Rc::new(ListInner {
            mco,
            notices,
            children: RefCell::new(Vec::new()),
            subscription: RefCell::new(None),
            pending: RefCell::new(Vec::new()),
            mounted: Cell::new(false),
            issued: Cell::new(0),
            applied: Cell::new(0),
        }))
    }

    /// Refetch the collection and replace every child in one swap.
    ///
    /// A fetch that completes after a newer one was already rendered is
    /// dropped. On error the current children stay as they are. Ignored
    /// while unmounted.
    pub async fn refresh(&self) -> Result<()> {
        let generation = self.0.issued.get() + 1;
        self.0.issued.set(generation);

        let ingredients = self.0.mco.list().await?;

        if !self.0.mounted.get() {
            debug!(generation, "list unmounted, refetch dropped");
            return Ok(());
        }
        if generation < self.0.applied.get() {
            debug!(generation, applied = self.0.applied.get(), "stale refetch dropped");
            return Ok(());
        }
        self.0.applied.set(generation);

        let children: Vec<Mounted<IngredientItem>> = ingredients
            .into_iter()
            .map(|ingredient| self.build_item(ingredient))
            .collect();
        debug!(generation, count = children.len(), "list rendered");

        // Previous items unmount when dropped, after the swap
        let previous = self.0.children.replace(children);
        drop(previous);
        Ok(())
    }

    fn build_item(&self, ingredient: Ingredient) -> Mounted<IngredientItem> {
        let item = IngredientItem::new(self.0.mco.clone(), self.0.notices.clone());
        item.set_data(ingredient);
        Mounted::mount(item)
    }

    /// Refetch in the background; failures are logged and noticed.
    ///
    /// Finished refetches are dropped from the tracked set on each spawn.
    pub fn spawn_refresh(&self) {
        let weak = Rc::downgrade(&self.0);
        let handle = spawn_local(async move {
            let Some(inner) = weak.upgrade() else {
                return;
            };
            let list = IngredientList(inner);
            if let Err(err) = list.refresh().await {
                warn!(%err, "ingredient list refresh failed");
                list.0.notices.error(format!("Cannot load ingredients: {}", err));
            }
        });
        let mut pending = self.0.pending.borrow_mut();
        pending.retain(|handle| !handle.is_finished());
        pending.push(handle);
    }

    /// Background refetches tracked for `idle`, finished or not
    pub fn pending_count(&self) -> usize {
        self.0.pending.borrow().len()
    }

    /// Wait until every background refetch spawned so far has finished,
    /// including ones spawned while waiting
    pub async fn idle(&self) {
        loop {
            let handles: Vec<JoinHandle<()>> = self.0.pending.borrow_mut().drain(..).collect();
            if handles.is_empty() {
                return;
            }
            for handle in handles {
                if let Err(err) = handle.await {
                    warn!(%err, "ingredient list refresh task aborted");
                }
            }
        }
    }

    fn on_create(weak: &Weak<ListInner>, created: &Ingredient) {
        if let Some(inner) = weak.upgrade() {
            debug!(id = created.id, "ingredient created, refetching list");
            IngredientList(inner).spawn_refresh();
        }
    }

    /// Handles of the current children, in render order
    pub fn children(&self) -> Vec<IngredientItem> {
        self.0
            .children
            .borrow()
            .iter()
            .map(|child| child.component().clone())
            .collect()
    }

    pub fn child_count(&self) -> usize {
        self.0.children.borrow().len()
    }

    pub fn labels(&self) -> Vec<String> {
        self.0.children.borrow().iter().map(|child| child.label()).collect()
    }

    /// Child carrying the `Ingredient-{id}` marker
    pub fn find(&self, id: i64) -> Option<IngredientItem> {
        let tag = identity_tag::<Ingredient>(id);
        self.0
            .children
            .borrow()
            .iter()
            .find(|child| child.has_identity(&tag))
            .map(|child| child.component().clone())
    }
}

impl Component for IngredientList {
    fn on_mount(&self) {
        self.0.mounted.set(true);

        let weak = Rc::downgrade(&self.0);
        let subscription = self
            .0
            .mco
            .hub()
            .subscribe::<Ingredient, _>(Action::Create, move |created| {
                IngredientList::on_create(&weak, created)
            });
        let previous = self.0.subscription.replace(Some(subscription));
        drop(previous);

        self.spawn_refresh();
    }

    fn on_unmount(&self) {
        let subscription = self.0.subscription.borrow_mut().take();
        drop(subscription);
        self.0.mounted.set(false);

        let children = self.0.children.take();
        drop(children);
    }

    fn is_mounted(&self) -> bool {
        self.0.mounted.get()
    }
}
