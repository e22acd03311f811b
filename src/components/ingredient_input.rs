//! Ingredient Input Component
//!
//! Name and quantity fields. The commit key sends a create and clears both
//! fields at once, without waiting for the server. The create runs as a
//! detached local task: its outcome reaches the list through the hub, and a
//! failure is logged and shown on the notice bar.

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use tokio::task::{spawn_local, JoinHandle};
use tracing::{debug, warn};

use super::{Component, NoticeBar};
use crate::mco::IngredientMco;
use crate::models::IngredientPatch;

/// Key that commits the fields
pub const COMMIT_KEY: &str = "Enter";

struct InputInner {
    name: RefCell<String>,
    quantity: RefCell<String>,
    mco: IngredientMco,
    notices: NoticeBar,
    mounted: Cell<bool>,
}

#[derive(Clone)]
pub struct IngredientInput(Rc<InputInner>);

impl IngredientInput {
    pub fn new(mco: IngredientMco, notices: NoticeBar) -> Self {
        Self(Rc::new(InputInner {
            name: RefCell::new(String::new()),
            quantity: RefCell::new(String::new()),
            mco,
            notices,
            mounted: Cell::new(false),
        }))
    }

    pub fn set_name(&self, value: &str) {
        *self.0.name.borrow_mut() = value.to_string();
    }

    pub fn set_quantity(&self, value: &str) {
        *self.0.quantity.borrow_mut() = value.to_string();
    }

    pub fn name(&self) -> String {
        self.0.name.borrow().clone()
    }

    pub fn quantity(&self) -> String {
        self.0.quantity.borrow().clone()
    }

    /// Key released in one of the fields.
    ///
    /// On the commit key the fields are read and cleared and the create is
    /// spawned. The handle may be awaited or dropped; dropping it does not
    /// cancel the create.
    pub fn on_key_up(&self, key: &str) -> Option<JoinHandle<()>> {
        if key != COMMIT_KEY {
            return None;
        }

        let patch = IngredientPatch {
            name: Some(self.0.name.take()),
            quantity: Some(self.0.quantity.take()),
        };

        let mco = self.0.mco.clone();
        let notices = self.0.notices.clone();
        Some(spawn_local(async move {
            match mco.create(patch).await {
                Ok(created) => debug!(id = created.id, "ingredient created from input"),
                Err(err) => {
                    warn!(%err, "ingredient create from input failed");
                    notices.error(err.to_string());
                }
            }
        }))
    }
}

impl Component for IngredientInput {
    fn on_mount(&self) {
        self.0.mounted.set(true);
    }

    fn on_unmount(&self) {
        self.0.mounted.set(false);
    }

    fn is_mounted(&self) -> bool {
        self.0.mounted.get()
    }
}
