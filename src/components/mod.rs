//! UI Components
//!
//! Framework-neutral components: each keeps the small piece of view state a
//! renderer needs (marker classes, a label) and reacts to hub events. Async
//! work is spawned with `tokio::task::spawn_local`, so components must be
//! driven from inside a `tokio::task::LocalSet`.

mod class_list;
mod ingredient_input;
mod ingredient_item;
mod ingredient_list;
mod ingredient_mvc;
mod notice_bar;

#[cfg(test)]
mod tests;

use std::ops::Deref;

pub use class_list::ClassList;
pub use ingredient_input::{IngredientInput, COMMIT_KEY};
pub use ingredient_item::{IngredientItem, DONE_CLASS};
pub use ingredient_list::IngredientList;
pub use ingredient_mvc::{IngredientMvc, HEADING};
pub use notice_bar::{Notice, NoticeBar, NoticeLevel};

/// Mount/unmount hooks driven by the hosting renderer
pub trait Component {
    /// Attached to the view: acquire subscriptions, render
    fn on_mount(&self);

    /// Detached from the view: release everything acquired in `on_mount`
    fn on_unmount(&self);

    fn is_mounted(&self) -> bool;
}

/// A mounted component; dropping the guard unmounts it
pub struct Mounted<C: Component>(C);

impl<C: Component> Mounted<C> {
    pub fn mount(component: C) -> Self {
        component.on_mount();
        Self(component)
    }

    pub fn component(&self) -> &C {
        &self.0
    }
}

impl<C: Component> Deref for Mounted<C> {
    type Target = C;

    fn deref(&self) -> &C {
        &self.0
    }
}

impl<C: Component> Drop for Mounted<C> {
    fn drop(&mut self) {
        if self.0.is_mounted() {
            self.0.on_unmount();
        }
    }
}
