//! Ingredient View
//!
//! Top-level component: heading, input, list and notice bar.

use std::cell::Cell;
use std::fmt::Write;

use super::{Component, IngredientInput, IngredientList, NoticeBar};
use crate::mco::IngredientMco;

pub const HEADING: &str = "ingredients";

pub struct IngredientMvc {
    input: IngredientInput,
    list: IngredientList,
    notices: NoticeBar,
    mounted: Cell<bool>,
}

impl IngredientMvc {
    pub fn new(mco: IngredientMco, notices: NoticeBar) -> Self {
        Self {
            input: IngredientInput::new(mco.clone(), notices.clone()),
            list: IngredientList::new(mco, notices.clone()),
            notices,
            mounted: Cell::new(false),
        }
    }

    pub fn input(&self) -> &IngredientInput {
        &self.input
    }

    pub fn list(&self) -> &IngredientList {
        &self.list
    }

    pub fn notices(&self) -> &NoticeBar {
        &self.notices
    }

    /// Plain-text rendering of the whole view
    pub fn render(&self) -> String {
        let mut out = String::new();
        let _ = writeln!(out, "== {} ==", HEADING);

        let children = self.list.children();
        if children.is_empty() {
            let _ = writeln!(out, "  (no ingredients)");
        }
        for child in children {
            let _ = writeln!(out, "  {}", child.render_line());
        }

        for notice in self.notices.notices() {
            let _ = writeln!(out, "! {}", notice);
        }
        out
    }
}

impl Component for IngredientMvc {
    fn on_mount(&self) {
        self.mounted.set(true);
        self.input.on_mount();
        self.list.on_mount();
    }

    fn on_unmount(&self) {
        self.list.on_unmount();
        self.input.on_unmount();
        self.mounted.set(false);
    }

    fn is_mounted(&self) -> bool {
        self.mounted.get()
    }
}
