//! Application Context
//!
//! Shared handles the view is built from.

use std::rc::Rc;

use crate::components::{IngredientMvc, NoticeBar};
use crate::config::MvcConfig;
use crate::hub::Hub;
use crate::mco::IngredientMco;
use crate::transport::Transport;

/// App-wide handles; clones share the same hub and notice bar
#[derive(Clone)]
pub struct AppContext {
    pub hub: Hub,
    pub mco: IngredientMco,
    pub notices: NoticeBar,
}

impl AppContext {
    pub fn new(transport: Rc<dyn Transport>, config: &MvcConfig) -> Self {
        let hub = Hub::new(config.hub_channel.clone());
        Self {
            mco: IngredientMco::new(transport, hub.clone()),
            hub,
            notices: NoticeBar::new(config.notice_capacity),
        }
    }

    /// Root view wired to this context, not yet mounted
    pub fn view(&self) -> IngredientMvc {
        IngredientMvc::new(self.mco.clone(), self.notices.clone())
    }
}
