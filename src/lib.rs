//! Ingredient list kept in sync with a REST server.
//!
//! `Mco` performs the remote CRUD calls and announces confirmed mutations on
//! a `Hub`; the components in [`components`] subscribe to those announcements
//! and keep their view state current.

pub mod components;
pub mod config;
pub mod context;
pub mod error;
pub mod hub;
pub mod mco;
pub mod models;
pub mod transport;

pub use config::MvcConfig;
pub use context::AppContext;
pub use error::{Error, Result};
pub use hub::{Action, Hub, Subscription, DATA_HUB};
pub use mco::{IngredientMco, Mco};
pub use models::{Entity, Ingredient, IngredientPatch};
