//! Model-Controller
//!
//! Sole owner of the remote CRUD calls for one entity kind. Patches are
//! validated before any request; a mutation is announced on the hub only
//! after the server confirmed it, so a failed call never publishes.

use std::rc::Rc;

use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::{debug, info};

use crate::error::{Error, Result};
use crate::hub::{Action, Hub};
use crate::models::{Entity, Ingredient, Validate};
use crate::transport::Transport;

pub type IngredientMco = Mco<Ingredient>;

pub struct Mco<E: Entity> {
    transport: Rc<dyn Transport>,
    hub: Hub,
    _entity: std::marker::PhantomData<fn() -> E>,
}

impl<E: Entity> Clone for Mco<E> {
    fn clone(&self) -> Self {
        Self {
            transport: self.transport.clone(),
            hub: self.hub.clone(),
            _entity: std::marker::PhantomData,
        }
    }
}

impl<E: Entity> Mco<E> {
    pub fn new(transport: Rc<dyn Transport>, hub: Hub) -> Self {
        Self {
            transport,
            hub,
            _entity: std::marker::PhantomData,
        }
    }

    pub fn hub(&self) -> &Hub {
        &self.hub
    }

    fn item_path(id: E::Id) -> String {
        format!("{}/{}", E::RESOURCE, id)
    }

    /// Full current collection, straight from the server
    pub async fn list(&self) -> Result<Vec<E>> {
        let data = self.transport.get(E::RESOURCE).await?;
        let entities: Vec<E> = decode::<E, _>(data)?;
        debug!(kind = E::KIND, count = entities.len(), "listed");
        Ok(entities)
    }

    pub async fn get(&self, id: E::Id) -> Result<E> {
        let data = self.transport.get(&Self::item_path(id)).await?;
        decode::<E, _>(data)
    }

    pub async fn create(&self, patch: E::Patch) -> Result<E> {
        let patch = patch.validate(Action::Create)?;
        let body = encode::<E, _>(&patch)?;

        let data = self.transport.post(E::RESOURCE, body).await?;
        let created: E = decode::<E, _>(data)?;
        info!(kind = E::KIND, id = %created.id(), "created");

        self.hub.publish(Action::Create, &created);
        Ok(created)
    }

    /// Both `name` and `quantity` are required, even for a one-field change
    pub async fn update(&self, id: E::Id, patch: E::Patch) -> Result<E> {
        let patch = patch.validate(Action::Update)?;
        let body = encode::<E, _>(&patch)?;

        let data = self.transport.patch(&Self::item_path(id), body).await?;
        let updated: E = decode::<E, _>(data)?;
        info!(kind = E::KIND, id = %updated.id(), "updated");

        self.hub.publish(Action::Update, &updated);
        Ok(updated)
    }

    /// Returns, and announces, the last value before removal
    pub async fn delete(&self, id: E::Id) -> Result<E> {
        let data = self.transport.delete(&Self::item_path(id)).await?;
        let deleted: E = decode::<E, _>(data)?;
        info!(kind = E::KIND, id = %deleted.id(), "deleted");

        self.hub.publish(Action::Delete, &deleted);
        Ok(deleted)
    }
}

fn decode<E: Entity, T: DeserializeOwned>(data: Value) -> Result<T> {
    serde_json::from_value(data).map_err(|source| Error::Decode { kind: E::KIND, source })
}

fn encode<E: Entity, T: serde::Serialize>(value: &T) -> Result<Value> {
    serde_json::to_value(value).map_err(|source| Error::Encode { kind: E::KIND, source })
}
