//! Data Hub
//!
//! In-memory publish/subscribe channel for confirmed entity mutations.
//! Topics are `(channel, entity kind, action)`; a `Hub` value owns its
//! channel name, so subscribers address it by kind and action. Delivery is
//! synchronous, in registration order, with no acknowledgement or replay.

use std::any::{Any, TypeId};
use std::borrow::Cow;
use std::cell::{Cell, RefCell};
use std::fmt;
use std::rc::{Rc, Weak};

use tracing::debug;

use crate::models::Entity;

/// Channel name of the application data hub
pub const DATA_HUB: &str = "dataHub";

/// Mutation announced on the hub
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Action {
    Create,
    Update,
    Delete,
}

impl Action {
    pub fn as_str(&self) -> &'static str {
        match self {
            Action::Create => "create",
            Action::Update => "update",
            Action::Delete => "delete",
        }
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

type Handler = Rc<dyn Fn(&dyn Any)>;

struct Subscriber {
    id: u64,
    kind: &'static str,
    payload: TypeId,
    action: Action,
    handler: Handler,
}

struct HubInner {
    channel: Cow<'static, str>,
    subscribers: RefCell<Vec<Subscriber>>,
    next_id: Cell<u64>,
}

impl HubInner {
    fn is_registered(&self, id: u64) -> bool {
        self.subscribers.borrow().iter().any(|s| s.id == id)
    }

    fn remove(&self, id: u64) {
        // Drop the handler only after the table borrow is released: its
        // captures may own subscriptions of their own.
        let removed = {
            let mut subscribers = self.subscribers.borrow_mut();
            subscribers
                .iter()
                .position(|s| s.id == id)
                .map(|pos| subscribers.remove(pos))
        };
        if removed.is_some() {
            debug!(channel = %self.channel, id, "hub unsubscribe");
        }
    }
}

/// Handle to a hub; clones share the same subscriber table
#[derive(Clone)]
pub struct Hub(Rc<HubInner>);

impl Hub {
    pub fn new(channel: impl Into<Cow<'static, str>>) -> Self {
        Self(Rc::new(HubInner {
            channel: channel.into(),
            subscribers: RefCell::new(Vec::new()),
            next_id: Cell::new(0),
        }))
    }

    pub fn channel(&self) -> &str {
        &self.0.channel
    }

    /// Register `handler` for `(E::KIND, action)` until the returned
    /// subscription is dropped
    pub fn subscribe<E, F>(&self, action: Action, handler: F) -> Subscription
    where
        E: Entity,
        F: Fn(&E) + 'static,
    {
        let id = self.0.next_id.get();
        self.0.next_id.set(id + 1);

        let handler: Handler = Rc::new(move |payload: &dyn Any| {
            if let Some(entity) = payload.downcast_ref::<E>() {
                handler(entity);
            }
        });

        self.0.subscribers.borrow_mut().push(Subscriber {
            id,
            kind: E::KIND,
            payload: TypeId::of::<E>(),
            action,
            handler,
        });
        debug!(channel = %self.0.channel, kind = E::KIND, %action, id, "hub subscribe");

        Subscription {
            hub: Rc::downgrade(&self.0),
            id,
        }
    }

    /// Deliver `payload` to every subscriber of `(E::KIND, action)`.
    ///
    /// Returns how many handlers ran. Handlers may subscribe or drop
    /// subscriptions while the delivery is in progress; a handler dropped by
    /// an earlier one is skipped, one added during delivery waits for the
    /// next publish.
    pub fn publish<E: Entity>(&self, action: Action, payload: &E) -> usize {
        let targets: Vec<(u64, Handler)> = self
            .0
            .subscribers
            .borrow()
            .iter()
            .filter(|s| s.action == action && s.kind == E::KIND && s.payload == TypeId::of::<E>())
            .map(|s| (s.id, s.handler.clone()))
            .collect();

        debug!(
            channel = %self.0.channel,
            kind = E::KIND,
            %action,
            subscribers = targets.len(),
            "hub publish"
        );

        let mut delivered = 0;
        for (id, handler) in targets {
            if self.0.is_registered(id) {
                handler(payload);
                delivered += 1;
            }
        }
        delivered
    }

    pub fn subscriber_count(&self) -> usize {
        self.0.subscribers.borrow().len()
    }
}

impl Default for Hub {
    fn default() -> Self {
        Self::new(DATA_HUB)
    }
}

impl fmt::Debug for Hub {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Hub")
            .field("channel", &self.0.channel)
            .field("subscribers", &self.subscriber_count())
            .finish()
    }
}

/// Registration on a hub; dropping it removes the handler
#[must_use = "dropping a Subscription unsubscribes its handler"]
pub struct Subscription {
    hub: Weak<HubInner>,
    id: u64,
}

impl Subscription {
    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn unsubscribe(self) {}
}

impl Drop for Subscription {
    fn drop(&mut self) {
        if let Some(hub) = self.hub.upgrade() {
            hub.remove(self.id);
        }
    }
}

impl fmt::Debug for Subscription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subscription").field("id", &self.id).finish()
    }
}
