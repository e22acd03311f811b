use std::cell::RefCell;
use std::rc::Rc;

use async_trait::async_trait;
use serde_json::{json, Value};
use tokio::sync::oneshot;
use tokio::task::LocalSet;

use super::*;
use crate::error::TransportError;
use crate::hub::{Action, Hub};
use crate::mco::IngredientMco;
use crate::models::Ingredient;
use crate::transport::{MemoryTransport, Method, Transport};

struct Fixture {
    transport: Rc<MemoryTransport>,
    hub: Hub,
    notices: NoticeBar,
    view: IngredientMvc,
}

fn fixture(transport: MemoryTransport) -> Fixture {
    let transport = Rc::new(transport);
    let hub = Hub::default();
    let notices = NoticeBar::default();
    let mco = IngredientMco::new(transport.clone(), hub.clone());
    let view = IngredientMvc::new(mco, notices.clone());
    Fixture { transport, hub, notices, view }
}

async fn commit(input: &IngredientInput, name: &str, quantity: &str) {
    input.set_name(name);
    input.set_quantity(quantity);
    let handle = input.on_key_up(COMMIT_KEY).unwrap();
    handle.await.unwrap();
}

#[tokio::test]
async fn test_add_check_delete_flow() {
    LocalSet::new()
        .run_until(async {
            let fx = fixture(MemoryTransport::new());
            let list = fx.view.list().clone();
            let input = fx.view.input().clone();

            fx.view.on_mount();
            list.idle().await;
            assert_eq!(list.child_count(), 0);
            assert!(fx.view.render().contains("(no ingredients)"));

            commit(&input, "flour", "2 cups").await;
            assert_eq!(input.name(), "");
            assert_eq!(input.quantity(), "");
            list.idle().await;

            assert_eq!(list.labels(), vec!["flour (2 cups)"]);
            let item = list.find(1000).unwrap();
            assert!(item.has_class("Ingredient-1000"));
            assert!(item.has_class("flour"));

            // check: PATCH with the same values, label unchanged
            fx.transport.clear_calls();
            item.toggle_check().unwrap().await.unwrap();
            let calls = fx.transport.calls();
            assert_eq!(calls.len(), 1);
            assert_eq!(calls[0].method, Method::Patch);
            assert_eq!(calls[0].path, "ingredients/1000");
            assert_eq!(calls[0].body, Some(json!({"name": "flour", "quantity": "2 cups"})));
            assert!(item.is_checked());
            assert!(item.has_class(DONE_CLASS));
            assert_eq!(item.label(), "flour (2 cups)");

            // delete is not mirrored until the next refetch
            item.request_delete().unwrap().await.unwrap();
            list.idle().await;
            assert!(fx.transport.records("ingredients").is_empty());
            assert_eq!(list.child_count(), 1);

            commit(&input, "sugar", "1 cup").await;
            list.idle().await;
            assert_eq!(list.labels(), vec!["sugar (1 cup)"]);
            assert!(fx.notices.is_empty());
            assert!(fx.view.render().contains("[ ] sugar (1 cup)  #1001"));
        })
        .await;
}

#[tokio::test]
async fn test_empty_input_posts_validation_notice() {
    LocalSet::new()
        .run_until(async {
            let fx = fixture(MemoryTransport::new());
            fx.view.on_mount();
            fx.view.list().idle().await;
            fx.transport.clear_calls();

            commit(fx.view.input(), "  ", "2 cups").await;

            assert_eq!(fx.transport.call_count(), 0);
            assert_eq!(fx.view.input().quantity(), "");
            let notice = fx.notices.latest().unwrap();
            assert_eq!(notice.level, NoticeLevel::Error);
            assert_eq!(notice.message, "Cannot create ingredient with empty name");
        })
        .await;
}

#[tokio::test]
async fn test_items_are_newest_first() {
    LocalSet::new()
        .run_until(async {
            let fx = fixture(MemoryTransport::new().with_records(
                "ingredients",
                vec![
                    json!({"id": 1000, "name": "flour", "quantity": "2 cups"}),
                    json!({"id": 1001, "name": "eggs", "quantity": "3"}),
                ],
            ));
            fx.view.on_mount();
            fx.view.list().idle().await;

            assert_eq!(fx.view.list().labels(), vec!["eggs (3)", "flour (2 cups)"]);
        })
        .await;
}

#[tokio::test]
async fn test_unmount_releases_every_subscription() {
    LocalSet::new()
        .run_until(async {
            let fx = fixture(MemoryTransport::new().with_records(
                "ingredients",
                vec![json!({"id": 1000, "name": "flour", "quantity": "2 cups"})],
            ));
            fx.view.on_mount();
            fx.view.list().idle().await;
            // list on create, one item on update
            assert_eq!(fx.hub.subscriber_count(), 2);

            fx.view.on_unmount();
            assert_eq!(fx.hub.subscriber_count(), 0);
            assert_eq!(fx.view.list().child_count(), 0);

            fx.transport.clear_calls();
            fx.hub.publish(
                Action::Create,
                &Ingredient { id: 5, name: "salt".into(), quantity: "1 tsp".into() },
            );
            fx.view.list().idle().await;
            assert_eq!(fx.transport.call_count(), 0);
        })
        .await;
}

#[tokio::test]
async fn test_failed_refresh_keeps_children() {
    LocalSet::new()
        .run_until(async {
            let fx = fixture(MemoryTransport::new().with_records(
                "ingredients",
                vec![json!({"id": 1000, "name": "flour", "quantity": "2 cups"})],
            ));
            fx.view.on_mount();
            let list = fx.view.list();
            list.idle().await;

            fx.transport.fail_next(1);
            list.spawn_refresh();
            list.idle().await;

            assert_eq!(list.labels(), vec!["flour (2 cups)"]);
            let notice = fx.notices.latest().unwrap();
            assert!(notice.message.starts_with("Cannot load ingredients"));
        })
        .await;
}

#[tokio::test]
async fn test_failed_check_reverts_mark() {
    LocalSet::new()
        .run_until(async {
            let fx = fixture(MemoryTransport::new().with_records(
                "ingredients",
                vec![json!({"id": 1000, "name": "flour", "quantity": "2 cups"})],
            ));
            fx.view.on_mount();
            fx.view.list().idle().await;
            let item = fx.view.list().find(1000).unwrap();

            fx.transport.fail_next(1);
            let handle = item.toggle_check().unwrap();
            assert!(item.is_checked());
            handle.await.unwrap();

            assert!(!item.is_checked());
            assert!(!item.has_class(DONE_CLASS));
            assert!(fx.notices.latest().unwrap().message.starts_with("Cannot update flour"));
        })
        .await;
}

#[tokio::test]
async fn test_update_reaches_only_matching_item() {
    LocalSet::new()
        .run_until(async {
            let fx = fixture(MemoryTransport::new().with_records(
                "ingredients",
                vec![
                    json!({"id": 7, "name": "flour", "quantity": "2 cups"}),
                    json!({"id": 8, "name": "salt", "quantity": "1 tsp"}),
                ],
            ));
            fx.view.on_mount();
            fx.view.list().idle().await;

            fx.hub.publish(
                Action::Update,
                &Ingredient { id: 7, name: "flour".into(), quantity: "3 cups".into() },
            );

            assert_eq!(fx.view.list().find(7).unwrap().label(), "flour (3 cups)");
            assert_eq!(fx.view.list().find(8).unwrap().label(), "salt (1 tsp)");
        })
        .await;
}

#[tokio::test]
async fn test_back_to_back_creates_render_both() {
    LocalSet::new()
        .run_until(async {
            let fx = fixture(MemoryTransport::new());
            fx.view.on_mount();
            let list = fx.view.list();
            list.idle().await;

            let input = fx.view.input();
            input.set_name("flour");
            input.set_quantity("2 cups");
            let first = input.on_key_up(COMMIT_KEY).unwrap();
            input.set_name("eggs");
            input.set_quantity("3");
            let second = input.on_key_up(COMMIT_KEY).unwrap();
            first.await.unwrap();
            second.await.unwrap();
            list.idle().await;

            assert_eq!(list.labels(), vec!["eggs (3)", "flour (2 cups)"]);
        })
        .await;
}

#[tokio::test]
async fn test_non_commit_key_is_ignored() {
    LocalSet::new()
        .run_until(async {
            let fx = fixture(MemoryTransport::new());
            let input = fx.view.input();
            input.set_name("flour");
            assert!(input.on_key_up("a").is_none());
            assert_eq!(input.name(), "flour");
            assert_eq!(fx.transport.call_count(), 0);
        })
        .await;
}

/// Holds the answer of the next GET until released. The records are read
/// before holding, so the held answer goes stale if the store changes.
struct GatedTransport {
    inner: MemoryTransport,
    gate: RefCell<Option<(oneshot::Sender<()>, oneshot::Receiver<()>)>>,
}

impl GatedTransport {
    /// Returns (held, release): `held` fires once a GET is waiting
    fn hold_next_get(&self) -> (oneshot::Receiver<()>, oneshot::Sender<()>) {
        let (held_tx, held_rx) = oneshot::channel();
        let (release_tx, release_rx) = oneshot::channel();
        *self.gate.borrow_mut() = Some((held_tx, release_rx));
        (held_rx, release_tx)
    }
}

#[async_trait(?Send)]
impl Transport for GatedTransport {
    async fn get(&self, path: &str) -> Result<Value, TransportError> {
        let data = self.inner.get(path).await?;
        let gate = self.gate.borrow_mut().take();
        if let Some((held, release)) = gate {
            let _ = held.send(());
            let _ = release.await;
        }
        Ok(data)
    }

    async fn post(&self, path: &str, body: Value) -> Result<Value, TransportError> {
        self.inner.post(path, body).await
    }

    async fn patch(&self, path: &str, body: Value) -> Result<Value, TransportError> {
        self.inner.patch(path, body).await
    }

    async fn delete(&self, path: &str) -> Result<Value, TransportError> {
        self.inner.delete(path).await
    }
}

#[tokio::test]
async fn test_stale_refetch_is_dropped() {
    LocalSet::new()
        .run_until(async {
            let transport = Rc::new(GatedTransport {
                inner: MemoryTransport::new().with_records(
                    "ingredients",
                    vec![json!({"id": 1000, "name": "flour", "quantity": "1"})],
                ),
                gate: RefCell::new(None),
            });
            let mco = IngredientMco::new(transport.clone(), Hub::default());
            let view = IngredientMvc::new(mco, NoticeBar::default());

            // first refetch reads [flour] and waits
            let (held, release) = transport.hold_next_get();
            view.on_mount();
            held.await.unwrap();

            transport
                .inner
                .post("ingredients", json!({"name": "eggs", "quantity": "3"}))
                .await
                .unwrap();
            view.list().refresh().await.unwrap();
            assert_eq!(view.list().labels(), vec!["eggs (3)", "flour (1)"]);

            release.send(()).unwrap();
            view.list().idle().await;
            assert_eq!(view.list().labels(), vec!["eggs (3)", "flour (1)"]);
            assert!(view.notices().is_empty());
        })
        .await;
}

#[tokio::test]
async fn test_pending_refetches_stay_bounded_without_idle() {
    LocalSet::new()
        .run_until(async {
            let fx = fixture(MemoryTransport::new());
            fx.view.on_mount();
            let salt = Ingredient { id: 5, name: "salt".into(), quantity: "1 tsp".into() };

            for _ in 0..50 {
                fx.hub.publish(Action::Create, &salt);
                for _ in 0..10 {
                    tokio::task::yield_now().await;
                }
            }

            assert!(fx.view.list().pending_count() <= 2);
            fx.view.list().idle().await;
            assert_eq!(fx.view.list().pending_count(), 0);
        })
        .await;
}

#[tokio::test]
async fn test_name_shaped_like_identity_is_not_routed() {
    LocalSet::new()
        .run_until(async {
            let fx = fixture(MemoryTransport::new().with_records(
                "ingredients",
                vec![
                    json!({"id": 7, "name": "Ingredient-8", "quantity": "1"}),
                    json!({"id": 8, "name": "salt", "quantity": "1 tsp"}),
                ],
            ));
            fx.view.on_mount();
            fx.view.list().idle().await;

            fx.hub.publish(
                Action::Update,
                &Ingredient { id: 8, name: "salt".into(), quantity: "2 tsp".into() },
            );

            assert_eq!(fx.view.list().labels(), vec!["salt (2 tsp)", "Ingredient-8 (1)"]);
            assert_eq!(fx.view.list().find(7).unwrap().data().unwrap().id, 7);
            assert_eq!(fx.view.list().find(8).unwrap().label(), "salt (2 tsp)");
        })
        .await;
}
