//! In-process stand-in for the REST server.
//!
//! Behaves like the ingredient server for any collection name: ids are
//! assigned from 1000, lists come back newest first, PATCH merges the given
//! fields and DELETE answers with the record as it was before removal. Every
//! call is recorded so tests can spy on what reached the "network".

use std::cell::{Cell, RefCell};
use std::collections::{BTreeMap, HashMap};

use async_trait::async_trait;
use serde_json::{Map, Value};
use tracing::debug;

use super::Transport;
use crate::error::TransportError;

/// First id handed out by a fresh transport
pub const FIRST_ID: i64 = 1000;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    Get,
    Post,
    Patch,
    Delete,
}

/// One recorded request
#[derive(Debug, Clone, PartialEq)]
pub struct Call {
    pub method: Method,
    pub path: String,
    pub body: Option<Value>,
}

pub struct MemoryTransport {
    collections: RefCell<HashMap<String, BTreeMap<i64, Map<String, Value>>>>,
    next_id: Cell<i64>,
    calls: RefCell<Vec<Call>>,
    failures: Cell<usize>,
}

impl MemoryTransport {
    pub fn new() -> Self {
        Self {
            collections: RefCell::new(HashMap::new()),
            next_id: Cell::new(FIRST_ID),
            calls: RefCell::new(Vec::new()),
            failures: Cell::new(0),
        }
    }

    /// Preload a collection. Records without an integer `id` get a fresh one;
    /// non-object values are skipped.
    pub fn with_records(self, resource: &str, records: impl IntoIterator<Item = Value>) -> Self {
        for record in records {
            if let Value::Object(mut fields) = record {
                let id = match fields.get("id").and_then(Value::as_i64) {
                    Some(id) => {
                        self.next_id.set(self.next_id.get().max(id + 1));
                        id
                    }
                    None => self.allocate_id(),
                };
                fields.insert("id".to_string(), Value::from(id));
                self.collections
                    .borrow_mut()
                    .entry(resource.to_string())
                    .or_default()
                    .insert(id, fields);
            }
        }
        self
    }

    /// All requests received so far, oldest first
    pub fn calls(&self) -> Vec<Call> {
        self.calls.borrow().clone()
    }

    pub fn call_count(&self) -> usize {
        self.calls.borrow().len()
    }

    pub fn clear_calls(&self) {
        self.calls.borrow_mut().clear();
    }

    /// Make the next `n` requests fail with `TransportError::Unavailable`
    pub fn fail_next(&self, n: usize) {
        self.failures.set(n);
    }

    /// Stored records of a collection, in list order
    pub fn records(&self, resource: &str) -> Vec<Value> {
        self.collections
            .borrow()
            .get(resource)
            .map(|records| records.values().rev().cloned().map(Value::Object).collect())
            .unwrap_or_default()
    }

    fn allocate_id(&self) -> i64 {
        let id = self.next_id.get();
        self.next_id.set(id + 1);
        id
    }

    /// Record the call, yield once like a real round trip, then apply any
    /// injected failure
    async fn begin(&self, method: Method, path: &str, body: Option<&Value>) -> Result<(), TransportError> {
        debug!(?method, path, "memory transport request");
        self.calls.borrow_mut().push(Call {
            method,
            path: path.to_string(),
            body: body.cloned(),
        });

        tokio::task::yield_now().await;

        let failures = self.failures.get();
        if failures > 0 {
            self.failures.set(failures - 1);
            return Err(TransportError::Unavailable);
        }
        Ok(())
    }
}

impl Default for MemoryTransport {
    fn default() -> Self {
        Self::new()
    }
}

/// Split `resource[/id]`
fn route(path: &str) -> Result<(String, Option<i64>), TransportError> {
    let not_found = || TransportError::NotFound { path: path.to_string() };
    let mut segments = path.trim_matches('/').split('/');
    let resource = segments.next().filter(|s| !s.is_empty()).ok_or_else(not_found)?;
    let id = match segments.next() {
        Some(raw) => Some(raw.parse::<i64>().map_err(|_| not_found())?),
        None => None,
    };
    if segments.next().is_some() {
        return Err(not_found());
    }
    Ok((resource.to_string(), id))
}

/// Copy the body's fields onto a record, never touching `id`
fn merge(record: &mut Map<String, Value>, body: Value) {
    if let Value::Object(fields) = body {
        for (key, value) in fields {
            if key != "id" {
                record.insert(key, value);
            }
        }
    }
}

#[async_trait(?Send)]
impl Transport for MemoryTransport {
    async fn get(&self, path: &str) -> Result<Value, TransportError> {
        self.begin(Method::Get, path, None).await?;
        let (resource, id) = route(path)?;

        match id {
            None => Ok(Value::Array(self.records(&resource))),
            Some(id) => self
                .collections
                .borrow()
                .get(&resource)
                .and_then(|records| records.get(&id))
                .cloned()
                .map(Value::Object)
                .ok_or_else(|| TransportError::NotFound { path: path.to_string() }),
        }
    }

    async fn post(&self, path: &str, body: Value) -> Result<Value, TransportError> {
        self.begin(Method::Post, path, Some(&body)).await?;
        let (resource, id) = route(path)?;
        if id.is_some() {
            return Err(TransportError::NotFound { path: path.to_string() });
        }

        let id = self.allocate_id();
        let mut record = Map::new();
        record.insert("id".to_string(), Value::from(id));
        merge(&mut record, body);

        self.collections
            .borrow_mut()
            .entry(resource)
            .or_default()
            .insert(id, record.clone());
        Ok(Value::Object(record))
    }

    async fn patch(&self, path: &str, body: Value) -> Result<Value, TransportError> {
        self.begin(Method::Patch, path, Some(&body)).await?;
        let not_found = || TransportError::NotFound { path: path.to_string() };
        let (resource, id) = route(path)?;
        let id = id.ok_or_else(not_found)?;

        let mut collections = self.collections.borrow_mut();
        let record = collections
            .get_mut(&resource)
            .and_then(|records| records.get_mut(&id))
            .ok_or_else(not_found)?;
        merge(record, body);
        Ok(Value::Object(record.clone()))
    }

    async fn delete(&self, path: &str) -> Result<Value, TransportError> {
        self.begin(Method::Delete, path, None).await?;
        let not_found = || TransportError::NotFound { path: path.to_string() };
        let (resource, id) = route(path)?;
        let id = id.ok_or_else(not_found)?;

        self.collections
            .borrow_mut()
            .get_mut(&resource)
            .and_then(|records| records.remove(&id))
            .map(Value::Object)
            .ok_or_else(not_found)
    }
}
