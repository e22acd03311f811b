//! Remote Transport
//!
//! The four HTTP primitives the Mco is built on. Paths are relative to the
//! API root (`ingredients`, `ingredients/1000`); bodies and results are the
//! JSON payloads with any response envelope already removed.

mod http;
mod memory;

use async_trait::async_trait;
use serde_json::Value;

use crate::error::TransportError;

pub use http::HttpTransport;
pub use memory::{Call, MemoryTransport, Method};

/// REST primitives used by the Mco
#[async_trait(?Send)]
pub trait Transport {
    async fn get(&self, path: &str) -> Result<Value, TransportError>;

    async fn post(&self, path: &str, body: Value) -> Result<Value, TransportError>;

    async fn patch(&self, path: &str, body: Value) -> Result<Value, TransportError>;

    async fn delete(&self, path: &str) -> Result<Value, TransportError>;
}
