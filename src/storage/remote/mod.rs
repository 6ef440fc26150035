//! Remote relational store reached over a PostgREST-style HTTP API
//!
//! [`RemoteStore`] is the transport seam: it knows how to run one select or
//! one RPC call. [`translate`] turns a [`crate::core::query::SalesQuery`]
//! into such a select, and [`RemoteSource`] glues both into a
//! [`crate::core::service::QueryableSource`].

#[cfg(feature = "remote")]
pub mod client;
pub mod source;
pub mod translate;

#[cfg(feature = "remote")]
pub use client::PostgrestClient;
pub use source::{RemoteOptions, RemoteSource};
pub use translate::{CountStrategy, SelectRequest};

use crate::core::error::RemoteQueryError;
use crate::core::record::SalesRow;
use async_trait::async_trait;
use serde_json::Value;

/// Rows returned by a select, with the count the store reported
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SelectResponse {
    pub rows: Vec<SalesRow>,
    /// Total matching rows, when a count was requested and reported
    pub total: Option<usize>,
}

/// Transport to a remote store
#[async_trait]
pub trait RemoteStore: Send + Sync {
    /// Base location, used in logs and error details
    fn endpoint(&self) -> String;

    /// Run one filtered, ordered, paged select in a single round trip
    async fn select(&self, request: &SelectRequest) -> Result<SelectResponse, RemoteQueryError>;

    /// Call a stored function without arguments
    async fn rpc(&self, function: &str) -> Result<Value, RemoteQueryError>;
}
