//! # Sales Query
//!
//! A read-only query service over a retail sales dataset.
//!
//! ## Features
//!
//! - **Validated query descriptor**: free-text, multi-value, range and date
//!   filters with sorting and pagination, built from raw URL pairs
//! - **Reference engine**: filter, stable sort (nulls last) and paginate over
//!   an in-memory snapshot loaded once from CSV
//! - **Remote push-down**: the same query translated into a single PostgREST
//!   round trip, with exact or estimated counts
//! - **Silent fallback**: any remote failure is answered from the snapshot
//! - **Metadata catalog**: union of remote, snapshot and baseline values,
//!   cached once a real source answered
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use sales_query::prelude::*;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = ServiceConfig::load(Some("sales.yaml"))?;
//!     ServerBuilder::new().with_config(config).serve().await
//! }
//! ```

pub mod config;
pub mod core;
pub mod server;
pub mod storage;

/// Re-exports of commonly used types and traits
pub mod prelude {
    // === Core ===
    pub use crate::core::{
        aggregator::{Aggregated, aggregate},
        catalog::{CatalogField, MetadataCatalog},
        engine,
        error::{
            ConfigError, DataSourceError, ErrorResponse, RemoteQueryError, ServiceError,
            ValidationError,
        },
        field::FieldValue,
        policy::{Served, SourcePolicy, SourceState},
        query::{RawSalesQuery, ResultPage, SalesQuery, SortField, SortOrder, ValueSet},
        record::{SalesRecord, SalesRow, SalesTable, columns},
        service::QueryableSource,
    };

    // === Config ===
    pub use crate::config::{DataConfig, RemoteConfig, ServerConfig, ServiceConfig};

    // === Storage ===
    #[cfg(feature = "remote")]
    pub use crate::storage::PostgrestClient;
    pub use crate::storage::{
        CountStrategy, RemoteOptions, RemoteSource, RemoteStore, SelectRequest, TableSource,
        remote::SelectResponse,
    };

    // === Server ===
    pub use crate::server::{RestExposure, SalesService, ServerBuilder};

    // === External re-exports ===
    pub use async_trait::async_trait;
    pub use std::sync::Arc;
}
