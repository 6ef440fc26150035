//! Core module containing the sales domain types and query semantics

pub mod aggregator;
pub mod catalog;
pub mod engine;
pub mod error;
pub mod field;
pub mod policy;
pub mod query;
pub mod record;
pub mod service;

pub use aggregator::{Aggregated, aggregate};
pub use catalog::{CatalogField, MetadataCatalog};
pub use error::{
    ConfigError, DataSourceError, ErrorResponse, RemoteQueryError, ServiceError, ValidationError,
};
pub use field::FieldValue;
pub use policy::{Served, SourcePolicy, SourceState};
pub use query::{RawSalesQuery, ResultPage, SalesQuery, SortField, SortOrder, ValueSet};
pub use record::{SalesRecord, SalesRow, SalesTable, columns};
pub use service::QueryableSource;
