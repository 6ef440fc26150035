//! Capability trait shared by every data source

use super::catalog::MetadataCatalog;
use super::error::ServiceError;
use super::query::{ResultPage, SalesQuery};
use async_trait::async_trait;

/// A data source able to answer search and metadata requests
///
/// Implementations must apply the predicate, ordering and paging semantics
/// of [`crate::core::engine`], whether they evaluate in memory or push the
/// work down to a store.
#[async_trait]
pub trait QueryableSource: Send + Sync {
    /// Short label used in logs and in "attempted" error details
    fn describe(&self) -> String;

    /// Filter, sort and paginate
    async fn search(&self, query: &SalesQuery) -> Result<ResultPage, ServiceError>;

    /// Distinct filter values this source can see
    async fn metadata(&self) -> Result<MetadataCatalog, ServiceError>;
}
