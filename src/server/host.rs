//! Transport-agnostic service state
//!
//! `SalesService` owns the data sources, the selection policy and the
//! metadata cache. Exposures (REST today) only translate between their
//! wire format and these two operations.

use crate::core::aggregator::aggregate;
use crate::core::catalog::MetadataCatalog;
use crate::core::error::{RemoteQueryError, ServiceError};
use crate::core::policy::SourcePolicy;
use crate::core::query::{ResultPage, SalesQuery};
use crate::core::service::QueryableSource;
use std::sync::Arc;
use tokio::sync::OnceCell;

/// The sales query service shared by every request
pub struct SalesService {
    local: Arc<dyn QueryableSource>,
    remote: Option<Arc<dyn QueryableSource>>,
    policy: SourcePolicy,
    catalog: OnceCell<MetadataCatalog>,
}

impl SalesService {
    pub fn new(local: Arc<dyn QueryableSource>, remote: Option<Arc<dyn QueryableSource>>) -> Self {
        let policy = SourcePolicy::new(remote.as_ref().map(|r| r.describe()));
        Self {
            local,
            remote,
            policy,
            catalog: OnceCell::new(),
        }
    }

    pub fn local_only(local: Arc<dyn QueryableSource>) -> Self {
        Self::new(local, None)
    }

    pub fn policy(&self) -> &SourcePolicy {
        &self.policy
    }

    pub fn has_remote(&self) -> bool {
        self.remote.is_some()
    }

    /// Answer a search, falling back to the local snapshot on remote failure
    pub async fn search(&self, query: &SalesQuery) -> Result<ResultPage, ServiceError> {
        let served = self
            .policy
            .execute(
                "search",
                || async {
                    match &self.remote {
                        Some(remote) => remote.search(query).await,
                        None => Err(RemoteQueryError::NotConfigured.into()),
                    }
                },
                || self.local.search(query),
            )
            .await?;

        tracing::debug!(
            served_by = ?served.served_by,
            total = served.value.total,
            page = served.value.page,
            "search answered"
        );
        Ok(served.value)
    }

    /// The aggregated catalog; never fails
    ///
    /// A catalog is cached for the process lifetime once the remote store
    /// contributed to it, or, without a remote store, once the local
    /// snapshot did. Anything else is served but not cached, so a later
    /// request can still pick up the missing values.
    pub async fn metadata(&self) -> MetadataCatalog {
        let result = self
            .catalog
            .get_or_try_init(|| async {
                let aggregated = aggregate(self.remote.as_deref(), self.local.as_ref()).await;
                let complete = match &self.remote {
                    Some(remote) => aggregated.contributed(&remote.describe()),
                    None => aggregated.is_dynamic(),
                };
                if complete {
                    tracing::info!(contributors = ?aggregated.contributors, "metadata catalog cached");
                    Ok(aggregated.catalog)
                } else {
                    Err(aggregated.catalog)
                }
            })
            .await;

        match result {
            Ok(catalog) => catalog.clone(),
            Err(baseline) => baseline,
        }
    }

    /// Whether a dynamic catalog has been cached
    pub fn is_catalog_cached(&self) -> bool {
        self.catalog.initialized()
    }
}
