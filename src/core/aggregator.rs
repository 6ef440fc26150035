//! Metadata catalog aggregation across sources
//!
//! Completeness wins over a single source of truth: the served catalog is
//! the union of the remote catalog, the local snapshot catalog and the
//! static baseline. A failing source only shrinks the union, it never fails
//! the request.

use super::catalog::MetadataCatalog;
use super::service::QueryableSource;

/// Outcome of one aggregation run
#[derive(Debug, Clone, PartialEq)]
pub struct Aggregated {
    pub catalog: MetadataCatalog,
    /// Dynamic sources that contributed (baseline excluded)
    pub contributors: Vec<String>,
}

impl Aggregated {
    /// True when at least one dynamic source contributed
    pub fn is_dynamic(&self) -> bool {
        !self.contributors.is_empty()
    }

    /// Whether the source labelled `label` contributed
    pub fn contributed(&self, label: &str) -> bool {
        self.contributors.iter().any(|c| c == label)
    }
}

/// Query every available source concurrently and union the results
pub async fn aggregate(
    remote: Option<&dyn QueryableSource>,
    local: &dyn QueryableSource,
) -> Aggregated {
    let remote_catalog = async {
        match remote {
            Some(source) => Some((source.describe(), source.metadata().await)),
            None => None,
        }
    };
    let local_catalog = async { (local.describe(), local.metadata().await) };

    let (remote_result, local_result) = futures::join!(remote_catalog, local_catalog);

    let mut aggregated = Aggregated {
        catalog: MetadataCatalog::baseline(),
        contributors: Vec::new(),
    };

    if let Some((label, result)) = remote_result {
        match result {
            Ok(catalog) => {
                aggregated.catalog.merge_normalized(catalog);
                aggregated.contributors.push(label);
            }
            Err(e) => tracing::warn!(source = %label, error = %e, "remote metadata unavailable"),
        }
    }

    let (label, result) = local_result;
    match result {
        Ok(catalog) => {
            aggregated.catalog.merge(catalog);
            aggregated.contributors.push(label);
        }
        Err(e) => tracing::warn!(source = %label, error = %e, "snapshot metadata unavailable"),
    }

    if !aggregated.is_dynamic() {
        tracing::error!("no dynamic metadata source answered, serving baseline catalog only");
    }

    aggregated
}
