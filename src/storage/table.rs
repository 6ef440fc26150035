//! In-memory table source backed by the CSV snapshot

use super::csv_loader;
use crate::core::catalog::MetadataCatalog;
use crate::core::engine;
use crate::core::error::{DataSourceError, ServiceError};
use crate::core::query::{ResultPage, SalesQuery};
use crate::core::record::SalesTable;
use crate::core::service::QueryableSource;
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::OnceCell;

/// Local source evaluating queries over a lazily loaded snapshot
///
/// The snapshot is loaded on first use and shared read-only afterwards.
/// Concurrent first callers wait on the same load; a failed load is not
/// remembered, so the next request tries again.
#[derive(Debug)]
pub struct TableSource {
    path: Option<PathBuf>,
    snapshot: OnceCell<Arc<SalesTable>>,
}

impl TableSource {
    /// Source that loads `path` on first use
    pub fn from_path(path: impl Into<PathBuf>) -> Self {
        Self {
            path: Some(path.into()),
            snapshot: OnceCell::new(),
        }
    }

    /// Source over an already materialized table
    pub fn from_table(table: SalesTable) -> Self {
        Self {
            path: None,
            snapshot: OnceCell::new_with(Some(Arc::new(table))),
        }
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// Whether the snapshot has been materialized
    pub fn is_loaded(&self) -> bool {
        self.snapshot.initialized()
    }

    /// The shared snapshot, loading it if needed
    pub async fn snapshot(&self) -> Result<Arc<SalesTable>, ServiceError> {
        self.snapshot
            .get_or_try_init(|| self.load())
            .await
            .cloned()
    }

    async fn load(&self) -> Result<Arc<SalesTable>, ServiceError> {
        let Some(path) = self.path.clone() else {
            return Err(DataSourceError::unavailable(
                vec![self.describe()],
                "no snapshot path configured",
            )
            .into());
        };

        let table = tokio::task::spawn_blocking(move || csv_loader::load_table(&path))
            .await
            .map_err(|e| ServiceError::Internal(format!("snapshot load task failed: {}", e)))??;

        Ok(Arc::new(table))
    }
}

#[async_trait]
impl QueryableSource for TableSource {
    fn describe(&self) -> String {
        match &self.path {
            Some(path) => format!("csv:{}", path.display()),
            None => "table:in-memory".to_string(),
        }
    }

    async fn search(&self, query: &SalesQuery) -> Result<ResultPage, ServiceError> {
        let table = self.snapshot().await?;
        let page = engine::search(&table, query);
        tracing::debug!(
            source = %self.describe(),
            total = page.total,
            returned = page.items.len(),
            "table search evaluated"
        );
        Ok(page)
    }

    async fn metadata(&self) -> Result<MetadataCatalog, ServiceError> {
        let table = self.snapshot().await?;
        Ok(MetadataCatalog::from_table(&table))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::record::SalesRecord;
    use std::io::Write;

    #[tokio::test]
    async fn test_from_table_is_preloaded() {
        let source = TableSource::from_table(SalesTable::with_canonical_columns(vec![
            SalesRecord {
                transaction_id: "T1".into(),
                ..Default::default()
            },
        ]));
        assert!(source.is_loaded());
        let page = source.search(&SalesQuery::default()).await.unwrap();
        assert_eq!(page.total, 1);
    }

    #[tokio::test]
    async fn test_lazy_load_happens_once() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "Transaction ID,Customer Region\nT1,North\nT2,South").unwrap();

        let source = TableSource::from_path(file.path());
        assert!(!source.is_loaded());

        let (a, b) = tokio::join!(source.snapshot(), source.snapshot());
        assert!(Arc::ptr_eq(&a.unwrap(), &b.unwrap()));
        assert!(source.is_loaded());

        let catalog = source.metadata().await.unwrap();
        assert_eq!(catalog.regions.len(), 2);
    }

    #[tokio::test]
    async fn test_failed_load_is_retried() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("late.csv");
        let source = TableSource::from_path(&path);

        let err = source.search(&SalesQuery::default()).await.unwrap_err();
        assert_eq!(err.error_code(), "DATA_SOURCE_UNAVAILABLE");
        assert!(!source.is_loaded());

        std::fs::write(&path, "Transaction ID\nT1\n").unwrap();
        let page = source.search(&SalesQuery::default()).await.unwrap();
        assert_eq!(page.total, 1);
    }
}
