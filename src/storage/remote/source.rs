//! Remote store as a [`QueryableSource`]

use super::translate::{CountStrategy, SelectRequest};
use super::{RemoteStore, SelectResponse};
use crate::core::catalog::{CatalogField, MetadataCatalog};
use crate::core::error::{RemoteQueryError, ServiceError};
use crate::core::field::{DATE_FORMAT, parse_date};
use crate::core::query::{ResultPage, SalesQuery};
use crate::core::record::{SalesRow, columns};
use crate::core::service::QueryableSource;
use async_trait::async_trait;
use serde_json::Value;
use std::sync::Arc;

/// Tunables for the remote source
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteOptions {
    pub table: String,
    /// Stored function returning the whole catalog in one call
    pub catalog_function: String,
    /// Rows sampled per field when the catalog function is unavailable
    pub sample_size: usize,
    /// Count strategy for queries without any filter
    pub unfiltered_count: CountStrategy,
}

impl Default for RemoteOptions {
    fn default() -> Self {
        Self {
            table: "sales".to_string(),
            catalog_function: "sales_filter_catalog".to_string(),
            sample_size: 1000,
            unfiltered_count: CountStrategy::Estimated,
        }
    }
}

/// Queries pushed down to a remote store, one round trip per search
pub struct RemoteSource {
    store: Arc<dyn RemoteStore>,
    options: RemoteOptions,
}

impl RemoteSource {
    pub fn new(store: Arc<dyn RemoteStore>, options: RemoteOptions) -> Self {
        Self { store, options }
    }

    pub fn options(&self) -> &RemoteOptions {
        &self.options
    }

    /// Catalog through the single stored-function call
    async fn catalog_from_rpc(&self) -> Result<MetadataCatalog, RemoteQueryError> {
        let value = self.store.rpc(&self.options.catalog_function).await?;
        parse_catalog(value)
    }

    /// Catalog through concurrent per-field sampling
    async fn catalog_from_samples(&self) -> Result<MetadataCatalog, RemoteQueryError> {
        let requests = CatalogField::ALL.map(|field| async move {
            let request =
                SelectRequest::sample(&self.options.table, field.column(), self.options.sample_size);
            self.store
                .select(&request)
                .await
                .map(|response| (field, response))
        });

        let mut catalog = MetadataCatalog::default();
        for (field, response) in futures::future::try_join_all(requests).await? {
            for row in &response.rows {
                catalog.insert_cell(field, row.get(field.column()).and_then(Value::as_str));
            }
        }
        Ok(catalog)
    }
}

#[async_trait]
impl QueryableSource for RemoteSource {
    fn describe(&self) -> String {
        format!("remote:{}", self.store.endpoint())
    }

    async fn search(&self, query: &SalesQuery) -> Result<ResultPage, ServiceError> {
        let request = SelectRequest::search(&self.options.table, query, self.options.unfiltered_count);
        let estimated = !request.count.is_some_and(|c| c.is_exact());

        tracing::debug!(
            table = %request.table,
            params = ?request.params,
            count = ?request.count,
            "remote select"
        );

        let SelectResponse { rows, total } = self.store.select(&request).await?;
        let total = total
            .ok_or_else(|| RemoteQueryError::malformed("search", "response carried no row count"))?;

        let items: Vec<SalesRow> = rows.into_iter().map(normalize_row).collect();

        // An estimate may undercount what was actually returned
        let total = if estimated {
            total.max(query.offset() + items.len())
        } else {
            total
        };

        Ok(ResultPage::new(items, total, query).estimated(estimated))
    }

    async fn metadata(&self) -> Result<MetadataCatalog, ServiceError> {
        match self.catalog_from_rpc().await {
            Ok(catalog) => Ok(catalog),
            Err(e) => {
                tracing::warn!(
                    function = %self.options.catalog_function,
                    error = %e,
                    "catalog function failed, sampling fields instead"
                );
                Ok(self.catalog_from_samples().await?)
            }
        }
    }
}

/// Render missing cells as `""` and dates as `YYYY-MM-DD`
fn normalize_row(row: SalesRow) -> SalesRow {
    row.into_iter()
        .map(|(column, value)| {
            let value = match value {
                Value::Null => Value::String(String::new()),
                Value::String(raw) if column == columns::DATE => match parse_date(&raw) {
                    Some(date) => Value::String(date.format(DATE_FORMAT).to_string()),
                    None => Value::String(String::new()),
                },
                other => other,
            };
            (column, value)
        })
        .collect()
}

/// Read the catalog function result
///
/// Accepts the object itself or a one-element array wrapping it, as
/// returned by set-returning functions.
fn parse_catalog(value: Value) -> Result<MetadataCatalog, RemoteQueryError> {
    let object = match value {
        Value::Array(mut items) if items.len() == 1 => items.remove(0),
        other => other,
    };
    let Value::Object(object) = object else {
        return Err(RemoteQueryError::malformed("metadata", "catalog is not an object"));
    };

    let mut catalog = MetadataCatalog::default();
    for field in CatalogField::ALL {
        let Some(Value::Array(values)) = object.get(field.key()) else {
            return Err(RemoteQueryError::malformed(
                "metadata",
                format!("catalog field '{}' missing or not an array", field.key()),
            ));
        };
        for value in values {
            catalog.insert_cell(field, value.as_str());
        }
    }
    Ok(catalog)
}
