//! Shared test harness for data source testing
//!
//! Provides a small sales dataset (in memory or as a CSV file on disk),
//! scripted remote stores, and the `search_contract_tests!` macro that every
//! `QueryableSource` arrangement must pass.
//!
//! # Usage
//!
//! From any integration test file in `tests/`:
//! ```rust,ignore
//! #[macro_use]
//! mod source_harness;
//! use source_harness::*;
//! ```

#![allow(dead_code)]

#[macro_use]
pub mod contract_tests;

use async_trait::async_trait;
use chrono::NaiveDate;
use sales_query::prelude::*;
use serde_json::Value;
use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};
use tempfile::TempDir;

// ---------------------------------------------------------------------------
// Dataset
// ---------------------------------------------------------------------------

/// One fixture row; `None` cells are written as empty CSV cells
pub struct Row {
    pub id: &'static str,
    pub date: Option<&'static str>,
    pub name: &'static str,
    pub phone: &'static str,
    pub gender: &'static str,
    pub age: Option<i64>,
    pub region: &'static str,
    pub category: &'static str,
    pub tags: &'static str,
    pub quantity: Option<i64>,
    pub payment: &'static str,
}

/// Ten transactions covering every filter and both missing-key cases
///
/// - region North with age >= 30: only T03
/// - tags containing "beauty": T01, T04, T05, T07, T09 (quantities 3,1,5,2,4)
/// - tags containing "cas": T03, T08
/// - missing date: T05, T08; missing age: T06; missing quantity: T10
pub const ROWS: &[Row] = &[
    Row { id: "T01", date: Some("2023-01-05"), name: "Alice Smith", phone: "9000000001", gender: "Female", age: Some(25), region: "North", category: "Beauty", tags: "beauty, skincare", quantity: Some(3), payment: "UPI" },
    Row { id: "T02", date: Some("2023-02-10"), name: "Bob Jones", phone: "9000000002", gender: "Male", age: Some(40), region: "South", category: "Electronics", tags: "gadgets, smart", quantity: Some(6), payment: "Cash" },
    Row { id: "T03", date: Some("2023-03-15"), name: "Carol White", phone: "9000000003", gender: "Female", age: Some(60), region: "North", category: "Clothing", tags: "casual, formal", quantity: Some(2), payment: "Credit Card" },
    Row { id: "T04", date: Some("2023-04-20"), name: "Dan Brown", phone: "9000000004", gender: "Male", age: Some(35), region: "East", category: "Beauty", tags: "beauty, organic", quantity: Some(1), payment: "Wallet" },
    Row { id: "T05", date: None, name: "Eve Black", phone: "9000000005", gender: "Female", age: Some(28), region: "West", category: "Beauty", tags: "makeup, beauty", quantity: Some(5), payment: "UPI" },
    Row { id: "T06", date: Some("2023-06-01"), name: "Frank Green", phone: "9000000006", gender: "Male", age: None, region: "North", category: "Electronics", tags: "wireless", quantity: Some(7), payment: "Debit Card" },
    Row { id: "T07", date: Some("2023-07-04"), name: "Grace Hall", phone: "9000000007", gender: "Female", age: Some(45), region: "East", category: "Beauty", tags: "beauty", quantity: Some(2), payment: "Net Banking" },
    Row { id: "T08", date: None, name: "Henry King", phone: "9000000008", gender: "Male", age: Some(52), region: "South", category: "Clothing", tags: "cotton, casual", quantity: Some(8), payment: "Cash" },
    Row { id: "T09", date: Some("2023-09-09"), name: "Ivy Lane", phone: "9000000009", gender: "Female", age: Some(19), region: "West", category: "Beauty", tags: "fragrance-free, beauty", quantity: Some(4), payment: "UPI" },
    Row { id: "T10", date: Some("2023-10-10"), name: "", phone: "", gender: "Male", age: Some(33), region: "South", category: "Electronics", tags: "portable", quantity: None, payment: "Cash" },
];

pub fn sample_records() -> Vec<SalesRecord> {
    ROWS.iter()
        .map(|row| SalesRecord {
            transaction_id: row.id.to_string(),
            date: row
                .date
                .map(|d| NaiveDate::parse_from_str(d, "%Y-%m-%d").unwrap()),
            customer_name: row.name.to_string(),
            phone_number: row.phone.to_string(),
            gender: Some(row.gender.to_string()),
            age: row.age,
            customer_region: Some(row.region.to_string()),
            product_category: Some(row.category.to_string()),
            tags: row.tags.to_string(),
            quantity: row.quantity,
            payment_method: Some(row.payment.to_string()),
            ..Default::default()
        })
        .collect()
}

pub fn sample_table() -> SalesTable {
    SalesTable::with_canonical_columns(sample_records())
}

/// The dataset as a CSV document with the dataset's original headers
pub fn sample_csv() -> String {
    let mut writer = csv::Writer::from_writer(Vec::new());
    writer
        .write_record([
            "Transaction ID",
            "Date",
            "Customer Name",
            "Phone Number",
            "Gender",
            "Age",
            "Customer Region",
            "Product Category",
            "Tags",
            "Quantity",
            "Payment Method",
        ])
        .unwrap();
    for row in ROWS {
        let age = row.age.map(|a| a.to_string()).unwrap_or_default();
        let quantity = row.quantity.map(|q| q.to_string()).unwrap_or_default();
        writer
            .write_record([
                row.id,
                row.date.unwrap_or(""),
                row.name,
                row.phone,
                row.gender,
                age.as_str(),
                row.region,
                row.category,
                row.tags,
                quantity.as_str(),
                row.payment,
            ])
            .unwrap();
    }
    String::from_utf8(writer.into_inner().unwrap()).unwrap()
}

// ---------------------------------------------------------------------------
// Fixtures
// ---------------------------------------------------------------------------

/// A source under test plus whatever must outlive it
pub struct Fixture {
    pub source: Arc<dyn QueryableSource>,
    _dir: Option<TempDir>,
}

impl Fixture {
    /// Snapshot already in memory
    pub fn in_memory() -> Self {
        Self {
            source: Arc::new(TableSource::from_table(sample_table())),
            _dir: None,
        }
    }

    /// Snapshot lazily loaded from a CSV file with a subset schema
    pub fn csv_on_disk() -> Self {
        let (dir, path) = write_sample_csv();
        Self {
            source: Arc::new(TableSource::from_path(path)),
            _dir: Some(dir),
        }
    }

    /// Full service whose remote store always fails
    pub fn behind_failing_remote() -> Self {
        let mut builder = ServerBuilder::new()
            .with_local_source(TableSource::from_table(sample_table()))
            .with_remote_store(FailingStore::default());
        let service = builder.build_service().unwrap();
        Self {
            source: Arc::new(ServiceSource(service)),
            _dir: None,
        }
    }

    /// Full service whose remote store answers with unusable responses
    pub fn behind_malformed_remote() -> Self {
        let mut builder = ServerBuilder::new()
            .with_local_source(TableSource::from_table(sample_table()))
            .with_remote_store(MalformedStore);
        let service = builder.build_service().unwrap();
        Self {
            source: Arc::new(ServiceSource(service)),
            _dir: None,
        }
    }
}

/// Write the sample CSV into a fresh temporary directory
pub fn write_sample_csv() -> (TempDir, PathBuf) {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("sales.csv");
    std::fs::write(&path, sample_csv()).unwrap();
    (dir, path)
}

/// Exposes a `SalesService` through the `QueryableSource` contract
pub struct ServiceSource(pub SalesService);

#[async_trait]
impl QueryableSource for ServiceSource {
    fn describe(&self) -> String {
        "service".to_string()
    }

    async fn search(&self, query: &SalesQuery) -> Result<ResultPage, ServiceError> {
        self.0.search(query).await
    }

    async fn metadata(&self) -> Result<MetadataCatalog, ServiceError> {
        Ok(self.0.metadata().await)
    }
}

// ---------------------------------------------------------------------------
// Scripted remote stores
// ---------------------------------------------------------------------------

/// Remote store whose every call fails at the transport level
#[derive(Default)]
pub struct FailingStore {
    pub calls: Arc<AtomicUsize>,
}

impl FailingStore {
    pub fn counting(calls: Arc<AtomicUsize>) -> Self {
        Self { calls }
    }
}

#[async_trait]
impl RemoteStore for FailingStore {
    fn endpoint(&self) -> String {
        "https://unreachable.example/rest/v1".to_string()
    }

    async fn select(&self, _request: &SelectRequest) -> Result<SelectResponse, RemoteQueryError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Err(RemoteQueryError::transport("select", "connection refused"))
    }

    async fn rpc(&self, _function: &str) -> Result<Value, RemoteQueryError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Err(RemoteQueryError::transport("rpc", "connection refused"))
    }
}

/// Remote store that answers, but never with a usable shape
pub struct MalformedStore;

#[async_trait]
impl RemoteStore for MalformedStore {
    fn endpoint(&self) -> String {
        "https://garbage.example/rest/v1".to_string()
    }

    async fn select(&self, _request: &SelectRequest) -> Result<SelectResponse, RemoteQueryError> {
        Err(RemoteQueryError::Status {
            operation: "select".to_string(),
            status: 503,
            body: "upstream overloaded".to_string(),
        })
    }

    async fn rpc(&self, _function: &str) -> Result<Value, RemoteQueryError> {
        Ok(Value::String("not a catalog".to_string()))
    }
}

/// Remote store returning canned rows and catalog
pub struct CannedStore {
    pub rows: Vec<SalesRow>,
    pub total: Option<usize>,
    pub catalog: Value,
}

#[async_trait]
impl RemoteStore for CannedStore {
    fn endpoint(&self) -> String {
        "https://canned.example/rest/v1".to_string()
    }

    async fn select(&self, _request: &SelectRequest) -> Result<SelectResponse, RemoteQueryError> {
        Ok(SelectResponse {
            rows: self.rows.clone(),
            total: self.total,
        })
    }

    async fn rpc(&self, _function: &str) -> Result<Value, RemoteQueryError> {
        Ok(self.catalog.clone())
    }
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

pub fn query(pairs: &[(&str, &str)]) -> SalesQuery {
    SalesQuery::from_pairs(pairs.iter().copied()).unwrap()
}

pub fn ids(page: &ResultPage) -> Vec<String> {
    page.items
        .iter()
        .map(|row| row["transaction_id"].as_str().unwrap_or_default().to_string())
        .collect()
}

/// Cell as text; missing cells render as `""`
pub fn cell<'a>(row: &'a SalesRow, column: &str) -> &'a Value {
    &row[column]
}
