//! Sales record model and the table snapshot it lives in

use super::field::FieldValue;
use chrono::NaiveDate;
use indexmap::IndexMap;
use serde_json::Value;
use std::collections::{BTreeMap, HashSet};

/// A row as returned to callers: column name to JSON cell, in column order
pub type SalesRow = IndexMap<String, Value>;

/// Canonical column names
pub mod columns {
    pub const TRANSACTION_ID: &str = "transaction_id";
    pub const DATE: &str = "date";
    pub const CUSTOMER_ID: &str = "customer_id";
    pub const CUSTOMER_NAME: &str = "customer_name";
    pub const PHONE_NUMBER: &str = "phone_number";
    pub const GENDER: &str = "gender";
    pub const AGE: &str = "age";
    pub const CUSTOMER_REGION: &str = "customer_region";
    pub const CUSTOMER_TYPE: &str = "customer_type";
    pub const PRODUCT_ID: &str = "product_id";
    pub const PRODUCT_NAME: &str = "product_name";
    pub const BRAND: &str = "brand";
    pub const PRODUCT_CATEGORY: &str = "product_category";
    pub const TAGS: &str = "tags";
    pub const QUANTITY: &str = "quantity";
    pub const PRICE_PER_UNIT: &str = "price_per_unit";
    pub const DISCOUNT_PERCENTAGE: &str = "discount_percentage";
    pub const TOTAL_AMOUNT: &str = "total_amount";
    pub const FINAL_AMOUNT: &str = "final_amount";
    pub const PAYMENT_METHOD: &str = "payment_method";
    pub const ORDER_STATUS: &str = "order_status";
    pub const DELIVERY_TYPE: &str = "delivery_type";
    pub const STORE_ID: &str = "store_id";
    pub const STORE_LOCATION: &str = "store_location";
    pub const SALESPERSON_ID: &str = "salesperson_id";
    pub const EMPLOYEE_NAME: &str = "employee_name";
}

/// One sales transaction
///
/// `customer_name`, `phone_number` and `tags` are never missing: the loader
/// substitutes an empty string. Every other scalar may be missing.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SalesRecord {
    pub transaction_id: String,
    pub date: Option<NaiveDate>,
    pub customer_id: Option<String>,
    pub customer_name: String,
    pub phone_number: String,
    pub gender: Option<String>,
    pub age: Option<i64>,
    pub customer_region: Option<String>,
    pub customer_type: Option<String>,
    pub product_id: Option<String>,
    pub product_name: Option<String>,
    pub brand: Option<String>,
    pub product_category: Option<String>,
    pub tags: String,
    pub quantity: Option<i64>,
    pub price_per_unit: Option<f64>,
    pub discount_percentage: Option<f64>,
    pub total_amount: Option<f64>,
    pub final_amount: Option<f64>,
    pub payment_method: Option<String>,
    pub order_status: Option<String>,
    pub delivery_type: Option<String>,
    pub store_id: Option<String>,
    pub store_location: Option<String>,
    pub salesperson_id: Option<String>,
    pub employee_name: Option<String>,
    /// Columns outside the canonical set, kept verbatim
    pub extra: BTreeMap<String, String>,
}

impl SalesRecord {
    /// Read a cell by canonical (or extra) column name
    pub fn field_value(&self, column: &str) -> FieldValue {
        use columns::*;

        let text = |s: &Option<String>| FieldValue::from(s.clone());
        match column {
            TRANSACTION_ID => FieldValue::String(self.transaction_id.clone()),
            DATE => self.date.into(),
            CUSTOMER_ID => text(&self.customer_id),
            CUSTOMER_NAME => FieldValue::String(self.customer_name.clone()),
            PHONE_NUMBER => FieldValue::String(self.phone_number.clone()),
            GENDER => text(&self.gender),
            AGE => self.age.into(),
            CUSTOMER_REGION => text(&self.customer_region),
            CUSTOMER_TYPE => text(&self.customer_type),
            PRODUCT_ID => text(&self.product_id),
            PRODUCT_NAME => text(&self.product_name),
            BRAND => text(&self.brand),
            PRODUCT_CATEGORY => text(&self.product_category),
            TAGS => FieldValue::String(self.tags.clone()),
            QUANTITY => self.quantity.into(),
            PRICE_PER_UNIT => self.price_per_unit.into(),
            DISCOUNT_PERCENTAGE => self.discount_percentage.into(),
            TOTAL_AMOUNT => self.total_amount.into(),
            FINAL_AMOUNT => self.final_amount.into(),
            PAYMENT_METHOD => text(&self.payment_method),
            ORDER_STATUS => text(&self.order_status),
            DELIVERY_TYPE => text(&self.delivery_type),
            STORE_ID => text(&self.store_id),
            STORE_LOCATION => text(&self.store_location),
            SALESPERSON_ID => text(&self.salesperson_id),
            EMPLOYEE_NAME => text(&self.employee_name),
            other => FieldValue::from(self.extra.get(other).cloned()),
        }
    }

    /// Project the record onto the given columns, missing cells as `""`
    pub fn to_row(&self, columns: &[String]) -> SalesRow {
        columns
            .iter()
            .map(|column| (column.clone(), self.field_value(column).to_json()))
            .collect()
    }
}

/// An immutable, fully materialized table of sales records
#[derive(Debug, Clone, Default)]
pub struct SalesTable {
    columns: Vec<String>,
    column_set: HashSet<String>,
    records: Vec<SalesRecord>,
}

impl SalesTable {
    /// Build a table from its schema (column order) and records
    pub fn new(columns: Vec<String>, records: Vec<SalesRecord>) -> Self {
        let column_set = columns.iter().cloned().collect();
        Self {
            columns,
            column_set,
            records,
        }
    }

    /// Build a table carrying every canonical column
    pub fn with_canonical_columns(records: Vec<SalesRecord>) -> Self {
        Self::new(canonical_columns(), records)
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    /// Whether the column is part of this table's schema
    pub fn has_column(&self, column: &str) -> bool {
        self.column_set.contains(column)
    }

    pub fn records(&self) -> &[SalesRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

/// Every canonical column, in dataset order
pub fn canonical_columns() -> Vec<String> {
    use columns::*;

    [
        TRANSACTION_ID,
        DATE,
        CUSTOMER_ID,
        CUSTOMER_NAME,
        PHONE_NUMBER,
        GENDER,
        AGE,
        CUSTOMER_REGION,
        CUSTOMER_TYPE,
        PRODUCT_ID,
        PRODUCT_NAME,
        BRAND,
        PRODUCT_CATEGORY,
        TAGS,
        QUANTITY,
        PRICE_PER_UNIT,
        DISCOUNT_PERCENTAGE,
        TOTAL_AMOUNT,
        FINAL_AMOUNT,
        PAYMENT_METHOD,
        ORDER_STATUS,
        DELIVERY_TYPE,
        STORE_ID,
        STORE_LOCATION,
        SALESPERSON_ID,
        EMPLOYEE_NAME,
    ]
    .iter()
    .map(|c| c.to_string())
    .collect()
}
