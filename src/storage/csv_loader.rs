//! CSV snapshot loading
//!
//! Turns the dataset file into a [`SalesTable`]. Headers are normalized to
//! canonical snake_case names, cells are parsed with the lenient rules of
//! [`crate::core::field`], and unparseable values become the missing state
//! instead of failing the load.

use crate::core::error::DataSourceError;
use crate::core::field::{parse_date, parse_decimal, parse_integer};
use crate::core::record::{SalesRecord, SalesTable, columns};
use std::collections::HashSet;
use std::io::Read;
use std::path::Path;

/// Dataset headers with a fixed canonical name
const HEADER_MAP: &[(&str, &str)] = &[
    ("Transaction ID", columns::TRANSACTION_ID),
    ("Date", columns::DATE),
    ("Customer ID", columns::CUSTOMER_ID),
    ("Customer Name", columns::CUSTOMER_NAME),
    ("Phone Number", columns::PHONE_NUMBER),
    ("Gender", columns::GENDER),
    ("Age", columns::AGE),
    ("Customer Region", columns::CUSTOMER_REGION),
    ("Customer Type", columns::CUSTOMER_TYPE),
    ("Product ID", columns::PRODUCT_ID),
    ("Product Name", columns::PRODUCT_NAME),
    ("Brand", columns::BRAND),
    ("Product Category", columns::PRODUCT_CATEGORY),
    ("Tags", columns::TAGS),
    ("Quantity", columns::QUANTITY),
    ("Price per Unit", columns::PRICE_PER_UNIT),
    ("Discount Percentage", columns::DISCOUNT_PERCENTAGE),
    ("Total Amount", columns::TOTAL_AMOUNT),
    ("Final Amount", columns::FINAL_AMOUNT),
    ("Payment Method", columns::PAYMENT_METHOD),
    ("Order Status", columns::ORDER_STATUS),
    ("Delivery Type", columns::DELIVERY_TYPE),
    ("Store ID", columns::STORE_ID),
    ("Store Location", columns::STORE_LOCATION),
    ("Salesperson ID", columns::SALESPERSON_ID),
    ("Employee Name", columns::EMPLOYEE_NAME),
];

/// Canonical column name for a CSV header
///
/// Known headers map through [`HEADER_MAP`]; anything else is trimmed,
/// lower-cased and has spaces replaced by underscores.
pub fn normalize_header(raw: &str) -> String {
    HEADER_MAP
        .iter()
        .find(|(header, _)| *header == raw)
        .map(|(_, column)| column.to_string())
        .unwrap_or_else(|| raw.trim().to_lowercase().replace(' ', "_"))
}

/// Counters reported after a load
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LoadStats {
    pub rows: usize,
    pub skipped_blank_id: usize,
    pub skipped_duplicate_id: usize,
}

/// Load the snapshot from a file on disk
pub fn load_table(path: &Path) -> Result<SalesTable, DataSourceError> {
    let origin = format!("csv:{}", path.display());
    let file = std::fs::File::open(path).map_err(|e| {
        DataSourceError::unavailable(
            vec![origin.clone()],
            format!("dataset not found or unreadable at {}: {}", path.display(), e),
        )
    })?;

    let (table, stats) = load_table_from_reader(file, &origin)?;
    tracing::info!(
        path = %path.display(),
        rows = stats.rows,
        skipped_blank_id = stats.skipped_blank_id,
        skipped_duplicate_id = stats.skipped_duplicate_id,
        "sales snapshot loaded"
    );
    Ok(table)
}

/// Load the snapshot from any reader; `origin` labels errors
pub fn load_table_from_reader<R: Read>(
    reader: R,
    origin: &str,
) -> Result<(SalesTable, LoadStats), DataSourceError> {
    let unavailable =
        |message: String| DataSourceError::unavailable(vec![origin.to_string()], message);

    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_reader(reader);

    let headers: Vec<String> = reader
        .headers()
        .map_err(|e| unavailable(format!("failed to read CSV header: {}", e)))?
        .iter()
        .map(normalize_header)
        .collect();

    // First occurrence of a header wins, later duplicates are ignored
    let mut schema = Vec::with_capacity(headers.len());
    for header in &headers {
        if !schema.contains(header) {
            schema.push(header.clone());
        }
    }
    let keyed = schema.iter().any(|c| c == columns::TRANSACTION_ID);

    let mut stats = LoadStats::default();
    let mut seen = HashSet::new();
    let mut records = Vec::new();

    for (line_num, result) in reader.records().enumerate() {
        let row = result.map_err(|e| {
            unavailable(format!("failed to parse CSV line {}: {}", line_num + 2, e))
        })?;

        let mut record = SalesRecord::default();
        let mut assigned = HashSet::new();
        for (header, raw) in headers.iter().zip(row.iter()) {
            if assigned.insert(header.as_str()) {
                assign(&mut record, header, raw);
            }
        }

        if keyed {
            if record.transaction_id.is_empty() {
                stats.skipped_blank_id += 1;
                continue;
            }
            if !seen.insert(record.transaction_id.clone()) {
                stats.skipped_duplicate_id += 1;
                continue;
            }
        }
        records.push(record);
    }

    if stats.skipped_blank_id > 0 || stats.skipped_duplicate_id > 0 {
        tracing::warn!(
            origin,
            skipped_blank_id = stats.skipped_blank_id,
            skipped_duplicate_id = stats.skipped_duplicate_id,
            "rows dropped while loading snapshot"
        );
    }

    stats.rows = records.len();
    Ok((SalesTable::new(schema, records), stats))
}

/// Store one raw cell into the record
fn assign(record: &mut SalesRecord, column: &str, raw: &str) {
    use columns::*;

    let text = || {
        let value = raw.trim();
        (!value.is_empty()).then(|| value.to_string())
    };

    match column {
        TRANSACTION_ID => record.transaction_id = raw.trim().to_string(),
        DATE => record.date = parse_date(raw),
        CUSTOMER_ID => record.customer_id = text(),
        CUSTOMER_NAME => record.customer_name = raw.trim().to_string(),
        PHONE_NUMBER => record.phone_number = raw.trim().to_string(),
        GENDER => record.gender = text(),
        AGE => record.age = parse_integer(raw),
        CUSTOMER_REGION => record.customer_region = text(),
        CUSTOMER_TYPE => record.customer_type = text(),
        PRODUCT_ID => record.product_id = text(),
        PRODUCT_NAME => record.product_name = text(),
        BRAND => record.brand = text(),
        PRODUCT_CATEGORY => record.product_category = text(),
        TAGS => record.tags = raw.trim().to_string(),
        QUANTITY => record.quantity = parse_integer(raw),
        PRICE_PER_UNIT => record.price_per_unit = parse_decimal(raw),
        DISCOUNT_PERCENTAGE => record.discount_percentage = parse_decimal(raw),
        TOTAL_AMOUNT => record.total_amount = parse_decimal(raw),
        FINAL_AMOUNT => record.final_amount = parse_decimal(raw),
        PAYMENT_METHOD => record.payment_method = text(),
        ORDER_STATUS => record.order_status = text(),
        DELIVERY_TYPE => record.delivery_type = text(),
        STORE_ID => record.store_id = text(),
        STORE_LOCATION => record.store_location = text(),
        SALESPERSON_ID => record.salesperson_id = text(),
        EMPLOYEE_NAME => record.employee_name = text(),
        other => {
            if let Some(value) = text() {
                record.extra.insert(other.to_string(), value);
            }
        }
    }
}
