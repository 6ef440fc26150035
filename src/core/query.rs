//! Query descriptor construction, validation and the result page shape
//!
//! Loose client input (`RawSalesQuery`) is turned into a validated
//! [`SalesQuery`] exactly once. Everything downstream, the in-memory engine
//! and the remote translator alike, only ever sees normalized value sets.
//!
//! # Example
//! ```rust,ignore
//! // GET /api/sales?region=North,South&gender=Male&gender=Female&sort_by=quantity&order=asc
//! let query = SalesQuery::from_pairs(pairs)?;
//! assert_eq!(query.region.unwrap().len(), 2);
//! ```

use super::error::ValidationError;
use super::record::{SalesRow, columns};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

pub const DEFAULT_PAGE_SIZE: usize = 10;
pub const MAX_PAGE_SIZE: usize = 100;

/// Column a result page can be sorted by
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortField {
    #[default]
    Date,
    Quantity,
    CustomerName,
}

impl SortField {
    /// Column the field resolves to, in both the table and the remote store
    pub fn column(&self) -> &'static str {
        match self {
            SortField::Date => columns::DATE,
            SortField::Quantity => columns::QUANTITY,
            SortField::CustomerName => columns::CUSTOMER_NAME,
        }
    }
}

impl FromStr for SortField {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "date" => Ok(SortField::Date),
            "quantity" => Ok(SortField::Quantity),
            "customer_name" => Ok(SortField::CustomerName),
            other => Err(ValidationError::InvalidSortField {
                value: other.to_string(),
            }),
        }
    }
}

/// Sort direction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    Asc,
    #[default]
    Desc,
}

impl SortOrder {
    pub fn is_ascending(&self) -> bool {
        matches!(self, SortOrder::Asc)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            SortOrder::Asc => "asc",
            SortOrder::Desc => "desc",
        }
    }
}

impl FromStr for SortOrder {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "asc" => Ok(SortOrder::Asc),
            "desc" => Ok(SortOrder::Desc),
            other => Err(ValidationError::InvalidSortOrder {
                value: other.to_string(),
            }),
        }
    }
}

/// A non-empty set of filter values without blank entries
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValueSet(BTreeSet<String>);

impl ValueSet {
    /// Build from already-separated values; blank entries are dropped
    ///
    /// Returns `None` when nothing remains, so "absent" and "empty" collapse
    /// into the same no-filter state.
    pub fn from_values<I, S>(values: I) -> Option<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let set: BTreeSet<String> = values
            .into_iter()
            .map(|v| v.as_ref().trim().to_string())
            .filter(|v| !v.is_empty())
            .collect();
        (!set.is_empty()).then_some(ValueSet(set))
    }

    /// Split a comma-joined string, trimming every piece
    pub fn from_comma_joined(raw: &str) -> Option<Self> {
        Self::from_values(raw.split(','))
    }

    pub fn contains(&self, value: &str) -> bool {
        self.0.contains(value)
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// Loosely typed multi-value input: one comma-joined string or a list
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum MultiValueInput {
    Single(String),
    List(Vec<serde_json::Value>),
}

impl MultiValueInput {
    /// Normalize to a value set; non-string list entries are dropped
    pub fn into_value_set(self) -> Option<ValueSet> {
        match self {
            MultiValueInput::Single(raw) => ValueSet::from_comma_joined(&raw),
            MultiValueInput::List(items) => ValueSet::from_values(
                items
                    .iter()
                    .filter_map(|item| item.as_str())
                    .collect::<Vec<_>>(),
            ),
        }
    }
}

/// Loosely typed scalar input (query strings carry text, JSON carries numbers)
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum ScalarInput {
    Integer(i64),
    Float(f64),
    Text(String),
}

impl fmt::Display for ScalarInput {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ScalarInput::Integer(i) => write!(f, "{}", i),
            ScalarInput::Float(x) => write!(f, "{}", x),
            ScalarInput::Text(s) => write!(f, "{}", s),
        }
    }
}

/// Raw, unvalidated request input
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct RawSalesQuery {
    pub customer_name: Option<String>,
    pub phone: Option<String>,
    pub region: Option<MultiValueInput>,
    pub gender: Option<MultiValueInput>,
    pub product_category: Option<MultiValueInput>,
    pub tag: Option<MultiValueInput>,
    pub payment_method: Option<MultiValueInput>,
    pub age_min: Option<ScalarInput>,
    pub age_max: Option<ScalarInput>,
    pub date_from: Option<String>,
    pub date_to: Option<String>,
    pub sort_by: Option<String>,
    pub order: Option<String>,
    pub page: Option<ScalarInput>,
    pub page_size: Option<ScalarInput>,
}

impl RawSalesQuery {
    /// Collect URL query pairs; repeated multi-value keys accumulate
    ///
    /// A multi-value key seen once is treated as a comma-joined string, a key
    /// seen several times as a list. Scalar keys keep the last value. Blank
    /// values count as absent. Unknown keys are ignored.
    pub fn from_pairs<I, K, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: Into<String>,
    {
        fn push(slot: &mut Option<MultiValueInput>, value: String) {
            *slot = Some(match slot.take() {
                None => MultiValueInput::Single(value),
                Some(MultiValueInput::Single(first)) => {
                    MultiValueInput::List(vec![first.into(), value.into()])
                }
                Some(MultiValueInput::List(mut items)) => {
                    items.push(value.into());
                    MultiValueInput::List(items)
                }
            });
        }

        let mut raw = RawSalesQuery::default();
        for (key, value) in pairs {
            let value: String = value.into();
            if value.trim().is_empty() {
                continue;
            }
            match key.as_ref() {
                "customer_name" => raw.customer_name = Some(value),
                "phone" => raw.phone = Some(value),
                "region" => push(&mut raw.region, value),
                "gender" => push(&mut raw.gender, value),
                "product_category" => push(&mut raw.product_category, value),
                "tag" => push(&mut raw.tag, value),
                "payment_method" => push(&mut raw.payment_method, value),
                "age_min" => raw.age_min = Some(ScalarInput::Text(value)),
                "age_max" => raw.age_max = Some(ScalarInput::Text(value)),
                "date_from" => raw.date_from = Some(value),
                "date_to" => raw.date_to = Some(value),
                "sort_by" => raw.sort_by = Some(value),
                "order" => raw.order = Some(value),
                "page" => raw.page = Some(ScalarInput::Text(value)),
                "page_size" => raw.page_size = Some(ScalarInput::Text(value)),
                _ => {}
            }
        }
        raw
    }
}

/// A validated, normalized search request
#[derive(Debug, Clone, PartialEq)]
pub struct SalesQuery {
    /// Case-insensitive substring of the customer name
    pub customer_name: Option<String>,
    /// Case-insensitive substring of the phone number
    pub phone: Option<String>,
    pub region: Option<ValueSet>,
    pub gender: Option<ValueSet>,
    pub product_category: Option<ValueSet>,
    /// Matched as substrings of the joined tags cell, not as exact tokens
    pub tag: Option<ValueSet>,
    pub payment_method: Option<ValueSet>,
    pub age_min: Option<u32>,
    pub age_max: Option<u32>,
    pub date_from: Option<NaiveDate>,
    pub date_to: Option<NaiveDate>,
    pub sort_by: SortField,
    pub order: SortOrder,
    /// 1-based page number
    pub page: usize,
    pub page_size: usize,
}

impl Default for SalesQuery {
    fn default() -> Self {
        Self {
            customer_name: None,
            phone: None,
            region: None,
            gender: None,
            product_category: None,
            tag: None,
            payment_method: None,
            age_min: None,
            age_max: None,
            date_from: None,
            date_to: None,
            sort_by: SortField::default(),
            order: SortOrder::default(),
            page: 1,
            page_size: DEFAULT_PAGE_SIZE,
        }
    }
}

impl SalesQuery {
    /// Validate loose input
    ///
    /// Cross-field combinations such as `age_min > age_max` are accepted and
    /// simply match nothing.
    pub fn from_raw(raw: RawSalesQuery) -> Result<Self, ValidationError> {
        let sort_by = match raw.sort_by.as_deref() {
            Some(s) => s.parse()?,
            None => SortField::default(),
        };
        let order = match raw.order.as_deref() {
            Some(s) => s.parse()?,
            None => SortOrder::default(),
        };

        let page = match &raw.page {
            Some(input) => parse_bounded("page", input, 1, None)?,
            None => 1,
        };
        let page_size = match &raw.page_size {
            Some(input) => parse_bounded("page_size", input, 1, Some(MAX_PAGE_SIZE as i64))?,
            None => DEFAULT_PAGE_SIZE as i64,
        };

        let age_min = raw
            .age_min
            .as_ref()
            .map(|input| parse_bounded("age_min", input, 0, Some(u32::MAX as i64)))
            .transpose()?;
        let age_max = raw
            .age_max
            .as_ref()
            .map(|input| parse_bounded("age_max", input, 0, Some(u32::MAX as i64)))
            .transpose()?;

        Ok(Self {
            customer_name: non_blank(raw.customer_name),
            phone: non_blank(raw.phone),
            region: raw.region.and_then(MultiValueInput::into_value_set),
            gender: raw.gender.and_then(MultiValueInput::into_value_set),
            product_category: raw.product_category.and_then(MultiValueInput::into_value_set),
            tag: raw.tag.and_then(MultiValueInput::into_value_set),
            payment_method: raw.payment_method.and_then(MultiValueInput::into_value_set),
            age_min: age_min.map(|v| v as u32),
            age_max: age_max.map(|v| v as u32),
            date_from: parse_date_param("date_from", raw.date_from)?,
            date_to: parse_date_param("date_to", raw.date_to)?,
            sort_by,
            order,
            page: page as usize,
            page_size: page_size as usize,
        })
    }

    /// Shorthand for `from_raw(RawSalesQuery::from_pairs(pairs))`
    pub fn from_pairs<I, K, V>(pairs: I) -> Result<Self, ValidationError>
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: Into<String>,
    {
        Self::from_raw(RawSalesQuery::from_pairs(pairs))
    }

    /// Whether any filter predicate is active
    pub fn has_active_filters(&self) -> bool {
        self.customer_name.is_some()
            || self.phone.is_some()
            || self.region.is_some()
            || self.gender.is_some()
            || self.product_category.is_some()
            || self.tag.is_some()
            || self.payment_method.is_some()
            || self.age_min.is_some()
            || self.age_max.is_some()
            || self.date_from.is_some()
            || self.date_to.is_some()
    }

    /// Zero-based index of the first row of the requested page
    pub fn offset(&self) -> usize {
        self.page.saturating_sub(1).saturating_mul(self.page_size)
    }
}

impl TryFrom<RawSalesQuery> for SalesQuery {
    type Error = ValidationError;

    fn try_from(raw: RawSalesQuery) -> Result<Self, Self::Error> {
        Self::from_raw(raw)
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

fn parse_bounded(
    field: &str,
    input: &ScalarInput,
    min: i64,
    max: Option<i64>,
) -> Result<i64, ValidationError> {
    let value = match input {
        ScalarInput::Integer(i) => *i,
        ScalarInput::Float(f) if f.fract() == 0.0 && f.is_finite() => *f as i64,
        ScalarInput::Float(f) => {
            return Err(ValidationError::invalid_value(field, f, "expected an integer"));
        }
        ScalarInput::Text(s) => s
            .trim()
            .parse::<i64>()
            .map_err(|_| ValidationError::invalid_value(field, s, "expected an integer"))?,
    };

    if value < min {
        return Err(ValidationError::out_of_range(
            field,
            value,
            &format!("must be >= {}", min),
        ));
    }
    if let Some(max) = max.filter(|max| value > *max) {
        return Err(ValidationError::out_of_range(
            field,
            value,
            &format!("must be <= {}", max),
        ));
    }
    Ok(value)
}

fn parse_date_param(field: &str, value: Option<String>) -> Result<Option<NaiveDate>, ValidationError> {
    match non_blank(value) {
        None => Ok(None),
        Some(raw) => NaiveDate::parse_from_str(raw.trim(), super::field::DATE_FORMAT)
            .map(Some)
            .map_err(|_| ValidationError::invalid_value(field, &raw, "expected YYYY-MM-DD")),
    }
}

/// Total number of pages for a result set; `0` when `page_size` is `0`
pub fn total_pages(total: usize, page_size: usize) -> usize {
    if page_size == 0 {
        0
    } else {
        total.div_ceil(page_size)
    }
}

/// One page of matching rows plus the pre-pagination match count
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResultPage {
    pub items: Vec<SalesRow>,
    /// Number of matching rows before pagination
    pub total: usize,
    pub page: usize,
    pub page_size: usize,
    pub total_pages: usize,
    /// Set when `total` is a statistics-based estimate (unfiltered remote query)
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub total_estimated: bool,
}

impl ResultPage {
    /// Create a page with an exact total
    pub fn new(items: Vec<SalesRow>, total: usize, query: &SalesQuery) -> Self {
        Self {
            items,
            total,
            page: query.page,
            page_size: query.page_size,
            total_pages: total_pages(total, query.page_size),
            total_estimated: false,
        }
    }

    /// Mark the total as an estimate
    pub fn estimated(mut self, estimated: bool) -> Self {
        self.total_estimated = estimated;
        self
    }
}
