//! Translation of sales queries into PostgREST selects
//!
//! The translated request must select exactly the rows, in exactly the
//! order, that [`crate::core::engine`] would produce over the same data:
//!
//! - substring filters use `ilike` with `%` wildcards and LIKE metacharacters
//!   escaped; PostgREST reads every `*` in a LIKE pattern as `%`, so input
//!   containing `*` is sent as an escaped case-insensitive regex (`imatch`)
//! - multi-value filters become `in.(...)`, tags an `or=(...)` of `ilike`s
//! - ordering puts nulls last and breaks ties on `transaction_id`

use crate::core::query::SalesQuery;
use crate::core::record::columns;
use serde::{Deserialize, Serialize};
use std::fmt;

/// How the store should count matching rows
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CountStrategy {
    /// `count(*)` over the filtered set
    Exact,
    /// Planner statistics, exact below a threshold
    #[default]
    Estimated,
    /// Planner statistics only
    Planned,
}

impl CountStrategy {
    pub fn as_str(&self) -> &'static str {
        match self {
            CountStrategy::Exact => "exact",
            CountStrategy::Estimated => "estimated",
            CountStrategy::Planned => "planned",
        }
    }

    pub fn is_exact(&self) -> bool {
        matches!(self, CountStrategy::Exact)
    }
}

impl fmt::Display for CountStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One select against a table, as URL query pairs plus a count preference
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectRequest {
    pub table: String,
    /// Query string pairs, in order; keys may repeat (AND semantics)
    pub params: Vec<(String, String)>,
    /// `Prefer: count=...` header, if any
    pub count: Option<CountStrategy>,
}

impl SelectRequest {
    /// Translate a search into a single select
    ///
    /// An exact count is requested whenever a filter is active; unfiltered
    /// queries use `unfiltered_count`.
    pub fn search(table: &str, query: &SalesQuery, unfiltered_count: CountStrategy) -> Self {
        let mut params = vec![("select".to_string(), "*".to_string())];

        let mut push = |key: &str, value: String| params.push((key.to_string(), value));

        if let Some(name) = &query.customer_name {
            let (operator, pattern) = contains(name);
            push(columns::CUSTOMER_NAME, format!("{}.{}", operator, pattern));
        }
        if let Some(phone) = &query.phone {
            let (operator, pattern) = contains(phone);
            push(columns::PHONE_NUMBER, format!("{}.{}", operator, pattern));
        }

        let sets = [
            (columns::CUSTOMER_REGION, &query.region),
            (columns::GENDER, &query.gender),
            (columns::PRODUCT_CATEGORY, &query.product_category),
            (columns::PAYMENT_METHOD, &query.payment_method),
        ];
        for (column, values) in sets {
            if let Some(values) = values {
                let list: Vec<String> = values.iter().map(quote).collect();
                push(column, format!("in.({})", list.join(",")));
            }
        }

        if let Some(tags) = &query.tag {
            let alternatives: Vec<String> = tags
                .iter()
                .map(|tag| {
                    let (operator, pattern) = contains(tag);
                    format!("{}.{}.{}", columns::TAGS, operator, quote(&pattern))
                })
                .collect();
            push("or", format!("({})", alternatives.join(",")));
        }

        if let Some(min) = query.age_min {
            push(columns::AGE, format!("gte.{}", min));
        }
        if let Some(max) = query.age_max {
            push(columns::AGE, format!("lte.{}", max));
        }
        if let Some(from) = query.date_from {
            push(columns::DATE, format!("gte.{}", from.format("%Y-%m-%d")));
        }
        if let Some(to) = query.date_to {
            push(columns::DATE, format!("lte.{}", to.format("%Y-%m-%d")));
        }

        push(
            "order",
            format!(
                "{}.{}.nullslast,{}.asc",
                query.sort_by.column(),
                query.order.as_str(),
                columns::TRANSACTION_ID
            ),
        );
        push("offset", query.offset().to_string());
        push("limit", query.page_size.to_string());

        let count = if query.has_active_filters() {
            CountStrategy::Exact
        } else {
            unfiltered_count
        };

        Self {
            table: table.to_string(),
            params,
            count: Some(count),
        }
    }

    /// Non-null values of one column, for catalog sampling
    pub fn sample(table: &str, column: &str, limit: usize) -> Self {
        Self {
            table: table.to_string(),
            params: vec![
                ("select".to_string(), column.to_string()),
                (column.to_string(), "not.is.null".to_string()),
                ("limit".to_string(), limit.to_string()),
            ],
            count: None,
        }
    }

    /// Values of `key`, in order
    pub fn values<'a>(&'a self, key: &'a str) -> impl Iterator<Item = &'a str> + 'a {
        self.params
            .iter()
            .filter(move |(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }
}

/// Operator and pattern for a case-insensitive literal substring match
fn contains(needle: &str) -> (&'static str, String) {
    if needle.contains('*') {
        ("imatch", escape_regex(needle))
    } else {
        ("ilike", format!("%{}%", escape_like(needle)))
    }
}

/// Escape POSIX regex metacharacters so user input matches literally
fn escape_regex(raw: &str) -> String {
    let mut escaped = String::with_capacity(raw.len());
    for c in raw.chars() {
        if matches!(
            c,
            '\\' | '.' | '^' | '$' | '|' | '?' | '*' | '+' | '(' | ')' | '[' | ']' | '{' | '}'
        ) {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

/// Escape LIKE metacharacters so user input matches literally
fn escape_like(raw: &str) -> String {
    let mut escaped = String::with_capacity(raw.len());
    for c in raw.chars() {
        if matches!(c, '\\' | '%' | '_') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

/// Double-quote a value for use inside `in.(...)` or `or=(...)`
fn quote(raw: &str) -> String {
    let mut quoted = String::with_capacity(raw.len() + 2);
    quoted.push('"');
    for c in raw.chars() {
        if matches!(c, '"' | '\\') {
            quoted.push('\\');
        }
        quoted.push(c);
    }
    quoted.push('"');
    quoted
}

/// Total from a `Content-Range` header such as `0-9/1234` or `*/0`
///
/// `None` when the total is unknown (`0-9/*`) or the header is malformed.
pub fn parse_content_range(header: &str) -> Option<usize> {
    let (_, total) = header.trim().rsplit_once('/')?;
    total.trim().parse().ok()
}
