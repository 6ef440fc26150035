//! Filter, sort and paginate over a materialized sales table
//!
//! These functions are the reference semantics for every data source: the
//! remote translator has to reproduce exactly what happens here.
//!
//! - Active predicates are AND-ed. A predicate is skipped when its descriptor
//!   field is absent or when the column is missing from the table schema.
//! - Rows with a missing sort key go last in both directions, and ties are
//!   broken by ascending `transaction_id`, as the remote `order` clause does.
//!   Sorting by a column the table lacks keeps the input order.
//! - Text comparison is by Unicode scalar value and substring matching uses
//!   `str::to_lowercase`. The remote store applies its own collation and
//!   `ILIKE` folding, so mixed-case or non-ASCII names may sort or match
//!   differently there.
//! - `total` counts matching rows before pagination; pages past the end are
//!   empty.

use super::field::FieldValue;
use super::query::{ResultPage, SalesQuery, SortOrder, ValueSet};
use super::record::{SalesRecord, SalesTable, columns};
use chrono::NaiveDate;
use std::cmp::Ordering;

/// A single active filter condition
#[derive(Debug, Clone, PartialEq)]
pub enum Predicate<'q> {
    /// Case-insensitive substring of a text column; missing cells never match
    Contains { column: &'static str, needle: String },
    /// Cell equals one of the values
    OneOf {
        column: &'static str,
        values: &'q ValueSet,
    },
    /// Lower-cased tags cell contains any of the (lower-cased) needles
    TagsContainAny(Vec<String>),
    AgeAtLeast(i64),
    AgeAtMost(i64),
    DateFrom(NaiveDate),
    DateTo(NaiveDate),
}

impl Predicate<'_> {
    /// Column the predicate reads
    pub fn column(&self) -> &'static str {
        match self {
            Predicate::Contains { column, .. } | Predicate::OneOf { column, .. } => *column,
            Predicate::TagsContainAny(_) => columns::TAGS,
            Predicate::AgeAtLeast(_) | Predicate::AgeAtMost(_) => columns::AGE,
            Predicate::DateFrom(_) | Predicate::DateTo(_) => columns::DATE,
        }
    }

    pub fn matches(&self, record: &SalesRecord) -> bool {
        match self {
            Predicate::Contains { column, needle } => match record.field_value(column) {
                FieldValue::String(cell) => cell.to_lowercase().contains(needle.as_str()),
                _ => false,
            },
            Predicate::OneOf { column, values } => record
                .field_value(column)
                .as_string()
                .is_some_and(|cell| values.contains(cell)),
            Predicate::TagsContainAny(needles) => {
                let cell = record.tags.to_lowercase();
                needles.iter().any(|tag| cell.contains(tag.as_str()))
            }
            Predicate::AgeAtLeast(min) => record.age.is_some_and(|age| age >= *min),
            Predicate::AgeAtMost(max) => record.age.is_some_and(|age| age <= *max),
            Predicate::DateFrom(from) => record.date.is_some_and(|date| date >= *from),
            Predicate::DateTo(to) => record.date.is_some_and(|date| date <= *to),
        }
    }
}

/// Every predicate the query activates, regardless of schema
pub fn predicates(query: &SalesQuery) -> Vec<Predicate<'_>> {
    let mut active = Vec::new();

    if let Some(name) = &query.customer_name {
        active.push(Predicate::Contains {
            column: columns::CUSTOMER_NAME,
            needle: name.to_lowercase(),
        });
    }
    if let Some(phone) = &query.phone {
        active.push(Predicate::Contains {
            column: columns::PHONE_NUMBER,
            needle: phone.to_lowercase(),
        });
    }

    let sets = [
        (columns::CUSTOMER_REGION, &query.region),
        (columns::GENDER, &query.gender),
        (columns::PRODUCT_CATEGORY, &query.product_category),
        (columns::PAYMENT_METHOD, &query.payment_method),
    ];
    for (column, values) in sets {
        if let Some(values) = values {
            active.push(Predicate::OneOf { column, values });
        }
    }

    if let Some(tags) = &query.tag {
        active.push(Predicate::TagsContainAny(
            tags.iter().map(str::to_lowercase).collect(),
        ));
    }
    if let Some(min) = query.age_min {
        active.push(Predicate::AgeAtLeast(i64::from(min)));
    }
    if let Some(max) = query.age_max {
        active.push(Predicate::AgeAtMost(i64::from(max)));
    }
    if let Some(from) = query.date_from {
        active.push(Predicate::DateFrom(from));
    }
    if let Some(to) = query.date_to {
        active.push(Predicate::DateTo(to));
    }

    active
}

/// Keep the rows matching every applicable predicate, in table order
pub fn apply_filters<'a>(table: &'a SalesTable, query: &SalesQuery) -> Vec<&'a SalesRecord> {
    let applicable: Vec<Predicate<'_>> = predicates(query)
        .into_iter()
        .filter(|p| table.has_column(p.column()))
        .collect();

    table
        .records()
        .iter()
        .filter(|record| applicable.iter().all(|p| p.matches(record)))
        .collect()
}

/// Sort by the query's column, missing keys last in both directions and
/// ties in `transaction_id` order
pub fn apply_sort<'a>(
    table: &SalesTable,
    rows: Vec<&'a SalesRecord>,
    query: &SalesQuery,
) -> Vec<&'a SalesRecord> {
    let column = query.sort_by.column();
    if !table.has_column(column) {
        return rows;
    }

    let mut keyed: Vec<(FieldValue, &'a SalesRecord)> = rows
        .into_iter()
        .map(|record| (record.field_value(column), record))
        .collect();
    keyed.sort_by(|(a, left), (b, right)| {
        compare_keys(a, b, query.order)
            .then_with(|| left.transaction_id.cmp(&right.transaction_id))
    });
    keyed.into_iter().map(|(_, record)| record).collect()
}

/// Order two sort keys; nulls are placed last whatever the direction
pub fn compare_keys(a: &FieldValue, b: &FieldValue, order: SortOrder) -> Ordering {
    match (a.is_null(), b.is_null()) {
        (true, true) => Ordering::Equal,
        (true, false) => Ordering::Greater,
        (false, true) => Ordering::Less,
        (false, false) => {
            let ordering = a.partial_cmp_same_kind(b).unwrap_or(Ordering::Equal);
            if order.is_ascending() {
                ordering
            } else {
                ordering.reverse()
            }
        }
    }
}

/// Slice the requested page; out-of-range pages are empty
pub fn apply_pagination<'r, 'a>(
    rows: &'r [&'a SalesRecord],
    query: &SalesQuery,
) -> &'r [&'a SalesRecord] {
    let start = query.offset().min(rows.len());
    let end = start.saturating_add(query.page_size).min(rows.len());
    &rows[start..end]
}

/// Result of running a query against a table
#[derive(Debug, Clone)]
pub struct Evaluation<'a> {
    /// All matching rows in sorted order
    pub sorted: Vec<&'a SalesRecord>,
    /// Number of matching rows
    pub total: usize,
}

impl<'a> Evaluation<'a> {
    pub fn page(&self, query: &SalesQuery) -> &[&'a SalesRecord] {
        apply_pagination(&self.sorted, query)
    }
}

/// Filter then sort
pub fn evaluate<'a>(table: &'a SalesTable, query: &SalesQuery) -> Evaluation<'a> {
    let matching = apply_filters(table, query);
    let total = matching.len();
    let sorted = apply_sort(table, matching, query);
    Evaluation { sorted, total }
}

/// Filter, sort and paginate, projecting the page onto the table's columns
pub fn search(table: &SalesTable, query: &SalesQuery) -> ResultPage {
    let evaluation = evaluate(table, query);
    let items = evaluation
        .page(query)
        .iter()
        .map(|record| record.to_row(table.columns()))
        .collect();
    ResultPage::new(items, evaluation.total, query)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::query::SortField;

    fn date(y: i32, m: u32, d: u32) -> Option<NaiveDate> {
        NaiveDate::from_ymd_opt(y, m, d)
    }

    fn rec(id: &str) -> SalesRecord {
        SalesRecord {
            transaction_id: id.to_string(),
            ..Default::default()
        }
    }

    fn ids(rows: &[&SalesRecord]) -> Vec<String> {
        rows.iter().map(|r| r.transaction_id.clone()).collect()
    }

    fn query(pairs: &[(&str, &str)]) -> SalesQuery {
        SalesQuery::from_pairs(pairs.iter().copied()).unwrap()
    }

    fn people() -> SalesTable {
        SalesTable::with_canonical_columns(vec![
            SalesRecord {
                age: Some(25),
                customer_region: Some("North".into()),
                customer_name: "Alice Smith".into(),
                ..rec("A")
            },
            SalesRecord {
                age: Some(40),
                customer_region: Some("South".into()),
                customer_name: "Bob Stone".into(),
                ..rec("B")
            },
            SalesRecord {
                age: Some(60),
                customer_region: Some("North".into()),
                customer_name: "carol SMITHERS".into(),
                ..rec("C")
            },
            SalesRecord {
                age: None,
                customer_region: Some("North".into()),
                ..rec("D")
            },
        ])
    }

    #[test]
    fn test_region_and_age_are_conjunctive() {
        let table = people();
        let rows = apply_filters(&table, &query(&[("region", "North"), ("age_min", "30")]));
        assert_eq!(ids(&rows), vec!["C"]);
    }

    #[test]
    fn test_name_match_is_case_insensitive_substring() {
        let table = people();
        let rows = apply_filters(&table, &query(&[("customer_name", "smith")]));
        assert_eq!(ids(&rows), vec!["A", "C"]);
    }

    #[test]
    fn test_asterisk_matches_literally() {
        let table = SalesTable::with_canonical_columns(vec![
            SalesRecord {
                customer_name: "Abz Traders".into(),
                ..rec("1")
            },
            SalesRecord {
                customer_name: "A*Z Mart".into(),
                ..rec("2")
            },
        ]);
        let rows = apply_filters(&table, &query(&[("customer_name", "a*z")]));
        assert_eq!(ids(&rows), vec!["2"]);
    }

    #[test]
    fn test_missing_age_is_excluded_from_bounded_query() {
        let table = people();
        let rows = apply_filters(&table, &query(&[("age_max", "100")]));
        assert_eq!(ids(&rows), vec!["A", "B", "C"]);
    }

    #[test]
    fn test_inverted_age_bounds_match_nothing() {
        let table = people();
        let rows = apply_filters(&table, &query(&[("age_min", "50"), ("age_max", "30")]));
        assert!(rows.is_empty());
    }

    #[test]
    fn test_tag_is_substring_of_joined_cell() {
        let table = SalesTable::with_canonical_columns(vec![
            SalesRecord {
                tags: "Casual, formal".into(),
                ..rec("1")
            },
            SalesRecord {
                tags: "organic".into(),
                ..rec("2")
            },
        ]);
        let rows = apply_filters(&table, &query(&[("tag", "cas")]));
        assert_eq!(ids(&rows), vec!["1"]);

        let rows = apply_filters(&table, &query(&[("tag", "ORGAN,nothing")]));
        assert_eq!(ids(&rows), vec!["2"]);
    }

    #[test]
    fn test_predicate_on_absent_column_is_skipped() {
        let table = SalesTable::new(
            vec!["transaction_id".into(), "age".into()],
            vec![
                SalesRecord {
                    age: Some(45),
                    ..rec("1")
                },
                SalesRecord {
                    age: Some(20),
                    ..rec("2")
                },
            ],
        );
        let rows = apply_filters(&table, &query(&[("region", "North"), ("age_min", "30")]));
        assert_eq!(ids(&rows), vec!["1"]);
    }

    #[test]
    fn test_date_bounds_inclusive_and_exclude_missing() {
        let table = SalesTable::with_canonical_columns(vec![
            SalesRecord {
                date: date(2023, 1, 1),
                ..rec("1")
            },
            SalesRecord {
                date: date(2023, 6, 15),
                ..rec("2")
            },
            SalesRecord {
                date: None,
                ..rec("3")
            },
            SalesRecord {
                date: date(2023, 12, 31),
                ..rec("4")
            },
        ]);
        let rows = apply_filters(
            &table,
            &query(&[("date_from", "2023-01-01"), ("date_to", "2023-06-15")]),
        );
        assert_eq!(ids(&rows), vec!["1", "2"]);
    }

    #[test]
    fn test_missing_dates_sort_last_in_both_directions() {
        let table = SalesTable::with_canonical_columns(vec![
            SalesRecord {
                date: None,
                ..rec("n1")
            },
            SalesRecord {
                date: date(2022, 5, 1),
                ..rec("old")
            },
            SalesRecord {
                date: None,
                ..rec("n2")
            },
            SalesRecord {
                date: date(2024, 5, 1),
                ..rec("new")
            },
        ]);

        let mut q = SalesQuery::default();
        q.sort_by = SortField::Date;

        q.order = SortOrder::Asc;
        let sorted = evaluate(&table, &q).sorted;
        assert_eq!(ids(&sorted), vec!["old", "new", "n1", "n2"]);

        q.order = SortOrder::Desc;
        let sorted = evaluate(&table, &q).sorted;
        assert_eq!(ids(&sorted), vec!["new", "old", "n1", "n2"]);
    }

    #[test]
    fn test_ties_break_on_transaction_id() {
        let table = SalesTable::with_canonical_columns(
            ["c", "a", "b"]
                .iter()
                .map(|id| SalesRecord {
                    quantity: Some(1),
                    ..rec(id)
                })
                .collect(),
        );
        let q = query(&[("sort_by", "quantity"), ("order", "desc")]);
        assert_eq!(ids(&evaluate(&table, &q).sorted), vec!["a", "b", "c"]);

        let q = query(&[("sort_by", "quantity"), ("order", "asc")]);
        assert_eq!(ids(&evaluate(&table, &q).sorted), vec!["a", "b", "c"]);
    }

    #[test]
    fn test_sort_on_absent_column_keeps_order() {
        let table = SalesTable::new(
            vec!["transaction_id".into()],
            vec![
                SalesRecord {
                    quantity: Some(9),
                    ..rec("x")
                },
                SalesRecord {
                    quantity: Some(1),
                    ..rec("y")
                },
            ],
        );
        let q = query(&[("sort_by", "quantity"), ("order", "asc")]);
        assert_eq!(ids(&evaluate(&table, &q).sorted), vec!["x", "y"]);
    }

    #[test]
    fn test_tagged_quantities_first_page() {
        let table = SalesTable::with_canonical_columns(
            [3, 1, 5, 2, 4]
                .iter()
                .enumerate()
                .map(|(i, q)| SalesRecord {
                    quantity: Some(*q),
                    tags: "beauty, skincare".into(),
                    ..rec(&format!("T{}", i))
                })
                .collect(),
        );
        let q = query(&[
            ("tag", "beauty"),
            ("sort_by", "quantity"),
            ("order", "asc"),
            ("page", "1"),
            ("page_size", "2"),
        ]);
        let page = search(&table, &q);

        assert_eq!(page.total, 5);
        assert_eq!(page.total_pages, 3);
        let quantities: Vec<_> = page.items.iter().map(|row| row["quantity"].clone()).collect();
        assert_eq!(quantities, vec![serde_json::json!(1), serde_json::json!(2)]);
    }

    #[test]
    fn test_page_past_end_is_empty_with_total() {
        let table = people();
        let page = search(&table, &query(&[("page", "9"), ("page_size", "2")]));
        assert!(page.items.is_empty());
        assert_eq!(page.total, 4);
        assert_eq!(page.page, 9);
    }

    #[test]
    fn test_predicates_inventory() {
        let q = query(&[
            ("customer_name", "a"),
            ("phone", "9"),
            ("region", "North"),
            ("tag", "x"),
            ("age_min", "1"),
            ("date_to", "2024-01-01"),
        ]);
        let columns: Vec<_> = predicates(&q).iter().map(Predicate::column).collect();
        assert_eq!(
            columns,
            vec!["customer_name", "phone_number", "customer_region", "tags", "age", "date"]
        );
    }
}
