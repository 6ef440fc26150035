//! Macro-generated test suite for the `QueryableSource` search contract.
//!
//! The `search_contract_tests!` macro generates a test module validating any
//! source arrangement serving the harness dataset: totals, paging coverage,
//! predicate conjunction, tag substring matching, nulls-last ordering and
//! validation-before-access.
//!
//! # Usage
//!
//! ```rust,ignore
//! #[macro_use]
//! mod source_harness;
//!
//! use source_harness::*;
//!
//! search_contract_tests!(in_memory, Fixture::in_memory());
//! ```
//!
//! # Generated Tests
//!
//! ## Totals and paging
//! - `test_unfiltered_total_is_row_count`
//! - `test_pages_cover_every_row_once`
//! - `test_page_past_end_is_empty`
//! - `test_repeated_query_is_identical`
//!
//! ## Predicates
//! - `test_age_bounds_hold_for_every_row`
//! - `test_region_and_age_scenario`
//! - `test_tag_is_substring_match`
//! - `test_tag_sorted_by_quantity_scenario`
//! - `test_multi_value_is_or_within_field`
//! - `test_name_search_is_case_insensitive`
//! - `test_inverted_bounds_match_nothing`
//!
//! ## Ordering
//! - `test_missing_dates_last_in_both_directions`
//! - `test_missing_quantity_last`

/// Generate a `QueryableSource` search contract suite.
///
/// `$factory` must evaluate to a `Fixture` serving the harness dataset. It is
/// re-evaluated for each test to ensure isolation.
#[macro_export]
macro_rules! search_contract_tests {
    ($name:ident, $factory:expr) => {
        mod $name {
            use super::*;
            use sales_query::prelude::*;

            fn dates(page: &ResultPage) -> Vec<String> {
                page.items
                    .iter()
                    .map(|row| row["date"].as_str().unwrap_or_default().to_string())
                    .collect()
            }

            // ==================================================================
            // Totals and paging
            // ==================================================================

            #[tokio::test]
            async fn test_unfiltered_total_is_row_count() {
                let fixture = $factory;
                let page = fixture.source.search(&SalesQuery::default()).await.unwrap();

                assert_eq!(page.total, ROWS.len());
                assert_eq!(page.page, 1);
                assert_eq!(page.page_size, 10);
                assert_eq!(page.total_pages, 1);
                assert_eq!(page.items.len(), ROWS.len());
            }

            #[tokio::test]
            async fn test_pages_cover_every_row_once() {
                let fixture = $factory;
                let first = fixture
                    .source
                    .search(&query(&[("page_size", "3")]))
                    .await
                    .unwrap();
                assert_eq!(first.total_pages, 4);

                let mut seen = Vec::new();
                let mut all_dates = Vec::new();
                for page in 1..=first.total_pages {
                    let page_str = page.to_string();
                    let result = fixture
                        .source
                        .search(&query(&[("page_size", "3"), ("page", page_str.as_str())]))
                        .await
                        .unwrap();
                    assert_eq!(result.total, ROWS.len());
                    seen.extend(ids(&result));
                    all_dates.extend(dates(&result));
                }

                let mut unique = seen.clone();
                unique.sort();
                unique.dedup();
                assert_eq!(seen.len(), ROWS.len());
                assert_eq!(unique.len(), ROWS.len());

                // Default order: date descending, missing dates last
                let present: Vec<&String> = all_dates.iter().filter(|d| !d.is_empty()).collect();
                assert!(present.windows(2).all(|w| w[0] >= w[1]));
                assert!(all_dates[present.len()..].iter().all(|d| d.is_empty()));
            }

            #[tokio::test]
            async fn test_page_past_end_is_empty() {
                let fixture = $factory;
                let page = fixture
                    .source
                    .search(&query(&[("page", "99"), ("page_size", "5")]))
                    .await
                    .unwrap();

                assert!(page.items.is_empty());
                assert_eq!(page.total, ROWS.len());
                assert_eq!(page.page, 99);
            }

            #[tokio::test]
            async fn test_repeated_query_is_identical() {
                let fixture = $factory;
                let q = query(&[("gender", "Female"), ("sort_by", "customer_name")]);
                let a = fixture.source.search(&q).await.unwrap();
                let b = fixture.source.search(&q).await.unwrap();
                assert_eq!(a, b);
            }

            // ==================================================================
            // Predicates
            // ==================================================================

            #[tokio::test]
            async fn test_age_bounds_hold_for_every_row() {
                let fixture = $factory;
                let page = fixture
                    .source
                    .search(&query(&[("age_min", "30"), ("age_max", "50")]))
                    .await
                    .unwrap();

                assert_eq!(page.total, 4);
                for row in &page.items {
                    let age = row["age"].as_i64().unwrap();
                    assert!((30..=50).contains(&age), "age {} out of bounds", age);
                }
            }

            #[tokio::test]
            async fn test_region_and_age_scenario() {
                let fixture = $factory;
                let page = fixture
                    .source
                    .search(&query(&[("region", "North"), ("age_min", "30")]))
                    .await
                    .unwrap();

                assert_eq!(page.total, 1);
                assert_eq!(ids(&page), vec!["T03"]);
            }

            #[tokio::test]
            async fn test_tag_is_substring_match() {
                let fixture = $factory;
                let page = fixture
                    .source
                    .search(&query(&[("tag", "CAS")]))
                    .await
                    .unwrap();

                let mut matched = ids(&page);
                matched.sort();
                assert_eq!(matched, vec!["T03", "T08"]);
            }

            #[tokio::test]
            async fn test_tag_sorted_by_quantity_scenario() {
                let fixture = $factory;
                let page = fixture
                    .source
                    .search(&query(&[
                        ("tag", "beauty"),
                        ("sort_by", "quantity"),
                        ("order", "asc"),
                        ("page", "1"),
                        ("page_size", "2"),
                    ]))
                    .await
                    .unwrap();

                let quantities: Vec<i64> = page
                    .items
                    .iter()
                    .map(|row| row["quantity"].as_i64().unwrap())
                    .collect();
                assert_eq!(quantities, vec![1, 2]);
                assert_eq!(page.total, 5);
                assert_eq!(page.total_pages, 3);
            }

            #[tokio::test]
            async fn test_multi_value_is_or_within_field() {
                let fixture = $factory;
                let joined = fixture
                    .source
                    .search(&query(&[("region", "East,West"), ("gender", "Female")]))
                    .await
                    .unwrap();
                let repeated = fixture
                    .source
                    .search(&query(&[("region", "East"), ("region", " West "), ("gender", "Female")]))
                    .await
                    .unwrap();

                let mut matched = ids(&joined);
                matched.sort();
                assert_eq!(matched, vec!["T05", "T07", "T09"]);
                assert_eq!(joined, repeated);
            }

            #[tokio::test]
            async fn test_name_search_is_case_insensitive() {
                let fixture = $factory;
                let page = fixture
                    .source
                    .search(&query(&[("customer_name", "ALICE")]))
                    .await
                    .unwrap();
                assert_eq!(ids(&page), vec!["T01"]);

                let page = fixture
                    .source
                    .search(&query(&[("phone", "00000000")]))
                    .await
                    .unwrap();
                assert_eq!(page.total, 9);
            }

            #[tokio::test]
            async fn test_inverted_bounds_match_nothing() {
                let fixture = $factory;
                let page = fixture
                    .source
                    .search(&query(&[("age_min", "50"), ("age_max", "20")]))
                    .await
                    .unwrap();
                assert_eq!(page.total, 0);
                assert_eq!(page.total_pages, 0);

                let page = fixture
                    .source
                    .search(&query(&[("date_from", "2023-12-01"), ("date_to", "2023-01-01")]))
                    .await
                    .unwrap();
                assert!(page.items.is_empty());
            }

            // ==================================================================
            // Ordering
            // ==================================================================

            #[tokio::test]
            async fn test_missing_dates_last_in_both_directions() {
                let fixture = $factory;
                for order in ["asc", "desc"] {
                    let page = fixture
                        .source
                        .search(&query(&[("sort_by", "date"), ("order", order)]))
                        .await
                        .unwrap();
                    let dates = dates(&page);

                    let present = dates.iter().take_while(|d| !d.is_empty()).count();
                    assert_eq!(present, ROWS.len() - 2, "order {}", order);
                    assert!(dates[present..].iter().all(|d| d.is_empty()));

                    let sorted_ok = dates[..present].windows(2).all(|w| match order {
                        "asc" => w[0] <= w[1],
                        _ => w[0] >= w[1],
                    });
                    assert!(sorted_ok, "order {}: {:?}", order, dates);
                }
            }

            #[tokio::test]
            async fn test_missing_quantity_last() {
                let fixture = $factory;
                let page = fixture
                    .source
                    .search(&query(&[("sort_by", "quantity"), ("order", "desc")]))
                    .await
                    .unwrap();

                assert_eq!(ids(&page).last().map(String::as_str), Some("T10"));
                assert_eq!(page.items[0]["quantity"], serde_json::json!(8));
            }
        }
    };
}
