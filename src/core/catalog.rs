//! Distinct-value catalog for populating filter UIs

use super::record::{SalesRecord, SalesTable, columns};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Distinct filter values per field, each sorted and deduplicated
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MetadataCatalog {
    pub regions: BTreeSet<String>,
    pub genders: BTreeSet<String>,
    pub product_categories: BTreeSet<String>,
    pub tags: BTreeSet<String>,
    pub payment_methods: BTreeSet<String>,
}

/// One of the five catalog fields, with the column it is derived from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CatalogField {
    Regions,
    Genders,
    ProductCategories,
    Tags,
    PaymentMethods,
}

impl CatalogField {
    pub const ALL: [CatalogField; 5] = [
        CatalogField::Regions,
        CatalogField::Genders,
        CatalogField::ProductCategories,
        CatalogField::Tags,
        CatalogField::PaymentMethods,
    ];

    pub fn column(&self) -> &'static str {
        match self {
            CatalogField::Regions => columns::CUSTOMER_REGION,
            CatalogField::Genders => columns::GENDER,
            CatalogField::ProductCategories => columns::PRODUCT_CATEGORY,
            CatalogField::Tags => columns::TAGS,
            CatalogField::PaymentMethods => columns::PAYMENT_METHOD,
        }
    }

    /// Key of the field in the serialized catalog
    pub fn key(&self) -> &'static str {
        match self {
            CatalogField::Regions => "regions",
            CatalogField::Genders => "genders",
            CatalogField::ProductCategories => "product_categories",
            CatalogField::Tags => "tags",
            CatalogField::PaymentMethods => "payment_methods",
        }
    }
}

impl MetadataCatalog {
    /// Hard-coded values known to exist in the dataset
    ///
    /// The served catalog is always a superset of this, whatever sources
    /// were reachable.
    pub fn baseline() -> Self {
        fn set(values: &[&str]) -> BTreeSet<String> {
            values.iter().map(|v| v.to_string()).collect()
        }

        Self {
            regions: set(&["Central", "East", "North", "South", "West"]),
            genders: set(&["Female", "Male"]),
            product_categories: set(&["Beauty", "Clothing", "Electronics"]),
            tags: set(&[
                "accessories",
                "beauty",
                "casual",
                "cotton",
                "fashion",
                "formal",
                "fragrance-free",
                "gadgets",
                "makeup",
                "organic",
                "portable",
                "skincare",
                "smart",
                "unisex",
                "wireless",
            ]),
            payment_methods: set(&[
                "Cash",
                "Credit Card",
                "Debit Card",
                "Net Banking",
                "UPI",
                "Wallet",
            ]),
        }
    }

    /// Derive the catalog from a materialized table
    ///
    /// Fields whose column is absent from the table schema stay empty.
    pub fn from_table(table: &SalesTable) -> Self {
        let mut catalog = Self::default();
        for field in CatalogField::ALL {
            if !table.has_column(field.column()) {
                continue;
            }
            for record in table.records() {
                catalog.insert_cell(field, cell(record, field));
            }
        }
        catalog
    }

    /// Add one raw cell of `field`; tags cells are tokenized
    pub fn insert_cell(&mut self, field: CatalogField, raw: Option<&str>) {
        let Some(raw) = raw else {
            return;
        };
        match field {
            CatalogField::Tags => self.tags.extend(tokenize_tags(raw)),
            other => {
                let value = raw.trim();
                if !value.is_empty() {
                    self.field_mut(other).insert(value.to_string());
                }
            }
        }
    }

    pub fn field(&self, field: CatalogField) -> &BTreeSet<String> {
        match field {
            CatalogField::Regions => &self.regions,
            CatalogField::Genders => &self.genders,
            CatalogField::ProductCategories => &self.product_categories,
            CatalogField::Tags => &self.tags,
            CatalogField::PaymentMethods => &self.payment_methods,
        }
    }

    fn field_mut(&mut self, field: CatalogField) -> &mut BTreeSet<String> {
        match field {
            CatalogField::Regions => &mut self.regions,
            CatalogField::Genders => &mut self.genders,
            CatalogField::ProductCategories => &mut self.product_categories,
            CatalogField::Tags => &mut self.tags,
            CatalogField::PaymentMethods => &mut self.payment_methods,
        }
    }

    /// Union another catalog into this one
    pub fn merge(&mut self, other: MetadataCatalog) {
        self.regions.extend(other.regions);
        self.genders.extend(other.genders);
        self.product_categories.extend(other.product_categories);
        self.tags.extend(other.tags);
        self.payment_methods.extend(other.payment_methods);
    }

    /// Union with trimming and tag tokenization applied to `other`
    ///
    /// Used for catalogs that come from outside the process.
    pub fn merge_normalized(&mut self, other: MetadataCatalog) {
        for field in CatalogField::ALL {
            for value in other.field(field) {
                self.insert_cell(field, Some(value.as_str()));
            }
        }
    }

    /// Whether every value of `other` is present in `self`
    pub fn is_superset(&self, other: &MetadataCatalog) -> bool {
        CatalogField::ALL
            .iter()
            .all(|f| self.field(*f).is_superset(other.field(*f)))
    }
}

/// Split a comma-separated tags cell into trimmed, non-empty tokens
pub fn tokenize_tags(raw: &str) -> impl Iterator<Item = String> + '_ {
    raw.split(',')
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .map(str::to_string)
}

fn cell(record: &SalesRecord, field: CatalogField) -> Option<&str> {
    match field {
        CatalogField::Regions => record.customer_region.as_deref(),
        CatalogField::Genders => record.gender.as_deref(),
        CatalogField::ProductCategories => record.product_category.as_deref(),
        CatalogField::Tags => Some(record.tags.as_str()),
        CatalogField::PaymentMethods => record.payment_method.as_deref(),
    }
}
