//! Static catalog of report templates.
//!
//! The catalog is built once on first access and never changes at runtime.
//! Each [`ReportTemplate`] lists the filters a user must fill before a report
//! can be generated.

use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};

/// How a filter value is entered.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum FilterKind {
    /// Free text input.
    Text,
    /// Choice from a fixed set of options.
    Enumerated { options: Vec<String> },
}

impl FilterKind {
    /// Returns the allowed options, or an empty slice for free text.
    pub fn options(&self) -> &[String] {
        match self {
            FilterKind::Text => &[],
            FilterKind::Enumerated { options } => options,
        }
    }
}

/// One input required by a template.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilterSpec {
    pub id: String,
    pub label: String,
    #[serde(flatten)]
    pub kind: FilterKind,
}

impl FilterSpec {
    fn text(id: &str, label: &str) -> Self {
        Self {
            id: id.to_string(),
            label: label.to_string(),
            kind: FilterKind::Text,
        }
    }

    fn enumerated(id: &str, label: &str, options: &[&str]) -> Self {
        Self {
            id: id.to_string(),
            label: label.to_string(),
            kind: FilterKind::Enumerated {
                options: options.iter().map(|o| o.to_string()).collect(),
            },
        }
    }
}

/// Definition of a report type and the filters it requires.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReportTemplate {
    pub id: String,
    pub name: String,
    pub description: String,
    pub filters: Vec<FilterSpec>,
}

impl ReportTemplate {
    /// Looks up one of this template's filters by id.
    pub fn filter(&self, filter_id: &str) -> Option<&FilterSpec> {
        self.filters.iter().find(|f| f.id == filter_id)
    }

    /// Returns `true` if `filter_id` is one of this template's filters.
    pub fn has_filter(&self, filter_id: &str) -> bool {
        self.filter(filter_id).is_some()
    }
}

static CATALOG: Lazy<Vec<ReportTemplate>> = Lazy::new(|| {
    vec![
        ReportTemplate {
            id: "sales".to_string(),
            name: "Sales Report".to_string(),
            description: "Revenue and units sold, broken down by region and product category"
                .to_string(),
            filters: vec![
                FilterSpec::text("dateRange", "Date Range"),
                FilterSpec::enumerated("region", "Region", &["North", "South", "East", "West"]),
                FilterSpec::enumerated(
                    "productCategory",
                    "Product Category",
                    &["Electronics", "Clothing", "Food", "Books"],
                ),
            ],
        },
        ReportTemplate {
            id: "inventory".to_string(),
            name: "Inventory Report".to_string(),
            description: "Stock levels per warehouse".to_string(),
            filters: vec![
                FilterSpec::enumerated(
                    "warehouse",
                    "Warehouse",
                    &["Main", "Secondary", "Overflow"],
                ),
                FilterSpec::enumerated(
                    "stockStatus",
                    "Stock Status",
                    &["In Stock", "Low Stock", "Out of Stock"],
                ),
            ],
        },
        ReportTemplate {
            id: "customer".to_string(),
            name: "Customer Report".to_string(),
            description: "Customer activity and purchase totals by segment".to_string(),
            filters: vec![
                FilterSpec::text("dateRange", "Date Range"),
                FilterSpec::enumerated(
                    "customerSegment",
                    "Customer Segment",
                    &["Retail", "Wholesale", "Enterprise"],
                ),
                FilterSpec::text("minPurchase", "Minimum Purchase"),
            ],
        },
    ]
});

/// All templates, in display order.
pub fn templates() -> &'static [ReportTemplate] {
    &CATALOG
}

/// Looks up a template by id.
pub fn find_template(id: &str) -> Option<&'static ReportTemplate> {
    CATALOG.iter().find(|t| t.id == id)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_catalog_has_three_templates() {
        let ids: Vec<&str> = templates().iter().map(|t| t.id.as_str()).collect();
        assert_eq!(ids, ["sales", "inventory", "customer"]);
    }

    #[test]
    fn test_template_ids_unique() {
        let ids: HashSet<&str> = templates().iter().map(|t| t.id.as_str()).collect();
        assert_eq!(ids.len(), templates().len());
    }

    #[test]
    fn test_filter_ids_unique_within_template() {
        for template in templates() {
            let ids: HashSet<&str> = template.filters.iter().map(|f| f.id.as_str()).collect();
            assert_eq!(ids.len(), template.filters.len(), "{}", template.id);
        }
    }

    #[test]
    fn test_sales_template_filters() {
        let sales = find_template("sales").unwrap();
        assert_eq!(sales.name, "Sales Report");
        assert!(sales.has_filter("region"));
        assert!(!sales.has_filter("warehouse"));
        assert_eq!(sales.filter("dateRange").unwrap().kind, FilterKind::Text);
        assert_eq!(
            sales.filter("region").unwrap().kind.options(),
            ["North", "South", "East", "West"]
        );
    }

    #[test]
    fn test_find_unknown_template() {
        assert!(find_template("payroll").is_none());
    }

    #[test]
    fn test_enumerated_filters_have_options() {
        for template in templates() {
            for filter in &template.filters {
                if let FilterKind::Enumerated { options } = &filter.kind {
                    assert!(!options.is_empty(), "{}.{}", template.id, filter.id);
                }
            }
        }
    }

    #[test]
    fn test_filter_kind_serialization() {
        let json = serde_json::to_value(find_template("inventory").unwrap()).unwrap();
        assert_eq!(json["filters"][0]["kind"], "enumerated");
        assert_eq!(json["filters"][0]["options"][0], "Main");
    }
}
