//! Catalog entity and draft types.
//!
//! Wire types for the remote catalog service. Drafts describe entities before
//! creation; persisted entities carry a server-assigned id, and products
//! additionally a version token for optimistic concurrency.

use std::collections::{BTreeMap, HashMap};

use serde::{Deserialize, Serialize};

// ─────────────────────────────────────────────────────────────────────────────
// Localized text
// ─────────────────────────────────────────────────────────────────────────────

/// Per-locale text, keyed by locale tag (e.g., "en", "de").
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LocalizedString(BTreeMap<String, String>);

impl LocalizedString {
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a localized string with a single entry.
    pub fn of(locale: &str, value: &str) -> Self {
        let mut ls = Self::default();
        ls.set(locale, value);
        ls
    }

    /// Adds or replaces the value for a locale, builder style.
    pub fn with(mut self, locale: &str, value: &str) -> Self {
        self.set(locale, value);
        self
    }

    pub fn set(&mut self, locale: &str, value: &str) {
        self.0.insert(locale.to_string(), value.to_string());
    }

    /// Returns the text for a locale, if present.
    pub fn get(&self, locale: &str) -> Option<&str> {
        self.0.get(locale).map(String::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Customer groups
// ─────────────────────────────────────────────────────────────────────────────

/// Customer segmentation group, unique by name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CustomerGroup {
    pub id: String,
    pub name: String,
}

/// Draft for creating a customer group.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CustomerGroupDraft {
    pub group_name: String,
}

impl CustomerGroupDraft {
    pub fn of(name: &str) -> Self {
        Self {
            group_name: name.to_string(),
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tax categories
// ─────────────────────────────────────────────────────────────────────────────

/// One jurisdiction's tax rate within a tax category.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaxRate {
    pub name: String,
    /// Rate as a fraction (0.19 = 19%).
    pub amount: f64,
    pub included_in_price: bool,
    /// ISO 3166-1 alpha-2 country code.
    pub country: String,
}

impl TaxRate {
    pub fn of(name: &str, amount: f64, included_in_price: bool, country: &str) -> Self {
        Self {
            name: name.to_string(),
            amount,
            included_in_price,
            country: country.to_string(),
        }
    }
}

/// Tax rule set, unique by name.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaxCategory {
    pub id: String,
    pub name: String,
    pub rates: Vec<TaxRate>,
}

/// Draft for creating a tax category.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaxCategoryDraft {
    pub name: String,
    pub rates: Vec<TaxRate>,
}

impl TaxCategoryDraft {
    pub fn of(name: &str, rates: Vec<TaxRate>) -> Self {
        Self {
            name: name.to_string(),
            rates,
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Categories
// ─────────────────────────────────────────────────────────────────────────────

/// Catalog category; `parent` links into the hierarchy.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Category {
    pub id: String,
    pub name: LocalizedString,
    #[serde(default)]
    pub parent: Option<String>,
}

/// In-memory hierarchical view over a complete category load.
///
/// Read-only snapshot linking categories by parent reference. Rebuilt every
/// run and never written back to the remote service.
#[derive(Debug, Clone, Default)]
pub struct CategoryTree {
    by_id: HashMap<String, Category>,
    children: HashMap<String, Vec<String>>,
    roots: Vec<String>,
}

impl CategoryTree {
    /// Builds the tree from a flat category list.
    ///
    /// A category whose parent id is absent from the load is treated as a
    /// root rather than an error; the snapshot only reflects what was loaded.
    pub fn of(categories: Vec<Category>) -> Self {
        let mut by_id = HashMap::with_capacity(categories.len());
        let mut children: HashMap<String, Vec<String>> = HashMap::new();
        let mut roots = Vec::new();

        for category in &categories {
            by_id.insert(category.id.clone(), category.clone());
        }
        for category in categories {
            match &category.parent {
                Some(parent) if by_id.contains_key(parent) => {
                    children.entry(parent.clone()).or_default().push(category.id);
                }
                _ => roots.push(category.id),
            }
        }

        Self {
            by_id,
            children,
            roots,
        }
    }

    pub fn len(&self) -> usize {
        self.by_id.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_id.is_empty()
    }

    pub fn by_id(&self, id: &str) -> Option<&Category> {
        self.by_id.get(id)
    }

    /// Root categories (no parent, or parent missing from the load).
    pub fn roots(&self) -> impl Iterator<Item = &Category> {
        self.roots.iter().filter_map(|id| self.by_id.get(id))
    }

    /// Direct children of a category.
    pub fn children_of(&self, id: &str) -> impl Iterator<Item = &Category> {
        self.children
            .get(id)
            .into_iter()
            .flatten()
            .filter_map(|child| self.by_id.get(child))
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Product types
// ─────────────────────────────────────────────────────────────────────────────

/// Product type schema definition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductType {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub attribute_names: Vec<String>,
}

/// Complete read-only snapshot of all product type definitions.
#[derive(Debug, Clone, Default)]
pub struct ProductTypeSet {
    types: Vec<ProductType>,
}

impl ProductTypeSet {
    pub fn of(types: Vec<ProductType>) -> Self {
        Self { types }
    }

    pub fn len(&self) -> usize {
        self.types.len()
    }

    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }

    pub fn by_name(&self, name: &str) -> Option<&ProductType> {
        self.types.iter().find(|t| t.name == name)
    }

    pub fn iter(&self) -> impl Iterator<Item = &ProductType> {
        self.types.iter()
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Products
// ─────────────────────────────────────────────────────────────────────────────

/// Name/value attribute on a product variant draft.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AttributeDraft {
    pub name: String,
    pub value: serde_json::Value,
}

impl AttributeDraft {
    pub fn of(name: &str, value: impl Into<serde_json::Value>) -> Self {
        Self {
            name: name.to_string(),
            value: value.into(),
        }
    }
}

/// Master variant of a product draft.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProductVariantDraft {
    #[serde(default)]
    pub attributes: Vec<AttributeDraft>,
}

impl ProductVariantDraft {
    /// True if the variant carries an attribute with exactly this name/value.
    pub fn has_attribute(&self, name: &str, value: &serde_json::Value) -> bool {
        self.attributes
            .iter()
            .any(|a| a.name == name && &a.value == value)
    }
}

/// Unsaved product description read from the record source.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductDraft {
    pub name: LocalizedString,
    #[serde(default)]
    pub slug: LocalizedString,
    #[serde(default)]
    pub product_type: Option<String>,
    #[serde(default)]
    pub master_variant: ProductVariantDraft,
}

/// Persisted catalog product.
///
/// `version` is the optimistic-concurrency token required for updates;
/// `published` reflects the publication state transition performed by the
/// publish step.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Product {
    pub id: String,
    pub version: u64,
    #[serde(default)]
    pub published: bool,
    #[serde(default)]
    pub name: LocalizedString,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn localized_string_get_and_set() {
        let name = LocalizedString::of("en", "Chair").with("de", "Stuhl");

        assert_eq!(name.get("en"), Some("Chair"));
        assert_eq!(name.get("de"), Some("Stuhl"));
        assert_eq!(name.get("fr"), None);
    }

    #[test]
    fn category_tree_links_children_to_parents() {
        let tree = CategoryTree::of(vec![
            Category {
                id: "c1".into(),
                name: LocalizedString::of("en", "Furniture"),
                parent: None,
            },
            Category {
                id: "c2".into(),
                name: LocalizedString::of("en", "Chairs"),
                parent: Some("c1".into()),
            },
            Category {
                id: "c3".into(),
                name: LocalizedString::of("en", "Tables"),
                parent: Some("c1".into()),
            },
        ]);

        assert_eq!(tree.len(), 3);
        let roots: Vec<_> = tree.roots().map(|c| c.id.as_str()).collect();
        assert_eq!(roots, vec!["c1"]);

        let mut children: Vec<_> = tree.children_of("c1").map(|c| c.id.as_str()).collect();
        children.sort();
        assert_eq!(children, vec!["c2", "c3"]);
        assert_eq!(tree.children_of("c2").count(), 0);
    }

    #[test]
    fn category_with_unknown_parent_becomes_root() {
        let tree = CategoryTree::of(vec![Category {
            id: "orphan".into(),
            name: LocalizedString::of("en", "Orphan"),
            parent: Some("missing".into()),
        }]);

        let roots: Vec<_> = tree.roots().map(|c| c.id.as_str()).collect();
        assert_eq!(roots, vec!["orphan"]);
    }

    #[test]
    fn product_type_set_lookup_by_name() {
        let set = ProductTypeSet::of(vec![ProductType {
            id: "pt1".into(),
            name: "furniture".into(),
            attribute_names: vec!["designer".into()],
        }]);

        assert!(set.by_name("furniture").is_some());
        assert!(set.by_name("electronics").is_none());
        assert_eq!(set.len(), 1);
    }

    #[test]
    fn variant_attribute_match_requires_name_and_value() {
        let variant = ProductVariantDraft {
            attributes: vec![AttributeDraft::of("designer", json!("juliat"))],
        };

        assert!(variant.has_attribute("designer", &json!("juliat")));
        assert!(!variant.has_attribute("designer", &json!("other")));
        assert!(!variant.has_attribute("color", &json!("juliat")));
    }

    #[test]
    fn tax_rate_constructor_preserves_fields() {
        let rate = TaxRate::of("standard", 0.19, true, "DE");

        assert_eq!(rate.name, "standard");
        assert_eq!(rate.amount, 0.19);
        assert!(rate.included_in_price);
        assert_eq!(rate.country, "DE");
    }
}
