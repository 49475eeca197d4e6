//! Downloadable resource descriptors supplied by the content catalog.
//!
//! The controller never owns these; widgets consult `gated` to decide whether
//! to ask the controller at all.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// A single downloadable item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DownloadableResource {
    /// Display name.
    pub title: String,
    /// Resource location, possibly relative to the asset host.
    pub target_url: String,
    /// Whether opening requires an unlocked visitor.
    #[serde(default)]
    pub gated: bool,
}

impl DownloadableResource {
    /// Create a gated resource.
    pub fn gated(title: impl Into<String>, target_url: impl Into<String>) -> Self {
        Self { title: title.into(), target_url: target_url.into(), gated: true }
    }

    /// Create a resource anyone may open.
    pub fn open(title: impl Into<String>, target_url: impl Into<String>) -> Self {
        Self { title: title.into(), target_url: target_url.into(), gated: false }
    }
}

/// Errors from decoding a catalog.
#[derive(Debug, Error)]
pub enum CatalogError {
    /// Catalog JSON did not match the expected shape.
    #[error("invalid catalog: {reason}")]
    Invalid {
        /// Decoder message.
        reason: String,
    },
}

/// Resources grouped by caller-defined category.
///
/// Serialized as a JSON object mapping category name to a list of resources:
///
/// ```text
/// {"Brochures": [{"title": "...", "targetUrl": "...", "gated": true}]}
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ResourceCatalog {
    categories: BTreeMap<String, Vec<DownloadableResource>>,
}

impl ResourceCatalog {
    /// Empty catalog.
    pub fn new() -> Self {
        Self::default()
    }

    /// Decode a catalog from JSON.
    pub fn from_json(raw: &str) -> Result<Self, CatalogError> {
        serde_json::from_str(raw).map_err(|e| CatalogError::Invalid { reason: e.to_string() })
    }

    /// Append `resource` to `category`, creating the category if needed.
    pub fn push(&mut self, category: impl Into<String>, resource: DownloadableResource) {
        self.categories.entry(category.into()).or_default().push(resource);
    }

    /// Category names in sorted order.
    pub fn categories(&self) -> impl Iterator<Item = &str> {
        self.categories.keys().map(String::as_str)
    }

    /// Resources in `category`, or an empty slice.
    pub fn resources(&self, category: &str) -> &[DownloadableResource] {
        self.categories.get(category).map_or(&[], Vec::as_slice)
    }

    /// Every `(category, resource)` pair.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &DownloadableResource)> {
        self.categories
            .iter()
            .flat_map(|(category, items)| items.iter().map(move |r| (category.as_str(), r)))
    }

    /// Total number of resources.
    pub fn len(&self) -> usize {
        self.categories.values().map(Vec::len).sum()
    }

    /// Whether the catalog holds no resources.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Number of resources that require an unlock.
    pub fn gated_count(&self) -> usize {
        self.iter().filter(|(_, r)| r.gated).count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const CATALOG: &str = r#"{
        "Brochures": [
            {"title": "Product Guide", "targetUrl": "/files/guide.pdf", "gated": true},
            {"title": "Finishes", "targetUrl": "https://cdn.example.com/finishes.pdf"}
        ],
        "CAD": [
            {"title": "Chair DWG", "targetUrl": "//cdn.example.com/chair.dwg", "gated": true}
        ]
    }"#;

    #[test]
    fn decode_groups_by_category() {
        let catalog = ResourceCatalog::from_json(CATALOG).expect("decode");
        assert_eq!(catalog.categories().collect::<Vec<_>>(), vec!["Brochures", "CAD"]);
        assert_eq!(catalog.len(), 3);
        assert_eq!(catalog.gated_count(), 2);
        assert!(!catalog.resources("Brochures")[1].gated, "gated defaults to false");
        assert!(catalog.resources("Videos").is_empty());
    }

    #[test]
    fn reject_wrong_shape() {
        assert!(ResourceCatalog::from_json(r#"[{"title": "x"}]"#).is_err());
        assert!(ResourceCatalog::from_json(r#"{"A": [{"title": "x"}]}"#).is_err());
    }

    #[test]
    fn push_and_iter() {
        let mut catalog = ResourceCatalog::new();
        assert!(catalog.is_empty());
        catalog.push("Specs", DownloadableResource::gated("Sheet", "/a.pdf"));
        catalog.push("Specs", DownloadableResource::open("Care", "/b.pdf"));

        let titles: Vec<_> = catalog.iter().map(|(c, r)| format!("{c}/{}", r.title)).collect();
        assert_eq!(titles, vec!["Specs/Sheet", "Specs/Care"]);
    }

    #[test]
    fn serializes_camel_case() {
        let json = serde_json::to_string(&DownloadableResource::gated("T", "/t.pdf")).expect("encode");
        assert_eq!(json, r#"{"title":"T","targetUrl":"/t.pdf","gated":true}"#);
    }
}
