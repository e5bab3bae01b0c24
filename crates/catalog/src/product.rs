//! Product payload and record types.

use serde::{Deserialize, Serialize};

/// The structured payload stored alongside each vector in the index.
///
/// Field names match the catalog's native product attributes so that
/// payloads round-trip through the index without translation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Payload {
    pub title: String,
    #[serde(default)]
    pub vendor: String,
    /// Decimal price as the catalog renders it, e.g. "49.99".
    #[serde(default)]
    pub price: String,
    /// URL slug used to derive the canonical product page.
    #[serde(default)]
    pub handle: String,
    /// Comma-separated tag string, e.g. "red, running, mesh".
    #[serde(default)]
    pub tags: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub product_type: Option<String>,
    #[serde(default)]
    pub description: String,
}

impl Payload {
    /// The canonical text embedded for this product.
    pub fn embedding_text(&self) -> String {
        format!(
            "Product: {}. Vendor: {}. Tags: {}. Description: {}",
            self.title, self.vendor, self.tags, self.description
        )
    }
}

/// A product record as returned by the search and detail tools.
///
/// The record is an opaque value to the conversation loop; tools
/// produce and consume it but never mutate stored payloads.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Product {
    pub product_id: u64,
    pub title: String,
    pub vendor: String,
    pub price: String,
    pub tags: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub product_type: Option<String>,
    pub description: String,
    pub url: String,
}

impl Product {
    /// Build a record from a stored payload, deriving the canonical
    /// product URL from the handle and the store's base host.
    pub fn from_payload(product_id: u64, payload: Payload, store_base_url: &str) -> Self {
        let url = product_url(store_base_url, &payload.handle);
        Self {
            product_id,
            title: payload.title,
            vendor: payload.vendor,
            price: payload.price,
            tags: payload.tags,
            product_type: payload.product_type,
            description: payload.description,
            url,
        }
    }
}

/// Canonical product page URL for a handle on the given store host.
pub fn product_url(store_base_url: &str, handle: &str) -> String {
    format!("https://{store_base_url}/products/{handle}")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn payload() -> Payload {
        Payload {
            title: "Trail Runner".into(),
            vendor: "Peak".into(),
            price: "89.00".into(),
            handle: "trail-runner".into(),
            tags: "red, running".into(),
            product_type: Some("Shoes".into()),
            description: "Lightweight trail shoe".into(),
        }
    }

    #[test]
    fn url_derived_from_handle() {
        let product = Product::from_payload(42, payload(), "cool-shoes.myshopify.com");
        assert_eq!(
            product.url,
            "https://cool-shoes.myshopify.com/products/trail-runner"
        );
        assert_eq!(product.product_id, 42);
    }

    #[test]
    fn embedding_text_includes_all_fields() {
        let text = payload().embedding_text();
        assert!(text.contains("Trail Runner"));
        assert!(text.contains("Peak"));
        assert!(text.contains("running"));
        assert!(text.contains("Lightweight"));
    }

    #[test]
    fn payload_tolerates_missing_optional_fields() {
        let payload: Payload = serde_json::from_str(r#"{"title": "Bare"}"#).unwrap();
        assert_eq!(payload.title, "Bare");
        assert!(payload.tags.is_empty());
        assert!(payload.product_type.is_none());
    }
}
