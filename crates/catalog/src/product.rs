use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::normalize::{clean_price, parse_categories, parse_images};

/// A catalog item with the validated schema the engine works against.
///
/// Defaults are documented per field and applied at this boundary; missing
/// optional metadata is never an error anywhere downstream.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct Product {
    /// Unique identifier. Upsert semantics: last write per id wins.
    #[serde(default)]
    pub id: String,
    /// Display name; empty when the source row had none.
    #[serde(default)]
    pub name: String,
    /// Free-text category label; `"Unknown"` when unparseable.
    #[serde(default)]
    pub category: String,
    /// Non-negative price. `0.0` means unknown/unparseable, not free.
    #[serde(default)]
    pub price: f64,
    /// Free-text description, may be empty.
    #[serde(default)]
    pub description: String,
    /// First image URL from the source row, when present.
    #[serde(default)]
    pub image_url: Option<String>,
    /// Opaque attribute strings, may be empty.
    #[serde(default)]
    pub brand: String,
    #[serde(default)]
    pub material: String,
    #[serde(default)]
    pub color: String,
}

/// Pre-normalization ingestion shape: everything arrives as optional
/// strings, the way dataset rows do.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct RawProduct {
    pub id: String,
    #[serde(default)]
    pub name: Option<String>,
    /// Possibly a `"[a, b]"`-shaped list string.
    #[serde(default)]
    pub categories: Option<String>,
    /// Possibly carries currency symbols or thousands separators.
    #[serde(default)]
    pub price: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    /// Possibly a list string; only the first URL is kept.
    #[serde(default)]
    pub images: Option<String>,
    #[serde(default)]
    pub brand: Option<String>,
    #[serde(default)]
    pub material: Option<String>,
    #[serde(default)]
    pub color: Option<String>,
}

impl RawProduct {
    /// Run the single normalization stage. The engine only ever sees the
    /// resulting typed [`Product`].
    pub fn normalize(self) -> Product {
        Product {
            id: self.id,
            name: self.name.unwrap_or_default().trim().to_string(),
            category: parse_categories(self.categories.as_deref().unwrap_or("")),
            price: clean_price(self.price.as_deref().unwrap_or("")),
            description: self.description.unwrap_or_default().trim().to_string(),
            image_url: parse_images(self.images.as_deref().unwrap_or("")),
            brand: self.brand.unwrap_or_default(),
            material: self.material.unwrap_or_default(),
            color: self.color.unwrap_or_default(),
        }
    }
}

/// The free-text proxy for "semantic content of this item": name, category,
/// and description concatenated. Used both at ingestion time and when a
/// reference product seeds a similarity query.
pub fn embedding_text(product: &Product) -> String {
    format!(
        "{} {} {}",
        product.name, product.category, product.description
    )
    .trim()
    .to_string()
}

/// Decode an index payload into a [`Product`], applying schema defaults for
/// anything missing. This is the one place payloads become typed; a payload
/// that is not even an object yields a default product carrying the record
/// id (warn-logged), since recoverable metadata gaps must not fail a read.
pub fn product_from_payload(id: &str, payload: &Value) -> Product {
    let mut product: Product = match payload {
        Value::Object(_) => serde_json::from_value(payload.clone()).unwrap_or_else(|err| {
            tracing::warn!(id, error = %err, "malformed product payload, using defaults");
            Product::default()
        }),
        _ => {
            tracing::warn!(id, "non-object product payload, using defaults");
            Product::default()
        }
    };
    if product.id.is_empty() {
        product.id = id.to_string();
    }
    product
}

/// Encode a [`Product`] as the metadata snapshot stored with its vector.
pub fn product_to_payload(product: &Product) -> Value {
    serde_json::to_value(product).unwrap_or(Value::Null)
}
