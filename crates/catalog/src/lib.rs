//! Typed product schema and the catalog read layer.
//!
//! The vector index stores schemaless JSON payloads; this crate owns the
//! typed view. [`Product`] is the validated schema with documented defaults,
//! converted from payloads in exactly one place
//! ([`product_from_payload`]) so permissive key access never leaks into the
//! engine. [`RawProduct`] is the pre-normalization ingestion shape: price
//! strings with currency symbols and list-like category/image fields are
//! normalized here, before anything reaches the index.
//!
//! [`Catalog`] is the accessor: collection bootstrap with the fatal
//! dimension consistency check, embed-and-upsert ingestion, pagination, and
//! fetch-by-id.

mod accessor;
mod error;
mod normalize;
mod product;

pub use accessor::{Catalog, CatalogConfig};
pub use error::CatalogError;
pub use normalize::{clean_price, parse_categories, parse_images};
pub use product::{embedding_text, product_from_payload, product_to_payload, Product, RawProduct};
