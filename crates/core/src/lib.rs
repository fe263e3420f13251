//! Vitrine
//!
//! Vitrine binds storefront media to product variants, resolves the single
//! image that represents a variant or a cart line, and keeps an
//! administrator's draft edits consistent with the last confirmed product.

pub mod carts;
pub mod draft;
pub mod fixtures;
pub mod media;
pub mod products;
pub mod resolution;
pub mod uuids;
pub mod variants;
