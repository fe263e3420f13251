//! Fixtures
//!
//! Small builders for products, variants and media used across the test
//! suites of this crate and its dependents.

mod media;
mod products;

pub use media::{asset, new_record};
pub use products::{draft_variant, persisted_variant, product, spec};
