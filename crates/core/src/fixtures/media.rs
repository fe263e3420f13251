//! Media Fixtures

use crate::media::{Asset, NewMediaRecord};

/// An image asset hosted under a predictable test URL.
pub fn asset(public_id: &str) -> Asset {
    Asset::image(format!("https://cdn.test/{public_id}.jpg"), public_id)
}

/// A product-level record for [`asset`].
pub fn new_record(public_id: &str) -> NewMediaRecord {
    NewMediaRecord::new(asset(public_id))
}
