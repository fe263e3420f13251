//! Media
//!
//! Media records are owned by a product and bound to its variants by
//! reference only: a durable variant uuid, a positional variant index, or
//! both. A record with neither is a product-level record.

use std::fmt::{Display, Formatter, Result as FmtResult};

use serde::{Deserialize, Serialize};

use crate::variants::{EntityRef, Variant, VariantUuid};

mod errors;
mod table;

pub use errors::MediaError;
pub use table::MediaTable;

/// Host-assigned identifier of a remote asset.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PublicId(String);

impl PublicId {
    /// Wrap a host-assigned identifier.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Borrow the identifier.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Display for PublicId {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.write_str(&self.0)
    }
}

impl From<&str> for PublicId {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl From<String> for PublicId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

/// Kind of uploaded asset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MediaKind {
    /// Still image.
    #[default]
    Image,

    /// Video clip.
    Video,
}

impl MediaKind {
    /// Lowercase name used by media hosts.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Image => "image",
            Self::Video => "video",
        }
    }
}

impl Display for MediaKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.write_str(self.as_str())
    }
}

/// Descriptor returned by the media host for an uploaded file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Asset {
    /// Public URL the asset is retrievable at.
    pub url: String,

    /// Host identifier, used for deletion.
    pub public_id: PublicId,

    /// Asset kind.
    pub kind: MediaKind,
}

impl Asset {
    /// Create an image asset descriptor.
    pub fn image(url: impl Into<String>, public_id: impl Into<PublicId>) -> Self {
        Self {
            url: url.into(),
            public_id: public_id.into(),
            kind: MediaKind::Image,
        }
    }
}

/// A media asset attached to a product.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MediaRecord {
    /// The hosted asset.
    #[serde(flatten)]
    pub asset: Asset,

    /// Whether this is the product's representative record.
    #[serde(default)]
    pub is_primary: bool,

    /// Durable variant reference.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub variant_uuid: Option<VariantUuid>,

    /// Positional variant reference, kept after the durable one is known.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub variant_index: Option<usize>,

    /// Size the record applies to, when narrower than the whole variant.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub size: Option<String>,

    /// Colour the record depicts.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color_name: Option<String>,
}

impl MediaRecord {
    /// Host identifier of the record's asset.
    #[must_use]
    pub fn public_id(&self) -> &PublicId {
        &self.asset.public_id
    }

    /// Public URL of the record's asset.
    #[must_use]
    pub fn url(&self) -> &str {
        &self.asset.url
    }

    /// The record's effective variant reference, durable ids first.
    #[must_use]
    pub fn entity_ref(&self) -> Option<EntityRef> {
        match (self.variant_uuid, self.variant_index) {
            (Some(uuid), _) => Some(EntityRef::ByDurableId(uuid)),
            (None, Some(index)) => Some(EntityRef::ByPosition(index)),
            (None, None) => None,
        }
    }

    /// Whether the record is bound to the variant at `index` whose durable id
    /// is `uuid`.
    ///
    /// A durable reference always wins: a record carrying another variant's
    /// uuid is not bound here even if its positional index matches.
    #[must_use]
    pub fn is_bound_to(&self, index: usize, uuid: Option<VariantUuid>) -> bool {
        match (self.variant_uuid, uuid) {
            (Some(own), Some(other)) => own == other,
            (Some(_), None) => false,
            (None, _) => self.variant_index == Some(index),
        }
    }

    /// Whether the record is not scoped to any variant.
    #[must_use]
    pub fn is_product_level(&self) -> bool {
        self.variant_uuid.is_none() && self.variant_index.is_none()
    }

    /// Find the variant this record is bound to.
    pub fn bound_variant<'v>(&self, variants: &'v [Variant]) -> Option<&'v Variant> {
        match self.entity_ref()? {
            EntityRef::ByDurableId(uuid) => variants.iter().find(|v| v.uuid == Some(uuid)),
            EntityRef::ByPosition(index) => variants.get(index),
        }
    }
}

/// A record about to be attached; the table decides the primary flag.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewMediaRecord {
    /// The hosted asset.
    #[serde(flatten)]
    pub asset: Asset,

    /// Durable variant reference.
    #[serde(default)]
    pub variant_uuid: Option<VariantUuid>,

    /// Positional variant reference.
    #[serde(default)]
    pub variant_index: Option<usize>,

    /// Size the record applies to.
    #[serde(default)]
    pub size: Option<String>,

    /// Colour the record depicts.
    #[serde(default)]
    pub color_name: Option<String>,
}

impl NewMediaRecord {
    /// A product-level record for `asset`.
    #[must_use]
    pub fn new(asset: Asset) -> Self {
        Self {
            asset,
            variant_uuid: None,
            variant_index: None,
            size: None,
            color_name: None,
        }
    }

    /// Bind the record to the variant at `index`.
    #[must_use]
    pub fn for_variant_index(mut self, index: usize) -> Self {
        self.variant_index = Some(index);
        self
    }

    /// Bind the record to a persisted variant.
    #[must_use]
    pub fn for_variant(mut self, uuid: VariantUuid) -> Self {
        self.variant_uuid = Some(uuid);
        self
    }

    /// Scope the record to a single size.
    #[must_use]
    pub fn with_size(mut self, size: impl Into<String>) -> Self {
        self.size = Some(size.into());
        self
    }

    /// Tag the record with the colour it depicts.
    #[must_use]
    pub fn with_color(mut self, color_name: impl Into<String>) -> Self {
        self.color_name = Some(color_name.into());
        self
    }

    fn into_record(self) -> MediaRecord {
        MediaRecord {
            asset: self.asset,
            is_primary: false,
            variant_uuid: self.variant_uuid,
            variant_index: self.variant_index,
            size: self.size,
            color_name: self.color_name,
        }
    }
}

impl From<MediaRecord> for NewMediaRecord {
    fn from(record: MediaRecord) -> Self {
        Self {
            asset: record.asset,
            variant_uuid: record.variant_uuid,
            variant_index: record.variant_index,
            size: record.size,
            color_name: record.color_name,
        }
    }
}

/// Selects one record of a media table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MediaSelector {
    /// By host identifier.
    PublicId(PublicId),

    /// By position in list order.
    Index(usize),
}

impl From<PublicId> for MediaSelector {
    fn from(value: PublicId) -> Self {
        Self::PublicId(value)
    }
}

impl From<&str> for MediaSelector {
    fn from(value: &str) -> Self {
        Self::PublicId(value.into())
    }
}

impl From<usize> for MediaSelector {
    fn from(value: usize) -> Self {
        Self::Index(value)
    }
}
