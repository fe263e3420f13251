//! Remote media host.

use async_trait::async_trait;
use mockall::automock;
use thiserror::Error;
use vitrine::media::{Asset, MediaKind, PublicId};

mod http;

pub use http::HttpMediaHost;

/// A raw file waiting to be uploaded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadFile {
    /// Original file name.
    pub file_name: String,

    /// MIME type, e.g. `"image/jpeg"`.
    pub content_type: String,

    /// File contents.
    pub bytes: Vec<u8>,
}

impl UploadFile {
    /// Asset kind implied by the MIME type.
    #[must_use]
    pub fn kind(&self) -> MediaKind {
        if self.content_type.starts_with("video/") {
            MediaKind::Video
        } else {
            MediaKind::Image
        }
    }
}

/// Errors that can occur when talking to the media host.
#[derive(Debug, Error)]
pub enum MediaHostError {
    /// An HTTP transport or serialization error occurred.
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),

    /// The host returned a non-2xx response or unexpected body.
    #[error("unexpected response from media host: {0}")]
    UnexpectedResponse(String),
}

#[automock]
#[async_trait]
pub trait MediaHost: Send + Sync {
    /// Upload files into `folder`, returning one asset per file in order.
    async fn upload(
        &self,
        files: Vec<UploadFile>,
        folder: String,
    ) -> Result<Vec<Asset>, MediaHostError>;

    /// Delete a hosted asset. Deleting an unknown asset succeeds.
    async fn delete(&self, public_id: PublicId, kind: MediaKind) -> Result<(), MediaHostError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kind_follows_the_mime_type() {
        let file = |content_type: &str| UploadFile {
            file_name: "clip".to_string(),
            content_type: content_type.to_string(),
            bytes: Vec::new(),
        };

        assert_eq!(file("video/mp4").kind(), MediaKind::Video);
        assert_eq!(file("image/webp").kind(), MediaKind::Image);
    }
}
