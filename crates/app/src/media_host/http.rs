//! HTTP media host client.

use async_trait::async_trait;
use reqwest::{
    Client, Response, StatusCode,
    multipart::{Form, Part},
};
use serde::Deserialize;
use tracing::debug;
use vitrine::media::{Asset, MediaKind, PublicId};

use crate::{
    config::media::MediaHostConfig,
    media_host::{MediaHost, MediaHostError, UploadFile},
};

/// Media host client speaking the host's JSON API.
#[derive(Debug, Clone)]
pub struct HttpMediaHost {
    config: MediaHostConfig,
    http: Client,
}

impl HttpMediaHost {
    /// Create a new client from the given configuration.
    #[must_use]
    pub fn new(config: MediaHostConfig) -> Self {
        Self {
            config,
            http: Client::new(),
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}/v1/{path}", self.config.url.trim_end_matches('/'))
    }
}

async fn unexpected(action: &str, response: Response) -> MediaHostError {
    let status = response.status();
    let text = response.text().await.unwrap_or_default();

    MediaHostError::UnexpectedResponse(format!(
        "{action} request failed with status {status}: {text}"
    ))
}

#[async_trait]
impl MediaHost for HttpMediaHost {
    async fn upload(
        &self,
        files: Vec<UploadFile>,
        folder: String,
    ) -> Result<Vec<Asset>, MediaHostError> {
        let expected = files.len();
        let mut form = Form::new().text("folder", folder);

        for file in files {
            let part = Part::bytes(file.bytes)
                .file_name(file.file_name)
                .mime_str(&file.content_type)?;

            form = form.part("files", part);
        }

        let response = self
            .http
            .post(self.url("assets"))
            .bearer_auth(&self.config.token)
            .multipart(form)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(unexpected("upload", response).await);
        }

        let parsed: UploadResponse = response.json().await?;

        if parsed.assets.len() != expected {
            return Err(MediaHostError::UnexpectedResponse(format!(
                "uploaded {expected} files but received {} assets",
                parsed.assets.len()
            )));
        }

        debug!(count = expected, "uploaded media");

        Ok(parsed.assets)
    }

    async fn delete(&self, public_id: PublicId, kind: MediaKind) -> Result<(), MediaHostError> {
        let response = self
            .http
            .delete(self.url(&format!("assets/{kind}/{public_id}")))
            .bearer_auth(&self.config.token)
            .send()
            .await?;

        if response.status() == StatusCode::NOT_FOUND {
            debug!(%public_id, "remote asset already gone");

            return Ok(());
        }

        if !response.status().is_success() {
            return Err(unexpected("delete", response).await);
        }

        Ok(())
    }
}

#[derive(Debug, Deserialize)]
struct UploadResponse {
    assets: Vec<Asset>,
}
