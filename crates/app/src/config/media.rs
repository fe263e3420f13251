//! Media Host Config

use clap::Args;

/// Remote media host settings.
#[derive(Debug, Clone, Args)]
pub struct MediaHostConfig {
    /// Media host base address, e.g. `"https://media.example.com"`
    #[arg(long = "media-host-url", env = "MEDIA_HOST_URL")]
    pub url: String,

    /// Media host API token
    #[arg(long = "media-host-token", env = "MEDIA_HOST_TOKEN", hide_env_values = true)]
    pub token: String,

    /// Folder uploads are placed in
    #[arg(long = "media-host-folder", env = "MEDIA_HOST_FOLDER", default_value = "products")]
    pub folder: String,
}
