//! Application configuration

use clap::Parser;

use crate::config::{drafts::DraftConfig, logging::LoggingConfig, media::MediaHostConfig};

pub mod drafts;
pub mod logging;
pub mod media;

/// Vitrine application configuration
#[derive(Debug, Clone, Parser)]
#[command(name = "vitrine", about = "Vitrine catalog media engine", long_about = None)]
pub struct AppConfig {
    /// Logging output settings.
    #[command(flatten)]
    pub logging: LoggingConfig,

    /// Media host settings.
    #[command(flatten)]
    pub media_host: MediaHostConfig,

    /// Draft session settings.
    #[command(flatten)]
    pub drafts: DraftConfig,
}

impl AppConfig {
    /// Load configuration from environment and CLI arguments
    ///
    /// # Errors
    ///
    /// Returns an error if configuration cannot be parsed
    pub fn load() -> Result<Self, clap::Error> {
        // Load .env file if present (ignore if missing)
        _ = dotenvy::dotenv();

        Self::try_parse()
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use testresult::TestResult;

    use super::*;

    #[test]
    fn defaults_apply_when_only_the_host_is_given() -> TestResult {
        let config = AppConfig::try_parse_from([
            "vitrine",
            "--media-host-url",
            "https://media.test",
            "--media-host-token",
            "secret",
        ])?;

        assert_eq!(config.media_host.folder, "products");
        assert_eq!(config.drafts.settle_timeout(), Duration::from_secs(5));
        assert!(!config.drafts.purge_remote_on_detach);

        Ok(())
    }

    #[test]
    fn settle_timeout_is_configurable() -> TestResult {
        let config = AppConfig::try_parse_from([
            "vitrine",
            "--media-host-url",
            "https://media.test",
            "--media-host-token",
            "secret",
            "--settle-timeout-ms",
            "250",
            "--purge-remote-on-detach",
        ])?;

        assert_eq!(config.drafts.settle_timeout(), Duration::from_millis(250));
        assert!(config.drafts.purge_remote_on_detach);

        Ok(())
    }
}
