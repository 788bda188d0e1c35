// src/pipeline/validate.rs

//! Setup-time checks.

use std::path::Path;

use crate::error::{Result, ScrapeError};
use crate::models::{Config, IncidentRecord};
use crate::services::{PageSource, RecordExtractor};

/// Run one fetch + extract cycle against a candidate region path.
///
/// Unlike the polling loop, every failure is returned as-is, including a
/// 404, so the caller can tell a bad region path from a connection problem
/// or a changed page layout.
pub async fn validate_region(
    source: &dyn PageSource,
    extractor: &RecordExtractor,
    region_path: &str,
) -> std::result::Result<Option<IncidentRecord>, ScrapeError> {
    log::info!("Validating P2000 region path: {}", region_path);
    let markup = source.fetch(region_path).await?;
    extractor.extract(&markup)
}

/// Load a configuration file strictly and validate it.
///
/// A missing or malformed file is an error here, never a silent fallback to
/// the defaults.
pub fn validate_config_file(path: &Path) -> Result<Config> {
    let config = Config::load(path).inspect_err(|e| {
        log::error!("Failed to load config from {}: {}", path.display(), e);
    })?;
    run_validate(&config)?;
    Ok(config)
}

/// Validate configuration values and report what was checked.
pub fn run_validate(config: &Config) -> Result<()> {
    config.validate()?;
    log::info!("✓ Config OK");
    log::info!("    base_url: {}", config.scraper.base_url);
    log::info!("    timeout_secs: {}", config.scraper.timeout_secs);
    for region in &config.regions {
        log::info!(
            "    region {} ({}) every {}s",
            region.key(),
            region.instance_name,
            region.scan_interval_secs
        );
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use async_trait::async_trait;

    use super::*;
    use crate::services::TimestampNormalizer;

    struct Fixed(std::result::Result<String, ScrapeError>);

    #[async_trait]
    impl PageSource for Fixed {
        async fn fetch(&self, _region_path: &str) -> std::result::Result<String, ScrapeError> {
            self.0.clone()
        }
    }

    fn extractor() -> RecordExtractor {
        RecordExtractor::new(&Default::default(), TimestampNormalizer::default()).unwrap()
    }

    #[tokio::test]
    async fn surfaces_no_data_directly() {
        let source = Fixed(Err(ScrapeError::no_data("nowhere", "404")));
        let err = validate_region(&source, &extractor(), "nowhere")
            .await
            .unwrap_err();
        assert_eq!(err.setup_code(), "invalid_region_path");
    }

    #[tokio::test]
    async fn surfaces_layout_change() {
        let source = Fixed(Ok(
            r#"<div id="calls"><div class="call"></div></div>"#.to_string()
        ));
        let err = validate_region(&source, &extractor(), "x").await.unwrap_err();
        assert_eq!(err.setup_code(), "parse_error");
    }

    #[tokio::test]
    async fn empty_region_is_valid() {
        let source = Fixed(Ok("<html></html>".to_string()));
        assert_eq!(
            validate_region(&source, &extractor(), "x").await.unwrap(),
            None
        );
    }

    #[test]
    fn run_validate_rejects_bad_region() {
        let mut config = Config::default();
        config
            .regions
            .push(crate::models::RegionConfig::new("", "utrecht"));
        assert!(run_validate(&config).is_err());
    }

    #[test]
    fn config_file_with_broken_toml_is_rejected() {
        let tmp = tempfile::TempDir::new().unwrap();
        let path = tmp.path().join("p2000.toml");
        std::fs::write(&path, "[[regions]\ninstance_name = \"Utrecht\"\n").unwrap();

        assert!(matches!(
            validate_config_file(&path),
            Err(crate::error::AppError::Toml(_))
        ));
    }

    #[test]
    fn missing_config_file_is_rejected() {
        let tmp = tempfile::TempDir::new().unwrap();
        assert!(matches!(
            validate_config_file(&tmp.path().join("missing.toml")),
            Err(crate::error::AppError::Io(_))
        ));
    }

    #[test]
    fn valid_config_file_is_returned() {
        let tmp = tempfile::TempDir::new().unwrap();
        let path = tmp.path().join("p2000.toml");
        std::fs::write(
            &path,
            "[[regions]]\ninstance_name = \"Utrecht\"\nregion_path = \"utrecht\"\n",
        )
        .unwrap();

        let config = validate_config_file(&path).unwrap();
        assert_eq!(config.regions[0].key(), "utrecht");
    }
}
