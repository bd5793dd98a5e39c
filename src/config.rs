//! Import job configuration.
//!
//! Loaded once at startup from a JSON file. The API token is wrapped in
//! `secrecy::SecretString` so it can never leak through `Debug` output or
//! logging.

use std::path::{Path, PathBuf};
use std::time::Duration;

use secrecy::SecretString;
use serde::Deserialize;

use crate::error::AppError;

// ─────────────────────────────────────────────────────────────────────────────
// Defaults
// ─────────────────────────────────────────────────────────────────────────────

fn default_chunk_size() -> usize {
    20
}

fn default_max_records() -> u64 {
    1_000
}

fn default_primary_locale() -> String {
    "en".to_string()
}

fn default_secondary_locale() -> String {
    "de".to_string()
}

fn default_create_secs() -> u64 {
    30
}

fn default_publish_secs() -> u64 {
    60
}

fn default_lookup_secs() -> u64 {
    30
}

fn default_product_types_secs() -> u64 {
    30
}

fn default_categories_secs() -> u64 {
    180
}

// ─────────────────────────────────────────────────────────────────────────────
// ImportConfig
// ─────────────────────────────────────────────────────────────────────────────

/// Configuration for one import run.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ImportConfig {
    /// Base URL of the remote catalog service (e.g., "https://api.example.com").
    pub base_url: String,
    /// API token for the catalog service (wrapped, never logged).
    pub api_token: SecretString,
    /// Path to the products CSV file.
    pub products_csv: PathBuf,
    /// Records per import chunk; also bounds concurrent in-flight remote calls.
    #[serde(default = "default_chunk_size")]
    pub chunk_size: usize,
    /// Hard cap on records read from the source.
    #[serde(default = "default_max_records")]
    pub max_records: u64,
    /// Locale whose name must be non-empty for a draft to be imported.
    #[serde(default = "default_primary_locale")]
    pub primary_locale: String,
    /// Locale checked for the reserved name-prefix marker.
    #[serde(default = "default_secondary_locale")]
    pub secondary_locale: String,
    /// Per-operation blocking-wait bounds.
    #[serde(default)]
    pub timeouts: Timeouts,
    /// Retry policy point. Defaults to fail-fast (no retry), matching the
    /// recovery semantics of the rest of the pipeline.
    #[serde(default)]
    pub retry: RetryPolicy,
}

/// Blocking-wait bounds, in seconds, for each remote operation class.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Timeouts {
    #[serde(default = "default_lookup_secs")]
    pub lookup_secs: u64,
    #[serde(default = "default_create_secs")]
    pub create_secs: u64,
    #[serde(default = "default_publish_secs")]
    pub publish_secs: u64,
    #[serde(default = "default_product_types_secs")]
    pub product_types_secs: u64,
    #[serde(default = "default_categories_secs")]
    pub categories_secs: u64,
}

impl Default for Timeouts {
    fn default() -> Self {
        Self {
            lookup_secs: default_lookup_secs(),
            create_secs: default_create_secs(),
            publish_secs: default_publish_secs(),
            product_types_secs: default_product_types_secs(),
            categories_secs: default_categories_secs(),
        }
    }
}

impl Timeouts {
    pub fn lookup(&self) -> Duration {
        Duration::from_secs(self.lookup_secs)
    }

    pub fn create(&self) -> Duration {
        Duration::from_secs(self.create_secs)
    }

    pub fn publish(&self) -> Duration {
        Duration::from_secs(self.publish_secs)
    }

    pub fn product_types(&self) -> Duration {
        Duration::from_secs(self.product_types_secs)
    }

    pub fn categories(&self) -> Duration {
        Duration::from_secs(self.categories_secs)
    }
}

/// Retry configuration point.
///
/// The pipeline is deliberately fail-fast: any timeout or remote rejection
/// aborts the job. `max_attempts` above zero is accepted but not yet honored.
// TODO: wire max_attempts/backoff into the chunk dispatch once a bounded
// retry strategy is agreed on.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RetryPolicy {
    /// Additional attempts after the first failure. 0 = fail fast.
    #[serde(default)]
    pub max_attempts: u32,
    /// Delay between attempts, in milliseconds.
    #[serde(default)]
    pub backoff_ms: u64,
}

/// Environment variable that overrides the api_token from the config file, so
/// tokens can stay out of checked-in files.
pub const API_TOKEN_ENV: &str = "CATALOG_API_TOKEN";

impl ImportConfig {
    /// Loads and validates configuration from a JSON file. The API token can
    /// be overridden through `CATALOG_API_TOKEN`.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Config` if the file cannot be read, parsed, or
    /// fails validation.
    pub fn load(path: &Path) -> Result<Self, AppError> {
        let raw = std::fs::read_to_string(path).map_err(|e| {
            AppError::Config(format!("cannot read {}: {}", path.display(), e))
        })?;
        let mut config: ImportConfig = serde_json::from_str(&raw)
            .map_err(|e| AppError::Config(format!("cannot parse {}: {}", path.display(), e)))?;
        if let Ok(token) = std::env::var(API_TOKEN_ENV) {
            config.api_token = SecretString::from(token);
        }
        config.validate()?;
        Ok(config)
    }

    /// Validates cross-field constraints.
    pub fn validate(&self) -> Result<(), AppError> {
        if self.chunk_size == 0 {
            return Err(AppError::Config("chunk_size must be non-zero".into()));
        }
        if self.base_url.is_empty() {
            return Err(AppError::Config("base_url must not be empty".into()));
        }
        if self.primary_locale.is_empty() || self.secondary_locale.is_empty() {
            return Err(AppError::Config("filter locales must not be empty".into()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn write_config(dir: &TempDir, content: &str) -> PathBuf {
        let path = dir.path().join("import.json");
        fs::write(&path, content).expect("Failed to write config");
        path
    }

    #[test]
    fn minimal_config_uses_documented_defaults() {
        let dir = TempDir::new().unwrap();
        let path = write_config(
            &dir,
            r#"{
                "base_url": "https://api.example.com",
                "api_token": "secret-token",
                "products_csv": "data/products.csv"
            }"#,
        );

        let config = ImportConfig::load(&path).expect("load failed");

        assert_eq!(config.chunk_size, 20);
        assert_eq!(config.max_records, 1_000);
        assert_eq!(config.primary_locale, "en");
        assert_eq!(config.secondary_locale, "de");
        assert_eq!(config.timeouts.create(), Duration::from_secs(30));
        assert_eq!(config.timeouts.publish(), Duration::from_secs(60));
        assert_eq!(config.timeouts.categories(), Duration::from_secs(180));
        assert_eq!(config.retry.max_attempts, 0);
    }

    #[test]
    fn explicit_values_override_defaults() {
        let dir = TempDir::new().unwrap();
        let path = write_config(
            &dir,
            r#"{
                "base_url": "https://api.example.com",
                "api_token": "secret-token",
                "products_csv": "products.csv",
                "chunk_size": 5,
                "max_records": 100,
                "timeouts": { "create_secs": 10 }
            }"#,
        );

        let config = ImportConfig::load(&path).expect("load failed");

        assert_eq!(config.chunk_size, 5);
        assert_eq!(config.max_records, 100);
        assert_eq!(config.timeouts.create(), Duration::from_secs(10));
        // Unspecified timeouts keep their defaults
        assert_eq!(config.timeouts.publish(), Duration::from_secs(60));
    }

    #[test]
    fn zero_chunk_size_is_rejected() {
        let dir = TempDir::new().unwrap();
        let path = write_config(
            &dir,
            r#"{
                "base_url": "https://api.example.com",
                "api_token": "t",
                "products_csv": "p.csv",
                "chunk_size": 0
            }"#,
        );

        let result = ImportConfig::load(&path);

        assert!(matches!(result, Err(AppError::Config(_))));
    }

    #[test]
    fn missing_file_is_a_config_error() {
        let result = ImportConfig::load(Path::new("/nonexistent/import.json"));
        assert!(matches!(result, Err(AppError::Config(_))));
    }

    #[test]
    fn debug_output_redacts_api_token() {
        let dir = TempDir::new().unwrap();
        let path = write_config(
            &dir,
            r#"{
                "base_url": "https://api.example.com",
                "api_token": "super_secret_token_12345",
                "products_csv": "p.csv"
            }"#,
        );

        let config = ImportConfig::load(&path).unwrap();
        let debug_output = format!("{:?}", config);

        assert!(!debug_output.contains("super_secret_token_12345"));
    }
}
