use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use serde::Deserialize;

use crate::utils::file::expand_path;

use super::cli::CliConfig;
use super::constants::{
    APP_DOT_FOLDER, CONFIG_FILE_NAME, DEFAULT_QUERY_ENDPOINT, DEFAULT_QUERY_TIMEOUT_SECS,
};

// =============================================================================
// File Configuration (deserialized from JSON, all fields optional)
// =============================================================================

/// Query service configuration section
#[derive(Debug, Default, Clone, Deserialize)]
pub struct QueryFileConfig {
    pub endpoint: Option<String>,
    pub username: Option<String>,
    pub password: Option<String>,
    pub timeout_secs: Option<u64>,
}

/// File-based configuration (JSON)
#[derive(Debug, Default, Deserialize)]
pub struct FileConfig {
    pub bucket: Option<String>,
    pub with_sync_gateway: Option<bool>,
    pub use_default_id_fields: Option<bool>,
    pub query: Option<QueryFileConfig>,
    pub data: Option<String>,
    #[serde(flatten)]
    pub extra: serde_json::Value,
}

impl FileConfig {
    /// Load configuration from a JSON file
    fn load_from_file(path: &Path) -> Result<Self> {
        tracing::debug!(path = %path.display(), "Loading config file");
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        let config: Self = serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;
        tracing::trace!(
            bucket = ?config.bucket,
            has_query = config.query.is_some(),
            "Parsed config file"
        );
        Ok(config)
    }

    /// Warn about unknown fields in the config
    fn warn_unknown_fields(&self) {
        if let serde_json::Value::Object(map) = &self.extra
            && !map.is_empty()
        {
            let keys_str: String = map
                .keys()
                .map(|k| k.as_str())
                .collect::<Vec<_>>()
                .join(", ");
            tracing::warn!(
                fields = %keys_str,
                "Unknown fields in config file (possible typos)"
            );
        }
    }

    /// Merge another FileConfig into this one (other takes precedence)
    fn merge(&mut self, other: FileConfig) {
        if other.bucket.is_some() {
            tracing::trace!(bucket = ?other.bucket, "Merging bucket");
            self.bucket = other.bucket;
        }
        if other.with_sync_gateway.is_some() {
            tracing::trace!(with_sync_gateway = ?other.with_sync_gateway, "Merging with_sync_gateway");
            self.with_sync_gateway = other.with_sync_gateway;
        }
        if other.use_default_id_fields.is_some() {
            tracing::trace!(
                use_default_id_fields = ?other.use_default_id_fields,
                "Merging use_default_id_fields"
            );
            self.use_default_id_fields = other.use_default_id_fields;
        }
        if other.data.is_some() {
            tracing::trace!(data = ?other.data, "Merging data");
            self.data = other.data;
        }

        if let Some(query) = other.query {
            let current = self.query.get_or_insert_with(QueryFileConfig::default);
            if query.endpoint.is_some() {
                tracing::trace!(endpoint = ?query.endpoint, "Merging query.endpoint");
                current.endpoint = query.endpoint;
            }
            if query.username.is_some() {
                tracing::trace!(username = ?query.username, "Merging query.username");
                current.username = query.username;
            }
            if query.password.is_some() {
                tracing::trace!("Merging query.password");
                current.password = query.password;
            }
            if query.timeout_secs.is_some() {
                tracing::trace!(timeout_secs = ?query.timeout_secs, "Merging query.timeout_secs");
                current.timeout_secs = query.timeout_secs;
            }
        }
    }
}

// =============================================================================
// Runtime Configuration (resolved values)
// =============================================================================

/// Query service connection settings
#[derive(Clone)]
pub struct QueryConfig {
    pub endpoint: String,
    pub username: Option<String>,
    pub password: Option<String>,
    pub timeout: Duration,
}

impl std::fmt::Debug for QueryConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("QueryConfig")
            .field("endpoint", &self.endpoint)
            .field("username", &self.username)
            .field("password", &self.password.as_ref().map(|_| "[REDACTED]"))
            .field("timeout", &self.timeout)
            .finish()
    }
}

/// Final merged application configuration
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub bucket: String,
    pub with_sync_gateway: bool,
    pub use_default_id_fields: bool,
    pub query: QueryConfig,
    /// Local bucket file; when set, queries run in memory
    pub data: Option<PathBuf>,
}

impl AppConfig {
    /// Load configuration from all sources
    ///
    /// Priority (lowest to highest):
    /// 1. Defaults
    /// 2. Profile directory config (~/.couchquery/couchquery.json)
    /// 3. Local directory config OR CLI-specified config path
    /// 4. CLI arguments (which include env var fallbacks via clap)
    pub fn load(cli: &CliConfig) -> Result<Self> {
        tracing::debug!("Loading application configuration");

        let mut file_config = FileConfig::default();
        let mut found_configs: Vec<String> = Vec::new();

        // 1. Load from profile dir - skip if not exists
        if let Some(profile_path) = get_profile_config_path()
            && profile_path.exists()
        {
            let profile_config = FileConfig::load_from_file(&profile_path)?;
            profile_config.warn_unknown_fields();
            file_config.merge(profile_config);
            found_configs.push(profile_path.display().to_string());
        }

        // 2. Load from CLI-specified path OR local directory
        let overlay_path = if let Some(ref path) = cli.config {
            let expanded = expand_path(&path.to_string_lossy());
            if !expanded.exists() {
                anyhow::bail!("Config file not found: {}", expanded.display());
            }
            Some(expanded)
        } else {
            let local = PathBuf::from(CONFIG_FILE_NAME);
            if local.exists() { Some(local) } else { None }
        };

        if let Some(path) = overlay_path {
            let overlay_config = FileConfig::load_from_file(&path)?;
            overlay_config.warn_unknown_fields();
            file_config.merge(overlay_config);
            found_configs.push(path.display().to_string());
        }

        tracing::debug!(configs = ?found_configs, "Config files loaded");

        let config = Self::resolve(cli, file_config)?;
        tracing::debug!(config = ?config, "Configuration resolved");
        Ok(config)
    }

    /// Layer configs: defaults -> file config -> CLI/env overrides
    fn resolve(cli: &CliConfig, file_config: FileConfig) -> Result<Self> {
        let file_query = file_config.query.unwrap_or_default();

        let bucket = cli
            .bucket
            .clone()
            .or(file_config.bucket)
            .map(|b| b.trim().to_string())
            .filter(|b| !b.is_empty())
            .context("No bucket configured. Use --bucket or set \"bucket\" in the config file")?;

        let with_sync_gateway = cli
            .with_sync_gateway
            .or(file_config.with_sync_gateway)
            .unwrap_or(false);
        let use_default_id_fields = cli
            .use_default_id_fields
            .or(file_config.use_default_id_fields)
            .unwrap_or(true);

        let timeout_secs = cli
            .timeout_secs
            .or(file_query.timeout_secs)
            .unwrap_or(DEFAULT_QUERY_TIMEOUT_SECS);
        if timeout_secs == 0 {
            anyhow::bail!("query.timeout_secs must be greater than 0");
        }

        let query = QueryConfig {
            endpoint: cli
                .endpoint
                .clone()
                .or(file_query.endpoint)
                .unwrap_or_else(|| DEFAULT_QUERY_ENDPOINT.to_string()),
            username: cli.username.clone().or(file_query.username),
            password: cli.password.clone().or(file_query.password),
            timeout: Duration::from_secs(timeout_secs),
        };

        let data = cli
            .data
            .as_ref()
            .map(|p| expand_path(&p.to_string_lossy()))
            .or_else(|| file_config.data.as_deref().map(expand_path));

        Ok(Self {
            bucket,
            with_sync_gateway,
            use_default_id_fields,
            query,
            data,
        })
    }
}

/// Get the profile config path (~/.couchquery/couchquery.json)
fn get_profile_config_path() -> Option<PathBuf> {
    dirs::home_dir().map(|h| h.join(APP_DOT_FOLDER).join(CONFIG_FILE_NAME))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn cli_with_bucket(bucket: &str) -> CliConfig {
        CliConfig {
            bucket: Some(bucket.to_string()),
            ..Default::default()
        }
    }

    #[test]
    fn test_file_config_parse_full() {
        let json = r#"{
            "bucket": "people",
            "with_sync_gateway": true,
            "use_default_id_fields": false,
            "query": {
                "endpoint": "http://db:8093",
                "username": "admin",
                "password": "secret",
                "timeout_secs": 10
            }
        }"#;
        let config: FileConfig = serde_json::from_str(json).unwrap();

        assert_eq!(config.bucket.as_deref(), Some("people"));
        assert_eq!(config.with_sync_gateway, Some(true));
        assert_eq!(config.use_default_id_fields, Some(false));
        let query = config.query.unwrap();
        assert_eq!(query.endpoint.as_deref(), Some("http://db:8093"));
        assert_eq!(query.timeout_secs, Some(10));
    }

    #[test]
    fn test_file_config_parse_empty() {
        let config: FileConfig = serde_json::from_str("{}").unwrap();
        assert!(config.bucket.is_none());
        assert!(config.query.is_none());
    }

    #[test]
    fn test_file_config_parse_extra_fields() {
        let json = r#"{ "bucket": "people", "buckets": "typo" }"#;
        let config: FileConfig = serde_json::from_str(json).unwrap();

        assert_eq!(config.bucket.as_deref(), Some("people"));
        assert_eq!(config.extra.get("buckets").unwrap(), "typo");
    }

    #[test]
    fn test_file_config_merge() {
        let mut base: FileConfig = serde_json::from_str(
            r#"{ "bucket": "base", "query": { "endpoint": "http://a:8093", "username": "u" } }"#,
        )
        .unwrap();
        let overlay: FileConfig = serde_json::from_str(
            r#"{ "with_sync_gateway": true, "query": { "endpoint": "http://b:8093" } }"#,
        )
        .unwrap();

        base.merge(overlay);

        assert_eq!(base.bucket.as_deref(), Some("base"));
        assert_eq!(base.with_sync_gateway, Some(true));
        let query = base.query.unwrap();
        assert_eq!(query.endpoint.as_deref(), Some("http://b:8093"));
        assert_eq!(query.username.as_deref(), Some("u"));
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{ "bucket": "orders", "query": {{ "timeout_secs": 5 }} }}"#).unwrap();

        let config = FileConfig::load_from_file(file.path()).unwrap();
        assert_eq!(config.bucket.as_deref(), Some("orders"));
        assert_eq!(config.query.unwrap().timeout_secs, Some(5));
    }

    #[test]
    fn test_load_from_file_invalid_json() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "{{ not json").unwrap();

        let err = FileConfig::load_from_file(file.path()).unwrap_err();
        assert!(err.to_string().starts_with("Failed to parse config file"));
    }

    #[test]
    fn test_resolve_defaults() {
        let config = AppConfig::resolve(&cli_with_bucket("people"), FileConfig::default()).unwrap();

        assert_eq!(config.bucket, "people");
        assert!(!config.with_sync_gateway);
        assert!(config.use_default_id_fields);
        assert_eq!(config.query.endpoint, DEFAULT_QUERY_ENDPOINT);
        assert_eq!(
            config.query.timeout,
            Duration::from_secs(DEFAULT_QUERY_TIMEOUT_SECS)
        );
        assert!(config.query.username.is_none());
        assert!(config.data.is_none());
    }

    #[test]
    fn test_resolve_cli_overrides_file() {
        let file: FileConfig = serde_json::from_str(
            r#"{
                "bucket": "from_file",
                "with_sync_gateway": false,
                "query": { "endpoint": "http://file:8093", "password": "file-secret" }
            }"#,
        )
        .unwrap();
        let cli = CliConfig {
            bucket: Some("from_cli".to_string()),
            with_sync_gateway: Some(true),
            endpoint: Some("http://cli:8093".to_string()),
            ..Default::default()
        };

        let config = AppConfig::resolve(&cli, file).unwrap();
        assert_eq!(config.bucket, "from_cli");
        assert!(config.with_sync_gateway);
        assert_eq!(config.query.endpoint, "http://cli:8093");
        assert_eq!(config.query.password.as_deref(), Some("file-secret"));
    }

    #[test]
    fn test_resolve_requires_bucket() {
        assert!(AppConfig::resolve(&CliConfig::default(), FileConfig::default()).is_err());
        assert!(AppConfig::resolve(&cli_with_bucket("  "), FileConfig::default()).is_err());
    }

    #[test]
    fn test_resolve_rejects_zero_timeout() {
        let cli = CliConfig {
            timeout_secs: Some(0),
            ..cli_with_bucket("people")
        };
        assert!(AppConfig::resolve(&cli, FileConfig::default()).is_err());
    }

    #[test]
    fn test_load_explicit_config_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("custom.json");
        fs::write(&path, r#"{ "bucket": "tickets", "use_default_id_fields": false }"#).unwrap();

        let cli = CliConfig {
            config: Some(path),
            ..Default::default()
        };
        let config = AppConfig::load(&cli).unwrap();
        assert_eq!(config.bucket, "tickets");
        assert!(!config.use_default_id_fields);
    }

    #[test]
    fn test_load_missing_config_path() {
        let cli = CliConfig {
            config: Some(PathBuf::from("/nonexistent/couchquery.json")),
            ..cli_with_bucket("people")
        };
        let err = AppConfig::load(&cli).unwrap_err();
        assert!(err.to_string().contains("Config file not found"));
    }

    #[test]
    fn test_debug_redacts_password() {
        let cli = CliConfig {
            password: Some("hunter2".to_string()),
            ..cli_with_bucket("people")
        };
        let config = AppConfig::resolve(&cli, FileConfig::default()).unwrap();
        let debug = format!("{:?}", config);
        assert!(!debug.contains("hunter2"));
        assert!(debug.contains("[REDACTED]"));
    }
}
