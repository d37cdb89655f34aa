//! # MIE Config
//!
//! TOML-based configuration for the MIE memory engine.
//!
//! The configuration file is `.mie/config.toml`, discovered by walking from
//! the working directory up through its parents. `MIE_CONFIG_PATH` overrides
//! discovery. After parsing, `MIE_*` environment variables override file
//! values, and [`MieConfig::validate`] rejects inconsistent settings with
//! actionable messages.
//!
//! # Environment Variable Overrides
//!
//! - `MIE_STORAGE_ENGINE` → `storage.engine`
//! - `MIE_STORAGE_PATH` → `storage.path`
//! - `MIE_EMBEDDING_ENABLED` → `embedding.enabled`
//! - `MIE_EMBEDDING_PROVIDER` → `embedding.provider`
//! - `MIE_EMBEDDING_BASE_URL` / `OLLAMA_HOST` → `embedding.base_url`
//! - `MIE_EMBEDDING_MODEL` / `OLLAMA_EMBED_MODEL` → `embedding.model`
//! - `MIE_EMBEDDING_API_KEY` / `OPENAI_API_KEY` → `embedding.api_key`
//! - `MIE_EMBEDDING_DIMENSIONS` → `embedding.dimensions`
//! - `MIE_EMBEDDING_WORKERS` → `embedding.workers`

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

/// Supported config file version.
pub const CONFIG_VERSION: &str = "1";

const CONFIG_DIR: &str = ".mie";
const CONFIG_FILE: &str = "config.toml";

/// Top-level MIE configuration, parsed from `.mie/config.toml`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MieConfig {
    #[serde(default = "default_version")]
    pub version: String,
    #[serde(default)]
    pub storage: StorageConfig,
    #[serde(default)]
    pub embedding: EmbeddingConfig,
}

impl Default for MieConfig {
    fn default() -> Self {
        Self {
            version: default_version(),
            storage: StorageConfig::default(),
            embedding: EmbeddingConfig::default(),
        }
    }
}

/// Storage substrate selection.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Substrate engine: `mem`, `sqlite`, or `rocksdb`.
    #[serde(default = "default_engine")]
    pub engine: String,
    /// Filesystem root for on-disk engines. Empty resolves to
    /// `~/.mie/data/default` at runtime.
    #[serde(default)]
    pub path: String,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            engine: default_engine(),
            path: String::new(),
        }
    }
}

/// Embedding pipeline configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmbeddingConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,
    /// Provider: `local`, `cloud`, or `mock`.
    #[serde(default = "default_provider")]
    pub provider: String,
    #[serde(default = "default_base_url")]
    pub base_url: String,
    #[serde(default = "default_model")]
    pub model: String,
    /// Vector width. Immutable after the database is first initialized.
    #[serde(default = "default_dimensions")]
    pub dimensions: usize,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub api_key: String,
    /// Maximum concurrent embedding requests.
    #[serde(default = "default_workers")]
    pub workers: usize,
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            provider: default_provider(),
            base_url: default_base_url(),
            model: default_model(),
            dimensions: default_dimensions(),
            api_key: String::new(),
            workers: default_workers(),
        }
    }
}

fn default_version() -> String {
    CONFIG_VERSION.to_string()
}
fn default_engine() -> String {
    "rocksdb".to_string()
}
fn default_true() -> bool {
    true
}
fn default_provider() -> String {
    "local".to_string()
}
fn default_base_url() -> String {
    std::env::var("OLLAMA_HOST").unwrap_or_else(|_| "http://localhost:11434".to_string())
}
fn default_model() -> String {
    std::env::var("OLLAMA_EMBED_MODEL").unwrap_or_else(|_| "nomic-embed-text".to_string())
}
fn default_dimensions() -> usize {
    768
}
fn default_workers() -> usize {
    4
}

impl MieConfig {
    /// Load from an explicit path, or discover `.mie/config.toml` in the
    /// working directory and its parents. Env overrides and validation apply.
    pub fn load(explicit: Option<&Path>) -> anyhow::Result<Self> {
        let path = match explicit {
            Some(p) => p.to_path_buf(),
            None => discover_config_file()?,
        };
        Self::from_file(&path)
    }

    /// Load configuration from a TOML file.
    pub fn from_file(path: &Path) -> anyhow::Result<Self> {
        let contents = std::fs::read_to_string(path).map_err(|e| {
            anyhow::anyhow!("cannot read config file {}: {e}", path.display())
        })?;
        let mut config = Self::parse_toml(&contents)
            .map_err(|e| anyhow::anyhow!("invalid config in {}: {e}", path.display()))?;
        if config.version != CONFIG_VERSION {
            anyhow::bail!(
                "unsupported config version {:?} in {} (expected {:?}); run 'mie init --force' to regenerate",
                config.version,
                path.display(),
                CONFIG_VERSION
            );
        }
        config.apply_env_overrides();
        config.validate()?;
        Ok(config)
    }

    /// Parse configuration from a TOML string. No env overrides, no
    /// validation; callers compose those as needed.
    pub fn parse_toml(toml_str: &str) -> anyhow::Result<Self> {
        toml::from_str(toml_str).map_err(|e| anyhow::anyhow!("{e}"))
    }

    /// Apply `MIE_*` (and legacy Ollama/OpenAI) environment overrides.
    pub fn apply_env_overrides(&mut self) {
        if let Ok(v) = std::env::var("MIE_STORAGE_ENGINE") {
            self.storage.engine = v;
        }
        if let Ok(v) = std::env::var("MIE_STORAGE_PATH") {
            self.storage.path = v;
        }

        if let Ok(v) = std::env::var("MIE_EMBEDDING_ENABLED") {
            self.embedding.enabled = v.eq_ignore_ascii_case("true") || v == "1";
        }
        if let Ok(v) = std::env::var("MIE_EMBEDDING_PROVIDER") {
            self.embedding.provider = v;
        }
        if let Ok(v) = std::env::var("MIE_EMBEDDING_BASE_URL") {
            self.embedding.base_url = v;
        } else if let Ok(v) = std::env::var("OLLAMA_HOST") {
            self.embedding.base_url = v;
        }
        if let Ok(v) = std::env::var("MIE_EMBEDDING_MODEL") {
            self.embedding.model = v;
        } else if let Ok(v) = std::env::var("OLLAMA_EMBED_MODEL") {
            self.embedding.model = v;
        }
        if let Ok(v) = std::env::var("MIE_EMBEDDING_API_KEY") {
            self.embedding.api_key = v;
        } else if let Ok(v) = std::env::var("OPENAI_API_KEY") {
            self.embedding.api_key = v;
            if self.embedding.provider == "local" {
                self.embedding.provider = "cloud".to_string();
            }
        }
        if let Ok(v) = std::env::var("MIE_EMBEDDING_DIMENSIONS") {
            if let Ok(n) = v.parse::<usize>() {
                self.embedding.dimensions = n;
            }
        }
        if let Ok(v) = std::env::var("MIE_EMBEDDING_WORKERS") {
            if let Ok(n) = v.parse::<usize>() {
                self.embedding.workers = n;
            }
        }
    }

    /// Validate configuration values with detailed error messages.
    pub fn validate(&self) -> anyhow::Result<()> {
        let valid_engines = ["mem", "sqlite", "rocksdb"];
        if !valid_engines.contains(&self.storage.engine.as_str()) {
            anyhow::bail!(
                "storage.engine must be one of: {} (got {:?}). Set it in .mie/config.toml or via MIE_STORAGE_ENGINE.",
                valid_engines.join(", "),
                self.storage.engine
            );
        }

        let valid_providers = ["local", "cloud", "mock", "ollama", "openai", "nomic"];
        if !valid_providers.contains(&self.embedding.provider.as_str()) {
            anyhow::bail!(
                "embedding.provider must be one of: local, cloud, mock (got {:?}).",
                self.embedding.provider
            );
        }

        if self.embedding.dimensions == 0 || self.embedding.dimensions > 8192 {
            anyhow::bail!(
                "embedding.dimensions must be between 1 and 8192 (got {}).",
                self.embedding.dimensions
            );
        }
        if self.embedding.workers == 0 {
            anyhow::bail!("embedding.workers must be > 0.");
        }

        Ok(())
    }

    /// Write the configuration as TOML, creating parent directories.
    pub fn save(&self, path: &Path) -> anyhow::Result<()> {
        let contents = toml::to_string_pretty(self)
            .map_err(|e| anyhow::anyhow!("cannot encode config: {e}"))?;
        if let Some(dir) = path.parent() {
            std::fs::create_dir_all(dir).map_err(|e| {
                anyhow::anyhow!("cannot create config directory {}: {e}", dir.display())
            })?;
        }
        std::fs::write(path, contents)
            .map_err(|e| anyhow::anyhow!("cannot write config file {}: {e}", path.display()))
    }

    /// The effective data directory: `storage.path` when set, otherwise
    /// `~/.mie/data/default`.
    pub fn resolve_data_dir(&self) -> anyhow::Result<PathBuf> {
        if !self.storage.path.is_empty() {
            return Ok(PathBuf::from(&self.storage.path));
        }
        default_data_dir()
    }

    /// The substrate target derived from the data directory: a db file for
    /// sqlite, the directory itself for rocksdb, ignored for mem.
    pub fn resolve_storage_path(&self) -> anyhow::Result<PathBuf> {
        let data_dir = self.resolve_data_dir()?;
        if self.storage.engine == "sqlite" {
            Ok(data_dir.join("index.db"))
        } else {
            Ok(data_dir)
        }
    }
}

/// The default data directory, `~/.mie/data/default`.
pub fn default_data_dir() -> anyhow::Result<PathBuf> {
    let home = dirs::home_dir()
        .ok_or_else(|| anyhow::anyhow!("cannot determine home directory"))?;
    Ok(home.join(CONFIG_DIR).join("data").join("default"))
}

/// The config file location inside a directory.
pub fn config_path(dir: &Path) -> PathBuf {
    dir.join(CONFIG_DIR).join(CONFIG_FILE)
}

/// Find `.mie/config.toml` starting from the working directory and walking
/// up. `MIE_CONFIG_PATH` short-circuits the search.
pub fn discover_config_file() -> anyhow::Result<PathBuf> {
    if let Ok(path) = std::env::var("MIE_CONFIG_PATH") {
        let path = PathBuf::from(path);
        if path.exists() {
            return Ok(path);
        }
        anyhow::bail!(
            "MIE_CONFIG_PATH is set to {} but the file does not exist",
            path.display()
        );
    }

    let mut dir = std::env::current_dir()
        .map_err(|e| anyhow::anyhow!("cannot access working directory: {e}"))?;
    loop {
        let candidate = config_path(&dir);
        if candidate.exists() {
            return Ok(candidate);
        }
        if !dir.pop() {
            break;
        }
    }

    anyhow::bail!(
        "no .mie/config.toml found in the current directory or any parent; run 'mie init' to create one"
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_sensible() {
        let config = MieConfig::default();
        assert_eq!(config.version, "1");
        assert_eq!(config.storage.engine, "rocksdb");
        assert!(config.embedding.enabled);
        assert_eq!(config.embedding.provider, "local");
        assert_eq!(config.embedding.dimensions, 768);
        assert_eq!(config.embedding.workers, 4);
        config.validate().expect("defaults validate");
    }

    #[test]
    fn parses_partial_toml() {
        let config = MieConfig::parse_toml(
            r#"
version = "1"

[storage]
engine = "sqlite"

[embedding]
provider = "mock"
dimensions = 64
"#,
        )
        .expect("parse");
        assert_eq!(config.storage.engine, "sqlite");
        assert_eq!(config.embedding.provider, "mock");
        assert_eq!(config.embedding.dimensions, 64);
        // Unspecified fields keep their defaults.
        assert_eq!(config.embedding.workers, 4);
        config.validate().expect("validates");
    }

    #[test]
    fn rejects_unknown_engine() {
        let config = MieConfig::parse_toml(
            r#"
[storage]
engine = "postgres"
"#,
        )
        .expect("parse");
        let err = config.validate().expect_err("invalid engine");
        assert!(err.to_string().contains("storage.engine"));
        assert!(err.to_string().contains("postgres"));
    }

    #[test]
    fn rejects_zero_dimensions_and_workers() {
        let mut config = MieConfig::default();
        config.embedding.dimensions = 0;
        assert!(config.validate().is_err());

        let mut config = MieConfig::default();
        config.embedding.workers = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn save_and_reload_round_trip() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = config_path(dir.path());

        let mut config = MieConfig::default();
        config.storage.engine = "mem".to_string();
        config.embedding.provider = "mock".to_string();
        config.save(&path).expect("save");

        let loaded = MieConfig::from_file(&path).expect("reload");
        assert_eq!(loaded.storage.engine, "mem");
        assert_eq!(loaded.embedding.provider, "mock");
    }

    #[test]
    fn version_mismatch_is_rejected() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = config_path(dir.path());
        let mut config = MieConfig::default();
        config.version = "99".to_string();
        config.save(&path).expect("save");

        let err = MieConfig::from_file(&path).expect_err("bad version");
        assert!(err.to_string().contains("unsupported config version"));
    }

    #[test]
    fn sqlite_storage_path_is_a_db_file() {
        let mut config = MieConfig::default();
        config.storage.engine = "sqlite".to_string();
        config.storage.path = "/tmp/mie-test-data".to_string();
        let path = config.resolve_storage_path().expect("resolve");
        assert!(path.ends_with("index.db"));

        config.storage.engine = "rocksdb".to_string();
        let path = config.resolve_storage_path().expect("resolve");
        assert_eq!(path, PathBuf::from("/tmp/mie-test-data"));
    }
}
