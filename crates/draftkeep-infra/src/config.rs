//! Client configuration loader for draftkeep.
//!
//! Reads `config.toml` from the data directory (`~/.draftkeep/` by default)
//! and deserializes it into [`ClientConfig`]. Falls back to defaults when the
//! file is missing or malformed, then applies environment overrides.

use std::path::{Path, PathBuf};

use draftkeep_types::config::ClientConfig;

/// Environment variable that relocates the data directory.
pub const DATA_DIR_ENV: &str = "DRAFTKEEP_DATA_DIR";

/// Environment variable that overrides `backend_url`.
pub const BACKEND_URL_ENV: &str = "DRAFTKEEP_BACKEND_URL";

/// Resolve the data directory.
///
/// Priority: `DRAFTKEEP_DATA_DIR`, then `~/.draftkeep`, then `./.draftkeep`.
pub fn resolve_data_dir() -> PathBuf {
    if let Ok(dir) = std::env::var(DATA_DIR_ENV) {
        return PathBuf::from(dir);
    }

    if let Some(home) = dirs::home_dir() {
        return home.join(".draftkeep");
    }

    PathBuf::from(".draftkeep")
}

/// Load client configuration from `{data_dir}/config.toml` and apply
/// environment overrides.
pub async fn load_client_config(data_dir: &Path) -> ClientConfig {
    let config = read_config_file(data_dir).await;
    apply_env_overrides(config, |key| std::env::var(key).ok())
}

async fn read_config_file(data_dir: &Path) -> ClientConfig {
    let config_path = data_dir.join("config.toml");

    let content = match tokio::fs::read_to_string(&config_path).await {
        Ok(content) => content,
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
            tracing::debug!("No config.toml found at {}, using defaults", config_path.display());
            return ClientConfig::default();
        }
        Err(err) => {
            tracing::warn!("Failed to read {}: {err}, using defaults", config_path.display());
            return ClientConfig::default();
        }
    };

    match toml::from_str::<ClientConfig>(&content) {
        Ok(config) => config,
        Err(err) => {
            tracing::warn!(
                "Failed to parse {}: {err}, using defaults",
                config_path.display()
            );
            ClientConfig::default()
        }
    }
}

/// Apply environment overrides using `lookup` to read variables.
pub fn apply_env_overrides(
    mut config: ClientConfig,
    lookup: impl Fn(&str) -> Option<String>,
) -> ClientConfig {
    if let Some(url) = lookup(BACKEND_URL_ENV).filter(|u| !u.trim().is_empty()) {
        tracing::debug!(backend_url = %url, "Backend URL overridden from environment");
        config.backend_url = url;
    }
    config
}
