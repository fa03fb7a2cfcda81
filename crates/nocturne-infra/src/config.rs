//! Configuration loader for Nocturne.
//!
//! Reads `nocturne.toml` from the data directory (`~/.nocturne/` in
//! production) and deserializes it into [`NocturneConfig`]. Falls back to
//! defaults when the file is missing or malformed. Relative paths in the
//! result are resolved against the data directory.

use std::path::{Path, PathBuf};

use nocturne_types::config::NocturneConfig;

/// Name of the config file inside the data directory.
pub const CONFIG_FILE: &str = "nocturne.toml";

/// Resolve the data directory from environment or platform defaults.
///
/// Priority:
/// 1. `NOCTURNE_DATA_DIR` environment variable
/// 2. `~/.nocturne`
/// 3. `./.nocturne`
pub fn resolve_data_dir() -> PathBuf {
    if let Ok(dir) = std::env::var("NOCTURNE_DATA_DIR") {
        return PathBuf::from(dir);
    }

    if let Some(home) = dirs::home_dir() {
        return home.join(".nocturne");
    }

    PathBuf::from(".nocturne")
}

/// Load configuration from `{data_dir}/nocturne.toml`.
///
/// - If the file does not exist, returns the defaults.
/// - If the file exists but fails to parse, logs a warning and returns the defaults.
/// - Otherwise returns the parsed config.
pub async fn load_config(data_dir: &Path) -> NocturneConfig {
    let config_path = data_dir.join(CONFIG_FILE);

    let content = match tokio::fs::read_to_string(&config_path).await {
        Ok(content) => content,
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
            tracing::debug!("No {CONFIG_FILE} found at {}, using defaults", config_path.display());
            return NocturneConfig::default().rooted_at(data_dir);
        }
        Err(err) => {
            tracing::warn!("Failed to read {}: {err}, using defaults", config_path.display());
            return NocturneConfig::default().rooted_at(data_dir);
        }
    };

    match toml::from_str::<NocturneConfig>(&content) {
        Ok(config) => config.rooted_at(data_dir),
        Err(err) => {
            tracing::warn!(
                "Failed to parse {}: {err}, using defaults",
                config_path.display()
            );
            NocturneConfig::default().rooted_at(data_dir)
        }
    }
}
