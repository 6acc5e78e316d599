//! Runtime environment helpers
//!
//! Thin wrapper around `common::env` so binaries can prepare the data
//! directory without depending on `common` directly.

/// Ensure the data directory exists; warn when the config file is missing.
pub async fn ensure_env(config_path: &str, data_dir: &str) -> anyhow::Result<()> {
    common::env::ensure_env(config_path, data_dir).await
}
