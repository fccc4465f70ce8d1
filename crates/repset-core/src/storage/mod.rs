mod kv;
mod sqlite;

pub use kv::{KvStore, MemoryStore};
pub use sqlite::SqliteStore;

use std::path::PathBuf;

/// Returns `~/.config/repset[-dev]/` based on REPSET_ENV.
///
/// Set REPSET_ENV=dev to use the development data directory.
///
/// # Errors
/// Returns an error if the home directory cannot be determined or if
/// creating the config directory fails.
pub fn data_dir() -> Result<PathBuf, Box<dyn std::error::Error>> {
    let base_dir = dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".config");

    let env = std::env::var("REPSET_ENV").unwrap_or_else(|_| "production".to_string());

    let dir = if env == "dev" {
        base_dir.join("repset-dev")
    } else {
        base_dir.join("repset")
    };

    std::fs::create_dir_all(&dir)?;
    Ok(dir)
}
