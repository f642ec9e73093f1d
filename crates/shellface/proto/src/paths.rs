//! Utilities for facade file paths.

use std::path::PathBuf;

/// Returns the default configuration file path.
///
/// # Resolution Order
///
/// 1. `SHELLFACE_CONFIG` environment variable.
/// 2. User config directory (e.g., `$XDG_CONFIG_HOME/shellface/config.toml`).
/// 3. `None` when no config directory can be determined.
#[must_use]
pub fn default_config_path() -> Option<PathBuf> {
	if let Ok(p) = std::env::var("SHELLFACE_CONFIG") {
		return Some(PathBuf::from(p));
	}

	dirs::config_dir().map(|dir| dir.join("shellface").join("config.toml"))
}
