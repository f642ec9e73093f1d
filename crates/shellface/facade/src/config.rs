//! Facade configuration.
//!
//! Loaded from a TOML file; every field has a default, so a missing file or an
//! empty one yields a facade that tracks state without driving the compositor.
//!
//! ```toml
//! [service]
//! shell_version = "46.0"
//!
//! [overview]
//! show = ["niri", "msg", "action", "open-overview"]
//! hide = ["niri", "msg", "action", "close-overview"]
//!
//! [[extensions]]
//! uuid = "dock@example.org"
//! name = "Dock"
//! enabled = true
//! ```

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use thiserror::Error;

/// Errors that can occur when loading configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
	/// Error reading a configuration file.
	#[error("I/O error reading {path}: {error}")]
	Io {
		/// Path to the file that failed to read.
		path: PathBuf,
		/// The underlying I/O error.
		error: std::io::Error,
	},

	/// Error parsing TOML syntax or shape.
	#[error("TOML parse error in {path}: {error}")]
	Toml {
		/// Path to the offending file.
		path: PathBuf,
		/// The underlying parse error.
		error: toml::de::Error,
	},

	/// A command list is present but empty.
	#[error("empty command for {0}")]
	EmptyCommand(&'static str),

	/// Two extensions share a uuid.
	#[error("duplicate extension uuid: {0}")]
	DuplicateExtension(String),
}

/// Result type for configuration operations.
pub type Result<T> = std::result::Result<T, ConfigError>;

/// Top-level configuration.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
	/// Identity reported over the bus.
	pub service: ServiceConfig,
	/// Overview commands.
	pub overview: CommandPair,
	/// On-screen keyboard commands.
	pub keyboard: CommandPair,
	/// OSD command template.
	pub osd: OsdConfig,
	/// Extensions reported by `org.gnome.Shell.Extensions`.
	pub extensions: Vec<ExtensionConfig>,
}

/// Bus-visible identity of the facade.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ServiceConfig {
	/// Value of the `ShellVersion` property.
	pub shell_version: String,
	/// Value of the `Mode` property.
	pub mode: String,
	/// Value of the Caribou `Name` property.
	pub keyboard_name: String,
	/// Initial `UserExtensionsEnabled`.
	pub user_extensions_enabled: bool,
}

impl Default for ServiceConfig {
	fn default() -> Self {
		Self {
			shell_version: "46.0".to_string(),
			mode: "user".to_string(),
			keyboard_name: "shellface".to_string(),
			user_extensions_enabled: true,
		}
	}
}

/// Optional show/hide commands for a toggleable subsystem.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CommandPair {
	/// Argv run to show.
	pub show: Option<Vec<String>>,
	/// Argv run to hide.
	pub hide: Option<Vec<String>>,
}

/// OSD command template.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct OsdConfig {
	/// Argv with `{icon}`, `{label}`, `{level}`, `{max_level}`, `{connector}` placeholders.
	pub command: Option<Vec<String>>,
}

/// One extension record.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ExtensionConfig {
	/// Extension uuid.
	pub uuid: String,
	/// Display name, defaults to the uuid.
	pub name: Option<String>,
	/// Description.
	#[serde(default)]
	pub description: String,
	/// Initial enabled state.
	#[serde(default = "default_true")]
	pub enabled: bool,
}

fn default_true() -> bool {
	true
}

impl Config {
	/// Parses configuration text. `path` is only used in error messages.
	///
	/// # Errors
	///
	/// Returns [`ConfigError::Toml`] for malformed input and a validation error
	/// for empty commands or duplicate extensions.
	pub fn parse(text: &str, path: &Path) -> Result<Self> {
		let config: Config = toml::from_str(text).map_err(|error| ConfigError::Toml {
			path: path.to_path_buf(),
			error,
		})?;
		config.validate()?;
		Ok(config)
	}

	/// Loads configuration from `path`.
	///
	/// # Errors
	///
	/// Returns [`ConfigError::Io`] if the file cannot be read, or any error from
	/// [`Config::parse`].
	pub fn load(path: &Path) -> Result<Self> {
		let text = std::fs::read_to_string(path).map_err(|error| ConfigError::Io {
			path: path.to_path_buf(),
			error,
		})?;
		Self::parse(&text, path)
	}

	/// Loads `path` if it exists, otherwise returns the defaults.
	///
	/// # Errors
	///
	/// Same as [`Config::load`] for an existing file.
	pub fn load_or_default(path: Option<&Path>) -> Result<Self> {
		match path {
			Some(path) if path.exists() => Self::load(path),
			Some(path) => {
				tracing::debug!(path = %path.display(), "no config file, using defaults");
				Ok(Self::default())
			}
			None => Ok(Self::default()),
		}
	}

	fn validate(&self) -> Result<()> {
		let commands = [
			("overview.show", &self.overview.show),
			("overview.hide", &self.overview.hide),
			("keyboard.show", &self.keyboard.show),
			("keyboard.hide", &self.keyboard.hide),
			("osd.command", &self.osd.command),
		];
		for (name, argv) in commands {
			if argv.as_ref().is_some_and(Vec::is_empty) {
				return Err(ConfigError::EmptyCommand(name));
			}
		}

		let mut seen = HashSet::new();
		for ext in &self.extensions {
			if !seen.insert(ext.uuid.as_str()) {
				return Err(ConfigError::DuplicateExtension(ext.uuid.clone()));
			}
		}
		Ok(())
	}
}

#[cfg(test)]
mod tests {
	use std::io::Write;

	use pretty_assertions::assert_eq;

	use super::*;

	#[test]
	fn empty_text_yields_defaults() {
		let config = Config::parse("", Path::new("config.toml")).unwrap();
		assert_eq!(config, Config::default());
		assert_eq!(config.service.mode, "user");
		assert!(config.service.user_extensions_enabled);
	}

	#[test]
	fn parses_commands_and_extensions() {
		let text = r#"
			[service]
			shell_version = "45.2"

			[overview]
			show = ["niri", "msg", "action", "open-overview"]

			[[extensions]]
			uuid = "dock@example.org"
			enabled = false
		"#;
		let config = Config::parse(text, Path::new("config.toml")).unwrap();

		assert_eq!(config.service.shell_version, "45.2");
		assert_eq!(config.service.keyboard_name, "shellface");
		assert_eq!(
			config.overview.show.as_deref(),
			Some(&["niri".to_string(), "msg".into(), "action".into(), "open-overview".into()][..])
		);
		assert!(config.overview.hide.is_none());
		assert_eq!(config.extensions.len(), 1);
		assert!(!config.extensions[0].enabled);
		assert_eq!(config.extensions[0].name, None);
	}

	#[test]
	fn rejects_empty_command() {
		let err = Config::parse("[keyboard]\nshow = []\n", Path::new("c.toml")).unwrap_err();
		assert!(matches!(err, ConfigError::EmptyCommand("keyboard.show")));
	}

	#[test]
	fn rejects_duplicate_extension() {
		let text = "[[extensions]]\nuuid = \"a@b\"\n[[extensions]]\nuuid = \"a@b\"\n";
		let err = Config::parse(text, Path::new("c.toml")).unwrap_err();
		assert!(matches!(err, ConfigError::DuplicateExtension(uuid) if uuid == "a@b"));
	}

	#[test]
	fn rejects_unknown_fields() {
		let err = Config::parse("[service]\nbogus = 1\n", Path::new("c.toml")).unwrap_err();
		assert!(matches!(err, ConfigError::Toml { .. }));
	}

	#[test]
	fn load_or_default_reads_existing_file() {
		let mut file = tempfile::NamedTempFile::new().unwrap();
		writeln!(file, "[service]\nmode = \"gdm\"").unwrap();

		let config = Config::load_or_default(Some(file.path())).unwrap();
		assert_eq!(config.service.mode, "gdm");

		let missing = file.path().with_extension("missing");
		assert_eq!(Config::load_or_default(Some(&missing)).unwrap(), Config::default());
	}
}
