//! Engine configuration, loadable from TOML.
//!
//! ```toml
//! mode = "preview"
//!
//! [scale]
//! base_width = 1280
//! base_height = 720
//!
//! [render]
//! groups = ["hud", "menus"]
//! ```

use std::path::{Path, PathBuf};

use serde::Deserialize;
use thiserror::Error;

use crate::dispatch::RenderRequest;
use crate::scale::ScaleConfig;

/// Errors that can occur when loading configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
	#[error("TOML parse error: {0}")]
	Parse(#[from] toml::de::Error),

	#[error("I/O error reading {path}: {error}")]
	Io {
		path: PathBuf,
		error: std::io::Error,
	},

	#[error("invalid scale configuration: {0}")]
	InvalidScale(String),
}

/// Whether the host is running live or in a preview/story environment.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HostMode {
	#[default]
	Live,
	/// Visibility may be driven by external sources through `bind`.
	Preview,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ForgeConfig {
	pub mode: HostMode,
	pub scale: ScaleConfig,
	/// Selection used by `mount` when the caller passes none.
	pub render: Option<RenderRequest>,
}

impl ForgeConfig {
	pub fn preview() -> Self {
		Self {
			mode: HostMode::Preview,
			..Self::default()
		}
	}

	pub fn from_toml_str(input: &str) -> Result<Self, ConfigError> {
		let config: Self = toml::from_str(input)?;
		config.validate()?;
		Ok(config)
	}

	pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
		let path = path.as_ref();
		let input = std::fs::read_to_string(path).map_err(|error| ConfigError::Io {
			path: path.to_path_buf(),
			error,
		})?;
		Self::from_toml_str(&input)
	}

	pub fn validate(&self) -> Result<(), ConfigError> {
		match self.scale.invalid_reason() {
			Some(reason) => Err(ConfigError::InvalidScale(reason)),
			None => Ok(()),
		}
	}
}
