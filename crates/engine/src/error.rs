//! Error taxonomy of the engine.
//!
//! Structural errors propagate to the immediate caller. Cosmetic failures
//! (layering an app that was never materialized) are logged and swallowed
//! instead of surfacing here.

use thiserror::Error;

use crate::config::ConfigError;

/// Errors returned by [`AppForge`](crate::AppForge) operations.
#[derive(Debug, Error)]
pub enum ForgeError {
	/// A name or parent is not present in the registry.
	#[error("app {0:?} is not registered")]
	UnknownApp(Box<str>),

	/// Rule configuration that only surfaces once a render recipe is needed.
	#[error(transparent)]
	Configuration(#[from] ConfigurationError),

	/// A render selection resolved to zero apps.
	#[error("render selection resolved 0 apps ({0})")]
	EmptySelection(String),

	/// A render request mixes selection kinds that cannot be combined.
	#[error("conflicting render selection: {0}")]
	ConflictingSelection(&'static str),

	/// External sources can only drive visibility outside live mode.
	#[error("cannot bind {0:?} to an external source while the host is live")]
	BindUnavailable(Box<str>),

	/// Reading the configuration file failed.
	#[error(transparent)]
	Config(#[from] ConfigError),
}

/// Invalid rule declarations detected at materialization time.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigurationError {
	#[error("app {0:?} declares itself as its parent")]
	SelfParent(Box<str>),

	#[error("app {app:?} declares parent {parent:?}, which is not registered")]
	MissingParent { app: Box<str>, parent: Box<str> },
}

pub type Result<T> = std::result::Result<T, ForgeError>;
