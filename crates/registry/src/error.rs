//! Error types for registry construction.

use thiserror::Error;

/// Errors raised while registering apps.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RegistryError {
	/// An app was registered without a name.
	#[error("app registration failed: missing app name")]
	EmptyName,

	/// Two apps share a name.
	#[error("duplicate registered app name {0:?}; app names must be globally unique")]
	DuplicateName(Box<str>),
}
