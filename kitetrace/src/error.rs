//! Error types.
//!
//! Contract violations (a trace table lookup without a trace name) panic.
//! Lookups that may legitimately miss return `Option`. The errors here cover
//! malformed input and strategy registration.

use thiserror::Error;

use crate::name::Name;

/// Failure parsing a [`Name`] from its URI form.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum NameError {
    #[error("empty name")]
    Empty,
    #[error("name `{0}` must start with '/'")]
    MissingLeadingSlash(String),
}

/// A trace flag value outside the known set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("unknown trace flag {0}")]
pub struct TraceFlagError(pub u8);

/// Strategy registry failures.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RegistryError {
    #[error("strategy {0} is already registered")]
    Duplicate(Name),
    #[error("no strategy registered under {0}")]
    Unknown(Name),
}
