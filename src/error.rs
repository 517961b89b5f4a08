//! Error taxonomy for the configuration engine.
//!
//! - [`StructuralError`]: the model or a request references something that does
//!   not exist (or exists twice), or a model edit would break the tree. Fatal for
//!   the operation that hit it.
//! - [`ToggleRejection`]: a toggle the group constraints forbid. Recoverable; the
//!   selection is left exactly as it was before the toggle.
//! - [`CountError`]: the configuration count does not fit the counter's width.
//!
//! Validation violations are not errors. They are query results, see
//! [`crate::engine::ValidationResult`].

use thiserror::Error;
use uuid::Uuid;

use crate::format::FormatError;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StructuralError {
    #[error("Unknown feature: {0}")]
    UnknownFeature(String),

    #[error("Duplicate feature name: {0}")]
    DuplicateFeature(String),

    #[error("Feature without a name under {parent}")]
    MissingName { parent: String },

    #[error("The root feature {0} cannot be removed")]
    RootRemoval(String),

    #[error("Feature {0} has children and cannot become a plain feature")]
    LeafWithChildren(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ToggleRejection {
    #[error("Feature {0} is excluded by an alternative choice and cannot be toggled")]
    Excluded(String),

    #[error("Mandatory feature {feature} cannot be deselected while its AND parent {parent} is selected")]
    MandatoryAndChild { feature: String, parent: String },

    #[error("{feature} is the last selected child of mandatory OR group {parent} and cannot be deselected")]
    LastOrChild { feature: String, parent: String },
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CountError {
    #[error("Configuration count overflowed while counting {feature}")]
    Overflow { feature: String },
}

/// Umbrella error for the library surface.
#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Structural(#[from] StructuralError),

    #[error(transparent)]
    Rejected(#[from] ToggleRejection),

    #[error(transparent)]
    Count(#[from] CountError),

    #[error(transparent)]
    Format(#[from] FormatError),

    /// The change went through; only the count of the new state failed.
    #[error("Change applied, but the configuration can no longer be counted: {0}")]
    AppliedUncounted(CountError),

    #[error("Session not found: {0}")]
    SessionNotFound(Uuid),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
