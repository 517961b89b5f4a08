//! Feature-model configuration engine.
//!
//! Load a feature model into a [`FeatureTree`](models::FeatureTree), open a
//! [`ConfigurationSession`] on it, and toggle features. The session keeps the
//! selection consistent with the model's AND/OR/ALT groups, reports the
//! constraints still open, and counts the complete configurations that remain.

pub mod api;
pub mod engine;
pub mod error;
pub mod format;
pub mod models;
pub mod registry;
pub mod render;
pub mod settings;

pub use engine::{ConfigurationSession, ConfigurationState, ValidationResult, Violation};
pub use error::{CountError, Error, StructuralError, ToggleRejection};
