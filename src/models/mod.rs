//! Domain models for feature-model configuration.
//!
//! # Core Concepts
//!
//! - [`FeatureNode`]: the feature model as loaded, a nested tree of features
//!   composed through AND/OR/ALT groups.
//! - [`FeatureTree`]: the same model flattened into an arena with a name index.
//!   Each entry is a [`FeatureMetadata`] (kind, mandatory, level, parent,
//!   children). Rebuilt whenever the model changes, read-only otherwise.
//! - [`SelectionStore`]: the configuration being edited, one
//!   [`SelectionState`] per feature name.
//! - [`ModelEdit`]: a structural change to the model (add, remove, update a
//!   feature), applied to the [`FeatureNode`] form before the tree is rebuilt.

mod edit;
mod feature;
mod selection;
mod tree;

pub use edit::*;
pub use feature::*;
pub use selection::*;
pub use tree::*;
