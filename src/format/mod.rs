//! Reading and writing feature models and configurations.
//!
//! - Feature models: FeatureIDE-style XML (`<featureModel><struct>…`), with
//!   `<subtree>` includes, or the JSON tree form.
//! - Configurations: `<configuration>` documents with one `<feature>` element per
//!   feature, plus the plain feature list handed to the composition backend.

mod configuration;
mod model;
mod xml;

pub use configuration::{default_selection, feature_list, parse_configuration, serialize_configuration};
pub use model::{
    load_model, parse_model, parse_model_json, parse_model_xml, save_model, write_model_xml, ModelFormat,
};

use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum FormatError {
    #[error("XML error: {0}")]
    Xml(#[from] quick_xml::Error),

    #[error("XML attribute error: {0}")]
    Attribute(#[from] quick_xml::events::attributes::AttrError),

    #[error("Malformed XML: {0}")]
    Malformed(String),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Document is not valid UTF-8: {0}")]
    Utf8(#[from] std::string::FromUtf8Error),

    #[error("Feature model has no <struct> section")]
    MissingStruct,

    #[error("Feature model has no root feature")]
    MissingRoot,

    #[error("Model error: {0}")]
    Model(String),

    #[error("Unknown element <{tag}> in feature model")]
    UnknownElement { tag: String },

    #[error("<{tag}> element without a name attribute")]
    MissingName { tag: String },

    #[error("SubTree \"{name}\" not found at {}", path.display())]
    SubtreeNotFound { name: String, path: PathBuf },

    #[error("SubTree \"{name}\" includes itself")]
    SubtreeCycle { name: String },

    #[error("SubTree \"{name}\" cannot be resolved without a model directory")]
    SubtreeUnresolved { name: String },
}
