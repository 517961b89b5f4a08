//! Feature model documents.

use std::fs;
use std::path::{Path, PathBuf};

use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, Event};
use quick_xml::Writer;
use serde::{Deserialize, Serialize};

use super::xml::{parse_document, Element};
use super::FormatError;
use crate::models::{FeatureKind, FeatureNode};

const SUBTREE: &str = "subtree";
const SUBTREE_FILE: &str = "model.xml";

/// Elements that may appear inside a feature but are not features.
const IGNORED_ELEMENTS: &[&str] = &["description", "graphics"];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ModelFormat {
    Xml,
    Json,
}

impl ModelFormat {
    /// Guess the format from the first non-blank character.
    pub fn detect(text: &str) -> Self {
        match text.trim_start().chars().next() {
            Some('{') => Self::Json,
            _ => Self::Xml,
        }
    }
}

/// Load a model file. `.json` files are read as JSON, anything else as XML with
/// subtrees resolved relative to the file's directory.
pub fn load_model(path: &Path) -> Result<FeatureNode, FormatError> {
    let text = fs::read_to_string(path)?;
    if is_json_path(path) {
        parse_model_json(&text)
    } else {
        parse_model_xml(&text, path.parent())
    }
}

/// Parse a model in either format. Subtree includes are not available.
pub fn parse_model(text: &str, format: Option<ModelFormat>) -> Result<FeatureNode, FormatError> {
    match format.unwrap_or_else(|| ModelFormat::detect(text)) {
        ModelFormat::Json => parse_model_json(text),
        ModelFormat::Xml => parse_model_xml(text, None),
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum JsonModel {
    Envelope {
        status: String,
        #[serde(default)]
        root: Option<FeatureNode>,
        #[serde(default)]
        message: Option<String>,
    },
    Bare(FeatureNode),
}

/// Parse `{"status":"ok","root":{...}}` or a bare root node.
pub fn parse_model_json(text: &str) -> Result<FeatureNode, FormatError> {
    match serde_json::from_str::<JsonModel>(text)? {
        JsonModel::Bare(root) => Ok(root),
        JsonModel::Envelope {
            status, message, ..
        } if status != "ok" => Err(FormatError::Model(
            message.unwrap_or_else(|| format!("model status {status}")),
        )),
        JsonModel::Envelope { root, .. } => root.ok_or(FormatError::MissingRoot),
    }
}

/// Parse a FeatureIDE-style XML model.
///
/// `<subtree name="N"/>` is replaced by the root of `<model_dir>/N/model.xml`.
/// Nested includes resolve against the same `model_dir`.
pub fn parse_model_xml(text: &str, model_dir: Option<&Path>) -> Result<FeatureNode, FormatError> {
    let mut document = parse_document(text)?;
    let structure = document.find_mut("struct").ok_or(FormatError::MissingStruct)?;
    expand_subtrees(structure, model_dir, &mut Vec::new())?;

    let root = structure
        .children
        .iter()
        .find(|c| !IGNORED_ELEMENTS.contains(&c.tag.as_str()))
        .ok_or(FormatError::MissingRoot)?;
    to_feature(root)
}

fn expand_subtrees(
    element: &mut Element,
    model_dir: Option<&Path>,
    including: &mut Vec<String>,
) -> Result<(), FormatError> {
    let mut children = Vec::with_capacity(element.children.len());
    for child in std::mem::take(&mut element.children) {
        if child.tag != SUBTREE {
            children.push(child);
            continue;
        }
        let name = child
            .attr("name")
            .ok_or_else(|| FormatError::MissingName {
                tag: SUBTREE.to_string(),
            })?
            .to_string();
        if including.contains(&name) {
            return Err(FormatError::SubtreeCycle { name });
        }
        let dir = model_dir.ok_or_else(|| FormatError::SubtreeUnresolved { name: name.clone() })?;
        let path = subtree_path(dir, &name);
        if !path.exists() {
            return Err(FormatError::SubtreeNotFound { name, path });
        }

        tracing::debug!("Expanding subtree {} from {}", name, path.display());
        let mut included = parse_document(&fs::read_to_string(&path)?)?;
        let Some(structure) = included.find_mut("struct") else {
            return Err(FormatError::Model(format!(
                "SubTree \"{name}\" has no <struct> section"
            )));
        };
        including.push(name);
        expand_subtrees(structure, model_dir, including)?;
        including.pop();
        children.append(&mut structure.children);
    }
    element.children = children;

    for child in &mut element.children {
        expand_subtrees(child, model_dir, including)?;
    }
    Ok(())
}

fn subtree_path(model_dir: &Path, name: &str) -> PathBuf {
    model_dir.join(name).join(SUBTREE_FILE)
}

fn to_feature(element: &Element) -> Result<FeatureNode, FormatError> {
    let kind = FeatureKind::from_str(&element.tag).ok_or_else(|| FormatError::UnknownElement {
        tag: element.tag.clone(),
    })?;
    let name = element.attr("name").ok_or_else(|| FormatError::MissingName {
        tag: element.tag.clone(),
    })?;

    let children = element
        .children
        .iter()
        .filter(|c| !IGNORED_ELEMENTS.contains(&c.tag.as_str()))
        .map(to_feature)
        .collect::<Result<Vec<_>, _>>()?;

    Ok(FeatureNode {
        name: name.to_string(),
        kind,
        mandatory: element.flag("mandatory"),
        is_abstract: element.flag("abstract"),
        children,
    })
}

/// Save a model file, as JSON for `.json` paths and as XML otherwise.
///
/// Subtree includes were expanded on load and are written inline.
pub fn save_model(path: &Path, root: &FeatureNode) -> Result<(), FormatError> {
    let text = if is_json_path(path) {
        let mut text = serde_json::to_string_pretty(root)?;
        text.push('\n');
        text
    } else {
        write_model_xml(root)?
    };
    fs::write(path, text)?;
    tracing::info!("Feature model saved to {}", path.display());
    Ok(())
}

fn is_json_path(path: &Path) -> bool {
    path.extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case("json"))
}

/// Write the model as `<featureModel><struct>…</struct></featureModel>`.
pub fn write_model_xml(root: &FeatureNode) -> Result<String, FormatError> {
    let mut writer = Writer::new_with_indent(Vec::new(), b' ', 4);
    writer.write_event(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), Some("no"))))?;
    writer.write_event(Event::Start(BytesStart::new("featureModel")))?;
    writer.write_event(Event::Start(BytesStart::new("struct")))?;
    write_feature(&mut writer, root)?;
    writer.write_event(Event::End(BytesEnd::new("struct")))?;
    writer.write_event(Event::End(BytesEnd::new("featureModel")))?;

    let mut text = String::from_utf8(writer.into_inner())?;
    text.push('\n');
    Ok(text)
}

fn write_feature(writer: &mut Writer<Vec<u8>>, node: &FeatureNode) -> Result<(), FormatError> {
    let tag = node.kind.as_str();
    let mut element = BytesStart::new(tag);
    if node.is_abstract {
        element.push_attribute(("abstract", "true"));
    }
    if node.mandatory {
        element.push_attribute(("mandatory", "true"));
    }
    element.push_attribute(("name", node.name.as_str()));

    if node.children.is_empty() {
        writer.write_event(Event::Empty(element))?;
        return Ok(());
    }
    writer.write_event(Event::Start(element))?;
    for child in &node.children {
        write_feature(writer, child)?;
    }
    writer.write_event(Event::End(BytesEnd::new(tag)))?;
    Ok(())
}
