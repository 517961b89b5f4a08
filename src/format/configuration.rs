//! Persisted configuration documents.
//!
//! ```text
//! <configuration>
//!     <feature name="Chat" automatic="selected"/>
//!     <feature name="Gui" manual="selected" automatic="selected"/>
//!     <feature name="Cli" automatic="unselected"/>
//!     <feature name="Logging"/>
//! </configuration>
//! ```
//!
//! `automatic="unselected"` marks an excluded feature and is written on its own.

use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, Event};
use quick_xml::Writer;

use super::xml::parse_document;
use super::FormatError;
use crate::models::{FeatureTree, SelectionState, SelectionStore};

const SELECTED: &str = "selected";
const UNSELECTED: &str = "unselected";

/// Mandatory features pre-selected, everything else unselected.
pub fn default_selection(tree: &FeatureTree) -> SelectionStore {
    let mut store = SelectionStore::new();
    for (_, meta) in tree.iter().filter(|(_, meta)| meta.mandatory) {
        store.update(&meta.name, |s| s.automatic = true);
    }
    store
}

/// Read a configuration document against `tree`.
///
/// Features the document does not mention start unselected, or automatically
/// selected when mandatory. Entries for features missing from the tree are
/// skipped.
pub fn parse_configuration(tree: &FeatureTree, text: &str) -> Result<SelectionStore, FormatError> {
    let document = parse_document(text)?;
    let mut entries = Vec::new();
    document.descendants_named("feature", &mut entries);

    let mut store = default_selection(tree);
    for entry in entries {
        let name = entry.attr("name").ok_or_else(|| FormatError::MissingName {
            tag: "feature".to_string(),
        })?;
        if !tree.contains(name) {
            tracing::warn!("Configuration references unknown feature {}, skipping", name);
            continue;
        }

        // `manual` is independent of the exclusion marker.
        let automatic = entry.attr("automatic");
        let excluded = automatic == Some(UNSELECTED);
        store.set(
            name,
            SelectionState {
                manual: entry.attr("manual") == Some(SELECTED),
                automatic: !excluded && automatic == Some(SELECTED),
                excluded,
            },
        );
    }
    Ok(store)
}

/// Write `store` as a configuration document, one element per feature in tree order.
pub fn serialize_configuration(
    tree: &FeatureTree,
    store: &SelectionStore,
) -> Result<String, FormatError> {
    let mut writer = Writer::new_with_indent(Vec::new(), b'\t', 1);
    writer.write_event(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), Some("no"))))?;
    writer.write_event(Event::Start(BytesStart::new("configuration")))?;

    for (_, meta) in tree.iter() {
        let state = store.get(&meta.name);
        let mut element = BytesStart::new("feature");
        element.push_attribute(("name", meta.name.as_str()));
        if state.excluded {
            element.push_attribute(("automatic", UNSELECTED));
        } else {
            if state.manual {
                element.push_attribute(("manual", SELECTED));
            }
            if state.automatic {
                element.push_attribute(("automatic", SELECTED));
            }
        }
        writer.write_event(Event::Empty(element))?;
    }

    writer.write_event(Event::End(BytesEnd::new("configuration")))?;
    let mut text = String::from_utf8(writer.into_inner())?;
    text.push('\n');
    Ok(text)
}

/// Names of the selected features in tree order, one per line.
pub fn feature_list(tree: &FeatureTree, store: &SelectionStore) -> String {
    tree.iter()
        .filter(|(_, meta)| store.is_selected(&meta.name))
        .map(|(_, meta)| format!("{}\n", meta.name))
        .collect()
}
