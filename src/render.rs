//! ASCII tree rendering of a configuration.

use crate::models::{FeatureId, FeatureKind, FeatureTree, SelectionState, SelectionStore};

const MANUAL: char = '●';
const AUTOMATIC: char = '◐';
const UNSELECTED: char = '◇';
const EXCLUDED: char = '✗';

/// Get the status symbol for a selection state.
fn state_symbol(state: SelectionState) -> char {
    if state.excluded {
        EXCLUDED
    } else if state.manual {
        MANUAL
    } else if state.automatic {
        AUTOMATIC
    } else {
        UNSELECTED
    }
}

fn label(tree: &FeatureTree, id: FeatureId) -> String {
    let meta = tree.get(id);
    let mut tags = Vec::new();
    if meta.has_children() && meta.kind != FeatureKind::Leaf {
        tags.push(meta.kind.as_str());
    }
    if meta.mandatory {
        tags.push("mandatory");
    }
    if meta.is_abstract {
        tags.push("abstract");
    }
    if tags.is_empty() {
        meta.name.clone()
    } else {
        format!("{} ({})", meta.name, tags.join(", "))
    }
}

/// Render the tree with one selection symbol per feature.
///
/// Example output:
/// ```text
/// ◐ ChatApp (and, mandatory)
/// ├── ◐ Main (mandatory)
/// ├── ◐ Encryption (alt)
/// │   ├── ● CeasarEncryption
/// │   └── ✗ RotateRightEncryption
/// └── ◇ Logging
/// ```
pub fn render_configuration(tree: &FeatureTree, store: &SelectionStore) -> String {
    let mut output = String::new();
    render_node(&mut output, tree, store, tree.root(), "", true, true);
    output
}

/// Recursively render a node and its children.
fn render_node(
    output: &mut String,
    tree: &FeatureTree,
    store: &SelectionStore,
    id: FeatureId,
    prefix: &str,
    is_last: bool,
    is_root: bool,
) {
    if !is_root {
        let branch = if is_last { "└── " } else { "├── " };
        output.push_str(prefix);
        output.push_str(branch);
    }
    output.push(state_symbol(store.get(tree.name(id))));
    output.push(' ');
    output.push_str(&label(tree, id));
    output.push('\n');

    let child_prefix = if is_root {
        String::new()
    } else {
        let continuation = if is_last { "    " } else { "│   " };
        format!("{}{}", prefix, continuation)
    };

    let children = tree.children(id);
    for (i, &child) in children.iter().enumerate() {
        let child_is_last = i == children.len() - 1;
        render_node(output, tree, store, child, &child_prefix, child_is_last, false);
    }
}
