//! Group-constraint validation of a (partial) configuration.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::models::{FeatureKind, FeatureTree, SelectionStore};

/// A group constraint the current selection does not satisfy yet.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "rule", rename_all = "snake_case")]
pub enum Violation {
    /// An active ALT group without exactly one selected child.
    Alternative { group: String, selected: usize },
    /// A selected OR group without any selected child.
    Or { group: String },
    /// A mandatory child of a selected AND group is not selected.
    MandatoryMissing { group: String, feature: String },
}

impl fmt::Display for Violation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Alternative { group, selected: 0 } => {
                write!(f, "{group} (ALT group): exactly one child must be selected")
            }
            Self::Alternative { group, selected } => write!(
                f,
                "{group} (ALT group): only one child can be selected, but {selected} are selected"
            ),
            Self::Or { group } => write!(
                f,
                "{group} (OR group): at least one child must be selected when the group is selected"
            ),
            Self::MandatoryMissing { group, feature } => write!(
                f,
                "{feature} is mandatory but not selected (parent {group} is selected)"
            ),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationResult {
    pub valid: bool,
    pub violations: Vec<Violation>,
}

impl ValidationResult {
    fn from_violations(violations: Vec<Violation>) -> Self {
        Self {
            valid: violations.is_empty(),
            violations,
        }
    }
}

/// Check every group of the tree against the store.
///
/// Features inside an excluded branch are not part of the configuration and are
/// skipped. Nothing is corrected here.
pub fn validate(tree: &FeatureTree, store: &SelectionStore) -> ValidationResult {
    let mut violations = Vec::new();

    for (_, meta) in tree.iter() {
        if !meta.has_children() || store.is_excluded(&meta.name) {
            continue;
        }
        let is_selected = store.is_selected(&meta.name);
        let selected_children = || {
            meta.children
                .iter()
                .filter(|&&c| store.is_selected(tree.name(c)))
                .count()
        };

        match meta.kind {
            FeatureKind::Alt if is_selected || meta.mandatory => {
                let selected = selected_children();
                if selected != 1 {
                    violations.push(Violation::Alternative {
                        group: meta.name.clone(),
                        selected,
                    });
                }
            }
            FeatureKind::Or if is_selected => {
                if selected_children() == 0 {
                    violations.push(Violation::Or {
                        group: meta.name.clone(),
                    });
                }
            }
            FeatureKind::And if is_selected => {
                for &child in &meta.children {
                    let child_meta = tree.get(child);
                    if child_meta.mandatory && !store.is_selected(&child_meta.name) {
                        violations.push(Violation::MandatoryMissing {
                            group: meta.name.clone(),
                            feature: child_meta.name.clone(),
                        });
                    }
                }
            }
            _ => {}
        }
    }

    if !violations.is_empty() {
        tracing::debug!(count = violations.len(), "Configuration has violations");
    }
    ValidationResult::from_violations(violations)
}
