use serde::{Deserialize, Serialize};

use super::feature::{FeatureKind, FeatureNode};
use crate::error::StructuralError;

/// A structural change to a feature model.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum ModelEdit {
    /// Append a new leaf under `parent`. A leaf parent becomes an AND group.
    AddChild {
        parent: String,
        name: String,
        #[serde(default)]
        mandatory: bool,
        #[serde(default, rename = "abstract")]
        is_abstract: bool,
    },
    /// Remove a feature and its subtree. A group left without children becomes a leaf.
    Remove { feature: String },
    /// Change the attributes of a feature.
    Update {
        feature: String,
        #[serde(default)]
        changes: FeatureUpdate,
    },
}

/// Attribute changes; `None` leaves the attribute as it is.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeatureUpdate {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default, rename = "type")]
    pub kind: Option<FeatureKind>,
    #[serde(default)]
    pub mandatory: Option<bool>,
    #[serde(default, rename = "abstract")]
    pub is_abstract: Option<bool>,
}

impl ModelEdit {
    /// The feature's name after the edit, if the edit renames `name`.
    pub fn renamed<'a>(&'a self, name: &str) -> Option<&'a str> {
        match self {
            Self::Update {
                feature,
                changes:
                    FeatureUpdate {
                        name: Some(new_name),
                        ..
                    },
            } if feature == name => Some(new_name.as_str()),
            _ => None,
        }
    }
}

impl FeatureNode {
    pub fn contains_name(&self, name: &str) -> bool {
        self.name == name || self.children.iter().any(|c| c.contains_name(name))
    }

    pub fn find(&self, name: &str) -> Option<&FeatureNode> {
        if self.name == name {
            return Some(self);
        }
        self.children.iter().find_map(|c| c.find(name))
    }

    pub fn find_mut(&mut self, name: &str) -> Option<&mut FeatureNode> {
        if self.name == name {
            return Some(self);
        }
        self.children.iter_mut().find_map(|c| c.find_mut(name))
    }

    /// Apply `edit` in place. On error the model is left unchanged.
    pub fn apply(&mut self, edit: &ModelEdit) -> Result<(), StructuralError> {
        match edit {
            ModelEdit::AddChild {
                parent,
                name,
                mandatory,
                is_abstract,
            } => {
                if name.trim().is_empty() {
                    return Err(StructuralError::MissingName {
                        parent: parent.clone(),
                    });
                }
                if self.contains_name(name) {
                    return Err(StructuralError::DuplicateFeature(name.clone()));
                }
                let node = self
                    .find_mut(parent)
                    .ok_or_else(|| StructuralError::UnknownFeature(parent.clone()))?;
                if node.kind == FeatureKind::Leaf && node.children.is_empty() {
                    node.kind = FeatureKind::And;
                }
                node.children.push(FeatureNode {
                    name: name.clone(),
                    kind: FeatureKind::Leaf,
                    mandatory: *mandatory,
                    is_abstract: *is_abstract,
                    children: Vec::new(),
                });
            }
            ModelEdit::Remove { feature } => {
                if self.name == *feature {
                    return Err(StructuralError::RootRemoval(feature.clone()));
                }
                if !self.remove_descendant(feature) {
                    return Err(StructuralError::UnknownFeature(feature.clone()));
                }
            }
            ModelEdit::Update { feature, changes } => {
                if let Some(new_name) = &changes.name {
                    if new_name.trim().is_empty() {
                        return Err(StructuralError::MissingName {
                            parent: feature.clone(),
                        });
                    }
                    if new_name != feature && self.contains_name(new_name) {
                        return Err(StructuralError::DuplicateFeature(new_name.clone()));
                    }
                }
                let node = self
                    .find_mut(feature)
                    .ok_or_else(|| StructuralError::UnknownFeature(feature.clone()))?;
                if changes.kind == Some(FeatureKind::Leaf) && !node.children.is_empty() {
                    return Err(StructuralError::LeafWithChildren(feature.clone()));
                }

                if let Some(new_name) = &changes.name {
                    node.name = new_name.clone();
                }
                if let Some(kind) = changes.kind {
                    node.kind = kind;
                }
                if let Some(mandatory) = changes.mandatory {
                    node.mandatory = mandatory;
                }
                if let Some(is_abstract) = changes.is_abstract {
                    node.is_abstract = is_abstract;
                }
            }
        }
        Ok(())
    }

    fn remove_descendant(&mut self, name: &str) -> bool {
        if let Some(index) = self.children.iter().position(|c| c.name == name) {
            self.children.remove(index);
            if self.children.is_empty() {
                self.kind = FeatureKind::Leaf;
            }
            return true;
        }
        self.children.iter_mut().any(|c| c.remove_descendant(name))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn model() -> FeatureNode {
        FeatureNode::and(
            "Chat",
            vec![
                FeatureNode::leaf("Core").mandatory(),
                FeatureNode::alt("Ui", vec![FeatureNode::leaf("Cli")]),
            ],
        )
    }

    fn add(parent: &str, name: &str) -> ModelEdit {
        ModelEdit::AddChild {
            parent: parent.to_string(),
            name: name.to_string(),
            mandatory: false,
            is_abstract: false,
        }
    }

    #[test]
    fn test_add_child_turns_leaf_into_and_group() {
        let mut root = model();
        root.apply(&add("Core", "Parser")).unwrap();

        let core = root.find("Core").unwrap();
        assert_eq!(core.kind, FeatureKind::And);
        assert!(core.mandatory);
        assert_eq!(core.children, vec![FeatureNode::leaf("Parser")]);
    }

    #[test]
    fn test_add_child_keeps_group_kind() {
        let mut root = model();
        root.apply(&add("Ui", "Gui")).unwrap();

        let ui = root.find("Ui").unwrap();
        assert_eq!(ui.kind, FeatureKind::Alt);
        assert_eq!(ui.children.len(), 2);
    }

    #[test]
    fn test_add_child_rejects_duplicate_name() {
        let mut root = model();
        let err = root.apply(&add("Ui", "Core")).unwrap_err();

        assert_eq!(err, StructuralError::DuplicateFeature("Core".to_string()));
        assert_eq!(root, model());
    }

    #[test]
    fn test_remove_last_child_turns_group_into_leaf() {
        let mut root = model();
        root.apply(&ModelEdit::Remove {
            feature: "Cli".to_string(),
        })
        .unwrap();

        let ui = root.find("Ui").unwrap();
        assert_eq!(ui.kind, FeatureKind::Leaf);
        assert!(!root.contains_name("Cli"));
    }

    #[test]
    fn test_remove_refuses_root() {
        let mut root = model();
        let err = root
            .apply(&ModelEdit::Remove {
                feature: "Chat".to_string(),
            })
            .unwrap_err();
        assert_eq!(err, StructuralError::RootRemoval("Chat".to_string()));
    }

    #[test]
    fn test_update_changes_attributes() {
        let mut root = model();
        let edit = ModelEdit::Update {
            feature: "Ui".to_string(),
            changes: FeatureUpdate {
                name: Some("Frontend".to_string()),
                kind: Some(FeatureKind::Or),
                mandatory: Some(true),
                is_abstract: None,
            },
        };
        root.apply(&edit).unwrap();

        let frontend = root.find("Frontend").unwrap();
        assert_eq!(frontend.kind, FeatureKind::Or);
        assert!(frontend.mandatory);
        assert!(!root.contains_name("Ui"));
        assert_eq!(edit.renamed("Ui"), Some("Frontend"));
    }

    #[test]
    fn test_update_refuses_leaf_kind_on_group_with_children() {
        let mut root = model();
        let err = root
            .apply(&ModelEdit::Update {
                feature: "Ui".to_string(),
                changes: FeatureUpdate {
                    kind: Some(FeatureKind::Leaf),
                    ..Default::default()
                },
            })
            .unwrap_err();
        assert_eq!(err, StructuralError::LeafWithChildren("Ui".to_string()));
    }

    #[test]
    fn test_edit_reads_from_json() {
        let edit: ModelEdit =
            serde_json::from_str(r#"{"op":"add_child","parent":"Ui","name":"Gui","abstract":true}"#)
                .unwrap();
        assert_eq!(
            edit,
            ModelEdit::AddChild {
                parent: "Ui".to_string(),
                name: "Gui".to_string(),
                mandatory: false,
                is_abstract: true,
            }
        );
    }
}
