use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use super::feature::{FeatureKind, FeatureNode};
use crate::error::StructuralError;

/// Stable index of a feature inside a [`FeatureTree`].
///
/// Ids are assigned in pre-order, so the root is always `FeatureId(0)` and the
/// subtree of any feature occupies a contiguous id range.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct FeatureId(usize);

impl FeatureId {
    pub fn index(self) -> usize {
        self.0
    }
}

/// Flattened, read-only view of one feature.
#[derive(Debug, Clone, Serialize)]
pub struct FeatureMetadata {
    pub name: String,
    pub kind: FeatureKind,
    pub mandatory: bool,
    pub is_abstract: bool,
    /// Depth in the tree, root = 0.
    pub level: usize,
    pub parent: Option<FeatureId>,
    pub children: Vec<FeatureId>,
    /// One past the last id of this feature's subtree.
    subtree_end: usize,
}

impl FeatureMetadata {
    pub fn has_children(&self) -> bool {
        !self.children.is_empty()
    }
}

/// The feature model as an arena plus a name index.
///
/// Built once per model version. Parent links are plain ids, never owning
/// references; names are unique across the whole tree.
#[derive(Debug, Clone)]
pub struct FeatureTree {
    features: Vec<FeatureMetadata>,
    index: HashMap<String, FeatureId>,
}

impl FeatureTree {
    pub fn build(root: &FeatureNode) -> Result<Self, StructuralError> {
        let mut tree = Self {
            features: Vec::new(),
            index: HashMap::new(),
        };
        tree.push(root, None, 0)?;
        Ok(tree)
    }

    fn push(
        &mut self,
        node: &FeatureNode,
        parent: Option<FeatureId>,
        level: usize,
    ) -> Result<FeatureId, StructuralError> {
        if node.name.trim().is_empty() {
            let parent = parent
                .map(|p| self.features[p.0].name.clone())
                .unwrap_or_else(|| "<root>".to_string());
            return Err(StructuralError::MissingName { parent });
        }
        let id = FeatureId(self.features.len());
        if self.index.insert(node.name.clone(), id).is_some() {
            return Err(StructuralError::DuplicateFeature(node.name.clone()));
        }

        self.features.push(FeatureMetadata {
            name: node.name.clone(),
            kind: node.kind,
            mandatory: node.mandatory,
            is_abstract: node.is_abstract,
            level,
            parent,
            children: Vec::with_capacity(node.children.len()),
            subtree_end: id.0 + 1,
        });

        for child in &node.children {
            let child_id = self.push(child, Some(id), level + 1)?;
            self.features[id.0].children.push(child_id);
        }
        self.features[id.0].subtree_end = self.features.len();
        Ok(id)
    }

    pub fn root(&self) -> FeatureId {
        FeatureId(0)
    }

    pub fn len(&self) -> usize {
        self.features.len()
    }

    pub fn is_empty(&self) -> bool {
        self.features.is_empty()
    }

    pub fn get(&self, id: FeatureId) -> &FeatureMetadata {
        &self.features[id.0]
    }

    pub fn name(&self, id: FeatureId) -> &str {
        &self.features[id.0].name
    }

    pub fn id(&self, name: &str) -> Option<FeatureId> {
        self.index.get(name).copied()
    }

    /// Resolve a name, failing with [`StructuralError::UnknownFeature`].
    pub fn lookup(&self, name: &str) -> Result<FeatureId, StructuralError> {
        self.id(name)
            .ok_or_else(|| StructuralError::UnknownFeature(name.to_string()))
    }

    pub fn contains(&self, name: &str) -> bool {
        self.index.contains_key(name)
    }

    pub fn parent(&self, id: FeatureId) -> Option<FeatureId> {
        self.features[id.0].parent
    }

    pub fn children(&self, id: FeatureId) -> &[FeatureId] {
        &self.features[id.0].children
    }

    /// All ids in pre-order.
    pub fn ids(&self) -> impl Iterator<Item = FeatureId> {
        (0..self.features.len()).map(FeatureId)
    }

    pub fn iter(&self) -> impl Iterator<Item = (FeatureId, &FeatureMetadata)> {
        self.features
            .iter()
            .enumerate()
            .map(|(i, meta)| (FeatureId(i), meta))
    }

    /// The feature itself followed by all of its descendants, in pre-order.
    pub fn subtree(&self, id: FeatureId) -> impl Iterator<Item = FeatureId> {
        (id.0..self.features[id.0].subtree_end).map(FeatureId)
    }

    /// Descendants only, in pre-order.
    pub fn descendants(&self, id: FeatureId) -> impl Iterator<Item = FeatureId> {
        (id.0 + 1..self.features[id.0].subtree_end).map(FeatureId)
    }

    /// Parent, grandparent, ... up to the root.
    pub fn ancestors(&self, id: FeatureId) -> Ancestors<'_> {
        Ancestors {
            tree: self,
            next: self.parent(id),
        }
    }

    /// Rebuild the nested form, e.g. for writing the model back out.
    pub fn to_node(&self) -> FeatureNode {
        self.node_at(self.root())
    }

    fn node_at(&self, id: FeatureId) -> FeatureNode {
        let meta = self.get(id);
        FeatureNode {
            name: meta.name.clone(),
            kind: meta.kind,
            mandatory: meta.mandatory,
            is_abstract: meta.is_abstract,
            children: meta.children.iter().map(|&c| self.node_at(c)).collect(),
        }
    }
}

pub struct Ancestors<'a> {
    tree: &'a FeatureTree,
    next: Option<FeatureId>,
}

impl Iterator for Ancestors<'_> {
    type Item = FeatureId;

    fn next(&mut self) -> Option<Self::Item> {
        let current = self.next?;
        self.next = self.tree.parent(current);
        Some(current)
    }
}
