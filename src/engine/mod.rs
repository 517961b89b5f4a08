//! The configuration engine.
//!
//! A [`ConfigurationSession`] owns one feature tree and the selection being
//! edited against it. Every toggle runs the same cycle:
//!
//! 1. [`on_toggle`] applies the user's change and propagates it along the
//!    ancestor chain (or refuses it, leaving the selection untouched)
//! 2. [`enforce_group_constraints`] re-derives ALT exclusions and AND forcing
//! 3. [`validate`] and [`count_configurations`] are evaluated on demand by
//!    [`ConfigurationSession::current_state`]
//!
//! Sessions are independent of each other; a host can keep any number of them.

mod count;
mod propagation;
mod validate;

pub use count::{count_configurations, count_validated};
pub use propagation::{
    any_descendant_selected, cleanup_parent_ancestors, enforce_group_constraints, on_toggle,
    release_unneeded, select_ancestors,
};
pub use validate::{validate, ValidationResult, Violation};

use serde::{Deserialize, Serialize};

use crate::error::{CountError, Error, StructuralError};
use crate::format::{self, FormatError};
use crate::models::{FeatureNode, FeatureTree, ModelEdit, SelectionStore};
use crate::render;

/// Snapshot returned to callers after every operation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConfigurationState {
    pub selection: SelectionStore,
    pub validation: ValidationResult,
    /// Complete valid configurations reachable from `selection`; 0 while invalid.
    pub count: u128,
}

#[derive(Debug, Clone)]
pub struct ConfigurationSession {
    tree: FeatureTree,
    store: SelectionStore,
}

impl ConfigurationSession {
    /// Open a session on an existing selection.
    ///
    /// Every name in `initial` must exist in `tree`. Group constraints are
    /// enforced once so the session starts from a consistent state.
    pub fn load(tree: FeatureTree, initial: SelectionStore) -> Result<Self, StructuralError> {
        if let Some((unknown, _)) = initial.iter().find(|(name, _)| !tree.contains(name)) {
            return Err(StructuralError::UnknownFeature(unknown.to_string()));
        }
        let mut session = Self {
            tree,
            store: initial,
        };
        enforce_group_constraints(&session.tree, &mut session.store);
        tracing::debug!(
            features = session.tree.len(),
            root = session.tree.name(session.tree.root()),
            "Configuration session loaded"
        );
        Ok(session)
    }

    /// Open a fresh configuration with every mandatory feature pre-selected.
    pub fn fresh(tree: FeatureTree) -> Self {
        let store = format::default_selection(&tree);
        let mut session = Self { tree, store };
        enforce_group_constraints(&session.tree, &mut session.store);
        session
    }

    /// Open a session from a persisted configuration document.
    pub fn from_document(tree: FeatureTree, document: &str) -> Result<Self, Error> {
        let store = format::parse_configuration(&tree, document)?;
        Ok(Self::load(tree, store)?)
    }

    /// Select or deselect a feature.
    ///
    /// On any error the selection is restored to its exact pre-toggle state.
    pub fn toggle(&mut self, feature: &str, want_selected: bool) -> Result<(), Error> {
        let snapshot = self.store.clone();
        match on_toggle(&self.tree, &mut self.store, feature, want_selected) {
            Ok(()) => {
                enforce_group_constraints(&self.tree, &mut self.store);
                tracing::debug!(feature, selected = want_selected, "Toggle applied");
                Ok(())
            }
            Err(e) => {
                self.store = snapshot;
                tracing::warn!(feature, selected = want_selected, "Toggle refused: {}", e);
                Err(e)
            }
        }
    }

    /// Change the model under the session.
    ///
    /// The tree is rebuilt from the edited model. Selection flags follow their
    /// feature through a rename and are dropped for removed features. Ancestors
    /// kept only for a removed feature are released, then group constraints are
    /// enforced again. On error nothing changes.
    pub fn edit_model(&mut self, edit: &ModelEdit) -> Result<(), Error> {
        let mut root = self.tree.to_node();
        root.apply(edit)?;
        let tree = FeatureTree::build(&root)?;

        let mut store = SelectionStore::new();
        for (name, state) in self.store.iter() {
            let name = edit.renamed(name).unwrap_or(name);
            if tree.contains(name) {
                store.set(name, state);
            }
        }
        if let ModelEdit::Remove { feature } = edit {
            let parent = self
                .tree
                .lookup(feature)
                .ok()
                .and_then(|id| self.tree.parent(id))
                .and_then(|id| tree.id(self.tree.name(id)));
            if let Some(parent) = parent {
                release_unneeded(&tree, &mut store, parent);
            }
        }
        enforce_group_constraints(&tree, &mut store);

        tracing::info!(
            features = tree.len(),
            "Feature model edited: {:?}",
            edit
        );
        self.tree = tree;
        self.store = store;
        Ok(())
    }

    /// The current model, rebuilt in nested form.
    pub fn model(&self) -> FeatureNode {
        self.tree.to_node()
    }

    pub fn validate(&self) -> ValidationResult {
        validate(&self.tree, &self.store)
    }

    pub fn count(&self) -> Result<u128, CountError> {
        count_configurations(&self.tree, &self.store)
    }

    pub fn current_state(&self) -> Result<ConfigurationState, CountError> {
        let validation = self.validate();
        let count = count_validated(&self.tree, &self.store, &validation)?;
        Ok(ConfigurationState {
            selection: self.store.clone(),
            validation,
            count,
        })
    }

    /// The selection in persisted configuration form.
    pub fn export_selection(&self) -> Result<String, FormatError> {
        format::serialize_configuration(&self.tree, &self.store)
    }

    /// Selected feature names, one per line, for the composition backend.
    pub fn export_feature_list(&self) -> String {
        format::feature_list(&self.tree, &self.store)
    }

    pub fn render(&self) -> String {
        render::render_configuration(&self.tree, &self.store)
    }

    pub fn tree(&self) -> &FeatureTree {
        &self.tree
    }

    pub fn selection(&self) -> &SelectionStore {
        &self.store
    }
}
