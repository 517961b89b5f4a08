use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Selection flags of a single feature.
///
/// `excluded` dominates: an excluded feature is never selected, whatever its
/// `manual` and `automatic` flags say. Exclusion clears `automatic` but keeps
/// `manual`, so a user's choice inside an excluded branch comes back once the
/// exclusion is lifted.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SelectionState {
    /// Turned on by the user.
    #[serde(default)]
    pub manual: bool,
    /// Implied by propagation (ancestor of a selection, or a forced mandatory child).
    #[serde(default)]
    pub automatic: bool,
    /// Forced off by a sibling's alternative choice.
    #[serde(default)]
    pub excluded: bool,
}

impl SelectionState {
    pub const UNSELECTED: Self = Self {
        manual: false,
        automatic: false,
        excluded: false,
    };

    pub fn is_selected(&self) -> bool {
        (self.manual || self.automatic) && !self.excluded
    }

    fn is_default(&self) -> bool {
        *self == Self::UNSELECTED
    }
}

/// The evolving configuration: feature name to [`SelectionState`].
///
/// Features without an entry are fully unselected. Entries that become fully
/// unselected are dropped, so two stores compare equal exactly when every
/// feature has the same flags in both.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SelectionStore {
    states: BTreeMap<String, SelectionState>,
}

impl SelectionStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, name: &str) -> SelectionState {
        self.states.get(name).copied().unwrap_or_default()
    }

    pub fn set(&mut self, name: &str, state: SelectionState) {
        if state.is_default() {
            self.states.remove(name);
        } else {
            self.states.insert(name.to_string(), state);
        }
    }

    /// Apply `f` to the feature's flags in place.
    pub fn update(&mut self, name: &str, f: impl FnOnce(&mut SelectionState)) {
        let mut state = self.get(name);
        f(&mut state);
        self.set(name, state);
    }

    pub fn is_selected(&self, name: &str) -> bool {
        self.get(name).is_selected()
    }

    pub fn is_excluded(&self, name: &str) -> bool {
        self.get(name).excluded
    }

    /// Features with at least one flag set, in name order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, SelectionState)> {
        self.states.iter().map(|(name, state)| (name.as_str(), *state))
    }

    pub fn len(&self) -> usize {
        self.states.len()
    }

    pub fn is_empty(&self) -> bool {
        self.states.is_empty()
    }
}
