//! Selection propagation and group-constraint enforcement.

use crate::error::{Error, ToggleRejection};
use crate::models::{FeatureId, FeatureKind, FeatureTree, SelectionStore};

fn selected(tree: &FeatureTree, store: &SelectionStore, id: FeatureId) -> bool {
    store.is_selected(tree.name(id))
}

/// Apply a user toggle to `store`.
///
/// Guards run before anything is mutated, so a rejected toggle leaves the store
/// untouched. Group constraints are not re-derived here, callers follow up with
/// [`enforce_group_constraints`].
pub fn on_toggle(
    tree: &FeatureTree,
    store: &mut SelectionStore,
    name: &str,
    want_selected: bool,
) -> Result<(), Error> {
    let id = tree.lookup(name)?;
    if store.is_excluded(name) {
        return Err(ToggleRejection::Excluded(name.to_string()).into());
    }

    if want_selected {
        store.update(name, |s| {
            s.manual = true;
            s.excluded = false;
        });
        select_ancestors(tree, store, id);
        return Ok(());
    }

    let release_parent = check_deselect(tree, store, id)?;
    if let Some(parent) = release_parent {
        store.update(tree.name(parent), |s| s.automatic = false);
    }
    store.update(name, |s| s.manual = false);
    cleanup_parent_ancestors(tree, store, id);
    Ok(())
}

/// Refuse deselections the groups forbid.
///
/// Returns the parent whose `automatic` flag must be released when the feature
/// is the last selected child of an optional OR group.
fn check_deselect(
    tree: &FeatureTree,
    store: &SelectionStore,
    id: FeatureId,
) -> Result<Option<FeatureId>, ToggleRejection> {
    let Some(parent) = tree.parent(id) else {
        return Ok(None);
    };
    if !selected(tree, store, parent) {
        return Ok(None);
    }

    let meta = tree.get(id);
    let parent_meta = tree.get(parent);
    match parent_meta.kind {
        FeatureKind::And if meta.mandatory => Err(ToggleRejection::MandatoryAndChild {
            feature: meta.name.clone(),
            parent: parent_meta.name.clone(),
        }),
        FeatureKind::Or => {
            let selected_siblings = parent_meta
                .children
                .iter()
                .filter(|&&c| selected(tree, store, c))
                .count();
            if selected_siblings != 1 || !selected(tree, store, id) {
                return Ok(None);
            }
            if parent_meta.mandatory {
                Err(ToggleRejection::LastOrChild {
                    feature: meta.name.clone(),
                    parent: parent_meta.name.clone(),
                })
            } else {
                Ok(Some(parent))
            }
        }
        _ => Ok(None),
    }
}

/// Mark every ancestor of `id` as automatically selected.
pub fn select_ancestors(tree: &FeatureTree, store: &mut SelectionStore, id: FeatureId) {
    for ancestor in tree.ancestors(id) {
        store.update(tree.name(ancestor), |s| {
            s.automatic = true;
            s.excluded = false;
        });
    }
}

/// Release ancestors of `id` that no longer have a selected descendant.
///
/// Stops at the first mandatory ancestor and at the first ancestor that is still
/// needed; anything above it is needed too.
pub fn cleanup_parent_ancestors(tree: &FeatureTree, store: &mut SelectionStore, id: FeatureId) {
    for ancestor in tree.ancestors(id) {
        if tree.get(ancestor).mandatory || any_descendant_selected(tree, store, ancestor) {
            break;
        }
        store.update(tree.name(ancestor), |s| s.automatic = false);
    }
}

/// Release `id` and then its ancestors when nothing below them is selected any more.
///
/// A feature the user selected keeps its `manual` flag; only `automatic` is cleared.
pub fn release_unneeded(tree: &FeatureTree, store: &mut SelectionStore, id: FeatureId) {
    if tree.get(id).mandatory || any_descendant_selected(tree, store, id) {
        return;
    }
    store.update(tree.name(id), |s| s.automatic = false);
    cleanup_parent_ancestors(tree, store, id);
}

pub fn any_descendant_selected(tree: &FeatureTree, store: &SelectionStore, id: FeatureId) -> bool {
    tree.descendants(id).any(|d| selected(tree, store, d))
}

/// Re-derive ALT exclusions and AND mandatory forcing over the whole tree.
///
/// Runs top-down passes until the store stops changing. A pass can lift an
/// exclusion and thereby revive a remembered manual choice, which the next pass
/// then has to honor.
pub fn enforce_group_constraints(tree: &FeatureTree, store: &mut SelectionStore) {
    for pass in 0..=tree.len() {
        let before = store.clone();
        enforce_pass(tree, store);
        if *store == before {
            tracing::debug!(passes = pass + 1, "Group constraints settled");
            return;
        }
    }
    tracing::warn!("Group constraints did not settle after {} passes", tree.len() + 1);
}

fn enforce_pass(tree: &FeatureTree, store: &mut SelectionStore) {
    for (id, meta) in tree.iter() {
        if !meta.has_children() || store.is_excluded(&meta.name) {
            continue;
        }
        match meta.kind {
            FeatureKind::Alt => enforce_alternative(tree, store, id),
            FeatureKind::And if selected(tree, store, id) => {
                for &child in &meta.children {
                    if tree.get(child).mandatory {
                        store.update(tree.name(child), |s| {
                            s.automatic = true;
                            s.excluded = false;
                        });
                    }
                }
            }
            // OR groups are never auto-corrected; the validator reports them.
            _ => {}
        }
    }
}

fn enforce_alternative(tree: &FeatureTree, store: &mut SelectionStore, id: FeatureId) {
    let children = tree.children(id);
    let first_selected =
        |store: &SelectionStore| children.iter().copied().find(|&c| selected(tree, store, c));

    let chosen = match first_selected(&*store) {
        Some(chosen) => Some(chosen),
        None => {
            for &child in children {
                set_subtree_excluded(tree, store, child, false);
            }
            first_selected(&*store)
        }
    };

    if let Some(chosen) = chosen {
        for &child in children.iter().filter(|&&c| c != chosen) {
            set_subtree_excluded(tree, store, child, true);
        }
    }
}

fn set_subtree_excluded(tree: &FeatureTree, store: &mut SelectionStore, id: FeatureId, excluded: bool) {
    for node in tree.subtree(id) {
        store.update(tree.name(node), |s| {
            s.excluded = excluded;
            if excluded {
                s.automatic = false;
            }
        });
    }
}
