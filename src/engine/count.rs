//! Exact counting of the complete configurations reachable from a partial one.
//!
//! `count(node)` is the number of ways to complete the subtree below `node`
//! given that `node` itself is present. Whether the node is present at all is
//! decided by its parent: optional children contribute a `1 + count` factor
//! (absent, or one of the present completions).

use crate::error::CountError;
use crate::models::{FeatureId, FeatureKind, FeatureTree, SelectionStore};

use super::validate::{validate, ValidationResult};

/// Number of valid complete configurations consistent with `store`.
///
/// An invalid partial configuration has no valid completion and counts as 0.
pub fn count_configurations(tree: &FeatureTree, store: &SelectionStore) -> Result<u128, CountError> {
    count_validated(tree, store, &validate(tree, store))
}

/// Same as [`count_configurations`] with a validation result already at hand.
pub fn count_validated(
    tree: &FeatureTree,
    store: &SelectionStore,
    validation: &ValidationResult,
) -> Result<u128, CountError> {
    if !validation.valid {
        return Ok(0);
    }
    Counter { tree, store }.count(tree.root(), false)
}

struct Counter<'a> {
    tree: &'a FeatureTree,
    store: &'a SelectionStore,
}

impl Counter<'_> {
    fn selected(&self, id: FeatureId) -> bool {
        self.store.is_selected(self.tree.name(id))
    }

    fn excluded(&self, id: FeatureId) -> bool {
        self.store.is_excluded(self.tree.name(id))
    }

    /// `assume_selected` evaluates the node as if it had just been chosen,
    /// without touching the store.
    fn count(&self, id: FeatureId, assume_selected: bool) -> Result<u128, CountError> {
        let meta = self.tree.get(id);
        if !assume_selected && self.excluded(id) {
            return Ok(0);
        }
        if !meta.has_children() {
            return Ok(1);
        }
        let is_active = assume_selected || self.selected(id) || meta.mandatory;
        let open_children = move || meta.children.iter().copied().filter(move |&c| !self.excluded(c));

        match meta.kind {
            FeatureKind::Alt => {
                if let Some(chosen) = meta.children.iter().copied().find(|&c| self.selected(c)) {
                    return self.count(chosen, false);
                }
                let mut total: u128 = 0;
                for child in open_children() {
                    total = self.add(id, total, self.count(child, true)?)?;
                }
                Ok(total)
            }
            FeatureKind::Or if is_active => {
                let mut product: u128 = 1;
                let mut undecided = false;
                for child in open_children() {
                    let factor = if self.selected(child) {
                        self.count(child, false)?
                    } else {
                        undecided = true;
                        self.add(id, 1, self.count(child, false)?)?
                    };
                    product = self.mul(id, product, factor)?;
                }
                // Drop the completion where every undecided child stays absent.
                Ok(if undecided { product.saturating_sub(1) } else { product })
            }
            FeatureKind::Or => {
                let mut product: u128 = 1;
                for child in open_children() {
                    let factor = self.add(id, 1, self.count(child, false)?)?;
                    product = self.mul(id, product, factor)?;
                }
                Ok(product.saturating_sub(1))
            }
            // AND groups use the same product whether or not they are active;
            // the parent folds in the group's own presence.
            FeatureKind::And | FeatureKind::Leaf => {
                let mut product: u128 = 1;
                for child in open_children() {
                    let child_count = self.count(child, false)?;
                    let factor = if self.tree.get(child).mandatory || self.selected(child) {
                        child_count
                    } else {
                        self.add(id, 1, child_count)?
                    };
                    product = self.mul(id, product, factor)?;
                }
                Ok(product)
            }
        }
    }

    fn add(&self, id: FeatureId, a: u128, b: u128) -> Result<u128, CountError> {
        a.checked_add(b).ok_or_else(|| self.overflow(id))
    }

    fn mul(&self, id: FeatureId, a: u128, b: u128) -> Result<u128, CountError> {
        a.checked_mul(b).ok_or_else(|| self.overflow(id))
    }

    fn overflow(&self, id: FeatureId) -> CountError {
        CountError::Overflow {
            feature: self.tree.name(id).to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::FeatureNode;

    fn leaves(prefix: &str, n: usize) -> Vec<FeatureNode> {
        (0..n).map(|i| FeatureNode::leaf(format!("{prefix}{i}"))).collect()
    }

    fn count_fresh(root: FeatureNode) -> u128 {
        let tree = FeatureTree::build(&root).unwrap();
        count_configurations(&tree, &SelectionStore::new()).unwrap()
    }

    #[test]
    fn test_single_leaf() {
        assert_eq!(count_fresh(FeatureNode::leaf("Only")), 1);
    }

    #[test]
    fn test_optional_and_children_double() {
        // Each optional leaf is present or absent.
        assert_eq!(count_fresh(FeatureNode::and("R", leaves("L", 3))), 8);
    }

    #[test]
    fn test_or_group_excludes_empty_choice() {
        assert_eq!(count_fresh(FeatureNode::or("R", leaves("L", 3))), 7);
    }

    #[test]
    fn test_alt_group_sums_branches() {
        let root = FeatureNode::alt(
            "R",
            vec![
                FeatureNode::leaf("A"),
                FeatureNode::and("B", leaves("B", 2)),
            ],
        );
        // A alone, or B with any subset of its two optional leaves.
        assert_eq!(count_fresh(root), 1 + 4);
    }

    #[test]
    fn test_nested_optional_or_group() {
        let root = FeatureNode::and("R", vec![FeatureNode::or("G", leaves("L", 2))]);
        // G absent, or one of the three non-empty subsets.
        assert_eq!(count_fresh(root), 1 + 3);
    }

    #[test]
    fn test_excluded_branch_contributes_nothing() {
        let tree = FeatureTree::build(&FeatureNode::alt("R", leaves("L", 3))).unwrap();
        let mut store = SelectionStore::new();
        store.update("R", |s| s.automatic = true);
        store.update("L0", |s| s.manual = true);
        store.update("L1", |s| s.excluded = true);
        store.update("L2", |s| s.excluded = true);
        assert_eq!(count_configurations(&tree, &store).unwrap(), 1);
    }

    #[test]
    fn test_invalid_configuration_counts_zero() {
        let tree = FeatureTree::build(&FeatureNode::or("R", leaves("L", 2))).unwrap();
        let mut store = SelectionStore::new();
        store.update("R", |s| s.manual = true);
        assert_eq!(count_configurations(&tree, &store).unwrap(), 0);
    }

    #[test]
    fn test_overflow_is_reported() {
        // 2^130 completions do not fit in 128 bits.
        let tree = FeatureTree::build(&FeatureNode::and("R", leaves("L", 130))).unwrap();
        let err = count_configurations(&tree, &SelectionStore::new()).unwrap_err();
        assert_eq!(
            err,
            CountError::Overflow {
                feature: "R".to_string()
            }
        );
    }
}
