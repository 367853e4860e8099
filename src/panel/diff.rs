use std::collections::HashSet;
use std::hash::Hash;

/// Ids to drop and ids to create when moving from one list to another
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IdDiff<T> {
    pub added: Vec<T>,
    pub removed: Vec<T>,
}

impl<T> IdDiff<T> {
    pub fn is_empty(&self) -> bool {
        self.added.is_empty() && self.removed.is_empty()
    }
}

/// `removed` = old \ new, `added` = new \ old, each in input order
pub fn diff_ids<T: Copy + Eq + Hash>(old: &[T], new: &[T]) -> IdDiff<T> {
    let old_set: HashSet<T> = old.iter().copied().collect();
    let new_set: HashSet<T> = new.iter().copied().collect();

    IdDiff {
        added: new.iter().copied().filter(|id| !old_set.contains(id)).collect(),
        removed: old.iter().copied().filter(|id| !new_set.contains(id)).collect(),
    }
}
