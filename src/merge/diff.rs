//! Change report between a local ordering and a remote listing.

use serde::Serialize;
use std::collections::HashMap;
use std::hash::Hash;

/// What changed between a stored ordering and the latest remote listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ListDiff<T> {
    /// Elements the remote listing has and the local ordering lacks, in remote order.
    pub added: Vec<T>,
    /// Elements the local ordering has and the remote listing lacks, in local order.
    pub removed: Vec<T>,
    /// True when the remote listing orders the shared elements differently
    /// from the local ordering. A merge keeps the local order, so this is
    /// reordering noise that was suppressed rather than a change.
    pub reorder_suppressed: bool,
}

impl<T> ListDiff<T>
where
    T: Eq + Hash + Clone,
{
    /// Computes the diff between a local ordering and a remote listing.
    ///
    /// Repeated elements are counted, so one surplus copy on either side
    /// shows up as a single addition or removal.
    #[must_use]
    pub fn between(local: &[T], remote: &[T]) -> Self {
        let (shared_local, removed) = split_shared(local, remote);
        let (shared_remote, added) = split_shared(remote, local);

        Self {
            added,
            removed,
            reorder_suppressed: shared_local != shared_remote,
        }
    }
}

impl<T> ListDiff<T> {
    /// Returns true if membership changed.
    #[must_use]
    pub fn has_changes(&self) -> bool {
        !self.added.is_empty() || !self.removed.is_empty()
    }

    /// Returns the number of membership changes.
    #[must_use]
    pub fn change_count(&self) -> usize {
        self.added.len() + self.removed.len()
    }
}

/// Splits `items` into the elements also present in `other` and the rest,
/// both in the order of `items`.
fn split_shared<'a, T>(items: &'a [T], other: &[T]) -> (Vec<&'a T>, Vec<T>)
where
    T: Eq + Hash + Clone,
{
    let mut available: HashMap<&T, usize> = HashMap::with_capacity(other.len());
    for item in other {
        *available.entry(item).or_default() += 1;
    }

    let mut shared = Vec::with_capacity(items.len());
    let mut only = Vec::new();

    for item in items {
        match available.get_mut(item) {
            Some(count) if *count > 0 => {
                *count -= 1;
                shared.push(item);
            }
            _ => only.push(item.clone()),
        }
    }

    (shared, only)
}

impl<T> std::fmt::Display for ListDiff<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.has_changes() {
            write!(f, "+{} -{}", self.added.len(), self.removed.len())?;
        } else {
            write!(f, "no change")?;
        }
        if self.reorder_suppressed {
            write!(f, " (remote order ignored)")?;
        }
        Ok(())
    }
}
