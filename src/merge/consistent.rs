//! Order-stable merge of a local ordering with a remote listing.
//!
//! The remote listing decides membership; the local ordering decides the
//! relative order of everything it already knows about. Elements the local
//! side has never seen are appended in remote order.

use std::collections::{HashMap, VecDeque};
use std::hash::Hash;

/// Merges `remote` into the order of `local`.
///
/// The result holds exactly the elements of `remote`. Elements that also
/// occur in `local` come first, ordered by their first unclaimed position
/// in `local`; the rest follow in the order `remote` lists them.
///
/// Each remote occurrence claims its own local occurrence, lowest index
/// first, so repeated elements are never collapsed. A remote element with
/// more copies than `local` holds has its surplus copies appended as new.
///
/// ```
/// use listsync::merge;
///
/// let local = ["a", "b", "c"];
/// let remote = ["c", "a", "d"];
/// assert_eq!(merge(&local, &remote), vec!["a", "c", "d"]);
/// ```
#[must_use]
pub fn merge<T>(local: &[T], remote: &[T]) -> Vec<T>
where
    T: Eq + Hash + Clone,
{
    merge_by(local, remote, |item| item)
}

/// Merges `remote` into the order of `local`, comparing elements by `key`.
///
/// Behaves like [`merge`] for element types whose identity is a single
/// field (an ID or primary key) rather than the whole value. The returned
/// elements are always taken from `remote`.
#[must_use]
pub fn merge_by<'a, T, K, F>(local: &'a [T], remote: &'a [T], key: F) -> Vec<T>
where
    T: Clone,
    K: Eq + Hash,
    F: Fn(&'a T) -> K,
{
    let mut positions: HashMap<K, VecDeque<usize>> = HashMap::with_capacity(local.len());
    for (index, item) in local.iter().enumerate() {
        positions.entry(key(item)).or_default().push_back(index);
    }

    let mut known: Vec<(usize, &T)> = Vec::with_capacity(remote.len());
    let mut added: Vec<&T> = Vec::new();

    for item in remote {
        match positions.get_mut(&key(item)).and_then(VecDeque::pop_front) {
            Some(index) => known.push((index, item)),
            None => added.push(item),
        }
    }

    // claimed indices are unique
    known.sort_unstable_by_key(|(index, _)| *index);

    known
        .into_iter()
        .map(|(_, item)| item)
        .chain(added)
        .cloned()
        .collect()
}
