//! Generic keyed set comparison.
//!
//! [`diff_by`] knows nothing about topology: callers supply the key function
//! and the equality predicate. Key normalization (e.g. lower-casing for
//! case-insensitive identities) is the key function's job.
//!
//! Output order is part of the contract: Removed/Changed entries in left key
//! order, then Added entries in right key order.

use std::collections::HashMap;
use std::fmt;
use std::hash::Hash;

use rmqt_schemas::Titled;

/// Classification of one difference.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum DiffKind {
    Added,
    Removed,
    Changed,
}

impl DiffKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            DiffKind::Added => "Added",
            DiffKind::Removed => "Removed",
            DiffKind::Changed => "Changed",
        }
    }
}

impl fmt::Display for DiffKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One difference. `left` is `None` for Added, `right` is `None` for Removed,
/// both are set for Changed.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DiffItem<T> {
    pub kind: DiffKind,
    pub left: Option<T>,
    pub right: Option<T>,
}

impl<T> DiffItem<T> {
    pub fn added(right: T) -> Self {
        Self {
            kind: DiffKind::Added,
            left: None,
            right: Some(right),
        }
    }

    pub fn removed(left: T) -> Self {
        Self {
            kind: DiffKind::Removed,
            left: Some(left),
            right: None,
        }
    }

    pub fn changed(left: T, right: T) -> Self {
        Self {
            kind: DiffKind::Changed,
            left: Some(left),
            right: Some(right),
        }
    }
}

impl<T: Titled> DiffItem<T> {
    /// Title of whichever side is present (left wins for Changed).
    pub fn title(&self) -> String {
        self.left
            .as_ref()
            .or(self.right.as_ref())
            .map(Titled::title)
            .unwrap_or_default()
    }
}

/// Ordered, append-only list of differences.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DiffList<T> {
    items: Vec<DiffItem<T>>,
}

impl<T> Default for DiffList<T> {
    fn default() -> Self {
        Self { items: Vec::new() }
    }
}

impl<T> DiffList<T> {
    pub fn new() -> Self {
        Self::default()
    }

    fn push(&mut self, item: DiffItem<T>) {
        self.items.push(item);
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, DiffItem<T>> {
        self.items.iter()
    }

    pub fn as_slice(&self) -> &[DiffItem<T>] {
        &self.items
    }

    pub fn count(&self, kind: DiffKind) -> usize {
        self.items.iter().filter(|i| i.kind == kind).count()
    }
}

impl<T> IntoIterator for DiffList<T> {
    type Item = DiffItem<T>;
    type IntoIter = std::vec::IntoIter<DiffItem<T>>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.into_iter()
    }
}

impl<'a, T> IntoIterator for &'a DiffList<T> {
    type Item = &'a DiffItem<T>;
    type IntoIter = std::slice::Iter<'a, DiffItem<T>>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.iter()
    }
}

/// Insertion-ordered key index where the first occurrence of a key wins.
/// Later duplicates are dropped, not merged.
struct FirstWins<K, T> {
    entries: Vec<(K, Option<T>)>,
    positions: HashMap<K, usize>,
}

impl<K: Eq + Hash + Clone, T> FirstWins<K, T> {
    fn build<I, F>(items: I, key: &F) -> Self
    where
        I: IntoIterator<Item = T>,
        F: Fn(&T) -> K,
    {
        let mut entries = Vec::new();
        let mut positions = HashMap::new();
        for item in items {
            let k = key(&item);
            if positions.contains_key(&k) {
                continue;
            }
            positions.insert(k.clone(), entries.len());
            entries.push((k, Some(item)));
        }
        Self { entries, positions }
    }

    /// Remove and return the value for `k`, leaving the slot marked as seen.
    fn take(&mut self, k: &K) -> Option<Option<T>> {
        let pos = *self.positions.get(k)?;
        Some(self.entries[pos].1.take())
    }
}

/// Describe how to turn `left` into `right`.
///
/// 1. Both sides are indexed by `key`; on a repeated key the first
///    occurrence wins.
/// 2. For each left key in order: absent on the right => Removed; present but
///    `!equal(left, right)` => Changed; present and equal => nothing.
/// 3. Right keys never seen in step 2, in right order => Added.
pub fn diff_by<T, K, L, R, FK, FE>(left: L, right: R, key: FK, equal: FE) -> DiffList<T>
where
    K: Eq + Hash + Clone,
    L: IntoIterator<Item = T>,
    R: IntoIterator<Item = T>,
    FK: Fn(&T) -> K,
    FE: Fn(&T, &T) -> bool,
{
    let left = FirstWins::build(left, &key);
    let mut right = FirstWins::build(right, &key);

    let mut out = DiffList::new();
    for (k, l) in left.entries {
        let Some(l) = l else { continue };
        match right.take(&k) {
            None => out.push(DiffItem::removed(l)),
            // Index entries are only emptied by `take`, and each left key is unique.
            Some(None) => out.push(DiffItem::removed(l)),
            Some(Some(r)) => {
                if !equal(&l, &r) {
                    out.push(DiffItem::changed(l, r));
                }
            }
        }
    }

    for r in right.entries.into_iter().filter_map(|(_, r)| r) {
        out.push(DiffItem::added(r));
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Clone, Debug, PartialEq, Eq)]
    struct Kv {
        k: &'static str,
        v: i32,
    }

    fn kv(k: &'static str, v: i32) -> Kv {
        Kv { k, v }
    }

    fn run(left: Vec<Kv>, right: Vec<Kv>) -> DiffList<Kv> {
        diff_by(left, right, |x| x.k, |a, b| a.v == b.v)
    }

    #[test]
    fn identical_inputs_produce_nothing() {
        let side = vec![kv("a", 1), kv("b", 2)];
        assert!(run(side.clone(), side).is_empty());
    }

    #[test]
    fn duplicate_key_first_occurrence_wins() {
        let d = run(vec![kv("a", 1), kv("a", 2)], vec![kv("a", 1)]);
        assert!(d.is_empty(), "first occurrence v=1 matches: {d:?}");

        let d = run(vec![kv("a", 2), kv("a", 1)], vec![kv("a", 1)]);
        assert_eq!(d.as_slice(), &[DiffItem::changed(kv("a", 2), kv("a", 1))]);
    }

    #[test]
    fn duplicate_on_the_right_is_not_reported_as_added() {
        let d = run(vec![kv("a", 1)], vec![kv("a", 1), kv("a", 9)]);
        assert!(d.is_empty(), "{d:?}");
    }

    #[test]
    fn order_is_left_order_then_added_in_right_order() {
        let left = vec![kv("c", 1), kv("a", 1), kv("b", 1)];
        let right = vec![kv("z", 1), kv("b", 2), kv("y", 1), kv("c", 1)];

        let d = run(left, right);
        assert_eq!(
            d.as_slice(),
            &[
                DiffItem::removed(kv("a", 1)),
                DiffItem::changed(kv("b", 1), kv("b", 2)),
                DiffItem::added(kv("z", 1)),
                DiffItem::added(kv("y", 1)),
            ]
        );
        assert_eq!(d.count(DiffKind::Added), 2);
        assert_eq!(d.count(DiffKind::Removed), 1);
        assert_eq!(d.count(DiffKind::Changed), 1);
    }

    #[test]
    fn empty_sides() {
        let d = run(vec![], vec![kv("a", 1)]);
        assert_eq!(d.as_slice(), &[DiffItem::added(kv("a", 1))]);

        let d = run(vec![kv("a", 1)], vec![]);
        assert_eq!(d.as_slice(), &[DiffItem::removed(kv("a", 1))]);

        assert!(run(vec![], vec![]).is_empty());
    }

    #[test]
    fn key_function_controls_case_sensitivity() {
        let left = vec!["Orders".to_string()];
        let right = vec!["orders".to_string()];

        let exact = diff_by(left.clone(), right.clone(), |s| s.clone(), |a, b| a == b);
        assert_eq!(exact.len(), 2);

        let folded = diff_by(left, right, |s| s.to_lowercase(), |_, _| true);
        assert!(folded.is_empty());
    }

    #[test]
    fn works_over_borrowed_values() {
        let left = [kv("a", 1)];
        let right = [kv("a", 2)];
        let d = diff_by(left.iter(), right.iter(), |x| x.k, |a, b| a.v == b.v);
        assert_eq!(d.len(), 1);
        assert_eq!(d.as_slice()[0].right.map(|r| r.v), Some(2));
    }

    #[test]
    fn diff_kind_display() {
        assert_eq!(DiffKind::Changed.to_string(), "Changed");
    }
}
