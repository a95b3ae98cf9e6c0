//! Private module for selective re-export.

mod hash;
mod kd;
mod trie;

use crate::{ConfigError, StateId, StateView};
use serde::{Deserialize, Serialize};
use std::fmt::{self, Display, Formatter};
use std::str::FromStr;

pub use hash::*;
pub use kd::*;
pub use trie::*;

/// A deduplicating map from slice sequences to identifiers.
///
/// Identifiers are assigned `0, 1, 2, …` in order of first insertion and never change. Every
/// operation addresses the suffix of the view starting at slice `pos`; the provided methods use
/// the whole view. `pos == view.len()` addresses the empty suffix, and `pos > view.len()` is a
/// contract violation that panics.
///
/// Implementations include [`TrieIndex`], [`HashIndex`], and [`KdIndex`].
pub trait StateIndex {
    /// Short name used in reports.
    fn name(&self) -> &'static str;

    /// Indicates whether exactly `view[pos..]` was inserted. A proper prefix or extension of an
    /// inserted sequence is not contained.
    fn contains_from(&self, view: &StateView<'_>, pos: usize) -> bool;

    /// The identifier of `view[pos..]`, or `None` if it was never inserted.
    fn get_from(&self, view: &StateView<'_>, pos: usize) -> Option<StateId>;

    /// Records `view[pos..]` and returns its identifier. Inserting a sequence that is already
    /// present changes nothing and returns the existing identifier.
    fn insert_from(&mut self, view: &StateView<'_>, pos: usize) -> StateId;

    /// Number of distinct sequences recorded.
    fn len(&self) -> usize;

    /// Approximate bytes held by the index, counting allocated capacity. Zero for backends that
    /// do not estimate their size.
    fn memory_bytes(&self) -> usize {
        0
    }

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn contains(&self, view: &StateView<'_>) -> bool {
        self.contains_from(view, 0)
    }

    fn get(&self, view: &StateView<'_>) -> Option<StateId> {
        self.get_from(view, 0)
    }

    fn insert(&mut self, view: &StateView<'_>) -> StateId {
        self.insert_from(view, 0)
    }
}

impl<I: StateIndex + ?Sized> StateIndex for Box<I> {
    fn name(&self) -> &'static str {
        (**self).name()
    }

    fn contains_from(&self, view: &StateView<'_>, pos: usize) -> bool {
        (**self).contains_from(view, pos)
    }

    fn get_from(&self, view: &StateView<'_>, pos: usize) -> Option<StateId> {
        (**self).get_from(view, pos)
    }

    fn insert_from(&mut self, view: &StateView<'_>, pos: usize) -> StateId {
        (**self).insert_from(view, pos)
    }

    fn len(&self) -> usize {
        (**self).len()
    }

    fn memory_bytes(&self) -> usize {
        (**self).memory_bytes()
    }
}

/// Approximate bytes allocated by a `HashMap` with room for `capacity` entries of type `T`: one
/// slot plus one control byte per bucket.
fn table_bytes<T>(capacity: usize) -> usize {
    let buckets = if capacity == 0 {
        0
    } else {
        (capacity * 8 / 7).next_power_of_two()
    };
    buckets * (std::mem::size_of::<T>() + 1)
}

/// Selects a [`StateIndex`] implementation by name.
#[derive(Clone, Copy, Debug, Default, Deserialize, Eq, Hash, PartialEq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Backend {
    /// [`TrieIndex`]
    #[default]
    Trie,
    /// [`HashIndex`]
    Hash,
    /// [`KdIndex`]
    Kd,
}

impl Backend {
    pub const ALL: [Backend; 3] = [Backend::Trie, Backend::Hash, Backend::Kd];

    pub fn name(&self) -> &'static str {
        match self {
            Backend::Trie => "trie",
            Backend::Hash => "hash",
            Backend::Kd => "kd",
        }
    }

    /// An empty index of this kind.
    pub fn index(&self) -> Box<dyn StateIndex> {
        match self {
            Backend::Trie => Box::new(TrieIndex::new()),
            Backend::Hash => Box::new(HashIndex::new()),
            Backend::Kd => Box::new(KdIndex::new()),
        }
    }
}

impl Display for Backend {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Backend {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Backend::ALL
            .into_iter()
            .find(|b| b.name().eq_ignore_ascii_case(s))
            .ok_or_else(|| ConfigError::UnknownBackend(s.to_owned()))
    }
}

/// Validates the `pos` argument shared by every [`StateIndex`] operation.
fn check_pos(view: &StateView<'_>, pos: usize) {
    if pos > view.len() {
        panic!(
            "{}",
            crate::EncodingError::OutOfBounds {
                index: pos,
                len: view.len()
            }
        );
    }
}

/// Behaviour every backend must share. Each backend's test module runs these against itself.
#[cfg(test)]
pub(crate) mod conformance {
    use super::*;
    use crate::{SliceLayout, StateBuffer};
    use rand::{Rng, SeedableRng};
    use std::collections::HashMap;

    fn layout() -> SliceLayout {
        SliceLayout::new(16, 1).unwrap()
    }

    fn buffer(values: &[u32]) -> StateBuffer {
        StateBuffer::from_slices(values, &layout()).unwrap()
    }

    fn view(buffer: &StateBuffer) -> StateView<'_> {
        StateView::new(buffer, layout()).unwrap()
    }

    pub fn assigns_identifiers_in_insertion_order(index: &mut impl StateIndex) {
        let (a, b) = (buffer(&[1, 2]), buffer(&[1, 3]));
        assert!(!index.contains(&view(&a)));
        assert_eq!(index.insert(&view(&a)), 0);
        assert_eq!(index.insert(&view(&b)), 1);
        assert_eq!(index.insert(&view(&buffer(&[1, 2]))), 0);
        assert_eq!(index.len(), 2);
        assert_eq!(index.get(&view(&a)), Some(0));
        assert_eq!(index.get(&view(&b)), Some(1));
        assert_eq!(index.get(&view(&buffer(&[1, 4]))), None);
    }

    pub fn distinguishes_prefixes(index: &mut impl StateIndex) {
        let long = buffer(&[1, 2, 3]);
        let short = buffer(&[1, 2]);
        let empty = buffer(&[]);
        index.insert(&view(&long));
        assert!(!index.contains(&view(&short)));
        assert!(!index.contains(&view(&empty)));
        assert!(!index.contains(&view(&buffer(&[1, 2, 3, 4]))));
        assert_eq!(index.insert(&view(&short)), 1);
        assert_eq!(index.insert(&view(&empty)), 2);
        assert_eq!(index.get(&view(&long)), Some(0));
        assert_eq!(index.get(&view(&short)), Some(1));
        assert_eq!(index.get(&view(&empty)), Some(2));
    }

    pub fn addresses_suffixes(index: &mut impl StateIndex) {
        let a = buffer(&[9, 1, 2]);
        assert_eq!(index.insert_from(&view(&a), 1), 0);
        assert!(index.contains_from(&view(&buffer(&[7, 1, 2])), 1));
        assert!(!index.contains(&view(&a)));
        assert!(index.contains(&view(&buffer(&[1, 2]))));
        assert_eq!(index.get_from(&view(&buffer(&[4, 4, 1, 2])), 2), Some(0));
        assert_eq!(index.insert_from(&view(&a), 3), 1);
        assert!(index.contains_from(&view(&buffer(&[5])), 1));
    }

    /// Random sweep over states of one length, checked against a `HashMap` oracle.
    pub fn matches_oracle(index: &mut impl StateIndex, seed: u64) {
        let mut rng = rand::rngs::StdRng::seed_from_u64(seed);
        let len = rng.gen_range(1..=10);
        let mut oracle: HashMap<Vec<u32>, StateId> = HashMap::new();
        for _ in 0..5_000 {
            let values: Vec<u32> = (0..len).map(|_| rng.gen_range(0..4)).collect();
            let raw = buffer(&values);
            let v = view(&raw);
            match oracle.get(&values) {
                Some(&id) => {
                    assert!(index.contains(&v), "{} should be contained", v);
                    assert_eq!(index.get(&v), Some(id));
                    assert_eq!(index.insert(&v), id);
                }
                None => {
                    assert!(!index.contains(&v), "{} should not be contained", v);
                    let id = oracle.len() as StateId;
                    assert_eq!(index.insert(&v), id);
                    oracle.insert(values, id);
                }
            }
            assert_eq!(index.len(), oracle.len());
        }
        for (values, id) in &oracle {
            let raw = buffer(values);
            for _ in 0..3 {
                assert_eq!(index.get(&view(&raw)), Some(*id));
                assert_eq!(index.insert(&view(&raw)), *id);
            }
        }
        assert_eq!(index.len(), oracle.len());
    }

    pub fn panics_past_the_end(index: &mut impl StateIndex) {
        let raw = buffer(&[1]);
        index.contains_from(&view(&raw), 2);
    }

    pub fn grows_with_contents(index: &mut impl StateIndex) {
        let empty = index.memory_bytes();
        for i in 0..100 {
            index.insert(&view(&buffer(&[i, i + 1, i + 2])));
        }
        assert!(
            index.memory_bytes() > empty + 100 * 3 * std::mem::size_of::<u32>(),
            "{} bytes after 100 states",
            index.memory_bytes()
        );
    }

    pub fn all(mut new_index: impl FnMut() -> Box<dyn StateIndex>) {
        assigns_identifiers_in_insertion_order(&mut new_index());
        distinguishes_prefixes(&mut new_index());
        addresses_suffixes(&mut new_index());
        for seed in 0..4 {
            matches_oracle(&mut new_index(), seed);
        }
        grows_with_contents(&mut new_index());
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn parses_backend_names() {
        assert_eq!("trie".parse::<Backend>().unwrap(), Backend::Trie);
        assert_eq!("HASH".parse::<Backend>().unwrap(), Backend::Hash);
        assert_eq!("kd".parse::<Backend>().unwrap(), Backend::Kd);
        assert!(matches!(
            "rtree".parse::<Backend>(),
            Err(ConfigError::UnknownBackend(name)) if name == "rtree"
        ));
        assert_eq!(Backend::default().to_string(), "trie");
    }

    #[test]
    fn creates_named_empty_indexes() {
        for backend in Backend::ALL {
            let index = backend.index();
            assert_eq!(index.name(), backend.name());
            assert!(index.is_empty());
        }
    }
}
