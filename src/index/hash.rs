use super::{check_pos, table_bytes};
use crate::{StateId, StateIndex, StateView};
use std::collections::HashMap;

/// A hash map from the full slice sequence to its identifier. This is the baseline that the
/// structured backends are compared against.
#[derive(Clone, Debug, Default)]
pub struct HashIndex {
    ids: HashMap<Box<[u32]>, StateId, ahash::RandomState>,
}

impl HashIndex {
    pub fn new() -> Self {
        Default::default()
    }

    pub fn with_capacity(capacity: usize) -> Self {
        HashIndex {
            ids: HashMap::with_capacity_and_hasher(capacity, Default::default()),
        }
    }
}

fn key(view: &StateView<'_>, pos: usize) -> Vec<u32> {
    check_pos(view, pos);
    view.slices_from(pos).collect()
}

impl StateIndex for HashIndex {
    fn name(&self) -> &'static str {
        "hash"
    }

    fn contains_from(&self, view: &StateView<'_>, pos: usize) -> bool {
        self.ids.contains_key(key(view, pos).as_slice())
    }

    fn get_from(&self, view: &StateView<'_>, pos: usize) -> Option<StateId> {
        self.ids.get(key(view, pos).as_slice()).copied()
    }

    fn insert_from(&mut self, view: &StateView<'_>, pos: usize) -> StateId {
        let next_id = self.ids.len() as StateId;
        *self
            .ids
            .entry(key(view, pos).into_boxed_slice())
            .or_insert(next_id)
    }

    fn len(&self) -> usize {
        self.ids.len()
    }

    fn memory_bytes(&self) -> usize {
        let keys: usize = self.ids.keys().map(|k| std::mem::size_of_val(&**k)).sum();
        table_bytes::<(Box<[u32]>, StateId)>(self.ids.capacity()) + keys
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::index::conformance;

    #[test]
    fn satisfies_index_contract() {
        conformance::all(|| Box::new(HashIndex::new()));
    }

    #[test]
    #[should_panic(expected = "Slice index out of bounds. index=2, len=1")]
    fn panics_past_the_end() {
        conformance::panics_past_the_end(&mut HashIndex::with_capacity(8));
    }
}
