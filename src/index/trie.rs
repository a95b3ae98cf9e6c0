use super::{check_pos, table_bytes};
use crate::{StateId, StateIndex, StateView};
use nohash_hasher::NoHashHasher;
use std::collections::HashMap;
use std::hash::BuildHasherDefault;

type NodeId = usize;

const ROOT: NodeId = 0;

/// Slice values are small integers, so they serve as their own hash.
type Children = HashMap<u32, NodeId, BuildHasherDefault<NoHashHasher<u32>>>;

#[derive(Clone, Debug, Default)]
struct Node {
    children: Children,
    /// Set on the node reached after consuming every slice of an inserted sequence.
    terminal: Option<StateId>,
}

/// A prefix tree keyed by slice value at each depth.
///
/// Nodes live in an arena and each has exactly one parent. The identifier of a sequence is stored
/// on the node its final slice leads to, so a sequence is contained only if it ends exactly at a
/// terminal node. The next identifier comes from a single counter owned by the index.
///
/// ```rust
/// # use statetrie::{SliceLayout, StateBuffer, StateIndex, StateView, TrieIndex};
/// let layout = SliceLayout::new(8, 1).unwrap();
/// let mut trie = TrieIndex::new();
/// for (values, expected) in [(vec![1, 2], 0), (vec![1, 3], 1), (vec![1, 2], 0)] {
///     let buffer = StateBuffer::from_slices(&values, &layout).unwrap();
///     assert_eq!(trie.insert(&StateView::new(&buffer, layout).unwrap()), expected);
/// }
/// assert_eq!(trie.len(), 2);
/// assert_eq!(trie.node_count(), 4);
/// ```
#[derive(Clone, Debug)]
pub struct TrieIndex {
    nodes: Vec<Node>,
    next_id: StateId,
}

impl TrieIndex {
    pub fn new() -> Self {
        Self::with_capacity(1)
    }

    /// Preallocates room for `nodes` nodes, including the root.
    pub fn with_capacity(nodes: usize) -> Self {
        let mut arena = Vec::with_capacity(nodes.max(1));
        arena.push(Node::default());
        TrieIndex {
            nodes: arena,
            next_id: 0,
        }
    }

    /// Number of nodes including the root, a proxy for memory use.
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Number of edges followed by the deepest inserted sequence.
    pub fn depth(&self) -> usize {
        let mut deepest = 0;
        let mut stack = vec![(ROOT, 0)];
        while let Some((node, depth)) = stack.pop() {
            deepest = deepest.max(depth);
            stack.extend(self.nodes[node].children.values().map(|&c| (c, depth + 1)));
        }
        deepest
    }

    /// Follows `view[pos..]` from the root without modifying the tree.
    fn walk(&self, view: &StateView<'_>, pos: usize) -> Option<NodeId> {
        check_pos(view, pos);
        view.slices_from(pos).try_fold(ROOT, |node, value| {
            self.nodes[node].children.get(&value).copied()
        })
    }
}

impl Default for TrieIndex {
    fn default() -> Self {
        Self::new()
    }
}

impl StateIndex for TrieIndex {
    fn name(&self) -> &'static str {
        "trie"
    }

    fn contains_from(&self, view: &StateView<'_>, pos: usize) -> bool {
        self.get_from(view, pos).is_some()
    }

    fn get_from(&self, view: &StateView<'_>, pos: usize) -> Option<StateId> {
        self.walk(view, pos).and_then(|node| self.nodes[node].terminal)
    }

    fn insert_from(&mut self, view: &StateView<'_>, pos: usize) -> StateId {
        check_pos(view, pos);
        let mut node = ROOT;
        for value in view.slices_from(pos) {
            let existing = self.nodes[node].children.get(&value).copied();
            node = match existing {
                Some(child) => child,
                None => {
                    let child = self.nodes.len();
                    self.nodes.push(Node::default());
                    self.nodes[node].children.insert(value, child);
                    child
                }
            };
        }
        if let Some(id) = self.nodes[node].terminal {
            return id;
        }
        let id = self.next_id;
        self.next_id += 1;
        self.nodes[node].terminal = Some(id);
        log::trace!("trie: inserted {} as {}. nodes={}", view, id, self.nodes.len());
        id
    }

    fn len(&self) -> usize {
        self.next_id as usize
    }

    fn memory_bytes(&self) -> usize {
        let children: usize = self
            .nodes
            .iter()
            .map(|n| table_bytes::<(u32, NodeId)>(n.children.capacity()))
            .sum();
        self.nodes.capacity() * std::mem::size_of::<Node>() + children
    }
}
