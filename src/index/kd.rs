use super::check_pos;
use crate::{StateId, StateIndex, StateView};
use std::collections::BTreeMap;

/// A spatial index that treats each slice sequence as a point and answers membership with a
/// nearest-neighbour query.
///
/// The nearest stored point is only a candidate: it is a hit only if it is identical to the query.
/// Points of different dimensionality never share a tree.
#[derive(Clone, Debug, Default)]
pub struct KdIndex {
    trees: BTreeMap<usize, KdTree>,
    next_id: StateId,
}

impl KdIndex {
    pub fn new() -> Self {
        Default::default()
    }

    /// Depth of the deepest tree, a measure of how unbalanced insertion order left it.
    pub fn depth(&self) -> usize {
        self.trees.values().map(KdTree::depth).max().unwrap_or(0)
    }

    fn lookup(&self, view: &StateView<'_>, pos: usize) -> Option<StateId> {
        check_pos(view, pos);
        let query: Vec<u32> = view.slices_from(pos).collect();
        let tree = self.trees.get(&query.len())?;
        let nearest = tree.nearest(&query)?;
        let point = &tree.points[nearest];
        if *point.coords == *query {
            Some(point.id)
        } else {
            None
        }
    }
}

impl StateIndex for KdIndex {
    fn name(&self) -> &'static str {
        "kd"
    }

    fn contains_from(&self, view: &StateView<'_>, pos: usize) -> bool {
        self.lookup(view, pos).is_some()
    }

    fn get_from(&self, view: &StateView<'_>, pos: usize) -> Option<StateId> {
        self.lookup(view, pos)
    }

    fn insert_from(&mut self, view: &StateView<'_>, pos: usize) -> StateId {
        if let Some(id) = self.lookup(view, pos) {
            return id;
        }
        let coords: Box<[u32]> = view.slices_from(pos).collect();
        let id = self.next_id;
        self.next_id += 1;
        self.trees.entry(coords.len()).or_default().insert(coords, id);
        id
    }

    fn len(&self) -> usize {
        self.next_id as usize
    }

    fn memory_bytes(&self) -> usize {
        self.trees
            .values()
            .map(|tree| {
                tree.points.capacity() * std::mem::size_of::<KdPoint>()
                    + tree
                        .points
                        .iter()
                        .map(|p| std::mem::size_of_val(&*p.coords))
                        .sum::<usize>()
            })
            .sum()
    }
}

#[derive(Clone, Debug)]
struct KdPoint {
    coords: Box<[u32]>,
    id: StateId,
    left: Option<usize>,
    right: Option<usize>,
}

/// An unbalanced k-d tree over points of one dimensionality. The splitting axis cycles with
/// depth; points equal on the axis go right.
#[derive(Clone, Debug, Default)]
struct KdTree {
    points: Vec<KdPoint>,
}

impl KdTree {
    fn insert(&mut self, coords: Box<[u32]>, id: StateId) {
        let new = self.points.len();
        let dims = coords.len();
        if new > 0 && dims > 0 {
            let mut node = 0;
            let mut depth = 0;
            loop {
                let axis = depth % dims;
                let point = &mut self.points[node];
                let next = if coords[axis] < point.coords[axis] {
                    &mut point.left
                } else {
                    &mut point.right
                };
                let child = *next;
                match child {
                    Some(child) => node = child,
                    None => {
                        *next = Some(new);
                        break;
                    }
                }
                depth += 1;
            }
        }
        self.points.push(KdPoint {
            coords,
            id,
            left: None,
            right: None,
        });
    }

    /// Index of the point closest to `query` by squared Euclidean distance.
    fn nearest(&self, query: &[u32]) -> Option<usize> {
        if self.points.is_empty() {
            return None;
        }
        let dims = query.len();
        let mut best: Option<(usize, u128)> = None;
        // (node, depth, lower bound on the distance of anything in its subtree)
        let mut stack = vec![(0, 0, 0u128)];
        while let Some((node, depth, bound)) = stack.pop() {
            if matches!(best, Some((_, d)) if bound >= d) {
                continue;
            }
            let point = &self.points[node];
            let distance = distance(&point.coords, query);
            if best.map_or(true, |(_, d)| distance < d) {
                best = Some((node, distance));
            }
            if dims == 0 {
                continue;
            }
            let axis = depth % dims;
            let offset = query[axis] as i128 - point.coords[axis] as i128;
            let (near, far) = if offset < 0 {
                (point.left, point.right)
            } else {
                (point.right, point.left)
            };
            if let Some(far) = far {
                let plane = (offset * offset) as u128;
                stack.push((far, depth + 1, bound.max(plane)));
            }
            if let Some(near) = near {
                stack.push((near, depth + 1, bound));
            }
        }
        best.map(|(node, _)| node)
    }

    fn depth(&self) -> usize {
        if self.points.is_empty() {
            return 0;
        }
        let mut deepest = 0;
        let mut stack = vec![(0, 1)];
        while let Some((node, depth)) = stack.pop() {
            deepest = deepest.max(depth);
            let point = &self.points[node];
            stack.extend(point.left.map(|c| (c, depth + 1)));
            stack.extend(point.right.map(|c| (c, depth + 1)));
        }
        deepest
    }
}

fn distance(a: &[u32], b: &[u32]) -> u128 {
    a.iter()
        .zip(b)
        .map(|(&x, &y)| {
            let d = x as i128 - y as i128;
            (d * d) as u128
        })
        .fold(0, u128::saturating_add)
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::index::conformance;

    fn point(coords: &[u32]) -> Box<[u32]> {
        coords.into()
    }

    #[test]
    fn satisfies_index_contract() {
        conformance::all(|| Box::new(KdIndex::new()));
    }

    #[test]
    #[should_panic(expected = "Slice index out of bounds. index=2, len=1")]
    fn panics_past_the_end() {
        conformance::panics_past_the_end(&mut KdIndex::new());
    }

    #[test]
    fn nearest_point_is_not_a_hit_unless_identical() {
        let mut tree = KdTree::default();
        tree.insert(point(&[5, 5]), 0);
        tree.insert(point(&[1, 9]), 1);
        tree.insert(point(&[8, 2]), 2);
        let nearest = tree.nearest(&[5, 6]).unwrap();
        assert_eq!(tree.points[nearest].id, 0);
        assert_ne!(*tree.points[nearest].coords, [5, 6]);
        assert_eq!(tree.points[tree.nearest(&[8, 2]).unwrap()].id, 2);
    }

    #[test]
    fn finds_exact_matches_across_the_splitting_plane() {
        let mut tree = KdTree::default();
        let points: [[u32; 2]; 5] = [[50, 0], [50, 10], [49, 100], [51, 100], [50, 100]];
        for (id, p) in points.iter().enumerate() {
            tree.insert(point(p), id as StateId);
        }
        for (id, p) in points.iter().enumerate() {
            assert_eq!(tree.points[tree.nearest(p).unwrap()].id, id as StateId);
        }
        assert!(tree.depth() >= 3);
    }
}
