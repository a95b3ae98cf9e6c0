//! Utilities for tests.

use crate::{
    AssignFn, Assignment, Behavior, ExploreError, Generator, SliceLayout, StateBuffer, StateId,
    StateView,
};

/// A generator over fixed-length `u32` states whose successors are computed by a closure. Each
/// successor forms its own choice with weight `1.0`.
pub struct SuccessorFn<F> {
    layout: SliceLayout,
    initial: Vec<Vec<u32>>,
    successors: F,
    names: Vec<String>,
    loaded: Vec<u32>,
}

impl<F> SuccessorFn<F>
where
    F: Fn(&[u32]) -> Vec<Vec<u32>>,
{
    pub fn new(layout: SliceLayout, initial: Vec<Vec<u32>>, successors: F) -> Self {
        SuccessorFn {
            layout,
            initial,
            successors,
            names: Vec::new(),
            loaded: Vec::new(),
        }
    }

    pub fn with_field_names(self, names: &[&str]) -> Self {
        SuccessorFn {
            names: names.iter().map(|n| n.to_string()).collect(),
            ..self
        }
    }
}

impl<F> Generator for SuccessorFn<F>
where
    F: Fn(&[u32]) -> Vec<Vec<u32>>,
{
    fn field_names(&self) -> Vec<String> {
        self.names.clone()
    }

    fn initial_states(
        &mut self,
        assign: &mut AssignFn<'_>,
    ) -> Result<Vec<StateId>, ExploreError> {
        let mut ids = Vec::with_capacity(self.initial.len());
        for values in &self.initial {
            let state = StateBuffer::from_slices(values, &self.layout)?;
            if let Assignment::Assigned(id) = assign(&state)? {
                ids.push(id);
            }
        }
        Ok(ids)
    }

    fn load(&mut self, state: &StateBuffer) -> Result<(), ExploreError> {
        self.loaded = StateView::new(state, self.layout)?.to_vec();
        Ok(())
    }

    fn expand(&mut self, assign: &mut AssignFn<'_>) -> Result<Behavior, ExploreError> {
        let mut behavior = Vec::new();
        for values in (self.successors)(&self.loaded) {
            let state = StateBuffer::from_slices(&values, &self.layout)?;
            if let Some(id) = assign(&state)?.id() {
                behavior.push(vec![(id, 1.0)]);
            }
        }
        Ok(behavior)
    }
}

/// States `[0]` through `[len - 1]`, each stepping to the next.
pub fn chain(len: u32) -> SuccessorFn<impl Fn(&[u32]) -> Vec<Vec<u32>>> {
    SuccessorFn::new(SliceLayout::default(), vec![vec![0]], move |state: &[u32]| {
        if state[0] + 1 < len {
            vec![vec![state[0] + 1]]
        } else {
            Vec::new()
        }
    })
}

/// A `dims`-dimensional lattice of coordinates `0..=bound` starting at the origin. Successors
/// increment each coordinate in turn and then decrement each in turn.
pub fn grid(dims: usize, bound: u32) -> SuccessorFn<impl Fn(&[u32]) -> Vec<Vec<u32>>> {
    SuccessorFn::new(
        SliceLayout::default(),
        vec![vec![0; dims]],
        move |state: &[u32]| {
            let mut next = Vec::new();
            for i in 0..state.len() {
                if state[i] < bound {
                    let mut s = state.to_vec();
                    s[i] += 1;
                    next.push(s);
                }
            }
            for i in 0..state.len() {
                if state[i] > 0 {
                    let mut s = state.to_vec();
                    s[i] -= 1;
                    next.push(s);
                }
            }
            next
        },
    )
}
