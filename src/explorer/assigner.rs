use crate::explorer::{Assignment, FrontierEntry};
use crate::{
    EncodingError, ExploreError, FieldOrder, Instrumentation, SliceLayout, StateBuffer, StateId,
    StateIndex, StateView, TransitionFilter,
};
use std::collections::VecDeque;
use std::time::Instant;

/// The state behind the identifier callback: the index, the frontier it feeds, and the counters
/// and samples that callback decisions produce. Kept apart from the generator so both can be
/// borrowed mutably during an expansion.
pub(crate) struct Assigner<I> {
    // Immutable configuration.
    pub(crate) layout: SliceLayout,
    pub(crate) order: Option<FieldOrder>,
    pub(crate) filter: Option<TransitionFilter>,
    pub(crate) target_state_count: Option<usize>,

    // Mutable exploration state.
    pub(crate) index: I,
    pub(crate) frontier: VecDeque<FrontierEntry>,
    pub(crate) next_id: StateId,
    pub(crate) rejected: usize,
    pub(crate) truncated: usize,
    pub(crate) instrumentation: Instrumentation,
}

impl<I: StateIndex> Assigner<I> {
    /// Whether the target state count has been reached.
    pub(crate) fn is_full(&self) -> bool {
        self.target_state_count
            .map_or(false, |target| self.next_id as usize >= target)
    }

    /// Decides the identifier for a candidate state. `subject` is the state being expanded, or
    /// `None` while seeding.
    pub(crate) fn assign(
        &mut self,
        candidate: &StateBuffer,
        subject: Option<&StateBuffer>,
    ) -> Result<Assignment, ExploreError> {
        let view = ordered_view(candidate, self.layout, self.order.as_ref())?;

        if let (Some(filter), Some(subject)) = (&self.filter, subject) {
            let subject = ordered_view(subject, self.layout, self.order.as_ref())?;
            if !filter.permits(&subject, &view) {
                self.rejected += 1;
                log::trace!("Rejected {} as a successor of {}.", view, subject);
                return Ok(Assignment::Rejected);
            }
        }

        // A hit costs a membership query plus an identifier fetch, and both count as the lookup.
        let start = Instant::now();
        let found = if self.index.contains(&view) {
            Some(self.index.get(&view))
        } else {
            None
        };
        self.instrumentation
            .record_lookup(start.elapsed(), self.index.len(), found.is_some());
        match found {
            Some(Some(id)) => return Ok(Assignment::Assigned(id)),
            Some(None) => {
                return Err(ExploreError::LostIdentifier {
                    size: self.index.len(),
                })
            }
            None => {}
        }

        if self.is_full() {
            self.truncated += 1;
            log::trace!("Truncated {}. unique={}", view, self.next_id);
            return Ok(Assignment::Truncated);
        }

        let id = self.next_id;
        self.next_id += 1;
        let start = Instant::now();
        let indexed = self.index.insert(&view);
        self.instrumentation
            .record_insert(start.elapsed(), self.index.len());
        if indexed != id {
            return Err(ExploreError::IdMismatch {
                expected: id,
                actual: indexed,
            });
        }
        self.frontier.push_back(FrontierEntry {
            state: candidate.clone(),
            id,
        });
        Ok(Assignment::Assigned(id))
    }
}

fn ordered_view<'a>(
    buffer: &'a StateBuffer,
    layout: SliceLayout,
    order: Option<&'a FieldOrder>,
) -> Result<StateView<'a>, EncodingError> {
    let view = StateView::new(buffer, layout)?;
    match order {
        Some(order) => view.with_order(order),
        None => Ok(view),
    }
}
