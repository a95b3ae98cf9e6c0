use crate::StateView;

/// Limits which fields a transition may change.
///
/// Only the first `free_prefix` slices of a successor may differ from the state being expanded;
/// every later slice must match exactly. Candidates that violate this are rejected, which prunes
/// them from exploration without affecting deduplication. Slice positions are logical positions,
/// so a [`FieldOrder`](crate::FieldOrder) decides which fields form the free prefix.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub struct TransitionFilter {
    free_prefix: usize,
}

impl TransitionFilter {
    pub fn new(free_prefix: usize) -> Self {
        TransitionFilter { free_prefix }
    }

    pub fn free_prefix(&self) -> usize {
        self.free_prefix
    }

    /// Indicates whether `candidate` may succeed `subject`. States with a different number of
    /// slices never match.
    pub fn permits(&self, subject: &StateView<'_>, candidate: &StateView<'_>) -> bool {
        subject.len() == candidate.len()
            && subject
                .iter()
                .zip(candidate.iter())
                .skip(self.free_prefix)
                .all(|(s, c)| s == c)
    }
}
