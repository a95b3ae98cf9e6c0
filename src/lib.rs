//! A library for exploring the reachable state space of a model whose states are flat bit
//! buffers, with a pluggable index that decides state identity.
//!
//! A [`Generator`] produces encoded states. The [`Explorer`] walks them breadth first, and every
//! candidate state passes through a single callback that consults a [`StateIndex`] and answers
//! with an [`Assignment`]: the state's identifier, or a reason to drop the transition. Identifiers
//! are dense and follow first-discovery order. Every index lookup and insertion is timed so that
//! backends can be compared on the same workload.
//!
//! A small example follows.
//!
//! ```rust
//! use statetrie::*;
//!
//! /// A counter that can be incremented by one or two up to a limit.
//! struct Counter {
//!     limit: u32,
//!     current: u32,
//! }
//!
//! impl Generator for Counter {
//!     fn initial_states(&mut self, assign: &mut AssignFn<'_>) -> Result<Vec<StateId>, ExploreError> {
//!         let state = StateBuffer::from_slices(&[0], &SliceLayout::default())?;
//!         Ok(assign(&state)?.id().into_iter().collect())
//!     }
//!
//!     fn load(&mut self, state: &StateBuffer) -> Result<(), ExploreError> {
//!         self.current = StateView::new(state, SliceLayout::default())?.get(0);
//!         Ok(())
//!     }
//!
//!     fn expand(&mut self, assign: &mut AssignFn<'_>) -> Result<Behavior, ExploreError> {
//!         let mut choices = Vec::new();
//!         for step in [1, 2] {
//!             if self.current + step <= self.limit {
//!                 let next = StateBuffer::from_slices(&[self.current + step], &SliceLayout::default())?;
//!                 if let Some(id) = assign(&next)?.id() {
//!                     choices.push(vec![(id, 0.5)]);
//!                 }
//!             }
//!         }
//!         Ok(choices)
//!     }
//! }
//!
//! let mut explorer = Counter { limit: 5, current: 0 }.explorer().build(TrieIndex::new());
//! explorer.run().unwrap();
//! assert_eq!(explorer.unique_state_count(), 6);
//! assert_eq!(explorer.transition_count(), 9);
//! assert_eq!(explorer.instrumentation().summary().inserts.count, 6);
//! ```

mod config;
mod error;
mod explorer;
mod index;
mod instrument;
pub mod report;
mod source;
mod state;
#[cfg(test)]
mod test_util;

pub use config::*;
pub use error::*;
pub use explorer::*;
pub use index::*;
pub use instrument::*;
pub use source::*;
pub use state::*;

/// A dense state identifier, assigned in order of first discovery.
pub type StateId = u32;
