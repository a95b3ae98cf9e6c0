//! Private module for selective re-export.

mod assigner;
mod filter;

use crate::report::{ReportData, Reporter};
use crate::{
    ConfigError, ExploreError, FieldOrder, Instrumentation, SliceLayout, StateBuffer, StateId,
    StateIndex,
};
use assigner::Assigner;
use std::collections::VecDeque;
use std::time::{Duration, Instant};

pub use filter::*;

/// Successor identifiers and weights for one nondeterministic choice.
pub type Choice = Vec<(StateId, f64)>;

/// Every choice available from an expanded state.
pub type Behavior = Vec<Choice>;

/// The identifier callback handed to a [`Generator`]. It must be invoked once per candidate
/// state.
pub type AssignFn<'a> = dyn FnMut(&StateBuffer) -> Result<Assignment, ExploreError> + 'a;

/// The explorer's answer for one candidate state.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum Assignment {
    /// The state's identifier, whether newly allocated or previously assigned.
    Assigned(StateId),
    /// The transition filter rejected the candidate. The generator should discard the
    /// transition.
    Rejected,
    /// The candidate is new but the target state count was already reached. The generator
    /// should discard the transition.
    Truncated,
}

impl Assignment {
    pub fn id(self) -> Option<StateId> {
        match self {
            Assignment::Assigned(id) => Some(id),
            Assignment::Rejected | Assignment::Truncated => None,
        }
    }
}

/// Produces encoded states and their successors. The explorer never interprets the encoding
/// beyond the configured [`SliceLayout`].
pub trait Generator {
    /// Names of the encoded fields in slice order. Used to resolve orderings given by name.
    fn field_names(&self) -> Vec<String> {
        Vec::new()
    }

    /// Passes each initial state through `assign` and returns the assigned identifiers.
    fn initial_states(&mut self, assign: &mut AssignFn<'_>)
        -> Result<Vec<StateId>, ExploreError>;

    /// Sets the state that the next call to [`Generator::expand`] expands.
    fn load(&mut self, state: &StateBuffer) -> Result<(), ExploreError>;

    /// Passes each successor of the loaded state through `assign`, dropping transitions whose
    /// candidate has no identifier, and returns the surviving transitions grouped by choice.
    fn expand(&mut self, assign: &mut AssignFn<'_>) -> Result<Behavior, ExploreError>;

    /// Begins configuring an [`Explorer`] for this generator.
    fn explorer(self) -> ExplorerBuilder<Self>
    where
        Self: Sized,
    {
        ExplorerBuilder::new(self)
    }
}

/// A discovered state awaiting expansion.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct FrontierEntry {
    pub state: StateBuffer,
    pub id: StateId,
}

/// Where an [`Explorer`] is in its run.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum Phase {
    /// Built but not yet seeded with initial states.
    Idle,
    /// Frontier entries remain and the target state count has not been reached.
    Expanding,
    /// The target state count was reached. No further expansion starts.
    Draining,
    /// Exploration finished.
    Done,
}

/// Configures an [`Explorer`]. Create one with [`Generator::explorer`].
pub struct ExplorerBuilder<G> {
    generator: G,
    layout: SliceLayout,
    order: Option<FieldOrder>,
    filter: Option<TransitionFilter>,
    target_state_count: Option<usize>,
}

impl<G: Generator> ExplorerBuilder<G> {
    pub fn new(generator: G) -> Self {
        ExplorerBuilder {
            generator,
            layout: SliceLayout::default(),
            order: None,
            filter: None,
            target_state_count: None,
        }
    }

    pub fn layout(self, layout: SliceLayout) -> Self {
        ExplorerBuilder { layout, ..self }
    }

    pub fn field_order(self, order: FieldOrder) -> Self {
        ExplorerBuilder {
            order: Some(order),
            ..self
        }
    }

    /// Orders fields by name using [`Generator::field_names`]. Unlisted fields follow in their
    /// natural order. An empty list keeps the natural order.
    pub fn field_order_by_name<S: AsRef<str>>(self, names: &[S]) -> Result<Self, ConfigError> {
        if names.is_empty() {
            return Ok(self);
        }
        let order = FieldOrder::from_names(names, &self.generator.field_names())?;
        Ok(self.field_order(order))
    }

    /// Rejects successors that change any slice at or beyond `free_prefix`.
    pub fn free_prefix(self, free_prefix: usize) -> Self {
        ExplorerBuilder {
            filter: Some(TransitionFilter::new(free_prefix)),
            ..self
        }
    }

    /// Stops assigning identifiers once `count` distinct states have been found.
    pub fn target_state_count(self, count: usize) -> Self {
        ExplorerBuilder {
            target_state_count: Some(count),
            ..self
        }
    }

    pub fn build<I: StateIndex>(self, index: I) -> Explorer<G, I> {
        log::debug!(
            "Building explorer. index={}, layout={:?}, order={:?}, filter={:?}, target={:?}",
            index.name(),
            self.layout,
            self.order.as_ref().map(FieldOrder::positions),
            self.filter,
            self.target_state_count
        );
        Explorer {
            generator: self.generator,
            assigner: Assigner {
                layout: self.layout,
                order: self.order,
                filter: self.filter,
                target_state_count: self.target_state_count,
                index,
                frontier: VecDeque::new(),
                next_id: 0,
                rejected: 0,
                truncated: 0,
                instrumentation: Instrumentation::new(),
            },
            phase: Phase::Idle,
            initial: Vec::new(),
            expanded: 0,
            transitions: 0,
            started: None,
            elapsed: Duration::ZERO,
        }
    }
}

/// Explores the states reachable from a [`Generator`]'s initial states in breadth-first order,
/// assigning each distinct state the next identifier when it is first seen.
pub struct Explorer<G, I> {
    generator: G,
    assigner: Assigner<I>,
    phase: Phase,
    initial: Vec<StateId>,
    expanded: usize,
    transitions: usize,
    started: Option<Instant>,
    elapsed: Duration,
}

impl<G, I> Explorer<G, I>
where
    G: Generator,
    I: StateIndex,
{
    /// Advances by one phase transition: seeding from [`Phase::Idle`], one expansion from
    /// [`Phase::Expanding`], and completion from [`Phase::Draining`]. A failure ends the run.
    pub fn step(&mut self) -> Result<Phase, ExploreError> {
        let started = *self.started.get_or_insert_with(Instant::now);
        let result = self.advance();
        self.elapsed = started.elapsed();
        match result {
            Ok(phase) => {
                if phase != self.phase {
                    log::debug!(
                        "{:?} -> {:?}. unique={}, pending={}, rejected={}, truncated={}",
                        self.phase,
                        phase,
                        self.unique_state_count(),
                        self.pending_count(),
                        self.rejected_count(),
                        self.truncated_count()
                    );
                }
                self.phase = phase;
                Ok(phase)
            }
            Err(error) => {
                log::error!(
                    "Exploration aborted. unique={}, error={}",
                    self.unique_state_count(),
                    error
                );
                self.phase = Phase::Done;
                Err(error)
            }
        }
    }

    /// Steps until [`Phase::Done`].
    pub fn run(&mut self) -> Result<&mut Self, ExploreError> {
        while !self.is_done() {
            self.step()?;
        }
        Ok(self)
    }

    fn advance(&mut self) -> Result<Phase, ExploreError> {
        match self.phase {
            Phase::Idle => {
                let assigner = &mut self.assigner;
                self.initial = self
                    .generator
                    .initial_states(&mut |state: &StateBuffer| assigner.assign(state, None))?;
                log::debug!(
                    "Seeded. initial={:?}, unique={}",
                    self.initial,
                    self.assigner.next_id
                );
            }
            Phase::Expanding => {
                if let Some(entry) = self.assigner.frontier.pop_front() {
                    self.generator.load(&entry.state)?;
                    let assigner = &mut self.assigner;
                    let subject = &entry.state;
                    let behavior = self
                        .generator
                        .expand(&mut |state: &StateBuffer| assigner.assign(state, Some(subject)))?;
                    let transitions: usize = behavior.iter().map(Vec::len).sum();
                    log::trace!(
                        "Expanded {}. choices={}, transitions={}",
                        entry.id,
                        behavior.len(),
                        transitions
                    );
                    self.expanded += 1;
                    self.transitions += transitions;
                }
            }
            Phase::Draining | Phase::Done => return Ok(Phase::Done),
        }
        Ok(if self.assigner.is_full() {
            Phase::Draining
        } else if self.assigner.frontier.is_empty() {
            Phase::Done
        } else {
            Phase::Expanding
        })
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn is_done(&self) -> bool {
        self.phase == Phase::Done
    }

    pub fn generator(&self) -> &G {
        &self.generator
    }

    pub fn index(&self) -> &I {
        &self.assigner.index
    }

    pub fn instrumentation(&self) -> &Instrumentation {
        &self.assigner.instrumentation
    }

    /// Identifiers returned for the initial states, in generator order.
    pub fn initial_states(&self) -> &[StateId] {
        &self.initial
    }

    /// Number of distinct states assigned an identifier.
    pub fn unique_state_count(&self) -> usize {
        self.assigner.next_id as usize
    }

    /// Number of discovered states not yet expanded.
    pub fn pending_count(&self) -> usize {
        self.assigner.frontier.len()
    }

    /// Discovered states not yet expanded, in expansion order.
    pub fn pending(&self) -> impl Iterator<Item = &FrontierEntry> {
        self.assigner.frontier.iter()
    }

    /// Number of candidates discarded by the transition filter.
    pub fn rejected_count(&self) -> usize {
        self.assigner.rejected
    }

    /// Number of unseen candidates discarded after the target state count was reached.
    pub fn truncated_count(&self) -> usize {
        self.assigner.truncated
    }

    pub fn expanded_count(&self) -> usize {
        self.expanded
    }

    /// Number of `(identifier, weight)` pairs returned by all expansions.
    pub fn transition_count(&self) -> usize {
        self.transitions
    }

    /// Time spent stepping so far.
    pub fn elapsed(&self) -> Duration {
        self.elapsed
    }

    pub fn report_data(&self) -> ReportData {
        ReportData {
            backend: self.index().name(),
            unique_states: self.unique_state_count(),
            initial_states: self.initial.len(),
            pending: self.pending_count(),
            expanded: self.expanded,
            transitions: self.transitions,
            rejected: self.rejected_count(),
            truncated: self.truncated_count(),
            summary: self.instrumentation().summary(),
            index_bytes: self.index().memory_bytes(),
            duration: self.elapsed,
            done: self.is_done(),
        }
    }

    pub fn report(&self, reporter: &mut impl Reporter) {
        reporter.report_exploration(&self.report_data());
    }

    /// Consumes the explorer, returning the index and samples.
    pub fn into_parts(self) -> (I, Instrumentation) {
        (self.assigner.index, self.assigner.instrumentation)
    }
}
