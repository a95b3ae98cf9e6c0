//! Runs a configured exploration session against a model loaded from disk.

use crate::report::ReportData;
use crate::{BoxError, ConfigError, Error, Generator, Instrumentation, Settings, StateId};
use std::path::Path;

/// Turns a model file, and optionally a property file, into a [`Generator`].
pub trait ModelSource {
    type Generator: Generator;

    fn open(&self, model: &Path, properties: Option<&Path>) -> Result<Self::Generator, BoxError>;
}

/// Everything a finished session produced.
#[derive(Debug)]
pub struct Outcome {
    pub report: ReportData,
    pub instrumentation: Instrumentation,
    /// Identifiers of the initial states, in generator order.
    pub initial_states: Vec<StateId>,
}

/// Opens the model named by `settings`, explores it with the configured backend, layout, field
/// order, filter, and target state count, and returns the results.
pub fn explore<S: ModelSource>(settings: &Settings, source: &S) -> Result<Outcome, Error> {
    let generator = source
        .open(&settings.model_path, settings.property_path.as_deref())
        .map_err(|source| Error::Source {
            path: settings.model_path.clone(),
            source,
        })?;

    let mut builder = generator
        .explorer()
        .layout(settings.layout().map_err(ConfigError::from)?)
        .field_order_by_name(&settings.ordering)?;
    if let Some(filter) = settings.filter() {
        builder = builder.free_prefix(filter.free_prefix());
    }
    if let Some(max_states) = settings.max_states {
        builder = builder.target_state_count(max_states);
    }

    log::debug!(
        "Exploring. model={}, backend={}",
        settings.model_path.display(),
        settings.backend
    );
    let mut explorer = builder.build(settings.backend.index());
    explorer.run()?;

    let report = explorer.report_data();
    let initial_states = explorer.initial_states().to_vec();
    let (_, instrumentation) = explorer.into_parts();
    Ok(Outcome {
        report,
        instrumentation,
        initial_states,
    })
}
