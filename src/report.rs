use std::io::Write;
use std::time::Duration;

use serde::Serialize;

use crate::instrument::Summary;

/// The data sent during a report event.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct ReportData {
    /// Name of the identity index backend.
    pub backend: &'static str,
    /// The number of unique states found.
    pub unique_states: usize,
    /// The number of initial states the generator produced.
    pub initial_states: usize,
    /// Discovered states that were never expanded.
    pub pending: usize,
    /// The number of states expanded.
    pub expanded: usize,
    /// The number of transitions returned by expansions.
    pub transitions: usize,
    /// Candidates discarded by the transition filter.
    pub rejected: usize,
    /// Unseen candidates discarded after the target state count was reached.
    pub truncated: usize,
    /// Index operation latencies.
    pub summary: Summary,
    /// Approximate bytes held by the index.
    pub index_bytes: usize,
    /// The current duration exploration has been running for.
    pub duration: Duration,
    /// Whether exploration is done.
    pub done: bool,
}

/// A reporter for progress during exploration.
pub trait Reporter {
    /// Report a progress event.
    fn report_exploration(&mut self, data: &ReportData);
}

/// Writes one human readable line per event, plus latency lines once exploration is done.
pub struct WriteReporter<'a, W> {
    writer: &'a mut W,
}

impl<'a, W> WriteReporter<'a, W> {
    pub fn new(writer: &'a mut W) -> Self {
        Self { writer }
    }
}

impl<'a, W> Reporter for WriteReporter<'a, W>
where
    W: Write,
{
    fn report_exploration(&mut self, data: &ReportData) {
        if data.done {
            let _ = writeln!(
                self.writer,
                "Done. backend={}, unique={}, pending={}, expanded={}, transitions={}, rejected={}, truncated={}, index_bytes={}, sec={}",
                data.backend,
                data.unique_states,
                data.pending,
                data.expanded,
                data.transitions,
                data.rejected,
                data.truncated,
                data.index_bytes,
                data.duration.as_secs(),
            );
            let summary = &data.summary;
            let _ = writeln!(
                self.writer,
                "Lookups. count={}, hits={}, misses={}, mean={:?}",
                summary.lookups.count, summary.hits, summary.misses, summary.lookups.mean,
            );
            let _ = writeln!(
                self.writer,
                "Inserts. count={}, mean={:?}",
                summary.inserts.count, summary.inserts.mean,
            );
        } else {
            let _ = writeln!(
                self.writer,
                "Exploring. backend={}, unique={}, pending={}, expanded={}",
                data.backend, data.unique_states, data.pending, data.expanded,
            );
        }
    }
}

/// Writes each event as one line of JSON.
pub struct JsonReporter<'a, W> {
    writer: &'a mut W,
}

impl<'a, W> JsonReporter<'a, W> {
    pub fn new(writer: &'a mut W) -> Self {
        Self { writer }
    }
}

impl<'a, W> Reporter for JsonReporter<'a, W>
where
    W: Write,
{
    fn report_exploration(&mut self, data: &ReportData) {
        match serde_json::to_string(data) {
            Ok(line) => {
                let _ = writeln!(self.writer, "{}", line);
            }
            Err(e) => log::error!("Unable to serialize report. error={}", e),
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::instrument::TimingSummary;

    fn data(done: bool) -> ReportData {
        ReportData {
            backend: "trie",
            unique_states: 16,
            initial_states: 1,
            pending: 0,
            expanded: 16,
            transitions: 48,
            rejected: 2,
            truncated: 0,
            summary: Summary {
                lookups: TimingSummary {
                    count: 49,
                    total: Duration::from_micros(49),
                    mean: Duration::from_micros(1),
                },
                hits: 33,
                misses: 16,
                inserts: TimingSummary::default(),
            },
            index_bytes: 4096,
            duration: Duration::from_secs(2),
            done,
        }
    }

    #[test]
    fn writes_progress_and_completion() {
        let mut written: Vec<u8> = Vec::new();
        let mut reporter = WriteReporter::new(&mut written);
        reporter.report_exploration(&data(false));
        reporter.report_exploration(&data(true));
        assert_eq!(
            String::from_utf8(written).unwrap(),
            "Exploring. backend=trie, unique=16, pending=0, expanded=16\n\
             Done. backend=trie, unique=16, pending=0, expanded=16, transitions=48, rejected=2, truncated=0, index_bytes=4096, sec=2\n\
             Lookups. count=49, hits=33, misses=16, mean=1µs\n\
             Inserts. count=0, mean=0ns\n"
        );
    }

    #[test]
    fn writes_json_lines() {
        let mut written: Vec<u8> = Vec::new();
        JsonReporter::new(&mut written).report_exploration(&data(true));
        let json: serde_json::Value = serde_json::from_slice(&written).unwrap();
        assert_eq!(json["backend"], "trie");
        assert_eq!(json["unique_states"], 16);
        assert_eq!(json["summary"]["misses"], 16);
        assert_eq!(json["index_bytes"], 4096);
        assert_eq!(json["done"], true);
        assert_eq!(written.last(), Some(&b'\n'));
    }
}
