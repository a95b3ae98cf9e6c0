//! Latency samples for every identity index operation performed during a run.
//!
//! Recording only appends. [`Instrumentation::summary`] computes totals and means once, at the
//! end of a run, and the TSV writers export raw samples for external plotting.

use serde::{Deserialize, Serialize};
use std::io::{self, Write};
use std::time::Duration;

/// One membership query.
#[derive(Clone, Copy, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct LookupSample {
    pub duration: Duration,
    /// Index size when the query was issued.
    pub index_size: usize,
    /// Whether the state was already present.
    pub hit: bool,
}

/// One insertion of a previously unseen state.
#[derive(Clone, Copy, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct InsertSample {
    pub duration: Duration,
    /// Index size after the insertion.
    pub index_size: usize,
}

/// Ordered lookup and insert samples.
#[derive(Clone, Debug, Default, Deserialize, PartialEq, Serialize)]
pub struct Instrumentation {
    lookups: Vec<LookupSample>,
    inserts: Vec<InsertSample>,
}

impl Instrumentation {
    pub fn new() -> Self {
        Default::default()
    }

    pub fn record_lookup(&mut self, duration: Duration, index_size: usize, hit: bool) {
        self.lookups.push(LookupSample {
            duration,
            index_size,
            hit,
        });
    }

    pub fn record_insert(&mut self, duration: Duration, index_size: usize) {
        self.inserts.push(InsertSample {
            duration,
            index_size,
        });
    }

    pub fn lookups(&self) -> &[LookupSample] {
        &self.lookups
    }

    pub fn inserts(&self) -> &[InsertSample] {
        &self.inserts
    }

    pub fn summary(&self) -> Summary {
        let hits = self.lookups.iter().filter(|s| s.hit).count();
        Summary {
            lookups: TimingSummary::of(self.lookups.iter().map(|s| s.duration)),
            hits,
            misses: self.lookups.len() - hits,
            inserts: TimingSummary::of(self.inserts.iter().map(|s| s.duration)),
        }
    }

    /// Writes `duration_secs\tindex_size\thit` rows, one per lookup, preceded by a header.
    pub fn write_lookups_tsv(&self, w: &mut impl Write) -> io::Result<()> {
        writeln!(w, "duration\tsetSize\twasInSet")?;
        for s in &self.lookups {
            writeln!(
                w,
                "{:.15}\t{}\t{}",
                s.duration.as_secs_f64(),
                s.index_size,
                s.hit as u8
            )?;
        }
        Ok(())
    }

    /// Writes `duration_secs\tindex_size` rows, one per insert, preceded by a header.
    pub fn write_inserts_tsv(&self, w: &mut impl Write) -> io::Result<()> {
        writeln!(w, "duration\tsetSize")?;
        for s in &self.inserts {
            writeln!(w, "{:.15}\t{}", s.duration.as_secs_f64(), s.index_size)?;
        }
        Ok(())
    }
}

/// Aggregate over one kind of sample.
#[derive(Clone, Copy, Debug, Default, Deserialize, Eq, PartialEq, Serialize)]
pub struct TimingSummary {
    pub count: usize,
    pub total: Duration,
    /// Zero when there are no samples.
    pub mean: Duration,
}

impl TimingSummary {
    pub fn of(durations: impl IntoIterator<Item = Duration>) -> Self {
        let (count, total) = durations
            .into_iter()
            .fold((0usize, Duration::ZERO), |(n, t), d| (n + 1, t + d));
        let mean = match u32::try_from(count) {
            Ok(0) => Duration::ZERO,
            Ok(n) => total / n,
            Err(_) => Duration::from_secs_f64(total.as_secs_f64() / count as f64),
        };
        TimingSummary { count, total, mean }
    }
}

/// Summary statistics over all samples of a run.
#[derive(Clone, Copy, Debug, Default, Deserialize, Eq, PartialEq, Serialize)]
pub struct Summary {
    pub lookups: TimingSummary,
    pub hits: usize,
    pub misses: usize,
    pub inserts: TimingSummary,
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn summarizes_samples() {
        let mut instrumentation = Instrumentation::new();
        instrumentation.record_lookup(Duration::from_micros(3), 0, false);
        instrumentation.record_insert(Duration::from_micros(10), 1);
        instrumentation.record_lookup(Duration::from_micros(5), 1, true);
        instrumentation.record_lookup(Duration::from_micros(4), 1, false);
        instrumentation.record_insert(Duration::from_micros(20), 2);

        let summary = instrumentation.summary();
        assert_eq!(summary.hits, 1);
        assert_eq!(summary.misses, 2);
        assert_eq!(
            summary.lookups,
            TimingSummary {
                count: 3,
                total: Duration::from_micros(12),
                mean: Duration::from_micros(4),
            }
        );
        assert_eq!(summary.inserts.count, 2);
        assert_eq!(summary.inserts.mean, Duration::from_micros(15));
        assert_eq!(instrumentation.inserts()[1].index_size, 2);
    }

    #[test]
    fn empty_summary_has_zero_means() {
        assert_eq!(Instrumentation::new().summary(), Summary::default());
    }

    #[test]
    fn exports_tab_separated_rows() {
        let mut instrumentation = Instrumentation::new();
        instrumentation.record_lookup(Duration::from_millis(250), 7, true);
        instrumentation.record_insert(Duration::from_secs(1), 8);

        let mut lookups = Vec::new();
        instrumentation.write_lookups_tsv(&mut lookups).unwrap();
        assert_eq!(
            String::from_utf8(lookups).unwrap(),
            "duration\tsetSize\twasInSet\n0.250000000000000\t7\t1\n"
        );
        let mut inserts = Vec::new();
        instrumentation.write_inserts_tsv(&mut inserts).unwrap();
        assert_eq!(
            String::from_utf8(inserts).unwrap(),
            "duration\tsetSize\n1.000000000000000\t8\n"
        );
    }

    #[test]
    fn serializes_samples() {
        let mut instrumentation = Instrumentation::new();
        instrumentation.record_lookup(Duration::from_nanos(42), 0, false);
        let json = serde_json::to_value(&instrumentation).unwrap();
        assert_eq!(json["lookups"][0]["index_size"], 0);
        assert_eq!(json["lookups"][0]["hit"], false);
        assert_eq!(json["lookups"][0]["duration"]["nanos"], 42);
    }
}
