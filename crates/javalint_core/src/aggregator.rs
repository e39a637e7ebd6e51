//! Collection of diagnostics produced by concurrently running tools.
//!
//! Runners never share a lock: each one holds an [`AggregatorSink`] and sends
//! its diagnostics over a channel. The coordinator owns the
//! [`ResultAggregator`] and drains it once every runner has been joined.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use crossbeam_channel::{Receiver, Sender};
use tracing::debug;

use crate::Diagnostic;

/// Diagnostics sent by one runner for one file.
#[derive(Debug)]
struct Batch {
    origin: usize,
    file: PathBuf,
    diagnostics: Vec<Diagnostic>,
}

/// Cloneable handle used by runner threads to submit diagnostics.
#[derive(Debug, Clone)]
pub struct AggregatorSink {
    origin: usize,
    tx: Sender<Batch>,
}

impl AggregatorSink {
    /// Identifies the runner this sink belongs to.
    pub fn origin(&self) -> usize {
        self.origin
    }

    /// Appends a single diagnostic for `file`.
    pub fn append(&self, file: impl Into<PathBuf>, diagnostic: Diagnostic) {
        self.extend(file, vec![diagnostic]);
    }

    /// Appends a batch of diagnostics for `file`, keeping their order.
    pub fn extend(&self, file: impl Into<PathBuf>, diagnostics: Vec<Diagnostic>) {
        if diagnostics.is_empty() {
            return;
        }
        let batch = Batch {
            origin: self.origin,
            file: file.into(),
            diagnostics,
        };
        if self.tx.send(batch).is_err() {
            debug!("Aggregator dropped before runner {} finished", self.origin);
        }
    }
}

/// Per-run collection of diagnostics keyed by absolute file path.
///
/// Create one per run; nothing is carried over between runs.
pub struct ResultAggregator {
    tx: Sender<Batch>,
    rx: Receiver<Batch>,
    entries: HashMap<PathBuf, Vec<Diagnostic>>,
}

impl ResultAggregator {
    pub fn new() -> Self {
        let (tx, rx) = crossbeam_channel::unbounded();
        Self {
            tx,
            rx,
            entries: HashMap::new(),
        }
    }

    /// Returns a sink for the runner identified by `origin`.
    ///
    /// When batches are merged, lower origins come first; within one origin
    /// the send order is kept.
    pub fn sink(&self, origin: usize) -> AggregatorSink {
        AggregatorSink {
            origin,
            tx: self.tx.clone(),
        }
    }

    /// Moves every batch received so far into the per-file map.
    fn collect_pending(&mut self) {
        let mut batches: Vec<Batch> = self.rx.try_iter().collect();
        batches.sort_by_key(|batch| batch.origin);
        for batch in batches {
            self.entries
                .entry(batch.file)
                .or_default()
                .extend(batch.diagnostics);
        }
    }

    /// Files that received at least one diagnostic.
    pub fn files(&mut self) -> Vec<PathBuf> {
        self.collect_pending();
        let mut files: Vec<PathBuf> = self.entries.keys().cloned().collect();
        files.sort();
        files
    }

    /// Removes and returns the diagnostics for `file`, sorted by line.
    ///
    /// The sort is stable: diagnostics on the same line keep their merge
    /// order. Call this only after every runner has finished.
    pub fn drain_sorted(&mut self, file: &Path) -> Vec<Diagnostic> {
        self.collect_pending();
        let mut diagnostics = self.entries.remove(file).unwrap_or_default();
        diagnostics.sort_by_key(Diagnostic::line);
        diagnostics
    }
}

impl Default for ResultAggregator {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::thread;

    const FILE: &str = "/work/Foo.java";

    fn lines(diagnostics: &[Diagnostic]) -> Vec<u32> {
        diagnostics.iter().map(Diagnostic::line).collect()
    }

    #[test]
    fn test_drain_sorted_orders_by_line() {
        let mut aggregator = ResultAggregator::new();
        let sink = aggregator.sink(0);
        for line in [12, 3, 40, 1] {
            sink.append(FILE, Diagnostic::warning("w", line, FILE));
        }

        let drained = aggregator.drain_sorted(Path::new(FILE));
        assert_eq!(lines(&drained), vec![1, 3, 12, 40]);
    }

    #[test]
    fn test_drain_sorted_is_stable_for_equal_lines() {
        let mut aggregator = ResultAggregator::new();
        let sink = aggregator.sink(0);
        sink.extend(
            FILE,
            vec![
                Diagnostic::warning("b", 5, FILE),
                Diagnostic::warning("a", 2, FILE),
                Diagnostic::warning("c", 5, FILE),
            ],
        );
        sink.append(FILE, Diagnostic::warning("d", 5, FILE));

        let drained = aggregator.drain_sorted(Path::new(FILE));
        let messages: Vec<&str> = drained.iter().map(Diagnostic::message).collect();
        assert_eq!(messages, vec!["a", "b", "c", "d"]);
    }

    #[test]
    fn test_lower_origin_first_on_equal_lines() {
        let mut aggregator = ResultAggregator::new();
        let rules = aggregator.sink(1);
        let compiler = aggregator.sink(0);
        rules.append(FILE, Diagnostic::warning("from rules", 7, FILE));
        compiler.append(FILE, Diagnostic::warning("from compiler", 7, FILE));

        let drained = aggregator.drain_sorted(Path::new(FILE));
        assert_eq!(drained[0].message(), "from compiler");
        assert_eq!(drained[1].message(), "from rules");
    }

    #[test]
    fn test_concurrent_appends() {
        let mut aggregator = ResultAggregator::new();

        thread::scope(|scope| {
            for origin in 0..4 {
                let sink = aggregator.sink(origin);
                scope.spawn(move || {
                    for line in (1..=50).rev() {
                        sink.append(FILE, Diagnostic::warning("w", line, FILE));
                    }
                });
            }
        });

        let drained = aggregator.drain_sorted(Path::new(FILE));
        assert_eq!(drained.len(), 200);
        assert!(drained.windows(2).all(|w| w[0].line() <= w[1].line()));
    }

    #[test]
    fn test_files_are_kept_apart() {
        let mut aggregator = ResultAggregator::new();
        let sink = aggregator.sink(0);
        sink.append(FILE, Diagnostic::warning("w", 1, FILE));
        sink.append("/work/Bar.java", Diagnostic::warning("w", 1, "/work/Bar.java"));

        assert_eq!(
            aggregator.files(),
            vec![PathBuf::from("/work/Bar.java"), PathBuf::from(FILE)]
        );
        assert_eq!(aggregator.drain_sorted(Path::new(FILE)).len(), 1);
        assert!(aggregator.drain_sorted(Path::new(FILE)).is_empty());
    }

    #[test]
    fn test_empty_batches_are_ignored() {
        let mut aggregator = ResultAggregator::new();
        aggregator.sink(0).extend(FILE, Vec::new());
        assert!(aggregator.files().is_empty());
    }
}
