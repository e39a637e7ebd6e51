//! Pipeline coordination: resolve tools, run them in parallel, merge, format.

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::thread;

use parking_lot::Mutex;
use tracing::{debug, info, warn};

use crate::aggregator::ResultAggregator;
use crate::paths::absolutize;
use crate::report::{AnalysisReport, format_row};
use crate::runner::{AnalyzerRunner, ToolOutcome, ToolStatus};
use crate::tool::{ToolCommand, ToolKind, resolve_command};
use crate::{AnalysisConfig, AnalysisError};

/// Runs the enabled analyzers against single files.
///
/// A `Pipeline` holds no diagnostics between runs. It only serializes runs
/// on the same file so that two overlapping requests (e.g. quick repeated
/// saves) do not interleave; runs on different files proceed in parallel.
pub struct Pipeline {
    file_locks: Mutex<HashMap<PathBuf, Arc<Mutex<()>>>>,
}

impl Pipeline {
    pub fn new() -> Self {
        Self {
            file_locks: Mutex::new(HashMap::new()),
        }
    }

    /// Analyzes `file` with every tool `config` enables.
    ///
    /// Configuration problems are returned before any process starts. Tool
    /// failures are not errors: they show up in
    /// [`AnalysisReport::outcomes`] and the tool contributes no diagnostics.
    pub fn analyze(
        &self,
        file: impl AsRef<Path>,
        config: &AnalysisConfig,
    ) -> Result<AnalysisReport, AnalysisError> {
        let cwd = std::env::current_dir()?;
        let target = absolutize(&cwd, file.as_ref());

        let lock = self.lock_for(&target);
        let result = {
            let _guard = lock.lock();
            run(&target, config)
        };
        self.release(&target, lock);

        result
    }

    fn lock_for(&self, target: &Path) -> Arc<Mutex<()>> {
        self.file_locks
            .lock()
            .entry(target.to_path_buf())
            .or_default()
            .clone()
    }

    /// Drops the entry for `target` once no other run holds it.
    fn release(&self, target: &Path, lock: Arc<Mutex<()>>) {
        let mut locks = self.file_locks.lock();
        drop(lock);
        if locks
            .get(target)
            .is_some_and(|entry| Arc::strong_count(entry) == 1)
        {
            locks.remove(target);
        }
    }

    #[cfg(test)]
    fn tracked_files(&self) -> usize {
        self.file_locks.lock().len()
    }
}

impl Default for Pipeline {
    fn default() -> Self {
        Self::new()
    }
}

/// Analyzes `file` with a one-off [`Pipeline`].
pub fn analyze(
    file: impl AsRef<Path>,
    config: &AnalysisConfig,
) -> Result<AnalysisReport, AnalysisError> {
    Pipeline::new().analyze(file, config)
}

fn run(target: &Path, config: &AnalysisConfig) -> Result<AnalysisReport, AnalysisError> {
    let commands = resolve_commands(target, config).inspect_err(|e| {
        warn!("Analysis of {} failed: {}", target.display(), e);
    })?;

    debug!(
        "Analysis of {} running with {} tool(s)",
        target.display(),
        commands.len()
    );

    let mut aggregator = ResultAggregator::new();
    let outcomes = thread::scope(|scope| {
        let handles: Vec<_> = commands
            .into_iter()
            .enumerate()
            .map(|(origin, (kind, command))| {
                let sink = aggregator.sink(origin);
                let runner = AnalyzerRunner::new(kind, command, target).with_timeout(config.timeout);
                (kind, scope.spawn(move || runner.run_into(&sink)))
            })
            .collect();

        handles
            .into_iter()
            .map(|(kind, handle)| {
                handle.join().unwrap_or_else(|_| ToolOutcome {
                    tool: kind,
                    status: ToolStatus::Crashed {
                        reason: "runner thread panicked".to_string(),
                    },
                })
            })
            .collect::<Vec<_>>()
    });

    let diagnostics = aggregator.drain_sorted(target);
    let source = read_source(target);
    let rows = diagnostics
        .iter()
        .map(|d| format_row(d, source_line(&source, d.line())))
        .collect();

    info!(
        "Analyzed {}: {} diagnostic(s)",
        target.display(),
        diagnostics.len()
    );

    Ok(AnalysisReport {
        file: target.to_path_buf(),
        diagnostics,
        rows,
        outcomes,
    })
}

/// Resolves every enabled tool up front, so a configuration error stops the
/// run before anything is spawned.
fn resolve_commands(
    target: &Path,
    config: &AnalysisConfig,
) -> Result<Vec<(ToolKind, ToolCommand)>, AnalysisError> {
    ToolKind::ALL
        .into_iter()
        .filter(|kind| kind.is_enabled(config))
        .map(|kind| resolve_command(kind, config, target).map(|command| (kind, command)))
        .collect()
}

fn read_source(path: &Path) -> String {
    match fs::read(path) {
        Ok(bytes) => String::from_utf8_lossy(&bytes).into_owned(),
        Err(e) => {
            warn!("Failed to read {}: {}", path.display(), e);
            String::new()
        }
    }
}

/// Text of 1-based `line`, empty when out of range.
fn source_line(source: &str, line: u32) -> &str {
    let Some(index) = (line as usize).checked_sub(1) else {
        return "";
    };
    source
        .lines()
        .nth(index)
        .map(|l| l.trim_end_matches('\r'))
        .unwrap_or("")
}
