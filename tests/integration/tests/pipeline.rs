//! End-to-end tests for the analysis pipeline
//!
//! Fake `javac` and PMD scripts stand in for the real tools, so these run
//! without a JDK.

#![cfg(unix)]

use std::fs;
use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;
use std::time::{Duration, Instant};

use javalint_core::{
    AnalysisConfig, AnalysisError, AnalysisReport, Pipeline, Severity, ToolKind, ToolStatus,
    analyze,
};
use pretty_assertions::assert_eq;
use tempfile::TempDir;

const FAKE_JAVAC: &str = r#"#!/bin/sh
for last in "$@"; do :; done
cat >&2 <<END
$last:5: warning: [rawtypes] found raw type: List
        List names = null;
        ^
  missing type arguments for generic class List<E>
1 warning
END
exit 0
"#;

const FAKE_PMD: &str = r#"#!/bin/sh
printf '%s:3\tAvoid unused imports such as java.util.Map\n' "$2"
printf '%s:5\tAvoid unused local variables such as names\n' "$2"
exit 4
"#;

const CRASHING_TOOL: &str = r#"#!/bin/sh
echo "Exception in thread main" >&2
exit 3
"#;

const SLOW_TOOL: &str = "#!/bin/sh\nexec sleep 5\n";

const QUIET_TOOL: &str = "#!/bin/sh\nexit 0\n";

const SECOND_LONG_TOOL: &str = "#!/bin/sh\nsleep 1\nexit 0\n";

const MARKING_TOOL: &str = r#"#!/bin/sh
touch "$(dirname "$0")/spawned"
"#;

/// Fake tool scripts, all written before the first test spawns anything.
struct Tools {
    dir: TempDir,
}

impl Tools {
    fn path(&self, name: &str) -> PathBuf {
        self.dir.path().join(name)
    }

    fn program(&self, name: &str) -> String {
        self.path(name).to_string_lossy().into_owned()
    }
}

static TOOLS: LazyLock<Tools> = LazyLock::new(|| {
    let dir = tempfile::tempdir().unwrap();
    for (name, script) in [
        ("javac", FAKE_JAVAC),
        ("pmd", FAKE_PMD),
        ("crash", CRASHING_TOOL),
        ("slow", SLOW_TOOL),
        ("quiet", QUIET_TOOL),
        ("second", SECOND_LONG_TOOL),
        ("mark", MARKING_TOOL),
    ] {
        let path = dir.path().join(name);
        fs::write(&path, script).unwrap();
        fs::set_permissions(&path, fs::Permissions::from_mode(0o755)).unwrap();
    }
    Tools { dir }
});

const SOURCE: &str = "package demo;\n\
                      import java.util.List;\n\
                      import java.util.Map;\n\
                      public class Foo {\n        List names = null;\n\
                      }\n";

fn workspace() -> (TempDir, PathBuf) {
    let dir = tempfile::tempdir().unwrap();
    let file = dir.path().join("Foo.java");
    fs::write(&file, SOURCE).unwrap();
    (dir, file)
}

fn config(javac: &str, pmd: &str, output_dir: &Path) -> AnalysisConfig {
    let mut config = AnalysisConfig::default();
    config.compiler.program = TOOLS.program(javac);
    config.compiler.output_dir = output_dir.to_path_buf();
    config.rules.program = TOOLS.program(pmd);
    config.rules.rules = vec!["basic".to_string(), "unusedcode".to_string()];
    config
}

fn summary(report: &AnalysisReport) -> Vec<(u32, Severity, String)> {
    report
        .diagnostics
        .iter()
        .map(|d| (d.line(), d.severity(), d.message().to_string()))
        .collect()
}

#[test]
fn merges_both_tools_by_line() {
    let (dir, file) = workspace();

    let report = analyze(&file, &config("javac", "pmd", dir.path())).unwrap();

    assert_eq!(
        summary(&report),
        vec![
            (
                3,
                Severity::Warning,
                "Avoid unused imports such as java.util.Map".to_string()
            ),
            (
                5,
                Severity::Warning,
                "found raw type: List; missing type arguments for generic class List<E>"
                    .to_string()
            ),
            (
                5,
                Severity::Warning,
                "Avoid unused local variables such as names".to_string()
            ),
        ]
    );
    assert_eq!(report.diagnostics[1].column(), 8);
    assert_eq!(report.diagnostics[2].column(), 0);
    assert!(report.outcomes.iter().all(|o| o.status.is_completed()));
    assert!(!report.passed());
}

#[test]
fn rows_show_source_text() {
    let (dir, file) = workspace();

    let report = analyze(&file, &config("javac", "pmd", dir.path())).unwrap();

    assert_eq!(report.rows.len(), 3);
    assert!(report.rows[0].starts_with("    3: import java.util.Map;"));
    assert!(report.rows[0].ends_with("Avoid unused imports such as java.util.Map"));
    assert!(report.rows[1].starts_with("    5:         List names = null;"));

    let rendered = report.render();
    assert!(rendered.starts_with(&format!("{}:\n\n", file.display())));
    assert!(!rendered.contains("-- pass --"));
}

#[test]
fn missing_tool_keeps_other_results() {
    let (dir, file) = workspace();
    let mut config = config("javac", "pmd", dir.path());
    config.compiler.program = "/nonexistent/javalint/javac".to_string();

    let report = analyze(&file, &config).unwrap();

    assert_eq!(
        report.diagnostics.iter().map(|d| d.line()).collect::<Vec<_>>(),
        vec![3, 5]
    );
    assert!(matches!(
        report.outcomes[0].status,
        ToolStatus::Unavailable { .. }
    ));
    assert_eq!(report.outcomes[1].tool, ToolKind::RuleLint);
    assert!(report.outcomes[1].status.is_completed());
}

#[test]
fn crashing_tool_contributes_nothing() {
    let (dir, file) = workspace();

    let report = analyze(&file, &config("crash", "pmd", dir.path())).unwrap();

    assert_eq!(report.diagnostics.len(), 2);
    assert!(matches!(
        report.outcomes[0].status,
        ToolStatus::Crashed { .. }
    ));
}

#[test]
fn slow_tool_times_out() {
    let (dir, file) = workspace();
    let mut config = config("slow", "pmd", dir.path());
    config.timeout = Some(Duration::from_millis(300));

    let report = analyze(&file, &config).unwrap();

    assert_eq!(report.outcomes[0].tool, ToolKind::CompilerLint);
    assert_eq!(report.outcomes[0].status, ToolStatus::TimedOut);
    assert_eq!(report.diagnostics.len(), 2);
}

#[test]
fn tools_run_concurrently() {
    let (dir, file) = workspace();
    let config = config("second", "second", dir.path());

    let started = Instant::now();
    let report = analyze(&file, &config).unwrap();
    let elapsed = started.elapsed();

    assert_eq!(report.outcomes.len(), 2);
    assert!(report.outcomes.iter().all(|o| o.status.is_completed()));
    assert!(
        elapsed < Duration::from_millis(1800),
        "two one-second tools took {:?}",
        elapsed
    );
}

#[test]
fn config_error_spawns_nothing() {
    let (dir, file) = workspace();
    let mut config = config("mark", "pmd", dir.path());
    config.rules.rules.clear();

    let err = analyze(&file, &config).unwrap_err();

    assert!(matches!(err, AnalysisError::Config(_)));
    assert!(!TOOLS.path("spawned").exists());
}

#[test]
fn clean_file_passes() {
    let (dir, file) = workspace();
    let mut config = config("quiet", "pmd", dir.path());
    config.rules.enabled = false;

    let report = analyze(&file, &config).unwrap();

    assert!(report.passed());
    assert_eq!(report.outcomes.len(), 1);
    assert!(report.render().ends_with("       -- pass -- \n"));
}

#[test]
fn pipeline_runs_are_independent() {
    let (dir, file) = workspace();
    let config = config("javac", "pmd", dir.path());
    let pipeline = Pipeline::new();

    let first = pipeline.analyze(&file, &config).unwrap();
    let second = pipeline.analyze(&file, &config).unwrap();

    assert_eq!(first.diagnostics, second.diagnostics);
    assert_eq!(second.diagnostics.len(), 3);
}

#[test]
fn overlapping_runs_on_one_file() {
    let (dir, file) = workspace();
    let config = config("javac", "pmd", dir.path());
    let pipeline = Pipeline::new();

    let reports: Vec<_> = std::thread::scope(|scope| {
        let handles: Vec<_> = (0..3)
            .map(|_| scope.spawn(|| pipeline.analyze(&file, &config).unwrap()))
            .collect();
        handles.into_iter().map(|h| h.join().unwrap()).collect()
    });

    for report in reports {
        assert_eq!(report.diagnostics.len(), 3);
    }
}
