//! Resolved analysis configuration.
//!
//! The pipeline receives fully resolved values; layering of project and
//! global settings happens in the host (see the `javalint` CLI).

use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Configuration for one analysis run.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct AnalysisConfig {
    /// `javac -Xlint` settings.
    pub compiler: CompilerLintConfig,
    /// PMD settings.
    pub rules: RuleLintConfig,
    /// Per-tool deadline. `None` waits for the tools indefinitely.
    pub timeout: Option<Duration>,
    /// Rendering preferences, carried through untouched for the host.
    pub presentation: PresentationConfig,
}

impl AnalysisConfig {
    /// Returns a configuration with every tool turned off.
    pub fn disabled() -> Self {
        let mut config = Self::default();
        config.compiler.enabled = false;
        config.rules.enabled = false;
        config
    }
}

/// Settings for the compiler lint pass.
#[derive(Debug, Clone, PartialEq)]
pub struct CompilerLintConfig {
    pub enabled: bool,
    /// Compiler executable.
    pub program: String,
    /// Classpath entries; `.` when empty.
    pub classpath: Vec<PathBuf>,
    /// Directory receiving class files (`-d`).
    pub output_dir: PathBuf,
    /// Extra arguments placed before the source file.
    pub extra_args: Vec<String>,
}

impl Default for CompilerLintConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            program: "javac".to_string(),
            classpath: Vec::new(),
            output_dir: std::env::temp_dir().join("javalint-classes"),
            extra_args: Vec::new(),
        }
    }
}

/// Settings for the rule checker (PMD).
#[derive(Debug, Clone, PartialEq)]
pub struct RuleLintConfig {
    pub enabled: bool,
    /// Java launcher used to start PMD.
    pub program: String,
    /// Explicit classpath entries.
    pub classpath: Vec<PathBuf>,
    /// Directory whose `*.jar` files are appended to the classpath.
    pub lib_dir: Option<PathBuf>,
    /// PMD entry point.
    pub main_class: String,
    /// Explicit ruleset locator; wins over `rules`.
    pub ruleset_path: Option<String>,
    /// Names of built-in Java rulesets, e.g. `basic` or `unusedcode`.
    pub rules: Vec<String>,
}

impl Default for RuleLintConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            program: "java".to_string(),
            classpath: Vec::new(),
            lib_dir: None,
            main_class: "net.sourceforge.pmd.PMD".to_string(),
            ruleset_path: None,
            rules: Vec::new(),
        }
    }
}

/// How highlighted regions are drawn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HighlightStyle {
    Fill,
    #[default]
    Outline,
    None,
}

/// Presentation flags consumed by the rendering layer only.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PresentationConfig {
    pub highlight: bool,
    pub highlight_style: HighlightStyle,
    pub gutter_marks: bool,
    pub results_pane: bool,
}

impl Default for PresentationConfig {
    fn default() -> Self {
        Self {
            highlight: true,
            highlight_style: HighlightStyle::Outline,
            gutter_marks: true,
            results_pane: true,
        }
    }
}
