//! External tool identities and command-line resolution.

use std::ffi::{OsStr, OsString};
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;

use serde::Serialize;

use crate::config::{CompilerLintConfig, RuleLintConfig};
use crate::parser::{CompilerLintParser, OutputParser, RuleLintParser};
use crate::{AnalysisConfig, AnalysisError};

/// The external analyzers the pipeline knows how to drive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub enum ToolKind {
    /// `javac -Xlint`.
    #[serde(rename = "xlint")]
    CompilerLint,
    /// PMD with the text renderer.
    #[serde(rename = "pmd")]
    RuleLint,
}

impl ToolKind {
    /// Every tool, in report order.
    pub const ALL: [ToolKind; 2] = [ToolKind::CompilerLint, ToolKind::RuleLint];

    pub fn name(&self) -> &'static str {
        match self {
            ToolKind::CompilerLint => "xlint",
            ToolKind::RuleLint => "pmd",
        }
    }

    /// Returns whether `config` turns this tool on.
    pub fn is_enabled(&self, config: &AnalysisConfig) -> bool {
        match self {
            ToolKind::CompilerLint => config.compiler.enabled,
            ToolKind::RuleLint => config.rules.enabled,
        }
    }

    /// Exit codes that accompany normal output.
    ///
    /// `javac` exits with 1 when it reports errors and PMD with 4 when it
    /// finds violations; anything else means the tool itself failed.
    pub fn is_expected_exit(&self, code: i32) -> bool {
        match self {
            ToolKind::CompilerLint => matches!(code, 0 | 1),
            ToolKind::RuleLint => matches!(code, 0 | 4),
        }
    }

    /// Creates the output parser for this tool.
    pub fn parser(&self, target: &Path, base_dir: &Path) -> Box<dyn OutputParser> {
        match self {
            ToolKind::CompilerLint => Box::new(CompilerLintParser::new(target, base_dir)),
            ToolKind::RuleLint => Box::new(RuleLintParser::new(target)),
        }
    }
}

impl fmt::Display for ToolKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A fully resolved process invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolCommand {
    pub program: OsString,
    pub args: Vec<OsString>,
    pub current_dir: Option<PathBuf>,
}

impl ToolCommand {
    pub fn new(program: impl Into<OsString>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
            current_dir: None,
        }
    }

    pub fn arg(mut self, arg: impl Into<OsString>) -> Self {
        self.args.push(arg.into());
        self
    }

    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<OsString>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    pub fn current_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.current_dir = Some(dir.into());
        self
    }

    pub(crate) fn to_command(&self) -> Command {
        let mut command = Command::new(&self.program);
        command.args(&self.args);
        if let Some(dir) = &self.current_dir {
            command.current_dir(dir);
        }
        command
    }
}

impl fmt::Display for ToolCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.program.to_string_lossy())?;
        for arg in &self.args {
            write!(f, " {}", arg.to_string_lossy())?;
        }
        Ok(())
    }
}

/// Resolves the command line for `kind` against an absolute `target`.
pub fn resolve_command(
    kind: ToolKind,
    config: &AnalysisConfig,
    target: &Path,
) -> Result<ToolCommand, AnalysisError> {
    match kind {
        ToolKind::CompilerLint => compiler_command(&config.compiler, target),
        ToolKind::RuleLint => rule_command(&config.rules, target),
    }
}

fn compiler_command(
    config: &CompilerLintConfig,
    target: &Path,
) -> Result<ToolCommand, AnalysisError> {
    let classpath = if config.classpath.is_empty() {
        OsString::from(".")
    } else {
        join_classpath(&config.classpath)?
    };

    Ok(ToolCommand::new(&config.program)
        .args(["-g", "-Xlint", "-classpath"])
        .arg(classpath)
        .arg("-d")
        .arg(config.output_dir.as_os_str())
        .args(&config.extra_args)
        .arg(target.as_os_str()))
}

fn rule_command(config: &RuleLintConfig, target: &Path) -> Result<ToolCommand, AnalysisError> {
    let rulesets = resolve_rulesets(config.ruleset_path.as_deref(), &config.rules)?;

    let mut entries = config.classpath.clone();
    if let Some(lib_dir) = &config.lib_dir {
        entries.extend(jars_in(lib_dir)?);
    }

    let mut command = ToolCommand::new(&config.program);
    if !entries.is_empty() {
        command = command.arg("-classpath").arg(join_classpath(&entries)?);
    }

    Ok(command
        .arg(&config.main_class)
        .arg(target.as_os_str())
        .arg("text")
        .arg(rulesets))
}

/// Picks the ruleset locator passed to PMD.
///
/// An explicit path wins; otherwise each named rule set expands to its
/// built-in locator `rulesets/java/<name>.xml`. Having neither is a
/// configuration error.
pub fn resolve_rulesets(
    ruleset_path: Option<&str>,
    rules: &[String],
) -> Result<String, AnalysisError> {
    if let Some(path) = ruleset_path.filter(|p| !p.trim().is_empty()) {
        return Ok(path.to_string());
    }

    let names: Vec<&str> = rules
        .iter()
        .map(|r| r.trim())
        .filter(|r| !r.is_empty())
        .collect();
    if names.is_empty() {
        return Err(AnalysisError::config(
            "no PMD ruleset configured: set `ruleset_path` or list `rules`",
        ));
    }

    Ok(names
        .iter()
        .map(|name| format!("rulesets/java/{}.xml", name))
        .collect::<Vec<_>>()
        .join(","))
}

/// Joins classpath entries with the platform path separator.
fn join_classpath(entries: &[PathBuf]) -> Result<OsString, AnalysisError> {
    std::env::join_paths(entries)
        .map_err(|e| AnalysisError::config(format!("Invalid classpath entry: {}", e)))
}

/// Lists the `*.jar` files directly inside `dir`, sorted by name.
fn jars_in(dir: &Path) -> Result<Vec<PathBuf>, AnalysisError> {
    let entries = fs::read_dir(dir).map_err(|e| {
        AnalysisError::config(format!(
            "Failed to read PMD lib directory {}: {}",
            dir.display(),
            e
        ))
    })?;

    let mut jars: Vec<PathBuf> = entries
        .filter_map(|entry| entry.ok())
        .map(|entry| entry.path())
        .filter(|path| path.is_file() && path.extension() == Some(OsStr::new("jar")))
        .collect();
    jars.sort();
    Ok(jars)
}
