//! Layered settings lookup.
//!
//! Project settings (`.javalint.jsonc` or `.javalint.json`, found by walking
//! up from the analyzed file) override the global settings file
//! (`<config dir>/javalint/settings.jsonc`), which overrides the built-in
//! defaults. Command-line flags sit on top of all of them.

use std::path::{Path, PathBuf};
use std::time::Duration;

use javalint_core::{
    AnalysisConfig, CompilerLintConfig, HighlightStyle, PresentationConfig, RuleLintConfig,
    absolutize,
};
use jsonc_parser::ParseOptions;
use miette::{IntoDiagnostic, Result};
use serde::Deserialize;
use tracing::debug;

/// One layer of settings. Unset fields fall through to the layer below.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Run `javac -Xlint`.
    pub do_xlint: Option<bool>,
    /// Run PMD.
    pub do_pmd: Option<bool>,
    /// Classpath used to compile the file.
    pub java_classpath: Option<Vec<PathBuf>>,
    pub javac: Option<String>,
    pub javac_args: Option<Vec<String>>,
    /// Java launcher used for PMD.
    pub java: Option<String>,
    /// Directory containing the PMD jars.
    pub pmd_lib_dir: Option<PathBuf>,
    pub pmd_classpath: Option<Vec<PathBuf>>,
    pub pmd_main_class: Option<String>,
    pub ruleset_path: Option<String>,
    pub rules: Option<Vec<String>>,
    pub timeout_secs: Option<u64>,
    pub highlight: Option<bool>,
    pub highlight_style: Option<HighlightStyle>,
    pub gutter_marks: Option<bool>,
    pub results_pane: Option<bool>,
}

impl Settings {
    /// Project settings file names, in lookup order.
    pub const CONFIG_FILES: &'static [&'static str] = &[".javalint.jsonc", ".javalint.json"];

    /// Parses settings from a JSON or JSONC string.
    pub fn from_jsonc(content: &str) -> Result<Self> {
        let value = jsonc_parser::parse_to_serde_value(content, &ParseOptions::default())
            .map_err(|e| miette::miette!("Failed to parse settings: {}", e))?;
        match value {
            Some(value) => serde_json::from_value(value)
                .map_err(|e| miette::miette!("Invalid settings: {}", e)),
            None => Ok(Self::default()),
        }
    }

    /// Loads a settings file. Relative paths inside it are taken relative to
    /// the file's directory.
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| miette::miette!("Failed to read {}: {}", path.display(), e))?;
        let settings = Self::from_jsonc(&content)?;
        let dir = path.parent().unwrap_or(Path::new("."));
        let cwd = std::env::current_dir().into_diagnostic()?;
        Ok(settings.rebase(&absolutize(&cwd, dir)))
    }

    /// Finds the nearest project settings file at or above `start`.
    pub fn discover(start: &Path) -> Option<PathBuf> {
        start.ancestors().find_map(|dir| {
            Self::CONFIG_FILES
                .iter()
                .map(|name| dir.join(name))
                .find(|candidate| candidate.is_file())
        })
    }

    /// Location of the global settings file.
    pub fn global_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("javalint").join("settings.jsonc"))
    }

    /// Loads the effective settings for `target`.
    ///
    /// With `explicit`, that file replaces project discovery. The global
    /// file is read when present.
    pub fn load_for(target: &Path, explicit: Option<&Path>) -> Result<Self> {
        let project = match explicit {
            Some(path) => Some(path.to_path_buf()),
            None => target.parent().and_then(Self::discover),
        };
        let project = match project {
            Some(path) => {
                debug!("Using project settings {}", path.display());
                Self::from_file(&path)?
            }
            None => Self::default(),
        };

        let global = match Self::global_path().filter(|p| p.is_file()) {
            Some(path) => {
                debug!("Using global settings {}", path.display());
                Self::from_file(&path)?
            }
            None => Self::default(),
        };

        Ok(project.layered_over(global))
    }

    /// Returns `self` with unset fields taken from `base`.
    pub fn layered_over(self, base: Settings) -> Settings {
        Settings {
            do_xlint: self.do_xlint.or(base.do_xlint),
            do_pmd: self.do_pmd.or(base.do_pmd),
            java_classpath: self.java_classpath.or(base.java_classpath),
            javac: self.javac.or(base.javac),
            javac_args: self.javac_args.or(base.javac_args),
            java: self.java.or(base.java),
            pmd_lib_dir: self.pmd_lib_dir.or(base.pmd_lib_dir),
            pmd_classpath: self.pmd_classpath.or(base.pmd_classpath),
            pmd_main_class: self.pmd_main_class.or(base.pmd_main_class),
            ruleset_path: self.ruleset_path.or(base.ruleset_path),
            rules: self.rules.or(base.rules),
            timeout_secs: self.timeout_secs.or(base.timeout_secs),
            highlight: self.highlight.or(base.highlight),
            highlight_style: self.highlight_style.or(base.highlight_style),
            gutter_marks: self.gutter_marks.or(base.gutter_marks),
            results_pane: self.results_pane.or(base.results_pane),
        }
    }

    fn rebase(mut self, dir: &Path) -> Self {
        let rebase_all =
            |paths: Vec<PathBuf>| paths.iter().map(|p| absolutize(dir, p)).collect::<Vec<_>>();
        self.java_classpath = self.java_classpath.map(rebase_all);
        self.pmd_classpath = self.pmd_classpath.map(rebase_all);
        self.pmd_lib_dir = self.pmd_lib_dir.map(|p| absolutize(dir, &p));
        self.ruleset_path = self.ruleset_path.map(|r| rebase_rulesets(dir, &r));
        self
    }

    /// Turns the settings into the pipeline's configuration. `output_dir`
    /// receives the compiler's class files.
    pub fn into_config(self, output_dir: PathBuf) -> AnalysisConfig {
        let compiler_defaults = CompilerLintConfig::default();
        let rule_defaults = RuleLintConfig::default();
        let presentation_defaults = PresentationConfig::default();

        AnalysisConfig {
            compiler: CompilerLintConfig {
                enabled: self.do_xlint.unwrap_or(true),
                program: self.javac.unwrap_or(compiler_defaults.program),
                classpath: self.java_classpath.unwrap_or_default(),
                output_dir,
                extra_args: self.javac_args.unwrap_or_default(),
            },
            rules: RuleLintConfig {
                enabled: self.do_pmd.unwrap_or(true),
                program: self.java.unwrap_or(rule_defaults.program),
                classpath: self.pmd_classpath.unwrap_or_default(),
                lib_dir: self.pmd_lib_dir,
                main_class: self.pmd_main_class.unwrap_or(rule_defaults.main_class),
                ruleset_path: self.ruleset_path,
                rules: self.rules.unwrap_or_default(),
            },
            timeout: self.timeout_secs.map(Duration::from_secs),
            presentation: PresentationConfig {
                highlight: self.highlight.unwrap_or(presentation_defaults.highlight),
                highlight_style: self
                    .highlight_style
                    .unwrap_or(presentation_defaults.highlight_style),
                gutter_marks: self.gutter_marks.unwrap_or(presentation_defaults.gutter_marks),
                results_pane: self.results_pane.unwrap_or(presentation_defaults.results_pane),
            },
        }
    }
}

/// Resolves the entries of a comma-separated ruleset locator against `dir`.
///
/// Only entries naming an existing file under `dir` change; classpath
/// resources such as `rulesets/java/basic.xml` are left for PMD to find.
pub fn rebase_rulesets(dir: &Path, rulesets: &str) -> String {
    rulesets
        .split(',')
        .map(|entry| {
            let entry = entry.trim();
            let candidate = absolutize(dir, Path::new(entry));
            if !entry.is_empty() && candidate.is_file() {
                candidate.to_string_lossy().into_owned()
            } else {
                entry.to_string()
            }
        })
        .collect::<Vec<_>>()
        .join(",")
}
