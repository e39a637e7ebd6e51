//! Init command implementation
//!
//! Writes a project `.javalint.jsonc`, optionally pre-filled with the PMD
//! installation and rule sets. Paths are stored relative to the project
//! directory when they live under it, matching how settings files are read.

use std::ffi::OsStr;
use std::fs::{self, OpenOptions};
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};

use javalint_core::absolutize;
use miette::{IntoDiagnostic, Result};
use serde_json::{Value, json};
use tracing::{info, warn};

use crate::cli::InitArgs;
use crate::settings::Settings;

const DEFAULT_RULES: &[&str] = &["basic", "unusedcode", "imports"];

/// One setting in the generated file and the comment lines above it.
struct Field {
    comments: Vec<String>,
    key: &'static str,
    value: Value,
}

impl Field {
    fn new(comment: &str, key: &'static str, value: Value) -> Self {
        Self {
            comments: vec![comment.to_string()],
            key,
            value,
        }
    }
}

pub fn run_init(args: &InitArgs) -> Result<()> {
    let cwd = std::env::current_dir().into_diagnostic()?;
    let dir = absolutize(&cwd, &args.dir);
    if !dir.is_dir() {
        return Err(miette::miette!("Not a directory: {}", dir.display()));
    }

    let fields = template_fields(args, &cwd, &dir);
    let settings_path = dir.join(Settings::CONFIG_FILES[0]);
    write_settings(&settings_path, &render_settings(&fields), args.force)?;

    info!("Wrote {}", settings_path.display());
    Ok(())
}

fn template_fields(args: &InitArgs, cwd: &Path, dir: &Path) -> Vec<Field> {
    let mut fields = vec![
        Field::new(
            "Compile with `javac -Xlint` and report its errors and warnings",
            "do_xlint",
            json!(true),
        ),
        Field::new("Run PMD", "do_pmd", json!(true)),
        Field::new(
            "Classpath for javac; relative entries are resolved from this file",
            "java_classpath",
            json!(["."]),
        ),
    ];
    let mut hints = Vec::new();

    match &args.pmd_lib_dir {
        Some(lib_dir) => {
            let lib_dir = absolutize(cwd, lib_dir);
            if !has_jars(&lib_dir) {
                warn!("No PMD jars found in {}", lib_dir.display());
            }
            fields.push(Field::new(
                "Directory holding the PMD jars",
                "pmd_lib_dir",
                path_value(dir, &lib_dir),
            ));
        }
        None => hints.push(r#""pmd_lib_dir": "tools/pmd/lib","#.to_string()),
    }

    match &args.ruleset {
        Some(ruleset) => {
            let ruleset = absolutize(cwd, ruleset);
            if !ruleset.is_file() {
                warn!("Ruleset {} does not exist", ruleset.display());
            }
            fields.push(Field::new(
                "Ruleset file; takes precedence over `rules`",
                "ruleset_path",
                path_value(dir, &ruleset),
            ));
        }
        None => hints.push(r#""ruleset_path": "config/pmd-ruleset.xml","#.to_string()),
    }

    let rules = match &args.rules {
        Some(rules) => rules.clone(),
        None => DEFAULT_RULES.iter().map(|r| r.to_string()).collect(),
    };
    let mut rules_field = Field::new(
        "Built-in PMD rule sets, each read as rulesets/java/<name>.xml",
        "rules",
        json!(rules),
    );
    if !hints.is_empty() {
        let mut comments = vec!["Optional:".to_string()];
        comments.extend(hints);
        comments.append(&mut rules_field.comments);
        rules_field.comments = comments;
    }
    fields.push(rules_field);

    fields
}

fn render_settings(fields: &[Field]) -> String {
    let body = fields
        .iter()
        .map(|field| {
            let mut text = String::new();
            for comment in &field.comments {
                text.push_str(&format!("  // {}\n", comment));
            }
            text.push_str(&format!("  {}: {}", Value::from(field.key), field.value));
            text
        })
        .collect::<Vec<_>>()
        .join(",\n\n");
    format!("{{\n{}\n}}\n", body)
}

/// `path` relative to `dir` when it lies inside it, absolute otherwise.
fn path_value(dir: &Path, path: &Path) -> Value {
    let shown: PathBuf = match path.strip_prefix(dir) {
        Ok(relative) if !relative.as_os_str().is_empty() => relative.to_path_buf(),
        _ => path.to_path_buf(),
    };
    Value::from(shown.to_string_lossy().into_owned())
}

fn has_jars(dir: &Path) -> bool {
    fs::read_dir(dir)
        .map(|entries| {
            entries
                .filter_map(|entry| entry.ok())
                .any(|entry| entry.path().extension() == Some(OsStr::new("jar")))
        })
        .unwrap_or(false)
}

/// Creates `path` with `content`. An existing file (or symlink) is only
/// replaced with `force`, and never written through.
fn write_settings(path: &Path, content: &str, force: bool) -> Result<()> {
    match fs::symlink_metadata(path) {
        Ok(_) if !force => {
            return Err(miette::miette!(
                "{} already exists. Use --force to overwrite.",
                path.display()
            ));
        }
        Ok(_) => fs::remove_file(path).into_diagnostic()?,
        Err(e) if e.kind() == ErrorKind::NotFound => {}
        Err(e) => return Err(e).into_diagnostic(),
    }

    let mut options = OpenOptions::new();
    options.write(true).create_new(true);
    #[cfg(unix)]
    {
        use std::os::unix::fs::OpenOptionsExt;
        options.custom_flags(libc::O_NOFOLLOW);
    }

    let mut file = options
        .open(path)
        .map_err(|e| miette::miette!("Failed to create {}: {}", path.display(), e))?;
    file.write_all(content.as_bytes()).into_diagnostic()
}
