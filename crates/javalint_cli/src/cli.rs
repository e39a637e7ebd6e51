//! CLI argument definitions

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};

/// javalint - javac -Xlint and PMD in one report
#[derive(Parser)]
#[command(name = "javalint")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Settings file path (replaces project settings discovery)
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Analyze a Java source file
    Check(CheckArgs),

    /// Write a project settings file
    Init(InitArgs),
}

#[derive(Args)]
pub struct InitArgs {
    /// Project directory receiving `.javalint.jsonc`
    #[arg(default_value = ".")]
    pub dir: PathBuf,

    /// Replace an existing settings file
    #[arg(long)]
    pub force: bool,

    /// Directory holding the PMD jars
    #[arg(long, value_name = "DIR")]
    pub pmd_lib_dir: Option<PathBuf>,

    /// PMD ruleset file
    #[arg(long, value_name = "PATH")]
    pub ruleset: Option<PathBuf>,

    /// Built-in PMD rule sets, e.g. basic,unusedcode
    #[arg(long, value_delimiter = ',', value_name = "NAMES")]
    pub rules: Option<Vec<String>>,
}

#[derive(Args)]
pub struct CheckArgs {
    /// Java source file to analyze
    pub file: PathBuf,

    /// Output format
    #[arg(short, long, value_enum, default_value_t = OutputFormat::Text)]
    pub format: OutputFormat,

    /// Skip the javac -Xlint pass
    #[arg(long)]
    pub no_xlint: bool,

    /// Skip the PMD pass
    #[arg(long)]
    pub no_pmd: bool,

    /// PMD ruleset file (takes precedence over --rules)
    #[arg(long, value_name = "PATH")]
    pub ruleset: Option<String>,

    /// Built-in PMD rule sets, e.g. basic,unusedcode
    #[arg(long, value_delimiter = ',', value_name = "NAMES")]
    pub rules: Option<Vec<String>>,

    /// Kill a tool that runs longer than this many seconds
    #[arg(long, value_name = "SECS")]
    pub timeout: Option<u64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
}
