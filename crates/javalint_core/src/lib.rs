//! # javalint_core
//!
//! Diagnostic pipeline for Java sources.
//!
//! This crate provides:
//! - Parsers for `javac -Xlint` and PMD text output
//! - A runner that streams a tool's output through its parser
//! - A channel-backed aggregator merging results from parallel runners
//! - The [`Pipeline`] tying them together into one ordered report
//!
//! ## Example
//!
//! ```rust,ignore
//! use javalint_core::{AnalysisConfig, analyze};
//!
//! let mut config = AnalysisConfig::default();
//! config.rules.rules = vec!["basic".to_string(), "unusedcode".to_string()];
//!
//! let report = analyze("src/Foo.java", &config)?;
//! print!("{}", report.render());
//! ```

mod aggregator;
mod config;
mod diagnostic;
mod error;
pub mod parser;
mod paths;
mod pipeline;
mod report;
mod runner;
pub mod tool;

pub use aggregator::{AggregatorSink, ResultAggregator};
pub use config::{
    AnalysisConfig, CompilerLintConfig, HighlightStyle, PresentationConfig, RuleLintConfig,
};
pub use diagnostic::{Diagnostic, NO_COLUMN, Severity};
pub use error::{AnalysisError, ToolError};
pub use parser::{CompilerLintParser, OutputParser, RuleLintParser};
pub use paths::absolutize;
pub use pipeline::{Pipeline, analyze};
pub use report::{AnalysisReport, PASS_MARKER, format_row, render_report};
pub use runner::{AnalyzerRunner, ToolOutcome, ToolStatus};
pub use tool::{ToolCommand, ToolKind};
