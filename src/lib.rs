//! Lenscan — multi-lens static security analyzer for source trees.
//!
//! Crawls a directory, applies four independent lenses to each file
//! (syntax, specification, infrastructure, behavioral) and produces a
//! ranked, confidence-scored finding set per file.
//!
//! # Quick Start
//!
//! ```no_run
//! use std::path::Path;
//! use lenscan::{scan, ScanOptions};
//!
//! let options = ScanOptions::default();
//! let outcome = scan(Path::new("./my-service"), &options).unwrap();
//! println!("Pass: {}, Findings: {}", outcome.pass, outcome.batch.total_findings());
//! ```

pub mod aggregate;
pub mod config;
pub mod discovery;
pub mod driver;
pub mod error;
pub mod kb;
pub mod lens;

use std::path::Path;

use config::Config;
use driver::{Analyzer, BatchReport};
use error::Result;
use kb::KnowledgeBase;
use lens::Severity;

/// Options for a scan invocation.
#[derive(Debug, Clone, Default)]
pub struct ScanOptions {
    /// Path to config file (defaults to `.lenscan.toml` in the scan root).
    pub config_path: Option<std::path::PathBuf>,
    /// CLI override for the worker pool size.
    pub jobs_override: Option<usize>,
    /// CLI override for the fail_on threshold.
    pub fail_on_override: Option<Severity>,
}

/// A batch report plus the pass/fail decision against the configured
/// severity threshold.
#[derive(Debug)]
pub struct ScanOutcome {
    pub batch: BatchReport,
    pub pass: bool,
    pub fail_threshold: Severity,
}

/// Run a complete scan: load config, crawl, run all lenses, aggregate.
pub fn scan(root: &Path, options: &ScanOptions) -> Result<ScanOutcome> {
    let config_path = options
        .config_path
        .clone()
        .unwrap_or_else(|| root.join(".lenscan.toml"));
    let mut config = Config::load(&config_path)?;

    if let Some(fail_on) = options.fail_on_override {
        config.fail_on = fail_on;
    }
    let mut analyzer_options = config.analyzer_options();
    if let Some(jobs) = options.jobs_override {
        analyzer_options.jobs = Some(jobs);
    }

    let analyzer = Analyzer::new(KnowledgeBase::new(), analyzer_options);
    let batch = analyzer.scan(root)?;

    let pass = batch
        .highest_severity()
        .is_none_or(|worst| worst < config.fail_on);

    Ok(ScanOutcome {
        batch,
        pass,
        fail_threshold: config.fail_on,
    })
}
