//! Batch driver: crawl, then fan the file set across a bounded worker
//! pool. Each file runs all four lenses and aggregates independently;
//! one file's failure never touches another's result.

use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::aggregate::{aggregate, ScanResult};
use crate::discovery::{crawl, resolve_ignores, CrawlOptions};
use crate::error::{Result, ScanError};
use crate::kb::KnowledgeBase;
use crate::lens::spec::ApiSpec;
use crate::lens::{all_lenses, FileContext, Lens, Severity};

/// A file that could not be analyzed, recorded in the batch instead of
/// aborting it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FileError {
    pub file: PathBuf,
    pub message: String,
}

/// The whole batch outcome, the unit the upload path persists.
#[derive(Debug, Serialize)]
pub struct BatchReport {
    pub scan_id: Uuid,
    pub started_at: DateTime<Utc>,
    pub root: PathBuf,
    pub results: Vec<ScanResult>,
    pub errors: Vec<FileError>,
}

impl BatchReport {
    pub fn total_findings(&self) -> usize {
        self.results.iter().map(|r| r.issues.len()).sum()
    }

    pub fn highest_severity(&self) -> Option<Severity> {
        self.results
            .iter()
            .flat_map(|r| r.issues.iter())
            .map(|f| f.severity)
            .max()
    }
}

/// Tunables for one analyzer instance.
#[derive(Debug, Clone, Default)]
pub struct AnalyzerOptions {
    /// Include globs; empty means the crawler default.
    pub include: Vec<String>,
    /// Extension allow-list override; empty means the crawler default.
    pub extensions: Vec<String>,
    /// Ignore patterns merged on top of defaults and ignore files.
    pub extra_ignores: Vec<String>,
    /// Worker pool size; `None` uses the global pool.
    pub jobs: Option<usize>,
}

/// The pipeline owner: one knowledge base, one lens set, many files.
pub struct Analyzer {
    kb: KnowledgeBase,
    lenses: Vec<Box<dyn Lens>>,
    options: AnalyzerOptions,
}

impl Analyzer {
    pub fn new(kb: KnowledgeBase, options: AnalyzerOptions) -> Self {
        Self {
            kb,
            lenses: all_lenses(),
            options,
        }
    }

    /// Crawl `root` and analyze every discovered file. The only hard
    /// error is a root that cannot be crawled at all.
    pub fn scan(&self, root: &Path) -> Result<BatchReport> {
        let started_at = Utc::now();
        let ignores = resolve_ignores(root, &self.options.extra_ignores);

        let mut crawl_options = CrawlOptions::default();
        if !self.options.include.is_empty() {
            crawl_options.include = self.options.include.clone();
        }
        if !self.options.extensions.is_empty() {
            crawl_options.extensions = self.options.extensions.clone();
        }

        let files = crawl(root, &ignores, &crawl_options)?;
        let api_spec = ApiSpec::load(root);
        tracing::info!(
            root = %root.display(),
            files = files.len(),
            spec_lens = api_spec.is_some(),
            "starting scan"
        );

        let outcomes = match self.options.jobs {
            Some(jobs) => rayon::ThreadPoolBuilder::new()
                .num_threads(jobs)
                .build()
                .map_err(|e| ScanError::Internal(e.to_string()))?
                .install(|| self.run_files(root, &files, api_spec.as_ref())),
            None => self.run_files(root, &files, api_spec.as_ref()),
        };

        let mut results = Vec::new();
        let mut errors = Vec::new();
        for outcome in outcomes {
            match outcome {
                Ok(result) => results.push(result),
                Err(error) => errors.push(error),
            }
        }

        Ok(BatchReport {
            scan_id: Uuid::new_v4(),
            started_at,
            root: root.to_path_buf(),
            results,
            errors,
        })
    }

    fn run_files(
        &self,
        root: &Path,
        files: &[PathBuf],
        api_spec: Option<&ApiSpec>,
    ) -> Vec<std::result::Result<ScanResult, FileError>> {
        files
            .par_iter()
            .map(|path| self.scan_file(root, path, api_spec))
            .collect()
    }

    /// Analyze one file. Read failures become a `FileError`; lenses
    /// themselves degrade internally and do not fail.
    fn scan_file(
        &self,
        root: &Path,
        path: &Path,
        api_spec: Option<&ApiSpec>,
    ) -> std::result::Result<ScanResult, FileError> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            tracing::warn!(file = %path.display(), error = %e, "cannot read file, recording error");
            FileError {
                file: path.to_path_buf(),
                message: e.to_string(),
            }
        })?;

        let ctx = FileContext {
            path,
            content: &content,
            root,
            kb: &self.kb,
            api_spec,
        };

        let outputs = self
            .lenses
            .iter()
            .map(|lens| (lens.kind(), lens.inspect(&ctx)))
            .collect();

        Ok(aggregate(path, &content, outputs))
    }
}
