//! The lens set: four independent analysis strategies applied per file.
//!
//! Every lens consumes the same `FileContext` and produces `Finding`s on
//! its own; no lens sees another's output. The aggregator merges them.

pub mod behavioral;
pub mod finding;
pub mod infra;
pub mod spec;
pub mod syntax;

use std::path::Path;

pub use finding::{Finding, IssueKind, LensCounts, LensKind, Severity};

use self::spec::ApiSpec;
use crate::kb::KnowledgeBase;

/// Everything a lens may look at for one file.
pub struct FileContext<'a> {
    pub path: &'a Path,
    pub content: &'a str,
    pub root: &'a Path,
    pub kb: &'a KnowledgeBase,
    /// Parsed API specification, when one exists at the root.
    pub api_spec: Option<&'a ApiSpec>,
}

/// An independent analysis strategy. Lenses never fail a file: anything
/// unparseable degrades to fewer findings, not an error.
pub trait Lens: Send + Sync {
    fn kind(&self) -> LensKind;
    fn inspect(&self, ctx: &FileContext<'_>) -> Vec<Finding>;
}

/// All lenses, in the order their counts are reported.
pub fn all_lenses() -> Vec<Box<dyn Lens>> {
    vec![
        Box::new(syntax::SyntaxLens),
        Box::new(spec::SpecLens),
        Box::new(infra::InfraLens),
        Box::new(behavioral::BehavioralLens),
    ]
}
