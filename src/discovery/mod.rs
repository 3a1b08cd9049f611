//! File discovery: layered ignore resolution + include-glob crawling.

pub mod crawler;
pub mod ignore;

pub use crawler::{crawl, CrawlOptions};
pub use ignore::resolve_ignores;
