//! HTML consolidation pipeline for singlehtml.
//!
//! This crate turns a rendered HTML document into a single self-contained
//! file and drives whole conversions:
//! - [`document`] — the mutable node arena every transform edits
//! - [`inline`] / [`menu`] / [`consolidate`] — the ordered transforms
//! - [`output`] — output directory precedence
//! - [`pipeline`] — one file: render, poll, consolidate, write
//! - [`batch`] — every Markdown file in a directory, concurrently

pub mod batch;
pub mod consolidate;
pub mod document;
pub mod inline;
pub mod menu;
pub mod output;
pub mod pipeline;

pub use batch::{BatchOutcome, convert_all, discover_markdown_files};
pub use consolidate::{ConsolidateOptions, consolidate};
pub use document::Document;
pub use output::{OutputResolver, output_file_name};
pub use pipeline::{
    ConversionOutcome, ConversionState, Converter, ProgressReporter, SilentProgress,
    poll_for_file, validate_source,
};
