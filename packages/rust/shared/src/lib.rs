//! Shared types, error model, and configuration for singlehtml.
//!
//! This crate is the foundation depended on by all other singlehtml crates.
//! It provides:
//! - [`SingleHtmlError`] — the unified error type
//! - Domain types ([`MenuEntry`], [`MenuLevel`], [`ConsolidateReport`])
//! - Configuration ([`AppConfig`], [`FetchConfig`], [`PollConfig`], config loading)

pub mod config;
pub mod error;
pub mod types;

// Re-export public API at crate root for ergonomic imports.
pub use config::{
    AppConfig, BatchConfig, FetchConfig, PollConfig, RenderConfig, config_dir, config_file_path,
    init_config, load_config, load_config_from,
};
pub use error::{Result, SingleHtmlError};
pub use types::{ATTRIBUTION, ConsolidateReport, MenuEntry, MenuLevel};
