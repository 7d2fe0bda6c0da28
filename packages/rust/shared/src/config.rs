//! Application configuration for singlehtml.
//!
//! User config lives at `~/.singlehtml/singlehtml.toml`.
//! CLI flags override config file values, which override defaults.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{Result, SingleHtmlError};

/// Default configuration file name.
const CONFIG_FILE_NAME: &str = "singlehtml.toml";

/// Default config directory name under the user's home.
const CONFIG_DIR_NAME: &str = ".singlehtml";

// ---------------------------------------------------------------------------
// Config structs (matching singlehtml.toml schema)
// ---------------------------------------------------------------------------

/// Top-level application config, deserialized from TOML.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AppConfig {
    /// Wrap the body and inject a table-of-contents sidebar.
    #[serde(default)]
    pub generate_toc: bool,

    /// Extra stylesheet appended last, relative to the Markdown file's directory.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub style_sheet: Option<String>,

    /// Where the final artifact goes: `~/...`, absolute, or relative to the source.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output_directory: Option<String>,

    /// Renderer settings.
    #[serde(default)]
    pub render: RenderConfig,

    /// Remote image fetching.
    #[serde(default)]
    pub fetch: FetchConfig,

    /// Intermediate file polling.
    #[serde(default)]
    pub polling: PollConfig,

    /// Batch conversion.
    #[serde(default)]
    pub batch: BatchConfig,
}

/// `[render]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RenderConfig {
    /// User stylesheets linked from the rendered document.
    #[serde(default)]
    pub styles: Vec<String>,

    /// Embed the built-in document stylesheet.
    #[serde(default = "default_true")]
    pub include_default_styles: bool,

    /// Render soft line breaks as `<br />`.
    #[serde(default = "default_true")]
    pub breaks: bool,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            styles: Vec::new(),
            include_default_styles: true,
            breaks: true,
        }
    }
}

/// `[fetch]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FetchConfig {
    /// Skip TLS certificate validation for remote image hosts only.
    #[serde(default = "default_true")]
    pub accept_invalid_certs: bool,

    /// Per-request timeout in seconds.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// Label remote images with the response's `Content-Type` instead of SVG.
    #[serde(default)]
    pub honor_content_type: bool,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            accept_invalid_certs: true,
            timeout_secs: default_timeout_secs(),
            honor_content_type: false,
        }
    }
}

impl FetchConfig {
    /// Request timeout as a [`Duration`].
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

/// `[polling]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PollConfig {
    /// Total read attempts before giving up.
    #[serde(default = "default_poll_attempts")]
    pub attempts: u32,

    /// Delay between attempts in milliseconds.
    #[serde(default = "default_poll_delay_ms")]
    pub delay_ms: u64,
}

impl Default for PollConfig {
    fn default() -> Self {
        Self {
            attempts: default_poll_attempts(),
            delay_ms: default_poll_delay_ms(),
        }
    }
}

impl PollConfig {
    /// Delay between attempts as a [`Duration`].
    pub fn delay(&self) -> Duration {
        Duration::from_millis(self.delay_ms)
    }
}

/// `[batch]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchConfig {
    /// Maximum number of files converted at once.
    #[serde(default = "default_concurrency")]
    pub concurrency: usize,
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self {
            concurrency: default_concurrency(),
        }
    }
}

fn default_true() -> bool {
    true
}
fn default_timeout_secs() -> u64 {
    30
}
fn default_poll_attempts() -> u32 {
    8
}
fn default_poll_delay_ms() -> u64 {
    1000
}
fn default_concurrency() -> usize {
    4
}

impl AppConfig {
    /// The configured extra stylesheet, ignoring blank values.
    pub fn style_sheet(&self) -> Option<&str> {
        self.style_sheet.as_deref().filter(|s| !s.trim().is_empty())
    }

    /// The configured output directory, ignoring blank values.
    pub fn output_directory(&self) -> Option<&str> {
        self.output_directory
            .as_deref()
            .filter(|s| !s.trim().is_empty())
    }
}

// ---------------------------------------------------------------------------
// Config loading
// ---------------------------------------------------------------------------

/// Get the path to the config directory (`~/.singlehtml/`).
pub fn config_dir() -> Result<PathBuf> {
    let home = dirs::home_dir()
        .ok_or_else(|| SingleHtmlError::config("could not determine home directory"))?;
    Ok(home.join(CONFIG_DIR_NAME))
}

/// Get the path to the config file (`~/.singlehtml/singlehtml.toml`).
pub fn config_file_path() -> Result<PathBuf> {
    Ok(config_dir()?.join(CONFIG_FILE_NAME))
}

/// Load the application config from disk. Returns defaults if the file does not exist.
pub fn load_config() -> Result<AppConfig> {
    let path = config_file_path()?;

    if !path.exists() {
        tracing::debug!(?path, "config file not found, using defaults");
        return Ok(AppConfig::default());
    }

    load_config_from(&path)
}

/// Load the application config from a specific file path.
pub fn load_config_from(path: &Path) -> Result<AppConfig> {
    let content = std::fs::read_to_string(path).map_err(|e| SingleHtmlError::io(path, e))?;

    toml::from_str(&content).map_err(|e| {
        SingleHtmlError::config(format!("failed to parse {}: {e}", path.display()))
    })
}

/// Create the config directory and write a default config file.
/// Returns the path to the created file.
pub fn init_config() -> Result<PathBuf> {
    let dir = config_dir()?;
    std::fs::create_dir_all(&dir).map_err(|e| SingleHtmlError::io(&dir, e))?;

    let path = dir.join(CONFIG_FILE_NAME);
    let config = AppConfig::default();
    let content =
        toml::to_string_pretty(&config).map_err(|e| SingleHtmlError::config(e.to_string()))?;

    std::fs::write(&path, content).map_err(|e| SingleHtmlError::io(&path, e))?;
    tracing::info!(?path, "created default config file");

    Ok(path)
}
