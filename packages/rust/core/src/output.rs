//! Output location resolution.
//!
//! Precedence for the configured output directory:
//! 1. unset or blank: the source file's directory
//! 2. starts with `~`: expanded against the home directory, created if missing
//! 3. absolute: used as-is and must already exist
//! 4. anything else: relative to the source file's directory, created if missing

use std::path::{Path, PathBuf};

use tracing::debug;

use singlehtml_shared::{Result, SingleHtmlError};

/// Resolves where a converted artifact is written.
#[derive(Debug, Clone)]
pub struct OutputResolver {
    home: Option<PathBuf>,
}

impl Default for OutputResolver {
    fn default() -> Self {
        Self {
            home: dirs::home_dir(),
        }
    }
}

impl OutputResolver {
    /// Resolver that expands `~` against `home` instead of the user's home directory.
    pub fn with_home(home: impl Into<PathBuf>) -> Self {
        Self {
            home: Some(home.into()),
        }
    }

    /// Resolve (and create where allowed) the output directory for `source`.
    pub fn resolve_dir(&self, configured: Option<&str>, source: &Path) -> Result<PathBuf> {
        let source_dir = source.parent().unwrap_or(Path::new("")).to_path_buf();

        let Some(configured) = configured.map(str::trim).filter(|s| !s.is_empty()) else {
            return Ok(source_dir);
        };

        if let Some(rest) = configured.strip_prefix('~') {
            let home = self.home.as_ref().ok_or_else(|| {
                SingleHtmlError::config(format!(
                    "cannot expand {configured}: home directory is unknown"
                ))
            })?;
            let dir = home.join(rest.trim_start_matches(['/', '\\']));
            return create(dir);
        }

        let path = Path::new(configured);
        if path.is_absolute() {
            if !path.is_dir() {
                return Err(SingleHtmlError::config(format!(
                    "output directory {configured} does not exist"
                )));
            }
            return Ok(path.to_path_buf());
        }

        create(source_dir.join(path))
    }

    /// Full artifact path: the resolved directory plus [`output_file_name`].
    pub fn output_path(&self, configured: Option<&str>, source: &Path) -> Result<PathBuf> {
        let dir = self.resolve_dir(configured, source)?;
        Ok(dir.join(output_file_name(source)))
    }
}

/// The source's file name with its extension replaced by `.html`.
pub fn output_file_name(source: &Path) -> PathBuf {
    let name = source.file_name().map(Path::new).unwrap_or(Path::new("output"));
    name.with_extension("html")
}

fn create(dir: PathBuf) -> Result<PathBuf> {
    std::fs::create_dir_all(&dir).map_err(|e| SingleHtmlError::io(&dir, e))?;
    debug!(dir = %dir.display(), "output directory ready");
    Ok(dir)
}
