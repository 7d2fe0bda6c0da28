//! Whole-directory conversion.
//!
//! Each Markdown file gets its own independent render → consolidate pipeline.
//! Pipelines share nothing mutable: they run concurrently on a single-thread
//! [`LocalSet`], bounded by a semaphore, and one failure never stops the rest.

use std::path::{Path, PathBuf};
use std::rc::Rc;

use tokio::sync::Semaphore;
use tokio::task::LocalSet;
use tracing::{info, instrument};

use singlehtml_markdown::Renderer;
use singlehtml_shared::{Result, SingleHtmlError};

use crate::pipeline::{ConversionOutcome, Converter, ProgressReporter};

/// Outcome for one file of a batch.
#[derive(Debug)]
pub struct BatchOutcome {
    pub source: PathBuf,
    pub result: Result<ConversionOutcome>,
}

/// Markdown files directly inside `dir` (non-recursive), sorted by path.
///
/// Only regular files whose extension is `md` (any case) are returned.
pub fn discover_markdown_files(dir: &Path) -> Result<Vec<PathBuf>> {
    let entries = std::fs::read_dir(dir).map_err(|e| SingleHtmlError::io(dir, e))?;

    let mut files: Vec<PathBuf> = entries
        .filter_map(|entry| entry.ok())
        .filter(|entry| entry.file_type().is_ok_and(|t| t.is_file()))
        .map(|entry| entry.path())
        .filter(|path| {
            path.extension()
                .and_then(|e| e.to_str())
                .is_some_and(|e| e.eq_ignore_ascii_case("md"))
        })
        .collect();

    files.sort();
    Ok(files)
}

/// Convert every Markdown file in `dir`.
///
/// Outcomes come back in discovery order regardless of completion order.
#[instrument(skip_all, fields(dir = %dir.display()))]
pub async fn convert_all<R: Renderer + 'static>(
    converter: Rc<Converter<R>>,
    dir: &Path,
    progress: Rc<dyn ProgressReporter>,
) -> Result<Vec<BatchOutcome>> {
    let files = discover_markdown_files(dir)?;
    let concurrency = converter.config().batch.concurrency.max(1);
    info!(files = files.len(), concurrency, "starting batch conversion");

    let semaphore = Rc::new(Semaphore::new(concurrency));
    let local = LocalSet::new();

    let outcomes = local
        .run_until(async move {
            let mut handles = Vec::with_capacity(files.len());
            for source in files {
                let converter = Rc::clone(&converter);
                let progress = Rc::clone(&progress);
                let semaphore = Rc::clone(&semaphore);
                let task_source = source.clone();

                let handle = tokio::task::spawn_local(async move {
                    let _permit = semaphore
                        .acquire()
                        .await
                        .map_err(|e| SingleHtmlError::Unexpected(e.to_string()))?;
                    converter.convert(&task_source, progress.as_ref()).await
                });
                handles.push((source, handle));
            }

            let mut outcomes = Vec::with_capacity(handles.len());
            for (source, handle) in handles {
                let result = handle.await.unwrap_or_else(|e| {
                    Err(SingleHtmlError::Unexpected(format!("conversion task failed: {e}")))
                });
                outcomes.push(BatchOutcome { source, result });
            }
            outcomes
        })
        .await;

    let failed = outcomes.iter().filter(|o| o.result.is_err()).count();
    info!(total = outcomes.len(), failed, "batch conversion finished");

    Ok(outcomes)
}
