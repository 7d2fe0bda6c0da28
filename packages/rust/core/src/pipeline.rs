//! Single-document conversion: Markdown source → render → consolidate → artifact.

use std::fmt;
use std::future::Future;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use tracing::{debug, info, instrument, warn};

use singlehtml_markdown::Renderer;
use singlehtml_resources::RemoteFetcher;
use singlehtml_shared::{AppConfig, ConsolidateReport, PollConfig, Result, SingleHtmlError};

use crate::consolidate::{ConsolidateOptions, consolidate};
use crate::output::OutputResolver;

// ---------------------------------------------------------------------------
// State and progress
// ---------------------------------------------------------------------------

/// Where a single conversion currently is.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConversionState {
    /// The renderer has been asked to produce the intermediate file.
    AwaitingRender,
    /// Waiting for the intermediate file to become readable.
    PollingForFile,
    /// Running the consolidation transforms and writing the artifact.
    Transforming,
    /// Finished; the artifact is at this path.
    Written(PathBuf),
    /// Aborted with this message.
    Failed(String),
}

impl fmt::Display for ConversionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::AwaitingRender => f.write_str("rendering"),
            Self::PollingForFile => f.write_str("waiting for rendered file"),
            Self::Transforming => f.write_str("consolidating"),
            Self::Written(path) => write!(f, "written {}", path.display()),
            Self::Failed(msg) => write!(f, "failed: {msg}"),
        }
    }
}

/// Progress callback for conversion state changes.
pub trait ProgressReporter {
    /// Called on every state transition of the conversion of `source`.
    fn state(&self, source: &Path, state: &ConversionState);
}

/// No-op progress reporter for headless/test usage.
pub struct SilentProgress;

impl ProgressReporter for SilentProgress {
    fn state(&self, _source: &Path, _state: &ConversionState) {}
}

/// Result of a successful conversion.
#[derive(Debug)]
pub struct ConversionOutcome {
    /// The Markdown file that was converted.
    pub source: PathBuf,
    /// Where the single-file HTML was written.
    pub output_path: PathBuf,
    /// What the transforms did.
    pub report: ConsolidateReport,
    /// Total elapsed time.
    pub elapsed: Duration,
}

// ---------------------------------------------------------------------------
// Polling
// ---------------------------------------------------------------------------

/// Read `path` until it has content, at most `policy.attempts` times.
///
/// A missing file or an empty read counts as not ready. The task sleeps for
/// `policy.delay()` between attempts.
#[instrument(skip(policy), fields(path = %path.display(), attempts = policy.attempts))]
pub async fn poll_for_file(path: &Path, policy: &PollConfig) -> Result<String> {
    poll_with(path, policy, || tokio::fs::read_to_string(path)).await
}

async fn poll_with<F, Fut>(path: &Path, policy: &PollConfig, mut read: F) -> Result<String>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = std::io::Result<String>>,
{
    for attempt in 1..=policy.attempts {
        match read().await {
            Ok(content) if !content.is_empty() => {
                debug!(attempt, bytes = content.len(), "intermediate file ready");
                return Ok(content);
            }
            Ok(_) => debug!(attempt, "intermediate file empty"),
            Err(e) => debug!(attempt, error = %e, "intermediate file not readable"),
        }

        if attempt < policy.attempts {
            tokio::time::sleep(policy.delay()).await;
        }
    }

    Err(SingleHtmlError::ResourceUnavailable {
        path: path.to_path_buf(),
        attempts: policy.attempts,
    })
}

// ---------------------------------------------------------------------------
// Converter
// ---------------------------------------------------------------------------

/// Drives one Markdown file through render → consolidate → write.
pub struct Converter<R> {
    renderer: R,
    config: AppConfig,
    fetcher: RemoteFetcher,
    output: OutputResolver,
}

impl<R: Renderer> Converter<R> {
    /// Create a converter. Fails if the HTTP client cannot be built.
    pub fn new(renderer: R, config: AppConfig) -> Result<Self> {
        let fetcher = RemoteFetcher::new(&config.fetch)?;
        Ok(Self {
            renderer,
            config,
            fetcher,
            output: OutputResolver::default(),
        })
    }

    /// Replace the output resolver (e.g. to pin the home directory).
    pub fn with_output_resolver(mut self, output: OutputResolver) -> Self {
        self.output = output;
        self
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    /// Convert one Markdown file into a single self-contained HTML file.
    ///
    /// Every state transition is logged and passed to `progress`; the final
    /// one is either `Written` or `Failed`.
    #[instrument(skip_all, fields(source = %source.display()))]
    pub async fn convert(
        &self,
        source: &Path,
        progress: &dyn ProgressReporter,
    ) -> Result<ConversionOutcome> {
        let result = self.run(source, progress).await;

        match &result {
            Ok(outcome) => {
                let state = ConversionState::Written(outcome.output_path.clone());
                info!(state = %state, elapsed_ms = outcome.elapsed.as_millis() as u64, "conversion finished");
                progress.state(source, &state);
            }
            Err(e) => {
                let state = ConversionState::Failed(e.to_string());
                warn!(state = %state, "conversion failed");
                progress.state(source, &state);
            }
        }

        result
    }

    async fn run(&self, source: &Path, progress: &dyn ProgressReporter) -> Result<ConversionOutcome> {
        let start = Instant::now();
        let source = validate_source(source)?;

        let transition = |state: ConversionState| {
            info!(state = %state, "conversion state");
            progress.state(&source, &state);
        };

        // --- Render ---
        transition(ConversionState::AwaitingRender);
        let intermediate = self.renderer.render(&source).await?;

        // --- Poll ---
        transition(ConversionState::PollingForFile);
        let html = poll_for_file(&intermediate, &self.config.polling).await?;

        // --- Transform ---
        transition(ConversionState::Transforming);
        let base_dir = source.parent().unwrap_or(Path::new("")).to_path_buf();
        let options = ConsolidateOptions {
            extra_stylesheet: self.config.style_sheet().map(|s| base_dir.join(s)),
            generate_toc: self.config.generate_toc,
            base_dir,
        };
        let (content, report) = consolidate(&html, &options, &self.fetcher).await?;

        // --- Write ---
        let output_path = self
            .output
            .output_path(self.config.output_directory(), &source)?;
        tokio::fs::remove_file(&intermediate)
            .await
            .map_err(|e| SingleHtmlError::io(&intermediate, e))?;

        tokio::fs::write(&output_path, content.as_bytes())
            .await
            .map_err(|e| SingleHtmlError::io(&output_path, e))?;

        debug!(out = %output_path.display(), bytes = content.len(), "artifact written");

        Ok(ConversionOutcome {
            source,
            output_path,
            report,
            elapsed: start.elapsed(),
        })
    }
}

/// Check that `source` is an existing Markdown file and make it absolute.
pub fn validate_source(source: &Path) -> Result<PathBuf> {
    if !source.is_file() {
        return Err(SingleHtmlError::user_input(format!(
            "{} is not an existing file",
            source.display()
        )));
    }

    let is_markdown = source
        .extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case("md") || e.eq_ignore_ascii_case("markdown"));
    if !is_markdown {
        return Err(SingleHtmlError::user_input(format!(
            "{} is not a Markdown file",
            source.display()
        )));
    }

    std::path::absolute(source).map_err(|e| SingleHtmlError::io(source, e))
}

#[cfg(test)]
mod tests {
    use std::cell::{Cell, RefCell};

    use singlehtml_markdown::{MarkdownRenderer, intermediate_path};
    use singlehtml_shared::RenderConfig;

    use super::*;

    fn temp_dir(tag: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!("sh-{tag}-{}", uuid::Uuid::now_v7()));
        std::fs::create_dir_all(&dir).unwrap();
        dir
    }

    fn fast_config() -> AppConfig {
        let mut config = AppConfig::default();
        config.polling = PollConfig {
            attempts: 8,
            delay_ms: 1,
        };
        config.render = RenderConfig {
            include_default_styles: false,
            ..RenderConfig::default()
        };
        config
    }

    /// Records every state it sees.
    #[derive(Default)]
    struct Recorder(RefCell<Vec<ConversionState>>);

    impl ProgressReporter for Recorder {
        fn state(&self, _source: &Path, state: &ConversionState) {
            self.0.borrow_mut().push(state.clone());
        }
    }

    /// Renderer that signals completion without ever writing the file.
    #[derive(Default)]
    struct SilentRenderer {
        calls: Cell<u32>,
    }

    impl Renderer for SilentRenderer {
        async fn render(&self, source: &Path) -> Result<PathBuf> {
            self.calls.set(self.calls.get() + 1);
            Ok(intermediate_path(source))
        }
    }

    fn not_found() -> std::io::Error {
        std::io::Error::from(std::io::ErrorKind::NotFound)
    }

    #[tokio::test]
    async fn poll_reads_exactly_the_configured_number_of_times() {
        let reads = Cell::new(0u32);
        let policy = PollConfig {
            attempts: 8,
            delay_ms: 1,
        };

        let err = poll_with(Path::new("never.html"), &policy, || {
            reads.set(reads.get() + 1);
            async { Err(not_found()) }
        })
        .await
        .unwrap_err();

        assert_eq!(reads.get(), 8);
        assert!(matches!(
            err,
            SingleHtmlError::ResourceUnavailable { attempts: 8, .. }
        ));
    }

    #[tokio::test]
    async fn poll_returns_on_the_attempt_that_sees_content() {
        let reads = Cell::new(0u32);
        let policy = PollConfig {
            attempts: 8,
            delay_ms: 1,
        };

        let html = poll_with(Path::new("late.html"), &policy, || {
            reads.set(reads.get() + 1);
            let n = reads.get();
            async move {
                match n {
                    1 | 2 => Err(not_found()),
                    3 => Ok(String::new()),
                    _ => Ok(format!("<html>{n}</html>")),
                }
            }
        })
        .await
        .unwrap();

        assert_eq!(html, "<html>4</html>");
        assert_eq!(reads.get(), 4);
    }

    #[tokio::test]
    async fn poll_sleeps_between_attempts_only() {
        let dir = temp_dir("poll");
        let path = dir.join("never.html");
        let policy = PollConfig {
            attempts: 8,
            delay_ms: 20,
        };

        let start = Instant::now();
        let err = poll_for_file(&path, &policy).await.unwrap_err();

        assert!(start.elapsed() >= Duration::from_millis(7 * 20));
        assert!(matches!(
            err,
            SingleHtmlError::ResourceUnavailable { attempts: 8, .. }
        ));
        let _ = std::fs::remove_dir_all(&dir);
    }

    #[tokio::test]
    async fn poll_treats_empty_file_as_not_ready() {
        let dir = temp_dir("poll-empty");
        let path = dir.join("empty.html");
        std::fs::write(&path, "").unwrap();

        let policy = PollConfig {
            attempts: 2,
            delay_ms: 1,
        };
        assert!(poll_for_file(&path, &policy).await.is_err());

        std::fs::write(&path, "<html></html>").unwrap();
        assert_eq!(poll_for_file(&path, &policy).await.unwrap(), "<html></html>");

        let _ = std::fs::remove_dir_all(&dir);
    }

    #[test]
    fn validate_source_rejects_non_markdown() {
        let dir = temp_dir("validate");
        std::fs::write(dir.join("notes.txt"), "x").unwrap();
        std::fs::write(dir.join("notes.MD"), "x").unwrap();

        let err = validate_source(&dir.join("notes.txt")).unwrap_err();
        assert!(matches!(err, SingleHtmlError::UserInput { .. }));
        let err = validate_source(&dir.join("absent.md")).unwrap_err();
        assert!(matches!(err, SingleHtmlError::UserInput { .. }));
        assert!(validate_source(&dir.join("notes.MD")).is_ok());

        let _ = std::fs::remove_dir_all(&dir);
    }

    #[tokio::test]
    async fn convert_writes_artifact_and_removes_intermediate() {
        let dir = temp_dir("convert");
        let source = dir.join("guide.md");
        std::fs::write(&source, "# Guide\n\n## Part\n\n<script>x()</script>\n").unwrap();

        let mut config = fast_config();
        config.generate_toc = true;
        let converter = Converter::new(MarkdownRenderer::new(config.render.clone()), config).unwrap();
        let recorder = Recorder::default();

        let outcome = converter.convert(&source, &recorder).await.unwrap();

        assert_eq!(outcome.output_path, dir.join("guide.html"));
        assert_eq!(outcome.report.menu_entries, 2);
        assert_eq!(outcome.report.scripts_removed, 1);

        let html = std::fs::read_to_string(&outcome.output_path).unwrap();
        assert!(html.contains("area__menu"));
        assert!(html.contains(r##"href="#guide""##));
        assert!(!html.contains("<script"));

        assert_eq!(
            *recorder.0.borrow(),
            vec![
                ConversionState::AwaitingRender,
                ConversionState::PollingForFile,
                ConversionState::Transforming,
                ConversionState::Written(dir.join("guide.html")),
            ]
        );

        let _ = std::fs::remove_dir_all(&dir);
    }

    #[tokio::test]
    async fn convert_into_relative_output_dir_deletes_intermediate() {
        let dir = temp_dir("convert-out");
        let source = dir.join("notes.md");
        std::fs::write(&source, "Some text.\n").unwrap();

        let mut config = fast_config();
        config.output_directory = Some("dist".into());
        let converter = Converter::new(MarkdownRenderer::new(config.render.clone()), config).unwrap();

        let outcome = converter.convert(&source, &SilentProgress).await.unwrap();

        assert_eq!(outcome.output_path, dir.join("dist").join("notes.html"));
        assert!(outcome.output_path.is_file());
        assert!(!dir.join("notes.html").exists());

        let _ = std::fs::remove_dir_all(&dir);
    }

    #[tokio::test]
    async fn convert_fails_when_renderer_never_writes() {
        let dir = temp_dir("convert-missing");
        let source = dir.join("ghost.md");
        std::fs::write(&source, "# Ghost\n").unwrap();

        let converter = Converter::new(SilentRenderer::default(), fast_config()).unwrap();
        let recorder = Recorder::default();

        let err = converter.convert(&source, &recorder).await.unwrap_err();

        assert!(matches!(
            err,
            SingleHtmlError::ResourceUnavailable { attempts: 8, .. }
        ));
        assert_eq!(converter.renderer.calls.get(), 1);
        assert!(matches!(
            recorder.0.borrow().last(),
            Some(ConversionState::Failed(_))
        ));
        assert!(!dir.join("ghost.html").exists());

        let _ = std::fs::remove_dir_all(&dir);
    }

    #[tokio::test]
    async fn missing_absolute_output_dir_writes_nothing() {
        let dir = temp_dir("convert-abs");
        let source = dir.join("doc.md");
        std::fs::write(&source, "# Doc\n").unwrap();
        let missing = dir.join("nowhere");

        let mut config = fast_config();
        config.output_directory = Some(missing.to_string_lossy().into_owned());
        let converter = Converter::new(MarkdownRenderer::new(config.render.clone()), config).unwrap();

        let err = converter.convert(&source, &SilentProgress).await.unwrap_err();

        assert!(matches!(err, SingleHtmlError::Config { .. }));
        assert!(!missing.exists());

        let _ = std::fs::remove_dir_all(&dir);
    }

    #[tokio::test]
    async fn tilde_output_dir_lands_under_home() {
        let dir = temp_dir("convert-home");
        let home = dir.join("home");
        let source = dir.join("doc.md");
        std::fs::write(&source, "# Doc\n").unwrap();

        let mut config = fast_config();
        config.output_directory = Some("~/exports".into());
        let converter = Converter::new(MarkdownRenderer::new(config.render.clone()), config)
            .unwrap()
            .with_output_resolver(OutputResolver::with_home(&home));

        let outcome = converter.convert(&source, &SilentProgress).await.unwrap();

        assert_eq!(outcome.output_path, home.join("exports").join("doc.html"));
        assert!(outcome.output_path.is_file());

        let _ = std::fs::remove_dir_all(&dir);
    }
}
