//! Rendering every language of a video.
//!
//! [`BatchRenderer`] runs a list of [`RenderJob`]s and isolates their
//! failures: a job that fails (missing font, encoder error, a decode error
//! halfway through) is recorded in its [`JobOutcome`] and logged, and the
//! remaining languages still render.
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//!
//! use lingoframe::{BatchRenderer, FontTable, RenderJob, RenderOptions};
//!
//! let fonts = Arc::new(FontTable::with_default(vec!["fonts/NotoSans-Bold.ttf".into()]));
//! let jobs = vec![
//!     RenderJob::builder("clip.mp4", "out/clip_es.mp4", "spanish").build(),
//!     RenderJob::builder("clip.mp4", "out/clip_th.mp4", "thai").build(),
//! ];
//!
//! let report = BatchRenderer::new(fonts, RenderOptions::new()).render_all(&jobs);
//! print!("{report}");
//! ```

use std::fmt::{Display, Formatter, Result as FmtResult};
use std::path::PathBuf;
use std::sync::Arc;

use crate::config::RenderOptions;
use crate::error::LingoframeError;
use crate::font::FontTable;
use crate::job::RenderJob;
use crate::pipeline::{RenderReport, render_job};

/// Runs a single job. The default runner decodes and encodes with FFmpeg;
/// tests and embedders can substitute their own.
pub trait JobRunner: Sync {
    fn run(
        &self,
        job: &RenderJob,
        fonts: &FontTable,
        options: &RenderOptions,
    ) -> Result<RenderReport, LingoframeError>;
}

/// [`JobRunner`] backed by [`render_job`].
#[derive(Debug, Clone, Copy, Default)]
pub struct FfmpegJobRunner;

impl JobRunner for FfmpegJobRunner {
    fn run(
        &self,
        job: &RenderJob,
        fonts: &FontTable,
        options: &RenderOptions,
    ) -> Result<RenderReport, LingoframeError> {
        render_job(job, fonts, options)
    }
}

impl<F> JobRunner for F
where
    F: Fn(&RenderJob, &FontTable, &RenderOptions) -> Result<RenderReport, LingoframeError> + Sync,
{
    fn run(
        &self,
        job: &RenderJob,
        fonts: &FontTable,
        options: &RenderOptions,
    ) -> Result<RenderReport, LingoframeError> {
        self(job, fonts, options)
    }
}

/// Result of one job in a batch.
#[derive(Debug)]
pub struct JobOutcome {
    pub language: String,
    pub output: PathBuf,
    pub result: Result<RenderReport, LingoframeError>,
}

impl JobOutcome {
    pub fn is_success(&self) -> bool {
        self.result.is_ok()
    }
}

/// Outcomes of a batch, in job order.
#[derive(Debug, Default)]
pub struct BatchReport {
    pub outcomes: Vec<JobOutcome>,
}

impl BatchReport {
    /// Returns `true` if every job succeeded.
    pub fn is_success(&self) -> bool {
        self.outcomes.iter().all(JobOutcome::is_success)
    }

    pub fn succeeded(&self) -> impl Iterator<Item = &RenderReport> {
        self.outcomes
            .iter()
            .filter_map(|outcome| outcome.result.as_ref().ok())
    }

    /// Failed jobs as `(language, error)`.
    pub fn failed(&self) -> impl Iterator<Item = (&str, &LingoframeError)> {
        self.outcomes.iter().filter_map(|outcome| {
            outcome
                .result
                .as_ref()
                .err()
                .map(|error| (outcome.language.as_str(), error))
        })
    }

    pub fn failure_count(&self) -> usize {
        self.failed().count()
    }
}

impl Display for BatchReport {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        for outcome in &self.outcomes {
            match &outcome.result {
                Ok(report) => writeln!(
                    f,
                    "[OK] {}: {} ({} frames)",
                    outcome.language,
                    outcome.output.display(),
                    report.frames,
                )?,
                Err(error) => writeln!(f, "[FAILED] {}: {error}", outcome.language)?,
            }
        }
        if self.outcomes.is_empty() {
            writeln!(f, "No jobs.")?;
        }
        Ok(())
    }
}

/// Renders many jobs, isolating per-job failures.
pub struct BatchRenderer<R = FfmpegJobRunner> {
    fonts: Arc<FontTable>,
    options: RenderOptions,
    runner: R,
}

impl BatchRenderer<FfmpegJobRunner> {
    pub fn new(fonts: Arc<FontTable>, options: RenderOptions) -> Self {
        Self {
            fonts,
            options,
            runner: FfmpegJobRunner,
        }
    }
}

impl<R: JobRunner> BatchRenderer<R> {
    /// Replace the job runner.
    pub fn with_runner<T: JobRunner>(self, runner: T) -> BatchRenderer<T> {
        BatchRenderer {
            fonts: self.fonts,
            options: self.options,
            runner,
        }
    }

    pub fn options(&self) -> &RenderOptions {
        &self.options
    }

    /// Render `jobs` one after another.
    ///
    /// Never fails as a whole; each job's error lands in its outcome. Once
    /// the cancellation token fires, jobs not yet started are recorded as
    /// [`LingoframeError::Cancelled`] without being run.
    pub fn render_all(&self, jobs: &[RenderJob]) -> BatchReport {
        log::info!("Rendering {} job(s)", jobs.len());
        let outcomes = jobs.iter().map(|job| self.render_one(job)).collect();
        self.finish(outcomes)
    }

    /// Render `jobs` concurrently, one job per worker thread.
    ///
    /// Outcomes keep job order. Each job owns its decoder, encoder and
    /// renderer; only the font table is shared.
    #[cfg(feature = "rayon")]
    pub fn render_all_parallel(&self, jobs: &[RenderJob]) -> BatchReport {
        use rayon::iter::{IntoParallelRefIterator, ParallelIterator};

        log::info!("Rendering {} job(s) in parallel", jobs.len());
        let outcomes = jobs.par_iter().map(|job| self.render_one(job)).collect();
        self.finish(outcomes)
    }

    fn render_one(&self, job: &RenderJob) -> JobOutcome {
        let result = if self.options.is_cancelled() {
            Err(LingoframeError::Cancelled)
        } else {
            self.runner.run(job, &self.fonts, &self.options)
        };

        if let Err(error) = &result {
            log::error!("Render for '{}' failed: {error}", job.language);
        }

        JobOutcome {
            language: job.language.clone(),
            output: job.output_video_path.clone(),
            result,
        }
    }

    fn finish(&self, outcomes: Vec<JobOutcome>) -> BatchReport {
        let report = BatchReport { outcomes };
        log::info!(
            "Batch finished: {} succeeded, {} failed",
            report.succeeded().count(),
            report.failure_count()
        );
        report
    }
}
