//! Transcription and translation seams, and turning a project into jobs.
//!
//! Speech recognition and machine translation live outside this crate.
//! They plug in through [`Transcriber`] and [`Translator`]; the crate ships
//! [`SrtTranscriber`], which reads an existing SRT transcript, and
//! [`StaticTranslator`], which serves translations prepared ahead of time.
//!
//! [`prepare_jobs`] is the glue between a [`ProjectConfig`] and the batch
//! renderer: it translates the title and the transcript for every selected
//! language, re-times the translated lines onto the transcript's segments
//! with [`remap`], and builds one [`RenderJob`] per language. A language
//! whose translation fails is reported and skipped; the others still get
//! jobs.

use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use crate::error::LingoframeError;
use crate::job::{RenderJob, output_file_name};
use crate::metadata::VideoMetadata;
use crate::progress::{OperationType, ProgressCallback, ProgressTracker};
use crate::project::ProjectConfig;
use crate::remap::{clean_translation, remap};
use crate::segment::TimedSegment;
use crate::srt::read_srt;

/// Produces timed segments for a video.
pub trait Transcriber: Send + Sync {
    /// # Errors
    ///
    /// Whatever the implementation cannot recover from; the caller treats
    /// it as fatal for the video.
    fn transcribe(&self, video: &Path) -> Result<Vec<TimedSegment>, LingoframeError>;
}

/// Translates text into a target language.
///
/// Implementations receive the whole transcript, one segment per line, and
/// should keep the line structure: line `i` of the reply is shown during
/// segment `i`.
pub trait Translator: Send + Sync {
    /// # Errors
    ///
    /// [`LingoframeError::Translation`] for the language that failed.
    fn translate(&self, text: &str, language: &str) -> Result<String, LingoframeError>;
}

/// Reads an SRT transcript instead of running speech recognition.
///
/// Without an explicit path, the transcript is the video's `.srt` sidecar:
/// `clip.mp4` → `clip.srt`.
#[derive(Debug, Clone, Default)]
pub struct SrtTranscriber {
    path: Option<PathBuf>,
}

impl SrtTranscriber {
    /// Use each video's sidecar file.
    pub fn sidecar() -> Self {
        Self { path: None }
    }

    /// Always read `path`, whatever the video.
    pub fn from_file(path: impl Into<PathBuf>) -> Self {
        Self {
            path: Some(path.into()),
        }
    }

    /// Transcript location for `video`.
    pub fn transcript_path(&self, video: &Path) -> PathBuf {
        self.path
            .clone()
            .unwrap_or_else(|| video.with_extension("srt"))
    }
}

impl Transcriber for SrtTranscriber {
    fn transcribe(&self, video: &Path) -> Result<Vec<TimedSegment>, LingoframeError> {
        let path = self.transcript_path(video);
        if !path.exists() {
            return Err(LingoframeError::Configuration(format!(
                "no transcript found at {}",
                path.display()
            )));
        }
        let segments = read_srt(&path)?;
        log::debug!("Read {} segments from {}", segments.len(), path.display());
        Ok(segments)
    }
}

/// Serves fixed translations, keyed by language and source text.
///
/// Useful for reviewed translations and for tests. Lookups of text that was
/// never registered fail with [`LingoframeError::Translation`].
#[derive(Debug, Clone, Default)]
pub struct StaticTranslator {
    entries: HashMap<(String, String), String>,
}

impl StaticTranslator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register the `language` translation of `source`.
    #[must_use]
    pub fn with(
        mut self,
        language: &str,
        source: impl Into<String>,
        translated: impl Into<String>,
    ) -> Self {
        self.entries.insert(
            (language.to_lowercase(), source.into()),
            translated.into(),
        );
        self
    }
}

impl Translator for StaticTranslator {
    fn translate(&self, text: &str, language: &str) -> Result<String, LingoframeError> {
        self.entries
            .get(&(language.to_lowercase(), text.to_string()))
            .cloned()
            .ok_or_else(|| LingoframeError::Translation {
                language: language.to_string(),
                reason: "no translation registered for this text".to_string(),
            })
    }
}

/// Transcript text as sent for translation: one segment per line.
///
/// Line breaks inside a cue are folded into spaces so line `i` always
/// belongs to segment `i`.
pub fn transcript_text(segments: &[TimedSegment]) -> String {
    segments
        .iter()
        .map(|segment| segment.text.split_whitespace().collect::<Vec<_>>().join(" "))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Translate `text` into every language, cleaning each reply with
/// [`clean_translation`].
///
/// Results keep the order of `languages`. Requests run concurrently when
/// the `rayon` feature is enabled.
pub fn translate_all(
    translator: &dyn Translator,
    text: &str,
    languages: &[String],
    progress: Option<Arc<dyn ProgressCallback>>,
) -> Vec<(String, Result<String, LingoframeError>)> {
    let tracker = progress.map(|callback| {
        Mutex::new(ProgressTracker::new(
            callback,
            OperationType::Translation,
            Some(languages.len() as u64),
            1,
        ))
    });

    let translate_one = |language: &String| {
        log::debug!("Translating {} bytes into '{language}'", text.len());
        let result = translator
            .translate(text, language)
            .map(|reply| clean_translation(&reply));
        if let Err(error) = &result {
            log::error!("Translation into '{language}' failed: {error}");
        }
        if let Some(Ok(mut tracker)) = tracker.as_ref().map(Mutex::lock) {
            tracker.advance(None, None);
        }
        (language.clone(), result)
    };

    #[cfg(feature = "rayon")]
    let results: Vec<_> = {
        use rayon::iter::{IntoParallelRefIterator, ParallelIterator};
        languages.par_iter().map(translate_one).collect()
    };
    #[cfg(not(feature = "rayon"))]
    let results: Vec<_> = languages.iter().map(translate_one).collect();

    results
}

/// Jobs built from a project, plus the languages that could not be prepared.
#[derive(Debug, Default)]
pub struct PreparedJobs {
    pub jobs: Vec<RenderJob>,
    pub failures: Vec<(String, LingoframeError)>,
}

/// Build one [`RenderJob`] per project language for `source`.
///
/// For each language the title and subtitles come from the project's
/// `[translations.<language>]` entry when present and from `translator`
/// otherwise. `segments` is the source transcript; when it is empty the
/// translated lines are laid out in fixed slots instead.
///
/// # Errors
///
/// [`LingoframeError::Configuration`] for an invalid background color. Per
/// language problems (translation failure, missing translation) end up in
/// [`PreparedJobs::failures`].
pub fn prepare_jobs(
    project: &ProjectConfig,
    source: &Path,
    metadata: &VideoMetadata,
    segments: &[TimedSegment],
    translator: Option<&dyn Translator>,
) -> Result<PreparedJobs, LingoframeError> {
    let title_background = project.title_background()?;
    let subtitle_background = project.subtitle_background()?;
    let title_region = project.title_region(metadata.width, metadata.height);
    let subtitle_region = project.subtitle_region(metadata.width, metadata.height);
    let output_dir = project.output_dir();

    let pending: Vec<String> = project
        .languages
        .iter()
        .filter(|language| !project.translations.contains_key(language.as_str()))
        .cloned()
        .collect();

    let mut translated_titles = HashMap::new();
    let mut translated_subtitles = HashMap::new();
    if !pending.is_empty() {
        if let Some(translator) = translator {
            if let Some(title) = project.title.text.as_deref() {
                translated_titles.extend(translate_all(translator, title, &pending, None));
            }
            if !segments.is_empty() {
                let transcript = transcript_text(segments);
                translated_subtitles.extend(translate_all(translator, &transcript, &pending, None));
            }
        }
    }

    let mut prepared = PreparedJobs::default();
    let mut used_names = HashSet::new();

    for language in &project.languages {
        let texts = match project.translations.get(language) {
            Some(entry) => project
                .translated_subtitles(language)
                .map(|subtitles| (entry.title.clone(), subtitles.unwrap_or_default())),
            None if translator.is_none() => Err(LingoframeError::Translation {
                language: language.clone(),
                reason: "no translation configured and no translator available".to_string(),
            }),
            None => take_translation(&mut translated_titles, language)
                .and_then(|title| {
                    take_translation(&mut translated_subtitles, language)
                        .map(|subtitles| (title, subtitles.unwrap_or_default()))
                }),
        };

        let (title, subtitles) = match texts {
            Ok(texts) => texts,
            Err(error) => {
                log::error!("Skipping '{language}': {error}");
                prepared.failures.push((language.clone(), error));
                continue;
            }
        };

        let title = title
            .map(|title| title.lines().map(str::trim).collect::<Vec<_>>().join(" "))
            .filter(|title| !title.trim().is_empty())
            .or_else(|| project.title.text.clone());

        let mut file_name = output_file_name(title.as_deref(), language, &project.container);
        if !used_names.insert(file_name.clone()) {
            let with_language = format!("{} {language}", title.as_deref().unwrap_or_default());
            file_name = output_file_name(Some(&with_language), language, &project.container);
            used_names.insert(file_name.clone());
        }

        let timed = remap(segments, &subtitles);
        log::debug!("'{language}': {} timed lines", timed.len());

        let mut builder = RenderJob::builder(source, output_dir.join(file_name), language.clone())
            .subtitles(timed, subtitle_region)
            .title_background(title_background)
            .subtitle_background(subtitle_background);
        if let (Some(title), Some(region)) = (title, title_region) {
            builder = builder.title(title, region);
        }
        prepared.jobs.push(builder.build());
    }

    Ok(prepared)
}

/// Remove the fan-out result for `language`. A missing entry means nothing
/// was requested, which is not a failure.
fn take_translation(
    results: &mut HashMap<String, Result<String, LingoframeError>>,
    language: &str,
) -> Result<Option<String>, LingoframeError> {
    results.remove(language).transpose()
}
