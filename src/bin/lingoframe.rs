use std::{
    collections::HashMap,
    fs,
    path::{Path, PathBuf},
    sync::{Arc, Mutex},
    time::Duration,
};

use clap::{CommandFactory, Parser, Subcommand, ValueEnum};
use clap_complete::Shell;
use colored::Colorize;
use indicatif::{MultiProgress, ProgressBar, ProgressStyle};
use lingoframe::{
    BatchRenderer, EncoderOptions, FfmpegLogLevel, FitConstraints, FontFace, FrameSource,
    PreparedJobs, ProgressCallback, ProgressInfo, ProjectConfig, RenderOptions, SrtTranscriber,
    TextFitter, TimedSegment, Transcriber, VideoCodec, VideoReader, clean_translation,
    prepare_jobs, preview_frame, remap, srt,
};
use serde_json::json;

const CLI_AFTER_HELP: &str = "Examples:\n  lingoframe render clip.mp4 --project project.toml --progress\n  lingoframe preview clip.mp4 --project project.toml --language thai --at 00:02.5 --out thai.png\n  lingoframe remap --transcript clip.srt --translation clip.spanish.txt\n  lingoframe fit \"Three tips for better sleep\" --font fonts/NotoSans-Bold.ttf --width 1080 --height 300\n  lingoframe completions zsh > _lingoframe";

#[derive(Debug, Parser)]
#[command(
    name = "lingoframe",
    version,
    about = "Burn translated titles and subtitles into video, one output per language",
    after_help = CLI_AFTER_HELP
)]
struct Cli {
    #[command(flatten)]
    global: GlobalOptions,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Parser, Clone, Default)]
struct GlobalOptions {
    /// Show additional logging output.
    #[arg(long, global = true)]
    verbose: bool,

    /// Show progress bars where supported.
    #[arg(long, global = true)]
    progress: bool,

    /// Allow overwriting existing output files.
    #[arg(long, global = true)]
    overwrite: bool,

    /// FFmpeg log level (quiet, panic, fatal, error, warning, info, verbose, debug, trace).
    #[arg(long, global = true)]
    log_level: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum CodecArg {
    H264,
    H265,
    Mpeg4,
}

impl From<CodecArg> for VideoCodec {
    fn from(value: CodecArg) -> Self {
        match value {
            CodecArg::H264 => VideoCodec::H264,
            CodecArg::H265 => VideoCodec::H265,
            CodecArg::Mpeg4 => VideoCodec::Mpeg4,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum LayoutArg {
    Title,
    Subtitle,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Render every project language of a video.
    #[command(
        about = "Render localized videos",
        after_help = "Examples:\n  lingoframe render clip.mp4 --project project.toml\n  lingoframe render --project project.toml --transcript clip.srt --codec h265 --crf 26 --json"
    )]
    Render {
        /// Source video. Defaults to the project's `source`.
        input: Option<PathBuf>,
        /// Project file.
        #[arg(long)]
        project: PathBuf,
        /// SRT transcript of the source. Defaults to the project's
        /// `transcript`, then to the video's `.srt` sidecar.
        #[arg(long)]
        transcript: Option<PathBuf>,
        /// Override the project's output directory.
        #[arg(long)]
        out_dir: Option<PathBuf>,
        /// Override the output codec.
        #[arg(long, value_enum)]
        codec: Option<CodecArg>,
        /// Override the CRF quality value (0-51).
        #[arg(long)]
        crf: Option<u32>,
        /// Render languages concurrently (requires the `rayon` feature).
        #[arg(long)]
        parallel: bool,
        /// Print the batch report as JSON.
        #[arg(long)]
        json: bool,
    },

    /// Render a single frame with overlays, to check a layout.
    #[command(
        about = "Render one preview frame",
        after_help = "Examples:\n  lingoframe preview clip.mp4 --project project.toml --language korean --at 3 --out korean.png"
    )]
    Preview {
        /// Source video. Defaults to the project's `source`.
        input: Option<PathBuf>,
        #[arg(long)]
        project: PathBuf,
        /// Language to preview.
        #[arg(long)]
        language: String,
        /// Timestamp in seconds or `[hh:]mm:ss[.fff]`.
        #[arg(long, default_value = "0")]
        at: String,
        #[arg(long)]
        transcript: Option<PathBuf>,
        /// Output image path (png, jpg, bmp).
        #[arg(long)]
        out: PathBuf,
    },

    /// Re-time translated lines onto a transcript and print SRT.
    #[command(
        about = "Re-time a translation",
        after_help = "Examples:\n  lingoframe remap --transcript clip.srt --translation clip.thai.txt --out clip.thai.srt\n  lingoframe remap --translation lines.txt --json"
    )]
    Remap {
        /// Original SRT transcript. Without one, lines get fixed 2.5 s slots.
        #[arg(long)]
        transcript: Option<PathBuf>,
        /// Translated text, one line per transcript segment.
        #[arg(long)]
        translation: PathBuf,
        /// Strip translator preambles and quotes first.
        #[arg(long)]
        clean: bool,
        /// Write SRT here instead of stdout.
        #[arg(long)]
        out: Option<PathBuf>,
        #[arg(long)]
        json: bool,
    },

    /// Show how text fits into a box.
    #[command(about = "Fit text into a box")]
    Fit {
        text: String,
        /// Font file to measure with.
        #[arg(long)]
        font: PathBuf,
        #[arg(long)]
        width: u32,
        #[arg(long)]
        height: u32,
        #[arg(long, value_enum, default_value = "title")]
        layout: LayoutArg,
        #[arg(long)]
        json: bool,
    },

    /// Print video metadata.
    #[command(
        about = "Print video metadata",
        visible_alias = "probe",
        after_help = "Examples:\n  lingoframe metadata clip.mp4\n  lingoframe metadata clip.mp4 --json"
    )]
    Metadata {
        input: PathBuf,
        /// Output metadata as machine-readable JSON.
        #[arg(long)]
        json: bool,
    },

    /// Generate shell completion scripts.
    #[command(about = "Generate shell completions")]
    Completions {
        #[arg(value_enum)]
        shell: Shell,
    },
}

fn parse_timecode(value: &str) -> Result<Duration, Box<dyn std::error::Error>> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err("time value cannot be empty".into());
    }

    if let Ok(seconds) = trimmed.parse::<f64>() {
        return Ok(Duration::try_from_secs_f64(seconds.max(0.0))?);
    }

    let parts: Vec<&str> = trimmed.split(':').collect();
    if parts.len() < 2 || parts.len() > 3 {
        return Err(format!("invalid time format: {trimmed}").into());
    }

    let (hours, minutes, seconds_str) = if parts.len() == 3 {
        (parts[0].parse::<u64>()?, parts[1].parse::<u64>()?, parts[2])
    } else {
        (0_u64, parts[0].parse::<u64>()?, parts[1])
    };

    let seconds = seconds_str.parse::<f64>()?;
    let total_seconds = (hours as f64 * 3600.0) + (minutes as f64 * 60.0) + seconds;
    Ok(Duration::try_from_secs_f64(total_seconds.max(0.0))?)
}

fn ensure_writable_path(path: &Path, overwrite: bool) -> Result<(), Box<dyn std::error::Error>> {
    if path.exists() {
        if overwrite {
            eprintln!(
                "{} {}",
                "warning:".yellow().bold(),
                format!("overwriting {}", path.display()).yellow()
            );
        } else {
            return Err(format!(
                "output already exists: {} (use --overwrite to replace)",
                path.display()
            )
            .into());
        }
    }
    Ok(())
}

fn warn(message: impl AsRef<str>) {
    eprintln!("{} {}", "warning:".yellow().bold(), message.as_ref().yellow());
}

fn apply_global_options(global: &GlobalOptions) -> Result<(), Box<dyn std::error::Error>> {
    let default_filter = if global.verbose { "info" } else { "warn" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_filter))
        .init();

    if let Some(level) = &global.log_level {
        let parsed: FfmpegLogLevel = level.parse()?;
        lingoframe::set_ffmpeg_log_level(parsed);
    }

    Ok(())
}

struct LanguageBars {
    style: ProgressStyle,
    by_language: HashMap<String, ProgressBar>,
}

/// One indicatif bar per language.
struct TerminalProgress {
    bars: MultiProgress,
    state: Mutex<LanguageBars>,
}

impl TerminalProgress {
    fn new() -> Result<Self, Box<dyn std::error::Error>> {
        let style =
            ProgressStyle::with_template("{spinner:.green} {bar:40.cyan/blue} {pos}/{len} {msg}")?
                .progress_chars("##-");
        Ok(Self {
            bars: MultiProgress::new(),
            state: Mutex::new(LanguageBars {
                style,
                by_language: HashMap::new(),
            }),
        })
    }

    fn finish(&self) {
        if let Ok(state) = self.state.lock() {
            for bar in state.by_language.values() {
                bar.finish();
            }
        }
    }
}

impl ProgressCallback for TerminalProgress {
    fn on_progress(&self, info: &ProgressInfo) {
        let language = info.language.clone().unwrap_or_default();
        let Ok(mut state) = self.state.lock() else {
            return;
        };
        let style = state.style.clone();
        let bar = state.by_language.entry(language.clone()).or_insert_with(|| {
            let bar = self.bars.add(ProgressBar::new(info.total.unwrap_or(0)));
            bar.set_style(style);
            bar.set_message(language);
            bar
        });
        if let Some(total) = info.total {
            bar.set_length(total.max(info.current));
        }
        bar.set_position(info.current);
    }
}

fn resolve_source(
    input: Option<PathBuf>,
    project: &ProjectConfig,
) -> Result<PathBuf, Box<dyn std::error::Error>> {
    input
        .or_else(|| project.source.as_deref().map(|path| project.resolve_path(path)))
        .ok_or_else(|| "no input video given and the project has no `source`".into())
}

/// Transcript for `source`; a missing transcript falls back to fixed slots.
fn load_transcript(
    source: &Path,
    transcript: Option<PathBuf>,
    project: &ProjectConfig,
) -> Result<Vec<TimedSegment>, Box<dyn std::error::Error>> {
    let transcriber = match transcript.or_else(|| {
        project
            .transcript
            .as_deref()
            .map(|path| project.resolve_path(path))
    }) {
        Some(path) => SrtTranscriber::from_file(path),
        None => SrtTranscriber::sidecar(),
    };

    let path = transcriber.transcript_path(source);
    if !path.exists() {
        warn(format!(
            "no transcript at {}; subtitle lines will use fixed 2.5 s slots",
            path.display()
        ));
        return Ok(Vec::new());
    }
    Ok(transcriber.transcribe(source)?)
}

fn load_jobs(
    source: &Path,
    transcript: Option<PathBuf>,
    project: &ProjectConfig,
) -> Result<PreparedJobs, Box<dyn std::error::Error>> {
    let metadata = VideoReader::open(source)?.metadata().clone();
    let segments = load_transcript(source, transcript, project)?;
    let prepared = prepare_jobs(project, source, &metadata, &segments, None)?;
    for (language, error) in &prepared.failures {
        warn(format!("skipping {language}: {error}"));
    }
    Ok(prepared)
}

fn run() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    apply_global_options(&cli.global)?;

    match cli.command {
        Commands::Render {
            input,
            project,
            transcript,
            out_dir,
            codec,
            crf,
            parallel,
            json,
        } => {
            let mut project = ProjectConfig::load(&project)?;
            if let Some(out_dir) = out_dir {
                project.output_dir = std::env::current_dir()?.join(out_dir);
            }
            let source = resolve_source(input, &project)?;
            let prepared = load_jobs(&source, transcript, &project)?;
            if prepared.jobs.is_empty() {
                return Err("no language could be prepared for rendering".into());
            }

            for job in &prepared.jobs {
                ensure_writable_path(&job.output_video_path, cli.global.overwrite)?;
            }

            let mut options = project.render_options(RenderOptions::new().with_batch_size(10));
            if codec.is_some() || crf.is_some() {
                let mut encoder: EncoderOptions = options.encoder().clone();
                if let Some(codec) = codec {
                    encoder = encoder.codec(codec.into());
                }
                if let Some(crf) = crf {
                    encoder = encoder.crf(crf);
                }
                options = options.with_encoder(encoder);
            }

            let terminal_progress = if cli.global.progress {
                let progress = Arc::new(TerminalProgress::new()?);
                options = options.with_progress(progress.clone());
                Some(progress)
            } else {
                None
            };

            let renderer = BatchRenderer::new(Arc::new(project.font_table()), options);
            #[cfg(feature = "rayon")]
            let report = if parallel {
                renderer.render_all_parallel(&prepared.jobs)
            } else {
                renderer.render_all(&prepared.jobs)
            };
            #[cfg(not(feature = "rayon"))]
            let report = {
                if parallel {
                    warn("--parallel requires building with the `rayon` feature; rendering sequentially");
                }
                renderer.render_all(&prepared.jobs)
            };

            if let Some(progress) = terminal_progress {
                progress.finish();
            }

            if json {
                let payload: Vec<_> = report
                    .outcomes
                    .iter()
                    .map(|outcome| match &outcome.result {
                        Ok(render) => json!({
                            "language": outcome.language,
                            "output": outcome.output.display().to_string(),
                            "frames": render.frames,
                            "duration_seconds": render.video_duration().as_secs_f64(),
                            "elapsed_seconds": render.elapsed.as_secs_f64(),
                        }),
                        Err(error) => json!({
                            "language": outcome.language,
                            "output": outcome.output.display().to_string(),
                            "error": error.to_string(),
                        }),
                    })
                    .collect();
                println!("{}", serde_json::to_string_pretty(&payload)?);
            } else {
                for outcome in &report.outcomes {
                    match &outcome.result {
                        Ok(render) => println!(
                            "{} {} ({}, {} frames)",
                            "saved".green().bold(),
                            outcome.output.display(),
                            outcome.language,
                            render.frames
                        ),
                        Err(error) => eprintln!(
                            "{} {}",
                            "failed:".red().bold(),
                            format!("{}: {error}", outcome.language).red()
                        ),
                    }
                }
            }

            let failed = report.failure_count() + prepared.failures.len();
            if failed > 0 {
                return Err(format!(
                    "{failed} of {} language(s) failed",
                    project.languages.len()
                )
                .into());
            }
            println!(
                "{} {}",
                "success:".green().bold(),
                format!("Rendered {} language(s)", report.outcomes.len()).green()
            );
        }
        Commands::Preview {
            input,
            project,
            language,
            at,
            transcript,
            out,
        } => {
            ensure_writable_path(&out, cli.global.overwrite)?;
            let mut project = ProjectConfig::load(&project)?;
            let language = language.trim().to_lowercase();
            if !project.languages.contains(&language) {
                return Err(format!("language '{language}' is not in the project").into());
            }
            project.languages = vec![language.clone()];

            let source = resolve_source(input, &project)?;
            let prepared = load_jobs(&source, transcript, &project)?;
            let job = prepared
                .jobs
                .first()
                .ok_or(format!("could not prepare '{language}'"))?;

            let t = parse_timecode(&at)?.as_secs_f64();
            let options = project.render_options(RenderOptions::new());
            let frame = preview_frame(job, &project.font_table(), &options, t)?;
            frame.save(&out)?;
            println!("{} {}", "saved".green().bold(), out.display());
        }
        Commands::Remap {
            transcript,
            translation,
            clean,
            out,
            json,
        } => {
            let original = match transcript {
                Some(path) => srt::read_srt(&path)?,
                None => Vec::new(),
            };
            let mut translated = fs::read_to_string(&translation)?;
            if clean {
                translated = clean_translation(&translated);
            }

            let segments = remap(&original, &translated);
            if segments.is_empty() {
                warn("no translated lines survived re-timing");
            }

            if json {
                println!("{}", serde_json::to_string_pretty(&segments)?);
            } else if let Some(path) = out {
                ensure_writable_path(&path, cli.global.overwrite)?;
                fs::write(&path, srt::to_srt(&segments))?;
                println!("{} {}", "saved".green().bold(), path.display());
            } else {
                print!("{}", srt::to_srt(&segments));
            }
        }
        Commands::Fit {
            text,
            font,
            width,
            height,
            layout,
            json,
        } => {
            let face = FontFace::from_file(&font)?;
            let constraints = match layout {
                LayoutArg::Title => FitConstraints::title(),
                LayoutArg::Subtitle => FitConstraints::subtitle(),
            };
            let fit = TextFitter::new(constraints).fit(&text, &face, width, height);

            if json {
                let payload = json!({
                    "font_size": fit.font_size,
                    "lines": fit.lines,
                    "line_heights": fit.line_heights,
                });
                println!("{}", serde_json::to_string_pretty(&payload)?);
            } else if fit.is_empty() {
                println!("(no text)");
            } else {
                println!("Font size: {}px", fit.font_size);
                for line in &fit.lines {
                    println!("  {line}");
                }
            }
        }
        Commands::Metadata { input, json } => {
            let reader = VideoReader::open(&input)?;
            let metadata = reader.metadata();
            if json {
                let payload = json!({
                    "width": metadata.width,
                    "height": metadata.height,
                    "fps": metadata.frames_per_second,
                    "frame_count": metadata.frame_count,
                    "duration_seconds": metadata.duration().as_secs_f64(),
                    "codec": metadata.codec,
                });
                println!("{}", serde_json::to_string_pretty(&payload)?);
            } else {
                println!(
                    "Video: {}x{} @ {:.2} fps [{}]",
                    metadata.width, metadata.height, metadata.frames_per_second, metadata.codec,
                );
                println!(
                    "Frames: ~{} ({:.2}s)",
                    metadata.frame_count,
                    metadata.duration().as_secs_f64()
                );
            }
        }
        Commands::Completions { shell } => {
            let mut command = Cli::command();
            clap_complete::generate(shell, &mut command, "lingoframe", &mut std::io::stdout());
        }
    }

    Ok(())
}

fn main() {
    if let Err(error) = run() {
        eprintln!("{} {error}", "error:".red().bold());
        std::process::exit(1);
    }
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use clap::Parser;

    use super::{Cli, CodecArg, Commands, LayoutArg, parse_timecode};

    #[test]
    fn parse_timecode_formats() {
        let seconds = parse_timecode("75").unwrap();
        assert_eq!(seconds.as_secs(), 75);

        let mm_ss = parse_timecode("01:15").unwrap();
        assert_eq!(mm_ss.as_secs(), 75);

        let hh_mm_ss = parse_timecode("00:01:15.5").unwrap();
        assert_eq!(hh_mm_ss.as_millis(), 75_500);

        assert!(parse_timecode("").is_err());
        assert!(parse_timecode("1:2:3:4").is_err());
    }

    #[test]
    fn parse_timecode_rejects_unrepresentable_values() {
        assert!(parse_timecode("inf").is_err());
        assert!(parse_timecode("1e300").is_err());
        assert!(parse_timecode("00:00:inf").is_err());
        assert_eq!(parse_timecode("-5").unwrap().as_secs(), 0);
    }

    #[test]
    fn render_arguments() {
        let cli = Cli::try_parse_from([
            "lingoframe",
            "render",
            "clip.mp4",
            "--project",
            "project.toml",
            "--codec",
            "h265",
            "--crf",
            "28",
            "--progress",
        ])
        .unwrap();

        assert!(cli.global.progress);
        match cli.command {
            Commands::Render {
                input,
                project,
                codec,
                crf,
                parallel,
                ..
            } => {
                assert_eq!(input, Some(PathBuf::from("clip.mp4")));
                assert_eq!(project, PathBuf::from("project.toml"));
                assert_eq!(codec, Some(CodecArg::H265));
                assert_eq!(crf, Some(28));
                assert!(!parallel);
            }
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[test]
    fn render_requires_project() {
        assert!(Cli::try_parse_from(["lingoframe", "render", "clip.mp4"]).is_err());
    }

    #[test]
    fn fit_defaults_to_title_layout() {
        let cli = Cli::try_parse_from([
            "lingoframe",
            "fit",
            "Hello world",
            "--font",
            "font.ttf",
            "--width",
            "1080",
            "--height",
            "300",
        ])
        .unwrap();

        match cli.command {
            Commands::Fit { layout, width, .. } => {
                assert_eq!(layout, LayoutArg::Title);
                assert_eq!(width, 1080);
            }
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[test]
    fn unknown_codec_is_rejected() {
        assert!(
            Cli::try_parse_from([
                "lingoframe",
                "render",
                "--project",
                "p.toml",
                "--codec",
                "vp9",
            ])
            .is_err()
        );
    }
}
