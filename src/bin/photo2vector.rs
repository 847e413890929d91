//! CLI binary for photo2vector.
//!
//! A thin shim over the library crate that maps CLI flags
//! to `StudioConfig` and prints results.

use anyhow::{Context, Result};
use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};
use photo2vector::{
    upload_file, vectorize, vectorize_to_dir, DownloadOutcome, ExternalOpener,
    PipelineProgressCallback, ProgressCallback, StudioConfig, SystemBrowser, UiState,
    VectorizeOutput,
};
use std::io;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

// ── ANSI colour helpers (no extra deps) ──────────────────────────────────────

fn green(s: &str) -> String {
    format!("\x1b[32m{s}\x1b[0m")
}
fn red(s: &str) -> String {
    format!("\x1b[31m{s}\x1b[0m")
}
fn dim(s: &str) -> String {
    format!("\x1b[2m{s}\x1b[0m")
}
fn bold(s: &str) -> String {
    format!("\x1b[1m{s}\x1b[0m")
}
fn cyan(s: &str) -> String {
    format!("\x1b[36m{s}\x1b[0m")
}

// ── CLI progress callback using indicatif ────────────────────────────────────

/// Terminal progress callback: a spinner whose prefix is the current status
/// label, plus one log line per finished stage.
struct CliProgressCallback {
    bar: ProgressBar,
}

impl CliProgressCallback {
    fn new() -> Arc<Self> {
        let bar = ProgressBar::new_spinner();
        let style = ProgressStyle::with_template("{spinner:.cyan} {prefix:.bold}  {msg}  {elapsed:.dim}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner())
            .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏", "⠿"]);
        bar.set_style(style);
        bar.set_prefix(UiState::Idle.label());
        bar.enable_steady_tick(Duration::from_millis(80));
        Arc::new(Self { bar })
    }

    fn finish(&self) {
        self.bar.finish_and_clear();
    }
}

impl PipelineProgressCallback for CliProgressCallback {
    fn on_state_change(&self, state: &UiState) {
        self.bar.set_prefix(state.label());
        match state {
            UiState::Error(message) => self.bar.println(format!("  {} {}", red("✗"), red(message))),
            UiState::Uploading => self.bar.set_message("sending image…"),
            UiState::Submitting | UiState::Queued => self.bar.set_message("waiting for the service…"),
            _ => {}
        }
    }

    fn on_poll_attempt(&self, attempt: u32, max: u32) {
        self.bar.set_message(dim(&format!("poll {attempt}/{max}")));
    }

    fn on_upload_complete(&self, url: &str) {
        self.bar.println(format!("  {} Uploaded  {}", green("✓"), dim(url)));
    }

    fn on_result_ready(&self, url: &str) {
        self.bar.println(format!("  {} Result    {}", green("✓"), dim(url)));
    }
}

const AFTER_HELP: &str = r#"EXAMPLES:
  # Generate and save next to the current directory
  photo2vector portrait.jpg

  # Save into a directory
  photo2vector portrait.jpg -o out/

  # Only print the result URL
  photo2vector --no-download portrait.png

  # Upload only, print the public URL
  photo2vector --upload-only portrait.png

  # JSON output with timings and download report
  photo2vector --json portrait.jpg > result.json

DOWNLOAD FALLBACK:
  1. direct    save the fetched bytes (.webp / .png / .jpg by Content-Type)
  2. canvas    re-encode the decoded result as PNG
  3. browser   open the result URL; save it by hand

ENVIRONMENT VARIABLES:
  Every option can also be set as PHOTO2VECTOR_<OPTION>, e.g.
  PHOTO2VECTOR_API_BASE, PHOTO2VECTOR_MAX_POLLS, PHOTO2VECTOR_OUTPUT.
  RUST_LOG overrides the log filter.
"#;

/// Turn a photo into vector art with a remote image-effects service.
#[derive(Parser, Debug)]
#[command(
    name = "photo2vector",
    version,
    about = "Turn a photo into vector art with a remote image-effects service",
    arg_required_else_help = true,
    color = clap::ColorChoice::Auto,
    after_long_help = AFTER_HELP
)]
struct Cli {
    /// Image file to upload.
    input: PathBuf,

    /// Directory to save the result into.
    #[arg(short, long, env = "PHOTO2VECTOR_OUTPUT", default_value = ".")]
    output: PathBuf,

    /// Upload the image and print its public URL; no job is submitted.
    #[arg(long, env = "PHOTO2VECTOR_UPLOAD_ONLY")]
    upload_only: bool,

    /// Do not save the result, only print its URL.
    #[arg(long, env = "PHOTO2VECTOR_NO_DOWNLOAD")]
    no_download: bool,

    /// Output structured JSON instead of text.
    #[arg(long, env = "PHOTO2VECTOR_JSON")]
    json: bool,

    /// Open the result URL in the default browser.
    #[arg(long, env = "PHOTO2VECTOR_OPEN")]
    open: bool,

    /// Base URL of the effects API.
    #[arg(long, env = "PHOTO2VECTOR_API_BASE")]
    api_base: Option<String>,

    /// Base URL uploaded files are served from.
    #[arg(long, env = "PHOTO2VECTOR_CONTENT_BASE")]
    content_base: Option<String>,

    /// Account id sent with every job.
    #[arg(long, env = "PHOTO2VECTOR_USER_ID")]
    user_id: Option<String>,

    /// Effect to apply.
    #[arg(long, env = "PHOTO2VECTOR_EFFECT")]
    effect: Option<String>,

    /// Job model: image-effects or video-effects.
    #[arg(long, env = "PHOTO2VECTOR_MODEL")]
    model: Option<String>,

    /// Delay between status queries in milliseconds.
    #[arg(long, env = "PHOTO2VECTOR_POLL_INTERVAL_MS", default_value_t = 2000)]
    poll_interval_ms: u64,

    /// Status queries before giving up.
    #[arg(long, env = "PHOTO2VECTOR_MAX_POLLS", default_value_t = 60,
          value_parser = clap::value_parser!(u32).range(1..))]
    max_polls: u32,

    /// Enable DEBUG-level tracing logs.
    #[arg(short, long, env = "PHOTO2VECTOR_VERBOSE")]
    verbose: bool,

    /// Suppress all output except errors.
    #[arg(short, long, env = "PHOTO2VECTOR_QUIET")]
    quiet: bool,

    /// Disable the progress spinner.
    #[arg(long, env = "PHOTO2VECTOR_NO_PROGRESS")]
    no_progress: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // ── Logging setup ────────────────────────────────────────────────────
    // The spinner replaces INFO logs unless -v is given.
    let show_progress = !cli.quiet && !cli.no_progress && !cli.json;
    let filter = if cli.verbose {
        "debug"
    } else if cli.quiet || show_progress {
        "error"
    } else {
        "info"
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_writer(io::stderr)
        .init();

    let progress = show_progress.then(CliProgressCallback::new);
    let config = build_config(&cli, progress.clone().map(|p| p as ProgressCallback))?;

    // ── Upload-only mode ─────────────────────────────────────────────────
    if cli.upload_only {
        let asset = upload_file(&cli.input, &config).await;
        if let Some(ref p) = progress {
            p.finish();
        }
        let asset = asset.context("Upload failed")?;
        if cli.json {
            println!(
                "{}",
                serde_json::to_string_pretty(&asset).context("Failed to serialise output")?
            );
        } else {
            println!("{}", asset.url);
        }
        return Ok(());
    }

    // ── Run pipeline ─────────────────────────────────────────────────────
    let result = if cli.no_download {
        vectorize(&cli.input, &config).await
    } else {
        vectorize_to_dir(&cli.input, &cli.output, &config).await
    };
    if let Some(ref p) = progress {
        p.finish();
    }
    let output = result.context("Vectorization failed")?;

    if cli.open {
        if let Err(e) = SystemBrowser.open(&output.generation.result_url) {
            tracing::warn!("Could not open browser: {}", e);
        }
    }

    if cli.json {
        let json = serde_json::to_string_pretty(&output).context("Failed to serialise output")?;
        println!("{json}");
    } else {
        println!("{}", output.generation.result_url);
        if !cli.quiet {
            print_summary(&output);
        }
    }

    Ok(())
}

fn print_summary(output: &VectorizeOutput) {
    if let Some((w, h)) = output.dimensions {
        eprintln!("   {}", dim(&format!("{w}×{h}")));
    }
    match output.download.as_ref().map(|d| &d.outcome) {
        Some(DownloadOutcome::Saved { path, tier }) => eprintln!(
            "{}  {}  {}",
            green("✔"),
            bold(&path.display().to_string()),
            dim(&format!("({tier:?})").to_lowercase()),
        ),
        Some(DownloadOutcome::Manual { url, hint, .. }) => {
            eprintln!("{}  {}", cyan("⚠"), hint);
            eprintln!("   {}", url);
        }
        None => {}
    }
    eprintln!(
        "   {} polls, {}ms total",
        output.generation.polls, output.stats.total_duration_ms
    );
}

/// Map CLI args to `StudioConfig`.
fn build_config(cli: &Cli, progress: Option<ProgressCallback>) -> Result<StudioConfig> {
    let mut builder = StudioConfig::builder()
        .poll_interval_ms(cli.poll_interval_ms)
        .max_polls(cli.max_polls);

    if let Some(ref url) = cli.api_base {
        builder = builder.api_base(url);
    }
    if let Some(ref url) = cli.content_base {
        builder = builder.content_base(url);
    }
    if let Some(ref id) = cli.user_id {
        builder = builder.user_id(id);
    }
    if let Some(ref effect) = cli.effect {
        builder = builder.effect_id(effect);
    }
    if let Some(ref model) = cli.model {
        builder = builder.model(model);
    }
    if let Some(cb) = progress {
        builder = builder.progress_callback(cb);
    }

    builder.build().context("Invalid configuration")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flags_map_onto_config() {
        let cli = Cli::parse_from([
            "photo2vector",
            "in.png",
            "--api-base",
            "http://localhost:9000",
            "--model",
            "video-effects",
            "--max-polls",
            "5",
        ]);
        let config = build_config(&cli, None).unwrap();
        assert_eq!(config.api_base, "http://localhost:9000");
        assert_eq!(config.max_polls, 5);
        assert_eq!(config.family(), photo2vector::EffectFamily::Video);
    }

    #[test]
    fn zero_polls_rejected_by_parser() {
        assert!(Cli::try_parse_from(["photo2vector", "in.png", "--max-polls", "0"]).is_err());
    }
}
