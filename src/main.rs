use anyhow::{Context, Result};
use clap::Parser;
use std::io::Write;
use std::path::{Path, PathBuf};

use podcast_cards::config::Config;
use podcast_cards::pipeline::{self, RunOutcome};
use podcast_cards::render::Page;

/// Get the config directory path (~/.config/podcast-cards/)
fn get_config_dir() -> Result<PathBuf> {
    let home = std::env::var("HOME").context("HOME environment variable not set")?;
    let config_dir = PathBuf::from(home).join(".config").join("podcast-cards");
    Ok(config_dir)
}

/// Atomically write `content` to `dst` using write-to-temp-then-rename.
/// A reader of `dst` sees either the old page or the new one, never a mix.
fn atomic_write(dst: &Path, content: &[u8]) -> Result<()> {
    // SEC-009: Randomized temp filename so the path cannot be pre-created as a symlink
    use std::time::{SystemTime, UNIX_EPOCH};
    let random_suffix = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_nanos())
        .unwrap_or(0);
    let temp_path = dst.with_extension(format!("tmp.{:016x}", random_suffix));

    let mut temp_file = std::fs::OpenOptions::new()
        .write(true)
        .create_new(true) // Fails atomically if file exists (prevents symlink race)
        .open(&temp_path)
        .with_context(|| {
            format!(
                "Failed to create temporary file '{}': check directory permissions or disk space",
                temp_path.display()
            )
        })?;

    temp_file.write_all(content).with_context(|| {
        let _ = std::fs::remove_file(&temp_path);
        format!(
            "Failed to write to temporary file '{}': disk may be full",
            temp_path.display()
        )
    })?;

    temp_file.sync_all().with_context(|| {
        let _ = std::fs::remove_file(&temp_path);
        format!(
            "Failed to sync temporary file '{}' to disk: disk may be full",
            temp_path.display()
        )
    })?;

    drop(temp_file);

    // On Windows, rename fails if destination exists, so remove it first
    #[cfg(windows)]
    if dst.exists() {
        std::fs::remove_file(dst).with_context(|| {
            let _ = std::fs::remove_file(&temp_path);
            format!(
                "Failed to remove existing '{}' before atomic replace",
                dst.display()
            )
        })?;
    }

    std::fs::rename(&temp_path, dst).with_context(|| {
        let _ = std::fs::remove_file(&temp_path);
        format!(
            "Failed to rename '{}' to '{}': check permissions",
            temp_path.display(),
            dst.display()
        )
    })?;

    Ok(())
}

#[derive(Parser, Debug)]
#[command(
    name = "podcast-cards",
    about = "Render podcast RSS episodes as cards into an HTML page"
)]
struct Args {
    /// HTML page containing `latest-episode` / `episode-list` regions
    #[arg(value_name = "PAGE")]
    page: PathBuf,

    /// Write the rendered page here instead of updating PAGE in place
    #[arg(short, long, value_name = "FILE")]
    output: Option<PathBuf>,

    /// Config file (default: ~/.config/podcast-cards/config.toml)
    #[arg(long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// RSS feed to render, overriding `feed_url` from the config file
    #[arg(long, value_name = "URL", env = "PODCAST_FEED_URL")]
    feed_url: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing for debug logging
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let args = Args::parse();

    let config_path = match args.config {
        Some(path) => path,
        None => get_config_dir()?.join("config.toml"),
    };
    let mut config = Config::load(&config_path)
        .with_context(|| format!("Failed to load config from '{}'", config_path.display()))?;
    if let Some(feed_url) = args.feed_url {
        config.feed_url = Some(feed_url);
    }

    let html = tokio::fs::read_to_string(&args.page)
        .await
        .with_context(|| format!("Failed to read page '{}'", args.page.display()))?;
    let mut page = Page::new(html);

    // No cookie store: the feed request never carries credentials
    let client = reqwest::Client::builder()
        .user_agent(concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION")))
        .build()
        .context("Failed to build HTTP client")?;

    let outcome = pipeline::run(&client, &config, &mut page).await;
    if !outcome.page_changed() {
        tracing::info!("No feed URL configured, page left unchanged");
        return Ok(());
    }

    let output = args.output.as_deref().unwrap_or(&args.page);
    atomic_write(output, page.into_html().as_bytes())
        .with_context(|| format!("Failed to write page '{}'", output.display()))?;

    match outcome {
        RunOutcome::Rendered { episodes, summary } => {
            println!(
                "Rendered {} episodes into {} ({} list region(s))",
                episodes,
                output.display(),
                summary.lists
            );
            Ok(())
        }
        RunOutcome::Failed(e) => Err(anyhow::Error::new(e).context("Failed to load episodes")),
        RunOutcome::Skipped => Ok(()),
    }
}
