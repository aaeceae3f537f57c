//! CLI entry point for the publication list tool.

use std::io::{self, Write};
use std::path::Path;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use publist_core::source::{DEFAULT_STATIC_PATH, HttpTimeouts};
use publist_core::{
    FilterSelection, Hook, OrcidClient, OrcidSource, Page, Pipeline, PublicationItem,
    SourceKind, SourceLoader, SourceSettings, build_source,
};
use tracing::{debug, info, warn};

mod app_config;
mod cli;

use app_config::FileConfig;
use cli::{Args, BuildArgs, Command, RenderArgs};

/// Pause between DOI lookups when snapshotting, to stay polite to the API.
const DEFAULT_BUILD_DELAY_MS: u64 = 50;

#[tokio::main]
async fn main() -> Result<()> {
    // Parse CLI arguments first (before tracing, so --help works without logs)
    let args = Args::parse();
    let loaded = app_config::load_config(args.config.as_deref())?;

    // Priority: RUST_LOG env var > quiet flag > verbose flag > config verbosity > info
    let default_level = if args.quiet {
        "error"
    } else {
        match args.verbose {
            0 => loaded
                .config
                .verbosity
                .map_or("info", app_config::VerbositySetting::log_level),
            1 => "debug",
            _ => "trace",
        }
    };

    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_level));

    // Logs go to stderr; stdout carries rendered HTML.
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();

    debug!(?args, "CLI arguments parsed");
    if loaded.loaded_from_file {
        debug!(path = ?loaded.path, "loaded config file");
    }

    match args.command {
        Command::Render(render) => run_render(render, &loaded.config).await,
        Command::Build(build) => run_build(build, &loaded.config).await,
    }
}

/// Settings for `kind` with config file values layered over the defaults.
fn settings_from_config(kind: SourceKind, config: &FileConfig) -> SourceSettings {
    let mut settings = SourceSettings::new(kind);
    if let Some(input) = &config.input {
        settings.input.clone_from(input);
    }
    if let Some(orcid_id) = &config.orcid_id {
        settings.orcid_id.clone_from(orcid_id);
    }
    if let Some(base_url) = &config.orcid_base_url {
        settings.orcid_base_url.clone_from(base_url);
    }
    if let Some(workers) = config.workers {
        settings.workers = usize::from(workers);
    }
    if let Some(delay_ms) = config.request_delay_ms {
        settings.request_delay = Duration::from_millis(delay_ms);
    }
    let defaults = HttpTimeouts::default();
    settings.timeouts = HttpTimeouts {
        connect_timeout_secs: config
            .connect_timeout_secs
            .unwrap_or(defaults.connect_timeout_secs),
        read_timeout_secs: config
            .read_timeout_secs
            .unwrap_or(defaults.read_timeout_secs),
    };
    settings
}

async fn run_render(args: RenderArgs, config: &FileConfig) -> Result<()> {
    let kind = args.source.or(config.source).unwrap_or_default();
    let mut settings = settings_from_config(kind, config);
    if let Some(input) = args.input {
        settings.input = input;
    }
    if let Some(orcid_id) = args.orcid_id {
        settings.orcid_id = orcid_id;
    }
    if let Some(base_url) = args.orcid_base_url {
        settings.orcid_base_url = base_url;
    }
    if let Some(workers) = args.workers {
        settings.workers = usize::from(workers);
    }

    let mut page = match &args.template {
        Some(path) => {
            let template = tokio::fs::read_to_string(path)
                .await
                .with_context(|| format!("Failed to read template '{}'", path.display()))?;
            Page::parse(&template)
        }
        None => Page::default(),
    };
    for hook in Hook::ALL {
        if !page.has(hook) {
            debug!(id = hook.element_id(), "page hook absent, feature disabled");
        }
    }

    let selection = FilterSelection::new(
        args.year.unwrap_or_default(),
        args.kind.unwrap_or_default(),
    );

    info!(source = %settings.kind, "rendering publications");
    let source = build_source(&settings).context("Invalid source configuration")?;
    let outcome = Pipeline::new()
        .run(source.as_ref(), &mut page, &selection)
        .await;
    if let Some(stats) = &outcome.enrich_stats {
        info!(
            "DOI enrichment: {} found, {} failed, {} without put code",
            stats.found(),
            stats.failed(),
            stats.skipped()
        );
    }
    if outcome.error.is_some() {
        warn!("publications unavailable; writing page with the failure entry");
    }

    let html = if args.fragment {
        page.content(Hook::List)
            .or_else(|| page.content(Hook::Preview))
            .unwrap_or_default()
            .to_string()
    } else {
        page.to_html()
    };

    match &args.output {
        Some(path) => {
            tokio::fs::write(path, html)
                .await
                .with_context(|| format!("Failed to write '{}'", path.display()))?;
            info!(path = %path.display(), "page written");
        }
        None => {
            let mut stdout = io::stdout().lock();
            stdout.write_all(html.as_bytes())?;
            stdout.flush()?;
        }
    }
    Ok(())
}

async fn run_build(args: BuildArgs, config: &FileConfig) -> Result<()> {
    let mut settings = settings_from_config(SourceKind::Orcid, config);
    if let Some(orcid_id) = args.orcid_id {
        settings.orcid_id = orcid_id;
    }
    if let Some(base_url) = args.orcid_base_url {
        settings.orcid_base_url = base_url;
    }
    if let Some(workers) = args.workers {
        settings.workers = usize::from(workers);
    }
    settings.request_delay = Duration::from_millis(
        args.delay_ms
            .or(config.request_delay_ms)
            .unwrap_or(DEFAULT_BUILD_DELAY_MS),
    );
    let output = args
        .output
        .unwrap_or_else(|| DEFAULT_STATIC_PATH.into());

    let client = OrcidClient::with_base_url(
        &settings.orcid_id,
        &settings.orcid_base_url,
        settings.timeouts,
    )
    .context("Invalid ORCID settings")?;
    let source = OrcidSource::new(client, settings.workers, settings.request_delay);

    info!(orcid = %settings.orcid_id, "fetching works");
    let mut items = source
        .fetch()
        .await
        .with_context(|| format!("Failed to fetch works for ORCID iD {}", settings.orcid_id))?;
    let stats = source.enrich(&mut items).await;
    let (found, failed) = stats
        .as_ref()
        .map_or((0, 0), |stats| (stats.found(), stats.failed()));

    write_json_atomically(&output, &items).await?;
    info!(
        path = %output.display(),
        "wrote {} items ({found} DOIs found, {failed} lookups failed)",
        items.len()
    );
    Ok(())
}

/// Writes `items` as pretty JSON through a sibling temp file so a failed run
/// never leaves a truncated document behind.
async fn write_json_atomically(path: &Path, items: &[PublicationItem]) -> Result<()> {
    let mut body =
        serde_json::to_string_pretty(items).context("Failed to serialize publications")?;
    body.push('\n');

    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        tokio::fs::create_dir_all(parent)
            .await
            .with_context(|| format!("Failed to create directory '{}'", parent.display()))?;
    }

    let file_name = path
        .file_name()
        .with_context(|| format!("Output path '{}' has no file name", path.display()))?;
    let tmp = path.with_file_name(format!(".{}.tmp", file_name.to_string_lossy()));

    tokio::fs::write(&tmp, body)
        .await
        .with_context(|| format!("Failed to write '{}'", tmp.display()))?;
    if let Err(e) = tokio::fs::rename(&tmp, path).await {
        let _ = tokio::fs::remove_file(&tmp).await;
        return Err(e).with_context(|| format!("Failed to replace '{}'", path.display()));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_settings_from_config_layers_over_defaults() {
        let config = FileConfig {
            input: Some("data/pubs.json".to_string()),
            workers: Some(3),
            request_delay_ms: Some(25),
            read_timeout_secs: Some(90),
            ..FileConfig::default()
        };
        let settings = settings_from_config(SourceKind::Static, &config);
        assert_eq!(settings.input, "data/pubs.json");
        assert_eq!(settings.workers, 3);
        assert_eq!(settings.request_delay, Duration::from_millis(25));
        assert_eq!(settings.timeouts.read_timeout_secs, 90);
        assert_eq!(settings.timeouts.connect_timeout_secs, 10);
        assert_eq!(settings.orcid_id, "0000-0003-2271-6803");
    }

    #[tokio::test]
    async fn test_write_json_atomically_creates_parents_and_pretty_prints() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("nested").join("publications.json");
        let items = vec![
            PublicationItem::new("Größe")
                .with_year("2021")
                .with_kind("journal-article"),
        ];

        write_json_atomically(&path, &items).await.expect("write");

        let written = std::fs::read_to_string(&path).expect("read back");
        assert!(written.starts_with("[\n  {\n    \"title\": \"Größe\""));
        assert!(written.contains("\"type\": \"journal-article\""));
        assert!(written.ends_with("]\n"));
        let leftovers: Vec<_> = std::fs::read_dir(path.parent().expect("parent"))
            .expect("list dir")
            .filter_map(Result::ok)
            .filter(|entry| entry.file_name().to_string_lossy().ends_with(".tmp"))
            .collect();
        assert!(leftovers.is_empty());
    }
}
