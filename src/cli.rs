//! CLI argument definitions using clap derive macros.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use publist_core::SourceKind;

/// Render a publication list from a static JSON file or a live ORCID record.
///
/// `render` fills an HTML page template with the list, filters and preview;
/// `build` snapshots an ORCID record into the static JSON file `render` reads.
#[derive(Parser, Debug)]
#[command(name = "publist")]
#[command(author, version, about)]
pub struct Args {
    /// Increase output verbosity (-v for debug, -vv for trace)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Config file to read instead of the default location
    #[arg(long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Load publications and render them into an HTML page
    Render(RenderArgs),
    /// Fetch an ORCID record and write it as static JSON
    Build(BuildArgs),
}

#[derive(clap::Args, Debug)]
pub struct RenderArgs {
    /// Where publications come from (static or orcid)
    #[arg(short, long)]
    pub source: Option<SourceKind>,

    /// Static JSON path or http(s) URL
    #[arg(short, long, value_name = "PATH_OR_URL")]
    pub input: Option<String>,

    /// ORCID iD for the live source
    #[arg(long = "orcid", value_name = "ID")]
    pub orcid_id: Option<String>,

    /// ORCID API base URL
    #[arg(long, value_name = "URL")]
    pub orcid_base_url: Option<String>,

    /// HTML template containing the list hooks (built-in page when omitted)
    #[arg(short, long, value_name = "FILE")]
    pub template: Option<PathBuf>,

    /// Write the result here instead of stdout
    #[arg(short, long, value_name = "FILE")]
    pub output: Option<PathBuf>,

    /// Only list publications from this year
    #[arg(long)]
    pub year: Option<String>,

    /// Only list publications of this work type (e.g. journal-article)
    #[arg(long = "type", value_name = "TYPE")]
    pub kind: Option<String>,

    /// Concurrent DOI lookups for the ORCID source (1-32)
    #[arg(short, long, value_parser = clap::value_parser!(u8).range(1..=32))]
    pub workers: Option<u8>,

    /// Print only the rendered list entries instead of the whole page
    #[arg(long)]
    pub fragment: bool,
}

#[derive(clap::Args, Debug)]
pub struct BuildArgs {
    /// ORCID iD to snapshot
    #[arg(long = "orcid", value_name = "ID")]
    pub orcid_id: Option<String>,

    /// ORCID API base URL
    #[arg(long, value_name = "URL")]
    pub orcid_base_url: Option<String>,

    /// Destination JSON file
    #[arg(short, long, value_name = "PATH")]
    pub output: Option<PathBuf>,

    /// Concurrent DOI lookups (1-32)
    #[arg(short, long, value_parser = clap::value_parser!(u8).range(1..=32))]
    pub workers: Option<u8>,

    /// Pause after each DOI lookup in milliseconds (0 to disable, max 60000)
    #[arg(long, value_parser = clap::value_parser!(u64).range(0..=60000))]
    pub delay_ms: Option<u64>,
}
