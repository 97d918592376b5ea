//! shelfari-lookup main entry point
//!
//! Command-line front end for the Shelfari metadata source.

use clap::{Args, Parser, Subcommand};
use shelfari_metadata::config::{load_config_with_hash, Config};
use shelfari_metadata::lookup::{ISBN, SHELFARI_ID};
use shelfari_metadata::{LookupRequest, Shelfari};
use std::path::{Path, PathBuf};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::EnvFilter;

/// shelfari-lookup: Book metadata from the Shelfari catalog
///
/// Looks books up by title, author, ISBN or Shelfari id and prints the
/// matching records, or downloads the best matching cover.
#[derive(Parser, Debug)]
#[command(name = "shelfari-lookup")]
#[command(version)]
#[command(about = "Book metadata from the Shelfari catalog", long_about = None)]
struct Cli {
    /// Path to TOML configuration file (built-in defaults when omitted)
    #[arg(short, long, value_name = "CONFIG", global = true)]
    config: Option<PathBuf>,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, conflicts_with = "verbose", global = true)]
    quiet: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print every record matching the book
    Identify(BookArgs),

    /// Download the cover of the best matching book
    Cover {
        #[command(flatten)]
        book: BookArgs,

        /// Where to write the image
        #[arg(short, long, value_name = "FILE")]
        output: PathBuf,
    },
}

#[derive(Args, Debug)]
struct BookArgs {
    /// Book title
    #[arg(long)]
    title: Option<String>,

    /// Author name (repeatable)
    #[arg(long = "author")]
    authors: Vec<String>,

    /// ISBN-10 or ISBN-13
    #[arg(long)]
    isbn: Option<String>,

    /// Shelfari book id
    #[arg(long)]
    shelfari_id: Option<String>,
}

impl BookArgs {
    fn to_request(&self) -> LookupRequest {
        let mut request = LookupRequest::new();
        if let Some(title) = &self.title {
            request = request.with_title(title.as_str());
        }
        for author in &self.authors {
            request = request.with_author(author.as_str());
        }
        if let Some(isbn) = &self.isbn {
            request = request.with_identifier(ISBN, isbn.as_str());
        }
        if let Some(id) = &self.shelfari_id {
            request = request.with_identifier(SHELFARI_ID, id.as_str());
        }
        request
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Setup logging based on verbosity
    setup_logging(cli.verbose, cli.quiet);

    let config = match &cli.config {
        Some(path) => {
            tracing::info!("Loading configuration from: {}", path.display());
            match load_config_with_hash(path) {
                Ok((config, hash)) => {
                    tracing::info!("Configuration loaded successfully (hash: {})", hash);
                    config
                }
                Err(e) => {
                    tracing::error!("Failed to load configuration: {}", e);
                    return Err(e.into());
                }
            }
        }
        None => Config::default(),
    };

    let abort = CancellationToken::new();
    let trigger = abort.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::warn!("Interrupted, aborting lookup");
            trigger.cancel();
        }
    });

    match cli.command {
        Command::Identify(book) => handle_identify(config, &book, &abort).await,
        Command::Cover { book, output } => handle_cover(config, &book, &output, &abort).await,
    }
}

/// Sets up the logging/tracing subscriber based on verbosity level
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("shelfari_metadata=info,warn"),
            1 => EnvFilter::new("shelfari_metadata=debug,info"),
            2 => EnvFilter::new("shelfari_metadata=trace,debug"),
            _ => EnvFilter::new("trace"),
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .with_writer(std::io::stderr)
        .init();
}

/// Handles the identify subcommand: prints the records in rank order
async fn handle_identify(
    config: Config,
    book: &BookArgs,
    abort: &CancellationToken,
) -> anyhow::Result<()> {
    let timeout = config.lookup.timeout();
    let source = Shelfari::new(config)?;
    let request = book.to_request();

    let (tx, mut rx) = mpsc::unbounded_channel();
    source.identify(&request, tx, abort, timeout).await?;

    let mut records = Vec::new();
    while let Ok(record) = rx.try_recv() {
        records.push(record);
    }
    records.sort_by_key(|record| record.relevance);

    if records.is_empty() {
        println!("No records found");
    }
    for record in &records {
        println!("{}\n", record);
    }

    Ok(())
}

/// Handles the cover subcommand: writes the image to `output`
async fn handle_cover(
    config: Config,
    book: &BookArgs,
    output: &Path,
    abort: &CancellationToken,
) -> anyhow::Result<()> {
    let timeout = config.lookup.timeout();
    let source = Shelfari::new(config)?;
    let request = book.to_request();

    let (tx, mut rx) = mpsc::unbounded_channel();
    source.download_cover(&request, tx, abort, timeout).await?;

    match rx.try_recv() {
        Ok(cover) => {
            std::fs::write(output, &cover.data)?;
            println!(
                "✓ Cover from {} written to: {} ({} bytes)",
                cover.url,
                output.display(),
                cover.data.len()
            );
        }
        Err(_) => println!("No cover found"),
    }

    Ok(())
}
