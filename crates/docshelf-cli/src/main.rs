//! docshelf CLI - Convert images to PDF documents and manage the shelf.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use docshelf_core::{AppConfig, DocumentStore, SelectionBuffer, Settings};
use indicatif::{ProgressBar, ProgressStyle};
use std::path::PathBuf;
use tracing::{Level, info};
use tracing_subscriber::FmtSubscriber;

#[derive(Parser, Debug)]
#[command(name = "docshelf")]
#[command(author, version, about = "Convert images to PDFs and manage the document shelf", long_about = None)]
struct Args {
    #[command(subcommand)]
    command: Command,

    /// Config file path
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Storage directory override
    #[arg(long, global = true, env = "DOCSHELF_STORAGE_DIR")]
    storage_dir: Option<PathBuf>,

    /// Verbose output
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Convert one or more images into a new PDF document
    Convert {
        /// Image files, in page order
        #[arg(required = true)]
        images: Vec<PathBuf>,
    },

    /// List stored documents, newest first
    List,

    /// Print the path of a stored document (for an external viewer)
    Show {
        /// Document name, file name, or path
        doc: String,
    },

    /// Copy a stored document to a destination file
    Export {
        doc: String,
        dest: PathBuf,
    },

    /// Delete a stored document and its file
    Delete {
        doc: String,
    },

    /// Delete one page of a stored document (0-indexed)
    DeletePage {
        doc: String,
        page: usize,
    },

    /// Merge two stored documents into a new one
    Merge {
        first: String,
        second: String,
    },

    /// Write a PNG thumbnail of a document's first page
    Thumbnail {
        doc: String,

        /// Output file (default: <doc>.png)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present (before parsing args so env vars are available)
    dotenvy::dotenv().ok();

    let args = Args::parse();

    // Setup logging
    let log_level = match args.verbose {
        0 => Level::WARN,
        1 => Level::INFO,
        2 => Level::DEBUG,
        _ => Level::TRACE,
    };

    FmtSubscriber::builder()
        .with_max_level(log_level)
        .with_target(false)
        .init();

    // Load or create config
    let mut config = if let Some(config_path) = &args.config {
        AppConfig::from_file(config_path).context("Failed to load config file")?
    } else {
        AppConfig::load()
    };

    if args.storage_dir.is_some() {
        config.storage_dir = args.storage_dir;
    }

    let mut store = DocumentStore::open(config).context("Failed to open document store")?;
    show_welcome_once(&store)?;

    match args.command {
        Command::Convert { images } => convert(&mut store, images).await,
        Command::List => list(&store),
        Command::Show { doc } => show(&store, &doc),
        Command::Export { doc, dest } => export(&store, &doc, &dest).await,
        Command::Delete { doc } => delete(&mut store, &doc).await,
        Command::DeletePage { doc, page } => delete_page(&mut store, &doc, page).await,
        Command::Merge { first, second } => merge(&mut store, &first, &second).await,
        Command::Thumbnail { doc, output } => thumbnail(&mut store, &doc, output),
    }
}

/// Print the first-run banner once, then remember that it was shown.
fn show_welcome_once(store: &DocumentStore) -> Result<()> {
    let mut settings =
        Settings::load(store.storage_dir()).context("Failed to load settings")?;
    if !settings.seen_welcome {
        #[allow(clippy::print_stdout)]
        {
            println!("Welcome to docshelf. Documents are stored in {}.", store.storage_dir().display());
        }
        settings.seen_welcome = true;
        settings.save(store.storage_dir()).context("Failed to save settings")?;
    }
    Ok(())
}

async fn convert(store: &mut DocumentStore, images: Vec<PathBuf>) -> Result<()> {
    let mut buffer = SelectionBuffer::new();

    // Decoding many large images dominates conversion time; show progress
    #[allow(clippy::cast_possible_truncation)]
    let pb = ProgressBar::new(images.len() as u64);
    // Template is hardcoded and valid, unwrap is safe
    #[allow(clippy::unwrap_used)]
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{bar:40.cyan/blue}] {pos}/{len} {msg}")
            .unwrap()
            .progress_chars("#>-"),
    );

    for path in &images {
        pb.set_message(path.display().to_string());
        buffer.push_file(path);
        pb.inc(1);
    }
    pb.finish_and_clear();

    info!("Staged {} of {} images", buffer.len(), images.len());

    let id = store
        .convert(&mut buffer)
        .await
        .context("Failed to convert images")?;
    let path = store.document_path(id)?;

    #[allow(clippy::print_stdout)]
    {
        println!("Created {}", path.display());
    }
    Ok(())
}

fn list(store: &DocumentStore) -> Result<()> {
    #[allow(clippy::print_stdout)]
    for doc in store.list() {
        println!(
            "{}\t{}\t{}",
            doc.created_at.format("%Y-%m-%d %H:%M:%S"),
            doc.name,
            doc.path.display()
        );
    }
    Ok(())
}

fn show(store: &DocumentStore, doc: &str) -> Result<()> {
    let id = store.resolve(doc)?;
    let path = store.document_path(id)?;

    #[allow(clippy::print_stdout)]
    {
        println!("{}", path.display());
    }
    Ok(())
}

async fn export(store: &DocumentStore, doc: &str, dest: &std::path::Path) -> Result<()> {
    let id = store.resolve(doc)?;
    store
        .export(id, dest)
        .await
        .context("Failed to export document")?;

    #[allow(clippy::print_stdout)]
    {
        println!("Exported to {}", dest.display());
    }
    Ok(())
}

async fn delete(store: &mut DocumentStore, doc: &str) -> Result<()> {
    let id = store.resolve(doc)?;
    store
        .delete_document(id)
        .await
        .context("Failed to delete document")?;

    #[allow(clippy::print_stdout)]
    {
        println!("Deleted {doc}");
    }
    Ok(())
}

async fn delete_page(store: &mut DocumentStore, doc: &str, page: usize) -> Result<()> {
    let id = store.resolve(doc)?;
    store
        .delete_page(id, page)
        .await
        .context("Failed to delete page")?;
    let path = store.document_path(id)?;

    #[allow(clippy::print_stdout)]
    {
        println!("Removed page {page}; document rebuilt at {}", path.display());
    }
    Ok(())
}

async fn merge(store: &mut DocumentStore, first: &str, second: &str) -> Result<()> {
    let first_id = store.resolve(first)?;
    let second_id = store.resolve(second)?;

    store.start_merge(first_id).context("Failed to start merge")?;
    let merged = store
        .select_second(second_id)
        .await
        .context("Failed to merge documents")?;
    let path = store.document_path(merged)?;

    #[allow(clippy::print_stdout)]
    {
        println!("Merged into {}", path.display());
    }
    Ok(())
}

fn thumbnail(store: &mut DocumentStore, doc: &str, output: Option<PathBuf>) -> Result<()> {
    let id = store.resolve(doc)?;
    let png = store
        .thumbnail(id)
        .context("No thumbnail could be produced")?
        .to_vec();

    let output = output.unwrap_or_else(|| PathBuf::from(format!("{doc}.png")));
    std::fs::write(&output, png)
        .context(format!("Failed to write {}", output.display()))?;

    #[allow(clippy::print_stdout)]
    {
        println!("Thumbnail saved to {}", output.display());
    }
    Ok(())
}
