//! colordb-pdf CLI
//!
//! Renders the color database reference PDF and runs the small document
//! utilities bundled with the library.

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use colordb_pdf::sink::RecordingSink;
use colordb_pdf::{
    builtin_catalog, embedded, load_catalog, raster, render_catalog, render_pages, text_dump,
    DocumentMetadata, Paginator, SaveOptions,
};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::info;
use tracing_subscriber::EnvFilter;

/// Color database renderer and PDF utilities
#[derive(Parser, Debug)]
#[command(name = "colordb-pdf")]
#[command(version, about, long_about = None)]
struct Cli {
    /// Enable debug logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Render the named color catalog as a PDF, sorted down by RGB values
    Catalog {
        /// rgb.txt-style catalog file (defaults to the built-in named colors)
        #[arg(long)]
        catalog: Option<PathBuf>,

        /// Output PDF file
        #[arg(short, long, default_value = "colordb.pdf")]
        output: PathBuf,

        /// Document author
        #[arg(long)]
        author: Option<String>,

        /// Document title
        #[arg(long)]
        title: Option<String>,

        /// Object pruning level: 0 keeps everything, 1-2 prune, 3+ also renumber
        #[arg(long, default_value_t = 4)]
        garbage: u8,

        /// Leave content streams uncompressed
        #[arg(long)]
        no_deflate: bool,

        /// Keep zero-length streams
        #[arg(long)]
        no_clean: bool,

        /// Lay the catalog out and report the drawing calls without writing
        #[arg(long)]
        dry_run: bool,
    },

    /// Convert any supported image to an RGB PNG
    ImageToPng {
        /// Input image
        input: PathBuf,

        /// Output PNG (defaults to <input>-from-image.png)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Export an embedded file from a PDF
    EmbeddedExport {
        /// Input PDF
        input: PathBuf,

        /// Name of the embedded file
        #[arg(required_unless_present = "list")]
        name: Option<String>,

        /// File to write the content to
        #[arg(required_unless_present = "list")]
        output: Option<PathBuf>,

        /// List embedded file names instead of exporting
        #[arg(long, conflicts_with_all = ["name", "output"])]
        list: bool,
    },

    /// Write the text of every page to a file, one form feed after each page
    Pdf2text {
        /// Input PDF
        input: PathBuf,

        /// Output text file (defaults to <input>.txt)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match cli.command {
        Commands::Catalog {
            catalog,
            output,
            author,
            title,
            garbage,
            no_deflate,
            no_clean,
            dry_run,
        } => {
            let entries = match &catalog {
                Some(path) => load_catalog(path)
                    .with_context(|| format!("Failed to read catalog {}", path.display()))?,
                None => builtin_catalog(),
            };
            info!(colors = entries.len(), "catalog loaded");

            let mut metadata = DocumentMetadata {
                author,
                ..DocumentMetadata::default()
            };
            if title.is_some() {
                metadata.title = title;
            }
            let options = SaveOptions {
                garbage,
                deflate: !no_deflate,
                clean: !no_clean,
            };

            if dry_run {
                let pages = Paginator::new().paginate(&entries)?;
                let page_count = pages.len();
                let mut sink = RecordingSink::new();
                render_pages(pages, &mut sink, &metadata, &options)?;
                println!(
                    "{} colors, {} pages, {} drawing calls",
                    entries.len(),
                    page_count,
                    sink.calls.len()
                );
                return Ok(());
            }

            let pdf = render_catalog(&entries, &metadata, &options)?;
            fs::write(&output, &pdf)
                .with_context(|| format!("Failed to write {}", output.display()))?;
            println!("Writing: {}", output.display());
        }

        Commands::ImageToPng { input, output } => {
            require_file(&input)?;
            let output = output.unwrap_or_else(|| raster::default_png_path(&input));
            let (width, height) = raster::image_to_png(&input, &output)?;
            println!("Writing {} ({}x{})", output.display(), width, height);
        }

        Commands::EmbeddedExport {
            input,
            name,
            output,
            list,
        } => {
            require_file(&input)?;
            if list {
                let pdf = fs::read(&input)?;
                for name in embedded::list_embedded_files(&pdf)? {
                    println!("{}", name);
                }
                return Ok(());
            }

            let (Some(name), Some(output)) = (name, output) else {
                bail!("Both NAME and OUTPUT are required unless --list is given");
            };
            let written = embedded::export_embedded_file(&input, &name, &output)?;
            println!("Exported {:?} to {} ({} bytes)", name, output.display(), written);
        }

        Commands::Pdf2text { input, output } => {
            require_file(&input)?;
            let output = output.unwrap_or_else(|| text_dump::default_text_path(&input));
            let pages = text_dump::dump_text(&input, &output)?;
            println!("Wrote {} pages to {}", pages, output.display());
        }
    }

    Ok(())
}

fn init_tracing(verbose: bool) {
    let default_level = if verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .with_writer(std::io::stderr)
        .init();
}

fn require_file(path: &Path) -> Result<()> {
    if !path.exists() {
        bail!("File not found: {}", path.display());
    }
    Ok(())
}
