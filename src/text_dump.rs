//! Plain text dump of a PDF.
//!
//! Writes the text of every page, UTF-8 encoded, each page followed by a
//! form feed (0x0C).

use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};
use tracing::info;

/// Page separator written after each page.
pub const PAGE_SEPARATOR: u8 = 0x0C;

/// Errors that can occur while dumping text.
#[derive(Debug, thiserror::Error)]
pub enum TextDumpError {
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("Text extraction error: {0}")]
    Extraction(String),
}

/// Returns `<input>.txt`.
pub fn default_text_path(input: &Path) -> PathBuf {
    let mut name = input.as_os_str().to_os_string();
    name.push(".txt");
    PathBuf::from(name)
}

/// Writes page texts to `out`, each followed by [`PAGE_SEPARATOR`].
pub fn write_pages<W: Write>(pages: &[String], out: &mut W) -> io::Result<()> {
    for page in pages {
        out.write_all(page.as_bytes())?;
        out.write_all(&[PAGE_SEPARATOR])?;
    }
    out.flush()
}

/// Dumps the text of `input` into `output`. Returns the page count.
pub fn dump_text(input: &Path, output: &Path) -> Result<usize, TextDumpError> {
    let pages = pdf_extract::extract_text_by_pages(input)
        .map_err(|e| TextDumpError::Extraction(e.to_string()))?;

    let mut out = BufWriter::new(File::create(output)?);
    write_pages(&pages, &mut out)?;

    info!(
        input = %input.display(),
        output = %output.display(),
        pages = pages.len(),
        "text written"
    );
    Ok(pages.len())
}
