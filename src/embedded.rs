//! Embedded file export.
//!
//! Files attached at document level live in the `EmbeddedFiles` name tree
//! under the catalog's `Names` dictionary. Each leaf maps a name to a file
//! specification whose `EF` dictionary points at the embedded stream.

use lopdf::{Dictionary, Document, Object};
use std::fs;
use std::io;
use std::path::Path;
use tracing::{debug, info};

/// Nesting limit for name tree `Kids`.
const MAX_TREE_DEPTH: usize = 32;

/// Errors that can occur while exporting embedded files.
#[derive(Debug, thiserror::Error)]
pub enum EmbeddedError {
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("PDF parse error: {0}")]
    Parse(#[from] lopdf::Error),

    #[error("No embedded file named {0:?}")]
    NotFound(String),

    #[error("Embedded file {0:?} has no file stream")]
    MissingStream(String),
}

/// An embedded file with its decoded content.
#[derive(Debug, Clone, PartialEq)]
pub struct EmbeddedFile {
    /// Key in the name tree.
    pub name: String,
    /// File name from the file specification, if present.
    pub filename: Option<String>,
    pub data: Vec<u8>,
}

/// Decodes a PDF text string (UTF-16BE with BOM, otherwise bytes as-is).
fn decode_text(bytes: &[u8]) -> String {
    if let Some(rest) = bytes.strip_prefix(&[0xFE, 0xFF]) {
        let units: Vec<u16> = rest
            .chunks_exact(2)
            .map(|pair| u16::from_be_bytes([pair[0], pair[1]]))
            .collect();
        return String::from_utf16_lossy(&units);
    }
    String::from_utf8_lossy(bytes).into_owned()
}

fn resolve<'a>(doc: &'a Document, object: &'a Object) -> Result<&'a Object, lopdf::Error> {
    doc.dereference(object).map(|(_, resolved)| resolved)
}

fn resolve_dict<'a>(doc: &'a Document, object: &'a Object) -> Result<&'a Dictionary, lopdf::Error> {
    resolve(doc, object)?.as_dict()
}

/// Collects `(name, file spec)` leaves of a name tree node.
fn collect_leaves<'a>(
    doc: &'a Document,
    node: &'a Dictionary,
    depth: usize,
    leaves: &mut Vec<(String, &'a Object)>,
) -> Result<(), lopdf::Error> {
    if depth > MAX_TREE_DEPTH {
        debug!(depth, "name tree too deep, stopping");
        return Ok(());
    }

    if let Ok(names) = node.get(b"Names") {
        let names = resolve(doc, names)?.as_array()?;
        for pair in names.chunks_exact(2) {
            let key = resolve(doc, &pair[0])?.as_str()?;
            leaves.push((decode_text(key), &pair[1]));
        }
    }

    if let Ok(kids) = node.get(b"Kids") {
        for kid in resolve(doc, kids)?.as_array()? {
            collect_leaves(doc, resolve_dict(doc, kid)?, depth + 1, leaves)?;
        }
    }

    Ok(())
}

fn embedded_leaves(doc: &Document) -> Result<Vec<(String, &Object)>, lopdf::Error> {
    let mut leaves = Vec::new();

    let catalog = doc.catalog()?;
    let Ok(names) = catalog.get(b"Names") else {
        return Ok(leaves);
    };
    let Ok(tree) = resolve_dict(doc, names)?.get(b"EmbeddedFiles") else {
        return Ok(leaves);
    };

    collect_leaves(doc, resolve_dict(doc, tree)?, 0, &mut leaves)?;
    Ok(leaves)
}

fn read_file_spec(doc: &Document, name: &str, spec: &Object) -> Result<EmbeddedFile, EmbeddedError> {
    let spec = resolve_dict(doc, spec)?;

    let filename = [b"UF".as_slice(), b"F".as_slice()]
        .iter()
        .find_map(|key| spec.get(key).ok())
        .and_then(|value| resolve(doc, value).ok())
        .and_then(|value| value.as_str().ok())
        .map(decode_text);

    let ef = spec
        .get(b"EF")
        .map_err(|_| EmbeddedError::MissingStream(name.to_string()))?;
    let ef = resolve_dict(doc, ef)?;
    let stream_ref = ef
        .get(b"F")
        .or_else(|_| ef.get(b"UF"))
        .map_err(|_| EmbeddedError::MissingStream(name.to_string()))?;
    let stream = resolve(doc, stream_ref)?.as_stream()?;

    let data = if stream.dict.has(b"Filter") {
        stream.decompressed_content()?
    } else {
        stream.content.clone()
    };

    Ok(EmbeddedFile {
        name: name.to_string(),
        filename,
        data,
    })
}

/// Lists the names of all embedded files, in name tree order.
pub fn list_embedded_files(pdf: &[u8]) -> Result<Vec<String>, EmbeddedError> {
    let doc = Document::load_mem(pdf)?;
    let names = embedded_leaves(&doc)?
        .into_iter()
        .map(|(name, _)| name)
        .collect();
    Ok(names)
}

/// Extracts the embedded file registered under `name`.
pub fn extract_embedded_file(pdf: &[u8], name: &str) -> Result<EmbeddedFile, EmbeddedError> {
    let doc = Document::load_mem(pdf)?;
    let leaves = embedded_leaves(&doc)?;
    debug!(count = leaves.len(), "embedded files found");

    let (_, spec) = leaves
        .into_iter()
        .find(|(key, _)| key == name)
        .ok_or_else(|| EmbeddedError::NotFound(name.to_string()))?;

    read_file_spec(&doc, name, spec)
}

/// Extracts the embedded file `name` from the PDF at `input` into `output`.
/// Returns the number of bytes written.
pub fn export_embedded_file(input: &Path, name: &str, output: &Path) -> Result<usize, EmbeddedError> {
    let pdf = fs::read(input)?;
    let file = extract_embedded_file(&pdf, name)?;
    fs::write(output, &file.data)?;
    info!(
        name,
        output = %output.display(),
        bytes = file.data.len(),
        "embedded file exported"
    );
    Ok(file.data.len())
}
