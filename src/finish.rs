//! Finishing pass over a written PDF.
//!
//! Rewrites the document information dictionary and applies the
//! [`SaveOptions`] compaction steps in order: clean, garbage, deflate.

use crate::sink::{DocumentMetadata, SaveOptions, SinkError};
use chrono::{DateTime, Utc};
use lopdf::{Dictionary, Document, Object, StringFormat};
use tracing::debug;

/// Formats a timestamp as a PDF date string, e.g. `D:20170730082113Z`.
pub fn pdf_date(date: &DateTime<Utc>) -> String {
    date.format("D:%Y%m%d%H%M%SZ").to_string()
}

/// Encodes a PDF text string: PDFDocEncoding-compatible ASCII stays a literal
/// string, anything else becomes UTF-16BE with a byte order mark.
fn text_string(text: &str) -> Object {
    if text.is_ascii() {
        return Object::string_literal(text);
    }

    let mut bytes = vec![0xFE, 0xFF];
    for unit in text.encode_utf16() {
        bytes.extend_from_slice(&unit.to_be_bytes());
    }
    Object::String(bytes, StringFormat::Hexadecimal)
}

fn info_dictionary(metadata: &DocumentMetadata) -> Dictionary {
    let mut info = Dictionary::new();

    let text_fields = [
        ("Title", &metadata.title),
        ("Subject", &metadata.subject),
        ("Author", &metadata.author),
        ("Creator", &metadata.creator),
        ("Producer", &metadata.producer),
    ];
    for (key, value) in text_fields {
        if let Some(value) = value {
            info.set(key, text_string(value));
        }
    }

    if let Some(date) = &metadata.creation_date {
        info.set("CreationDate", Object::string_literal(pdf_date(date)));
    }
    if let Some(date) = &metadata.mod_date {
        info.set("ModDate", Object::string_literal(pdf_date(date)));
    }

    info
}

/// Applies metadata and save options to serialized PDF bytes.
pub fn finish_document(
    pdf: &[u8],
    metadata: &DocumentMetadata,
    options: &SaveOptions,
) -> Result<Vec<u8>, SinkError> {
    let mut doc = Document::load_mem(pdf)?;

    let info_id = doc.add_object(info_dictionary(metadata));
    doc.trailer.set("Info", info_id);

    if options.clean {
        let removed = doc.delete_zero_length_streams();
        debug!(removed = removed.len(), "removed zero-length streams");
    }
    if options.garbage > 0 {
        let pruned = doc.prune_objects();
        debug!(pruned = pruned.len(), "pruned unreferenced objects");
    }
    if options.garbage >= 3 {
        doc.renumber_objects();
    }
    if options.deflate {
        doc.compress();
    }

    let mut out = Vec::new();
    doc.save_to(&mut out)?;
    Ok(out)
}
