//! colordb_pdf
//!
//! Renders a paginated PDF reference of named RGB colors, and bundles a few
//! small document utilities: image to PNG conversion, embedded file export
//! and plain text dumps.

pub mod catalog;
pub mod embedded;
pub mod finish;
pub mod paginator;
pub mod raster;
pub mod sink;
pub mod text_dump;

pub use catalog::{builtin_catalog, load_catalog, parse_catalog, CatalogError, ColorEntry};
pub use embedded::{EmbeddedError, EmbeddedFile};
pub use paginator::{paginate, GridLayout, Page, PaginateError, Paginator, SortKey};
pub use raster::{Pixmap, RasterError};
pub use sink::{
    render_catalog, render_pages, DocumentMetadata, DocumentSink, PdfSink, RenderError,
    SaveOptions, SinkError,
};
pub use text_dump::TextDumpError;
