//! Document sinks.
//!
//! A sink turns drawing directives into a persisted document. The
//! paginator only produces [`Page`]s; [`render_pages`] replays them into any
//! [`DocumentSink`]. [`PdfSink`] writes PDF through `printpdf` and finishes the
//! file with [`crate::finish::finish_document`].

use crate::catalog::ColorEntry;
use crate::finish::finish_document;
use crate::paginator::{Directive, Page, PaginateError, Paginator, Point, Rect, RgbColor};
use chrono::{DateTime, Utc};
use printpdf::path::PaintMode;
use printpdf::{
    BuiltinFont, Color, IndirectFontRef, Mm, PdfDocument, PdfDocumentReference,
    PdfLayerReference, Rgb,
};
use std::io::{self, BufWriter};
use tracing::{debug, info};

/// Errors that can occur while writing a document.
#[derive(Debug, thiserror::Error)]
pub enum SinkError {
    #[error("No pages provided")]
    NoPages,

    #[error("Content added before the first page was created")]
    NoPage,

    #[error("PDF creation error: {0}")]
    PdfCreation(String),

    #[error("Invalid page dimensions: width={width}, height={height}")]
    InvalidDimensions { width: f32, height: f32 },

    #[error("PDF post-processing error: {0}")]
    Finish(#[from] ::lopdf::Error),

    #[error("IO error: {0}")]
    Io(#[from] io::Error),
}

/// Document information written on save.
#[derive(Debug, Clone, PartialEq)]
pub struct DocumentMetadata {
    pub title: Option<String>,
    pub subject: Option<String>,
    pub author: Option<String>,
    pub creator: Option<String>,
    pub producer: Option<String>,
    pub creation_date: Option<DateTime<Utc>>,
    pub mod_date: Option<DateTime<Utc>>,
}

impl Default for DocumentMetadata {
    fn default() -> Self {
        let now = Utc::now();
        DocumentMetadata {
            title: Some("Color Database".to_string()),
            subject: Some("Sorted down by RGB values".to_string()),
            author: None,
            creator: Some("colordb-pdf".to_string()),
            producer: Some(format!("colordb_pdf {}", env!("CARGO_PKG_VERSION"))),
            creation_date: Some(now),
            mod_date: Some(now),
        }
    }
}

/// Compaction knobs applied when the document is saved.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SaveOptions {
    /// 0 keeps every object, 1 and 2 drop unreferenced objects,
    /// 3 and above also renumber the remaining ones.
    pub garbage: u8,
    /// Compress content streams.
    pub deflate: bool,
    /// Remove zero-length streams.
    pub clean: bool,
}

impl Default for SaveOptions {
    fn default() -> Self {
        SaveOptions {
            garbage: 4,
            deflate: true,
            clean: true,
        }
    }
}

impl SaveOptions {
    /// Options that leave the document exactly as written.
    pub fn none() -> Self {
        SaveOptions {
            garbage: 0,
            deflate: false,
            clean: false,
        }
    }
}

/// Receives drawing commands and produces a persisted document.
///
/// Coordinates are in points with a top-left origin.
pub trait DocumentSink {
    fn new_page(&mut self, width: f32, height: f32) -> Result<(), SinkError>;

    fn draw_rect(&mut self, rect: Rect, stroke: RgbColor, fill: RgbColor) -> Result<(), SinkError>;

    fn insert_text(
        &mut self,
        origin: Point,
        text: &str,
        font_size: f32,
        color: RgbColor,
    ) -> Result<(), SinkError>;

    fn save(self, metadata: &DocumentMetadata, options: &SaveOptions)
        -> Result<Vec<u8>, SinkError>;
}

/// Replays laid-out pages into a sink and saves the result.
pub fn render_pages<S: DocumentSink>(
    pages: Vec<Page>,
    mut sink: S,
    metadata: &DocumentMetadata,
    options: &SaveOptions,
) -> Result<Vec<u8>, SinkError> {
    if pages.is_empty() {
        return Err(SinkError::NoPages);
    }

    let page_count = pages.len();
    for page in pages {
        sink.new_page(page.width, page.height)?;
        for directive in page.directives() {
            match directive {
                Directive::DrawRect { rect, color } => sink.draw_rect(*rect, *color, *color)?,
                Directive::InsertText {
                    origin,
                    text,
                    font_size,
                    color,
                } => sink.insert_text(*origin, text, *font_size, *color)?,
            }
        }
        debug!(page = page.index, cells = page.cells.len(), "page rendered");
    }

    let bytes = sink.save(metadata, options)?;
    info!(pages = page_count, bytes = bytes.len(), "document saved");
    Ok(bytes)
}

/// Errors that can occur while rendering a catalog.
#[derive(Debug, thiserror::Error)]
pub enum RenderError {
    #[error(transparent)]
    Paginate(#[from] PaginateError),

    #[error(transparent)]
    Sink(#[from] SinkError),
}

/// Paginates a catalog with the default layout and writes it as PDF.
pub fn render_catalog(
    catalog: &[ColorEntry],
    metadata: &DocumentMetadata,
    options: &SaveOptions,
) -> Result<Vec<u8>, RenderError> {
    let pages = Paginator::new().paginate(catalog)?;
    let sink = match &metadata.title {
        Some(title) => PdfSink::with_name(title.as_str()),
        None => PdfSink::new(),
    };
    Ok(render_pages(pages, sink, metadata, options)?)
}

/// Converts points to millimeters.
fn points_to_mm(points: f32) -> f32 {
    points * 0.352778
}

fn pdf_color(color: RgbColor) -> Color {
    Color::Rgb(Rgb::new(color.r, color.g, color.b, None))
}

struct OpenDocument {
    doc: PdfDocumentReference,
    font: IndirectFontRef,
    layer: PdfLayerReference,
    page_height: f32,
    page_count: usize,
}

/// Writes PDF documents with `printpdf`.
pub struct PdfSink {
    name: String,
    outline_thickness: f32,
    current: Option<OpenDocument>,
}

impl Default for PdfSink {
    fn default() -> Self {
        PdfSink {
            name: "Color Database".to_string(),
            outline_thickness: 1.0,
            current: None,
        }
    }
}

impl PdfSink {
    /// Creates a new PdfSink.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a new PdfSink whose first page creates a document named `name`.
    pub fn with_name(name: impl Into<String>) -> Self {
        PdfSink {
            name: name.into(),
            ..Self::default()
        }
    }

    /// Number of pages created so far.
    pub fn page_count(&self) -> usize {
        self.current.as_ref().map_or(0, |open| open.page_count)
    }

    fn open(&mut self) -> Result<&mut OpenDocument, SinkError> {
        self.current.as_mut().ok_or(SinkError::NoPage)
    }
}

impl DocumentSink for PdfSink {
    fn new_page(&mut self, width: f32, height: f32) -> Result<(), SinkError> {
        if width <= 0.0 || height <= 0.0 {
            return Err(SinkError::InvalidDimensions { width, height });
        }

        let (w, h) = (Mm(points_to_mm(width)), Mm(points_to_mm(height)));
        let thickness = self.outline_thickness;

        if let Some(open) = self.current.as_mut() {
            let (page_idx, layer_idx) = open.doc.add_page(w, h, "Layer 1");
            open.layer = open.doc.get_page(page_idx).get_layer(layer_idx);
            open.layer.set_outline_thickness(thickness);
            open.page_height = height;
            open.page_count += 1;
            return Ok(());
        }

        let (doc, page_idx, layer_idx) = PdfDocument::new(self.name.as_str(), w, h, "Layer 1");
        let font = doc
            .add_builtin_font(BuiltinFont::Helvetica)
            .map_err(|e| SinkError::PdfCreation(e.to_string()))?;
        let layer = doc.get_page(page_idx).get_layer(layer_idx);
        layer.set_outline_thickness(thickness);
        self.current = Some(OpenDocument {
            doc,
            font,
            layer,
            page_height: height,
            page_count: 1,
        });

        Ok(())
    }

    fn draw_rect(&mut self, rect: Rect, stroke: RgbColor, fill: RgbColor) -> Result<(), SinkError> {
        let open = self.open()?;
        let height = open.page_height;

        open.layer.set_outline_color(pdf_color(stroke));
        open.layer.set_fill_color(pdf_color(fill));
        open.layer.add_rect(
            printpdf::Rect::new(
                Mm(points_to_mm(rect.x0)),
                Mm(points_to_mm(height - rect.y1)),
                Mm(points_to_mm(rect.x1)),
                Mm(points_to_mm(height - rect.y0)),
            )
            .with_mode(PaintMode::FillStroke),
        );

        Ok(())
    }

    fn insert_text(
        &mut self,
        origin: Point,
        text: &str,
        font_size: f32,
        color: RgbColor,
    ) -> Result<(), SinkError> {
        let open = self.open()?;
        let height = open.page_height;

        open.layer.set_fill_color(pdf_color(color));
        open.layer.use_text(
            text,
            font_size,
            Mm(points_to_mm(origin.x)),
            Mm(points_to_mm(height - origin.y)),
            &open.font,
        );

        Ok(())
    }

    fn save(
        self,
        metadata: &DocumentMetadata,
        options: &SaveOptions,
    ) -> Result<Vec<u8>, SinkError> {
        let open = self.current.ok_or(SinkError::NoPages)?;

        let mut buf = Vec::new();
        open.doc
            .save(&mut BufWriter::new(&mut buf))
            .map_err(|e| SinkError::PdfCreation(e.to_string()))?;
        debug!(pages = open.page_count, bytes = buf.len(), "pdf written");

        finish_document(&buf, metadata, options)
    }
}

/// A call received by a [`RecordingSink`].
#[derive(Debug, Clone, PartialEq)]
pub enum SinkCall {
    NewPage {
        width: f32,
        height: f32,
    },
    DrawRect {
        rect: Rect,
        stroke: RgbColor,
        fill: RgbColor,
    },
    InsertText {
        origin: Point,
        text: String,
        font_size: f32,
        color: RgbColor,
    },
}

/// A sink that records every call instead of writing a document.
/// Saving returns an empty buffer.
#[derive(Debug, Default)]
pub struct RecordingSink {
    pub calls: Vec<SinkCall>,
    has_page: bool,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }
}

impl DocumentSink for &mut RecordingSink {
    fn new_page(&mut self, width: f32, height: f32) -> Result<(), SinkError> {
        self.calls.push(SinkCall::NewPage { width, height });
        self.has_page = true;
        Ok(())
    }

    fn draw_rect(&mut self, rect: Rect, stroke: RgbColor, fill: RgbColor) -> Result<(), SinkError> {
        if !self.has_page {
            return Err(SinkError::NoPage);
        }
        self.calls.push(SinkCall::DrawRect { rect, stroke, fill });
        Ok(())
    }

    fn insert_text(
        &mut self,
        origin: Point,
        text: &str,
        font_size: f32,
        color: RgbColor,
    ) -> Result<(), SinkError> {
        if !self.has_page {
            return Err(SinkError::NoPage);
        }
        self.calls.push(SinkCall::InsertText {
            origin,
            text: text.to_string(),
            font_size,
            color,
        });
        Ok(())
    }

    fn save(
        self,
        _metadata: &DocumentMetadata,
        _options: &SaveOptions,
    ) -> Result<Vec<u8>, SinkError> {
        Ok(Vec::new())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::ColorEntry;
    use crate::paginator::paginate;

    fn catalog(n: usize) -> Vec<ColorEntry> {
        (0..n)
            .map(|i| ColorEntry::new(format!("Color{}", i), i as u8, 0, 0))
            .collect()
    }

    #[test]
    fn test_points_to_mm() {
        // 72 points = 1 inch = 25.4 mm
        let mm = points_to_mm(72.0);
        assert!((mm - 25.4).abs() < 0.1);
    }

    #[test]
    fn test_render_call_sequence() {
        let pages = paginate(&catalog(101)).unwrap();
        let mut sink = RecordingSink::new();
        let bytes = render_pages(
            pages,
            &mut sink,
            &DocumentMetadata::default(),
            &SaveOptions::default(),
        )
        .unwrap();
        assert!(bytes.is_empty());

        let new_pages: Vec<_> = sink
            .calls
            .iter()
            .enumerate()
            .filter(|(_, c)| matches!(c, SinkCall::NewPage { .. }))
            .map(|(i, _)| i)
            .collect();
        // 1 new page + 3 calls per cell
        assert_eq!(new_pages, vec![0, 301]);
        assert_eq!(sink.calls.len(), 2 + 101 * 3);
        assert_eq!(
            sink.calls[0],
            SinkCall::NewPage {
                width: 800.0,
                height: 600.0
            }
        );

        match &sink.calls[1] {
            SinkCall::DrawRect { stroke, fill, .. } => assert_eq!(stroke, fill),
            other => panic!("expected rectangle, got {:?}", other),
        }
        match (&sink.calls[2], &sink.calls[3]) {
            (
                SinkCall::InsertText { color: first, .. },
                SinkCall::InsertText { color: second, .. },
            ) => {
                assert_eq!(*first, RgbColor::WHITE);
                assert_eq!(*second, RgbColor::BLACK);
            }
            other => panic!("expected two labels, got {:?}", other),
        }
    }

    /// Fails on the n-th `insert_text` call and counts everything it receives.
    #[derive(Default)]
    struct FailingSink {
        fail_on_text: usize,
        texts: usize,
        calls: usize,
        saved: bool,
    }

    impl DocumentSink for &mut FailingSink {
        fn new_page(&mut self, _width: f32, _height: f32) -> Result<(), SinkError> {
            self.calls += 1;
            Ok(())
        }

        fn draw_rect(&mut self, _rect: Rect, _stroke: RgbColor, _fill: RgbColor) -> Result<(), SinkError> {
            self.calls += 1;
            Ok(())
        }

        fn insert_text(
            &mut self,
            _origin: Point,
            _text: &str,
            _font_size: f32,
            _color: RgbColor,
        ) -> Result<(), SinkError> {
            self.calls += 1;
            self.texts += 1;
            if self.texts == self.fail_on_text {
                return Err(SinkError::PdfCreation("disk full".to_string()));
            }
            Ok(())
        }

        fn save(
            self,
            _metadata: &DocumentMetadata,
            _options: &SaveOptions,
        ) -> Result<Vec<u8>, SinkError> {
            self.saved = true;
            Ok(vec![1])
        }
    }

    #[test]
    fn test_render_propagates_sink_error() {
        let pages = paginate(&catalog(5)).unwrap();
        let mut sink = FailingSink {
            fail_on_text: 3,
            ..FailingSink::default()
        };
        let result = render_pages(
            pages,
            &mut sink,
            &DocumentMetadata::default(),
            &SaveOptions::default(),
        );

        match result {
            Err(SinkError::PdfCreation(message)) => assert_eq!(message, "disk full"),
            other => panic!("expected the sink error, got {:?}", other),
        }
        // new_page, rect, text, text, rect, text (fails)
        assert_eq!(sink.calls, 6);
        assert_eq!(sink.texts, 3);
        assert!(!sink.saved);
    }

    #[test]
    fn test_error_conversions() {
        let err: SinkError = io::Error::new(io::ErrorKind::WriteZero, "short write").into();
        assert!(matches!(err, SinkError::Io(_)));
        assert!(err.to_string().contains("short write"));

        let err: SinkError = ::lopdf::Document::load_mem(b"not a pdf").unwrap_err().into();
        assert!(matches!(err, SinkError::Finish(_)));
    }

    #[test]
    fn test_recording_sink_requires_page() {
        let mut sink = RecordingSink::new();
        let result = (&mut sink).insert_text(Point::new(0.0, 0.0), "x", 8.0, RgbColor::BLACK);
        assert!(matches!(result, Err(SinkError::NoPage)));
        assert!(sink.calls.is_empty());
    }

    #[test]
    fn test_render_no_pages() {
        let mut sink = RecordingSink::new();
        let result = render_pages(
            vec![],
            &mut sink,
            &DocumentMetadata::default(),
            &SaveOptions::default(),
        );
        assert!(matches!(result, Err(SinkError::NoPages)));
    }

    #[test]
    fn test_pdf_sink_requires_page() {
        let mut sink = PdfSink::new();
        let result = sink.draw_rect(
            Rect::new(0.0, 0.0, 10.0, 10.0),
            RgbColor::BLACK,
            RgbColor::BLACK,
        );
        assert!(matches!(result, Err(SinkError::NoPage)));
    }

    #[test]
    fn test_pdf_sink_save_without_pages() {
        let sink = PdfSink::new();
        let result = sink.save(&DocumentMetadata::default(), &SaveOptions::default());
        assert!(matches!(result, Err(SinkError::NoPages)));
    }

    #[test]
    fn test_pdf_sink_invalid_dimensions() {
        let mut sink = PdfSink::new();
        let result = sink.new_page(0.0, 600.0);
        assert!(matches!(result, Err(SinkError::InvalidDimensions { .. })));
    }

    #[test]
    fn test_pdf_sink_renders_pdf() {
        let pages = paginate(&catalog(150)).unwrap();
        let pdf = render_pages(
            pages,
            PdfSink::new(),
            &DocumentMetadata::default(),
            &SaveOptions::default(),
        )
        .unwrap();

        assert!(pdf.starts_with(b"%PDF-"));
        let doc = ::lopdf::Document::load_mem(&pdf).unwrap();
        assert_eq!(doc.get_pages().len(), 2);
    }

    #[test]
    fn test_render_catalog_empty() {
        let result = render_catalog(&[], &DocumentMetadata::default(), &SaveOptions::default());
        assert!(matches!(
            result,
            Err(RenderError::Paginate(PaginateError::EmptyCatalog))
        ));
    }

    #[test]
    fn test_pdf_sink_page_count() {
        let mut sink = PdfSink::new();
        assert_eq!(sink.page_count(), 0);
        sink.new_page(800.0, 600.0).unwrap();
        sink.new_page(800.0, 600.0).unwrap();
        assert_eq!(sink.page_count(), 2);
    }
}
