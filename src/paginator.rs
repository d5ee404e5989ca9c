//! Color catalog pagination.
//!
//! Lays a catalog of named colors out on a fixed grid of cells, page after
//! page. Entries are ordered by descending [`SortKey`] and fill each page
//! row-major before the next page is started. Every cell carries three
//! drawing directives: the filled swatch, then its lower-cased name twice,
//! first in white and then one line lower in black, so that one of the two
//! labels stays readable on any background.
//!
//! Coordinates use a top-left origin with y growing downward.

use crate::catalog::ColorEntry;
use std::cmp::Reverse;
use tracing::debug;

/// Errors that can occur during pagination.
#[derive(Debug, thiserror::Error)]
pub enum PaginateError {
    #[error("Color catalog is empty")]
    EmptyCatalog,

    #[error("Invalid grid layout: {columns} columns x {rows} rows")]
    InvalidLayout { columns: u32, rows: u32 },
}

/// An axis-aligned rectangle.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rect {
    pub x0: f32,
    pub y0: f32,
    pub x1: f32,
    pub y1: f32,
}

impl Rect {
    pub fn new(x0: f32, y0: f32, x1: f32, y1: f32) -> Self {
        Rect { x0, y0, x1, y1 }
    }

    pub fn width(&self) -> f32 {
        self.x1 - self.x0
    }

    pub fn height(&self) -> f32 {
        self.y1 - self.y0
    }

    /// Returns true if the interiors of both rectangles overlap.
    pub fn intersects(&self, other: &Rect) -> bool {
        self.x0 < other.x1 && other.x0 < self.x1 && self.y0 < other.y1 && other.y0 < self.y1
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Point {
    pub x: f32,
    pub y: f32,
}

impl Point {
    pub fn new(x: f32, y: f32) -> Self {
        Point { x, y }
    }
}

/// An RGB color with channels normalized to `0.0..=1.0`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RgbColor {
    pub r: f32,
    pub g: f32,
    pub b: f32,
}

impl RgbColor {
    pub const WHITE: RgbColor = RgbColor {
        r: 1.0,
        g: 1.0,
        b: 1.0,
    };

    pub const BLACK: RgbColor = RgbColor {
        r: 0.0,
        g: 0.0,
        b: 0.0,
    };

    pub fn new(r: f32, g: f32, b: f32) -> Self {
        RgbColor { r, g, b }
    }

    /// Converts 8-bit channels by dividing each by 255.
    pub fn from_rgb8(r: u8, g: u8, b: u8) -> Self {
        RgbColor {
            r: r as f32 / 255.0,
            g: g as f32 / 255.0,
            b: b as f32 / 255.0,
        }
    }
}

impl From<&ColorEntry> for RgbColor {
    fn from(entry: &ColorEntry) -> Self {
        RgbColor::from_rgb8(entry.r, entry.g, entry.b)
    }
}

/// Ordering key of a catalog entry: the channels zero-padded to three
/// digits and concatenated, e.g. `"001002003"` for (1, 2, 3).
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SortKey(String);

impl SortKey {
    pub fn of(entry: &ColorEntry) -> Self {
        SortKey(format!("{:03}{:03}{:03}", entry.r, entry.g, entry.b))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// A single drawing instruction for the document sink.
#[derive(Debug, Clone, PartialEq)]
pub enum Directive {
    /// Rectangle filled and stroked with the same color.
    DrawRect { rect: Rect, color: RgbColor },
    /// Text whose baseline starts at `origin`.
    InsertText {
        origin: Point,
        text: String,
        font_size: f32,
        color: RgbColor,
    },
}

/// One grid slot holding exactly one catalog entry.
#[derive(Debug, Clone, PartialEq)]
pub struct Cell {
    pub page_index: usize,
    pub rect: Rect,
    pub entry: ColorEntry,
    pub directives: [Directive; 3],
}

/// A fixed-size page holding up to `columns * rows` cells.
#[derive(Debug, Clone, PartialEq)]
pub struct Page {
    pub index: usize,
    pub width: f32,
    pub height: f32,
    pub cells: Vec<Cell>,
}

impl Page {
    /// Iterates over all directives of the page in drawing order.
    pub fn directives(&self) -> impl Iterator<Item = &Directive> {
        self.cells.iter().flat_map(|cell| cell.directives.iter())
    }
}

/// Page and grid geometry.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GridLayout {
    pub page_width: f32,
    pub page_height: f32,
    pub columns: u32,
    pub rows: u32,
    pub font_size: f32,
    /// Label baseline offset from the cell top, as a fraction of cell height.
    pub label_offset: f32,
    /// Line height as a multiple of the font size.
    pub line_spacing: f32,
}

impl Default for GridLayout {
    fn default() -> Self {
        GridLayout {
            page_width: 800.0,
            page_height: 600.0,
            columns: 10,
            rows: 10,
            font_size: 8.0,
            label_offset: 0.3,
            line_spacing: 1.2,
        }
    }
}

impl GridLayout {
    pub fn cell_width(&self) -> f32 {
        self.page_width / self.columns as f32
    }

    pub fn cell_height(&self) -> f32 {
        self.page_height / self.rows as f32
    }

    pub fn cells_per_page(&self) -> usize {
        (self.columns * self.rows) as usize
    }

    /// Returns the rectangle of the slot at `slot` (0-based, row-major).
    pub fn cell_rect(&self, slot: usize) -> Rect {
        let columns = self.columns as usize;
        let row = slot / columns;
        let col = slot % columns;
        let (w, h) = (self.cell_width(), self.cell_height());
        let x0 = col as f32 * w;
        let y0 = row as f32 * h;
        Rect::new(x0, y0, x0 + w, y0 + h)
    }

    fn cell_directives(&self, rect: Rect, entry: &ColorEntry) -> [Directive; 3] {
        let label = entry.name.to_lowercase();
        let white_origin = Point::new(rect.x0, rect.y0 + self.cell_height() * self.label_offset);
        let black_origin = Point::new(
            white_origin.x,
            white_origin.y + self.font_size * self.line_spacing,
        );

        [
            Directive::DrawRect {
                rect,
                color: RgbColor::from(entry),
            },
            Directive::InsertText {
                origin: white_origin,
                text: label.clone(),
                font_size: self.font_size,
                color: RgbColor::WHITE,
            },
            Directive::InsertText {
                origin: black_origin,
                text: label,
                font_size: self.font_size,
                color: RgbColor::BLACK,
            },
        ]
    }
}

/// Sorts and lays out color catalogs.
#[derive(Debug, Clone, Default)]
pub struct Paginator {
    layout: GridLayout,
}

impl Paginator {
    /// Creates a new Paginator with the default 800x600, 10x10 layout.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a new Paginator with a custom layout.
    pub fn with_layout(layout: GridLayout) -> Result<Self, PaginateError> {
        if layout.columns == 0 || layout.rows == 0 {
            return Err(PaginateError::InvalidLayout {
                columns: layout.columns,
                rows: layout.rows,
            });
        }
        Ok(Paginator { layout })
    }

    pub fn layout(&self) -> &GridLayout {
        &self.layout
    }

    /// Lays the catalog out into pages.
    pub fn paginate(&self, catalog: &[ColorEntry]) -> Result<Vec<Page>, PaginateError> {
        if catalog.is_empty() {
            return Err(PaginateError::EmptyCatalog);
        }

        let sorted = sort_catalog(catalog);
        let per_page = self.layout.cells_per_page();
        let mut pages: Vec<Page> = Vec::with_capacity(sorted.len().div_ceil(per_page));

        for (index, chunk) in sorted.chunks(per_page).enumerate() {
            let cells = chunk
                .iter()
                .enumerate()
                .map(|(slot, entry)| {
                    let rect = self.layout.cell_rect(slot);
                    Cell {
                        page_index: index,
                        rect,
                        entry: entry.clone(),
                        directives: self.layout.cell_directives(rect, entry),
                    }
                })
                .collect::<Vec<_>>();

            debug!(page = index, cells = cells.len(), "page laid out");
            pages.push(Page {
                index,
                width: self.layout.page_width,
                height: self.layout.page_height,
                cells,
            });
        }

        debug!(
            entries = catalog.len(),
            pages = pages.len(),
            "catalog paginated"
        );
        Ok(pages)
    }
}

/// Returns a copy of the catalog in descending [`SortKey`] order.
/// Entries with equal keys keep their input order.
pub fn sort_catalog(catalog: &[ColorEntry]) -> Vec<ColorEntry> {
    let mut sorted = catalog.to_vec();
    sorted.sort_by_cached_key(|entry| Reverse(SortKey::of(entry)));
    sorted
}

/// Lays the catalog out with the default layout.
pub fn paginate(catalog: &[ColorEntry]) -> Result<Vec<Page>, PaginateError> {
    Paginator::new().paginate(catalog)
}
