//! Font capability traits and the built-in fallback font.

use std::fmt;
use std::sync::Arc;

use bytes::Bytes;

use crate::document::page::ContentStream;
use crate::document::resources::Resources;
use crate::error::{EngineError, Result};
use crate::utils::{Matrix, Point, MATRIX_IDENTITY};

/// The font surface consumed by the text sub-engine.
///
/// An implementation decodes character codes from encoded string bytes and
/// reports per-code metrics in text space. Everything else about the font
/// (program data, encoding tables, glyph outlines) stays behind this trait.
pub trait Font: fmt::Debug {
    /// Font name, for diagnostics and device output.
    fn name(&self) -> &str;

    /// Decodes the next character code from `bytes`, returning the code and
    /// the number of bytes consumed (1..=n). `bytes` is never empty.
    fn read_code(&self, bytes: &[u8]) -> Result<(u32, usize)>;

    /// Whether the font uses vertical writing mode.
    fn is_vertical(&self) -> bool {
        false
    }

    /// Position vector for vertical writing mode, in text space. Applied to
    /// the horizontal origin to reach the vertical origin.
    fn position_vector(&self, code: u32) -> Point {
        let _ = code;
        (0.0, 0.0)
    }

    /// Glyph displacement (advance) in text space.
    fn displacement(&self, code: u32) -> Point;

    /// Type 3 discriminator; glyphs of such fonts are content streams.
    fn as_type3(&self) -> Option<&dyn Type3Font> {
        None
    }
}

/// Extra surface of Type 3 fonts: per-code glyph procedures and the font
/// matrix mapping glyph space to text space.
pub trait Type3Font: Font {
    fn char_proc(&self, code: u32) -> Option<Arc<CharProc>>;

    fn font_matrix(&self) -> Matrix;
}

/// A Type 3 glyph procedure: a small content stream carrying the owning
/// font's resources and font matrix.
#[derive(Debug, Clone)]
pub struct CharProc {
    pub content: Bytes,
    pub resources: Option<Arc<Resources>>,
    pub font_matrix: Matrix,
}

impl CharProc {
    pub fn new(content: impl Into<Bytes>) -> Self {
        Self {
            content: content.into(),
            resources: None,
            font_matrix: MATRIX_IDENTITY,
        }
    }

    pub fn with_resources(mut self, resources: Arc<Resources>) -> Self {
        self.resources = Some(resources);
        self
    }

    pub fn with_font_matrix(mut self, matrix: Matrix) -> Self {
        self.font_matrix = matrix;
        self
    }
}

impl ContentStream for CharProc {
    fn content(&self) -> Vec<Bytes> {
        vec![self.content.clone()]
    }

    fn resources(&self) -> Option<Arc<Resources>> {
        self.resources.clone()
    }

    fn matrix(&self) -> Matrix {
        self.font_matrix
    }
}

/// Standard-14 Helvetica metrics, used when text is shown with no font set.
///
/// Codes are single bytes; widths for the printable ASCII range come from
/// the Adobe AFM tables, everything else falls back to the missing-glyph
/// width.
#[derive(Debug, Clone, Copy, Default)]
pub struct Helvetica;

impl Font for Helvetica {
    fn name(&self) -> &str {
        "Helvetica"
    }

    fn read_code(&self, bytes: &[u8]) -> Result<(u32, usize)> {
        match bytes.first() {
            Some(&b) => Ok((u32::from(b), 1)),
            None => Err(EngineError::InvalidState("read_code on empty input")),
        }
    }

    fn displacement(&self, code: u32) -> Point {
        let width = match code.checked_sub(0x20) {
            Some(index) if (index as usize) < HELVETICA_WIDTHS.len() => {
                HELVETICA_WIDTHS[index as usize]
            }
            _ => 500,
        };
        (f64::from(width) / 1000.0, 0.0)
    }
}

/// Helvetica advance widths for codes 0x20..=0x7E, in glyph-space units.
const HELVETICA_WIDTHS: [u16; 95] = [
    278, 278, 355, 556, 556, 889, 667, 191, 333, 333, 389, 584, 278, 333, 278, 278, // 0x20
    556, 556, 556, 556, 556, 556, 556, 556, 556, 556, 278, 278, 584, 584, 584, 556, // 0x30
    1015, 667, 667, 722, 722, 667, 611, 778, 722, 278, 500, 667, 556, 833, 722, 778, // 0x40
    667, 778, 722, 667, 611, 722, 667, 944, 667, 667, 611, 278, 278, 278, 469, 556, // 0x50
    333, 556, 556, 500, 556, 556, 278, 556, 556, 222, 222, 500, 222, 833, 556, 556, // 0x60
    556, 556, 333, 500, 278, 556, 500, 722, 500, 500, 500, 334, 260, 334, 584, // 0x70
];
