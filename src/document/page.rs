//! Pages and the content-stream capability trait.

use std::sync::Arc;

use bytes::Bytes;

use crate::document::resources::Resources;
use crate::utils::{Matrix, Rect, MATRIX_IDENTITY};

/// A self-contained sequence of content operators.
///
/// Pages, form XObjects, tiling patterns, Type 3 glyph procedures and
/// annotation appearances all expose this surface to the engine: decoded
/// bytes, an optional private resource dictionary, a placement matrix and a
/// bounding box.
pub trait ContentStream {
    /// Decoded stream bytes. A page may contribute several segments, which
    /// the tokenizer treats as one concatenated stream.
    fn content(&self) -> Vec<Bytes>;

    /// The stream's own resource dictionary, if it has one.
    fn resources(&self) -> Option<Arc<Resources>>;

    /// Matrix mapping the stream's space into its parent's user space.
    fn matrix(&self) -> Matrix {
        MATRIX_IDENTITY
    }

    /// Bounding box in the stream's own space; `None` means unclipped.
    fn bbox(&self) -> Option<Rect> {
        None
    }
}

/// The page surface the engine consumes: a crop box, a page matrix, the
/// content segments and the page-level resources.
#[derive(Debug, Clone)]
pub struct Page {
    pub crop_box: Rect,
    pub matrix: Matrix,
    pub contents: Vec<Bytes>,
    pub resources: Option<Arc<Resources>>,
}

impl Page {
    pub fn new(crop_box: Rect) -> Self {
        Self {
            crop_box,
            matrix: MATRIX_IDENTITY,
            contents: Vec::new(),
            resources: None,
        }
    }

    pub fn with_contents(mut self, contents: impl Into<Bytes>) -> Self {
        self.contents.push(contents.into());
        self
    }

    pub fn with_resources(mut self, resources: Arc<Resources>) -> Self {
        self.resources = Some(resources);
        self
    }

    /// Whether the page has any non-empty content stream.
    pub fn has_contents(&self) -> bool {
        self.contents.iter().any(|segment| !segment.is_empty())
    }
}

impl ContentStream for Page {
    fn content(&self) -> Vec<Bytes> {
        self.contents.clone()
    }

    fn resources(&self) -> Option<Arc<Resources>> {
        self.resources.clone()
    }

    fn bbox(&self) -> Option<Rect> {
        Some(self.crop_box)
    }
}
