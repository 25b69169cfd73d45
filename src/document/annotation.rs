//! Annotations and their appearance streams.

use std::sync::Arc;

use bytes::Bytes;

use crate::document::page::ContentStream;
use crate::document::resources::Resources;
use crate::utils::{Matrix, Rect, MATRIX_IDENTITY};

/// An annotation appearance: a form-like content stream rendered inside the
/// annotation's rectangle.
#[derive(Debug, Clone)]
pub struct AppearanceStream {
    pub content: Bytes,
    pub resources: Option<Arc<Resources>>,
    pub matrix: Matrix,
    pub bbox: Rect,
}

impl AppearanceStream {
    pub fn new(content: impl Into<Bytes>, bbox: Rect) -> Self {
        Self {
            content: content.into(),
            resources: None,
            matrix: MATRIX_IDENTITY,
            bbox,
        }
    }

    pub fn with_matrix(mut self, matrix: Matrix) -> Self {
        self.matrix = matrix;
        self
    }

    pub fn with_resources(mut self, resources: Arc<Resources>) -> Self {
        self.resources = Some(resources);
        self
    }
}

impl ContentStream for AppearanceStream {
    fn content(&self) -> Vec<Bytes> {
        vec![self.content.clone()]
    }

    fn resources(&self) -> Option<Arc<Resources>> {
        self.resources.clone()
    }

    fn matrix(&self) -> Matrix {
        self.matrix
    }

    fn bbox(&self) -> Option<Rect> {
        Some(self.bbox)
    }
}

/// The annotation surface the engine consumes: the rectangle on the page
/// and the normal appearance, if any.
#[derive(Debug, Clone)]
pub struct Annotation {
    pub rectangle: Rect,
    pub appearance: Option<Arc<AppearanceStream>>,
}

impl Annotation {
    pub fn new(rectangle: Rect) -> Self {
        Self {
            rectangle,
            appearance: None,
        }
    }

    pub fn with_appearance(mut self, appearance: AppearanceStream) -> Self {
        self.appearance = Some(Arc::new(appearance));
        self
    }

    /// The appearance stream to render, normally the "N" state.
    pub fn normal_appearance(&self) -> Option<Arc<AppearanceStream>> {
        self.appearance.clone()
    }
}
