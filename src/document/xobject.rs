//! External objects invoked by the Do operator, and tiling patterns.

use std::sync::Arc;

use bytes::Bytes;

use crate::document::page::ContentStream;
use crate::document::resources::Resources;
use crate::model::objects::{Dict, Object};
use crate::utils::{Matrix, Rect, MATRIX_IDENTITY};

/// An entry of the XObject resource dictionary.
#[derive(Debug, Clone)]
pub enum XObject {
    Form(Arc<FormXObject>),
    Image(Arc<ImageXObject>),
}

/// A form XObject: a reusable content stream with its own matrix, bounding
/// box and (optionally) resources. When `transparency_group` is set, entry
/// resets the blend mode, alpha constants and soft mask.
#[derive(Debug, Clone)]
pub struct FormXObject {
    pub content: Bytes,
    pub resources: Option<Arc<Resources>>,
    pub matrix: Matrix,
    pub bbox: Rect,
    pub transparency_group: bool,
}

impl FormXObject {
    pub fn new(content: impl Into<Bytes>, bbox: Rect) -> Self {
        Self {
            content: content.into(),
            resources: None,
            matrix: MATRIX_IDENTITY,
            bbox,
            transparency_group: false,
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

    pub fn as_transparency_group(mut self) -> Self {
        self.transparency_group = true;
        self
    }
}

impl ContentStream for FormXObject {
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

/// An image XObject or inline image. The engine never decodes pixels; it
/// hands the raw data and attributes to the device.
#[derive(Debug, Clone)]
pub struct ImageXObject {
    pub width: i64,
    pub height: i64,
    pub data: Bytes,
    pub attributes: Dict,
}

impl ImageXObject {
    pub fn new(width: i64, height: i64, data: impl Into<Bytes>) -> Self {
        Self {
            width,
            height,
            data: data.into(),
            attributes: Dict::new(),
        }
    }

    /// Builds an image from an inline-image dictionary, expanding the
    /// abbreviated keys.
    pub fn from_inline(dict: Dict, data: Bytes) -> Self {
        let mut attributes = Dict::with_capacity(dict.len());
        for (key, value) in dict {
            let key = match key.as_str() {
                "BPC" => "BitsPerComponent",
                "CS" => "ColorSpace",
                "D" => "Decode",
                "DP" => "DecodeParms",
                "F" => "Filter",
                "H" => "Height",
                "IM" => "ImageMask",
                "I" => "Interpolate",
                "W" => "Width",
                _ => key.as_str(),
            }
            .to_string();
            attributes.insert(key, value);
        }
        let width = attributes
            .get("Width")
            .and_then(Object::as_i64)
            .unwrap_or(0);
        let height = attributes
            .get("Height")
            .and_then(Object::as_i64)
            .unwrap_or(0);
        Self {
            width,
            height,
            data,
            attributes,
        }
    }
}

/// A tiling pattern cell. `colored` distinguishes paint type 1 (the cell
/// carries its own color) from paint type 2 (the caller supplies one).
#[derive(Debug, Clone)]
pub struct TilingPattern {
    pub content: Bytes,
    pub resources: Option<Arc<Resources>>,
    pub matrix: Matrix,
    pub bbox: Rect,
    pub x_step: f64,
    pub y_step: f64,
    pub colored: bool,
}

impl TilingPattern {
    pub fn new(content: impl Into<Bytes>, bbox: Rect) -> Self {
        Self {
            content: content.into(),
            resources: None,
            matrix: MATRIX_IDENTITY,
            bbox,
            x_step: bbox.2 - bbox.0,
            y_step: bbox.3 - bbox.1,
            colored: true,
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

    pub fn uncolored(mut self) -> Self {
        self.colored = false;
        self
    }
}

impl ContentStream for TilingPattern {
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
