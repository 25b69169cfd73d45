//! Graphics and text state records.
//!
//! The graphics state is a deeply cloneable snapshot; the q/Q stack and the
//! nested-stream drivers rely on `Clone` producing a value with no shared
//! mutable parts.

use std::sync::Arc;

use crate::document::font::Font;
use crate::document::xobject::FormXObject;
use crate::model::color::{Color, ColorSpace};
use crate::utils::{rect_quad, Matrix, Quad, Rect, MATRIX_IDENTITY};

/// Blend modes from the transparency model.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BlendMode {
    #[default]
    Normal,
    Multiply,
    Screen,
    Overlay,
    Darken,
    Lighten,
    ColorDodge,
    ColorBurn,
    HardLight,
    SoftLight,
    Difference,
    Exclusion,
    Hue,
    Saturation,
    Color,
    Luminosity,
}

impl BlendMode {
    /// Maps a blend-mode name to its variant. `Compatible` is an alias for
    /// `Normal` kept for PDF 1.3 writers.
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "Normal" | "Compatible" => Some(BlendMode::Normal),
            "Multiply" => Some(BlendMode::Multiply),
            "Screen" => Some(BlendMode::Screen),
            "Overlay" => Some(BlendMode::Overlay),
            "Darken" => Some(BlendMode::Darken),
            "Lighten" => Some(BlendMode::Lighten),
            "ColorDodge" => Some(BlendMode::ColorDodge),
            "ColorBurn" => Some(BlendMode::ColorBurn),
            "HardLight" => Some(BlendMode::HardLight),
            "SoftLight" => Some(BlendMode::SoftLight),
            "Difference" => Some(BlendMode::Difference),
            "Exclusion" => Some(BlendMode::Exclusion),
            "Hue" => Some(BlendMode::Hue),
            "Saturation" => Some(BlendMode::Saturation),
            "Color" => Some(BlendMode::Color),
            "Luminosity" => Some(BlendMode::Luminosity),
            _ => None,
        }
    }
}

/// Text rendering modes set by the Tr operator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TextRenderingMode {
    #[default]
    Fill,
    Stroke,
    FillStroke,
    Neither,
    FillClip,
    StrokeClip,
    FillStrokeClip,
    Clip,
}

impl TextRenderingMode {
    pub fn from_i64(value: i64) -> Option<Self> {
        match value {
            0 => Some(TextRenderingMode::Fill),
            1 => Some(TextRenderingMode::Stroke),
            2 => Some(TextRenderingMode::FillStroke),
            3 => Some(TextRenderingMode::Neither),
            4 => Some(TextRenderingMode::FillClip),
            5 => Some(TextRenderingMode::StrokeClip),
            6 => Some(TextRenderingMode::FillStrokeClip),
            7 => Some(TextRenderingMode::Clip),
            _ => None,
        }
    }
}

/// Dash array and phase installed by the d operator.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct LineDashPattern {
    pub array: Vec<f64>,
    pub phase: f64,
}

impl LineDashPattern {
    /// A solid line (empty dash array).
    pub fn solid() -> Self {
        Self::default()
    }
}

/// A soft mask attached to the graphics state.
///
/// The mask's transparency group is replayed through
/// `StreamEngine::process_soft_mask`, which replaces the CTM with the
/// initial transformation matrix captured here.
#[derive(Debug, Clone)]
pub struct SoftMask {
    pub group: Arc<FormXObject>,
    pub initial_transformation_matrix: Matrix,
}

/// Text-related parameters of the graphics state.
#[derive(Debug, Clone)]
pub struct TextState {
    pub font: Option<Arc<dyn Font>>,
    pub font_size: f64,
    pub char_spacing: f64,
    pub word_spacing: f64,
    /// Horizontal scaling in percent (100 = normal).
    pub horizontal_scaling: f64,
    pub leading: f64,
    pub rise: f64,
    pub rendering_mode: TextRenderingMode,
    pub knockout: bool,
}

impl TextState {
    pub fn new() -> Self {
        Self {
            font: None,
            font_size: 1.0,
            char_spacing: 0.0,
            word_spacing: 0.0,
            horizontal_scaling: 100.0,
            leading: 0.0,
            rise: 0.0,
            rendering_mode: TextRenderingMode::Fill,
            knockout: true,
        }
    }
}

impl Default for TextState {
    fn default() -> Self {
        Self::new()
    }
}

/// The full graphics state saved and restored by q/Q.
#[derive(Debug, Clone)]
pub struct GraphicsState {
    /// Current transformation matrix, user space to device space.
    pub ctm: Matrix,
    /// Clipping path as the list of transformed rectangles intersected so
    /// far; the effective clip is their common area.
    pub clip_paths: Vec<Quad>,
    pub stroking_color: Color,
    pub stroking_color_space: ColorSpace,
    pub non_stroking_color: Color,
    pub non_stroking_color_space: ColorSpace,
    pub line_width: f64,
    pub line_cap: i32,
    pub line_join: i32,
    pub miter_limit: f64,
    pub dash: LineDashPattern,
    pub rendering_intent: String,
    pub flatness: f64,
    pub stroke_alpha: f64,
    pub non_stroke_alpha: f64,
    pub blend_mode: BlendMode,
    pub soft_mask: Option<SoftMask>,
    pub overprint_stroke: bool,
    pub overprint_fill: bool,
    pub text_state: TextState,
}

impl GraphicsState {
    /// Initial state for a stream whose visible area is `clip` (the page
    /// crop box, or a pattern cell).
    pub fn new(clip: Rect) -> Self {
        Self {
            ctm: MATRIX_IDENTITY,
            clip_paths: vec![rect_quad(clip)],
            stroking_color: Color::default(),
            stroking_color_space: ColorSpace::device_gray(),
            non_stroking_color: Color::default(),
            non_stroking_color_space: ColorSpace::device_gray(),
            line_width: 1.0,
            line_cap: 0,
            line_join: 0,
            miter_limit: 10.0,
            dash: LineDashPattern::solid(),
            rendering_intent: "RelativeColorimetric".to_string(),
            flatness: 1.0,
            stroke_alpha: 1.0,
            non_stroke_alpha: 1.0,
            blend_mode: BlendMode::Normal,
            soft_mask: None,
            overprint_stroke: false,
            overprint_fill: false,
            text_state: TextState::new(),
        }
    }

    /// Intersects the clipping path with another area.
    pub fn intersect_clip(&mut self, quad: Quad) {
        self.clip_paths.push(quad);
    }
}
