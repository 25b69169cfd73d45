//! Shared fixtures for the integration tests: a recording device, stub
//! fonts and page builders.
#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::Arc;

use orinoco::document::{CharProc, Font, Page, Resources, Type3Font};
use orinoco::error::Result;
use orinoco::utils::{Matrix, Point, Rect};
use orinoco::{
    default_operator_error, Device, Dict, EngineError, ErrorDisposition, GraphicsState,
    ImageXObject, Object, PathSegment,
};

pub const CROP: Rect = (0.0, 0.0, 612.0, 792.0);

/// One recorded device event.
#[derive(Debug, Clone)]
pub enum Event {
    BeginPage,
    EndPage,
    BeginText,
    EndText,
    Glyph {
        trm: Matrix,
        font: String,
        code: u32,
        displacement: Point,
    },
    FontGlyph {
        code: u32,
    },
    Type3Glyph {
        code: u32,
    },
    PaintPath {
        state: GraphicsState,
        stroke: bool,
        fill: bool,
        even_odd: bool,
        path: Vec<PathSegment>,
    },
    Image {
        name: String,
        width: i64,
    },
    BeginMarked {
        tag: String,
        has_properties: bool,
    },
    EndMarked,
    MarkedPoint {
        tag: String,
    },
    Unsupported {
        name: String,
        operands: usize,
    },
    OperatorError {
        name: String,
        error: String,
    },
}

/// A device that records every event it receives.
#[derive(Debug, Default)]
pub struct RecordingDevice {
    pub events: Vec<Event>,
    /// When set, draw_image reports a missing image reader.
    pub fail_images: bool,
}

impl RecordingDevice {
    pub fn new() -> Self {
        Self::default()
    }

    /// (code, trm) of every glyph observer event, in order.
    pub fn glyphs(&self) -> Vec<(u32, Matrix)> {
        self.events
            .iter()
            .filter_map(|event| match event {
                Event::Glyph { code, trm, .. } => Some((*code, *trm)),
                _ => None,
            })
            .collect()
    }

    /// Graphics states observed at paint time, in order.
    pub fn paint_states(&self) -> Vec<GraphicsState> {
        self.events
            .iter()
            .filter_map(|event| match event {
                Event::PaintPath { state, .. } => Some(state.clone()),
                _ => None,
            })
            .collect()
    }

    /// (operator, message) of every routed handler error, in order.
    pub fn errors(&self) -> Vec<(String, String)> {
        self.events
            .iter()
            .filter_map(|event| match event {
                Event::OperatorError { name, error } => Some((name.clone(), error.clone())),
                _ => None,
            })
            .collect()
    }
}

impl Device for RecordingDevice {
    fn begin_page(&mut self, _page: &Page) -> Result<()> {
        self.events.push(Event::BeginPage);
        Ok(())
    }

    fn end_page(&mut self, _page: &Page) -> Result<()> {
        self.events.push(Event::EndPage);
        Ok(())
    }

    fn begin_text(&mut self) -> Result<()> {
        self.events.push(Event::BeginText);
        Ok(())
    }

    fn end_text(&mut self) -> Result<()> {
        self.events.push(Event::EndText);
        Ok(())
    }

    fn show_glyph(
        &mut self,
        trm: Matrix,
        font: &dyn Font,
        code: u32,
        displacement: Point,
    ) -> Result<()> {
        self.events.push(Event::Glyph {
            trm,
            font: font.name().to_string(),
            code,
            displacement,
        });
        Ok(())
    }

    fn show_font_glyph(
        &mut self,
        _trm: Matrix,
        _font: &dyn Font,
        code: u32,
        _displacement: Point,
    ) -> Result<()> {
        self.events.push(Event::FontGlyph { code });
        Ok(())
    }

    fn show_type3_glyph(
        &mut self,
        _trm: Matrix,
        _font: &dyn Type3Font,
        code: u32,
        _displacement: Point,
    ) -> Result<()> {
        self.events.push(Event::Type3Glyph { code });
        Ok(())
    }

    fn begin_marked_content(&mut self, tag: &str, properties: Option<&Dict>) {
        self.events.push(Event::BeginMarked {
            tag: tag.to_string(),
            has_properties: properties.is_some(),
        });
    }

    fn end_marked_content(&mut self) {
        self.events.push(Event::EndMarked);
    }

    fn marked_content_point(&mut self, tag: &str, _properties: Option<&Dict>) {
        self.events.push(Event::MarkedPoint {
            tag: tag.to_string(),
        });
    }

    fn paint_path(
        &mut self,
        state: &GraphicsState,
        stroke: bool,
        fill: bool,
        even_odd: bool,
        path: &[PathSegment],
    ) -> Result<()> {
        self.events.push(Event::PaintPath {
            state: state.clone(),
            stroke,
            fill,
            even_odd,
            path: path.to_vec(),
        });
        Ok(())
    }

    fn draw_image(
        &mut self,
        name: &str,
        image: &ImageXObject,
        _state: &GraphicsState,
    ) -> Result<()> {
        if self.fail_images {
            return Err(EngineError::MissingImageReader(name.to_string()));
        }
        self.events.push(Event::Image {
            name: name.to_string(),
            width: image.width,
        });
        Ok(())
    }

    fn unsupported_operator(&mut self, name: &str, operands: &[Object]) {
        self.events.push(Event::Unsupported {
            name: name.to_string(),
            operands: operands.len(),
        });
    }

    fn operator_error(
        &mut self,
        name: &str,
        _operands: &[Object],
        error: &EngineError,
    ) -> ErrorDisposition {
        self.events.push(Event::OperatorError {
            name: name.to_string(),
            error: error.to_string(),
        });
        default_operator_error(name, error)
    }
}

/// Horizontal font with single-byte codes and one advance width for every
/// glyph.
#[derive(Debug)]
pub struct FixedWidthFont {
    pub width: f64,
}

impl FixedWidthFont {
    pub fn arc(width: f64) -> Arc<dyn Font> {
        Arc::new(Self { width })
    }
}

impl Font for FixedWidthFont {
    fn name(&self) -> &str {
        "Fixed"
    }

    fn read_code(&self, bytes: &[u8]) -> Result<(u32, usize)> {
        Ok((u32::from(bytes[0]), 1))
    }

    fn displacement(&self, _code: u32) -> Point {
        (self.width, 0.0)
    }
}

/// Composite-style font consuming two bytes per code (big endian).
#[derive(Debug)]
pub struct TwoByteFont {
    pub width: f64,
}

impl TwoByteFont {
    pub fn arc(width: f64) -> Arc<dyn Font> {
        Arc::new(Self { width })
    }
}

impl Font for TwoByteFont {
    fn name(&self) -> &str {
        "TwoByte"
    }

    fn read_code(&self, bytes: &[u8]) -> Result<(u32, usize)> {
        if bytes.len() >= 2 {
            Ok(((u32::from(bytes[0]) << 8) | u32::from(bytes[1]), 2))
        } else {
            Ok((u32::from(bytes[0]), 1))
        }
    }

    fn displacement(&self, _code: u32) -> Point {
        (self.width, 0.0)
    }
}

/// Vertical-mode font with a fixed position vector and vertical advance.
#[derive(Debug)]
pub struct VerticalFont {
    pub advance: f64,
    pub position: Point,
}

impl VerticalFont {
    pub fn arc(advance: f64, position: Point) -> Arc<dyn Font> {
        Arc::new(Self { advance, position })
    }
}

impl Font for VerticalFont {
    fn name(&self) -> &str {
        "Vertical"
    }

    fn read_code(&self, bytes: &[u8]) -> Result<(u32, usize)> {
        Ok((u32::from(bytes[0]), 1))
    }

    fn is_vertical(&self) -> bool {
        true
    }

    fn position_vector(&self, _code: u32) -> Point {
        self.position
    }

    fn displacement(&self, _code: u32) -> Point {
        (0.0, self.advance)
    }
}

/// Type 3 font whose glyphs are the given content streams.
#[derive(Debug)]
pub struct StubType3Font {
    pub width: f64,
    pub font_matrix: Matrix,
    pub procs: HashMap<u32, Arc<CharProc>>,
}

impl StubType3Font {
    pub fn arc(width: f64, font_matrix: Matrix, procs: &[(u32, &'static str)]) -> Arc<dyn Font> {
        let procs = procs
            .iter()
            .map(|(code, content)| {
                let proc_stream =
                    CharProc::new(content.as_bytes()).with_font_matrix(font_matrix);
                (*code, Arc::new(proc_stream))
            })
            .collect();
        Arc::new(Self {
            width,
            font_matrix,
            procs,
        })
    }
}

impl Font for StubType3Font {
    fn name(&self) -> &str {
        "StubType3"
    }

    fn read_code(&self, bytes: &[u8]) -> Result<(u32, usize)> {
        Ok((u32::from(bytes[0]), 1))
    }

    fn displacement(&self, _code: u32) -> Point {
        (self.width, 0.0)
    }

    fn as_type3(&self) -> Option<&dyn Type3Font> {
        Some(self)
    }
}

impl Type3Font for StubType3Font {
    fn char_proc(&self, code: u32) -> Option<Arc<CharProc>> {
        self.procs.get(&code).cloned()
    }

    fn font_matrix(&self) -> Matrix {
        self.font_matrix
    }
}

pub fn page(content: &'static str) -> Page {
    Page::new(CROP).with_contents(content)
}

pub fn page_with(content: &'static str, resources: Resources) -> Page {
    page(content).with_resources(Arc::new(resources))
}

pub fn assert_close(actual: f64, expected: f64) {
    assert!(
        (actual - expected).abs() < 1e-9,
        "expected {expected}, got {actual}"
    );
}
