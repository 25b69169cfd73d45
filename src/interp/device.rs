//! The client event sink driven by the stream engine.

use log::{error, warn};

use crate::document::font::{Font, Type3Font};
use crate::document::page::Page;
use crate::document::xobject::ImageXObject;
use crate::error::{EngineError, Result};
use crate::interp::engine::PathSegment;
use crate::model::objects::{Dict, Object};
use crate::model::state::GraphicsState;
use crate::utils::{Matrix, Point};

/// What the engine should do with an error surfaced by an operator handler.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorDisposition {
    /// Absorb the error and continue with the next operator.
    Recover,
    /// Let the error propagate out of stream processing.
    Propagate,
}

/// Receiver of engine events.
///
/// Every method has a no-op default, so a device implements only what it
/// cares about. State and matrix references handed to a hook are snapshots
/// of this instant; the engine mutates them after the hook returns, so a
/// device needing durable values must clone.
pub trait Device {
    fn begin_page(&mut self, page: &Page) -> Result<()> {
        let _ = page;
        Ok(())
    }

    fn end_page(&mut self, page: &Page) -> Result<()> {
        let _ = page;
        Ok(())
    }

    /// Called for the BT operator.
    fn begin_text(&mut self) -> Result<()> {
        Ok(())
    }

    /// Called for the ET operator.
    fn end_text(&mut self) -> Result<()> {
        Ok(())
    }

    /// Called once per decoded glyph, before type dispatch.
    fn show_glyph(
        &mut self,
        trm: Matrix,
        font: &dyn Font,
        code: u32,
        displacement: Point,
    ) -> Result<()> {
        let _ = (trm, font, code, displacement);
        Ok(())
    }

    /// Called for glyphs of ordinary (non Type 3) fonts.
    fn show_font_glyph(
        &mut self,
        trm: Matrix,
        font: &dyn Font,
        code: u32,
        displacement: Point,
    ) -> Result<()> {
        let _ = (trm, font, code, displacement);
        Ok(())
    }

    /// Called for Type 3 glyphs before their glyph procedure is executed.
    fn show_type3_glyph(
        &mut self,
        trm: Matrix,
        font: &dyn Type3Font,
        code: u32,
        displacement: Point,
    ) -> Result<()> {
        let _ = (trm, font, code, displacement);
        Ok(())
    }

    /// Called for BMC/BDC.
    fn begin_marked_content(&mut self, tag: &str, properties: Option<&Dict>) {
        let _ = (tag, properties);
    }

    /// Called for EMC.
    fn end_marked_content(&mut self) {}

    /// Called for the MP/DP point operators.
    fn marked_content_point(&mut self, tag: &str, properties: Option<&Dict>) {
        let _ = (tag, properties);
    }

    /// Called by the path-painting operators with the accumulated path in
    /// user space; `state.ctm` maps it to device space.
    fn paint_path(
        &mut self,
        state: &GraphicsState,
        stroke: bool,
        fill: bool,
        even_odd: bool,
        path: &[PathSegment],
    ) -> Result<()> {
        let _ = (state, stroke, fill, even_odd, path);
        Ok(())
    }

    /// Called for image XObjects and inline images.
    fn draw_image(&mut self, name: &str, image: &ImageXObject, state: &GraphicsState) -> Result<()> {
        let _ = (name, image, state);
        Ok(())
    }

    /// Called when no handler is registered for an operator.
    fn unsupported_operator(&mut self, name: &str, operands: &[Object]) {
        let _ = (name, operands);
    }

    /// Decides what happens to an error raised by an operator handler.
    fn operator_error(
        &mut self,
        name: &str,
        operands: &[Object],
        error: &EngineError,
    ) -> ErrorDisposition {
        let _ = operands;
        default_operator_error(name, error)
    }
}

/// The stock recovery policy: absorb missing-operand/resource/reader errors
/// and unmatched restores, tolerate anything that surfaces from `Do`,
/// propagate the rest.
pub fn default_operator_error(name: &str, error: &EngineError) -> ErrorDisposition {
    match error {
        EngineError::MissingOperand { .. }
        | EngineError::MissingResource { .. }
        | EngineError::MissingImageReader(_) => {
            error!("{error}");
            ErrorDisposition::Recover
        }
        EngineError::EmptyGraphicsStack => {
            warn!("{error}");
            ErrorDisposition::Recover
        }
        _ if name == "Do" => {
            warn!("error from Do operator: {error}");
            ErrorDisposition::Recover
        }
        _ => ErrorDisposition::Propagate,
    }
}

/// A device that discards every event. Useful for structural checks where
/// only the engine's side effects matter.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullDevice;

impl Device for NullDevice {}
