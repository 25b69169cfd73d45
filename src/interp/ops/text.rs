//! Text operators.
//!
//! Handles: BT, ET, Tc, Tw, Tz, TL, Tf, Tr, Ts, Td, TD, Tm, T*, Tj, TJ, ', "

use log::warn;

use crate::error::{EngineError, Result};
use crate::interp::device::Device;
use crate::interp::engine::StreamEngine;
use crate::model::objects::Object;
use crate::model::state::TextRenderingMode;
use crate::utils::{translate_matrix, MATRIX_IDENTITY};

use super::{array, integer, name, number, string};
use super::graphics_state::matrix_operand;

pub(crate) fn install<D: Device>(engine: &mut StreamEngine<'_, D>) {
    engine.register("BT", begin_text);
    engine.register("ET", end_text);
    engine.register("Tc", set_char_spacing);
    engine.register("Tw", set_word_spacing);
    engine.register("Tz", set_horizontal_scaling);
    engine.register("TL", set_leading);
    engine.register("Tf", set_font_and_size);
    engine.register("Tr", set_rendering_mode);
    engine.register("Ts", set_rise);
    engine.register("Td", move_text);
    engine.register("TD", move_text_set_leading);
    engine.register("Tm", set_matrix);
    engine.register("T*", next_line);
    engine.register("Tj", show_text);
    engine.register("TJ", show_text_adjusted);
    engine.register("'", next_line_show_text);
    engine.register("\"", set_spacing_next_line_show_text);
}

/// PDF operator: `BT`
///
/// Initializes the text matrix and text line matrix to identity; they exist
/// only until the matching ET.
fn begin_text<D: Device>(engine: &mut StreamEngine<'_, D>, _operands: &[Object]) -> Result<()> {
    engine.set_text_matrix(Some(MATRIX_IDENTITY));
    engine.set_text_line_matrix(Some(MATRIX_IDENTITY));
    engine.begin_text()
}

/// PDF operator: `ET`
fn end_text<D: Device>(engine: &mut StreamEngine<'_, D>, _operands: &[Object]) -> Result<()> {
    engine.set_text_matrix(None);
    engine.set_text_line_matrix(None);
    engine.end_text()
}

/// PDF operator: `Tc`
fn set_char_spacing<D: Device>(
    engine: &mut StreamEngine<'_, D>,
    operands: &[Object],
) -> Result<()> {
    engine.graphics_state_mut().text_state.char_spacing = number(operands, 0, "Tc")?;
    Ok(())
}

/// PDF operator: `Tw`
fn set_word_spacing<D: Device>(
    engine: &mut StreamEngine<'_, D>,
    operands: &[Object],
) -> Result<()> {
    engine.graphics_state_mut().text_state.word_spacing = number(operands, 0, "Tw")?;
    Ok(())
}

/// PDF operator: `Tz`
fn set_horizontal_scaling<D: Device>(
    engine: &mut StreamEngine<'_, D>,
    operands: &[Object],
) -> Result<()> {
    engine.graphics_state_mut().text_state.horizontal_scaling = number(operands, 0, "Tz")?;
    Ok(())
}

/// PDF operator: `TL`
fn set_leading<D: Device>(engine: &mut StreamEngine<'_, D>, operands: &[Object]) -> Result<()> {
    engine.graphics_state_mut().text_state.leading = number(operands, 0, "TL")?;
    Ok(())
}

/// PDF operator: `Tf`
///
/// The size is installed even when the font resource is missing, so that a
/// recovered MissingResource still leaves usable metrics for the fallback.
fn set_font_and_size<D: Device>(
    engine: &mut StreamEngine<'_, D>,
    operands: &[Object],
) -> Result<()> {
    let font_name = name(operands, 0, "Tf")?;
    let size = number(operands, 1, "Tf")?;
    engine.graphics_state_mut().text_state.font_size = size;
    let font = engine.resources().and_then(|r| r.font(font_name));
    match font {
        Some(font) => {
            engine.graphics_state_mut().text_state.font = Some(font);
            Ok(())
        }
        None => Err(EngineError::MissingResource {
            kind: "font",
            name: font_name.to_string(),
        }),
    }
}

/// PDF operator: `Tr`
fn set_rendering_mode<D: Device>(
    engine: &mut StreamEngine<'_, D>,
    operands: &[Object],
) -> Result<()> {
    let value = integer(operands, 0, "Tr")?;
    match TextRenderingMode::from_i64(value) {
        Some(mode) => engine.graphics_state_mut().text_state.rendering_mode = mode,
        None => warn!("invalid text rendering mode {value}, ignored"),
    }
    Ok(())
}

/// PDF operator: `Ts`
fn set_rise<D: Device>(engine: &mut StreamEngine<'_, D>, operands: &[Object]) -> Result<()> {
    engine.graphics_state_mut().text_state.rise = number(operands, 0, "Ts")?;
    Ok(())
}

/// PDF operator: `Td`
///
/// Moves to the start of the next line, offset by (tx, ty) from the current
/// line's origin.
fn move_text<D: Device>(engine: &mut StreamEngine<'_, D>, operands: &[Object]) -> Result<()> {
    let tx = number(operands, 0, "Td")?;
    let ty = number(operands, 1, "Td")?;
    let Some(tlm) = engine.text_line_matrix() else {
        warn!("Td outside of a text object, ignored");
        return Ok(());
    };
    let next = translate_matrix(tlm, (tx, ty));
    engine.set_text_line_matrix(Some(next));
    engine.set_text_matrix(Some(next));
    Ok(())
}

/// PDF operator: `TD`
fn move_text_set_leading<D: Device>(
    engine: &mut StreamEngine<'_, D>,
    operands: &[Object],
) -> Result<()> {
    let ty = number(operands, 1, "TD")?;
    engine.graphics_state_mut().text_state.leading = -ty;
    move_text(engine, operands)
}

/// PDF operator: `Tm`
fn set_matrix<D: Device>(engine: &mut StreamEngine<'_, D>, operands: &[Object]) -> Result<()> {
    let m = matrix_operand(operands, "Tm")?;
    engine.set_text_matrix(Some(m));
    engine.set_text_line_matrix(Some(m));
    Ok(())
}

/// PDF operator: `T*`
fn next_line<D: Device>(engine: &mut StreamEngine<'_, D>, _operands: &[Object]) -> Result<()> {
    let leading = engine.graphics_state().text_state.leading;
    let operands = [Object::Int(0), Object::Real(-leading)];
    move_text(engine, &operands)
}

/// PDF operator: `Tj`
fn show_text<D: Device>(engine: &mut StreamEngine<'_, D>, operands: &[Object]) -> Result<()> {
    let bytes = string(operands, 0, "Tj")?.to_vec();
    engine.show_text_string(&bytes)
}

/// PDF operator: `TJ`
fn show_text_adjusted<D: Device>(
    engine: &mut StreamEngine<'_, D>,
    operands: &[Object],
) -> Result<()> {
    let items = array(operands, 0, "TJ")?.to_vec();
    engine.show_text_strings(&items)
}

/// PDF operator: `'`
fn next_line_show_text<D: Device>(
    engine: &mut StreamEngine<'_, D>,
    operands: &[Object],
) -> Result<()> {
    engine.process_operator("T*", &[])?;
    let bytes = string(operands, 0, "'")?.to_vec();
    engine.show_text_string(&bytes)
}

/// PDF operator: `"`
fn set_spacing_next_line_show_text<D: Device>(
    engine: &mut StreamEngine<'_, D>,
    operands: &[Object],
) -> Result<()> {
    let word_spacing = number(operands, 0, "\"")?;
    let char_spacing = number(operands, 1, "\"")?;
    {
        let text_state = &mut engine.graphics_state_mut().text_state;
        text_state.word_spacing = word_spacing;
        text_state.char_spacing = char_spacing;
    }
    engine.process_operator("T*", &[])?;
    let bytes = string(operands, 2, "\"")?.to_vec();
    engine.show_text_string(&bytes)
}
