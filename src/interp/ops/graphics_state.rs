//! Graphics state operators.
//!
//! Handles: q, Q, cm, w, J, j, M, d, ri, i, gs

use log::warn;

use crate::error::{EngineError, Result};
use crate::interp::device::Device;
use crate::interp::engine::StreamEngine;
use crate::model::objects::{Dict, Object};
use crate::model::state::BlendMode;
use crate::utils::mult_matrix;

use super::{array, integer, name, number, number_array};

pub(crate) fn install<D: Device>(engine: &mut StreamEngine<'_, D>) {
    engine.register("q", save);
    engine.register("Q", restore);
    engine.register("cm", concat);
    engine.register("w", set_line_width);
    engine.register("J", set_line_cap);
    engine.register("j", set_line_join);
    engine.register("M", set_miter_limit);
    engine.register("d", set_dash);
    engine.register("ri", set_rendering_intent);
    engine.register("i", set_flatness);
    engine.register("gs", set_parameters);
}

/// PDF operator: `q`
fn save<D: Device>(engine: &mut StreamEngine<'_, D>, _operands: &[Object]) -> Result<()> {
    engine.save_graphics_state();
    Ok(())
}

/// PDF operator: `Q`
///
/// An unmatched restore surfaces as EmptyGraphicsStack; the error policy
/// decides whether that is fatal.
fn restore<D: Device>(engine: &mut StreamEngine<'_, D>, _operands: &[Object]) -> Result<()> {
    engine.restore_graphics_state()
}

/// PDF operator: `cm`
fn concat<D: Device>(engine: &mut StreamEngine<'_, D>, operands: &[Object]) -> Result<()> {
    let m = matrix_operand(operands, "cm")?;
    let state = engine.graphics_state_mut();
    state.ctm = mult_matrix(m, state.ctm);
    Ok(())
}

/// PDF operator: `w`
fn set_line_width<D: Device>(engine: &mut StreamEngine<'_, D>, operands: &[Object]) -> Result<()> {
    engine.graphics_state_mut().line_width = number(operands, 0, "w")?;
    Ok(())
}

/// PDF operator: `J`
fn set_line_cap<D: Device>(engine: &mut StreamEngine<'_, D>, operands: &[Object]) -> Result<()> {
    engine.graphics_state_mut().line_cap = integer(operands, 0, "J")? as i32;
    Ok(())
}

/// PDF operator: `j`
fn set_line_join<D: Device>(engine: &mut StreamEngine<'_, D>, operands: &[Object]) -> Result<()> {
    engine.graphics_state_mut().line_join = integer(operands, 0, "j")? as i32;
    Ok(())
}

/// PDF operator: `M`
fn set_miter_limit<D: Device>(engine: &mut StreamEngine<'_, D>, operands: &[Object]) -> Result<()> {
    engine.graphics_state_mut().miter_limit = number(operands, 0, "M")?;
    Ok(())
}

/// PDF operator: `d`
fn set_dash<D: Device>(engine: &mut StreamEngine<'_, D>, operands: &[Object]) -> Result<()> {
    let dashes = number_array(array(operands, 0, "d")?);
    let phase = number(operands, 1, "d")?;
    engine.set_line_dash_pattern(dashes, phase);
    Ok(())
}

/// PDF operator: `ri`
fn set_rendering_intent<D: Device>(
    engine: &mut StreamEngine<'_, D>,
    operands: &[Object],
) -> Result<()> {
    engine.graphics_state_mut().rendering_intent = name(operands, 0, "ri")?.to_string();
    Ok(())
}

/// PDF operator: `i`
fn set_flatness<D: Device>(engine: &mut StreamEngine<'_, D>, operands: &[Object]) -> Result<()> {
    engine.graphics_state_mut().flatness = number(operands, 0, "i")?;
    Ok(())
}

/// PDF operator: `gs`
///
/// Looks up an ExtGState parameter dictionary in the resource scope and
/// applies the entries the state model carries.
fn set_parameters<D: Device>(engine: &mut StreamEngine<'_, D>, operands: &[Object]) -> Result<()> {
    let gs_name = name(operands, 0, "gs")?;
    let dict = engine
        .resources()
        .and_then(|r| r.ext_g_state(gs_name).cloned())
        .ok_or_else(|| EngineError::MissingResource {
            kind: "graphics state parameter",
            name: gs_name.to_string(),
        })?;
    apply_parameters(engine, &dict);
    Ok(())
}

fn apply_parameters<D: Device>(engine: &mut StreamEngine<'_, D>, dict: &Dict) {
    if let Some(v) = dict.get("LW").and_then(Object::as_f64) {
        engine.graphics_state_mut().line_width = v;
    }
    if let Some(v) = dict.get("LC").and_then(Object::as_i64) {
        engine.graphics_state_mut().line_cap = v as i32;
    }
    if let Some(v) = dict.get("LJ").and_then(Object::as_i64) {
        engine.graphics_state_mut().line_join = v as i32;
    }
    if let Some(v) = dict.get("ML").and_then(Object::as_f64) {
        engine.graphics_state_mut().miter_limit = v;
    }
    if let Some(items) = dict.get("D").and_then(Object::as_array) {
        // D is [[dashes] phase]
        if items.len() == 2 {
            if let (Some(dashes), Some(phase)) = (items[0].as_array(), items[1].as_f64()) {
                engine.set_line_dash_pattern(number_array(dashes), phase);
            }
        }
    }
    if let Some(v) = dict.get("RI").and_then(Object::as_name) {
        engine.graphics_state_mut().rendering_intent = v.to_string();
    }
    if let Some(v) = dict.get("FL").and_then(Object::as_f64) {
        engine.graphics_state_mut().flatness = v;
    }
    if let Some(v) = dict.get("CA").and_then(Object::as_f64) {
        engine.graphics_state_mut().stroke_alpha = v;
    }
    if let Some(v) = dict.get("ca").and_then(Object::as_f64) {
        engine.graphics_state_mut().non_stroke_alpha = v;
    }
    if let Some(bm) = dict.get("BM") {
        let mode = match bm {
            Object::Name(n) => BlendMode::from_name(n),
            Object::Array(items) => items
                .first()
                .and_then(Object::as_name)
                .and_then(BlendMode::from_name),
            _ => None,
        };
        match mode {
            Some(mode) => engine.graphics_state_mut().blend_mode = mode,
            None => warn!("unknown blend mode in ExtGState, keeping current"),
        }
    }
    if let Some(v) = dict.get("SMask") {
        match v.as_name() {
            Some("None") => engine.graphics_state_mut().soft_mask = None,
            _ => warn!("SMask dictionaries in ExtGState are resolved by the document layer"),
        }
    }
    if let Some(v) = dict.get("OP").and_then(Object::as_bool) {
        engine.graphics_state_mut().overprint_stroke = v;
        // OP also covers fills when op is absent
        if dict.get("op").is_none() {
            engine.graphics_state_mut().overprint_fill = v;
        }
    }
    if let Some(v) = dict.get("op").and_then(Object::as_bool) {
        engine.graphics_state_mut().overprint_fill = v;
    }
    if dict.get("Font").is_some() {
        warn!("Font entries in ExtGState are resolved by the document layer");
    }
}

pub(crate) fn matrix_operand(
    operands: &[Object],
    operator: &'static str,
) -> Result<crate::utils::Matrix> {
    Ok((
        number(operands, 0, operator)?,
        number(operands, 1, operator)?,
        number(operands, 2, operator)?,
        number(operands, 3, operator)?,
        number(operands, 4, operator)?,
        number(operands, 5, operator)?,
    ))
}
