//! Color operators.
//!
//! Handles: CS, cs, G, g, RG, rg, K, k, SC, SCN, sc, scn

use crate::error::{EngineError, Result};
use crate::interp::device::Device;
use crate::interp::engine::StreamEngine;
use crate::model::color::{Color, ColorSpace, PREDEFINED_COLORSPACE};
use crate::model::objects::Object;

use super::{name, number};

pub(crate) fn install<D: Device>(engine: &mut StreamEngine<'_, D>) {
    engine.register("CS", set_stroking_color_space);
    engine.register("cs", set_non_stroking_color_space);
    engine.register("G", set_stroking_gray);
    engine.register("g", set_non_stroking_gray);
    engine.register("RG", set_stroking_rgb);
    engine.register("rg", set_non_stroking_rgb);
    engine.register("K", set_stroking_cmyk);
    engine.register("k", set_non_stroking_cmyk);
    engine.register("SC", set_stroking_color);
    engine.register("SCN", set_stroking_color);
    engine.register("sc", set_non_stroking_color);
    engine.register("scn", set_non_stroking_color);
}

/// Resolves a color space name, first against the predefined families, then
/// the resource scope.
fn resolve_color_space<D: Device>(
    engine: &StreamEngine<'_, D>,
    cs_name: &str,
) -> Result<ColorSpace> {
    if let Some(space) = PREDEFINED_COLORSPACE.get(cs_name) {
        return Ok(space.clone());
    }
    engine
        .resources()
        .and_then(|r| r.color_space(cs_name).cloned())
        .ok_or_else(|| EngineError::MissingResource {
            kind: "color space",
            name: cs_name.to_string(),
        })
}

/// PDF operator: `CS`
fn set_stroking_color_space<D: Device>(
    engine: &mut StreamEngine<'_, D>,
    operands: &[Object],
) -> Result<()> {
    let space = resolve_color_space(engine, name(operands, 0, "CS")?)?;
    let state = engine.graphics_state_mut();
    state.stroking_color = space.initial_color();
    state.stroking_color_space = space;
    Ok(())
}

/// PDF operator: `cs`
fn set_non_stroking_color_space<D: Device>(
    engine: &mut StreamEngine<'_, D>,
    operands: &[Object],
) -> Result<()> {
    let space = resolve_color_space(engine, name(operands, 0, "cs")?)?;
    let state = engine.graphics_state_mut();
    state.non_stroking_color = space.initial_color();
    state.non_stroking_color_space = space;
    Ok(())
}

/// PDF operator: `G`
fn set_stroking_gray<D: Device>(
    engine: &mut StreamEngine<'_, D>,
    operands: &[Object],
) -> Result<()> {
    let gray = number(operands, 0, "G")?;
    let state = engine.graphics_state_mut();
    state.stroking_color_space = ColorSpace::device_gray();
    state.stroking_color = Color::Gray(gray);
    Ok(())
}

/// PDF operator: `g`
fn set_non_stroking_gray<D: Device>(
    engine: &mut StreamEngine<'_, D>,
    operands: &[Object],
) -> Result<()> {
    let gray = number(operands, 0, "g")?;
    let state = engine.graphics_state_mut();
    state.non_stroking_color_space = ColorSpace::device_gray();
    state.non_stroking_color = Color::Gray(gray);
    Ok(())
}

/// PDF operator: `RG`
fn set_stroking_rgb<D: Device>(
    engine: &mut StreamEngine<'_, D>,
    operands: &[Object],
) -> Result<()> {
    let r = number(operands, 0, "RG")?;
    let g = number(operands, 1, "RG")?;
    let b = number(operands, 2, "RG")?;
    let state = engine.graphics_state_mut();
    state.stroking_color_space = ColorSpace::device_rgb();
    state.stroking_color = Color::Rgb(r, g, b);
    Ok(())
}

/// PDF operator: `rg`
fn set_non_stroking_rgb<D: Device>(
    engine: &mut StreamEngine<'_, D>,
    operands: &[Object],
) -> Result<()> {
    let r = number(operands, 0, "rg")?;
    let g = number(operands, 1, "rg")?;
    let b = number(operands, 2, "rg")?;
    let state = engine.graphics_state_mut();
    state.non_stroking_color_space = ColorSpace::device_rgb();
    state.non_stroking_color = Color::Rgb(r, g, b);
    Ok(())
}

/// PDF operator: `K`
fn set_stroking_cmyk<D: Device>(
    engine: &mut StreamEngine<'_, D>,
    operands: &[Object],
) -> Result<()> {
    let c = number(operands, 0, "K")?;
    let m = number(operands, 1, "K")?;
    let y = number(operands, 2, "K")?;
    let k = number(operands, 3, "K")?;
    let state = engine.graphics_state_mut();
    state.stroking_color_space = ColorSpace::device_cmyk();
    state.stroking_color = Color::Cmyk(c, m, y, k);
    Ok(())
}

/// PDF operator: `k`
fn set_non_stroking_cmyk<D: Device>(
    engine: &mut StreamEngine<'_, D>,
    operands: &[Object],
) -> Result<()> {
    let c = number(operands, 0, "k")?;
    let m = number(operands, 1, "k")?;
    let y = number(operands, 2, "k")?;
    let k = number(operands, 3, "k")?;
    let state = engine.graphics_state_mut();
    state.non_stroking_color_space = ColorSpace::device_cmyk();
    state.non_stroking_color = Color::Cmyk(c, m, y, k);
    Ok(())
}

/// Builds the color value set by SC/SCN in the given space. A trailing name
/// operand selects a pattern.
fn color_operand(operands: &[Object], space: &ColorSpace, operator: &'static str) -> Result<Color> {
    if let Some(Object::Name(pattern)) = operands.last() {
        let components: Vec<f64> = operands[..operands.len() - 1]
            .iter()
            .filter_map(Object::as_f64)
            .collect();
        return Ok(Color::Pattern {
            name: pattern.clone(),
            components,
        });
    }
    let components: Vec<f64> = operands.iter().filter_map(Object::as_f64).collect();
    if components.len() != operands.len() || components.is_empty() {
        return Err(super::missing(operator));
    }
    Ok(space.color_from_components(components))
}

/// PDF operators: `SC` and `SCN`
fn set_stroking_color<D: Device>(
    engine: &mut StreamEngine<'_, D>,
    operands: &[Object],
) -> Result<()> {
    let space = engine.graphics_state().stroking_color_space.clone();
    let color = color_operand(operands, &space, "SCN")?;
    engine.graphics_state_mut().stroking_color = color;
    Ok(())
}

/// PDF operators: `sc` and `scn`
fn set_non_stroking_color<D: Device>(
    engine: &mut StreamEngine<'_, D>,
    operands: &[Object],
) -> Result<()> {
    let space = engine.graphics_state().non_stroking_color_space.clone();
    let color = color_operand(operands, &space, "scn")?;
    engine.graphics_state_mut().non_stroking_color = color;
    Ok(())
}
