//! Path construction, painting and clipping operators.
//!
//! Handles: m, l, c, v, y, h, re, S, s, f, F, f*, B, B*, b, b*, n, W, W*

use log::warn;

use crate::error::Result;
use crate::interp::device::Device;
use crate::interp::engine::{StreamEngine, WindingRule};
use crate::model::objects::Object;

use super::number;

pub(crate) fn install<D: Device>(engine: &mut StreamEngine<'_, D>) {
    engine.register("m", move_to);
    engine.register("l", line_to);
    engine.register("c", curve_to);
    engine.register("v", curve_to_replicate_initial);
    engine.register("y", curve_to_replicate_final);
    engine.register("h", close_path);
    engine.register("re", append_rect);
    engine.register("S", stroke);
    engine.register("s", close_and_stroke);
    engine.register("f", fill);
    engine.register("F", fill);
    engine.register("f*", fill_even_odd);
    engine.register("B", fill_and_stroke);
    engine.register("B*", fill_and_stroke_even_odd);
    engine.register("b", close_fill_and_stroke);
    engine.register("b*", close_fill_and_stroke_even_odd);
    engine.register("n", end_path);
    engine.register("W", clip);
    engine.register("W*", clip_even_odd);
}

/// PDF operator: `m`
fn move_to<D: Device>(engine: &mut StreamEngine<'_, D>, operands: &[Object]) -> Result<()> {
    let x = number(operands, 0, "m")?;
    let y = number(operands, 1, "m")?;
    engine.move_to(x, y);
    Ok(())
}

/// PDF operator: `l`
fn line_to<D: Device>(engine: &mut StreamEngine<'_, D>, operands: &[Object]) -> Result<()> {
    let x = number(operands, 0, "l")?;
    let y = number(operands, 1, "l")?;
    engine.line_to(x, y);
    Ok(())
}

/// PDF operator: `c`
fn curve_to<D: Device>(engine: &mut StreamEngine<'_, D>, operands: &[Object]) -> Result<()> {
    let x1 = number(operands, 0, "c")?;
    let y1 = number(operands, 1, "c")?;
    let x2 = number(operands, 2, "c")?;
    let y2 = number(operands, 3, "c")?;
    let x3 = number(operands, 4, "c")?;
    let y3 = number(operands, 5, "c")?;
    engine.curve_to(x1, y1, x2, y2, x3, y3);
    Ok(())
}

/// PDF operator: `v`
///
/// The first control point coincides with the current point.
fn curve_to_replicate_initial<D: Device>(
    engine: &mut StreamEngine<'_, D>,
    operands: &[Object],
) -> Result<()> {
    let x2 = number(operands, 0, "v")?;
    let y2 = number(operands, 1, "v")?;
    let x3 = number(operands, 2, "v")?;
    let y3 = number(operands, 3, "v")?;
    match engine.current_point() {
        Some((x1, y1)) => engine.curve_to(x1, y1, x2, y2, x3, y3),
        None => warn!("curve 'v' without a current point, ignored"),
    }
    Ok(())
}

/// PDF operator: `y`
///
/// The second control point coincides with the final point.
fn curve_to_replicate_final<D: Device>(
    engine: &mut StreamEngine<'_, D>,
    operands: &[Object],
) -> Result<()> {
    let x1 = number(operands, 0, "y")?;
    let y1 = number(operands, 1, "y")?;
    let x3 = number(operands, 2, "y")?;
    let y3 = number(operands, 3, "y")?;
    engine.curve_to(x1, y1, x3, y3, x3, y3);
    Ok(())
}

/// PDF operator: `h`
fn close_path<D: Device>(engine: &mut StreamEngine<'_, D>, _operands: &[Object]) -> Result<()> {
    engine.close_path();
    Ok(())
}

/// PDF operator: `re`
fn append_rect<D: Device>(engine: &mut StreamEngine<'_, D>, operands: &[Object]) -> Result<()> {
    let x = number(operands, 0, "re")?;
    let y = number(operands, 1, "re")?;
    let w = number(operands, 2, "re")?;
    let h = number(operands, 3, "re")?;
    engine.append_rect(x, y, w, h);
    Ok(())
}

/// PDF operator: `S`
fn stroke<D: Device>(engine: &mut StreamEngine<'_, D>, _operands: &[Object]) -> Result<()> {
    engine.paint_current_path(true, false, false)
}

/// PDF operator: `s`
fn close_and_stroke<D: Device>(
    engine: &mut StreamEngine<'_, D>,
    _operands: &[Object],
) -> Result<()> {
    engine.close_path();
    engine.paint_current_path(true, false, false)
}

/// PDF operator: `f` (and the obsolete `F`)
fn fill<D: Device>(engine: &mut StreamEngine<'_, D>, _operands: &[Object]) -> Result<()> {
    engine.paint_current_path(false, true, false)
}

/// PDF operator: `f*`
fn fill_even_odd<D: Device>(engine: &mut StreamEngine<'_, D>, _operands: &[Object]) -> Result<()> {
    engine.paint_current_path(false, true, true)
}

/// PDF operator: `B`
fn fill_and_stroke<D: Device>(
    engine: &mut StreamEngine<'_, D>,
    _operands: &[Object],
) -> Result<()> {
    engine.paint_current_path(true, true, false)
}

/// PDF operator: `B*`
fn fill_and_stroke_even_odd<D: Device>(
    engine: &mut StreamEngine<'_, D>,
    _operands: &[Object],
) -> Result<()> {
    engine.paint_current_path(true, true, true)
}

/// PDF operator: `b`
fn close_fill_and_stroke<D: Device>(
    engine: &mut StreamEngine<'_, D>,
    _operands: &[Object],
) -> Result<()> {
    engine.close_path();
    engine.paint_current_path(true, true, false)
}

/// PDF operator: `b*`
fn close_fill_and_stroke_even_odd<D: Device>(
    engine: &mut StreamEngine<'_, D>,
    _operands: &[Object],
) -> Result<()> {
    engine.close_path();
    engine.paint_current_path(true, true, true)
}

/// PDF operator: `n`
fn end_path<D: Device>(engine: &mut StreamEngine<'_, D>, _operands: &[Object]) -> Result<()> {
    engine.end_path();
    Ok(())
}

/// PDF operator: `W`
fn clip<D: Device>(engine: &mut StreamEngine<'_, D>, _operands: &[Object]) -> Result<()> {
    engine.set_pending_clip(WindingRule::NonZero);
    Ok(())
}

/// PDF operator: `W*`
fn clip_even_odd<D: Device>(engine: &mut StreamEngine<'_, D>, _operands: &[Object]) -> Result<()> {
    engine.set_pending_clip(WindingRule::EvenOdd);
    Ok(())
}
