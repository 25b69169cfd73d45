//! XObject and marked-content operators.
//!
//! Handles: Do, BMC, BDC, EMC, MP, DP

use log::error;

use crate::document::xobject::XObject;
use crate::error::{EngineError, Result};
use crate::interp::device::Device;
use crate::interp::engine::StreamEngine;
use crate::model::objects::{Dict, Object};

use super::name;

pub(crate) fn install<D: Device>(engine: &mut StreamEngine<'_, D>) {
    engine.register("Do", invoke_xobject);
    engine.register("BMC", begin_marked_content);
    engine.register("BDC", begin_marked_content_with_properties);
    engine.register("EMC", end_marked_content);
    engine.register("MP", marked_content_point);
    engine.register("DP", marked_content_point_with_properties);
}

/// PDF operator: `Do`
///
/// Invokes a named XObject. Forms re-enter the engine; the level counter
/// bounds pathological self-referential form graphs.
fn invoke_xobject<D: Device>(engine: &mut StreamEngine<'_, D>, operands: &[Object]) -> Result<()> {
    let xobject_name = name(operands, 0, "Do")?;
    let xobject = engine
        .resources()
        .and_then(|r| r.xobject(xobject_name))
        .ok_or_else(|| EngineError::MissingResource {
            kind: "XObject",
            name: xobject_name.to_string(),
        })?;
    match xobject {
        XObject::Form(form) => {
            engine.increase_level();
            let result = if engine.level() > engine.options().max_form_depth {
                error!("recursion is too deep, skipping form XObject {xobject_name}");
                Ok(())
            } else if form.transparency_group {
                engine.show_transparency_group(&form)
            } else {
                engine.show_form(&form)
            };
            engine.decrease_level();
            result
        }
        XObject::Image(image) => engine.draw_image(xobject_name, &image),
    }
}

/// Resolves the second BDC/DP operand: an inline dictionary, or a name into
/// the Properties resource subdictionary.
fn properties_operand<D: Device>(
    engine: &StreamEngine<'_, D>,
    operands: &[Object],
) -> Option<Dict> {
    match operands.get(1) {
        Some(Object::Dict(dict)) => Some(dict.clone()),
        Some(Object::Name(properties_name)) => engine
            .resources()
            .and_then(|r| r.properties(properties_name).cloned()),
        _ => None,
    }
}

/// PDF operator: `BMC`
fn begin_marked_content<D: Device>(
    engine: &mut StreamEngine<'_, D>,
    operands: &[Object],
) -> Result<()> {
    let tag = name(operands, 0, "BMC")?.to_string();
    engine.begin_marked_content(&tag, None);
    Ok(())
}

/// PDF operator: `BDC`
fn begin_marked_content_with_properties<D: Device>(
    engine: &mut StreamEngine<'_, D>,
    operands: &[Object],
) -> Result<()> {
    let tag = name(operands, 0, "BDC")?.to_string();
    let properties = properties_operand(engine, operands);
    engine.begin_marked_content(&tag, properties.as_ref());
    Ok(())
}

/// PDF operator: `EMC`
fn end_marked_content<D: Device>(
    engine: &mut StreamEngine<'_, D>,
    _operands: &[Object],
) -> Result<()> {
    engine.end_marked_content();
    Ok(())
}

/// PDF operator: `MP`
fn marked_content_point<D: Device>(
    engine: &mut StreamEngine<'_, D>,
    operands: &[Object],
) -> Result<()> {
    let tag = name(operands, 0, "MP")?.to_string();
    engine.marked_content_point(&tag, None);
    Ok(())
}

/// PDF operator: `DP`
fn marked_content_point_with_properties<D: Device>(
    engine: &mut StreamEngine<'_, D>,
    operands: &[Object],
) -> Result<()> {
    let tag = name(operands, 0, "DP")?.to_string();
    let properties = properties_operand(engine, operands);
    engine.marked_content_point(&tag, properties.as_ref());
    Ok(())
}
