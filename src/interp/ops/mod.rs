//! The default operator handler set.
//!
//! Handlers are values in a name-keyed table; each receives the engine as an
//! explicit argument, so nothing in the table aliases engine state. The
//! default set covers the operators of the imaging model the engine owns;
//! clients replace or extend entries with `StreamEngine::add_operator`.

pub mod color;
pub mod graphics_state;
pub mod path;
pub mod text;
pub mod xobject;

use crate::error::{EngineError, Result};
use crate::interp::device::Device;
use crate::interp::engine::StreamEngine;
use crate::model::objects::Object;

/// A single content-stream operator implementation.
pub trait OperatorHandler<D: Device> {
    /// The operator name as it appears in the stream.
    fn name(&self) -> &'static str;

    /// Executes the operator with the operands accumulated before it.
    fn process(&self, engine: &mut StreamEngine<'_, D>, operands: &[Object]) -> Result<()>;
}

/// Adapter turning a plain function into an operator handler.
pub struct FnOperator<D: Device> {
    pub(crate) name: &'static str,
    pub(crate) run: fn(&mut StreamEngine<'_, D>, &[Object]) -> Result<()>,
}

impl<D: Device> FnOperator<D> {
    pub fn new(
        name: &'static str,
        run: fn(&mut StreamEngine<'_, D>, &[Object]) -> Result<()>,
    ) -> Self {
        Self { name, run }
    }
}

impl<D: Device> OperatorHandler<D> for FnOperator<D> {
    fn name(&self) -> &'static str {
        self.name
    }

    fn process(&self, engine: &mut StreamEngine<'_, D>, operands: &[Object]) -> Result<()> {
        (self.run)(engine, operands)
    }
}

/// Registers the whole default set on a fresh engine.
pub(crate) fn install_default_operators<D: Device>(engine: &mut StreamEngine<'_, D>) {
    graphics_state::install(engine);
    path::install(engine);
    color::install(engine);
    text::install(engine);
    xobject::install(engine);
}

// Operand accessors. Handlers treat a short or wrong-typed buffer as a
// MissingOperand condition, which the default error policy absorbs.

pub(crate) fn missing(operator: &'static str) -> EngineError {
    EngineError::MissingOperand {
        operator: operator.to_string(),
    }
}

pub(crate) fn number(operands: &[Object], index: usize, operator: &'static str) -> Result<f64> {
    operands
        .get(index)
        .and_then(Object::as_f64)
        .ok_or_else(|| missing(operator))
}

pub(crate) fn integer(operands: &[Object], index: usize, operator: &'static str) -> Result<i64> {
    operands
        .get(index)
        .and_then(Object::as_i64)
        .ok_or_else(|| missing(operator))
}

pub(crate) fn name<'o>(
    operands: &'o [Object],
    index: usize,
    operator: &'static str,
) -> Result<&'o str> {
    operands
        .get(index)
        .and_then(Object::as_name)
        .ok_or_else(|| missing(operator))
}

pub(crate) fn string<'o>(
    operands: &'o [Object],
    index: usize,
    operator: &'static str,
) -> Result<&'o [u8]> {
    operands
        .get(index)
        .and_then(Object::as_string)
        .ok_or_else(|| missing(operator))
}

pub(crate) fn array<'o>(
    operands: &'o [Object],
    index: usize,
    operator: &'static str,
) -> Result<&'o [Object]> {
    operands
        .get(index)
        .and_then(Object::as_array)
        .ok_or_else(|| missing(operator))
}

/// Collects the numeric entries of an array operand, ignoring anything else.
pub(crate) fn number_array(items: &[Object]) -> Vec<f64> {
    items.iter().filter_map(Object::as_f64).collect()
}
