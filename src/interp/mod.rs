//! Content-stream execution: the engine, the device trait and the default
//! operator set.

pub mod device;
pub mod engine;
pub mod ops;

pub use device::{default_operator_error, Device, ErrorDisposition, NullDevice};
pub use engine::{EngineOptions, PathSegment, StreamEngine, WindingRule};
pub use ops::{FnOperator, OperatorHandler};
