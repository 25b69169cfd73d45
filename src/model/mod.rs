//! Value types shared by the tokenizer and the engine.

pub mod color;
pub mod objects;
pub mod state;

pub use color::{Color, ColorSpace};
pub use objects::{Dict, Object};
pub use state::{BlendMode, GraphicsState, LineDashPattern, SoftMask, TextRenderingMode, TextState};
