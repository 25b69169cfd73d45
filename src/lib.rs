//! orinoco - a PDF content-stream interpreter core.
//!
//! The crate executes the operator sequence of a PDF content stream against
//! a client-supplied [`Device`], maintaining the imaging-model state as each
//! operator runs: the graphics-state stack, the lexically scoped resource
//! dictionary, the text matrices, and the recursion discipline across
//! embedded streams (form XObjects, transparency groups, soft masks, tiling
//! patterns, Type 3 glyph procedures, annotation appearances).
//!
//! It does not parse PDF files and it does not rasterize anything: the
//! document side arrives through the small capability surface in
//! [`document`], and everything visual leaves through [`Device`] events.

pub mod document;
pub mod error;
pub mod interp;
pub mod model;
pub mod parser;
pub mod utils;

pub use document::{
    Annotation, AppearanceStream, CharProc, ContentStream, Font, FormXObject, Helvetica,
    ImageXObject, Page, Resources, TilingPattern, Type3Font, XObject,
};
pub use error::{EngineError, Result};
pub use interp::{
    default_operator_error, Device, EngineOptions, ErrorDisposition, FnOperator, NullDevice,
    OperatorHandler, PathSegment, StreamEngine, WindingRule,
};
pub use model::{
    BlendMode, Color, ColorSpace, Dict, GraphicsState, LineDashPattern, Object, SoftMask,
    TextRenderingMode, TextState,
};
pub use parser::{ContentLexer, Token};
