//! The content-stream execution engine.
//!
//! `StreamEngine` drives a device through a page: it pulls tokens from the
//! lexer, accumulates operands, dispatches operators through a pluggable
//! handler table, and maintains the full imaging-model state (graphics-state
//! stack, resource scope, text matrices, recursion level) across recursively
//! embedded streams.

use std::collections::HashMap;
use std::sync::Arc;

use bytes::Bytes;
use log::{error, warn};

use crate::document::annotation::{Annotation, AppearanceStream};
use crate::document::font::{CharProc, Font, Helvetica, Type3Font};
use crate::document::page::{ContentStream, Page};
use crate::document::resources::Resources;
use crate::document::xobject::{FormXObject, ImageXObject, TilingPattern};
use crate::error::{EngineError, Result};
use crate::interp::device::{Device, ErrorDisposition};
use crate::interp::ops::{self, OperatorHandler};
use crate::model::color::{Color, ColorSpace};
use crate::model::objects::{Dict, Object};
use crate::model::state::{BlendMode, GraphicsState, LineDashPattern};
use crate::parser::lexer::{ContentLexer, Token};
use crate::utils::{
    apply_matrix_pt, apply_matrix_rect, mult_matrix, scaling_matrix, transform_rect,
    translate_matrix, translation_matrix, Matrix, Point, Rect, MATRIX_IDENTITY,
};

const STACK_INVARIANT: &str = "graphics stack is never empty during processing";

/// Engine tuning knobs.
#[derive(Debug, Clone)]
pub struct EngineOptions {
    /// Propagate unmatched restores and Do failures instead of absorbing
    /// them.
    pub strict: bool,
    /// Nesting depth beyond which the Do operator refuses to enter a form.
    pub max_form_depth: i32,
}

impl Default for EngineOptions {
    fn default() -> Self {
        Self {
            strict: false,
            max_form_depth: 25,
        }
    }
}

/// A segment of the path under construction, in user space.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PathSegment {
    MoveTo(f64, f64),
    LineTo(f64, f64),
    CurveTo(f64, f64, f64, f64, f64, f64),
    Close,
}

/// Winding rule selected by the W/W* clipping operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WindingRule {
    NonZero,
    EvenOdd,
}

/// Executes content streams against a client device.
///
/// One engine instance is reusable across pages; each `process_page` call
/// rebuilds the per-page state. The instance is not thread-safe but is
/// internally reentrant: operator handlers recursively drive nested streams
/// through the same engine.
pub struct StreamEngine<'a, D: Device> {
    device: &'a mut D,
    options: EngineOptions,
    operators: HashMap<&'static str, Arc<dyn OperatorHandler<D> + 'a>>,
    graphics_stack: Vec<GraphicsState>,
    text_matrix: Option<Matrix>,
    text_line_matrix: Option<Matrix>,
    resources: Option<Arc<Resources>>,
    current_page: Option<&'a Page>,
    processing_page: bool,
    initial_matrix: Matrix,
    level: i32,
    default_font: Option<Arc<dyn Font>>,
    current_path: Vec<PathSegment>,
    current_point: Option<Point>,
    pending_clip: Option<WindingRule>,
    inline_image_count: usize,
}

impl<'a, D: Device> StreamEngine<'a, D> {
    /// Creates an engine with the default operator set and options.
    pub fn new(device: &'a mut D) -> Self {
        Self::with_options(device, EngineOptions::default())
    }

    pub fn with_options(device: &'a mut D, options: EngineOptions) -> Self {
        let mut engine = Self {
            device,
            options,
            operators: HashMap::with_capacity(80),
            graphics_stack: Vec::new(),
            text_matrix: None,
            text_line_matrix: None,
            resources: None,
            current_page: None,
            processing_page: false,
            initial_matrix: MATRIX_IDENTITY,
            level: 0,
            default_font: None,
            current_path: Vec::new(),
            current_point: None,
            pending_clip: None,
            inline_image_count: 0,
        };
        ops::install_default_operators(&mut engine);
        engine
    }

    // ========================================================================
    // Operator registry
    // ========================================================================

    /// Registers an operator handler. Late registration overrides silently.
    pub fn add_operator(&mut self, handler: Arc<dyn OperatorHandler<D> + 'a>) {
        self.operators.insert(handler.name(), handler);
    }

    /// Registers a plain function as the handler for `name`.
    pub fn register(
        &mut self,
        name: &'static str,
        run: fn(&mut StreamEngine<'_, D>, &[Object]) -> Result<()>,
    ) {
        self.add_operator(Arc::new(ops::FnOperator { name, run }));
    }

    /// Dispatches a single operator with its operands.
    ///
    /// Handler failures are routed through the device's `operator_error`
    /// hook; an unknown name goes to `unsupported_operator`. This is also
    /// the recursive entry available to handlers that expand into other
    /// operators.
    pub fn process_operator(&mut self, name: &str, operands: &[Object]) -> Result<()> {
        let handler = self.operators.get(name).cloned();
        match handler {
            Some(handler) => match handler.process(self, operands) {
                Ok(()) => Ok(()),
                Err(e) => self.operator_exception(name, operands, e),
            },
            None => {
                self.device.unsupported_operator(name, operands);
                Ok(())
            }
        }
    }

    fn operator_exception(
        &mut self,
        name: &str,
        operands: &[Object],
        error: EngineError,
    ) -> Result<()> {
        match self.device.operator_error(name, operands, &error) {
            ErrorDisposition::Recover => {
                let lenient = matches!(error, EngineError::EmptyGraphicsStack) || name == "Do";
                if self.options.strict && lenient {
                    Err(error)
                } else {
                    Ok(())
                }
            }
            ErrorDisposition::Propagate => Err(error),
        }
    }

    // ========================================================================
    // Page processing
    // ========================================================================

    fn init_page(&mut self, page: &'a Page) {
        self.current_page = Some(page);
        self.graphics_stack.clear();
        self.graphics_stack.push(GraphicsState::new(page.crop_box));
        self.text_matrix = None;
        self.text_line_matrix = None;
        self.resources = None;
        self.initial_matrix = page.matrix;
        self.current_path.clear();
        self.current_point = None;
        self.pending_clip = None;
    }

    /// Initializes the engine for `page` and executes its content streams.
    ///
    /// This is the main entry point. Unrecoverable errors surface to the
    /// caller without rollback; the engine can be reused by calling
    /// `process_page` again.
    pub fn process_page(&mut self, page: &'a Page) -> Result<()> {
        self.init_page(page);
        self.device.begin_page(page)?;
        if page.has_contents() {
            self.processing_page = true;
            let result = self.process_stream(page);
            self.processing_page = false;
            result?;
        }
        self.device.end_page(page)?;
        Ok(())
    }

    /// Processes a standalone child stream of `page` without going through
    /// `process_page`. The page supplies the crop box and fallback
    /// resources; `current_page` is cleared again on exit.
    pub fn process_child_stream(
        &mut self,
        stream: &dyn ContentStream,
        page: &'a Page,
    ) -> Result<()> {
        if self.processing_page {
            return Err(EngineError::InvalidState(
                "current page has already been set, call process_page instead",
            ));
        }
        self.init_page(page);
        let result = self.process_stream(stream);
        self.current_page = None;
        result
    }

    // ========================================================================
    // Nested-stream drivers
    // ========================================================================

    /// Executes a form XObject in the current context.
    pub fn show_form(&mut self, form: &FormXObject) -> Result<()> {
        if self.current_page.is_none() {
            return Err(EngineError::InvalidState(
                "no current page, call process_child_stream instead",
            ));
        }
        if !form.content.is_empty() {
            self.process_stream(form)?;
        }
        Ok(())
    }

    /// Executes a transparency group, resetting blend mode, alpha constants
    /// and soft mask on entry.
    pub fn show_transparency_group(&mut self, group: &FormXObject) -> Result<()> {
        self.process_transparency_group(group)
    }

    fn process_transparency_group(&mut self, group: &FormXObject) -> Result<()> {
        if self.current_page.is_none() {
            return Err(EngineError::InvalidState(
                "no current page, call process_child_stream instead",
            ));
        }
        let parent_resources = self.push_resources(group);
        let saved_stack = self.save_graphics_stack();
        let parent_matrix = self.initial_matrix;

        // the group's initial matrix includes the parent CTM, so a scaled
        // form scales its content
        self.initial_matrix = self.state().ctm;
        {
            let state = self.state_mut();
            state.ctm = mult_matrix(group.matrix, state.ctm);
            state.blend_mode = BlendMode::Normal;
            state.stroke_alpha = 1.0;
            state.non_stroke_alpha = 1.0;
            state.soft_mask = None;
        }
        self.clip_to_rect(group.bbox);

        let result = self.process_stream_operators(group);

        self.initial_matrix = parent_matrix;
        self.restore_graphics_stack(saved_stack);
        self.pop_resources(parent_resources);
        result
    }

    /// Executes a soft-mask transparency group. The CTM is replaced (not
    /// concatenated) with the mask's initial transformation matrix inside an
    /// outer save/restore pair.
    pub fn process_soft_mask(&mut self, group: &FormXObject) -> Result<()> {
        self.save_graphics_state();
        let mask_ctm = match &self.state().soft_mask {
            Some(mask) => mask.initial_transformation_matrix,
            None => {
                self.restore_graphics_state()?;
                return Err(EngineError::InvalidState(
                    "no soft mask in the current graphics state",
                ));
            }
        };
        self.state_mut().ctm = mask_ctm;
        let result = self.process_transparency_group(group);
        self.restore_graphics_state()?;
        result
    }

    /// Executes a Type 3 glyph procedure. The CTM becomes the text rendering
    /// matrix concatenated with the font matrix; the bounding box is
    /// deliberately not applied as a clip, since Type 3 boxes are often
    /// wrong.
    pub fn process_type3_stream(
        &mut self,
        char_proc: &CharProc,
        text_rendering_matrix: Matrix,
    ) -> Result<()> {
        if self.current_page.is_none() {
            return Err(EngineError::InvalidState(
                "no current page, call process_child_stream instead",
            ));
        }
        let parent_resources = self.push_resources(char_proc);
        let saved_stack = self.save_graphics_stack();

        self.state_mut().ctm = mult_matrix(char_proc.font_matrix, text_rendering_matrix);

        // the glyph stream may carry BT/ET pairs of its own
        let saved_text = (self.text_matrix, self.text_line_matrix);
        self.text_matrix = Some(MATRIX_IDENTITY);
        self.text_line_matrix = Some(MATRIX_IDENTITY);

        let result = self.process_stream_operators(char_proc);

        self.text_matrix = saved_text.0;
        self.text_line_matrix = saved_text.1;
        self.restore_graphics_stack(saved_stack);
        self.pop_resources(parent_resources);
        result
    }

    /// Executes a tiling pattern cell, optionally seeding both colors for an
    /// uncolored pattern.
    pub fn process_tiling_pattern(
        &mut self,
        pattern: &TilingPattern,
        color: Option<(Color, ColorSpace)>,
    ) -> Result<()> {
        self.process_tiling_pattern_with_matrix(pattern, color, pattern.matrix)
    }

    /// Like `process_tiling_pattern`, with the pattern matrix overridden for
    /// custom placements.
    pub fn process_tiling_pattern_with_matrix(
        &mut self,
        pattern: &TilingPattern,
        color: Option<(Color, ColorSpace)>,
        pattern_matrix: Matrix,
    ) -> Result<()> {
        let parent_resources = self.push_resources(pattern);
        let parent_matrix = self.initial_matrix;
        self.initial_matrix = mult_matrix(pattern_matrix, self.initial_matrix);

        let saved_stack = self.save_graphics_stack();

        // a clean state for the cell: fresh clip from the transformed
        // pattern box, fresh line path
        let cell = apply_matrix_rect(pattern_matrix, pattern.bbox);
        self.graphics_stack.push(GraphicsState::new(cell));
        let saved_path = std::mem::take(&mut self.current_path);
        let saved_point = self.current_point.take();

        if let Some((color, color_space)) = color {
            let state = self.state_mut();
            state.non_stroking_color_space = color_space.clone();
            state.non_stroking_color = color.clone();
            state.stroking_color_space = color_space;
            state.stroking_color = color;
        }
        {
            let state = self.state_mut();
            state.ctm = mult_matrix(pattern_matrix, state.ctm);
        }
        self.clip_to_rect(pattern.bbox);

        // the cell may carry BT/ET pairs of its own
        let saved_text = (self.text_matrix, self.text_line_matrix);
        let result = self.process_stream_operators(pattern);
        self.text_matrix = saved_text.0;
        self.text_line_matrix = saved_text.1;

        self.current_path = saved_path;
        self.current_point = saved_point;
        self.initial_matrix = parent_matrix;
        self.restore_graphics_stack(saved_stack);
        self.pop_resources(parent_resources);
        result
    }

    /// Shows an annotation through its normal appearance, if it has one.
    pub fn show_annotation(&mut self, annotation: &Annotation) -> Result<()> {
        if let Some(appearance) = self.appearance(annotation) {
            self.process_annotation(annotation, &appearance)?;
        }
        Ok(())
    }

    /// The appearance stream to process for an annotation. Overridable by
    /// calling `process_annotation` directly with another appearance.
    pub fn appearance(&self, annotation: &Annotation) -> Option<Arc<AppearanceStream>> {
        annotation.normal_appearance()
    }

    /// Executes an annotation appearance, mapped onto the annotation
    /// rectangle.
    ///
    /// The appearance matrix is applied before the rectangle mapping, the
    /// reverse of the order the PDF specification states. Only this order
    /// behaves correctly for rotated pages whose appearances carry a matrix.
    pub fn process_annotation(
        &mut self,
        annotation: &Annotation,
        appearance: &AppearanceStream,
    ) -> Result<()> {
        let parent_resources = self.push_resources(appearance);
        let saved_stack = self.save_graphics_stack();
        let parent_matrix = self.initial_matrix;

        let rect = annotation.rectangle;
        let bbox = appearance.bbox;
        let rect_w = rect.2 - rect.0;
        let rect_h = rect.3 - rect.1;
        let bbox_w = bbox.2 - bbox.0;
        let bbox_h = bbox.3 - bbox.1;
        let mut result = Ok(());

        // zero-sized rectangles are not valid
        if rect_w > 0.0 && rect_h > 0.0 && bbox_w > 0.0 && bbox_h > 0.0 {
            let matrix = appearance.matrix;
            let transformed = apply_matrix_rect(matrix, bbox);
            let (tx0, ty0, tx1, ty1) = transformed;

            // scale and translate the transformed appearance box onto the
            // annotation rectangle
            let a = mult_matrix(
                translation_matrix(-tx0, -ty0),
                mult_matrix(
                    scaling_matrix(rect_w / (tx1 - tx0), rect_h / (ty1 - ty0)),
                    translation_matrix(rect.0, rect.1),
                ),
            );
            let aa = mult_matrix(matrix, a);

            self.state_mut().ctm = aa;
            self.clip_to_rect(bbox);
            // patterns inside appearance streams anchor to this matrix
            self.initial_matrix = aa;

            result = self.process_stream_operators(appearance);
        }

        self.initial_matrix = parent_matrix;
        self.restore_graphics_stack(saved_stack);
        self.pop_resources(parent_resources);
        result
    }

    /// The common five-phase envelope for forms and child streams: scope the
    /// resources, detach the graphics stack, arrange CTM/clip, execute,
    /// restore.
    fn process_stream(&mut self, stream: &dyn ContentStream) -> Result<()> {
        let parent_resources = self.push_resources(stream);
        let saved_stack = self.save_graphics_stack();
        let parent_matrix = self.initial_matrix;

        {
            let state = self.state_mut();
            state.ctm = mult_matrix(stream.matrix(), state.ctm);
        }
        // the stream's initial matrix includes the parent CTM, so a scaled
        // form scales its content
        self.initial_matrix = self.state().ctm;
        if let Some(bbox) = stream.bbox() {
            self.clip_to_rect(bbox);
        }

        let result = self.process_stream_operators(stream);

        self.initial_matrix = parent_matrix;
        self.restore_graphics_stack(saved_stack);
        self.pop_resources(parent_resources);
        result
    }

    /// The executor: pulls tokens, accumulates operands, dispatches on each
    /// operator and clears the buffer afterwards.
    fn process_stream_operators(&mut self, stream: &dyn ContentStream) -> Result<()> {
        let mut lexer = ContentLexer::new(stream.content());
        let mut operands: Vec<Object> = Vec::new();
        while let Some(token) = lexer.next_token()? {
            match token {
                Token::Object(obj) => operands.push(obj),
                Token::Operator(name) => {
                    self.process_operator(&name, &operands)?;
                    operands.clear();
                }
                Token::InlineImage { dict, data } => {
                    match self.draw_inline_image(dict, data) {
                        Ok(()) => {}
                        Err(e) => self.operator_exception("BI", &[], e)?,
                    }
                    operands.clear();
                }
            }
        }
        Ok(())
    }

    // ========================================================================
    // Resource scope
    // ========================================================================

    /// Installs the stream's resource scope and returns the previous one.
    ///
    /// Selection order: the stream's own resources, then the caller's
    /// (inheritance is not in the PDF spec, but real files rely on it),
    /// then the page's, then a fresh empty dictionary.
    fn push_resources(&mut self, stream: &dyn ContentStream) -> Option<Arc<Resources>> {
        let parent = self.resources.clone();
        if let Some(own) = stream.resources() {
            self.resources = Some(own);
        } else if self.resources.is_none() {
            let page_resources = self.current_page.and_then(|page| page.resources.clone());
            self.resources = Some(page_resources.unwrap_or_default());
        }
        parent
    }

    fn pop_resources(&mut self, parent: Option<Arc<Resources>>) {
        self.resources = parent;
    }

    /// The resource scope the current stream executes against.
    pub fn resources(&self) -> Option<&Arc<Resources>> {
        self.resources.as_ref()
    }

    // ========================================================================
    // Graphics-state stack
    // ========================================================================

    fn state(&self) -> &GraphicsState {
        self.graphics_stack.last().expect(STACK_INVARIANT)
    }

    fn state_mut(&mut self) -> &mut GraphicsState {
        self.graphics_stack.last_mut().expect(STACK_INVARIANT)
    }

    /// The current graphics state.
    pub fn graphics_state(&self) -> &GraphicsState {
        self.state()
    }

    pub fn graphics_state_mut(&mut self) -> &mut GraphicsState {
        self.state_mut()
    }

    /// Clones the current state and pushes it (the q operator).
    pub fn save_graphics_state(&mut self) {
        let top = self.state().clone();
        self.graphics_stack.push(top);
    }

    /// Pops the current state (the Q operator). Fails when nothing is left
    /// to pop; the Q handler leaves the demotion to the error policy.
    pub fn restore_graphics_state(&mut self) -> Result<()> {
        if self.graphics_stack.len() <= 1 {
            return Err(EngineError::EmptyGraphicsStack);
        }
        self.graphics_stack.pop();
        Ok(())
    }

    pub fn graphics_stack_size(&self) -> usize {
        self.graphics_stack.len()
    }

    /// Detaches the whole stack for a nested stream, leaving a fresh stack
    /// seeded from a clone of the current state. A q/Q imbalance inside the
    /// nested stream therefore cannot leak into the parent.
    pub fn save_graphics_stack(&mut self) -> Vec<GraphicsState> {
        let seed = self.state().clone();
        std::mem::replace(&mut self.graphics_stack, vec![seed])
    }

    /// Reinstates a stack detached by `save_graphics_stack`.
    pub fn restore_graphics_stack(&mut self, snapshot: Vec<GraphicsState>) {
        self.graphics_stack = snapshot;
    }

    /// Transforms `rect` by the CTM and intersects the clipping path with
    /// the result.
    fn clip_to_rect(&mut self, rect: Rect) {
        let quad = transform_rect(self.state().ctm, rect);
        self.state_mut().intersect_clip(quad);
    }

    // ========================================================================
    // Text matrices
    // ========================================================================

    pub fn text_matrix(&self) -> Option<Matrix> {
        self.text_matrix
    }

    pub fn set_text_matrix(&mut self, matrix: Option<Matrix>) {
        self.text_matrix = matrix;
    }

    pub fn text_line_matrix(&self) -> Option<Matrix> {
        self.text_line_matrix
    }

    pub fn set_text_line_matrix(&mut self, matrix: Option<Matrix>) {
        self.text_line_matrix = matrix;
    }

    // ========================================================================
    // Text showing
    // ========================================================================

    /// Hook target for the BT operator.
    pub fn begin_text(&mut self) -> Result<()> {
        self.device.begin_text()
    }

    /// Hook target for the ET operator.
    pub fn end_text(&mut self) -> Result<()> {
        self.device.end_text()
    }

    /// Shows a single encoded string (the Tj operator).
    pub fn show_text_string(&mut self, bytes: &[u8]) -> Result<()> {
        self.show_text(bytes)
    }

    /// Shows a TJ array: numbers are positional adjustments, strings are
    /// shown, nested arrays are skipped with an error log, anything else is
    /// malformed.
    pub fn show_text_strings(&mut self, array: &[Object]) -> Result<()> {
        let (font_size, h_scale, is_vertical) = {
            let ts = &self.state().text_state;
            let vertical = ts.font.as_ref().map_or(false, |font| font.is_vertical());
            (ts.font_size, ts.horizontal_scaling / 100.0, vertical)
        };
        for item in array {
            match item {
                Object::Int(_) | Object::Real(_) => {
                    let tj = item.as_f64().unwrap_or(0.0);
                    let (tx, ty) = if is_vertical {
                        (0.0, -tj / 1000.0 * font_size)
                    } else {
                        (-tj / 1000.0 * font_size * h_scale, 0.0)
                    };
                    self.apply_text_adjustment(tx, ty);
                }
                Object::String(bytes) => self.show_text(bytes)?,
                Object::Array(_) => {
                    error!("nested arrays are not allowed in a TJ array");
                }
                other => return Err(EngineError::MalformedTextArray(other.type_name())),
            }
        }
        Ok(())
    }

    /// Applies a TJ positional adjustment by translating the text matrix.
    pub fn apply_text_adjustment(&mut self, tx: f64, ty: f64) {
        match self.text_matrix {
            Some(tm) => self.text_matrix = Some(translate_matrix(tm, (tx, ty))),
            None => warn!("text adjustment outside of a text object, ignored"),
        }
    }

    /// Decodes `string` with the current font and emits one glyph event per
    /// code, advancing the text matrix after each.
    pub fn show_text(&mut self, string: &[u8]) -> Result<()> {
        if self.text_matrix.is_none() {
            warn!("text-showing operator outside of a text object, ignored");
            return Ok(());
        }
        let (font, font_size, h_scale, char_spacing, word_spacing_param, rise) = {
            let ts = &self.state().text_state;
            (
                ts.font.clone(),
                ts.font_size,
                ts.horizontal_scaling / 100.0,
                ts.char_spacing,
                ts.word_spacing,
                ts.rise,
            )
        };
        let font = match font {
            Some(font) => font,
            None => {
                warn!("no current font, will use default");
                self.default_font()
            }
        };

        // text state parameters in matrix form
        let parameters: Matrix = (font_size * h_scale, 0.0, 0.0, font_size, 0.0, rise);

        let mut offset = 0;
        while offset < string.len() {
            let (code, consumed) = font.read_code(&string[offset..])?;
            offset += consumed;

            // word spacing applies to every single-byte code 32, and never
            // to a multi-byte code with the same value
            let word_spacing = if consumed == 1 && code == 32 {
                word_spacing_param
            } else {
                0.0
            };

            let Some(tm) = self.text_matrix else { break };
            let ctm = self.state().ctm;
            let mut trm = mult_matrix(parameters, mult_matrix(tm, ctm));

            if font.is_vertical() {
                // shift the horizontal origin to the vertical origin
                trm = translate_matrix(trm, font.position_vector(code));
            }

            let displacement = font.displacement(code);
            self.show_glyph(trm, &font, code, displacement)?;

            let (tx, ty) = if font.is_vertical() {
                (
                    0.0,
                    displacement.1 * font_size + char_spacing + word_spacing,
                )
            } else {
                (
                    (displacement.0 * font_size + char_spacing + word_spacing) * h_scale,
                    0.0,
                )
            };
            if let Some(tm) = self.text_matrix {
                self.text_matrix = Some(translate_matrix(tm, (tx, ty)));
            }
        }
        Ok(())
    }

    /// Emits one glyph event and routes it by font type: ordinary glyphs go
    /// to the device, Type 3 glyphs re-enter the engine through their glyph
    /// procedure.
    fn show_glyph(
        &mut self,
        trm: Matrix,
        font: &Arc<dyn Font>,
        code: u32,
        displacement: Point,
    ) -> Result<()> {
        self.device.show_glyph(trm, font.as_ref(), code, displacement)?;
        match font.as_type3() {
            Some(type3) => self.show_type3_glyph(trm, type3, code, displacement),
            None => self
                .device
                .show_font_glyph(trm, font.as_ref(), code, displacement),
        }
    }

    fn show_type3_glyph(
        &mut self,
        trm: Matrix,
        font: &dyn Type3Font,
        code: u32,
        displacement: Point,
    ) -> Result<()> {
        self.device.show_type3_glyph(trm, font, code, displacement)?;
        if let Some(char_proc) = font.char_proc(code) {
            self.process_type3_stream(&char_proc, trm)?;
        }
        Ok(())
    }

    fn default_font(&mut self) -> Arc<dyn Font> {
        self.default_font
            .get_or_insert_with(|| Arc::new(Helvetica) as Arc<dyn Font>)
            .clone()
    }

    // ========================================================================
    // Marked content
    // ========================================================================

    pub fn begin_marked_content(&mut self, tag: &str, properties: Option<&Dict>) {
        self.device.begin_marked_content(tag, properties);
    }

    pub fn end_marked_content(&mut self) {
        self.device.end_marked_content();
    }

    pub fn marked_content_point(&mut self, tag: &str, properties: Option<&Dict>) {
        self.device.marked_content_point(tag, properties);
    }

    // ========================================================================
    // Path construction and painting
    // ========================================================================

    pub fn move_to(&mut self, x: f64, y: f64) {
        self.current_path.push(PathSegment::MoveTo(x, y));
        self.current_point = Some((x, y));
    }

    pub fn line_to(&mut self, x: f64, y: f64) {
        self.current_path.push(PathSegment::LineTo(x, y));
        self.current_point = Some((x, y));
    }

    #[allow(clippy::many_single_char_names)]
    pub fn curve_to(&mut self, x1: f64, y1: f64, x2: f64, y2: f64, x3: f64, y3: f64) {
        self.current_path
            .push(PathSegment::CurveTo(x1, y1, x2, y2, x3, y3));
        self.current_point = Some((x3, y3));
    }

    pub fn close_path(&mut self) {
        self.current_path.push(PathSegment::Close);
    }

    /// Appends a rectangle subpath; the current point becomes its origin.
    pub fn append_rect(&mut self, x: f64, y: f64, w: f64, h: f64) {
        self.current_path.push(PathSegment::MoveTo(x, y));
        self.current_path.push(PathSegment::LineTo(x + w, y));
        self.current_path.push(PathSegment::LineTo(x + w, y + h));
        self.current_path.push(PathSegment::LineTo(x, y + h));
        self.current_path.push(PathSegment::Close);
        self.current_point = Some((x, y));
    }

    /// Current point of the path under construction, if any.
    pub fn current_point(&self) -> Option<Point> {
        self.current_point
    }

    /// Arms the clip installed by the next path-terminating operator.
    pub fn set_pending_clip(&mut self, rule: WindingRule) {
        self.pending_clip = Some(rule);
    }

    /// Emits a paint event for the accumulated path, then applies any armed
    /// clip and resets the path.
    pub fn paint_current_path(&mut self, stroke: bool, fill: bool, even_odd: bool) -> Result<()> {
        let path = std::mem::take(&mut self.current_path);
        self.current_point = None;
        let state = self.graphics_stack.last().expect(STACK_INVARIANT);
        self.device.paint_path(state, stroke, fill, even_odd, &path)?;
        self.apply_pending_clip(&path);
        Ok(())
    }

    /// Ends the path without painting (the n operator), applying any armed
    /// clip.
    pub fn end_path(&mut self) {
        let path = std::mem::take(&mut self.current_path);
        self.current_point = None;
        self.apply_pending_clip(&path);
    }

    fn apply_pending_clip(&mut self, path: &[PathSegment]) {
        if self.pending_clip.take().is_none() {
            return;
        }
        // the clip is kept as the transformed bounds of the path
        if let Some(bounds) = path_bounds(path) {
            self.clip_to_rect(bounds);
        }
    }

    // ========================================================================
    // Images
    // ========================================================================

    /// Emits a draw event for an image XObject.
    pub fn draw_image(&mut self, name: &str, image: &ImageXObject) -> Result<()> {
        let state = self.graphics_stack.last().expect(STACK_INVARIANT);
        self.device.draw_image(name, image, state)
    }

    fn draw_inline_image(&mut self, dict: Dict, data: Bytes) -> Result<()> {
        let name = format!("inline{}", self.inline_image_count);
        self.inline_image_count += 1;
        let image = ImageXObject::from_inline(dict, data);
        let state = self.graphics_stack.last().expect(STACK_INVARIANT);
        self.device.draw_image(&name, &image, state)
    }

    // ========================================================================
    // Helpers
    // ========================================================================

    /// The page being processed, if any.
    pub fn current_page(&self) -> Option<&'a Page> {
        self.current_page
    }

    /// CTM in effect when the current stream started; pattern cells and
    /// appearance streams re-anchor to this.
    pub fn initial_matrix(&self) -> Matrix {
        self.initial_matrix
    }

    pub fn options(&self) -> &EngineOptions {
        &self.options
    }

    /// Applies the CTM to a point in user space.
    pub fn transformed_point(&self, x: f64, y: f64) -> Point {
        apply_matrix_pt(self.state().ctm, (x, y))
    }

    /// Converts a user-space width to an average device-space width under
    /// the CTM's scale and shear.
    pub fn transform_width(&self, width: f64) -> f64 {
        let (a, b, c, d, _, _) = self.state().ctm;
        let x = a + c;
        let y = b + d;
        width * ((x * x + y * y) * 0.5).sqrt()
    }

    /// Installs a dash pattern, clamping a negative phase to 0.
    pub fn set_line_dash_pattern(&mut self, array: Vec<f64>, phase: f64) {
        let phase = if phase < 0.0 {
            warn!("dash phase has negative value {phase}, set to 0");
            0.0
        } else {
            phase
        };
        self.state_mut().dash = LineDashPattern { array, phase };
    }

    // ========================================================================
    // Recursion guard
    // ========================================================================

    /// Current nesting level of potentially recursive operations.
    pub fn level(&self) -> i32 {
        self.level
    }

    /// Call before entering a potentially recursive operation.
    pub fn increase_level(&mut self) {
        self.level += 1;
    }

    /// Call after a potentially recursive operation, balanced with
    /// `increase_level` even on the error path.
    pub fn decrease_level(&mut self) {
        self.level -= 1;
        if self.level < 0 {
            error!("level is {}", self.level);
        }
    }
}

/// Axis-aligned bounds of a path's anchor and control points, in user space.
fn path_bounds(path: &[PathSegment]) -> Option<Rect> {
    let mut bounds: Option<Rect> = None;
    let mut add = |x: f64, y: f64| {
        bounds = Some(match bounds {
            None => (x, y, x, y),
            Some((x0, y0, x1, y1)) => (x0.min(x), y0.min(y), x1.max(x), y1.max(y)),
        });
    };
    for segment in path {
        match *segment {
            PathSegment::MoveTo(x, y) | PathSegment::LineTo(x, y) => add(x, y),
            PathSegment::CurveTo(x1, y1, x2, y2, x3, y3) => {
                add(x1, y1);
                add(x2, y2);
                add(x3, y3);
            }
            PathSegment::Close => {}
        }
    }
    bounds
}
