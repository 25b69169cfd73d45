//! Nested-stream driver tests: forms, transparency groups, soft masks,
//! Type 3 glyph procedures, tiling patterns, annotations.

mod common;

use std::sync::Arc;

use common::{
    assert_close, page, page_with, Event, FixedWidthFont, RecordingDevice, StubType3Font, CROP,
};
use orinoco::document::{
    Annotation, AppearanceStream, FormXObject, Page, Resources, TilingPattern, XObject,
};
use orinoco::{
    BlendMode, Color, ColorSpace, EngineOptions, SoftMask, StreamEngine,
};

// ============================================================================
// Form XObjects
// ============================================================================

#[test]
fn test_form_concatenates_matrix_and_clips() {
    let mut device = RecordingDevice::new();
    let form = FormXObject::new("0 0 m 10 10 l S", (0.0, 0.0, 10.0, 10.0))
        .with_matrix((2.0, 0.0, 0.0, 2.0, 0.0, 0.0));
    let resources = Resources::new().with_xobject("Fm1", XObject::Form(Arc::new(form)));
    let page = page_with("q 1 0 0 1 5 5 cm /Fm1 Do Q", resources);
    {
        let mut engine = StreamEngine::new(&mut device);
        engine.process_page(&page).expect("process page");
    }
    let states = device.paint_states();
    assert_eq!(states.len(), 1);
    // form matrix applied before the outer translation
    assert_eq!(states[0].ctm, (2.0, 0.0, 0.0, 2.0, 5.0, 5.0));
    // crop clip + page bbox clip + form bbox clip
    assert_eq!(states[0].clip_paths.len(), 3);
    assert_eq!(
        states[0].clip_paths[2],
        [(5.0, 5.0), (25.0, 5.0), (25.0, 25.0), (5.0, 25.0)]
    );
}

#[test]
fn test_form_state_imbalance_stays_local() {
    // S5: the form saves state and sets a line join without restoring
    let mut device = RecordingDevice::new();
    let form = FormXObject::new("q 2 J", (0.0, 0.0, 100.0, 100.0));
    let resources = Resources::new().with_xobject("Fm1", XObject::Form(Arc::new(form)));
    let page = page_with("1 j /Fm1 Do 0 0 m 1 1 l S", resources);
    {
        let mut engine = StreamEngine::new(&mut device);
        engine.process_page(&page).expect("process page");
        assert_eq!(engine.graphics_stack_size(), 1);
    }
    let states = device.paint_states();
    assert_eq!(states.len(), 1);
    // the outer line join survives; the form ran on a detached stack
    assert_eq!(states[0].line_join, 1);
    assert_eq!(states[0].line_cap, 0);
}

#[test]
fn test_form_without_resources_inherits_callers() {
    let mut device = RecordingDevice::new();
    let form = FormXObject::new("BT /F1 10 Tf (x) Tj ET", (0.0, 0.0, 100.0, 100.0));
    let resources = Resources::new()
        .with_font("F1", FixedWidthFont::arc(0.5))
        .with_xobject("Fm1", XObject::Form(Arc::new(form)));
    let page = page_with("/Fm1 Do", resources);
    {
        let mut engine = StreamEngine::new(&mut device);
        engine.process_page(&page).expect("process page");
    }
    // the font lookup succeeded through the inherited scope
    assert_eq!(device.glyphs().len(), 1);
}

#[test]
fn test_missing_xobject_recovers() {
    let mut device = RecordingDevice::new();
    let page = page("/Ghost Do 0 0 m 1 1 l S");
    {
        let mut engine = StreamEngine::new(&mut device);
        engine.process_page(&page).expect("process page");
    }
    let errors = device.errors();
    assert_eq!(errors.len(), 1);
    assert_eq!(errors[0].0, "Do");
    assert_eq!(device.paint_states().len(), 1);
}

#[test]
fn test_fatal_error_in_form_is_absorbed_under_do() {
    // a malformed TJ inside the form would be fatal at top level, but any
    // error surfacing from Do is tolerated
    let mut device = RecordingDevice::new();
    let form = FormXObject::new("BT [false] TJ ET", (0.0, 0.0, 10.0, 10.0));
    let resources = Resources::new().with_xobject("Fm1", XObject::Form(Arc::new(form)));
    let page = page_with("/Fm1 Do 0 0 m 1 1 l S", resources);
    {
        let mut engine = StreamEngine::new(&mut device);
        engine.process_page(&page).expect("process page");
        assert_eq!(engine.graphics_stack_size(), 1);
    }
    let errors = device.errors();
    // reported twice: once by the inner TJ dispatch, once absorbed at Do
    assert_eq!(errors.len(), 2);
    assert_eq!(errors[0].0, "TJ");
    assert_eq!(errors[1].0, "Do");
    assert_eq!(device.paint_states().len(), 1);
}

#[test]
fn test_fatal_error_in_form_propagates_in_strict_mode() {
    let mut device = RecordingDevice::new();
    let form = FormXObject::new("BT [false] TJ ET", (0.0, 0.0, 10.0, 10.0));
    let resources = Resources::new().with_xobject("Fm1", XObject::Form(Arc::new(form)));
    let page = page_with("/Fm1 Do", resources);
    let mut engine = StreamEngine::with_options(
        &mut device,
        EngineOptions {
            strict: true,
            ..EngineOptions::default()
        },
    );
    assert!(engine.process_page(&page).is_err());
}

#[test]
fn test_recursive_forms_hit_depth_ceiling() {
    // a chain of forms deeper than the ceiling: the innermost stroke is
    // never reached
    let mut form = FormXObject::new("0 0 m 1 1 l S", (0.0, 0.0, 1.0, 1.0));
    for _ in 0..29 {
        let resources =
            Resources::new().with_xobject("F", XObject::Form(Arc::new(form)));
        form = FormXObject::new("/F Do", (0.0, 0.0, 1.0, 1.0))
            .with_resources(Arc::new(resources));
    }
    let resources = Resources::new().with_xobject("F", XObject::Form(Arc::new(form)));
    let page = page_with("/F Do", resources);
    let mut device = RecordingDevice::new();
    {
        let mut engine = StreamEngine::new(&mut device);
        engine.process_page(&page).expect("process page");
        assert_eq!(engine.level(), 0);
    }
    assert!(device.paint_states().is_empty());

    // a shallow chain still paints
    let mut form = FormXObject::new("0 0 m 1 1 l S", (0.0, 0.0, 1.0, 1.0));
    for _ in 0..2 {
        let resources =
            Resources::new().with_xobject("F", XObject::Form(Arc::new(form)));
        form = FormXObject::new("/F Do", (0.0, 0.0, 1.0, 1.0))
            .with_resources(Arc::new(resources));
    }
    let resources = Resources::new().with_xobject("F", XObject::Form(Arc::new(form)));
    let page = page_with("/F Do", resources);
    let mut device = RecordingDevice::new();
    {
        let mut engine = StreamEngine::new(&mut device);
        engine.process_page(&page).expect("process page");
    }
    assert_eq!(device.paint_states().len(), 1);
}

#[test]
fn test_image_xobject_reaches_device() {
    let mut device = RecordingDevice::new();
    let image = orinoco::ImageXObject::new(8, 8, &b"\x00"[..]);
    let resources = Resources::new().with_xobject("Im1", XObject::Image(Arc::new(image)));
    let page = page_with("/Im1 Do", resources);
    {
        let mut engine = StreamEngine::new(&mut device);
        engine.process_page(&page).expect("process page");
    }
    let images: Vec<_> = device
        .events
        .iter()
        .filter_map(|event| match event {
            Event::Image { name, width } => Some((name.clone(), *width)),
            _ => None,
        })
        .collect();
    assert_eq!(images, vec![("Im1".to_string(), 8)]);
}

// ============================================================================
// Transparency groups and soft masks
// ============================================================================

#[test]
fn test_transparency_group_resets_blend_state() {
    let mut device = RecordingDevice::new();
    let group = Arc::new(
        FormXObject::new("0 0 m 1 1 l S", (0.0, 0.0, 100.0, 100.0)).as_transparency_group(),
    );
    let mask_group = Arc::new(FormXObject::new("", (0.0, 0.0, 1.0, 1.0)));
    let page = Page::new(CROP);
    {
        let mut engine = StreamEngine::new(&mut device);
        engine.process_page(&page).expect("init page");
        {
            let state = engine.graphics_state_mut();
            state.blend_mode = BlendMode::Multiply;
            state.stroke_alpha = 0.3;
            state.non_stroke_alpha = 0.4;
            state.soft_mask = Some(SoftMask {
                group: mask_group,
                initial_transformation_matrix: (1.0, 0.0, 0.0, 1.0, 0.0, 0.0),
            });
        }
        engine.show_transparency_group(&group).expect("group");
        // the caller's state is untouched afterwards
        let state = engine.graphics_state();
        assert_eq!(state.blend_mode, BlendMode::Multiply);
        assert_close(state.stroke_alpha, 0.3);
        assert!(state.soft_mask.is_some());
        assert_eq!(engine.graphics_stack_size(), 1);
    }
    let states = device.paint_states();
    assert_eq!(states.len(), 1);
    // inside the group: Normal, both alphas 1.0, no soft mask
    assert_eq!(states[0].blend_mode, BlendMode::Normal);
    assert_close(states[0].stroke_alpha, 1.0);
    assert_close(states[0].non_stroke_alpha, 1.0);
    assert!(states[0].soft_mask.is_none());
}

#[test]
fn test_transparency_group_reset_via_do() {
    let mut device = RecordingDevice::new();
    let group =
        FormXObject::new("0 0 m 1 1 l S", (0.0, 0.0, 100.0, 100.0)).as_transparency_group();
    let mut ext = orinoco::Dict::new();
    ext.insert("CA".to_string(), orinoco::Object::Real(0.5));
    ext.insert("ca".to_string(), orinoco::Object::Real(0.5));
    ext.insert(
        "BM".to_string(),
        orinoco::Object::Name("Screen".to_string()),
    );
    let resources = Resources::new()
        .with_xobject("TG", XObject::Form(Arc::new(group)))
        .with_ext_g_state("GS1", ext);
    let page = page_with("/GS1 gs /TG Do 0 0 m 1 1 l S", resources);
    {
        let mut engine = StreamEngine::new(&mut device);
        engine.process_page(&page).expect("process page");
    }
    let states = device.paint_states();
    assert_eq!(states.len(), 2);
    // inside the group
    assert_eq!(states[0].blend_mode, BlendMode::Normal);
    assert_close(states[0].stroke_alpha, 1.0);
    // outside again
    assert_eq!(states[1].blend_mode, BlendMode::Screen);
    assert_close(states[1].stroke_alpha, 0.5);
}

#[test]
fn test_soft_mask_replaces_ctm() {
    let mut device = RecordingDevice::new();
    let group = Arc::new(
        FormXObject::new("0 0 m 1 1 l S", (0.0, 0.0, 100.0, 100.0)).as_transparency_group(),
    );
    let page = Page::new(CROP);
    {
        let mut engine = StreamEngine::new(&mut device);
        engine.process_page(&page).expect("init page");
        engine.graphics_state_mut().ctm = (9.0, 0.0, 0.0, 9.0, 9.0, 9.0);
        engine.graphics_state_mut().soft_mask = Some(SoftMask {
            group: group.clone(),
            initial_transformation_matrix: (2.0, 0.0, 0.0, 2.0, 5.0, 5.0),
        });
        engine.process_soft_mask(&group).expect("soft mask");
        // the outer save/restore pair leaves the caller's CTM alone
        assert_eq!(engine.graphics_state().ctm, (9.0, 0.0, 0.0, 9.0, 9.0, 9.0));
        assert_eq!(engine.graphics_stack_size(), 1);
    }
    let states = device.paint_states();
    assert_eq!(states.len(), 1);
    // CTM replaced, not concatenated
    assert_eq!(states[0].ctm, (2.0, 0.0, 0.0, 2.0, 5.0, 5.0));
}

// ============================================================================
// Type 3 glyph procedures
// ============================================================================

#[test]
fn test_type3_glyph_runs_char_proc() {
    let mut device = RecordingDevice::new();
    let font_matrix = (0.001, 0.0, 0.0, 0.001, 0.0, 0.0);
    let font = StubType3Font::arc(
        0.5,
        font_matrix,
        &[(u32::from(b'a'), "1 0 0 1 5 5 cm 0 0 m 1 1 l S")],
    );
    let resources = Resources::new().with_font("T3", font);
    let page = page_with("BT /T3 10 Tf (a) Tj ET", resources);
    {
        let mut engine = StreamEngine::new(&mut device);
        engine.process_page(&page).expect("process page");
    }
    let type3: Vec<_> = device
        .events
        .iter()
        .filter(|event| matches!(event, Event::Type3Glyph { .. }))
        .collect();
    assert_eq!(type3.len(), 1);
    let states = device.paint_states();
    assert_eq!(states.len(), 1);
    // CTM = cm . fontMatrix . Trm, with Trm = 10-point scaling
    let ctm = states[0].ctm;
    assert_close(ctm.0, 0.01);
    assert_close(ctm.3, 0.01);
    assert_close(ctm.4, 0.05);
    assert_close(ctm.5, 0.05);
}

#[test]
fn test_type3_text_matrices_do_not_leak() {
    // the glyph stream runs a BT/Tm/ET of its own; the outer advance must
    // be unaffected
    let mut device = RecordingDevice::new();
    let font_matrix = (0.001, 0.0, 0.0, 0.001, 0.0, 0.0);
    let font = StubType3Font::arc(
        0.5,
        font_matrix,
        &[
            (u32::from(b'a'), "BT 1 0 0 1 50 50 Tm ET"),
            (u32::from(b'b'), "BT 1 0 0 1 50 50 Tm ET"),
        ],
    );
    let resources = Resources::new().with_font("T3", font);
    let page = page_with("BT /T3 10 Tf (ab) Tj ET", resources);
    {
        let mut engine = StreamEngine::new(&mut device);
        engine.process_page(&page).expect("process page");
    }
    let glyphs = device.glyphs();
    assert_eq!(glyphs.len(), 2);
    assert_close(glyphs[1].1 .4 - glyphs[0].1 .4, 5.0);
}

// ============================================================================
// Tiling patterns
// ============================================================================

#[test]
fn test_tiling_pattern_envelope() {
    let mut device = RecordingDevice::new();
    let pattern = TilingPattern::new(
        "BT 1 0 0 1 9 9 Tm ET q 0 0 m 1 1 l S",
        (0.0, 0.0, 10.0, 10.0),
    )
    .with_matrix((3.0, 0.0, 0.0, 3.0, 0.0, 0.0))
    .uncolored();
    let page = Page::new(CROP);
    {
        let mut engine = StreamEngine::new(&mut device);
        engine.process_page(&page).expect("init page");
        engine
            .process_tiling_pattern(
                &pattern,
                Some((Color::Rgb(1.0, 0.0, 0.0), ColorSpace::device_rgb())),
            )
            .expect("pattern");
        // the whole envelope unwound: one state, no text matrices, initial
        // matrix back to the page matrix
        assert_eq!(engine.graphics_stack_size(), 1);
        assert!(engine.text_matrix().is_none());
        assert_eq!(engine.initial_matrix(), (1.0, 0.0, 0.0, 1.0, 0.0, 0.0));
    }
    let states = device.paint_states();
    assert_eq!(states.len(), 1);
    // the cell runs under the pattern matrix with seeded colors
    assert_eq!(states[0].ctm, (3.0, 0.0, 0.0, 3.0, 0.0, 0.0));
    assert_eq!(states[0].non_stroking_color, Color::Rgb(1.0, 0.0, 0.0));
    assert_eq!(states[0].stroking_color, Color::Rgb(1.0, 0.0, 0.0));
    assert_eq!(states[0].stroking_color_space, ColorSpace::device_rgb());
}

#[test]
fn test_colored_pattern_keeps_own_colors() {
    let mut device = RecordingDevice::new();
    let pattern = TilingPattern::new("0 0 1 rg 0 0 m 1 1 l f", (0.0, 0.0, 4.0, 4.0));
    let page = Page::new(CROP);
    {
        let mut engine = StreamEngine::new(&mut device);
        engine.process_page(&page).expect("init page");
        engine.process_tiling_pattern(&pattern, None).expect("pattern");
    }
    let states = device.paint_states();
    assert_eq!(states[0].non_stroking_color, Color::Rgb(0.0, 0.0, 1.0));
}

// ============================================================================
// Annotations
// ============================================================================

#[test]
fn test_annotation_appearance_maps_bbox_to_rect() {
    let mut device = RecordingDevice::new();
    let appearance = AppearanceStream::new("0 0 m 10 15 l S", (0.0, 0.0, 10.0, 15.0));
    let annotation = Annotation::new((10.0, 10.0, 30.0, 40.0)).with_appearance(appearance);
    let page = Page::new(CROP);
    {
        let mut engine = StreamEngine::new(&mut device);
        engine.process_page(&page).expect("init page");
        engine.show_annotation(&annotation).expect("annotation");
        assert_eq!(engine.graphics_stack_size(), 1);
        assert_eq!(engine.initial_matrix(), (1.0, 0.0, 0.0, 1.0, 0.0, 0.0));
    }
    let states = device.paint_states();
    assert_eq!(states.len(), 1);
    // bbox 10x15 scaled onto the 20x30 rectangle at (10, 10)
    assert_eq!(states[0].ctm, (2.0, 0.0, 0.0, 2.0, 10.0, 10.0));
}

#[test]
fn test_annotation_zero_area_rect_is_skipped() {
    // S6: a zero-width rectangle produces no execution, only the push/pop
    // envelope
    let mut device = RecordingDevice::new();
    let appearance = AppearanceStream::new("0 0 m 10 15 l S", (0.0, 0.0, 10.0, 15.0));
    let annotation = Annotation::new((10.0, 10.0, 10.0, 40.0)).with_appearance(appearance);
    let page = Page::new(CROP);
    {
        let mut engine = StreamEngine::new(&mut device);
        engine.process_page(&page).expect("init page");
        engine.show_annotation(&annotation).expect("annotation");
        assert_eq!(engine.graphics_stack_size(), 1);
    }
    assert!(device.paint_states().is_empty());
}

#[test]
fn test_annotation_without_appearance_is_skipped() {
    let mut device = RecordingDevice::new();
    let annotation = Annotation::new((0.0, 0.0, 10.0, 10.0));
    let page = Page::new(CROP);
    let mut engine = StreamEngine::new(&mut device);
    engine.process_page(&page).expect("init page");
    engine.show_annotation(&annotation).expect("annotation");
}

// ============================================================================
// Child streams
// ============================================================================

#[test]
fn test_process_child_stream_runs_standalone() {
    let mut device = RecordingDevice::new();
    let form = FormXObject::new("BT /F1 10 Tf (x) Tj ET", (0.0, 0.0, 50.0, 50.0));
    let page = Page::new(CROP)
        .with_resources(Arc::new(Resources::new().with_font("F1", FixedWidthFont::arc(0.5))));
    {
        let mut engine = StreamEngine::new(&mut device);
        engine.process_child_stream(&form, &page).expect("child");
        assert!(engine.current_page().is_none());
    }
    assert_eq!(device.glyphs().len(), 1);
}
