//! Integration tests for the painter's state stack and lifecycle
//!
//! Covers save/restore balance, the inactive-painter contract (warned
//! no-ops, shared dummy state instead of crashes), clip restore replay,
//! and the window/viewport mapping.

use easelkit::paint::engines::{RasterEngine, TestSurface, WindowEngine};
use easelkit::{
  ClipOperation, Color, Painter, Pen, Pixmap, Point, Rect, RenderHints, Transform,
};

fn pixel(pm: &Pixmap, x: u32, y: u32) -> (u8, u8, u8, u8) {
  let px = pm.as_tiny_skia().pixels()[(y * pm.width() + x) as usize];
  (px.red(), px.green(), px.blue(), px.alpha())
}

// ============================================================================
// Save / restore
// ============================================================================

#[test]
fn save_restore_restores_pen() {
  let mut pm = Pixmap::new(8, 8).unwrap();
  let mut engine = RasterEngine::new(&mut pm);
  let mut painter = Painter::new();
  assert!(painter.begin(&mut engine));

  painter.save();
  painter.set_pen(Pen::new(Color::RED, 1.0));
  painter.save();
  painter.set_pen(Pen::new(Color::BLUE, 1.0));
  painter.restore();

  assert_eq!(painter.pen().solid_color(), Some(Color::RED));
  painter.restore();
  painter.end();
}

#[test]
fn balanced_save_restore_round_trips_all_state() {
  let mut pm = Pixmap::new(8, 8).unwrap();
  let mut engine = RasterEngine::new(&mut pm);
  let mut painter = Painter::new();
  painter.begin(&mut engine);

  painter.set_pen(Pen::new(Color::GREEN, 3.0));
  painter.set_opacity(0.25);
  painter.translate(5.0, 7.0);
  let pen_before = painter.pen().clone();
  let opacity_before = painter.opacity();
  let transform_before = painter.transform();

  for _ in 0..3 {
    painter.save();
    painter.set_pen(Pen::new(Color::BLUE, 9.0));
    painter.rotate(45.0);
    painter.set_opacity(1.0);
    painter.set_clip_rect(Rect::from_xywh(0.0, 0.0, 4.0, 4.0), ClipOperation::Replace);
  }
  for _ in 0..3 {
    painter.restore();
  }

  assert_eq!(painter.pen(), &pen_before);
  assert_eq!(painter.opacity(), opacity_before);
  assert_eq!(painter.transform(), transform_before);
  assert!(!painter.has_clip());
  painter.end();
}

#[test]
fn unbalanced_restore_is_ignored() {
  let mut pm = Pixmap::new(8, 8).unwrap();
  let mut engine = RasterEngine::new(&mut pm);
  let mut painter = Painter::new();
  painter.begin(&mut engine);

  painter.set_pen(Pen::new(Color::RED, 1.0));
  painter.restore(); // nothing saved: contract violation, must not crash
  assert_eq!(painter.pen().solid_color(), Some(Color::RED));
  assert!(painter.is_active());
  painter.end();
}

#[test]
fn restore_replays_clip_history() {
  let mut pm = Pixmap::new(20, 20).unwrap();
  {
    let mut engine = RasterEngine::new(&mut pm);
    let mut painter = Painter::new();
    painter.begin(&mut engine);

    painter.set_clip_rect(Rect::from_xywh(0.0, 0.0, 10.0, 20.0), ClipOperation::Replace);
    painter.save();
    painter.set_clip_rect(Rect::from_xywh(0.0, 0.0, 20.0, 5.0), ClipOperation::Intersect);
    painter.restore();

    // Only the outer clip should now be in effect: x < 10, any y.
    painter.fill_rect(Rect::from_xywh(0.0, 0.0, 20.0, 20.0), Color::RED);
    painter.end();
  }

  assert_eq!(pixel(&pm, 5, 15).3, 255, "inside the restored clip");
  assert_eq!(pixel(&pm, 15, 15).3, 0, "outside the restored clip");
}

#[test]
fn redirection_frames_are_isolated() {
  let mut pm = Pixmap::new(8, 8).unwrap();
  let mut engine = RasterEngine::new(&mut pm);
  let mut painter = Painter::new();
  painter.begin(&mut engine);

  painter.set_pen(Pen::new(Color::RED, 1.0));
  painter.push_frame();

  // The frame starts from a default state and cannot restore past itself.
  assert_ne!(painter.pen().solid_color(), Some(Color::RED));
  painter.restore();
  assert!(painter.is_active());

  painter.pop_frame();
  assert_eq!(painter.pen().solid_color(), Some(Color::RED));
  painter.end();
}

// ============================================================================
// Inactive painter contract
// ============================================================================

#[test]
fn inactive_painter_getters_use_dummy_state() {
  let painter = Painter::new();
  assert!(!painter.is_active());
  assert_eq!(painter.opacity(), 1.0);
  assert_eq!(painter.pen().solid_color(), Some(Color::BLACK));
  assert!(painter.transform().is_identity());
  assert!(painter.render_hints().contains(RenderHints::ANTIALIASING));
}

#[test]
fn inactive_painter_calls_are_noops() {
  let mut painter = Painter::new();
  painter.set_pen(Pen::new(Color::RED, 2.0));
  painter.draw_rect(Rect::from_xywh(0.0, 0.0, 10.0, 10.0));
  painter.save();
  painter.restore();
  assert!(!painter.end());
  assert_eq!(painter.pen().solid_color(), Some(Color::BLACK));
}

#[test]
fn failed_begin_leaves_painter_inert() {
  let mut engine = WindowEngine::new(TestSurface::new(0, 0));
  let mut painter = Painter::new();
  assert!(!painter.begin(&mut engine));
  assert!(!painter.is_active());
  // Ignoring the failed begin must not crash later calls.
  painter.draw_rect(Rect::from_xywh(0.0, 0.0, 4.0, 4.0));
  assert_eq!(painter.pen().solid_color(), Some(Color::BLACK));
}

#[test]
fn double_begin_is_rejected() {
  let mut pm_a = Pixmap::new(4, 4).unwrap();
  let mut pm_b = Pixmap::new(4, 4).unwrap();
  let mut engine_a = RasterEngine::new(&mut pm_a);
  let mut engine_b = RasterEngine::new(&mut pm_b);
  let mut painter = Painter::new();
  assert!(painter.begin(&mut engine_a));
  assert!(!painter.begin(&mut engine_b));
  assert!(painter.end());
}

// ============================================================================
// Transforms and window/viewport mapping
// ============================================================================

#[test]
fn transform_ops_compose_in_logical_order() {
  let mut pm = Pixmap::new(4, 4).unwrap();
  let mut engine = RasterEngine::new(&mut pm);
  let mut painter = Painter::new();
  painter.begin(&mut engine);

  painter.translate(10.0, 0.0);
  painter.scale(2.0, 2.0);
  // Point (1, 1) is first scaled, then translated.
  let mapped = painter.combined_transform().map_point(Point::new(1.0, 1.0));
  assert_eq!(mapped, Point::new(12.0, 2.0));
  painter.end();
}

#[test]
fn window_viewport_mapping_scales_drawing() {
  let mut pm = Pixmap::new(100, 100).unwrap();
  {
    let mut engine = RasterEngine::new(&mut pm);
    let mut painter = Painter::new();
    painter.begin(&mut engine);

    // Logical window 0..10 maps onto the whole 100-pixel device.
    painter.set_window(Rect::from_xywh(0.0, 0.0, 10.0, 10.0));
    painter.fill_rect(Rect::from_xywh(0.0, 0.0, 5.0, 5.0), Color::BLUE);
    painter.end();
  }
  assert_eq!(pixel(&pm, 25, 25).3, 255, "logical 5x5 covers device 50x50");
  assert_eq!(pixel(&pm, 75, 75).3, 0);
}

#[test]
fn set_transform_replaces_world_transform() {
  let mut pm = Pixmap::new(4, 4).unwrap();
  let mut engine = RasterEngine::new(&mut pm);
  let mut painter = Painter::new();
  painter.begin(&mut engine);
  painter.set_transform(Transform::from_translate(3.0, 4.0));
  assert_eq!(painter.transform(), Transform::from_translate(3.0, 4.0));
  painter.reset_transform();
  assert!(painter.transform().is_identity());
  painter.end();
}
