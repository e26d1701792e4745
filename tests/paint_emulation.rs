//! Integration tests for capability arbitration and emulation
//!
//! A `WindowEngine` over a capturing surface advertises no features at
//! all, so every gradient, translucent or transformed draw must route
//! through the offscreen emulation path and arrive at the surface as a
//! composited image blit. A `RasterEngine` renders the same primitives
//! directly; within antialiasing tolerance the two must agree.

use easelkit::paint::brush::{GradientStop, LinearGradient, RadialGradient};
use easelkit::paint::engines::{RasterEngine, TestSurface, WindowEngine};
use easelkit::paint::GradientSpread;
use easelkit::{
  Brush, Color, EngineFeatures, PaintEngine, Painter, Pen, Pixmap, Point, Rect,
};

fn pixel(pm: &Pixmap, x: u32, y: u32) -> (u8, u8, u8, u8) {
  let px = pm.as_tiny_skia().pixels()[(y * pm.width() + x) as usize];
  (px.red(), px.green(), px.blue(), px.alpha())
}

fn channels_close(a: (u8, u8, u8, u8), b: (u8, u8, u8, u8), tolerance: u8) -> bool {
  (a.0 as i16 - b.0 as i16).unsigned_abs() <= tolerance as u16
    && (a.1 as i16 - b.1 as i16).unsigned_abs() <= tolerance as u16
    && (a.2 as i16 - b.2 as i16).unsigned_abs() <= tolerance as u16
    && (a.3 as i16 - b.3 as i16).unsigned_abs() <= tolerance as u16
}

fn linear_brush() -> Brush {
  Brush::linear_gradient(LinearGradient {
    start: Point::new(0.0, 0.0),
    end: Point::new(40.0, 0.0),
    stops: vec![
      GradientStop::new(0.0, Color::RED),
      GradientStop::new(1.0, Color::BLUE),
    ],
    spread: GradientSpread::Pad,
  })
}

// ============================================================================
// Emulation through the featureless window engine
// ============================================================================

#[test]
fn gradient_fill_is_emulated_on_featureless_engine() {
  let mut engine = WindowEngine::new(TestSurface::new(40, 40));
  let mut painter = Painter::new();
  assert!(painter.begin(&mut engine));
  painter.set_pen(Pen::none());
  painter.set_brush(linear_brush());
  painter.draw_rect(Rect::from_xywh(0.0, 0.0, 40.0, 40.0));
  painter.end();

  let surface = engine.into_surface();
  assert!(
    surface.ops.iter().any(|op| op.starts_with("put_pixmap")),
    "gradient must arrive as a composited image: {:?}",
    surface.ops
  );

  // Left edge red-ish, right edge blue-ish.
  let left = pixel(&surface.pixels, 2, 20);
  let right = pixel(&surface.pixels, 38, 20);
  assert!(left.0 > 200 && left.2 < 60, "left is red: {left:?}");
  assert!(right.2 > 200 && right.0 < 60, "right is blue: {right:?}");
}

#[test]
fn emulated_gradient_matches_direct_render() {
  // Direct render on the fully capable engine.
  let mut direct = Pixmap::new(40, 40).unwrap();
  {
    let mut engine = RasterEngine::new(&mut direct);
    let mut painter = Painter::new();
    painter.begin(&mut engine);
    painter.set_pen(Pen::none());
    painter.set_brush(linear_brush());
    painter.draw_rect(Rect::from_xywh(0.0, 0.0, 40.0, 40.0));
    painter.end();
  }

  // Emulated render through the featureless engine.
  let mut engine = WindowEngine::new(TestSurface::new(40, 40));
  let mut painter = Painter::new();
  painter.begin(&mut engine);
  painter.set_pen(Pen::none());
  painter.set_brush(linear_brush());
  painter.draw_rect(Rect::from_xywh(0.0, 0.0, 40.0, 40.0));
  painter.end();
  let emulated = engine.into_surface().pixels;

  for (x, y) in [(5u32, 5u32), (20, 20), (35, 35), (10, 30)] {
    let a = pixel(&direct, x, y);
    let b = pixel(&emulated, x, y);
    assert!(
      channels_close(a, b, 8),
      "pixel ({x},{y}) differs: direct {a:?} vs emulated {b:?}"
    );
  }
}

#[test]
fn extended_radial_gradient_always_emulates() {
  // Focal point outside the circle: even a gradient-capable engine may not
  // render this natively, so it must work on the raster engine through the
  // painter (exercising the always-emulate rule end to end).
  let brush = Brush::radial_gradient(RadialGradient {
    center: Point::new(20.0, 20.0),
    radius: 5.0,
    focal: Point::new(35.0, 20.0),
    stops: vec![
      GradientStop::new(0.0, Color::GREEN),
      GradientStop::new(1.0, Color::RED),
    ],
    spread: GradientSpread::Pad,
  });

  let mut pm = Pixmap::new(40, 40).unwrap();
  {
    let mut engine = RasterEngine::new(&mut pm);
    let mut painter = Painter::new();
    painter.begin(&mut engine);
    painter.set_pen(Pen::none());
    painter.set_brush(brush);
    painter.draw_rect(Rect::from_xywh(0.0, 0.0, 40.0, 40.0));
    painter.end();
  }
  // The gradient cone opens away from the focal point; some pixels must be
  // painted.
  let painted = pm
    .as_tiny_skia()
    .pixels()
    .iter()
    .filter(|p| p.alpha() > 0)
    .count();
  assert!(painted > 100, "extended radial painted {painted} pixels");
}

#[test]
fn opacity_fallback_matches_premultiplied_alpha() {
  // Spec scenario: opacity 0.5 on an engine without ConstantOpacity must
  // blend like drawing with the brush alpha pre-scaled by 0.5.
  let mut engine = WindowEngine::new(TestSurface::new(20, 20));
  let mut painter = Painter::new();
  painter.begin(&mut engine);
  painter.set_pen(Pen::none());
  painter.set_brush(Brush::solid(Color::RED));
  painter.set_opacity(0.5);
  painter.draw_rect(Rect::from_xywh(0.0, 0.0, 20.0, 20.0));
  painter.end();
  let emulated = engine.into_surface().pixels;

  let mut reference = Pixmap::new(20, 20).unwrap();
  {
    let mut engine = RasterEngine::new(&mut reference);
    let mut painter = Painter::new();
    painter.begin(&mut engine);
    painter.set_pen(Pen::none());
    painter.set_brush(Brush::solid(Color::RED.with_alpha(0.5)));
    painter.draw_rect(Rect::from_xywh(0.0, 0.0, 20.0, 20.0));
    painter.end();
  }

  let a = pixel(&emulated, 10, 10);
  let b = pixel(&reference, 10, 10);
  assert!(
    channels_close(a, b, 4),
    "opacity blend differs: emulated {a:?} vs premultiplied {b:?}"
  );
}

#[test]
fn emulated_image_respects_clip_bounds() {
  use easelkit::ClipOperation;

  let mut engine = WindowEngine::new(TestSurface::new(40, 40));
  let mut painter = Painter::new();
  painter.begin(&mut engine);
  painter.set_clip_rect(Rect::from_xywh(0.0, 0.0, 10.0, 40.0), ClipOperation::Replace);
  painter.set_pen(Pen::none());
  painter.set_brush(linear_brush());
  painter.draw_rect(Rect::from_xywh(0.0, 0.0, 40.0, 40.0));
  painter.end();

  // The offscreen image is clipped to the clip bounds before compositing.
  let surface = engine.into_surface();
  let blit = surface
    .ops
    .iter()
    .find(|op| op.starts_with("put_pixmap"))
    .expect("emulated blit");
  assert!(
    blit.contains("[0 0 10 40]"),
    "blit clipped to the clip bounds: {blit}"
  );
}

// ============================================================================
// Direct paths on the capable engine
// ============================================================================

#[test]
fn capable_engine_never_needs_image_fallback() {
  let mut pm = Pixmap::new(20, 20).unwrap();
  let mut engine = RasterEngine::new(&mut pm);
  assert_eq!(engine.core().features(), EngineFeatures::ALL_FEATURES);
  let mut painter = Painter::new();
  painter.begin(&mut engine);
  painter.set_brush(linear_brush());
  painter.set_opacity(0.7);
  painter.rotate(30.0);
  painter.draw_rect(Rect::from_xywh(2.0, 2.0, 10.0, 10.0));
  painter.end();
  // Nothing to assert beyond "renders without panicking and paints":
  let painted = pm
    .as_tiny_skia()
    .pixels()
    .iter()
    .any(|p| p.alpha() > 0);
  assert!(painted);
}

#[test]
fn cosmetic_pen_stays_one_device_pixel_through_painter() {
  let mut pm = Pixmap::new(60, 60).unwrap();
  {
    let mut engine = RasterEngine::new(&mut pm);
    let mut painter = Painter::new();
    painter.begin(&mut engine);
    painter.set_render_hint(easelkit::RenderHints::ANTIALIASING, false);
    painter.scale(12.0, 12.0);
    painter.set_pen(Pen::new(Color::BLACK, 0.0));
    painter.draw_line(easelkit::Line::new(Point::new(0.0, 2.0), Point::new(5.0, 2.0)));
    painter.end();
  }
  // Logical y=2 lands at device y=24; count covered rows in that column.
  let covered: Vec<u32> = (0..60)
    .filter(|&y| pixel(&pm, 30, y).3 > 0)
    .collect();
  assert!(
    !covered.is_empty() && covered.len() <= 2,
    "cosmetic stroke covers {covered:?}"
  );
}

#[test]
fn tiled_pixmap_repeats_from_offset() {
  let mut tile = Pixmap::new(4, 4).unwrap();
  tile.fill(Color::GREEN);

  let mut pm = Pixmap::new(16, 16).unwrap();
  {
    let mut engine = RasterEngine::new(&mut pm);
    let mut painter = Painter::new();
    painter.begin(&mut engine);
    painter.draw_tiled_pixmap(Rect::from_xywh(0.0, 0.0, 16.0, 16.0), &tile, Point::ZERO);
    painter.end();
  }
  // Every pixel in the target is covered by some stamp.
  assert!(pm.as_tiny_skia().pixels().iter().all(|p| p.green() == 255));
}

#[test]
fn degenerate_geometry_draws_nothing() {
  let mut pm = Pixmap::new(8, 8).unwrap();
  {
    let mut engine = RasterEngine::new(&mut pm);
    let mut painter = Painter::new();
    painter.begin(&mut engine);
    painter.draw_rect(Rect::ZERO);
    painter.draw_ellipse(Rect::from_xywh(1.0, 1.0, 0.0, 5.0));
    painter.draw_points(&[]);
    painter.draw_path(&easelkit::PainterPath::new());
    painter.end();
  }
  assert!(pm.as_tiny_skia().pixels().iter().all(|p| p.alpha() == 0));
}
