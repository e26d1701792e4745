//! Integration tests for the recording engine
//!
//! Recording happens through the ordinary painter pipeline, so state
//! changes, transforms and clips all land in the command stream; replaying
//! onto a raster target must produce the same pixels as drawing directly.

use easelkit::paint::engines::{PictureEngine, RasterEngine};
use easelkit::{ClipOperation, Color, Painter, Pen, Pixmap, Rect};

fn pixel(pm: &Pixmap, x: u32, y: u32) -> (u8, u8, u8, u8) {
  let px = pm.as_tiny_skia().pixels()[(y * pm.width() + x) as usize];
  (px.red(), px.green(), px.blue(), px.alpha())
}

fn draw_scene(painter: &mut Painter<'_>) {
  painter.fill_rect(Rect::from_xywh(2.0, 2.0, 10.0, 10.0), Color::RED);
  painter.save();
  painter.translate(12.0, 0.0);
  painter.set_pen(Pen::none());
  painter.set_brush(easelkit::Brush::solid(Color::BLUE));
  painter.draw_ellipse(Rect::from_xywh(2.0, 2.0, 8.0, 8.0));
  painter.restore();
  painter.set_clip_rect(Rect::from_xywh(0.0, 16.0, 8.0, 8.0), ClipOperation::Replace);
  painter.fill_rect(Rect::from_xywh(0.0, 0.0, 24.0, 24.0), Color::GREEN);
}

#[test]
fn replay_matches_direct_drawing() {
  // Record.
  let mut recorder = PictureEngine::new();
  {
    let mut painter = Painter::new();
    assert!(painter.begin(&mut recorder));
    draw_scene(&mut painter);
    painter.end();
  }
  let picture = recorder.take_picture();
  assert!(!picture.is_empty());

  // Replay onto raster.
  let mut replayed = Pixmap::new(24, 24).unwrap();
  {
    let mut engine = RasterEngine::new(&mut replayed);
    let mut painter = Painter::new();
    painter.begin(&mut engine);
    picture.play(&mut painter);
    painter.end();
  }

  // Direct reference.
  let mut direct = Pixmap::new(24, 24).unwrap();
  {
    let mut engine = RasterEngine::new(&mut direct);
    let mut painter = Painter::new();
    painter.begin(&mut engine);
    draw_scene(&mut painter);
    painter.end();
  }

  assert_eq!(
    replayed.as_tiny_skia().data(),
    direct.as_tiny_skia().data(),
    "replay must be pixel-identical to direct drawing"
  );
}

#[test]
fn picture_bounds_cover_drawn_content() {
  let mut recorder = PictureEngine::new();
  {
    let mut painter = Painter::new();
    painter.begin(&mut recorder);
    painter.fill_rect(Rect::from_xywh(5.0, 5.0, 20.0, 10.0), Color::RED);
    painter.translate(100.0, 0.0);
    painter.fill_rect(Rect::from_xywh(0.0, 0.0, 10.0, 10.0), Color::BLUE);
    painter.end();
  }
  let bounds = recorder.picture().bounding_rect();
  assert!(bounds.left() <= 5.0);
  assert!(bounds.right() >= 110.0, "transformed draw extends bounds: {bounds}");
}

#[test]
fn replaying_empty_picture_is_a_noop() {
  let picture = easelkit::paint::engines::Picture::default();
  let mut pm = Pixmap::new(8, 8).unwrap();
  {
    let mut engine = RasterEngine::new(&mut pm);
    let mut painter = Painter::new();
    painter.begin(&mut engine);
    picture.play(&mut painter);
    painter.end();
  }
  assert!(pm.as_tiny_skia().pixels().iter().all(|p| p.alpha() == 0));
}

#[test]
fn replay_onto_inactive_painter_does_not_crash() {
  let mut recorder = PictureEngine::new();
  {
    let mut painter = Painter::new();
    painter.begin(&mut recorder);
    painter.fill_rect(Rect::from_xywh(0.0, 0.0, 4.0, 4.0), Color::RED);
    painter.end();
  }
  let picture = recorder.take_picture();
  let mut inactive = Painter::new();
  picture.play(&mut inactive); // warned no-ops only
  assert!(!inactive.is_active());
}
