//! Windowing-system engine
//!
//! Illustrates the native-backend side of the engine contract without
//! linking any platform library: the engine is generic over a
//! [`WindowSurface`], the handful of operations a windowing system offers a
//! client (solid fills, polygon fills, opaque blits). A real backend
//! implements the trait over its connection; tests use [`TestSurface`].
//!
//! The feature mask is deliberately minimal — no gradients, no alpha, no
//! transforms — so the painter's emulation machinery carries everything the
//! surface cannot do. That asymmetry is the point of this engine: it is the
//! worst-case backend the façade must still render correctly through.

use crate::geometry::{Point, Rect, Size};
use crate::paint::color::Color;
use crate::paint::engine::{EngineCore, EngineFeatures, EngineType, PaintEngine, PolygonMode};
use crate::paint::pixmap::Pixmap;
use crate::paint::state::DirtyFlags;

/// The primitive operations a window system offers
///
/// All coordinates are device pixels; the engine never hands a surface a
/// transformed primitive because it does not advertise transform support.
pub trait WindowSurface {
  /// Surface extent in pixels
  fn size(&self) -> (u32, u32);

  /// Fills a rectangle with an opaque color
  fn fill_rect(&mut self, rect: Rect, color: Color);

  /// Fills a polygon with an opaque color
  fn fill_polygon(&mut self, points: &[Point], color: Color);

  /// Strokes an open polyline with an opaque color
  fn stroke_polyline(&mut self, points: &[Point], color: Color, width: f32);

  /// Copies pixels from `source` within `pixmap` onto `target`
  fn put_pixmap(&mut self, target: Rect, pixmap: &Pixmap, source: Rect);
}

/// Paint engine over a window surface
pub struct WindowEngine<S: WindowSurface> {
  core: EngineCore,
  surface: S,
}

impl<S: WindowSurface> WindowEngine<S> {
  /// Wraps a surface
  pub fn new(surface: S) -> Self {
    Self {
      // Solid fills and opaque blits only; everything else is emulated
      // upstream by the painter.
      core: EngineCore::new(EngineFeatures::empty()),
      surface,
    }
  }

  /// The wrapped surface
  pub fn surface(&self) -> &S {
    &self.surface
  }

  /// Consumes the engine, returning the surface
  pub fn into_surface(self) -> S {
    self.surface
  }

  /// Solid color of the current brush or pen source
  ///
  /// The painter only dispatches primitives this engine can handle, so a
  /// non-solid source here means the primitive is stroke- or fill-less.
  fn brush_color(&self) -> Option<Color> {
    self.core.state.brush.solid_color().filter(|c| !c.is_transparent())
  }

  fn pen_color(&self) -> Option<Color> {
    let pen = &self.core.state.pen;
    if pen.is_none() {
      return None;
    }
    pen.solid_color().filter(|c| !c.is_transparent())
  }
}

impl<S: WindowSurface> PaintEngine for WindowEngine<S> {
  fn core(&self) -> &EngineCore {
    &self.core
  }

  fn core_mut(&mut self) -> &mut EngineCore {
    &mut self.core
  }

  fn engine_type(&self) -> EngineType {
    EngineType::Windowing
  }

  fn device_size(&self) -> Size {
    let (w, h) = self.surface.size();
    Size::new(w as f32, h as f32)
  }

  fn begin(&mut self) -> bool {
    let (w, h) = self.surface.size();
    if self.core.active || w == 0 || h == 0 {
      return false;
    }
    self.core.active = true;
    true
  }

  fn end(&mut self) -> bool {
    self.core.active = false;
    true
  }

  fn update_state(&mut self, flags: DirtyFlags) {
    // No derived native state: pen/brush/clip are read per primitive.
    self.core.dirty.remove(flags);
  }

  fn draw_polygon(&mut self, points: &[Point], mode: PolygonMode) {
    if points.len() < 2 {
      return;
    }
    if mode != PolygonMode::Polyline {
      if let Some(color) = self.brush_color() {
        self.surface.fill_polygon(points, color);
      }
    }
    if let Some(color) = self.pen_color() {
      let width = self.core.state.pen.effective_width();
      if mode == PolygonMode::Polyline {
        self.surface.stroke_polyline(points, color, width);
      } else {
        let mut closed: Vec<Point> = points.to_vec();
        closed.push(points[0]);
        self.surface.stroke_polyline(&closed, color, width);
      }
    }
  }

  fn draw_rects(&mut self, rects: &[Rect]) {
    // Rect fills are the one primitive window systems do well; keep them
    // out of the polygon path.
    let fill = self.brush_color();
    let pen = self.pen_color();
    for rect in rects {
      if rect.is_empty() {
        continue;
      }
      if let Some(color) = fill {
        self.surface.fill_rect(*rect, color);
      }
      if let Some(color) = pen {
        let width = self.core.state.pen.effective_width();
        let outline = [
          Point::new(rect.left(), rect.top()),
          Point::new(rect.right(), rect.top()),
          Point::new(rect.right(), rect.bottom()),
          Point::new(rect.left(), rect.bottom()),
          Point::new(rect.left(), rect.top()),
        ];
        self.surface.stroke_polyline(&outline, color, width);
      }
    }
  }

  fn draw_pixmap(&mut self, target: Rect, pixmap: &Pixmap, source: Rect) {
    if target.is_empty() || pixmap.is_empty() {
      return;
    }
    self.surface.put_pixmap(target, pixmap, source);
  }
}

/// Capturing surface for tests and headless use
///
/// Records every operation and keeps a pixel buffer so assertions can check
/// both the call sequence and the composed output.
#[derive(Debug)]
pub struct TestSurface {
  width: u32,
  height: u32,
  /// Human-readable operation log, in call order
  pub ops: Vec<String>,
  /// Backing pixels, composed with opaque stores
  pub pixels: Pixmap,
}

impl TestSurface {
  pub fn new(width: u32, height: u32) -> Self {
    Self {
      width,
      height,
      ops: Vec::new(),
      pixels: Pixmap::new(width.max(1), height.max(1)).expect("test surface"),
    }
  }
}

impl WindowSurface for TestSurface {
  fn size(&self) -> (u32, u32) {
    (self.width, self.height)
  }

  fn fill_rect(&mut self, rect: Rect, color: Color) {
    self.ops.push(format!("fill_rect {rect} {color}"));
    let mut paint = tiny_skia::Paint::default();
    paint.set_color(color.with_alpha(1.0).to_tiny_skia());
    if let Some(r) = tiny_skia::Rect::from_xywh(rect.x(), rect.y(), rect.width(), rect.height()) {
      self.pixels.as_tiny_skia_mut().fill_rect(
        r,
        &paint,
        tiny_skia::Transform::identity(),
        None,
      );
    }
  }

  fn fill_polygon(&mut self, points: &[Point], color: Color) {
    self.ops.push(format!("fill_polygon {} points {color}", points.len()));
    let path = crate::paint::path::PainterPath::from_polygon(points);
    if let Some(ts_path) = path.to_tiny_skia() {
      let mut paint = tiny_skia::Paint::default();
      paint.set_color(color.with_alpha(1.0).to_tiny_skia());
      self.pixels.as_tiny_skia_mut().fill_path(
        &ts_path,
        &paint,
        tiny_skia::FillRule::Winding,
        tiny_skia::Transform::identity(),
        None,
      );
    }
  }

  fn stroke_polyline(&mut self, points: &[Point], color: Color, width: f32) {
    if points.is_empty() {
      return;
    }
    self
      .ops
      .push(format!("stroke_polyline {} points w={width} {color}", points.len()));
    let mut path = crate::paint::path::PainterPath::new();
    path.move_to(points[0]);
    for p in &points[1..] {
      path.line_to(*p);
    }
    if let Some(ts_path) = path.to_tiny_skia() {
      let mut paint = tiny_skia::Paint::default();
      paint.set_color(color.with_alpha(1.0).to_tiny_skia());
      let stroke = tiny_skia::Stroke {
        width: width.max(1.0),
        ..tiny_skia::Stroke::default()
      };
      self.pixels.as_tiny_skia_mut().stroke_path(
        &ts_path,
        &paint,
        &stroke,
        tiny_skia::Transform::identity(),
        None,
      );
    }
  }

  fn put_pixmap(&mut self, target: Rect, pixmap: &Pixmap, source: Rect) {
    self.ops.push(format!("put_pixmap {target}"));
    let cropped;
    let src = if source == pixmap.rect() {
      pixmap
    } else {
      match pixmap.sub_pixmap(source) {
        Some(c) => {
          cropped = c;
          &cropped
        }
        None => return,
      }
    };
    let sx = target.width() / src.width() as f32;
    let sy = target.height() / src.height() as f32;
    let transform = crate::transform::Transform::from_scale(sx, sy)
      .then(&crate::transform::Transform::from_translate(
        target.left(),
        target.top(),
      ));
    self.pixels.as_tiny_skia_mut().draw_pixmap(
      0,
      0,
      src.as_tiny_skia().as_ref(),
      &tiny_skia::PixmapPaint::default(),
      transform.to_tiny_skia(),
      None,
    );
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::paint::brush::Brush;
  use crate::paint::pen::Pen;

  #[test]
  fn test_window_engine_advertises_nothing() {
    let engine = WindowEngine::new(TestSurface::new(32, 32));
    assert_eq!(engine.core().features(), EngineFeatures::empty());
  }

  #[test]
  fn test_zero_sized_surface_rejects_begin() {
    let mut engine = WindowEngine::new(TestSurface::new(0, 10));
    assert!(!engine.begin());
  }

  #[test]
  fn test_solid_rect_reaches_surface() {
    let mut engine = WindowEngine::new(TestSurface::new(32, 32));
    engine.begin();
    engine.core_mut().state.brush = Brush::solid(Color::RED);
    engine.core_mut().state.pen = Pen::none();
    engine.draw_rects(&[Rect::from_xywh(2.0, 2.0, 8.0, 8.0)]);
    engine.end();
    let surface = engine.into_surface();
    assert_eq!(surface.ops.len(), 1);
    assert!(surface.ops[0].starts_with("fill_rect"));
  }

  #[test]
  fn test_polyline_uses_pen_only() {
    let mut engine = WindowEngine::new(TestSurface::new(32, 32));
    engine.begin();
    engine.core_mut().state.brush = Brush::solid(Color::RED);
    engine.core_mut().state.pen = Pen::new(Color::BLACK, 2.0);
    engine.draw_polygon(
      &[Point::new(0.0, 0.0), Point::new(10.0, 10.0)],
      PolygonMode::Polyline,
    );
    engine.end();
    let surface = engine.into_surface();
    assert_eq!(surface.ops.len(), 1);
    assert!(surface.ops[0].starts_with("stroke_polyline"));
  }
}
