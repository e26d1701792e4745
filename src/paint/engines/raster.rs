//! Software raster engine backed by tiny-skia
//!
//! The fully capable engine: every feature bit is advertised and honored,
//! which makes it the target of the painter's offscreen emulation path —
//! a nested painter on a `RasterEngine` never needs further emulation.
//!
//! Most state maps straight onto tiny-skia. Two gradient flavors do not:
//! tiny-skia has no sweep shader and rejects radial gradients whose focal
//! point falls outside the circle, so conical and extended-radial fills are
//! synthesized per pixel into a texture and painted as a pattern.
//!
//! Clipping composes coverage in an offscreen alpha pixmap (destination-in
//! for intersect, source-over for unite) and converts it to a mask — the
//! same mask-based clipping the rest of the stack uses.

use crate::geometry::{Point, Rect, Size};
use crate::paint::brush::{
  Brush, BrushStyle, ConicalGradient, CoordinateMode, GradientSpread, GradientStop, HatchPattern,
  RadialGradient,
};
use crate::paint::color::Color;
use crate::paint::engine::{EngineCore, EngineFeatures, EngineType, PaintEngine, PolygonMode};
use crate::paint::path::{pen_to_stroke, FillRule, PainterPath};
use crate::paint::pixmap::Pixmap;
use crate::paint::state::{ClipOperation, ClipShape, DirtyFlags, RenderHints};
use crate::transform::Transform;

/// Fully capable software engine rendering into a [`Pixmap`]
pub struct RasterEngine<'a> {
  core: EngineCore,
  target: &'a mut Pixmap,
  /// Coverage mask rebuilt whenever a clip bit is dirty
  clip_mask: Option<tiny_skia::Mask>,
}

impl<'a> RasterEngine<'a> {
  /// Creates an engine bound to the target pixmap
  pub fn new(target: &'a mut Pixmap) -> Self {
    Self {
      core: EngineCore::new(EngineFeatures::ALL_FEATURES),
      target,
      clip_mask: None,
    }
  }

  fn device_rect(&self) -> Rect {
    self.target.rect()
  }

  /// Rebuilds the clip mask from the recorded clip history
  ///
  /// Replays every entry in chronological order with its captured
  /// transform; operations are not commutative so the order is load-bearing.
  fn rebuild_clip(&mut self) {
    let state = &self.core.state;
    if !state.has_clip() {
      self.clip_mask = None;
      return;
    }
    let w = self.target.width();
    let h = self.target.height();
    let Ok(mut coverage) = Pixmap::new(w, h) else {
      self.clip_mask = None;
      return;
    };

    let mut seeded = false;
    for entry in &state.clip_stack {
      match entry.op {
        ClipOperation::NoClip => {
          coverage.fill(Color::TRANSPARENT);
          seeded = false;
        }
        ClipOperation::Replace => {
          coverage.fill(Color::TRANSPARENT);
          Self::render_clip_shape(&mut coverage, entry, tiny_skia::BlendMode::SourceOver);
          seeded = true;
        }
        ClipOperation::Intersect => {
          if seeded {
            Self::render_clip_shape(&mut coverage, entry, tiny_skia::BlendMode::DestinationIn);
          } else {
            // Intersecting an unbounded clip just bounds it.
            Self::render_clip_shape(&mut coverage, entry, tiny_skia::BlendMode::SourceOver);
            seeded = true;
          }
        }
        ClipOperation::Unite => {
          Self::render_clip_shape(&mut coverage, entry, tiny_skia::BlendMode::SourceOver);
          seeded = true;
        }
      }
    }

    if !seeded {
      self.clip_mask = None;
      return;
    }
    self.clip_mask = Some(tiny_skia::Mask::from_pixmap(
      coverage.as_tiny_skia().as_ref(),
      tiny_skia::MaskType::Alpha,
    ));
  }

  fn render_clip_shape(
    coverage: &mut Pixmap,
    entry: &crate::paint::state::ClipEntry,
    blend: tiny_skia::BlendMode,
  ) {
    let path = match &entry.shape {
      ClipShape::Rect(r) => PainterPath::from_rect(*r),
      ClipShape::Path(p) => p.clone(),
    };
    let device_path = path.transformed(&entry.transform);
    let Some(ts_path) = device_path.to_tiny_skia() else {
      return;
    };
    let mut paint = tiny_skia::Paint::default();
    paint.set_color_rgba8(255, 255, 255, 255);
    paint.anti_alias = true;
    paint.blend_mode = blend;
    coverage.as_tiny_skia_mut().fill_path(
      &ts_path,
      &paint,
      device_path.fill_rule().to_tiny_skia(),
      tiny_skia::Transform::identity(),
      None,
    );
  }

  fn anti_alias(&self) -> bool {
    self
      .core
      .state
      .render_hints
      .contains(RenderHints::ANTIALIASING)
  }

  fn filter_quality(&self) -> tiny_skia::FilterQuality {
    if self
      .core
      .state
      .render_hints
      .contains(RenderHints::SMOOTH_PIXMAP_TRANSFORM)
    {
      tiny_skia::FilterQuality::Bilinear
    } else {
      tiny_skia::FilterQuality::Nearest
    }
  }

  /// The transform applied to brush contents for the active coordinate mode
  fn brush_space(&self, brush: &Brush, shape_bounds: Rect) -> Transform {
    let base = match brush.coordinate_mode {
      CoordinateMode::Logical => Transform::identity(),
      CoordinateMode::ObjectBounding => Transform::from_scale(
        shape_bounds.width().max(1e-6),
        shape_bounds.height().max(1e-6),
      )
      .then(&Transform::from_translate(
        shape_bounds.left(),
        shape_bounds.top(),
      )),
      CoordinateMode::StretchToDevice => {
        let d = self.device_rect();
        Transform::from_scale(d.width().max(1.0), d.height().max(1.0))
      }
    };
    match &brush.transform {
      Some(t) => t.then(&base),
      None => base,
    }
  }

  /// Fills a device-space path with the given brush
  ///
  /// `shape_bounds` is the logical bounding rect of the filled shape,
  /// needed for object-bounding brush coordinates. The path must already be
  /// in device space when `ts_transform` is identity, or in logical space
  /// with `ts_transform` carrying the full mapping.
  fn fill_path_with_brush(
    &mut self,
    ts_path: &tiny_skia::Path,
    fill_rule: FillRule,
    brush: &Brush,
    shape_bounds: Rect,
    ts_transform: tiny_skia::Transform,
  ) {
    let state_opacity = self.core.state.opacity;
    let blend = self.core.state.composition_mode.to_tiny_skia();
    let anti_alias = self.anti_alias();
    let quality = self.filter_quality();
    let brush_space = self.brush_space(brush, shape_bounds);
    let brush_origin = self.core.state.brush_origin;

    let mut paint = tiny_skia::Paint::default();
    paint.anti_alias = anti_alias;
    paint.blend_mode = blend;

    // Pattern sources must outlive the paint borrow.
    let scratch: Option<tiny_skia::Pixmap>;

    match &brush.style {
      BrushStyle::NoBrush => return,
      BrushStyle::Solid(color) => {
        let c = color.mul_alpha(state_opacity);
        paint.set_color(c.to_tiny_skia());
      }
      BrushStyle::LinearGradient(g) => {
        let stops = scaled_stops(&g.stops, state_opacity);
        let shader = tiny_skia::LinearGradient::new(
          tiny_skia::Point::from_xy(g.start.x, g.start.y),
          tiny_skia::Point::from_xy(g.end.x, g.end.y),
          stops,
          spread_mode(g.spread),
          brush_space.to_tiny_skia(),
        );
        match shader {
          Some(shader) => paint.shader = shader,
          None => return,
        }
      }
      BrushStyle::RadialGradient(g) if !g.is_extended() => {
        let stops = scaled_stops(&g.stops, state_opacity);
        let shader = tiny_skia::RadialGradient::new(
          tiny_skia::Point::from_xy(g.focal.x, g.focal.y),
          tiny_skia::Point::from_xy(g.center.x, g.center.y),
          g.radius,
          stops,
          spread_mode(g.spread),
          brush_space.to_tiny_skia(),
        );
        match shader {
          Some(shader) => paint.shader = shader,
          None => return,
        }
      }
      BrushStyle::RadialGradient(g) => {
        // Extended radial: no shader for it, synthesize per pixel.
        let bounds = shape_bounds.round_out();
        let Some(texture) = synth_extended_radial(g, bounds, state_opacity) else {
          return;
        };
        scratch = Some(texture.into_tiny_skia());
        paint.shader = tiny_skia::Pattern::new(
          scratch.as_ref().unwrap().as_ref(),
          tiny_skia::SpreadMode::Pad,
          quality,
          1.0,
          Transform::from_translate(bounds.left(), bounds.top()).to_tiny_skia(),
        );
      }
      BrushStyle::ConicalGradient(g) => {
        let bounds = shape_bounds.round_out();
        let Some(texture) = synth_conical(g, bounds, state_opacity) else {
          return;
        };
        scratch = Some(texture.into_tiny_skia());
        paint.shader = tiny_skia::Pattern::new(
          scratch.as_ref().unwrap().as_ref(),
          tiny_skia::SpreadMode::Pad,
          quality,
          1.0,
          Transform::from_translate(bounds.left(), bounds.top()).to_tiny_skia(),
        );
      }
      BrushStyle::Texture(pixmap) => {
        scratch = Some(pixmap.as_tiny_skia().clone());
        let pattern_transform = Transform::from_translate(brush_origin.x, brush_origin.y)
          .then(&brush_space);
        paint.shader = tiny_skia::Pattern::new(
          scratch.as_ref().unwrap().as_ref(),
          tiny_skia::SpreadMode::Repeat,
          quality,
          state_opacity,
          pattern_transform.to_tiny_skia(),
        );
      }
      BrushStyle::Hatch(pattern, color) => {
        scratch = Some(hatch_tile(*pattern, color.mul_alpha(state_opacity)).into_tiny_skia());
        let pattern_transform = Transform::from_translate(brush_origin.x, brush_origin.y)
          .then(&brush_space);
        paint.shader = tiny_skia::Pattern::new(
          scratch.as_ref().unwrap().as_ref(),
          tiny_skia::SpreadMode::Repeat,
          quality,
          1.0,
          pattern_transform.to_tiny_skia(),
        );
      }
    }

    self.target.as_tiny_skia_mut().fill_path(
      ts_path,
      &paint,
      fill_rule.to_tiny_skia(),
      ts_transform,
      self.clip_mask.as_ref(),
    );
  }

  /// Fills and strokes a logical-space path under the current state
  fn render_path(&mut self, path: &PainterPath) {
    let state = &self.core.state;
    let transform = state.combined_transform();
    let brush = state.brush.clone();
    let pen = state.pen.clone();
    let shape_bounds = path.bounding_rect();

    // Affine transforms ride on tiny-skia so gradients/strokes scale
    // exactly; perspective pre-transforms the geometry (flattened) and maps
    // brushes through the affine part only.
    let (render_path, ts_transform) = if transform.is_affine() {
      (path.clone(), transform.to_tiny_skia())
    } else {
      (path.transformed(&transform), tiny_skia::Transform::identity())
    };

    if !brush.is_none() {
      if let Some(ts_path) = render_path.to_tiny_skia() {
        self.fill_path_with_brush(
          &ts_path,
          render_path.fill_rule(),
          &brush,
          shape_bounds,
          ts_transform,
        );
      }
    }

    if !pen.is_none() {
      let opacity = self.core.state.opacity;
      let blend = self.core.state.composition_mode.to_tiny_skia();
      let anti_alias = self.anti_alias();

      // Cosmetic pens stroke in device space at one pixel.
      let (stroke_path, stroke_transform, stroke_width) = if pen.is_cosmetic() {
        let device = if transform.is_affine() && !transform.is_identity() {
          render_path.transformed(&transform)
        } else {
          render_path.clone()
        };
        (device, tiny_skia::Transform::identity(), 1.0)
      } else {
        (render_path.clone(), ts_transform, pen.width)
      };

      if let Some(ts_path) = stroke_path.to_tiny_skia() {
        let mut stroke_pen = pen.clone();
        stroke_pen.width = stroke_width;
        let stroke = pen_to_stroke(&stroke_pen);

        match stroke_pen.solid_color() {
          Some(color) => {
            let mut paint = tiny_skia::Paint::default();
            paint.anti_alias = anti_alias;
            paint.blend_mode = blend;
            paint.set_color(color.mul_alpha(opacity).to_tiny_skia());
            self.target.as_tiny_skia_mut().stroke_path(
              &ts_path,
              &paint,
              &stroke,
              stroke_transform,
              self.clip_mask.as_ref(),
            );
          }
          None => {
            // Gradient/pattern stroke: convert to fill geometry.
            let outline = stroke_path.stroked(&stroke_pen, 1.0);
            if let Some(ts_outline) = outline.to_tiny_skia() {
              self.fill_path_with_brush(
                &ts_outline,
                FillRule::Winding,
                &stroke_pen.brush,
                shape_bounds,
                stroke_transform,
              );
            }
          }
        }
      }
    }
  }
}

impl PaintEngine for RasterEngine<'_> {
  fn core(&self) -> &EngineCore {
    &self.core
  }

  fn core_mut(&mut self) -> &mut EngineCore {
    &mut self.core
  }

  fn engine_type(&self) -> EngineType {
    EngineType::Raster
  }

  fn device_size(&self) -> Size {
    Size::new(self.target.width() as f32, self.target.height() as f32)
  }

  fn begin(&mut self) -> bool {
    // One active painter per device.
    if self.core.active || self.target.is_empty() {
      return false;
    }
    self.core.active = true;
    true
  }

  fn end(&mut self) -> bool {
    self.core.active = false;
    self.clip_mask = None;
    true
  }

  fn update_state(&mut self, flags: DirtyFlags) {
    // Pen/brush/font/hints are read per primitive; only the clip has
    // derived native state worth caching.
    if flags.intersects(DirtyFlags::CLIP) {
      self.rebuild_clip();
    }
    self.core.dirty.remove(flags);
  }

  fn draw_polygon(&mut self, points: &[Point], mode: PolygonMode) {
    if points.len() < 2 {
      return;
    }
    let mut path = PainterPath::new();
    path.move_to(points[0]);
    for p in &points[1..] {
      path.line_to(*p);
    }
    match mode {
      PolygonMode::Polyline => {
        // Stroke only: suppress the brush for this primitive.
        let saved = std::mem::replace(&mut self.core.state.brush, Brush::none());
        self.render_path(&path);
        self.core.state.brush = saved;
      }
      PolygonMode::OddEven => {
        path.close();
        path.set_fill_rule(FillRule::EvenOdd);
        self.render_path(&path);
      }
      PolygonMode::Winding | PolygonMode::Convex => {
        path.close();
        path.set_fill_rule(FillRule::Winding);
        self.render_path(&path);
      }
    }
  }

  fn draw_path(&mut self, path: &PainterPath) {
    if path.is_empty() {
      return;
    }
    self.render_path(path);
  }

  fn draw_rects(&mut self, rects: &[Rect]) {
    for rect in rects {
      if rect.is_empty() {
        continue;
      }
      self.render_path(&PainterPath::from_rect(*rect));
    }
  }

  fn draw_ellipse(&mut self, rect: Rect) {
    if rect.is_empty() {
      return;
    }
    self.render_path(&PainterPath::from_ellipse(rect));
  }

  fn draw_pixmap(&mut self, target: Rect, pixmap: &Pixmap, source: Rect) {
    if target.is_empty() || pixmap.is_empty() {
      return;
    }
    let cropped;
    let (src, src_rect) = if source == pixmap.rect() {
      (pixmap, source)
    } else {
      match pixmap.sub_pixmap(source) {
        Some(c) => {
          cropped = c;
          let r = cropped.rect();
          (&cropped, r)
        }
        None => return,
      }
    };
    if src_rect.is_empty() {
      return;
    }

    let state = &self.core.state;
    let combined = state.combined_transform();
    let sx = target.width() / src_rect.width();
    let sy = target.height() / src_rect.height();
    let local = Transform::from_scale(sx, sy)
      .then(&Transform::from_translate(target.left(), target.top()));
    // Perspective blits map through the affine part; the painter routes
    // perspective pixmap draws through the brush path for exact output.
    let full = local.then(&combined);

    let paint = tiny_skia::PixmapPaint {
      opacity: state.opacity,
      blend_mode: state.composition_mode.to_tiny_skia(),
      quality: self.filter_quality(),
    };
    self.target.as_tiny_skia_mut().draw_pixmap(
      0,
      0,
      src.as_tiny_skia().as_ref(),
      &paint,
      full.to_tiny_skia(),
      self.clip_mask.as_ref(),
    );
  }
}

// ==========================================================================
// Gradient helpers
// ==========================================================================

fn spread_mode(spread: GradientSpread) -> tiny_skia::SpreadMode {
  match spread {
    GradientSpread::Pad => tiny_skia::SpreadMode::Pad,
    GradientSpread::Repeat => tiny_skia::SpreadMode::Repeat,
    GradientSpread::Reflect => tiny_skia::SpreadMode::Reflect,
  }
}

fn scaled_stops(stops: &[GradientStop], opacity: f32) -> Vec<tiny_skia::GradientStop> {
  stops
    .iter()
    .map(|s| {
      tiny_skia::GradientStop::new(s.offset, s.color.mul_alpha(opacity).to_tiny_skia())
    })
    .collect()
}

/// Applies a spread mode to a raw gradient parameter
fn apply_spread(t: f32, spread: GradientSpread) -> f32 {
  match spread {
    GradientSpread::Pad => t.clamp(0.0, 1.0),
    GradientSpread::Repeat => t.rem_euclid(1.0),
    GradientSpread::Reflect => {
      let cycle = t.rem_euclid(2.0);
      if cycle > 1.0 {
        2.0 - cycle
      } else {
        cycle
      }
    }
  }
}

/// Interpolated gradient color at parameter `t` (already spread-applied)
fn color_at(stops: &[GradientStop], t: f32) -> Color {
  match stops {
    [] => Color::TRANSPARENT,
    [only] => only.color,
    _ => {
      if t <= stops[0].offset {
        return stops[0].color;
      }
      for pair in stops.windows(2) {
        let (a, b) = (pair[0], pair[1]);
        if t <= b.offset {
          let span = (b.offset - a.offset).max(1e-6);
          let f = (t - a.offset) / span;
          let lerp = |x: u8, y: u8| -> u8 { (x as f32 + (y as f32 - x as f32) * f) as u8 };
          return Color::new(
            lerp(a.color.r, b.color.r),
            lerp(a.color.g, b.color.g),
            lerp(a.color.b, b.color.b),
            a.color.a + (b.color.a - a.color.a) * f,
          );
        }
      }
      stops[stops.len() - 1].color
    }
  }
}

/// Rasterizes a conical gradient over `bounds` into a texture
fn synth_conical(g: &ConicalGradient, bounds: Rect, opacity: f32) -> Option<Pixmap> {
  let w = bounds.width() as u32;
  let h = bounds.height() as u32;
  let mut pm = Pixmap::new(w.max(1), h.max(1)).ok()?;
  let data = pm.as_tiny_skia_mut();
  for y in 0..data.height() {
    for x in 0..data.width() {
      let px = bounds.left() + x as f32 + 0.5 - g.center.x;
      let py = bounds.top() + y as f32 + 0.5 - g.center.y;
      let mut angle = py.atan2(px).to_degrees() - g.start_angle;
      angle = angle.rem_euclid(360.0);
      let color = color_at(&g.stops, angle / 360.0).mul_alpha(opacity);
      put_pixel(data, x, y, color);
    }
  }
  Some(pm)
}

/// Rasterizes an extended radial gradient (focal outside the circle)
///
/// Solves the two-point conical equation per pixel: the gradient parameter
/// `u` satisfies `|p - (focal + u * (center - focal))| = u * radius`.
/// Pixels outside the gradient cone stay transparent.
fn synth_extended_radial(g: &RadialGradient, bounds: Rect, opacity: f32) -> Option<Pixmap> {
  let w = bounds.width() as u32;
  let h = bounds.height() as u32;
  let mut pm = Pixmap::new(w.max(1), h.max(1)).ok()?;
  let dx = g.center.x - g.focal.x;
  let dy = g.center.y - g.focal.y;
  let a = dx * dx + dy * dy - g.radius * g.radius;
  let data = pm.as_tiny_skia_mut();
  for y in 0..data.height() {
    for x in 0..data.width() {
      let qx = bounds.left() + x as f32 + 0.5 - g.focal.x;
      let qy = bounds.top() + y as f32 + 0.5 - g.focal.y;
      let b = qx * dx + qy * dy;
      let c = qx * qx + qy * qy;
      let u = if a.abs() < 1e-6 {
        if b.abs() < 1e-6 {
          continue;
        }
        c / (2.0 * b)
      } else {
        let disc = b * b - a * c;
        if disc < 0.0 {
          continue;
        }
        let root = disc.sqrt();
        let u1 = (b + root) / a;
        let u2 = (b - root) / a;
        u1.max(u2)
      };
      if u <= 0.0 {
        continue;
      }
      let t = apply_spread(u, g.spread);
      let color = color_at(&g.stops, t).mul_alpha(opacity);
      put_pixel(data, x, y, color);
    }
  }
  Some(pm)
}

fn put_pixel(pm: &mut tiny_skia::Pixmap, x: u32, y: u32, color: Color) {
  let mut paint = tiny_skia::Paint::default();
  paint.set_color(color.to_tiny_skia());
  paint.blend_mode = tiny_skia::BlendMode::Source;
  if let Some(rect) = tiny_skia::Rect::from_xywh(x as f32, y as f32, 1.0, 1.0) {
    pm.fill_rect(rect, &paint, tiny_skia::Transform::identity(), None);
  }
}

/// Builds the 8x8 tile for a hatch pattern
fn hatch_tile(pattern: HatchPattern, color: Color) -> Pixmap {
  const TILE: u32 = 8;
  let mut pm = Pixmap::new(TILE, TILE).expect("hatch tile allocation");
  let mut paint = tiny_skia::Paint::default();
  paint.set_color(color.to_tiny_skia());
  paint.anti_alias = false;

  let mut fill = |x: f32, y: f32, w: f32, h: f32, paint: &tiny_skia::Paint| {
    if let Some(rect) = tiny_skia::Rect::from_xywh(x, y, w, h) {
      pm.as_tiny_skia_mut()
        .fill_rect(rect, paint, tiny_skia::Transform::identity(), None);
    }
  };

  match pattern {
    HatchPattern::Horizontal => fill(0.0, 3.0, TILE as f32, 1.0, &paint),
    HatchPattern::Vertical => fill(3.0, 0.0, 1.0, TILE as f32, &paint),
    HatchPattern::Cross => {
      fill(0.0, 3.0, TILE as f32, 1.0, &paint);
      fill(3.0, 0.0, 1.0, TILE as f32, &paint);
    }
    HatchPattern::ForwardDiagonal => {
      for i in 0..TILE {
        fill(i as f32, (TILE - 1 - i) as f32, 1.0, 1.0, &paint);
      }
    }
    HatchPattern::BackwardDiagonal => {
      for i in 0..TILE {
        fill(i as f32, i as f32, 1.0, 1.0, &paint);
      }
    }
    HatchPattern::DiagonalCross => {
      for i in 0..TILE {
        fill(i as f32, i as f32, 1.0, 1.0, &paint);
        fill(i as f32, (TILE - 1 - i) as f32, 1.0, 1.0, &paint);
      }
    }
    HatchPattern::Dense(level) => {
      let density = level.clamp(1, 7) as f32 / 8.0;
      let mut dense_paint = tiny_skia::Paint::default();
      dense_paint.set_color(color.mul_alpha(density).to_tiny_skia());
      fill(0.0, 0.0, TILE as f32, TILE as f32, &dense_paint);
    }
  }
  pm
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::paint::state::PainterState;

  fn solid_fill_state(brush: Brush) -> PainterState {
    let mut state = PainterState::new();
    state.brush = brush;
    state.pen = crate::paint::pen::Pen::none();
    state
  }

  fn pixel(pm: &Pixmap, x: u32, y: u32) -> (u8, u8, u8, u8) {
    let px = pm.as_tiny_skia().pixels()[(y * pm.width() + x) as usize];
    (px.red(), px.green(), px.blue(), px.alpha())
  }

  #[test]
  fn test_solid_fill_covers_rect() {
    let mut target = Pixmap::new(20, 20).unwrap();
    let mut engine = RasterEngine::new(&mut target);
    assert!(engine.begin());
    engine.core_mut().state = solid_fill_state(Brush::solid(Color::RED));
    engine.draw_rects(&[Rect::from_xywh(5.0, 5.0, 10.0, 10.0)]);
    assert!(engine.end());

    assert_eq!(pixel(&target, 10, 10), (255, 0, 0, 255));
    assert_eq!(pixel(&target, 1, 1).3, 0, "outside stays transparent");
  }

  #[test]
  fn test_clip_limits_fill() {
    use crate::paint::state::{ClipEntry, ClipOperation, ClipShape};

    let mut target = Pixmap::new(20, 20).unwrap();
    let mut engine = RasterEngine::new(&mut target);
    engine.begin();
    let mut state = solid_fill_state(Brush::solid(Color::GREEN));
    state.clip_enabled = true;
    state.clip_stack.push(ClipEntry {
      op: ClipOperation::Replace,
      shape: ClipShape::Rect(Rect::from_xywh(0.0, 0.0, 8.0, 20.0)),
      transform: Transform::identity(),
    });
    engine.core_mut().state = state;
    engine.update_state(DirtyFlags::CLIP);
    engine.draw_rects(&[Rect::from_xywh(0.0, 0.0, 20.0, 20.0)]);
    engine.end();

    assert_eq!(pixel(&target, 4, 10).3, 255, "inside clip painted");
    assert_eq!(pixel(&target, 15, 10).3, 0, "outside clip untouched");
  }

  #[test]
  fn test_transform_scales_fill() {
    let mut target = Pixmap::new(40, 40).unwrap();
    let mut engine = RasterEngine::new(&mut target);
    engine.begin();
    let mut state = solid_fill_state(Brush::solid(Color::BLUE));
    state.world_transform = Transform::from_scale(2.0, 2.0);
    engine.core_mut().state = state;
    engine.draw_rects(&[Rect::from_xywh(0.0, 0.0, 10.0, 10.0)]);
    engine.end();

    assert_eq!(pixel(&target, 15, 15).3, 255, "scaled fill covers 20x20");
    assert_eq!(pixel(&target, 25, 25).3, 0);
  }

  #[test]
  fn test_gradient_parameter_helpers() {
    let stops = vec![
      GradientStop::new(0.0, Color::new(0, 0, 0, 1.0)),
      GradientStop::new(1.0, Color::new(255, 255, 255, 1.0)),
    ];
    let mid = color_at(&stops, 0.5);
    assert!(mid.r > 100 && mid.r < 155);
    assert_eq!(apply_spread(1.5, GradientSpread::Pad), 1.0);
    assert!((apply_spread(1.25, GradientSpread::Repeat) - 0.25).abs() < 1e-6);
    assert!((apply_spread(1.25, GradientSpread::Reflect) - 0.75).abs() < 1e-6);
  }

  #[test]
  fn test_cosmetic_pen_strokes_one_device_pixel() {
    let mut target = Pixmap::new(40, 40).unwrap();
    let mut engine = RasterEngine::new(&mut target);
    engine.begin();
    let mut state = PainterState::new();
    state.brush = Brush::none();
    state.pen = crate::paint::pen::Pen::new(Color::BLACK, 0.0);
    state.render_hints = RenderHints::empty();
    state.world_transform = Transform::from_scale(10.0, 10.0);
    engine.core_mut().state = state;
    engine.draw_polygon(
      &[Point::new(0.0, 2.0), Point::new(4.0, 2.0)],
      PolygonMode::Polyline,
    );
    engine.end();

    // The line lives at device y=20; with a 10x scale a non-cosmetic pen
    // would cover ~10 rows. Count covered rows at x=10.
    let covered: Vec<u32> = (0..40)
      .filter(|&y| pixel(&target, 10, y).3 > 0)
      .collect();
    assert!(
      covered.len() <= 2,
      "cosmetic pen must stay ~1 device pixel, covered rows: {covered:?}"
    );
  }
}
