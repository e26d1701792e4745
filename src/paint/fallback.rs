//! Default algorithms for optional engine primitives
//!
//! Every function here expresses one optional [`PaintEngine`] primitive in
//! terms of the required set (`draw_polygon`, `draw_pixmap`) plus the other
//! optional primitives — the call graph bottoms out in required methods, so
//! any engine that implements the required set gets the full primitive
//! vocabulary for free, if not efficiently.
//!
//! The functions temporarily swap pen/brush in the engine's state snapshot
//! (flagging the change through `update_state`) to express "fill only" or
//! "stroke only" operations, and restore the original state before
//! returning.

use crate::geometry::{Line, Point, Rect};
use crate::paint::brush::Brush;
use crate::paint::engine::{EngineFeatures, PaintEngine, PolygonMode};
use crate::paint::path::{FillRule, PainterPath};
use crate::paint::pen::{CapStyle, Pen};
use crate::paint::pixmap::Pixmap;
use crate::paint::state::{DirtyFlags, PainterState};
use crate::paint::text::TextItem;

/// Working-set budget for the pre-composited tile, in pixels
const TILE_PIXEL_BUDGET: u32 = 32 * 1024;

/// Effective device scale of the state's combined transform
///
/// Used to size cosmetic-pen geometry: a cosmetic stroke must end up at one
/// device pixel after the transform, so logical geometry is divided by this.
fn device_scale(state: &PainterState) -> f32 {
  let det = state.combined_transform().determinant().abs();
  if det <= f32::EPSILON {
    1.0
  } else {
    det.sqrt()
  }
}

/// Pen width in logical units, honoring the cosmetic-pen rule
fn logical_pen_width(state: &PainterState) -> f32 {
  let pen = &state.pen;
  if pen.is_cosmetic() {
    1.0 / device_scale(state)
  } else {
    pen.width
  }
}

/// Runs `f` with the pen disabled and the brush replaced
fn with_fill_only<E: PaintEngine + ?Sized>(
  engine: &mut E,
  brush: Brush,
  f: impl FnOnce(&mut E),
) {
  let old_pen = engine.core().state.pen.clone();
  let old_brush = engine.core().state.brush.clone();
  {
    let core = engine.core_mut();
    core.state.pen = Pen::none();
    core.state.brush = brush;
  }
  engine.update_state(DirtyFlags::PEN | DirtyFlags::BRUSH);
  f(engine);
  {
    let core = engine.core_mut();
    core.state.pen = old_pen;
    core.state.brush = old_brush;
  }
  engine.update_state(DirtyFlags::PEN | DirtyFlags::BRUSH);
}

/// Runs `f` with the brush disabled (stroke-only)
fn with_stroke_only<E: PaintEngine + ?Sized>(engine: &mut E, f: impl FnOnce(&mut E)) {
  let old_brush = engine.core().state.brush.clone();
  engine.core_mut().state.brush = Brush::none();
  engine.update_state(DirtyFlags::BRUSH);
  f(engine);
  engine.core_mut().state.brush = old_brush;
  engine.update_state(DirtyFlags::BRUSH);
}

/// Lowers a path onto polygon fills: brush fill of each flattened subpath,
/// then a stroke-to-fill pass for the pen
pub fn draw_path_via_polygons<E: PaintEngine + ?Sized>(engine: &mut E, path: &PainterPath) {
  if path.is_empty() {
    return;
  }
  let state = &engine.core().state;
  let brush = state.brush.clone();
  let pen = state.pen.clone();

  if !brush.is_none() {
    let mode = match path.fill_rule() {
      FillRule::Winding => PolygonMode::Winding,
      FillRule::EvenOdd => PolygonMode::OddEven,
    };
    let polygons = path.to_polygons();
    with_fill_only(engine, brush, |engine| {
      for polygon in &polygons {
        engine.draw_polygon(polygon, mode);
      }
    });
  }

  if !pen.is_none() {
    let mut stroke_pen = pen.clone();
    stroke_pen.width = logical_pen_width(&engine.core().state);
    let scale = device_scale(&engine.core().state);
    let stroked = path.stroked(&stroke_pen, scale);
    if !stroked.is_empty() {
      let polygons = stroked.to_polygons();
      with_fill_only(engine, pen.brush.clone(), |engine| {
        for polygon in &polygons {
          engine.draw_polygon(polygon, PolygonMode::Winding);
        }
      });
    }
  }
}

/// Draws points as pen-width squares (flat/square caps) or circles (round)
pub fn draw_points_as_shapes<E: PaintEngine + ?Sized>(engine: &mut E, points: &[Point]) {
  if points.is_empty() {
    return;
  }
  let state = &engine.core().state;
  let pen = state.pen.clone();
  if pen.is_none() {
    return;
  }
  let size = logical_pen_width(state).max(1.0 / device_scale(state));
  let round = pen.cap == CapStyle::Round;

  let mut path = PainterPath::new();
  for p in points {
    let rect = Rect::from_xywh(p.x - size / 2.0, p.y - size / 2.0, size, size);
    if round {
      path.add_ellipse(rect);
    } else {
      path.add_rect(rect);
    }
  }
  with_fill_only(engine, pen.brush.clone(), |engine| {
    engine.draw_path(&path);
  });
}

/// Draws line segments as two-point polylines
///
/// Zero-length lines vanish under a polyline stroke, but with a non-flat
/// cap they must still mark their point — those degenerate to
/// `draw_points`.
pub fn draw_lines_as_polylines<E: PaintEngine + ?Sized>(engine: &mut E, lines: &[Line]) {
  if lines.is_empty() {
    return;
  }
  let cap = engine.core().state.pen.cap;
  let mut degenerate_points: Vec<Point> = Vec::new();
  for line in lines {
    if line.is_degenerate() {
      if cap != CapStyle::Flat {
        degenerate_points.push(line.p1);
      }
      continue;
    }
    engine.draw_polygon(&[line.p1, line.p2], PolygonMode::Polyline);
  }
  if !degenerate_points.is_empty() {
    engine.draw_points(&degenerate_points);
  }
}

/// Draws rects as native paths when available, else as convex quads
pub fn draw_rects_via_path_or_polygon<E: PaintEngine + ?Sized>(engine: &mut E, rects: &[Rect]) {
  let has_paths = engine
    .core()
    .features()
    .contains(EngineFeatures::PAINTER_PATHS);
  for rect in rects {
    if rect.is_empty() {
      continue;
    }
    if has_paths {
      // One path per rect: object-bounding brushes resolve per primitive.
      engine.draw_path(&PainterPath::from_rect(*rect));
    } else {
      // draw_polygon fills with the brush and strokes with the pen.
      let points = [
        Point::new(rect.left(), rect.top()),
        Point::new(rect.right(), rect.top()),
        Point::new(rect.right(), rect.bottom()),
        Point::new(rect.left(), rect.bottom()),
      ];
      engine.draw_polygon(&points, PolygonMode::Convex);
    }
  }
}

/// Draws an ellipse as a Bézier-arc path
///
/// Engines without native path support get the polygon lowering through
/// `draw_path`'s own default.
pub fn draw_ellipse_via_path<E: PaintEngine + ?Sized>(engine: &mut E, rect: Rect) {
  if rect.is_empty() {
    return;
  }
  engine.draw_path(&PainterPath::from_ellipse(rect));
}

/// Tiles a pixmap across a rect by stamping
///
/// When the source is small relative to the target, a larger tile is
/// pre-composited by self-blitting at doubling sizes — as long as the tile
/// stays under the ~32K-pixel working-set budget — and the big tile is
/// stamped instead. Tiling starts at `offset` within the source and fills
/// left-to-right, top-to-bottom, clipping the last row and column.
pub fn draw_tiled_pixmap_by_stamping<E: PaintEngine + ?Sized>(
  engine: &mut E,
  rect: Rect,
  pixmap: &Pixmap,
  offset: Point,
) {
  if rect.is_empty() || pixmap.is_empty() {
    return;
  }
  let pw = pixmap.width();
  let ph = pixmap.height();

  let mut tile_w = pw;
  let mut tile_h = ph;
  while (tile_w as f32) < rect.width() && tile_w * 2 * tile_h <= TILE_PIXEL_BUDGET {
    tile_w *= 2;
  }
  while (tile_h as f32) < rect.height() && tile_w * tile_h * 2 <= TILE_PIXEL_BUDGET {
    tile_h *= 2;
  }

  let enlarged;
  let tile: &Pixmap = if tile_w != pw || tile_h != ph {
    match pixmap.enlarged_tile(tile_w, tile_h) {
      Ok(t) => {
        enlarged = t;
        &enlarged
      }
      Err(_) => pixmap,
    }
  } else {
    pixmap
  };

  let tw = tile.width() as f32;
  let th = tile.height() as f32;
  // Normalize the starting offset into [0, tile extent).
  let off_x = offset.x.rem_euclid(pw as f32);
  let off_y = offset.y.rem_euclid(ph as f32);

  let mut y = rect.top() - off_y;
  while y < rect.bottom() {
    let mut x = rect.left() - off_x;
    while x < rect.right() {
      let stamp = Rect::from_xywh(x, y, tw, th);
      if let Some(visible) = stamp.intersection(&rect) {
        let source = Rect::from_xywh(
          visible.left() - x,
          visible.top() - y,
          visible.width(),
          visible.height(),
        );
        engine.draw_pixmap(visible, tile, source);
      }
      x += tw;
    }
    y += th;
  }
}

/// Crops the source sub-rect if needed, then delegates to `draw_pixmap`
pub fn draw_image_via_pixmap<E: PaintEngine + ?Sized>(
  engine: &mut E,
  target: Rect,
  image: &Pixmap,
  source: Rect,
) {
  if target.is_empty() || image.is_empty() {
    return;
  }
  let whole = image.rect();
  if source == whole {
    engine.draw_pixmap(target, image, source);
    return;
  }
  match image.sub_pixmap(source) {
    Some(cropped) => {
      let cropped_rect = cropped.rect();
      engine.draw_pixmap(target, &cropped, cropped_rect);
    }
    None => {
      // Source entirely outside the image: legitimate empty draw.
    }
  }
}

/// Draws a glyph run as filled outline paths, or as box-font cells
pub fn draw_text_as_paths<E: PaintEngine + ?Sized>(engine: &mut E, pos: Point, item: &TextItem) {
  if item.is_empty() {
    return;
  }
  let pen_brush = engine.core().state.pen.brush.clone();

  if item.font.has_outlines() {
    let mut path = PainterPath::new();
    path.set_fill_rule(FillRule::Winding);
    for glyph in &item.glyphs {
      if let Some(outline) = item.font.glyph_outline(glyph.id) {
        path.append(
          &outline.translated(pos.x + glyph.position.x, pos.y + glyph.position.y),
        );
      }
    }
    if !path.is_empty() {
      with_fill_only(engine, pen_brush, |engine| {
        engine.draw_path(&path);
      });
    }
    return;
  }

  // Box fallback font: outline a cell per glyph, plus a bar underneath to
  // approximate the character.
  let metrics = item.font.metrics();
  let mut cells: Vec<Rect> = Vec::with_capacity(item.glyphs.len());
  let mut bars: Vec<Rect> = Vec::with_capacity(item.glyphs.len());
  for glyph in &item.glyphs {
    let advance = item.font.glyph_advance(glyph.id);
    let x = pos.x + glyph.position.x;
    let y = pos.y + glyph.position.y;
    cells.push(Rect::from_xywh(
      x,
      y - metrics.ascent,
      (advance - 1.0).max(1.0),
      metrics.ascent,
    ));
    bars.push(Rect::from_xywh(
      x,
      y + metrics.descent - metrics.line_thickness,
      (advance - 1.0).max(1.0),
      metrics.line_thickness,
    ));
  }
  with_stroke_only(engine, |engine| {
    for cell in &cells {
      let outline = [
        Point::new(cell.left(), cell.top()),
        Point::new(cell.right(), cell.top()),
        Point::new(cell.right(), cell.bottom()),
        Point::new(cell.left(), cell.bottom()),
        Point::new(cell.left(), cell.top()),
      ];
      engine.draw_polygon(&outline, PolygonMode::Polyline);
    }
  });
  with_fill_only(engine, pen_brush, |engine| {
    engine.draw_rects(&bars);
  });
}
