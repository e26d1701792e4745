//! PainterPath: fill-rule-tagged vector outlines
//!
//! The path object is the workhorse of both the default primitive
//! implementations (ellipses, rects and text all lower to paths) and the
//! emulation pipeline (stroke-to-fill conversion, device-space bounds,
//! polygon flattening).
//!
//! Elements are stored as an explicit move/line/cubic list so paths can be
//! mapped through arbitrary transforms — including perspective, which
//! flattens first — and converted to `tiny_skia::Path` only at the raster
//! boundary.

use crate::geometry::{Point, Rect};
use crate::paint::pen::{CapStyle, JoinStyle, Pen};
use crate::transform::Transform;

/// Fill rule for self-intersecting paths
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FillRule {
  /// Non-zero winding rule (the default; glyph outlines require it)
  #[default]
  Winding,
  /// Even-odd rule
  EvenOdd,
}

impl FillRule {
  pub fn to_tiny_skia(self) -> tiny_skia::FillRule {
    match self {
      FillRule::Winding => tiny_skia::FillRule::Winding,
      FillRule::EvenOdd => tiny_skia::FillRule::EvenOdd,
    }
  }
}

/// One path element
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PathElement {
  MoveTo(Point),
  LineTo(Point),
  /// Cubic Bézier: two control points then the end point
  CubicTo(Point, Point, Point),
  Close,
}

/// Magic number for approximating quarter circles with cubic Béziers
const KAPPA: f32 = 0.552_284_75;

/// A vector outline with a fill rule
///
/// # Examples
///
/// ```
/// use easelkit::{PainterPath, Point, Rect};
///
/// let mut path = PainterPath::new();
/// path.move_to(Point::new(0.0, 0.0));
/// path.line_to(Point::new(10.0, 0.0));
/// path.line_to(Point::new(10.0, 10.0));
/// path.close();
/// assert_eq!(path.bounding_rect(), Rect::from_xywh(0.0, 0.0, 10.0, 10.0));
/// ```
#[derive(Debug, Clone, PartialEq, Default)]
pub struct PainterPath {
  elements: Vec<PathElement>,
  fill_rule: FillRule,
}

impl PainterPath {
  /// An empty path with the winding fill rule
  pub fn new() -> Self {
    Self::default()
  }

  /// A rectangle path
  pub fn from_rect(rect: Rect) -> Self {
    let mut path = Self::new();
    path.add_rect(rect);
    path
  }

  /// A closed polygon path through the given points
  pub fn from_polygon(points: &[Point]) -> Self {
    let mut path = Self::new();
    path.add_polygon(points);
    path
  }

  /// An ellipse path inscribed in `rect`, built from four Bézier arcs
  pub fn from_ellipse(rect: Rect) -> Self {
    let mut path = Self::new();
    path.add_ellipse(rect);
    path
  }

  /// The fill rule
  pub fn fill_rule(&self) -> FillRule {
    self.fill_rule
  }

  /// Replaces the fill rule
  pub fn set_fill_rule(&mut self, rule: FillRule) {
    self.fill_rule = rule;
  }

  /// The raw element list
  pub fn elements(&self) -> &[PathElement] {
    &self.elements
  }

  /// Returns true if the path has no elements
  pub fn is_empty(&self) -> bool {
    self.elements.is_empty()
  }

  /// Starts a new subpath
  pub fn move_to(&mut self, p: Point) {
    self.elements.push(PathElement::MoveTo(p));
  }

  /// Adds a line segment from the current point
  pub fn line_to(&mut self, p: Point) {
    self.elements.push(PathElement::LineTo(p));
  }

  /// Adds a cubic Bézier segment
  pub fn cubic_to(&mut self, c1: Point, c2: Point, end: Point) {
    self.elements.push(PathElement::CubicTo(c1, c2, end));
  }

  /// Adds a quadratic Bézier segment, elevated to a cubic
  pub fn quad_to(&mut self, c: Point, end: Point) {
    let start = self.current_point().unwrap_or(c);
    let c1 = Point::new(
      start.x + 2.0 / 3.0 * (c.x - start.x),
      start.y + 2.0 / 3.0 * (c.y - start.y),
    );
    let c2 = Point::new(
      end.x + 2.0 / 3.0 * (c.x - end.x),
      end.y + 2.0 / 3.0 * (c.y - end.y),
    );
    self.cubic_to(c1, c2, end);
  }

  /// Closes the current subpath
  pub fn close(&mut self) {
    self.elements.push(PathElement::Close);
  }

  /// Appends a closed rectangle subpath
  pub fn add_rect(&mut self, rect: Rect) {
    if rect.is_empty() {
      return;
    }
    self.move_to(Point::new(rect.left(), rect.top()));
    self.line_to(Point::new(rect.right(), rect.top()));
    self.line_to(Point::new(rect.right(), rect.bottom()));
    self.line_to(Point::new(rect.left(), rect.bottom()));
    self.close();
  }

  /// Appends a closed polygon subpath
  pub fn add_polygon(&mut self, points: &[Point]) {
    if points.len() < 2 {
      return;
    }
    self.move_to(points[0]);
    for p in &points[1..] {
      self.line_to(*p);
    }
    self.close();
  }

  /// Appends an ellipse inscribed in `rect` as four Bézier arcs
  pub fn add_ellipse(&mut self, rect: Rect) {
    if rect.is_empty() {
      return;
    }
    let rx = rect.width() / 2.0;
    let ry = rect.height() / 2.0;
    let c = rect.center();
    let (kx, ky) = (rx * KAPPA, ry * KAPPA);

    self.move_to(Point::new(c.x + rx, c.y));
    self.cubic_to(
      Point::new(c.x + rx, c.y + ky),
      Point::new(c.x + kx, c.y + ry),
      Point::new(c.x, c.y + ry),
    );
    self.cubic_to(
      Point::new(c.x - kx, c.y + ry),
      Point::new(c.x - rx, c.y + ky),
      Point::new(c.x - rx, c.y),
    );
    self.cubic_to(
      Point::new(c.x - rx, c.y - ky),
      Point::new(c.x - kx, c.y - ry),
      Point::new(c.x, c.y - ry),
    );
    self.cubic_to(
      Point::new(c.x + kx, c.y - ry),
      Point::new(c.x + rx, c.y - ky),
      Point::new(c.x + rx, c.y),
    );
    self.close();
  }

  /// Appends a rounded rectangle with a uniform corner radius
  pub fn add_round_rect(&mut self, rect: Rect, radius: f32) {
    if rect.is_empty() {
      return;
    }
    let r = radius
      .min(rect.width() / 2.0)
      .min(rect.height() / 2.0)
      .max(0.0);
    if r == 0.0 {
      self.add_rect(rect);
      return;
    }
    let k = r * KAPPA;
    let (l, t, rt, b) = (rect.left(), rect.top(), rect.right(), rect.bottom());

    self.move_to(Point::new(l + r, t));
    self.line_to(Point::new(rt - r, t));
    self.cubic_to(
      Point::new(rt - r + k, t),
      Point::new(rt, t + r - k),
      Point::new(rt, t + r),
    );
    self.line_to(Point::new(rt, b - r));
    self.cubic_to(
      Point::new(rt, b - r + k),
      Point::new(rt - r + k, b),
      Point::new(rt - r, b),
    );
    self.line_to(Point::new(l + r, b));
    self.cubic_to(
      Point::new(l + r - k, b),
      Point::new(l, b - r + k),
      Point::new(l, b - r),
    );
    self.line_to(Point::new(l, t + r));
    self.cubic_to(
      Point::new(l, t + r - k),
      Point::new(l + r - k, t),
      Point::new(l + r, t),
    );
    self.close();
  }

  /// Appends every subpath of `other` to this path
  ///
  /// Under the winding rule this acts as a union of non-overlapping shapes;
  /// the emulation path uses it to accumulate stroke and fill geometry.
  pub fn append(&mut self, other: &PainterPath) {
    self.elements.extend_from_slice(&other.elements);
  }

  /// The end point of the last element, if any
  pub fn current_point(&self) -> Option<Point> {
    for el in self.elements.iter().rev() {
      match el {
        PathElement::MoveTo(p) | PathElement::LineTo(p) => return Some(*p),
        PathElement::CubicTo(_, _, p) => return Some(*p),
        PathElement::Close => continue,
      }
    }
    None
  }

  /// Control-point bounding rect
  ///
  /// Curve control points are included, so this may over-estimate curved
  /// edges slightly; it never under-estimates, which is what the emulation
  /// surface sizing needs.
  pub fn bounding_rect(&self) -> Rect {
    let mut iter = self.points();
    let first = match iter.next() {
      Some(p) => p,
      None => return Rect::ZERO,
    };
    let mut left = first.x;
    let mut top = first.y;
    let mut right = first.x;
    let mut bottom = first.y;
    for p in iter {
      left = left.min(p.x);
      top = top.min(p.y);
      right = right.max(p.x);
      bottom = bottom.max(p.y);
    }
    Rect::from_ltrb(left, top, right, bottom)
  }

  fn points(&self) -> impl Iterator<Item = Point> + '_ {
    self.elements.iter().flat_map(|el| match el {
      PathElement::MoveTo(p) | PathElement::LineTo(p) => vec![*p],
      PathElement::CubicTo(c1, c2, p) => vec![*c1, *c2, *p],
      PathElement::Close => vec![],
    })
  }

  /// Maps the path through a transform
  ///
  /// Affine transforms map elements exactly. Perspective transforms flatten
  /// the path first (curves become polylines) because a projected Bézier is
  /// no longer a Bézier.
  pub fn transformed(&self, transform: &Transform) -> PainterPath {
    if transform.is_identity() {
      return self.clone();
    }
    if transform.is_affine() {
      let elements = self
        .elements
        .iter()
        .map(|el| match el {
          PathElement::MoveTo(p) => PathElement::MoveTo(transform.map_point(*p)),
          PathElement::LineTo(p) => PathElement::LineTo(transform.map_point(*p)),
          PathElement::CubicTo(c1, c2, p) => PathElement::CubicTo(
            transform.map_point(*c1),
            transform.map_point(*c2),
            transform.map_point(*p),
          ),
          PathElement::Close => PathElement::Close,
        })
        .collect();
      return PainterPath {
        elements,
        fill_rule: self.fill_rule,
      };
    }
    // Perspective: flatten, then map vertices.
    let mut out = PainterPath::new();
    out.fill_rule = self.fill_rule;
    for polygon in self.to_polygons() {
      let mapped: Vec<Point> = polygon.iter().map(|p| transform.map_point(*p)).collect();
      out.add_polygon(&mapped);
    }
    out
  }

  /// Translates the path
  pub fn translated(&self, dx: f32, dy: f32) -> PainterPath {
    self.transformed(&Transform::from_translate(dx, dy))
  }

  /// Flattens the path into closed polygons, one per subpath
  pub fn to_polygons(&self) -> Vec<Vec<Point>> {
    let mut polygons = Vec::new();
    let mut current: Vec<Point> = Vec::new();
    for el in &self.elements {
      match el {
        PathElement::MoveTo(p) => {
          if current.len() > 1 {
            polygons.push(std::mem::take(&mut current));
          } else {
            current.clear();
          }
          current.push(*p);
        }
        PathElement::LineTo(p) => current.push(*p),
        PathElement::CubicTo(c1, c2, p) => {
          let start = *current.last().unwrap_or(p);
          flatten_cubic(start, *c1, *c2, *p, &mut current);
        }
        PathElement::Close => {
          if current.len() > 1 {
            polygons.push(std::mem::take(&mut current));
          } else {
            current.clear();
          }
        }
      }
    }
    if current.len() > 1 {
      polygons.push(current);
    }
    polygons
  }

  /// Converts the outline of this path, stroked with `pen`, into a fillable
  /// path
  ///
  /// This is the stroke-to-fill conversion the emulation pipeline uses to
  /// compute exact stroke bounds and to fill strokes through engines that
  /// only know how to fill. Returns an empty path for degenerate input.
  pub fn stroked(&self, pen: &Pen, resolution_scale: f32) -> PainterPath {
    let Some(ts_path) = self.to_tiny_skia() else {
      return PainterPath::new();
    };
    let stroke = pen_to_stroke(pen);
    let mut stroker = tiny_skia::PathStroker::new();
    match stroker.stroke(&ts_path, &stroke, resolution_scale.max(0.1)) {
      Some(stroked) => {
        let mut path = from_tiny_skia(&stroked);
        // Stroke outlines self-intersect at joins; winding keeps them solid.
        path.set_fill_rule(FillRule::Winding);
        path
      }
      None => PainterPath::new(),
    }
  }

  /// Builds the tiny-skia representation, or `None` for an empty path
  pub fn to_tiny_skia(&self) -> Option<tiny_skia::Path> {
    let mut builder = tiny_skia::PathBuilder::new();
    let mut has_current = false;
    for el in &self.elements {
      match el {
        PathElement::MoveTo(p) => {
          builder.move_to(p.x, p.y);
          has_current = true;
        }
        PathElement::LineTo(p) => {
          if !has_current {
            builder.move_to(p.x, p.y);
            has_current = true;
          } else {
            builder.line_to(p.x, p.y);
          }
        }
        PathElement::CubicTo(c1, c2, p) => {
          if has_current {
            builder.cubic_to(c1.x, c1.y, c2.x, c2.y, p.x, p.y);
          }
        }
        PathElement::Close => {
          builder.close();
          has_current = false;
        }
      }
    }
    builder.finish()
  }
}

/// Converts a tiny-skia path back into element form
pub fn from_tiny_skia(path: &tiny_skia::Path) -> PainterPath {
  let mut out = PainterPath::new();
  for segment in path.segments() {
    match segment {
      tiny_skia::PathSegment::MoveTo(p) => out.move_to(Point::new(p.x, p.y)),
      tiny_skia::PathSegment::LineTo(p) => out.line_to(Point::new(p.x, p.y)),
      tiny_skia::PathSegment::QuadTo(c, p) => {
        out.quad_to(Point::new(c.x, c.y), Point::new(p.x, p.y))
      }
      tiny_skia::PathSegment::CubicTo(c1, c2, p) => out.cubic_to(
        Point::new(c1.x, c1.y),
        Point::new(c2.x, c2.y),
        Point::new(p.x, p.y),
      ),
      tiny_skia::PathSegment::Close => out.close(),
    }
  }
  out
}

/// Builds the tiny-skia stroke descriptor for a pen
///
/// The caller is responsible for the cosmetic-pen width adjustment; this
/// conversion uses the effective width as given.
pub fn pen_to_stroke(pen: &Pen) -> tiny_skia::Stroke {
  let width = pen.effective_width();
  tiny_skia::Stroke {
    width,
    miter_limit: pen.miter_limit.max(1.0),
    line_cap: match pen.cap {
      CapStyle::Flat => tiny_skia::LineCap::Butt,
      CapStyle::Square => tiny_skia::LineCap::Square,
      CapStyle::Round => tiny_skia::LineCap::Round,
    },
    line_join: match pen.join {
      JoinStyle::Miter => tiny_skia::LineJoin::Miter,
      JoinStyle::Bevel => tiny_skia::LineJoin::Bevel,
      JoinStyle::Round => tiny_skia::LineJoin::Round,
    },
    dash: pen.style.dash_pattern().and_then(|pattern| {
      let scaled: Vec<f32> = pattern.iter().map(|len| len * width).collect();
      tiny_skia::StrokeDash::new(scaled, 0.0)
    }),
  }
}

/// Adaptive-ish cubic flattening: subdivision count scales with the control
/// polygon length so long curves stay smooth and short ones stay cheap.
fn flatten_cubic(start: Point, c1: Point, c2: Point, end: Point, out: &mut Vec<Point>) {
  let chord = start.distance_to(c1) + c1.distance_to(c2) + c2.distance_to(end);
  let steps = (chord / 3.0).ceil().clamp(4.0, 32.0) as usize;
  for i in 1..=steps {
    let t = i as f32 / steps as f32;
    let mt = 1.0 - t;
    let a = mt * mt * mt;
    let b = 3.0 * mt * mt * t;
    let c = 3.0 * mt * t * t;
    let d = t * t * t;
    out.push(Point::new(
      a * start.x + b * c1.x + c * c2.x + d * end.x,
      a * start.y + b * c1.y + c * c2.y + d * end.y,
    ));
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::paint::color::Color;

  #[test]
  fn test_rect_path_bounds() {
    let path = PainterPath::from_rect(Rect::from_xywh(5.0, 10.0, 20.0, 30.0));
    assert_eq!(path.bounding_rect(), Rect::from_xywh(5.0, 10.0, 20.0, 30.0));
  }

  #[test]
  fn test_ellipse_bounds_match_rect() {
    let rect = Rect::from_xywh(0.0, 0.0, 100.0, 50.0);
    let path = PainterPath::from_ellipse(rect);
    let bounds = path.bounding_rect();
    // Control points of the Bézier arcs stay inside the bounding rect.
    assert_eq!(bounds, rect);
  }

  #[test]
  fn test_empty_geometry_is_ignored() {
    let mut path = PainterPath::new();
    path.add_rect(Rect::ZERO);
    path.add_polygon(&[Point::ZERO]);
    assert!(path.is_empty());
  }

  #[test]
  fn test_polygon_flattening_of_curves() {
    let path = PainterPath::from_ellipse(Rect::from_xywh(0.0, 0.0, 10.0, 10.0));
    let polygons = path.to_polygons();
    assert_eq!(polygons.len(), 1);
    assert!(polygons[0].len() > 8, "curves should flatten to many vertices");
  }

  #[test]
  fn test_perspective_transform_flattens() {
    let path = PainterPath::from_ellipse(Rect::from_xywh(0.0, 0.0, 10.0, 10.0));
    let perspective =
      Transform::from_rows(1.0, 0.0, 0.001, 0.0, 1.0, 0.0, 0.0, 0.0, 1.0);
    let mapped = path.transformed(&perspective);
    assert!(mapped
      .elements()
      .iter()
      .all(|el| !matches!(el, PathElement::CubicTo(..))));
  }

  #[test]
  fn test_stroked_path_is_fillable() {
    let mut path = PainterPath::new();
    path.move_to(Point::new(0.0, 0.0));
    path.line_to(Point::new(100.0, 0.0));
    let pen = Pen::new(Color::BLACK, 10.0);
    let stroked = path.stroked(&pen, 1.0);
    assert!(!stroked.is_empty());
    let bounds = stroked.bounding_rect();
    assert!(bounds.height() >= 9.0, "stroke width expands bounds: {bounds}");
  }

  #[test]
  fn test_append_merges_subpaths() {
    let mut a = PainterPath::from_rect(Rect::from_xywh(0.0, 0.0, 10.0, 10.0));
    let b = PainterPath::from_rect(Rect::from_xywh(20.0, 0.0, 10.0, 10.0));
    a.append(&b);
    assert_eq!(a.bounding_rect().right(), 30.0);
  }
}
