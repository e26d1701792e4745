//! 2D transforms with type classification
//!
//! A [`Transform`] is a 3×3 matrix covering the full affine-plus-perspective
//! range. Every transform carries a [`TransformType`] classification that
//! callers use to select fast paths: an identity transform skips mapping
//! entirely, a translation maps rects without corner math, and only a
//! projective transform forces the slow perspective division.
//!
//! The classification ordering is meaningful: each variant subsumes the ones
//! before it, so `ty >= TransformType::Rotate` asks "does this transform do
//! anything beyond scaling?".

use crate::geometry::{fuzzy_eq, fuzzy_is_zero, Point, Rect};

/// Classification of a transform, ordered by generality
///
/// # Examples
///
/// ```
/// use easelkit::transform::{Transform, TransformType};
///
/// assert_eq!(Transform::identity().ty(), TransformType::Identity);
/// assert_eq!(Transform::from_translate(3.0, 4.0).ty(), TransformType::Translate);
/// assert!(Transform::from_rotate_deg(30.0).ty() >= TransformType::Rotate);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum TransformType {
  /// The identity matrix
  Identity,
  /// Pure translation
  Translate,
  /// Scale (possibly with translation)
  Scale,
  /// Rotation (possibly with scale/translation)
  Rotate,
  /// Shear, or any general affine matrix
  Shear,
  /// Perspective (non-affine) transform
  Project,
}

/// A 2D transform matrix
///
/// Stored row-major:
///
/// ```text
/// | m11 m12 m13 |
/// | m21 m22 m23 |
/// | m31 m32 m33 |
/// ```
///
/// where `(m31, m32)` is the translation and `(m13, m23, m33)` the
/// projective column. Points map as row vectors: `p' = p * M`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Transform {
  pub m11: f32,
  pub m12: f32,
  pub m13: f32,
  pub m21: f32,
  pub m22: f32,
  pub m23: f32,
  pub m31: f32,
  pub m32: f32,
  pub m33: f32,
  ty: TransformType,
}

/// Returns true if `angle` in degrees is (fuzzily) an exact multiple of 90
///
/// Kept as a named predicate: quarter-turn rotations must produce exact
/// matrices so that axis-aligned rects stay axis-aligned through them.
fn is_right_angle_multiple(angle: f32) -> bool {
  let quarter_turns = angle / 90.0;
  fuzzy_eq(quarter_turns, quarter_turns.round())
}

impl Transform {
  /// The identity transform
  pub fn identity() -> Self {
    Self::from_rows(1.0, 0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0, 1.0)
  }

  /// Builds a transform from all nine components, classifying it
  pub fn from_rows(
    m11: f32,
    m12: f32,
    m13: f32,
    m21: f32,
    m22: f32,
    m23: f32,
    m31: f32,
    m32: f32,
    m33: f32,
  ) -> Self {
    let mut t = Self {
      m11,
      m12,
      m13,
      m21,
      m22,
      m23,
      m31,
      m32,
      m33,
      ty: TransformType::Identity,
    };
    t.ty = t.classify();
    t
  }

  /// Builds an affine transform from the six affine components
  pub fn from_affine(m11: f32, m12: f32, m21: f32, m22: f32, dx: f32, dy: f32) -> Self {
    Self::from_rows(m11, m12, 0.0, m21, m22, 0.0, dx, dy, 1.0)
  }

  /// A pure translation
  pub fn from_translate(dx: f32, dy: f32) -> Self {
    Self::from_affine(1.0, 0.0, 0.0, 1.0, dx, dy)
  }

  /// A pure scale about the origin
  pub fn from_scale(sx: f32, sy: f32) -> Self {
    Self::from_affine(sx, 0.0, 0.0, sy, 0.0, 0.0)
  }

  /// A rotation about the origin, angle in degrees, clockwise positive
  ///
  /// Exact quarter turns are special-cased so they produce exact matrices.
  pub fn from_rotate_deg(angle: f32) -> Self {
    if is_right_angle_multiple(angle) {
      let quarter = (angle / 90.0).round() as i32 % 4;
      let quarter = if quarter < 0 { quarter + 4 } else { quarter };
      let (sin, cos) = match quarter {
        0 => (0.0, 1.0),
        1 => (1.0, 0.0),
        2 => (0.0, -1.0),
        _ => (-1.0, 0.0),
      };
      return Self::from_affine(cos, sin, -sin, cos, 0.0, 0.0);
    }
    let radians = angle.to_radians();
    let (sin, cos) = radians.sin_cos();
    Self::from_affine(cos, sin, -sin, cos, 0.0, 0.0)
  }

  /// A shear transform
  pub fn from_shear(sh: f32, sv: f32) -> Self {
    Self::from_affine(1.0, sv, sh, 1.0, 0.0, 0.0)
  }

  fn classify(&self) -> TransformType {
    if !fuzzy_is_zero(self.m13) || !fuzzy_is_zero(self.m23) || !fuzzy_eq(self.m33, 1.0) {
      return TransformType::Project;
    }
    if !fuzzy_is_zero(self.m12) || !fuzzy_is_zero(self.m21) {
      // Distinguish pure rotation (orthogonal columns) from general shear.
      let dot = self.m11 * self.m12 + self.m21 * self.m22;
      if fuzzy_is_zero(dot) {
        return TransformType::Rotate;
      }
      return TransformType::Shear;
    }
    if !fuzzy_eq(self.m11, 1.0) || !fuzzy_eq(self.m22, 1.0) {
      return TransformType::Scale;
    }
    if !fuzzy_is_zero(self.m31) || !fuzzy_is_zero(self.m32) {
      return TransformType::Translate;
    }
    TransformType::Identity
  }

  /// The cached classification of this transform
  pub fn ty(&self) -> TransformType {
    self.ty
  }

  /// Returns true if this transform is the identity
  pub fn is_identity(&self) -> bool {
    self.ty == TransformType::Identity
  }

  /// Returns true if the transform has no perspective component
  pub fn is_affine(&self) -> bool {
    self.ty < TransformType::Project
  }

  /// Returns true if the transform is at most a scale + translation
  ///
  /// Axis-aligned rects map to axis-aligned rects through such transforms.
  pub fn preserves_axis_alignment(&self) -> bool {
    self.ty <= TransformType::Scale
  }

  /// Matrix product `self * other` (apply `self` first, then `other`)
  pub fn then(&self, other: &Transform) -> Transform {
    let a = self;
    let b = other;
    Transform::from_rows(
      a.m11 * b.m11 + a.m12 * b.m21 + a.m13 * b.m31,
      a.m11 * b.m12 + a.m12 * b.m22 + a.m13 * b.m32,
      a.m11 * b.m13 + a.m12 * b.m23 + a.m13 * b.m33,
      a.m21 * b.m11 + a.m22 * b.m21 + a.m23 * b.m31,
      a.m21 * b.m12 + a.m22 * b.m22 + a.m23 * b.m32,
      a.m21 * b.m13 + a.m22 * b.m23 + a.m23 * b.m33,
      a.m31 * b.m11 + a.m32 * b.m21 + a.m33 * b.m31,
      a.m31 * b.m12 + a.m32 * b.m22 + a.m33 * b.m32,
      a.m31 * b.m13 + a.m32 * b.m23 + a.m33 * b.m33,
    )
  }

  /// Prepends a translation (applied before this transform)
  pub fn pre_translate(&self, dx: f32, dy: f32) -> Transform {
    Transform::from_translate(dx, dy).then(self)
  }

  /// Prepends a scale
  pub fn pre_scale(&self, sx: f32, sy: f32) -> Transform {
    Transform::from_scale(sx, sy).then(self)
  }

  /// Prepends a rotation in degrees
  pub fn pre_rotate_deg(&self, angle: f32) -> Transform {
    Transform::from_rotate_deg(angle).then(self)
  }

  /// Prepends a shear
  pub fn pre_shear(&self, sh: f32, sv: f32) -> Transform {
    Transform::from_shear(sh, sv).then(self)
  }

  /// Maps a point through the transform, including perspective division
  pub fn map_point(&self, p: Point) -> Point {
    match self.ty {
      TransformType::Identity => p,
      TransformType::Translate => Point::new(p.x + self.m31, p.y + self.m32),
      TransformType::Scale => Point::new(p.x * self.m11 + self.m31, p.y * self.m22 + self.m32),
      TransformType::Rotate | TransformType::Shear => Point::new(
        p.x * self.m11 + p.y * self.m21 + self.m31,
        p.x * self.m12 + p.y * self.m22 + self.m32,
      ),
      TransformType::Project => {
        let x = p.x * self.m11 + p.y * self.m21 + self.m31;
        let y = p.x * self.m12 + p.y * self.m22 + self.m32;
        let w = p.x * self.m13 + p.y * self.m23 + self.m33;
        if fuzzy_is_zero(w) {
          Point::new(x, y)
        } else {
          Point::new(x / w, y / w)
        }
      }
    }
  }

  /// Maps a rectangle, returning the bounding rect of the mapped corners
  pub fn map_rect(&self, r: Rect) -> Rect {
    match self.ty {
      TransformType::Identity => r,
      TransformType::Translate => r.translate(self.m31, self.m32),
      TransformType::Scale => {
        let p1 = self.map_point(Point::new(r.left(), r.top()));
        let p2 = self.map_point(Point::new(r.right(), r.bottom()));
        Rect::from_ltrb(
          p1.x.min(p2.x),
          p1.y.min(p2.y),
          p1.x.max(p2.x),
          p1.y.max(p2.y),
        )
      }
      _ => {
        let corners = [
          self.map_point(Point::new(r.left(), r.top())),
          self.map_point(Point::new(r.right(), r.top())),
          self.map_point(Point::new(r.right(), r.bottom())),
          self.map_point(Point::new(r.left(), r.bottom())),
        ];
        let mut left = corners[0].x;
        let mut top = corners[0].y;
        let mut right = corners[0].x;
        let mut bottom = corners[0].y;
        for c in &corners[1..] {
          left = left.min(c.x);
          top = top.min(c.y);
          right = right.max(c.x);
          bottom = bottom.max(c.y);
        }
        Rect::from_ltrb(left, top, right, bottom)
      }
    }
  }

  /// Determinant of the upper-left 2×2 block
  ///
  /// For affine transforms this is the signed area scale factor.
  pub fn determinant(&self) -> f32 {
    self.m11 * self.m22 - self.m12 * self.m21
  }

  /// Full inverse, or `None` for singular matrices
  pub fn invert(&self) -> Option<Transform> {
    match self.ty {
      TransformType::Identity => Some(*self),
      TransformType::Translate => Some(Transform::from_translate(-self.m31, -self.m32)),
      TransformType::Scale => {
        if fuzzy_is_zero(self.m11) || fuzzy_is_zero(self.m22) {
          return None;
        }
        let sx = 1.0 / self.m11;
        let sy = 1.0 / self.m22;
        Some(Transform::from_affine(
          sx,
          0.0,
          0.0,
          sy,
          -self.m31 * sx,
          -self.m32 * sy,
        ))
      }
      TransformType::Rotate | TransformType::Shear => {
        let det = self.determinant();
        if fuzzy_is_zero(det) {
          return None;
        }
        let inv = 1.0 / det;
        let m11 = self.m22 * inv;
        let m12 = -self.m12 * inv;
        let m21 = -self.m21 * inv;
        let m22 = self.m11 * inv;
        Some(Transform::from_affine(
          m11,
          m12,
          m21,
          m22,
          -(self.m31 * m11 + self.m32 * m21),
          -(self.m31 * m12 + self.m32 * m22),
        ))
      }
      TransformType::Project => {
        // General 3x3 cofactor inversion.
        let a = self;
        let det = a.m11 * (a.m22 * a.m33 - a.m23 * a.m32) - a.m12 * (a.m21 * a.m33 - a.m23 * a.m31)
          + a.m13 * (a.m21 * a.m32 - a.m22 * a.m31);
        if fuzzy_is_zero(det) {
          return None;
        }
        let inv = 1.0 / det;
        Some(Transform::from_rows(
          (a.m22 * a.m33 - a.m23 * a.m32) * inv,
          (a.m13 * a.m32 - a.m12 * a.m33) * inv,
          (a.m12 * a.m23 - a.m13 * a.m22) * inv,
          (a.m23 * a.m31 - a.m21 * a.m33) * inv,
          (a.m11 * a.m33 - a.m13 * a.m31) * inv,
          (a.m13 * a.m21 - a.m11 * a.m23) * inv,
          (a.m21 * a.m32 - a.m22 * a.m31) * inv,
          (a.m12 * a.m31 - a.m11 * a.m32) * inv,
          (a.m11 * a.m22 - a.m12 * a.m21) * inv,
        ))
      }
    }
  }

  /// Converts the affine part to a tiny-skia transform
  ///
  /// Callers must have checked [`Transform::is_affine`]; the projective
  /// column is silently dropped here because tiny-skia has no perspective
  /// pipeline — perspective work goes through the emulation path instead.
  pub fn to_tiny_skia(&self) -> tiny_skia::Transform {
    tiny_skia::Transform::from_row(self.m11, self.m12, self.m21, self.m22, self.m31, self.m32)
  }
}

impl Default for Transform {
  fn default() -> Self {
    Self::identity()
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_classification() {
    assert_eq!(Transform::identity().ty(), TransformType::Identity);
    assert_eq!(
      Transform::from_translate(1.0, 2.0).ty(),
      TransformType::Translate
    );
    assert_eq!(Transform::from_scale(2.0, 2.0).ty(), TransformType::Scale);
    assert_eq!(
      Transform::from_rotate_deg(45.0).ty(),
      TransformType::Rotate
    );
    assert_eq!(Transform::from_shear(0.5, 0.0).ty(), TransformType::Shear);
    assert_eq!(
      Transform::from_rows(1.0, 0.0, 0.001, 0.0, 1.0, 0.0, 0.0, 0.0, 1.0).ty(),
      TransformType::Project
    );
  }

  #[test]
  fn test_quarter_turn_is_exact() {
    let t = Transform::from_rotate_deg(90.0);
    assert_eq!(t.m11, 0.0);
    assert_eq!(t.m12, 1.0);
    assert_eq!(t.m21, -1.0);
    assert_eq!(t.m22, 0.0);

    // Small numeric noise still snaps to the exact matrix.
    let noisy = Transform::from_rotate_deg(90.0 + 1e-6);
    assert_eq!(noisy.m11, 0.0);
  }

  #[test]
  fn test_map_point_translate_scale() {
    let t = Transform::from_scale(2.0, 3.0).then(&Transform::from_translate(10.0, 20.0));
    let p = t.map_point(Point::new(1.0, 1.0));
    assert_eq!(p, Point::new(12.0, 23.0));
  }

  #[test]
  fn test_map_rect_rotation_bounds() {
    let t = Transform::from_rotate_deg(90.0);
    let r = t.map_rect(Rect::from_xywh(0.0, 0.0, 10.0, 20.0));
    // (x, y) -> (-y, x) under a clockwise quarter turn of row vectors
    assert!(fuzzy_eq(r.left(), -20.0));
    assert!(fuzzy_is_zero(r.top()));
    assert!(fuzzy_eq(r.width(), 20.0));
    assert!(fuzzy_eq(r.height(), 10.0));
  }

  #[test]
  fn test_invert_round_trip() {
    let t = Transform::from_scale(2.0, 4.0)
      .then(&Transform::from_rotate_deg(30.0))
      .then(&Transform::from_translate(5.0, 6.0));
    let inv = t.invert().unwrap();
    let p = Point::new(7.0, -3.0);
    let round = inv.map_point(t.map_point(p));
    assert!(fuzzy_eq(round.x, p.x));
    assert!(fuzzy_eq(round.y, p.y));
  }

  #[test]
  fn test_singular_has_no_inverse() {
    let t = Transform::from_scale(0.0, 1.0);
    assert!(t.invert().is_none());
  }

  #[test]
  fn test_perspective_map_divides_by_w() {
    let t = Transform::from_rows(1.0, 0.0, 0.001, 0.0, 1.0, 0.0, 0.0, 0.0, 1.0);
    let p = t.map_point(Point::new(100.0, 50.0));
    // w = 1 + 100 * 0.001 = 1.1
    assert!(fuzzy_eq(p.x, 100.0 / 1.1));
    assert!(fuzzy_eq(p.y, 50.0 / 1.1));
  }
}
