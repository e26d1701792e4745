//! Core geometry types for layout and painting
//!
//! This module provides the fundamental geometric primitives used throughout
//! the painting and layout engines. All coordinates are logical units in a
//! top-left origin coordinate system:
//! - Positive X extends to the right
//! - Positive Y extends downward
//!
//! Device-pixel mapping is the job of [`crate::transform::Transform`]; nothing
//! here knows about devices.
//!
//! # Fuzzy comparison
//!
//! Layout and transform classification deliberately use fuzzy floating-point
//! comparison ([`fuzzy_eq`], [`fuzzy_is_zero`]) so that e.g. a rotation
//! assembled from trigonometry still classifies as a quarter turn. The
//! epsilon choices are part of the observable behavior and must not be
//! "cleaned up".

use std::fmt;
use std::ops::{Add, Sub};

/// Relative epsilon used by [`fuzzy_eq`]
const FUZZY_EPSILON: f32 = 1e-5;

/// Compares two floats for approximate equality
///
/// Uses a relative epsilon scaled by the larger magnitude, so values around
/// 1000.0 tolerate proportionally more absolute error than values around 1.0.
///
/// # Examples
///
/// ```
/// use easelkit::geometry::fuzzy_eq;
///
/// assert!(fuzzy_eq(1.0, 1.0 + 1e-7));
/// assert!(!fuzzy_eq(1.0, 1.001));
/// ```
#[inline]
pub fn fuzzy_eq(a: f32, b: f32) -> bool {
  (a - b).abs() <= FUZZY_EPSILON * a.abs().max(b.abs()).max(1.0)
}

/// Returns true if the value is approximately zero
#[inline]
pub fn fuzzy_is_zero(v: f32) -> bool {
  v.abs() <= FUZZY_EPSILON
}

/// Compares two floats, treating NaN-free approximate equality as equality
///
/// Used by the layout solver when testing whether a cached size matches a
/// requested size.
#[inline]
pub fn fuzzy_compare(a: f32, b: f32) -> bool {
  fuzzy_eq(a, b)
}

/// A 2D point in logical space
///
/// # Examples
///
/// ```
/// use easelkit::Point;
///
/// let p = Point::new(10.0, 20.0);
/// assert_eq!(p.x, 10.0);
/// assert_eq!(Point::ZERO, Point::new(0.0, 0.0));
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Point {
  /// X coordinate (increases to the right)
  pub x: f32,
  /// Y coordinate (increases downward)
  pub y: f32,
}

impl Point {
  /// The origin (0, 0)
  pub const ZERO: Self = Self { x: 0.0, y: 0.0 };

  /// Creates a new point at the given coordinates
  pub const fn new(x: f32, y: f32) -> Self {
    Self { x, y }
  }

  /// Component-wise translation
  pub fn translate(self, dx: f32, dy: f32) -> Self {
    Self {
      x: self.x + dx,
      y: self.y + dy,
    }
  }

  /// Euclidean distance to another point
  pub fn distance_to(self, other: Point) -> f32 {
    let dx = other.x - self.x;
    let dy = other.y - self.y;
    (dx * dx + dy * dy).sqrt()
  }
}

impl Add for Point {
  type Output = Point;

  fn add(self, rhs: Point) -> Point {
    Point::new(self.x + rhs.x, self.y + rhs.y)
  }
}

impl Sub for Point {
  type Output = Point;

  fn sub(self, rhs: Point) -> Point {
    Point::new(self.x - rhs.x, self.y - rhs.y)
  }
}

impl fmt::Display for Point {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "({}, {})", self.x, self.y)
  }
}

/// A 2D size
///
/// Both dimensions are expected to be non-negative, though the type does not
/// enforce it; geometric degeneracies (zero/negative sizes) are treated as
/// legitimate empty geometry by consumers.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Size {
  /// Width (horizontal extent)
  pub width: f32,
  /// Height (vertical extent)
  pub height: f32,
}

impl Size {
  /// A size with zero width and height
  pub const ZERO: Self = Self {
    width: 0.0,
    height: 0.0,
  };

  /// Creates a new size
  pub const fn new(width: f32, height: f32) -> Self {
    Self { width, height }
  }

  /// Returns true if either dimension is not strictly positive
  pub fn is_empty(&self) -> bool {
    self.width <= 0.0 || self.height <= 0.0
  }

  /// Area in square units
  pub fn area(&self) -> f32 {
    self.width * self.height
  }
}

impl fmt::Display for Size {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{}x{}", self.width, self.height)
  }
}

/// A rectangle defined by origin and size
///
/// # Examples
///
/// ```
/// use easelkit::{Point, Rect, Size};
///
/// let r = Rect::from_xywh(10.0, 20.0, 100.0, 50.0);
/// assert_eq!(r.right(), 110.0);
/// assert_eq!(r.bottom(), 70.0);
/// assert!(r.contains(Point::new(50.0, 30.0)));
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Rect {
  /// Top-left corner
  pub origin: Point,
  /// Extent
  pub size: Size,
}

impl Rect {
  /// The empty rectangle at the origin
  pub const ZERO: Self = Self {
    origin: Point::ZERO,
    size: Size::ZERO,
  };

  /// Creates a rectangle from origin and size
  pub const fn new(origin: Point, size: Size) -> Self {
    Self { origin, size }
  }

  /// Creates a rectangle from x, y, width, height
  pub const fn from_xywh(x: f32, y: f32, width: f32, height: f32) -> Self {
    Self {
      origin: Point::new(x, y),
      size: Size::new(width, height),
    }
  }

  /// Creates a rectangle from left/top/right/bottom edges
  pub fn from_ltrb(left: f32, top: f32, right: f32, bottom: f32) -> Self {
    Self::from_xywh(left, top, right - left, bottom - top)
  }

  /// X coordinate of the left edge
  pub fn x(&self) -> f32 {
    self.origin.x
  }

  /// Y coordinate of the top edge
  pub fn y(&self) -> f32 {
    self.origin.y
  }

  /// Width of the rectangle
  pub fn width(&self) -> f32 {
    self.size.width
  }

  /// Height of the rectangle
  pub fn height(&self) -> f32 {
    self.size.height
  }

  /// X coordinate of the left edge
  pub fn left(&self) -> f32 {
    self.origin.x
  }

  /// Y coordinate of the top edge
  pub fn top(&self) -> f32 {
    self.origin.y
  }

  /// X coordinate of the right edge
  pub fn right(&self) -> f32 {
    self.origin.x + self.size.width
  }

  /// Y coordinate of the bottom edge
  pub fn bottom(&self) -> f32 {
    self.origin.y + self.size.height
  }

  /// Center point
  pub fn center(&self) -> Point {
    Point::new(
      self.origin.x + self.size.width / 2.0,
      self.origin.y + self.size.height / 2.0,
    )
  }

  /// Returns true if the rectangle has no area
  pub fn is_empty(&self) -> bool {
    self.size.is_empty()
  }

  /// Returns true if the point lies inside (inclusive of top/left edges)
  pub fn contains(&self, p: Point) -> bool {
    p.x >= self.left() && p.x < self.right() && p.y >= self.top() && p.y < self.bottom()
  }

  /// Returns true if the two rectangles overlap
  pub fn intersects(&self, other: &Rect) -> bool {
    self.left() < other.right()
      && other.left() < self.right()
      && self.top() < other.bottom()
      && other.top() < self.bottom()
  }

  /// Intersection of two rectangles, or `None` when disjoint
  pub fn intersection(&self, other: &Rect) -> Option<Rect> {
    let left = self.left().max(other.left());
    let top = self.top().max(other.top());
    let right = self.right().min(other.right());
    let bottom = self.bottom().min(other.bottom());
    if left < right && top < bottom {
      Some(Rect::from_ltrb(left, top, right, bottom))
    } else {
      None
    }
  }

  /// Smallest rectangle containing both inputs
  ///
  /// An empty rect is the identity for union.
  pub fn union(&self, other: &Rect) -> Rect {
    if self.is_empty() {
      return *other;
    }
    if other.is_empty() {
      return *self;
    }
    Rect::from_ltrb(
      self.left().min(other.left()),
      self.top().min(other.top()),
      self.right().max(other.right()),
      self.bottom().max(other.bottom()),
    )
  }

  /// Grows the rectangle outward by `amount` on every side
  pub fn inflate(&self, amount: f32) -> Rect {
    Rect::from_xywh(
      self.x() - amount,
      self.y() - amount,
      self.width() + 2.0 * amount,
      self.height() + 2.0 * amount,
    )
  }

  /// Translates the rectangle by the given offsets
  pub fn translate(&self, dx: f32, dy: f32) -> Rect {
    Rect::new(self.origin.translate(dx, dy), self.size)
  }

  /// Rounds outward to integer coordinates
  ///
  /// Used when a logical rectangle must cover whole device pixels, e.g. when
  /// sizing an offscreen surface for emulation.
  pub fn round_out(&self) -> Rect {
    let left = self.left().floor();
    let top = self.top().floor();
    Rect::from_ltrb(left, top, self.right().ceil(), self.bottom().ceil())
  }
}

impl fmt::Display for Rect {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(
      f,
      "[{} {} {} {}]",
      self.x(),
      self.y(),
      self.width(),
      self.height()
    )
  }
}

/// A line segment between two points
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Line {
  pub p1: Point,
  pub p2: Point,
}

impl Line {
  /// Creates a segment from two endpoints
  pub const fn new(p1: Point, p2: Point) -> Self {
    Self { p1, p2 }
  }

  /// Length of the segment
  pub fn length(&self) -> f32 {
    self.p1.distance_to(self.p2)
  }

  /// Returns true if both endpoints coincide
  pub fn is_degenerate(&self) -> bool {
    self.p1 == self.p2
  }
}
