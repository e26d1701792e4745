//! LayoutBox: the per-line sizing record
//!
//! One `LayoutBox` describes the sizing freedom of one line (row or column)
//! along one axis: minimum, preferred and maximum extents, plus the
//! baseline split (ascent/descent) for baseline-aware lines.
//!
//! The algebra is three operations:
//! - [`LayoutBox::combine`] — widening merge used when several items share
//!   a line (max of minimums, clamped max of preferreds)
//! - [`LayoutBox::add`] — summing along a run of lines, where a stretch
//!   factor of exactly 0 contributes its *preferred* size to the maximum
//!   total (non-stretchable lines cap out at preferred)
//! - [`LayoutBox::normalize`] — repairs ordering after merges; the
//!   combine-then-normalize ordering is part of the observable behavior
//!   and must not be reordered
//!
//! Invariants after `normalize()`: `0 ≤ minimum ≤ preferred ≤ maximum`,
//! and ascent/descent are either both non-negative (baseline-aware) or
//! both negative (baseline-unaware) — never mixed.

use crate::layout::policy::SizeHintKind;

/// Per-line sizing constraints along one axis
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LayoutBox {
  pub minimum: f32,
  pub preferred: f32,
  pub maximum: f32,
  /// Baseline-to-top of the minimum size; negative means baseline-unaware
  pub minimum_ascent: f32,
  /// Baseline-to-bottom of the minimum size; negative means baseline-unaware
  pub minimum_descent: f32,
}

impl LayoutBox {
  /// The empty, baseline-unaware box: `[0, 0, ∞]`
  pub fn new() -> Self {
    Self {
      minimum: 0.0,
      preferred: 0.0,
      maximum: f32::INFINITY,
      minimum_ascent: -1.0,
      minimum_descent: -1.0,
    }
  }

  /// A box with explicit min/preferred/max and no baseline
  pub fn with_sizes(minimum: f32, preferred: f32, maximum: f32) -> Self {
    Self {
      minimum,
      preferred,
      maximum,
      minimum_ascent: -1.0,
      minimum_descent: -1.0,
    }
  }

  /// A fixed box: all three sizes equal
  pub fn fixed(size: f32) -> Self {
    Self::with_sizes(size, size, size)
  }

  /// Size of the given kind
  pub fn size(&self, kind: SizeHintKind) -> f32 {
    match kind {
      SizeHintKind::Minimum => self.minimum,
      SizeHintKind::Preferred => self.preferred,
      SizeHintKind::Maximum => self.maximum,
    }
  }

  /// Replaces the size of the given kind
  pub fn set_size(&mut self, kind: SizeHintKind, value: f32) {
    match kind {
      SizeHintKind::Minimum => self.minimum = value,
      SizeHintKind::Preferred => self.preferred = value,
      SizeHintKind::Maximum => self.maximum = value,
    }
  }

  /// Returns true if this box still has the default (empty) values
  pub fn is_default(&self) -> bool {
    *self == Self::new()
  }

  /// Widening merge with another box sharing the same line
  ///
  /// Minimums and the ascent/descent pair take the maximum; the merged
  /// maximum ignores an unbounded side when the other side is bounded; the
  /// merged preferred is the max of preferreds clamped into the merged
  /// `[minimum, maximum]`.
  pub fn combine(&mut self, other: &LayoutBox) {
    self.minimum_descent = self.minimum_descent.max(other.minimum_descent);
    self.minimum_ascent = self.minimum_ascent.max(other.minimum_ascent);

    self.minimum = (self.minimum_ascent + self.minimum_descent)
      .max(self.minimum.max(other.minimum));

    let max_max = if self.maximum.is_infinite() && !other.maximum.is_infinite() {
      other.maximum
    } else if other.maximum.is_infinite() && !self.maximum.is_infinite() {
      self.maximum
    } else {
      self.maximum.max(other.maximum)
    };
    self.maximum = self.minimum.max(max_max);
    self.preferred = self
      .preferred
      .max(other.preferred)
      .clamp(self.minimum, self.maximum);
  }

  /// Accumulates another line's box into a running total
  ///
  /// `stretch` is the other line's stretch factor: a line with stretch 0
  /// contributes its preferred size to the running maximum, so a run
  /// containing only non-stretchable lines cannot report a maximum beyond
  /// its preferred total.
  pub fn add(&mut self, other: &LayoutBox, stretch: i32, spacing: f32) {
    debug_assert!(
      self.minimum_descent < 0.0,
      "running totals are baseline-unaware"
    );
    self.minimum += other.minimum + spacing;
    self.preferred += other.preferred + spacing;
    self.maximum += if stretch == 0 {
      other.preferred
    } else {
      other.maximum
    } + spacing;
  }

  /// Repairs size ordering after merges
  ///
  /// Transient `minimum > preferred` or `preferred > maximum` states can
  /// appear while multi-cell extras are folded in; this pass is what makes
  /// the final box consistent.
  pub fn normalize(&mut self) {
    self.maximum = self.maximum.max(0.0);
    self.minimum = self.minimum.clamp(0.0, self.maximum);
    self.preferred = self.preferred.clamp(self.minimum, self.maximum);
    self.minimum_descent = self.minimum_descent.min(self.minimum);

    debug_assert_eq!(
      self.minimum_ascent < 0.0,
      self.minimum_descent < 0.0,
      "ascent/descent must agree on baseline-awareness"
    );
  }
}

impl Default for LayoutBox {
  fn default() -> Self {
    Self::new()
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_normalize_orders_sizes() {
    let mut b = LayoutBox {
      minimum: 50.0,
      preferred: 20.0,
      maximum: 40.0,
      minimum_ascent: -1.0,
      minimum_descent: -1.0,
    };
    b.normalize();
    assert!(b.minimum <= b.preferred);
    assert!(b.preferred <= b.maximum);
    assert!(b.minimum >= 0.0);
  }

  #[test]
  fn test_combine_takes_max_of_minimums() {
    let mut a = LayoutBox::with_sizes(10.0, 20.0, 100.0);
    let b = LayoutBox::with_sizes(30.0, 25.0, 80.0);
    a.combine(&b);
    assert_eq!(a.minimum, 30.0);
    assert_eq!(a.preferred, 25.0);
    assert_eq!(a.maximum, 100.0);
  }

  #[test]
  fn test_combine_clamps_preferred() {
    let mut a = LayoutBox::with_sizes(10.0, 90.0, 100.0);
    let b = LayoutBox::with_sizes(10.0, 20.0, 50.0);
    a.combine(&b);
    // Preferred stays within the combined bounds.
    assert!(a.preferred >= a.minimum && a.preferred <= a.maximum);
    assert_eq!(a.preferred, 90.0);
  }

  #[test]
  fn test_combine_bounded_max_beats_unbounded() {
    let mut a = LayoutBox::new();
    let b = LayoutBox::with_sizes(5.0, 10.0, 60.0);
    a.combine(&b);
    assert_eq!(a.maximum, 60.0);
  }

  #[test]
  fn test_combine_merges_baselines() {
    let mut a = LayoutBox {
      minimum: 10.0,
      preferred: 10.0,
      maximum: 10.0,
      minimum_ascent: 8.0,
      minimum_descent: 2.0,
    };
    let b = LayoutBox {
      minimum: 5.0,
      preferred: 5.0,
      maximum: 50.0,
      minimum_ascent: 9.0,
      minimum_descent: 3.0,
    };
    a.combine(&b);
    assert_eq!(a.minimum_ascent, 9.0);
    assert_eq!(a.minimum_descent, 3.0);
    // Minimum grows to hold the merged ascent+descent.
    assert_eq!(a.minimum, 12.0);
  }

  #[test]
  fn test_add_respects_zero_stretch() {
    let mut total = LayoutBox::with_sizes(0.0, 0.0, 0.0);
    let line = LayoutBox::with_sizes(10.0, 20.0, 100.0);
    total.add(&line, 0, 0.0);
    assert_eq!(total.maximum, 20.0, "stretch 0 caps the maximum at preferred");

    let mut total = LayoutBox::with_sizes(0.0, 0.0, 0.0);
    total.add(&line, 1, 0.0);
    assert_eq!(total.maximum, 100.0);
  }

  #[test]
  fn test_add_includes_spacing() {
    let mut total = LayoutBox::with_sizes(0.0, 0.0, 0.0);
    let line = LayoutBox::with_sizes(10.0, 10.0, 10.0);
    total.add(&line, 1, 0.0);
    total.add(&line, 1, 6.0);
    assert_eq!(total.minimum, 26.0);
    assert_eq!(total.preferred, 26.0);
    assert_eq!(total.maximum, 26.0);
  }
}
