//! Grid items and the layoutable seam
//!
//! A [`GridItem`] is one occupant of the grid: a placeable thing (anything
//! implementing [`Layoutable`]) plus its grid position, spans, stretch
//! factors and alignment. The engine exclusively owns its items — removing
//! an item drops it.

use crate::geometry::Rect;
use crate::layout::layout_box::LayoutBox;
use crate::layout::policy::{Alignment, ControlType, Orientation, SizeHintKind, SizePolicy};

/// The capability an item wraps: report size hints, accept a geometry
///
/// Implementations wrap widgets, nested layouts, spacers — anything the
/// grid positions. Hints are queried per axis; `constraint` carries the
/// other axis's resolved size for items with a dynamic constraint
/// ("height-for-width" or its mirror).
pub trait Layoutable {
  /// Size hint along `orientation`, given the other axis's size if known
  fn size_hint(&self, which: SizeHintKind, orientation: Orientation, constraint: Option<f32>)
    -> f32;

  /// Sizing capabilities along `orientation`
  fn size_policy(&self, orientation: Orientation) -> SizePolicy {
    let _ = orientation;
    SizePolicy::PREFERRED
  }

  /// Classification for the style spacing hook
  fn control_type(&self) -> ControlType {
    ControlType::Default
  }

  /// Baseline split (ascent, descent) of the preferred height
  ///
  /// `None` means baseline-unaware; the item then never participates in
  /// baseline alignment.
  fn baseline(&self) -> Option<(f32, f32)> {
    None
  }

  /// True if one axis's size depends on the other axis's size
  fn has_dynamic_constraint(&self) -> bool {
    false
  }

  /// The dependent axis: `Vertical` means height-for-width
  fn dynamic_constraint_orientation(&self) -> Orientation {
    Orientation::Vertical
  }

  /// Accepts the final computed geometry
  fn set_geometry(&mut self, rect: Rect);
}

/// One grid occupant
pub struct GridItem {
  layoutable: Box<dyn Layoutable>,
  first_row: usize,
  first_column: usize,
  row_span: usize,
  column_span: usize,
  /// Explicit per-axis stretch; -1 means "derive from the size policy"
  stretches: [i32; 2],
  alignment: Alignment,
}

impl GridItem {
  /// Creates a single-cell item
  pub fn new(layoutable: Box<dyn Layoutable>, row: usize, column: usize) -> Self {
    Self::with_span(layoutable, row, column, 1, 1)
  }

  /// Creates a spanning item occupying a contiguous rectangular block
  pub fn with_span(
    layoutable: Box<dyn Layoutable>,
    row: usize,
    column: usize,
    row_span: usize,
    column_span: usize,
  ) -> Self {
    Self {
      layoutable,
      first_row: row,
      first_column: column,
      row_span: row_span.max(1),
      column_span: column_span.max(1),
      stretches: [-1, -1],
      alignment: Alignment::empty(),
    }
  }

  pub fn layoutable(&self) -> &dyn Layoutable {
    self.layoutable.as_ref()
  }

  pub fn layoutable_mut(&mut self) -> &mut dyn Layoutable {
    self.layoutable.as_mut()
  }

  /// First occupied line along `orientation` (column for horizontal)
  pub fn first_position(&self, orientation: Orientation) -> usize {
    match orientation {
      Orientation::Horizontal => self.first_column,
      Orientation::Vertical => self.first_row,
    }
  }

  /// Number of occupied lines along `orientation`
  pub fn span(&self, orientation: Orientation) -> usize {
    match orientation {
      Orientation::Horizontal => self.column_span,
      Orientation::Vertical => self.row_span,
    }
  }

  /// Last occupied line along `orientation`
  pub fn last_position(&self, orientation: Orientation) -> usize {
    self.first_position(orientation) + self.span(orientation) - 1
  }

  pub fn first_row(&self) -> usize {
    self.first_row
  }

  pub fn first_column(&self) -> usize {
    self.first_column
  }

  pub fn row_span(&self) -> usize {
    self.row_span
  }

  pub fn column_span(&self) -> usize {
    self.column_span
  }

  pub(crate) fn shift_position(&mut self, orientation: Orientation, delta: usize) {
    match orientation {
      Orientation::Horizontal => self.first_column += delta,
      Orientation::Vertical => self.first_row += delta,
    }
  }

  pub(crate) fn set_first_position(&mut self, orientation: Orientation, position: usize) {
    match orientation {
      Orientation::Horizontal => self.first_column = position,
      Orientation::Vertical => self.first_row = position,
    }
  }

  pub fn alignment(&self) -> Alignment {
    self.alignment
  }

  pub fn set_alignment(&mut self, alignment: Alignment) {
    self.alignment = alignment;
  }

  /// Sets an explicit stretch factor; negative restores policy derivation
  pub fn set_stretch_factor(&mut self, orientation: Orientation, stretch: i32) {
    self.stretches[orientation.index()] = stretch.max(-1);
  }

  /// The effective stretch factor along `orientation`
  ///
  /// Explicit non-negative values win. Otherwise the size policy decides:
  /// `EXPAND` derives stretch 1, plain `GROW` derives the greedy sentinel
  /// -1 (grow before peers with stretch 0), anything else derives 0.
  pub fn stretch_factor(&self, orientation: Orientation) -> i32 {
    let explicit = self.stretches[orientation.index()];
    if explicit >= 0 {
      return explicit;
    }
    let policy = self.layoutable.size_policy(orientation);
    if policy.contains(SizePolicy::EXPAND) {
      1
    } else if policy.contains(SizePolicy::GROW) {
      -1
    } else {
      0
    }
  }

  /// The item's sizing box along `orientation`
  ///
  /// Derived from the size hints filtered through the policy: no `SHRINK`
  /// pins the minimum at preferred, no `GROW`/`EXPAND` pins the maximum at
  /// preferred, `IGNORE` collapses preferred onto the minimum. Baseline
  /// metrics are attached for vertically baseline-aligned items.
  pub fn box_for(&self, orientation: Orientation, constraint: Option<f32>) -> LayoutBox {
    let policy = self.layoutable.size_policy(orientation);
    let preferred = self
      .layoutable
      .size_hint(SizeHintKind::Preferred, orientation, constraint);

    let minimum = if policy.contains(SizePolicy::SHRINK) {
      self
        .layoutable
        .size_hint(SizeHintKind::Minimum, orientation, constraint)
    } else {
      preferred
    };
    let maximum = if policy.intersects(SizePolicy::GROW | SizePolicy::EXPAND) {
      self
        .layoutable
        .size_hint(SizeHintKind::Maximum, orientation, constraint)
    } else {
      preferred
    };
    let preferred = if policy.contains(SizePolicy::IGNORE) {
      minimum
    } else {
      preferred
    };

    let mut result = LayoutBox::with_sizes(minimum, preferred.max(minimum), maximum.max(minimum));

    // An aligned item absorbs extra cell space itself, so it must not cap
    // its line's maximum.
    let align = match orientation {
      Orientation::Horizontal => self.alignment.horizontal(),
      Orientation::Vertical => self.alignment.vertical(),
    };
    if !align.is_empty() {
      result.maximum = f32::INFINITY;
    }

    if orientation == Orientation::Vertical && self.alignment.contains(Alignment::BASELINE) {
      if let Some((ascent, descent)) = self.layoutable.baseline() {
        if ascent >= 0.0 && descent >= 0.0 {
          result.minimum_ascent = ascent;
          result.minimum_descent = descent;
          result.minimum = result.minimum.max(ascent + descent);
        }
      }
    }
    result.normalize();
    result
  }

  /// Places the item within its cell
  ///
  /// The natural size is the cell size clipped to what the policy lets the
  /// item reach; the alignment then positions the clipped box. An empty
  /// alignment mask along an axis means "fill the cell". Baseline
  /// alignment recomputes the height from the item's own ascent/descent
  /// and positions the baseline `row_descent` above the cell bottom.
  pub fn geometry_within(
    &self,
    cell: Rect,
    row_descent: f32,
    align: Alignment,
  ) -> Rect {
    let hbox = self.box_for(Orientation::Horizontal, None);
    let vbox = self.box_for(Orientation::Vertical, None);

    let h_align = align.horizontal();
    let v_align = align.vertical();

    let width = if h_align.is_empty() {
      cell.width().min(hbox.maximum)
    } else {
      cell.width().min(self.grow_cap(Orientation::Horizontal, &hbox))
    };
    let mut height = if v_align.is_empty() {
      cell.height().min(vbox.maximum)
    } else {
      cell.height().min(self.grow_cap(Orientation::Vertical, &vbox))
    };

    let mut x = cell.left();
    let mut y = cell.top();

    if h_align.contains(Alignment::RIGHT) {
      x += cell.width() - width;
    } else if h_align.contains(Alignment::HCENTER) {
      x += (cell.width() - width) / 2.0;
    }

    if v_align.contains(Alignment::BASELINE) && vbox.minimum_descent >= 0.0 && row_descent >= 0.0 {
      let ascent = vbox.minimum - vbox.minimum_descent;
      y += cell.height() - row_descent - ascent;
      height = ascent + vbox.minimum_descent;
    } else if v_align.contains(Alignment::BOTTOM) {
      y += cell.height() - height;
    } else if v_align.contains(Alignment::VCENTER) {
      y += (cell.height() - height) / 2.0;
    }

    Rect::from_xywh(x, y, width, height)
  }

  /// The largest size the policy lets the item reach when aligned
  fn grow_cap(&self, orientation: Orientation, item_box: &LayoutBox) -> f32 {
    let policy = self.layoutable.size_policy(orientation);
    if policy.intersects(SizePolicy::GROW | SizePolicy::EXPAND) {
      item_box.maximum
    } else {
      item_box.preferred
    }
  }
}

impl std::fmt::Debug for GridItem {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.debug_struct("GridItem")
      .field("first_row", &self.first_row)
      .field("first_column", &self.first_column)
      .field("row_span", &self.row_span)
      .field("column_span", &self.column_span)
      .field("stretches", &self.stretches)
      .finish()
  }
}

// ==========================================================================
// A simple concrete layoutable for tests and spacer-style use
// ==========================================================================

/// A plain sizing record with no widget behind it
///
/// Useful as a spacer, and as the standard test double across the layout
/// test suite.
#[derive(Debug, Clone)]
pub struct SizedBox {
  pub min: crate::geometry::Size,
  pub preferred: crate::geometry::Size,
  pub max: crate::geometry::Size,
  pub policy: [SizePolicy; 2],
  pub control: ControlType,
  pub ascent_descent: Option<(f32, f32)>,
  /// Geometry from the last layout pass
  pub geometry: Option<Rect>,
}

impl SizedBox {
  /// A box preferring `width` x `height`, shrinkable to zero, growable
  /// without bound
  pub fn new(width: f32, height: f32) -> Self {
    Self {
      min: crate::geometry::Size::ZERO,
      preferred: crate::geometry::Size::new(width, height),
      max: crate::geometry::Size::new(f32::INFINITY, f32::INFINITY),
      policy: [SizePolicy::PREFERRED; 2],
      control: ControlType::Default,
      ascent_descent: None,
      geometry: None,
    }
  }

  /// A box fixed at exactly `width` x `height`
  pub fn fixed(width: f32, height: f32) -> Self {
    Self {
      min: crate::geometry::Size::new(width, height),
      preferred: crate::geometry::Size::new(width, height),
      max: crate::geometry::Size::new(width, height),
      policy: [SizePolicy::FIXED; 2],
      control: ControlType::Default,
      ascent_descent: None,
      geometry: None,
    }
  }

  pub fn with_policy(mut self, policy: SizePolicy) -> Self {
    self.policy = [policy; 2];
    self
  }

  pub fn with_control_type(mut self, control: ControlType) -> Self {
    self.control = control;
    self
  }

  pub fn with_baseline(mut self, ascent: f32, descent: f32) -> Self {
    self.ascent_descent = Some((ascent, descent));
    self
  }
}

impl Layoutable for SizedBox {
  fn size_hint(
    &self,
    which: SizeHintKind,
    orientation: Orientation,
    _constraint: Option<f32>,
  ) -> f32 {
    let size = match which {
      SizeHintKind::Minimum => self.min,
      SizeHintKind::Preferred => self.preferred,
      SizeHintKind::Maximum => self.max,
    };
    match orientation {
      Orientation::Horizontal => size.width,
      Orientation::Vertical => size.height,
    }
  }

  fn size_policy(&self, orientation: Orientation) -> SizePolicy {
    self.policy[orientation.index()]
  }

  fn control_type(&self) -> ControlType {
    self.control
  }

  fn baseline(&self) -> Option<(f32, f32)> {
    self.ascent_descent
  }

  fn set_geometry(&mut self, rect: Rect) {
    self.geometry = Some(rect);
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_stretch_derivation_from_policy() {
    let expanding = GridItem::new(
      Box::new(SizedBox::new(10.0, 10.0).with_policy(SizePolicy::EXPANDING)),
      0,
      0,
    );
    assert_eq!(expanding.stretch_factor(Orientation::Horizontal), 1);

    let preferred = GridItem::new(Box::new(SizedBox::new(10.0, 10.0)), 0, 0);
    assert_eq!(
      preferred.stretch_factor(Orientation::Horizontal),
      -1,
      "plain GROW derives the greedy sentinel"
    );

    let fixed = GridItem::new(
      Box::new(SizedBox::fixed(10.0, 10.0)),
      0,
      0,
    );
    assert_eq!(fixed.stretch_factor(Orientation::Horizontal), 0);

    let mut explicit = GridItem::new(Box::new(SizedBox::new(10.0, 10.0)), 0, 0);
    explicit.set_stretch_factor(Orientation::Horizontal, 3);
    assert_eq!(explicit.stretch_factor(Orientation::Horizontal), 3);
  }

  #[test]
  fn test_box_for_respects_policy() {
    let item = GridItem::new(
      Box::new(SizedBox {
        min: crate::geometry::Size::new(10.0, 10.0),
        preferred: crate::geometry::Size::new(50.0, 50.0),
        max: crate::geometry::Size::new(200.0, 200.0),
        policy: [SizePolicy::FIXED; 2],
        control: ControlType::Default,
        ascent_descent: None,
        geometry: None,
      }),
      0,
      0,
    );
    let b = item.box_for(Orientation::Horizontal, None);
    // Fixed policy: no shrink, no grow.
    assert_eq!(b.minimum, 50.0);
    assert_eq!(b.maximum, 50.0);
  }

  #[test]
  fn test_geometry_within_alignment() {
    let mut sized = SizedBox::new(20.0, 10.0);
    sized.max = crate::geometry::Size::new(20.0, 10.0);
    let item = GridItem::new(Box::new(sized), 0, 0);
    let cell = Rect::from_xywh(0.0, 0.0, 100.0, 50.0);

    let centered = item.geometry_within(cell, -1.0, Alignment::HCENTER | Alignment::VCENTER);
    assert_eq!(centered, Rect::from_xywh(40.0, 20.0, 20.0, 10.0));

    let right_bottom = item.geometry_within(cell, -1.0, Alignment::RIGHT | Alignment::BOTTOM);
    assert_eq!(right_bottom, Rect::from_xywh(80.0, 40.0, 20.0, 10.0));
  }

  #[test]
  fn test_geometry_within_fills_without_alignment() {
    let item = GridItem::new(Box::new(SizedBox::new(20.0, 10.0)), 0, 0);
    let cell = Rect::from_xywh(10.0, 10.0, 80.0, 30.0);
    let rect = item.geometry_within(cell, -1.0, Alignment::empty());
    assert_eq!(rect, cell, "no alignment bits means fill the cell");
  }

  #[test]
  fn test_geometry_within_baseline() {
    let mut item = GridItem::new(
      Box::new(SizedBox::fixed(20.0, 10.0).with_baseline(8.0, 2.0)),
      0,
      0,
    );
    item.set_alignment(Alignment::BASELINE);
    let cell = Rect::from_xywh(0.0, 0.0, 20.0, 30.0);
    // Row descent 5: the baseline sits 5 above the cell bottom, the item's
    // ascent is 8, so the top lands at 30 - 5 - 8 = 17.
    let rect = item.geometry_within(cell, 5.0, Alignment::BASELINE);
    assert_eq!(rect.top(), 17.0);
    assert_eq!(rect.height(), 10.0);
  }
}
