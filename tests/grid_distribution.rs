//! Integration tests for the grid distribution algorithm
//!
//! Exercises the public surface end to end: items report hints, the
//! engine solves, and final rectangles land in the items. A shared-handle
//! layoutable records the geometry each pass assigns so tests can assert
//! on the outcome without reaching into the engine.

use easelkit::layout::{
  DefaultLayoutStyle, GridItem, GridLayoutEngine, Layoutable, Orientation, SizeHintKind,
  SizePolicy,
};
use easelkit::{Rect, Size};
use std::cell::RefCell;
use std::rc::Rc;

/// Layoutable that reports fixed hints and records its assigned geometry
/// through a shared handle
struct Tracked {
  min: Size,
  preferred: Size,
  max: Size,
  policy: SizePolicy,
  geometry: Rc<RefCell<Option<Rect>>>,
}

impl Tracked {
  fn new(width: f32, height: f32) -> (Self, Rc<RefCell<Option<Rect>>>) {
    let handle = Rc::new(RefCell::new(None));
    (
      Self {
        min: Size::ZERO,
        preferred: Size::new(width, height),
        max: Size::new(f32::INFINITY, f32::INFINITY),
        policy: SizePolicy::PREFERRED,
        geometry: handle.clone(),
      },
      handle,
    )
  }

  fn with_policy(mut self, policy: SizePolicy) -> Self {
    self.policy = policy;
    self
  }

  fn with_min(mut self, width: f32, height: f32) -> Self {
    self.min = Size::new(width, height);
    self
  }
}

impl Layoutable for Tracked {
  fn size_hint(&self, which: SizeHintKind, orientation: Orientation, _: Option<f32>) -> f32 {
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

  fn size_policy(&self, _: Orientation) -> SizePolicy {
    self.policy
  }

  fn set_geometry(&mut self, rect: Rect) {
    *self.geometry.borrow_mut() = Some(rect);
  }
}

fn zero_spacing(engine: &mut GridLayoutEngine) {
  engine.set_spacing(Orientation::Horizontal, 0.0);
  engine.set_spacing(Orientation::Vertical, 0.0);
}

#[test]
fn stretch_scenario_from_spec() {
  // 2 columns, column 0 stretch=0 preferred=50, column 1 stretch=1
  // preferred=50, width 200: column 0 stays at 50, column 1 receives 150.
  let mut engine = GridLayoutEngine::new();
  let (a, rect_a) = Tracked::new(50.0, 20.0);
  let (b, rect_b) = Tracked::new(50.0, 20.0);
  engine.add_item(GridItem::new(Box::new(a), 0, 0));
  engine.add_item(GridItem::new(Box::new(b), 0, 1));
  zero_spacing(&mut engine);
  engine.set_line_stretch_factor(Orientation::Horizontal, 0, 0);
  engine.set_line_stretch_factor(Orientation::Horizontal, 1, 1);

  let style = DefaultLayoutStyle::new();
  engine.set_geometries(Rect::from_xywh(0.0, 0.0, 200.0, 20.0), &style);

  let a = rect_a.borrow().unwrap();
  let b = rect_b.borrow().unwrap();
  assert_eq!(a.width(), 50.0);
  assert_eq!(b.width(), 150.0);
  assert_eq!(b.left(), 50.0);
}

#[test]
fn distribution_conserves_width() {
  let mut engine = GridLayoutEngine::new();
  let mut handles = Vec::new();
  for (i, w) in [30.0, 70.0, 40.0].iter().enumerate() {
    let (item, handle) = Tracked::new(*w, 20.0);
    engine.add_item(GridItem::new(Box::new(item.with_min(10.0, 0.0)), 0, i));
    handles.push(handle);
  }
  zero_spacing(&mut engine);
  let style = DefaultLayoutStyle::new();

  for target in [60.0f32, 140.0, 300.0] {
    engine.set_geometries(Rect::from_xywh(0.0, 0.0, target, 20.0), &style);
    let sum: f32 = handles
      .iter()
      .map(|h| h.borrow().unwrap().width())
      .sum();
    assert!(
      (sum - target).abs() < 0.5,
      "target {target}: widths sum to {sum}"
    );
  }
}

#[test]
fn below_preferred_no_line_starves() {
  let mut engine = GridLayoutEngine::new();
  let (big, rect_big) = Tracked::new(100.0, 20.0);
  let (small, rect_small) = Tracked::new(30.0, 20.0);
  engine.add_item(GridItem::new(Box::new(big.with_min(10.0, 0.0)), 0, 0));
  engine.add_item(GridItem::new(Box::new(small.with_min(10.0, 0.0)), 0, 1));
  zero_spacing(&mut engine);

  let style = DefaultLayoutStyle::new();
  engine.set_geometries(Rect::from_xywh(0.0, 0.0, 80.0, 20.0), &style);

  let big = rect_big.borrow().unwrap().width();
  let small = rect_small.borrow().unwrap().width();
  assert!(big > 10.0 && small > 10.0, "neither pinned at minimum: {big}, {small}");
  assert!(big > small, "more room to grow earns a larger share");
}

#[test]
fn expanding_item_wins_over_fixed() {
  let mut engine = GridLayoutEngine::new();
  let (fixed, rect_fixed) = Tracked::new(50.0, 20.0);
  let (expanding, rect_expanding) = Tracked::new(50.0, 20.0);
  engine.add_item(GridItem::new(
    Box::new(fixed.with_policy(SizePolicy::FIXED)),
    0,
    0,
  ));
  engine.add_item(GridItem::new(
    Box::new(expanding.with_policy(SizePolicy::EXPANDING)),
    0,
    1,
  ));
  zero_spacing(&mut engine);

  let style = DefaultLayoutStyle::new();
  engine.set_geometries(Rect::from_xywh(0.0, 0.0, 400.0, 20.0), &style);
  assert_eq!(rect_fixed.borrow().unwrap().width(), 50.0);
  assert_eq!(rect_expanding.borrow().unwrap().width(), 350.0);
}

#[test]
fn size_hint_sums_preferred_plus_spacing() {
  let mut engine = GridLayoutEngine::new();
  let (a, _) = Tracked::new(40.0, 10.0);
  let (b, _) = Tracked::new(60.0, 10.0);
  engine.add_item(GridItem::new(Box::new(a), 0, 0));
  engine.add_item(GridItem::new(Box::new(b), 0, 1));
  engine.set_spacing(Orientation::Horizontal, 8.0);
  engine.set_spacing(Orientation::Vertical, 0.0);

  let style = DefaultLayoutStyle::new();
  let hint = engine.size_hint(SizeHintKind::Preferred, None, &style);
  assert_eq!(hint.width, 108.0);
  assert_eq!(hint.height, 10.0);
}

#[test]
fn repeated_layout_is_bit_identical() {
  let mut engine = GridLayoutEngine::new();
  let (a, rect_a) = Tracked::new(33.3, 17.7);
  let (b, rect_b) = Tracked::new(66.6, 17.7);
  engine.add_item(GridItem::new(Box::new(a), 0, 0));
  engine.add_item(GridItem::new(Box::new(b), 0, 1));
  zero_spacing(&mut engine);

  let style = DefaultLayoutStyle::new();
  let rect = Rect::from_xywh(0.0, 0.0, 173.0, 20.0);
  engine.set_geometries(rect, &style);
  let first = (*rect_a.borrow(), *rect_b.borrow());
  engine.set_geometries(rect, &style);
  let second = (*rect_a.borrow(), *rect_b.borrow());
  assert_eq!(first, second, "cached re-layout must not drift");
}

#[test]
fn geometry_offsets_by_contents_origin() {
  let mut engine = GridLayoutEngine::new();
  let (a, rect_a) = Tracked::new(50.0, 20.0);
  engine.add_item(GridItem::new(Box::new(a), 0, 0));
  zero_spacing(&mut engine);

  let style = DefaultLayoutStyle::new();
  engine.set_geometries(Rect::from_xywh(100.0, 200.0, 50.0, 20.0), &style);
  let rect = rect_a.borrow().unwrap();
  assert_eq!(rect.left(), 100.0);
  assert_eq!(rect.top(), 200.0);
}
