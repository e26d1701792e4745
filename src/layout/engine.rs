//! GridLayoutEngine: the per-axis distribution solver
//!
//! The engine owns a sparse grid of [`GridItem`]s plus per-line parameters
//! (stretch, spacing, alignment, explicit size hints) and turns an
//! available width/height into per-line positions and sizes.
//!
//! # Pipeline
//!
//! 1. `fill_axis_data` — combine the boxes of every single-line item into
//!    its line, defer spanning items into a multi-cell map, fold in
//!    explicit per-line hints, and infer inter-line spacing from control
//!    types (including the trailing button-box convention).
//! 2. `distribute_multi_cells` — for each span, apportion whatever the
//!    span needs beyond the naturally-summed line boxes across its lines
//!    with the same solver, and fold each share back in via
//!    combine-then-normalize.
//! 3. `calculate_geometries` — the core solver for one contiguous run:
//!    below the preferred total a power-law growth factor distributes the
//!    surplus over minimum sizes (lines with more room grow
//!    super-linearly, so nothing starves at its minimum); above it,
//!    explicit stretch factors rule, with an iterative clamp-and-
//!    redistribute loop for lines that hit their maximum, a greedy
//!    sentinel (-1) for "grow before stretch-0 peers", and
//!    size-proportional growth when nobody has a stretch factor.
//!
//! Everything is memoized: per-axis totals and solved geometries are
//! cached until [`GridLayoutEngine::invalidate`], which every structural
//! mutation calls. Repeated queries at one size are O(1).

use crate::geometry::{fuzzy_compare, Rect, Size};
use crate::layout::item::GridItem;
use crate::layout::layout_box::LayoutBox;
use crate::layout::policy::{
  Alignment, ControlType, Orientation, SizeHintKind, VisualDirection,
};
use crate::layout::style::LayoutStyle;
use log::warn;
use rustc_hash::FxHashMap;

/// Super-linear growth factor for the below-preferred distribution
///
/// `desired * (available / total_desired) ^ (desired / total_desired)`:
/// lines with more room to grow receive a disproportionately larger share,
/// a deliberate anti-starvation heuristic.
fn growth_factor_below_preferred(desired: f32, sum_available: f32, sum_desired: f32) -> f32 {
  debug_assert!(sum_desired > 0.0);
  if desired <= 0.0 {
    return 0.0;
  }
  desired * (sum_available / sum_desired).powf(desired / sum_desired)
}

// ==========================================================================
// Per-axis user parameters
// ==========================================================================

/// Explicit per-line parameters for one axis (rows or columns)
#[derive(Debug, Clone, Default)]
struct LineInfo {
  /// -1 means "not set, derive from items"
  stretches: Vec<i32>,
  spacings: Vec<Option<f32>>,
  alignments: Vec<Alignment>,
  /// Explicit size hints folded into the line boxes
  boxes: Vec<LayoutBox>,
}

impl LineInfo {
  fn ensure(&mut self, count: usize) {
    if self.stretches.len() < count {
      self.stretches.resize(count, -1);
      self.spacings.resize(count, None);
      self.alignments.resize(count, Alignment::empty());
      self.boxes.resize(count, LayoutBox::new());
    }
  }

  fn stretch(&self, line: usize) -> i32 {
    self.stretches.get(line).copied().unwrap_or(-1)
  }

  fn spacing(&self, line: usize) -> Option<f32> {
    self.spacings.get(line).copied().flatten()
  }

  fn alignment(&self, line: usize) -> Alignment {
    self.alignments.get(line).copied().unwrap_or_default()
  }

  fn explicit_box(&self, line: usize) -> Option<&LayoutBox> {
    self.boxes.get(line).filter(|b| !b.is_default())
  }

  fn insert_lines(&mut self, at: usize, count: usize) {
    self.ensure(at);
    for _ in 0..count {
      self.stretches.insert(at, -1);
      self.spacings.insert(at, None);
      self.alignments.insert(at, Alignment::empty());
      self.boxes.insert(at, LayoutBox::new());
    }
  }

  fn remove_lines(&mut self, at: usize, count: usize) {
    let end = (at + count).min(self.stretches.len());
    if at >= end {
      return;
    }
    self.stretches.drain(at..end);
    self.spacings.drain(at..end);
    self.alignments.drain(at..end);
    self.boxes.drain(at..end);
  }
}

// ==========================================================================
// Per-axis computed data
// ==========================================================================

/// A spanning item's deferred contribution, keyed by `(start, span)`
#[derive(Debug, Clone)]
struct MultiCell {
  boxes: LayoutBox,
  stretch: i32,
}

/// Computed sizing data for one axis: one box/stretch/spacing per line
#[derive(Debug, Clone)]
struct AxisData {
  /// Lines with no content and no explicit hint are skipped entirely
  ignore: Vec<bool>,
  boxes: Vec<LayoutBox>,
  stretches: Vec<i32>,
  /// `spacings[i]` is the gap after line `i` (before the next non-ignored
  /// line)
  spacings: Vec<f32>,
  multi_cell: FxHashMap<(usize, usize), MultiCell>,
}

impl AxisData {
  fn new(count: usize) -> Self {
    Self {
      ignore: vec![true; count],
      boxes: vec![LayoutBox::new(); count],
      stretches: vec![0; count],
      spacings: vec![0.0; count],
      multi_cell: FxHashMap::default(),
    }
  }

  fn count(&self) -> usize {
    self.boxes.len()
  }

  /// Sums the line boxes (plus inter-line spacing) over `start..end`
  ///
  /// Uses [`LayoutBox::add`], so stretch-0 lines contribute their
  /// preferred size to the maximum total.
  fn total_box(&self, start: usize, end: usize) -> LayoutBox {
    let mut result = LayoutBox::new();
    if start < end {
      result.maximum = 0.0;
      let mut next_spacing = 0.0;
      for line in start..end {
        if self.ignore[line] {
          continue;
        }
        result.add(&self.boxes[line], self.stretches[line], next_spacing);
        next_spacing = self.spacings[line];
      }
    }
    result
  }

  /// Seeds positions/sizes from one size kind
  fn steal_box(
    &self,
    start: usize,
    end: usize,
    kind: SizeHintKind,
    positions: &mut [f32],
    sizes: &mut [f32],
  ) {
    let mut offset = 0.0;
    let mut next_spacing = 0.0;
    for (i, line) in (start..end).enumerate() {
      if self.ignore[line] {
        positions[i] = offset;
        sizes[i] = 0.0;
        continue;
      }
      offset += next_spacing;
      positions[i] = offset;
      let mut size = self.boxes[line].size(kind);
      if !size.is_finite() {
        // Unbounded lines only reach steal(Maximum) when the total is
        // bounded by the stretch-0 rule; fall back to preferred.
        size = self.boxes[line].preferred;
      }
      sizes[i] = size;
      offset += sizes[i];
      next_spacing = self.spacings[line];
    }
  }

  /// The core sizing solver for one contiguous run of lines
  pub fn calculate_geometries(
    &self,
    start: usize,
    end: usize,
    target: f32,
    positions: &mut [f32],
    sizes: &mut [f32],
    descents: Option<&mut [f32]>,
    total: &LayoutBox,
  ) {
    let n = end - start;
    if n == 0 {
      return;
    }

    if target < total.preferred {
      // Start from the minimum layout and distribute the surplus with the
      // power-law growth factor.
      self.steal_box(start, end, SizeHintKind::Minimum, positions, sizes);
      let available = target - total.minimum;
      let sum_desired = total.preferred - total.minimum;
      if available > 0.0 && sum_desired > 0.0 {
        let mut factors = vec![0.0f32; n];
        let mut sum_factors = 0.0;
        for i in 0..n {
          if self.ignore[start + i] {
            continue;
          }
          let b = &self.boxes[start + i];
          factors[i] = growth_factor_below_preferred(b.preferred - b.minimum, available, sum_desired);
          sum_factors += factors[i];
        }
        if sum_factors > 0.0 {
          for i in 0..n {
            if self.ignore[start + i] || factors[i] <= 0.0 {
              continue;
            }
            let share = available * factors[i] / sum_factors;
            sizes[i] = (sizes[i] + share).min(self.boxes[start + i].maximum);
          }
        }
      }
    } else {
      let beyond_max = target >= total.maximum;
      let seed = if beyond_max {
        SizeHintKind::Maximum
      } else {
        SizeHintKind::Preferred
      };
      self.steal_box(start, end, seed, positions, sizes);

      // Recompute the stolen total from the arrays: per-line raw maxima
      // can exceed the stretch-capped total.
      let mut stolen = 0.0;
      let mut next_spacing = 0.0;
      for i in 0..n {
        if self.ignore[start + i] {
          continue;
        }
        stolen += next_spacing + sizes[i];
        next_spacing = self.spacings[start + i];
      }
      let remaining = target - stolen;
      if remaining > 0.0 {
        self.distribute_surplus(start, n, sizes, remaining);
      } else if remaining < 0.0 {
        self.retract_excess(start, n, sizes, -remaining);
      }
    }

    // Final positions from the final sizes.
    let mut offset = 0.0;
    let mut next_spacing = 0.0;
    for i in 0..n {
      if self.ignore[start + i] {
        positions[i] = offset;
        continue;
      }
      offset += next_spacing;
      positions[i] = offset;
      offset += sizes[i];
      next_spacing = self.spacings[start + i];
    }

    if let Some(descents) = descents {
      for i in 0..n {
        if self.ignore[start + i] {
          descents[i] = -1.0;
          continue;
        }
        let b = &self.boxes[start + i];
        descents[i] = if b.minimum_descent < 0.0 {
          -1.0
        } else {
          // Pin the descent, recentered so ascent + descent == size; any
          // extra height becomes added descent.
          let descent = b.minimum_descent.min(sizes[i]);
          descent.max(sizes[i] - b.minimum_ascent)
        };
      }
    }
  }

  /// Distributes surplus above the preferred layout
  ///
  /// Explicit positive stretch factors rule when any line has one; the
  /// greedy sentinel (-1) absorbs before stretch-0 peers; with no stretch
  /// information at all, bigger lines grow more. Lines hitting their
  /// maximum are clamped and the loop redistributes the overflow.
  fn distribute_surplus(&self, start: usize, n: usize, sizes: &mut [f32], surplus: f32) {
    let eligible = |i: usize| !self.ignore[start + i];
    let has_positive = (0..n).any(|i| eligible(i) && self.stretches[start + i] > 0);
    let any_negative = (0..n).any(|i| eligible(i) && self.stretches[start + i] < 0);

    let mut capped = vec![false; n];
    let mut remaining = surplus;
    let mut rounds = 0;
    while remaining > 1e-4 && rounds < 2 * n + 8 {
      rounds += 1;
      let mut factors = vec![0.0f32; n];
      let mut sum = 0.0;
      for i in 0..n {
        if !eligible(i) || capped[i] {
          continue;
        }
        let stretch = self.stretches[start + i];
        factors[i] = if has_positive {
          stretch.max(0) as f32
        } else if any_negative {
          if stretch < 0 {
            sizes[i].max(1.0)
          } else {
            0.0
          }
        } else {
          sizes[i].max(1.0)
        };
        sum += factors[i];
      }

      if sum <= 0.0 {
        // Nobody who may grow can: the leftover stays unused. The target
        // was infeasible under the per-line maxima and stretch rules.
        return;
      }

      let mut distributed = 0.0;
      for i in 0..n {
        if factors[i] <= 0.0 {
          continue;
        }
        let share = remaining * factors[i] / sum;
        let max = self.boxes[start + i].maximum;
        let grown = (sizes[i] + share).min(max);
        distributed += grown - sizes[i];
        if grown >= max - 1e-6 {
          capped[i] = true;
        }
        sizes[i] = grown;
      }
      if distributed <= 1e-6 {
        return;
      }
      remaining -= distributed;
    }
  }

  /// Pulls sizes back toward preferred when the seeded layout overshoots
  fn retract_excess(&self, start: usize, n: usize, sizes: &mut [f32], deficit: f32) {
    let mut sum_excess = 0.0;
    for i in 0..n {
      if self.ignore[start + i] {
        continue;
      }
      sum_excess += (sizes[i] - self.boxes[start + i].preferred).max(0.0);
    }
    if sum_excess <= 0.0 {
      return;
    }
    for i in 0..n {
      if self.ignore[start + i] {
        continue;
      }
      let excess = (sizes[i] - self.boxes[start + i].preferred).max(0.0);
      sizes[i] -= deficit.min(sum_excess) * excess / sum_excess;
    }
  }

  /// Folds deferred spanning items back into the per-line boxes
  ///
  /// For each size kind where the span needs more than the naturally
  /// summed lines provide, the extra is apportioned with the same solver
  /// and merged per line with `combine`; the trailing `normalize` pass is
  /// what repairs any transiently inconsistent intermediate box, so the
  /// ordering here is deliberate.
  fn distribute_multi_cells(&mut self) {
    let mut entries: Vec<((usize, usize), MultiCell)> = self.multi_cell.drain().collect();
    if entries.is_empty() {
      return;
    }
    entries.sort_by_key(|(key, _)| *key);

    for ((start, span), cell) in entries {
      let end = start + span;
      let total = self.total_box(start, end);
      let mut extras = vec![LayoutBox::new(); span];
      let mut positions = vec![0.0f32; span];
      let mut new_sizes = vec![0.0f32; span];

      for kind in SizeHintKind::ALL {
        let required = cell.boxes.size(kind);
        if !required.is_finite() {
          continue;
        }
        let extra = required - total.size(kind);
        if extra > 0.0 {
          self.calculate_geometries(
            start,
            end,
            required,
            &mut positions,
            &mut new_sizes,
            None,
            &total,
          );
          for k in 0..span {
            extras[k].set_size(kind, new_sizes[k]);
          }
        }
      }

      for k in 0..span {
        self.boxes[start + k].combine(&extras[k]);
        if cell.stretch != 0 {
          self.stretches[start + k] = self.stretches[start + k].max(cell.stretch);
        }
      }
    }

    for b in &mut self.boxes {
      b.normalize();
    }
  }
}

/// One solved axis: positions and sizes per line, descents for rows
#[derive(Debug, Clone)]
struct SolvedAxis {
  positions: Vec<f32>,
  sizes: Vec<f32>,
  descents: Option<Vec<f32>>,
}

impl SolvedAxis {
  /// Total extent covered by `span` lines starting at `first`, including
  /// the spacing between them
  fn span_size(&self, first: usize, span: usize) -> f32 {
    let last = first + span - 1;
    if last >= self.sizes.len() {
      return 0.0;
    }
    (self.positions[last] + self.sizes[last]) - self.positions[first]
  }
}

#[derive(Debug, Clone)]
struct GeometryCache {
  size: Size,
  style_generation: u64,
  columns: SolvedAxis,
  rows: SolvedAxis,
}

// ==========================================================================
// The engine
// ==========================================================================

/// Constraint-based grid layout solver
///
/// # Examples
///
/// ```
/// use easelkit::layout::{
///   DefaultLayoutStyle, GridItem, GridLayoutEngine, Orientation, SizedBox,
/// };
/// use easelkit::Rect;
///
/// let mut engine = GridLayoutEngine::new();
/// engine.add_item(GridItem::new(Box::new(SizedBox::new(50.0, 20.0)), 0, 0));
/// engine.add_item(GridItem::new(Box::new(SizedBox::new(50.0, 20.0)), 0, 1));
/// engine.set_line_stretch_factor(Orientation::Horizontal, 1, 1);
///
/// let style = DefaultLayoutStyle::new();
/// engine.set_geometries(Rect::from_xywh(0.0, 0.0, 200.0, 20.0), &style);
/// ```
pub struct GridLayoutEngine {
  items: Vec<GridItem>,
  /// Row-major reverse index: `grid[row * column_count + column]`
  grid: Vec<Option<usize>>,
  row_count: usize,
  column_count: usize,
  /// Indexed by `Orientation::index()`: horizontal = columns
  line_infos: [LineInfo; 2],
  default_spacings: [Option<f32>; 2],
  visual_direction: VisualDirection,

  /// Memoized unconstrained totals, keyed by the style generation
  cached_total_boxes: [Option<(u64, LayoutBox)>; 2],
  geometry_cache: Option<GeometryCache>,
  cached_constraint: Option<Option<Orientation>>,
  constraint_conflict_warned: bool,
}

impl GridLayoutEngine {
  pub fn new() -> Self {
    Self {
      items: Vec::new(),
      grid: Vec::new(),
      row_count: 0,
      column_count: 0,
      line_infos: [LineInfo::default(), LineInfo::default()],
      default_spacings: [None, None],
      visual_direction: VisualDirection::LeftToRight,
      cached_total_boxes: [None, None],
      geometry_cache: None,
      cached_constraint: None,
      constraint_conflict_warned: false,
    }
  }

  /// Number of lines along `orientation` (columns for horizontal)
  pub fn line_count(&self, orientation: Orientation) -> usize {
    match orientation {
      Orientation::Horizontal => self.column_count,
      Orientation::Vertical => self.row_count,
    }
  }

  pub fn row_count(&self) -> usize {
    self.row_count
  }

  pub fn column_count(&self) -> usize {
    self.column_count
  }

  pub fn item_count(&self) -> usize {
    self.items.len()
  }

  pub fn item_at(&self, index: usize) -> Option<&GridItem> {
    self.items.get(index)
  }

  /// The item occupying `(row, column)`, spans included
  pub fn item_at_position(&self, row: usize, column: usize) -> Option<&GridItem> {
    if row >= self.row_count || column >= self.column_count {
      return None;
    }
    self.grid[row * self.column_count + column].map(|i| &self.items[i])
  }

  /// Adds an item, growing the grid as needed
  ///
  /// Adding over an occupied cell is a contract violation: warned, and the
  /// item is dropped.
  pub fn add_item(&mut self, item: GridItem) {
    let last_row = item.first_row() + item.row_span();
    let last_column = item.first_column() + item.column_span();
    let new_rows = self.row_count.max(last_row);
    let new_columns = self.column_count.max(last_column);

    for r in item.first_row()..last_row {
      for c in item.first_column()..last_column {
        if r < self.row_count && c < self.column_count {
          if self.grid[r * self.column_count + c].is_some() {
            warn!("GridLayoutEngine::add_item: cell ({r}, {c}) already taken");
            return;
          }
        }
      }
    }

    self.row_count = new_rows;
    self.column_count = new_columns;
    self.items.push(item);
    self.rebuild_grid();
    self.invalidate();
  }

  /// Removes (and drops) the item at `index`
  pub fn remove_item(&mut self, index: usize) {
    if index >= self.items.len() {
      warn!("GridLayoutEngine::remove_item: index {index} out of range");
      return;
    }
    self.items.remove(index);
    self.rebuild_grid();
    self.invalidate();
  }

  /// Inserts `count` empty lines before `at`
  pub fn insert_lines(&mut self, orientation: Orientation, at: usize, count: usize) {
    if count == 0 {
      return;
    }
    for item in &mut self.items {
      if item.first_position(orientation) >= at {
        item.shift_position(orientation, count);
      }
    }
    self.line_infos[orientation.index()].insert_lines(at, count);
    match orientation {
      Orientation::Horizontal => self.column_count += count,
      Orientation::Vertical => self.row_count += count,
    }
    self.rebuild_grid();
    self.invalidate();
  }

  /// Removes `count` lines starting at `at`, dropping items on them
  pub fn remove_lines(&mut self, orientation: Orientation, at: usize, count: usize) {
    if count == 0 {
      return;
    }
    let end = at + count;
    self
      .items
      .retain(|item| item.last_position(orientation) < at || item.first_position(orientation) >= end);
    self.shift_back(orientation, end, count);
    self.line_infos[orientation.index()].remove_lines(at, count);
    match orientation {
      Orientation::Horizontal => self.column_count = self.column_count.saturating_sub(count),
      Orientation::Vertical => self.row_count = self.row_count.saturating_sub(count),
    }
    self.rebuild_grid();
    self.invalidate();
  }

  fn shift_back(&mut self, orientation: Orientation, from: usize, count: usize) {
    for item in &mut self.items {
      let first = item.first_position(orientation);
      if first >= from {
        item.set_first_position(orientation, first - count);
      }
    }
  }

  fn rebuild_grid(&mut self) {
    self.grid = vec![None; self.row_count * self.column_count];
    for (index, item) in self.items.iter().enumerate() {
      for r in item.first_row()..item.first_row() + item.row_span() {
        for c in item.first_column()..item.first_column() + item.column_span() {
          self.grid[r * self.column_count + c] = Some(index);
        }
      }
    }
  }

  /// Explicit stretch factor for a line; negative clears back to derived
  pub fn set_line_stretch_factor(&mut self, orientation: Orientation, line: usize, stretch: i32) {
    let info = &mut self.line_infos[orientation.index()];
    info.ensure(line + 1);
    info.stretches[line] = stretch.max(-1);
    self.invalidate();
  }

  /// Default spacing for the whole axis, overriding the style
  pub fn set_spacing(&mut self, orientation: Orientation, spacing: f32) {
    self.default_spacings[orientation.index()] = Some(spacing.max(0.0));
    self.invalidate();
  }

  /// Explicit spacing after one line; `None` restores inference
  pub fn set_line_spacing(&mut self, orientation: Orientation, line: usize, spacing: Option<f32>) {
    let info = &mut self.line_infos[orientation.index()];
    info.ensure(line + 1);
    info.spacings[line] = spacing;
    self.invalidate();
  }

  /// Default alignment for items on one line
  pub fn set_line_alignment(&mut self, orientation: Orientation, line: usize, alignment: Alignment) {
    let info = &mut self.line_infos[orientation.index()];
    info.ensure(line + 1);
    info.alignments[line] = alignment;
    self.invalidate();
  }

  /// Explicit size hint for one line, merged into its computed box
  pub fn set_line_size_hint(
    &mut self,
    orientation: Orientation,
    line: usize,
    kind: SizeHintKind,
    size: f32,
  ) {
    let info = &mut self.line_infos[orientation.index()];
    info.ensure(line + 1);
    info.boxes[line].set_size(kind, size.max(0.0));
    match orientation {
      Orientation::Horizontal => self.column_count = self.column_count.max(line + 1),
      Orientation::Vertical => self.row_count = self.row_count.max(line + 1),
    }
    self.rebuild_grid();
    self.invalidate();
  }

  pub fn visual_direction(&self) -> VisualDirection {
    self.visual_direction
  }

  pub fn set_visual_direction(&mut self, direction: VisualDirection) {
    if self.visual_direction != direction {
      self.visual_direction = direction;
      self.geometry_cache = None;
    }
  }

  /// Drops every memoized result
  ///
  /// Called by every structural mutation; pure queries never call it.
  pub fn invalidate(&mut self) {
    self.cached_total_boxes = [None, None];
    self.geometry_cache = None;
    self.cached_constraint = None;
  }

  /// First line along `orientation` occupied by any item
  pub fn effective_first_line(&self, orientation: Orientation) -> Option<usize> {
    self
      .items
      .iter()
      .map(|item| item.first_position(orientation))
      .min()
  }

  /// Last line along `orientation` occupied by any item
  pub fn effective_last_line(&self, orientation: Orientation) -> Option<usize> {
    self
      .items
      .iter()
      .map(|item| item.last_position(orientation))
      .max()
  }

  // ------------------------------------------------------------------
  // Dynamic constraints
  // ------------------------------------------------------------------

  /// True if any item's size in one axis depends on the other axis
  pub fn has_dynamic_constraint(&mut self) -> bool {
    self.constraint_orientation().is_some()
  }

  /// The single consistent constraint orientation, if one exists
  ///
  /// Items disagreeing on the orientation are a reported inconsistency:
  /// warned once, and the layout falls back to unconstrained solving.
  pub fn constraint_orientation(&mut self) -> Option<Orientation> {
    if let Some(cached) = self.cached_constraint {
      return cached;
    }
    let mut result: Option<Orientation> = None;
    let mut conflict = false;
    for item in &self.items {
      if !item.layoutable().has_dynamic_constraint() {
        continue;
      }
      let orientation = item.layoutable().dynamic_constraint_orientation();
      match result {
        None => result = Some(orientation),
        Some(previous) if previous != orientation => {
          conflict = true;
          break;
        }
        _ => {}
      }
    }
    if conflict {
      if !self.constraint_conflict_warned {
        warn!(
          "GridLayoutEngine: items disagree on dynamic constraint orientation; \
           treating the layout as unconstrained"
        );
        self.constraint_conflict_warned = true;
      }
      result = None;
    }
    self.cached_constraint = Some(result);
    result
  }

  // ------------------------------------------------------------------
  // Axis data
  // ------------------------------------------------------------------

  /// Control types of the items occupying `line`
  fn line_control_types(&self, orientation: Orientation, line: usize) -> Vec<ControlType> {
    self
      .items
      .iter()
      .filter(|item| {
        item.first_position(orientation) <= line && line <= item.last_position(orientation)
      })
      .map(|item| item.layoutable().control_type())
      .collect()
  }

  /// The trailing-button-box detector
  ///
  /// A trailing row (or pair of rows) whose items are all button-like,
  /// sitting beneath non-button content, conventionally hugs the window
  /// edge: the gap above it uses the window margin instead of the
  /// style-computed control spacing. The detector looks at exactly the
  /// last and second-to-last non-ignored rows.
  fn trailing_button_box_gap(&self, data: &AxisData) -> Option<usize> {
    let is_button_row = |line: usize| {
      let types = self.line_control_types(Orientation::Vertical, line);
      !types.is_empty() && types.iter().all(|t| t.is_button_like())
    };

    let occupied: Vec<usize> = (0..data.count()).filter(|&l| !data.ignore[l]).collect();
    if occupied.len() < 2 {
      return None;
    }

    let last = *occupied.last().unwrap();
    if !is_button_row(last) {
      return None;
    }
    let mut boundary_index = occupied.len() - 2;
    if occupied.len() >= 3 && is_button_row(occupied[boundary_index]) {
      // A pair of trailing button rows hugs the edge together.
      boundary_index -= 1;
    }
    let above = occupied[boundary_index];
    if is_button_row(above) {
      // Button content all the way up: no boundary to treat specially.
      return None;
    }
    Some(above)
  }

  /// Builds the computed per-line data for one axis
  fn fill_axis_data(
    &self,
    orientation: Orientation,
    style: &dyn LayoutStyle,
    other: Option<&SolvedAxis>,
  ) -> AxisData {
    let count = self.line_count(orientation);
    let info = &self.line_infos[orientation.index()];
    let mut data = AxisData::new(count);

    // Track per-line derived stretch separately from explicit overrides.
    let mut derived: Vec<Option<i32>> = vec![None; count];

    for item in &self.items {
      let start = item.first_position(orientation);
      let span = item.span(orientation);
      let constraint = if item.layoutable().has_dynamic_constraint()
        && item.layoutable().dynamic_constraint_orientation() == orientation
      {
        other.map(|solved| {
          solved.span_size(
            item.first_position(orientation.other()),
            item.span(orientation.other()),
          )
        })
      } else {
        None
      };
      let item_box = item.box_for(orientation, constraint);
      let stretch = item.stretch_factor(orientation);

      if span == 1 {
        data.boxes[start].combine(&item_box);
        derived[start] = Some(derived[start].map_or(stretch, |s| s.max(stretch)));
        data.ignore[start] = false;
      } else {
        let entry = data
          .multi_cell
          .entry((start, span))
          .or_insert_with(|| MultiCell {
            boxes: LayoutBox::new(),
            stretch: 0,
          });
        entry.boxes.combine(&item_box);
        entry.stretch = entry.stretch.max(stretch);
        for line in start..start + span {
          data.ignore[line] = false;
        }
      }
    }

    // Explicit per-line hints and stretch overrides.
    for line in 0..count {
      if let Some(explicit) = info.explicit_box(line) {
        data.boxes[line].combine(explicit);
        data.ignore[line] = false;
      }
      let explicit_stretch = info.stretch(line);
      data.stretches[line] = if explicit_stretch >= 0 {
        explicit_stretch
      } else {
        derived[line].unwrap_or(0)
      };
    }

    for b in &mut data.boxes {
      b.normalize();
    }

    // Inter-line spacing: explicit, then axis default, then style-derived
    // from the adjacent control types.
    for line in 0..count.saturating_sub(1) {
      data.spacings[line] = if let Some(explicit) = info.spacing(line) {
        explicit
      } else if let Some(default) = self.default_spacings[orientation.index()] {
        default
      } else {
        let a = self.line_control_types(orientation, line);
        let b = self.line_control_types(orientation, line + 1);
        if a.is_empty() || b.is_empty() {
          style.default_spacing(orientation)
        } else {
          let mut spacing = 0.0f32;
          for ta in &a {
            for tb in &b {
              spacing = spacing.max(style.combined_spacing(*ta, *tb, orientation));
            }
          }
          spacing
        }
      };
    }

    if orientation == Orientation::Vertical {
      if let Some(gap_line) = self.trailing_button_box_gap(&data) {
        if info.spacing(gap_line).is_none() && self.default_spacings[orientation.index()].is_none()
        {
          data.spacings[gap_line] = style.window_margin(Orientation::Vertical);
        }
      }
    }

    data.distribute_multi_cells();
    data
  }

  fn solve_axis(&self, data: &AxisData, target: f32, with_descents: bool) -> SolvedAxis {
    let count = data.count();
    let mut positions = vec![0.0f32; count];
    let mut sizes = vec![0.0f32; count];
    let mut descents = if with_descents {
      Some(vec![-1.0f32; count])
    } else {
      None
    };
    let total = data.total_box(0, count);
    data.calculate_geometries(
      0,
      count,
      target,
      &mut positions,
      &mut sizes,
      descents.as_deref_mut(),
      &total,
    );
    SolvedAxis {
      positions,
      sizes,
      descents,
    }
  }

  // ------------------------------------------------------------------
  // Queries
  // ------------------------------------------------------------------

  /// Total size hint of the grid
  ///
  /// With a dynamic constraint orientation and a constraint size, the
  /// unconstrained axis is solved first and fed into the constrained
  /// axis's item queries; otherwise both axes are independent (and their
  /// totals are memoized).
  pub fn size_hint(
    &mut self,
    which: SizeHintKind,
    constraint: Option<Size>,
    style: &dyn LayoutStyle,
  ) -> Size {
    let constraint_orientation = self.constraint_orientation();

    if let (Some(orientation), Some(size)) = (constraint_orientation, constraint) {
      return match orientation {
        Orientation::Vertical => {
          // Height-for-width: columns first at the constraint width.
          let columns = self.fill_axis_data(Orientation::Horizontal, style, None);
          let solved_columns = self.solve_axis(&columns, size.width, false);
          let rows = self.fill_axis_data(Orientation::Vertical, style, Some(&solved_columns));
          let column_total = columns.total_box(0, columns.count());
          let row_total = rows.total_box(0, rows.count());
          Size::new(column_total.size(which), row_total.size(which))
        }
        Orientation::Horizontal => {
          let rows = self.fill_axis_data(Orientation::Vertical, style, None);
          let solved_rows = self.solve_axis(&rows, size.height, false);
          let columns = self.fill_axis_data(Orientation::Horizontal, style, Some(&solved_rows));
          let column_total = columns.total_box(0, columns.count());
          let row_total = rows.total_box(0, rows.count());
          Size::new(column_total.size(which), row_total.size(which))
        }
      };
    }

    let horizontal = self.ensure_total_box(Orientation::Horizontal, style);
    let vertical = self.ensure_total_box(Orientation::Vertical, style);
    Size::new(horizontal.size(which), vertical.size(which))
  }

  fn ensure_total_box(&mut self, orientation: Orientation, style: &dyn LayoutStyle) -> LayoutBox {
    if let Some((generation, cached)) = self.cached_total_boxes[orientation.index()] {
      if generation == style.generation() {
        return cached;
      }
    }
    let data = self.fill_axis_data(orientation, style, None);
    let total = data.total_box(0, data.count());
    self.cached_total_boxes[orientation.index()] = Some((style.generation(), total));
    total
  }

  /// Solves both axes for `size`, memoized until the size, the style
  /// generation, or the structure changes
  fn ensure_geometries(&mut self, size: Size, style: &dyn LayoutStyle) {
    if let Some(cache) = &self.geometry_cache {
      if fuzzy_compare(cache.size.width, size.width)
        && fuzzy_compare(cache.size.height, size.height)
        && cache.style_generation == style.generation()
      {
        return;
      }
    }

    let constraint_orientation = self.constraint_orientation();
    let (columns, rows) = match constraint_orientation {
      Some(Orientation::Horizontal) => {
        // Width-for-height: rows first.
        let row_data = self.fill_axis_data(Orientation::Vertical, style, None);
        let rows = self.solve_axis(&row_data, size.height, true);
        let column_data = self.fill_axis_data(Orientation::Horizontal, style, Some(&rows));
        let columns = self.solve_axis(&column_data, size.width, false);
        (columns, rows)
      }
      _ => {
        let column_data = self.fill_axis_data(Orientation::Horizontal, style, None);
        let columns = self.solve_axis(&column_data, size.width, false);
        let other = if constraint_orientation == Some(Orientation::Vertical) {
          Some(&columns)
        } else {
          None
        };
        let row_data = self.fill_axis_data(Orientation::Vertical, style, other);
        let rows = self.solve_axis(&row_data, size.height, true);
        (columns, rows)
      }
    };

    self.geometry_cache = Some(GeometryCache {
      size,
      style_generation: style.generation(),
      columns,
      rows,
    });
  }

  /// Effective alignment: item bits, falling back to per-line defaults
  fn effective_alignment(&self, item: &GridItem) -> Alignment {
    let mut align = item.alignment();
    if align.horizontal().is_empty() {
      align |= self.line_infos[Orientation::Horizontal.index()]
        .alignment(item.first_column())
        .horizontal();
    }
    if align.vertical().is_empty() {
      align |= self.line_infos[Orientation::Vertical.index()]
        .alignment(item.first_row())
        .vertical();
    }
    align
  }

  /// Runs the solver and writes final rectangles into every item
  ///
  /// Item rects are cell rects (spanning items cover through their last
  /// line) clipped and aligned by each item's own policy; right-to-left
  /// direction mirrors x positions around the contents rect as a pure
  /// post-process.
  pub fn set_geometries(&mut self, contents_rect: Rect, style: &dyn LayoutStyle) {
    self.ensure_geometries(contents_rect.size, style);
    let cache = self.geometry_cache.as_ref().expect("just ensured");

    struct Placement {
      cell: Rect,
      row_descent: f32,
      align: Alignment,
    }

    let placements: Vec<Placement> = self
      .items
      .iter()
      .map(|item| {
        let col = item.first_column();
        let row = item.first_row();
        let x = cache.columns.positions[col];
        let y = cache.rows.positions[row];
        let width = cache.columns.span_size(col, item.column_span());
        let height = cache.rows.span_size(row, item.row_span());

        let row_descent = if item.row_span() == 1 {
          cache
            .rows
            .descents
            .as_ref()
            .map(|d| d[row])
            .unwrap_or(-1.0)
        } else {
          -1.0
        };

        let mut cell = Rect::from_xywh(
          contents_rect.left() + x,
          contents_rect.top() + y,
          width,
          height,
        );
        if self.visual_direction == VisualDirection::RightToLeft {
          let mirrored_left = contents_rect.left() + contents_rect.right() - cell.right();
          cell = Rect::from_xywh(mirrored_left, cell.top(), cell.width(), cell.height());
        }

        Placement {
          cell,
          row_descent,
          align: self.effective_alignment(item),
        }
      })
      .collect();

    for (item, placement) in self.items.iter_mut().zip(placements) {
      let rect = item.geometry_within(placement.cell, placement.row_descent, placement.align);
      item.layoutable_mut().set_geometry(rect);
    }
  }
}

impl Default for GridLayoutEngine {
  fn default() -> Self {
    Self::new()
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::layout::item::SizedBox;
  use crate::layout::policy::SizePolicy;
  use crate::layout::style::DefaultLayoutStyle;

  fn style() -> DefaultLayoutStyle {
    DefaultLayoutStyle::new()
  }

  fn engine_with_row(widths: &[f32]) -> GridLayoutEngine {
    let mut engine = GridLayoutEngine::new();
    for (i, w) in widths.iter().enumerate() {
      engine.add_item(GridItem::new(Box::new(SizedBox::new(*w, 20.0)), 0, i));
    }
    engine.set_spacing(Orientation::Horizontal, 0.0);
    engine.set_spacing(Orientation::Vertical, 0.0);
    engine
  }

  fn solved_columns(engine: &mut GridLayoutEngine, width: f32) -> Vec<f32> {
    let style = style();
    engine.set_geometries(Rect::from_xywh(0.0, 0.0, width, 20.0), &style);
    let cache = engine.geometry_cache.as_ref().unwrap();
    cache.columns.sizes.clone()
  }

  #[test]
  fn test_stretch_scenario_from_spec() {
    // Column 0 stretch 0 preferred 50, column 1 stretch 1 preferred 50,
    // width 200: column 0 stays at 50, column 1 receives 150.
    let mut engine = engine_with_row(&[50.0, 50.0]);
    engine.set_line_stretch_factor(Orientation::Horizontal, 0, 0);
    engine.set_line_stretch_factor(Orientation::Horizontal, 1, 1);
    let sizes = solved_columns(&mut engine, 200.0);
    assert_eq!(sizes[0], 50.0);
    assert_eq!(sizes[1], 150.0);
  }

  #[test]
  fn test_distribution_conserves_target() {
    let mut engine = engine_with_row(&[30.0, 50.0, 20.0]);
    for target in [100.0f32, 150.0, 260.0] {
      let sizes = solved_columns(&mut engine, target);
      let sum: f32 = sizes.iter().sum();
      assert!(
        (sum - target).abs() < 0.5,
        "target {target}: sizes {sizes:?} sum to {sum}"
      );
    }
  }

  #[test]
  fn test_below_preferred_distribution_avoids_starvation() {
    // One line with lots of room to grow, one with little: both should
    // leave their minimums when space is between minimum and preferred.
    let mut engine = GridLayoutEngine::new();
    let mut big = SizedBox::new(100.0, 20.0);
    big.min = Size::new(10.0, 0.0);
    let mut small = SizedBox::new(30.0, 20.0);
    small.min = Size::new(10.0, 0.0);
    engine.add_item(GridItem::new(Box::new(big), 0, 0));
    engine.add_item(GridItem::new(Box::new(small), 0, 1));
    engine.set_spacing(Orientation::Horizontal, 0.0);
    engine.set_spacing(Orientation::Vertical, 0.0);

    let sizes = solved_columns(&mut engine, 80.0);
    assert!(sizes[0] > 10.0, "large line grows: {sizes:?}");
    assert!(sizes[1] > 10.0, "small line must not starve: {sizes:?}");
    assert!(
      sizes[0] > sizes[1],
      "more room to grow earns a larger share: {sizes:?}"
    );
    assert!(((sizes[0] + sizes[1]) - 80.0).abs() < 0.5);
  }

  #[test]
  fn test_stretch_monotonicity() {
    let mut shares = Vec::new();
    for stretch in [1, 2, 5] {
      let mut engine = engine_with_row(&[50.0, 50.0]);
      engine.set_line_stretch_factor(Orientation::Horizontal, 0, stretch);
      engine.set_line_stretch_factor(Orientation::Horizontal, 1, 1);
      let sizes = solved_columns(&mut engine, 300.0);
      shares.push(sizes[0]);
    }
    assert!(shares[0] < shares[1] && shares[1] < shares[2], "{shares:?}");
  }

  #[test]
  fn test_greedy_sentinel_beats_zero_stretch() {
    let mut engine = engine_with_row(&[50.0, 50.0]);
    // Column 0 fixed-ish (stretch 0), column 1 derived greedy (-1 via
    // default PREFERRED policy). No explicit positive stretch anywhere.
    engine.set_line_stretch_factor(Orientation::Horizontal, 0, 0);
    let sizes = solved_columns(&mut engine, 200.0);
    assert_eq!(sizes[0], 50.0, "stretch-0 line stays at preferred");
    assert_eq!(sizes[1], 150.0, "greedy line absorbs the surplus");
  }

  #[test]
  fn test_maximum_clamps_and_redistributes() {
    let mut engine = GridLayoutEngine::new();
    let mut capped = SizedBox::new(50.0, 20.0);
    capped.max = Size::new(70.0, f32::INFINITY);
    engine.add_item(GridItem::new(Box::new(capped), 0, 0));
    engine.add_item(GridItem::new(Box::new(SizedBox::new(50.0, 20.0)), 0, 1));
    engine.set_spacing(Orientation::Horizontal, 0.0);
    engine.set_spacing(Orientation::Vertical, 0.0);
    engine.set_line_stretch_factor(Orientation::Horizontal, 0, 1);
    engine.set_line_stretch_factor(Orientation::Horizontal, 1, 1);

    let sizes = solved_columns(&mut engine, 300.0);
    assert!(sizes[0] <= 70.0 + 1e-3, "line 0 clamped at its maximum");
    assert!(
      (sizes[0] + sizes[1] - 300.0).abs() < 0.5,
      "overflow redistributed: {sizes:?}"
    );
  }

  #[test]
  fn test_idempotent_relayout() {
    let mut engine = engine_with_row(&[40.0, 60.0]);
    let style = style();
    let rect = Rect::from_xywh(0.0, 0.0, 180.0, 20.0);
    engine.set_geometries(rect, &style);
    let cache_a = engine.geometry_cache.clone().unwrap();
    engine.set_geometries(rect, &style);
    let cache_b = engine.geometry_cache.clone().unwrap();
    assert_eq!(cache_a.columns.sizes, cache_b.columns.sizes);
    assert_eq!(cache_a.rows.sizes, cache_b.rows.sizes);
  }

  #[test]
  fn test_add_item_rejects_occupied_cell() {
    let mut engine = GridLayoutEngine::new();
    engine.add_item(GridItem::new(Box::new(SizedBox::new(10.0, 10.0)), 0, 0));
    engine.add_item(GridItem::new(Box::new(SizedBox::new(10.0, 10.0)), 0, 0));
    assert_eq!(engine.item_count(), 1, "overlapping item is dropped");
  }

  #[test]
  fn test_grid_reverse_index() {
    let mut engine = GridLayoutEngine::new();
    engine.add_item(GridItem::with_span(
      Box::new(SizedBox::new(10.0, 10.0)),
      0,
      0,
      2,
      2,
    ));
    assert!(engine.item_at_position(0, 0).is_some());
    assert!(engine.item_at_position(1, 1).is_some());
    assert!(engine.item_at_position(2, 0).is_none());
    assert_eq!(engine.row_count(), 2);
    assert_eq!(engine.column_count(), 2);
  }

  #[test]
  fn test_multi_cell_span_widens_lines() {
    let mut engine = GridLayoutEngine::new();
    engine.add_item(GridItem::new(Box::new(SizedBox::new(30.0, 10.0)), 0, 0));
    engine.add_item(GridItem::new(Box::new(SizedBox::new(30.0, 10.0)), 0, 1));
    // A 100-wide spanning item across both 30-wide columns forces the
    // span total up to 100.
    engine.add_item(GridItem::with_span(
      Box::new(SizedBox::fixed(100.0, 10.0)),
      1,
      0,
      1,
      2,
    ));
    engine.set_spacing(Orientation::Horizontal, 0.0);
    engine.set_spacing(Orientation::Vertical, 0.0);
    let mut style = style();
    style.spacing = 0.0;
    let hint = engine.size_hint(SizeHintKind::Preferred, None, &style);
    assert!(
      hint.width >= 100.0 - 1e-3,
      "span requirement propagates to columns: {}",
      hint.width
    );
  }

  #[test]
  fn test_size_hint_zero_stretch_caps_maximum() {
    let mut engine = GridLayoutEngine::new();
    engine.add_item(GridItem::new(Box::new(SizedBox::new(50.0, 20.0)), 0, 0));
    engine.set_line_stretch_factor(Orientation::Horizontal, 0, 0);
    engine.set_spacing(Orientation::Horizontal, 0.0);
    let style = style();
    let max = engine.size_hint(SizeHintKind::Maximum, None, &style);
    assert_eq!(
      max.width, 50.0,
      "stretch-0 line contributes preferred to the maximum total"
    );
  }

  #[test]
  fn test_insert_and_remove_lines_shift_items() {
    let mut engine = GridLayoutEngine::new();
    engine.add_item(GridItem::new(Box::new(SizedBox::new(10.0, 10.0)), 0, 0));
    engine.add_item(GridItem::new(Box::new(SizedBox::new(10.0, 10.0)), 1, 0));
    engine.insert_lines(Orientation::Vertical, 1, 1);
    assert_eq!(engine.row_count(), 3);
    assert_eq!(engine.item_at(1).unwrap().first_row(), 2);

    engine.remove_lines(Orientation::Vertical, 1, 1);
    assert_eq!(engine.row_count(), 2);
    assert_eq!(engine.item_at(1).unwrap().first_row(), 1);
  }

  #[test]
  fn test_remove_lines_drops_occupants() {
    let mut engine = GridLayoutEngine::new();
    engine.add_item(GridItem::new(Box::new(SizedBox::new(10.0, 10.0)), 0, 0));
    engine.add_item(GridItem::new(Box::new(SizedBox::new(10.0, 10.0)), 1, 0));
    engine.remove_lines(Orientation::Vertical, 1, 1);
    assert_eq!(engine.item_count(), 1);
  }

  #[test]
  fn test_mixed_constraint_orientations_fall_back() {
    struct Constrained(Orientation);
    impl crate::layout::item::Layoutable for Constrained {
      fn size_hint(&self, _: SizeHintKind, _: Orientation, _: Option<f32>) -> f32 {
        10.0
      }
      fn has_dynamic_constraint(&self) -> bool {
        true
      }
      fn dynamic_constraint_orientation(&self) -> Orientation {
        self.0
      }
      fn set_geometry(&mut self, _: Rect) {}
    }

    let mut engine = GridLayoutEngine::new();
    engine.add_item(GridItem::new(Box::new(Constrained(Orientation::Vertical)), 0, 0));
    engine.add_item(GridItem::new(
      Box::new(Constrained(Orientation::Horizontal)),
      0,
      1,
    ));
    assert_eq!(engine.constraint_orientation(), None);
    assert!(!engine.has_dynamic_constraint());
  }

  #[test]
  fn test_button_box_gap_uses_window_margin() {
    let mut engine = GridLayoutEngine::new();
    engine.add_item(GridItem::new(
      Box::new(SizedBox::fixed(100.0, 20.0).with_control_type(ControlType::LineEdit)),
      0,
      0,
    ));
    engine.add_item(GridItem::new(
      Box::new(SizedBox::fixed(100.0, 20.0).with_control_type(ControlType::PushButton)),
      1,
      0,
    ));
    let style = style();
    let data = engine.fill_axis_data(Orientation::Vertical, &style, None);
    assert_eq!(
      data.spacings[0],
      style.margin,
      "gap above a trailing button box is the window margin"
    );
  }

  #[test]
  fn test_button_box_detector_needs_content_above() {
    let mut engine = GridLayoutEngine::new();
    for row in 0..2 {
      engine.add_item(GridItem::new(
        Box::new(SizedBox::fixed(100.0, 20.0).with_control_type(ControlType::PushButton)),
        row,
        0,
      ));
    }
    let style = style();
    let data = engine.fill_axis_data(Orientation::Vertical, &style, None);
    assert_eq!(
      data.spacings[0],
      style.related_button_spacing,
      "all-button layouts keep ordinary spacing"
    );
  }

  #[test]
  fn test_expanding_policy_wins_space() {
    let mut engine = GridLayoutEngine::new();
    engine.add_item(GridItem::new(
      Box::new(SizedBox::new(50.0, 20.0).with_policy(SizePolicy::FIXED)),
      0,
      0,
    ));
    engine.add_item(GridItem::new(
      Box::new(SizedBox::new(50.0, 20.0).with_policy(SizePolicy::EXPANDING)),
      0,
      1,
    ));
    engine.set_spacing(Orientation::Horizontal, 0.0);
    engine.set_spacing(Orientation::Vertical, 0.0);
    let sizes = solved_columns(&mut engine, 300.0);
    assert_eq!(sizes[0], 50.0);
    assert_eq!(sizes[1], 250.0);
  }
}
