//! The paint-engine contract
//!
//! A [`PaintEngine`] is one drawing backend: software raster, a recording
//! surface, a windowing system. The trait splits the primitive set in two:
//!
//! - **Required** methods every backend implements: lifecycle
//!   (`begin`/`end`), state synchronization (`update_state`), polygon
//!   drawing and pixmap blitting, plus the bookkeeping accessors.
//! - **Optional** primitives with default bodies that lower the operation
//!   onto the required set (see [`crate::paint::fallback`]). A backend
//!   overrides exactly the ones it can do natively.
//!
//! The source design detected "neither polygon overload implemented" at
//! runtime with a reentrancy guard; here `draw_polygon` is simply a
//! required method, so that contract violation is unrepresentable.
//!
//! # Capability mask
//!
//! Every engine advertises an [`EngineFeatures`] mask, fixed at
//! construction. The painter compares the mask against what the current
//! pen/brush/state needs and emulates anything missing — an engine is never
//! asked to do something outside its mask, with one exception: `SourceOver`
//! compositing and plain opaque fills are assumed universal.
//!
//! # Dirty-state protocol
//!
//! The painter mutates the snapshot in [`EngineCore`] and accumulates
//! [`DirtyFlags`]; before the next primitive it calls `update_state` with
//! the accumulated bits. Engines must re-read every flagged field and must
//! not touch native state for unflagged ones.

use crate::geometry::{Line, Point, Rect, Size};
use crate::paint::fallback;
use crate::paint::path::PainterPath;
use crate::paint::pixmap::Pixmap;
use crate::paint::state::{DirtyFlags, PainterState};
use crate::paint::text::TextItem;
use bitflags::bitflags;

bitflags! {
  /// Capabilities a paint engine can advertise
  #[derive(Debug, Clone, Copy, PartialEq, Eq)]
  pub struct EngineFeatures: u32 {
    /// Primitives may carry a non-identity transform
    const PRIMITIVE_TRANSFORM   = 1 << 0;
    /// Brush/pen patterns may carry a transform
    const PATTERN_TRANSFORM     = 1 << 1;
    /// Pixmaps can be drawn through a transform
    const PIXMAP_TRANSFORM      = 1 << 2;
    /// Texture and hatch brushes
    const PATTERN_BRUSH         = 1 << 3;
    /// Linear gradient fills
    const LINEAR_GRADIENT_FILL  = 1 << 4;
    /// Radial gradient fills
    const RADIAL_GRADIENT_FILL  = 1 << 5;
    /// Conical gradient fills
    const CONICAL_GRADIENT_FILL = 1 << 6;
    /// Translucent sources composite correctly
    const ALPHA_BLEND           = 1 << 7;
    /// The full Porter-Duff operator set
    const PORTER_DUFF           = 1 << 8;
    /// Fill-rule-tagged vector paths
    const PAINTER_PATHS         = 1 << 9;
    /// Edge antialiasing
    const ANTIALIASING          = 1 << 10;
    /// Per-primitive constant opacity
    const CONSTANT_OPACITY      = 1 << 11;
    /// Brushes masked by a bitmap
    const MASKED_BRUSH          = 1 << 12;
    /// Non-affine transforms
    const PERSPECTIVE_TRANSFORM = 1 << 13;
    /// Separable blend modes (multiply, screen, ...)
    const BLEND_MODES           = 1 << 14;
    /// Object-bounding-mode gradient coordinates
    const OBJECT_BOUNDING_MODE  = 1 << 15;
    /// Bitwise raster operations
    const RASTER_OP_MODES       = 1 << 16;
  }
}

impl EngineFeatures {
  /// Everything — the mask of a fully capable engine
  pub const ALL_FEATURES: Self = Self::all();
}

/// Identifies the kind of backend behind a `dyn PaintEngine`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EngineType {
  /// Software rasterizer
  Raster,
  /// Vector recording engine
  Picture,
  /// Windowing-system native engine
  Windowing,
  /// Anything else
  User,
}

/// How a point list passed to `draw_polygon` is interpreted
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PolygonMode {
  /// Closed polygon, even-odd fill
  OddEven,
  /// Closed polygon, winding fill
  Winding,
  /// Closed polygon known to be convex (engines may fast-path)
  Convex,
  /// Open polyline: stroke only, never filled
  Polyline,
}

/// Shared bookkeeping every concrete engine embeds
///
/// Holds the fixed feature mask, the painter-written state snapshot, the
/// accumulated dirty bits and the active flag. Keeping the snapshot here —
/// rather than inside each engine — lets the default primitive
/// implementations read pen/brush/transform without extra plumbing.
#[derive(Debug, Clone)]
pub struct EngineCore {
  features: EngineFeatures,
  /// Snapshot of the painter state as of the last `update_state`
  pub state: PainterState,
  /// Bits not yet consumed by `update_state`
  pub dirty: DirtyFlags,
  /// True between successful `begin` and `end`
  pub active: bool,
}

impl EngineCore {
  /// Creates bookkeeping for an engine with the given capability mask
  pub fn new(features: EngineFeatures) -> Self {
    Self {
      features,
      state: PainterState::new(),
      dirty: DirtyFlags::empty(),
      active: false,
    }
  }

  /// The engine's fixed capability mask
  pub fn features(&self) -> EngineFeatures {
    self.features
  }
}

/// The backend contract
///
/// See the module docs for the required/optional split and the dirty-state
/// protocol. All methods are object-safe; the painter drives engines
/// through `&mut dyn PaintEngine`.
pub trait PaintEngine {
  /// Shared bookkeeping (feature mask, state snapshot, dirty bits)
  fn core(&self) -> &EngineCore;

  /// Mutable shared bookkeeping
  fn core_mut(&mut self) -> &mut EngineCore;

  /// What kind of backend this is
  fn engine_type(&self) -> EngineType;

  /// Pixel dimensions of the bound target
  fn device_size(&self) -> Size;

  /// Binds the engine to its device; false means the device is not
  /// paintable and no primitive may be called
  fn begin(&mut self) -> bool;

  /// Finishes painting; false reports a flush failure
  fn end(&mut self) -> bool;

  /// Consumes the dirty bits, re-reading every flagged snapshot field
  fn update_state(&mut self, flags: DirtyFlags);

  /// Fills and/or outlines a polygon with the current brush/pen
  fn draw_polygon(&mut self, points: &[Point], mode: PolygonMode);

  /// Blits `source` (a sub-rect of `pixmap`) onto `target`
  fn draw_pixmap(&mut self, target: Rect, pixmap: &Pixmap, source: Rect);

  // --------------------------------------------------------------------
  // Optional primitives: default bodies lower onto the required set
  // --------------------------------------------------------------------

  /// Fills and strokes a path
  fn draw_path(&mut self, path: &PainterPath) {
    fallback::draw_path_via_polygons(self, path);
  }

  /// Draws points with the current pen
  fn draw_points(&mut self, points: &[Point]) {
    fallback::draw_points_as_shapes(self, points);
  }

  /// Strokes line segments with the current pen
  fn draw_lines(&mut self, lines: &[Line]) {
    fallback::draw_lines_as_polylines(self, lines);
  }

  /// Fills and strokes axis-aligned rectangles
  fn draw_rects(&mut self, rects: &[Rect]) {
    fallback::draw_rects_via_path_or_polygon(self, rects);
  }

  /// Fills and strokes an ellipse inscribed in `rect`
  fn draw_ellipse(&mut self, rect: Rect) {
    fallback::draw_ellipse_via_path(self, rect);
  }

  /// Tiles `pixmap` across `rect`, starting at `offset` within the source
  fn draw_tiled_pixmap(&mut self, rect: Rect, pixmap: &Pixmap, offset: Point) {
    fallback::draw_tiled_pixmap_by_stamping(self, rect, pixmap, offset);
  }

  /// Draws an image: crops `source` if it is a strict sub-rect, then blits
  fn draw_image(&mut self, target: Rect, image: &Pixmap, source: Rect) {
    fallback::draw_image_via_pixmap(self, target, image, source);
  }

  /// Draws a shaped glyph run with its baseline origin at `pos`
  fn draw_text_item(&mut self, pos: Point, item: &TextItem) {
    fallback::draw_text_as_paths(self, pos, item);
  }
}

impl dyn PaintEngine + '_ {
  /// The engine's fixed capability mask
  pub fn features(&self) -> EngineFeatures {
    self.core().features()
  }

  /// Convenience capability test
  pub fn has_feature(&self, feature: EngineFeatures) -> bool {
    self.core().features().contains(feature)
  }

  /// The current state snapshot
  pub fn state(&self) -> &PainterState {
    &self.core().state
  }
}
