//! Painter state: the complete mutable drawing context
//!
//! A [`PainterState`] bundles everything that affects how a primitive is
//! rendered: pen, brush, background, font, opacity, composition mode, the
//! world and view transforms, the clip stack, and render hints. States form
//! a stack inside the painter; `save()` pushes a copy and `restore()` pops.
//!
//! # Dirty flags
//!
//! Engines do not re-read the whole state on every draw. The painter sets a
//! [`DirtyFlags`] bit whenever a field changes and hands the accumulated
//! bits to the engine's `update_state` before the next primitive; the
//! engine must re-apply exactly the fields whose bits are set and leave the
//! rest of its native state untouched.
//!
//! # Clip stack
//!
//! Clip operations are not commutative and cannot be subtracted, so each
//! applied operation is recorded as a [`ClipEntry`] tagged with the
//! transform that was active at application time. Restoring a saved state
//! replays the surviving prefix of this history in chronological order.

use crate::geometry::Rect;
use crate::paint::brush::Brush;
use crate::paint::path::PainterPath;
use crate::paint::pen::Pen;
use crate::paint::text::{BoxFontEngine, FontEngine};
use crate::transform::Transform;
use bitflags::bitflags;
use std::sync::{Arc, OnceLock};

bitflags! {
  /// Which state fields changed since the engine last synchronized
  #[derive(Debug, Clone, Copy, PartialEq, Eq)]
  pub struct DirtyFlags: u32 {
    const PEN              = 1 << 0;
    const BRUSH            = 1 << 1;
    const BRUSH_ORIGIN     = 1 << 2;
    const FONT             = 1 << 3;
    const BACKGROUND       = 1 << 4;
    const BACKGROUND_MODE  = 1 << 5;
    const TRANSFORM        = 1 << 6;
    const CLIP_REGION      = 1 << 7;
    const CLIP_PATH        = 1 << 8;
    const HINTS            = 1 << 9;
    const COMPOSITION_MODE = 1 << 10;
    const CLIP_ENABLED     = 1 << 11;
    const OPACITY          = 1 << 12;
  }
}

impl DirtyFlags {
  /// Every clip-related bit
  pub const CLIP: Self = Self::CLIP_REGION.union(Self::CLIP_PATH).union(Self::CLIP_ENABLED);
}

bitflags! {
  /// Rendering quality hints
  #[derive(Debug, Clone, Copy, PartialEq, Eq)]
  pub struct RenderHints: u32 {
    /// Antialias primitive edges
    const ANTIALIASING = 1 << 0;
    /// Bilinear-filter scaled pixmaps instead of nearest-neighbor
    const SMOOTH_PIXMAP_TRANSFORM = 1 << 1;
  }
}

impl Default for RenderHints {
  fn default() -> Self {
    RenderHints::ANTIALIASING
  }
}

/// How the background brush interacts with patterned pens/brushes and
/// bitmap drawing
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BackgroundMode {
  /// Leave gaps unpainted (the default)
  #[default]
  Transparent,
  /// Fill gaps (dash gaps, hatch gaps, bitmap zero bits) with the
  /// background brush
  Opaque,
}

/// Pixel composition modes
///
/// `SourceOver` is the universal default every engine supports. The rest of
/// the Porter-Duff set requires [`EngineFeatures::PORTER_DUFF`]; the
/// separable blend modes require [`EngineFeatures::BLEND_MODES`].
///
/// [`EngineFeatures::PORTER_DUFF`]: crate::paint::engine::EngineFeatures::PORTER_DUFF
/// [`EngineFeatures::BLEND_MODES`]: crate::paint::engine::EngineFeatures::BLEND_MODES
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CompositionMode {
  #[default]
  SourceOver,
  DestinationOver,
  Clear,
  Source,
  Destination,
  SourceIn,
  DestinationIn,
  SourceOut,
  DestinationOut,
  SourceAtop,
  DestinationAtop,
  Xor,
  Plus,
  Multiply,
  Screen,
  Overlay,
  Darken,
  Lighten,
}

impl CompositionMode {
  /// Returns true for the extended Porter-Duff operators
  pub fn is_porter_duff_extended(self) -> bool {
    !matches!(self, CompositionMode::SourceOver) && !self.is_blend_mode()
  }

  /// Returns true for the separable blend modes
  pub fn is_blend_mode(self) -> bool {
    matches!(
      self,
      CompositionMode::Multiply
        | CompositionMode::Screen
        | CompositionMode::Overlay
        | CompositionMode::Darken
        | CompositionMode::Lighten
    )
  }

  /// Degrades this mode to one the engine supports
  ///
  /// Unsupported modes silently fall back to plain source-over copy
  /// semantics rather than erroring.
  pub fn degrade_for(self, features: crate::paint::engine::EngineFeatures) -> CompositionMode {
    use crate::paint::engine::EngineFeatures;
    if self.is_blend_mode() && !features.contains(EngineFeatures::BLEND_MODES) {
      return CompositionMode::SourceOver;
    }
    if self.is_porter_duff_extended() && !features.contains(EngineFeatures::PORTER_DUFF) {
      return CompositionMode::SourceOver;
    }
    self
  }

  /// Maps to the tiny-skia blend mode
  pub fn to_tiny_skia(self) -> tiny_skia::BlendMode {
    use tiny_skia::BlendMode as B;
    match self {
      CompositionMode::SourceOver => B::SourceOver,
      CompositionMode::DestinationOver => B::DestinationOver,
      CompositionMode::Clear => B::Clear,
      CompositionMode::Source => B::Source,
      CompositionMode::Destination => B::Destination,
      CompositionMode::SourceIn => B::SourceIn,
      CompositionMode::DestinationIn => B::DestinationIn,
      CompositionMode::SourceOut => B::SourceOut,
      CompositionMode::DestinationOut => B::DestinationOut,
      CompositionMode::SourceAtop => B::SourceAtop,
      CompositionMode::DestinationAtop => B::DestinationAtop,
      CompositionMode::Xor => B::Xor,
      CompositionMode::Plus => B::Plus,
      CompositionMode::Multiply => B::Multiply,
      CompositionMode::Screen => B::Screen,
      CompositionMode::Overlay => B::Overlay,
      CompositionMode::Darken => B::Darken,
      CompositionMode::Lighten => B::Lighten,
    }
  }
}

/// How a clip shape combines with the accumulated clip
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClipOperation {
  /// Remove all clipping
  NoClip,
  /// Replace the accumulated clip with the shape
  Replace,
  /// Intersect the accumulated clip with the shape
  Intersect,
  /// Unite the accumulated clip with the shape
  Unite,
}

/// Geometry of one clip operation
#[derive(Debug, Clone, PartialEq)]
pub enum ClipShape {
  Rect(Rect),
  Path(PainterPath),
}

impl ClipShape {
  /// Logical-space bounding rect of the shape
  pub fn bounding_rect(&self) -> Rect {
    match self {
      ClipShape::Rect(r) => *r,
      ClipShape::Path(p) => p.bounding_rect(),
    }
  }
}

/// One recorded clip operation
///
/// The transform is captured at application time because replaying a clip
/// under a different transform would clip the wrong region.
#[derive(Debug, Clone, PartialEq)]
pub struct ClipEntry {
  pub op: ClipOperation,
  pub shape: ClipShape,
  pub transform: Transform,
}

impl ClipEntry {
  /// Device-space bounding rect of this entry's shape
  pub fn device_bounds(&self) -> Rect {
    self.transform.map_rect(self.shape.bounding_rect())
  }
}

/// The complete drawing context
#[derive(Debug, Clone)]
pub struct PainterState {
  pub pen: Pen,
  pub brush: Brush,
  pub brush_origin: crate::geometry::Point,
  pub background: Brush,
  pub background_mode: BackgroundMode,
  pub font: Arc<dyn FontEngine>,
  /// Constant opacity multiplied into every primitive, 0.0..=1.0
  pub opacity: f32,
  pub composition_mode: CompositionMode,
  /// Logical-to-device transform set by the client
  pub world_transform: Transform,
  /// Window/viewport mapping composed after the world transform
  pub view_transform: Transform,
  /// Logical window rect; `Rect::ZERO` means "use the device rect"
  pub window: Rect,
  /// Device viewport rect; `Rect::ZERO` means "use the device rect"
  pub viewport: Rect,
  /// Chronological clip history since the last `Replace`/`NoClip`
  pub clip_stack: Vec<ClipEntry>,
  pub clip_enabled: bool,
  pub render_hints: RenderHints,
  /// Fields changed since the engine last synchronized
  pub dirty: DirtyFlags,
}

impl PainterState {
  /// The initial state established at `begin()`
  pub fn new() -> Self {
    Self {
      pen: Pen::default(),
      brush: Brush::none(),
      brush_origin: crate::geometry::Point::ZERO,
      background: Brush::solid(crate::paint::color::Color::WHITE),
      background_mode: BackgroundMode::Transparent,
      font: Arc::new(BoxFontEngine::default()),
      opacity: 1.0,
      composition_mode: CompositionMode::SourceOver,
      world_transform: Transform::identity(),
      view_transform: Transform::identity(),
      window: Rect::ZERO,
      viewport: Rect::ZERO,
      clip_stack: Vec::new(),
      clip_enabled: false,
      render_hints: RenderHints::default(),
      dirty: DirtyFlags::empty(),
    }
  }

  /// The combined logical-to-device transform (world, then view)
  pub fn combined_transform(&self) -> Transform {
    if self.view_transform.is_identity() {
      self.world_transform
    } else {
      self.world_transform.then(&self.view_transform)
    }
  }

  /// Returns true if any clip is in effect
  pub fn has_clip(&self) -> bool {
    self.clip_enabled && !self.clip_stack.is_empty()
  }

  /// Device-space bounding rect of the accumulated clip
  ///
  /// Returns `None` when no clip is active, or when any recorded clip
  /// transform is perspective — intersecting through a perspective clip
  /// would require a lossy region/path round trip, so callers skip the
  /// clip-bounds optimization in that case.
  pub fn clip_bounds_device(&self) -> Option<Rect> {
    if !self.has_clip() {
      return None;
    }
    if self.clip_stack.iter().any(|e| !e.transform.is_affine()) {
      return None;
    }
    let mut bounds: Option<Rect> = None;
    for entry in &self.clip_stack {
      match entry.op {
        ClipOperation::NoClip => bounds = None,
        ClipOperation::Replace => bounds = Some(entry.device_bounds()),
        ClipOperation::Intersect => {
          bounds = match bounds {
            Some(b) => b.intersection(&entry.device_bounds()),
            // Intersecting an unbounded clip just bounds it.
            None => Some(entry.device_bounds()),
          };
          if bounds.is_none() {
            return Some(Rect::ZERO);
          }
        }
        ClipOperation::Unite => {
          bounds = Some(match bounds {
            Some(b) => b.union(&entry.device_bounds()),
            None => entry.device_bounds(),
          });
        }
      }
    }
    bounds
  }

  /// The process-wide default state served by getters on inactive painters
  ///
  /// Callers that ignore a failed `begin()` still get sane values instead
  /// of a crash.
  pub fn shared_dummy() -> &'static PainterState {
    static DUMMY: OnceLock<PainterState> = OnceLock::new();
    DUMMY.get_or_init(PainterState::new)
  }
}

impl Default for PainterState {
  fn default() -> Self {
    Self::new()
  }
}
