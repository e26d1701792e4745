//! Capability arbitration and software emulation
//!
//! This module decides, per draw call, whether the bound engine can render
//! the current state natively, and carries the two fallback strategies when
//! it cannot:
//!
//! 1. [`Painter::draw_helper`] — the general path: render the primitive
//!    through a nested painter onto a premultiplied offscreen image (whose
//!    `RasterEngine` is fully capable by construction, so the recursion is
//!    structurally bounded at depth one), then composite the image back
//!    through the engine's image-drawing primitive.
//! 2. [`Painter::draw_stretched_gradient`] — a cheap path for the one case
//!    that doesn't need pixels: a stretch-to-device gradient fill becomes a
//!    scaled-coordinate-system draw of a logical gradient.
//!
//! The specifier is recomputed whenever a relevant state field changes, not
//! per draw call, so repeated draws under one state pay nothing.

use crate::geometry::Rect;
use crate::paint::brush::{Brush, BrushStyle, CoordinateMode};
use crate::paint::engine::EngineFeatures;
use crate::paint::engines::RasterEngine;
use crate::paint::painter::Painter;
use crate::paint::path::PainterPath;
use crate::paint::pen::PenStyle;
use crate::paint::pixmap::Pixmap;
use crate::paint::state::{BackgroundMode, CompositionMode, DirtyFlags};
use crate::transform::{Transform, TransformType};
use bitflags::bitflags;

bitflags! {
  /// One bit per missing capability the current state requires
  #[derive(Debug, Clone, Copy, PartialEq, Eq)]
  pub struct Emulation: u32 {
    const ALPHA_BLEND           = 1 << 0;
    const LINEAR_GRADIENT       = 1 << 1;
    const RADIAL_GRADIENT       = 1 << 2;
    const CONICAL_GRADIENT      = 1 << 3;
    const PATTERN_BRUSH         = 1 << 4;
    const PATTERN_TRANSFORM     = 1 << 5;
    const PRIMITIVE_TRANSFORM   = 1 << 6;
    const PERSPECTIVE_TRANSFORM = 1 << 7;
    const CONSTANT_OPACITY      = 1 << 8;
    const OBJECT_BOUNDING       = 1 << 9;
    const OPAQUE_BACKGROUND     = 1 << 10;
    /// Extended radial gradient: always emulated, no backend in scope
    /// implements the out-of-circle focal formula natively
    const EXTENDED_RADIAL       = 1 << 11;
    /// Stretch-to-device gradient: has its own cheap fallback
    const STRETCH_GRADIENT      = 1 << 12;
  }
}

bitflags! {
  /// Which halves of a primitive a draw call exercises
  #[derive(Debug, Clone, Copy, PartialEq, Eq)]
  pub struct DrawOp: u8 {
    const FILL   = 1 << 0;
    const STROKE = 1 << 1;
  }
}

impl DrawOp {
  pub const STROKE_AND_FILL: Self = Self::FILL.union(Self::STROKE);
}

impl Default for Emulation {
  fn default() -> Self {
    Emulation::empty()
  }
}

/// Cached emulation bits, split by which source triggers them
#[derive(Debug, Clone, Copy, Default)]
pub struct EmulationSpecifier {
  /// Bits triggered by state alone (transform, opacity, background)
  pub state_bits: Emulation,
  /// Bits triggered by the fill brush
  pub brush_bits: Emulation,
  /// Bits triggered by the pen's stroke source
  pub pen_bits: Emulation,
}

impl EmulationSpecifier {
  /// The bits relevant to one draw operation
  pub fn bits_for(&self, op: DrawOp) -> Emulation {
    let mut bits = self.state_bits;
    if op.contains(DrawOp::FILL) {
      bits |= self.brush_bits;
    }
    if op.contains(DrawOp::STROKE) {
      bits |= self.pen_bits;
    }
    bits
  }
}

/// Emulation bits required to render `brush` on an engine with `features`
fn brush_emulation_bits(
  brush: &Brush,
  features: EngineFeatures,
  transform_ty: TransformType,
) -> Emulation {
  let mut bits = Emulation::empty();

  match &brush.style {
    BrushStyle::NoBrush => return bits,
    BrushStyle::Solid(_) => {}
    BrushStyle::LinearGradient(_) => {
      if !features.contains(EngineFeatures::LINEAR_GRADIENT_FILL) {
        bits |= Emulation::LINEAR_GRADIENT;
      }
    }
    BrushStyle::RadialGradient(g) => {
      if !features.contains(EngineFeatures::RADIAL_GRADIENT_FILL) {
        bits |= Emulation::RADIAL_GRADIENT;
      }
      if g.is_extended() {
        bits |= Emulation::EXTENDED_RADIAL;
      }
    }
    BrushStyle::ConicalGradient(_) => {
      if !features.contains(EngineFeatures::CONICAL_GRADIENT_FILL) {
        bits |= Emulation::CONICAL_GRADIENT;
      }
    }
    BrushStyle::Texture(_) | BrushStyle::Hatch(..) => {
      if !features.contains(EngineFeatures::PATTERN_BRUSH) {
        bits |= Emulation::PATTERN_BRUSH;
      }
      let transformed = brush.transform.is_some() || transform_ty > TransformType::Translate;
      if transformed && !features.contains(EngineFeatures::PATTERN_TRANSFORM) {
        bits |= Emulation::PATTERN_TRANSFORM;
      }
    }
  }

  if brush.is_gradient() {
    match brush.coordinate_mode {
      CoordinateMode::ObjectBounding => {
        if !features.contains(EngineFeatures::OBJECT_BOUNDING_MODE) {
          bits |= Emulation::OBJECT_BOUNDING;
        }
      }
      CoordinateMode::StretchToDevice => {
        bits |= Emulation::STRETCH_GRADIENT;
      }
      CoordinateMode::Logical => {}
    }
  }

  if brush.needs_alpha() && !features.contains(EngineFeatures::ALPHA_BLEND) {
    bits |= Emulation::ALPHA_BLEND;
  }
  bits
}

impl Painter<'_> {
  /// Recomputes the cached emulation specifier from the current state
  ///
  /// Called by every mutator that can change the answer; draw calls only
  /// read the cache.
  pub(crate) fn update_emulation_specifier(&mut self) {
    if !self.is_active() {
      self.emulation = EmulationSpecifier::default();
      return;
    }
    let features = self.engine_features;
    let state = self.state();
    let transform = state.combined_transform();
    let ty = transform.ty();

    let mut state_bits = Emulation::empty();
    if ty > TransformType::Identity && !features.contains(EngineFeatures::PRIMITIVE_TRANSFORM) {
      state_bits |= Emulation::PRIMITIVE_TRANSFORM;
    }
    if ty == TransformType::Project
      && !features.contains(EngineFeatures::PERSPECTIVE_TRANSFORM)
    {
      state_bits |= Emulation::PERSPECTIVE_TRANSFORM;
    }
    if state.opacity < 1.0 && !features.contains(EngineFeatures::CONSTANT_OPACITY) {
      state_bits |= Emulation::CONSTANT_OPACITY;
    }
    if state.background_mode == BackgroundMode::Opaque {
      let patterned_pen = !matches!(state.pen.style, PenStyle::Solid | PenStyle::None);
      let patterned_brush = matches!(state.brush.style, BrushStyle::Hatch(..));
      if patterned_pen || patterned_brush {
        state_bits |= Emulation::OPAQUE_BACKGROUND;
      }
    }

    let mut brush_bits = brush_emulation_bits(&state.brush, features, ty);
    let mut pen_bits = brush_emulation_bits(&state.pen.brush, features, ty);

    // Extended radial gradients bypass the feature mask (no windowing or
    // recording backend implements the out-of-circle focal formula), but
    // the raster engine resolves them with per-pixel synthesis — it is the
    // emulation target, so exempting it is what bounds the recursion.
    if self.engine_kind == Some(crate::paint::engine::EngineType::Raster) {
      brush_bits.remove(Emulation::EXTENDED_RADIAL);
      pen_bits.remove(Emulation::EXTENDED_RADIAL);
    }

    self.emulation = EmulationSpecifier {
      state_bits,
      brush_bits,
      pen_bits,
    };
  }

  /// True when the given operation cannot go straight to the engine
  pub(crate) fn needs_emulation(&self, op: DrawOp) -> bool {
    !self.emulation.bits_for(op).is_empty()
  }

  /// Routes an emulated path to the cheap or the general fallback
  pub(crate) fn dispatch_emulated_path(&mut self, path: &PainterPath, op: DrawOp) {
    let bits = self.emulation.bits_for(op);
    if bits == Emulation::STRETCH_GRADIENT {
      self.draw_stretched_gradient(path, op);
    } else {
      self.draw_helper(path, op);
    }
  }

  /// The general emulation path: render offscreen, composite back
  ///
  /// 1. Transform the path to device space and take its bounding box,
  ///    expanded by the stroke extent (exact stroker bounds for rotated or
  ///    sheared transforms, a cheap half-pen-width inflation for
  ///    scale-only ones).
  /// 2. Intersect with the clip bounds (skipped automatically when any
  ///    clip transform is perspective) and the device rect.
  /// 3. Replay the primitive through a nested painter onto a transparent
  ///    premultiplied image.
  /// 4. Reset the outer transform, composite the image through the
  ///    engine's `draw_image`, restore the transform.
  pub(crate) fn draw_helper(&mut self, path: &PainterPath, op: DrawOp) {
    let state = self.state().clone();
    let transform = state.combined_transform();
    let device_path = path.transformed(&transform);
    let mut bounds = device_path.bounding_rect();

    let stroking = op.contains(DrawOp::STROKE) && !state.pen.is_none();
    if stroking {
      let pen = &state.pen;
      if transform.ty() <= TransformType::Scale {
        let scale = transform.determinant().abs().sqrt().max(f32::EPSILON);
        let device_width = if pen.is_cosmetic() {
          1.0
        } else {
          pen.width * scale
        };
        bounds = bounds.inflate(device_width / 2.0 + 1.0);
      } else {
        // Exact stroke bounds through the stroker.
        let mut stroke_pen = pen.clone();
        if stroke_pen.is_cosmetic() {
          stroke_pen.width = 1.0;
          let outline = device_path.stroked(&stroke_pen, 1.0);
          bounds = bounds.union(&outline.bounding_rect()).inflate(1.0);
        } else {
          let outline = path.stroked(&stroke_pen, 1.0).transformed(&transform);
          bounds = bounds.union(&outline.bounding_rect()).inflate(1.0);
        }
      }
    }

    if let Some(clip) = state.clip_bounds_device() {
      bounds = match bounds.intersection(&clip) {
        Some(b) => b,
        None => return,
      };
    }
    bounds = match bounds.intersection(&self.device_rect()) {
      Some(b) => b,
      None => return,
    };
    let bounds = bounds.round_out();
    let width = bounds.width() as u32;
    let height = bounds.height() as u32;
    if width == 0 || height == 0 {
      return;
    }
    let Ok(mut image) = Pixmap::new(width, height) else {
      return;
    };

    let bits = self.emulation.bits_for(op);
    if bits.contains(Emulation::OPAQUE_BACKGROUND) {
      if let Some(color) = state.background.solid_color() {
        image.fill(color);
      }
    }

    // Nested painter on a concrete RasterEngine: fully capable by
    // construction, so this recursion is bounded at depth one.
    {
      let mut raster = RasterEngine::new(&mut image);
      let mut nested = Painter::new();
      if !nested.begin(&mut raster) {
        return;
      }
      nested.set_render_hints(state.render_hints);
      nested.set_opacity(state.opacity);
      nested.set_composition_mode(CompositionMode::SourceOver);
      nested.set_transform(
        transform.then(&Transform::from_translate(-bounds.left(), -bounds.top())),
      );
      if op.contains(DrawOp::FILL) {
        nested.set_brush(state.brush.clone());
      } else {
        nested.set_brush(Brush::none());
      }
      if stroking {
        nested.set_pen(state.pen.clone());
      } else {
        nested.set_pen(crate::paint::pen::Pen::none());
      }
      nested.draw_path(path);
      nested.end();
    }

    self.composite_back(bounds, &image);
  }

  /// Draws an offscreen image at device coordinates through the engine
  fn composite_back(&mut self, bounds: Rect, image: &Pixmap) {
    let (old_world, old_view, old_opacity) = {
      let state = self.state();
      (state.world_transform, state.view_transform, state.opacity)
    };
    {
      let state = self.state_mut();
      state.world_transform = Transform::identity();
      state.view_transform = Transform::identity();
      state.opacity = 1.0;
      state.dirty |= DirtyFlags::TRANSFORM | DirtyFlags::OPACITY;
    }
    self.flush();
    let image_rect = image.rect();
    self.engine_mut().draw_image(bounds, image, image_rect);
    {
      let state = self.state_mut();
      state.world_transform = old_world;
      state.view_transform = old_view;
      state.opacity = old_opacity;
      state.dirty |= DirtyFlags::TRANSFORM | DirtyFlags::OPACITY;
    }
  }

  /// Cheap fallback for stretch-to-device gradients
  ///
  /// Scales the coordinate system to the device extents and draws the path
  /// in that scaled space with the gradient switched to logical
  /// coordinates, so the unit-space gradient geometry naturally covers the
  /// whole device — no offscreen image needed. Requires transform support
  /// on the engine; without it the general helper runs instead.
  pub(crate) fn draw_stretched_gradient(&mut self, path: &PainterPath, op: DrawOp) {
    let device = self.device_rect();
    let dw = device.width();
    let dh = device.height();
    if dw < 1.0
      || dh < 1.0
      || !self
        .engine_features
        .contains(EngineFeatures::PRIMITIVE_TRANSFORM)
    {
      self.draw_helper(path, op);
      return;
    }

    let brush = self.state().brush.clone();
    let pen = self.state().pen.clone();

    if op.contains(DrawOp::FILL)
      && brush.is_gradient()
      && brush.coordinate_mode == CoordinateMode::StretchToDevice
    {
      let logical = brush.clone().with_coordinate_mode(CoordinateMode::Logical);
      let inverse = Transform::from_scale(1.0 / dw, 1.0 / dh);
      let scaled_path = path.transformed(&inverse);
      self.save();
      self.scale(dw, dh);
      self.fill_path(&scaled_path, &logical);
      self.restore();
    } else if op.contains(DrawOp::FILL) && !brush.is_none() {
      self.fill_path(path, &brush);
    }

    if op.contains(DrawOp::STROKE) && !pen.is_none() {
      if self.emulation.pen_bits.contains(Emulation::STRETCH_GRADIENT) {
        // A stretch-gradient stroke would be distorted by the scale trick;
        // take the offscreen path for the stroke half only.
        self.draw_helper(path, DrawOp::STROKE);
      } else {
        self.stroke_path(path, &pen);
      }
    }
  }
}
