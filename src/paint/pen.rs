//! Pen: the stroke descriptor
//!
//! A pen describes how outlines are stroked: the stroke source (a brush, so
//! strokes can be gradients or textures just like fills), the width, cap and
//! join geometry, the dash pattern, and the miter limit.
//!
//! # Cosmetic pens
//!
//! A pen with width `0.0` is *cosmetic*: it strokes at exactly one device
//! pixel no matter what the active transform's scale factor is. Engines and
//! fallbacks must divide out the transform scale before stroking with a
//! cosmetic pen.

use crate::paint::brush::Brush;
use crate::paint::color::Color;

/// Line ending style
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CapStyle {
  /// Squared end, not covering the end point
  #[default]
  Flat,
  /// Squared end extending half the pen width beyond the end point
  Square,
  /// Rounded end centered on the end point
  Round,
}

/// Line join style
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum JoinStyle {
  /// Extend outer edges until they meet, subject to the miter limit
  #[default]
  Miter,
  /// Fill the triangular notch between the outer edges
  Bevel,
  /// Circular arc between the outer edges
  Round,
}

/// Dash pattern selector
///
/// The predefined patterns are expressed in units of the pen width, the
/// conventional dash metric: a `Dash` segment is four widths on, two off.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum PenStyle {
  /// No stroking at all (the pen draws nothing)
  None,
  /// Continuous line
  #[default]
  Solid,
  /// 4 on, 2 off
  Dash,
  /// 1 on, 2 off
  Dot,
  /// 4 on, 2 off, 1 on, 2 off
  DashDot,
  /// 4 on, 2 off, 1 on, 2 off, 1 on, 2 off
  DashDotDot,
  /// Explicit on/off run lengths in units of the pen width
  Custom(Vec<f32>),
}

impl PenStyle {
  /// The dash pattern in units of the pen width, or `None` for solid lines
  pub fn dash_pattern(&self) -> Option<Vec<f32>> {
    match self {
      PenStyle::None | PenStyle::Solid => None,
      PenStyle::Dash => Some(vec![4.0, 2.0]),
      PenStyle::Dot => Some(vec![1.0, 2.0]),
      PenStyle::DashDot => Some(vec![4.0, 2.0, 1.0, 2.0]),
      PenStyle::DashDotDot => Some(vec![4.0, 2.0, 1.0, 2.0, 1.0, 2.0]),
      PenStyle::Custom(pattern) => {
        if pattern.is_empty() {
          None
        } else {
          Some(pattern.clone())
        }
      }
    }
  }
}

/// Stroke descriptor
///
/// Cheap to clone; treated as an immutable value by the painter (mutators
/// replace the whole pen on the current state).
///
/// # Examples
///
/// ```
/// use easelkit::{CapStyle, Color, Pen};
///
/// let pen = Pen::new(Color::BLACK, 2.0).with_cap(CapStyle::Round);
/// assert!(!pen.is_cosmetic());
/// assert!(Pen::new(Color::BLACK, 0.0).is_cosmetic());
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct Pen {
  /// Stroke source
  pub brush: Brush,
  /// Stroke width in logical units; 0.0 means cosmetic (1 device pixel)
  pub width: f32,
  /// Line ending style
  pub cap: CapStyle,
  /// Line join style
  pub join: JoinStyle,
  /// Dash selector
  pub style: PenStyle,
  /// Miter length limit as a multiple of the pen width
  pub miter_limit: f32,
}

impl Pen {
  /// Creates a solid-color pen
  pub fn new(color: Color, width: f32) -> Self {
    Self {
      brush: Brush::solid(color),
      width,
      cap: CapStyle::default(),
      join: JoinStyle::default(),
      style: PenStyle::default(),
      miter_limit: 2.0,
    }
  }

  /// Creates a pen stroking with an arbitrary brush
  pub fn from_brush(brush: Brush, width: f32) -> Self {
    Self {
      brush,
      width,
      cap: CapStyle::default(),
      join: JoinStyle::default(),
      style: PenStyle::default(),
      miter_limit: 2.0,
    }
  }

  /// A pen that draws nothing
  pub fn none() -> Self {
    Self {
      brush: Brush::none(),
      width: 0.0,
      cap: CapStyle::default(),
      join: JoinStyle::default(),
      style: PenStyle::None,
      miter_limit: 2.0,
    }
  }

  /// Builder-style cap override
  pub fn with_cap(mut self, cap: CapStyle) -> Self {
    self.cap = cap;
    self
  }

  /// Builder-style join override
  pub fn with_join(mut self, join: JoinStyle) -> Self {
    self.join = join;
    self
  }

  /// Builder-style dash override
  pub fn with_style(mut self, style: PenStyle) -> Self {
    self.style = style;
    self
  }

  /// Returns true if the pen contributes no stroke
  pub fn is_none(&self) -> bool {
    matches!(self.style, PenStyle::None) || self.brush.is_none()
  }

  /// Returns true if this pen strokes at one device pixel regardless of scale
  pub fn is_cosmetic(&self) -> bool {
    self.width == 0.0
  }

  /// Effective stroke width for geometry computation (cosmetic pens are 1.0)
  pub fn effective_width(&self) -> f32 {
    if self.is_cosmetic() {
      1.0
    } else {
      self.width
    }
  }

  /// Solid stroke color, if the stroke source is a solid brush
  pub fn solid_color(&self) -> Option<Color> {
    self.brush.solid_color()
  }
}

impl Default for Pen {
  fn default() -> Self {
    Self::new(Color::BLACK, 1.0)
  }
}
