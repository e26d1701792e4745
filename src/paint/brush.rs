//! Brush: the fill descriptor
//!
//! A brush describes what a shape is filled with: a solid color, one of
//! three gradient flavors, a pixmap texture, or a fixed hatch pattern. The
//! brush also carries a coordinate mode deciding which space the fill
//! geometry lives in, and an optional transform of its own.
//!
//! # Coordinate modes
//!
//! - `Logical`: gradient/texture coordinates are in the painter's logical
//!   space (the default).
//! - `ObjectBounding`: coordinates in `0..=1` are scaled to the bounding
//!   rect of whatever shape is being filled.
//! - `StretchToDevice`: coordinates in `0..=1` are scaled to the whole
//!   device; has a dedicated cheap fallback path in the painter.

use crate::geometry::{fuzzy_eq, Point};
use crate::paint::color::Color;
use crate::paint::pixmap::Pixmap;
use crate::transform::Transform;

/// A single gradient stop
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GradientStop {
  /// Position along the gradient, 0.0..=1.0
  pub offset: f32,
  /// Color at this position
  pub color: Color,
}

impl GradientStop {
  /// Creates a stop, clamping the offset into range
  pub fn new(offset: f32, color: Color) -> Self {
    Self {
      offset: offset.clamp(0.0, 1.0),
      color,
    }
  }
}

/// What happens outside the gradient's defined range
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum GradientSpread {
  /// Clamp to the terminal stop colors
  #[default]
  Pad,
  /// Tile the gradient
  Repeat,
  /// Tile with every other repetition mirrored
  Reflect,
}

/// Which space brush coordinates are interpreted in
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CoordinateMode {
  /// Painter's logical coordinates
  #[default]
  Logical,
  /// Unit square mapped to the filled shape's bounding rect
  ObjectBounding,
  /// Unit square mapped to the whole device
  StretchToDevice,
}

/// Linear gradient geometry
#[derive(Debug, Clone, PartialEq)]
pub struct LinearGradient {
  pub start: Point,
  pub end: Point,
  pub stops: Vec<GradientStop>,
  pub spread: GradientSpread,
}

/// Radial gradient geometry
///
/// The focal point may differ from the center. When the focal point lies
/// outside the circle (an "extended" radial gradient) windowing and
/// recording backends cannot render the formula natively and the painter
/// always emulates.
#[derive(Debug, Clone, PartialEq)]
pub struct RadialGradient {
  pub center: Point,
  pub radius: f32,
  pub focal: Point,
  pub stops: Vec<GradientStop>,
  pub spread: GradientSpread,
}

impl RadialGradient {
  /// Returns true if the focal point lies (fuzzily) outside the circle
  pub fn is_extended(&self) -> bool {
    let d = self.center.distance_to(self.focal);
    d > self.radius && !fuzzy_eq(d, self.radius)
  }
}

/// Conical (sweep) gradient geometry; angle in degrees
#[derive(Debug, Clone, PartialEq)]
pub struct ConicalGradient {
  pub center: Point,
  pub start_angle: f32,
  pub stops: Vec<GradientStop>,
}

/// Fixed hatch patterns
///
/// A small closed set; engines that cannot draw patterns natively get them
/// via the pattern-brush emulation path like any texture.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HatchPattern {
  Horizontal,
  Vertical,
  Cross,
  ForwardDiagonal,
  BackwardDiagonal,
  DiagonalCross,
  /// Uniform density fills, 1 (sparse) to 7 (dense)
  Dense(u8),
}

/// The fill source
#[derive(Debug, Clone, PartialEq, Default)]
pub enum BrushStyle {
  /// Fills nothing
  #[default]
  NoBrush,
  /// Solid color fill
  Solid(Color),
  /// Linear gradient fill
  LinearGradient(LinearGradient),
  /// Radial gradient fill
  RadialGradient(RadialGradient),
  /// Conical gradient fill
  ConicalGradient(ConicalGradient),
  /// Pixmap texture fill
  Texture(Pixmap),
  /// Hatch pattern in the given color
  Hatch(HatchPattern, Color),
}

/// Fill descriptor
///
/// Immutable value; painter mutators replace the whole brush.
///
/// # Examples
///
/// ```
/// use easelkit::{Brush, Color};
///
/// let solid = Brush::solid(Color::GREEN);
/// assert_eq!(solid.solid_color(), Some(Color::GREEN));
/// assert!(!solid.is_gradient());
/// ```
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Brush {
  /// What to fill with
  pub style: BrushStyle,
  /// Which space the fill geometry lives in
  pub coordinate_mode: CoordinateMode,
  /// Optional transform applied to the brush contents
  pub transform: Option<Transform>,
}

impl Brush {
  /// A brush that fills nothing
  pub fn none() -> Self {
    Self::default()
  }

  /// A solid color brush
  pub fn solid(color: Color) -> Self {
    Self {
      style: BrushStyle::Solid(color),
      ..Self::default()
    }
  }

  /// A linear gradient brush
  pub fn linear_gradient(gradient: LinearGradient) -> Self {
    Self {
      style: BrushStyle::LinearGradient(gradient),
      ..Self::default()
    }
  }

  /// A radial gradient brush
  pub fn radial_gradient(gradient: RadialGradient) -> Self {
    Self {
      style: BrushStyle::RadialGradient(gradient),
      ..Self::default()
    }
  }

  /// A conical gradient brush
  pub fn conical_gradient(gradient: ConicalGradient) -> Self {
    Self {
      style: BrushStyle::ConicalGradient(gradient),
      ..Self::default()
    }
  }

  /// A texture brush tiling the given pixmap
  pub fn texture(pixmap: Pixmap) -> Self {
    Self {
      style: BrushStyle::Texture(pixmap),
      ..Self::default()
    }
  }

  /// A hatch pattern brush
  pub fn hatch(pattern: HatchPattern, color: Color) -> Self {
    Self {
      style: BrushStyle::Hatch(pattern, color),
      ..Self::default()
    }
  }

  /// Builder-style coordinate-mode override
  pub fn with_coordinate_mode(mut self, mode: CoordinateMode) -> Self {
    self.coordinate_mode = mode;
    self
  }

  /// Builder-style brush transform override
  pub fn with_transform(mut self, transform: Transform) -> Self {
    self.transform = Some(transform);
    self
  }

  /// Returns true if the brush fills nothing
  pub fn is_none(&self) -> bool {
    matches!(self.style, BrushStyle::NoBrush)
  }

  /// Solid fill color, if this is a solid brush
  pub fn solid_color(&self) -> Option<Color> {
    match self.style {
      BrushStyle::Solid(color) => Some(color),
      _ => None,
    }
  }

  /// Returns true for any of the three gradient styles
  pub fn is_gradient(&self) -> bool {
    matches!(
      self.style,
      BrushStyle::LinearGradient(_) | BrushStyle::RadialGradient(_) | BrushStyle::ConicalGradient(_)
    )
  }

  /// Returns true for texture and hatch brushes
  pub fn is_pattern(&self) -> bool {
    matches!(self.style, BrushStyle::Texture(_) | BrushStyle::Hatch(..))
  }

  /// The gradient stops, for any gradient style
  pub fn gradient_stops(&self) -> Option<&[GradientStop]> {
    match &self.style {
      BrushStyle::LinearGradient(g) => Some(&g.stops),
      BrushStyle::RadialGradient(g) => Some(&g.stops),
      BrushStyle::ConicalGradient(g) => Some(&g.stops),
      _ => None,
    }
  }

  /// Returns true if compositing this brush needs an alpha channel
  ///
  /// Solid opaque fills do not; anything with a translucent stop, texture
  /// alpha, or a translucent solid color does.
  pub fn needs_alpha(&self) -> bool {
    match &self.style {
      BrushStyle::NoBrush => false,
      BrushStyle::Solid(color) => !color.is_opaque(),
      BrushStyle::Hatch(_, color) => !color.is_opaque(),
      BrushStyle::Texture(pixmap) => pixmap.has_alpha(),
      _ => self
        .gradient_stops()
        .map(|stops| stops.iter().any(|s| !s.color.is_opaque()))
        .unwrap_or(false),
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  fn stops() -> Vec<GradientStop> {
    vec![
      GradientStop::new(0.0, Color::RED),
      GradientStop::new(1.0, Color::BLUE),
    ]
  }

  #[test]
  fn test_gradient_stop_clamps_offset() {
    assert_eq!(GradientStop::new(1.5, Color::RED).offset, 1.0);
    assert_eq!(GradientStop::new(-0.5, Color::RED).offset, 0.0);
  }

  #[test]
  fn test_radial_extended_detection() {
    let mut g = RadialGradient {
      center: Point::new(50.0, 50.0),
      radius: 10.0,
      focal: Point::new(50.0, 50.0),
      stops: stops(),
      spread: GradientSpread::Pad,
    };
    assert!(!g.is_extended());

    g.focal = Point::new(55.0, 50.0);
    assert!(!g.is_extended(), "focal inside the circle");

    g.focal = Point::new(75.0, 50.0);
    assert!(g.is_extended(), "focal outside the circle");
  }

  #[test]
  fn test_brush_classification() {
    let linear = Brush::linear_gradient(LinearGradient {
      start: Point::ZERO,
      end: Point::new(1.0, 0.0),
      stops: stops(),
      spread: GradientSpread::Pad,
    });
    assert!(linear.is_gradient());
    assert!(!linear.is_pattern());
    assert!(Brush::hatch(HatchPattern::Cross, Color::BLACK).is_pattern());
    assert!(Brush::none().is_none());
  }

  #[test]
  fn test_needs_alpha() {
    assert!(!Brush::solid(Color::RED).needs_alpha());
    assert!(Brush::solid(Color::RED.with_alpha(0.5)).needs_alpha());

    let translucent_stops = vec![
      GradientStop::new(0.0, Color::RED),
      GradientStop::new(1.0, Color::BLUE.with_alpha(0.3)),
    ];
    let g = Brush::linear_gradient(LinearGradient {
      start: Point::ZERO,
      end: Point::new(1.0, 0.0),
      stops: translucent_stops,
      spread: GradientSpread::Pad,
    });
    assert!(g.needs_alpha());
  }
}
