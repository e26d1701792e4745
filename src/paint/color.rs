//! Color value type for pens and brushes
//!
//! Colors are straight-alpha RGBA: channels 0-255 as `u8`, alpha 0.0-1.0 as
//! `f32`. Premultiplication happens only at the raster boundary (tiny-skia
//! stores premultiplied pixels); everything above the engine works in
//! straight alpha.

use std::fmt;

/// RGBA color
///
/// # Examples
///
/// ```
/// use easelkit::Color;
///
/// let red = Color::rgb(255, 0, 0);
/// let translucent = red.with_alpha(0.5);
/// assert!(red.is_opaque());
/// assert!(!translucent.is_opaque());
/// ```
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Color {
  /// Red component (0-255)
  pub r: u8,
  /// Green component (0-255)
  pub g: u8,
  /// Blue component (0-255)
  pub b: u8,
  /// Alpha component (0.0 transparent - 1.0 opaque)
  pub a: f32,
}

impl Color {
  /// Fully transparent black
  pub const TRANSPARENT: Self = Self {
    r: 0,
    g: 0,
    b: 0,
    a: 0.0,
  };

  /// Opaque black
  pub const BLACK: Self = Self {
    r: 0,
    g: 0,
    b: 0,
    a: 1.0,
  };

  /// Opaque white
  pub const WHITE: Self = Self {
    r: 255,
    g: 255,
    b: 255,
    a: 1.0,
  };

  /// Opaque red
  pub const RED: Self = Self {
    r: 255,
    g: 0,
    b: 0,
    a: 1.0,
  };

  /// Opaque green
  pub const GREEN: Self = Self {
    r: 0,
    g: 255,
    b: 0,
    a: 1.0,
  };

  /// Opaque blue
  pub const BLUE: Self = Self {
    r: 0,
    g: 0,
    b: 255,
    a: 1.0,
  };

  /// Creates a color with explicit alpha
  pub const fn new(r: u8, g: u8, b: u8, a: f32) -> Self {
    Self { r, g, b, a }
  }

  /// Creates an opaque color
  pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
    Self { r, g, b, a: 1.0 }
  }

  /// Returns true if the alpha channel is fully opaque
  pub fn is_opaque(self) -> bool {
    self.a >= 1.0
  }

  /// Returns true if the color contributes nothing when composited
  pub fn is_transparent(self) -> bool {
    self.a <= 0.0
  }

  /// Returns this color with a replaced alpha value (clamped to 0..=1)
  pub fn with_alpha(self, alpha: f32) -> Self {
    Self {
      a: alpha.clamp(0.0, 1.0),
      ..self
    }
  }

  /// Scales the alpha channel, used by the constant-opacity fallback
  pub fn mul_alpha(self, factor: f32) -> Self {
    self.with_alpha(self.a * factor)
  }

  /// Converts to a tiny-skia color
  pub fn to_tiny_skia(self) -> tiny_skia::Color {
    tiny_skia::Color::from_rgba8(self.r, self.g, self.b, (self.a * 255.0 + 0.5) as u8)
  }
}

impl Default for Color {
  fn default() -> Self {
    Self::BLACK
  }
}

impl fmt::Display for Color {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "rgba({}, {}, {}, {})", self.r, self.g, self.b, self.a)
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_color_constants() {
    assert!(Color::TRANSPARENT.is_transparent());
    assert!(Color::BLACK.is_opaque());
    assert_eq!(Color::RED.r, 255);
  }

  #[test]
  fn test_with_alpha_clamps() {
    assert_eq!(Color::RED.with_alpha(2.0).a, 1.0);
    assert_eq!(Color::RED.with_alpha(-1.0).a, 0.0);
  }

  #[test]
  fn test_mul_alpha() {
    let c = Color::new(10, 20, 30, 0.8);
    let scaled = c.mul_alpha(0.5);
    assert!((scaled.a - 0.4).abs() < 1e-6);
    assert_eq!(scaled.r, 10);
  }
}
