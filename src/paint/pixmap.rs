//! Pixmap: the 2D pixel buffer
//!
//! A thin owner of a premultiplied-alpha RGBA8 `tiny_skia::Pixmap`. The
//! painter and engines treat pixmaps as value types: cloning copies pixels,
//! and a clone is always safe to hand to another engine.
//!
//! The type stays deliberately small — width/height/alpha queries, sub-rect
//! copies, and the self-blit doubling used by the tiled-drawing fallback.
//! Codecs beyond the PNG passthrough (used by tools and tests) are out of
//! scope.

use crate::error::{PixmapError, Result};
use crate::geometry::Rect;
use crate::paint::color::Color;

/// A premultiplied RGBA8 pixel buffer
///
/// # Examples
///
/// ```
/// use easelkit::{Color, Pixmap};
///
/// let mut pm = Pixmap::new(16, 16).unwrap();
/// pm.fill(Color::TRANSPARENT);
/// assert_eq!(pm.width(), 16);
/// assert!(pm.has_alpha());
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct Pixmap {
  inner: tiny_skia::Pixmap,
}

impl Pixmap {
  /// Allocates a transparent pixmap
  ///
  /// Fails with [`PixmapError::InvalidSize`] for zero dimensions.
  pub fn new(width: u32, height: u32) -> Result<Self> {
    let inner = tiny_skia::Pixmap::new(width, height)
      .ok_or(PixmapError::InvalidSize { width, height })?;
    Ok(Self { inner })
  }

  /// Wraps an existing tiny-skia pixmap
  pub fn from_tiny_skia(inner: tiny_skia::Pixmap) -> Self {
    Self { inner }
  }

  /// Width in pixels
  pub fn width(&self) -> u32 {
    self.inner.width()
  }

  /// Height in pixels
  pub fn height(&self) -> u32 {
    self.inner.height()
  }

  /// The full pixmap extent as a rect at the origin
  pub fn rect(&self) -> Rect {
    Rect::from_xywh(0.0, 0.0, self.width() as f32, self.height() as f32)
  }

  /// Returns true if either dimension is zero
  ///
  /// Cannot normally happen (construction rejects it) but guards against
  /// future zero-copy constructors.
  pub fn is_empty(&self) -> bool {
    self.width() == 0 || self.height() == 0
  }

  /// Returns true if any pixel is not fully opaque
  ///
  /// Scans the buffer; callers on hot paths should cache the answer per
  /// source pixmap.
  pub fn has_alpha(&self) -> bool {
    self
      .inner
      .pixels()
      .iter()
      .any(|px| px.alpha() != u8::MAX)
  }

  /// Fills the whole pixmap with a color
  pub fn fill(&mut self, color: Color) {
    self.inner.fill(color.to_tiny_skia());
  }

  /// Copies a sub-rectangle into a new pixmap
  ///
  /// The rect is clamped to the pixmap bounds; returns `None` when the
  /// clamped rect is empty.
  pub fn sub_pixmap(&self, rect: Rect) -> Option<Pixmap> {
    let clamped = rect.intersection(&self.rect())?;
    let int_rect = tiny_skia::IntRect::from_xywh(
      clamped.x() as i32,
      clamped.y() as i32,
      (clamped.width() as u32).max(1),
      (clamped.height() as u32).max(1),
    )?;
    self.inner.clone_rect(int_rect).map(Self::from_tiny_skia)
  }

  /// Stamps `source` at integer offset `(x, y)` with source-over blending
  pub fn blit(&mut self, x: i32, y: i32, source: &Pixmap) {
    self.inner.draw_pixmap(
      x,
      y,
      source.inner.as_ref(),
      &tiny_skia::PixmapPaint::default(),
      tiny_skia::Transform::identity(),
      None,
    );
  }

  /// Builds an enlarged tile by self-blitting at doubling offsets
  ///
  /// Used by the tiled-pixmap fallback: stamping one big pre-composited
  /// tile beats stamping a tiny pixmap hundreds of times. Doubles the
  /// covered width, then the covered height, until the target extent is
  /// filled.
  pub fn enlarged_tile(&self, width: u32, height: u32) -> Result<Pixmap> {
    let mut tile = Pixmap::new(width, height)?;
    tile.blit(0, 0, self);
    let mut covered_w = self.width().min(width);
    while covered_w < width {
      let span = tile
        .sub_pixmap(Rect::from_xywh(0.0, 0.0, covered_w as f32, height as f32))
        .expect("covered span is non-empty");
      tile.blit(covered_w as i32, 0, &span);
      covered_w *= 2;
    }
    let mut covered_h = self.height().min(height);
    while covered_h < height {
      let span = tile
        .sub_pixmap(Rect::from_xywh(0.0, 0.0, width as f32, covered_h as f32))
        .expect("covered span is non-empty");
      tile.blit(0, covered_h as i32, &span);
      covered_h *= 2;
    }
    Ok(tile)
  }

  /// Encodes the pixmap as PNG bytes
  pub fn encode_png(&self) -> Result<Vec<u8>> {
    self.inner.encode_png().map_err(|e| {
      PixmapError::EncodeFailed {
        reason: e.to_string(),
      }
      .into()
    })
  }

  /// Decodes PNG bytes into a pixmap
  pub fn decode_png(data: &[u8]) -> Result<Self> {
    tiny_skia::Pixmap::decode_png(data)
      .map(Self::from_tiny_skia)
      .map_err(|e| {
        PixmapError::DecodeFailed {
          reason: e.to_string(),
        }
        .into()
      })
  }

  /// Borrow the underlying tiny-skia pixmap
  pub fn as_tiny_skia(&self) -> &tiny_skia::Pixmap {
    &self.inner
  }

  /// Mutably borrow the underlying tiny-skia pixmap
  pub fn as_tiny_skia_mut(&mut self) -> &mut tiny_skia::Pixmap {
    &mut self.inner
  }

  /// Consumes the wrapper
  pub fn into_tiny_skia(self) -> tiny_skia::Pixmap {
    self.inner
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_new_rejects_zero_size() {
    assert!(Pixmap::new(0, 10).is_err());
    assert!(Pixmap::new(10, 0).is_err());
    assert!(Pixmap::new(4, 4).is_ok());
  }

  #[test]
  fn test_has_alpha_after_fill() {
    let mut pm = Pixmap::new(4, 4).unwrap();
    pm.fill(Color::rgb(10, 20, 30));
    assert!(!pm.has_alpha());
    pm.fill(Color::new(10, 20, 30, 0.5));
    assert!(pm.has_alpha());
  }

  #[test]
  fn test_sub_pixmap_clamps() {
    let mut pm = Pixmap::new(8, 8).unwrap();
    pm.fill(Color::RED);
    let sub = pm
      .sub_pixmap(Rect::from_xywh(4.0, 4.0, 100.0, 100.0))
      .unwrap();
    assert_eq!(sub.width(), 4);
    assert_eq!(sub.height(), 4);
    assert!(pm
      .sub_pixmap(Rect::from_xywh(20.0, 20.0, 4.0, 4.0))
      .is_none());
  }

  #[test]
  fn test_enlarged_tile_covers_target() {
    let mut pm = Pixmap::new(3, 3).unwrap();
    pm.fill(Color::GREEN);
    let tile = pm.enlarged_tile(10, 7).unwrap();
    assert_eq!(tile.width(), 10);
    assert_eq!(tile.height(), 7);
    // Every pixel covered: corners of the tile carry the source color.
    let data = tile.as_tiny_skia().pixels();
    let last = data[data.len() - 1];
    assert_eq!(last.green(), 255);
  }

  #[test]
  fn test_png_round_trip() {
    let mut pm = Pixmap::new(5, 5).unwrap();
    pm.fill(Color::BLUE);
    let png = pm.encode_png().unwrap();
    let back = Pixmap::decode_png(&png).unwrap();
    assert_eq!(back.width(), 5);
  }
}
