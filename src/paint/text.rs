//! Text items and the font-engine seam
//!
//! Shaping is an external concern: by the time text reaches the painter it
//! is a [`TextItem`] — glyph ids with resolved positions. The painter and
//! the engine defaults only need two things from a font: outline geometry
//! per glyph, and metrics for the box-drawing fallback used by fonts that
//! have no real outlines.

use crate::geometry::Point;
use crate::paint::path::PainterPath;
use std::fmt;
use std::sync::Arc;

/// One positioned glyph in a shaped run
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Glyph {
  /// Glyph id in the font (not a character)
  pub id: u32,
  /// Baseline-relative position of the glyph origin
  pub position: Point,
}

/// Vertical metrics of a font at its rendering size
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FontMetrics {
  /// Distance from baseline to the top of the em box
  pub ascent: f32,
  /// Distance from baseline to the bottom of the em box (positive)
  pub descent: f32,
  /// Recommended underline/strikeout thickness
  pub line_thickness: f32,
}

/// The font capability the paint system consumes
///
/// Implementations wrap a real font backend; the crate ships only
/// [`BoxFontEngine`], the outline-less fallback used when no font data is
/// available.
pub trait FontEngine: fmt::Debug + Send + Sync {
  /// Metrics at the engine's rendering size
  fn metrics(&self) -> FontMetrics;

  /// Returns false for fallback fonts that cannot produce outlines
  fn has_outlines(&self) -> bool {
    true
  }

  /// Filled outline of one glyph, origin at the glyph's baseline origin
  fn glyph_outline(&self, glyph: u32) -> Option<PainterPath>;

  /// Horizontal advance of one glyph
  fn glyph_advance(&self, glyph: u32) -> f32;
}

/// A shaped glyph run ready to draw
///
/// # Examples
///
/// ```
/// use easelkit::paint::text::{BoxFontEngine, Glyph, TextItem};
/// use easelkit::Point;
/// use std::sync::Arc;
///
/// let font = Arc::new(BoxFontEngine::new(12.0));
/// let item = TextItem::new(
///   vec![Glyph { id: 1, position: Point::new(0.0, 0.0) }],
///   font,
/// );
/// assert_eq!(item.glyphs.len(), 1);
/// ```
#[derive(Debug, Clone)]
pub struct TextItem {
  /// Positioned glyphs, already shaped and bidi-resolved
  pub glyphs: Vec<Glyph>,
  /// The font that produced the run
  pub font: Arc<dyn FontEngine>,
}

impl TextItem {
  pub fn new(glyphs: Vec<Glyph>, font: Arc<dyn FontEngine>) -> Self {
    Self { glyphs, font }
  }

  /// Returns true if there is nothing to draw
  pub fn is_empty(&self) -> bool {
    self.glyphs.is_empty()
  }
}

/// Fallback font with no outlines
///
/// Every glyph is an em-sized box; the engine default draws the box outline
/// plus a bar underneath to approximate character cells. Useful in tests
/// and as a last-resort substitute when font loading fails.
#[derive(Debug, Clone, Copy)]
pub struct BoxFontEngine {
  size: f32,
}

impl BoxFontEngine {
  /// Creates a box font rendering at the given pixel size
  pub fn new(size: f32) -> Self {
    Self {
      size: size.max(1.0),
    }
  }

  /// The box size
  pub fn size(&self) -> f32 {
    self.size
  }
}

impl Default for BoxFontEngine {
  fn default() -> Self {
    Self::new(12.0)
  }
}

impl FontEngine for BoxFontEngine {
  fn metrics(&self) -> FontMetrics {
    FontMetrics {
      ascent: self.size * 0.8,
      descent: self.size * 0.2,
      line_thickness: (self.size / 12.0).max(1.0),
    }
  }

  fn has_outlines(&self) -> bool {
    false
  }

  fn glyph_outline(&self, _glyph: u32) -> Option<PainterPath> {
    None
  }

  fn glyph_advance(&self, _glyph: u32) -> f32 {
    self.size
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_box_font_has_no_outlines() {
    let font = BoxFontEngine::new(16.0);
    assert!(!font.has_outlines());
    assert!(font.glyph_outline(42).is_none());
    assert_eq!(font.glyph_advance(42), 16.0);
  }

  #[test]
  fn test_box_font_metrics_sum_to_size() {
    let font = BoxFontEngine::new(20.0);
    let m = font.metrics();
    assert!((m.ascent + m.descent - 20.0).abs() < 1e-4);
  }

  #[test]
  fn test_box_font_clamps_size() {
    assert_eq!(BoxFontEngine::new(0.0).size(), 1.0);
  }
}
