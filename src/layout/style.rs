//! The style hook: spacing and margin metrics
//!
//! The grid engine never hardcodes spacing. When no explicit per-line
//! spacing is set it asks a [`LayoutStyle`] for the recommended gap given
//! the control types on either side — a pure function with no layout
//! state. [`DefaultLayoutStyle`] provides fixed desktop-ish metrics for
//! tests and headless use.

use crate::layout::policy::{ControlType, Orientation};

/// Style-provided spacing metrics
pub trait LayoutStyle {
  /// Recommended gap between two adjacent controls along `orientation`
  fn combined_spacing(&self, a: ControlType, b: ControlType, orientation: Orientation) -> f32;

  /// Recommended gap when the adjacent control types are unknown
  fn default_spacing(&self, orientation: Orientation) -> f32;

  /// Margin between content and the window edge
  ///
  /// Also used as the gap above a trailing button box, which hugs the
  /// window edge rather than the content above it.
  fn window_margin(&self, orientation: Orientation) -> f32;

  /// Monotonic counter bumped whenever the style's metrics change
  ///
  /// Cached geometries are keyed on this; a style with fixed metrics can
  /// leave it at 0.
  fn generation(&self) -> u64 {
    0
  }
}

/// Fixed metrics in the conventional desktop range
#[derive(Debug, Clone, Copy)]
pub struct DefaultLayoutStyle {
  pub spacing: f32,
  pub related_button_spacing: f32,
  pub margin: f32,
}

impl DefaultLayoutStyle {
  pub fn new() -> Self {
    Self {
      spacing: 6.0,
      related_button_spacing: 4.0,
      margin: 11.0,
    }
  }
}

impl Default for DefaultLayoutStyle {
  fn default() -> Self {
    Self::new()
  }
}

impl LayoutStyle for DefaultLayoutStyle {
  fn combined_spacing(&self, a: ControlType, b: ControlType, _orientation: Orientation) -> f32 {
    // Related button-ish controls sit slightly tighter.
    if a.is_button_like() && b.is_button_like() {
      self.related_button_spacing
    } else {
      self.spacing
    }
  }

  fn default_spacing(&self, _orientation: Orientation) -> f32 {
    self.spacing
  }

  fn window_margin(&self, _orientation: Orientation) -> f32 {
    self.margin
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_default_style_metrics() {
    let style = DefaultLayoutStyle::new();
    assert_eq!(
      style.combined_spacing(ControlType::Label, ControlType::LineEdit, Orientation::Horizontal),
      6.0
    );
    assert_eq!(
      style.combined_spacing(
        ControlType::PushButton,
        ControlType::PushButton,
        Orientation::Horizontal
      ),
      4.0
    );
    assert_eq!(style.window_margin(Orientation::Vertical), 11.0);
  }
}
