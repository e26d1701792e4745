//! Layout vocabulary: orientations, size policies, control types, alignment
//!
//! These are the small value types the grid engine and its items speak.
//! [`SizePolicy`] is a flag set rather than an enum so the stretch/box
//! derivations can test individual capabilities (`GROW`, `EXPAND`,
//! `SHRINK`, `IGNORE`) the way the distribution algorithm needs to.

use bitflags::bitflags;

/// Which axis a query or parameter applies to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Orientation {
  Horizontal,
  Vertical,
}

impl Orientation {
  /// Index for per-axis storage (horizontal = 0)
  pub fn index(self) -> usize {
    match self {
      Orientation::Horizontal => 0,
      Orientation::Vertical => 1,
    }
  }

  /// The other axis
  pub fn other(self) -> Orientation {
    match self {
      Orientation::Horizontal => Orientation::Vertical,
      Orientation::Vertical => Orientation::Horizontal,
    }
  }
}

/// Which of the three sizes a hint query asks for
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SizeHintKind {
  Minimum,
  Preferred,
  Maximum,
}

impl SizeHintKind {
  /// All kinds, in minimum → maximum order (the multi-cell distribution
  /// iterates them)
  pub const ALL: [SizeHintKind; 3] = [
    SizeHintKind::Minimum,
    SizeHintKind::Preferred,
    SizeHintKind::Maximum,
  ];
}

bitflags! {
  /// Per-axis sizing capabilities of an item
  #[derive(Debug, Clone, Copy, PartialEq, Eq)]
  pub struct SizePolicy: u8 {
    /// May grow beyond the preferred size when space is available
    const GROW   = 1 << 0;
    /// Wants as much space as possible (derives stretch 1)
    const EXPAND = 1 << 1;
    /// May shrink below the preferred size down to the minimum
    const SHRINK = 1 << 2;
    /// Size hints are disregarded entirely
    const IGNORE = 1 << 3;
  }
}

impl SizePolicy {
  /// Exactly the preferred size
  pub const FIXED: Self = Self::empty();
  /// Preferred is minimal; may grow
  pub const MINIMUM: Self = Self::GROW;
  /// Preferred is maximal; may shrink
  pub const MAXIMUM: Self = Self::SHRINK;
  /// May shrink and grow around the preferred size (the usual default)
  pub const PREFERRED: Self = Self::GROW.union(Self::SHRINK);
  /// May shrink and actively wants to grow
  pub const EXPANDING: Self = Self::GROW.union(Self::SHRINK).union(Self::EXPAND);
  /// Preferred is minimal and actively wants to grow
  pub const MINIMUM_EXPANDING: Self = Self::GROW.union(Self::EXPAND);
  /// Takes whatever it is given
  pub const IGNORED: Self = Self::GROW.union(Self::SHRINK).union(Self::IGNORE);
}

impl Default for SizePolicy {
  fn default() -> Self {
    Self::PREFERRED
  }
}

/// Widget classification consumed by the style spacing hook
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControlType {
  Default,
  ButtonBox,
  PushButton,
  CheckBox,
  RadioButton,
  Label,
  Frame,
  LineEdit,
  Slider,
}

impl ControlType {
  /// Returns true for the button-like controls the trailing button-box
  /// spacing heuristic looks for
  pub fn is_button_like(self) -> bool {
    matches!(
      self,
      ControlType::ButtonBox
        | ControlType::PushButton
        | ControlType::CheckBox
        | ControlType::RadioButton
    )
  }
}

bitflags! {
  /// Alignment of an item within its cell
  ///
  /// An empty axis mask means "fill the cell along that axis".
  #[derive(Debug, Clone, Copy, PartialEq, Eq)]
  pub struct Alignment: u16 {
    const LEFT     = 1 << 0;
    const RIGHT    = 1 << 1;
    const HCENTER  = 1 << 2;
    const TOP      = 1 << 4;
    const BOTTOM   = 1 << 5;
    const VCENTER  = 1 << 6;
    /// Align the item's text baseline with the row baseline
    const BASELINE = 1 << 7;
  }
}

impl Alignment {
  /// The horizontal bits
  pub const HORIZONTAL_MASK: Self = Self::LEFT.union(Self::RIGHT).union(Self::HCENTER);
  /// The vertical bits
  pub const VERTICAL_MASK: Self = Self::TOP
    .union(Self::BOTTOM)
    .union(Self::VCENTER)
    .union(Self::BASELINE);

  /// Just the horizontal component
  pub fn horizontal(self) -> Alignment {
    self & Self::HORIZONTAL_MASK
  }

  /// Just the vertical component
  pub fn vertical(self) -> Alignment {
    self & Self::VERTICAL_MASK
  }
}

impl Default for Alignment {
  fn default() -> Self {
    Alignment::empty()
  }
}

/// Whether final x positions are mirrored for right-to-left locales
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum VisualDirection {
  #[default]
  LeftToRight,
  RightToLeft,
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_policy_presets() {
    assert!(SizePolicy::EXPANDING.contains(SizePolicy::GROW));
    assert!(SizePolicy::EXPANDING.contains(SizePolicy::EXPAND));
    assert!(!SizePolicy::FIXED.contains(SizePolicy::GROW));
    assert!(SizePolicy::IGNORED.contains(SizePolicy::IGNORE));
  }

  #[test]
  fn test_alignment_masks() {
    let align = Alignment::RIGHT | Alignment::VCENTER;
    assert_eq!(align.horizontal(), Alignment::RIGHT);
    assert_eq!(align.vertical(), Alignment::VCENTER);
    assert!(Alignment::BASELINE.vertical() == Alignment::BASELINE);
  }

  #[test]
  fn test_button_like_classification() {
    assert!(ControlType::PushButton.is_button_like());
    assert!(ControlType::ButtonBox.is_button_like());
    assert!(!ControlType::Label.is_button_like());
    assert!(!ControlType::Default.is_button_like());
  }

  #[test]
  fn test_orientation_helpers() {
    assert_eq!(Orientation::Horizontal.other(), Orientation::Vertical);
    assert_eq!(Orientation::Horizontal.index(), 0);
    assert_eq!(Orientation::Vertical.index(), 1);
  }
}
