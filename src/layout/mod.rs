//! The grid layout system
//!
//! A constraint-based, non-interactive layout pipeline: clients populate a
//! [`GridLayoutEngine`] with [`GridItem`]s and per-line parameters, then
//! ask for size hints or final geometries. Solving is per axis
//! ([`LayoutBox`] algebra plus the distribution solver); nothing here
//! draws.

pub mod engine;
pub mod item;
pub mod layout_box;
pub mod policy;
pub mod style;

pub use engine::GridLayoutEngine;
pub use item::{GridItem, Layoutable, SizedBox};
pub use layout_box::LayoutBox;
pub use policy::{Alignment, ControlType, Orientation, SizeHintKind, SizePolicy, VisualDirection};
pub use style::{DefaultLayoutStyle, LayoutStyle};
