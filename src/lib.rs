//! easelkit — the 2D painting and grid layout core of a GUI toolkit
//!
//! Two independent subsystems share this crate:
//!
//! - **Painting** ([`paint`]): a device-independent [`Painter`] façade
//!   dispatching to pluggable [`PaintEngine`] backends, with automatic
//!   software emulation of any capability a backend lacks. Three engines
//!   ship: a fully capable tiny-skia rasterizer, a vector recorder
//!   ([`paint::engines::Picture`]), and a minimal windowing-system engine.
//! - **Layout** ([`layout`]): a constraint-based [`GridLayoutEngine`]
//!   solving per-axis min/preferred/max distribution with spans, stretch
//!   factors and baseline alignment.

pub mod error;
pub mod geometry;
pub mod layout;
pub mod paint;
pub mod transform;

pub use error::{Error, Result};
pub use geometry::{Line, Point, Rect, Size};
pub use transform::{Transform, TransformType};

pub use paint::{
  BackgroundMode, Brush, BrushStyle, CapStyle, ClipOperation, Color, CompositionMode, DirtyFlags,
  EngineFeatures, EngineType, FillRule, JoinStyle, PaintEngine, Painter, PainterPath,
  PainterState, Pen, PenStyle, Pixmap, RenderHints, TextItem,
};

pub use layout::{
  Alignment, ControlType, GridItem, GridLayoutEngine, LayoutBox, LayoutStyle, Layoutable,
  Orientation, SizeHintKind, SizePolicy,
};
