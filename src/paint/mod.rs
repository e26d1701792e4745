//! The painting system
//!
//! Everything between client draw calls and backend pixels:
//!
//! - Value types: [`color::Color`], [`pen::Pen`], [`brush::Brush`],
//!   [`path::PainterPath`], [`pixmap::Pixmap`], [`text::TextItem`]
//! - The drawing context: [`state::PainterState`] with its dirty-flag
//!   protocol and recorded clip history
//! - The backend contract: [`engine::PaintEngine`] with required and
//!   default-provided primitives ([`fallback`])
//! - The façade: [`painter::Painter`], with capability arbitration and
//!   software emulation ([`emulation`])
//! - Concrete backends: [`engines`]

pub mod brush;
pub mod color;
pub mod emulation;
pub mod engine;
pub mod engines;
pub mod fallback;
pub mod painter;
pub mod path;
pub mod pen;
pub mod pixmap;
pub mod state;
pub mod text;

pub use brush::{
  Brush, BrushStyle, ConicalGradient, CoordinateMode, GradientSpread, GradientStop, HatchPattern,
  LinearGradient, RadialGradient,
};
pub use color::Color;
pub use engine::{EngineCore, EngineFeatures, EngineType, PaintEngine, PolygonMode};
pub use painter::Painter;
pub use path::{FillRule, PainterPath, PathElement};
pub use pen::{CapStyle, JoinStyle, Pen, PenStyle};
pub use pixmap::Pixmap;
pub use state::{
  BackgroundMode, ClipEntry, ClipOperation, ClipShape, CompositionMode, DirtyFlags, PainterState,
  RenderHints,
};
pub use text::{BoxFontEngine, FontEngine, FontMetrics, Glyph, TextItem};
