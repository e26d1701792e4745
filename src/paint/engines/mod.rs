//! Concrete paint engines
//!
//! Three backends illustrating the contract from opposite ends:
//!
//! - [`RasterEngine`] — fully capable software rasterizer; the target of
//!   the painter's offscreen emulation
//! - [`PictureEngine`] — vector recorder producing a replayable
//!   [`Picture`]
//! - [`WindowEngine`] — minimal-capability engine over an abstract
//!   [`WindowSurface`], the worst-case native backend

pub mod picture;
pub mod raster;
pub mod window;

pub use picture::{Picture, PictureCommand, PictureEngine};
pub use raster::RasterEngine;
pub use window::{TestSurface, WindowEngine, WindowSurface};
