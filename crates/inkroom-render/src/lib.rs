//! InkRoom Render Library
//!
//! Renderer abstraction and implementations for InkRoom.
//! The default implementation builds Vello scenes; PNG export runs on the CPU.

pub mod grid;
pub mod raster;
mod renderer;

#[cfg(feature = "vello-renderer")]
mod vello_impl;

pub use grid::GridCache;
pub use raster::{ExportLayout, export_png, rasterize};
pub use renderer::{
    DASH_LENGTH, GRID_COLOR, GRID_PITCH, HALO_INFLATE, HALO_WIDTH, MARQUEE_FILL, MARQUEE_WIDTH,
    RenderContext, RenderResult, Renderer, RendererError, SELECTION_COLOR,
};

#[cfg(feature = "vello-renderer")]
pub use vello_impl::VelloRenderer;
