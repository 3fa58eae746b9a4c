//! Layout -> canonical raster -> projector frame.

/// Pixel compositing helpers.
pub mod composite;
/// Opaque RGBA frames and PNG output.
pub mod frame;
/// The end-to-end render pipeline.
pub mod pipeline;
/// SVG rasterization and image assets.
pub mod raster;
/// Canonical SVG synthesis.
pub mod svg;
/// Perspective pre-warp and bypass resize.
pub mod warp;
