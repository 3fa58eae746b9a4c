//! Pressmap projects alignment overlays onto printing presses.
//!
//! A press is calibrated once by clicking its four corners in projector pixels. Layouts are
//! authored in press millimeters, drawn into an undistorted canonical raster and pre-warped
//! through the calibration so they land on the physical press:
//!
//! - Calibrate with a [`Calibrator`]
//! - Edit a [`Layout`] through a [`LayoutModel`], or load a portable [`Scene`]
//! - Render frames with a [`RenderPipeline`], or run the whole service through a
//!   [`PressRegistry`]
#![forbid(unsafe_code)]
#![deny(missing_docs)]

/// Four-point calibration.
pub mod calibration;
/// Shared primitives.
pub mod foundation;
/// Overlay layouts and portable scenes.
pub mod layout;
/// Operation mode tracking.
pub mod operation;
/// Rendering.
pub mod render;
/// Render scheduling.
pub mod schedule;
/// Service layer.
pub mod service;

pub use crate::foundation::config::ProjectorConfig;
pub use crate::foundation::core::{Canvas, Point, PressId, Vec2};
pub use crate::foundation::error::{CalibrationError, PressError, PressResult};

pub use crate::calibration::calibrator::{CalibrationRecord, Calibrator, RoundTripReport};
pub use crate::calibration::homography::Homography;
pub use crate::layout::color::Color;
pub use crate::layout::model::{CenterLines, Layout, LayoutElement, LayoutModel, LayoutPatch};
pub use crate::layout::portable::{Scene, to_absolute, to_relative};
pub use crate::operation::mode::{OperationMode, OperationModeController, OperationState};
pub use crate::render::frame::{RasterImage, RenderedFrame};
pub use crate::render::pipeline::{PressRender, RenderOptions, RenderPipeline, WarpMode};
pub use crate::render::raster::{ImageSet, ResolvedImage, SvgRasterizer};
pub use crate::schedule::scheduler::{RenderScheduler, SubmitOutcome};
pub use crate::schedule::ticker::RepeatingTask;
pub use crate::service::collab::{
    AssetResolver, CalibrationStore, DirAssets, FrameBroadcaster, InMemoryStore, NullAssets,
    RecordingBroadcaster, SceneStore, SkippedRender, resolve_layout_images,
};
pub use crate::service::registry::{Collaborators, OperationReport, PressRegistry};
