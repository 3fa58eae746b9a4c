//! Contracts of the collaborators around the core: persistence, asset lookup and viewer
//! broadcast. The core never retries IO; failures come back as [`PressError`] values.

use std::collections::BTreeMap;
use std::path::{Component, Path, PathBuf};

use anyhow::Context as _;
use parking_lot::Mutex;

use crate::calibration::calibrator::CalibrationRecord;
use crate::foundation::core::PressId;
use crate::foundation::error::{PressError, PressResult};
use crate::layout::model::{Layout, LayoutElement};
use crate::layout::portable::Scene;
use crate::operation::mode::OperationMode;
use crate::render::frame::{RasterImage, RenderedFrame};
use crate::render::raster::{ImageSet, ResolvedImage};

/// Persistence of per-press calibration records.
pub trait CalibrationStore: Send + Sync {
    /// Stored record of `press`, or `None` if the press was never calibrated.
    fn load_calibration(&self, press: &PressId) -> PressResult<Option<CalibrationRecord>>;
    /// Replace the stored record of `press`.
    fn save_calibration(&self, press: &PressId, record: &CalibrationRecord) -> PressResult<()>;
}

/// Persistence of named portable scenes.
pub trait SceneStore: Send + Sync {
    /// Scene stored under `name`, if any.
    fn load_scene(&self, name: &str) -> PressResult<Option<Scene>>;
    /// Store `scene` under `name`, replacing any previous one.
    fn save_scene(&self, name: &str, scene: &Scene) -> PressResult<()>;
    /// Stored scene names in ascending order.
    fn list_scenes(&self) -> PressResult<Vec<String>>;
    /// Name of the scene most recently loaded into a press, if any.
    fn last_scene(&self) -> PressResult<Option<String>>;
    /// Remember `name` as the most recently loaded scene.
    fn set_last_scene(&self, name: &str) -> PressResult<()>;
}

/// Lookup of image element references.
pub trait AssetResolver: Send + Sync {
    /// Encoded bytes and pixel size of the image behind `href`.
    fn resolve_image(&self, href: &str) -> PressResult<ResolvedImage>;
}

/// Fire-and-forget delivery to subscribed viewers.
pub trait FrameBroadcaster: Send + Sync {
    /// Publish a projector frame for a press (scene setup) or production group.
    fn publish_frame(&self, target: &str, frame: &RasterImage, mode: OperationMode);
    /// Publish a layout snapshot for editor previews.
    fn publish_layout(&self, layout: &Layout, mode: OperationMode);
    /// Tell viewers of `target` that a render was skipped; their previous frame stays up.
    fn notify_render_skipped(&self, target: &str, reason: &PressError, mode: OperationMode);
}

/// A render that was skipped instead of published.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SkippedRender {
    /// Press name or production group.
    pub target: String,
    /// Mode of the skipped request.
    pub mode: OperationMode,
    /// Display form of the error that stopped the render.
    pub reason: String,
}

/// Resolve every image referenced by `layout`.
///
/// References that fail to resolve are left out with a warning; the drawing skips them.
pub fn resolve_layout_images(assets: &dyn AssetResolver, layout: &Layout) -> ImageSet {
    let mut set = ImageSet::new();
    for element in &layout.elements {
        let LayoutElement::Image(img) = element else {
            continue;
        };
        if set.contains_key(&img.image_ref) {
            continue;
        }
        match assets.resolve_image(&img.image_ref) {
            Ok(resolved) => {
                set.insert(img.image_ref.clone(), resolved);
            }
            Err(e) => tracing::warn!(image = %img.image_ref, error = %e, "image not resolved"),
        }
    }
    set
}

/// Calibration and scene storage kept in process memory.
#[derive(Debug, Default)]
pub struct InMemoryStore {
    calibrations: Mutex<BTreeMap<PressId, CalibrationRecord>>,
    scenes: Mutex<BTreeMap<String, Scene>>,
    last_scene: Mutex<Option<String>>,
}

impl InMemoryStore {
    /// Empty store.
    pub fn new() -> Self {
        Self::default()
    }
}

impl CalibrationStore for InMemoryStore {
    fn load_calibration(&self, press: &PressId) -> PressResult<Option<CalibrationRecord>> {
        Ok(self.calibrations.lock().get(press).cloned())
    }

    fn save_calibration(&self, press: &PressId, record: &CalibrationRecord) -> PressResult<()> {
        self.calibrations.lock().insert(press.clone(), record.clone());
        Ok(())
    }
}

impl SceneStore for InMemoryStore {
    fn load_scene(&self, name: &str) -> PressResult<Option<Scene>> {
        Ok(self.scenes.lock().get(name).cloned())
    }

    fn save_scene(&self, name: &str, scene: &Scene) -> PressResult<()> {
        if name.trim().is_empty() {
            return Err(PressError::validation("scene name must be non-empty"));
        }
        self.scenes.lock().insert(name.to_owned(), scene.clone());
        Ok(())
    }

    fn list_scenes(&self) -> PressResult<Vec<String>> {
        Ok(self.scenes.lock().keys().cloned().collect())
    }

    fn last_scene(&self) -> PressResult<Option<String>> {
        Ok(self.last_scene.lock().clone())
    }

    fn set_last_scene(&self, name: &str) -> PressResult<()> {
        *self.last_scene.lock() = Some(name.to_owned());
        Ok(())
    }
}

/// Resolver with no assets; every lookup is [`PressError::NotFound`].
#[derive(Clone, Copy, Debug, Default)]
pub struct NullAssets;

impl AssetResolver for NullAssets {
    fn resolve_image(&self, href: &str) -> PressResult<ResolvedImage> {
        Err(PressError::not_found(format!("image '{href}'")))
    }
}

/// Resolver reading image files relative to a root directory.
#[derive(Clone, Debug)]
pub struct DirAssets {
    root: PathBuf,
}

impl DirAssets {
    /// Resolve references below `root`.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    fn path_for(&self, href: &str) -> PressResult<PathBuf> {
        let rel = Path::new(href.trim_start_matches("./"));
        let escapes = rel
            .components()
            .any(|c| !matches!(c, Component::Normal(_) | Component::CurDir));
        if href.is_empty() || escapes {
            return Err(PressError::validation(format!(
                "image reference '{href}' must be a relative path below the asset root"
            )));
        }
        Ok(self.root.join(rel))
    }
}

impl AssetResolver for DirAssets {
    fn resolve_image(&self, href: &str) -> PressResult<ResolvedImage> {
        let path = self.path_for(href)?;
        if !path.is_file() {
            return Err(PressError::not_found(format!("image '{}'", path.display())));
        }
        let bytes =
            std::fs::read(&path).with_context(|| format!("read image '{}'", path.display()))?;
        ResolvedImage::from_bytes(bytes)
    }
}

/// Broadcaster that keeps everything it was given (tests and debugging).
#[derive(Debug, Default)]
pub struct RecordingBroadcaster {
    frames: Mutex<Vec<RenderedFrame>>,
    layouts: Mutex<Vec<(Layout, OperationMode)>>,
    skipped: Mutex<Vec<SkippedRender>>,
}

impl RecordingBroadcaster {
    /// Empty recorder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Frames published so far, oldest first.
    pub fn frames(&self) -> Vec<RenderedFrame> {
        self.frames.lock().clone()
    }

    /// Layout snapshots published so far, oldest first.
    pub fn layouts(&self) -> Vec<(Layout, OperationMode)> {
        self.layouts.lock().clone()
    }

    /// Skipped-render notifications so far, oldest first.
    pub fn skipped(&self) -> Vec<SkippedRender> {
        self.skipped.lock().clone()
    }

    /// Most recent frame, if any.
    pub fn last_frame(&self) -> Option<RenderedFrame> {
        self.frames.lock().last().cloned()
    }
}

impl FrameBroadcaster for RecordingBroadcaster {
    fn publish_frame(&self, target: &str, frame: &RasterImage, mode: OperationMode) {
        self.frames.lock().push(RenderedFrame {
            target: target.to_owned(),
            mode,
            image: frame.clone(),
        });
    }

    fn publish_layout(&self, layout: &Layout, mode: OperationMode) {
        self.layouts.lock().push((layout.clone(), mode));
    }

    fn notify_render_skipped(&self, target: &str, reason: &PressError, mode: OperationMode) {
        self.skipped.lock().push(SkippedRender {
            target: target.to_owned(),
            mode,
            reason: reason.to_string(),
        });
    }
}

#[cfg(test)]
#[path = "../../tests/unit/service/collab.rs"]
mod tests;
