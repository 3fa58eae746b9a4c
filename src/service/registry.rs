//! Shared per-press state and the operations exposed to request handlers.
//!
//! Handlers mutate state under short locks and hand rendering to the coalescing
//! [`RenderScheduler`]; nothing here blocks on a render.

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

use parking_lot::{Mutex, RwLock};

use crate::calibration::calibrator::{CalibrationRecord, Calibrator};
use crate::foundation::config::ProjectorConfig;
use crate::foundation::core::{Canvas, Point, PressId};
use crate::foundation::error::{PressError, PressResult};
use crate::layout::model::{Layout, LayoutModel, LayoutPatch};
use crate::layout::portable::{Scene, to_relative};
use crate::operation::mode::{OperationMode, OperationModeController, PressSummary};
use crate::render::frame::RasterImage;
use crate::render::pipeline::{PressRender, RenderPipeline};
use crate::render::raster::ImageSet;
use crate::schedule::scheduler::{RenderScheduler, SchedulerStats, SubmitOutcome};
use crate::schedule::ticker::RepeatingTask;
use crate::service::collab::{
    AssetResolver, CalibrationStore, FrameBroadcaster, SceneStore, resolve_layout_images,
};

/// Broadcast target of production frames.
pub const PRODUCTION_TARGET: &str = "production";

/// The collaborators a registry talks to.
#[derive(Clone)]
pub struct Collaborators {
    /// Calibration persistence.
    pub calibrations: Arc<dyn CalibrationStore>,
    /// Scene persistence.
    pub scenes: Arc<dyn SceneStore>,
    /// Image lookup.
    pub assets: Arc<dyn AssetResolver>,
    /// Viewer delivery.
    pub broadcaster: Arc<dyn FrameBroadcaster>,
}

/// Layout snapshot taken when a render is requested.
#[derive(Clone, Debug, PartialEq)]
pub struct RenderRequest {
    /// Mode at request time.
    pub mode: OperationMode,
    /// Projector resolution at request time.
    pub output: Canvas,
    /// Press layouts to render: the active press in scene setup, every assigned press in
    /// production.
    pub presses: Vec<(PressId, Layout)>,
}

impl RenderRequest {
    fn target(&self) -> String {
        match (self.mode, self.presses.first()) {
            (OperationMode::SceneSetup, Some((id, _))) => id.to_string(),
            _ => PRODUCTION_TARGET.to_owned(),
        }
    }
}

/// Mode plus per-press scene assignments.
#[derive(Clone, Debug, PartialEq, serde::Serialize)]
pub struct OperationReport {
    /// Current mode.
    pub mode: OperationMode,
    /// Press edited in scene setup.
    pub active_press: Option<PressId>,
    /// Presses with a loaded scene.
    pub presses: Vec<PressSummary>,
}

struct Shared {
    config: ProjectorConfig,
    output: RwLock<Canvas>,
    pipeline: RenderPipeline,
    calibrators: RwLock<BTreeMap<PressId, Calibrator>>,
    layouts: Mutex<BTreeMap<PressId, LayoutModel>>,
    operation: Mutex<OperationModeController>,
    active: Mutex<Option<PressId>>,
    collab: Collaborators,
}

/// Owner of every press's calibration, live layout and scene assignment.
///
/// Cloning is cheap; clones share state and the render gate.
#[derive(Clone)]
pub struct PressRegistry {
    shared: Arc<Shared>,
    scheduler: RenderScheduler<RenderRequest>,
}

impl std::fmt::Debug for PressRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PressRegistry")
            .field("presses", &self.shared.calibrators.read().len())
            .field("scheduler", &self.scheduler)
            .finish_non_exhaustive()
    }
}

impl PressRegistry {
    /// Registry with a system-font render pipeline.
    pub fn new(config: ProjectorConfig, collab: Collaborators) -> PressResult<Self> {
        let pipeline = RenderPipeline::new(config.render_options());
        Self::with_pipeline(config, pipeline, collab)
    }

    /// Registry with an explicit pipeline.
    pub fn with_pipeline(
        config: ProjectorConfig,
        pipeline: RenderPipeline,
        collab: Collaborators,
    ) -> PressResult<Self> {
        config.validate()?;
        let shared = Arc::new(Shared {
            output: RwLock::new(config.output),
            config,
            pipeline,
            calibrators: RwLock::new(BTreeMap::new()),
            layouts: Mutex::new(BTreeMap::new()),
            operation: Mutex::new(OperationModeController::new()),
            active: Mutex::new(None),
            collab,
        });
        let worker = Arc::clone(&shared);
        let scheduler = RenderScheduler::new("pressmap", move |req: RenderRequest| {
            render_request(&worker, &req)
        });
        Ok(Self { shared, scheduler })
    }

    /// Configuration the registry was built with.
    ///
    /// `config().output` is the initial projector resolution; see [`Self::output_resolution`].
    pub fn config(&self) -> &ProjectorConfig {
        &self.shared.config
    }

    /// Projector resolution new render requests are sized to.
    pub fn output_resolution(&self) -> Canvas {
        *self.shared.output.read()
    }

    /// Switch the projector resolution (e.g. as reported by a viewer) and schedule a render.
    ///
    /// Requests already queued keep the resolution they were submitted with.
    pub fn set_output_resolution(&self, output: Canvas) -> PressResult<()> {
        let output = Canvas::new(output.width, output.height)?;
        let previous = std::mem::replace(&mut *self.shared.output.write(), output);
        if previous != output {
            tracing::info!(w = output.width, h = output.height, "projector resolution changed");
        }
        self.request_render()?;
        Ok(())
    }

    /// Apply an editor patch to the live layout of `press` and schedule a render.
    pub fn submit_layout_update(&self, press: &PressId, patch: LayoutPatch) -> PressResult<Layout> {
        let snapshot = {
            let mut layouts = self.shared.layouts.lock();
            let model = layouts.entry(press.clone()).or_insert_with(LayoutModel::new);
            model.apply_patch(patch)?;
            model.snapshot()
        };
        self.shared
            .collab
            .broadcaster
            .publish_layout(&snapshot, self.get_operation_mode());
        self.request_render()?;
        Ok(snapshot)
    }

    /// Calibrate `press` from four projector points, persist the record and schedule a render.
    ///
    /// A rejected calibration leaves the previous one in place.
    pub fn submit_calibration(
        &self,
        press: &PressId,
        points: &[Point],
        press_width_mm: f64,
        press_height_mm: f64,
    ) -> PressResult<CalibrationRecord> {
        let record = {
            let mut cals = self.shared.calibrators.write();
            let cal = cals
                .entry(press.clone())
                .or_insert_with(|| Calibrator::with_density(self.shared.config.raster_density_px_per_mm));
            cal.set_points(points, press_width_mm, press_height_mm)
                .inspect_err(|e| tracing::warn!(%press, error = %e, "calibration rejected"))?;
            cal.export()?
        };
        tracing::info!(%press, w_mm = press_width_mm, h_mm = press_height_mm, "press calibrated");
        self.shared.collab.calibrations.save_calibration(press, &record)?;
        self.request_render()?;
        Ok(record)
    }

    /// Replay the stored calibration of `press`. Returns `false` if none is stored.
    pub fn load_calibration(&self, press: &PressId) -> PressResult<bool> {
        let Some(record) = self.shared.collab.calibrations.load_calibration(press)? else {
            return Ok(false);
        };
        let cal = Calibrator::from_record(&record, self.shared.config.raster_density_px_per_mm)?;
        self.shared.calibrators.write().insert(press.clone(), cal);
        Ok(true)
    }

    /// Snapshot of the calibrator of `press`.
    pub fn calibrator(&self, press: &PressId) -> Option<Calibrator> {
        self.shared.calibrators.read().get(press).cloned()
    }

    /// Snapshot of the live layout of `press`.
    pub fn layout(&self, press: &PressId) -> Option<Layout> {
        self.shared.layouts.lock().get(press).map(LayoutModel::snapshot)
    }

    /// Store the live layout of `press` as a portable scene named `name`.
    pub fn save_scene(&self, name: &str, press: &PressId) -> PressResult<Scene> {
        let layout = self
            .layout(press)
            .ok_or_else(|| PressError::not_found(format!("layout of press '{press}'")))?;
        let scene = to_relative(&layout);
        self.shared.collab.scenes.save_scene(name, &scene)?;
        tracing::info!(%press, scene = name, relative = scene.relative, "scene saved");
        Ok(scene)
    }

    /// Assign the stored scene `name` to `press` (entering production) and schedule a render.
    ///
    /// Relative scenes are anchored on the center lines of the press's live layout.
    pub fn load_scene_into_press(&self, press: &PressId, name: &str) -> PressResult<Layout> {
        let scene = self
            .shared
            .collab
            .scenes
            .load_scene(name)?
            .ok_or_else(|| PressError::not_found(format!("scene '{name}'")))?;
        let press_center = self
            .shared
            .layouts
            .lock()
            .get(press)
            .map(|m| m.layout().center_lines);
        let layout = self
            .shared
            .operation
            .lock()
            .load_scene(press.clone(), name, &scene, press_center.as_ref())
            .clone();
        if let Err(e) = self.shared.collab.scenes.set_last_scene(name) {
            tracing::warn!(scene = name, error = %e, "last scene not recorded");
        }
        self.request_render()?;
        Ok(layout)
    }

    /// Name of the scene most recently loaded into any press.
    pub fn last_scene(&self) -> PressResult<Option<String>> {
        self.shared.collab.scenes.last_scene()
    }

    /// Remove the scene of `press` and schedule a render. Returns `false` if it had none.
    pub fn clear_press_scene(&self, press: &PressId) -> PressResult<bool> {
        let had = self.shared.operation.lock().clear_scene(press);
        if had {
            self.request_render()?;
        }
        Ok(had)
    }

    /// Select the press edited in scene setup and schedule a render.
    pub fn set_active_press(&self, press: &PressId) -> PressResult<()> {
        *self.shared.active.lock() = Some(press.clone());
        self.request_render()?;
        Ok(())
    }

    /// Snapshot current layouts and hand them to the render gate.
    ///
    /// Returns `None` when there is nothing to render (scene setup without an active press).
    pub fn request_render(&self) -> PressResult<Option<SubmitOutcome>> {
        let Some(request) = self.snapshot_request() else {
            tracing::debug!("no active press; render request ignored");
            return Ok(None);
        };
        self.scheduler.submit(request).map(Some)
    }

    /// Current operation mode, derived from the scene assignments.
    pub fn get_operation_mode(&self) -> OperationMode {
        self.shared.operation.lock().current_mode()
    }

    /// Mode, active press and scene assignments.
    pub fn get_operation_state(&self) -> OperationReport {
        let (mode, presses) = {
            let op = self.shared.operation.lock();
            (op.current_mode(), op.summary())
        };
        OperationReport {
            mode,
            active_press: self.shared.active.lock().clone(),
            presses,
        }
    }

    /// Re-render at a fixed interval so late-joining viewers stay in sync.
    ///
    /// Ticks go through the same coalescing gate as every other request.
    pub fn start_periodic_broadcast(&self, interval: Duration) -> PressResult<RepeatingTask> {
        let registry = self.clone();
        RepeatingTask::spawn("pressmap-broadcast", interval, move || {
            if let Err(e) = registry.request_render() {
                tracing::warn!(error = %e, "periodic render request failed");
            }
        })
    }

    /// Block until the render gate is idle.
    pub fn wait_idle(&self) {
        self.scheduler.wait_idle();
    }

    /// Render gate counters.
    pub fn scheduler_stats(&self) -> SchedulerStats {
        self.scheduler.stats()
    }

    fn snapshot_request(&self) -> Option<RenderRequest> {
        let output = self.output_resolution();
        {
            let op = self.shared.operation.lock();
            if op.current_mode() == OperationMode::Production {
                let presses = op
                    .active_layouts()
                    .map(|(id, l)| (id.clone(), l.clone()))
                    .collect();
                return Some(RenderRequest {
                    mode: OperationMode::Production,
                    output,
                    presses,
                });
            }
        }

        let press = self.shared.active.lock().clone()?;
        let layout = self.layout(&press).unwrap_or_default();
        Some(RenderRequest {
            mode: OperationMode::SceneSetup,
            output,
            presses: vec![(press, layout)],
        })
    }
}

fn render_request(shared: &Shared, req: &RenderRequest) -> PressResult<()> {
    let broadcaster = &shared.collab.broadcaster;
    match render_frame(shared, req) {
        Ok(Some(frame)) => {
            broadcaster.publish_frame(&req.target(), &frame, req.mode);
            Ok(())
        }
        Ok(None) => Ok(()),
        Err(e) => {
            if matches!(e, PressError::CalibrationRequired(_)) {
                broadcaster.notify_render_skipped(&req.target(), &e, req.mode);
            }
            Err(e)
        }
    }
}

fn render_frame(shared: &Shared, req: &RenderRequest) -> PressResult<Option<RasterImage>> {
    let output = req.output;
    let density = shared.config.raster_density_px_per_mm;
    let calibrators: Vec<Calibrator> = {
        let cals = shared.calibrators.read();
        req.presses
            .iter()
            .map(|(id, _)| {
                cals.get(id)
                    .cloned()
                    .unwrap_or_else(|| Calibrator::with_density(density))
            })
            .collect()
    };
    let images: Vec<ImageSet> = req
        .presses
        .iter()
        .map(|(_, layout)| resolve_layout_images(shared.collab.assets.as_ref(), layout))
        .collect();

    let frame = match req.mode {
        OperationMode::SceneSetup => {
            let (Some((id, layout)), Some(cal), Some(imgs)) =
                (req.presses.first(), calibrators.first(), images.first())
            else {
                return Ok(None);
            };
            shared
                .pipeline
                .render_single(layout, cal, output, imgs)
                .map_err(|e| e.for_press(id.as_str()))?
        }
        OperationMode::Production => {
            let presses: Vec<PressRender<'_>> = req
                .presses
                .iter()
                .zip(&calibrators)
                .zip(&images)
                .map(|(((id, layout), calibrator), images)| PressRender {
                    press: id,
                    layout,
                    calibrator,
                    images,
                })
                .collect();
            shared.pipeline.render_production(&presses, output)?
        }
    };
    Ok(Some(frame))
}

#[cfg(test)]
#[path = "../../tests/unit/service/registry.rs"]
mod tests;
