use std::collections::BTreeMap;

use crate::foundation::core::PressId;
use crate::layout::model::{CenterLines, Layout};
use crate::layout::portable::{Scene, to_absolute};

/// System-wide operating state.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OperationMode {
    /// Single-press editing of the live layout.
    SceneSetup,
    /// One or more presses project an assigned scene.
    Production,
}

/// Scene assignment of one press.
#[derive(Clone, Debug, Default, PartialEq, serde::Serialize)]
pub struct OperationState {
    /// Name of the loaded scene.
    pub scene_name: Option<String>,
    /// Absolute layout of the loaded scene.
    pub layout: Option<Layout>,
}

impl OperationState {
    /// `true` when a layout is assigned.
    pub fn is_active(&self) -> bool {
        self.layout.is_some()
    }
}

/// Per-press line of [`OperationModeController::summary`].
#[derive(Clone, Debug, PartialEq, serde::Serialize)]
pub struct PressSummary {
    /// Press id.
    pub press: PressId,
    /// Loaded scene, if any.
    pub scene_name: Option<String>,
    /// Number of elements in the loaded layout.
    pub element_count: usize,
}

/// Tracks which presses have a scene assigned; the mode is derived from that on every query.
#[derive(Clone, Debug, Default)]
pub struct OperationModeController {
    states: BTreeMap<PressId, OperationState>,
}

impl OperationModeController {
    /// No scenes assigned.
    pub fn new() -> Self {
        Self::default()
    }

    /// Assign `scene` to `press`, re-absolutized against `press_center` (see [`to_absolute`]).
    pub fn load_scene(
        &mut self,
        press: PressId,
        scene_name: impl Into<String>,
        scene: &Scene,
        press_center: Option<&CenterLines>,
    ) -> &Layout {
        let layout = to_absolute(scene, press_center);
        let scene_name = scene_name.into();
        tracing::info!(%press, scene = %scene_name, elements = layout.elements.len(), "scene loaded");
        let state = self.states.entry(press).or_default();
        state.scene_name = Some(scene_name);
        state.layout.insert(layout)
    }

    /// Remove the scene assignment of `press`. Returns `true` if one existed.
    pub fn clear_scene(&mut self, press: &PressId) -> bool {
        let had = self.states.remove(press).is_some_and(|s| s.is_active());
        if had {
            tracing::info!(%press, "scene cleared");
        }
        had
    }

    /// [`OperationMode::Production`] iff any press has a layout assigned.
    pub fn current_mode(&self) -> OperationMode {
        if self.states.values().any(OperationState::is_active) {
            OperationMode::Production
        } else {
            OperationMode::SceneSetup
        }
    }

    /// Assignment of `press`, if any.
    pub fn state(&self, press: &PressId) -> Option<&OperationState> {
        self.states.get(press)
    }

    /// Presses with an assigned layout, in id order.
    pub fn active_layouts(&self) -> impl Iterator<Item = (&PressId, &Layout)> {
        self.states
            .iter()
            .filter_map(|(id, s)| s.layout.as_ref().map(|l| (id, l)))
    }

    /// One line per press with an assignment.
    pub fn summary(&self) -> Vec<PressSummary> {
        self.states
            .iter()
            .map(|(id, s)| PressSummary {
                press: id.clone(),
                scene_name: s.scene_name.clone(),
                element_count: s.layout.as_ref().map_or(0, |l| l.elements.len()),
            })
            .collect()
    }
}

#[cfg(test)]
#[path = "../../tests/unit/operation/mode.rs"]
mod tests;
