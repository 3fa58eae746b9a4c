//! Center-relative ("portable") scenes.
//!
//! A scene stores element coordinates relative to the crossing of its center lines, so the same
//! scene can be dropped onto presses of different size or with a different center placement.

use std::io::Read;

use crate::foundation::core::Vec2;
use crate::foundation::error::{PressError, PressResult};
use crate::layout::model::{CenterLines, Layout};

/// Persisted, portable layout.
///
/// When `relative` is set, every point-valued field is an offset from the center-line crossing
/// stored in `layout.center_lines` (which itself stays in absolute press millimeters).
#[derive(Clone, Debug, Default, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Scene {
    /// Layout payload.
    #[serde(flatten)]
    pub layout: Layout,
    /// `true` if element coordinates are center-relative.
    #[serde(default)]
    pub relative: bool,
}

impl Scene {
    /// Parse a scene from JSON and validate its layout.
    pub fn from_reader<R: Read>(r: R) -> PressResult<Self> {
        let scene: Self = serde_json::from_reader(r)
            .map_err(|e| PressError::serde(format!("parse scene JSON: {e}")))?;
        scene.layout.validate()?;
        Ok(scene)
    }

    /// Center-line crossing the scene was authored against, if it has one.
    pub fn anchor(&self) -> Option<Vec2> {
        self.layout.center_lines.center()
    }
}

/// Express `layout` relative to its own center lines.
///
/// With either center line unset the layout is stored as authored and flagged absolute.
pub fn to_relative(layout: &Layout) -> Scene {
    let mut out = layout.clone();
    let Some(center) = layout.center_lines.center() else {
        tracing::debug!("layout has no complete center lines; storing absolute scene");
        return Scene {
            layout: out,
            relative: false,
        };
    };
    for e in &mut out.elements {
        e.translate(-center);
    }
    Scene {
        layout: out,
        relative: true,
    }
}

/// Re-absolutize a scene.
///
/// Relative coordinates are anchored on `press_center` when it has both axes set, otherwise on
/// the scene's own stored center lines. The returned layout carries the anchor as its center
/// lines. Absolute scenes (and relative scenes with no usable anchor) are returned unchanged.
pub fn to_absolute(scene: &Scene, press_center: Option<&CenterLines>) -> Layout {
    let mut out = scene.layout.clone();
    if !scene.relative {
        return out;
    }

    let lines = match press_center {
        Some(c) if c.center().is_some() => *c,
        _ => scene.layout.center_lines,
    };
    let Some(center) = lines.center() else {
        tracing::warn!("relative scene has no anchor; loading as authored");
        return out;
    };

    for e in &mut out.elements {
        e.translate(center);
    }
    out.center_lines = lines;
    out
}

#[cfg(test)]
#[path = "../../tests/unit/layout/portable.rs"]
mod tests;
