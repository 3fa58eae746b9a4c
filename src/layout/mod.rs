//! Millimeter-space overlay layouts.

/// Element colors.
pub mod color;
/// Layout elements and the editable layout model.
pub mod model;
/// Center-relative scenes.
pub mod portable;
