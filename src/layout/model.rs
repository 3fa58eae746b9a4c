use std::io::Read;

use crate::foundation::core::{Point, Vec2, point_serde};
use crate::foundation::error::{PressError, PressResult};
use crate::layout::color::Color;

/// Straight line between two press positions.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct LineElement {
    /// Start point in mm.
    #[serde(with = "point_serde")]
    pub start: Point,
    /// End point in mm.
    #[serde(with = "point_serde")]
    pub end: Point,
    /// Stroke color.
    #[serde(default)]
    pub color: Color,
}

/// Outlined rectangle, rotated about its own center.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct RectElement {
    /// Top-left corner in mm (before rotation).
    #[serde(with = "point_serde")]
    pub position: Point,
    /// Width in mm.
    pub width: f64,
    /// Height in mm.
    pub height: f64,
    /// Clockwise rotation in degrees.
    #[serde(default)]
    pub rotation: f64,
    /// Stroke color.
    #[serde(default)]
    pub color: Color,
}

/// Outlined circle.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct CircleElement {
    /// Center in mm.
    #[serde(with = "point_serde")]
    pub position: Point,
    /// Radius in mm.
    pub radius: f64,
    /// Stroke color.
    #[serde(default)]
    pub color: Color,
}

/// Text run anchored at its baseline start, rotated about that anchor.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct TextElement {
    /// Baseline anchor in mm.
    #[serde(with = "point_serde")]
    pub position: Point,
    /// Text to draw.
    #[serde(rename = "text")]
    pub content: String,
    /// Font size in mm.
    pub font_size: f64,
    /// Fill color.
    #[serde(default)]
    pub color: Color,
    /// Clockwise rotation in degrees.
    #[serde(default)]
    pub rotation: f64,
}

/// Raster image placed by width; the height follows the image's aspect ratio at render time.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct ImageElement {
    /// Top-left corner in mm (before rotation).
    #[serde(with = "point_serde")]
    pub position: Point,
    /// Width in mm.
    pub width: f64,
    /// Clockwise rotation in degrees, about the image center.
    #[serde(default)]
    pub rotation: f64,
    /// Reference handed to the asset resolver.
    #[serde(rename = "image_url")]
    pub image_ref: String,
}

/// One drawable item of a layout, stored in press millimeters.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum LayoutElement {
    /// See [`LineElement`].
    Line(LineElement),
    /// See [`RectElement`].
    Rectangle(RectElement),
    /// See [`CircleElement`].
    Circle(CircleElement),
    /// See [`TextElement`].
    Text(TextElement),
    /// See [`ImageElement`].
    Image(ImageElement),
}

impl LayoutElement {
    /// Validated line.
    pub fn line(start: Point, end: Point, color: Color) -> PressResult<Self> {
        Self::checked(Self::Line(LineElement { start, end, color }))
    }

    /// Validated rectangle with the default color and no rotation.
    pub fn rectangle(position: Point, width: f64, height: f64) -> PressResult<Self> {
        Self::checked(Self::Rectangle(RectElement {
            position,
            width,
            height,
            rotation: 0.0,
            color: Color::default(),
        }))
    }

    /// Validated circle with the default color.
    pub fn circle(position: Point, radius: f64) -> PressResult<Self> {
        Self::checked(Self::Circle(CircleElement {
            position,
            radius,
            color: Color::default(),
        }))
    }

    /// Validated text with the default color and no rotation.
    pub fn text(position: Point, content: impl Into<String>, font_size: f64) -> PressResult<Self> {
        Self::checked(Self::Text(TextElement {
            position,
            content: content.into(),
            font_size,
            color: Color::default(),
            rotation: 0.0,
        }))
    }

    /// Validated image with no rotation.
    pub fn image(position: Point, width: f64, image_ref: impl Into<String>) -> PressResult<Self> {
        Self::checked(Self::Image(ImageElement {
            position,
            width,
            rotation: 0.0,
            image_ref: image_ref.into(),
        }))
    }

    fn checked(self) -> PressResult<Self> {
        self.validate()?;
        Ok(self)
    }

    /// Kind name as used in the `type` tag.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Line(_) => "line",
            Self::Rectangle(_) => "rectangle",
            Self::Circle(_) => "circle",
            Self::Text(_) => "text",
            Self::Image(_) => "image",
        }
    }

    /// Check the kind-specific geometry: finite coordinates and positive sizes.
    pub fn validate(&self) -> PressResult<()> {
        let kind = self.kind();
        let point = |name: &str, p: Point| {
            if p.x.is_finite() && p.y.is_finite() {
                Ok(())
            } else {
                Err(PressError::validation(format!(
                    "{kind}: {name} must be finite"
                )))
            }
        };
        let positive = |name: &str, v: f64| {
            if v.is_finite() && v > 0.0 {
                Ok(())
            } else {
                Err(PressError::validation(format!(
                    "{kind}: {name} must be > 0, got {v}"
                )))
            }
        };
        let angle = |v: f64| {
            if v.is_finite() {
                Ok(())
            } else {
                Err(PressError::validation(format!(
                    "{kind}: rotation must be finite"
                )))
            }
        };

        match self {
            Self::Line(l) => {
                point("start", l.start)?;
                point("end", l.end)
            }
            Self::Rectangle(r) => {
                point("position", r.position)?;
                positive("width", r.width)?;
                positive("height", r.height)?;
                angle(r.rotation)
            }
            Self::Circle(c) => {
                point("position", c.position)?;
                positive("radius", c.radius)
            }
            Self::Text(t) => {
                point("position", t.position)?;
                positive("font_size", t.font_size)?;
                angle(t.rotation)
            }
            Self::Image(i) => {
                point("position", i.position)?;
                positive("width", i.width)?;
                angle(i.rotation)?;
                if i.image_ref.trim().is_empty() {
                    return Err(PressError::validation("image: image_url must not be empty"));
                }
                Ok(())
            }
        }
    }

    /// Shift every point-valued field (`position`, `start`, `end`) by `d`.
    pub fn translate(&mut self, d: Vec2) {
        match self {
            Self::Line(l) => {
                l.start += d;
                l.end += d;
            }
            Self::Rectangle(r) => r.position += d,
            Self::Circle(c) => c.position += d,
            Self::Text(t) => t.position += d,
            Self::Image(i) => i.position += d,
        }
    }
}

/// Optional reference axes of a layout, in press millimeters.
#[derive(Clone, Copy, Debug, Default, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct CenterLines {
    /// Y position of the horizontal line.
    #[serde(default, rename = "horizontal")]
    pub horizontal_mm: Option<f64>,
    /// X position of the vertical line.
    #[serde(default, rename = "vertical")]
    pub vertical_mm: Option<f64>,
}

impl CenterLines {
    /// Both axes set.
    pub fn new(horizontal_mm: f64, vertical_mm: f64) -> Self {
        Self {
            horizontal_mm: Some(horizontal_mm),
            vertical_mm: Some(vertical_mm),
        }
    }

    /// The crossing point `(vertical, horizontal)` when both axes are set.
    pub fn center(&self) -> Option<Vec2> {
        Some(Vec2::new(self.vertical_mm?, self.horizontal_mm?))
    }

    /// Overwrite only the axes present in `other`.
    pub fn merge(&mut self, other: CenterLines) {
        if other.horizontal_mm.is_some() {
            self.horizontal_mm = other.horizontal_mm;
        }
        if other.vertical_mm.is_some() {
            self.vertical_mm = other.vertical_mm;
        }
    }
}

/// Complete drawing description of one press, in press millimeters.
#[derive(Clone, Debug, Default, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Layout {
    /// Rotation of the whole composition about the press center, in degrees.
    #[serde(default)]
    pub object_orientation: f64,
    /// Reference axes.
    #[serde(default)]
    pub center_lines: CenterLines,
    /// Elements in paint order.
    #[serde(default)]
    pub elements: Vec<LayoutElement>,
}

impl Layout {
    /// Parse a layout from JSON and validate every element.
    pub fn from_reader<R: Read>(r: R) -> PressResult<Self> {
        let layout: Self = serde_json::from_reader(r)
            .map_err(|e| PressError::serde(format!("parse layout JSON: {e}")))?;
        layout.validate()?;
        Ok(layout)
    }

    /// Validate orientation, center lines and elements.
    pub fn validate(&self) -> PressResult<()> {
        if !self.object_orientation.is_finite() {
            return Err(PressError::validation("object_orientation must be finite"));
        }
        for v in [self.center_lines.horizontal_mm, self.center_lines.vertical_mm]
            .into_iter()
            .flatten()
        {
            if !v.is_finite() {
                return Err(PressError::validation("center lines must be finite"));
            }
        }
        for (i, e) in self.elements.iter().enumerate() {
            e.validate()
                .map_err(|err| PressError::validation(format!("elements[{i}]: {err}")))?;
        }
        Ok(())
    }

    /// `true` if any element references an image asset.
    pub fn has_images(&self) -> bool {
        self.elements
            .iter()
            .any(|e| matches!(e, LayoutElement::Image(_)))
    }
}

/// Partial layout update as sent by editors.
///
/// Orientation and center lines merge into the current layout; `elements`, when present,
/// replaces the whole element list.
#[derive(Clone, Debug, Default, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct LayoutPatch {
    /// New orientation, if any.
    pub object_orientation: Option<f64>,
    /// Center lines to merge, if any.
    pub center_lines: Option<CenterLines>,
    /// Replacement element list, if any.
    pub elements: Option<Vec<LayoutElement>>,
}

/// Live, mutable layout of one press.
#[derive(Clone, Debug, Default)]
pub struct LayoutModel {
    layout: Layout,
}

impl LayoutModel {
    /// Empty layout.
    pub fn new() -> Self {
        Self::default()
    }

    /// Wrap an existing layout after validating it.
    pub fn from_layout(layout: Layout) -> PressResult<Self> {
        layout.validate()?;
        Ok(Self { layout })
    }

    /// Borrow the current layout.
    pub fn layout(&self) -> &Layout {
        &self.layout
    }

    /// Set the composition rotation in degrees.
    pub fn set_orientation(&mut self, degrees: f64) -> PressResult<()> {
        if !degrees.is_finite() {
            return Err(PressError::validation("object_orientation must be finite"));
        }
        self.layout.object_orientation = degrees;
        Ok(())
    }

    /// Set center lines; an omitted axis keeps its current value.
    pub fn set_center_lines(
        &mut self,
        horizontal_mm: Option<f64>,
        vertical_mm: Option<f64>,
    ) -> PressResult<()> {
        if horizontal_mm.is_some_and(|v| !v.is_finite())
            || vertical_mm.is_some_and(|v| !v.is_finite())
        {
            return Err(PressError::validation("center lines must be finite"));
        }
        self.layout.center_lines.merge(CenterLines {
            horizontal_mm,
            vertical_mm,
        });
        Ok(())
    }

    /// Append an element; returns its index in paint order.
    pub fn add_element(&mut self, element: LayoutElement) -> PressResult<usize> {
        element.validate()?;
        self.layout.elements.push(element);
        Ok(self.layout.elements.len() - 1)
    }

    /// Replace the element at `index`.
    pub fn update_element(&mut self, index: usize, element: LayoutElement) -> PressResult<()> {
        element.validate()?;
        let len = self.layout.elements.len();
        let slot = self
            .layout
            .elements
            .get_mut(index)
            .ok_or_else(|| PressError::not_found(format!("element {index} (have {len})")))?;
        *slot = element;
        Ok(())
    }

    /// Remove and return the element at `index`.
    pub fn remove_element(&mut self, index: usize) -> PressResult<LayoutElement> {
        if index >= self.layout.elements.len() {
            return Err(PressError::not_found(format!(
                "element {index} (have {})",
                self.layout.elements.len()
            )));
        }
        Ok(self.layout.elements.remove(index))
    }

    /// Drop all elements. Orientation and center lines stay.
    pub fn clear_elements(&mut self) {
        self.layout.elements.clear();
    }

    /// Apply an editor patch atomically: nothing changes if any part is invalid.
    pub fn apply_patch(&mut self, patch: LayoutPatch) -> PressResult<()> {
        let mut next = self.layout.clone();
        if let Some(deg) = patch.object_orientation {
            next.object_orientation = deg;
        }
        if let Some(cl) = patch.center_lines {
            next.center_lines.merge(cl);
        }
        if let Some(elements) = patch.elements {
            next.elements = elements;
        }
        next.validate()?;
        self.layout = next;
        Ok(())
    }

    /// Deep copy of the current layout.
    pub fn snapshot(&self) -> Layout {
        self.layout.clone()
    }
}

#[cfg(test)]
#[path = "../../tests/unit/layout/model.rs"]
mod tests;
