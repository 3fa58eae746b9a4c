//! Canonical-space SVG synthesis.
//!
//! Millimeter geometry maps onto the canonical raster by a pure scale of `density` px/mm. The
//! composition rotation is applied about the canvas center; no perspective math happens here.

use crate::foundation::core::{Canvas, Point};
use crate::foundation::math::fmt_num;
use crate::layout::color::Color;
use crate::layout::model::{CenterLines, Layout, LayoutElement};
use crate::render::raster::ImageSet;

const FONT_FAMILY: &str = "Arial, sans-serif";
/// Center-line dash pattern in millimeters (dash, gap).
const CENTER_DASH_MM: (f64, f64) = (5.0, 2.5);

/// Scale and stroke parameters of one synthesis pass.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SvgParams {
    /// Target canvas in pixels.
    pub canvas: Canvas,
    /// Pixels per millimeter.
    pub density: f64,
    /// Outline width in millimeters.
    pub stroke_width_mm: f64,
}

impl SvgParams {
    fn px(&self, mm: f64) -> String {
        fmt_num(mm * self.density)
    }

    fn stroke_px(&self) -> String {
        fmt_num((self.stroke_width_mm * self.density).max(1.0))
    }
}

/// Build the canonical drawing of `layout`.
///
/// Image elements whose reference is missing from `images` are skipped with a warning; their
/// height is derived from the resolved image's aspect ratio.
pub fn canonical_svg(layout: &Layout, params: &SvgParams, images: &ImageSet) -> String {
    let Canvas { width, height } = params.canvas;
    let mut out = String::with_capacity(256 + 160 * layout.elements.len());
    out.push_str(&format!(
        r#"<svg xmlns="http://www.w3.org/2000/svg" xmlns:xlink="http://www.w3.org/1999/xlink" width="{width}" height="{height}" viewBox="0 0 {width} {height}">"#
    ));
    out.push('\n');

    let rotated = layout.object_orientation != 0.0;
    if rotated {
        out.push_str(&format!(
            "<g transform=\"rotate({} {} {})\">\n",
            fmt_num(layout.object_orientation),
            fmt_num(f64::from(width) / 2.0),
            fmt_num(f64::from(height) / 2.0)
        ));
    }

    push_center_lines(&mut out, &layout.center_lines, params);

    for element in &layout.elements {
        push_element(&mut out, element, params, images);
    }

    if rotated {
        out.push_str("</g>\n");
    }
    out.push_str("</svg>\n");
    out
}

fn push_center_lines(out: &mut String, lines: &CenterLines, params: &SvgParams) {
    let (w, h) = (params.canvas.width, params.canvas.height);
    let dash = format!(
        "{},{}",
        params.px(CENTER_DASH_MM.0),
        params.px(CENTER_DASH_MM.1)
    );
    let style = format!(
        r#"stroke="{}" stroke-width="{}" stroke-dasharray="{dash}" fill="none""#,
        Color::RED.to_hex(),
        params.stroke_px()
    );

    if let Some(y) = lines.horizontal_mm {
        let y = params.px(y);
        out.push_str(&format!(
            "<line x1=\"0\" y1=\"{y}\" x2=\"{w}\" y2=\"{y}\" {style}/>\n"
        ));
    }
    if let Some(x) = lines.vertical_mm {
        let x = params.px(x);
        out.push_str(&format!(
            "<line x1=\"{x}\" y1=\"0\" x2=\"{x}\" y2=\"{h}\" {style}/>\n"
        ));
    }
}

fn stroke_attrs(color: Color, params: &SvgParams) -> String {
    let mut s = format!(
        r#"fill="none" stroke="{}" stroke-width="{}""#,
        color.with_alpha(255).to_hex(),
        params.stroke_px()
    );
    if color.a != 255 {
        s.push_str(&format!(r#" stroke-opacity="{}""#, fmt_num(color.opacity())));
    }
    s
}

fn fill_attrs(color: Color) -> String {
    let mut s = format!(r#"fill="{}""#, color.with_alpha(255).to_hex());
    if color.a != 255 {
        s.push_str(&format!(r#" fill-opacity="{}""#, fmt_num(color.opacity())));
    }
    s
}

/// Wrap `body` in a rotation group about `pivot` (px) when `deg` is non-zero.
fn rotated(deg: f64, pivot: Point, body: String) -> String {
    if deg == 0.0 {
        return body;
    }
    format!(
        "<g transform=\"rotate({} {} {})\">{body}</g>",
        fmt_num(deg),
        fmt_num(pivot.x),
        fmt_num(pivot.y)
    )
}

fn push_element(out: &mut String, element: &LayoutElement, p: &SvgParams, images: &ImageSet) {
    let d = p.density;
    let svg = match element {
        LayoutElement::Line(l) => format!(
            r#"<line x1="{}" y1="{}" x2="{}" y2="{}" stroke-linecap="round" {}/>"#,
            p.px(l.start.x),
            p.px(l.start.y),
            p.px(l.end.x),
            p.px(l.end.y),
            stroke_attrs(l.color, p)
        ),
        LayoutElement::Rectangle(r) => {
            let body = format!(
                r#"<rect x="{}" y="{}" width="{}" height="{}" {}/>"#,
                p.px(r.position.x),
                p.px(r.position.y),
                p.px(r.width),
                p.px(r.height),
                stroke_attrs(r.color, p)
            );
            let pivot = Point::new(
                (r.position.x + r.width / 2.0) * d,
                (r.position.y + r.height / 2.0) * d,
            );
            rotated(r.rotation, pivot, body)
        }
        LayoutElement::Circle(c) => format!(
            r#"<circle cx="{}" cy="{}" r="{}" {}/>"#,
            p.px(c.position.x),
            p.px(c.position.y),
            p.px(c.radius),
            stroke_attrs(c.color, p)
        ),
        LayoutElement::Text(t) => {
            let body = format!(
                r#"<text x="{}" y="{}" font-size="{}" font-family="{FONT_FAMILY}" {}>{}</text>"#,
                p.px(t.position.x),
                p.px(t.position.y),
                p.px(t.font_size),
                fill_attrs(t.color),
                escape_xml(&t.content)
            );
            rotated(t.rotation, Point::new(t.position.x * d, t.position.y * d), body)
        }
        LayoutElement::Image(i) => {
            let Some(img) = images.get(&i.image_ref) else {
                tracing::warn!(image = %i.image_ref, "image not resolved; skipping element");
                return;
            };
            let height_mm = i.width * img.aspect_ratio();
            let body = format!(
                r#"<image x="{}" y="{}" width="{}" height="{}" preserveAspectRatio="none" xlink:href="{}"/>"#,
                p.px(i.position.x),
                p.px(i.position.y),
                p.px(i.width),
                p.px(height_mm),
                escape_xml(&i.image_ref)
            );
            let pivot = Point::new(
                (i.position.x + i.width / 2.0) * d,
                (i.position.y + height_mm / 2.0) * d,
            );
            rotated(i.rotation, pivot, body)
        }
    };
    out.push_str(&svg);
    out.push('\n');
}

/// Escape text for use in XML character data and attribute values.
pub(crate) fn escape_xml(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for ch in s.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&apos;"),
            c => out.push(c),
        }
    }
    out
}

#[cfg(test)]
#[path = "../../tests/unit/render/svg.rs"]
mod tests;
