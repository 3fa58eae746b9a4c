use super::*;
use std::sync::Arc;

use crate::layout::model::{ImageElement, RectElement, TextElement};
use crate::render::raster::ResolvedImage;

fn params() -> SvgParams {
    SvgParams {
        canvas: Canvas::new(3000, 2000).unwrap(),
        density: 10.0,
        stroke_width_mm: 0.5,
    }
}

fn layout(elements: Vec<LayoutElement>) -> Layout {
    Layout {
        elements,
        ..Default::default()
    }
}

#[test]
fn rect_is_scaled_to_canvas_pixels() {
    let l = layout(vec![
        LayoutElement::rectangle(Point::new(10.0, 20.0), 5.5, 3.0).unwrap(),
    ]);
    let svg = canonical_svg(&l, &params(), &ImageSet::new());
    assert!(svg.starts_with("<svg "));
    assert!(svg.contains(r#"viewBox="0 0 3000 2000""#));
    assert!(svg.contains(
        r##"<rect x="100" y="200" width="55" height="30" fill="none" stroke="#00ffff" stroke-width="5"/>"##
    ));
    assert!(!svg.contains("<g "));
}

#[test]
fn rotated_rect_pivots_on_its_center() {
    let l = layout(vec![LayoutElement::Rectangle(RectElement {
        position: Point::new(10.0, 10.0),
        width: 20.0,
        height: 10.0,
        rotation: 30.0,
        color: Color::RED,
    })]);
    let svg = canonical_svg(&l, &params(), &ImageSet::new());
    assert!(svg.contains(r#"<g transform="rotate(30 200 150)"><rect "#));
}

#[test]
fn text_is_escaped_and_pivots_on_its_anchor() {
    let l = layout(vec![LayoutElement::Text(TextElement {
        position: Point::new(5.0, 7.0),
        content: "A&B <C>".to_owned(),
        font_size: 4.0,
        color: Color::YELLOW,
        rotation: -45.0,
    })]);
    let svg = canonical_svg(&l, &params(), &ImageSet::new());
    assert!(svg.contains(r#"rotate(-45 50 70)"#));
    assert!(svg.contains(r#"font-size="40""#));
    assert!(svg.contains(r##"fill="#ffff00""##));
    assert!(svg.contains(">A&amp;B &lt;C&gt;</text>"));
}

#[test]
fn translucent_colors_become_opacity_attributes() {
    let l = layout(vec![
        LayoutElement::line(
            Point::new(0.0, 0.0),
            Point::new(1.0, 1.0),
            Color::RED.with_alpha(51),
        )
        .unwrap(),
    ]);
    let svg = canonical_svg(&l, &params(), &ImageSet::new());
    assert!(svg.contains(r##"stroke="#ff0000" stroke-width="5" stroke-opacity="0.2""##));
}

#[test]
fn images_take_height_from_aspect_ratio() {
    let mut images = ImageSet::new();
    images.insert(
        "logo.png".to_owned(),
        ResolvedImage {
            bytes: Arc::new(Vec::new()),
            width: 200,
            height: 100,
        },
    );
    let l = layout(vec![
        LayoutElement::Image(ImageElement {
            position: Point::new(10.0, 10.0),
            width: 40.0,
            rotation: 90.0,
            image_ref: "logo.png".to_owned(),
        }),
        LayoutElement::image(Point::new(0.0, 0.0), 10.0, "missing.png").unwrap(),
    ]);
    let svg = canonical_svg(&l, &params(), &images);
    assert!(svg.contains(r#"<image x="100" y="100" width="400" height="200""#));
    assert!(svg.contains(r#"xlink:href="logo.png""#));
    assert!(svg.contains(r#"rotate(90 300 200)"#));
    assert!(!svg.contains("missing.png"));
}

#[test]
fn center_lines_span_the_canvas_with_dashes() {
    let l = Layout {
        center_lines: CenterLines::new(100.0, 150.0),
        ..Default::default()
    };
    let svg = canonical_svg(&l, &params(), &ImageSet::new());
    assert!(svg.contains(r#"<line x1="0" y1="1000" x2="3000" y2="1000""#));
    assert!(svg.contains(r#"<line x1="1500" y1="0" x2="1500" y2="2000""#));
    assert!(svg.contains(r#"stroke-dasharray="50,25""#));

    let partial = Layout {
        center_lines: CenterLines {
            horizontal_mm: Some(100.0),
            vertical_mm: None,
        },
        ..Default::default()
    };
    let svg = canonical_svg(&partial, &params(), &ImageSet::new());
    assert_eq!(svg.matches("<line ").count(), 1);
}

#[test]
fn thin_strokes_are_at_least_one_pixel() {
    let p = SvgParams {
        density: 1.0,
        ..params()
    };
    let l = layout(vec![LayoutElement::circle(Point::new(5.0, 5.0), 2.0).unwrap()]);
    let svg = canonical_svg(&l, &p, &ImageSet::new());
    assert!(svg.contains(r#"<circle cx="5" cy="5" r="2" fill="none""#));
    assert!(svg.contains(r#"stroke-width="1""#));
}

#[test]
fn escape_xml_covers_quotes() {
    assert_eq!(escape_xml(r#"a"b'c"#), "a&quot;b&apos;c");
}
