use super::*;
use serde_json::json;

fn rect() -> LayoutElement {
    LayoutElement::rectangle(Point::new(100.0, 100.0), 50.0, 30.0).unwrap()
}

#[test]
fn constructors_validate_kind_specific_fields() {
    assert!(LayoutElement::rectangle(Point::new(0.0, 0.0), 0.0, 10.0).is_err());
    assert!(LayoutElement::circle(Point::new(0.0, 0.0), -1.0).is_err());
    assert!(LayoutElement::text(Point::new(f64::NAN, 0.0), "x", 5.0).is_err());
    assert!(LayoutElement::image(Point::new(0.0, 0.0), 20.0, "  ").is_err());
    assert!(LayoutElement::line(Point::ZERO, Point::new(1.0, 1.0), Color::RED).is_ok());
}

#[test]
fn elements_use_tagged_json() {
    let v = serde_json::to_value(rect()).unwrap();
    assert_eq!(
        v,
        json!({
            "type": "rectangle",
            "position": [100.0, 100.0],
            "width": 50.0,
            "height": 30.0,
            "rotation": 0.0,
            "color": "#00ffff"
        })
    );

    let e: LayoutElement = serde_json::from_value(json!({
        "type": "text",
        "position": {"x": 5.0, "y": 6.0},
        "text": "REG",
        "font_size": 8.0
    }))
    .unwrap();
    let LayoutElement::Text(t) = e else {
        panic!("expected text");
    };
    assert_eq!(t.content, "REG");
    assert_eq!(t.position, Point::new(5.0, 6.0));
    assert_eq!(t.color, Color::CYAN);
}

#[test]
fn unknown_kind_is_rejected() {
    let r = serde_json::from_value::<LayoutElement>(json!({"type": "spline", "position": [0, 0]}));
    assert!(r.is_err());
}

#[test]
fn layout_from_reader_validates() {
    let ok = r#"{
        "object_orientation": 15,
        "center_lines": {"horizontal": 100, "vertical": 150},
        "elements": [{"type": "line", "start": [0, 0], "end": [100, 100]}]
    }"#;
    let layout = Layout::from_reader(ok.as_bytes()).unwrap();
    assert_eq!(layout.center_lines.center(), Some(Vec2::new(150.0, 100.0)));
    assert_eq!(layout.elements.len(), 1);

    let bad = r#"{ "elements": [{"type": "circle", "position": [0, 0], "radius": 0}] }"#;
    assert!(matches!(
        Layout::from_reader(bad.as_bytes()),
        Err(PressError::Validation(_))
    ));
    assert!(matches!(
        Layout::from_reader("[".as_bytes()),
        Err(PressError::Serde(_))
    ));
}

#[test]
fn center_lines_merge_keeps_omitted_axis() {
    let mut m = LayoutModel::new();
    m.set_center_lines(Some(100.0), None).unwrap();
    m.set_center_lines(None, Some(150.0)).unwrap();
    m.set_center_lines(Some(90.0), None).unwrap();
    assert_eq!(m.layout().center_lines, CenterLines::new(90.0, 150.0));
    assert!(m.set_center_lines(Some(f64::INFINITY), None).is_err());
}

#[test]
fn clear_elements_keeps_orientation_and_center_lines() {
    let mut m = LayoutModel::new();
    m.set_orientation(15.0).unwrap();
    m.set_center_lines(Some(100.0), Some(150.0)).unwrap();
    m.add_element(rect()).unwrap();
    m.clear_elements();

    let l = m.snapshot();
    assert!(l.elements.is_empty());
    assert_eq!(l.object_orientation, 15.0);
    assert_eq!(l.center_lines, CenterLines::new(100.0, 150.0));
}

#[test]
fn update_and_remove_by_index() {
    let mut m = LayoutModel::new();
    assert_eq!(m.add_element(rect()).unwrap(), 0);
    let circle = LayoutElement::circle(Point::new(200.0, 150.0), 20.0).unwrap();
    assert_eq!(m.add_element(circle.clone()).unwrap(), 1);

    m.update_element(0, circle.clone()).unwrap();
    assert_eq!(m.layout().elements[0], circle);
    assert!(matches!(
        m.update_element(5, rect()),
        Err(PressError::NotFound(_))
    ));

    assert_eq!(m.remove_element(1).unwrap(), circle);
    assert_eq!(m.layout().elements.len(), 1);
    assert!(m.remove_element(1).is_err());
}

#[test]
fn snapshot_is_independent() {
    let mut m = LayoutModel::new();
    m.add_element(rect()).unwrap();
    let snap = m.snapshot();
    m.clear_elements();
    assert_eq!(snap.elements.len(), 1);
}

#[test]
fn patch_merges_and_replaces() {
    let mut m = LayoutModel::new();
    m.set_center_lines(Some(100.0), Some(150.0)).unwrap();
    m.add_element(rect()).unwrap();

    let patch: LayoutPatch = serde_json::from_value(json!({
        "object_orientation": 90,
        "center_lines": {"vertical": 120}
    }))
    .unwrap();
    m.apply_patch(patch).unwrap();
    assert_eq!(m.layout().object_orientation, 90.0);
    assert_eq!(m.layout().center_lines, CenterLines::new(100.0, 120.0));
    assert_eq!(m.layout().elements.len(), 1);

    m.apply_patch(LayoutPatch {
        elements: Some(vec![]),
        ..Default::default()
    })
    .unwrap();
    assert!(m.layout().elements.is_empty());
}

#[test]
fn invalid_patch_changes_nothing() {
    let mut m = LayoutModel::new();
    m.add_element(rect()).unwrap();
    let before = m.snapshot();

    let patch: LayoutPatch = serde_json::from_value(json!({
        "object_orientation": 45,
        "elements": [{"type": "circle", "position": [0, 0], "radius": -3}]
    }))
    .unwrap();
    assert!(m.apply_patch(patch).is_err());
    assert_eq!(m.snapshot(), before);
}

#[test]
fn translate_moves_every_point_field() {
    let mut line = LayoutElement::line(Point::new(1.0, 2.0), Point::new(3.0, 4.0), Color::RED).unwrap();
    line.translate(Vec2::new(-1.0, 10.0));
    let LayoutElement::Line(l) = line else {
        panic!("expected line");
    };
    assert_eq!(l.start, Point::new(0.0, 12.0));
    assert_eq!(l.end, Point::new(2.0, 14.0));
}
