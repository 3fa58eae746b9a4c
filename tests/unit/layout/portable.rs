use super::*;
use crate::foundation::core::Point;
use crate::layout::color::Color;
use crate::layout::model::LayoutElement;

fn sample(center: CenterLines) -> Layout {
    Layout {
        object_orientation: 12.5,
        center_lines: center,
        elements: vec![
            LayoutElement::line(Point::new(50.0, 50.0), Point::new(250.0, 50.0), Color::RED)
                .unwrap(),
            LayoutElement::rectangle(Point::new(100.0, 100.0), 50.0, 30.0).unwrap(),
            LayoutElement::circle(Point::new(200.0, 150.0), 20.0).unwrap(),
            LayoutElement::text(Point::new(10.0, 190.0), "JOB 42", 8.0).unwrap(),
            LayoutElement::image(Point::new(250.0, 20.0), 30.0, "logo.png").unwrap(),
        ],
    }
}

#[test]
fn circle_is_stored_relative_to_center() {
    let scene = to_relative(&sample(CenterLines::new(100.0, 150.0)));
    assert!(scene.relative);
    assert_eq!(scene.layout.center_lines, CenterLines::new(100.0, 150.0));
    let LayoutElement::Circle(c) = &scene.layout.elements[2] else {
        panic!("expected circle");
    };
    assert_eq!(c.position, Point::new(50.0, 50.0));
    assert_eq!(c.radius, 20.0);
}

#[test]
fn loading_onto_another_press_uses_its_center() {
    let scene = to_relative(&sample(CenterLines::new(100.0, 150.0)));
    let press = CenterLines::new(60.0, 80.0);
    let layout = to_absolute(&scene, Some(&press));

    let LayoutElement::Circle(c) = &layout.elements[2] else {
        panic!("expected circle");
    };
    assert_eq!(c.position, Point::new(130.0, 110.0));
    assert_eq!(layout.center_lines, press);
}

#[test]
fn absolute_is_left_inverse_of_relative() {
    for n in 0..=5 {
        let mut l = sample(CenterLines::new(100.0, 150.0));
        l.elements.truncate(n);
        assert_eq!(to_absolute(&to_relative(&l), None), l);

        let same = l.center_lines;
        assert_eq!(to_absolute(&to_relative(&l), Some(&same)), l);
    }
}

#[test]
fn incomplete_press_center_falls_back_to_scene_center() {
    let l = sample(CenterLines::new(100.0, 150.0));
    let half = CenterLines {
        horizontal_mm: Some(60.0),
        vertical_mm: None,
    };
    assert_eq!(to_absolute(&to_relative(&l), Some(&half)), l);
}

#[test]
fn missing_center_lines_is_identity() {
    let l = sample(CenterLines {
        horizontal_mm: Some(100.0),
        vertical_mm: None,
    });
    let scene = to_relative(&l);
    assert!(!scene.relative);
    assert_eq!(scene.layout, l);

    let press = CenterLines::new(60.0, 80.0);
    assert_eq!(to_absolute(&scene, Some(&press)), l);
}

#[test]
fn scene_json_is_flat_with_relative_flag() {
    let scene = to_relative(&sample(CenterLines::new(100.0, 150.0)));
    let v = serde_json::to_value(&scene).unwrap();
    assert_eq!(v["relative"], serde_json::json!(true));
    assert_eq!(v["center_lines"]["vertical"], serde_json::json!(150.0));
    assert_eq!(v["elements"].as_array().unwrap().len(), 5);

    let text = serde_json::to_string(&scene).unwrap();
    let back = Scene::from_reader(text.as_bytes()).unwrap();
    assert_eq!(back, scene);
}
