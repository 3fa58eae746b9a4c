use super::*;
use std::io::Cursor;

fn temp_dir(name: &str) -> PathBuf {
    std::env::temp_dir().join(format!(
        "pressmap_{name}_{}_{}",
        std::process::id(),
        std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .unwrap()
            .as_nanos()
    ))
}

fn png(w: u32, h: u32) -> Vec<u8> {
    let img = image::RgbaImage::from_pixel(w, h, image::Rgba([1, 2, 3, 255]));
    let mut buf = Vec::new();
    image::DynamicImage::ImageRgba8(img)
        .write_to(&mut Cursor::new(&mut buf), image::ImageFormat::Png)
        .unwrap();
    buf
}

#[test]
fn in_memory_store_round_trips_records_and_scenes() {
    let store = InMemoryStore::new();
    let id = PressId::new("left");
    assert_eq!(store.load_calibration(&id).unwrap(), None);

    let record = CalibrationRecord {
        source_points: vec![[0.0, 0.0], [10.0, 0.0], [10.0, 10.0], [0.0, 10.0]],
        press_width_mm: 100.0,
        press_height_mm: 100.0,
    };
    store.save_calibration(&id, &record).unwrap();
    assert_eq!(store.load_calibration(&id).unwrap(), Some(record));

    store.save_scene("zeta", &Scene::default()).unwrap();
    store.save_scene("alpha", &Scene::default()).unwrap();
    assert_eq!(store.list_scenes().unwrap(), vec!["alpha", "zeta"]);
    assert!(store.load_scene("missing").unwrap().is_none());
    assert!(store.save_scene("  ", &Scene::default()).is_err());

    assert_eq!(store.last_scene().unwrap(), None);
    store.set_last_scene("alpha").unwrap();
    store.set_last_scene("zeta").unwrap();
    assert_eq!(store.last_scene().unwrap().as_deref(), Some("zeta"));
}

#[test]
fn null_assets_resolve_nothing() {
    let err = NullAssets.resolve_image("a.png").unwrap_err();
    assert!(matches!(err, PressError::NotFound(_)));
}

#[test]
fn dir_assets_reads_below_root_only() {
    let root = temp_dir("dir_assets");
    std::fs::create_dir_all(root.join("uploads")).unwrap();
    std::fs::write(root.join("uploads/logo.png"), png(4, 2)).unwrap();

    let assets = DirAssets::new(&root);
    let img = assets.resolve_image("uploads/logo.png").unwrap();
    assert_eq!((img.width, img.height), (4, 2));
    assert!(assets.resolve_image("./uploads/logo.png").is_ok());

    assert!(matches!(
        assets.resolve_image("uploads/none.png").unwrap_err(),
        PressError::NotFound(_)
    ));
    assert!(matches!(
        assets.resolve_image("../etc/passwd").unwrap_err(),
        PressError::Validation(_)
    ));
    assert!(matches!(
        assets.resolve_image("/etc/passwd").unwrap_err(),
        PressError::Validation(_)
    ));

    let _ = std::fs::remove_dir_all(&root);
}

#[test]
fn recording_broadcaster_keeps_order() {
    let rec = RecordingBroadcaster::new();
    let frame = RasterImage::black(crate::foundation::core::Canvas::new(2, 2).unwrap());
    rec.publish_frame("left", &frame, OperationMode::SceneSetup);
    rec.publish_frame("production", &frame, OperationMode::Production);
    rec.publish_layout(&Layout::default(), OperationMode::SceneSetup);

    let frames = rec.frames();
    assert_eq!(frames.len(), 2);
    assert_eq!(frames[0].target, "left");
    assert_eq!(rec.last_frame().unwrap().mode, OperationMode::Production);
    assert_eq!(rec.layouts().len(), 1);

    rec.notify_render_skipped(
        "right",
        &PressError::calibration_required("right"),
        OperationMode::SceneSetup,
    );
    let skipped = rec.skipped();
    assert_eq!(skipped.len(), 1);
    assert_eq!(skipped[0].target, "right");
    assert!(skipped[0].reason.contains("right"));
    assert_eq!(rec.frames().len(), 2);
}

#[test]
fn layout_images_resolve_once_and_skip_failures() {
    let root = temp_dir("layout_images");
    std::fs::create_dir_all(&root).unwrap();
    std::fs::write(root.join("a.png"), png(3, 6)).unwrap();

    let img = |href: &str| {
        crate::layout::model::LayoutElement::image(
            crate::foundation::core::Point::new(0.0, 0.0),
            10.0,
            href,
        )
        .unwrap()
    };
    let layout = Layout {
        elements: vec![img("a.png"), img("a.png"), img("b.png")],
        ..Default::default()
    };
    let set = resolve_layout_images(&DirAssets::new(&root), &layout);
    assert_eq!(set.len(), 1);
    assert_eq!(set["a.png"].aspect_ratio(), 2.0);

    let _ = std::fs::remove_dir_all(&root);
}
