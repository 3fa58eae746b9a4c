use super::*;

#[test]
fn empty_json_yields_defaults() {
    let cfg = ProjectorConfig::from_reader("{}".as_bytes()).unwrap();
    assert_eq!(cfg, ProjectorConfig::default());
    assert_eq!(cfg.output.width, 1920);
    assert_eq!(cfg.output.height, 1080);
    assert_eq!(cfg.raster_density_px_per_mm, 10.0);
    assert_eq!(cfg.broadcast_interval(), Duration::from_secs(2));
}

#[test]
fn partial_json_overrides_fields() {
    let json = r#"{ "output": { "width": 800, "height": 600 }, "warp": "bypass" }"#;
    let cfg = ProjectorConfig::from_reader(json.as_bytes()).unwrap();
    assert_eq!(cfg.output, Canvas::new(800, 600).unwrap());
    assert_eq!(cfg.warp, WarpMode::Bypass);
    assert_eq!(cfg.render_options().warp, WarpMode::Bypass);
}

#[test]
fn invalid_values_are_rejected() {
    for json in [
        r#"{ "output": { "width": 0, "height": 600 } }"#,
        r#"{ "raster_density_px_per_mm": 0.0 }"#,
        r#"{ "stroke_width_mm": -1.0 }"#,
        r#"{ "broadcast_interval_ms": 0 }"#,
        r#"{ "boundary_margin_mm": -2.0 }"#,
    ] {
        assert!(
            ProjectorConfig::from_reader(json.as_bytes()).is_err(),
            "{json} should be rejected"
        );
    }
}

#[test]
fn malformed_json_is_a_serde_error() {
    let err = ProjectorConfig::from_reader("{".as_bytes()).unwrap_err();
    assert!(matches!(err, PressError::Serde(_)));
}
