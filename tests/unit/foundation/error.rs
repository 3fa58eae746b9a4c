use super::*;

#[test]
fn display_prefixes_are_stable() {
    assert!(
        PressError::validation("x")
            .to_string()
            .contains("validation error:")
    );
    assert!(
        PressError::rasterization("x")
            .to_string()
            .contains("rasterization error:")
    );
    assert!(
        PressError::serde("x")
            .to_string()
            .contains("serialization error:")
    );
    assert!(PressError::not_found("x").to_string().contains("not found:"));
    assert!(
        PressError::calibration_required("left")
            .to_string()
            .contains("'left'")
    );
}

#[test]
fn calibration_required_can_be_named_later() {
    let err = PressError::not_calibrated();
    assert_eq!(err.to_string(), "calibration required before rendering");

    let named = err.for_press("left");
    assert!(matches!(&named, PressError::CalibrationRequired(Some(p)) if p == "left"));

    let untouched = PressError::validation("x").for_press("left");
    assert!(matches!(untouched, PressError::Validation(_)));
}

#[test]
fn calibration_error_converts_into_press_error() {
    let err: PressError = CalibrationError::PointCount { got: 3 }.into();
    assert!(matches!(
        err,
        PressError::Calibration(CalibrationError::PointCount { got: 3 })
    ));
    assert!(err.to_string().contains("exactly 4"));
}

#[test]
fn other_preserves_source() {
    let base = std::io::Error::other("boom");
    let err = PressError::Other(anyhow::Error::new(base));
    assert!(err.to_string().contains("boom"));
}
