use super::*;
use crate::foundation::core::Canvas;

#[test]
fn over_basic_cases() {
    let dst = [10, 20, 30, 255];
    assert_eq!(over(dst, [0, 0, 0, 0], 1.0), dst);
    assert_eq!(over(dst, [200, 100, 50, 255], 1.0), [200, 100, 50, 255]);
    assert_eq!(over(dst, [200, 100, 50, 255], 0.0), dst);
}

#[test]
fn flatten_keeps_premultiplied_color_and_makes_opaque() {
    let mut buf = vec![
        0, 0, 0, 0, // transparent
        128, 0, 0, 128, // half red (premultiplied)
        0, 255, 255, 255, // opaque cyan
    ];
    flatten_onto_black(&mut buf);
    assert_eq!(&buf[0..4], &[0, 0, 0, 255]);
    assert_eq!(&buf[4..8], &[128, 0, 0, 255]);
    assert_eq!(&buf[8..12], &[0, 255, 255, 255]);
}

#[test]
fn over_in_place_rejects_mismatched_lengths() {
    let mut dst = vec![0u8; 8];
    assert!(over_in_place(&mut dst, &[0u8; 4], 1.0).is_err());
    assert!(over_in_place(&mut dst, &[255, 255, 0, 255, 0, 0, 0, 0], 1.0).is_ok());
    assert_eq!(&dst[0..4], &[255, 255, 0, 255]);
    assert_eq!(&dst[4..8], &[0, 0, 0, 0]);
}

#[test]
fn saturating_add_merges_frames() {
    let canvas = Canvas::new(2, 1).unwrap();
    let mut a = RasterImage::black(canvas);
    a.data[0..4].copy_from_slice(&[200, 10, 0, 255]);
    let mut b = RasterImage::black(canvas);
    b.data[0..4].copy_from_slice(&[100, 10, 0, 255]);
    b.data[4..8].copy_from_slice(&[0, 0, 7, 255]);

    add_saturating_in_place(&mut a, &b).unwrap();
    assert_eq!(a.pixel(0, 0), Some([255, 20, 0, 255]));
    assert_eq!(a.pixel(1, 0), Some([0, 0, 7, 255]));

    let other = RasterImage::black(Canvas::new(1, 1).unwrap());
    assert!(add_saturating_in_place(&mut a, &other).is_err());
}
