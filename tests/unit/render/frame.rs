use super::*;

#[test]
fn black_frame_is_opaque() {
    let img = RasterImage::black(Canvas::new(3, 2).unwrap());
    assert_eq!(img.data.len(), 24);
    assert_eq!(img.pixel(2, 1), Some([0, 0, 0, 255]));
    assert_eq!(img.pixel(3, 0), None);
    assert_eq!(img.lit_pixel_count(), 0);
}

#[test]
fn from_rgba8_checks_length() {
    assert!(RasterImage::from_rgba8(2, 2, vec![0; 15]).is_err());
    assert!(RasterImage::from_rgba8(0, 2, vec![]).is_err());
    let img = RasterImage::from_rgba8(1, 1, vec![9, 8, 7, 255]).unwrap();
    assert_eq!(img.pixel(0, 0), Some([9, 8, 7, 255]));
    assert_eq!(img.lit_pixel_count(), 1);
}

#[test]
fn png_round_trips_through_image_crate() {
    let mut img = RasterImage::black(Canvas::new(4, 3).unwrap());
    img.data[0..4].copy_from_slice(&[255, 0, 0, 255]);

    let png = img.encode_png().unwrap();
    assert_eq!(&png[1..4], b"PNG");

    let decoded = image::load_from_memory(&png).unwrap().to_rgba8();
    assert_eq!(decoded.dimensions(), (4, 3));
    assert_eq!(decoded.into_raw(), img.data);
}

#[test]
fn save_png_creates_parent_dirs() {
    let dir = std::env::temp_dir().join(format!("pressmap_frame_{}", std::process::id()));
    let path = dir.join("nested").join("frame.png");
    let img = RasterImage::black(Canvas::new(2, 2).unwrap());
    img.save_png(&path).unwrap();
    assert!(path.is_file());
    let _ = std::fs::remove_dir_all(&dir);
}
