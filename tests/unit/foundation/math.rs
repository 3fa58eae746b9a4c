use super::*;

#[test]
fn mul_div255_variants_align() {
    for x in [0u16, 1, 127, 255] {
        for y in [0u16, 1, 127, 255] {
            assert_eq!(u16::from(mul_div255_u8(x, y)), mul_div255_u16(x, y));
        }
    }
    assert_eq!(mul_div255_u8(255, 255), 255);
    assert_eq!(mul_div255_u8(255, 0), 0);
}

#[test]
fn clamp_u8_saturates_and_rounds() {
    assert_eq!(clamp_u8(-4.0), 0);
    assert_eq!(clamp_u8(300.0), 255);
    assert_eq!(clamp_u8(127.6), 128);
    assert_eq!(clamp_u8(f32::NAN), 0);
}

#[test]
fn fmt_num_trims_trailing_zeros() {
    assert_eq!(fmt_num(1000.0), "1000");
    assert_eq!(fmt_num(12.5), "12.5");
    assert_eq!(fmt_num(0.0001), "0");
    assert_eq!(fmt_num(-0.0001), "0");
    assert_eq!(fmt_num(-3.25), "-3.25");
}
