use super::*;

#[test]
fn canvas_rejects_empty_dimensions() {
    assert!(Canvas::new(0, 10).is_err());
    assert!(Canvas::new(10, 0).is_err());
    assert_eq!(Canvas::new(3, 2).unwrap().byte_len().unwrap(), 24);
}

#[test]
fn from_premul_checks_buffer_length() {
    assert!(FrameRGBA::from_premul(2, 2, vec![0u8; 15]).is_err());
    let f = FrameRGBA::from_premul(2, 2, vec![7u8; 16]).unwrap();
    assert_eq!(f.pixel(1, 1), Some([7, 7, 7, 7]));
    assert_eq!(f.pixel(2, 0), None);
}

#[test]
fn premultiply_then_unpremultiply_is_close_to_source() {
    let src = [200u8, 100, 50, 128, 10, 20, 30, 0, 1, 2, 3, 255];
    let mut buf = src;
    premultiply_rgba8_in_place(&mut buf);
    assert_eq!(&buf[4..8], &[0, 0, 0, 0]);
    assert_eq!(&buf[8..12], &src[8..12]);

    unpremultiply_rgba8_in_place(&mut buf);
    for c in 0..3 {
        assert!((i16::from(buf[c]) - i16::from(src[c])).abs() <= 1);
    }
    assert_eq!(buf[3], 128);
}

#[test]
fn straight_copy_leaves_frame_untouched() {
    let f = FrameRGBA::from_premul(1, 1, vec![64, 32, 0, 128]).unwrap();
    let straight = f.to_straight_rgba8();
    assert_eq!(straight, vec![128, 64, 0, 128]);
    assert_eq!(f.data, vec![64, 32, 0, 128]);
}
