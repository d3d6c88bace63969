use super::*;

fn channel() -> Channel {
    Channel::new("sel", PixelBuffer::new(2, 2, PixelFormat::Gray).unwrap()).unwrap()
}

#[test]
fn channel_must_be_gray() {
    assert!(Channel::new("x", PixelBuffer::new(2, 2, PixelFormat::Rgb).unwrap()).is_err());
}

#[test]
fn coverage_scales_by_opacity_and_tint_alpha() {
    let ch = channel()
        .with_opacity(1.0)
        .with_tint(Rgba8::new(255, 0, 0, 255));
    assert_eq!(ch.coverage(255), 1.0);
    assert_eq!(ch.coverage(0), 0.0);

    let half = channel()
        .with_opacity(0.5)
        .with_tint(Rgba8::new(255, 0, 0, 255));
    assert!((half.coverage(255) - 0.5).abs() < 1e-6);
}

#[test]
fn show_masked_inverts_coverage() {
    let mut ch = channel().with_opacity(1.0);
    ch.show_masked = true;
    assert_eq!(ch.coverage(0), 1.0);
    assert_eq!(ch.coverage(255), 0.0);
}
