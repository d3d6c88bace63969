use super::*;

fn rgb_layer(w: u32, h: u32) -> Layer {
    Layer::new("bg", PixelBuffer::filled(w, h, PixelFormat::Rgb, &[1, 2, 3]).unwrap())
}

#[test]
fn bounds_follow_offset() {
    let layer = rgb_layer(4, 3).with_offset(-2, 5);
    assert_eq!(layer.bounds(), Rect::new(-2, 5, 4, 3));
    assert!(!layer.has_alpha());
}

#[test]
fn mask_must_be_gray_and_match_geometry() {
    let mut layer = rgb_layer(4, 4);
    assert!(LayerMask::new(PixelBuffer::new(4, 4, PixelFormat::GrayA).unwrap()).is_err());

    let small = LayerMask::new(PixelBuffer::new(2, 2, PixelFormat::Gray).unwrap()).unwrap();
    assert!(layer.set_mask(small).is_err());

    let mask = LayerMask::new(PixelBuffer::new(4, 4, PixelFormat::Gray).unwrap()).unwrap();
    layer.set_mask(mask).unwrap();
    assert!(layer.mask().is_some_and(|m| m.apply && !m.show));
    assert!(
        layer
            .set_pixels(PixelBuffer::new(5, 5, PixelFormat::Rgb).unwrap())
            .is_err()
    );
    assert!(layer.take_mask().is_some());
}

#[test]
fn opaque_coverage_requires_plain_full_layer() {
    let rect = Rect::new(0, 0, 4, 4);
    assert!(rgb_layer(4, 4).covers_opaquely(rect));
    assert!(!rgb_layer(4, 4).with_offset(1, 0).covers_opaquely(rect));
    assert!(!rgb_layer(4, 4).with_opacity(0.5).covers_opaquely(rect));
    assert!(!rgb_layer(4, 4).with_mode(BlendMode::Multiply).covers_opaquely(rect));

    let mut hidden = rgb_layer(4, 4);
    hidden.visible = false;
    assert!(!hidden.covers_opaquely(rect));

    let alpha = Layer::new("a", PixelBuffer::new(4, 4, PixelFormat::Rgba).unwrap());
    assert!(!alpha.covers_opaquely(rect));
}
