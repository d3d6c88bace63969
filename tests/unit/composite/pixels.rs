use super::*;

fn stroke(kind: SourceKind, mode: BlendMode, color: [u8; 3], alpha: u8, coverage: f32) -> Stroke {
    Stroke {
        kind,
        mode,
        src: Expanded { color, alpha },
        coverage,
    }
}

#[test]
fn paint_copies_color_and_scales_alpha() {
    let mut dst = [9u8; 4];
    paint(&mut dst, stroke(SourceKind::IntenA, BlendMode::Normal, [10, 20, 30], 255, 0.5), 0, 0);
    assert_eq!(dst, [10, 20, 30, 128]);

    let mut dst = [9u8; 4];
    paint(&mut dst, stroke(SourceKind::Inten, BlendMode::Multiply, [1, 2, 3], 255, 1.0), 0, 0);
    assert_eq!(dst, [1, 2, 3, 255]);
}

#[test]
fn paint_on_gray_writes_single_channel() {
    let mut dst = [0u8; 2];
    paint(&mut dst, stroke(SourceKind::Inten, BlendMode::Normal, [77, 77, 77], 255, 1.0), 0, 0);
    assert_eq!(dst, [77, 255]);
}

#[test]
fn half_opacity_blue_over_red() {
    let mut dst = [255, 0, 0, 255];
    combine(&mut dst, stroke(SourceKind::Inten, BlendMode::Normal, [0, 0, 255], 255, 0.5), 0, 0);
    assert_eq!(dst, [127, 0, 127, 255]);
}

#[test]
fn opaque_normal_replaces_destination() {
    let mut dst = [1, 2, 3, 40];
    combine(&mut dst, stroke(SourceKind::IntenA, BlendMode::Normal, [200, 100, 50], 255, 1.0), 0, 0);
    assert_eq!(dst, [200, 100, 50, 255]);
}

#[test]
fn zero_coverage_is_noop() {
    let mut dst = [1, 2, 3, 40];
    combine(&mut dst, stroke(SourceKind::IntenA, BlendMode::Normal, [200, 100, 50], 255, 0.0), 0, 0);
    assert_eq!(dst, [1, 2, 3, 40]);
}

#[test]
fn over_transparent_takes_source_alpha() {
    let mut dst = [0, 0, 0, 0];
    combine(&mut dst, stroke(SourceKind::IntenA, BlendMode::Normal, [90, 90, 90], 102, 1.0), 0, 0);
    assert_eq!(dst, [90, 90, 90, 102]);
}

#[test]
fn non_alpha_modes_keep_covered_destination_alpha() {
    let mut dst = [255, 255, 255, 100];
    combine(&mut dst, stroke(SourceKind::Inten, BlendMode::Multiply, [128, 128, 128], 255, 1.0), 0, 0);
    assert_eq!(dst, [128, 128, 128, 100]);
}

#[test]
fn alpha_source_in_non_alpha_mode_cannot_cover_transparent_pixels() {
    let mut dst = [0, 0, 0, 0];
    combine(&mut dst, stroke(SourceKind::IntenA, BlendMode::Screen, [200, 0, 0], 255, 1.0), 0, 0);
    assert_eq!(dst, [0, 0, 0, 0]);
}

#[test]
fn indexed_sources_threshold_at_half() {
    let mut dst = [10, 10, 10, 255];
    combine(&mut dst, stroke(SourceKind::IndexedA, BlendMode::Multiply, [0, 255, 0], 255, 0.5), 0, 0);
    assert_eq!(dst, [10, 10, 10, 255]);
    combine(&mut dst, stroke(SourceKind::IndexedA, BlendMode::Normal, [0, 255, 0], 255, 0.6), 0, 0);
    assert_eq!(dst, [0, 255, 0, 255]);

    let mut fresh = [7u8; 4];
    paint(&mut fresh, stroke(SourceKind::Indexed, BlendMode::Normal, [5, 6, 7], 255, 0.4), 0, 0);
    assert_eq!(fresh, [5, 6, 7, 0]);
}

#[test]
fn dissolve_is_binary_and_deterministic() {
    let s = stroke(SourceKind::Inten, BlendMode::Dissolve, [255, 255, 255], 255, 0.5);
    let mut opaque = 0;
    for y in 0..32 {
        for x in 0..32 {
            let mut a = [0, 0, 0, 255];
            let mut b = [0, 0, 0, 255];
            combine(&mut a, s, x, y);
            combine(&mut b, s, x, y);
            assert_eq!(a, b);
            assert!(a[0] == 0 || a[0] == 255, "{a:?}");
            if a[0] == 255 {
                opaque += 1;
            }
        }
    }
    assert!(opaque > 0 && opaque < 32 * 32);
}

#[test]
fn full_dissolve_paints_every_pixel() {
    let s = stroke(SourceKind::Inten, BlendMode::Dissolve, [1, 1, 1], 255, 1.0);
    for x in 0..64 {
        let mut dst = [0u8; 4];
        paint(&mut dst, s, x, 3);
        assert_eq!(dst[3], 255);
    }
}
