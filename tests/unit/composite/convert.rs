use super::*;

fn cmap() -> Colormap {
    Colormap::new(vec![[0, 0, 0], [255, 0, 0], [0, 255, 0]]).unwrap()
}

#[test]
fn gray_replicates_and_rgb_collapses_on_gray() {
    let c = cmap();
    assert_eq!(
        expand(PixelFormat::GrayA, &[40, 9], &c, false),
        Expanded {
            color: [40, 40, 40],
            alpha: 9
        }
    );
    let g = expand(PixelFormat::Rgb, &[255, 255, 255], &c, true);
    assert_eq!(g.color, [255, 255, 255]);
    let r = expand(PixelFormat::Rgb, &[255, 0, 0], &c, true);
    assert_eq!(r.color, [76, 76, 76]);
    assert_eq!(r.alpha, 255);
}

#[test]
fn indexed_expands_through_colormap() {
    let c = cmap();
    assert_eq!(expand(PixelFormat::Indexed, &[2], &c, false).color, [0, 255, 0]);
    let a = expand(PixelFormat::IndexedA, &[1, 0], &c, false);
    assert_eq!((a.color, a.alpha), ([255, 0, 0], 0));
}

#[test]
fn encode_back_to_each_format() {
    let c = cmap();
    let mut cache = NearestColorCache::default();
    let px = Expanded {
        color: [250, 5, 5],
        alpha: 200,
    };

    let mut gray = [0u8; 2];
    encode(PixelFormat::GrayA, &mut gray, px, &c, &mut cache);
    assert_eq!(gray, [luminance([250, 5, 5]), 200]);

    let mut rgb = [0u8; 3];
    encode(PixelFormat::Rgb, &mut rgb, px, &c, &mut cache);
    assert_eq!(rgb, [250, 5, 5]);

    let mut idx = [0u8; 2];
    encode(PixelFormat::IndexedA, &mut idx, px, &c, &mut cache);
    assert_eq!(idx, [1, 255]);

    let faint = Expanded { alpha: 100, ..px };
    encode(PixelFormat::IndexedA, &mut idx, faint, &c, &mut cache);
    assert_eq!(idx, [1, 0]);
}
