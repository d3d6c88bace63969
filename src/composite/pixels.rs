use crate::composite::{blend::BlendMode, convert::Expanded};
use crate::foundation::math::{pixel_noise, u8_to_unit, unit_to_u8};
use crate::model::pixel::PixelFormat;

/// Keeps `x.5` ratios from truncating one step low.
const EPSILON: f32 = 0.0001;

/// Pixel path selected by a source's `{has alpha} x {indexed}` layout.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum SourceKind {
    Inten,
    IntenA,
    Indexed,
    IndexedA,
}

impl From<PixelFormat> for SourceKind {
    fn from(format: PixelFormat) -> Self {
        match format {
            PixelFormat::Gray | PixelFormat::Rgb => Self::Inten,
            PixelFormat::GrayA | PixelFormat::Rgba => Self::IntenA,
            PixelFormat::Indexed => Self::Indexed,
            PixelFormat::IndexedA => Self::IndexedA,
        }
    }
}

/// What gets composited at one pixel: an expanded source, its coverage in `[0, 1]`
/// (opacity times mask), and the blend mode.
#[derive(Clone, Copy, Debug)]
pub(crate) struct Stroke {
    pub(crate) kind: SourceKind,
    pub(crate) mode: BlendMode,
    pub(crate) src: Expanded,
    pub(crate) coverage: f32,
}

/// First write into a cleared destination: copy the color, alpha = source alpha x coverage.
///
/// `dst` is a destination pixel with alpha in its last byte.
pub(crate) fn paint(dst: &mut [u8], s: Stroke, x: i32, y: i32) {
    let n = dst.len() - 1;
    let alpha = match s.kind {
        SourceKind::Indexed | SourceKind::IndexedA => indexed_opaque(s),
        SourceKind::Inten | SourceKind::IntenA => {
            let a = u8_to_unit(s.src.alpha) * s.coverage;
            let a = if s.mode == BlendMode::Dissolve {
                dissolve(a, x, y)
            } else {
                a
            };
            unit_to_u8(a)
        }
    };
    dst[..n].copy_from_slice(&s.src.color[..n]);
    dst[n] = alpha;
}

/// Alpha-over of a blended source onto an already painted destination.
///
/// Indexed sources skip blending: a pixel is copied opaquely when its effective alpha
/// exceeds one half and left alone otherwise.
pub(crate) fn combine(dst: &mut [u8], s: Stroke, x: i32, y: i32) {
    let n = dst.len() - 1;
    if matches!(s.kind, SourceKind::Indexed | SourceKind::IndexedA) {
        if indexed_opaque(s) == 255 {
            dst[..n].copy_from_slice(&s.src.color[..n]);
            dst[n] = 255;
        }
        return;
    }

    let dst_alpha = dst[n];
    let src_alpha = if s.kind == SourceKind::IntenA && !s.mode.affects_alpha() {
        s.src.alpha.min(dst_alpha)
    } else {
        s.src.alpha
    };
    let mut sa = u8_to_unit(src_alpha) * s.coverage;
    if s.mode == BlendMode::Dissolve {
        sa = dissolve(sa, x, y);
    }
    let da = u8_to_unit(dst_alpha);
    let new_alpha = da + (1.0 - da) * sa;

    if sa > 0.0 && new_alpha > 0.0 {
        let blended = s.mode.blend(dst, s.src.color, n);
        let ratio = sa / new_alpha;
        let compl = 1.0 - ratio;
        for c in 0..n {
            dst[c] = (f32::from(blended[c]) * ratio + f32::from(dst[c]) * compl + EPSILON) as u8;
        }
    }

    dst[n] = if s.mode.affects_alpha() || dst_alpha == 0 {
        unit_to_u8(new_alpha)
    } else {
        dst_alpha
    };
}

fn indexed_opaque(s: Stroke) -> u8 {
    if u8_to_unit(s.src.alpha) * s.coverage > 0.5 {
        255
    } else {
        0
    }
}

/// Deterministic dissolve: fully opaque where the pixel's noise byte is at most the
/// effective alpha, transparent elsewhere.
fn dissolve(alpha: f32, x: i32, y: i32) -> f32 {
    let threshold = unit_to_u8(alpha);
    if threshold != 0 && pixel_noise(x, y) <= threshold {
        1.0
    } else {
        0.0
    }
}

#[cfg(test)]
#[path = "../../tests/unit/composite/pixels.rs"]
mod tests;
