use crate::foundation::math::luminance;
use crate::model::{
    colormap::{Colormap, NearestColorCache},
    pixel::PixelFormat,
};

/// One source pixel expanded to the compositing space: color replicated to three bytes,
/// alpha `255` for alpha-free formats.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) struct Expanded {
    pub(crate) color: [u8; 3],
    pub(crate) alpha: u8,
}

impl Expanded {
    pub(crate) fn gray(v: u8) -> Self {
        Self {
            color: [v, v, v],
            alpha: 255,
        }
    }
}

/// Decode `px` (stored as `format`) for compositing onto a gray or RGB destination.
///
/// Indexed pixels go through the colormap; RGB collapses to luminance on gray.
pub(crate) fn expand(format: PixelFormat, px: &[u8], colormap: &Colormap, gray_dst: bool) -> Expanded {
    let (color, alpha) = match format {
        PixelFormat::Gray => ([px[0]; 3], 255),
        PixelFormat::GrayA => ([px[0]; 3], px[1]),
        PixelFormat::Rgb => ([px[0], px[1], px[2]], 255),
        PixelFormat::Rgba => ([px[0], px[1], px[2]], px[3]),
        PixelFormat::Indexed => (colormap.color(px[0]), 255),
        PixelFormat::IndexedA => (colormap.color(px[0]), px[1]),
    };
    let color = if gray_dst && !matches!(format, PixelFormat::Gray | PixelFormat::GrayA) {
        [luminance(color); 3]
    } else {
        color
    };
    Expanded { color, alpha }
}

/// Encode a composited pixel back into `format`. Alpha is dropped for alpha-free formats and
/// thresholded for indexed ones.
pub(crate) fn encode(
    format: PixelFormat,
    dst: &mut [u8],
    px: Expanded,
    colormap: &Colormap,
    cache: &mut NearestColorCache,
) {
    let indexed_alpha = if px.alpha > 127 { 255 } else { 0 };
    match format {
        PixelFormat::Gray => dst[0] = luminance(px.color),
        PixelFormat::GrayA => {
            dst[0] = luminance(px.color);
            dst[1] = px.alpha;
        }
        PixelFormat::Rgb => dst[..3].copy_from_slice(&px.color),
        PixelFormat::Rgba => {
            dst[..3].copy_from_slice(&px.color);
            dst[3] = px.alpha;
        }
        PixelFormat::Indexed => dst[0] = cache.lookup(colormap, px.color),
        PixelFormat::IndexedA => {
            dst[0] = cache.lookup(colormap, px.color);
            dst[1] = indexed_alpha;
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/composite/convert.rs"]
mod tests;
