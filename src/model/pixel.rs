use crate::foundation::{
    core::{Rect, Size},
    error::{TesseraError, TesseraResult, try_alloc_zeroed},
};

/// Storage format of a drawable's pixels.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PixelFormat {
    Gray,
    GrayA,
    Rgb,
    Rgba,
    Indexed,
    IndexedA,
}

impl PixelFormat {
    pub fn bpp(self) -> usize {
        match self {
            Self::Gray | Self::Indexed => 1,
            Self::GrayA | Self::IndexedA => 2,
            Self::Rgb => 3,
            Self::Rgba => 4,
        }
    }

    pub fn has_alpha(self) -> bool {
        matches!(self, Self::GrayA | Self::Rgba | Self::IndexedA)
    }

    pub fn is_indexed(self) -> bool {
        matches!(self, Self::Indexed | Self::IndexedA)
    }

    /// Number of color bytes before the alpha byte.
    pub fn color_bytes(self) -> usize {
        self.bpp() - usize::from(self.has_alpha())
    }

    pub fn with_alpha(self) -> Self {
        match self {
            Self::Gray => Self::GrayA,
            Self::Rgb => Self::Rgba,
            Self::Indexed => Self::IndexedA,
            other => other,
        }
    }
}

/// Color model of a whole canvas.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ColorModel {
    Gray,
    Rgb,
    Indexed,
}

impl ColorModel {
    /// Format of the flattened projection. It always carries alpha; indexed canvases
    /// project to RGBA through their colormap.
    pub fn projection_format(self) -> PixelFormat {
        match self {
            Self::Gray => PixelFormat::GrayA,
            Self::Rgb | Self::Indexed => PixelFormat::Rgba,
        }
    }

    /// Format new layers get when none is specified.
    pub fn layer_format(self, alpha: bool) -> PixelFormat {
        let base = match self {
            Self::Gray => PixelFormat::Gray,
            Self::Rgb => PixelFormat::Rgb,
            Self::Indexed => PixelFormat::Indexed,
        };
        if alpha { base.with_alpha() } else { base }
    }
}

/// Owned, tightly packed pixel rectangle in a single [`PixelFormat`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PixelBuffer {
    size: Size,
    format: PixelFormat,
    data: Vec<u8>,
}

impl PixelBuffer {
    /// Zero-filled buffer (transparent / black / colormap entry 0).
    pub fn new(width: u32, height: u32, format: PixelFormat) -> TesseraResult<Self> {
        let size = Size::new(width, height)?;
        let data = try_alloc_zeroed(size.area().saturating_mul(format.bpp()), "pixel buffer")?;
        Ok(Self { size, format, data })
    }

    /// Buffer with every pixel set to `px`.
    pub fn filled(width: u32, height: u32, format: PixelFormat, px: &[u8]) -> TesseraResult<Self> {
        let mut buf = Self::new(width, height, format)?;
        buf.fill_rect(buf.bounds(), px)?;
        Ok(buf)
    }

    pub fn from_raw(
        width: u32,
        height: u32,
        format: PixelFormat,
        data: Vec<u8>,
    ) -> TesseraResult<Self> {
        let size = Size::new(width, height)?;
        let expected = size.area().saturating_mul(format.bpp());
        if data.len() != expected {
            return Err(TesseraError::validation(format!(
                "{width}x{height} {format:?} buffer needs {expected} bytes, got {}",
                data.len()
            )));
        }
        Ok(Self { size, format, data })
    }

    pub fn width(&self) -> u32 {
        self.size.width
    }

    pub fn height(&self) -> u32 {
        self.size.height
    }

    pub fn size(&self) -> Size {
        self.size
    }

    pub fn format(&self) -> PixelFormat {
        self.format
    }

    /// Local bounds, origin at `(0, 0)`.
    pub fn bounds(&self) -> Rect {
        self.size.bounds()
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }

    pub fn data_mut(&mut self) -> &mut [u8] {
        &mut self.data
    }

    fn offset(&self, x: u32, y: u32) -> usize {
        (y as usize * self.size.width as usize + x as usize) * self.format.bpp()
    }

    /// Pixel at local coordinates. Panics when out of bounds, like slice indexing.
    pub fn pixel(&self, x: u32, y: u32) -> &[u8] {
        let i = self.offset(x, y);
        &self.data[i..i + self.format.bpp()]
    }

    pub fn pixel_mut(&mut self, x: u32, y: u32) -> &mut [u8] {
        let i = self.offset(x, y);
        let bpp = self.format.bpp();
        &mut self.data[i..i + bpp]
    }

    /// Set every pixel of `rect` (local coordinates, clipped) to `px`.
    pub fn fill_rect(&mut self, rect: Rect, px: &[u8]) -> TesseraResult<()> {
        let bpp = self.format.bpp();
        if px.len() != bpp {
            return Err(TesseraError::validation(format!(
                "fill pixel has {} bytes, {:?} needs {bpp}",
                px.len(),
                self.format
            )));
        }
        let Some(area) = rect.intersect(self.bounds()) else {
            return Ok(());
        };
        for y in area.y..area.bottom() {
            let start = self.offset(area.x as u32, y as u32);
            let end = start + area.width as usize * bpp;
            for dst in self.data[start..end].chunks_exact_mut(bpp) {
                dst.copy_from_slice(px);
            }
        }
        Ok(())
    }

    /// Copy of `rect` (local coordinates, must lie inside the buffer).
    pub(crate) fn crop(&self, rect: Rect) -> TesseraResult<Self> {
        if !self.bounds().contains_rect(rect) {
            return Err(TesseraError::validation(format!(
                "crop {rect:?} outside {}x{} buffer",
                self.size.width, self.size.height
            )));
        }
        let bpp = self.format.bpp();
        let mut out = Self::new(rect.width, rect.height, self.format)?;
        let span = rect.width as usize * bpp;
        for row in 0..rect.height {
            let src = self.offset(rect.x as u32, rect.y as u32 + row);
            let dst = row as usize * span;
            out.data[dst..dst + span].copy_from_slice(&self.data[src..src + span]);
        }
        Ok(out)
    }

    /// New buffer of `width x height` holding this buffer's pixels anchored at the origin;
    /// uncovered pixels are zero.
    pub(crate) fn resized(&self, width: u32, height: u32) -> TesseraResult<Self> {
        let mut out = Self::new(width, height, self.format)?;
        let Some(keep) = self.bounds().intersect(out.bounds()) else {
            return Ok(out);
        };
        let bpp = self.format.bpp();
        let span = keep.width as usize * bpp;
        for row in 0..keep.height {
            let src = self.offset(0, row);
            let dst = out.offset(0, row);
            out.data[dst..dst + span].copy_from_slice(&self.data[src..src + span]);
        }
        Ok(out)
    }
}

#[cfg(test)]
#[path = "../../tests/unit/model/pixel.rs"]
mod tests;
