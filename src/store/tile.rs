use crate::foundation::{
    core::Rect,
    error::{TesseraError, TesseraResult},
};

/// Edge length of every tile, in pixels. Edge tiles may be smaller.
pub const TILE_SIZE: u32 = 64;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TileCoord {
    pub col: u32,
    pub row: u32,
}

impl TileCoord {
    pub fn new(col: u32, row: u32) -> Self {
        Self { col, row }
    }
}

/// One fixed-size block of a [`TileStore`](crate::TileStore), with its own validity.
#[derive(Debug)]
pub struct Tile {
    pub(crate) coord: TileCoord,
    pub(crate) bounds: Rect,
    pub(crate) bpp: usize,
    pub(crate) data: Vec<u8>,
    pub(crate) valid: bool,
    pub(crate) last_touch: u64,
}

impl Tile {
    pub fn coord(&self) -> TileCoord {
        self.coord
    }

    /// Canvas-space rectangle covered by this tile.
    pub fn bounds(&self) -> Rect {
        self.bounds
    }

    pub fn bpp(&self) -> usize {
        self.bpp
    }

    pub fn is_valid(&self) -> bool {
        self.valid
    }

    /// Tightly packed rows, `bounds.width * bpp` bytes each.
    pub fn data(&self) -> &[u8] {
        &self.data
    }

    pub fn data_mut(&mut self) -> &mut [u8] {
        &mut self.data
    }

    /// Pixel at canvas coordinates, if inside this tile.
    pub fn pixel(&self, x: i32, y: i32) -> Option<&[u8]> {
        if !self.bounds.contains_point(x, y) {
            return None;
        }
        let i = pixel_offset(self.bounds, self.bpp, x, y);
        Some(&self.data[i..i + self.bpp])
    }

    pub fn region_mut(&mut self) -> RegionMut<'_> {
        RegionMut {
            data: &mut self.data,
            bounds: self.bounds,
            bpp: self.bpp,
        }
    }
}

fn pixel_offset(bounds: Rect, bpp: usize, x: i32, y: i32) -> usize {
    let lx = (x - bounds.x) as usize;
    let ly = (y - bounds.y) as usize;
    (ly * bounds.width as usize + lx) * bpp
}

/// Mutable view over a tightly packed pixel rectangle addressed in canvas coordinates.
///
/// Construct writes through this view; it is backed either by a single tile or by a
/// scratch buffer spanning several tiles.
#[derive(Debug)]
pub struct RegionMut<'a> {
    data: &'a mut [u8],
    bounds: Rect,
    bpp: usize,
}

impl<'a> RegionMut<'a> {
    pub fn new(data: &'a mut [u8], bounds: Rect, bpp: usize) -> TesseraResult<Self> {
        let expected = bounds.area().saturating_mul(bpp);
        if data.len() != expected {
            return Err(TesseraError::validation(format!(
                "region buffer is {} bytes, expected {expected} for {}x{}x{bpp}",
                data.len(),
                bounds.width,
                bounds.height
            )));
        }
        Ok(Self { data, bounds, bpp })
    }

    pub fn bounds(&self) -> Rect {
        self.bounds
    }

    pub fn bpp(&self) -> usize {
        self.bpp
    }

    pub fn as_bytes(&self) -> &[u8] {
        self.data
    }

    pub fn as_bytes_mut(&mut self) -> &mut [u8] {
        self.data
    }

    pub fn pixel(&self, x: i32, y: i32) -> &[u8] {
        let i = pixel_offset(self.bounds, self.bpp, x, y);
        &self.data[i..i + self.bpp]
    }

    pub fn pixel_mut(&mut self, x: i32, y: i32) -> &mut [u8] {
        let i = pixel_offset(self.bounds, self.bpp, x, y);
        &mut self.data[i..i + self.bpp]
    }

    /// Set every pixel of `rect` (clipped to the region) to `px`.
    pub fn fill(&mut self, rect: Rect, px: &[u8]) {
        debug_assert_eq!(px.len(), self.bpp, "fill pixel width must match bpp");
        let Some(area) = rect.intersect(self.bounds) else {
            return;
        };
        for y in area.y..area.bottom() {
            let start = pixel_offset(self.bounds, self.bpp, area.x, y);
            let row = &mut self.data[start..start + area.width as usize * self.bpp];
            for dst in row.chunks_exact_mut(self.bpp) {
                dst.copy_from_slice(px);
            }
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/store/tile.rs"]
mod tests;
