use crate::foundation::{
    core::{Rect, Rgba8},
    error::{TesseraError, TesseraResult, try_alloc_zeroed},
};
use crate::model::pixel::{PixelBuffer, PixelFormat};
use crate::projection::construct::Construct;
use crate::store::{
    store::{TileStore, TileStoreOpts, TileStoreStats},
    tile::Tile,
};

/// Projection configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProjectionOpts {
    /// Cap on resident projection tile bytes; `0` keeps every tile.
    pub max_resident_bytes: usize,
}

impl Default for ProjectionOpts {
    fn default() -> Self {
        let store = TileStoreOpts::default();
        Self {
            max_resident_bytes: store.max_resident_bytes,
        }
    }
}

impl From<ProjectionOpts> for TileStoreOpts {
    fn from(opts: ProjectionOpts) -> Self {
        Self {
            max_resident_bytes: opts.max_resident_bytes,
        }
    }
}

/// Borrowed view of a canvas projection. Every read validates the tiles it touches.
pub struct Projection<'a> {
    store: &'a mut TileStore,
    construct: Construct<'a>,
    format: PixelFormat,
}

impl<'a> Projection<'a> {
    pub(crate) fn new(store: &'a mut TileStore, construct: Construct<'a>, format: PixelFormat) -> Self {
        Self {
            store,
            construct,
            format,
        }
    }

    pub fn width(&self) -> u32 {
        self.store.width()
    }

    pub fn height(&self) -> u32 {
        self.store.height()
    }

    pub fn bpp(&self) -> usize {
        self.store.bpp()
    }

    /// Gray+alpha for gray canvases, RGBA otherwise.
    pub fn format(&self) -> PixelFormat {
        self.format
    }

    pub fn stats(&self) -> TileStoreStats {
        self.store.stats()
    }

    pub fn is_tile_valid(&self, x: i32, y: i32) -> bool {
        self.store
            .tile_coord(x, y)
            .is_some_and(|c| self.store.is_valid(c))
    }

    /// Tile containing `(x, y)`, constructing it first if invalid.
    pub fn tile(&mut self, x: i32, y: i32) -> TesseraResult<&Tile> {
        self.store.get_tile(x, y, &mut self.construct)
    }

    pub fn tile_mut(&mut self, x: i32, y: i32) -> TesseraResult<&mut Tile> {
        self.store.get_tile_mut(x, y, &mut self.construct)
    }

    /// Composited color at `(x, y)`; `None` outside the canvas.
    pub fn pixel_at(&mut self, x: i32, y: i32) -> TesseraResult<Option<Rgba8>> {
        if !self.store.bounds().contains_point(x, y) {
            return Ok(None);
        }
        let tile = self.tile(x, y)?;
        let px = tile
            .pixel(x, y)
            .ok_or_else(|| TesseraError::invariant("tile does not contain its own pixel"))?;
        Ok(Some(to_rgba8(px)))
    }

    /// Copy of `rect` (clipped to the canvas) in the projection's format.
    pub fn read_rect(&mut self, rect: Rect) -> TesseraResult<PixelBuffer> {
        let area = rect
            .intersect(self.store.bounds())
            .ok_or_else(|| TesseraError::validation(format!("{rect:?} lies outside the canvas")))?;
        let bpp = self.bpp();
        let mut out = PixelBuffer::new(area.width, area.height, self.format)?;
        for coord in self.store.tiles_in(area) {
            let tb = self.store.tile_bounds(coord);
            let tile = self.tile(tb.x, tb.y)?;
            copy_tile_into(tile, area, out.data_mut(), bpp);
        }
        Ok(out)
    }

    /// Whole canvas as straight RGBA8, row-major.
    ///
    /// Tiles that cannot be built for lack of memory are logged and left transparent so the
    /// rest of the image still renders.
    pub fn flatten_rgba8(&mut self) -> TesseraResult<Vec<u8>> {
        let bounds = self.store.bounds();
        let mut out = try_alloc_zeroed(bounds.area() * 4, "flattened projection")?;
        let mut skipped = 0usize;
        for coord in self.store.tiles_in(bounds) {
            let tb = self.store.tile_bounds(coord);
            let tile = match self.tile(tb.x, tb.y) {
                Ok(tile) => tile,
                Err(err) if err.is_resource_exhausted() => {
                    skipped += 1;
                    tracing::warn!(col = coord.col, row = coord.row, error = %err, "skipping tile");
                    continue;
                }
                Err(err) => return Err(err),
            };
            for y in tb.y..tb.bottom() {
                for x in tb.x..tb.right() {
                    let Some(px) = tile.pixel(x, y) else {
                        continue;
                    };
                    let i = (y as usize * bounds.width as usize + x as usize) * 4;
                    out[i..i + 4].copy_from_slice(&to_rgba8(px).to_array());
                }
            }
        }
        if skipped > 0 {
            tracing::warn!(skipped, "flattened projection is missing tiles");
        }
        Ok(out)
    }

    /// xxh3 of the flattened RGBA8 image together with its size.
    pub fn fingerprint(&mut self) -> TesseraResult<u64> {
        let rgba = self.flatten_rgba8()?;
        let mut hasher = xxhash_rust::xxh3::Xxh3::new();
        hasher.update(&self.width().to_le_bytes());
        hasher.update(&self.height().to_le_bytes());
        hasher.update(&rgba);
        Ok(hasher.digest())
    }
}

fn to_rgba8(px: &[u8]) -> Rgba8 {
    match px {
        &[v, a] => Rgba8::new(v, v, v, a),
        &[r, g, b, a] => Rgba8::new(r, g, b, a),
        _ => Rgba8::TRANSPARENT,
    }
}

fn copy_tile_into(tile: &Tile, area: Rect, out: &mut [u8], bpp: usize) {
    let Some(part) = tile.bounds().intersect(area) else {
        return;
    };
    let tb = tile.bounds();
    let span = part.width as usize * bpp;
    for y in part.y..part.bottom() {
        let src = ((y - tb.y) as usize * tb.width as usize + (part.x - tb.x) as usize) * bpp;
        let dst = ((y - area.y) as usize * area.width as usize + (part.x - area.x) as usize) * bpp;
        out[dst..dst + span].copy_from_slice(&tile.data()[src..src + span]);
    }
}

#[cfg(test)]
#[path = "../../tests/unit/projection/view.rs"]
mod tests;
