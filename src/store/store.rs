use crate::foundation::{
    core::{Rect, Size},
    error::{TesseraError, TesseraResult, try_alloc_zeroed},
};
use crate::store::swap::TileSwap;
use crate::store::tile::{RegionMut, TILE_SIZE, Tile, TileCoord};

/// Fills an invalid tile on demand.
///
/// Supplied to the store whenever a read may need validation; the store marks the tile
/// valid once `produce` returns `Ok`.
pub trait TileProducer {
    fn produce(&mut self, tile_bounds: Rect, dst: &mut RegionMut<'_>) -> TesseraResult<()>;
}

/// Tile store configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TileStoreOpts {
    /// Maximum bytes of resident tile data before least-recently-touched tiles are
    /// evicted. `0` disables the cap.
    pub max_resident_bytes: usize,
}

impl Default for TileStoreOpts {
    fn default() -> Self {
        Self {
            max_resident_bytes: 256 * 1024 * 1024,
        }
    }
}

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct TileStoreStats {
    pub resident_tiles: usize,
    pub resident_bytes: usize,
    pub alloc_tiles: u64,
    pub produced: u64,
    pub evicted: u64,
    /// Evicted tiles whose bytes currently sit in the swap file.
    pub swapped_tiles: usize,
    pub swapped_in: u64,
}

/// Pixel storage partitioned into [`TILE_SIZE`] tiles, each independently valid or invalid.
///
/// Tiles are allocated lazily (zeroed, invalid) on first touch. Tiles evicted under the
/// memory cap are written to a temporary swap file and come back invalid with their last
/// bytes, so a producer that reads the previous contents still sees them.
#[derive(Debug)]
pub struct TileStore {
    size: Size,
    bpp: usize,
    cols: u32,
    rows: u32,
    tiles: Vec<Option<Tile>>,
    opts: TileStoreOpts,
    stats: TileStoreStats,
    clock: u64,
    swap: Option<TileSwap>,
}

impl TileStore {
    pub fn allocate(width: u32, height: u32, bpp: usize, opts: TileStoreOpts) -> TesseraResult<Self> {
        let size = Size::new(width, height)?;
        if !(1..=4).contains(&bpp) {
            return Err(TesseraError::validation(format!(
                "tile store bpp must be 1..=4, got {bpp}"
            )));
        }
        let (cols, rows) = grid_dims(size);
        let slots = (cols as usize) * (rows as usize);
        let mut tiles = Vec::new();
        tiles.try_reserve_exact(slots).map_err(|_| {
            TesseraError::resource_exhausted(format!("tile table with {slots} slots"))
        })?;
        tiles.resize_with(slots, || None);

        Ok(Self {
            size,
            bpp,
            cols,
            rows,
            tiles,
            opts,
            stats: TileStoreStats::default(),
            clock: 0,
            swap: None,
        })
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

    pub fn bpp(&self) -> usize {
        self.bpp
    }

    pub fn bounds(&self) -> Rect {
        self.size.bounds()
    }

    pub fn grid(&self) -> (u32, u32) {
        (self.cols, self.rows)
    }

    pub fn opts(&self) -> TileStoreOpts {
        self.opts
    }

    pub fn stats(&self) -> TileStoreStats {
        self.stats.clone()
    }

    pub fn tile_coord(&self, x: i32, y: i32) -> Option<TileCoord> {
        if !self.bounds().contains_point(x, y) {
            return None;
        }
        Some(TileCoord::new(x as u32 / TILE_SIZE, y as u32 / TILE_SIZE))
    }

    pub fn tile_bounds(&self, coord: TileCoord) -> Rect {
        let x = coord.col * TILE_SIZE;
        let y = coord.row * TILE_SIZE;
        Rect::new(
            x as i32,
            y as i32,
            TILE_SIZE.min(self.size.width - x),
            TILE_SIZE.min(self.size.height - y),
        )
    }

    /// Coordinates of every tile overlapping `rect`, row-major.
    pub fn tiles_in(&self, rect: Rect) -> Vec<TileCoord> {
        let Some(area) = rect.intersect(self.bounds()) else {
            return Vec::new();
        };
        let c0 = area.x as u32 / TILE_SIZE;
        let r0 = area.y as u32 / TILE_SIZE;
        let c1 = (area.right() as u32 - 1) / TILE_SIZE;
        let r1 = (area.bottom() as u32 - 1) / TILE_SIZE;
        (r0..=r1)
            .flat_map(|row| (c0..=c1).map(move |col| TileCoord::new(col, row)))
            .collect()
    }

    pub fn is_valid(&self, coord: TileCoord) -> bool {
        self.slot(coord)
            .and_then(|i| self.tiles[i].as_ref())
            .is_some_and(Tile::is_valid)
    }

    /// Mark the tile containing pixel `(x, y)` invalid.
    pub fn invalidate_tile(&mut self, x: i32, y: i32) {
        if let Some(coord) = self.tile_coord(x, y) {
            self.invalidate(coord);
        }
    }

    pub fn invalidate(&mut self, coord: TileCoord) {
        if let Some(tile) = self.slot(coord).and_then(|i| self.tiles[i].as_mut()) {
            tile.valid = false;
        }
    }

    /// Tile containing pixel `(x, y)` for reading, validating it through `producer` first.
    pub fn get_tile(
        &mut self,
        x: i32,
        y: i32,
        producer: &mut dyn TileProducer,
    ) -> TesseraResult<&Tile> {
        let idx = self.validated_slot(x, y, producer)?;
        self.tiles[idx]
            .as_ref()
            .ok_or_else(|| TesseraError::invariant("validated tile vanished"))
    }

    /// Tile containing pixel `(x, y)` for writing, validating it through `producer` first.
    pub fn get_tile_mut(
        &mut self,
        x: i32,
        y: i32,
        producer: &mut dyn TileProducer,
    ) -> TesseraResult<&mut Tile> {
        let idx = self.validated_slot(x, y, producer)?;
        self.tiles[idx]
            .as_mut()
            .ok_or_else(|| TesseraError::invariant("validated tile vanished"))
    }

    fn validated_slot(
        &mut self,
        x: i32,
        y: i32,
        producer: &mut dyn TileProducer,
    ) -> TesseraResult<usize> {
        let coord = self.tile_coord(x, y).ok_or_else(|| {
            TesseraError::validation(format!(
                "pixel ({x}, {y}) outside {}x{} store",
                self.size.width, self.size.height
            ))
        })?;
        let idx = self.ensure_allocated(coord)?;
        let tile = self.tiles[idx]
            .as_mut()
            .ok_or_else(|| TesseraError::invariant("allocated tile vanished"))?;
        if !tile.valid {
            let bounds = tile.bounds;
            tracing::debug!(col = coord.col, row = coord.row, "producing tile");
            producer.produce(bounds, &mut tile.region_mut())?;
            tile.valid = true;
            self.stats.produced = self.stats.produced.saturating_add(1);
        }
        self.evict_over_budget(Some(idx))?;
        Ok(idx)
    }

    fn slot(&self, coord: TileCoord) -> Option<usize> {
        (coord.col < self.cols && coord.row < self.rows)
            .then(|| (coord.row as usize) * (self.cols as usize) + coord.col as usize)
    }

    fn ensure_allocated(&mut self, coord: TileCoord) -> TesseraResult<usize> {
        let idx = self
            .slot(coord)
            .ok_or_else(|| TesseraError::validation("tile coordinate outside grid"))?;
        self.clock = self.clock.wrapping_add(1);
        if let Some(tile) = self.tiles[idx].as_mut() {
            tile.last_touch = self.clock;
            return Ok(idx);
        }

        let bounds = self.tile_bounds(coord);
        let bytes = bounds.area() * self.bpp;
        let data = match self.swap_in(idx, bytes)? {
            Some(data) => data,
            None => {
                self.stats.alloc_tiles = self.stats.alloc_tiles.saturating_add(1);
                try_alloc_zeroed(bytes, "tile")?
            }
        };
        self.tiles[idx] = Some(Tile {
            coord,
            bounds,
            bpp: self.bpp,
            data,
            valid: false,
            last_touch: self.clock,
        });
        self.stats.resident_tiles += 1;
        self.stats.resident_bytes = self.stats.resident_bytes.saturating_add(bytes);
        Ok(idx)
    }

    fn evict_over_budget(&mut self, keep: Option<usize>) -> TesseraResult<()> {
        let cap = self.opts.max_resident_bytes;
        if cap == 0 {
            return Ok(());
        }
        while self.stats.resident_bytes > cap {
            let victim = self
                .tiles
                .iter()
                .enumerate()
                .filter(|&(i, _)| Some(i) != keep)
                .filter_map(|(i, t)| t.as_ref().map(|t| (i, t.last_touch)))
                .min_by_key(|&(_, touch)| touch)
                .map(|(i, _)| i);
            let Some(victim) = victim else {
                break;
            };
            self.swap_out(victim)?;
        }
        Ok(())
    }

    /// Move a resident tile's bytes into the swap file and drop it from memory.
    fn swap_out(&mut self, idx: usize) -> TesseraResult<()> {
        if self.swap.is_none() {
            self.swap = Some(TileSwap::create(self.tiles.len(), self.bpp)?);
        }
        let (Some(swap), Some(tile)) = (self.swap.as_mut(), self.tiles[idx].as_ref()) else {
            return Ok(());
        };
        swap.write(idx, &tile.data)?;
        tracing::debug!(col = tile.coord.col, row = tile.coord.row, "evicting tile to swap");
        let bytes = tile.data.len();
        self.tiles[idx] = None;
        self.stats.resident_tiles -= 1;
        self.stats.resident_bytes = self.stats.resident_bytes.saturating_sub(bytes);
        self.stats.evicted = self.stats.evicted.saturating_add(1);
        self.stats.swapped_tiles += 1;
        Ok(())
    }

    /// Swapped bytes for slot `idx`, released from the swap file.
    fn swap_in(&mut self, idx: usize, len: usize) -> TesseraResult<Option<Vec<u8>>> {
        let Some(swap) = self.swap.as_mut() else {
            return Ok(None);
        };
        let data = swap.take(idx, len)?;
        if data.is_some() {
            self.stats.swapped_tiles -= 1;
            self.stats.swapped_in = self.stats.swapped_in.saturating_add(1);
        }
        Ok(data)
    }

    /// Copy the current bytes of `rect` without validating anything. Swapped tiles are read
    /// from the swap file; tiles never touched read as zero.
    pub(crate) fn snapshot_region(&self, rect: Rect) -> TesseraResult<Vec<u8>> {
        let mut out = try_alloc_zeroed(rect.area() * self.bpp, "region snapshot")?;
        let row_bytes = rect.width as usize * self.bpp;
        for coord in self.tiles_in(rect) {
            let Some(idx) = self.slot(coord) else {
                continue;
            };
            let bounds = self.tile_bounds(coord);
            let swapped;
            let data: &[u8] = match (&self.tiles[idx], &self.swap) {
                (Some(tile), _) => &tile.data,
                (None, Some(swap)) if swap.contains(idx) => {
                    let mut buf = try_alloc_zeroed(bounds.area() * self.bpp, "swapped tile")?;
                    swap.read(idx, &mut buf)?;
                    swapped = buf;
                    &swapped
                }
                _ => continue,
            };
            let Some(area) = bounds.intersect(rect) else {
                continue;
            };
            let span = area.width as usize * self.bpp;
            for y in area.y..area.bottom() {
                let src = row_start(bounds, self.bpp, area.x, y);
                let dst = (y - rect.y) as usize * row_bytes + (area.x - rect.x) as usize * self.bpp;
                out[dst..dst + span].copy_from_slice(&data[src..src + span]);
            }
        }
        Ok(out)
    }

    /// Write `data` (tightly packed `rect`) into the `targets` tiles, allocating as needed.
    ///
    /// Targets fully covered by `rect` become valid; partially covered ones keep their state
    /// and tiles not listed are left untouched. Returns the number of tiles marked valid.
    pub(crate) fn store_region(
        &mut self,
        rect: Rect,
        data: &[u8],
        targets: &[TileCoord],
    ) -> TesseraResult<usize> {
        let row_bytes = rect.width as usize * self.bpp;
        if data.len() != rect.area() * self.bpp {
            return Err(TesseraError::validation("store_region buffer length mismatch"));
        }
        let mut validated = 0;
        for &coord in targets {
            let idx = self.ensure_allocated(coord)?;
            let bpp = self.bpp;
            let Some(tile) = self.tiles[idx].as_mut() else {
                continue;
            };
            let Some(area) = tile.bounds.intersect(rect) else {
                continue;
            };
            let span = area.width as usize * bpp;
            for y in area.y..area.bottom() {
                let dst = row_start(tile.bounds, bpp, area.x, y);
                let src = (y - rect.y) as usize * row_bytes + (area.x - rect.x) as usize * bpp;
                tile.data[dst..dst + span].copy_from_slice(&data[src..src + span]);
            }
            if area == tile.bounds {
                tile.valid = true;
                validated += 1;
            }
        }
        self.evict_over_budget(None)?;
        Ok(validated)
    }

    /// Re-grid the store to a new geometry.
    ///
    /// Tiles whose bounds are identical in the old and new grid (and whose bpp is unchanged)
    /// are carried over with their contents; resident ones keep their validity and swapped
    /// ones come back invalid. Everything else is dropped.
    pub fn reallocate(&mut self, width: u32, height: u32, bpp: usize) -> TesseraResult<()> {
        let mut next = Self::allocate(width, height, bpp, self.opts)?;
        next.stats.alloc_tiles = self.stats.alloc_tiles;
        next.stats.produced = self.stats.produced;
        next.stats.evicted = self.stats.evicted;
        next.clock = self.clock;

        if bpp == self.bpp {
            for idx in 0..self.tiles.len() {
                let coord = TileCoord::new(
                    (idx % self.cols as usize) as u32,
                    (idx / self.cols as usize) as u32,
                );
                let bounds = self.tile_bounds(coord);
                let Some(slot) = next
                    .slot(coord)
                    .filter(|_| next.tile_bounds(coord) == bounds)
                else {
                    continue;
                };
                let tile = match self.tiles[idx].take() {
                    Some(tile) => tile,
                    None => match self.swap_in(idx, bounds.area() * bpp)? {
                        Some(data) => Tile {
                            coord,
                            bounds,
                            bpp,
                            data,
                            valid: false,
                            last_touch: 0,
                        },
                        None => continue,
                    },
                };
                next.stats.resident_tiles += 1;
                next.stats.resident_bytes += tile.data.len();
                next.tiles[slot] = Some(tile);
            }
        }
        next.stats.swapped_in = self.stats.swapped_in;
        next.evict_over_budget(None)?;

        tracing::debug!(
            width,
            height,
            bpp,
            kept = next.stats.resident_tiles,
            "reallocated tile store"
        );
        *self = next;
        Ok(())
    }
}

fn grid_dims(size: Size) -> (u32, u32) {
    (
        size.width.div_ceil(TILE_SIZE),
        size.height.div_ceil(TILE_SIZE),
    )
}

fn row_start(bounds: Rect, bpp: usize, x: i32, y: i32) -> usize {
    ((y - bounds.y) as usize * bounds.width as usize + (x - bounds.x) as usize) * bpp
}

#[cfg(test)]
#[path = "../../tests/unit/store/store.rs"]
mod tests;
