use crate::foundation::{core::Rect, error::TesseraResult};
use crate::projection::construct::Construct;
use crate::store::{store::TileStore, tile::RegionMut, tile::TileCoord};
use smallvec::SmallVec;

/// Outcome of one invalidation call.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct InvalidateReport {
    /// Tiles marked invalid by the scan.
    pub invalidated_tiles: usize,
    /// Tiles left invalid for the next read to rebuild.
    pub deferred_tiles: usize,
    /// Rectangle rebuilt immediately, if any.
    pub constructed: Option<Rect>,
}

/// Mark the tiles under `rect` invalid and, when `construct` is given, rebuild them in one
/// batched pass over their bounding box.
///
/// Tiles entirely inside `valid_sub` are left alone (only rebuilt if already invalid); tiles
/// entirely outside it are invalidated but deferred to lazy validation.
#[tracing::instrument(level = "debug", skip(store, construct))]
pub(crate) fn invalidate(
    store: &mut TileStore,
    construct: Option<&mut Construct<'_>>,
    rect: Rect,
    valid_sub: Option<Rect>,
) -> TesseraResult<InvalidateReport> {
    let mut report = InvalidateReport::default();
    let Some(area) = rect.intersect(store.bounds()) else {
        return Ok(report);
    };

    let mut rebuild: SmallVec<[TileCoord; 16]> = SmallVec::new();
    let mut bbox = Rect::default();
    for coord in store.tiles_in(area) {
        let bounds = store.tile_bounds(coord);
        match valid_sub {
            Some(valid) if valid.intersect(bounds).is_none() => {
                store.invalidate(coord);
                report.invalidated_tiles += 1;
                report.deferred_tiles += 1;
            }
            Some(valid) if valid.contains_rect(bounds) => {
                if !store.is_valid(coord) {
                    rebuild.push(coord);
                    bbox = bbox.union(bounds);
                }
            }
            _ => {
                store.invalidate(coord);
                report.invalidated_tiles += 1;
                rebuild.push(coord);
                bbox = bbox.union(bounds);
            }
        }
    }

    let Some(construct) = construct.filter(|_| !bbox.is_empty()) else {
        report.deferred_tiles += rebuild.len();
        return Ok(report);
    };

    match construct_batch(store, construct, bbox, &rebuild) {
        Ok(()) => report.constructed = Some(bbox),
        Err(err) if err.is_resource_exhausted() => {
            tracing::warn!(?bbox, error = %err, "batched construct failed; tiles left for lazy validation");
            report.deferred_tiles += rebuild.len();
        }
        Err(err) => return Err(err),
    }
    Ok(report)
}

fn construct_batch(
    store: &mut TileStore,
    construct: &mut Construct<'_>,
    bbox: Rect,
    targets: &[TileCoord],
) -> TesseraResult<()> {
    let mut scratch = store.snapshot_region(bbox)?;
    let mut region = RegionMut::new(&mut scratch, bbox, store.bpp())?;
    construct.run(&mut region)?;
    store.store_region(bbox, &scratch, targets)?;
    Ok(())
}

#[cfg(test)]
#[path = "../../tests/unit/projection/invalidate.rs"]
mod tests;
