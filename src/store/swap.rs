use crate::foundation::error::{TesseraError, TesseraResult, try_alloc_zeroed};
use crate::store::tile::TILE_SIZE;
use std::fs::File;
use std::io::{Read, Seek, SeekFrom, Write};

/// Anonymous temporary file holding the bytes of evicted tiles, one fixed slot per grid
/// position.
#[derive(Debug)]
pub(crate) struct TileSwap {
    file: File,
    slot_bytes: u64,
    present: Vec<bool>,
}

impl TileSwap {
    pub(crate) fn create(slots: usize, bpp: usize) -> TesseraResult<Self> {
        let file = tempfile::tempfile().map_err(|e| swap_error("create", e))?;
        tracing::debug!(slots, bpp, "opened tile swap");
        Ok(Self {
            file,
            slot_bytes: u64::from(TILE_SIZE * TILE_SIZE) * bpp as u64,
            present: vec![false; slots],
        })
    }

    pub(crate) fn contains(&self, slot: usize) -> bool {
        self.present.get(slot).copied().unwrap_or(false)
    }

    pub(crate) fn write(&mut self, slot: usize, data: &[u8]) -> TesseraResult<()> {
        if slot >= self.present.len() || data.len() as u64 > self.slot_bytes {
            return Err(TesseraError::invariant(format!("tile swap slot {slot} out of range")));
        }
        let mut f = &self.file;
        f.seek(SeekFrom::Start(self.offset(slot)))
            .and_then(|_| f.write_all(data))
            .map_err(|e| swap_error("write", e))?;
        self.present[slot] = true;
        Ok(())
    }

    /// Fill `buf` from `slot`, leaving the slot in place.
    pub(crate) fn read(&self, slot: usize, buf: &mut [u8]) -> TesseraResult<()> {
        if !self.contains(slot) {
            return Err(TesseraError::invariant(format!("tile swap slot {slot} is empty")));
        }
        let mut f = &self.file;
        f.seek(SeekFrom::Start(self.offset(slot)))
            .and_then(|_| f.read_exact(buf))
            .map_err(|e| swap_error("read", e))
    }

    /// Bytes of `slot` (`len` of them), releasing the slot. `None` when nothing is swapped there.
    pub(crate) fn take(&mut self, slot: usize, len: usize) -> TesseraResult<Option<Vec<u8>>> {
        if !self.contains(slot) {
            return Ok(None);
        }
        let mut data = try_alloc_zeroed(len, "swapped tile")?;
        self.read(slot, &mut data)?;
        self.present[slot] = false;
        Ok(Some(data))
    }

    fn offset(&self, slot: usize) -> u64 {
        slot as u64 * self.slot_bytes
    }
}

fn swap_error(op: &str, err: std::io::Error) -> TesseraError {
    TesseraError::resource_exhausted(format!("tile swap {op}: {err}"))
}
