use crate::foundation::error::{TesseraError, TesseraResult};
use std::collections::HashMap;

pub const MAX_COLORMAP_ENTRIES: usize = 256;

/// Palette of an indexed canvas.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Colormap {
    entries: Vec<[u8; 3]>,
}

impl Colormap {
    pub fn new(entries: Vec<[u8; 3]>) -> TesseraResult<Self> {
        if entries.len() > MAX_COLORMAP_ENTRIES {
            return Err(TesseraError::validation(format!(
                "colormap has {} entries, max {MAX_COLORMAP_ENTRIES}",
                entries.len()
            )));
        }
        Ok(Self { entries })
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn entries(&self) -> &[[u8; 3]] {
        &self.entries
    }

    /// Color for `index`; indices past the end read as black.
    pub fn color(&self, index: u8) -> [u8; 3] {
        self.entries
            .get(usize::from(index))
            .copied()
            .unwrap_or([0, 0, 0])
    }

    /// Index of the entry closest to `rgb` by squared distance. Ties keep the lowest index.
    pub fn nearest(&self, rgb: [u8; 3]) -> u8 {
        let mut best = 0usize;
        let mut best_dist = u32::MAX;
        for (i, entry) in self.entries.iter().enumerate() {
            let dist: u32 = entry
                .iter()
                .zip(rgb)
                .map(|(&a, b)| {
                    let d = i32::from(a) - i32::from(b);
                    (d * d) as u32
                })
                .sum();
            if dist < best_dist {
                best = i;
                best_dist = dist;
                if dist == 0 {
                    break;
                }
            }
        }
        best as u8
    }
}

/// Memo of RGB -> colormap index lookups, valid for one colormap.
#[derive(Debug, Default)]
pub(crate) struct NearestColorCache {
    hits: HashMap<[u8; 3], u8>,
}

impl NearestColorCache {
    pub(crate) fn lookup(&mut self, colormap: &Colormap, rgb: [u8; 3]) -> u8 {
        *self
            .hits
            .entry(rgb)
            .or_insert_with(|| colormap.nearest(rgb))
    }

    #[cfg(test)]
    pub(crate) fn len(&self) -> usize {
        self.hits.len()
    }
}

#[cfg(test)]
#[path = "../../tests/unit/model/colormap.rs"]
mod tests;
