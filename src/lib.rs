//! Tessera is a tile-based, lazily validated compositing engine for layered raster
//! documents.
//!
//! A [`Canvas`] holds an ordered layer stack, tinted selection channels and an optional
//! floating selection. Its projection is a [`TileStore`] of 64x64 tiles that are rebuilt
//! only when something reads them after an invalidation:
//!
//! - Mutate the canvas (pixels, masks, stack order, opacity, modes)
//! - Invalidate the touched rectangle ([`Canvas::invalidate`] or
//!   [`Canvas::invalidate_no_render`])
//! - Read through [`Canvas::projection`]
#![forbid(unsafe_code)]

mod composite;
mod document;
mod foundation;
mod model;
mod projection;
mod store;

pub use crate::composite::blend::BlendMode;
pub use crate::document::{
    ChannelSpec, Document, DrawableSpec, FillSpec, FloatingSpec, LayerSpec, MaskSpec, RectFill,
};
pub use crate::foundation::core::{MAX_DIMENSION, Rect, Rgba8, Size};
pub use crate::foundation::error::{TesseraError, TesseraResult};
pub use crate::model::canvas::Canvas;
pub use crate::model::channel::{Channel, ChannelId};
pub use crate::model::colormap::{Colormap, MAX_COLORMAP_ENTRIES};
pub use crate::model::floating::{DrawableRef, FloatingSelection};
pub use crate::model::layer::{Layer, LayerId, LayerMask};
pub use crate::model::pixel::{ColorModel, PixelBuffer, PixelFormat};
pub use crate::projection::invalidate::InvalidateReport;
pub use crate::projection::progress::{ConstructProgress, NoProgress};
pub use crate::projection::view::{Projection, ProjectionOpts};
pub use crate::store::store::{TileProducer, TileStore, TileStoreOpts, TileStoreStats};
pub use crate::store::tile::{RegionMut, TILE_SIZE, Tile, TileCoord};
