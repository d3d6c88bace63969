use crate::foundation::{
    core::{Rect, Rgba8, Size},
    error::{TesseraError, TesseraResult},
};
use crate::model::{
    channel::{Channel, ChannelId},
    colormap::Colormap,
    floating::{DrawableRef, FloatingSelection},
    layer::{Layer, LayerId},
    pixel::ColorModel,
    stack::Stack,
};
use crate::projection::{
    construct::Construct,
    invalidate::{InvalidateReport, invalidate},
    progress::{ConstructProgress, NoProgress},
    view::{Projection, ProjectionOpts},
};
use crate::store::store::TileStore;

/// Multi-layer document plus its lazily built projection.
///
/// Mutations never touch the projection; callers invalidate the affected rectangle
/// afterwards, either rebuilding immediately ([`Canvas::invalidate`]) or on the next read
/// ([`Canvas::invalidate_no_render`]).
#[derive(Debug)]
pub struct Canvas {
    stack: Stack,
    projection: Option<TileStore>,
    opts: ProjectionOpts,
    next_id: u32,
}

impl Canvas {
    pub fn new(width: u32, height: u32, color_model: ColorModel) -> TesseraResult<Self> {
        Self::with_opts(width, height, color_model, ProjectionOpts::default())
    }

    pub fn with_opts(
        width: u32,
        height: u32,
        color_model: ColorModel,
        opts: ProjectionOpts,
    ) -> TesseraResult<Self> {
        let size = Size::new(width, height)?;
        let mut canvas = Self {
            stack: Stack::new(size, color_model),
            projection: None,
            opts,
            next_id: 1,
        };
        canvas.allocate_projection()?;
        Ok(canvas)
    }

    pub fn width(&self) -> u32 {
        self.stack.size.width
    }

    pub fn height(&self) -> u32 {
        self.stack.size.height
    }

    pub fn size(&self) -> Size {
        self.stack.size
    }

    pub fn bounds(&self) -> Rect {
        self.stack.bounds()
    }

    pub fn color_model(&self) -> ColorModel {
        self.stack.color_model
    }

    pub fn opts(&self) -> ProjectionOpts {
        self.opts
    }

    pub fn colormap(&self) -> &Colormap {
        &self.stack.colormap
    }

    pub fn set_colormap(&mut self, colormap: Colormap) {
        self.stack.colormap = colormap;
    }

    fn next_id(&mut self) -> u32 {
        let id = self.next_id;
        self.next_id = self.next_id.wrapping_add(1);
        id
    }

    // Layers

    /// Bottom to top.
    pub fn layers(&self) -> &[Layer] {
        &self.stack.layers
    }

    pub fn layer(&self, id: LayerId) -> Option<&Layer> {
        self.stack.layer(id)
    }

    pub fn layer_mut(&mut self, id: LayerId) -> Option<&mut Layer> {
        self.stack.layers.iter_mut().find(|l| l.id == id)
    }

    pub fn layer_index(&self, id: LayerId) -> Option<usize> {
        self.stack.layer_index(id)
    }

    /// Push `layer` on top of the stack.
    pub fn add_layer(&mut self, layer: Layer) -> LayerId {
        let top = self.stack.layers.len();
        self.place_layer(top, layer)
    }

    /// Insert at `index` (0 = bottom).
    pub fn insert_layer(&mut self, index: usize, layer: Layer) -> TesseraResult<LayerId> {
        if index > self.stack.layers.len() {
            return Err(TesseraError::validation(format!(
                "layer index {index} past stack of {}",
                self.stack.layers.len()
            )));
        }
        Ok(self.place_layer(index, layer))
    }

    fn place_layer(&mut self, index: usize, mut layer: Layer) -> LayerId {
        let id = LayerId(self.next_id());
        layer.id = id;
        self.stack.layers.insert(index, layer);
        id
    }

    pub fn remove_layer(&mut self, id: LayerId) -> TesseraResult<Layer> {
        let index = self.require_layer(id)?;
        Ok(self.stack.layers.remove(index))
    }

    /// Move a layer to `index` in the stack (0 = bottom).
    pub fn move_layer(&mut self, id: LayerId, index: usize) -> TesseraResult<()> {
        let from = self.require_layer(id)?;
        if index >= self.stack.layers.len() {
            return Err(TesseraError::validation(format!(
                "layer index {index} past stack of {}",
                self.stack.layers.len()
            )));
        }
        let layer = self.stack.layers.remove(from);
        self.stack.layers.insert(index, layer);
        Ok(())
    }

    fn require_layer(&self, id: LayerId) -> TesseraResult<usize> {
        self.stack
            .layer_index(id)
            .ok_or_else(|| TesseraError::validation(format!("no layer with id {}", id.get())))
    }

    // Channels

    pub fn channels(&self) -> &[Channel] {
        &self.stack.channels
    }

    pub fn channel(&self, id: ChannelId) -> Option<&Channel> {
        self.stack.channel(id)
    }

    pub fn channel_mut(&mut self, id: ChannelId) -> Option<&mut Channel> {
        self.stack.channels.iter_mut().find(|c| c.id == id)
    }

    pub fn add_channel(&mut self, channel: Channel) -> TesseraResult<ChannelId> {
        let top = self.stack.channels.len();
        self.insert_channel(top, channel)
    }

    pub fn insert_channel(&mut self, index: usize, mut channel: Channel) -> TesseraResult<ChannelId> {
        if channel.pixels().size() != self.stack.size {
            return Err(TesseraError::validation(format!(
                "channel '{}' is {}x{}, canvas is {}x{}",
                channel.name,
                channel.pixels().width(),
                channel.pixels().height(),
                self.width(),
                self.height()
            )));
        }
        if index > self.stack.channels.len() {
            return Err(TesseraError::validation(format!(
                "channel index {index} past stack of {}",
                self.stack.channels.len()
            )));
        }
        let id = ChannelId(self.next_id());
        channel.id = id;
        self.stack.channels.insert(index, channel);
        Ok(id)
    }

    pub fn remove_channel(&mut self, id: ChannelId) -> TesseraResult<Channel> {
        let index = self.require_channel(id)?;
        Ok(self.stack.channels.remove(index))
    }

    pub fn move_channel(&mut self, id: ChannelId, index: usize) -> TesseraResult<()> {
        let from = self.require_channel(id)?;
        if index >= self.stack.channels.len() {
            return Err(TesseraError::validation(format!(
                "channel index {index} past stack of {}",
                self.stack.channels.len()
            )));
        }
        let channel = self.stack.channels.remove(from);
        self.stack.channels.insert(index, channel);
        Ok(())
    }

    fn require_channel(&self, id: ChannelId) -> TesseraResult<usize> {
        self.stack
            .channel_index(id)
            .ok_or_else(|| TesseraError::validation(format!("no channel with id {}", id.get())))
    }

    // Floating selection

    pub fn floating_selection(&self) -> Option<&FloatingSelection> {
        self.stack.floating.as_ref()
    }

    /// Attach a floating selection, replacing any previous one.
    pub fn set_floating_selection(&mut self, fs: FloatingSelection) -> TesseraResult<()> {
        let exists = match fs.target {
            DrawableRef::Layer(id) => self.stack.layer(id).is_some(),
            DrawableRef::LayerMask(id) => self.stack.layer(id).is_some_and(|l| l.mask().is_some()),
            DrawableRef::Channel(id) => self.stack.channel(id).is_some(),
        };
        if !exists {
            return Err(TesseraError::validation(format!(
                "floating selection target {:?} does not exist",
                fs.target
            )));
        }
        self.stack.floating = Some(fs);
        Ok(())
    }

    pub fn take_floating_selection(&mut self) -> Option<FloatingSelection> {
        self.stack.floating.take()
    }

    // Active components

    /// Number of color components in the projection (1 for gray, 3 otherwise).
    pub fn component_count(&self) -> usize {
        self.stack.component_count()
    }

    pub fn is_component_active(&self, component: usize) -> bool {
        self.stack.active.get(component).copied().unwrap_or(false)
    }

    /// Inactive components keep their previous projection bytes during reconstruction.
    pub fn set_component_active(&mut self, component: usize, active: bool) -> TesseraResult<()> {
        if component >= self.component_count() {
            return Err(TesseraError::validation(format!(
                "component {component} out of range for {:?}",
                self.stack.color_model
            )));
        }
        self.stack.active[component] = active;
        Ok(())
    }

    // Geometry

    /// Change canvas geometry. Channels are cropped or padded at the origin; layers keep
    /// their own geometry. Projection tiles whose bounds survive are carried over.
    pub fn resize(&mut self, width: u32, height: u32) -> TesseraResult<()> {
        let size = Size::new(width, height)?;
        let mut channels = Vec::with_capacity(self.stack.channels.len());
        for channel in &self.stack.channels {
            channels.push(channel.pixels().resized(width, height)?);
        }
        for (channel, pixels) in self.stack.channels.iter_mut().zip(channels) {
            channel.set_pixels(pixels);
        }
        self.stack.size = size;
        if self.projection.is_some() {
            self.sync_projection()?;
        }
        tracing::debug!(width, height, "canvas resized");
        Ok(())
    }

    // Projection

    /// Allocate an empty (all invalid) projection matching the canvas.
    pub fn allocate_projection(&mut self) -> TesseraResult<()> {
        let format = self.stack.projection_format();
        self.projection = Some(TileStore::allocate(
            self.width(),
            self.height(),
            format.bpp(),
            self.opts.into(),
        )?);
        Ok(())
    }

    pub fn free_projection(&mut self) {
        self.projection = None;
    }

    pub fn has_projection(&self) -> bool {
        self.projection.is_some()
    }

    /// Bring the projection's geometry and format in line with the canvas, allocating it
    /// if missing.
    fn sync_projection(&mut self) -> TesseraResult<()> {
        let bpp = self.stack.projection_format().bpp();
        let (width, height) = (self.width(), self.height());
        match self.projection.as_mut() {
            Some(store) if store.size() == self.stack.size && store.bpp() == bpp => Ok(()),
            Some(store) => store.reallocate(width, height, bpp),
            None => self.allocate_projection(),
        }
    }

    /// View of the projection, reallocated first if the canvas changed under it.
    pub fn projection(&mut self) -> TesseraResult<Projection<'_>> {
        self.projection_view(None)
    }

    pub fn projection_with_progress<'a>(
        &'a mut self,
        progress: &'a mut dyn ConstructProgress,
    ) -> TesseraResult<Projection<'a>> {
        self.projection_view(Some(progress))
    }

    fn projection_view<'a>(
        &'a mut self,
        progress: Option<&'a mut dyn ConstructProgress>,
    ) -> TesseraResult<Projection<'a>> {
        let format = self.stack.projection_format();
        let (store, stack) = self.split()?;
        Ok(Projection::new(store, Construct::new(stack, progress), format))
    }

    /// Synced projection store alongside the stack that feeds it.
    fn split(&mut self) -> TesseraResult<(&mut TileStore, &Stack)> {
        self.sync_projection()?;
        let Self {
            stack, projection, ..
        } = self;
        let store = projection
            .as_mut()
            .ok_or_else(|| TesseraError::invariant("projection missing after sync"))?;
        Ok((store, stack))
    }

    fn skips_invalidation(&self, rect: Rect) -> bool {
        if rect.is_empty() {
            return true;
        }
        if self.projection.is_none() {
            tracing::debug!(?rect, "no projection allocated; nothing to invalidate");
            return true;
        }
        false
    }

    /// Invalidate `rect` and rebuild it immediately in one batched pass.
    pub fn invalidate(
        &mut self,
        rect: Rect,
        valid_sub: Option<Rect>,
    ) -> TesseraResult<InvalidateReport> {
        self.invalidate_with_progress(rect, valid_sub, &mut NoProgress)
    }

    pub fn invalidate_with_progress(
        &mut self,
        rect: Rect,
        valid_sub: Option<Rect>,
        progress: &mut dyn ConstructProgress,
    ) -> TesseraResult<InvalidateReport> {
        if self.skips_invalidation(rect) {
            return Ok(InvalidateReport::default());
        }
        let (store, stack) = self.split()?;
        let mut construct = Construct::new(stack, Some(progress));
        invalidate(store, Some(&mut construct), rect, valid_sub)
    }

    /// Invalidate `rect`, leaving reconstruction to the next read.
    pub fn invalidate_no_render(
        &mut self,
        rect: Rect,
        valid_sub: Option<Rect>,
    ) -> TesseraResult<InvalidateReport> {
        if self.skips_invalidation(rect) {
            return Ok(InvalidateReport::default());
        }
        let (store, _) = self.split()?;
        invalidate(store, None, rect, valid_sub)
    }

    /// Composited color at `(x, y)`, building the containing tile if needed.
    pub fn projection_pixel_at(&mut self, x: i32, y: i32) -> TesseraResult<Option<Rgba8>> {
        self.projection()?.pixel_at(x, y)
    }
}

#[cfg(test)]
#[path = "../../tests/unit/model/canvas.rs"]
mod tests;
