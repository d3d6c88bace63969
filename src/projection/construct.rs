use crate::composite::{
    blend::BlendMode,
    convert::{Expanded, encode, expand},
    pixels::{SourceKind, Stroke, combine, paint},
};
use crate::foundation::{
    core::Rect,
    error::{TesseraError, TesseraResult, try_alloc_zeroed},
    math::u8_to_unit,
};
use crate::model::{
    channel::Channel,
    colormap::NearestColorCache,
    floating::DrawableRef,
    layer::Layer,
    pixel::{PixelBuffer, PixelFormat},
    stack::Stack,
};
use crate::projection::progress::ConstructProgress;
use crate::store::{
    store::TileProducer,
    tile::{RegionMut, TILE_SIZE},
};

/// Read-only window over a drawable's pixels, placed in canvas coordinates.
#[derive(Clone, Copy)]
struct SourceView<'p> {
    bounds: Rect,
    format: PixelFormat,
    data: &'p [u8],
}

impl<'p> SourceView<'p> {
    fn of(buffer: &'p PixelBuffer, x: i32, y: i32) -> Self {
        Self {
            bounds: Rect::new(x, y, buffer.width(), buffer.height()),
            format: buffer.format(),
            data: buffer.data(),
        }
    }

    fn at(&self, x: i32, y: i32) -> &'p [u8] {
        let bpp = self.format.bpp();
        let i = ((y - self.bounds.y) as usize * self.bounds.width as usize
            + (x - self.bounds.x) as usize)
            * bpp;
        &self.data[i..i + bpp]
    }
}

/// Target drawable pixels with the floating selection already composited in, limited to
/// the rectangle under construction.
struct FloatingPatch {
    target: DrawableRef,
    origin: (i32, i32),
    pixels: PixelBuffer,
}

impl FloatingPatch {
    fn view(&self) -> SourceView<'_> {
        SourceView::of(&self.pixels, self.origin.0, self.origin.1)
    }
}

/// Rebuilds projection pixels for one rectangle from the layer and channel stacks.
pub(crate) struct Construct<'a> {
    stack: &'a Stack,
    progress: Option<&'a mut dyn ConstructProgress>,
    nearest: NearestColorCache,
}

impl<'a> Construct<'a> {
    pub(crate) fn new(stack: &'a Stack, progress: Option<&'a mut dyn ConstructProgress>) -> Self {
        Self {
            stack,
            progress,
            nearest: NearestColorCache::default(),
        }
    }

    /// Composite everything visible into `dst`, which covers the rectangle to rebuild.
    #[tracing::instrument(level = "debug", skip(self, dst), fields(rect = ?dst.bounds()))]
    pub(crate) fn run(&mut self, dst: &mut RegionMut<'_>) -> TesseraResult<()> {
        let stack = self.stack;
        let rect = dst.bounds();
        let bpp = stack.projection_format().bpp();
        if dst.bpp() != bpp {
            return Err(TesseraError::invariant(format!(
                "projection region has {} bytes per pixel, canvas needs {bpp}",
                dst.bpp()
            )));
        }
        if let Some(progress) = self.progress.as_deref_mut() {
            progress.started(rect);
        }

        let saved = self.save_inactive(dst)?;
        let patch = self.floating_patch(rect)?;
        for cell in tile_cells(rect) {
            self.composite_cell(dst, cell, patch.as_ref())?;
        }

        if let Some(saved) = saved {
            self.restore_inactive(dst, &saved);
        }
        if let Some(progress) = self.progress.as_deref_mut() {
            progress.finished(rect);
        }
        Ok(())
    }

    /// One tile-aligned cell, cleared and painted independently of its neighbours.
    fn composite_cell(
        &self,
        dst: &mut RegionMut<'_>,
        cell: Rect,
        patch: Option<&FloatingPatch>,
    ) -> TesseraResult<()> {
        let stack = self.stack;
        let bpp = dst.bpp();
        if !stack.layers.iter().any(|l| l.covers_opaquely(cell)) {
            dst.fill(cell, &[0u8; 4][..bpp]);
        }
        let mut painted = false;
        for layer in stack.layers.iter().filter(|l| l.visible) {
            painted = self.composite_layer(dst, cell, layer, patch, painted)?;
        }
        for channel in stack.channels.iter().filter(|c| c.visible) {
            painted = self.composite_channel(dst, cell, channel, patch, painted)?;
        }
        Ok(())
    }

    fn composite_layer(
        &self,
        dst: &mut RegionMut<'_>,
        cell: Rect,
        layer: &Layer,
        patch: Option<&FloatingPatch>,
        painted: bool,
    ) -> TesseraResult<bool> {
        let Some(area) = layer.bounds().intersect(cell) else {
            return Ok(painted);
        };
        let (ox, oy) = layer.offset;
        let patched = |target: DrawableRef| patch.filter(|p| p.target == target);

        let pixels = patched(DrawableRef::Layer(layer.id))
            .map_or_else(|| SourceView::of(layer.pixels(), ox, oy), FloatingPatch::view);
        let mask = match layer.mask() {
            Some(m) if m.pixels().size() != layer.pixels().size() => {
                return Err(TesseraError::invariant(format!(
                    "mask of layer '{}' does not match its geometry",
                    layer.name
                )));
            }
            Some(m) => {
                let view = patched(DrawableRef::LayerMask(layer.id))
                    .map_or_else(|| SourceView::of(m.pixels(), ox, oy), FloatingPatch::view);
                Some((m.show, m.apply, view))
            }
            None => None,
        };

        let show = mask.is_some_and(|(show, _, _)| show);
        let kind = if show {
            SourceKind::Inten
        } else {
            SourceKind::from(layer.format())
        };
        if painted && kind == SourceKind::Indexed {
            tracing::error!(
                layer = layer.id.get(),
                "indexed layer without alpha composited over painted pixels"
            );
            return Err(TesseraError::invariant(format!(
                "indexed layer '{}' has no alpha and must be the first layer painted",
                layer.name
            )));
        }

        let mode = if show { BlendMode::Normal } else { layer.mode };
        let opacity = layer.clamped_opacity();
        let gray = self.gray_projection();
        let colormap = &self.stack.colormap;

        for y in area.y..area.bottom() {
            for x in area.x..area.right() {
                let (src, coverage) = match mask {
                    Some((true, _, view)) => (Expanded::gray(view.at(x, y)[0]), opacity),
                    Some((false, true, view)) => (
                        expand(pixels.format, pixels.at(x, y), colormap, gray),
                        opacity * u8_to_unit(view.at(x, y)[0]),
                    ),
                    _ => (expand(pixels.format, pixels.at(x, y), colormap, gray), opacity),
                };
                let stroke = Stroke {
                    kind,
                    mode,
                    src,
                    coverage,
                };
                let px = dst.pixel_mut(x, y);
                if painted {
                    combine(px, stroke, x, y);
                } else {
                    paint(px, stroke, x, y);
                }
            }
        }
        Ok(true)
    }

    fn composite_channel(
        &self,
        dst: &mut RegionMut<'_>,
        cell: Rect,
        channel: &Channel,
        patch: Option<&FloatingPatch>,
        painted: bool,
    ) -> TesseraResult<bool> {
        if channel.pixels().size() != self.stack.size {
            return Err(TesseraError::invariant(format!(
                "channel '{}' does not match the canvas geometry",
                channel.name
            )));
        }
        let area = cell;
        let values = patch
            .filter(|p| p.target == DrawableRef::Channel(channel.id))
            .map_or_else(|| SourceView::of(channel.pixels(), 0, 0), FloatingPatch::view);
        let tint = expand(
            PixelFormat::Rgb,
            &channel.tint.rgb(),
            &self.stack.colormap,
            self.gray_projection(),
        );

        for y in area.y..area.bottom() {
            for x in area.x..area.right() {
                let stroke = Stroke {
                    kind: SourceKind::Inten,
                    mode: BlendMode::Normal,
                    src: tint,
                    coverage: channel.coverage(values.at(x, y)[0]),
                };
                let px = dst.pixel_mut(x, y);
                if painted {
                    combine(px, stroke, x, y);
                } else {
                    paint(px, stroke, x, y);
                }
            }
        }
        Ok(true)
    }

    /// Copy of the floating selection's target within `rect`, with the selection composited
    /// on top and converted back to the target's format.
    fn floating_patch(&mut self, rect: Rect) -> TesseraResult<Option<FloatingPatch>> {
        let stack = self.stack;
        let Some(fs) = stack.floating.as_ref().filter(|fs| fs.layer.visible) else {
            return Ok(None);
        };
        let missing = || {
            TesseraError::invariant(format!(
                "floating selection target {:?} is not on the canvas",
                fs.target
            ))
        };
        let (bounds, target) = match fs.target {
            DrawableRef::Layer(id) => {
                let layer = stack.layer(id).ok_or_else(missing)?;
                (layer.bounds(), layer.pixels())
            }
            DrawableRef::LayerMask(id) => {
                let layer = stack.layer(id).ok_or_else(missing)?;
                let mask = layer.mask().ok_or_else(missing)?;
                (layer.bounds(), mask.pixels())
            }
            DrawableRef::Channel(id) => {
                let channel = stack.channel(id).ok_or_else(missing)?;
                (stack.bounds(), channel.pixels())
            }
        };
        let Some(area) = bounds.intersect(rect) else {
            return Ok(None);
        };
        let float = &fs.layer;
        let Some(float_area) = float.bounds().intersect(area) else {
            return Ok(None);
        };

        let mut pixels = target.crop(area.translate(-bounds.x, -bounds.y))?;
        let target_format = pixels.format();
        let (fx, fy) = float.offset;
        let src_view = SourceView::of(float.pixels(), fx, fy);
        let mask_view = float
            .mask()
            .filter(|m| m.apply)
            .map(|m| SourceView::of(m.pixels(), fx, fy));
        let kind = SourceKind::from(float.format());
        let opacity = float.clamped_opacity();

        for y in float_area.y..float_area.bottom() {
            for x in float_area.x..float_area.right() {
                let px = pixels.pixel_mut((x - area.x) as u32, (y - area.y) as u32);
                let base = expand(target_format, px, &stack.colormap, false);
                let mut work = [base.color[0], base.color[1], base.color[2], base.alpha];
                let coverage = opacity * mask_view.map_or(1.0, |m| u8_to_unit(m.at(x, y)[0]));
                let stroke = Stroke {
                    kind,
                    mode: float.mode,
                    src: expand(float.format(), src_view.at(x, y), &stack.colormap, false),
                    coverage,
                };
                combine(&mut work, stroke, x, y);
                let out = Expanded {
                    color: [work[0], work[1], work[2]],
                    alpha: work[3],
                };
                encode(target_format, px, out, &stack.colormap, &mut self.nearest);
            }
        }

        Ok(Some(FloatingPatch {
            target: fs.target,
            origin: (area.x, area.y),
            pixels,
        }))
    }

    fn gray_projection(&self) -> bool {
        self.stack.component_count() == 1
    }

    fn save_inactive(&self, dst: &RegionMut<'_>) -> TesseraResult<Option<Vec<u8>>> {
        let n = self.stack.component_count();
        if self.stack.active[..n].iter().all(|&on| on) {
            return Ok(None);
        }
        let mut saved = try_alloc_zeroed(dst.as_bytes().len(), "inactive component snapshot")?;
        saved.copy_from_slice(dst.as_bytes());
        Ok(Some(saved))
    }

    fn restore_inactive(&self, dst: &mut RegionMut<'_>, saved: &[u8]) {
        let bpp = dst.bpp();
        let n = self.stack.component_count();
        let active = self.stack.active;
        for (px, old) in dst
            .as_bytes_mut()
            .chunks_exact_mut(bpp)
            .zip(saved.chunks_exact(bpp))
        {
            for c in (0..n).filter(|&c| !active[c]) {
                px[c] = old[c];
            }
        }
    }
}

/// Splits `rect` along the tile grid.
fn tile_cells(rect: Rect) -> impl Iterator<Item = Rect> {
    let step = TILE_SIZE as usize;
    let t = TILE_SIZE as i32;
    let (x0, y0) = (rect.x.div_euclid(t) * t, rect.y.div_euclid(t) * t);
    (y0..rect.bottom()).step_by(step).flat_map(move |y| {
        (x0..rect.right())
            .step_by(step)
            .filter_map(move |x| Rect::new(x, y, TILE_SIZE, TILE_SIZE).intersect(rect))
    })
}

impl TileProducer for Construct<'_> {
    fn produce(&mut self, _tile_bounds: Rect, dst: &mut RegionMut<'_>) -> TesseraResult<()> {
        self.run(dst)
    }
}

#[cfg(test)]
#[path = "../../tests/unit/projection/construct.rs"]
mod tests;
