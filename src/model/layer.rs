use crate::composite::blend::BlendMode;
use crate::foundation::{
    core::Rect,
    error::{TesseraError, TesseraResult},
};
use crate::model::pixel::{PixelBuffer, PixelFormat};

/// Stable identifier handed out by the canvas when a layer is added.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct LayerId(pub(crate) u32);

impl LayerId {
    pub fn get(self) -> u32 {
        self.0
    }
}

/// Grayscale coverage buffer with the same geometry as its layer.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LayerMask {
    pixels: PixelBuffer,
    /// Scale the layer's coverage by the mask value.
    pub apply: bool,
    /// Render the mask itself instead of the layer's colors.
    pub show: bool,
}

impl LayerMask {
    pub fn new(pixels: PixelBuffer) -> TesseraResult<Self> {
        if pixels.format() != PixelFormat::Gray {
            return Err(TesseraError::validation(format!(
                "layer mask must be gray, got {:?}",
                pixels.format()
            )));
        }
        Ok(Self {
            pixels,
            apply: true,
            show: false,
        })
    }

    pub fn pixels(&self) -> &PixelBuffer {
        &self.pixels
    }

    /// Mutable mask values; geometry is fixed.
    pub fn values_mut(&mut self) -> &mut [u8] {
        self.pixels.data_mut()
    }
}

#[derive(Clone, Debug)]
pub struct Layer {
    pub(crate) id: LayerId,
    pub name: String,
    /// Canvas position of the layer's top-left pixel.
    pub offset: (i32, i32),
    pub visible: bool,
    pub opacity: f32,
    pub mode: BlendMode,
    pixels: PixelBuffer,
    mask: Option<LayerMask>,
}

impl Layer {
    pub fn new(name: impl Into<String>, pixels: PixelBuffer) -> Self {
        Self {
            id: LayerId(0),
            name: name.into(),
            offset: (0, 0),
            visible: true,
            opacity: 1.0,
            mode: BlendMode::Normal,
            pixels,
            mask: None,
        }
    }

    pub fn with_offset(mut self, x: i32, y: i32) -> Self {
        self.offset = (x, y);
        self
    }

    pub fn with_opacity(mut self, opacity: f32) -> Self {
        self.opacity = opacity;
        self
    }

    pub fn with_mode(mut self, mode: BlendMode) -> Self {
        self.mode = mode;
        self
    }

    pub fn id(&self) -> LayerId {
        self.id
    }

    pub fn format(&self) -> PixelFormat {
        self.pixels.format()
    }

    pub fn has_alpha(&self) -> bool {
        self.format().has_alpha()
    }

    /// Canvas-space rectangle occupied by the layer.
    pub fn bounds(&self) -> Rect {
        Rect::new(
            self.offset.0,
            self.offset.1,
            self.pixels.width(),
            self.pixels.height(),
        )
    }

    pub fn pixels(&self) -> &PixelBuffer {
        &self.pixels
    }

    pub fn pixels_mut(&mut self) -> &mut PixelBuffer {
        &mut self.pixels
    }

    /// Replace the pixels; an existing mask must still match the new geometry.
    pub fn set_pixels(&mut self, pixels: PixelBuffer) -> TesseraResult<()> {
        if let Some(mask) = &self.mask
            && mask.pixels.size() != pixels.size()
        {
            return Err(TesseraError::validation(
                "new layer pixels do not match the existing mask geometry",
            ));
        }
        self.pixels = pixels;
        Ok(())
    }

    pub fn mask(&self) -> Option<&LayerMask> {
        self.mask.as_ref()
    }

    pub fn mask_mut(&mut self) -> Option<&mut LayerMask> {
        self.mask.as_mut()
    }

    pub fn set_mask(&mut self, mask: LayerMask) -> TesseraResult<()> {
        if mask.pixels.size() != self.pixels.size() {
            return Err(TesseraError::validation(format!(
                "mask {}x{} does not match layer {}x{}",
                mask.pixels.width(),
                mask.pixels.height(),
                self.pixels.width(),
                self.pixels.height()
            )));
        }
        self.mask = Some(mask);
        Ok(())
    }

    pub fn take_mask(&mut self) -> Option<LayerMask> {
        self.mask.take()
    }

    /// Effective opacity clamped to `[0, 1]`.
    pub(crate) fn clamped_opacity(&self) -> f32 {
        self.opacity.clamp(0.0, 1.0)
    }

    /// Whether this layer alone paints `rect` fully opaque, so the area needs no clearing.
    pub(crate) fn covers_opaquely(&self, rect: Rect) -> bool {
        self.visible
            && !self.has_alpha()
            && self.clamped_opacity() >= 1.0
            && self.mode == BlendMode::Normal
            && self.mask.as_ref().is_none_or(|m| !m.apply && !m.show)
            && self.bounds().contains_rect(rect)
    }
}

#[cfg(test)]
#[path = "../../tests/unit/model/layer.rs"]
mod tests;
