use crate::foundation::{
    core::Rgba8,
    error::{TesseraError, TesseraResult},
};
use crate::model::pixel::{PixelBuffer, PixelFormat};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ChannelId(pub(crate) u32);

impl ChannelId {
    pub fn get(self) -> u32 {
        self.0
    }
}

/// Canvas-sized selection mask rendered as a tinted overlay.
#[derive(Clone, Debug)]
pub struct Channel {
    pub(crate) id: ChannelId,
    pub name: String,
    pub visible: bool,
    pub opacity: f32,
    /// Overlay color; its alpha scales the overlay strength.
    pub tint: Rgba8,
    /// Tint the unselected (zero) area instead of the selected one.
    pub show_masked: bool,
    pixels: PixelBuffer,
}

impl Channel {
    pub fn new(name: impl Into<String>, pixels: PixelBuffer) -> TesseraResult<Self> {
        if pixels.format() != PixelFormat::Gray {
            return Err(TesseraError::validation(format!(
                "channel must be gray, got {:?}",
                pixels.format()
            )));
        }
        Ok(Self {
            id: ChannelId(0),
            name: name.into(),
            visible: true,
            opacity: 0.5,
            tint: Rgba8::opaque(0, 0, 0),
            show_masked: false,
            pixels,
        })
    }

    pub fn with_tint(mut self, tint: Rgba8) -> Self {
        self.tint = tint;
        self
    }

    pub fn with_opacity(mut self, opacity: f32) -> Self {
        self.opacity = opacity;
        self
    }

    pub fn id(&self) -> ChannelId {
        self.id
    }

    pub fn pixels(&self) -> &PixelBuffer {
        &self.pixels
    }

    pub fn values_mut(&mut self) -> &mut [u8] {
        self.pixels.data_mut()
    }

    pub(crate) fn set_pixels(&mut self, pixels: PixelBuffer) {
        self.pixels = pixels;
    }

    /// Overlay strength for a mask value, in `[0, 1]`.
    pub(crate) fn coverage(&self, value: u8) -> f32 {
        let v = f32::from(value) / 255.0;
        let v = if self.show_masked { 1.0 - v } else { v };
        self.opacity.clamp(0.0, 1.0) * (f32::from(self.tint.a) / 255.0) * v
    }
}

#[cfg(test)]
#[path = "../../tests/unit/model/channel.rs"]
mod tests;
