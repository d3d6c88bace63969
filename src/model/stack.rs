use crate::foundation::core::{Rect, Size};
use crate::model::{
    channel::{Channel, ChannelId},
    colormap::Colormap,
    floating::FloatingSelection,
    layer::{Layer, LayerId},
    pixel::{ColorModel, PixelFormat},
};

/// Everything Construct reads: the canvas minus its projection.
#[derive(Clone, Debug)]
pub(crate) struct Stack {
    pub(crate) size: Size,
    pub(crate) color_model: ColorModel,
    pub(crate) colormap: Colormap,
    /// Bottom to top.
    pub(crate) layers: Vec<Layer>,
    /// Bottom to top.
    pub(crate) channels: Vec<Channel>,
    pub(crate) floating: Option<FloatingSelection>,
    /// Visible color components (gray uses index 0). Alpha is always written.
    pub(crate) active: [bool; 3],
}

impl Stack {
    pub(crate) fn new(size: Size, color_model: ColorModel) -> Self {
        Self {
            size,
            color_model,
            colormap: Colormap::default(),
            layers: Vec::new(),
            channels: Vec::new(),
            floating: None,
            active: [true; 3],
        }
    }

    pub(crate) fn bounds(&self) -> Rect {
        self.size.bounds()
    }

    pub(crate) fn projection_format(&self) -> PixelFormat {
        self.color_model.projection_format()
    }

    pub(crate) fn component_count(&self) -> usize {
        self.projection_format().color_bytes()
    }

    pub(crate) fn layer_index(&self, id: LayerId) -> Option<usize> {
        self.layers.iter().position(|l| l.id == id)
    }

    pub(crate) fn layer(&self, id: LayerId) -> Option<&Layer> {
        self.layers.iter().find(|l| l.id == id)
    }

    pub(crate) fn channel_index(&self, id: ChannelId) -> Option<usize> {
        self.channels.iter().position(|c| c.id == id)
    }

    pub(crate) fn channel(&self, id: ChannelId) -> Option<&Channel> {
        self.channels.iter().find(|c| c.id == id)
    }
}
