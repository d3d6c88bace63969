use crate::model::{channel::ChannelId, layer::Layer, layer::LayerId};

/// Drawable a floating selection is attached to.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum DrawableRef {
    Layer(LayerId),
    LayerMask(LayerId),
    Channel(ChannelId),
}

/// Transient pasted pixels rendered directly onto their target drawable.
///
/// It never occupies a slot in the layer stack: every construct pass composites it into a
/// copy of the target's pixels, and the target itself is left untouched.
#[derive(Clone, Debug)]
pub struct FloatingSelection {
    pub layer: Layer,
    pub target: DrawableRef,
}

impl FloatingSelection {
    pub fn new(layer: Layer, target: DrawableRef) -> Self {
        Self { layer, target }
    }
}
