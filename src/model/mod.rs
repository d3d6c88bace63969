pub(crate) mod canvas;
pub(crate) mod channel;
pub(crate) mod colormap;
pub(crate) mod floating;
pub(crate) mod layer;
pub(crate) mod pixel;
pub(crate) mod stack;
