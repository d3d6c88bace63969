pub(crate) mod construct;
pub(crate) mod invalidate;
pub(crate) mod progress;
pub(crate) mod view;
