pub(crate) mod store;
pub(crate) mod swap;
pub(crate) mod tile;
