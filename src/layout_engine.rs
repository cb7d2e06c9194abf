pub mod tile;

pub use tile::{Placement, TileError, TileItem, TileResult, tile};
