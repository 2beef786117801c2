mod item_row;
mod item_tile;
mod preview_panel;

pub use item_row::ItemRow;
pub use item_tile::{ItemTile, TILE_SIZE};
pub use preview_panel::PreviewPanel;
