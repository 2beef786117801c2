//! The opaque store the widget talks to. Folder contents, thumbnail pixels
//! and uploaded files all live behind this trait; the UI only ever sees
//! request/response pairs delivered through the [`crate::service`] workers.

use crate::item::{ItemId, ItemKind};
use crate::thumbnails::ThumbWork;
use image::RgbaImage;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),
    #[error("image error: {0}")]
    Image(#[from] image::ImageError),
    #[error("not a folder: {0}")]
    NotAFolder(PathBuf),
}

/// One row of a folder listing as the store reports it. The coordinator
/// turns entries into rendered items and assigns their ids.
#[derive(Clone, Debug)]
pub struct FolderEntry {
    pub name: String,
    pub path: PathBuf,
    pub kind: ItemKind,
    pub size: u64,
    /// Unix seconds.
    pub modified: i64,
}

/// One successfully rendered thumbnail, keyed back to its placeholder.
pub struct GeneratedThumb {
    pub id: ItemId,
    pub image: RgbaImage,
}

pub trait MediaStore: Send + Sync {
    /// List a folder. `clear_cache` asks the store to drop whatever derived
    /// state it keeps for the path first (the refresh command sets it).
    fn list_folder(&self, path: &Path, clear_cache: bool) -> Result<Vec<FolderEntry>, StoreError>;

    /// Render thumbnails for a batch of work items. Items that fail are
    /// silently absent from the result; `Err` means the whole batch failed
    /// in transport and produced nothing.
    fn generate_thumbnails(&self, batch: &[ThumbWork]) -> Result<Vec<GeneratedThumb>, StoreError>;

    /// Render a single larger preview image for the sidebar.
    fn preview_image(
        &self,
        path: &Path,
        last_modified: i64,
        max_edge: u32,
    ) -> Result<RgbaImage, StoreError>;

    /// Store the file at `source` under `folder/name`, reporting cumulative
    /// bytes written through `on_progress`. Returns the byte count.
    fn store_file(
        &self,
        folder: &Path,
        name: &str,
        source: &Path,
        on_progress: &mut dyn FnMut(u64),
    ) -> Result<u64, StoreError>;
}
