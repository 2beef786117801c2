use crate::store::FolderEntry;
use crate::utils::make_color_image;
use eframe::egui::{vec2, Context, TextureHandle, Vec2};
use image::RgbaImage;
use std::path::{Path, PathBuf};

/// Identifier of a rendered item. Ids are allocated monotonically for the
/// lifetime of the process and never reused across navigations, so a
/// completion that refers to a replaced listing simply matches nothing.
pub type ItemId = u64;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ItemKind {
    Folder,
    Image,
    Audio,
    Video,
    Other,
}

impl ItemKind {
    pub fn classify(path: &Path) -> Self {
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_ascii_lowercase())
            .unwrap_or_default();
        match ext.as_str() {
            "png" | "jpg" | "jpeg" | "gif" | "bmp" | "tiff" | "webp" | "ico" => ItemKind::Image,
            "mp3" | "wav" | "flac" | "ogg" | "aac" | "m4a" => ItemKind::Audio,
            "mp4" | "mkv" | "webm" | "avi" | "mov" => ItemKind::Video,
            _ => ItemKind::Other,
        }
    }

    /// Short glyph painted where no thumbnail applies.
    pub fn glyph(&self) -> &'static str {
        match self {
            ItemKind::Folder => "DIR",
            ItemKind::Image => "IMG",
            ItemKind::Audio => "AUD",
            ItemKind::Video => "VID",
            ItemKind::Other => "DOC",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            ItemKind::Folder => "folder",
            ItemKind::Image => "image",
            ItemKind::Audio => "audio",
            ItemKind::Video => "video",
            ItemKind::Other => "document",
        }
    }
}

/// An uploaded texture plus its logical pixel size.
pub struct ThumbImage {
    texture: TextureHandle,
    width: f32,
    height: f32,
}

impl ThumbImage {
    pub fn upload(ctx: &Context, name: String, image: &RgbaImage) -> Self {
        let texture = ctx.load_texture(name, make_color_image(image));
        Self {
            texture,
            width: image.width() as _,
            height: image.height() as _,
        }
    }

    pub fn texture(&self) -> &TextureHandle {
        &self.texture
    }

    pub fn size(&self) -> Vec2 {
        vec2(self.width, self.height)
    }
}

/// Placeholder lifecycle. A failed batch leaves its placeholders in
/// `Loading`; refresh is the only retry path.
pub enum ThumbState {
    None,
    Loading,
    Ready(ThumbImage),
}

pub struct MediaItem {
    pub id: ItemId,
    pub name: String,
    pub path: PathBuf,
    pub kind: ItemKind,
    pub size: u64,
    pub last_modified: i64,
    /// False only for the parent-directory anchor row, which is excluded
    /// from click-select and drag-collision.
    pub selectable: bool,
    pub thumb: ThumbState,
}

impl MediaItem {
    pub fn from_entry(id: ItemId, entry: FolderEntry) -> Self {
        Self {
            id,
            name: entry.name,
            path: entry.path,
            kind: entry.kind,
            size: entry.size,
            last_modified: entry.modified,
            selectable: true,
            thumb: ThumbState::None,
        }
    }

    /// The ".." row navigating to the parent folder.
    pub fn parent_anchor(id: ItemId, parent: PathBuf) -> Self {
        Self {
            id,
            name: "..".to_string(),
            path: parent,
            kind: ItemKind::Folder,
            size: 0,
            last_modified: 0,
            selectable: false,
            thumb: ThumbState::None,
        }
    }

    pub fn wants_thumbnail(&self) -> bool {
        self.selectable && self.kind == ItemKind::Image
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classify_by_extension() {
        assert_eq!(ItemKind::classify(Path::new("a/photo.JPG")), ItemKind::Image);
        assert_eq!(ItemKind::classify(Path::new("song.flac")), ItemKind::Audio);
        assert_eq!(ItemKind::classify(Path::new("clip.mkv")), ItemKind::Video);
        assert_eq!(ItemKind::classify(Path::new("notes.txt")), ItemKind::Other);
        assert_eq!(ItemKind::classify(Path::new("noext")), ItemKind::Other);
    }

    #[test]
    fn anchor_row_is_not_selectable_and_wants_no_thumbnail() {
        let anchor = MediaItem::parent_anchor(7, PathBuf::from("/tmp"));
        assert!(!anchor.selectable);
        assert!(!anchor.wants_thumbnail());
        assert_eq!(anchor.name, "..");
    }
}
