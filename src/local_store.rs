//! Filesystem-backed [`MediaStore`]. Listing goes through `read_dir`,
//! thumbnails are decoded and scaled on demand with a bounded cache keyed by
//! `(path, last_modified)`, uploads are chunked copies into the target
//! folder.

use crate::item::ItemKind;
use crate::store::{FolderEntry, GeneratedThumb, MediaStore, StoreError};
use crate::thumbnails::ThumbWork;
use cached::{Cached, SizedCache};
use image::io::Reader as ImageReader;
use image::RgbaImage;
use log::warn;
use std::fs;
use std::io::{Read, Write};
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use std::time::UNIX_EPOCH;

const THUMB_CACHE_SIZE: usize = 256;
const UPLOAD_CHUNK: usize = 64 * 1024;

type ThumbCache = SizedCache<(PathBuf, i64), RgbaImage>;

pub struct LocalStore {
    thumb_cache: Mutex<ThumbCache>,
}

impl LocalStore {
    pub fn new() -> Self {
        Self {
            thumb_cache: Mutex::new(SizedCache::with_size(THUMB_CACHE_SIZE)),
        }
    }

    fn cache(&self) -> std::sync::MutexGuard<'_, ThumbCache> {
        self.thumb_cache
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn render_scaled(path: &Path, max_w: u32, max_h: u32) -> Result<RgbaImage, StoreError> {
        let image = ImageReader::open(path)?.decode()?.to_rgba8();
        Ok(scale_to_fit(&image, max_w, max_h))
    }
}

impl Default for LocalStore {
    fn default() -> Self {
        Self::new()
    }
}

/// Shrink to fit inside `max_w` x `max_h`, keeping aspect ratio and never
/// upscaling.
fn scale_to_fit(image: &RgbaImage, max_w: u32, max_h: u32) -> RgbaImage {
    let (w, h) = image.dimensions();
    let ws = max_w as f32 / w as f32;
    let hs = max_h as f32 / h as f32;
    let s = ws.min(hs);
    if s >= 1.0 {
        return image.clone();
    }

    let w = ((w as f32 * s).floor() as u32).max(1);
    let h = ((h as f32 * s).floor() as u32).max(1);

    image::imageops::thumbnail(image, w, h)
}

fn modified_unix_seconds(meta: &fs::Metadata) -> i64 {
    meta.modified()
        .ok()
        .and_then(|t| t.duration_since(UNIX_EPOCH).ok())
        .map(|d| d.as_secs() as i64)
        .unwrap_or(0)
}

impl MediaStore for LocalStore {
    fn list_folder(&self, path: &Path, clear_cache: bool) -> Result<Vec<FolderEntry>, StoreError> {
        if clear_cache {
            *self.cache() = SizedCache::with_size(THUMB_CACHE_SIZE);
        }
        if !path.is_dir() {
            return Err(StoreError::NotAFolder(path.to_path_buf()));
        }

        let mut entries = Vec::new();
        for entry in fs::read_dir(path)? {
            let entry = entry?;
            let name = entry.file_name().to_string_lossy().to_string();
            if name.starts_with('.') {
                continue;
            }
            let file_type = entry.file_type()?;
            let meta = entry.metadata()?;
            let kind = if file_type.is_dir() {
                ItemKind::Folder
            } else {
                ItemKind::classify(&entry.path())
            };
            entries.push(FolderEntry {
                name,
                path: entry.path(),
                kind,
                size: if file_type.is_dir() { 0 } else { meta.len() },
                modified: modified_unix_seconds(&meta),
            });
        }

        // folders first, then case-insensitive by name
        entries.sort_by(|a, b| {
            let a_dir = a.kind == ItemKind::Folder;
            let b_dir = b.kind == ItemKind::Folder;
            b_dir
                .cmp(&a_dir)
                .then_with(|| a.name.to_lowercase().cmp(&b.name.to_lowercase()))
        });
        Ok(entries)
    }

    fn generate_thumbnails(&self, batch: &[ThumbWork]) -> Result<Vec<GeneratedThumb>, StoreError> {
        let mut results = Vec::with_capacity(batch.len());
        for work in batch {
            let key = (work.path.clone(), work.last_modified);
            if let Some(image) = self.cache().cache_get(&key).cloned() {
                results.push(GeneratedThumb { id: work.id, image });
                continue;
            }
            match Self::render_scaled(&work.path, work.width.max(1), work.height.max(1)) {
                Ok(image) => {
                    self.cache().cache_set(key, image.clone());
                    results.push(GeneratedThumb { id: work.id, image });
                }
                Err(err) => {
                    // this work item simply produces no thumbnail
                    warn!("thumbnail for {:?} failed: {}", work.path, err);
                }
            }
        }
        Ok(results)
    }

    fn preview_image(
        &self,
        path: &Path,
        _last_modified: i64,
        max_edge: u32,
    ) -> Result<RgbaImage, StoreError> {
        // last_modified is a cache-buster for remote stores; the local
        // render always reads the current file
        Self::render_scaled(path, max_edge.max(1), max_edge.max(1))
    }

    fn store_file(
        &self,
        folder: &Path,
        name: &str,
        source: &Path,
        on_progress: &mut dyn FnMut(u64),
    ) -> Result<u64, StoreError> {
        let mut reader = fs::File::open(source)?;
        let mut writer = fs::File::create(folder.join(name))?;
        let mut buf = vec![0u8; UPLOAD_CHUNK];
        let mut written: u64 = 0;
        loop {
            let n = reader.read(&mut buf)?;
            if n == 0 {
                break;
            }
            writer.write_all(&buf[..n])?;
            written += n as u64;
            on_progress(written);
        }
        Ok(written)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn work(id: u64, path: PathBuf, last_modified: i64) -> ThumbWork {
        ThumbWork {
            id,
            width: 16,
            height: 16,
            path,
            last_modified,
        }
    }

    fn write_png(path: &Path, w: u32, h: u32) {
        RgbaImage::new(w, h).save(path).expect("write test png");
    }

    #[test]
    fn listing_sorts_folders_first_and_skips_hidden() {
        let dir = tempfile::tempdir().expect("tempdir");
        fs::create_dir(dir.path().join("zeta")).unwrap();
        fs::write(dir.path().join("alpha.txt"), b"x").unwrap();
        fs::write(dir.path().join(".hidden"), b"x").unwrap();

        let store = LocalStore::new();
        let entries = store.list_folder(dir.path(), false).expect("listing");
        let names: Vec<&str> = entries.iter().map(|e| e.name.as_str()).collect();
        assert_eq!(names, vec!["zeta", "alpha.txt"]);
        assert_eq!(entries[0].kind, ItemKind::Folder);
    }

    #[test]
    fn listing_a_file_is_an_error() {
        let dir = tempfile::tempdir().expect("tempdir");
        let file = dir.path().join("a.txt");
        fs::write(&file, b"x").unwrap();
        let store = LocalStore::new();
        assert!(matches!(
            store.list_folder(&file, false),
            Err(StoreError::NotAFolder(_))
        ));
    }

    #[test]
    fn undecodable_items_are_silently_skipped() {
        let dir = tempfile::tempdir().expect("tempdir");
        let good = dir.path().join("good.png");
        let bad = dir.path().join("bad.png");
        write_png(&good, 64, 32);
        fs::write(&bad, b"this is not a png").unwrap();

        let store = LocalStore::new();
        let batch = [work(1, good, 0), work(2, bad, 0)];
        let results = store.generate_thumbnails(&batch).expect("batch");
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].id, 1);
        // scaled to fit 16x16, aspect preserved
        assert!(results[0].image.width() <= 16 && results[0].image.height() <= 16);
    }

    #[test]
    fn thumbnails_are_cached_until_the_cache_is_cleared() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("pic.png");
        write_png(&path, 32, 32);

        let store = LocalStore::new();
        let batch = [work(1, path.clone(), 42)];
        assert_eq!(store.generate_thumbnails(&batch).unwrap().len(), 1);

        // the source is gone, but the cached render still answers
        fs::remove_file(&path).unwrap();
        assert_eq!(store.generate_thumbnails(&batch).unwrap().len(), 1);

        // refresh clears the cache; now the miss falls through and fails
        store.list_folder(dir.path(), true).unwrap();
        assert_eq!(store.generate_thumbnails(&batch).unwrap().len(), 0);
    }

    #[test]
    fn store_file_reports_monotonic_progress() {
        let dir = tempfile::tempdir().expect("tempdir");
        let source = dir.path().join("source.bin");
        let payload = vec![7u8; UPLOAD_CHUNK * 2 + 123];
        fs::write(&source, &payload).unwrap();

        let store = LocalStore::new();
        let mut reports = Vec::new();
        let written = store
            .store_file(dir.path(), "dest.bin", &source, &mut |sent| {
                reports.push(sent)
            })
            .expect("upload");

        assert_eq!(written, payload.len() as u64);
        assert!(reports.windows(2).all(|w| w[0] < w[1]));
        assert_eq!(*reports.last().unwrap(), payload.len() as u64);
        assert_eq!(
            fs::read(dir.path().join("dest.bin")).unwrap().len(),
            payload.len()
        );
    }
}
