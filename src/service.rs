//! Runs [`MediaStore`] requests on worker thread pools and delivers their
//! completions back to the UI thread over a channel, waking the event loop
//! through a repaint notifier. All queue and selection state stays on the UI
//! thread; the workers only ever see one request at a time.

use crate::store::{FolderEntry, GeneratedThumb, MediaStore, StoreError};
use crate::thumbnails::ThumbBatch;
use crate::upload::UploadEvent;
use crossbeam::channel::{unbounded, Receiver, Sender};
use image::RgbaImage;
use log::{debug, error, warn};
use rayon::{ThreadPool, ThreadPoolBuilder};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

pub enum StoreEvent {
    FolderListed {
        path: PathBuf,
        result: Result<Vec<FolderEntry>, StoreError>,
    },
    /// Always delivered exactly once per dispatched batch; a transport
    /// failure arrives as an empty result set.
    ThumbnailBatchDone { results: Vec<GeneratedThumb> },
    /// Stamped with the request generation; stale results are dropped by
    /// the coordinator.
    PreviewReady { generation: u64, image: RgbaImage },
    Upload(UploadEvent),
}

type Notifier = Arc<dyn Fn() + Send + Sync>;

pub struct StoreService {
    pub receiver: Receiver<StoreEvent>,
    sender: Sender<StoreEvent>,
    store: Arc<dyn MediaStore>,
    thumb_pool: ThreadPool,
    io_pool: ThreadPool,
    notifier: Notifier,
}

fn build_pool(threads: usize) -> std::io::Result<ThreadPool> {
    ThreadPoolBuilder::new()
        .num_threads(threads)
        .build()
        .map_err(|e| std::io::Error::new(std::io::ErrorKind::Other, e))
}

impl StoreService {
    pub fn start<F>(store: Arc<dyn MediaStore>, notifier: F) -> std::io::Result<Self>
    where
        F: Fn() + Send + Sync + 'static,
    {
        let (sender, receiver) = unbounded();
        Ok(Self {
            receiver,
            sender,
            store,
            thumb_pool: build_pool(num_cpus::get().min(4))?,
            io_pool: build_pool(num_cpus::get().min(2))?,
            notifier: Arc::new(notifier),
        })
    }

    fn outbox(&self) -> Outbox {
        Outbox {
            sender: self.sender.clone(),
            notifier: Arc::clone(&self.notifier),
        }
    }

    pub fn list_folder(&self, path: PathBuf, clear_cache: bool) {
        let store = Arc::clone(&self.store);
        let out = self.outbox();
        self.io_pool.spawn(move || {
            let result = store.list_folder(&path, clear_cache);
            out.send(StoreEvent::FolderListed { path, result });
        });
    }

    pub fn generate_thumbnails(&self, batch: ThumbBatch) {
        let store = Arc::clone(&self.store);
        let out = self.outbox();
        self.thumb_pool.spawn(move || {
            let results = match store.generate_thumbnails(&batch) {
                Ok(results) => results,
                Err(err) => {
                    // the batch still settles, with nothing produced
                    warn!("thumbnail batch of {} items failed: {}", batch.len(), err);
                    Vec::new()
                }
            };
            out.send(StoreEvent::ThumbnailBatchDone { results });
        });
    }

    pub fn fetch_preview(&self, generation: u64, path: PathBuf, last_modified: i64, max_edge: u32) {
        let store = Arc::clone(&self.store);
        let out = self.outbox();
        self.io_pool.spawn(move || {
            match store.preview_image(&path, last_modified, max_edge) {
                Ok(image) => out.send(StoreEvent::PreviewReady { generation, image }),
                // a superseding request is the only recovery path
                Err(err) => debug!("preview for {:?} failed: {}", path, err),
            }
        });
    }

    pub fn upload(&self, folder: PathBuf, files: Vec<PathBuf>) {
        let store = Arc::clone(&self.store);
        let out = self.outbox();
        self.io_pool
            .spawn(move || run_upload(&*store, &folder, &files, &out));
    }
}

struct Outbox {
    sender: Sender<StoreEvent>,
    notifier: Notifier,
}

impl Outbox {
    fn send(&self, event: StoreEvent) {
        match self.sender.send(event) {
            Ok(()) => (self.notifier)(),
            Err(err) => error!("can't deliver store event to the ui thread: {}", err),
        }
    }
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_else(|| "file".to_string())
}

/// Sequential upload queue: announce every file, then copy them one by one,
/// reporting combined progress. A failed file is reported and skipped; the
/// rest of the queue keeps going.
fn run_upload(store: &dyn MediaStore, folder: &Path, files: &[PathBuf], out: &Outbox) {
    let mut sizes = Vec::with_capacity(files.len());
    let mut total: u64 = 0;
    for file in files {
        let size = fs::metadata(file).map(|m| m.len()).unwrap_or(0);
        total += size;
        sizes.push(size);
        out.send(StoreEvent::Upload(UploadEvent::FileAdded {
            name: file_name(file),
        }));
    }

    let mut sent_before: u64 = 0;
    for (file, size) in files.iter().zip(sizes) {
        let name = file_name(file);
        out.send(StoreEvent::Upload(UploadEvent::Sending { name: name.clone() }));
        let result = store.store_file(folder, &name, file, &mut |written| {
            let sent = sent_before + written;
            let percent = if total == 0 {
                100.0
            } else {
                sent as f32 * 100.0 / total as f32
            };
            out.send(StoreEvent::Upload(UploadEvent::Progress {
                percent,
                total_bytes: total,
                sent_bytes: sent,
            }));
        });
        match result {
            Ok(written) => sent_before += written,
            Err(err) => {
                out.send(StoreEvent::Upload(UploadEvent::FileFailed {
                    name,
                    message: err.to_string(),
                }));
                sent_before += size;
            }
        }
    }
    out.send(StoreEvent::Upload(UploadEvent::QueueComplete));
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::local_store::LocalStore;
    use crate::thumbnails::ThumbWork;
    use std::time::Duration;

    struct FailingStore;

    impl MediaStore for FailingStore {
        fn list_folder(
            &self,
            path: &Path,
            _clear_cache: bool,
        ) -> Result<Vec<FolderEntry>, StoreError> {
            Err(StoreError::NotAFolder(path.to_path_buf()))
        }

        fn generate_thumbnails(
            &self,
            _batch: &[ThumbWork],
        ) -> Result<Vec<GeneratedThumb>, StoreError> {
            Err(StoreError::Io(std::io::Error::new(
                std::io::ErrorKind::Other,
                "transport down",
            )))
        }

        fn preview_image(
            &self,
            _path: &Path,
            _last_modified: i64,
            _max_edge: u32,
        ) -> Result<RgbaImage, StoreError> {
            Err(StoreError::Io(std::io::Error::new(
                std::io::ErrorKind::Other,
                "transport down",
            )))
        }

        fn store_file(
            &self,
            _folder: &Path,
            _name: &str,
            _source: &Path,
            _on_progress: &mut dyn FnMut(u64),
        ) -> Result<u64, StoreError> {
            Err(StoreError::Io(std::io::Error::new(
                std::io::ErrorKind::Other,
                "transport down",
            )))
        }
    }

    fn recv(service: &StoreService) -> StoreEvent {
        service
            .receiver
            .recv_timeout(Duration::from_secs(5))
            .expect("store event")
    }

    #[test]
    fn a_failed_batch_still_settles_with_empty_results() {
        let service = StoreService::start(Arc::new(FailingStore), || {}).expect("service");
        let mut batch = ThumbBatch::new();
        batch.push(ThumbWork {
            id: 1,
            width: 16,
            height: 16,
            path: PathBuf::from("nowhere.png"),
            last_modified: 0,
        });
        service.generate_thumbnails(batch);
        match recv(&service) {
            StoreEvent::ThumbnailBatchDone { results } => assert!(results.is_empty()),
            _ => panic!("expected a batch completion"),
        }
    }

    #[test]
    fn upload_queue_reports_lifecycle_and_survives_a_missing_file() {
        let dir = tempfile::tempdir().expect("tempdir");
        let good = dir.path().join("good.bin");
        fs::write(&good, vec![1u8; 1000]).unwrap();
        let missing = dir.path().join("missing.bin");

        let service = StoreService::start(Arc::new(LocalStore::new()), || {}).expect("service");
        service.upload(dir.path().to_path_buf(), vec![good, missing]);

        let mut added = 0;
        let mut failed = 0;
        let mut progressed = false;
        loop {
            match recv(&service) {
                StoreEvent::Upload(UploadEvent::FileAdded { .. }) => added += 1,
                StoreEvent::Upload(UploadEvent::FileFailed { name, .. }) => {
                    failed += 1;
                    assert_eq!(name, "missing.bin");
                }
                StoreEvent::Upload(UploadEvent::Progress { sent_bytes, .. }) => {
                    progressed = true;
                    assert!(sent_bytes <= 1000);
                }
                StoreEvent::Upload(UploadEvent::QueueComplete) => break,
                StoreEvent::Upload(UploadEvent::Sending { .. }) => {}
                _ => panic!("unexpected event during upload"),
            }
        }
        assert_eq!(added, 2);
        assert_eq!(failed, 1);
        assert!(progressed);
        assert!(dir.path().join("good.bin").exists());
    }
}
