//! Upload transport events and the display-state fold.
//!
//! The transport (the upload worker in [`crate::service`]) emits lifecycle
//! events; `UploadProgress` folds them into what the status bar shows. The
//! displayed percentage is held at 99 until the queue-complete event
//! arrives, so the user never sees "100%" before the store confirmed every
//! file.

#[derive(Clone, Debug)]
pub enum UploadEvent {
    FileAdded { name: String },
    Sending { name: String },
    Progress { percent: f32, total_bytes: u64, sent_bytes: u64 },
    FileFailed { name: String, message: String },
    QueueComplete,
}

#[derive(Default)]
pub struct UploadProgress {
    active: bool,
    complete: bool,
    files_total: usize,
    percent: f32,
    sent_bytes: u64,
    total_bytes: u64,
    current: Option<String>,
    failures: Vec<String>,
}

impl UploadProgress {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn observe(&mut self, event: &UploadEvent) {
        match event {
            UploadEvent::FileAdded { .. } => {
                if self.complete {
                    // a fresh queue after a finished one starts over
                    *self = Self::default();
                }
                self.active = true;
                self.files_total += 1;
            }
            UploadEvent::Sending { name } => {
                self.current = Some(name.clone());
            }
            UploadEvent::Progress {
                percent,
                total_bytes,
                sent_bytes,
            } => {
                self.percent = *percent;
                self.total_bytes = *total_bytes;
                self.sent_bytes = *sent_bytes;
            }
            UploadEvent::FileFailed { name, message } => {
                self.failures.push(format!("{}: {}", name, message));
            }
            UploadEvent::QueueComplete => {
                self.complete = true;
                self.current = None;
            }
        }
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    pub fn is_complete(&self) -> bool {
        self.complete
    }

    pub fn files_total(&self) -> usize {
        self.files_total
    }

    pub fn current(&self) -> Option<&str> {
        self.current.as_deref()
    }

    pub fn failures(&self) -> &[String] {
        &self.failures
    }

    pub fn bytes(&self) -> (u64, u64) {
        (self.sent_bytes, self.total_bytes)
    }

    /// Percentage for display: rounded, then held at 99 until complete.
    pub fn display_percent(&self) -> u8 {
        if self.complete {
            return 100;
        }
        (self.percent.round() as u8).min(99)
    }

    pub fn status_label(&self) -> String {
        if self.complete {
            format!("{} file(s) uploaded", self.files_total)
        } else {
            format!("{} file(s) — {}%", self.files_total, self.display_percent())
        }
    }

    /// Hide the indicator again (the close-uploader command).
    pub fn dismiss(&mut self) {
        *self = Self::default();
    }
}
