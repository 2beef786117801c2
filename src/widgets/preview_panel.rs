use eframe::egui::*;

use crate::item::{ItemKind, MediaItem, ThumbImage};
use crate::utils::{format_size, format_time};

/// Sidebar preview. Renders one of three states from the current selection:
/// nothing selected, a single item with its details (and, for images, the
/// fetched preview), or a multi-selection count.
pub struct PreviewPanel<'a> {
    selected: &'a [&'a MediaItem],
    preview: Option<&'a ThumbImage>,
    preview_loading: bool,
}

impl<'a> PreviewPanel<'a> {
    pub fn new(
        selected: &'a [&'a MediaItem],
        preview: Option<&'a ThumbImage>,
        preview_loading: bool,
    ) -> Self {
        Self {
            selected,
            preview,
            preview_loading,
        }
    }

    pub fn ui(&self, ui: &mut Ui) {
        ui.add_space(6.0);
        match self.selected.len() {
            0 => {
                ui.label("No items selected");
            }
            1 => self.single_ui(self.selected[0], ui),
            n => {
                ui.label(format!("{} items selected", n));
            }
        }
    }

    fn single_ui(&self, item: &MediaItem, ui: &mut Ui) {
        ui.heading(&item.name);
        ui.add_space(4.0);

        match item.kind {
            ItemKind::Image => {
                if self.preview_loading {
                    ui.label("Loading preview...");
                    ui.spinner();
                } else if let Some(preview) = self.preview {
                    let width = ui.available_width();
                    let size = preview.size();
                    let scale = (width / size.x).min(1.0);
                    ui.image(preview.texture(), size * scale);
                }
            }
            kind => {
                ui.label(format!("{} — no preview", kind.label()));
            }
        }

        ui.add_space(6.0);
        ui.separator();
        if item.kind != ItemKind::Folder {
            ui.horizontal(|ui| {
                ui.label("size:");
                ui.label(format_size(item.size));
            });
            ui.horizontal(|ui| {
                ui.label("modified:");
                ui.label(format_time(item.last_modified));
            });
        }
        ui.label(
            RichText::new(item.path.display().to_string())
                .monospace()
                .small(),
        );
    }
}
