mod geometry;
mod item;
mod local_store;
mod selection;
mod service;
mod store;
mod thumbnails;
mod upload;
mod utils;
mod widgets;

use clap::Parser;
use eframe::egui::{self, Color32, Context, Key, Rounding, Stroke};
use egui_extras::{Size, StripBuilder};
use image::RgbaImage;
use log::{debug, trace};
use simple_logger::SimpleLogger;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;

use geometry::PageRect;
use item::{ItemId, ItemKind, MediaItem, ThumbImage, ThumbState};
use local_store::LocalStore;
use selection::{PreviewDebounce, SelectionEngine};
use service::{StoreEvent, StoreService};
use store::{FolderEntry, GeneratedThumb, StoreError};
use thumbnails::{ThumbBatch, ThumbWork, ThumbnailQueue};
use upload::{UploadEvent, UploadProgress};
use widgets::{ItemRow, ItemTile, PreviewPanel, TILE_SIZE};

/// Pixel box requested for the sidebar preview.
const PREVIEW_EDGE: u32 = 512;
const SIDEBAR_WIDTH: f32 = 260.0;
const DEFAULT_THUMB_EDGE: u32 = 96;

#[derive(Parser, Debug)]
#[clap(author, version, about)]
struct CliArguments {
    /// Folder to open on startup (defaults to the working directory)
    path: Option<PathBuf>,
    /// Maximum number of thumbnail batches in flight
    #[clap(long, default_value_t = thumbnails::DEFAULT_MAX_BATCHES)]
    max_batches: usize,
    /// Maximum number of work items per thumbnail batch
    #[clap(long, default_value_t = thumbnails::DEFAULT_BATCH_LEN)]
    batch_len: usize,
    /// Pixel box requested for grid thumbnails
    #[clap(long, default_value_t = DEFAULT_THUMB_EDGE)]
    thumb_edge: u32,
}

fn main() {
    SimpleLogger::new().init().unwrap();
    let args = CliArguments::parse();
    let start_folder = args
        .path
        .clone()
        .unwrap_or_else(|| std::env::current_dir().unwrap_or_else(|_| PathBuf::from("/")));
    let queue = ThumbnailQueue::with_limits(args.max_batches, args.batch_len);
    let thumb_edge = args.thumb_edge.max(16);
    let mut options = eframe::NativeOptions::default();
    options.initial_window_size = Some(egui::Vec2::new(1080.0, 720.0));
    options.drag_and_drop_support = true;
    eframe::run_native(
        "MedView",
        options,
        Box::new(move |cc| {
            let egui_ctx = cc.egui_ctx.clone();
            let store = Arc::new(LocalStore::new());
            let service = StoreService::start(store, move || egui_ctx.request_repaint())
                .expect("failed to start store worker pools");
            let app =
                MediaManagerApp::new(service, queue, thumb_edge, start_folder, cc.egui_ctx.clone());
            Box::new(app)
        }),
    );
}

#[derive(Clone, Copy, PartialEq)]
enum ViewMode {
    Icons,
    List,
}

struct PreviewState {
    image: Option<ThumbImage>,
    loading: bool,
    /// Bumped on every preview change; in-flight fetches carrying an older
    /// generation are dropped on arrival (single-flight supersede).
    generation: u64,
}

struct MediaManagerApp {
    ctx: Context,
    service: StoreService,
    current_folder: PathBuf,
    path_input: String,
    items: Vec<MediaItem>,
    /// Selectable-item bounding boxes from the last layout pass.
    item_rects: Vec<(ItemId, PageRect)>,
    selection: SelectionEngine,
    debounce: PreviewDebounce,
    queue: ThumbnailQueue,
    thumb_edge: u32,
    next_item_id: ItemId,
    preview: PreviewState,
    upload: UploadProgress,
    view_mode: ViewMode,
    notice: Option<String>,
    listing: bool,
    pointer_was_down: bool,
}

impl MediaManagerApp {
    fn new(
        service: StoreService,
        queue: ThumbnailQueue,
        thumb_edge: u32,
        start_folder: PathBuf,
        ctx: Context,
    ) -> Self {
        service.list_folder(start_folder.clone(), false);
        Self {
            ctx,
            service,
            path_input: start_folder.to_string_lossy().to_string(),
            current_folder: start_folder,
            items: Vec::new(),
            item_rects: Vec::new(),
            selection: SelectionEngine::new(),
            debounce: PreviewDebounce::standard(),
            queue,
            thumb_edge,
            next_item_id: 1,
            preview: PreviewState {
                image: None,
                loading: false,
                generation: 0,
            },
            upload: UploadProgress::new(),
            view_mode: ViewMode::Icons,
            notice: None,
            listing: true,
            pointer_was_down: false,
        }
    }

    fn alloc_id(&mut self) -> ItemId {
        let id = self.next_item_id;
        self.next_item_id += 1;
        id
    }

    //
    // Store completions
    //

    fn process_events(&mut self) {
        while let Ok(event) = self.service.receiver.try_recv() {
            match event {
                StoreEvent::FolderListed { path, result } => self.apply_listing(path, result),
                StoreEvent::ThumbnailBatchDone { results } => self.apply_thumbnails(results),
                StoreEvent::PreviewReady { generation, image } => {
                    self.apply_preview(generation, image)
                }
                StoreEvent::Upload(event) => self.apply_upload(event),
            }
        }
    }

    fn apply_listing(&mut self, path: PathBuf, result: Result<Vec<FolderEntry>, StoreError>) {
        self.listing = false;
        let entries = match result {
            Ok(entries) => entries,
            Err(err) => {
                self.notice = Some(format!("cannot open {}: {}", path.display(), err));
                self.path_input = self.current_folder.to_string_lossy().to_string();
                return;
            }
        };

        self.current_folder = path.clone();
        self.path_input = path.to_string_lossy().to_string();
        self.items.clear();
        self.item_rects.clear();
        if let Some(parent) = path.parent() {
            let id = self.alloc_id();
            self.items
                .push(MediaItem::parent_anchor(id, parent.to_path_buf()));
        }
        for entry in entries {
            let id = self.alloc_id();
            self.items.push(MediaItem::from_entry(id, entry));
        }

        // a new listing invalidates everything the old one selected or showed
        self.selection.clear();
        self.debounce.cancel();
        self.reset_preview();
        self.queue_thumbnails();
    }

    fn reset_preview(&mut self) {
        self.preview.generation += 1;
        self.preview.image = None;
        self.preview.loading = false;
    }

    fn queue_thumbnails(&mut self) {
        // reverse display order: the queue pops LIFO, so the topmost
        // placeholders are dispatched first
        let work: Vec<ThumbWork> = self
            .items
            .iter()
            .rev()
            .filter(|item| item.wants_thumbnail())
            .map(|item| ThumbWork {
                id: item.id,
                width: self.thumb_edge,
                height: self.thumb_edge,
                path: item.path.clone(),
                last_modified: item.last_modified,
            })
            .collect();
        self.queue.enqueue_all(work);
        let batches = self.queue.drain();
        trace!(
            "dispatching {} thumbnail batches, {} items pending, {} in flight",
            batches.len(),
            self.queue.pending_len(),
            self.queue.in_flight()
        );
        self.dispatch(batches);
    }

    /// Flag every dispatched placeholder as loading before the request goes
    /// out, then hand the batch to the workers.
    fn dispatch(&mut self, batches: Vec<ThumbBatch>) {
        for batch in batches {
            for work in &batch {
                if let Some(item) = self.items.iter_mut().find(|i| i.id == work.id) {
                    item.thumb = ThumbState::Loading;
                }
            }
            self.service.generate_thumbnails(batch);
        }
    }

    fn apply_thumbnails(&mut self, results: Vec<GeneratedThumb>) {
        for thumb in results {
            // navigation may have replaced the listing; stale ids match nothing
            if let Some(item) = self.items.iter_mut().find(|i| i.id == thumb.id) {
                let texture =
                    ThumbImage::upload(&self.ctx, format!("thumb_{}", thumb.id), &thumb.image);
                item.thumb = ThumbState::Ready(texture);
            }
        }
        let batches = self.queue.settle();
        self.dispatch(batches);
    }

    fn apply_preview(&mut self, generation: u64, image: RgbaImage) {
        if generation != self.preview.generation {
            debug!("dropping superseded preview result");
            return;
        }
        self.preview.loading = false;
        self.preview.image = Some(ThumbImage::upload(
            &self.ctx,
            format!("preview_{}", generation),
            &image,
        ));
    }

    fn apply_upload(&mut self, event: UploadEvent) {
        if let UploadEvent::FileFailed { name, message } = &event {
            self.notice = Some(format!("upload of {} failed: {}", name, message));
        }
        let completes = matches!(event, UploadEvent::QueueComplete);
        self.upload.observe(&event);
        if completes {
            self.refresh();
        }
    }

    //
    // Navigation
    //

    fn navigate(&mut self, path: PathBuf) {
        self.listing = true;
        self.notice = None;
        self.service.list_folder(path, false);
    }

    fn refresh(&mut self) {
        self.listing = true;
        self.service.list_folder(self.current_folder.clone(), true);
    }

    fn go_up(&mut self) {
        if let Some(parent) = self.current_folder.parent() {
            self.navigate(parent.to_path_buf());
        }
    }

    //
    // Selection / preview plumbing
    //

    fn note_selection_changed(&mut self) {
        self.debounce.schedule(Instant::now());
    }

    fn refresh_preview(&mut self) {
        let mut selected = self
            .items
            .iter()
            .filter(|item| self.selection.is_selected(item.id));
        let first = selected
            .next()
            .map(|item| (item.kind, item.path.clone(), item.last_modified));
        let multiple = selected.next().is_some();

        self.reset_preview();
        if let (Some((ItemKind::Image, path, last_modified)), false) = (first, multiple) {
            self.preview.loading = true;
            self.service
                .fetch_preview(self.preview.generation, path, last_modified, PREVIEW_EDGE);
        }
    }

    fn handle_dropped_files(&mut self, ctx: &Context) {
        let dropped: Vec<PathBuf> = ctx
            .input()
            .raw
            .dropped_files
            .iter()
            .filter_map(|file| file.path.clone())
            .collect();
        if dropped.is_empty() {
            return;
        }
        // one upload queue at a time; a running queue owns the progress bar
        if self.upload.is_active() && !self.upload.is_complete() {
            self.notice = Some("an upload is already in progress".to_string());
            return;
        }
        self.service.upload(self.current_folder.clone(), dropped);
    }

    //
    // Panels
    //

    fn toolbar_ui(&mut self, ui: &mut egui::Ui) {
        ui.horizontal(|ui| {
            if ui.button("▲").on_hover_text("parent folder").clicked() {
                self.go_up();
            }
            if ui.button("⟳").on_hover_text("refresh").clicked() {
                self.refresh();
            }
            ui.separator();
            if ui
                .selectable_label(self.view_mode == ViewMode::Icons, "icons")
                .clicked()
            {
                self.view_mode = ViewMode::Icons;
            }
            if ui
                .selectable_label(self.view_mode == ViewMode::List, "list")
                .clicked()
            {
                self.view_mode = ViewMode::List;
            }
            ui.separator();
            let response = ui.text_edit_singleline(&mut self.path_input);
            if response.lost_focus() && ui.input().key_pressed(Key::Enter) {
                let path = PathBuf::from(self.path_input.trim());
                self.navigate(path);
            }
            if self.listing {
                ui.spinner();
            }
        });
    }

    fn status_ui(&mut self, ui: &mut egui::Ui) {
        ui.horizontal(|ui| {
            let total = self.items.iter().filter(|item| item.selectable).count();
            let info = if self.selection.selected_count() == 0 {
                format!("{} items", total)
            } else {
                format!("{} of {} selected", self.selection.selected_count(), total)
            };
            ui.label(info);

            if self.upload.is_active() {
                ui.separator();
                let fraction = self.upload.display_percent() as f32 / 100.0;
                let (sent_bytes, total_bytes) = self.upload.bytes();
                ui.add(
                    egui::ProgressBar::new(fraction)
                        .desired_width(180.0)
                        .text(self.upload.status_label()),
                )
                .on_hover_text(format!("{} / {} bytes", sent_bytes, total_bytes));
                if let Some(name) = self.upload.current() {
                    ui.label(format!("uploading {}", name));
                }
                if !self.upload.failures().is_empty() {
                    ui.colored_label(
                        Color32::RED,
                        format!("{} failed", self.upload.failures().len()),
                    );
                }
                if self.upload.is_complete() && ui.small_button("✖").clicked() {
                    self.upload.dismiss();
                }
            }

            if let Some(notice) = self.notice.clone() {
                ui.separator();
                ui.colored_label(Color32::RED, notice);
                if ui.small_button("dismiss").clicked() {
                    self.notice = None;
                }
            }
        });
    }

    fn item_surface_ui(&mut self, ui: &mut egui::Ui) {
        let mut surface_rect = ui.available_rect_before_wrap();
        // keep the scrollbar out of the drag surface
        surface_rect.max.x -= 12.0;
        let shift = ui.input().modifiers.shift;
        let marquee = self.selection.marquee();

        let mut rects: Vec<(ItemId, PageRect)> = Vec::new();
        let mut clicked: Option<(ItemId, bool)> = None;
        let mut nav: Option<PathBuf> = None;

        match self.view_mode {
            ViewMode::Icons => {
                self.icon_view(ui, marquee, shift, &mut rects, &mut clicked, &mut nav)
            }
            ViewMode::List => {
                self.list_view(ui, marquee, shift, &mut rects, &mut clicked, &mut nav)
            }
        }
        self.item_rects = rects;

        let release = self.pointer_gestures(ui, surface_rect, shift);
        if release == Some(true) {
            self.note_selection_changed();
        }
        if release.is_none() {
            // plain clicks only count when no drag gesture ended this frame
            if let Some((id, expand)) = clicked {
                if self.selection.click(id, expand) {
                    self.note_selection_changed();
                }
            }
        }

        if let Some(rect) = self.selection.marquee() {
            let stroke_color = ui.visuals().selection.stroke.color;
            let fill = ui.visuals().selection.bg_fill.linear_multiply(0.2);
            ui.painter().rect(
                rect.to_rect(),
                Rounding::none(),
                fill,
                Stroke::new(1.0, stroke_color),
            );
        }

        if let Some(path) = nav {
            self.navigate(path);
        }
    }

    fn icon_view(
        &self,
        ui: &mut egui::Ui,
        marquee: Option<PageRect>,
        shift: bool,
        rects: &mut Vec<(ItemId, PageRect)>,
        clicked: &mut Option<(ItemId, bool)>,
        nav: &mut Option<PathBuf>,
    ) {
        let spacing = ui.spacing().item_spacing.x;
        let cols = ((ui.available_width() / (TILE_SIZE + spacing)) as usize).max(1);
        egui::ScrollArea::vertical().show(ui, |ui| {
            for row in self.items.chunks(cols) {
                ui.horizontal(|ui| {
                    for item in row {
                        let selected = self.selection.is_selected(item.id);
                        let resp = ui.add(ItemTile::new(item, selected, marquee));
                        self.track_item(item, &resp, shift, rects, clicked, nav);
                    }
                });
            }
        });
    }

    fn list_view(
        &self,
        ui: &mut egui::Ui,
        marquee: Option<PageRect>,
        shift: bool,
        rects: &mut Vec<(ItemId, PageRect)>,
        clicked: &mut Option<(ItemId, bool)>,
        nav: &mut Option<PathBuf>,
    ) {
        egui::ScrollArea::vertical().show(ui, |ui| {
            for item in &self.items {
                let selected = self.selection.is_selected(item.id);
                let resp = ui.add(ItemRow::new(item, selected, marquee));
                self.track_item(item, &resp, shift, rects, clicked, nav);
            }
        });
    }

    fn track_item(
        &self,
        item: &MediaItem,
        resp: &egui::Response,
        shift: bool,
        rects: &mut Vec<(ItemId, PageRect)>,
        clicked: &mut Option<(ItemId, bool)>,
        nav: &mut Option<PathBuf>,
    ) {
        if item.selectable {
            rects.push((item.id, PageRect::from_rect(resp.rect)));
            if resp.clicked() {
                *clicked = Some((item.id, shift));
            }
        }
        if resp.double_clicked() && item.kind == ItemKind::Folder {
            *nav = Some(item.path.clone());
        }
    }

    /// Drive the selection engine from raw pointer state. Returns `None`
    /// when no drag-release happened this frame, otherwise whether the
    /// release changed the selection.
    fn pointer_gestures(
        &mut self,
        ui: &egui::Ui,
        surface_rect: egui::Rect,
        shift: bool,
    ) -> Option<bool> {
        let (down, pos) = {
            let input = ui.input();
            (input.pointer.primary_down(), input.pointer.interact_pos())
        };

        let mut release = None;
        if down && !self.pointer_was_down {
            if let Some(pos) = pos {
                if surface_rect.contains(pos) {
                    self.selection.pointer_down(pos);
                }
            }
        } else if down {
            if let Some(pos) = pos {
                self.selection.pointer_move(pos);
            }
        } else if self.pointer_was_down {
            release = self.selection.pointer_up(shift, &self.item_rects);
        }
        self.pointer_was_down = down;
        release
    }

    fn sidebar_ui(&mut self, ui: &mut egui::Ui) {
        let selected: Vec<&MediaItem> = self
            .items
            .iter()
            .filter(|item| self.selection.is_selected(item.id))
            .collect();
        PreviewPanel::new(&selected, self.preview.image.as_ref(), self.preview.loading).ui(ui);
    }
}

impl eframe::App for MediaManagerApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        self.process_events();
        if self.debounce.fire(Instant::now()) {
            self.refresh_preview();
        }
        if self.debounce.is_pending()
            || self.preview.loading
            || (self.upload.is_active() && !self.upload.is_complete())
        {
            ctx.request_repaint();
        }
        self.handle_dropped_files(ctx);

        egui::TopBottomPanel::top("toolbar").show(ctx, |ui| self.toolbar_ui(ui));
        egui::TopBottomPanel::bottom("status").show(ctx, |ui| self.status_ui(ui));
        egui::CentralPanel::default().show(ctx, |ui| {
            StripBuilder::new(ui)
                .size(Size::remainder().at_least(240.0))
                .size(Size::exact(SIDEBAR_WIDTH))
                .horizontal(|mut strip| {
                    strip.cell(|ui| self.item_surface_ui(ui));
                    strip.cell(|ui| self.sidebar_ui(ui));
                });
        });
    }
}
