use eframe::egui::*;

use crate::geometry::PageRect;
use crate::item::{MediaItem, ThumbState};
use crate::utils::truncate_name;

pub const TILE_SIZE: f32 = 110.0;

/// One cell of the icon view: thumbnail, spinner while the placeholder is
/// loading, or a kind glyph. Selection is painted from the explicit flag,
/// never derived back from the visuals.
pub struct ItemTile<'a> {
    item: &'a MediaItem,
    selected: bool,
    marquee: Option<PageRect>,
}

impl<'a> ItemTile<'a> {
    pub fn new(item: &'a MediaItem, selected: bool, marquee: Option<PageRect>) -> Self {
        Self {
            item,
            selected,
            marquee,
        }
    }
}

impl Widget for ItemTile<'_> {
    fn ui(self, ui: &mut Ui) -> Response {
        let (rect, resp) = ui.allocate_exact_size(vec2(TILE_SIZE, TILE_SIZE), Sense::click());
        if ui.is_rect_visible(rect) {
            let in_marquee = self.item.selectable
                && self
                    .marquee
                    .map_or(false, |m| m.collides_with(&PageRect::from_rect(rect)));
            let highlight = self.selected || in_marquee;
            let bg_color = if highlight {
                ui.visuals().selection.bg_fill
            } else if resp.hovered() {
                ui.visuals().faint_bg_color
            } else {
                ui.visuals().extreme_bg_color
            };
            let text_color = if highlight {
                ui.visuals().selection.stroke.color
            } else {
                ui.visuals().text_color()
            };
            ui.painter_at(rect)
                .rect(rect, Rounding::none(), bg_color, Stroke::none());

            let image_rect = Rect::from_min_max(
                rect.min + vec2(6.0, 6.0),
                pos2(rect.max.x - 6.0, rect.max.y - 24.0),
            );
            match &self.item.thumb {
                ThumbState::Ready(thumb) => {
                    let size = thumb.size();
                    let scale = (image_rect.width() / size.x)
                        .min(image_rect.height() / size.y)
                        .min(1.0);
                    ui.allocate_ui_at_rect(image_rect, |ui| {
                        ui.centered_and_justified(|ui| ui.image(thumb.texture(), size * scale));
                    });
                }
                ThumbState::Loading => {
                    ui.ctx().request_repaint();
                    ui.allocate_ui_at_rect(image_rect, |ui| {
                        ui.centered_and_justified(|ui| ui.add(widgets::Spinner::new()));
                    });
                }
                ThumbState::None => {
                    ui.painter_at(rect).text(
                        image_rect.center(),
                        Align2::CENTER_CENTER,
                        self.item.kind.glyph(),
                        FontId::proportional(20.0),
                        text_color,
                    );
                }
            }

            ui.painter_at(rect).text(
                pos2(rect.center().x, rect.max.y - 12.0),
                Align2::CENTER_CENTER,
                truncate_name(&self.item.name, 14),
                FontId::proportional(11.0),
                text_color,
            );
        }

        resp
    }
}
