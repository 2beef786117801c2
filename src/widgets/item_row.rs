use eframe::egui::*;

use crate::geometry::PageRect;
use crate::item::{ItemKind, MediaItem};
use crate::utils::{format_size, format_time, truncate_name};

pub const ROW_HEIGHT: f32 = 20.0;

const SIZE_COL: f32 = 90.0;
const DATE_COL: f32 = 110.0;

/// One row of the list view: glyph, name, size and modified columns.
pub struct ItemRow<'a> {
    item: &'a MediaItem,
    selected: bool,
    marquee: Option<PageRect>,
}

impl<'a> ItemRow<'a> {
    pub fn new(item: &'a MediaItem, selected: bool, marquee: Option<PageRect>) -> Self {
        Self {
            item,
            selected,
            marquee,
        }
    }
}

impl Widget for ItemRow<'_> {
    fn ui(self, ui: &mut Ui) -> Response {
        let width = ui.available_width();
        let (rect, resp) = ui.allocate_exact_size(vec2(width, ROW_HEIGHT), Sense::click());
        if ui.is_rect_visible(rect) {
            let in_marquee = self.item.selectable
                && self
                    .marquee
                    .map_or(false, |m| m.collides_with(&PageRect::from_rect(rect)));
            let highlight = self.selected || in_marquee;
            let text_color = if highlight {
                ui.visuals().selection.stroke.color
            } else {
                ui.visuals().text_color()
            };
            if highlight {
                ui.painter_at(rect).rect(
                    rect,
                    Rounding::none(),
                    ui.visuals().selection.bg_fill,
                    Stroke::none(),
                );
            } else if resp.hovered() {
                ui.painter_at(rect).rect(
                    rect,
                    Rounding::none(),
                    ui.visuals().faint_bg_color,
                    Stroke::none(),
                );
            }

            let painter = ui.painter_at(rect);
            painter.text(
                pos2(rect.min.x + 4.0, rect.center().y),
                Align2::LEFT_CENTER,
                self.item.kind.glyph(),
                FontId::monospace(10.0),
                text_color,
            );
            painter.text(
                pos2(rect.min.x + 40.0, rect.center().y),
                Align2::LEFT_CENTER,
                truncate_name(&self.item.name, 48),
                FontId::proportional(12.0),
                text_color,
            );

            let size_text = if self.item.kind == ItemKind::Folder {
                "—".to_string()
            } else {
                format_size(self.item.size)
            };
            painter.text(
                pos2(rect.max.x - SIZE_COL - DATE_COL, rect.center().y),
                Align2::LEFT_CENTER,
                size_text,
                FontId::proportional(11.0),
                text_color,
            );

            if self.item.last_modified != 0 {
                painter.text(
                    pos2(rect.max.x - DATE_COL, rect.center().y),
                    Align2::LEFT_CENTER,
                    format_time(self.item.last_modified),
                    FontId::proportional(11.0),
                    text_color,
                );
            }
        }

        resp
    }
}
