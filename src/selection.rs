//! Drag-rectangle selection engine and the preview-refresh debounce.
//!
//! The engine owns the selected-id set and the pointer-tracking state; it
//! never touches the UI. The coordinator feeds it pointer positions in page
//! coordinates together with the current item bounding boxes, and reacts to
//! the returned change flags.

use crate::geometry::PageRect;
use crate::item::ItemId;
use eframe::egui::Pos2;
use std::collections::HashSet;
use std::mem;
use std::time::{Duration, Instant};

/// Movement on either axis must exceed this many pixels before a pressed
/// pointer becomes a drag gesture.
const DRAG_THRESHOLD_PX: f32 = 2.0;

enum DragPhase {
    Idle,
    /// Pointer is down but has not moved past the threshold yet.
    Pending { origin: Pos2 },
    /// Rectangle is live; recomputed on every move.
    Dragging { origin: Pos2, rect: PageRect },
}

pub struct SelectionEngine {
    selected: HashSet<ItemId>,
    phase: DragPhase,
}

impl SelectionEngine {
    pub fn new() -> Self {
        Self {
            selected: HashSet::new(),
            phase: DragPhase::Idle,
        }
    }

    pub fn is_selected(&self, id: ItemId) -> bool {
        self.selected.contains(&id)
    }

    pub fn selected_count(&self) -> usize {
        self.selected.len()
    }

    /// The live rectangle while a drag is in progress.
    pub fn marquee(&self) -> Option<PageRect> {
        match &self.phase {
            DragPhase::Dragging { rect, .. } => Some(*rect),
            _ => None,
        }
    }

    /// Pointer pressed inside the item surface.
    pub fn pointer_down(&mut self, origin: Pos2) {
        if matches!(self.phase, DragPhase::Idle) {
            self.phase = DragPhase::Pending { origin };
        }
    }

    /// Pointer moved while pressed. Promotes a pending press to a drag once
    /// the threshold is exceeded on either axis, then keeps the rectangle as
    /// the bounding box of origin and current position.
    pub fn pointer_move(&mut self, pos: Pos2) {
        match self.phase {
            DragPhase::Idle => {}
            DragPhase::Pending { origin } => {
                if (pos.x - origin.x).abs() > DRAG_THRESHOLD_PX
                    || (pos.y - origin.y).abs() > DRAG_THRESHOLD_PX
                {
                    self.phase = DragPhase::Dragging {
                        origin,
                        rect: PageRect::from_points(origin, pos),
                    };
                }
            }
            DragPhase::Dragging { origin, .. } => {
                self.phase = DragPhase::Dragging {
                    origin,
                    rect: PageRect::from_points(origin, pos),
                };
            }
        }
    }

    /// Pointer released. Returns `None` when no drag was in progress (plain
    /// clicks are handled by [`SelectionEngine::click`]); otherwise applies
    /// the release policy against the given item bounds and returns whether
    /// the selection changed.
    ///
    /// Additive (shift) release toggles every colliding item and leaves the
    /// rest untouched; a plain release makes the colliding set the entire
    /// selection, deselecting everything outside the rectangle.
    pub fn pointer_up(&mut self, additive: bool, items: &[(ItemId, PageRect)]) -> Option<bool> {
        let phase = mem::replace(&mut self.phase, DragPhase::Idle);
        let rect = match phase {
            DragPhase::Dragging { rect, .. } => rect,
            _ => return None,
        };
        let mut changed = false;
        for (id, bounds) in items {
            let hit = rect.collides_with(bounds);
            if additive {
                if hit {
                    if !self.selected.remove(id) {
                        self.selected.insert(*id);
                    }
                    changed = true;
                }
            } else if hit {
                changed |= self.selected.insert(*id);
            } else {
                changed |= self.selected.remove(id);
            }
        }
        Some(changed)
    }

    /// Click-path selection. `expand` false replaces the whole selection
    /// with the clicked item; `expand` true toggles the clicked item and
    /// leaves the rest alone. Returns whether the selection changed.
    pub fn click(&mut self, id: ItemId, expand: bool) -> bool {
        if expand {
            if !self.selected.remove(&id) {
                self.selected.insert(id);
            }
            true
        } else {
            let already_sole = self.selected.len() == 1 && self.selected.contains(&id);
            self.selected.clear();
            self.selected.insert(id);
            !already_sole
        }
    }

    /// Navigation reset: drop the selection and any drag state.
    pub fn clear(&mut self) -> bool {
        self.phase = DragPhase::Idle;
        let changed = !self.selected.is_empty();
        self.selected.clear();
        changed
    }
}

/// Coalesces rapid selection changes before the preview refreshes, so
/// keyboard-speed mutations trigger a single downstream fetch. Every
/// `schedule` restarts the window; `cancel` is deterministic.
pub struct PreviewDebounce {
    delay: Duration,
    deadline: Option<Instant>,
}

impl PreviewDebounce {
    pub const STANDARD_DELAY: Duration = Duration::from_millis(100);

    pub fn new(delay: Duration) -> Self {
        Self {
            delay,
            deadline: None,
        }
    }

    pub fn standard() -> Self {
        Self::new(Self::STANDARD_DELAY)
    }

    pub fn schedule(&mut self, now: Instant) {
        self.deadline = Some(now + self.delay);
    }

    pub fn cancel(&mut self) {
        self.deadline = None;
    }

    pub fn is_pending(&self) -> bool {
        self.deadline.is_some()
    }

    /// True exactly once, at the first poll on or after the deadline.
    pub fn fire(&mut self, now: Instant) -> bool {
        match self.deadline {
            Some(deadline) if now >= deadline => {
                self.deadline = None;
                true
            }
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use eframe::egui::pos2;

    fn bounds(left: f32, top: f32) -> PageRect {
        PageRect::new(left, top, 20.0, 20.0)
    }

    fn drag(engine: &mut SelectionEngine, from: Pos2, to: Pos2) {
        engine.pointer_down(from);
        engine.pointer_move(to);
    }

    #[test]
    fn movement_within_threshold_stays_a_click_candidate() {
        let mut engine = SelectionEngine::new();
        engine.pointer_down(pos2(10.0, 10.0));
        engine.pointer_move(pos2(12.0, 12.0));
        assert!(engine.marquee().is_none());
        assert_eq!(engine.pointer_up(false, &[]), None);
    }

    #[test]
    fn crossing_the_threshold_starts_a_drag() {
        let mut engine = SelectionEngine::new();
        engine.pointer_down(pos2(10.0, 10.0));
        engine.pointer_move(pos2(10.0, 13.0));
        let rect = engine.marquee().expect("drag should be live");
        assert_eq!(rect, PageRect::new(10.0, 10.0, 0.0, 3.0));
    }

    #[test]
    fn additive_release_toggles_colliding_items_only() {
        let mut engine = SelectionEngine::new();
        // I1 previously selected and colliding, I2 selected and not colliding
        engine.click(1, false);
        engine.click(2, true);
        let items = [(1, bounds(0.0, 0.0)), (2, bounds(500.0, 500.0))];

        drag(&mut engine, pos2(0.0, 0.0), pos2(30.0, 30.0));
        let changed = engine.pointer_up(true, &items);
        assert_eq!(changed, Some(true));
        assert!(!engine.is_selected(1), "colliding item must toggle off");
        assert!(engine.is_selected(2), "non-colliding item is untouched");
    }

    #[test]
    fn plain_release_is_an_exclusive_replace() {
        let mut engine = SelectionEngine::new();
        engine.click(2, false); // selected by an earlier gesture, outside the rect
        let items = [(1, bounds(0.0, 0.0)), (2, bounds(500.0, 500.0))];

        drag(&mut engine, pos2(0.0, 0.0), pos2(30.0, 30.0));
        let changed = engine.pointer_up(false, &items);
        assert_eq!(changed, Some(true));
        assert!(engine.is_selected(1));
        assert!(!engine.is_selected(2), "exclusive replace deselects outsiders");
    }

    #[test]
    fn plain_release_reports_no_change_when_state_already_matches() {
        let mut engine = SelectionEngine::new();
        engine.click(1, false);
        let items = [(1, bounds(0.0, 0.0))];
        drag(&mut engine, pos2(0.0, 0.0), pos2(30.0, 30.0));
        assert_eq!(engine.pointer_up(false, &items), Some(false));
    }

    #[test]
    fn click_then_shift_click_selects_exactly_both() {
        let mut engine = SelectionEngine::new();
        engine.click(1, false);
        engine.click(2, true);
        assert!(engine.is_selected(1));
        assert!(engine.is_selected(2));
        assert_eq!(engine.selected_count(), 2);
    }

    #[test]
    fn plain_click_replaces_the_selection() {
        let mut engine = SelectionEngine::new();
        engine.click(1, false);
        engine.click(2, true);
        assert!(engine.click(3, false));
        assert!(engine.is_selected(3));
        assert_eq!(engine.selected_count(), 1);
    }

    #[test]
    fn shift_click_toggles_membership() {
        let mut engine = SelectionEngine::new();
        engine.click(1, false);
        engine.click(1, true);
        assert_eq!(engine.selected_count(), 0);
    }

    #[test]
    fn clear_resets_selection_and_drag() {
        let mut engine = SelectionEngine::new();
        engine.click(1, false);
        drag(&mut engine, pos2(0.0, 0.0), pos2(40.0, 40.0));
        assert!(engine.clear());
        assert!(!engine.clear());
        assert!(engine.marquee().is_none());
        assert_eq!(engine.selected_count(), 0);
    }

    #[test]
    fn release_rectangle_covers_all_drag_directions() {
        let items = [(1, bounds(0.0, 0.0))];
        // drag up-left across the item
        let mut engine = SelectionEngine::new();
        drag(&mut engine, pos2(30.0, 30.0), pos2(5.0, 5.0));
        assert_eq!(engine.pointer_up(false, &items), Some(true));
        assert!(engine.is_selected(1));
    }

    #[test]
    fn debounce_coalesces_rapid_changes_into_one_refresh() {
        let mut debounce = PreviewDebounce::standard();
        let start = Instant::now();
        // five mutations within 10ms
        for offset in [0u64, 2, 4, 6, 8] {
            debounce.schedule(start + Duration::from_millis(offset));
        }
        let last = start + Duration::from_millis(8);
        assert!(!debounce.fire(last + Duration::from_millis(99)));
        assert!(debounce.fire(last + Duration::from_millis(100)));
        // exactly one refresh
        assert!(!debounce.fire(last + Duration::from_millis(200)));
        assert!(!debounce.is_pending());
    }

    #[test]
    fn debounce_cancel_is_deterministic() {
        let mut debounce = PreviewDebounce::standard();
        let now = Instant::now();
        debounce.schedule(now);
        debounce.cancel();
        assert!(!debounce.fire(now + Duration::from_millis(500)));
    }
}
