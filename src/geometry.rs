//! Page-coordinate rectangles for drag-select hit testing.
//! Kept separate from egui's `Rect` so the collision rules stay pure and testable.

use eframe::egui::{pos2, Pos2, Rect};

/// Axis-aligned rectangle in page coordinates: top/left corner plus
/// non-negative extents.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PageRect {
    pub left: f32,
    pub top: f32,
    pub width: f32,
    pub height: f32,
}

impl PageRect {
    pub fn new(left: f32, top: f32, width: f32, height: f32) -> Self {
        Self {
            left,
            top,
            width: width.max(0.0),
            height: height.max(0.0),
        }
    }

    /// Bounding box of two corner points, normalizing all four drag
    /// directions (min corner plus absolute deltas).
    pub fn from_points(a: Pos2, b: Pos2) -> Self {
        Self {
            left: a.x.min(b.x),
            top: a.y.min(b.y),
            width: (a.x - b.x).abs(),
            height: (a.y - b.y).abs(),
        }
    }

    pub fn from_rect(rect: Rect) -> Self {
        Self::new(rect.left(), rect.top(), rect.width(), rect.height())
    }

    pub fn to_rect(self) -> Rect {
        Rect::from_min_max(
            pos2(self.left, self.top),
            pos2(self.right(), self.bottom()),
        )
    }

    pub fn right(&self) -> f32 {
        self.left + self.width
    }

    pub fn bottom(&self) -> f32 {
        self.top + self.height
    }

    /// Boundary-inclusive axis-aligned overlap: two rectangles collide unless
    /// one lies entirely above, below, left of, or right of the other.
    /// Touching edges count as a collision.
    pub fn collides_with(&self, other: &PageRect) -> bool {
        !(self.bottom() < other.top
            || self.top > other.bottom()
            || self.right() < other.left
            || self.left > other.right())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn collision_is_symmetric() {
        let a = PageRect::new(0.0, 0.0, 10.0, 10.0);
        let b = PageRect::new(5.0, 5.0, 10.0, 10.0);
        let c = PageRect::new(50.0, 50.0, 10.0, 10.0);
        assert_eq!(a.collides_with(&b), b.collides_with(&a));
        assert_eq!(a.collides_with(&c), c.collides_with(&a));
    }

    #[test]
    fn rectangle_collides_with_itself() {
        let a = PageRect::new(3.0, 4.0, 20.0, 8.0);
        assert!(a.collides_with(&a));
    }

    #[test]
    fn positive_gap_on_any_axis_means_no_collision() {
        let a = PageRect::new(0.0, 0.0, 10.0, 10.0);
        let right_of = PageRect::new(10.1, 0.0, 10.0, 10.0);
        let left_of = PageRect::new(-10.1, 0.0, 10.0, 10.0);
        let below = PageRect::new(0.0, 10.1, 10.0, 10.0);
        let above = PageRect::new(0.0, -10.1, 10.0, 10.0);
        assert!(!a.collides_with(&right_of));
        assert!(!a.collides_with(&left_of));
        assert!(!a.collides_with(&below));
        assert!(!a.collides_with(&above));
    }

    #[test]
    fn touching_edges_do_collide() {
        let a = PageRect::new(0.0, 0.0, 10.0, 10.0);
        let edge_right = PageRect::new(10.0, 0.0, 10.0, 10.0);
        let edge_bottom = PageRect::new(0.0, 10.0, 10.0, 10.0);
        let corner = PageRect::new(10.0, 10.0, 10.0, 10.0);
        assert!(a.collides_with(&edge_right));
        assert!(a.collides_with(&edge_bottom));
        assert!(a.collides_with(&corner));
    }

    #[test]
    fn from_points_normalizes_all_four_drag_directions() {
        let origin = pos2(10.0, 10.0);
        let expected = PageRect::new(4.0, 2.0, 6.0, 8.0);
        assert_eq!(PageRect::from_points(pos2(4.0, 2.0), pos2(10.0, 10.0)), expected);
        assert_eq!(PageRect::from_points(origin, pos2(4.0, 2.0)), expected);
        let down_right = PageRect::from_points(origin, pos2(16.0, 18.0));
        assert_eq!(down_right, PageRect::new(10.0, 10.0, 6.0, 8.0));
        let up_right = PageRect::from_points(origin, pos2(16.0, 2.0));
        assert_eq!(up_right, PageRect::new(10.0, 2.0, 6.0, 8.0));
    }

    #[test]
    fn rect_round_trip() {
        let a = PageRect::new(1.0, 2.0, 3.0, 4.0);
        assert_eq!(PageRect::from_rect(a.to_rect()), a);
    }
}
