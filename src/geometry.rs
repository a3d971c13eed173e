#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Hash)]
pub struct Rect {
    pub x: i32,
    pub y: i32,
    pub width: i32,
    pub height: i32,
}

impl Rect {
    pub const fn new(x: i32, y: i32, width: i32, height: i32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    pub const fn right(&self) -> i32 {
        self.x + self.width
    }

    pub const fn bottom(&self) -> i32 {
        self.y + self.height
    }

    /// Area shared by both rectangles. Zero when they are disjoint or either
    /// one is degenerate.
    pub fn intersection_area(&self, other: &Rect) -> i32 {
        let overlap_width = self.right().min(other.right()) - self.x.max(other.x);
        let overlap_height = self.bottom().min(other.bottom()) - self.y.max(other.y);
        overlap_width.max(0) * overlap_height.max(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn overlapping_rects_report_shared_area() {
        let a = Rect::new(0, 0, 100, 100);
        let b = Rect::new(50, 50, 100, 100);
        assert_eq!(a.intersection_area(&b), 2500);
        assert_eq!(b.intersection_area(&a), 2500);
    }

    #[test]
    fn disjoint_rects_have_zero_area() {
        let a = Rect::new(0, 0, 100, 100);
        let b = Rect::new(200, 0, 100, 100);
        assert_eq!(a.intersection_area(&b), 0);

        // far apart on both axes: both overlaps negative, product must not flip sign
        let c = Rect::new(500, 500, 10, 10);
        assert_eq!(a.intersection_area(&c), 0);
    }

    #[test]
    fn degenerate_rect_has_zero_area() {
        let a = Rect::new(0, 0, 100, 100);
        let empty = Rect::new(10, 10, 0, 50);
        assert_eq!(a.intersection_area(&empty), 0);
        let negative = Rect::new(10, 10, -5, 50);
        assert_eq!(a.intersection_area(&negative), 0);
    }
}
