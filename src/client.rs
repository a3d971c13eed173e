use x11rb::protocol::xproto::Window;

use crate::geometry::Rect;
use crate::size_hints::{SizeHints, WmSizeHints};
use crate::tags::TagMask;

/// Title used when a window has none.
pub const BROKEN: &str = "broken";

#[derive(Debug, Clone)]
pub struct Client {
    pub window: Window,
    pub name: String,
    pub geometry: Rect,
    pub old_geometry: Rect,
    pub border_width: i32,
    pub old_border_width: i32,
    pub hints: SizeHints,
    pub tags: TagMask,
    pub monitor_index: usize,
    pub is_fixed: bool,
    pub is_floating: bool,
    pub is_urgent: bool,
    pub never_focus: bool,
    pub is_fullscreen: bool,
    pub was_floating: bool,
}

/// Limits a resize request is clamped against.
#[derive(Debug, Clone, Copy)]
pub struct ResizeBounds {
    pub screen_width: i32,
    pub screen_height: i32,
    pub work_area: Rect,
    pub bar_height: i32,
    pub respect_hints: bool,
}

impl Client {
    pub fn new(window: Window, geometry: Rect, original_border_width: i32) -> Self {
        Self {
            window,
            name: BROKEN.to_string(),
            geometry,
            old_geometry: geometry,
            border_width: original_border_width,
            old_border_width: original_border_width,
            hints: SizeHints::default(),
            tags: TagMask::EMPTY,
            monitor_index: 0,
            is_fixed: false,
            is_floating: false,
            is_urgent: false,
            never_focus: false,
            is_fullscreen: false,
            was_floating: false,
        }
    }

    pub fn outer_width(&self) -> i32 {
        self.geometry.width + 2 * self.border_width
    }

    pub fn outer_height(&self) -> i32 {
        self.geometry.height + 2 * self.border_width
    }

    pub fn is_visible_on(&self, active_tags: TagMask) -> bool {
        self.tags.intersects(active_tags)
    }

    pub fn update_size_hints(&mut self, hints: Option<&WmSizeHints>) {
        self.hints = SizeHints::from_normal_hints(hints);
        self.is_fixed = self.hints.is_fixed();
    }

    pub fn set_name(&mut self, name: Option<String>) {
        self.name = match name {
            Some(name) if !name.is_empty() => name,
            _ => BROKEN.to_string(),
        };
    }

    /// Adjusts a requested geometry to the client's constraints. The caller
    /// only needs to touch the window when the result differs from
    /// `self.geometry`.
    pub fn apply_size_hints(&self, requested: Rect, interactive: bool, bounds: &ResizeBounds) -> Rect {
        let Rect {
            mut x,
            mut y,
            mut width,
            mut height,
        } = requested;
        let border = self.border_width;

        width = width.max(1);
        height = height.max(1);

        if interactive {
            if x > bounds.screen_width {
                x = bounds.screen_width - self.outer_width();
            }
            if y > bounds.screen_height {
                y = bounds.screen_height - self.outer_height();
            }
            if x + width + 2 * border < 0 {
                x = 0;
            }
            if y + height + 2 * border < 0 {
                y = 0;
            }
        } else {
            let area = bounds.work_area;
            if x >= area.right() {
                x = area.right() - self.outer_width();
            }
            if y >= area.bottom() {
                y = area.bottom() - self.outer_height();
            }
            if x + width + 2 * border <= area.x {
                x = area.x;
            }
            if y + height + 2 * border <= area.y {
                y = area.y;
            }
        }

        height = height.max(bounds.bar_height);
        width = width.max(bounds.bar_height);

        if bounds.respect_hints {
            let hints = &self.hints;
            let base_is_min =
                hints.base_width == hints.min_width && hints.base_height == hints.min_height;

            if !base_is_min {
                width -= hints.base_width;
                height -= hints.base_height;
            }

            // The min branch derives height from width while the max branch
            // derives width from height; left as is.
            if hints.min_aspect > 0.0 && hints.max_aspect > 0.0 {
                if hints.max_aspect < width as f32 / height as f32 {
                    width = (height as f32 * hints.max_aspect + 0.5) as i32;
                } else if hints.min_aspect < height as f32 / width as f32 {
                    height = (width as f32 * hints.min_aspect + 0.5) as i32;
                }
            }

            if base_is_min {
                width -= hints.base_width;
                height -= hints.base_height;
            }

            if hints.increment_width > 0 {
                width -= width % hints.increment_width;
            }
            if hints.increment_height > 0 {
                height -= height % hints.increment_height;
            }

            width = (width + hints.base_width).max(hints.min_width);
            height = (height + hints.base_height).max(hints.min_height);

            if hints.max_width > 0 {
                width = width.min(hints.max_width);
            }
            if hints.max_height > 0 {
                height = height.min(hints.max_height);
            }
        }

        Rect::new(x, y, width, height)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bounds(respect_hints: bool) -> ResizeBounds {
        ResizeBounds {
            screen_width: 1920,
            screen_height: 1080,
            work_area: Rect::new(0, 20, 1920, 1060),
            bar_height: 20,
            respect_hints,
        }
    }

    fn client() -> Client {
        let mut client = Client::new(1, Rect::new(100, 100, 400, 300), 0);
        client.border_width = 1;
        client
    }

    #[test]
    fn request_without_hints_passes_through() {
        let c = client();
        let r = c.apply_size_hints(Rect::new(10, 30, 500, 400), false, &bounds(true));
        assert_eq!(r, Rect::new(10, 30, 500, 400));
    }

    #[test]
    fn sizes_are_floored_to_bar_height() {
        let c = client();
        let r = c.apply_size_hints(Rect::new(10, 30, 0, 5), false, &bounds(false));
        assert_eq!((r.width, r.height), (20, 20));
    }

    #[test]
    fn non_interactive_origin_is_pulled_back_into_work_area() {
        let c = client();
        let r = c.apply_size_hints(Rect::new(1920, 1080, 400, 300), false, &bounds(false));
        // current outer size (402x302) decides the new origin
        assert_eq!((r.x, r.y), (1920 - 402, 20 + 1060 - 302));

        let r = c.apply_size_hints(Rect::new(-500, -500, 400, 300), false, &bounds(false));
        assert_eq!((r.x, r.y), (0, 20));
    }

    #[test]
    fn interactive_clamps_against_whole_screen() {
        let c = client();
        let r = c.apply_size_hints(Rect::new(-10, 5, 400, 300), true, &bounds(false));
        // partly off screen but still reachable, and allowed above the work area
        assert_eq!((r.x, r.y), (-10, 5));

        let r = c.apply_size_hints(Rect::new(-1000, -1000, 400, 300), true, &bounds(false));
        assert_eq!((r.x, r.y), (0, 0));
    }

    #[test]
    fn increments_snap_relative_to_base() {
        let mut c = client();
        c.hints = SizeHints {
            base_width: 4,
            base_height: 4,
            increment_width: 10,
            increment_height: 20,
            ..SizeHints::default()
        };
        let r = c.apply_size_hints(Rect::new(0, 20, 407, 309), false, &bounds(true));
        assert_eq!((r.width, r.height), (404, 304));
    }

    #[test]
    fn hints_ignored_when_not_respected() {
        let mut c = client();
        c.hints = SizeHints {
            increment_width: 10,
            increment_height: 20,
            max_width: 100,
            max_height: 100,
            ..SizeHints::default()
        };
        let r = c.apply_size_hints(Rect::new(0, 20, 407, 309), false, &bounds(false));
        assert_eq!((r.width, r.height), (407, 309));
    }

    #[test]
    fn min_and_max_sizes_clamp() {
        let mut c = client();
        c.hints = SizeHints {
            min_width: 300,
            min_height: 250,
            base_width: 300,
            base_height: 250,
            max_width: 600,
            max_height: 500,
            ..SizeHints::default()
        };
        let r = c.apply_size_hints(Rect::new(0, 20, 100, 100), false, &bounds(true));
        assert_eq!((r.width, r.height), (300, 250));
        let r = c.apply_size_hints(Rect::new(0, 20, 1000, 1000), false, &bounds(true));
        assert_eq!((r.width, r.height), (600, 500));
    }

    #[test]
    fn max_aspect_shrinks_width_from_height() {
        let mut c = client();
        c.hints = SizeHints {
            min_aspect: 0.5,
            max_aspect: 2.0,
            ..SizeHints::default()
        };
        // 900 / 300 = 3.0 exceeds the 2.0 bound
        let r = c.apply_size_hints(Rect::new(0, 20, 900, 300), false, &bounds(true));
        assert_eq!((r.width, r.height), (600, 300));
    }

    #[test]
    fn min_aspect_branch_is_asymmetric() {
        let mut c = client();
        c.hints = SizeHints {
            min_aspect: 0.5,
            max_aspect: 2.0,
            ..SizeHints::default()
        };
        // A tall 200x800 request: h/w = 4.0 exceeds min_aspect, so the height
        // is recomputed as width * min_aspect. A symmetric rule would bound
        // w/h from below instead and widen the window to 400.
        let r = c.apply_size_hints(Rect::new(0, 20, 200, 800), false, &bounds(true));
        assert_eq!((r.width, r.height), (200, 100));

        // Even a request already within both ratios is rewritten: h/w = 1.0
        // is still above min_aspect.
        let r = c.apply_size_hints(Rect::new(0, 20, 400, 400), false, &bounds(true));
        assert_eq!((r.width, r.height), (400, 200));
    }

    #[test]
    fn empty_name_becomes_placeholder() {
        let mut c = client();
        c.set_name(Some(String::new()));
        assert_eq!(c.name, BROKEN);
        c.set_name(Some("term".into()));
        assert_eq!(c.name, "term");
        c.set_name(None);
        assert_eq!(c.name, BROKEN);
    }
}
