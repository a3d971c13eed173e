use super::{Arrangement, Layout, Placer};
use crate::geometry::Rect;

pub struct TilingLayout;

impl TilingLayout {
    fn master_width(arrangement: &Arrangement, window_count: i32) -> i32 {
        let area = arrangement.work_area;
        if window_count > arrangement.num_master {
            if arrangement.num_master > 0 {
                (area.width as f32 * arrangement.master_factor) as i32
            } else {
                0
            }
        } else {
            area.width - arrangement.gap
        }
    }
}

impl Layout for TilingLayout {
    fn symbol(&self) -> &'static str {
        "[]="
    }

    fn arrange(&self, arrangement: &Arrangement, place: &mut Placer) -> Option<String> {
        let window_count = arrangement.tiled.len() as i32;
        if window_count == 0 {
            return None;
        }

        let area = arrangement.work_area;
        let gap = arrangement.gap;
        let num_master = arrangement.num_master;
        let master_width = Self::master_width(arrangement, window_count);

        let mut master_y = gap;
        let mut stack_y = gap;

        for (i, client) in arrangement.tiled.iter().enumerate() {
            let i = i as i32;
            let border = client.border_width;

            if i < num_master {
                let height = (area.height - master_y) / (window_count.min(num_master) - i) - gap;
                let placed = place(
                    client.window,
                    Rect::new(
                        area.x + gap,
                        area.y + master_y,
                        master_width - 2 * border - gap,
                        height - 2 * border,
                    ),
                );
                let outer_height = placed.height + 2 * border;
                if master_y + outer_height + gap < area.height {
                    master_y += outer_height + gap;
                }
            } else {
                let height = (area.height - stack_y) / (window_count - i) - gap;
                let placed = place(
                    client.window,
                    Rect::new(
                        area.x + master_width + gap,
                        area.y + stack_y,
                        area.width - master_width - 2 * border - 2 * gap,
                        height - 2 * border,
                    ),
                );
                let outer_height = placed.height + 2 * border;
                if stack_y + outer_height + gap < area.height {
                    stack_y += outer_height + gap;
                }
            }
        }

        None
    }
}
