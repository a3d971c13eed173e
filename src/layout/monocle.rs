use super::{Arrangement, Layout, Placer};
use crate::geometry::Rect;

pub struct MonocleLayout;

impl Layout for MonocleLayout {
    fn symbol(&self) -> &'static str {
        "[M]"
    }

    fn arrange(&self, arrangement: &Arrangement, place: &mut Placer) -> Option<String> {
        let area = arrangement.work_area;
        for client in arrangement.tiled {
            let border = client.border_width;
            place(
                client.window,
                Rect::new(area.x, area.y, area.width - 2 * border, area.height - 2 * border),
            );
        }

        (arrangement.visible_count > 0).then(|| format!("[{}]", arrangement.visible_count))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layout::test_util::{collect, tiled};

    #[test]
    fn every_tiled_client_fills_the_work_area() {
        let clients = tiled(3, 1);
        let arrangement = Arrangement {
            work_area: Rect::new(0, 20, 800, 580),
            gap: 5,
            master_factor: 0.55,
            num_master: 1,
            visible_count: 4,
            tiled: &clients,
        };
        let (placed, symbol) = collect(&MonocleLayout, &arrangement);
        assert_eq!(placed.len(), 3);
        assert!(placed.iter().all(|(_, r)| *r == Rect::new(0, 20, 798, 578)));
        // floating clients count toward the symbol
        assert_eq!(symbol.as_deref(), Some("[4]"));
    }

    #[test]
    fn empty_monitor_keeps_symbol() {
        let arrangement = Arrangement {
            work_area: Rect::new(0, 0, 800, 600),
            gap: 0,
            master_factor: 0.55,
            num_master: 1,
            visible_count: 0,
            tiled: &[],
        };
        assert_eq!(collect(&MonocleLayout, &arrangement), (vec![], None));
    }
}
