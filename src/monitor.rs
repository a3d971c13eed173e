use x11rb::protocol::xproto::Window;

use crate::Config;
use crate::geometry::Rect;
use crate::tags::TagMask;

#[derive(Debug, Clone)]
pub struct Monitor {
    pub layout_symbol: String,
    pub master_factor: f32,
    pub num_master: i32,
    pub number: usize,
    pub bar_y: i32,
    pub screen: Rect,
    pub work_area: Rect,
    pub gap: i32,
    pub selected_tags_index: usize,
    pub selected_layout_index: usize,
    pub tagset: [TagMask; 2],
    pub layout_indices: [usize; 2],
    pub show_bar: bool,
    pub top_bar: bool,
    /// Attach order, newest first.
    pub clients: Vec<Window>,
    /// Focus history, most recent first.
    pub stack: Vec<Window>,
    pub selected_client: Option<Window>,
    pub bar_window: Option<Window>,
}

impl Monitor {
    pub fn new(screen: Rect, config: &Config) -> Self {
        let layout_symbol = config
            .layouts
            .first()
            .map(|layout| layout.to_boxed_layout().symbol().to_string())
            .unwrap_or_default();

        Self {
            layout_symbol,
            master_factor: config.master_factor,
            num_master: config.num_master,
            number: 0,
            bar_y: 0,
            screen,
            work_area: screen,
            gap: config.gaps,
            selected_tags_index: 0,
            selected_layout_index: 0,
            tagset: [TagMask::tag(0), TagMask::tag(0)],
            layout_indices: [0, 1 % config.layouts.len().max(1)],
            show_bar: config.show_bar,
            top_bar: config.top_bar,
            clients: Vec::new(),
            stack: Vec::new(),
            selected_client: None,
            bar_window: None,
        }
    }

    pub fn get_selected_tag(&self) -> TagMask {
        self.tagset[self.selected_tags_index]
    }

    pub fn get_selected_layout(&self) -> usize {
        self.layout_indices[self.selected_layout_index]
    }

    /// Splits the screen between the bar and the work area.
    pub fn update_bar_position(&mut self, bar_height: i32) {
        self.work_area.y = self.screen.y;
        self.work_area.height = self.screen.height;
        if self.show_bar {
            self.work_area.height -= bar_height;
            self.bar_y = if self.top_bar {
                self.work_area.y
            } else {
                self.work_area.y + self.work_area.height
            };
            if self.top_bar {
                self.work_area.y += bar_height;
            }
        } else {
            self.bar_y = -bar_height;
        }
    }

    pub fn bar_rect(&self, bar_height: i32) -> Rect {
        Rect::new(self.work_area.x, self.bar_y, self.work_area.width, bar_height)
    }

    pub fn attach(&mut self, window: Window) {
        self.clients.insert(0, window);
    }

    pub fn detach(&mut self, window: Window) {
        self.clients.retain(|&w| w != window);
    }

    pub fn attach_stack(&mut self, window: Window) {
        self.stack.insert(0, window);
    }

    pub fn detach_stack(&mut self, window: Window) {
        self.stack.retain(|&w| w != window);
    }
}

/// Drops outputs that repeat an earlier one's rectangle, keeping order.
pub fn unique_outputs(outputs: &[Rect]) -> Vec<Rect> {
    let mut unique: Vec<Rect> = Vec::with_capacity(outputs.len());
    for output in outputs {
        if !unique.contains(output) {
            unique.push(*output);
        }
    }
    unique
}
