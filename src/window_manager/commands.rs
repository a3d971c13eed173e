use tracing::{debug, info, warn};
use x11rb::protocol::xproto::Window;

use super::WindowManager;
use crate::bar::Renderer;
use crate::display::{CursorShape, DisplayEvent, DisplayService, Protocol};
use crate::errors::WmResult;
use crate::geometry::Rect;
use crate::keyboard::handlers::{self, Arg, KeyAction};
use crate::layout::LayoutType;
use crate::tags::TagMask;

/// Motion events closer together than this are dropped during a drag.
const MOTION_INTERVAL_MS: u32 = 1000 / 60;

impl<D: DisplayService, R: Renderer> WindowManager<D, R> {
    pub(crate) fn run_action(&mut self, action: KeyAction, arg: &Arg) -> WmResult<()> {
        match action {
            KeyAction::Spawn => {
                let monitor = self.monitors[self.selected_monitor].number;
                handlers::handle_spawn_action(action, arg, monitor);
            }
            KeyAction::KillClient => self.kill_client()?,
            KeyAction::FocusStack => self.focus_stack(int_arg(arg))?,
            KeyAction::Zoom => self.zoom()?,
            KeyAction::Quit => {
                info!("quit requested");
                self.running = false;
            }
            KeyAction::View => self.view(mask_arg(arg))?,
            KeyAction::ToggleView => self.toggle_view(mask_arg(arg))?,
            KeyAction::Tag => self.tag(mask_arg(arg))?,
            KeyAction::ToggleTag => self.toggle_tag(mask_arg(arg))?,
            KeyAction::FocusMonitor => self.focus_monitor(int_arg(arg))?,
            KeyAction::TagMonitor => self.tag_monitor(int_arg(arg))?,
            KeyAction::SetGaps => self.set_gaps(int_arg(arg))?,
            KeyAction::ToggleFullScreen => self.toggle_fullscreen()?,
            KeyAction::ToggleFloating => self.toggle_floating()?,
            KeyAction::ToggleBar => self.toggle_bar()?,
            KeyAction::SetLayout => {
                let index = match arg {
                    Arg::None => None,
                    Arg::Int(index) if *index >= 0 => Some(*index as usize),
                    Arg::UInt(index) => Some(*index as usize),
                    Arg::Str(name) => match name.parse::<LayoutType>() {
                        Ok(layout) => match self.config.layouts.iter().position(|l| *l == layout) {
                            Some(index) => Some(index),
                            None => {
                                warn!(%name, "layout is not configured");
                                return Ok(());
                            }
                        },
                        Err(error) => {
                            warn!(%error, "unknown layout");
                            return Ok(());
                        }
                    },
                    other => {
                        warn!(?other, "invalid layout argument");
                        return Ok(());
                    }
                };
                self.set_layout(index)?;
            }
            KeyAction::SetMasterFactor => {
                let factor = match *arg {
                    Arg::Float(factor) => factor,
                    Arg::Int(value) => value as f32,
                    _ => return Ok(()),
                };
                self.set_master_factor(factor)?;
            }
            KeyAction::IncNumMaster => self.inc_num_master(int_arg(arg))?,
            KeyAction::MoveMouse => self.move_mouse()?,
            KeyAction::ResizeMouse => self.resize_mouse()?,
            KeyAction::None => {}
        }
        Ok(())
    }

    /// Shows `mask`, or the previously shown tags when the mask is empty.
    pub fn view(&mut self, mask: TagMask) -> WmResult<()> {
        let mask = mask & self.tag_mask;
        let index = self.selected_monitor;
        let monitor = &mut self.monitors[index];
        if mask == monitor.get_selected_tag() {
            return Ok(());
        }
        monitor.selected_tags_index ^= 1;
        if !mask.is_empty() {
            monitor.tagset[monitor.selected_tags_index] = mask;
        }
        debug!(monitor = index, tags = monitor.get_selected_tag().bits(), "view");
        self.focus(None)?;
        self.arrange(Some(index))
    }

    pub fn toggle_view(&mut self, mask: TagMask) -> WmResult<()> {
        let index = self.selected_monitor;
        let monitor = &mut self.monitors[index];
        let tags = monitor.get_selected_tag().toggle(mask & self.tag_mask);
        if tags.is_empty() {
            return Ok(());
        }
        monitor.tagset[monitor.selected_tags_index] = tags;
        self.focus(None)?;
        self.arrange(Some(index))
    }

    pub fn tag(&mut self, mask: TagMask) -> WmResult<()> {
        let mask = mask & self.tag_mask;
        let Some(window) = self.selected_client() else {
            return Ok(());
        };
        if mask.is_empty() {
            return Ok(());
        }
        if let Some(client) = self.clients.get_mut(&window) {
            client.tags = mask;
        }
        self.focus(None)?;
        self.arrange(Some(self.selected_monitor))
    }

    pub fn toggle_tag(&mut self, mask: TagMask) -> WmResult<()> {
        let Some(window) = self.selected_client() else {
            return Ok(());
        };
        let Some(client) = self.clients.get_mut(&window) else {
            return Ok(());
        };
        let tags = client.tags.toggle(mask & self.tag_mask);
        if tags.is_empty() {
            return Ok(());
        }
        client.tags = tags;
        self.focus(None)?;
        self.arrange(Some(self.selected_monitor))
    }

    fn focus_monitor(&mut self, direction: i32) -> WmResult<()> {
        if self.monitors.len() < 2 {
            return Ok(());
        }
        let target = self.dir_to_monitor(direction);
        if target == self.selected_monitor {
            return Ok(());
        }
        if let Some(selected) = self.selected_client() {
            self.unfocus(selected, false)?;
        }
        self.selected_monitor = target;
        self.focus(None)
    }

    fn tag_monitor(&mut self, direction: i32) -> WmResult<()> {
        let Some(window) = self.selected_client() else {
            return Ok(());
        };
        if self.monitors.len() < 2 {
            return Ok(());
        }
        let target = self.dir_to_monitor(direction);
        self.send_monitor(window, target)
    }

    /// Cycles focus through the visible clients in attach order.
    pub fn focus_stack(&mut self, direction: i32) -> WmResult<()> {
        let Some(selected) = self.selected_client() else {
            return Ok(());
        };
        let fullscreen = self.clients.get(&selected).is_some_and(|c| c.is_fullscreen);
        if fullscreen && self.config.lock_fullscreen {
            return Ok(());
        }

        let clients = &self.monitors[self.selected_monitor].clients;
        let Some(position) = clients.iter().position(|&w| w == selected) else {
            return Ok(());
        };
        let visible = |w: &&Window| self.is_visible(**w);
        let target = if direction > 0 {
            clients[position + 1..]
                .iter()
                .find(visible)
                .or_else(|| clients.iter().find(visible))
        } else {
            clients[..position]
                .iter()
                .rev()
                .find(visible)
                .or_else(|| clients[position..].iter().rev().find(visible))
        };

        if let Some(&target) = target {
            self.focus(Some(target))?;
            self.restack(self.selected_monitor)?;
        }
        Ok(())
    }

    fn first_tiled(&self, windows: &[Window]) -> Option<Window> {
        windows.iter().copied().find(|&w| {
            self.is_visible(w) && self.clients.get(&w).is_some_and(|c| !c.is_floating)
        })
    }

    /// Swaps the selection into the master area, or promotes the next tiled
    /// client when the selection already is the master.
    pub fn zoom(&mut self) -> WmResult<()> {
        let index = self.selected_monitor;
        let Some(selected) = self.selected_client() else {
            return Ok(());
        };
        if !self.layout_arranges(index)
            || self.clients.get(&selected).is_none_or(|c| c.is_floating)
        {
            return Ok(());
        }

        let clients = &self.monitors[index].clients;
        let mut target = Some(selected);
        if target == self.first_tiled(clients) {
            let rest = clients
                .iter()
                .position(|&w| w == selected)
                .map_or(&clients[..0], |position| &clients[position + 1..]);
            target = self.first_tiled(rest);
        }
        let Some(target) = target else {
            return Ok(());
        };

        self.detach(target);
        self.attach(target);
        self.focus(Some(target))?;
        self.arrange(Some(index))
    }

    fn inc_num_master(&mut self, delta: i32) -> WmResult<()> {
        let index = self.selected_monitor;
        let monitor = &mut self.monitors[index];
        monitor.num_master = (monitor.num_master + delta).max(0);
        self.arrange(Some(index))
    }

    /// Values below 1.0 adjust the factor, values from 1.0 up set it to
    /// `value - 1.0`.
    fn set_master_factor(&mut self, value: f32) -> WmResult<()> {
        let index = self.selected_monitor;
        if !self.layout_arranges(index) {
            return Ok(());
        }
        let monitor = &mut self.monitors[index];
        let factor = if value < 1.0 {
            value + monitor.master_factor
        } else {
            value - 1.0
        };
        if !(0.05..=0.95).contains(&factor) {
            return Ok(());
        }
        monitor.master_factor = factor;
        self.arrange(Some(index))
    }

    fn set_gaps(&mut self, delta: i32) -> WmResult<()> {
        let index = self.selected_monitor;
        let monitor = &mut self.monitors[index];
        monitor.gap = if delta == 0 || monitor.gap + delta < 0 {
            0
        } else {
            monitor.gap + delta
        };
        self.arrange(Some(index))
    }

    /// Switches to layout `index`, or back to the previous one.
    pub fn set_layout(&mut self, index: Option<usize>) -> WmResult<()> {
        if let Some(index) = index
            && index >= self.config.layouts.len()
        {
            self.warn_unknown_layout(index);
            return Ok(());
        }

        let selected = self.selected_monitor;
        let monitor = &mut self.monitors[selected];
        if index.is_none_or(|index| index != monitor.get_selected_layout()) {
            monitor.selected_layout_index ^= 1;
        }
        if let Some(index) = index {
            monitor.layout_indices[monitor.selected_layout_index] = index;
        }
        if let Some(layout) = self.layout_of(selected) {
            self.monitors[selected].layout_symbol = layout.symbol().to_string();
        }

        if self.monitors[selected].selected_client.is_some() {
            self.arrange(Some(selected))
        } else {
            self.draw_bar(selected)
        }
    }

    pub fn toggle_floating(&mut self) -> WmResult<()> {
        let Some(window) = self.selected_client() else {
            return Ok(());
        };
        let Some(client) = self.clients.get_mut(&window) else {
            return Ok(());
        };
        if client.is_fullscreen {
            return Ok(());
        }
        client.is_floating = !client.is_floating || client.is_fixed;
        if client.is_floating {
            let geometry = client.geometry;
            self.resize(window, geometry, false)?;
        }
        self.arrange(Some(self.selected_monitor))
    }

    fn toggle_fullscreen(&mut self) -> WmResult<()> {
        let Some(window) = self.selected_client() else {
            return Ok(());
        };
        let fullscreen = self.clients.get(&window).is_some_and(|c| c.is_fullscreen);
        self.set_fullscreen(window, !fullscreen)
    }

    fn toggle_bar(&mut self) -> WmResult<()> {
        let index = self.selected_monitor;
        let monitor = &mut self.monitors[index];
        monitor.show_bar = !monitor.show_bar;
        monitor.update_bar_position(self.bar_height);
        self.move_bar(index)?;
        self.arrange(Some(index))
    }

    /// Asks the selection to close, killing it when it does not speak
    /// WM_DELETE_WINDOW.
    fn kill_client(&mut self) -> WmResult<()> {
        let Some(window) = self.selected_client() else {
            return Ok(());
        };
        if !self.display.send_protocol(window, Protocol::DeleteWindow)? {
            info!(window, "killing client");
            self.display.kill_client(window)?;
        }
        Ok(())
    }

    // Pointer drags

    /// Runs a drag until the button is released. Only requests that keep
    /// the screen consistent are handled meanwhile; everything else waits
    /// in `deferred`.
    fn pointer_loop(
        &mut self,
        mut on_motion: impl FnMut(&mut Self, i32, i32) -> WmResult<()>,
    ) -> WmResult<()> {
        let mut last_time = 0u32;
        loop {
            let event = self.display.next_event()?;
            match event {
                DisplayEvent::ConfigureRequest(_)
                | DisplayEvent::Expose { .. }
                | DisplayEvent::MapRequest { .. } => self.handle_event(event)?,
                DisplayEvent::MotionNotify {
                    root_x,
                    root_y,
                    time,
                    ..
                } => {
                    if time.wrapping_sub(last_time) <= MOTION_INTERVAL_MS {
                        continue;
                    }
                    last_time = time;
                    on_motion(self, root_x, root_y)?;
                }
                DisplayEvent::ButtonRelease(_) => return Ok(()),
                DisplayEvent::ButtonPress(_) | DisplayEvent::Unknown => {}
                other => self.deferred.push_back(other),
            }
        }
    }

    pub fn move_mouse(&mut self) -> WmResult<()> {
        let Some(window) = self.selected_client() else {
            return Ok(());
        };
        let Some(client) = self.clients.get(&window) else {
            return Ok(());
        };
        if client.is_fullscreen {
            return Ok(());
        }
        let origin = client.geometry;

        self.restack(self.selected_monitor)?;
        if !self.display.grab_pointer(CursorShape::Move)? {
            return Ok(());
        }
        let Some(start) = self.display.pointer_position() else {
            return self.display.ungrab_pointer();
        };

        self.pointer_loop(|wm, x, y| wm.drag_move(window, origin, start, (x, y)))?;
        self.display.ungrab_pointer()?;
        self.settle_on_monitor(window)
    }

    fn drag_move(
        &mut self,
        window: Window,
        origin: Rect,
        start: (i32, i32),
        pointer: (i32, i32),
    ) -> WmResult<()> {
        let Some(client) = self.clients.get(&window) else {
            return Ok(());
        };
        let monitor = &self.monitors[self.selected_monitor];
        let area = monitor.work_area;
        let gap = monitor.gap;
        let snap = self.config.snap;
        let outer_width = client.outer_width();
        let outer_height = client.outer_height();

        let mut x = origin.x + (pointer.0 - start.0);
        let mut y = origin.y + (pointer.1 - start.1);
        if (area.x - x - gap).abs() < snap {
            x = area.x + gap;
        } else if (area.right() - (x + outer_width + gap)).abs() < snap {
            x = area.right() - outer_width - gap;
        }
        if (area.y - y - gap).abs() < snap {
            y = area.y + gap;
        } else if (area.bottom() - (y + outer_height + gap)).abs() < snap {
            y = area.bottom() - outer_height - gap;
        }

        let arranges = self.layout_arranges(self.selected_monitor);
        let current = client.geometry;
        if !client.is_floating
            && arranges
            && ((x - current.x).abs() > snap || (y - current.y).abs() > snap)
        {
            self.toggle_floating()?;
        }

        let Some(client) = self.clients.get(&window) else {
            return Ok(());
        };
        if !arranges || client.is_floating {
            let geometry = client.geometry;
            self.resize(window, Rect::new(x, y, geometry.width, geometry.height), true)?;
        }
        Ok(())
    }

    pub fn resize_mouse(&mut self) -> WmResult<()> {
        let Some(window) = self.selected_client() else {
            return Ok(());
        };
        let Some(client) = self.clients.get(&window) else {
            return Ok(());
        };
        if client.is_fullscreen {
            return Ok(());
        }
        let origin = client.geometry;
        let border = client.border_width;

        self.restack(self.selected_monitor)?;
        if !self.display.grab_pointer(CursorShape::Resize)? {
            return Ok(());
        }
        self.display
            .warp_pointer(window, origin.width + border - 1, origin.height + border - 1)?;

        self.pointer_loop(|wm, x, y| wm.drag_resize(window, origin, (x, y)))?;

        if let Some(client) = self.clients.get(&window) {
            let geometry = client.geometry;
            let border = client.border_width;
            self.display.warp_pointer(
                window,
                geometry.width + border - 1,
                geometry.height + border - 1,
            )?;
        }
        self.display.ungrab_pointer()?;
        self.display.sync_and_drop_enter_events()?;
        self.deferred
            .retain(|event| !matches!(event, DisplayEvent::EnterNotify { .. }));
        self.settle_on_monitor(window)
    }

    fn drag_resize(&mut self, window: Window, origin: Rect, pointer: (i32, i32)) -> WmResult<()> {
        let Some(client) = self.clients.get(&window) else {
            return Ok(());
        };
        let border = client.border_width;
        let width = (pointer.0 - origin.x - 2 * border + 1).max(1);
        let height = (pointer.1 - origin.y - 2 * border + 1).max(1);

        let own_area = self.monitors[client.monitor_index].work_area;
        let selected_area = self.monitors[self.selected_monitor].work_area;
        let arranges = self.layout_arranges(self.selected_monitor);
        let snap = self.config.snap;
        let current = client.geometry;

        let corner_inside = own_area.x + width >= selected_area.x
            && own_area.x + width <= selected_area.right()
            && own_area.y + height >= selected_area.y
            && own_area.y + height <= selected_area.bottom();
        if corner_inside
            && !client.is_floating
            && arranges
            && ((width - current.width).abs() > snap || (height - current.height).abs() > snap)
        {
            self.toggle_floating()?;
        }

        let Some(client) = self.clients.get(&window) else {
            return Ok(());
        };
        if !arranges || client.is_floating {
            let geometry = client.geometry;
            self.resize(window, Rect::new(geometry.x, geometry.y, width, height), true)?;
        }
        Ok(())
    }

    /// Hands a dragged client to the monitor it now mostly covers.
    fn settle_on_monitor(&mut self, window: Window) -> WmResult<()> {
        let Some(client) = self.clients.get(&window) else {
            return Ok(());
        };
        let target = self.rect_to_monitor(client.geometry);
        if target != self.selected_monitor {
            self.send_monitor(window, target)?;
            self.selected_monitor = target;
            self.focus(None)?;
        }
        Ok(())
    }
}

fn int_arg(arg: &Arg) -> i32 {
    match *arg {
        Arg::Int(value) => value,
        Arg::UInt(value) => value as i32,
        Arg::Float(value) => value as i32,
        _ => 0,
    }
}

fn mask_arg(arg: &Arg) -> TagMask {
    match *arg {
        Arg::UInt(bits) => TagMask::from_bits(bits),
        Arg::Int(bits) => TagMask::from_bits(bits as u32),
        _ => TagMask::EMPTY,
    }
}

#[cfg(test)]
mod tests {
    use super::super::test_util::*;
    use super::*;
    use crate::display::ButtonEvent;
    use crate::display::mock::{Call, ROOT};

    fn motion(x: i32, y: i32, time: u32) -> DisplayEvent {
        DisplayEvent::MotionNotify {
            window: ROOT,
            root_x: x,
            root_y: y,
            time,
        }
    }

    fn release() -> DisplayEvent {
        DisplayEvent::ButtonRelease(ButtonEvent {
            window: ROOT,
            x: 0,
            y: 0,
            root_x: 0,
            root_y: 0,
            button: 1,
            state: 0,
            time: 0,
        })
    }

    fn floating_gimp(wm: &mut TestWm, window: Window) {
        wm.display
            .classes
            .insert(window, ("Gimp".into(), "gimp".into()));
        map_at(wm, window, Rect::new(100, 100, 300, 200));
    }

    #[test]
    fn view_zero_returns_to_previous_tags() {
        let mut wm = wm();
        wm.view(TagMask::tag(3)).unwrap();
        assert_eq!(wm.monitors[0].get_selected_tag(), TagMask::tag(3));
        wm.run_action(KeyAction::View, &Arg::UInt(0)).unwrap();
        assert_eq!(wm.monitors[0].get_selected_tag(), TagMask::tag(0));
        wm.run_action(KeyAction::View, &Arg::UInt(0)).unwrap();
        assert_eq!(wm.monitors[0].get_selected_tag(), TagMask::tag(3));
    }

    #[test]
    fn view_all_is_limited_to_configured_tags() {
        let mut wm = wm();
        wm.run_action(KeyAction::View, &Arg::UInt(!0)).unwrap();
        assert_eq!(wm.monitors[0].get_selected_tag().bits(), 0x1ff);
    }

    #[test]
    fn toggle_view_never_empties_the_view() {
        let mut wm = wm();
        wm.toggle_view(TagMask::tag(2)).unwrap();
        assert_eq!(wm.monitors[0].get_selected_tag(), TagMask::tag(0) | TagMask::tag(2));
        wm.toggle_view(TagMask::tag(0) | TagMask::tag(2)).unwrap();
        assert_eq!(wm.monitors[0].get_selected_tag(), TagMask::tag(0) | TagMask::tag(2));
    }

    #[test]
    fn toggle_tag_round_trips_and_keeps_one_tag() {
        let mut wm = wm();
        map(&mut wm, 10);
        let mask = TagMask::tag(4);

        wm.toggle_tag(mask).unwrap();
        assert_eq!(wm.clients[&10].tags, TagMask::tag(0) | mask);
        wm.toggle_tag(mask).unwrap();
        assert_eq!(wm.clients[&10].tags, TagMask::tag(0));

        wm.toggle_tag(TagMask::tag(0)).unwrap();
        assert_eq!(wm.clients[&10].tags, TagMask::tag(0));
    }

    #[test]
    fn tag_ignores_masks_outside_configured_tags() {
        let mut wm = wm();
        map(&mut wm, 10);
        wm.tag(TagMask::tag(20)).unwrap();
        assert_eq!(wm.clients[&10].tags, TagMask::tag(0));
        wm.tag(TagMask::tag(5)).unwrap();
        assert_eq!(wm.clients[&10].tags, TagMask::tag(5));
        assert_eq!(wm.selected_client(), None);
    }

    #[test]
    fn focus_stack_wraps_in_attach_order() {
        let mut wm = wm();
        for window in 10..13 {
            map(&mut wm, window);
        }
        // clients are [12, 11, 10], 12 selected
        wm.focus_stack(1).unwrap();
        assert_eq!(wm.selected_client(), Some(11));
        wm.focus_stack(1).unwrap();
        wm.focus_stack(1).unwrap();
        assert_eq!(wm.selected_client(), Some(12));
        wm.focus_stack(-1).unwrap();
        assert_eq!(wm.selected_client(), Some(10));
    }

    #[test]
    fn focus_stack_is_locked_on_fullscreen() {
        let mut wm = wm();
        map(&mut wm, 10);
        map(&mut wm, 11);
        wm.set_fullscreen(11, true).unwrap();
        wm.focus_stack(1).unwrap();
        assert_eq!(wm.selected_client(), Some(11));
    }

    #[test]
    fn zoom_promotes_selection_or_next_tiled() {
        let mut wm = wm();
        for window in 10..13 {
            map(&mut wm, window);
        }
        assert_eq!(wm.monitors[0].clients, vec![12, 11, 10]);

        wm.zoom().unwrap();
        assert_eq!(wm.monitors[0].clients, vec![11, 12, 10]);
        assert_eq!(wm.selected_client(), Some(11));

        wm.focus(Some(10)).unwrap();
        wm.zoom().unwrap();
        assert_eq!(wm.monitors[0].clients, vec![10, 11, 12]);
    }

    #[test]
    fn zoom_needs_a_tiled_partner() {
        let mut wm = wm();
        map(&mut wm, 10);
        wm.zoom().unwrap();
        assert_eq!(wm.monitors[0].clients, vec![10]);
        assert_eq!(wm.selected_client(), Some(10));
    }

    #[test]
    fn master_factor_adjusts_within_bounds() {
        let mut wm = wm();
        wm.run_action(KeyAction::SetMasterFactor, &Arg::Float(0.05)).unwrap();
        assert!((wm.monitors[0].master_factor - 0.60).abs() < 1e-6);
        wm.run_action(KeyAction::SetMasterFactor, &Arg::Float(1.25)).unwrap();
        assert!((wm.monitors[0].master_factor - 0.25).abs() < 1e-6);
        wm.run_action(KeyAction::SetMasterFactor, &Arg::Float(0.9)).unwrap();
        assert!((wm.monitors[0].master_factor - 0.25).abs() < 1e-6);

        wm.set_layout(Some(1)).unwrap();
        wm.run_action(KeyAction::SetMasterFactor, &Arg::Float(0.05)).unwrap();
        assert!((wm.monitors[0].master_factor - 0.25).abs() < 1e-6);
    }

    #[test]
    fn num_master_never_goes_negative() {
        let mut wm = wm();
        wm.inc_num_master(-3).unwrap();
        assert_eq!(wm.monitors[0].num_master, 0);
        wm.inc_num_master(2).unwrap();
        assert_eq!(wm.monitors[0].num_master, 2);
    }

    #[test]
    fn gaps_grow_shrink_and_reset() {
        let mut wm = wm();
        wm.set_gaps(3).unwrap();
        assert_eq!(wm.monitors[0].gap, 8);
        wm.set_gaps(-20).unwrap();
        assert_eq!(wm.monitors[0].gap, 0);
        wm.set_gaps(4).unwrap();
        wm.set_gaps(0).unwrap();
        assert_eq!(wm.monitors[0].gap, 0);
    }

    #[test]
    fn set_layout_swaps_slots_and_updates_symbol() {
        let mut wm = wm();
        map(&mut wm, 10);
        map(&mut wm, 11);

        wm.set_layout(Some(2)).unwrap();
        assert_eq!(wm.monitors[0].layout_symbol, "[2]");
        assert_eq!(wm.monitors[0].layout_indices, [0, 2]);

        wm.set_layout(None).unwrap();
        assert_eq!(wm.monitors[0].layout_symbol, "[]=");

        wm.run_action(KeyAction::SetLayout, &Arg::Str("monocle".into()))
            .unwrap();
        assert_eq!(wm.monitors[0].get_selected_layout(), 2);

        wm.set_layout(Some(9)).unwrap();
        assert_eq!(wm.monitors[0].get_selected_layout(), 2);
    }

    #[test]
    fn monocle_fills_work_area() {
        let mut wm = wm();
        map(&mut wm, 10);
        map(&mut wm, 11);
        wm.set_layout(Some(2)).unwrap();
        let full = Rect::new(0, 20, 998, 778);
        assert_eq!(geometry(&wm, 10), full);
        assert_eq!(geometry(&wm, 11), full);
    }

    #[test]
    fn toggle_floating_respects_fixed_and_fullscreen() {
        let mut wm = wm();
        map(&mut wm, 10);
        wm.toggle_floating().unwrap();
        assert!(wm.clients[&10].is_floating);
        wm.toggle_floating().unwrap();
        assert!(!wm.clients[&10].is_floating);

        if let Some(client) = wm.clients.get_mut(&10) {
            client.is_fixed = true;
        }
        wm.toggle_floating().unwrap();
        wm.toggle_floating().unwrap();
        assert!(wm.clients[&10].is_floating);

        wm.set_fullscreen(10, true).unwrap();
        wm.toggle_floating().unwrap();
        assert!(wm.clients[&10].is_floating);
    }

    #[test]
    fn toggle_bar_gives_space_back() {
        let mut wm = wm();
        map(&mut wm, 10);
        wm.toggle_bar().unwrap();
        assert!(!wm.monitors[0].show_bar);
        assert_eq!(wm.monitors[0].work_area, SCREEN);
        assert!(wm.display.calls.contains(&Call::MoveResize(9000, Rect::new(0, -20, 1000, 20))));
        assert_eq!(geometry(&wm, 10), Rect::new(5, 5, 988, 788));
    }

    #[test]
    fn toggle_fullscreen_flips_selection() {
        let mut wm = wm();
        map(&mut wm, 10);
        wm.run_action(KeyAction::ToggleFullScreen, &Arg::None).unwrap();
        assert!(wm.clients[&10].is_fullscreen);
        wm.run_action(KeyAction::ToggleFullScreen, &Arg::None).unwrap();
        assert!(!wm.clients[&10].is_fullscreen);
    }

    #[test]
    fn kill_prefers_delete_window_protocol() {
        let mut wm = wm();
        map(&mut wm, 10);
        map(&mut wm, 11);
        wm.display.protocols.insert(11, vec![Protocol::DeleteWindow]);

        wm.kill_client().unwrap();
        assert!(wm.display.calls.contains(&Call::Protocol(11, Protocol::DeleteWindow)));
        assert!(!wm.display.calls.contains(&Call::Kill(11)));

        wm.focus(Some(10)).unwrap();
        wm.kill_client().unwrap();
        assert!(wm.display.calls.contains(&Call::Kill(10)));
    }

    #[test]
    fn focus_monitor_wraps_around() {
        let mut wm = wm_with_outputs(vec![
            SCREEN,
            Rect::new(1000, 0, 1000, 800),
            Rect::new(2000, 0, 1000, 800),
        ]);
        wm.run_action(KeyAction::FocusMonitor, &Arg::Int(-1)).unwrap();
        assert_eq!(wm.selected_monitor, 2);
        wm.run_action(KeyAction::FocusMonitor, &Arg::Int(1)).unwrap();
        assert_eq!(wm.selected_monitor, 0);
    }

    #[test]
    fn tag_monitor_sends_selection_over() {
        let mut wm = wm_with_outputs(vec![SCREEN, Rect::new(1000, 0, 1000, 800)]);
        map(&mut wm, 10);
        wm.run_action(KeyAction::TagMonitor, &Arg::Int(1)).unwrap();
        assert_eq!(wm.clients[&10].monitor_index, 1);
        assert_eq!(wm.selected_monitor, 0);
    }

    #[test]
    fn dragging_a_floating_window_moves_it() {
        let mut wm = wm();
        floating_gimp(&mut wm, 10);
        wm.display.pointer = Some((150, 150));
        wm.display.events.extend([
            motion(250, 250, 100),
            // too soon after the previous sample
            motion(400, 400, 110),
            release(),
        ]);
        wm.display.clear_calls();

        wm.move_mouse().unwrap();
        assert_eq!(wm.display.last_configure(10), Some(Rect::new(200, 200, 300, 200)));
        assert!(wm.display.calls.contains(&Call::GrabPointer(CursorShape::Move)));
        assert!(wm.display.calls.contains(&Call::UngrabPointer));
    }

    #[test]
    fn dragging_near_an_edge_snaps_to_the_gap() {
        let mut wm = wm();
        floating_gimp(&mut wm, 10);
        wm.display.pointer = Some((150, 150));
        wm.display.events.extend([motion(60, 150, 100), release()]);

        wm.move_mouse().unwrap();
        // x would be 10, within snap distance of the left gap
        assert_eq!(geometry(&wm, 10).x, 5);
    }

    #[test]
    fn dragging_a_tiled_window_far_makes_it_float() {
        let mut wm = wm();
        map(&mut wm, 10);
        wm.display.pointer = Some((100, 100));
        wm.display.events.extend([motion(300, 300, 100), release()]);

        wm.move_mouse().unwrap();
        assert!(wm.clients[&10].is_floating);
        assert_eq!(geometry(&wm, 10).x, 205);
    }

    #[test]
    fn drag_defers_unrelated_events_and_serves_map_requests() {
        let mut wm = wm();
        floating_gimp(&mut wm, 10);
        wm.display.add_window(20, Rect::new(0, 0, 100, 100));
        wm.display.events.extend([
            DisplayEvent::FocusIn { window: 99 },
            DisplayEvent::MapRequest { window: 20 },
            release(),
        ]);

        wm.move_mouse().unwrap();
        assert!(wm.clients.contains_key(&20));
        assert_eq!(
            wm.deferred.iter().collect::<Vec<_>>(),
            vec![&DisplayEvent::FocusIn { window: 99 }]
        );
    }

    #[test]
    fn refused_pointer_grab_aborts_drag() {
        let mut wm = wm();
        floating_gimp(&mut wm, 10);
        wm.display.refuse_pointer_grab = true;
        wm.display.events.push_back(motion(500, 500, 100));

        wm.move_mouse().unwrap();
        wm.resize_mouse().unwrap();
        assert_eq!(wm.display.events.len(), 1);
        assert_eq!(geometry(&wm, 10), Rect::new(100, 100, 300, 200));
    }

    #[test]
    fn resizing_follows_the_pointer_corner() {
        let mut wm = wm();
        floating_gimp(&mut wm, 10);
        wm.display.events.extend([motion(500, 400, 100), release()]);
        wm.display.clear_calls();

        wm.resize_mouse().unwrap();
        assert_eq!(geometry(&wm, 10), Rect::new(100, 100, 399, 299));
        let warps: Vec<_> = wm
            .display
            .calls
            .iter()
            .filter(|c| matches!(c, Call::WarpPointer(..)))
            .collect();
        assert_eq!(
            warps,
            vec![&Call::WarpPointer(10, 300, 200), &Call::WarpPointer(10, 399, 299)]
        );
    }

    #[test]
    fn dropping_on_another_monitor_moves_the_client() {
        let mut wm = wm_with_outputs(vec![SCREEN, Rect::new(1000, 0, 1000, 800)]);
        floating_gimp(&mut wm, 10);
        wm.display.pointer = Some((150, 150));
        wm.display.events.extend([motion(1250, 250, 100), release()]);

        wm.move_mouse().unwrap();
        assert_eq!(wm.clients[&10].monitor_index, 1);
        assert_eq!(wm.selected_monitor, 1);
        assert_eq!(wm.selected_client(), Some(10));
    }
}
