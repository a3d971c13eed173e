//! Client, monitor and focus bookkeeping.
//!
//! [`WindowManager`] owns every managed client and every monitor. Event
//! handlers live in `events`, user commands in `commands`; this module holds
//! the state and the operations both of them build on.

mod commands;
mod events;

use std::collections::{HashMap, VecDeque};

use tracing::{debug, info, warn};
use x11rb::protocol::xproto::Window;

use crate::Config;
use crate::bar::{self, BarContent, BarStyle, BarTitle, Renderer};
use crate::client::{BROKEN, Client, ResizeBounds};
use crate::display::{DisplayEvent, DisplayService, WindowAttributes, WmState};
use crate::errors::WmResult;
use crate::geometry::Rect;
use crate::keyboard::handlers;
use crate::layout::{Arrangement, LayoutBox, TiledClient};
use crate::monitor::{Monitor, unique_outputs};
use crate::tags::TagMask;

pub struct WindowManager<D: DisplayService, R: Renderer> {
    config: Config,
    display: D,
    renderer: R,
    clients: HashMap<Window, Client>,
    monitors: Vec<Monitor>,
    selected_monitor: usize,
    screen_width: i32,
    screen_height: i32,
    bar_height: i32,
    /// Sum of the left and right padding around bar labels.
    lrpad: i32,
    numlock_mask: u16,
    status_text: String,
    tag_mask: TagMask,
    last_motion_monitor: Option<usize>,
    /// Events a pointer drag pulled off the queue without handling.
    deferred: VecDeque<DisplayEvent>,
    running: bool,
}

impl<D: DisplayService, R: Renderer> WindowManager<D, R> {
    pub fn new(config: Config, display: D, renderer: R) -> WmResult<Self> {
        let (screen_width, screen_height) = display.screen_size();
        let font_height = renderer.font_height();
        let numlock_mask = display.numlock_mask();
        let tag_mask = config.tag_mask();

        let mut wm = Self {
            config,
            display,
            renderer,
            clients: HashMap::new(),
            monitors: Vec::new(),
            selected_monitor: 0,
            screen_width,
            screen_height,
            bar_height: font_height + 2,
            lrpad: font_height,
            numlock_mask,
            status_text: String::new(),
            tag_mask,
            last_motion_monitor: None,
            deferred: VecDeque::new(),
            running: true,
        };

        wm.update_geometry()?;
        wm.update_bars()?;
        wm.update_status()?;
        wm.grab_keys()?;
        wm.focus(None)?;

        info!(
            monitors = wm.monitors.len(),
            screen_width, screen_height, "window manager initialized"
        );
        Ok(wm)
    }

    /// Takes over the windows that were already mapped when we started.
    /// Transients go last so their parents are managed first.
    pub fn scan(&mut self) -> WmResult<()> {
        let mut transients = Vec::new();

        for window in self.display.top_level_windows()? {
            let Some(attributes) = self.display.window_attributes(window) else {
                continue;
            };
            if attributes.override_redirect {
                continue;
            }
            if self.display.transient_for(window).is_some() {
                transients.push((window, attributes));
                continue;
            }
            if self.should_adopt(window, &attributes) {
                self.manage(window, attributes)?;
            }
        }

        for (window, attributes) in transients {
            if self.should_adopt(window, &attributes) && !self.clients.contains_key(&window) {
                self.manage(window, attributes)?;
            }
        }

        debug!(clients = self.clients.len(), "scan complete");
        Ok(())
    }

    fn should_adopt(&self, window: Window, attributes: &WindowAttributes) -> bool {
        attributes.viewable || self.display.wm_state(window) == Some(WmState::Iconic)
    }

    pub fn run_autostart(&self) {
        for command in &self.config.autostart {
            crate::signal::spawn_detached(command);
        }
    }

    pub fn run(&mut self) -> WmResult<()> {
        self.display.flush()?;
        while self.running {
            let event = match self.deferred.pop_front() {
                Some(event) => event,
                None => self.display.next_event()?,
            };
            self.handle_event(event)?;
        }
        info!("event loop stopped");
        Ok(())
    }

    /// Hands every client back in a state another manager can adopt.
    pub fn cleanup(&mut self) -> WmResult<()> {
        self.view(TagMask::from_bits(!0))?;

        let monitor = &mut self.monitors[self.selected_monitor];
        if let Some(floating) = self
            .config
            .layouts
            .iter()
            .position(|layout| !layout.to_boxed_layout().arranges())
        {
            monitor.layout_indices[monitor.selected_layout_index] = floating;
        }

        for index in 0..self.monitors.len() {
            while let Some(&window) = self.monitors[index].stack.first() {
                self.unmanage(window, false)?;
            }
        }

        self.display.ungrab_keys()?;
        for monitor in &mut self.monitors {
            if let Some(bar) = monitor.bar_window.take() {
                self.display.destroy_window(bar)?;
            }
        }
        self.display.flush()
    }

    pub fn into_display(self) -> D {
        self.display
    }

    pub(crate) fn selected_client(&self) -> Option<Window> {
        self.monitors
            .get(self.selected_monitor)
            .and_then(|monitor| monitor.selected_client)
    }

    fn is_visible(&self, window: Window) -> bool {
        self.clients.get(&window).is_some_and(|client| {
            client.is_visible_on(self.monitors[client.monitor_index].get_selected_tag())
        })
    }

    fn layout_of(&self, monitor: usize) -> Option<LayoutBox> {
        let index = self.monitors.get(monitor)?.get_selected_layout();
        self.config
            .layouts
            .get(index)
            .map(|layout| layout.to_boxed_layout())
    }

    fn layout_arranges(&self, monitor: usize) -> bool {
        self.layout_of(monitor).is_some_and(|layout| layout.arranges())
    }

    // Attach order and focus history

    fn attach(&mut self, window: Window) {
        if let Some(client) = self.clients.get(&window) {
            self.monitors[client.monitor_index].attach(window);
        }
    }

    fn detach(&mut self, window: Window) {
        if let Some(client) = self.clients.get(&window) {
            self.monitors[client.monitor_index].detach(window);
        }
    }

    fn attach_stack(&mut self, window: Window) {
        if let Some(client) = self.clients.get(&window) {
            self.monitors[client.monitor_index].attach_stack(window);
        }
    }

    /// Removes `window` from its monitor's focus history. When it was the
    /// selection, the most recent visible client takes over.
    fn detach_stack(&mut self, window: Window) {
        let Some(client) = self.clients.get(&window) else {
            return;
        };
        let clients = &self.clients;
        let monitor = &mut self.monitors[client.monitor_index];
        monitor.detach_stack(window);

        if monitor.selected_client == Some(window) {
            let active = monitor.get_selected_tag();
            monitor.selected_client = monitor.stack.iter().copied().find(|w| {
                clients
                    .get(w)
                    .is_some_and(|client| client.is_visible_on(active))
            });
        }
    }

    // Managing windows

    pub fn manage(&mut self, window: Window, attributes: WindowAttributes) -> WmResult<()> {
        let mut client = Client::new(window, attributes.geometry, attributes.border_width);
        client.set_name(self.display.window_title(window));

        let transient_for = self.display.transient_for(window);
        let is_transient = transient_for.is_some();
        match transient_for.and_then(|parent| self.clients.get(&parent)) {
            Some(parent) => {
                client.monitor_index = parent.monitor_index;
                client.tags = parent.tags;
            }
            None => {
                client.monitor_index = self.selected_monitor;
                self.apply_rules(&mut client);
            }
        }

        client.border_width = self.config.border_width;
        client.old_border_width = attributes.border_width;

        let monitor = &self.monitors[client.monitor_index];
        let screen = monitor.screen;
        let work_area = monitor.work_area;
        let bar_on_top = monitor.bar_y == screen.y;
        let geometry = &mut client.geometry;
        let outer_width = geometry.width + 2 * client.border_width;
        let outer_height = geometry.height + 2 * client.border_width;
        if geometry.x + outer_width > screen.right() {
            geometry.x = screen.right() - outer_width;
        }
        if geometry.y + outer_height > screen.bottom() {
            geometry.y = screen.bottom() - outer_height;
        }
        geometry.x = geometry.x.max(screen.x);
        let center_x = geometry.x + geometry.width / 2;
        let covers_bar = bar_on_top && center_x >= work_area.x && center_x < work_area.right();
        geometry.y = geometry.y.max(if covers_bar { self.bar_height } else { screen.y });

        self.display.set_border_width(window, client.border_width)?;
        self.display
            .set_border_color(window, self.config.scheme_normal.border)?;
        self.display
            .send_configure_notify(window, client.geometry, client.border_width)?;

        let monitor_index = client.monitor_index;
        self.clients.insert(window, client);

        self.update_window_type(window)?;
        self.update_size_hints(window);
        self.update_wm_hints(window)?;
        self.display.select_client_input(window)?;
        self.grab_buttons(window, false)?;

        let Some(client) = self.clients.get_mut(&window) else {
            return Ok(());
        };
        if !client.is_floating {
            client.is_floating = is_transient || client.is_fixed;
            client.was_floating = client.is_floating;
        }
        let is_floating = client.is_floating;
        let geometry = client.geometry;
        info!(
            window,
            name = %client.name,
            monitor = monitor_index,
            tags = client.tags.bits(),
            is_floating,
            "managing window"
        );

        if is_floating {
            self.display.raise_window(window)?;
        }

        self.attach(window);
        self.attach_stack(window);
        self.display.append_client_list(window)?;
        // park it off-screen until the arrange below places it
        self.display.move_resize_window(
            window,
            Rect::new(
                geometry.x + 2 * self.screen_width,
                geometry.y,
                geometry.width,
                geometry.height,
            ),
        )?;
        self.display.set_wm_state(window, WmState::Normal)?;

        if monitor_index == self.selected_monitor
            && let Some(selected) = self.selected_client()
        {
            self.unfocus(selected, false)?;
        }
        self.monitors[monitor_index].selected_client = Some(window);

        self.arrange(Some(monitor_index))?;
        self.display.map_window(window)?;
        self.focus(None)
    }

    fn apply_rules(&self, client: &mut Client) {
        let (class, instance) = self
            .display
            .window_class(client.window)
            .unwrap_or_else(|| (BROKEN.to_string(), BROKEN.to_string()));

        client.is_floating = false;
        let mut tags = TagMask::EMPTY;
        for rule in &self.config.window_rules {
            if !rule.matches(&class, &instance, &client.name) {
                continue;
            }
            debug!(window = client.window, %class, %instance, ?rule, "rule matched");
            client.is_floating = rule.is_floating;
            tags |= rule.tags;
            if let Some(number) = rule.monitor
                && let Some(index) = self.monitors.iter().position(|m| m.number == number)
            {
                client.monitor_index = index;
            }
        }

        let tags = tags & self.tag_mask;
        client.tags = if tags.is_empty() {
            self.monitors[client.monitor_index].get_selected_tag()
        } else {
            tags
        };
    }

    pub fn unmanage(&mut self, window: Window, destroyed: bool) -> WmResult<()> {
        let Some(client) = self.clients.get(&window) else {
            return Ok(());
        };
        let monitor_index = client.monitor_index;
        let old_border_width = client.old_border_width;

        self.detach(window);
        self.detach_stack(window);

        if !destroyed {
            // the window may be gone already
            let restored = self.withdraw(window, old_border_width);
            if let Err(error) = restored {
                debug!(window, %error, "withdrawing window failed");
            }
        }

        self.clients.remove(&window);
        info!(window, destroyed, "unmanaged window");

        self.focus(None)?;
        self.update_client_list()?;
        self.arrange(Some(monitor_index))
    }

    fn withdraw(&mut self, window: Window, old_border_width: i32) -> WmResult<()> {
        self.display.grab_server()?;
        self.display.set_border_width(window, old_border_width)?;
        self.display.ungrab_buttons(window)?;
        self.display.set_wm_state(window, WmState::Withdrawn)?;
        self.display.ungrab_server()
    }

    fn update_client_list(&mut self) -> WmResult<()> {
        let windows: Vec<Window> = self
            .monitors
            .iter()
            .flat_map(|monitor| monitor.clients.iter().copied())
            .collect();
        self.display.set_client_list(&windows)
    }

    fn update_title(&mut self, window: Window) {
        let title = self.display.window_title(window);
        if let Some(client) = self.clients.get_mut(&window) {
            client.set_name(title);
        }
    }

    fn update_size_hints(&mut self, window: Window) {
        let hints = self.display.size_hints(window);
        if let Some(client) = self.clients.get_mut(&window) {
            client.update_size_hints(hints.as_ref());
        }
    }

    fn update_wm_hints(&mut self, window: Window) -> WmResult<()> {
        let Some(hints) = self.display.wm_hints(window) else {
            return Ok(());
        };
        let is_selected = self.selected_client() == Some(window);
        let Some(client) = self.clients.get_mut(&window) else {
            return Ok(());
        };

        if is_selected && hints.urgent {
            self.display.set_urgency_hint(window, false)?;
        } else {
            client.is_urgent = hints.urgent;
        }
        client.never_focus = hints.input.is_some_and(|input| !input);
        Ok(())
    }

    fn update_window_type(&mut self, window: Window) -> WmResult<()> {
        let window_type = self.display.window_type(window);
        if window_type.fullscreen {
            self.set_fullscreen(window, true)?;
        }
        if window_type.dialog
            && let Some(client) = self.clients.get_mut(&window)
        {
            client.is_floating = true;
        }
        Ok(())
    }

    fn set_urgent(&mut self, window: Window, urgent: bool) -> WmResult<()> {
        if let Some(client) = self.clients.get_mut(&window) {
            client.is_urgent = urgent;
            self.display.set_urgency_hint(window, urgent)?;
        }
        Ok(())
    }

    pub fn set_fullscreen(&mut self, window: Window, fullscreen: bool) -> WmResult<()> {
        let Some(client) = self.clients.get_mut(&window) else {
            return Ok(());
        };

        if fullscreen && !client.is_fullscreen {
            self.display.set_fullscreen_state(window, true)?;
            client.is_fullscreen = true;
            client.was_floating = client.is_floating;
            client.is_floating = true;
            client.old_border_width = client.border_width;
            client.border_width = 0;
            let screen = self.monitors[client.monitor_index].screen;
            self.resize_client(window, screen)?;
            self.display.raise_window(window)?;
        } else if !fullscreen && client.is_fullscreen {
            self.display.set_fullscreen_state(window, false)?;
            client.is_fullscreen = false;
            client.is_floating = client.was_floating;
            client.border_width = client.old_border_width;
            let restored = client.old_geometry;
            let monitor_index = client.monitor_index;
            self.resize_client(window, restored)?;
            self.arrange(Some(monitor_index))?;
        }
        Ok(())
    }

    // Geometry

    /// Applies size constraints to `requested` and moves the window if that
    /// changes anything. Returns where the client ends up.
    fn resize(&mut self, window: Window, requested: Rect, interactive: bool) -> WmResult<Rect> {
        let Some(client) = self.clients.get(&window) else {
            return Ok(requested);
        };
        let monitor = client.monitor_index;
        let bounds = ResizeBounds {
            screen_width: self.screen_width,
            screen_height: self.screen_height,
            work_area: self.monitors[monitor].work_area,
            bar_height: self.bar_height,
            respect_hints: self.config.resize_hints
                || client.is_floating
                || !self.layout_arranges(monitor),
        };

        let geometry = client.apply_size_hints(requested, interactive, &bounds);
        if geometry != client.geometry {
            self.resize_client(window, geometry)?;
        }
        Ok(geometry)
    }

    fn resize_client(&mut self, window: Window, geometry: Rect) -> WmResult<()> {
        let Some(client) = self.clients.get_mut(&window) else {
            return Ok(());
        };
        client.old_geometry = client.geometry;
        client.geometry = geometry;
        let border_width = client.border_width;

        self.display.configure_window(window, geometry, border_width)?;
        self.display
            .send_configure_notify(window, geometry, border_width)
    }

    // Arrangement

    /// Lays out one monitor and restacks it, or lays out every monitor
    /// without restacking.
    pub fn arrange(&mut self, monitor: Option<usize>) -> WmResult<()> {
        match monitor {
            Some(index) => {
                self.show_hide(index)?;
                self.arrange_monitor(index)?;
                self.restack(index)
            }
            None => {
                for index in 0..self.monitors.len() {
                    self.show_hide(index)?;
                }
                for index in 0..self.monitors.len() {
                    self.arrange_monitor(index)?;
                }
                Ok(())
            }
        }
    }

    /// Shows visible clients top-down and hides the rest bottom-up by
    /// moving them past the left edge of the screen.
    fn show_hide(&mut self, monitor: usize) -> WmResult<()> {
        let stack = self.monitors[monitor].stack.clone();
        let arranges = self.layout_arranges(monitor);

        for &window in &stack {
            if !self.is_visible(window) {
                continue;
            }
            let Some(client) = self.clients.get(&window) else {
                continue;
            };
            let geometry = client.geometry;
            let refit = (!arranges || client.is_floating) && !client.is_fullscreen;
            self.display.move_window(window, geometry.x, geometry.y)?;
            if refit {
                self.resize(window, geometry, false)?;
            }
        }

        for &window in stack.iter().rev() {
            if self.is_visible(window) {
                continue;
            }
            if let Some(client) = self.clients.get(&window) {
                self.display
                    .move_window(window, -2 * client.outer_width(), client.geometry.y)?;
            }
        }
        Ok(())
    }

    fn arrange_monitor(&mut self, index: usize) -> WmResult<()> {
        let Some(layout) = self.layout_of(index) else {
            return Ok(());
        };
        self.monitors[index].layout_symbol = layout.symbol().to_string();
        if !layout.arranges() {
            return Ok(());
        }

        let monitor = &self.monitors[index];
        let active = monitor.get_selected_tag();
        let mut visible_count = 0;
        let mut tiled = Vec::new();
        for window in &monitor.clients {
            let Some(client) = self.clients.get(window) else {
                continue;
            };
            if !client.is_visible_on(active) {
                continue;
            }
            visible_count += 1;
            if !client.is_floating {
                tiled.push(TiledClient {
                    window: *window,
                    border_width: client.border_width,
                });
            }
        }

        let arrangement = Arrangement {
            work_area: monitor.work_area,
            gap: monitor.gap,
            master_factor: monitor.master_factor,
            num_master: monitor.num_master,
            visible_count,
            tiled: &tiled,
        };

        let mut failure = None;
        let symbol = layout.arrange(&arrangement, &mut |window, rect| {
            match self.resize(window, rect, false) {
                Ok(placed) => placed,
                Err(error) => {
                    failure.get_or_insert(error);
                    rect
                }
            }
        });
        if let Some(error) = failure {
            return Err(error);
        }
        if let Some(symbol) = symbol {
            self.monitors[index].layout_symbol = symbol;
        }
        Ok(())
    }

    fn restack(&mut self, index: usize) -> WmResult<()> {
        self.draw_bar(index)?;
        let Some(selected) = self.monitors[index].selected_client else {
            return Ok(());
        };
        let arranges = self.layout_arranges(index);

        if !arranges || self.clients.get(&selected).is_some_and(|c| c.is_floating) {
            self.display.raise_window(selected)?;
        }

        if arranges {
            let mut sibling = self.monitors[index].bar_window;
            let stack = self.monitors[index].stack.clone();
            for window in stack {
                let tiled = self.clients.get(&window).is_some_and(|c| !c.is_floating);
                if !tiled || !self.is_visible(window) {
                    continue;
                }
                if let Some(sibling) = sibling {
                    self.display.stack_below(window, sibling)?;
                }
                sibling = Some(window);
            }
        }

        self.display.sync_and_drop_enter_events()?;
        self.deferred
            .retain(|event| !matches!(event, DisplayEvent::EnterNotify { .. }));
        Ok(())
    }

    // Focus

    /// Focuses `window`, or the most recently focused visible client of the
    /// selected monitor when `window` is absent or hidden.
    pub fn focus(&mut self, window: Option<Window>) -> WmResult<()> {
        let target = window.filter(|&w| self.is_visible(w)).or_else(|| {
            self.monitors[self.selected_monitor]
                .stack
                .iter()
                .copied()
                .find(|&w| self.is_visible(w))
        });

        if let Some(selected) = self.selected_client()
            && Some(selected) != target
        {
            self.unfocus(selected, false)?;
        }

        match target {
            Some(window) => {
                let Some(client) = self.clients.get(&window) else {
                    return Ok(());
                };
                self.selected_monitor = client.monitor_index;
                if client.is_urgent {
                    self.set_urgent(window, false)?;
                }
                self.detach_stack(window);
                self.attach_stack(window);
                self.grab_buttons(window, true)?;
                self.display
                    .set_border_color(window, self.config.scheme_selected.border)?;
                self.set_focus(window)?;
            }
            None => {
                let root = self.display.root();
                self.display.set_input_focus(root)?;
                self.display.set_active_window(None)?;
            }
        }

        self.monitors[self.selected_monitor].selected_client = target;
        self.draw_bars()
    }

    fn unfocus(&mut self, window: Window, reset_input_focus: bool) -> WmResult<()> {
        if !self.clients.contains_key(&window) {
            return Ok(());
        }
        self.grab_buttons(window, false)?;
        self.display
            .set_border_color(window, self.config.scheme_normal.border)?;
        if reset_input_focus {
            let root = self.display.root();
            self.display.set_input_focus(root)?;
            self.display.set_active_window(None)?;
        }
        Ok(())
    }

    fn set_focus(&mut self, window: Window) -> WmResult<()> {
        let never_focus = self.clients.get(&window).is_some_and(|c| c.never_focus);
        if !never_focus {
            self.display.set_input_focus(window)?;
            self.display.set_active_window(Some(window))?;
        }
        self.display
            .send_protocol(window, crate::display::Protocol::TakeFocus)?;
        Ok(())
    }

    fn grab_buttons(&mut self, window: Window, focused: bool) -> WmResult<()> {
        let grabs = handlers::client_button_grabs(&self.config.buttons);
        self.display
            .grab_buttons(window, focused, &grabs, self.numlock_mask)
    }

    fn grab_keys(&mut self) -> WmResult<()> {
        self.numlock_mask = self.display.numlock_mask();
        let keys: Vec<_> = self
            .config
            .keybindings
            .iter()
            .map(|binding| (binding.mask(), binding.keysym()))
            .collect();
        self.display.grab_keys(&keys, self.numlock_mask)
    }

    // Monitors

    /// Syncs the monitor list with the current outputs. Returns whether
    /// anything changed.
    pub fn update_geometry(&mut self) -> WmResult<bool> {
        let outputs = match self.display.outputs()? {
            Some(outputs) if !outputs.is_empty() => unique_outputs(&outputs),
            _ => vec![Rect::new(0, 0, self.screen_width, self.screen_height)],
        };
        let mut dirty = false;

        let existing = self.monitors.len();
        while self.monitors.len() < outputs.len() {
            self.monitors
                .push(Monitor::new(Rect::default(), &self.config));
        }

        for (index, &output) in outputs.iter().enumerate() {
            let monitor = &mut self.monitors[index];
            if index >= existing || monitor.screen != output {
                dirty = true;
                monitor.number = index;
                monitor.screen = output;
                monitor.work_area = output;
                monitor.update_bar_position(self.bar_height);
                debug!(monitor = index, ?output, "monitor geometry changed");
            }
        }

        while self.monitors.len() > outputs.len() {
            let Some(removed) = self.monitors.pop() else {
                break;
            };
            let removed_index = self.monitors.len();
            for &window in &removed.clients {
                dirty = true;
                if let Some(client) = self.clients.get_mut(&window) {
                    client.monitor_index = 0;
                }
                self.monitors[0].attach(window);
                self.monitors[0].attach_stack(window);
            }
            if self.selected_monitor >= removed_index {
                self.selected_monitor = 0;
            }
            if let Some(bar) = removed.bar_window {
                self.display.destroy_window(bar)?;
            }
            info!(monitor = removed_index, "monitor removed");
        }

        if dirty {
            self.selected_monitor = 0;
            let root = self.display.root();
            self.selected_monitor = self.window_to_monitor(root);
        }
        Ok(dirty)
    }

    /// Monitor whose work area overlaps `rect` the most, defaulting to the
    /// selected one.
    fn rect_to_monitor(&self, rect: Rect) -> usize {
        let mut best = self.selected_monitor;
        let mut best_area = 0;
        for (index, monitor) in self.monitors.iter().enumerate() {
            let area = rect.intersection_area(&monitor.work_area);
            if area > best_area {
                best_area = area;
                best = index;
            }
        }
        best
    }

    fn window_to_monitor(&self, window: Window) -> usize {
        if window == self.display.root()
            && let Some((x, y)) = self.display.pointer_position()
        {
            return self.rect_to_monitor(Rect::new(x, y, 1, 1));
        }
        if let Some(index) = self
            .monitors
            .iter()
            .position(|monitor| monitor.bar_window == Some(window))
        {
            return index;
        }
        self.clients
            .get(&window)
            .map_or(self.selected_monitor, |client| client.monitor_index)
    }

    fn dir_to_monitor(&self, direction: i32) -> usize {
        let count = self.monitors.len();
        if direction > 0 {
            (self.selected_monitor + 1) % count
        } else {
            (self.selected_monitor + count - 1) % count
        }
    }

    /// Moves a client to another monitor, adopting that monitor's tags.
    pub fn send_monitor(&mut self, window: Window, target: usize) -> WmResult<()> {
        let Some(client) = self.clients.get(&window) else {
            return Ok(());
        };
        if client.monitor_index == target || target >= self.monitors.len() {
            return Ok(());
        }

        self.unfocus(window, true)?;
        self.detach(window);
        self.detach_stack(window);
        let tags = self.monitors[target].get_selected_tag();
        if let Some(client) = self.clients.get_mut(&window) {
            client.monitor_index = target;
            client.tags = tags;
        }
        self.attach(window);
        self.attach_stack(window);
        debug!(window, monitor = target, "sent to monitor");

        self.focus(None)?;
        self.arrange(None)
    }

    // Bars

    fn update_bars(&mut self) -> WmResult<()> {
        for index in 0..self.monitors.len() {
            if self.monitors[index].bar_window.is_some() {
                continue;
            }
            let rect = self.monitors[index].bar_rect(self.bar_height);
            let window = self.display.create_bar_window(rect)?;
            self.monitors[index].bar_window = Some(window);
        }
        Ok(())
    }

    fn update_status(&mut self) -> WmResult<()> {
        self.status_text = match self.display.root_name() {
            Some(name) => name,
            None => format!("tagwm-{}", env!("CARGO_PKG_VERSION")),
        };
        self.draw_bar(self.selected_monitor)
    }

    fn draw_bar(&mut self, index: usize) -> WmResult<()> {
        let Some(monitor) = self.monitors.get(index) else {
            return Ok(());
        };
        let Some(window) = monitor.bar_window else {
            return Ok(());
        };
        if !monitor.show_bar {
            return Ok(());
        }

        let mut occupied = TagMask::EMPTY;
        let mut urgent = TagMask::EMPTY;
        for client in monitor.clients.iter().filter_map(|w| self.clients.get(w)) {
            occupied |= client.tags;
            if client.is_urgent {
                urgent |= client.tags;
            }
        }

        let is_selected_monitor = index == self.selected_monitor;
        let selected = monitor
            .selected_client
            .and_then(|window| self.clients.get(&window));
        let focused_tags = match selected {
            Some(client) if is_selected_monitor => client.tags,
            _ => TagMask::EMPTY,
        };

        let content = BarContent {
            tags: &self.config.tags,
            active_tags: monitor.get_selected_tag(),
            occupied,
            urgent,
            focused_tags,
            layout_symbol: &monitor.layout_symbol,
            status: is_selected_monitor.then_some(self.status_text.as_str()),
            title: selected.map(|client| BarTitle {
                name: &client.name,
                is_floating: client.is_floating,
                is_fixed: client.is_fixed,
            }),
            is_selected_monitor,
            width: monitor.work_area.width,
        };
        let style = BarStyle {
            height: self.bar_height,
            padding: self.lrpad,
            normal: self.config.scheme_normal,
            selected: self.config.scheme_selected,
        };

        bar::draw_bar(&mut self.renderer, window, &content, &style)
    }

    fn draw_bars(&mut self) -> WmResult<()> {
        for index in 0..self.monitors.len() {
            self.draw_bar(index)?;
        }
        Ok(())
    }

    fn move_bar(&mut self, index: usize) -> WmResult<()> {
        let monitor = &self.monitors[index];
        if let Some(bar) = monitor.bar_window {
            let rect = monitor.bar_rect(self.bar_height);
            self.display.move_resize_window(bar, rect)?;
        }
        Ok(())
    }

    fn warn_unknown_layout(&self, index: usize) {
        warn!(
            index,
            available = self.config.layouts.len(),
            "no layout at this index"
        );
    }
}

#[cfg(test)]
pub(crate) mod test_util {
    use super::*;
    use crate::bar::mock::MockRenderer;
    use crate::display::mock::MockDisplay;

    pub type TestWm = WindowManager<MockDisplay, MockRenderer>;

    pub const SCREEN: Rect = Rect::new(0, 0, 1000, 800);

    pub fn config() -> Config {
        Config::default()
    }

    pub fn wm_with_outputs(outputs: Vec<Rect>) -> TestWm {
        WindowManager::new(config(), MockDisplay::new(outputs), MockRenderer::default())
            .expect("window manager starts on the mock display")
    }

    pub fn wm() -> TestWm {
        wm_with_outputs(vec![SCREEN])
    }

    pub fn map(wm: &mut TestWm, window: Window) {
        map_at(wm, window, Rect::new(0, 0, 300, 200));
    }

    pub fn map_at(wm: &mut TestWm, window: Window, geometry: Rect) {
        wm.display.add_window(window, geometry);
        wm.handle_event(DisplayEvent::MapRequest { window })
            .expect("map request is handled");
    }

    pub fn map_with_class(wm: &mut TestWm, window: Window, class: &str) {
        wm.display
            .classes
            .insert(window, (class.to_string(), class.to_lowercase()));
        map(wm, window);
    }

    pub fn geometry(wm: &TestWm, window: Window) -> Rect {
        wm.clients[&window].geometry
    }
}
