use tracing::{debug, trace};
use x11rb::protocol::xproto::Window;

use super::WindowManager;
use crate::bar::{ClickTarget, Renderer, classify_click};
use crate::display::{
    ButtonEvent, ClientRequest, ConfigureRequest, DisplayEvent, DisplayService, PropertyKind,
    StateAction, WmState,
};
use crate::errors::WmResult;
use crate::geometry::Rect;
use crate::keyboard::handlers::{self, Arg, Click, KeyAction};

impl<D: DisplayService, R: Renderer> WindowManager<D, R> {
    pub(crate) fn handle_event(&mut self, event: DisplayEvent) -> WmResult<()> {
        trace!(?event, "event");
        match event {
            DisplayEvent::ButtonPress(event) => self.on_button_press(event),
            DisplayEvent::ClientMessage { window, request } => {
                self.on_client_message(window, request)
            }
            DisplayEvent::ConfigureRequest(request) => self.on_configure_request(request),
            DisplayEvent::ConfigureNotify {
                window,
                width,
                height,
            } => self.on_configure_notify(window, width, height),
            DisplayEvent::DestroyNotify { window } => {
                if self.clients.contains_key(&window) {
                    self.unmanage(window, true)?;
                }
                Ok(())
            }
            DisplayEvent::EnterNotify {
                window,
                normal_mode,
                inferior,
            } => self.on_enter(window, normal_mode, inferior),
            DisplayEvent::Expose { window, count } => {
                if count == 0 {
                    let monitor = self.window_to_monitor(window);
                    self.draw_bar(monitor)?;
                }
                Ok(())
            }
            DisplayEvent::FocusIn { window } => {
                // some clients grab focus on their own; take it back
                match self.selected_client() {
                    Some(selected) if selected != window => self.set_focus(selected),
                    _ => Ok(()),
                }
            }
            DisplayEvent::KeyPress { keycode, state } => self.on_key_press(keycode, state),
            DisplayEvent::MappingNotify { keyboard } => {
                self.display.refresh_keyboard_mapping()?;
                if keyboard {
                    self.grab_keys()?;
                }
                Ok(())
            }
            DisplayEvent::MapRequest { window } => {
                let Some(attributes) = self.display.window_attributes(window) else {
                    return Ok(());
                };
                if attributes.override_redirect || self.clients.contains_key(&window) {
                    return Ok(());
                }
                self.manage(window, attributes)
            }
            DisplayEvent::MotionNotify {
                window,
                root_x,
                root_y,
                ..
            } => self.on_motion(window, root_x, root_y),
            DisplayEvent::PropertyNotify {
                window,
                property,
                deleted,
            } => self.on_property(window, property, deleted),
            DisplayEvent::UnmapNotify { window, synthetic } => {
                if !self.clients.contains_key(&window) {
                    return Ok(());
                }
                if synthetic {
                    self.display.set_wm_state(window, WmState::Withdrawn)
                } else {
                    self.unmanage(window, false)
                }
            }
            DisplayEvent::ButtonRelease(_) | DisplayEvent::Unknown => Ok(()),
        }
    }

    /// Makes the monitor under an event current, dropping focus from the
    /// old one.
    fn switch_monitor(&mut self, monitor: usize) -> WmResult<()> {
        if let Some(selected) = self.selected_client() {
            self.unfocus(selected, true)?;
        }
        self.selected_monitor = monitor;
        Ok(())
    }

    fn on_button_press(&mut self, event: ButtonEvent) -> WmResult<()> {
        let monitor = self.window_to_monitor(event.window);
        if monitor != self.selected_monitor {
            self.switch_monitor(monitor)?;
            self.focus(None)?;
        }

        let mut click = Click::RootWin;
        let mut tag_arg = Arg::UInt(0);
        let selected = &self.monitors[self.selected_monitor];
        if selected.bar_window == Some(event.window) {
            let target = classify_click(
                &self.renderer,
                &self.config.tags,
                &selected.layout_symbol,
                &self.status_text,
                selected.work_area.width,
                self.lrpad,
                event.x,
            );
            click = match target {
                ClickTarget::Tag(index) => {
                    tag_arg = Arg::UInt(1 << index);
                    Click::TagBar
                }
                ClickTarget::LayoutSymbol => Click::LtSymbol,
                ClickTarget::StatusText => Click::StatusText,
                ClickTarget::WindowTitle => Click::WinTitle,
            };
        } else if self.clients.contains_key(&event.window) {
            self.focus(Some(event.window))?;
            self.restack(self.selected_monitor)?;
            self.display.replay_pointer()?;
            click = Click::ClientWin;
        }

        let actions: Vec<(KeyAction, Arg)> = handlers::matching_buttons(
            &self.config.buttons,
            click,
            event.button,
            event.state,
            self.numlock_mask,
        )
        .map(|binding| {
            let arg = if click == Click::TagBar && is_zero(&binding.arg) {
                tag_arg.clone()
            } else {
                binding.arg.clone()
            };
            (binding.func, arg)
        })
        .collect();

        for (action, arg) in actions {
            debug!(?click, ?action, ?arg, "button binding");
            self.run_action(action, &arg)?;
        }
        Ok(())
    }

    fn on_client_message(&mut self, window: Window, request: ClientRequest) -> WmResult<()> {
        let Some(client) = self.clients.get(&window) else {
            return Ok(());
        };
        match request {
            ClientRequest::Fullscreen(action) => {
                let fullscreen = match action {
                    StateAction::Add => true,
                    StateAction::Remove => false,
                    StateAction::Toggle => !client.is_fullscreen,
                };
                self.set_fullscreen(window, fullscreen)
            }
            ClientRequest::Activate => {
                if self.selected_client() != Some(window) && !client.is_urgent {
                    self.set_urgent(window, true)?;
                }
                Ok(())
            }
            ClientRequest::Other => Ok(()),
        }
    }

    fn on_configure_request(&mut self, request: ConfigureRequest) -> WmResult<()> {
        if !self.clients.contains_key(&request.window) {
            self.display.configure_unmanaged(&request)?;
            return self.display.flush();
        }

        let arranges = self.layout_arranges(self.selected_monitor);
        let visible = self.is_visible(request.window);
        let Some(client) = self.clients.get_mut(&request.window) else {
            return Ok(());
        };

        if let Some(border_width) = request.border_width {
            client.border_width = border_width;
        } else if client.is_floating || !arranges {
            let screen = self.monitors[client.monitor_index].screen;
            if let Some(x) = request.x {
                client.old_geometry.x = client.geometry.x;
                client.geometry.x = screen.x + x;
            }
            if let Some(y) = request.y {
                client.old_geometry.y = client.geometry.y;
                client.geometry.y = screen.y + y;
            }
            if let Some(width) = request.width {
                client.old_geometry.width = client.geometry.width;
                client.geometry.width = width;
            }
            if let Some(height) = request.height {
                client.old_geometry.height = client.geometry.height;
                client.geometry.height = height;
            }

            if client.is_floating && client.geometry.x + client.geometry.width > screen.right() {
                client.geometry.x = screen.x + (screen.width / 2 - client.outer_width() / 2);
            }
            if client.is_floating && client.geometry.y + client.geometry.height > screen.bottom()
            {
                client.geometry.y = screen.y + (screen.height / 2 - client.outer_height() / 2);
            }

            let geometry = client.geometry;
            let border_width = client.border_width;
            let moved = request.x.is_some() || request.y.is_some();
            let resized = request.width.is_some() || request.height.is_some();
            if moved && !resized {
                self.display
                    .send_configure_notify(request.window, geometry, border_width)?;
            }
            if visible {
                self.display.move_resize_window(request.window, geometry)?;
            }
        } else {
            let geometry = client.geometry;
            let border_width = client.border_width;
            self.display
                .send_configure_notify(request.window, geometry, border_width)?;
        }
        self.display.flush()
    }

    fn on_configure_notify(&mut self, window: Window, width: i32, height: i32) -> WmResult<()> {
        if window != self.display.root() {
            return Ok(());
        }

        let resized = self.screen_width != width || self.screen_height != height;
        self.screen_width = width;
        self.screen_height = height;
        if !self.update_geometry()? && !resized {
            return Ok(());
        }

        debug!(width, height, "screen changed");
        self.renderer.resize(width, self.bar_height);
        self.update_bars()?;
        for index in 0..self.monitors.len() {
            let screen = self.monitors[index].screen;
            let fullscreen: Vec<Window> = self.monitors[index]
                .clients
                .iter()
                .copied()
                .filter(|w| self.clients.get(w).is_some_and(|c| c.is_fullscreen))
                .collect();
            for window in fullscreen {
                self.resize_client(window, screen)?;
            }
            self.move_bar(index)?;
        }
        self.focus(None)?;
        self.arrange(None)
    }

    fn on_enter(&mut self, window: Window, normal_mode: bool, inferior: bool) -> WmResult<()> {
        if (!normal_mode || inferior) && window != self.display.root() {
            return Ok(());
        }

        let client = self.clients.get(&window).map(|c| c.window);
        let monitor = match client.and_then(|w| self.clients.get(&w)) {
            Some(client) => client.monitor_index,
            None => self.window_to_monitor(window),
        };

        if monitor != self.selected_monitor {
            self.switch_monitor(monitor)?;
        } else if client.is_none() || client == self.selected_client() {
            return Ok(());
        }
        self.focus(client)
    }

    fn on_key_press(&mut self, keycode: u8, state: u16) -> WmResult<()> {
        let keysym = self.display.keysym_for_keycode(keycode);
        let actions: Vec<(KeyAction, Arg)> =
            handlers::matching_keys(&self.config.keybindings, keysym, state, self.numlock_mask)
                .map(|binding| (binding.func, binding.arg.clone()))
                .collect();

        for (action, arg) in actions {
            debug!(keycode, ?action, ?arg, "key binding");
            self.run_action(action, &arg)?;
        }
        Ok(())
    }

    fn on_motion(&mut self, window: Window, root_x: i32, root_y: i32) -> WmResult<()> {
        if window != self.display.root() {
            return Ok(());
        }

        let monitor = self.rect_to_monitor(Rect::new(root_x, root_y, 1, 1));
        if let Some(last) = self.last_motion_monitor
            && last != monitor
        {
            self.switch_monitor(monitor)?;
            self.focus(None)?;
        }
        self.last_motion_monitor = Some(monitor);
        Ok(())
    }

    fn on_property(&mut self, window: Window, property: PropertyKind, deleted: bool) -> WmResult<()> {
        if window == self.display.root() && property == PropertyKind::Name {
            return self.update_status();
        }
        if deleted {
            return Ok(());
        }
        let Some(client) = self.clients.get(&window) else {
            return Ok(());
        };
        let monitor = client.monitor_index;

        match property {
            PropertyKind::TransientFor => {
                let parent_managed = self
                    .display
                    .transient_for(window)
                    .is_some_and(|parent| self.clients.contains_key(&parent));
                if !client.is_floating && parent_managed {
                    if let Some(client) = self.clients.get_mut(&window) {
                        client.is_floating = true;
                    }
                    self.arrange(Some(monitor))?;
                }
            }
            PropertyKind::NormalHints => self.update_size_hints(window),
            PropertyKind::Hints => {
                self.update_wm_hints(window)?;
                self.draw_bars()?;
            }
            PropertyKind::Name => {
                self.update_title(window);
                if self.monitors[monitor].selected_client == Some(window) {
                    self.draw_bar(monitor)?;
                }
            }
            PropertyKind::WindowType => self.update_window_type(window)?,
            PropertyKind::Other => {}
        }
        Ok(())
    }
}

/// Tag-bar bindings with an empty argument act on the clicked tag.
fn is_zero(arg: &Arg) -> bool {
    matches!(arg, Arg::None | Arg::Int(0) | Arg::UInt(0))
}
