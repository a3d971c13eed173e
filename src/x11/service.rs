use tracing::debug;
use x11rb::connection::Connection;
use x11rb::protocol::Event;
use x11rb::protocol::xinerama::ConnectionExt as _;
use x11rb::protocol::xproto::*;
use x11rb::wrapper::ConnectionExt as _;
use x11rb::{CURRENT_TIME, NONE};

use super::{X11, check_protocol_error};
use crate::display::{
    ButtonGrab, ConfigureRequest, CursorShape, DisplayEvent, DisplayService, Protocol,
    WindowAttributes, WindowType, WmState,
};
use crate::errors::WmResult;
use crate::geometry::Rect;
use crate::keyboard::handlers::{self, lock_variants};
use crate::keyboard::keysyms::Keysym;
use crate::size_hints::{WmHints, WmSizeHints, flags, offset};

impl X11 {
    fn protocol_atom(&self, protocol: Protocol) -> Atom {
        match protocol {
            Protocol::DeleteWindow => self.atoms.wm_delete_window,
            Protocol::TakeFocus => self.atoms.wm_take_focus,
        }
    }

    fn wm_hints_words(&self, window: Window) -> Option<Vec<u32>> {
        self.property32(window, AtomEnum::WM_HINTS, AtomEnum::WM_HINTS, 9)
    }
}

impl DisplayService for X11 {
    fn root(&self) -> Window {
        self.root
    }

    fn screen_size(&self) -> (i32, i32) {
        (
            self.screen.width_in_pixels as i32,
            self.screen.height_in_pixels as i32,
        )
    }

    fn outputs(&self) -> WmResult<Option<Vec<Rect>>> {
        let xinerama_active = self
            .connection
            .xinerama_is_active()
            .ok()
            .and_then(|cookie| cookie.reply().ok())
            .is_some_and(|reply| reply.state != 0);
        if !xinerama_active {
            return Ok(None);
        }

        let reply = self.connection.xinerama_query_screens()?.reply()?;
        let outputs = reply
            .screen_info
            .iter()
            .filter(|info| info.width > 0 && info.height > 0)
            .map(|info| {
                Rect::new(
                    info.x_org as i32,
                    info.y_org as i32,
                    info.width as i32,
                    info.height as i32,
                )
            })
            .collect::<Vec<_>>();

        Ok((!outputs.is_empty()).then_some(outputs))
    }

    fn next_event(&mut self) -> WmResult<DisplayEvent> {
        let event = match self.pending.pop_front() {
            Some(event) => event,
            None => self.connection.wait_for_event()?,
        };
        if let Event::ConfigureNotify(e) = &event
            && e.window == self.root
        {
            self.screen.width_in_pixels = e.width;
            self.screen.height_in_pixels = e.height;
        }
        if let Event::Error(error) = &event {
            check_protocol_error(error)?;
        }
        Ok(self.translate(event))
    }

    fn flush(&mut self) -> WmResult<()> {
        self.connection.flush()?;
        Ok(())
    }

    fn sync_and_drop_enter_events(&mut self) -> WmResult<()> {
        self.connection.sync()?;
        while let Some(event) = self.connection.poll_for_event()? {
            if !matches!(event, Event::EnterNotify(_)) {
                self.pending.push_back(event);
            }
        }
        Ok(())
    }

    fn window_attributes(&self, window: Window) -> Option<WindowAttributes> {
        let attributes = self
            .connection
            .get_window_attributes(window)
            .ok()?
            .reply()
            .ok()?;
        let geometry = self.connection.get_geometry(window).ok()?.reply().ok()?;
        Some(WindowAttributes {
            geometry: Rect::new(
                geometry.x as i32,
                geometry.y as i32,
                geometry.width as i32,
                geometry.height as i32,
            ),
            border_width: geometry.border_width as i32,
            override_redirect: attributes.override_redirect,
            viewable: attributes.map_state == MapState::VIEWABLE,
        })
    }

    fn top_level_windows(&self) -> WmResult<Vec<Window>> {
        Ok(self.connection.query_tree(self.root)?.reply()?.children)
    }

    fn window_title(&self, window: Window) -> Option<String> {
        self.text_property(window, self.atoms.net_wm_name)
            .or_else(|| self.text_property(window, AtomEnum::WM_NAME))
    }

    fn root_name(&self) -> Option<String> {
        self.text_property(self.root, AtomEnum::WM_NAME)
    }

    fn window_class(&self, window: Window) -> Option<(String, String)> {
        let reply = self.property(window, AtomEnum::WM_CLASS, AtomEnum::STRING, 256)?;
        let mut parts = reply
            .value
            .split(|&byte| byte == 0)
            .map(|part| String::from_utf8_lossy(part).into_owned());
        let instance = parts.next()?;
        let class = parts.next().unwrap_or_default();
        Some((class, instance))
    }

    fn transient_for(&self, window: Window) -> Option<Window> {
        self.property32(window, AtomEnum::WM_TRANSIENT_FOR, AtomEnum::WINDOW, 1)?
            .first()
            .copied()
            .filter(|&parent| parent != NONE)
    }

    fn size_hints(&self, window: Window) -> Option<WmSizeHints> {
        let words = self.property32(
            window,
            AtomEnum::WM_NORMAL_HINTS,
            AtomEnum::WM_SIZE_HINTS,
            offset::WORD_COUNT as u32,
        )?;
        WmSizeHints::from_words(&words)
    }

    fn wm_hints(&self, window: Window) -> Option<WmHints> {
        WmHints::from_words(&self.wm_hints_words(window)?)
    }

    fn window_type(&self, window: Window) -> WindowType {
        WindowType {
            fullscreen: self.first_atom(window, self.atoms.net_wm_state)
                == Some(self.atoms.net_wm_state_fullscreen),
            dialog: self.first_atom(window, self.atoms.net_wm_window_type)
                == Some(self.atoms.net_wm_window_type_dialog),
        }
    }

    fn wm_state(&self, window: Window) -> Option<WmState> {
        let words = self.property32(window, self.atoms.wm_state, self.atoms.wm_state, 2)?;
        match words.first()? {
            0 => Some(WmState::Withdrawn),
            1 => Some(WmState::Normal),
            3 => Some(WmState::Iconic),
            _ => None,
        }
    }

    fn supports_protocol(&self, window: Window, protocol: Protocol) -> bool {
        let wanted = self.protocol_atom(protocol);
        self.property32(window, self.atoms.wm_protocols, AtomEnum::ATOM, 64)
            .is_some_and(|atoms| atoms.contains(&wanted))
    }

    fn pointer_position(&self) -> Option<(i32, i32)> {
        let reply = self.connection.query_pointer(self.root).ok()?.reply().ok()?;
        Some((reply.root_x as i32, reply.root_y as i32))
    }

    fn keysym_for_keycode(&self, keycode: u8) -> Keysym {
        self.keyboard_mapping.keycode_to_keysym(keycode)
    }

    fn refresh_keyboard_mapping(&mut self) -> WmResult<()> {
        self.keyboard_mapping = handlers::get_keyboard_mapping(&self.connection)?;
        self.numlock_mask = handlers::get_numlock_mask(&self.connection, &self.keyboard_mapping)?;
        Ok(())
    }

    fn numlock_mask(&self) -> u16 {
        self.numlock_mask
    }

    fn select_client_input(&mut self, window: Window) -> WmResult<()> {
        self.connection.change_window_attributes(
            window,
            &ChangeWindowAttributesAux::new().event_mask(
                EventMask::ENTER_WINDOW
                    | EventMask::FOCUS_CHANGE
                    | EventMask::PROPERTY_CHANGE
                    | EventMask::STRUCTURE_NOTIFY,
            ),
        )?;
        Ok(())
    }

    fn configure_window(&mut self, window: Window, rect: Rect, border_width: i32) -> WmResult<()> {
        self.connection.configure_window(
            window,
            &ConfigureWindowAux::new()
                .x(rect.x)
                .y(rect.y)
                .width(rect.width as u32)
                .height(rect.height as u32)
                .border_width(border_width as u32),
        )?;
        Ok(())
    }

    fn send_configure_notify(
        &mut self,
        window: Window,
        rect: Rect,
        border_width: i32,
    ) -> WmResult<()> {
        let event = ConfigureNotifyEvent {
            response_type: CONFIGURE_NOTIFY_EVENT,
            sequence: 0,
            event: window,
            window,
            above_sibling: NONE,
            x: rect.x as i16,
            y: rect.y as i16,
            width: rect.width as u16,
            height: rect.height as u16,
            border_width: border_width as u16,
            override_redirect: false,
        };
        self.connection
            .send_event(false, window, EventMask::STRUCTURE_NOTIFY, event)?;
        Ok(())
    }

    fn configure_unmanaged(&mut self, request: &ConfigureRequest) -> WmResult<()> {
        let mut aux = ConfigureWindowAux::new();
        aux.x = request.x;
        aux.y = request.y;
        aux.width = request.width.map(|width| width as u32);
        aux.height = request.height.map(|height| height as u32);
        aux.border_width = request.border_width.map(|border| border as u32);
        aux.sibling = request.sibling;
        aux.stack_mode = request.stack_mode.map(StackMode::from);
        self.connection.configure_window(request.window, &aux)?;
        self.connection.sync()?;
        Ok(())
    }

    fn move_window(&mut self, window: Window, x: i32, y: i32) -> WmResult<()> {
        self.connection
            .configure_window(window, &ConfigureWindowAux::new().x(x).y(y))?;
        Ok(())
    }

    fn move_resize_window(&mut self, window: Window, rect: Rect) -> WmResult<()> {
        self.connection.configure_window(
            window,
            &ConfigureWindowAux::new()
                .x(rect.x)
                .y(rect.y)
                .width(rect.width.max(1) as u32)
                .height(rect.height.max(1) as u32),
        )?;
        Ok(())
    }

    fn set_border_width(&mut self, window: Window, border_width: i32) -> WmResult<()> {
        self.connection.configure_window(
            window,
            &ConfigureWindowAux::new().border_width(border_width as u32),
        )?;
        Ok(())
    }

    fn set_border_color(&mut self, window: Window, color: u32) -> WmResult<()> {
        self.connection.change_window_attributes(
            window,
            &ChangeWindowAttributesAux::new().border_pixel(color),
        )?;
        Ok(())
    }

    fn raise_window(&mut self, window: Window) -> WmResult<()> {
        self.connection.configure_window(
            window,
            &ConfigureWindowAux::new().stack_mode(StackMode::ABOVE),
        )?;
        Ok(())
    }

    fn stack_below(&mut self, window: Window, sibling: Window) -> WmResult<()> {
        self.connection.configure_window(
            window,
            &ConfigureWindowAux::new()
                .sibling(sibling)
                .stack_mode(StackMode::BELOW),
        )?;
        Ok(())
    }

    fn map_window(&mut self, window: Window) -> WmResult<()> {
        self.connection.map_window(window)?;
        Ok(())
    }

    fn set_wm_state(&mut self, window: Window, state: WmState) -> WmResult<()> {
        self.connection.change_property32(
            PropMode::REPLACE,
            window,
            self.atoms.wm_state,
            self.atoms.wm_state,
            &[state as u32, NONE],
        )?;
        Ok(())
    }

    fn set_fullscreen_state(&mut self, window: Window, fullscreen: bool) -> WmResult<()> {
        let state: &[u32] = if fullscreen {
            &[self.atoms.net_wm_state_fullscreen]
        } else {
            &[]
        };
        self.connection.change_property32(
            PropMode::REPLACE,
            window,
            self.atoms.net_wm_state,
            AtomEnum::ATOM,
            state,
        )?;
        Ok(())
    }

    fn set_urgency_hint(&mut self, window: Window, urgent: bool) -> WmResult<()> {
        let Some(mut words) = self.wm_hints_words(window) else {
            return Ok(());
        };
        if urgent {
            words[0] |= flags::URGENCY_HINT;
        } else {
            words[0] &= !flags::URGENCY_HINT;
        }
        self.connection.change_property32(
            PropMode::REPLACE,
            window,
            AtomEnum::WM_HINTS,
            AtomEnum::WM_HINTS,
            &words,
        )?;
        Ok(())
    }

    fn set_input_focus(&mut self, window: Window) -> WmResult<()> {
        self.connection
            .set_input_focus(InputFocus::POINTER_ROOT, window, CURRENT_TIME)?;
        Ok(())
    }

    fn set_active_window(&mut self, window: Option<Window>) -> WmResult<()> {
        match window {
            Some(window) => {
                self.connection.change_property32(
                    PropMode::REPLACE,
                    self.root,
                    self.atoms.net_active_window,
                    AtomEnum::WINDOW,
                    &[window],
                )?;
            }
            None => {
                self.connection
                    .delete_property(self.root, self.atoms.net_active_window)?;
            }
        }
        Ok(())
    }

    fn append_client_list(&mut self, window: Window) -> WmResult<()> {
        self.connection.change_property32(
            PropMode::APPEND,
            self.root,
            self.atoms.net_client_list,
            AtomEnum::WINDOW,
            &[window],
        )?;
        Ok(())
    }

    fn set_client_list(&mut self, windows: &[Window]) -> WmResult<()> {
        self.connection.change_property32(
            PropMode::REPLACE,
            self.root,
            self.atoms.net_client_list,
            AtomEnum::WINDOW,
            windows,
        )?;
        Ok(())
    }

    fn send_protocol(&mut self, window: Window, protocol: Protocol) -> WmResult<bool> {
        if !self.supports_protocol(window, protocol) {
            return Ok(false);
        }
        let event = ClientMessageEvent::new(
            32,
            window,
            self.atoms.wm_protocols,
            [self.protocol_atom(protocol), CURRENT_TIME, 0, 0, 0],
        );
        self.connection
            .send_event(false, window, EventMask::NO_EVENT, event)?;
        Ok(true)
    }

    fn kill_client(&mut self, window: Window) -> WmResult<()> {
        self.connection.grab_server()?;
        self.connection.set_close_down_mode(CloseDown::DESTROY_ALL)?;
        self.connection.kill_client(window)?;
        self.connection.sync()?;
        self.connection.ungrab_server()?;
        Ok(())
    }

    fn grab_server(&mut self) -> WmResult<()> {
        self.connection.grab_server()?;
        Ok(())
    }

    fn ungrab_server(&mut self) -> WmResult<()> {
        self.connection.ungrab_server()?;
        self.connection.sync()?;
        Ok(())
    }

    fn grab_buttons(
        &mut self,
        window: Window,
        focused: bool,
        buttons: &[ButtonGrab],
        numlock_mask: u16,
    ) -> WmResult<()> {
        let mask = EventMask::BUTTON_PRESS | EventMask::BUTTON_RELEASE;
        self.connection
            .ungrab_button(ButtonIndex::ANY, window, ModMask::ANY)?;
        if !focused {
            self.connection.grab_button(
                false,
                window,
                mask,
                GrabMode::SYNC,
                GrabMode::SYNC,
                NONE,
                NONE,
                ButtonIndex::ANY,
                ModMask::ANY,
            )?;
        }
        for grab in buttons {
            for lock in lock_variants(numlock_mask) {
                self.connection.grab_button(
                    false,
                    window,
                    mask,
                    GrabMode::ASYNC,
                    GrabMode::SYNC,
                    NONE,
                    NONE,
                    ButtonIndex::from(grab.button),
                    ModMask::from(grab.modifiers | lock),
                )?;
            }
        }
        Ok(())
    }

    fn ungrab_buttons(&mut self, window: Window) -> WmResult<()> {
        self.connection
            .ungrab_button(ButtonIndex::ANY, window, ModMask::ANY)?;
        Ok(())
    }

    fn grab_keys(&mut self, keys: &[(u16, Keysym)], numlock_mask: u16) -> WmResult<()> {
        handlers::grab_keys(
            &self.connection,
            self.root,
            &self.keyboard_mapping,
            keys,
            numlock_mask,
        )?;
        debug!(count = keys.len(), "grabbed keys");
        Ok(())
    }

    fn ungrab_keys(&mut self) -> WmResult<()> {
        self.connection
            .ungrab_key(Grab::ANY, self.root, ModMask::ANY)?;
        Ok(())
    }

    fn replay_pointer(&mut self) -> WmResult<()> {
        self.connection
            .allow_events(Allow::REPLAY_POINTER, CURRENT_TIME)?;
        Ok(())
    }

    fn grab_pointer(&mut self, cursor: CursorShape) -> WmResult<bool> {
        let cursor = match cursor {
            CursorShape::Normal => self.cursors.normal,
            CursorShape::Move => self.cursors.moving,
            CursorShape::Resize => self.cursors.resizing,
        };
        let reply = self
            .connection
            .grab_pointer(
                false,
                self.root,
                EventMask::BUTTON_PRESS | EventMask::BUTTON_RELEASE | EventMask::POINTER_MOTION,
                GrabMode::ASYNC,
                GrabMode::ASYNC,
                NONE,
                cursor,
                CURRENT_TIME,
            )?
            .reply()?;
        Ok(reply.status == GrabStatus::SUCCESS)
    }

    fn ungrab_pointer(&mut self) -> WmResult<()> {
        self.connection.ungrab_pointer(CURRENT_TIME)?;
        Ok(())
    }

    fn warp_pointer(&mut self, window: Window, x: i32, y: i32) -> WmResult<()> {
        self.connection
            .warp_pointer(NONE, window, 0, 0, 0, 0, x as i16, y as i16)?;
        Ok(())
    }

    fn create_bar_window(&mut self, rect: Rect) -> WmResult<Window> {
        let window = self.connection.generate_id()?;
        self.connection.create_window(
            x11rb::COPY_DEPTH_FROM_PARENT,
            window,
            self.root,
            rect.x as i16,
            rect.y as i16,
            rect.width.max(1) as u16,
            rect.height.max(1) as u16,
            0,
            WindowClass::COPY_FROM_PARENT,
            self.screen.root_visual,
            &CreateWindowAux::new()
                .override_redirect(1)
                .background_pixmap(u32::from(BackPixmap::PARENT_RELATIVE))
                .event_mask(EventMask::BUTTON_PRESS | EventMask::EXPOSURE)
                .cursor(self.cursors.normal),
        )?;
        self.connection.change_property8(
            PropMode::REPLACE,
            window,
            AtomEnum::WM_CLASS,
            AtomEnum::STRING,
            b"tagwm\0tagwm\0",
        )?;
        self.connection.map_window(window)?;
        self.connection.configure_window(
            window,
            &ConfigureWindowAux::new().stack_mode(StackMode::ABOVE),
        )?;
        Ok(window)
    }

    fn destroy_window(&mut self, window: Window) -> WmResult<()> {
        self.connection.unmap_window(window)?;
        self.connection.destroy_window(window)?;
        Ok(())
    }
}
