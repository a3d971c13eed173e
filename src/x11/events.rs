use x11rb::protocol::Event;
use x11rb::protocol::xproto::*;

use super::X11;
use crate::display::{
    ButtonEvent, ClientRequest, ConfigureRequest, DisplayEvent, PropertyKind, StateAction,
};

const SYNTHETIC_EVENT: u8 = 0x80;

impl X11 {
    pub(super) fn translate(&self, event: Event) -> DisplayEvent {
        match event {
            Event::ButtonPress(e) => DisplayEvent::ButtonPress(ButtonEvent {
                window: e.event,
                x: e.event_x as i32,
                y: e.event_y as i32,
                root_x: e.root_x as i32,
                root_y: e.root_y as i32,
                button: e.detail,
                state: u16::from(e.state),
                time: e.time,
            }),
            Event::ButtonRelease(e) => DisplayEvent::ButtonRelease(ButtonEvent {
                window: e.event,
                x: e.event_x as i32,
                y: e.event_y as i32,
                root_x: e.root_x as i32,
                root_y: e.root_y as i32,
                button: e.detail,
                state: u16::from(e.state),
                time: e.time,
            }),
            Event::ClientMessage(e) => DisplayEvent::ClientMessage {
                window: e.window,
                request: self.client_request(&e),
            },
            Event::ConfigureRequest(e) => DisplayEvent::ConfigureRequest(configure_request(&e)),
            Event::ConfigureNotify(e) => DisplayEvent::ConfigureNotify {
                window: e.window,
                width: e.width as i32,
                height: e.height as i32,
            },
            Event::DestroyNotify(e) => DisplayEvent::DestroyNotify { window: e.window },
            Event::EnterNotify(e) => DisplayEvent::EnterNotify {
                window: e.event,
                normal_mode: e.mode == NotifyMode::NORMAL,
                inferior: e.detail == NotifyDetail::INFERIOR,
            },
            Event::Expose(e) => DisplayEvent::Expose {
                window: e.window,
                count: e.count,
            },
            Event::FocusIn(e) => DisplayEvent::FocusIn { window: e.event },
            Event::KeyPress(e) => DisplayEvent::KeyPress {
                keycode: e.detail,
                state: u16::from(e.state),
            },
            Event::MappingNotify(e) => DisplayEvent::MappingNotify {
                keyboard: e.request == Mapping::KEYBOARD,
            },
            Event::MapRequest(e) => DisplayEvent::MapRequest { window: e.window },
            Event::MotionNotify(e) => DisplayEvent::MotionNotify {
                window: e.event,
                root_x: e.root_x as i32,
                root_y: e.root_y as i32,
                time: e.time,
            },
            Event::PropertyNotify(e) => DisplayEvent::PropertyNotify {
                window: e.window,
                property: self.property_kind(e.atom),
                deleted: e.state == Property::DELETE,
            },
            Event::UnmapNotify(e) => DisplayEvent::UnmapNotify {
                window: e.window,
                synthetic: e.response_type & SYNTHETIC_EVENT != 0,
            },
            _ => DisplayEvent::Unknown,
        }
    }

    fn client_request(&self, event: &ClientMessageEvent) -> ClientRequest {
        let data = event.data.as_data32();
        if event.type_ == self.atoms.net_wm_state {
            let fullscreen = self.atoms.net_wm_state_fullscreen;
            if data[1] != fullscreen && data[2] != fullscreen {
                return ClientRequest::Other;
            }
            let action = match data[0] {
                0 => StateAction::Remove,
                1 => StateAction::Add,
                2 => StateAction::Toggle,
                _ => return ClientRequest::Other,
            };
            ClientRequest::Fullscreen(action)
        } else if event.type_ == self.atoms.net_active_window {
            ClientRequest::Activate
        } else {
            ClientRequest::Other
        }
    }

    fn property_kind(&self, atom: Atom) -> PropertyKind {
        if atom == u32::from(AtomEnum::WM_NAME) || atom == self.atoms.net_wm_name {
            PropertyKind::Name
        } else if atom == u32::from(AtomEnum::WM_NORMAL_HINTS) {
            PropertyKind::NormalHints
        } else if atom == u32::from(AtomEnum::WM_HINTS) {
            PropertyKind::Hints
        } else if atom == u32::from(AtomEnum::WM_TRANSIENT_FOR) {
            PropertyKind::TransientFor
        } else if atom == self.atoms.net_wm_window_type {
            PropertyKind::WindowType
        } else {
            PropertyKind::Other
        }
    }
}

fn configure_request(event: &ConfigureRequestEvent) -> ConfigureRequest {
    let mask = event.value_mask;
    let field = |flag: ConfigWindow, value: i32| mask.contains(flag).then_some(value);

    ConfigureRequest {
        window: event.window,
        x: field(ConfigWindow::X, event.x as i32),
        y: field(ConfigWindow::Y, event.y as i32),
        width: field(ConfigWindow::WIDTH, event.width as i32),
        height: field(ConfigWindow::HEIGHT, event.height as i32),
        border_width: field(ConfigWindow::BORDER_WIDTH, event.border_width as i32),
        sibling: mask.contains(ConfigWindow::SIBLING).then_some(event.sibling),
        stack_mode: mask
            .contains(ConfigWindow::STACK_MODE)
            .then(|| u32::from(event.stack_mode) as u8),
    }
}
