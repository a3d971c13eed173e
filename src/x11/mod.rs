//! The X server side of [`DisplayService`](crate::display::DisplayService).

use std::collections::VecDeque;
use std::ptr::NonNull;

use tracing::{debug, error};
use x11::xlib::{Display, Visual};
use x11rb::connection::Connection;
use x11rb::cursor::Handle as CursorHandle;
use x11rb::protocol::Event;
use x11rb::protocol::xproto::*;
use x11rb::rust_connection::RustConnection;
use x11rb::wrapper::ConnectionExt as _;
use x11rb::x11_utils::X11Error as ProtocolError;
use x11rb::CURRENT_TIME;

use crate::errors::X11Error;
use crate::keyboard::handlers::{self, KeyboardMapping};
use crate::x11::atom::AtomCache;

pub mod atom;
mod events;
mod service;
pub mod xlib_graphic_context;

#[derive(Debug, Copy, Clone)]
pub struct X11Display(NonNull<Display>);

impl X11Display {
    /// # Safety
    /// `display` must be null or a live Xlib connection that outlives the
    /// returned handle.
    pub unsafe fn from_raw(display: *mut Display) -> Option<Self> {
        NonNull::new(display).map(Self)
    }
}

impl AsRef<Display> for X11Display {
    fn as_ref(&self) -> &Display {
        unsafe { self.0.as_ref() }
    }
}

impl AsMut<Display> for X11Display {
    fn as_mut(&mut self) -> &mut Display {
        unsafe { self.0.as_mut() }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct XVisual(NonNull<Visual>);

impl XVisual {
    pub fn from_raw(ptr: *mut Visual) -> Option<XVisual> {
        NonNull::new(ptr).map(XVisual)
    }

    pub fn as_ptr(&self) -> *mut Visual {
        self.0.as_ptr()
    }
}

pub type X11Result<T> = Result<T, X11Error>;

#[derive(Debug, Clone, Copy)]
struct Cursors {
    normal: Cursor,
    moving: Cursor,
    resizing: Cursor,
}

pub struct X11 {
    pub atoms: AtomCache,
    pub connection: RustConnection,
    pub screen_number: usize,
    pub root: Window,
    pub screen: Screen,
    cursors: Cursors,
    keyboard_mapping: KeyboardMapping,
    numlock_mask: u16,
    check_window: Window,
    pending: VecDeque<Event>,
}

impl X11 {
    /// Connects, takes over the root window and publishes EWMH support.
    pub fn new() -> X11Result<X11> {
        let (connection, screen_number) = x11rb::connect(None)?;
        let screen = connection.setup().roots[screen_number].clone();
        let root = screen.root;

        connection
            .change_window_attributes(
                root,
                &ChangeWindowAttributesAux::new().event_mask(EventMask::SUBSTRUCTURE_REDIRECT),
            )?
            .check()
            .map_err(|_| X11Error::OtherWmRunning)?;

        let cursor_handle = CursorHandle::new(
            &connection,
            screen_number,
            &x11rb::resource_manager::new_from_default(&connection)?,
        )?
        .reply()?;
        let cursors = Cursors {
            normal: cursor_handle.load_cursor(&connection, "left_ptr")?,
            moving: cursor_handle.load_cursor(&connection, "fleur")?,
            resizing: cursor_handle.load_cursor(&connection, "sizing")?,
        };

        let atoms = AtomCache::new(&connection)?;
        let keyboard_mapping = handlers::get_keyboard_mapping(&connection)?;
        let numlock_mask = handlers::get_numlock_mask(&connection, &keyboard_mapping)?;

        let check_window = connection.generate_id()?;
        connection.create_window(
            x11rb::COPY_DEPTH_FROM_PARENT,
            check_window,
            root,
            0,
            0,
            1,
            1,
            0,
            WindowClass::INPUT_OUTPUT,
            screen.root_visual,
            &CreateWindowAux::new(),
        )?;

        let x11 = Self {
            atoms,
            connection,
            screen_number,
            root,
            screen,
            cursors,
            keyboard_mapping,
            numlock_mask,
            check_window,
            pending: VecDeque::new(),
        };
        x11.publish_support()?;

        x11.connection
            .change_window_attributes(
                root,
                &ChangeWindowAttributesAux::new()
                    .cursor(cursors.normal)
                    .event_mask(
                        EventMask::SUBSTRUCTURE_REDIRECT
                            | EventMask::SUBSTRUCTURE_NOTIFY
                            | EventMask::BUTTON_PRESS
                            | EventMask::POINTER_MOTION
                            | EventMask::ENTER_WINDOW
                            | EventMask::LEAVE_WINDOW
                            | EventMask::STRUCTURE_NOTIFY
                            | EventMask::PROPERTY_CHANGE,
                    ),
            )?
            .check()?;
        x11.connection.flush()?;

        debug!(screen = screen_number, numlock = x11.numlock_mask, "connected to X server");
        Ok(x11)
    }

    fn publish_support(&self) -> X11Result<()> {
        let atoms = &self.atoms;
        for window in [self.check_window, self.root] {
            self.connection.change_property32(
                PropMode::REPLACE,
                window,
                atoms.net_supporting_wm_check,
                AtomEnum::WINDOW,
                &[self.check_window],
            )?;
        }
        self.connection.change_property8(
            PropMode::REPLACE,
            self.check_window,
            atoms.net_wm_name,
            atoms.utf8_string,
            b"tagwm",
        )?;
        self.connection.change_property32(
            PropMode::REPLACE,
            self.root,
            atoms.net_supported,
            AtomEnum::ATOM,
            &atoms.supported(),
        )?;
        self.connection
            .delete_property(self.root, atoms.net_client_list)?;
        Ok(())
    }

    /// Hands focus back to the root and drops the EWMH check window.
    pub fn cleanup(&mut self) -> X11Result<()> {
        self.connection
            .ungrab_key(Grab::ANY, self.root, ModMask::ANY)?;
        self.connection.destroy_window(self.check_window)?;
        self.connection
            .set_input_focus(InputFocus::POINTER_ROOT, InputFocus::POINTER_ROOT, CURRENT_TIME)?;
        self.connection
            .delete_property(self.root, self.atoms.net_active_window)?;
        for cursor in [self.cursors.normal, self.cursors.moving, self.cursors.resizing] {
            self.connection.free_cursor(cursor)?;
        }
        self.connection.flush()?;
        Ok(())
    }

    fn property(
        &self,
        window: Window,
        property: impl Into<Atom>,
        kind: impl Into<Atom>,
        long_length: u32,
    ) -> Option<GetPropertyReply> {
        self.connection
            .get_property(false, window, property, kind, 0, long_length)
            .ok()?
            .reply()
            .ok()
    }

    fn property32(
        &self,
        window: Window,
        property: impl Into<Atom>,
        kind: impl Into<Atom>,
        long_length: u32,
    ) -> Option<Vec<u32>> {
        let reply = self.property(window, property, kind, long_length)?;
        let words: Vec<u32> = reply.value32()?.collect();
        (!words.is_empty()).then_some(words)
    }

    fn text_property(&self, window: Window, property: impl Into<Atom>) -> Option<String> {
        let reply = self.property(window, property, AtomEnum::ANY, 256)?;
        if reply.value.is_empty() {
            return None;
        }
        let text = String::from_utf8_lossy(&reply.value);
        let text = text.trim_end_matches('\0');
        (!text.is_empty()).then(|| text.to_string())
    }

    fn first_atom(&self, window: Window, property: Atom) -> Option<Atom> {
        self.property32(window, property, AtomEnum::ATOM, 1)?
            .first()
            .copied()
    }

}

/// Swallows the expected races and turns every other protocol error into
/// a fatal one.
pub(crate) fn check_protocol_error(error: &ProtocolError) -> Result<(), X11Error> {
    classify_error(error.error_kind, error.major_opcode, error.bad_value)
}

fn classify_error(
    kind: x11rb::protocol::ErrorKind,
    major_opcode: u8,
    resource: u32,
) -> Result<(), X11Error> {
    if is_expected_error(kind, major_opcode) {
        debug!(?kind, request = major_opcode, resource, "ignoring X error");
        return Ok(());
    }
    error!(?kind, request = major_opcode, resource, "X error");
    Err(X11Error::Protocol {
        kind,
        request: major_opcode,
        resource,
    })
}

/// Errors that windows disappearing under the manager's feet routinely
/// cause.
pub fn is_expected_error(kind: x11rb::protocol::ErrorKind, major_opcode: u8) -> bool {
    use x11rb::protocol::ErrorKind;

    match kind {
        ErrorKind::Window => true,
        ErrorKind::Match => {
            major_opcode == SET_INPUT_FOCUS_REQUEST || major_opcode == CONFIGURE_WINDOW_REQUEST
        }
        ErrorKind::Drawable => matches!(
            major_opcode,
            POLY_TEXT8_REQUEST | POLY_FILL_RECTANGLE_REQUEST | POLY_SEGMENT_REQUEST | COPY_AREA_REQUEST
        ),
        ErrorKind::Access => {
            major_opcode == GRAB_BUTTON_REQUEST || major_opcode == GRAB_KEY_REQUEST
        }
        _ => false,
    }
}
