//! The window system as seen by the manager.
//!
//! Everything the core needs from the X server goes through
//! [`DisplayService`]. The production implementation lives in
//! [`crate::x11::X11`]; tests drive the core through [`mock::MockDisplay`].

use x11rb::protocol::xproto::Window;

use crate::errors::WmResult;
use crate::geometry::Rect;
use crate::keyboard::keysyms::Keysym;
use crate::size_hints::{WmHints, WmSizeHints};

/// ICCCM `WM_STATE` values.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WmState {
    Withdrawn = 0,
    Normal = 1,
    Iconic = 3,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Protocol {
    DeleteWindow,
    TakeFocus,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CursorShape {
    Normal,
    Move,
    Resize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WindowAttributes {
    pub geometry: Rect,
    pub border_width: i32,
    pub override_redirect: bool,
    pub viewable: bool,
}

/// `_NET_WM_STATE` and `_NET_WM_WINDOW_TYPE` facts relevant to placement.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct WindowType {
    pub fullscreen: bool,
    pub dialog: bool,
}

/// Fields of a ConfigureRequest, `None` where the value mask left them out.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ConfigureRequest {
    pub window: Window,
    pub x: Option<i32>,
    pub y: Option<i32>,
    pub width: Option<i32>,
    pub height: Option<i32>,
    pub border_width: Option<i32>,
    pub sibling: Option<Window>,
    pub stack_mode: Option<u8>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StateAction {
    Remove,
    Add,
    Toggle,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClientRequest {
    Fullscreen(StateAction),
    Activate,
    Other,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PropertyKind {
    Name,
    NormalHints,
    Hints,
    TransientFor,
    WindowType,
    Other,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ButtonEvent {
    pub window: Window,
    pub x: i32,
    pub y: i32,
    pub root_x: i32,
    pub root_y: i32,
    pub button: u8,
    pub state: u16,
    pub time: u32,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DisplayEvent {
    ButtonPress(ButtonEvent),
    ButtonRelease(ButtonEvent),
    ClientMessage {
        window: Window,
        request: ClientRequest,
    },
    ConfigureRequest(ConfigureRequest),
    ConfigureNotify {
        window: Window,
        width: i32,
        height: i32,
    },
    DestroyNotify {
        window: Window,
    },
    EnterNotify {
        window: Window,
        normal_mode: bool,
        inferior: bool,
    },
    Expose {
        window: Window,
        count: u16,
    },
    FocusIn {
        window: Window,
    },
    KeyPress {
        keycode: u8,
        state: u16,
    },
    MappingNotify {
        keyboard: bool,
    },
    MapRequest {
        window: Window,
    },
    MotionNotify {
        window: Window,
        root_x: i32,
        root_y: i32,
        time: u32,
    },
    PropertyNotify {
        window: Window,
        property: PropertyKind,
        deleted: bool,
    },
    UnmapNotify {
        window: Window,
        synthetic: bool,
    },
    Unknown,
}

/// A button grab on a client window, before lock-modifier expansion.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ButtonGrab {
    pub button: u8,
    pub modifiers: u16,
}

pub trait DisplayService {
    fn root(&self) -> Window;
    fn screen_size(&self) -> (i32, i32);
    /// Output rectangles, or `None` when the server has no multi-head
    /// extension active.
    fn outputs(&self) -> WmResult<Option<Vec<Rect>>>;

    fn next_event(&mut self) -> WmResult<DisplayEvent>;
    fn flush(&mut self) -> WmResult<()>;
    /// Waits for the server to process all requests and throws away the
    /// EnterNotify events they caused.
    fn sync_and_drop_enter_events(&mut self) -> WmResult<()>;

    fn window_attributes(&self, window: Window) -> Option<WindowAttributes>;
    fn top_level_windows(&self) -> WmResult<Vec<Window>>;
    fn window_title(&self, window: Window) -> Option<String>;
    fn root_name(&self) -> Option<String>;
    /// `(class, instance)` from `WM_CLASS`.
    fn window_class(&self, window: Window) -> Option<(String, String)>;
    fn transient_for(&self, window: Window) -> Option<Window>;
    fn size_hints(&self, window: Window) -> Option<WmSizeHints>;
    fn wm_hints(&self, window: Window) -> Option<WmHints>;
    fn window_type(&self, window: Window) -> WindowType;
    fn wm_state(&self, window: Window) -> Option<WmState>;
    fn supports_protocol(&self, window: Window, protocol: Protocol) -> bool;
    fn pointer_position(&self) -> Option<(i32, i32)>;

    fn keysym_for_keycode(&self, keycode: u8) -> Keysym;
    fn refresh_keyboard_mapping(&mut self) -> WmResult<()>;
    fn numlock_mask(&self) -> u16;

    fn select_client_input(&mut self, window: Window) -> WmResult<()>;
    fn configure_window(&mut self, window: Window, rect: Rect, border_width: i32) -> WmResult<()>;
    fn send_configure_notify(
        &mut self,
        window: Window,
        rect: Rect,
        border_width: i32,
    ) -> WmResult<()>;
    fn configure_unmanaged(&mut self, request: &ConfigureRequest) -> WmResult<()>;
    fn move_window(&mut self, window: Window, x: i32, y: i32) -> WmResult<()>;
    fn move_resize_window(&mut self, window: Window, rect: Rect) -> WmResult<()>;
    fn set_border_width(&mut self, window: Window, border_width: i32) -> WmResult<()>;
    fn set_border_color(&mut self, window: Window, color: u32) -> WmResult<()>;
    fn raise_window(&mut self, window: Window) -> WmResult<()>;
    fn stack_below(&mut self, window: Window, sibling: Window) -> WmResult<()>;
    fn map_window(&mut self, window: Window) -> WmResult<()>;

    fn set_wm_state(&mut self, window: Window, state: WmState) -> WmResult<()>;
    fn set_fullscreen_state(&mut self, window: Window, fullscreen: bool) -> WmResult<()>;
    fn set_urgency_hint(&mut self, window: Window, urgent: bool) -> WmResult<()>;
    fn set_input_focus(&mut self, window: Window) -> WmResult<()>;
    fn set_active_window(&mut self, window: Option<Window>) -> WmResult<()>;
    fn append_client_list(&mut self, window: Window) -> WmResult<()>;
    fn set_client_list(&mut self, windows: &[Window]) -> WmResult<()>;
    /// Sends a `WM_PROTOCOLS` message; `false` when the client does not
    /// take part in that protocol.
    fn send_protocol(&mut self, window: Window, protocol: Protocol) -> WmResult<bool>;
    fn kill_client(&mut self, window: Window) -> WmResult<()>;

    fn grab_server(&mut self) -> WmResult<()>;
    fn ungrab_server(&mut self) -> WmResult<()>;

    fn grab_buttons(
        &mut self,
        window: Window,
        focused: bool,
        buttons: &[ButtonGrab],
        numlock_mask: u16,
    ) -> WmResult<()>;
    fn ungrab_buttons(&mut self, window: Window) -> WmResult<()>;
    fn grab_keys(&mut self, keys: &[(u16, Keysym)], numlock_mask: u16) -> WmResult<()>;
    fn ungrab_keys(&mut self) -> WmResult<()>;
    /// Lets a frozen button press through to the client.
    fn replay_pointer(&mut self) -> WmResult<()>;
    fn grab_pointer(&mut self, cursor: CursorShape) -> WmResult<bool>;
    fn ungrab_pointer(&mut self) -> WmResult<()>;
    fn warp_pointer(&mut self, window: Window, x: i32, y: i32) -> WmResult<()>;

    fn create_bar_window(&mut self, rect: Rect) -> WmResult<Window>;
    fn destroy_window(&mut self, window: Window) -> WmResult<()>;
}

#[cfg(test)]
pub mod mock {
    use std::collections::{HashMap, VecDeque};

    use super::*;

    /// Requests the mock saw, in order.
    #[derive(Debug, Clone, PartialEq)]
    pub enum Call {
        Configure(Window, Rect, i32),
        ConfigureNotify(Window, Rect),
        ConfigureUnmanaged(Window),
        Move(Window, i32, i32),
        MoveResize(Window, Rect),
        BorderWidth(Window, i32),
        BorderColor(Window, u32),
        Raise(Window),
        StackBelow(Window, Window),
        Map(Window),
        WmState(Window, WmState),
        FullscreenState(Window, bool),
        UrgencyHint(Window, bool),
        InputFocus(Window),
        ActiveWindow(Option<Window>),
        AppendClientList(Window),
        ClientList(Vec<Window>),
        Protocol(Window, Protocol),
        Kill(Window),
        GrabButtons(Window, bool),
        UngrabButtons(Window),
        GrabKeys(usize),
        ReplayPointer,
        GrabPointer(CursorShape),
        UngrabPointer,
        WarpPointer(Window, i32, i32),
        CreateBar(Window),
        Destroy(Window),
        SelectInput(Window),
    }

    pub const ROOT: Window = 1;

    /// Records requests and answers queries from canned tables.
    #[derive(Debug, Default)]
    pub struct MockDisplay {
        pub screen: (i32, i32),
        pub outputs: Option<Vec<Rect>>,
        pub calls: Vec<Call>,
        pub events: VecDeque<DisplayEvent>,
        pub attributes: HashMap<Window, WindowAttributes>,
        pub titles: HashMap<Window, String>,
        pub classes: HashMap<Window, (String, String)>,
        pub transients: HashMap<Window, Window>,
        pub size_hints: HashMap<Window, WmSizeHints>,
        pub wm_hints: HashMap<Window, WmHints>,
        pub window_types: HashMap<Window, WindowType>,
        pub protocols: HashMap<Window, Vec<Protocol>>,
        pub keysyms: HashMap<u8, Keysym>,
        pub pointer: Option<(i32, i32)>,
        pub root_name: Option<String>,
        pub numlock: u16,
        pub refuse_pointer_grab: bool,
        next_bar: Window,
    }

    impl MockDisplay {
        pub fn new(outputs: Vec<Rect>) -> Self {
            let screen = outputs
                .iter()
                .fold((0, 0), |(w, h), r| (w.max(r.right()), h.max(r.bottom())));
            Self {
                screen,
                outputs: Some(outputs),
                pointer: Some((0, 0)),
                numlock: 1 << 4,
                next_bar: 9000,
                ..Self::default()
            }
        }

        pub fn add_window(&mut self, window: Window, geometry: Rect) {
            self.attributes.insert(
                window,
                WindowAttributes {
                    geometry,
                    border_width: 0,
                    override_redirect: false,
                    viewable: true,
                },
            );
        }

        pub fn clear_calls(&mut self) {
            self.calls.clear();
        }

        pub fn last_configure(&self, window: Window) -> Option<Rect> {
            self.calls.iter().rev().find_map(|call| match call {
                Call::Configure(w, rect, _) if *w == window => Some(*rect),
                _ => None,
            })
        }
    }

    impl DisplayService for MockDisplay {
        fn root(&self) -> Window {
            ROOT
        }

        fn screen_size(&self) -> (i32, i32) {
            self.screen
        }

        fn outputs(&self) -> WmResult<Option<Vec<Rect>>> {
            Ok(self.outputs.clone())
        }

        fn next_event(&mut self) -> WmResult<DisplayEvent> {
            Ok(self.events.pop_front().unwrap_or(DisplayEvent::Unknown))
        }

        fn flush(&mut self) -> WmResult<()> {
            Ok(())
        }

        fn sync_and_drop_enter_events(&mut self) -> WmResult<()> {
            self.events
                .retain(|event| !matches!(event, DisplayEvent::EnterNotify { .. }));
            Ok(())
        }

        fn window_attributes(&self, window: Window) -> Option<WindowAttributes> {
            self.attributes.get(&window).copied()
        }

        fn top_level_windows(&self) -> WmResult<Vec<Window>> {
            let mut windows: Vec<Window> = self.attributes.keys().copied().collect();
            windows.sort_unstable();
            Ok(windows)
        }

        fn window_title(&self, window: Window) -> Option<String> {
            self.titles.get(&window).cloned()
        }

        fn root_name(&self) -> Option<String> {
            self.root_name.clone()
        }

        fn window_class(&self, window: Window) -> Option<(String, String)> {
            self.classes.get(&window).cloned()
        }

        fn transient_for(&self, window: Window) -> Option<Window> {
            self.transients.get(&window).copied()
        }

        fn size_hints(&self, window: Window) -> Option<WmSizeHints> {
            self.size_hints.get(&window).copied()
        }

        fn wm_hints(&self, window: Window) -> Option<WmHints> {
            self.wm_hints.get(&window).copied()
        }

        fn window_type(&self, window: Window) -> WindowType {
            self.window_types.get(&window).copied().unwrap_or_default()
        }

        fn wm_state(&self, _window: Window) -> Option<WmState> {
            None
        }

        fn supports_protocol(&self, window: Window, protocol: Protocol) -> bool {
            self.protocols
                .get(&window)
                .is_some_and(|protocols| protocols.contains(&protocol))
        }

        fn pointer_position(&self) -> Option<(i32, i32)> {
            self.pointer
        }

        fn keysym_for_keycode(&self, keycode: u8) -> Keysym {
            self.keysyms.get(&keycode).copied().unwrap_or(0)
        }

        fn refresh_keyboard_mapping(&mut self) -> WmResult<()> {
            Ok(())
        }

        fn numlock_mask(&self) -> u16 {
            self.numlock
        }

        fn select_client_input(&mut self, window: Window) -> WmResult<()> {
            self.calls.push(Call::SelectInput(window));
            Ok(())
        }

        fn configure_window(&mut self, window: Window, rect: Rect, border_width: i32) -> WmResult<()> {
            self.calls.push(Call::Configure(window, rect, border_width));
            Ok(())
        }

        fn send_configure_notify(
            &mut self,
            window: Window,
            rect: Rect,
            _border_width: i32,
        ) -> WmResult<()> {
            self.calls.push(Call::ConfigureNotify(window, rect));
            Ok(())
        }

        fn configure_unmanaged(&mut self, request: &ConfigureRequest) -> WmResult<()> {
            self.calls.push(Call::ConfigureUnmanaged(request.window));
            Ok(())
        }

        fn move_window(&mut self, window: Window, x: i32, y: i32) -> WmResult<()> {
            self.calls.push(Call::Move(window, x, y));
            Ok(())
        }

        fn move_resize_window(&mut self, window: Window, rect: Rect) -> WmResult<()> {
            self.calls.push(Call::MoveResize(window, rect));
            Ok(())
        }

        fn set_border_width(&mut self, window: Window, border_width: i32) -> WmResult<()> {
            self.calls.push(Call::BorderWidth(window, border_width));
            Ok(())
        }

        fn set_border_color(&mut self, window: Window, color: u32) -> WmResult<()> {
            self.calls.push(Call::BorderColor(window, color));
            Ok(())
        }

        fn raise_window(&mut self, window: Window) -> WmResult<()> {
            self.calls.push(Call::Raise(window));
            Ok(())
        }

        fn stack_below(&mut self, window: Window, sibling: Window) -> WmResult<()> {
            self.calls.push(Call::StackBelow(window, sibling));
            Ok(())
        }

        fn map_window(&mut self, window: Window) -> WmResult<()> {
            self.calls.push(Call::Map(window));
            Ok(())
        }

        fn set_wm_state(&mut self, window: Window, state: WmState) -> WmResult<()> {
            self.calls.push(Call::WmState(window, state));
            Ok(())
        }

        fn set_fullscreen_state(&mut self, window: Window, fullscreen: bool) -> WmResult<()> {
            self.calls.push(Call::FullscreenState(window, fullscreen));
            Ok(())
        }

        fn set_urgency_hint(&mut self, window: Window, urgent: bool) -> WmResult<()> {
            self.calls.push(Call::UrgencyHint(window, urgent));
            Ok(())
        }

        fn set_input_focus(&mut self, window: Window) -> WmResult<()> {
            self.calls.push(Call::InputFocus(window));
            Ok(())
        }

        fn set_active_window(&mut self, window: Option<Window>) -> WmResult<()> {
            self.calls.push(Call::ActiveWindow(window));
            Ok(())
        }

        fn append_client_list(&mut self, window: Window) -> WmResult<()> {
            self.calls.push(Call::AppendClientList(window));
            Ok(())
        }

        fn set_client_list(&mut self, windows: &[Window]) -> WmResult<()> {
            self.calls.push(Call::ClientList(windows.to_vec()));
            Ok(())
        }

        fn send_protocol(&mut self, window: Window, protocol: Protocol) -> WmResult<bool> {
            if !self.supports_protocol(window, protocol) {
                return Ok(false);
            }
            self.calls.push(Call::Protocol(window, protocol));
            Ok(true)
        }

        fn kill_client(&mut self, window: Window) -> WmResult<()> {
            self.calls.push(Call::Kill(window));
            Ok(())
        }

        fn grab_server(&mut self) -> WmResult<()> {
            Ok(())
        }

        fn ungrab_server(&mut self) -> WmResult<()> {
            Ok(())
        }

        fn grab_buttons(
            &mut self,
            window: Window,
            focused: bool,
            _buttons: &[ButtonGrab],
            _numlock_mask: u16,
        ) -> WmResult<()> {
            self.calls.push(Call::GrabButtons(window, focused));
            Ok(())
        }

        fn ungrab_buttons(&mut self, window: Window) -> WmResult<()> {
            self.calls.push(Call::UngrabButtons(window));
            Ok(())
        }

        fn grab_keys(&mut self, keys: &[(u16, Keysym)], _numlock_mask: u16) -> WmResult<()> {
            self.calls.push(Call::GrabKeys(keys.len()));
            Ok(())
        }

        fn ungrab_keys(&mut self) -> WmResult<()> {
            Ok(())
        }

        fn replay_pointer(&mut self) -> WmResult<()> {
            self.calls.push(Call::ReplayPointer);
            Ok(())
        }

        fn grab_pointer(&mut self, cursor: CursorShape) -> WmResult<bool> {
            if self.refuse_pointer_grab {
                return Ok(false);
            }
            self.calls.push(Call::GrabPointer(cursor));
            Ok(true)
        }

        fn ungrab_pointer(&mut self) -> WmResult<()> {
            self.calls.push(Call::UngrabPointer);
            Ok(())
        }

        fn warp_pointer(&mut self, window: Window, x: i32, y: i32) -> WmResult<()> {
            self.calls.push(Call::WarpPointer(window, x, y));
            Ok(())
        }

        fn create_bar_window(&mut self, _rect: Rect) -> WmResult<Window> {
            let window = self.next_bar;
            self.next_bar += 1;
            self.calls.push(Call::CreateBar(window));
            Ok(window)
        }

        fn destroy_window(&mut self, window: Window) -> WmResult<()> {
            self.calls.push(Call::Destroy(window));
            Ok(())
        }
    }
}
