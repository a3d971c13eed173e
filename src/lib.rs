use std::path::PathBuf;

use x11rb::protocol::xproto::KeyButMask;

pub mod bar;
pub mod client;
pub mod config;
pub mod display;
pub mod errors;
pub mod geometry;
pub mod keyboard;
pub mod layout;
pub mod monitor;
pub mod signal;
pub mod size_hints;
pub mod tags;
pub mod window_manager;
pub mod x11;

pub mod prelude {
    pub use crate::ColorScheme;
    pub use crate::WindowRule;
    pub use crate::keyboard::{Arg, ButtonBinding, Click, KeyAction, KeyBinding, keysyms};
    pub use crate::layout::LayoutType;
    pub use crate::tags::TagMask;
    pub use x11rb::protocol::xproto::KeyButMask;
}

use crate::keyboard::{Arg, ButtonBinding, Click, KeyAction, KeyBinding, keysyms};
use crate::layout::LayoutType;
use crate::tags::TagMask;

#[derive(Debug, Clone, PartialEq)]
pub struct WindowRule {
    pub class: Option<String>,
    pub instance: Option<String>,
    pub title: Option<String>,
    pub tags: TagMask,
    pub is_floating: bool,
    pub monitor: Option<usize>,
}

impl WindowRule {
    pub fn matches(&self, class: &str, instance: &str, title: &str) -> bool {
        let class_matches = self
            .class
            .as_ref()
            .is_none_or(|c| class.contains(c.as_str()));
        let instance_matches = self
            .instance
            .as_ref()
            .is_none_or(|i| instance.contains(i.as_str()));
        let title_matches = self
            .title
            .as_ref()
            .is_none_or(|t| title.contains(t.as_str()));
        class_matches && instance_matches && title_matches
    }
}

#[derive(Debug, Clone)]
pub struct Config {
    // Meta
    pub path: Option<PathBuf>,

    // Appearance
    pub border_width: i32,
    pub gaps: i32,
    pub snap: i32,
    pub show_bar: bool,
    pub top_bar: bool,
    pub font: String,
    pub scheme_normal: ColorScheme,
    pub scheme_selected: ColorScheme,

    // Tags
    pub tags: Vec<String>,

    // Layouts
    pub master_factor: f32,
    pub num_master: i32,
    pub resize_hints: bool,
    pub lock_fullscreen: bool,
    pub layouts: Vec<LayoutType>,

    // Basics
    pub terminal: String,
    pub modkey: KeyButMask,
    pub autostart: Vec<String>,

    // Bindings
    pub keybindings: Vec<KeyBinding>,
    pub buttons: Vec<ButtonBinding>,

    // Window rules
    pub window_rules: Vec<WindowRule>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ColorScheme {
    pub foreground: u32,
    pub background: u32,
    pub border: u32,
}

impl Config {
    /// Mask with one bit per configured tag.
    pub fn tag_mask(&self) -> TagMask {
        TagMask::all(self.tags.len())
    }
}

const COL_GRAY1: u32 = 0x222222;
const COL_GRAY2: u32 = 0x444444;
const COL_GRAY3: u32 = 0xbbbbbb;
const COL_GRAY4: u32 = 0xeeeeee;
const COL_CYAN: u32 = 0x005577;

impl Default for Config {
    fn default() -> Self {
        const MODKEY: KeyButMask = KeyButMask::MOD1;
        const SHIFT: KeyButMask = KeyButMask::SHIFT;
        const CONTROL: KeyButMask = KeyButMask::CONTROL;

        const TERMINAL: &str = "st";
        const FONT: &str = "monospace:size=10";

        let key = |modifiers: Vec<KeyButMask>, keysym, func, arg| {
            KeyBinding::single_key(modifiers, keysym, func, arg)
        };

        let dmenu = Arg::Array(
            [
                "dmenu_run", "-fn", FONT, "-nb", "#222222", "-nf", "#bbbbbb", "-sb", "#005577",
                "-sf", "#eeeeee",
            ]
            .into_iter()
            .map(String::from)
            .collect(),
        );

        let mut keybindings = vec![
            key(vec![MODKEY], keysyms::XK_P, KeyAction::Spawn, dmenu),
            key(
                vec![MODKEY, SHIFT],
                keysyms::XK_RETURN,
                KeyAction::Spawn,
                Arg::Str(TERMINAL.to_string()),
            ),
            key(vec![MODKEY], keysyms::XK_B, KeyAction::ToggleBar, Arg::None),
            key(vec![MODKEY], keysyms::XK_J, KeyAction::FocusStack, Arg::Int(1)),
            key(vec![MODKEY], keysyms::XK_K, KeyAction::FocusStack, Arg::Int(-1)),
            key(vec![MODKEY], keysyms::XK_I, KeyAction::IncNumMaster, Arg::Int(1)),
            key(vec![MODKEY], keysyms::XK_D, KeyAction::IncNumMaster, Arg::Int(-1)),
            key(vec![MODKEY], keysyms::XK_H, KeyAction::SetMasterFactor, Arg::Float(-0.05)),
            key(vec![MODKEY], keysyms::XK_L, KeyAction::SetMasterFactor, Arg::Float(0.05)),
            key(vec![MODKEY], keysyms::XK_RETURN, KeyAction::Zoom, Arg::None),
            key(vec![MODKEY], keysyms::XK_TAB, KeyAction::View, Arg::UInt(0)),
            key(vec![MODKEY, SHIFT], keysyms::XK_C, KeyAction::KillClient, Arg::None),
            key(vec![MODKEY], keysyms::XK_T, KeyAction::SetLayout, Arg::Int(0)),
            key(vec![MODKEY], keysyms::XK_F, KeyAction::SetLayout, Arg::Int(1)),
            key(vec![MODKEY], keysyms::XK_M, KeyAction::SetLayout, Arg::Int(2)),
            key(vec![MODKEY], keysyms::XK_SPACE, KeyAction::SetLayout, Arg::None),
            key(vec![MODKEY, SHIFT], keysyms::XK_SPACE, KeyAction::ToggleFloating, Arg::None),
            key(vec![MODKEY], keysyms::XK_0, KeyAction::View, Arg::UInt(!0)),
            key(vec![MODKEY, SHIFT], keysyms::XK_0, KeyAction::Tag, Arg::UInt(!0)),
            key(vec![MODKEY], keysyms::XK_COMMA, KeyAction::FocusMonitor, Arg::Int(-1)),
            key(vec![MODKEY], keysyms::XK_PERIOD, KeyAction::FocusMonitor, Arg::Int(1)),
            key(vec![MODKEY, SHIFT], keysyms::XK_COMMA, KeyAction::TagMonitor, Arg::Int(-1)),
            key(vec![MODKEY, SHIFT], keysyms::XK_PERIOD, KeyAction::TagMonitor, Arg::Int(1)),
            key(vec![MODKEY], keysyms::XK_MINUS, KeyAction::SetGaps, Arg::Int(-1)),
            key(vec![MODKEY], keysyms::XK_EQUAL, KeyAction::SetGaps, Arg::Int(1)),
            key(vec![MODKEY, SHIFT], keysyms::XK_EQUAL, KeyAction::SetGaps, Arg::Int(0)),
        ];

        for (index, &keysym) in keysyms::TAG_KEYS.iter().enumerate() {
            let mask = Arg::UInt(1 << index);
            keybindings.extend([
                key(vec![MODKEY], keysym, KeyAction::View, mask.clone()),
                key(vec![MODKEY, CONTROL], keysym, KeyAction::ToggleView, mask.clone()),
                key(vec![MODKEY, SHIFT], keysym, KeyAction::Tag, mask.clone()),
                key(vec![MODKEY, CONTROL, SHIFT], keysym, KeyAction::ToggleTag, mask),
            ]);
        }

        keybindings.push(key(vec![MODKEY, SHIFT], keysyms::XK_Q, KeyAction::Quit, Arg::None));

        let buttons = vec![
            ButtonBinding::new(Click::LtSymbol, vec![], 1, KeyAction::SetLayout, Arg::None),
            ButtonBinding::new(Click::LtSymbol, vec![], 3, KeyAction::SetLayout, Arg::Int(2)),
            ButtonBinding::new(Click::WinTitle, vec![], 2, KeyAction::Zoom, Arg::None),
            ButtonBinding::new(
                Click::StatusText,
                vec![],
                2,
                KeyAction::Spawn,
                Arg::Str(TERMINAL.to_string()),
            ),
            ButtonBinding::new(Click::ClientWin, vec![MODKEY], 1, KeyAction::MoveMouse, Arg::None),
            ButtonBinding::new(Click::ClientWin, vec![MODKEY], 2, KeyAction::ToggleFloating, Arg::None),
            ButtonBinding::new(Click::ClientWin, vec![MODKEY], 3, KeyAction::ResizeMouse, Arg::None),
            ButtonBinding::new(Click::TagBar, vec![], 1, KeyAction::View, Arg::UInt(0)),
            ButtonBinding::new(Click::TagBar, vec![], 3, KeyAction::ToggleView, Arg::UInt(0)),
            ButtonBinding::new(Click::TagBar, vec![MODKEY], 1, KeyAction::Tag, Arg::UInt(0)),
            ButtonBinding::new(Click::TagBar, vec![MODKEY], 3, KeyAction::ToggleTag, Arg::UInt(0)),
        ];

        Self {
            path: None,
            border_width: 1,
            gaps: 5,
            snap: 32,
            show_bar: true,
            top_bar: true,
            font: FONT.to_string(),
            scheme_normal: ColorScheme {
                foreground: COL_GRAY3,
                background: COL_GRAY1,
                border: COL_GRAY2,
            },
            scheme_selected: ColorScheme {
                foreground: COL_GRAY4,
                background: COL_CYAN,
                border: COL_CYAN,
            },
            tags: (1..=9).map(|tag| tag.to_string()).collect(),
            master_factor: 0.55,
            num_master: 1,
            resize_hints: true,
            lock_fullscreen: true,
            layouts: layout::default_layouts(),
            terminal: TERMINAL.to_string(),
            modkey: MODKEY,
            autostart: Vec::new(),
            keybindings,
            buttons,
            window_rules: vec![
                WindowRule {
                    class: Some("Gimp".to_string()),
                    instance: None,
                    title: None,
                    tags: TagMask::EMPTY,
                    is_floating: true,
                    monitor: None,
                },
                WindowRule {
                    class: Some("Firefox".to_string()),
                    instance: None,
                    title: None,
                    tags: TagMask::tag(8),
                    is_floating: false,
                    monitor: None,
                },
            ],
        }
    }
}
