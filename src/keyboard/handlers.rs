use serde::Deserialize;
use tracing::debug;
use x11rb::connection::Connection;
use x11rb::protocol::xproto::*;

use crate::display::ButtonGrab;
use crate::errors::X11Error;
use crate::keyboard::keysyms::{self, Keysym, format_keysym};

/// When adding a new action, update:
/// 1. Add variant here
/// 2. config/lua_api.rs: register_*_module()
/// 3. window_manager/commands.rs: run_action()
/// 4. templates/config.lua
#[derive(Debug, Copy, Clone, Deserialize, PartialEq, Eq)]
pub enum KeyAction {
    Spawn,
    KillClient,
    FocusStack,
    Zoom,
    Quit,
    View,
    ToggleView,
    Tag,
    ToggleTag,
    FocusMonitor,
    TagMonitor,
    SetGaps,
    ToggleFullScreen,
    ToggleFloating,
    ToggleBar,
    SetLayout,
    SetMasterFactor,
    IncNumMaster,
    MoveMouse,
    ResizeMouse,
    None,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Arg {
    None,
    Int(i32),
    UInt(u32),
    Float(f32),
    Str(String),
    Array(Vec<String>),
}

impl Arg {
    pub const fn none() -> Self {
        Arg::None
    }
}

/// Bar or window region a button press landed on.
#[derive(Debug, Copy, Clone, Deserialize, PartialEq, Eq)]
pub enum Click {
    TagBar,
    LtSymbol,
    StatusText,
    WinTitle,
    ClientWin,
    RootWin,
}

#[derive(Clone)]
pub struct KeyPress {
    pub(crate) modifiers: Vec<KeyButMask>,
    pub(crate) keysym: Keysym,
}

impl std::fmt::Debug for KeyPress {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KeyPress")
            .field("modifiers", &self.modifiers)
            .field("keysym", &format_keysym(self.keysym))
            .finish()
    }
}

#[derive(Debug, Clone)]
pub struct KeyBinding {
    pub(crate) key: KeyPress,
    pub(crate) func: KeyAction,
    pub(crate) arg: Arg,
}

impl KeyBinding {
    pub fn single_key(
        modifiers: Vec<KeyButMask>,
        keysym: Keysym,
        func: KeyAction,
        arg: Arg,
    ) -> Self {
        Self {
            key: KeyPress { modifiers, keysym },
            func,
            arg,
        }
    }

    pub fn keysym(&self) -> Keysym {
        self.key.keysym
    }

    pub fn mask(&self) -> u16 {
        modifiers_to_mask(&self.key.modifiers)
    }
}

pub type Key = KeyBinding;

#[derive(Debug, Clone)]
pub struct ButtonBinding {
    pub(crate) click: Click,
    pub(crate) modifiers: Vec<KeyButMask>,
    pub(crate) button: u8,
    pub(crate) func: KeyAction,
    pub(crate) arg: Arg,
}

impl ButtonBinding {
    pub fn new(
        click: Click,
        modifiers: Vec<KeyButMask>,
        button: u8,
        func: KeyAction,
        arg: Arg,
    ) -> Self {
        Self {
            click,
            modifiers,
            button,
            func,
            arg,
        }
    }

    pub fn mask(&self) -> u16 {
        modifiers_to_mask(&self.modifiers)
    }
}

pub fn modifiers_to_mask(modifiers: &[KeyButMask]) -> u16 {
    modifiers
        .iter()
        .fold(0u16, |acc, &modifier| acc | u16::from(modifier))
}

/// Drops lock modifiers and pointer-button bits from a modifier state.
pub fn clean_mask(state: u16, numlock_mask: u16) -> u16 {
    let relevant = u16::from(
        ModMask::SHIFT
            | ModMask::CONTROL
            | ModMask::M1
            | ModMask::M2
            | ModMask::M3
            | ModMask::M4
            | ModMask::M5,
    );
    state & !(numlock_mask | u16::from(ModMask::LOCK)) & relevant
}

/// Every combination of the lock modifiers, for grabs that must fire
/// regardless of caps/num lock.
pub fn lock_variants(numlock_mask: u16) -> [u16; 4] {
    let lock = u16::from(ModMask::LOCK);
    [0, lock, numlock_mask, numlock_mask | lock]
}

/// Finds which of the eight modifiers Num_Lock is bound to, given the server's
/// modifier map (`keycodes_per_modifier` entries per modifier).
pub fn numlock_mask_from_modifier_map(
    modifier_map: &[u8],
    keycodes_per_modifier: usize,
    numlock_keycode: Option<u8>,
) -> u16 {
    let Some(numlock_keycode) = numlock_keycode else {
        return 0;
    };
    if keycodes_per_modifier == 0 {
        return 0;
    }
    modifier_map
        .chunks(keycodes_per_modifier)
        .take(8)
        .position(|keycodes| keycodes.contains(&numlock_keycode))
        .map_or(0, |index| 1 << index)
}

pub fn matching_keys<'a>(
    keybindings: &'a [KeyBinding],
    keysym: Keysym,
    state: u16,
    numlock_mask: u16,
) -> impl Iterator<Item = &'a KeyBinding> {
    let clean_state = clean_mask(state, numlock_mask);
    keybindings.iter().filter(move |binding| {
        binding.key.keysym == keysym && clean_mask(binding.mask(), numlock_mask) == clean_state
    })
}

pub fn matching_buttons<'a>(
    buttons: &'a [ButtonBinding],
    click: Click,
    button: u8,
    state: u16,
    numlock_mask: u16,
) -> impl Iterator<Item = &'a ButtonBinding> {
    let clean_state = clean_mask(state, numlock_mask);
    buttons.iter().filter(move |binding| {
        binding.click == click
            && binding.button == button
            && clean_mask(binding.mask(), numlock_mask) == clean_state
    })
}

/// Grabs to install on client windows: the `ClientWin` bindings.
pub fn client_button_grabs(buttons: &[ButtonBinding]) -> Vec<ButtonGrab> {
    buttons
        .iter()
        .filter(|binding| binding.click == Click::ClientWin)
        .map(|binding| ButtonGrab {
            button: binding.button,
            modifiers: binding.mask(),
        })
        .collect()
}

pub struct KeyboardMapping {
    pub syms: Vec<Keysym>,
    pub keysyms_per_keycode: u8,
    pub min_keycode: Keycode,
    pub max_keycode: Keycode,
}

impl KeyboardMapping {
    pub fn keycode_to_keysym(&self, keycode: Keycode) -> Keysym {
        if keycode < self.min_keycode {
            return 0;
        }
        let index = (keycode - self.min_keycode) as usize * self.keysyms_per_keycode as usize;
        self.syms.get(index).copied().unwrap_or(0)
    }

    /// Every keycode whose unshifted symbol is `keysym`.
    pub fn keycodes_for(&self, keysym: Keysym) -> impl Iterator<Item = Keycode> + '_ {
        (self.min_keycode..=self.max_keycode)
            .filter(move |&keycode| self.keycode_to_keysym(keycode) == keysym)
    }
}

pub fn get_keyboard_mapping(
    connection: &impl Connection,
) -> std::result::Result<KeyboardMapping, X11Error> {
    let setup = connection.setup();
    let min_keycode = setup.min_keycode;
    let max_keycode = setup.max_keycode;

    let mapping = connection
        .get_keyboard_mapping(min_keycode, max_keycode - min_keycode + 1)?
        .reply()?;

    Ok(KeyboardMapping {
        syms: mapping.keysyms,
        keysyms_per_keycode: mapping.keysyms_per_keycode,
        min_keycode,
        max_keycode,
    })
}

pub fn get_numlock_mask(
    connection: &impl Connection,
    mapping: &KeyboardMapping,
) -> std::result::Result<u16, X11Error> {
    let modifiers = connection.get_modifier_mapping()?.reply()?;
    let numlock_keycode = mapping.keycodes_for(keysyms::XK_NUM_LOCK).next();
    Ok(numlock_mask_from_modifier_map(
        &modifiers.keycodes,
        modifiers.keycodes_per_modifier() as usize,
        numlock_keycode,
    ))
}

pub fn grab_keys(
    connection: &impl Connection,
    root: Window,
    mapping: &KeyboardMapping,
    keys: &[(u16, Keysym)],
    numlock_mask: u16,
) -> std::result::Result<(), X11Error> {
    connection.ungrab_key(Grab::ANY, root, ModMask::ANY)?;

    for &(modifier_mask, keysym) in keys {
        for keycode in mapping.keycodes_for(keysym) {
            for ignore_mask in lock_variants(numlock_mask) {
                connection.grab_key(
                    true,
                    root,
                    (modifier_mask | ignore_mask).into(),
                    keycode,
                    GrabMode::ASYNC,
                    GrabMode::ASYNC,
                )?;
            }
        }
    }

    connection.flush()?;
    Ok(())
}

pub fn handle_spawn_action(action: KeyAction, arg: &Arg, selected_monitor: usize) {
    if let KeyAction::Spawn = action {
        match arg {
            Arg::Str(command) => {
                crate::signal::spawn_detached(command);
            }
            Arg::Array(command) => {
                let Some((cmd, args)) = command.split_first() else {
                    return;
                };

                let mut args_vec: Vec<String> = args.to_vec();

                let is_dmenu = cmd.contains("dmenu");
                let has_monitor_flag = args.iter().any(|arg| arg == "-m");

                if is_dmenu && !has_monitor_flag {
                    args_vec.insert(0, selected_monitor.to_string());
                    args_vec.insert(0, "-m".to_string());
                }

                let args_str: Vec<&str> = args_vec.iter().map(|s| s.as_str()).collect();
                crate::signal::spawn_detached_with_args(cmd, &args_str);
            }
            other => debug!(?other, "spawn without a command"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::keyboard::keysyms;

    const NUMLOCK: u16 = 1 << 4;

    #[test]
    fn clean_mask_strips_lock_and_numlock() {
        let mod1_shift = u16::from(ModMask::M1 | ModMask::SHIFT);
        let noisy = mod1_shift | u16::from(ModMask::LOCK) | NUMLOCK;
        assert_eq!(clean_mask(noisy, NUMLOCK), mod1_shift);
        // pointer button bits in the state are not modifiers
        assert_eq!(clean_mask(mod1_shift | u16::from(KeyButMask::BUTTON1), NUMLOCK), mod1_shift);
    }

    #[test]
    fn key_matches_with_caps_lock_on() {
        let bindings = vec![KeyBinding::single_key(
            vec![KeyButMask::MOD1],
            keysyms::XK_J,
            KeyAction::FocusStack,
            Arg::Int(1),
        )];
        let state = u16::from(ModMask::M1 | ModMask::LOCK);
        let found: Vec<_> = matching_keys(&bindings, keysyms::XK_J, state, NUMLOCK).collect();
        assert_eq!(found.len(), 1);

        let state = u16::from(ModMask::M1 | ModMask::SHIFT);
        assert_eq!(matching_keys(&bindings, keysyms::XK_J, state, NUMLOCK).count(), 0);
    }

    #[test]
    fn buttons_match_on_click_region() {
        let buttons = vec![
            ButtonBinding::new(Click::TagBar, vec![], 1, KeyAction::View, Arg::UInt(0)),
            ButtonBinding::new(Click::LtSymbol, vec![], 1, KeyAction::SetLayout, Arg::None),
        ];
        let found: Vec<_> = matching_buttons(&buttons, Click::LtSymbol, 1, 0, NUMLOCK).collect();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].func, KeyAction::SetLayout);
        assert_eq!(matching_buttons(&buttons, Click::WinTitle, 1, 0, NUMLOCK).count(), 0);
    }

    #[test]
    fn numlock_found_in_modifier_map() {
        // 8 modifiers x 2 keycodes, Num_Lock (77) on mod2
        let map = [50, 62, 66, 0, 37, 105, 64, 108, 77, 0, 0, 0, 133, 134, 92, 0];
        assert_eq!(numlock_mask_from_modifier_map(&map, 2, Some(77)), 1 << 4);
        assert_eq!(numlock_mask_from_modifier_map(&map, 2, Some(200)), 0);
        assert_eq!(numlock_mask_from_modifier_map(&map, 2, None), 0);
    }

    #[test]
    fn client_grabs_only_cover_client_bindings() {
        let buttons = vec![
            ButtonBinding::new(Click::ClientWin, vec![KeyButMask::MOD1], 1, KeyAction::MoveMouse, Arg::None),
            ButtonBinding::new(Click::WinTitle, vec![], 2, KeyAction::Zoom, Arg::None),
        ];
        let grabs = client_button_grabs(&buttons);
        assert_eq!(grabs, vec![ButtonGrab { button: 1, modifiers: u16::from(KeyButMask::MOD1) }]);
    }
}
