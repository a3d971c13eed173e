pub type Keysym = u32;

pub const XK_BACKSPACE: Keysym = 0xff08;
pub const XK_TAB: Keysym = 0xff09;
pub const XK_RETURN: Keysym = 0xff0d;
pub const XK_ESCAPE: Keysym = 0xff1b;
pub const XK_DELETE: Keysym = 0xffff;
pub const XK_HOME: Keysym = 0xff50;
pub const XK_LEFT: Keysym = 0xff51;
pub const XK_UP: Keysym = 0xff52;
pub const XK_RIGHT: Keysym = 0xff53;
pub const XK_DOWN: Keysym = 0xff54;
pub const XK_PAGE_UP: Keysym = 0xff55;
pub const XK_PAGE_DOWN: Keysym = 0xff56;
pub const XK_END: Keysym = 0xff57;
pub const XK_PRINT: Keysym = 0xff61;
pub const XK_NUM_LOCK: Keysym = 0xff7f;
pub const XK_F1: Keysym = 0xffbe;

pub const XK_SPACE: Keysym = 0x0020;
pub const XK_COMMA: Keysym = 0x002c;
pub const XK_MINUS: Keysym = 0x002d;
pub const XK_PERIOD: Keysym = 0x002e;
pub const XK_SLASH: Keysym = 0x002f;
pub const XK_SEMICOLON: Keysym = 0x003b;
pub const XK_EQUAL: Keysym = 0x003d;
pub const XK_BRACKETLEFT: Keysym = 0x005b;
pub const XK_BRACKETRIGHT: Keysym = 0x005d;

pub const XK_0: Keysym = 0x0030;
pub const XK_1: Keysym = 0x0031;
pub const XK_2: Keysym = 0x0032;
pub const XK_3: Keysym = 0x0033;
pub const XK_4: Keysym = 0x0034;
pub const XK_5: Keysym = 0x0035;
pub const XK_6: Keysym = 0x0036;
pub const XK_7: Keysym = 0x0037;
pub const XK_8: Keysym = 0x0038;
pub const XK_9: Keysym = 0x0039;

pub const XK_B: Keysym = 0x0062;
pub const XK_C: Keysym = 0x0063;
pub const XK_D: Keysym = 0x0064;
pub const XK_F: Keysym = 0x0066;
pub const XK_H: Keysym = 0x0068;
pub const XK_I: Keysym = 0x0069;
pub const XK_J: Keysym = 0x006a;
pub const XK_K: Keysym = 0x006b;
pub const XK_L: Keysym = 0x006c;
pub const XK_M: Keysym = 0x006d;
pub const XK_P: Keysym = 0x0070;
pub const XK_Q: Keysym = 0x0071;
pub const XK_T: Keysym = 0x0074;

pub const TAG_KEYS: [Keysym; 9] = [XK_1, XK_2, XK_3, XK_4, XK_5, XK_6, XK_7, XK_8, XK_9];

const NAMED: &[(&str, Keysym)] = &[
    ("BackSpace", XK_BACKSPACE),
    ("Tab", XK_TAB),
    ("Return", XK_RETURN),
    ("Escape", XK_ESCAPE),
    ("Delete", XK_DELETE),
    ("Home", XK_HOME),
    ("Left", XK_LEFT),
    ("Up", XK_UP),
    ("Right", XK_RIGHT),
    ("Down", XK_DOWN),
    ("Prior", XK_PAGE_UP),
    ("Next", XK_PAGE_DOWN),
    ("End", XK_END),
    ("Print", XK_PRINT),
    ("space", XK_SPACE),
    ("Space", XK_SPACE),
    ("comma", XK_COMMA),
    ("minus", XK_MINUS),
    ("period", XK_PERIOD),
    ("slash", XK_SLASH),
    ("semicolon", XK_SEMICOLON),
    ("equal", XK_EQUAL),
    ("bracketleft", XK_BRACKETLEFT),
    ("bracketright", XK_BRACKETRIGHT),
];

/// Resolves an X keysym name. Letters are case-insensitive since bindings
/// match on the unshifted column of the keymap.
pub fn keysym_from_str(name: &str) -> Option<Keysym> {
    if let Some(&(_, sym)) = NAMED.iter().find(|(n, _)| *n == name) {
        return Some(sym);
    }

    let mut chars = name.chars();
    if let (Some(c), None) = (chars.next(), chars.next()) {
        if c.is_ascii_alphabetic() {
            return Some(c.to_ascii_lowercase() as Keysym);
        }
        if c.is_ascii_digit() {
            return Some(c as Keysym);
        }
    }

    let function_key = name.strip_prefix('F')?.parse::<u32>().ok()?;
    (1..=24)
        .contains(&function_key)
        .then(|| XK_F1 + function_key - 1)
}

pub fn format_keysym(keysym: Keysym) -> String {
    if let Some(&(name, _)) = NAMED.iter().find(|(_, sym)| *sym == keysym) {
        return name.to_string();
    }
    if (XK_F1..XK_F1 + 24).contains(&keysym) {
        return format!("F{}", keysym - XK_F1 + 1);
    }
    match char::from_u32(keysym) {
        Some(c) if c.is_ascii_graphic() => c.to_ascii_uppercase().to_string(),
        _ => format!("0x{keysym:x}"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolves_names_letters_digits_and_function_keys() {
        assert_eq!(keysym_from_str("Return"), Some(XK_RETURN));
        assert_eq!(keysym_from_str("j"), Some(XK_J));
        assert_eq!(keysym_from_str("J"), Some(XK_J));
        assert_eq!(keysym_from_str("0"), Some(XK_0));
        assert_eq!(keysym_from_str("F1"), Some(XK_F1));
        assert_eq!(keysym_from_str("F12"), Some(XK_F1 + 11));
        assert_eq!(keysym_from_str("F25"), None);
        assert_eq!(keysym_from_str("Hyper"), None);
    }

    #[test]
    fn formats_known_keysyms() {
        assert_eq!(format_keysym(XK_RETURN), "Return");
        assert_eq!(format_keysym(XK_J), "J");
        assert_eq!(format_keysym(XK_F1 + 2), "F3");
    }
}
