use mlua::{Lua, LuaSerdeExt, Table, Value};
use std::cell::RefCell;
use std::rc::Rc;

use crate::errors::ConfigError;
use crate::keyboard::handlers::{Arg, ButtonBinding, Click, KeyAction, KeyBinding};
use crate::keyboard::keysyms::{self, Keysym};
use crate::layout::LayoutType;
use crate::tags::{MAX_TAGS, TagMask};
use crate::{ColorScheme, Config, WindowRule};
use x11rb::protocol::xproto::KeyButMask;

/// Collects what the Lua config sets. Bindings and rules start empty and
/// only replace the built-in ones when the config declares any.
#[derive(Default)]
pub struct ConfigBuilder {
    pub config: Config,
    pub keybindings: Vec<KeyBinding>,
    pub buttons: Vec<ButtonBinding>,
    pub window_rules: Vec<WindowRule>,
}

impl ConfigBuilder {
    pub fn build(self) -> Config {
        let mut config = self.config;
        if !self.keybindings.is_empty() {
            config.keybindings = self.keybindings;
        }
        if !self.buttons.is_empty() {
            config.buttons = self.buttons;
        }
        if !self.window_rules.is_empty() {
            config.window_rules = self.window_rules;
        }
        config
    }
}

type SharedBuilder = Rc<RefCell<ConfigBuilder>>;

pub fn register_api(lua: &Lua) -> Result<SharedBuilder, ConfigError> {
    let builder = Rc::new(RefCell::new(ConfigBuilder::default()));

    let tagwm_table = lua.create_table()?;

    register_setters(lua, &tagwm_table, builder.clone())?;
    register_actions(lua, &tagwm_table, builder.clone())?;
    register_key_module(lua, &tagwm_table, builder.clone())?;
    register_mouse_module(lua, &tagwm_table, builder.clone())?;
    register_client_module(lua, &tagwm_table)?;
    register_layout_module(lua, &tagwm_table)?;
    register_tag_module(lua, &tagwm_table)?;
    register_monitor_module(lua, &tagwm_table)?;
    register_rule_module(lua, &tagwm_table, builder.clone())?;

    lua.globals().set("tagwm", tagwm_table)?;

    Ok(builder)
}

fn register_setters(lua: &Lua, parent: &Table, builder: SharedBuilder) -> Result<(), ConfigError> {
    macro_rules! setter {
        ($name:literal, $ty:ty, |$config:ident, $value:ident| $body:expr) => {{
            let builder = builder.clone();
            let function = lua.create_function(move |_, $value: $ty| {
                let mut builder = builder.borrow_mut();
                let $config = &mut builder.config;
                $body;
                Ok(())
            })?;
            parent.set($name, function)?;
        }};
    }

    setter!("set_border_width", i32, |config, width| config.border_width = width.max(0));
    setter!("set_gaps", i32, |config, gaps| config.gaps = gaps.max(0));
    setter!("set_snap", i32, |config, snap| config.snap = snap.max(0));
    setter!("set_show_bar", bool, |config, show| config.show_bar = show);
    setter!("set_top_bar", bool, |config, top| config.top_bar = top);
    setter!("set_font", String, |config, font| config.font = font);
    setter!("set_tags", Vec<String>, |config, tags| config.tags = tags);
    setter!("set_master_factor", f32, |config, factor| {
        config.master_factor = factor.clamp(0.05, 0.95)
    });
    setter!("set_num_master", i32, |config, count| config.num_master = count.max(0));
    setter!("set_resize_hints", bool, |config, enabled| config.resize_hints = enabled);
    setter!("set_lock_fullscreen", bool, |config, enabled| {
        config.lock_fullscreen = enabled
    });
    setter!("set_terminal", String, |config, terminal| config.terminal = terminal);
    setter!("autostart", String, |config, command| config.autostart.push(command));

    let builder_clone = builder.clone();
    let set_modkey = lua.create_function(move |_, modkey_str: String| {
        let modkey = parse_modkey_string(&modkey_str)
            .map_err(|e| mlua::Error::RuntimeError(e.to_string()))?;
        builder_clone.borrow_mut().config.modkey = modkey;
        Ok(())
    })?;

    let builder_clone = builder.clone();
    let set_layouts = lua.create_function(move |_, names: Vec<String>| {
        let layouts = names
            .iter()
            .map(|name| {
                name.parse::<LayoutType>().map_err(|_| {
                    mlua::Error::RuntimeError(ConfigError::UnknownLayout(name.clone()).to_string())
                })
            })
            .collect::<mlua::Result<Vec<_>>>()?;
        builder_clone.borrow_mut().config.layouts = layouts;
        Ok(())
    })?;

    let builder_clone = builder.clone();
    let set_scheme_normal =
        lua.create_function(move |_, (fg, bg, border): (Value, Value, Value)| {
            builder_clone.borrow_mut().config.scheme_normal = parse_scheme(fg, bg, border)?;
            Ok(())
        })?;

    let builder_clone = builder.clone();
    let set_scheme_selected =
        lua.create_function(move |_, (fg, bg, border): (Value, Value, Value)| {
            builder_clone.borrow_mut().config.scheme_selected = parse_scheme(fg, bg, border)?;
            Ok(())
        })?;

    parent.set("set_modkey", set_modkey)?;
    parent.set("set_layouts", set_layouts)?;
    parent.set("set_scheme_normal", set_scheme_normal)?;
    parent.set("set_scheme_selected", set_scheme_selected)?;
    Ok(())
}

fn register_actions(lua: &Lua, parent: &Table, builder: SharedBuilder) -> Result<(), ConfigError> {
    let spawn = lua.create_function(|lua, cmd: Value| create_action_table(lua, "Spawn", cmd))?;

    let spawn_terminal = lua.create_function(move |lua, ()| {
        let terminal = builder.borrow().config.terminal.clone();
        create_action_table(lua, "Spawn", Value::String(lua.create_string(&terminal)?))
    })?;

    let quit = lua.create_function(|lua, ()| create_action_table(lua, "Quit", Value::Nil))?;

    let toggle_bar =
        lua.create_function(|lua, ()| create_action_table(lua, "ToggleBar", Value::Nil))?;

    parent.set("spawn", spawn)?;
    parent.set("spawn_terminal", spawn_terminal)?;
    parent.set("quit", quit)?;
    parent.set("toggle_bar", toggle_bar)?;
    Ok(())
}

fn register_key_module(
    lua: &Lua,
    parent: &Table,
    builder: SharedBuilder,
) -> Result<(), ConfigError> {
    let key_table = lua.create_table()?;

    let bind = lua.create_function(move |lua, (mods, key, action): (Value, String, Value)| {
        let modkey = builder.borrow().config.modkey;
        let modifiers = parse_modifiers_value(mods, modkey)?;
        let keysym = parse_keysym(&key)?;
        let (key_action, arg) = parse_action_value(lua, action)?;

        let binding = KeyBinding::single_key(modifiers, keysym, key_action, arg);
        builder.borrow_mut().keybindings.push(binding);

        Ok(())
    })?;

    key_table.set("bind", bind)?;
    parent.set("key", key_table)?;
    Ok(())
}

fn register_mouse_module(
    lua: &Lua,
    parent: &Table,
    builder: SharedBuilder,
) -> Result<(), ConfigError> {
    let mouse_table = lua.create_table()?;

    let bind = lua.create_function(
        move |lua, (click, mods, button, action): (Value, Value, u8, Value)| {
            let click: Click = lua.from_value(click).map_err(|e| {
                mlua::Error::RuntimeError(format!(
                    "tagwm.mouse.bind: invalid click target ({e}). use one of: TagBar, LtSymbol, StatusText, WinTitle, ClientWin, RootWin"
                ))
            })?;
            let modkey = builder.borrow().config.modkey;
            let modifiers = parse_modifiers_value(mods, modkey)?;
            let (func, arg) = parse_action_value(lua, action)?;

            let binding = ButtonBinding::new(click, modifiers, button, func, arg);
            builder.borrow_mut().buttons.push(binding);
            Ok(())
        },
    )?;

    mouse_table.set("bind", bind)?;
    parent.set("mouse", mouse_table)?;
    Ok(())
}

fn register_client_module(lua: &Lua, parent: &Table) -> Result<(), ConfigError> {
    let client_table = lua.create_table()?;

    for (name, action) in [
        ("kill", "KillClient"),
        ("zoom", "Zoom"),
        ("toggle_fullscreen", "ToggleFullScreen"),
        ("toggle_floating", "ToggleFloating"),
        ("move_mouse", "MoveMouse"),
        ("resize_mouse", "ResizeMouse"),
    ] {
        let function =
            lua.create_function(move |lua, ()| create_action_table(lua, action, Value::Nil))?;
        client_table.set(name, function)?;
    }

    let focus_stack = lua.create_function(|lua, dir: i32| {
        create_action_table(lua, "FocusStack", Value::Integer(dir as i64))
    })?;

    client_table.set("focus_stack", focus_stack)?;
    parent.set("client", client_table)?;
    Ok(())
}

fn register_layout_module(lua: &Lua, parent: &Table) -> Result<(), ConfigError> {
    let layout_table = lua.create_table()?;

    // Layouts are picked by name or by 1-based position; nil swaps back to
    // the previous one.
    let set = lua.create_function(|lua, layout: Value| {
        let arg = match layout {
            Value::Integer(position) if position >= 1 => Value::Integer(position - 1),
            Value::Nil | Value::String(_) => layout,
            _ => {
                return Err(mlua::Error::RuntimeError(
                    "tagwm.layout.set: expected a layout name, a position starting at 1, or nothing"
                        .into(),
                ));
            }
        };
        create_action_table(lua, "SetLayout", arg)
    })?;

    let master_factor = lua.create_function(|lua, factor: f64| {
        create_action_table(lua, "SetMasterFactor", Value::Number(factor))
    })?;

    let inc_master = lua.create_function(|lua, delta: i32| {
        create_action_table(lua, "IncNumMaster", Value::Integer(delta as i64))
    })?;

    let gaps = lua.create_function(|lua, delta: i32| {
        create_action_table(lua, "SetGaps", Value::Integer(delta as i64))
    })?;

    layout_table.set("set", set)?;
    layout_table.set("master_factor", master_factor)?;
    layout_table.set("inc_master", inc_master)?;
    layout_table.set("gaps", gaps)?;
    parent.set("layout", layout_table)?;
    Ok(())
}

fn register_tag_module(lua: &Lua, parent: &Table) -> Result<(), ConfigError> {
    let tag_table = lua.create_table()?;

    // Tags are 1-based in Lua. Leaving the index out gives an empty mask,
    // which `view` treats as "previous tags" and tag bar buttons replace
    // with the clicked tag.
    for (name, action) in [
        ("view", "View"),
        ("toggleview", "ToggleView"),
        ("move_to", "Tag"),
        ("toggletag", "ToggleTag"),
    ] {
        let function = lua.create_function(move |lua, index: Option<i64>| {
            let mask = tag_index_to_mask(index)?;
            create_action_table(lua, action, Value::Integer(mask.bits() as i64))
        })?;
        tag_table.set(name, function)?;
    }

    let view_all = lua.create_function(|lua, ()| {
        create_action_table(lua, "View", Value::Integer(u32::MAX as i64))
    })?;

    let move_to_all = lua.create_function(|lua, ()| {
        create_action_table(lua, "Tag", Value::Integer(u32::MAX as i64))
    })?;

    tag_table.set("view_all", view_all)?;
    tag_table.set("move_to_all", move_to_all)?;
    parent.set("tag", tag_table)?;
    Ok(())
}

fn register_monitor_module(lua: &Lua, parent: &Table) -> Result<(), ConfigError> {
    let monitor_table = lua.create_table()?;

    let focus = lua.create_function(|lua, direction: i64| {
        create_action_table(lua, "FocusMonitor", Value::Integer(direction))
    })?;

    let tag = lua.create_function(|lua, direction: i64| {
        create_action_table(lua, "TagMonitor", Value::Integer(direction))
    })?;

    monitor_table.set("focus", focus)?;
    monitor_table.set("tag", tag)?;
    parent.set("monitor", monitor_table)?;
    Ok(())
}

fn register_rule_module(
    lua: &Lua,
    parent: &Table,
    builder: SharedBuilder,
) -> Result<(), ConfigError> {
    let rule_table = lua.create_table()?;

    let add = lua.create_function(move |_, config: Table| {
        let class: Option<String> = config.get("class")?;
        let instance: Option<String> = config.get("instance")?;
        let title: Option<String> = config.get("title")?;
        let is_floating: Option<bool> = config.get("floating")?;
        let monitor: Option<usize> = config.get("monitor")?;
        let tag: Option<i64> = config.get("tag")?;

        let rule = WindowRule {
            class,
            instance,
            title,
            tags: tag_index_to_mask(tag)?,
            is_floating: is_floating.unwrap_or(false),
            monitor,
        };

        builder.borrow_mut().window_rules.push(rule);
        Ok(())
    })?;

    rule_table.set("add", add)?;
    parent.set("rule", rule_table)?;
    Ok(())
}

fn tag_index_to_mask(index: Option<i64>) -> mlua::Result<TagMask> {
    match index {
        None | Some(0) => Ok(TagMask::EMPTY),
        Some(index) if (1..=MAX_TAGS as i64).contains(&index) => {
            Ok(TagMask::tag(index as usize - 1))
        }
        Some(index) => Err(mlua::Error::RuntimeError(format!(
            "tag {index} is out of range, tags are numbered 1 to {MAX_TAGS}"
        ))),
    }
}

/// `"Mod"` stands for the modkey set so far with `tagwm.set_modkey`.
fn parse_modifiers_value(value: Value, modkey: KeyButMask) -> mlua::Result<Vec<KeyButMask>> {
    let parse = |name: &str| {
        if name == "Mod" {
            return Ok(modkey);
        }
        parse_modkey_string(name)
            .map_err(|e| mlua::Error::RuntimeError(format!("tagwm.key.bind: {e}")))
    };

    match value {
        Value::Table(t) => {
            let mut mods = Vec::new();
            for i in 1..=t.len()? {
                let mod_str: String = t.get(i)?;
                mods.push(parse(&mod_str)?);
            }
            Ok(mods)
        }
        Value::String(s) => Ok(vec![parse(&s.to_str()?)?]),
        Value::Nil => Ok(Vec::new()),
        _ => Err(mlua::Error::RuntimeError(
            "modifiers must be a table like {\"Mod\"} or {\"Mod\", \"Shift\"}".into(),
        )),
    }
}

fn parse_modkey_string(s: &str) -> Result<KeyButMask, ConfigError> {
    match s {
        "Mod1" => Ok(KeyButMask::MOD1),
        "Mod2" => Ok(KeyButMask::MOD2),
        "Mod3" => Ok(KeyButMask::MOD3),
        "Mod4" => Ok(KeyButMask::MOD4),
        "Mod5" => Ok(KeyButMask::MOD5),
        "Shift" => Ok(KeyButMask::SHIFT),
        "Control" => Ok(KeyButMask::CONTROL),
        _ => Err(ConfigError::InvalidModkey(s.to_string())),
    }
}

fn parse_keysym(key: &str) -> mlua::Result<Keysym> {
    keysyms::keysym_from_str(key)
        .ok_or_else(|| mlua::Error::RuntimeError(ConfigError::UnknownKey(key.to_string()).to_string()))
}

fn parse_action_value(lua: &Lua, value: Value) -> mlua::Result<(KeyAction, Arg)> {
    match value {
        Value::Function(_) => Err(mlua::Error::RuntimeError(
            "action must be a function call, not a function reference. example: tagwm.quit() not tagwm.quit".into(),
        )),
        Value::Table(t) => {
            let name: String = t.get("__action").map_err(|_| {
                mlua::Error::RuntimeError(
                    "action must be a table returned by tagwm functions like tagwm.spawn()".into(),
                )
            })?;
            let action: KeyAction = lua
                .from_value(Value::String(lua.create_string(&name)?))
                .map_err(|_| {
                    mlua::Error::RuntimeError(ConfigError::UnknownAction(name.clone()).to_string())
                })?;
            let arg = value_to_arg(action, t.get("__arg")?)?;
            Ok((action, arg))
        }
        _ => Err(mlua::Error::RuntimeError(
            "action must be a table returned by tagwm functions like tagwm.spawn()".into(),
        )),
    }
}

fn value_to_arg(action: KeyAction, value: Value) -> mlua::Result<Arg> {
    let takes_mask = matches!(
        action,
        KeyAction::View | KeyAction::ToggleView | KeyAction::Tag | KeyAction::ToggleTag
    );
    match value {
        Value::Nil => Ok(Arg::None),
        Value::String(s) => Ok(Arg::Str(s.to_str()?.to_string())),
        Value::Integer(i) if takes_mask => Ok(Arg::UInt(i as u32)),
        Value::Integer(i) => Ok(Arg::Int(i as i32)),
        Value::Number(n) => Ok(Arg::Float(n as f32)),
        Value::Table(t) => {
            let mut arr = Vec::new();
            for i in 1..=t.len()? {
                let item: String = t.get(i)?;
                arr.push(item);
            }
            Ok(Arg::Array(arr))
        }
        _ => Ok(Arg::None),
    }
}

fn create_action_table(lua: &Lua, action_name: &str, arg: Value) -> mlua::Result<Table> {
    let table = lua.create_table()?;
    table.set("__action", action_name)?;
    table.set("__arg", arg)?;
    Ok(table)
}

fn parse_scheme(fg: Value, bg: Value, border: Value) -> mlua::Result<ColorScheme> {
    Ok(ColorScheme {
        foreground: parse_color_value(fg)?,
        background: parse_color_value(bg)?,
        border: parse_color_value(border)?,
    })
}

fn parse_color_value(value: Value) -> mlua::Result<u32> {
    let invalid = |text: &str| {
        mlua::Error::RuntimeError(ConfigError::InvalidColor(text.to_string()).to_string())
    };
    match value {
        Value::Integer(i) => Ok(i as u32),
        Value::String(s) => {
            let s = s.to_str()?;
            let hex = s
                .strip_prefix('#')
                .or_else(|| s.strip_prefix("0x"))
                .ok_or_else(|| invalid(&s))?;
            u32::from_str_radix(hex, 16).map_err(|_| invalid(&s))
        }
        _ => Err(mlua::Error::RuntimeError(
            "color must be a number (0xff0000) or string ('#ff0000' or '0xff0000')".into(),
        )),
    }
}
