mod lua_api;

use std::path::Path;

use mlua::{Lua, Table};
use tracing::debug;

use crate::Config;
use crate::errors::ConfigError;
use crate::tags::MAX_TAGS;

/// The configuration written by `tagwm --init`.
pub const TEMPLATE: &str = include_str!("../../templates/config.lua");

/// Evaluates a Lua config on top of the built-in defaults. `config_dir` is
/// added to `package.path` so the config can `require` its siblings.
pub fn parse_lua_config(input: &str, config_dir: Option<&Path>) -> Result<Config, ConfigError> {
    let lua = Lua::new();

    if let Some(dir) = config_dir {
        let package: Table = lua.globals().get("package")?;
        let path: String = package.get("path")?;
        package.set("path", format!("{}/?.lua;{}", dir.display(), path))?;
    }

    let builder = lua_api::register_api(&lua)?;
    lua.load(input).set_name("config.lua").exec()?;

    let config = builder.take().build();
    validate(&config)?;
    debug!(
        tags = config.tags.len(),
        keys = config.keybindings.len(),
        buttons = config.buttons.len(),
        rules = config.window_rules.len(),
        "lua config evaluated"
    );
    Ok(config)
}

fn validate(config: &Config) -> Result<(), ConfigError> {
    if config.tags.is_empty() || config.tags.len() > MAX_TAGS {
        return Err(ConfigError::TagCount(config.tags.len()));
    }
    if config.layouts.is_empty() {
        return Err(ConfigError::NoLayouts);
    }
    Ok(())
}
