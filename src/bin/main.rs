use std::path::PathBuf;

use tagwm::Config;
use tagwm::bar::XftRenderer;
use tagwm::config::TEMPLATE;
use tagwm::display::DisplayService;
use tagwm::errors::MainError;
use tagwm::window_manager::WindowManager;
use tagwm::x11::X11;
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

const CONFIG_FILE: &str = "config.lua";

enum Args {
    Exit,
    Run { config_path: Option<PathBuf> },
    Error(MainError),
}

fn main() -> Result<(), MainError> {
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "tagwm=info".into()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config_path = match process_args() {
        Args::Exit => return Ok(()),
        Args::Run { config_path } => config_path,
        Args::Error(e) => return Err(e),
    };

    let config = load_config(config_path)?;

    if let Err(e) = run(config) {
        error!(error = %e, "window manager stopped");
        return Err(e);
    }
    Ok(())
}

fn run(config: Config) -> Result<(), MainError> {
    let display = X11::new().map_err(|e| MainError::CouldNotStartWm(e.into()))?;
    let (screen_width, _) = display.screen_size();
    let renderer = XftRenderer::new(&config.font, screen_width)
        .map_err(|e| MainError::CouldNotStartWm(e.into()))?;

    let mut window_manager =
        WindowManager::new(config, display, renderer).map_err(MainError::CouldNotStartWm)?;

    window_manager.scan().map_err(MainError::WmError)?;
    window_manager.run_autostart();
    window_manager.run().map_err(MainError::WmError)?;

    info!("shutting down");
    window_manager.cleanup().map_err(MainError::WmError)?;
    let mut display = window_manager.into_display();
    display
        .cleanup()
        .map_err(|e| MainError::WmError(e.into()))
}

/// Reads the Lua config, falling back to the built-in one when there is
/// no config file or it does not evaluate.
fn load_config(custom_path: Option<PathBuf>) -> Result<Config, MainError> {
    let path = match custom_path {
        Some(path) => path,
        None => {
            let path = get_config_path()?.join(CONFIG_FILE);
            if !path.exists() {
                info!(path = %path.display(), "no config file, using built-in defaults");
                return Ok(Config::default());
            }
            path
        }
    };

    let config_string = std::fs::read_to_string(&path).map_err(MainError::FailedReadConfig)?;

    let mut config = match tagwm::config::parse_lua_config(&config_string, path.parent()) {
        Ok(config) => config,
        Err(e) => {
            warn!(path = %path.display(), error = %e, "config rejected, using built-in defaults");
            Config::default()
        }
    };
    config.path = Some(path);
    Ok(config)
}

fn init_config() -> Result<(), MainError> {
    let config_directory = get_config_path()?;
    std::fs::create_dir_all(&config_directory).map_err(MainError::CouldNotCreateConfigDir)?;

    let config_path = config_directory.join(CONFIG_FILE);
    std::fs::write(&config_path, TEMPLATE).map_err(MainError::CouldNotWriteConfig)?;

    println!("Config created at {}", config_path.display());
    println!("Edit it and restart tagwm to apply the changes.");
    Ok(())
}

fn get_config_path() -> Result<PathBuf, MainError> {
    match dirs::config_dir() {
        Some(p) => Ok(p.join("tagwm")),
        None => Err(MainError::NoConfigDir),
    }
}

fn print_help() {
    println!("tagwm - a dynamic tiling window manager\n");
    println!("USAGE:");
    println!("    tagwm [OPTIONS]\n");
    println!("OPTIONS:");
    println!("    --init              Write the default config to ~/.config/tagwm/config.lua");
    println!("    --config <PATH>     Use a custom config file");
    println!("    --version           Print version information");
    println!("    --help              Print this help message\n");
    println!("CONFIG:");
    println!("    Location: ~/.config/tagwm/config.lua");
    println!("    Without a config file the built-in defaults are used.");
    println!("    Set RUST_LOG (for example RUST_LOG=tagwm=debug) to change logging.\n");
}

fn process_args() -> Args {
    let mut args = std::env::args();
    let name = match args.next() {
        Some(n) => n,
        None => return Args::Error(MainError::NoProgramName),
    };
    let switch = args.next();
    let path = args.next();

    let Some(switch) = switch else {
        return Args::Run { config_path: None };
    };

    match switch.as_str() {
        "--version" | "-v" => {
            println!("{name} {}", env!("CARGO_PKG_VERSION"));
            Args::Exit
        }
        "--help" | "-h" => {
            print_help();
            Args::Exit
        }
        "--init" => match init_config() {
            Ok(_) => Args::Exit,
            Err(e) => Args::Error(e),
        },
        "--config" => match check_custom_config(path) {
            Ok(p) => Args::Run {
                config_path: Some(p),
            },
            Err(e) => Args::Error(e),
        },
        _ => Args::Error(MainError::InvalidArguments),
    }
}

fn check_custom_config(path: Option<String>) -> Result<PathBuf, MainError> {
    let Some(path) = path else {
        return Err(MainError::NoConfigPath);
    };

    match std::fs::exists(&path) {
        Ok(true) => Ok(PathBuf::from(path)),
        Ok(false) => Err(MainError::BadConfigPath),
        Err(e) => Err(MainError::FailedCheckExist(e)),
    }
}
