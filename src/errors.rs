use std::io;

use x11rb::errors::{ConnectError, ConnectionError, ReplyError, ReplyOrIdError};

#[derive(thiserror::Error, Debug)]
pub enum X11Error {
    #[error(transparent)]
    Connect(#[from] ConnectError),
    #[error(transparent)]
    Connection(#[from] ConnectionError),
    #[error(transparent)]
    Reply(#[from] ReplyError),
    #[error(transparent)]
    IdCreation(#[from] ReplyOrIdError),
    #[error("another window manager is already running")]
    OtherWmRunning,
    #[error("failed to open the Xlib display")]
    DisplayOpenFailed,
    #[error("failed to load font {0}")]
    FontLoadFailed(String),
    #[error("failed to create xft draw")]
    DrawCreateFailed,
    #[error("X protocol error {kind:?} on request {request} (resource {resource:#x})")]
    Protocol {
        kind: x11rb::protocol::ErrorKind,
        request: u8,
        resource: u32,
    },
}

#[derive(thiserror::Error, Debug)]
pub enum ConfigError {
    #[error("lua error: {0}")]
    Lua(#[from] mlua::Error),
    #[error("invalid modifier: {0}")]
    InvalidModkey(String),
    #[error("unknown key: {0}")]
    UnknownKey(String),
    #[error("unknown action: {0}")]
    UnknownAction(String),
    #[error("unknown layout: {0}")]
    UnknownLayout(String),
    #[error("invalid color: {0}")]
    InvalidColor(String),
    #[error("{0} tags configured, between 1 and 31 are supported")]
    TagCount(usize),
    #[error("at least one layout must be configured")]
    NoLayouts,
}

#[derive(thiserror::Error, Debug)]
pub enum WmError {
    #[error(transparent)]
    X11(#[from] X11Error),
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Io(#[from] io::Error),
}

impl From<ConnectionError> for WmError {
    fn from(error: ConnectionError) -> Self {
        WmError::X11(X11Error::Connection(error))
    }
}

impl From<ReplyError> for WmError {
    fn from(error: ReplyError) -> Self {
        WmError::X11(X11Error::Reply(error))
    }
}

impl From<ReplyOrIdError> for WmError {
    fn from(error: ReplyOrIdError) -> Self {
        WmError::X11(X11Error::IdCreation(error))
    }
}

impl From<ConnectError> for WmError {
    fn from(error: ConnectError) -> Self {
        WmError::X11(X11Error::Connect(error))
    }
}

pub type WmResult<T> = Result<T, WmError>;

#[derive(thiserror::Error, Debug)]
pub enum MainError {
    #[error("could not start the window manager: {0}")]
    CouldNotStartWm(WmError),
    #[error(transparent)]
    WmError(WmError),
    #[error("failed to read config file: {0}")]
    FailedReadConfig(io::Error),
    #[error("could not create config directory: {0}")]
    CouldNotCreateConfigDir(io::Error),
    #[error("could not write config file: {0}")]
    CouldNotWriteConfig(io::Error),
    #[error("no config directory could be determined")]
    NoConfigDir,
    #[error("--config requires a path")]
    NoConfigPath,
    #[error("config path does not exist")]
    BadConfigPath,
    #[error("failed to check whether the config exists: {0}")]
    FailedCheckExist(io::Error),
    #[error("invalid arguments, see --help")]
    InvalidArguments,
    #[error("program name missing from arguments")]
    NoProgramName,
}
