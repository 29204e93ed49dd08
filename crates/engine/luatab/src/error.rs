//! Error types for table marshalling and script state operations

use thiserror::Error;

/// Result type for luatab operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while moving tables between the host and Lua
#[derive(Error, Debug)]
pub enum Error {
    /// KDL parsing error
    #[error("KDL parse error: {0}")]
    KdlParse(#[from] kdl::KdlError),

    /// Error raised by the Lua runtime, message left untouched
    #[error("Lua error: {0}")]
    Lua(#[from] mlua::Error),

    /// File I/O error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// A path segment that must hold a table holds something else
    #[error("Not a table at '{path}': found {found}")]
    NotATable { path: String, found: &'static str },

    /// Path has too few segments for the requested operation
    #[error("Invalid path: {0}")]
    InvalidPath(String),

    /// Table mixes named and unnamed entries
    #[error("Mixed table: entry {index} does not match the table's key style")]
    MixedTable { index: usize },

    /// Native table nesting exceeded the pull depth limit
    #[error("Table nesting exceeds depth limit of {0}")]
    DepthExceeded(usize),

    /// Invalid value
    #[error("Invalid value: {0}")]
    InvalidValue(String),

    /// Script file not found
    #[error("Script not found: {0}")]
    ScriptNotFound(String),
}

impl Error {
    /// Convert into an mlua error, keeping Lua errors as they are
    pub(crate) fn into_lua_error(self) -> mlua::Error {
        match self {
            Error::Lua(e) => e,
            other => mlua::Error::external(other.to_string()),
        }
    }
}
