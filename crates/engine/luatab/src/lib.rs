//! Lua table marshalling for host programs
//!
//! This crate provides:
//! - **Table**: An ordered host-side table, either named (map) or indexed (sequence)
//! - **Marshalling**: Push host tables into Lua and pull native tables back out
//! - **Path upserts**: Set `a.b.c = value` on host tables or live Lua globals,
//!   creating the missing levels
//! - **TableDumper**: Depth-bounded text dumps for diagnostics
//! - **ScriptState**: Lua VM wrapper tying the above together
//!
//! # Example
//!
//! ```rust,ignore
//! use luatab::{ScriptState, Table};
//!
//! let state = ScriptState::new()?;
//! state.set_table("user", &Table::from_pairs([("name", "dan")]))?;
//! state.set_path(&["user", "profile", "level"], 3)?;
//!
//! let user = state.pull_global("user")?.expect("user is a table");
//! assert_eq!(user.get("name").and_then(|v| v.as_str()), Some("dan"));
//! ```

mod config;
mod dump;
mod error;
mod kdl_reader;
mod marshal;
mod state;
mod table;
mod value;

pub use config::{parse_libraries, Config};
pub use dump::{format_scalar, TableDumper, DEFAULT_DUMP_DEPTH};
pub use error::{Error, Result};
pub use kdl_reader::KdlReader;
pub use marshal::{
    from_lua_value, pull_table, pull_table_with_limit, push_table, to_lua_value,
    DEFAULT_PULL_DEPTH,
};
pub use state::ScriptState;
pub use table::{Entry, Table, TableMode};
pub use value::{FunctionHandle, Value};

// Re-export mlua for downstream crates
pub use mlua;
