//! Conversion between host tables and native Lua tables
//!
//! Push builds a fresh native table from a [`Table`]; pull walks a native
//! table and builds an owned [`Table`]. A native table with a non-zero raw
//! length is read as a sequence, anything else as a string-keyed map, so an
//! empty sequence comes back as an empty map.
//!
//! Lua strings are bytes; pulled strings and keys that are not valid UTF-8
//! are converted lossily.

use crate::{Entry, Error, Result, Table, TableMode, Value};
use mlua::prelude::*;
use tracing::{debug, error};

/// Default nesting limit when pulling native tables
pub const DEFAULT_PULL_DEPTH: usize = 64;

/// Build a native Lua table mirroring `table`, recursing into nested tables
pub fn push_table(lua: &Lua, table: &Table) -> Result<LuaTable> {
    let Some(mode) = table.mode() else {
        return Ok(lua.create_table()?);
    };

    match mode {
        TableMode::Named => {
            let native = lua.create_table_with_capacity(0, table.len())?;
            for (index, entry) in table.iter().enumerate() {
                let Some(name) = entry.name.as_deref() else {
                    return Err(mixed_entry(index));
                };
                native.set(name, to_lua_value(lua, &entry.value)?)?;
            }
            Ok(native)
        }
        TableMode::Indexed => {
            let native = lua.create_table_with_capacity(table.len(), 0)?;
            for (index, entry) in table.iter().enumerate() {
                if entry.name.is_some() {
                    return Err(mixed_entry(index));
                }
                native.raw_set(index + 1, to_lua_value(lua, &entry.value)?)?;
            }
            Ok(native)
        }
    }
}

fn mixed_entry(index: usize) -> Error {
    error!(index, "refusing to push a table that mixes named and indexed entries");
    Error::MixedTable { index }
}

/// Convert a single host value to a Lua value
pub fn to_lua_value(lua: &Lua, value: &Value) -> Result<LuaValue> {
    Ok(match value {
        Value::Nil => LuaValue::Nil,
        Value::Boolean(b) => LuaValue::Boolean(*b),
        Value::Integer(i) => LuaValue::Integer(*i),
        Value::Number(n) => LuaValue::Number(*n),
        Value::String(s) => LuaValue::String(lua.create_string(s)?),
        Value::Table(t) => LuaValue::Table(push_table(lua, t)?),
        Value::LightUserData(ud) => LuaValue::LightUserData(*ud),
        Value::Function(handle) => {
            if !handle.belongs_to(lua) {
                return Err(foreign_function());
            }
            LuaValue::Function(handle.function().clone())
        }
    })
}

fn foreign_function() -> Error {
    error!("refusing to push a function owned by another Lua state");
    Error::InvalidValue("function belongs to a different Lua state".to_string())
}

/// Pull a native table owned by `lua` into a host table
///
/// Returns `Ok(None)` when `value` is not a table.
pub fn pull_table(lua: &Lua, value: &LuaValue) -> Result<Option<Table>> {
    pull_table_with_limit(lua, value, DEFAULT_PULL_DEPTH)
}

/// Pull a native table, failing once nesting reaches `max_depth` levels
pub fn pull_table_with_limit(
    lua: &Lua,
    value: &LuaValue,
    max_depth: usize,
) -> Result<Option<Table>> {
    match value {
        LuaValue::Table(native) => pull_native(lua, native, 0, max_depth).map(Some),
        _ => Ok(None),
    }
}

/// Convert a single Lua value to a host value
///
/// Returns `Ok(None)` for kinds a host table cannot hold (full userdata,
/// threads, error values).
pub fn from_lua_value(lua: &Lua, value: &LuaValue) -> Result<Option<Value>> {
    convert_value(lua, value, 0, DEFAULT_PULL_DEPTH)
}

fn pull_native(lua: &Lua, native: &LuaTable, depth: usize, max_depth: usize) -> Result<Table> {
    if depth >= max_depth {
        return Err(Error::DepthExceeded(max_depth));
    }

    let len = native.raw_len();
    if len == 0 {
        let mut entries = Vec::new();
        for pair in native.pairs::<LuaValue, LuaValue>() {
            let (key, value) = pair?;
            let name = match key {
                LuaValue::String(s) => s.to_string_lossy(),
                other => {
                    debug!(key_type = other.type_name(), "skipping non-string key");
                    continue;
                }
            };
            match convert_value(lua, &value, depth, max_depth)? {
                Some(value) => entries.push(Entry::named(name, value)),
                None => debug!(key = %name, "skipping unsupported value"),
            }
        }
        debug!(depth, entries = entries.len(), "pulled named table");
        return Ok(Table::from(entries));
    }

    let mut table = Table::with_capacity(len);
    for i in 1..=len {
        let value: LuaValue = native.raw_get(i)?;
        let value = convert_value(lua, &value, depth, max_depth)?.unwrap_or_else(|| {
            debug!(index = i, "unsupported value pulled as nil");
            Value::Nil
        });
        table.push(value);
    }
    debug!(depth, len, "pulled indexed table");
    Ok(table)
}

fn convert_value(
    lua: &Lua,
    value: &LuaValue,
    depth: usize,
    max_depth: usize,
) -> Result<Option<Value>> {
    Ok(Some(match value {
        LuaValue::Nil => Value::Nil,
        LuaValue::Boolean(b) => Value::Boolean(*b),
        LuaValue::Integer(i) => Value::Integer(*i),
        LuaValue::Number(n) => Value::Number(*n),
        LuaValue::String(s) => Value::String(s.to_string_lossy()),
        LuaValue::Table(t) => Value::Table(pull_native(lua, t, depth + 1, max_depth)?),
        LuaValue::LightUserData(ud) => Value::LightUserData(*ud),
        LuaValue::Function(f) => Value::function(lua, f.clone()),
        _ => return Ok(None),
    }))
}

impl IntoLua for Table {
    fn into_lua(self, lua: &Lua) -> LuaResult<LuaValue> {
        push_table(lua, &self)
            .map(LuaValue::Table)
            .map_err(Error::into_lua_error)
    }
}

impl IntoLua for Value {
    fn into_lua(self, lua: &Lua) -> LuaResult<LuaValue> {
        to_lua_value(lua, &self).map_err(Error::into_lua_error)
    }
}

impl FromLua for Table {
    fn from_lua(value: LuaValue, lua: &Lua) -> LuaResult<Self> {
        match pull_table(lua, &value) {
            Ok(Some(table)) => Ok(table),
            Ok(None) => Err(LuaError::FromLuaConversionError {
                from: value.type_name(),
                to: "Table".to_string(),
                message: Some("expected table".to_string()),
            }),
            Err(e) => Err(e.into_lua_error()),
        }
    }
}
