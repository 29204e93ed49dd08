//! Lua script state with table-aware globals
//!
//! Provides a Lua VM wrapper with:
//! - Script execution from strings and files
//! - Global get/set in terms of host [`Value`]s and [`Table`]s
//! - Path upserts straight into the live global table
//! - Table dumps of named globals

use crate::marshal::{from_lua_value, pull_table_with_limit, to_lua_value};
use crate::table::join_path;
use crate::{Config, Error, Result, Table, TableDumper, Value};
use mlua::prelude::*;
use std::io::Write;
use std::path::Path;
use tracing::debug;

/// An owned Lua state plus the settings used to marshal its tables
pub struct ScriptState {
    lua: Lua,
    config: Config,
}

impl ScriptState {
    /// Create a state with all safe standard libraries
    pub fn new() -> Result<Self> {
        Self::with_config(Config::default())
    }

    /// Create a state opening the libraries named by `config`
    pub fn with_config(config: Config) -> Result<Self> {
        let lua = Lua::new_with(config.libraries, LuaOptions::default())?;
        debug!(libraries = ?config.libraries, "created script state");
        Ok(Self { lua, config })
    }

    /// Get the underlying Lua state
    pub fn lua(&self) -> &Lua {
        &self.lua
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Execute a Lua string
    pub fn exec_string(&self, code: &str) -> Result<()> {
        self.lua.load(code).exec()?;
        Ok(())
    }

    /// Load and execute a Lua file
    ///
    /// Chunks are bytes to Lua, so the file need not be valid UTF-8.
    pub fn exec_file(&self, path: &Path) -> Result<()> {
        let content = std::fs::read(path).map_err(|e| match e.kind() {
            std::io::ErrorKind::NotFound => Error::ScriptNotFound(path.display().to_string()),
            _ => Error::Io(e),
        })?;

        self.lua
            .load(&content)
            .set_name(format!("@{}", path.display()))
            .exec()?;
        Ok(())
    }

    /// Evaluate a Lua chunk and convert everything it returns
    pub fn eval(&self, code: &str) -> Result<Vec<Value>> {
        let results: LuaMultiValue = self.lua.load(code).eval()?;
        self.convert_results(results)
    }

    /// Call a global Lua function with host values as arguments
    ///
    /// Lua runtime errors come back as [`Error::Lua`] with the interpreter's
    /// own message.
    pub fn call_function(&self, name: &str, args: &[Value]) -> Result<Vec<Value>> {
        let func: LuaFunction = self.lua.globals().get(name)?;
        let args = args
            .iter()
            .map(|arg| to_lua_value(&self.lua, arg))
            .collect::<Result<LuaMultiValue>>()?;

        let results: LuaMultiValue = func.call(args)?;
        self.convert_results(results)
    }

    fn convert_results(&self, results: LuaMultiValue) -> Result<Vec<Value>> {
        results
            .iter()
            .map(|value| Ok(self.pull_value(value)?.unwrap_or_default()))
            .collect()
    }

    /// Convert a value of this state, pulling tables with the configured limit
    fn pull_value(&self, value: &LuaValue) -> Result<Option<Value>> {
        if let LuaValue::Table(_) = value {
            let table = pull_table_with_limit(&self.lua, value, self.config.pull_depth)?;
            return Ok(table.map(Value::Table));
        }
        from_lua_value(&self.lua, value)
    }

    /// Register a host function as a Lua global
    pub fn register_function<F, A, R>(&self, name: &str, func: F) -> Result<()>
    where
        F: Fn(&Lua, A) -> LuaResult<R> + mlua::MaybeSend + 'static,
        A: FromLuaMulti,
        R: IntoLuaMulti,
    {
        let func = self.lua.create_function(func)?;
        self.lua.globals().set(name, func)?;
        Ok(())
    }

    /// Set a global to a host value, pushing tables as native tables
    pub fn set_global(&self, name: &str, value: impl Into<Value>) -> Result<()> {
        let value = to_lua_value(&self.lua, &value.into())?;
        self.lua.globals().set(name, value)?;
        Ok(())
    }

    /// Push a host table and bind it to a global
    pub fn set_table(&self, name: &str, table: &Table) -> Result<()> {
        let native = crate::push_table(&self.lua, table)?;
        self.lua.globals().set(name, native)?;
        debug!(global = name, entries = table.len(), "pushed table");
        Ok(())
    }

    /// Remove a global
    pub fn set_nil(&self, name: &str) -> Result<()> {
        self.lua.globals().set(name, LuaValue::Nil)?;
        Ok(())
    }

    fn raw_global(&self, name: &str) -> Result<LuaValue> {
        Ok(self.lua.globals().get(name)?)
    }

    /// Read a global as a host value; nil or unrepresentable is `None`
    pub fn get_global(&self, name: &str) -> Result<Option<Value>> {
        let value = self.raw_global(name)?;
        Ok(self.pull_value(&value)?.filter(|v| !v.is_nil()))
    }

    pub fn get_string(&self, name: &str) -> Result<Option<String>> {
        Ok(match self.raw_global(name)? {
            LuaValue::String(s) => Some(s.to_string_lossy()),
            _ => None,
        })
    }

    /// Numeric global, integers included
    pub fn get_number(&self, name: &str) -> Result<Option<f64>> {
        Ok(match self.raw_global(name)? {
            LuaValue::Number(n) => Some(n),
            LuaValue::Integer(i) => Some(i as f64),
            _ => None,
        })
    }

    /// Global holding the integer subtype; floats are `None`
    pub fn get_integer(&self, name: &str) -> Result<Option<i64>> {
        Ok(match self.raw_global(name)? {
            LuaValue::Integer(i) => Some(i),
            _ => None,
        })
    }

    pub fn get_bool(&self, name: &str) -> Result<Option<bool>> {
        Ok(match self.raw_global(name)? {
            LuaValue::Boolean(b) => Some(b),
            _ => None,
        })
    }

    /// Pull a global table; `None` when the global is not a table
    pub fn pull_global(&self, name: &str) -> Result<Option<Table>> {
        let value = self.raw_global(name)?;
        pull_table_with_limit(&self.lua, &value, self.config.pull_depth)
    }

    /// Set a value at `global.key1.key2...`, creating missing tables
    ///
    /// The first segment names the global; at least one key must follow it.
    /// Nil segments are replaced by fresh tables, any other non-table value
    /// on the way is an error.
    pub fn set_path<S: AsRef<str>>(&self, path: &[S], value: impl Into<Value>) -> Result<()> {
        let (leaf, parents) = match path.split_last() {
            Some((leaf, parents)) if !parents.is_empty() => (leaf, parents),
            _ => {
                return Err(Error::InvalidPath(format!(
                    "'{}' needs a global name and at least one key",
                    join_path(path)
                )))
            }
        };

        let mut current = self.lua.globals();
        for (depth, key) in parents.iter().enumerate() {
            let key = key.as_ref();
            current = match current.get::<LuaValue>(key)? {
                LuaValue::Table(t) => t,
                LuaValue::Nil => {
                    let t = self.lua.create_table()?;
                    current.set(key, t.clone())?;
                    t
                }
                other => {
                    return Err(Error::NotATable {
                        path: join_path(&parents[..=depth]),
                        found: other.type_name(),
                    })
                }
            };
        }

        current.set(leaf.as_ref(), to_lua_value(&self.lua, &value.into())?)?;
        debug!(path = %join_path(path), "set path");
        Ok(())
    }

    /// Read the value at `global.key1.key2...`; a missing level is `None`
    pub fn get_path<S: AsRef<str>>(&self, path: &[S]) -> Result<Option<Value>> {
        let Some((leaf, parents)) = path.split_last() else {
            return Ok(None);
        };

        let mut current = self.lua.globals();
        for key in parents {
            current = match current.get::<LuaValue>(key.as_ref())? {
                LuaValue::Table(t) => t,
                _ => return Ok(None),
            };
        }

        let value: LuaValue = current.get(leaf.as_ref())?;
        Ok(self.pull_value(&value)?.filter(|v| !v.is_nil()))
    }

    /// Dumper configured with this state's depth limit
    pub fn dumper(&self) -> TableDumper {
        TableDumper::new(self.config.dump_depth)
    }

    /// Dump a global table with a header; a missing table prints a notice
    pub fn dump_global<W: Write>(&self, name: &str, out: &mut W) -> Result<()> {
        let table = self.pull_global(name)?;
        self.dumper().dump_named(name, table.as_ref(), out)?;
        Ok(())
    }
}
