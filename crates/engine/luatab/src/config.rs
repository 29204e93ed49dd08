//! Configuration for script states, pulls and dumps
//!
//! Settings come from defaults, the environment or a KDL file:
//!
//! ```kdl
//! libraries "table" "string" "math"
//! dump max-depth=32
//! pull max-depth=64
//! ```

use crate::dump::DEFAULT_DUMP_DEPTH;
use crate::marshal::DEFAULT_PULL_DEPTH;
use crate::{Error, KdlReader, Result, Table, Value};
use mlua::StdLib;
use std::{env, path::Path};

/// Settings shared by a [`ScriptState`](crate::ScriptState) and its dumps
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Config {
    /// Standard libraries opened on top of the always-present base library
    pub libraries: StdLib,
    /// Nesting level past which dumps stop expanding tables
    pub dump_depth: usize,
    /// Nesting limit when pulling native tables
    pub pull_depth: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            libraries: StdLib::ALL_SAFE,
            dump_depth: DEFAULT_DUMP_DEPTH,
            pull_depth: DEFAULT_PULL_DEPTH,
        }
    }
}

impl Config {
    /// Builds a configuration from `LUATAB_*` environment variables, falling
    /// back to defaults for anything unset or unparsable.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let mut config = Self::default();

        if let Some(libs) = lookup("LUATAB_LIBS") {
            config.libraries = parse_libraries(
                libs.split(',')
                    .map(str::trim)
                    .filter(|name| !name.is_empty()),
            )?;
        }
        if let Some(depth) = lookup("LUATAB_DUMP_DEPTH").and_then(|v| v.parse().ok()) {
            config.dump_depth = depth;
        }
        if let Some(depth) = lookup("LUATAB_PULL_DEPTH").and_then(|v| v.parse().ok()) {
            config.pull_depth = depth;
        }

        config.validate()?;
        Ok(config)
    }

    /// Load a configuration file in KDL format
    pub fn from_kdl_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        Self::from_table(&KdlReader::from_file(path)?)
    }

    /// Parse a configuration from KDL text
    pub fn from_kdl_str(content: &str) -> Result<Self> {
        Self::from_table(&KdlReader::from_string(content)?)
    }

    /// Interpret a table shaped like the KDL configuration document
    pub fn from_table(table: &Table) -> Result<Self> {
        let mut config = Self::default();

        match table.get("libraries") {
            None => {}
            Some(Value::String(name)) => config.libraries = parse_libraries([name.as_str()])?,
            Some(Value::Table(list)) => {
                let names = list
                    .iter()
                    .map(|entry| {
                        entry.value.as_str().ok_or_else(|| {
                            Error::InvalidValue(format!(
                                "library names must be strings, got {}",
                                entry.value.type_name()
                            ))
                        })
                    })
                    .collect::<Result<Vec<_>>>()?;
                config.libraries = parse_libraries(names)?;
            }
            Some(other) => {
                return Err(Error::InvalidValue(format!(
                    "libraries must be a string list, got {}",
                    other.type_name()
                )))
            }
        }

        if let Some(depth) = depth_setting(table, "dump")? {
            config.dump_depth = depth;
        }
        if let Some(depth) = depth_setting(table, "pull")? {
            config.pull_depth = depth;
        }

        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<()> {
        if self.dump_depth == 0 {
            return Err(Error::InvalidValue("dump depth must be >= 1".to_string()));
        }
        if self.pull_depth == 0 {
            return Err(Error::InvalidValue("pull depth must be >= 1".to_string()));
        }
        Ok(())
    }
}

fn depth_setting(table: &Table, section: &str) -> Result<Option<usize>> {
    let Some(value) = table.get_path(&[section, "max-depth"]) else {
        return Ok(None);
    };
    match value.as_i64() {
        Some(depth) if depth >= 0 => Ok(Some(depth as usize)),
        _ => Err(Error::InvalidValue(format!(
            "{section} max-depth must be a non-negative integer"
        ))),
    }
}

/// Combine library names into an `StdLib` set
pub fn parse_libraries<'a>(names: impl IntoIterator<Item = &'a str>) -> Result<StdLib> {
    let mut libs = StdLib::NONE;
    for name in names {
        libs = libs | library(name)?;
    }
    Ok(libs)
}

fn library(name: &str) -> Result<StdLib> {
    Ok(match name {
        "all" => StdLib::ALL_SAFE,
        "coroutine" => StdLib::COROUTINE,
        "table" => StdLib::TABLE,
        "io" => StdLib::IO,
        "os" => StdLib::OS,
        "string" => StdLib::STRING,
        "utf8" => StdLib::UTF8,
        "math" => StdLib::MATH,
        "package" => StdLib::PACKAGE,
        "debug" => {
            return Err(Error::InvalidValue(
                "the debug library needs an unsafe Lua state".to_string(),
            ))
        }
        other => return Err(Error::InvalidValue(format!("unknown library '{other}'"))),
    })
}
