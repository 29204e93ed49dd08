//! Tagged values held by host-side tables

use crate::Table;
use mlua::prelude::*;
use mlua::WeakLua;
use std::ffi::c_void;
use std::fmt;

/// A Lua function together with the state that owns it
///
/// Functions can only be pushed back into the state they came from.
#[derive(Clone)]
pub struct FunctionHandle {
    func: LuaFunction,
    owner: WeakLua,
}

impl FunctionHandle {
    /// Wrap `func`, which must have been created by `lua`
    pub fn new(lua: &Lua, func: LuaFunction) -> Self {
        Self {
            func,
            owner: lua.weak(),
        }
    }

    pub fn function(&self) -> &LuaFunction {
        &self.func
    }

    pub fn into_function(self) -> LuaFunction {
        self.func
    }

    /// Whether this function lives in `lua`
    pub fn belongs_to(&self, lua: &Lua) -> bool {
        self.owner == lua.weak()
    }

    pub fn to_pointer(&self) -> *const c_void {
        self.func.to_pointer()
    }
}

impl fmt::Debug for FunctionHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("FunctionHandle")
            .field(&self.func.to_pointer())
            .finish()
    }
}

impl PartialEq for FunctionHandle {
    fn eq(&self, other: &Self) -> bool {
        self.owner == other.owner && self.to_pointer() == other.to_pointer()
    }
}

/// A value in a host-side table
///
/// Each variant mirrors one Lua type the marshaller understands. Light
/// userdata and functions are carried as opaque handles and never
/// interpreted.
#[derive(Debug, Clone, Default)]
pub enum Value {
    /// Nil/absent value
    #[default]
    Nil,
    /// Boolean value
    Boolean(bool),
    /// Lua 5.4 integer subtype
    Integer(i64),
    /// Floating point number
    Number(f64),
    /// String value
    String(String),
    /// Nested table, owned by the entry holding it
    Table(Table),
    /// Opaque pointer handle
    LightUserData(LuaLightUserData),
    /// Opaque function handle
    Function(FunctionHandle),
}

impl Value {
    pub fn nil() -> Self {
        Value::Nil
    }

    pub fn boolean(b: bool) -> Self {
        Value::Boolean(b)
    }

    pub fn integer(i: i64) -> Self {
        Value::Integer(i)
    }

    pub fn number(n: f64) -> Self {
        Value::Number(n)
    }

    pub fn string(s: impl Into<String>) -> Self {
        Value::String(s.into())
    }

    pub fn table(t: Table) -> Self {
        Value::Table(t)
    }

    pub fn light_userdata(ptr: *mut c_void) -> Self {
        Value::LightUserData(LuaLightUserData(ptr))
    }

    /// Function handle; `f` must belong to `lua`
    pub fn function(lua: &Lua, f: LuaFunction) -> Self {
        Value::Function(FunctionHandle::new(lua, f))
    }

    /// Lua name of this value's type
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Nil => "nil",
            Value::Boolean(_) => "boolean",
            Value::Integer(_) | Value::Number(_) => "number",
            Value::String(_) => "string",
            Value::Table(_) => "table",
            Value::LightUserData(_) => "lightuserdata",
            Value::Function(_) => "function",
        }
    }

    pub fn is_nil(&self) -> bool {
        matches!(self, Value::Nil)
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Boolean(b) => Some(*b),
            _ => None,
        }
    }

    /// Integer view; floats qualify only when they have no fractional part
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Value::Integer(i) => Some(*i),
            Value::Number(n)
                if n.fract() == 0.0 && *n >= i64::MIN as f64 && *n < i64::MAX as f64 =>
            {
                Some(*n as i64)
            }
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Number(n) => Some(*n),
            Value::Integer(i) => Some(*i as f64),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s.as_str()),
            _ => None,
        }
    }

    pub fn as_table(&self) -> Option<&Table> {
        match self {
            Value::Table(t) => Some(t),
            _ => None,
        }
    }

    pub fn as_table_mut(&mut self) -> Option<&mut Table> {
        match self {
            Value::Table(t) => Some(t),
            _ => None,
        }
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Nil, Value::Nil) => true,
            (Value::Boolean(a), Value::Boolean(b)) => a == b,
            (Value::Integer(a), Value::Integer(b)) => a == b,
            (Value::Number(a), Value::Number(b)) => a == b,
            (Value::String(a), Value::String(b)) => a == b,
            (Value::Table(a), Value::Table(b)) => a == b,
            (Value::LightUserData(a), Value::LightUserData(b)) => a == b,
            // Functions compare by identity
            (Value::Function(a), Value::Function(b)) => a == b,
            _ => false,
        }
    }
}

// Conversion from common types

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Boolean(b)
    }
}

impl From<i32> for Value {
    fn from(i: i32) -> Self {
        Value::Integer(i as i64)
    }
}

impl From<i64> for Value {
    fn from(i: i64) -> Self {
        Value::Integer(i)
    }
}

impl From<u32> for Value {
    fn from(i: u32) -> Self {
        Value::Integer(i as i64)
    }
}

impl From<f32> for Value {
    fn from(f: f32) -> Self {
        Value::Number(f as f64)
    }
}

impl From<f64> for Value {
    fn from(f: f64) -> Self {
        Value::Number(f)
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::String(s)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::String(s.to_string())
    }
}

impl From<Table> for Value {
    fn from(t: Table) -> Self {
        Value::Table(t)
    }
}

impl From<LuaLightUserData> for Value {
    fn from(ud: LuaLightUserData) -> Self {
        Value::LightUserData(ud)
    }
}

impl From<FunctionHandle> for Value {
    fn from(f: FunctionHandle) -> Self {
        Value::Function(f)
    }
}
