//! KDL document reader
//!
//! Parses KDL text into a named [`Table`], giving host code a file format for
//! tables it wants to push into Lua. Configuration files are read this way.
//!
//! # KDL Mapping
//!
//! - Node name becomes the key
//! - A single argument becomes the value; several become a sequence table
//! - Properties and child nodes become a nested named table
//! - Later nodes with the same name replace earlier ones
//!
//! # Example
//!
//! ```kdl
//! user {
//!     name "dan"
//!     skills "skill1" "skill2"
//! }
//! window width=800 height=600
//! ```
//!
//! Maps to `user.name`, `user.skills[1..2]`, `window.width`, `window.height`.

use crate::{Error, Result, Table, Value};
use std::path::Path;
use tracing::warn;

/// KDL document reader
pub struct KdlReader;

impl KdlReader {
    /// Parse a KDL file into a table
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Table> {
        let content = std::fs::read_to_string(path.as_ref())?;
        Self::from_string(&content)
    }

    /// Parse a KDL string into a table
    pub fn from_string(content: &str) -> Result<Table> {
        let doc: kdl::KdlDocument = content.parse()?;
        Self::parse_document(&doc)
    }

    fn parse_document(doc: &kdl::KdlDocument) -> Result<Table> {
        let mut table = Table::new();
        for node in doc.nodes() {
            table.set(node.name().value(), Self::parse_node(node)?);
        }
        Ok(table)
    }

    /// Parse a KDL node into the value stored under its name
    fn parse_node(node: &kdl::KdlNode) -> Result<Value> {
        let mut args = Vec::new();
        let mut props = Vec::new();
        for entry in node.entries() {
            let value = Self::kdl_value_to_value(entry.value())?;
            match entry.name() {
                Some(name) => props.push((name.value().to_string(), value)),
                None => args.push(value),
            }
        }

        if props.is_empty() && node.children().is_none() {
            return Ok(match args.len() {
                0 => Value::Nil,
                1 => args.remove(0),
                _ => Value::Table(Table::from_values(args)),
            });
        }

        if !args.is_empty() {
            warn!(
                node = node.name().value(),
                "ignoring arguments on a node with properties or children"
            );
        }

        let mut table = Table::from_pairs(props);
        if let Some(children) = node.children() {
            for child in children.nodes() {
                table.set(child.name().value(), Self::parse_node(child)?);
            }
        }
        Ok(Value::Table(table))
    }

    /// Convert a KDL value to our Value type
    fn kdl_value_to_value(kdl_val: &kdl::KdlValue) -> Result<Value> {
        Ok(match kdl_val {
            kdl::KdlValue::String(s) => Value::String(s.clone()),
            kdl::KdlValue::Integer(i) => Value::Integer(i64::try_from(*i).map_err(|_| {
                Error::InvalidValue(format!("integer {i} does not fit in 64 bits"))
            })?),
            kdl::KdlValue::Float(f) => Value::Number(*f),
            kdl::KdlValue::Bool(b) => Value::Boolean(*b),
            kdl::KdlValue::Null => Value::Nil,
        })
    }
}
