//! Diagnostic text dumps of host tables
//!
//! Output is line oriented and indented per nesting level. It is meant for
//! humans and carries no stability guarantee.

use crate::{Table, Value};
use std::io::{self, Write};

/// Default nesting level past which nested tables are not expanded
pub const DEFAULT_DUMP_DEPTH: usize = 32;

const MAX_DEPTH_LINE: &str = "max depth reached";

/// Renders tables as indented text with a bounded recursion depth
#[derive(Debug, Clone, Copy)]
pub struct TableDumper {
    /// Deepest level whose contents are still printed
    pub max_depth: usize,
    /// Spaces per nesting level
    pub indent: usize,
}

impl Default for TableDumper {
    fn default() -> Self {
        Self {
            max_depth: DEFAULT_DUMP_DEPTH,
            indent: 4,
        }
    }
}

impl TableDumper {
    pub fn new(max_depth: usize) -> Self {
        Self {
            max_depth,
            ..Default::default()
        }
    }

    /// Write every entry of `table`, recursing into nested tables
    pub fn dump_to<W: Write>(&self, table: &Table, out: &mut W) -> io::Result<()> {
        self.dump_level(table, 0, out)
    }

    /// Dump with a header and footer naming the table
    ///
    /// A missing table prints `Could not find table` between the two.
    pub fn dump_named<W: Write>(
        &self,
        name: &str,
        table: Option<&Table>,
        out: &mut W,
    ) -> io::Result<()> {
        writeln!(out, "==== Dumping Table: {} ====", name)?;
        match table {
            Some(table) => self.dump_to(table, out)?,
            None => writeln!(out, "Could not find table")?,
        }
        writeln!(out, "==== Dumping End ====")?;
        writeln!(out)
    }

    /// Render a table into a string
    pub fn dump_to_string(&self, table: &Table) -> String {
        let mut buf = Vec::new();
        // Writing into a Vec cannot fail
        let _ = self.dump_to(table, &mut buf);
        String::from_utf8_lossy(&buf).into_owned()
    }

    fn dump_level<W: Write>(&self, table: &Table, depth: usize, out: &mut W) -> io::Result<()> {
        let pad = depth * self.indent;
        for (i, entry) in table.iter().enumerate() {
            match &entry.name {
                Some(name) => write!(out, "{:width$}{} = ", "", name, width = pad)?,
                None => write!(out, "{:width$}{}: ", "", i + 1, width = pad)?,
            }
            self.write_value(&entry.value, depth, out)?;
        }
        Ok(())
    }

    fn write_value<W: Write>(&self, value: &Value, depth: usize, out: &mut W) -> io::Result<()> {
        let Value::Table(nested) = value else {
            return writeln!(out, "{}", format_scalar(value));
        };

        writeln!(out, "table (depth: {})", depth)?;
        if depth < self.max_depth {
            self.dump_level(nested, depth + 1, out)
        } else {
            let pad = (depth + 1) * self.indent;
            writeln!(out, "{:width$}{}", "", MAX_DEPTH_LINE, width = pad)
        }
    }
}

/// Single-line rendering of a value; tables render as `table`
pub fn format_scalar(value: &Value) -> String {
    match value {
        Value::Nil => "nil".to_string(),
        Value::Boolean(b) => b.to_string(),
        Value::Integer(i) => i.to_string(),
        Value::Number(n) => format_number(*n),
        Value::String(s) => s.clone(),
        Value::Table(_) => "table".to_string(),
        Value::LightUserData(ud) => format!("<lightuserdata: {:p}>", ud.0),
        Value::Function(f) => format!("<function: {:p}>", f.to_pointer()),
    }
}

fn format_number(n: f64) -> String {
    if n.is_finite() && n.fract() == 0.0 && n.abs() < 1e15 {
        format!("{:.0}", n)
    } else {
        n.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Table with `levels` nested tables under `next`, innermost holding `end = 1`
    fn chain(levels: usize) -> Table {
        let mut inner = Table::from_pairs([("end", 1)]);
        for _ in 0..levels {
            inner = Table::from_pairs([("next", inner)]);
        }
        inner
    }

    #[test]
    fn test_dump_scalars() {
        let mut table = Table::new();
        table.set("name", "dan");
        table.set("whole", 4.0);
        table.set("ratio", 4.2);
        table.set("count", 3);
        table.set("ok", false);
        table.set("none", Value::Nil);

        let text = TableDumper::default().dump_to_string(&table);
        assert_eq!(
            text,
            "name = dan\nwhole = 4\nratio = 4.2\ncount = 3\nok = false\nnone = nil\n"
        );
    }

    #[test]
    fn test_dump_indexed_and_nested() {
        let table = Table::from_pairs([
            ("list", Value::from(Table::from_values(["a", "b"]))),
            ("after", Value::from(true)),
        ]);

        let text = TableDumper::default().dump_to_string(&table);
        assert_eq!(
            text,
            "list = table (depth: 0)\n    1: a\n    2: b\nafter = true\n"
        );
    }

    #[test]
    fn test_dump_handles() {
        let table = Table::from_values([Value::light_userdata(std::ptr::null_mut())]);
        let text = TableDumper::default().dump_to_string(&table);
        assert!(text.starts_with("1: <lightuserdata: 0x"));
    }

    #[test]
    fn test_dump_at_max_depth_prints_everything() {
        let dumper = TableDumper::new(3);
        let text = dumper.dump_to_string(&chain(3));

        assert!(!text.contains(MAX_DEPTH_LINE));
        assert!(text.contains("            end = 1\n"));
    }

    #[test]
    fn test_dump_past_max_depth_stops() {
        let dumper = TableDumper::new(3);
        let text = dumper.dump_to_string(&chain(4));

        assert!(text.contains(&format!("                {}\n", MAX_DEPTH_LINE)));
        assert!(!text.contains("end = 1"));
        assert_eq!(text.lines().count(), 5);
    }

    #[test]
    fn test_dump_default_depth_deep_chain() {
        let text = TableDumper::default().dump_to_string(&chain(200));
        assert_eq!(text.matches(MAX_DEPTH_LINE).count(), 1);
    }

    #[test]
    fn test_dump_named_missing() {
        let mut buf = Vec::new();
        TableDumper::default()
            .dump_named("GONE", None, &mut buf)
            .unwrap();

        let text = String::from_utf8(buf).unwrap();
        assert_eq!(
            text,
            "==== Dumping Table: GONE ====\nCould not find table\n==== Dumping End ====\n\n"
        );
    }
}
