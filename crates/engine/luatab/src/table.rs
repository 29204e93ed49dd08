//! Host-side dynamic tables
//!
//! A `Table` is an ordered list of entries that acts either as a string-keyed
//! map (every entry named) or as a 1-based sequence (no entry named). The
//! first entry decides which; mixing the two is a caller bug.

use crate::{Error, Result, Value};

/// Key style of a non-empty table
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TableMode {
    /// Entries are keyed by name
    Named,
    /// Entries are keyed by 1-based position
    Indexed,
}

/// A slot in a table: an optional key plus its value
#[derive(Debug, Clone, PartialEq)]
pub struct Entry {
    /// Key, present iff the entry lives in a named table
    pub name: Option<String>,
    pub value: Value,
}

impl Entry {
    /// Create a named entry
    pub fn named(name: impl Into<String>, value: impl Into<Value>) -> Self {
        Self {
            name: Some(name.into()),
            value: value.into(),
        }
    }

    /// Create an unnamed (sequence) entry
    pub fn indexed(value: impl Into<Value>) -> Self {
        Self {
            name: None,
            value: value.into(),
        }
    }
}

/// Ordered, growable table of tagged values
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Table {
    entries: Vec<Entry>,
}

impl Table {
    /// Create an empty table
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            entries: Vec::with_capacity(capacity),
        }
    }

    /// Build a named table from key/value pairs; later duplicates win
    pub fn from_pairs<K, V, I>(pairs: I) -> Self
    where
        K: Into<String>,
        V: Into<Value>,
        I: IntoIterator<Item = (K, V)>,
    {
        let mut table = Self::new();
        for (key, value) in pairs {
            table.set(key, value);
        }
        table
    }

    /// Build a sequence table from values in order
    pub fn from_values<V, I>(values: I) -> Self
    where
        V: Into<Value>,
        I: IntoIterator<Item = V>,
    {
        Self {
            entries: values.into_iter().map(Entry::indexed).collect(),
        }
    }

    /// Key style, decided by the first entry
    pub fn mode(&self) -> Option<TableMode> {
        self.entries.first().map(|e| match e.name {
            Some(_) => TableMode::Named,
            None => TableMode::Indexed,
        })
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn entries(&self) -> &[Entry] {
        &self.entries
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Entry> {
        self.entries.iter()
    }

    fn position(&self, key: &str) -> Option<usize> {
        self.entries
            .iter()
            .position(|e| e.name.as_deref() == Some(key))
    }

    /// Look up a named entry's value; unnamed entries never match
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.position(key).map(|i| &self.entries[i].value)
    }

    pub fn get_mut(&mut self, key: &str) -> Option<&mut Value> {
        match self.position(key) {
            Some(i) => Some(&mut self.entries[i].value),
            None => None,
        }
    }

    /// Value at a 1-based sequence position
    pub fn index(&self, index: usize) -> Option<&Value> {
        index
            .checked_sub(1)
            .and_then(|i| self.entries.get(i))
            .map(|e| &e.value)
    }

    /// Insert or overwrite a named entry, keeping its position on overwrite
    pub fn set(&mut self, key: impl Into<String>, value: impl Into<Value>) {
        let key = key.into();
        let value = value.into();
        debug_assert!(
            self.mode() != Some(TableMode::Indexed),
            "named set of '{key}' on an indexed table"
        );

        match self.position(&key) {
            Some(i) => self.entries[i].value = value,
            None => self.entries.push(Entry::named(key, value)),
        }
    }

    /// Append an unnamed entry at the next sequence position
    pub fn push(&mut self, value: impl Into<Value>) {
        debug_assert!(
            self.mode() != Some(TableMode::Named),
            "indexed push on a named table"
        );
        self.entries.push(Entry::indexed(value));
    }

    /// Named table stored under `key`, created when missing or nil
    fn child_table(&mut self, key: &str, path: &str) -> Result<&mut Table> {
        let index = match self.position(key) {
            Some(i) => {
                if self.entries[i].value.is_nil() {
                    self.entries[i].value = Value::Table(Table::new());
                }
                i
            }
            None => {
                self.entries.push(Entry::named(key, Table::new()));
                self.entries.len() - 1
            }
        };

        match &mut self.entries[index].value {
            Value::Table(t) => Ok(t),
            other => Err(Error::NotATable {
                path: path.to_string(),
                found: other.type_name(),
            }),
        }
    }

    /// Set a value through nested named tables, creating missing levels
    ///
    /// `set_path(&["a", "b", "c"], v)` leaves `self.a.b.c == v` with any
    /// sibling keys untouched. A non-table value sitting on an intermediate
    /// segment is an error and nothing is modified.
    pub fn set_path<S: AsRef<str>>(&mut self, path: &[S], value: impl Into<Value>) -> Result<()> {
        let Some((leaf, parents)) = path.split_last() else {
            return Err(Error::InvalidPath("empty path".to_string()));
        };

        // Check the whole walk before creating anything
        let mut probe = Some(&*self);
        for (depth, key) in parents.iter().enumerate() {
            let Some(table) = probe else { break };
            probe = match table.get(key.as_ref()) {
                Some(Value::Table(t)) => Some(t),
                None | Some(Value::Nil) => None,
                Some(other) => {
                    return Err(Error::NotATable {
                        path: join_path(&parents[..=depth]),
                        found: other.type_name(),
                    })
                }
            };
        }

        let mut current = self;
        for (depth, key) in parents.iter().enumerate() {
            current = current.child_table(key.as_ref(), &join_path(&parents[..=depth]))?;
        }
        current.set(leaf.as_ref(), value);
        Ok(())
    }

    /// Follow nested named tables and return the value at the end
    pub fn get_path<S: AsRef<str>>(&self, path: &[S]) -> Option<&Value> {
        let (leaf, parents) = path.split_last()?;
        let mut current = self;
        for key in parents {
            current = current.get(key.as_ref())?.as_table()?;
        }
        current.get(leaf.as_ref())
    }
}

pub(crate) fn join_path<S: AsRef<str>>(parts: &[S]) -> String {
    parts
        .iter()
        .map(|p| p.as_ref())
        .collect::<Vec<_>>()
        .join(".")
}

impl<'a> IntoIterator for &'a Table {
    type Item = &'a Entry;
    type IntoIter = std::slice::Iter<'a, Entry>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}

impl<K: Into<String>, V: Into<Value>> FromIterator<(K, V)> for Table {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self::from_pairs(iter)
    }
}

impl FromIterator<Value> for Table {
    fn from_iter<I: IntoIterator<Item = Value>>(iter: I) -> Self {
        Self::from_values(iter)
    }
}

impl From<Vec<Entry>> for Table {
    fn from(entries: Vec<Entry>) -> Self {
        Self { entries }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_named_table_basic() {
        let table = Table::from_pairs([("name", Value::from("dan")), ("age", Value::from(30))]);

        assert_eq!(table.mode(), Some(TableMode::Named));
        assert_eq!(table.len(), 2);
        assert_eq!(table.get("name").unwrap().as_str(), Some("dan"));
        assert_eq!(table.get("age").unwrap().as_i64(), Some(30));
        assert!(table.get("missing").is_none());
    }

    #[test]
    fn test_indexed_table_lookup_never_matches() {
        let table = Table::from_values(["john", "marie", "doe"]);

        assert_eq!(table.mode(), Some(TableMode::Indexed));
        assert!(table.get("john").is_none());
        assert!(table.get("1").is_none());
        assert_eq!(table.index(1).unwrap().as_str(), Some("john"));
        assert_eq!(table.index(3).unwrap().as_str(), Some("doe"));
        assert!(table.index(0).is_none());
        assert!(table.index(4).is_none());
    }

    #[test]
    fn test_empty_table_has_no_mode() {
        assert_eq!(Table::new().mode(), None);
    }

    #[test]
    fn test_set_same_value_twice() {
        let mut table = Table::new();
        table.set("k", 1.5);
        table.set("k", 1.5);

        assert_eq!(table.len(), 1);
        assert_eq!(table.get("k"), Some(&Value::Number(1.5)));
    }

    #[test]
    fn test_set_overwrites_in_place() {
        let mut table = Table::new();
        table.set("first", "a");
        table.set("k", "v1");
        table.set("last", "z");
        table.set("k", "v2");

        assert_eq!(table.len(), 3);
        assert_eq!(table.entries()[1].name.as_deref(), Some("k"));
        assert_eq!(table.entries()[1].value.as_str(), Some("v2"));
    }

    #[test]
    fn test_from_pairs_duplicate_names() {
        let table = Table::from_pairs([("a", 1), ("b", 2), ("a", 3)]);
        assert_eq!(table.len(), 2);
        assert_eq!(table.get("a").unwrap().as_i64(), Some(3));
    }

    #[test]
    fn test_set_path_creates_levels() {
        let mut table = Table::new();
        table.set_path(&["a", "b", "c"], "leaf").unwrap();

        let a = table.get("a").unwrap().as_table().unwrap();
        let b = a.get("b").unwrap().as_table().unwrap();
        assert_eq!(b.get("c").unwrap().as_str(), Some("leaf"));
        assert_eq!(table.get_path(&["a", "b", "c"]).unwrap().as_str(), Some("leaf"));
    }

    #[test]
    fn test_set_path_keeps_siblings() {
        let mut table = Table::new();
        table.set_path(&["a", "b", "c"], 1).unwrap();
        table.set_path(&["a", "b", "d"], 2).unwrap();
        table.set_path(&["a", "b", "c"], 3).unwrap();

        let b = table.get_path(&["a", "b"]).unwrap().as_table().unwrap();
        assert_eq!(b.len(), 2);
        assert_eq!(b.get("c").unwrap().as_i64(), Some(3));
        assert_eq!(b.get("d").unwrap().as_i64(), Some(2));
        assert_eq!(table.len(), 1);
    }

    #[test]
    fn test_set_path_single_segment() {
        let mut table = Table::new();
        table.set_path(&["only"], true).unwrap();
        assert_eq!(table.get("only").unwrap().as_bool(), Some(true));
    }

    #[test]
    fn test_set_path_replaces_nil() {
        let mut table = Table::new();
        table.set("a", Value::Nil);
        table.set_path(&["a", "b"], 1).unwrap();
        assert_eq!(table.get_path(&["a", "b"]).unwrap().as_i64(), Some(1));
    }

    #[test]
    fn test_set_path_rejects_scalar_segment() {
        let mut table = Table::new();
        table.set("a", "scalar");

        let err = table.set_path(&["a", "b", "c"], 1).unwrap_err();
        match err {
            Error::NotATable { path, found } => {
                assert_eq!(path, "a");
                assert_eq!(found, "string");
            }
            other => panic!("unexpected error: {other}"),
        }
        assert_eq!(table.get("a").unwrap().as_str(), Some("scalar"));
    }

    #[test]
    fn test_set_path_conflict_leaves_table_unchanged() {
        let mut table = Table::new();
        table.set_path(&["x", "y"], 5).unwrap();
        let before = table.clone();

        assert!(table.set_path(&["x", "y", "z"], 1).is_err());
        assert_eq!(table, before);
    }

    #[test]
    fn test_set_path_empty() {
        let mut table = Table::new();
        let path: [&str; 0] = [];
        assert!(matches!(
            table.set_path(&path, 1),
            Err(Error::InvalidPath(_))
        ));
    }

    #[test]
    fn test_collect_tables() {
        let named: Table = vec![("x", 1.0), ("y", 2.0)].into_iter().collect();
        assert_eq!(named.mode(), Some(TableMode::Named));

        let indexed: Table = vec![Value::from("a"), Value::from(4.20)].into_iter().collect();
        assert_eq!(indexed.mode(), Some(TableMode::Indexed));
        assert_eq!(indexed.len(), 2);
    }
}
