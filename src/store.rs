//! Nested value store addressed by dotted paths
//!
//! `database.host` walks the interior node `database` and reads its `host`
//! child. Reads never turn a scalar into an interior node; writes replace a
//! scalar in the way with a fresh interior node.

use std::collections::BTreeMap;
use std::io::{self, Write};
use std::time::Duration;

use crate::coerce;
use crate::value::{Map, Value};

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Store {
    data: Map,
}

impl Store {
    pub fn new() -> Self {
        Self::default()
    }

    /// Wrap an existing tree. The root must be a mapping.
    pub fn from_map(data: Map) -> Self {
        Self { data }
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Assign `value` at `path`, creating interior nodes along the way.
    pub fn set(&mut self, path: &str, value: impl Into<Value>) {
        let value = value.into();
        let mut segments = path.split('.').peekable();
        let mut current = &mut self.data;

        while let Some(segment) = segments.next() {
            if segments.peek().is_none() {
                current.insert(segment.to_string(), value);
                return;
            }
            let node = current.entry(segment.to_string()).or_insert_with(|| Value::Map(Map::new()));
            if !node.is_map() {
                *node = Value::Map(Map::new());
            }
            current = match node {
                Value::Map(map) => map,
                _ => unreachable!("interior node was just ensured"),
            };
        }
    }

    pub fn get(&self, path: &str) -> Option<&Value> {
        let mut segments = path.split('.');
        let first = segments.next()?;
        let mut current = self.data.get(first)?;
        for segment in segments {
            current = current.as_map()?.get(segment)?;
        }
        Some(current)
    }

    pub fn is_set(&self, path: &str) -> bool {
        self.get(path).is_some()
    }

    /// Deep-merge `other` into `self`. Where both sides hold an interior node
    /// the merge recurses, everywhere else `other` wins.
    pub fn merge(&mut self, other: &Store) {
        merge_maps(&mut self.data, &other.data);
    }

    /// Full dotted paths of every leaf, sorted.
    pub fn all_keys(&self) -> Vec<String> {
        let mut keys = Vec::new();
        collect_keys("", &self.data, &mut keys);
        keys.sort();
        keys
    }

    /// Every leaf with its full dotted path, in `all_keys` order.
    pub fn leaves(&self) -> Vec<(String, &Value)> {
        self.all_keys()
            .into_iter()
            .filter_map(|key| self.get(&key).map(|value| (key, value)))
            .collect()
    }

    pub fn as_map(&self) -> &Map {
        &self.data
    }

    pub fn get_string(&self, key: &str) -> String {
        coerce::to_string(self.get(key))
    }

    pub fn get_i8(&self, key: &str) -> i8 {
        coerce::to_i8(self.get(key))
    }

    pub fn get_i16(&self, key: &str) -> i16 {
        coerce::to_i16(self.get(key))
    }

    pub fn get_i32(&self, key: &str) -> i32 {
        coerce::to_i32(self.get(key))
    }

    pub fn get_i64(&self, key: &str) -> i64 {
        coerce::to_i64(self.get(key))
    }

    pub fn get_isize(&self, key: &str) -> isize {
        coerce::to_isize(self.get(key))
    }

    pub fn get_u8(&self, key: &str) -> u8 {
        coerce::to_u8(self.get(key))
    }

    pub fn get_u16(&self, key: &str) -> u16 {
        coerce::to_u16(self.get(key))
    }

    pub fn get_u32(&self, key: &str) -> u32 {
        coerce::to_u32(self.get(key))
    }

    pub fn get_u64(&self, key: &str) -> u64 {
        coerce::to_u64(self.get(key))
    }

    pub fn get_usize(&self, key: &str) -> usize {
        coerce::to_usize(self.get(key))
    }

    pub fn get_f64(&self, key: &str) -> f64 {
        coerce::to_f64(self.get(key))
    }

    pub fn get_bool(&self, key: &str) -> bool {
        coerce::to_bool(self.get(key))
    }

    pub fn get_duration(&self, key: &str) -> Duration {
        coerce::to_duration(self.get(key))
    }

    pub fn get_string_slice(&self, key: &str) -> Vec<String> {
        coerce::to_string_slice(self.get(key))
    }

    pub fn get_string_map(&self, key: &str) -> BTreeMap<String, String> {
        coerce::to_string_map(self.get(key))
    }

    /// Write every leaf as `key: value (kind)`.
    pub fn write_debug<W: Write>(&self, out: &mut W) -> io::Result<()> {
        writeln!(out, "--- flagstack configuration ---")?;
        let leaves = self.leaves();
        if leaves.is_empty() {
            writeln!(out, "  (empty)")?;
        }
        for (key, value) in leaves {
            writeln!(out, "  {}: {} ({})", key, value, value.kind())?;
        }
        writeln!(out, "-------------------------------")
    }
}

fn merge_maps(dst: &mut Map, src: &Map) {
    for (key, src_value) in src {
        if let (Some(Value::Map(dst_child)), Value::Map(src_child)) = (dst.get_mut(key), src_value)
        {
            merge_maps(dst_child, src_child);
            continue;
        }
        dst.insert(key.clone(), src_value.clone());
    }
}

fn collect_keys(prefix: &str, data: &Map, keys: &mut Vec<String>) {
    for (key, value) in data {
        let full_key = if prefix.is_empty() { key.clone() } else { format!("{}.{}", prefix, key) };
        match value {
            Value::Map(nested) => collect_keys(&full_key, nested, keys),
            _ => keys.push(full_key),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_set_and_get_nested() {
        let mut store = Store::new();
        store.set("database.host", "localhost");
        store.set("database.port", 5432);
        store.set("debug", true);

        assert_eq!(store.get("database.host"), Some(&Value::from("localhost")));
        assert_eq!(store.get("database.port"), Some(&Value::Int(5432)));
        assert!(store.get("database").is_some_and(Value::is_map));
        assert_eq!(store.get("database.user"), None);
    }

    #[test]
    fn test_get_stops_at_leaf() {
        let mut store = Store::new();
        store.set("port", 8080);
        assert_eq!(store.get("port.number"), None);
        assert!(!store.is_set("port.number"));
    }

    #[test]
    fn test_set_replaces_leaf_with_interior_node() {
        let mut store = Store::new();
        store.set("port", 8080);
        store.set("port.number", 9090);
        assert_eq!(store.get("port.number"), Some(&Value::Int(9090)));
        assert_eq!(store.all_keys(), vec!["port.number"]);
    }

    #[test]
    fn test_is_set_counts_falsy_values() {
        let mut store = Store::new();
        store.set("enabled", false);
        store.set("retries", 0);
        store.set("name", "");
        assert!(store.is_set("enabled"));
        assert!(store.is_set("retries"));
        assert!(store.is_set("name"));
        assert!(!store.is_set("missing"));
    }

    #[test]
    fn test_merge_is_right_biased_and_deep() {
        let mut base = Store::new();
        base.set("db.user", "default_user");
        base.set("db.host", "localhost");
        base.set("port", 1111);

        let mut overlay = Store::new();
        overlay.set("db.user", "config_user");
        overlay.set("port", 2222);
        overlay.set("features", Value::list(["dark_mode"]));

        base.merge(&overlay);
        assert_eq!(base.get_string("db.user"), "config_user");
        assert_eq!(base.get_string("db.host"), "localhost");
        assert_eq!(base.get_i64("port"), 2222);
        assert_eq!(base.get_string_slice("features"), vec!["dark_mode"]);
    }

    #[test]
    fn test_merge_scalar_over_interior_node() {
        let mut base = Store::new();
        base.set("db.host", "localhost");
        let mut overlay = Store::new();
        overlay.set("db", "sqlite://memory");

        base.merge(&overlay);
        assert_eq!(base.get_string("db"), "sqlite://memory");
        assert_eq!(base.get("db.host"), None);
    }

    #[test]
    fn test_clone_is_independent() {
        let mut original = Store::new();
        original.set("db.host", "localhost");
        original.set("hosts", Value::list(["a", "b"]));

        let mut copy = original.clone();
        copy.set("db.host", "elsewhere");
        copy.set("hosts", Value::list(["c"]));
        copy.set("db.extra", 1);

        assert_eq!(original.get_string("db.host"), "localhost");
        assert_eq!(original.get_string_slice("hosts"), vec!["a", "b"]);
        assert!(!original.is_set("db.extra"));
    }

    #[test]
    fn test_all_keys_sorted_leaves_only() {
        let mut store = Store::new();
        store.set("z", 1);
        store.set("a.b.c", 2);
        store.set("a.a", 3);
        store.set("a-b", 4);
        store.set("empty", Value::Map(Map::new()));
        assert_eq!(store.all_keys(), vec!["a-b", "a.a", "a.b.c", "z"]);
    }

    #[test]
    fn test_write_debug_lists_leaves() {
        let mut store = Store::new();
        store.set("port", 8080);
        store.set("db.host", "localhost");

        let mut out = Vec::new();
        store.write_debug(&mut out).expect("write");
        let text = String::from_utf8(out).expect("utf8");
        assert!(text.contains("  db.host: localhost (string)\n"));
        assert!(text.contains("  port: 8080 (int)\n"));

        let mut out = Vec::new();
        Store::new().write_debug(&mut out).expect("write");
        assert!(String::from_utf8(out).expect("utf8").contains("(empty)"));
    }
}
