//! Ordered property store behind the generated properties file.
//!
//! Resolvers append entries through a handle to this store; the driver
//! serializes it exactly once at the end of a successful run.

use std::fmt::Write as _;
use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use chrono::{DateTime, Local};
use serde::Serialize;

/// File name of the generated properties file under the configuration home.
pub const PROPERTIES_FILE: &str = "guacamole.properties";

/// A single `name: value` line destined for the properties file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PropertyEntry {
    /// Property name, exactly as the web application expects it.
    pub name: String,
    /// Property value, verbatim.
    pub value: String,
}

/// Append-only accumulator of generated configuration entries.
///
/// Entries keep insertion order and repeated names are kept as-is. The web
/// application reads the file line by line, so for a repeated name the last
/// entry wins there; the store itself never deduplicates.
#[derive(Debug, Clone, Default, Serialize)]
pub struct PropertyStore {
    entries: Vec<PropertyEntry>,
}

impl PropertyStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an entry unconditionally.
    pub fn set(&mut self, name: &str, value: impl Into<String>) {
        self.entries.push(PropertyEntry {
            name: name.to_owned(),
            value: value.into(),
        });
    }

    /// Append an entry when `value` is set and non-empty, otherwise do nothing.
    pub fn set_if_present(&mut self, name: &str, value: Option<&str>) {
        match value {
            Some(value) if !value.is_empty() => self.set(name, value),
            _ => {}
        }
    }

    /// Entries in insertion order.
    pub fn entries(&self) -> &[PropertyEntry] {
        &self.entries
    }

    /// Number of entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the store holds no entries.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Render the properties file content with a generation header.
    pub fn render(&self, generated: DateTime<Local>) -> String {
        let mut out = String::new();
        writeln!(
            out,
            "# guacamole.properties - generated {}",
            generated.to_rfc2822()
        )
        .ok();
        for entry in &self.entries {
            writeln!(out, "{}: {}", entry.name, entry.value).ok();
        }
        out
    }

    /// Write the rendered file to `path`, creating parent directories as needed.
    pub fn write_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("creating {}", parent.display()))?;
        }
        fs::write(path, self.render(Local::now()))
            .with_context(|| format!("writing {}", path.display()))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_set_appends_in_order() {
        let mut store = PropertyStore::new();
        store.set("guacd-hostname", "10.0.0.2");
        store.set("guacd-port", "4822");
        let names: Vec<&str> = store.entries().iter().map(|e| e.name.as_str()).collect();
        assert_eq!(names, ["guacd-hostname", "guacd-port"]);
    }

    #[test]
    fn test_duplicate_names_are_kept() {
        let mut store = PropertyStore::new();
        store.set("secret-key", "one");
        store.set("secret-key", "two");
        assert_eq!(store.len(), 2);
        assert_eq!(store.entries()[0].value, "one");
        assert_eq!(store.entries()[1].value, "two");
    }

    #[test]
    fn test_set_if_present_skips_absent_and_empty() {
        let mut store = PropertyStore::new();
        store.set_if_present("ldap-port", None);
        store.set_if_present("ldap-port", Some(""));
        assert!(store.is_empty());
        store.set_if_present("ldap-port", Some("389"));
        assert_eq!(store.len(), 1);
        assert_eq!(store.entries()[0].value, "389");
    }

    #[test]
    fn test_render_header_and_lines() {
        let mut store = PropertyStore::new();
        store.set("mysql-port", "3306");
        let rendered = store.render(Local::now());
        let mut lines = rendered.lines();
        let header = lines.next().unwrap();
        assert!(header.starts_with("# guacamole.properties - generated "));
        assert_eq!(lines.next(), Some("mysql-port: 3306"));
        assert_eq!(lines.next(), None);
    }

    #[test]
    fn test_write_to_creates_parent_directories() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested/home/guacamole.properties");
        let mut store = PropertyStore::new();
        store.set("guacd-hostname", "guacd");
        store.write_to(&path).unwrap();
        let content = std::fs::read_to_string(&path).unwrap();
        assert!(content.contains("guacd-hostname: guacd"));
    }

    proptest! {
        #[test]
        fn prop_render_preserves_insertion_order(
            entries in proptest::collection::vec(
                ("[a-z][a-z-]{0,15}", "[a-zA-Z0-9._-]{0,12}"),
                0..16,
            )
        ) {
            let mut store = PropertyStore::new();
            for (name, value) in &entries {
                store.set(name, value.as_str());
            }
            let rendered = store.render(Local::now());
            let body: Vec<&str> = rendered.lines().skip(1).collect();
            prop_assert_eq!(body.len(), entries.len());
            for (line, (name, value)) in body.iter().zip(&entries) {
                let expected = format!("{}: {}", name, value);
                prop_assert_eq!(*line, expected.as_str());
            }
        }
    }
}
