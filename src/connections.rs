//! No-auth connection list document.
//!
//! The no-auth extension reads its connections from an XML document rather
//! than from the properties file. Records are built by the no-auth resolver
//! and serialized here.

use std::fmt::Write as _;
use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use serde::Serialize;

/// File name of the connection document under the configuration home.
pub const CONNECTION_LIST_FILE: &str = "noauth-config.xml";

/// Protocol of every advertised connection.
pub const CONNECTION_PROTOCOL: &str = "rdp";

/// Port of every advertised connection.
pub const CONNECTION_PORT: &str = "3389";

/// One remote desktop connection advertised to unauthenticated users.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ConnectionRecord {
    /// Ordinal position in the hosts list; names the connection.
    pub index: usize,
    /// Target hostname, taken from the hosts list.
    pub hostname: String,
    /// Username for the connection, empty when the list ran short.
    pub username: String,
    /// Password for the connection, empty when the list ran short.
    pub password: String,
    /// Published remote application identifier, empty when unused.
    pub remote_app: String,
    /// Security mode shared by every record.
    pub security: String,
    /// Certificate-check override shared by every record.
    pub ignore_cert: String,
}

/// Ordered collection of connection records, serialized as one document.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ConnectionList {
    records: Vec<ConnectionRecord>,
}

impl ConnectionList {
    /// Wrap an already-built record sequence.
    pub fn new(records: Vec<ConnectionRecord>) -> Self {
        Self { records }
    }

    /// Records in hosts-list order.
    pub fn records(&self) -> &[ConnectionRecord] {
        &self.records
    }

    /// Number of records.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Whether the list holds no records.
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Render the document the no-auth extension consumes.
    ///
    /// Every record carries all seven parameters, with an empty value where
    /// nothing was supplied.
    pub fn render_xml(&self) -> String {
        let mut out = String::new();
        writeln!(out, "<configs>").ok();
        for record in &self.records {
            writeln!(
                out,
                "  <config name=\"connection{}\" protocol=\"{}\">",
                record.index, CONNECTION_PROTOCOL
            )
            .ok();
            param(&mut out, "hostname", &record.hostname);
            param(&mut out, "port", CONNECTION_PORT);
            param(&mut out, "username", &record.username);
            param(&mut out, "password", &record.password);
            param(&mut out, "remote-app", &record.remote_app);
            param(&mut out, "security", &record.security);
            param(&mut out, "ignore-cert", &record.ignore_cert);
            writeln!(out, "  </config>").ok();
        }
        writeln!(out, "</configs>").ok();
        out
    }

    /// Write the rendered document to `path`, creating parent directories
    /// as needed.
    pub fn write_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("creating {}", parent.display()))?;
        }
        fs::write(path, self.render_xml())
            .with_context(|| format!("writing {}", path.display()))?;
        Ok(())
    }
}

fn param(out: &mut String, name: &str, value: &str) {
    writeln!(
        out,
        "    <param name=\"{}\" value=\"{}\"/>",
        name,
        xml_escape(value)
    )
    .ok();
}

fn xml_escape(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());
    for ch in value.chars() {
        match ch {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&apos;"),
            _ => escaped.push(ch),
        }
    }
    escaped
}
