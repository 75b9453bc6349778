//! Immutable environment snapshot.
//!
//! Every configuration decision is made against a snapshot of the process
//! environment captured once at startup. Resolvers never read the ambient
//! environment, so they can be driven by synthetic snapshots in tests.

use std::collections::HashMap;

/// Address advertised by a linked container.
///
/// Container links expose their endpoint through convention-named variables
/// (`<PREFIX>_PORT_<PORT>_TCP_ADDR` / `<PREFIX>_PORT_<PORT>_TCP_PORT`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LinkEndpoint {
    /// Address of the linked container.
    pub addr: String,
    /// Port of the linked container, when advertised.
    pub port: Option<String>,
}

/// Read-only view of the environment variables captured at startup.
///
/// Variables set to an empty string are treated as absent. The contract this
/// implements was defined in terms of shell `-n`/`-z` tests, which cannot
/// tell an empty value from an unset one, and the operator-facing semantics
/// keep that convention.
#[derive(Debug, Clone, Default)]
pub struct EnvSnapshot {
    vars: HashMap<String, String>,
}

impl EnvSnapshot {
    /// Capture the current process environment.
    ///
    /// Entries whose name or value is not valid Unicode are skipped; nothing
    /// in the contract can name them, so they fold into the same "absent"
    /// bucket as empty values.
    pub fn capture() -> Self {
        Self::from_pairs(std::env::vars_os().filter_map(|(name, value)| {
            Some((name.into_string().ok()?, value.into_string().ok()?))
        }))
    }

    /// Build a snapshot from explicit pairs. Empty values are dropped.
    pub fn from_pairs<I, K, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let vars = pairs
            .into_iter()
            .map(|(name, value)| (name.into(), value.into()))
            .filter(|(_, value): &(String, String)| !value.is_empty())
            .collect();
        Self { vars }
    }

    /// Look up a variable. Returns `None` for unset or empty values.
    pub fn get(&self, name: &str) -> Option<&str> {
        self.vars.get(name).map(String::as_str)
    }

    /// Look up a variable, cloning the value.
    pub fn get_owned(&self, name: &str) -> Option<String> {
        self.vars.get(name).cloned()
    }

    /// Whether a variable is set to a non-empty value.
    pub fn is_set(&self, name: &str) -> bool {
        self.vars.contains_key(name)
    }

    /// Read the endpoint a container link advertises for `prefix` on `port`.
    ///
    /// A link counts as present when the `_TCP_ADDR` variable is set; the
    /// `_TCP_PORT` variable may still be absent in that case.
    pub fn link_endpoint(&self, prefix: &str, port: u16) -> Option<LinkEndpoint> {
        let addr = self.get(&format!("{}_PORT_{}_TCP_ADDR", prefix, port))?;
        let advertised = self.get_owned(&format!("{}_PORT_{}_TCP_PORT", prefix, port));
        Some(LinkEndpoint {
            addr: addr.to_owned(),
            port: advertised,
        })
    }
}
