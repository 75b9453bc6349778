//! Unauthenticated connection-list backend.
//!
//! The no-auth extension presents a fixed list of remote desktop
//! connections to anyone who opens the gateway. The list is assembled from
//! parallel environment-supplied lists keyed by the hosts list.

use std::path::Path;

use serde::Serialize;

use crate::connections::{ConnectionList, ConnectionRecord};
use crate::env::EnvSnapshot;
use crate::errors::BootstrapError;
use crate::properties::PropertyStore;

/// Validated parameters for the no-auth connection list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NoAuthParams {
    /// Connection hostnames, one record each. Never empty.
    pub hostnames: Vec<String>,
    /// Usernames aligned with `hostnames`; may be shorter.
    pub usernames: Vec<String>,
    /// Passwords aligned with `hostnames`; may be shorter.
    pub passwords: Vec<String>,
    /// Remote application identifiers aligned with `hostnames`; may be
    /// shorter.
    pub remote_apps: Vec<String>,
    /// Security mode applied to every record.
    pub security: Option<String>,
    /// Certificate-check override applied to every record.
    pub ignore_cert: Option<String>,
}

impl NoAuthParams {
    /// Validate and collect parameters from the snapshot.
    ///
    /// Only the hosts list is validated. The parallel lists may be any
    /// length; positions beyond their end read as empty strings. That
    /// padding is a deliberate leniency, not an oversight.
    pub fn resolve(env: &EnvSnapshot) -> Result<Self, BootstrapError> {
        let hostnames = split_list(env.get("NOAUTH_HOSTNAMES"));
        if hostnames.is_empty() {
            return Err(BootstrapError::ConnectionHostsMissing);
        }

        Ok(Self {
            hostnames,
            usernames: split_list(env.get("NOAUTH_USERNAMES")),
            passwords: split_list(env.get("NOAUTH_PASSWORDS")),
            remote_apps: split_list(env.get("NOAUTH_REMOTE_APPS")),
            security: env.get_owned("NOAUTH_SECURITY"),
            ignore_cert: env.get_owned("NOAUTH_IGNORE_CERT"),
        })
    }

    /// Build one record per hostname, padding the shorter lists.
    pub fn connection_list(&self) -> ConnectionList {
        let records = self
            .hostnames
            .iter()
            .enumerate()
            .map(|(index, hostname)| ConnectionRecord {
                index,
                hostname: hostname.clone(),
                username: padded(&self.usernames, index),
                password: padded(&self.passwords, index),
                remote_app: padded(&self.remote_apps, index),
                security: self.security.clone().unwrap_or_default(),
                ignore_cert: self.ignore_cert.clone().unwrap_or_default(),
            })
            .collect();
        ConnectionList::new(records)
    }

    /// Record where the generated document lives.
    pub fn emit_properties(&self, document_path: &Path, store: &mut PropertyStore) {
        store.set("noauth-config", document_path.display().to_string());
    }
}

/// Split a list variable on commas and whitespace, dropping empty fields.
fn split_list(value: Option<&str>) -> Vec<String> {
    value
        .map(|value| {
            value
                .split(|c: char| c == ',' || c.is_whitespace())
                .filter(|field| !field.is_empty())
                .map(str::to_owned)
                .collect()
        })
        .unwrap_or_default()
}

/// Value at `index`, or an empty string when `list` is shorter.
fn padded(list: &[String], index: usize) -> String {
    list.get(index).cloned().unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_split_list_on_commas_and_whitespace() {
        assert_eq!(split_list(Some("a,b c")), ["a", "b", "c"]);
        assert_eq!(split_list(Some("a, ,b,,")), ["a", "b"]);
        assert_eq!(split_list(Some("  ")), Vec::<String>::new());
        assert_eq!(split_list(None), Vec::<String>::new());
    }

    #[test]
    fn test_blank_hosts_list_fails() {
        let env = EnvSnapshot::from_pairs([("NOAUTH_HOSTNAMES", ", ,")]);
        let err = NoAuthParams::resolve(&env).unwrap_err();
        assert_eq!(err, BootstrapError::ConnectionHostsMissing);
    }

    #[test]
    fn test_short_lists_pad_with_empty_strings() {
        let env = EnvSnapshot::from_pairs([
            ("NOAUTH_HOSTNAMES", "a,b,c"),
            ("NOAUTH_USERNAMES", "u1"),
        ]);
        let params = NoAuthParams::resolve(&env).unwrap();
        let list = params.connection_list();
        assert_eq!(list.len(), 3);
        assert_eq!(list.records()[0].username, "u1");
        assert_eq!(list.records()[1].username, "");
        assert_eq!(list.records()[2].username, "");
    }

    #[test]
    fn test_globals_apply_to_every_record() {
        let env = EnvSnapshot::from_pairs([
            ("NOAUTH_HOSTNAMES", "a b"),
            ("NOAUTH_SECURITY", "nla"),
            ("NOAUTH_IGNORE_CERT", "true"),
        ]);
        let params = NoAuthParams::resolve(&env).unwrap();
        let list = params.connection_list();
        for record in list.records() {
            assert_eq!(record.security, "nla");
            assert_eq!(record.ignore_cert, "true");
        }
    }

    #[test]
    fn test_records_are_indexed_in_hosts_order() {
        let env = EnvSnapshot::from_pairs([("NOAUTH_HOSTNAMES", "x,y,z")]);
        let params = NoAuthParams::resolve(&env).unwrap();
        let list = params.connection_list();
        let hostnames: Vec<&str> = list
            .records()
            .iter()
            .map(|r| r.hostname.as_str())
            .collect();
        assert_eq!(hostnames, ["x", "y", "z"]);
        let indices: Vec<usize> = list.records().iter().map(|r| r.index).collect();
        assert_eq!(indices, [0, 1, 2]);
    }

    #[test]
    fn test_emit_records_document_path() {
        let env = EnvSnapshot::from_pairs([("NOAUTH_HOSTNAMES", "a")]);
        let params = NoAuthParams::resolve(&env).unwrap();
        let mut store = PropertyStore::new();
        params.emit_properties(Path::new("/home/guac/.guacamole/noauth-config.xml"), &mut store);
        assert_eq!(store.entries()[0].name, "noauth-config");
        assert_eq!(
            store.entries()[0].value,
            "/home/guac/.guacamole/noauth-config.xml"
        );
    }

    proptest! {
        #[test]
        fn prop_record_count_tracks_hosts_and_padding_never_fails(
            hosts in proptest::collection::vec("[a-z0-9]{1,8}", 1..8),
            users in proptest::collection::vec("[a-z0-9]{1,8}", 0..12),
        ) {
            let params = NoAuthParams {
                hostnames: hosts.clone(),
                usernames: users.clone(),
                passwords: Vec::new(),
                remote_apps: Vec::new(),
                security: None,
                ignore_cert: None,
            };
            let list = params.connection_list();
            prop_assert_eq!(list.len(), hosts.len());
            for (i, record) in list.records().iter().enumerate() {
                let expected = users.get(i).cloned().unwrap_or_default();
                prop_assert_eq!(&record.username, &expected);
                prop_assert_eq!(&record.password, "");
            }
        }
    }
}
