//! LDAP directory authentication backend.

use serde::Serialize;

use crate::env::EnvSnapshot;
use crate::errors::BootstrapError;
use crate::properties::PropertyStore;

/// Validated parameters for the LDAP directory backend.
///
/// Unlike the database backends there is no link handling and no default
/// port; the extension applies its own defaults for everything left unset.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LdapParams {
    /// Directory server hostname.
    pub hostname: String,
    /// Base DN under which user accounts are found.
    pub user_base_dn: String,
    /// Directory server port, when overridden.
    pub port: Option<String>,
    /// Connection encryption method, when overridden.
    pub encryption_method: Option<String>,
    /// Attribute naming the user within an entry.
    pub username_attribute: Option<String>,
    /// Base DN under which groups are found.
    pub group_base_dn: Option<String>,
    /// Base DN for extension-managed configuration entries.
    pub config_base_dn: Option<String>,
    /// DN to bind as when searching for users.
    pub search_bind_dn: Option<String>,
    /// Password for the search bind DN.
    pub search_bind_password: Option<String>,
}

impl LdapParams {
    /// Validate and collect parameters from the snapshot.
    ///
    /// Only presence is validated; values pass through verbatim.
    pub fn resolve(env: &EnvSnapshot) -> Result<Self, BootstrapError> {
        let hostname = env.get_owned("LDAP_HOSTNAME");
        let user_base_dn = env.get_owned("LDAP_USER_BASE_DN");
        let (Some(hostname), Some(user_base_dn)) = (hostname, user_base_dn) else {
            return Err(BootstrapError::LdapFieldsMissing);
        };

        Ok(Self {
            hostname,
            user_base_dn,
            port: env.get_owned("LDAP_PORT"),
            encryption_method: env.get_owned("LDAP_ENCRYPTION_METHOD"),
            username_attribute: env.get_owned("LDAP_USERNAME_ATTRIBUTE"),
            group_base_dn: env.get_owned("LDAP_GROUP_BASE_DN"),
            config_base_dn: env.get_owned("LDAP_CONFIG_BASE_DN"),
            search_bind_dn: env.get_owned("LDAP_SEARCH_BIND_DN"),
            search_bind_password: env.get_owned("LDAP_SEARCH_BIND_PASSWORD"),
        })
    }

    /// Write the directory properties in their documented order.
    pub fn emit_properties(&self, store: &mut PropertyStore) {
        store.set("ldap-hostname", self.hostname.as_str());
        store.set_if_present("ldap-port", self.port.as_deref());
        store.set_if_present("ldap-encryption-method", self.encryption_method.as_deref());
        store.set("ldap-user-base-dn", self.user_base_dn.as_str());
        store.set_if_present("ldap-username-attribute", self.username_attribute.as_deref());
        store.set_if_present("ldap-group-base-dn", self.group_base_dn.as_deref());
        store.set_if_present("ldap-config-base-dn", self.config_base_dn.as_deref());
        store.set_if_present("ldap-search-bind-dn", self.search_bind_dn.as_deref());
        store.set_if_present(
            "ldap-search-bind-password",
            self.search_bind_password.as_deref(),
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_hostname_fails() {
        let env = EnvSnapshot::from_pairs([("LDAP_USER_BASE_DN", "ou=people,dc=example")]);
        let err = LdapParams::resolve(&env).unwrap_err();
        assert_eq!(err, BootstrapError::LdapFieldsMissing);
    }

    #[test]
    fn test_missing_user_base_dn_fails() {
        let env = EnvSnapshot::from_pairs([("LDAP_HOSTNAME", "ldap.example.com")]);
        let err = LdapParams::resolve(&env).unwrap_err();
        assert_eq!(err, BootstrapError::LdapFieldsMissing);
    }

    #[test]
    fn test_required_fields_only() {
        let env = EnvSnapshot::from_pairs([
            ("LDAP_HOSTNAME", "ldap.example.com"),
            ("LDAP_USER_BASE_DN", "ou=people,dc=example"),
        ]);
        let params = LdapParams::resolve(&env).unwrap();

        let mut store = PropertyStore::new();
        params.emit_properties(&mut store);
        let names: Vec<&str> = store.entries().iter().map(|e| e.name.as_str()).collect();
        assert_eq!(names, ["ldap-hostname", "ldap-user-base-dn"]);
    }

    #[test]
    fn test_full_emission_order() {
        let env = EnvSnapshot::from_pairs([
            ("LDAP_HOSTNAME", "ldap.example.com"),
            ("LDAP_PORT", "636"),
            ("LDAP_ENCRYPTION_METHOD", "ssl"),
            ("LDAP_USER_BASE_DN", "ou=people,dc=example"),
            ("LDAP_USERNAME_ATTRIBUTE", "uid"),
            ("LDAP_GROUP_BASE_DN", "ou=groups,dc=example"),
            ("LDAP_CONFIG_BASE_DN", "ou=config,dc=example"),
            ("LDAP_SEARCH_BIND_DN", "cn=search,dc=example"),
            ("LDAP_SEARCH_BIND_PASSWORD", "bindpw"),
        ]);
        let params = LdapParams::resolve(&env).unwrap();

        let mut store = PropertyStore::new();
        params.emit_properties(&mut store);
        let names: Vec<&str> = store.entries().iter().map(|e| e.name.as_str()).collect();
        assert_eq!(
            names,
            [
                "ldap-hostname",
                "ldap-port",
                "ldap-encryption-method",
                "ldap-user-base-dn",
                "ldap-username-attribute",
                "ldap-group-base-dn",
                "ldap-config-base-dn",
                "ldap-search-bind-dn",
                "ldap-search-bind-password",
            ]
        );
    }

    #[test]
    fn test_empty_optional_is_not_emitted() {
        let env = EnvSnapshot::from_pairs([
            ("LDAP_HOSTNAME", "ldap.example.com"),
            ("LDAP_USER_BASE_DN", "ou=people,dc=example"),
            ("LDAP_PORT", ""),
        ]);
        let params = LdapParams::resolve(&env).unwrap();
        assert_eq!(params.port, None);

        let mut store = PropertyStore::new();
        params.emit_properties(&mut store);
        assert!(store.entries().iter().all(|e| e.name != "ldap-port"));
    }
}
