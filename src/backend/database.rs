//! Relational database authentication backends.
//!
//! MySQL and PostgreSQL share one resolver shape: the same required fields,
//! the same linked-container defaulting, the same pool-sizing knobs. Only
//! the variable prefixes, the default port and the emitted property prefix
//! differ, so both are driven by [`DatabaseKind`].

use std::fmt;

use serde::Serialize;

use crate::env::EnvSnapshot;
use crate::errors::BootstrapError;
use crate::properties::PropertyStore;

/// Which relational database backend a parameter set belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum DatabaseKind {
    /// MySQL (or MariaDB) authentication database.
    Mysql,
    /// PostgreSQL authentication database.
    Postgresql,
}

impl DatabaseKind {
    /// Prefix of every environment variable this backend reads.
    pub fn env_prefix(self) -> &'static str {
        match self {
            Self::Mysql => "MYSQL",
            Self::Postgresql => "POSTGRES",
        }
    }

    /// Name of the container link that can supply the address.
    pub fn link_name(self) -> &'static str {
        match self {
            Self::Mysql => "mysql",
            Self::Postgresql => "postgres",
        }
    }

    /// Port the container link advertises its endpoint on.
    pub fn link_port(self) -> u16 {
        match self {
            Self::Mysql => 3306,
            Self::Postgresql => 5432,
        }
    }

    /// Port assumed when neither the link nor the operator supplies one.
    pub fn default_port(self) -> &'static str {
        match self {
            Self::Mysql => "3306",
            Self::Postgresql => "5432",
        }
    }

    /// Prefix of every property this backend emits.
    pub fn property_prefix(self) -> &'static str {
        match self {
            Self::Mysql => "mysql",
            Self::Postgresql => "postgresql",
        }
    }
}

impl fmt::Display for DatabaseKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Mysql => "MySQL",
            Self::Postgresql => "PostgreSQL",
        })
    }
}

/// Validated connection parameters for one database backend.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DatabaseParams {
    /// Backend these parameters belong to.
    pub kind: DatabaseKind,
    /// Database server hostname, link-derived or operator-supplied.
    pub hostname: String,
    /// Database server port after default-port fallback.
    pub port: String,
    /// Name of the database holding the authentication schema.
    pub database: String,
    /// Account to authenticate as.
    pub username: String,
    /// Password for that account.
    pub password: String,
    /// Ceiling on concurrent connections across the whole deployment.
    pub absolute_max_connections: Option<String>,
    /// Default concurrent-use limit per connection.
    pub default_max_connections: Option<String>,
    /// Default concurrent-use limit per connection group.
    pub default_max_group_connections: Option<String>,
    /// Default per-user limit on a single connection.
    pub default_max_connections_per_user: Option<String>,
    /// Default per-user limit on a single connection group.
    pub default_max_group_connections_per_user: Option<String>,
}

impl DatabaseParams {
    /// Derive and validate parameters from the snapshot.
    ///
    /// Address precedence is deliberate and surprising: when the container
    /// link is present (`<PREFIX>_NAME` set), the link-derived address wins
    /// outright and explicit `<PREFIX>_HOSTNAME` / `<PREFIX>_PORT` values
    /// are ignored. The default port fills in only when the port is still
    /// unset afterwards. Operators who set both a link and explicit
    /// variables get the link.
    pub fn resolve(kind: DatabaseKind, env: &EnvSnapshot) -> Result<Self, BootstrapError> {
        let prefix = kind.env_prefix();

        let (hostname, port) = if env.is_set(&format!("{}_NAME", prefix)) {
            match env.link_endpoint(prefix, kind.link_port()) {
                Some(link) => (Some(link.addr), link.port),
                None => (None, None),
            }
        } else {
            (
                env.get_owned(&format!("{}_HOSTNAME", prefix)),
                env.get_owned(&format!("{}_PORT", prefix)),
            )
        };

        let Some(hostname) = hostname else {
            return Err(BootstrapError::DatabaseAddressMissing(kind));
        };
        let port = port.unwrap_or_else(|| kind.default_port().to_owned());

        let database = env.get_owned(&format!("{}_DATABASE", prefix));
        let username = env.get_owned(&format!("{}_USER", prefix));
        let password = env.get_owned(&format!("{}_PASSWORD", prefix));
        let (Some(database), Some(username), Some(password)) = (database, username, password)
        else {
            return Err(BootstrapError::DatabaseCredentialsMissing(kind));
        };

        Ok(Self {
            kind,
            hostname,
            port,
            database,
            username,
            password,
            absolute_max_connections: env
                .get_owned(&format!("{}_ABSOLUTE_MAX_CONNECTIONS", prefix)),
            default_max_connections: env
                .get_owned(&format!("{}_DEFAULT_MAX_CONNECTIONS", prefix)),
            default_max_group_connections: env
                .get_owned(&format!("{}_DEFAULT_MAX_GROUP_CONNECTIONS", prefix)),
            default_max_connections_per_user: env
                .get_owned(&format!("{}_DEFAULT_MAX_CONNECTIONS_PER_USER", prefix)),
            default_max_group_connections_per_user: env
                .get_owned(&format!("{}_DEFAULT_MAX_GROUP_CONNECTIONS_PER_USER", prefix)),
        })
    }

    /// Write this backend's properties in their documented order.
    pub fn emit_properties(&self, store: &mut PropertyStore) {
        let prefix = self.kind.property_prefix();
        store.set(&format!("{}-hostname", prefix), self.hostname.as_str());
        store.set(&format!("{}-port", prefix), self.port.as_str());
        store.set(&format!("{}-database", prefix), self.database.as_str());
        store.set(&format!("{}-username", prefix), self.username.as_str());
        store.set(&format!("{}-password", prefix), self.password.as_str());
        store.set_if_present(
            &format!("{}-absolute-max-connections", prefix),
            self.absolute_max_connections.as_deref(),
        );
        store.set_if_present(
            &format!("{}-default-max-connections", prefix),
            self.default_max_connections.as_deref(),
        );
        store.set_if_present(
            &format!("{}-default-max-group-connections", prefix),
            self.default_max_group_connections.as_deref(),
        );
        store.set_if_present(
            &format!("{}-default-max-connections-per-user", prefix),
            self.default_max_connections_per_user.as_deref(),
        );
        store.set_if_present(
            &format!("{}-default-max-group-connections-per-user", prefix),
            self.default_max_group_connections_per_user.as_deref(),
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn mysql_base() -> Vec<(&'static str, &'static str)> {
        vec![
            ("MYSQL_DATABASE", "guacamole_db"),
            ("MYSQL_USER", "guac"),
            ("MYSQL_PASSWORD", "secret"),
        ]
    }

    #[test]
    fn test_explicit_hostname_with_default_port() {
        let mut pairs = mysql_base();
        pairs.push(("MYSQL_HOSTNAME", "db.example.com"));
        let env = EnvSnapshot::from_pairs(pairs);
        let params = DatabaseParams::resolve(DatabaseKind::Mysql, &env).unwrap();
        assert_eq!(params.hostname, "db.example.com");
        assert_eq!(params.port, "3306");
    }

    #[test]
    fn test_explicit_port_is_honored_without_link() {
        let mut pairs = mysql_base();
        pairs.push(("MYSQL_HOSTNAME", "db.example.com"));
        pairs.push(("MYSQL_PORT", "13306"));
        let env = EnvSnapshot::from_pairs(pairs);
        let params = DatabaseParams::resolve(DatabaseKind::Mysql, &env).unwrap();
        assert_eq!(params.port, "13306");
    }

    #[test]
    fn test_missing_address_fails_before_credentials_check() {
        let env = EnvSnapshot::from_pairs(mysql_base());
        let err = DatabaseParams::resolve(DatabaseKind::Mysql, &env).unwrap_err();
        assert_eq!(err, BootstrapError::DatabaseAddressMissing(DatabaseKind::Mysql));
    }

    #[test]
    fn test_missing_credentials_fail() {
        let env = EnvSnapshot::from_pairs([
            ("MYSQL_DATABASE", "guacamole_db"),
            ("MYSQL_HOSTNAME", "db"),
        ]);
        let err = DatabaseParams::resolve(DatabaseKind::Mysql, &env).unwrap_err();
        assert_eq!(
            err,
            BootstrapError::DatabaseCredentialsMissing(DatabaseKind::Mysql)
        );
    }

    // Pins the intentional-but-surprising precedence: the link, when
    // present, beats explicit variables.
    #[test]
    fn test_link_overrides_explicit_hostname() {
        let mut pairs = mysql_base();
        pairs.push(("MYSQL_NAME", "/gateway/mysql"));
        pairs.push(("MYSQL_PORT_3306_TCP_ADDR", "172.17.0.5"));
        pairs.push(("MYSQL_PORT_3306_TCP_PORT", "3306"));
        pairs.push(("MYSQL_HOSTNAME", "ignored.example.com"));
        pairs.push(("MYSQL_PORT", "9999"));
        let env = EnvSnapshot::from_pairs(pairs);
        let params = DatabaseParams::resolve(DatabaseKind::Mysql, &env).unwrap();
        assert_eq!(params.hostname, "172.17.0.5");
        assert_eq!(params.port, "3306");
    }

    #[test]
    fn test_link_without_addr_fails_even_with_explicit_hostname() {
        let mut pairs = mysql_base();
        pairs.push(("MYSQL_NAME", "/gateway/mysql"));
        pairs.push(("MYSQL_HOSTNAME", "db.example.com"));
        let env = EnvSnapshot::from_pairs(pairs);
        let err = DatabaseParams::resolve(DatabaseKind::Mysql, &env).unwrap_err();
        assert_eq!(err, BootstrapError::DatabaseAddressMissing(DatabaseKind::Mysql));
    }

    #[test]
    fn test_link_without_port_falls_back_to_default() {
        let mut pairs = mysql_base();
        pairs.push(("MYSQL_NAME", "/gateway/mysql"));
        pairs.push(("MYSQL_PORT_3306_TCP_ADDR", "172.17.0.5"));
        let env = EnvSnapshot::from_pairs(pairs);
        let params = DatabaseParams::resolve(DatabaseKind::Mysql, &env).unwrap();
        assert_eq!(params.hostname, "172.17.0.5");
        assert_eq!(params.port, "3306");
    }

    #[test]
    fn test_postgresql_uses_its_own_prefixes() {
        let env = EnvSnapshot::from_pairs([
            ("POSTGRES_DATABASE", "guacamole_db"),
            ("POSTGRES_USER", "guac"),
            ("POSTGRES_PASSWORD", "secret"),
            ("POSTGRES_HOSTNAME", "pg.example.com"),
        ]);
        let params = DatabaseParams::resolve(DatabaseKind::Postgresql, &env).unwrap();
        assert_eq!(params.port, "5432");

        let mut store = PropertyStore::new();
        params.emit_properties(&mut store);
        let names: Vec<&str> = store.entries().iter().map(|e| e.name.as_str()).collect();
        assert_eq!(
            names,
            [
                "postgresql-hostname",
                "postgresql-port",
                "postgresql-database",
                "postgresql-username",
                "postgresql-password",
            ]
        );
    }

    #[test]
    fn test_pool_knobs_emitted_only_when_set() {
        let mut pairs = mysql_base();
        pairs.push(("MYSQL_HOSTNAME", "db"));
        pairs.push(("MYSQL_DEFAULT_MAX_CONNECTIONS", "10"));
        let env = EnvSnapshot::from_pairs(pairs);
        let params = DatabaseParams::resolve(DatabaseKind::Mysql, &env).unwrap();

        let mut store = PropertyStore::new();
        params.emit_properties(&mut store);
        let names: Vec<&str> = store.entries().iter().map(|e| e.name.as_str()).collect();
        assert!(names.contains(&"mysql-default-max-connections"));
        assert!(!names.contains(&"mysql-absolute-max-connections"));
        assert!(!names.contains(&"mysql-default-max-group-connections"));
    }

    #[test]
    fn test_emission_order_is_fixed() {
        let mut pairs = mysql_base();
        pairs.push(("MYSQL_HOSTNAME", "db"));
        pairs.push(("MYSQL_ABSOLUTE_MAX_CONNECTIONS", "0"));
        pairs.push(("MYSQL_DEFAULT_MAX_GROUP_CONNECTIONS_PER_USER", "2"));
        let env = EnvSnapshot::from_pairs(pairs);
        let params = DatabaseParams::resolve(DatabaseKind::Mysql, &env).unwrap();

        let mut store = PropertyStore::new();
        params.emit_properties(&mut store);
        let names: Vec<&str> = store.entries().iter().map(|e| e.name.as_str()).collect();
        assert_eq!(
            names,
            [
                "mysql-hostname",
                "mysql-port",
                "mysql-database",
                "mysql-username",
                "mysql-password",
                "mysql-absolute-max-connections",
                "mysql-default-max-group-connections-per-user",
            ]
        );
    }
}
