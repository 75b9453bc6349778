//! Authentication backend selection and parameter resolution.
//!
//! Each backend is selected by the presence of a trigger variable and
//! carries its own validated parameter record. Selection walks a fixed
//! priority order; the first resolver failure aborts the whole run.

pub mod database;
pub mod directory;
pub mod noauth;
pub mod token;

use std::fmt;
use std::path::Path;

use serde::Serialize;

use crate::env::EnvSnapshot;
use crate::errors::BootstrapError;
use crate::properties::PropertyStore;

use self::database::{DatabaseKind, DatabaseParams};
use self::directory::LdapParams;
use self::noauth::NoAuthParams;
use self::token::{TokenKind, TokenParams};

/// The authentication backends this bootstrap knows how to configure.
///
/// Backends are not mutually exclusive; any subset may be active at once.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum BackendKind {
    /// MySQL authentication database.
    Mysql,
    /// PostgreSQL authentication database.
    Postgresql,
    /// LDAP directory.
    Ldap,
    /// Signed-URL tokens.
    Hmac,
    /// Encrypted-URL tokens.
    EncryptedUrl,
    /// Unauthenticated connection list.
    NoAuth,
}

impl BackendKind {
    /// Every backend, in evaluation priority order.
    pub const ALL: [BackendKind; 6] = [
        BackendKind::Mysql,
        BackendKind::Postgresql,
        BackendKind::Ldap,
        BackendKind::Hmac,
        BackendKind::EncryptedUrl,
        BackendKind::NoAuth,
    ];

    /// Environment variable whose presence selects this backend.
    pub fn trigger(self) -> &'static str {
        match self {
            Self::Mysql => "MYSQL_DATABASE",
            Self::Postgresql => "POSTGRES_DATABASE",
            Self::Ldap => "LDAP_HOSTNAME",
            Self::Hmac => "HMAC_SECRET",
            Self::EncryptedUrl => "ENCRYPTEDURL_SECRET",
            Self::NoAuth => "NOAUTH_HOSTNAMES",
        }
    }

    /// Directory name under the plugin bundle root.
    pub fn bundle_dir(self) -> &'static str {
        match self {
            Self::Mysql => "mysql",
            Self::Postgresql => "postgresql",
            Self::Ldap => "ldap",
            Self::Hmac => "hmac",
            Self::EncryptedUrl => "encryptedurl",
            Self::NoAuth => "noauth",
        }
    }

    /// Glob matching this backend's client driver archives, when it ships
    /// any.
    pub fn driver_glob(self) -> Option<&'static str> {
        match self {
            Self::Mysql => Some("mysql-connector-*.jar"),
            Self::Postgresql => Some("postgresql-*.jar"),
            _ => None,
        }
    }
}

impl fmt::Display for BackendKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.bundle_dir())
    }
}

/// A selected backend together with its validated parameters.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "backend", rename_all = "lowercase")]
pub enum Backend {
    /// MySQL authentication database.
    Mysql(DatabaseParams),
    /// PostgreSQL authentication database.
    Postgresql(DatabaseParams),
    /// LDAP directory.
    Ldap(LdapParams),
    /// Signed-URL tokens.
    Hmac(TokenParams),
    /// Encrypted-URL tokens.
    EncryptedUrl(TokenParams),
    /// Unauthenticated connection list.
    NoAuth(NoAuthParams),
}

impl Backend {
    /// Resolve a backend's parameters from the snapshot.
    pub fn resolve(kind: BackendKind, env: &EnvSnapshot) -> Result<Self, BootstrapError> {
        Ok(match kind {
            BackendKind::Mysql => {
                Backend::Mysql(DatabaseParams::resolve(DatabaseKind::Mysql, env)?)
            }
            BackendKind::Postgresql => {
                Backend::Postgresql(DatabaseParams::resolve(DatabaseKind::Postgresql, env)?)
            }
            BackendKind::Ldap => Backend::Ldap(LdapParams::resolve(env)?),
            BackendKind::Hmac => Backend::Hmac(TokenParams::resolve(TokenKind::Hmac, env)?),
            BackendKind::EncryptedUrl => {
                Backend::EncryptedUrl(TokenParams::resolve(TokenKind::EncryptedUrl, env)?)
            }
            BackendKind::NoAuth => Backend::NoAuth(NoAuthParams::resolve(env)?),
        })
    }

    /// Which backend these parameters belong to.
    pub fn kind(&self) -> BackendKind {
        match self {
            Backend::Mysql(_) => BackendKind::Mysql,
            Backend::Postgresql(_) => BackendKind::Postgresql,
            Backend::Ldap(_) => BackendKind::Ldap,
            Backend::Hmac(_) => BackendKind::Hmac,
            Backend::EncryptedUrl(_) => BackendKind::EncryptedUrl,
            Backend::NoAuth(_) => BackendKind::NoAuth,
        }
    }

    /// Write this backend's properties into the store.
    ///
    /// `connection_list_path` is where the no-auth document will be
    /// written; only the no-auth backend reads it.
    pub fn emit_properties(&self, connection_list_path: &Path, store: &mut PropertyStore) {
        match self {
            Backend::Mysql(params) | Backend::Postgresql(params) => params.emit_properties(store),
            Backend::Ldap(params) => params.emit_properties(store),
            Backend::Hmac(params) | Backend::EncryptedUrl(params) => params.emit_properties(store),
            Backend::NoAuth(params) => params.emit_properties(connection_list_path, store),
        }
    }
}

/// Resolve every triggered backend in priority order.
///
/// The first resolver failure aborts the whole selection, and an empty
/// result is itself a failure: a gateway with no authentication backend
/// must not start.
pub fn select_backends(env: &EnvSnapshot) -> Result<Vec<Backend>, BootstrapError> {
    let mut installed = Vec::new();
    for kind in BackendKind::ALL {
        if env.is_set(kind.trigger()) {
            installed.push(Backend::resolve(kind, env)?);
        }
    }
    if installed.is_empty() {
        return Err(BootstrapError::NoBackendConfigured);
    }
    Ok(installed)
}
