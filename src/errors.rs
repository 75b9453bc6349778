//! Fatal bootstrap errors and their operator-facing reports.
//!
//! Every validation failure in this system is fatal; there are no warnings
//! and no retries. The report format is fixed: a `FATAL:` banner line, a
//! separator, then prose naming every variable the operator must set, all
//! written to stdout so it lands in the container log.

use std::fmt::Write as _;

use thiserror::Error;

use crate::backend::database::DatabaseKind;
use crate::backend::token::TokenKind;

/// Width of the separator line in fatal reports.
const SEPARATOR_WIDTH: usize = 79;

/// Everything that can stop the bootstrap before handoff.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BootstrapError {
    /// The mandatory guacd link is absent.
    #[error("Missing GUACD_PORT_4822_TCP_ADDR or \"guacd\" link")]
    DaemonLinkMissing,

    /// Neither a link nor explicit variables produced a database address.
    #[error("Missing {}_HOSTNAME or \"{}\" link", .0.env_prefix(), .0.link_name())]
    DatabaseAddressMissing(DatabaseKind),

    /// Database name, user or password is absent.
    #[error("Missing required environment variables for {0} authentication")]
    DatabaseCredentialsMissing(DatabaseKind),

    /// LDAP hostname or user base DN is absent.
    #[error("Missing required environment variables for LDAP authentication")]
    LdapFieldsMissing,

    /// A token backend was asked to resolve without its shared secret.
    #[error("Missing {} environment variable", .0.secret_var())]
    TokenSecretMissing(TokenKind),

    /// The no-auth hosts list is empty after splitting.
    #[error("Missing NOAUTH_HOSTNAMES environment variable")]
    ConnectionHostsMissing,

    /// No trigger variable matched; the gateway would have no way to log
    /// anyone in.
    #[error("No authentication backend configured")]
    NoBackendConfigured,
}

impl BootstrapError {
    /// Prose explanation naming every variable the operator must set.
    pub fn explanation(&self) -> String {
        let mut out = String::new();
        match self {
            Self::DaemonLinkMissing => explain_daemon_link(&mut out),
            Self::DatabaseAddressMissing(kind) => explain_database_address(&mut out, *kind),
            Self::DatabaseCredentialsMissing(kind) => explain_database_credentials(&mut out, *kind),
            Self::LdapFieldsMissing => explain_ldap_fields(&mut out),
            Self::TokenSecretMissing(kind) => explain_token_secret(&mut out, *kind),
            Self::ConnectionHostsMissing => explain_connection_hosts(&mut out),
            Self::NoBackendConfigured => explain_no_backend(&mut out),
        }
        out
    }

    /// Assemble the full operator-facing report for this failure.
    pub fn fatal_report(&self) -> String {
        let mut out = String::new();
        writeln!(out, "FATAL: {}", self).ok();
        writeln!(out, "{}", "-".repeat(SEPARATOR_WIDTH)).ok();
        out.push_str(&self.explanation());
        out
    }
}

/// Format any startup error in the fatal report shape.
///
/// Typed bootstrap failures get their full report; everything else gets a
/// generic banner followed by the error chain.
pub fn format_fatal(error: &anyhow::Error) -> String {
    if let Some(bootstrap) = error.downcast_ref::<BootstrapError>() {
        return bootstrap.fatal_report();
    }

    let mut out = String::new();
    writeln!(out, "FATAL: {}", error).ok();
    writeln!(out, "{}", "-".repeat(SEPARATOR_WIDTH)).ok();
    writeln!(
        out,
        "The bootstrap failed before the web application could be started."
    )
    .ok();
    for cause in error.chain().skip(1) {
        writeln!(out, "Caused by: {}", cause).ok();
    }
    out
}

fn explain_daemon_link(out: &mut String) {
    writeln!(
        out,
        "Every deployment needs a guacd daemon to relay the remote desktop"
    )
    .ok();
    writeln!(out, "protocols on behalf of the web application.").ok();
    writeln!(out, "").ok();
    writeln!(
        out,
        "Either link this container to a container named \"guacd\", or set the"
    )
    .ok();
    writeln!(
        out,
        "GUACD_PORT_4822_TCP_ADDR and GUACD_PORT_4822_TCP_PORT environment"
    )
    .ok();
    writeln!(
        out,
        "variables to the address and port of a reachable guacd instance."
    )
    .ok();
}

fn explain_database_address(out: &mut String, kind: DatabaseKind) {
    writeln!(
        out,
        "If using a {} database for authentication, you must tell the web",
        kind
    )
    .ok();
    writeln!(out, "application where that database is.").ok();
    writeln!(out, "").ok();
    writeln!(
        out,
        "Either link this container to a container named \"{}\", or set the",
        kind.link_name()
    )
    .ok();
    writeln!(
        out,
        "{}_HOSTNAME environment variable (and optionally {}_PORT, which",
        kind.env_prefix(),
        kind.env_prefix()
    )
    .ok();
    writeln!(
        out,
        "otherwise defaults to {}) to the network location of the database.",
        kind.default_port()
    )
    .ok();
    writeln!(out, "").ok();
    writeln!(
        out,
        "Note that when a \"{}\" link is present, the link's address always wins",
        kind.link_name()
    )
    .ok();
    writeln!(
        out,
        "and any explicit {}_HOSTNAME / {}_PORT values are ignored.",
        kind.env_prefix(),
        kind.env_prefix()
    )
    .ok();
}

fn explain_database_credentials(out: &mut String, kind: DatabaseKind) {
    writeln!(
        out,
        "If using a {} database for authentication, you must provide each of",
        kind
    )
    .ok();
    writeln!(out, "the following environment variables:").ok();
    writeln!(out, "").ok();
    writeln!(
        out,
        "    {}_DATABASE   the name of the database to use",
        kind.env_prefix()
    )
    .ok();
    writeln!(
        out,
        "    {}_USER       the account to authenticate as",
        kind.env_prefix()
    )
    .ok();
    writeln!(
        out,
        "    {}_PASSWORD   the password for that account",
        kind.env_prefix()
    )
    .ok();
}

fn explain_ldap_fields(out: &mut String) {
    writeln!(
        out,
        "If using an LDAP directory for authentication, you must provide each"
    )
    .ok();
    writeln!(out, "of the following environment variables:").ok();
    writeln!(out, "").ok();
    writeln!(
        out,
        "    LDAP_HOSTNAME       the hostname or address of the LDAP server"
    )
    .ok();
    writeln!(
        out,
        "    LDAP_USER_BASE_DN   the base DN under which user accounts are found"
    )
    .ok();
}

fn explain_token_secret(out: &mut String, kind: TokenKind) {
    writeln!(
        out,
        "If using {} authentication, you must provide the shared secret used",
        kind
    )
    .ok();
    writeln!(out, "to validate gateway URLs:").ok();
    writeln!(out, "").ok();
    writeln!(
        out,
        "    {}   the secret, known only to trusted callers",
        kind.secret_var()
    )
    .ok();
    writeln!(out, "").ok();
    writeln!(
        out,
        "The accepted request age may be tuned with {};",
        kind.age_limit_var()
    )
    .ok();
    writeln!(
        out,
        "when unset, the extension accepts requests up to 600000 milliseconds"
    )
    .ok();
    writeln!(out, "(ten minutes) old.").ok();
}

fn explain_connection_hosts(out: &mut String) {
    writeln!(
        out,
        "If using the no-auth connection list, you must provide at least one"
    )
    .ok();
    writeln!(out, "hostname:").ok();
    writeln!(out, "").ok();
    writeln!(
        out,
        "    NOAUTH_HOSTNAMES   connection hostnames, separated by commas or"
    )
    .ok();
    writeln!(out, "                       whitespace").ok();
    writeln!(out, "").ok();
    writeln!(
        out,
        "Usernames, passwords and remote application names may be supplied in"
    )
    .ok();
    writeln!(
        out,
        "parallel through NOAUTH_USERNAMES, NOAUTH_PASSWORDS and"
    )
    .ok();
    writeln!(
        out,
        "NOAUTH_REMOTE_APPS; lists shorter than the hosts list are padded with"
    )
    .ok();
    writeln!(out, "empty values.").ok();
}

fn explain_no_backend(out: &mut String) {
    writeln!(
        out,
        "The gateway needs at least one authentication backend in order to"
    )
    .ok();
    writeln!(
        out,
        "function. Set the trigger variable of at least one backend:"
    )
    .ok();
    writeln!(out, "").ok();
    writeln!(out, "    MYSQL_DATABASE        MySQL database authentication").ok();
    writeln!(
        out,
        "    POSTGRES_DATABASE     PostgreSQL database authentication"
    )
    .ok();
    writeln!(out, "    LDAP_HOSTNAME         LDAP directory authentication").ok();
    writeln!(out, "    HMAC_SECRET           signed-URL authentication").ok();
    writeln!(out, "    ENCRYPTEDURL_SECRET   encrypted-URL authentication").ok();
    writeln!(
        out,
        "    NOAUTH_HOSTNAMES      unauthenticated connection list"
    )
    .ok();
}
