//! # lamco-gateway-init
//!
//! Container entrypoint for the Lamco remote desktop gateway webapp.
//!
//! At container start this binary inspects the environment for linked
//! containers and authentication backend configuration, validates that a
//! minimum viable setup is present, writes the `guacamole.properties` file
//! (plus the optional no-auth connection document), symlinks the matching
//! authentication extensions into place, and finally replaces itself with
//! the application server.
//!
//! # Architecture
//!
//! ```text
//! EnvSnapshot ──> Bootstrap::prepare ──> BootstrapPlan ──> Bootstrap::execute
//!                   │                        │                  │
//!                   ├─ guacd link check      ├─ PropertyStore   ├─ reset home
//!                   ├─ select_backends       ├─ ConnectionList  ├─ write files
//!                   └─ Backend::resolve      └─ installed set   └─ install plugins
//!                                                                  │
//!                                                                  └─> handoff (exec)
//! ```
//!
//! All validation happens in `prepare` against an immutable environment
//! snapshot; `execute` only performs I/O on an already-validated plan. Any
//! validation failure surfaces as a [`BootstrapError`] whose report goes to
//! stdout, and the process exits 1 without touching the filesystem.

#![warn(missing_docs)]
#![warn(clippy::all)]

/// Authentication backend resolvers and selection
pub mod backend;

/// Bootstrap driver and process handoff
pub mod bootstrap;

/// No-auth connection list document
pub mod connections;

/// Immutable environment snapshot
pub mod env;

/// Fatal error taxonomy and operator-facing reports
pub mod errors;

/// Plugin artifact installation
pub mod install;

/// Ordered property store
pub mod properties;

pub use backend::{select_backends, Backend, BackendKind};
pub use bootstrap::{handoff, Bootstrap, BootstrapPlan, GatewayPaths};
pub use connections::{ConnectionList, ConnectionRecord};
pub use env::EnvSnapshot;
pub use errors::{format_fatal, BootstrapError};
pub use properties::{PropertyEntry, PropertyStore};
