//! Bootstrap driver: derive, validate, persist, hand off.
//!
//! `prepare` is pure and does all the validation; `execute` performs the
//! filesystem work on an already-validated plan; `handoff` replaces the
//! process with the application server. A failed `prepare` therefore never
//! touches an existing configuration home.

use std::convert::Infallible;
use std::ffi::CString;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{anyhow, bail, Context, Result};
use nix::unistd::execvp;
use serde::Serialize;
use tracing::{debug, info};

use crate::backend::{select_backends, Backend, BackendKind};
use crate::connections::{ConnectionList, CONNECTION_LIST_FILE};
use crate::env::EnvSnapshot;
use crate::errors::BootstrapError;
use crate::install::install_plugins;
use crate::properties::{PropertyStore, PROPERTIES_FILE};

/// Default plugin bundle root inside the image.
pub const DEFAULT_BUNDLE_ROOT: &str = "/opt/guacamole";

/// Default application server directory.
pub const DEFAULT_SERVER_DIR: &str = "/usr/local/tomcat";

/// Default application server launch command.
pub const DEFAULT_SERVER_COMMAND: &[&str] = &["catalina.sh", "run"];

/// Filesystem layout of the configuration home.
#[derive(Debug, Clone, Serialize)]
pub struct GatewayPaths {
    /// Configuration home directory.
    pub home: PathBuf,
    /// Directory scanned for authentication extensions.
    pub extensions_dir: PathBuf,
    /// Directory scanned for client driver libraries.
    pub lib_dir: PathBuf,
    /// Generated properties file.
    pub properties_file: PathBuf,
    /// Generated no-auth connection document.
    pub connection_list_file: PathBuf,
}

impl GatewayPaths {
    /// Lay out the configuration home, defaulting to `~/.guacamole`.
    ///
    /// An empty override counts as unset, matching the empty-means-absent
    /// convention the environment snapshot applies everywhere else
    /// (`GUACAMOLE_HOME=` reaches here as `Some("")` via the clap env
    /// fallback).
    pub fn resolve(home_override: Option<PathBuf>) -> Result<Self> {
        let home = match home_override.filter(|home| !home.as_os_str().is_empty()) {
            Some(home) => home,
            None => dirs::home_dir()
                .ok_or_else(|| anyhow!("cannot determine home directory"))?
                .join(".guacamole"),
        };
        Ok(Self::under(home))
    }

    /// Lay out the configuration home under an explicit directory.
    pub fn under(home: PathBuf) -> Self {
        let extensions_dir = home.join("extensions");
        let lib_dir = home.join("lib");
        let properties_file = home.join(PROPERTIES_FILE);
        let connection_list_file = home.join(CONNECTION_LIST_FILE);
        Self {
            home,
            extensions_dir,
            lib_dir,
            properties_file,
            connection_list_file,
        }
    }
}

/// Everything a run would write: resolved and validated, not yet persisted.
#[derive(Debug, Clone, Serialize)]
pub struct BootstrapPlan {
    /// Selected backends with their validated parameters.
    pub backends: Vec<Backend>,
    /// Property entries in emission order.
    pub properties: PropertyStore,
    /// No-auth connection document, when that backend is installed.
    pub connection_list: Option<ConnectionList>,
}

impl BootstrapPlan {
    /// Kinds of the selected backends, in priority order.
    pub fn installed(&self) -> Vec<BackendKind> {
        self.backends.iter().map(Backend::kind).collect()
    }
}

/// One container boot: derive the configuration, persist it, hand off.
#[derive(Debug)]
pub struct Bootstrap {
    env: EnvSnapshot,
    paths: GatewayPaths,
    bundle_root: PathBuf,
}

impl Bootstrap {
    /// Create a driver over a captured snapshot.
    pub fn new(env: EnvSnapshot, paths: GatewayPaths, bundle_root: PathBuf) -> Self {
        Self {
            env,
            paths,
            bundle_root,
        }
    }

    /// Paths this driver writes under.
    pub fn paths(&self) -> &GatewayPaths {
        &self.paths
    }

    /// Derive and validate the full configuration without touching the
    /// filesystem.
    ///
    /// The guacd link comes first: without the daemon nothing else can
    /// work, and its diagnostic must not be buried under backend errors.
    pub fn prepare(&self) -> Result<BootstrapPlan, BootstrapError> {
        let mut store = PropertyStore::new();
        self.emit_daemon_link(&mut store)?;

        let backends = select_backends(&self.env)?;
        let mut connection_list = None;
        for backend in &backends {
            backend.emit_properties(&self.paths.connection_list_file, &mut store);
            if let Backend::NoAuth(params) = backend {
                connection_list = Some(params.connection_list());
            }
        }
        debug!(
            "Prepared {} properties for {} backend(s)",
            store.len(),
            backends.len()
        );

        Ok(BootstrapPlan {
            backends,
            properties: store,
            connection_list,
        })
    }

    /// Resolve the mandatory guacd link into the daemon properties.
    fn emit_daemon_link(&self, store: &mut PropertyStore) -> Result<(), BootstrapError> {
        let Some(link) = self.env.link_endpoint("GUACD", 4822) else {
            return Err(BootstrapError::DaemonLinkMissing);
        };
        let Some(port) = link.port else {
            return Err(BootstrapError::DaemonLinkMissing);
        };
        store.set("guacd-hostname", link.addr);
        store.set("guacd-port", port);
        Ok(())
    }

    /// Persist the plan and install the selected plugins.
    ///
    /// The configuration home is reset first, so a restart never mixes
    /// artifacts from two runs.
    pub fn execute(&self, plan: &BootstrapPlan) -> Result<()> {
        self.reset_home()?;

        plan.properties
            .write_to(&self.paths.properties_file)
            .context("writing properties file")?;
        if let Some(list) = &plan.connection_list {
            list.write_to(&self.paths.connection_list_file)
                .context("writing connection list")?;
        }

        install_plugins(&plan.installed(), &self.bundle_root, &self.paths)?;

        info!(
            "Configured {} backend(s) under {}",
            plan.backends.len(),
            self.paths.home.display()
        );
        Ok(())
    }

    /// Clear and recreate the configuration home.
    fn reset_home(&self) -> Result<()> {
        if self.paths.home.exists() {
            fs::remove_dir_all(&self.paths.home)
                .with_context(|| format!("clearing {}", self.paths.home.display()))?;
        }
        fs::create_dir_all(&self.paths.home)
            .with_context(|| format!("creating {}", self.paths.home.display()))?;
        Ok(())
    }
}

/// Replace this process with the application server.
///
/// Changes into `server_dir` and execs `command`. Returns only on failure.
pub fn handoff(server_dir: &Path, command: &[String]) -> Result<Infallible> {
    if command.is_empty() {
        bail!("empty server command");
    }

    std::env::set_current_dir(server_dir)
        .with_context(|| format!("entering {}", server_dir.display()))?;

    let argv = command
        .iter()
        .map(|arg| CString::new(arg.as_str()))
        .collect::<Result<Vec<_>, _>>()
        .context("server command contains a NUL byte")?;

    info!("Handing off to: {}", command.join(" "));
    match execvp(&argv[0], &argv) {
        Ok(infallible) => match infallible {},
        Err(errno) => Err(anyhow!("executing {}: {}", command.join(" "), errno)),
    }
}
