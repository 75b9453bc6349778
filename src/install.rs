//! Plugin artifact installation.
//!
//! Authentication extensions and their client drivers ship pre-packaged
//! under a bundle root inside the image. Installing a backend means
//! symlinking the matching archives into the `extensions/` and `lib/`
//! directories the web application scans at startup.

use std::fs;
use std::os::unix::fs::symlink;
use std::path::Path;

use anyhow::{bail, Context, Result};
use tracing::{debug, info};

use crate::backend::BackendKind;
use crate::bootstrap::GatewayPaths;

/// Glob matching a backend's authentication extension archives.
pub const EXTENSION_GLOB: &str = "guacamole-auth-*.jar";

/// Symlink every artifact of `backends` into the configuration home.
///
/// A selected backend whose bundle directory matches nothing is an error;
/// it would leave the web application silently unable to authenticate.
pub fn install_plugins(
    backends: &[BackendKind],
    bundle_root: &Path,
    paths: &GatewayPaths,
) -> Result<()> {
    fs::create_dir_all(&paths.extensions_dir)
        .with_context(|| format!("creating {}", paths.extensions_dir.display()))?;
    fs::create_dir_all(&paths.lib_dir)
        .with_context(|| format!("creating {}", paths.lib_dir.display()))?;

    for kind in backends {
        let bundle = bundle_root.join(kind.bundle_dir());

        let linked = link_matching(&bundle, EXTENSION_GLOB, &paths.extensions_dir)?;
        if linked == 0 {
            bail!("no {} extension found under {}", kind, bundle.display());
        }

        if let Some(driver) = kind.driver_glob() {
            let linked = link_matching(&bundle, driver, &paths.lib_dir)?;
            if linked == 0 {
                bail!("no {} driver found under {}", kind, bundle.display());
            }
        }

        info!("Installed {} plugin from {}", kind, bundle.display());
    }
    Ok(())
}

/// Symlink every file under `dir` matching `pattern` into `dest`. Returns
/// the number of links created.
fn link_matching(dir: &Path, pattern: &str, dest: &Path) -> Result<usize> {
    let full_pattern = dir.join(pattern);
    let full_pattern = full_pattern.to_string_lossy();

    let mut linked = 0;
    for entry in
        glob::glob(&full_pattern).with_context(|| format!("bad pattern {}", full_pattern))?
    {
        let source = entry.with_context(|| format!("reading {}", dir.display()))?;
        let Some(file_name) = source.file_name() else {
            continue;
        };
        let target = dest.join(file_name);
        symlink(&source, &target).with_context(|| {
            format!("linking {} to {}", source.display(), target.display())
        })?;
        debug!("Linked {} -> {}", target.display(), source.display());
        linked += 1;
    }
    Ok(linked)
}
