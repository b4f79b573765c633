// src/compile/workspace.rs
use std::io::ErrorKind;
use std::path::{Component, Path, PathBuf};
use uuid::Uuid;

use crate::errors::{Result, ServerError};

pub const BUILD_DIR_NAME: &str = "build";
pub const SOURCE_FILE_NAME: &str = "main.qat";

/// An isolated per-request directory holding the submitted source and the
/// compiler's build output.
#[derive(Debug, Clone)]
pub struct Workspace {
    pub id: Uuid,
    pub root: PathBuf,
    pub build_dir: PathBuf,
    pub source_path: PathBuf,
}

/// Allocates workspaces under a common base directory.
#[derive(Debug, Clone)]
pub struct WorkspaceManager {
    base: PathBuf,
}

impl WorkspaceManager {
    pub fn new(base: impl Into<PathBuf>) -> Self {
        Self { base: base.into() }
    }

    pub fn base(&self) -> &Path {
        &self.base
    }

    /// Create `<base>/<uuid>/build` and hand back a guard that owns it.
    pub async fn provision(&self) -> Result<WorkspaceGuard> {
        let id = Uuid::new_v4();
        let root = self.base.join(id.to_string());
        let workspace = Workspace {
            id,
            build_dir: root.join(BUILD_DIR_NAME),
            source_path: root.join(SOURCE_FILE_NAME),
            root,
        };

        let mut builder = tokio::fs::DirBuilder::new();
        builder.recursive(true);
        #[cfg(unix)]
        builder.mode(0o755);

        if let Err(e) = builder.create(&workspace.build_dir).await {
            log::error!("Cannot create workspace {}: {}", workspace.root.display(), e);
            remove_dir(&workspace.root).await;
            return Err(ServerError::WorkspaceCreateFailed(e));
        }

        log::debug!("Provisioned workspace {}", workspace.root.display());
        Ok(WorkspaceGuard { workspace, released: false })
    }

    /// Wipe everything under the base directory. Run once at startup so
    /// workspaces left behind by a crashed process do not accumulate.
    ///
    /// Refuses a base that names no directory of its own (`""`, `.`, `/`) or
    /// that contains any of the `protected` paths.
    pub async fn purge_base(&self, protected: &[&Path]) -> Result<()> {
        check_purge_target(&self.base, protected)?;
        match tokio::fs::remove_dir_all(&self.base).await {
            Ok(()) => log::info!("Cleared compile directory {}", self.base.display()),
            Err(e) if e.kind() == ErrorKind::NotFound => {}
            Err(e) => return Err(ServerError::FileRead(e)),
        }
        tokio::fs::create_dir_all(&self.base).await?;
        Ok(())
    }
}

fn check_purge_target(base: &Path, protected: &[&Path]) -> Result<()> {
    let refuse = || {
        Err(ServerError::Config(format!(
            "refusing to clear compile directory '{}'",
            base.display()
        )))
    };

    if !base.components().any(|c| matches!(c, Component::Normal(_))) {
        return refuse();
    }
    // Nothing on disk yet, so nothing can be lost.
    let Ok(base) = std::fs::canonicalize(base) else {
        return Ok(());
    };
    if base.parent().is_none() {
        return refuse();
    }
    for path in protected {
        if let Ok(path) = std::fs::canonicalize(path) {
            if path.starts_with(&base) {
                return refuse();
            }
        }
    }
    Ok(())
}

/// Owns a provisioned workspace until it is destroyed.
///
/// Call [`WorkspaceGuard::destroy`] on every normal exit path. If the guard is
/// dropped without it (the request future was cancelled or panicked) the
/// directory is removed synchronously in `Drop`.
#[derive(Debug)]
pub struct WorkspaceGuard {
    workspace: Workspace,
    released: bool,
}

impl WorkspaceGuard {
    pub fn workspace(&self) -> &Workspace {
        &self.workspace
    }

    pub async fn write_source(&self, content: &str) -> Result<()> {
        tokio::fs::write(&self.workspace.source_path, content)
            .await
            .map_err(|e| {
                log::error!(
                    "Cannot write source to {}: {}",
                    self.workspace.source_path.display(),
                    e
                );
                ServerError::WorkspaceWriteFailed(e)
            })
    }

    /// Recursively remove the workspace. Failures are logged, never returned.
    pub async fn destroy(mut self) {
        self.released = true;
        remove_dir(&self.workspace.root).await;
    }
}

impl Drop for WorkspaceGuard {
    fn drop(&mut self) {
        if self.released {
            return;
        }
        match std::fs::remove_dir_all(&self.workspace.root) {
            Ok(()) => log::debug!(
                "Removed abandoned workspace {}",
                self.workspace.root.display()
            ),
            Err(e) if e.kind() == ErrorKind::NotFound => {}
            Err(e) => log::warn!(
                "Failed to remove abandoned workspace {}: {}",
                self.workspace.root.display(),
                e
            ),
        }
    }
}

async fn remove_dir(path: &Path) {
    match tokio::fs::remove_dir_all(path).await {
        Ok(()) => log::debug!("Removed workspace {}", path.display()),
        Err(e) if e.kind() == ErrorKind::NotFound => {}
        Err(e) => log::warn!("Failed to remove workspace {}: {}", path.display(), e),
    }
}
