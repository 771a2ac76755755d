//! Version-Control Collaborator
//!
//! The replayer only needs four things from a VCS: saving and restoring the
//! workspace state, checking out a revision, and describing one. `GitVcs`
//! provides them by shelling out to `git`; tests and embedders can
//! substitute any other `Vcs` implementation.

use fluxprof_core::MinorVersion;
use std::path::PathBuf;
use std::process::Command;
use thiserror::Error;

/// Failure inside the VCS collaborator.
#[derive(Debug, Error)]
pub enum VcsError {
    /// The VCS binary could not be executed
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A VCS command exited unsuccessfully
    #[error("{command} failed: {output}")]
    Command {
        /// The failing command line
        command: String,
        /// Captured stderr
        output: String,
    },

    /// A checkout did not complete
    #[error("checkout of {revision} failed: {output}")]
    Checkout {
        /// The revision that was requested
        revision: String,
        /// Captured stderr
        output: String,
    },

    /// A revision reference could not be resolved
    #[error("unknown revision: {0}")]
    UnknownRevision(String),
}

/// Workspace state captured before a replay, to be restored afterwards.
#[derive(Debug, Clone)]
pub struct SavedState {
    /// Branch name or detached checksum the workspace was at
    pub head: String,
    /// Whether uncommitted changes were stashed away
    pub stashed: bool,
}

/// The contract the revision replayer consumes.
pub trait Vcs {
    /// Capture the current workspace state, leaving the workspace clean.
    fn save_state(&self) -> Result<SavedState, VcsError>;

    /// Restore a previously captured workspace state.
    fn restore_state(&self, state: &SavedState) -> Result<(), VcsError>;

    /// Check out the given revision. Blocking; fails loudly.
    fn checkout(&self, checksum: &str) -> Result<(), VcsError>;

    /// Resolve a revision reference into a described minor version.
    fn minor_version(&self, rev: &str) -> Result<MinorVersion, VcsError>;
}

/// Scoped clean-workspace guarantee around the whole revision loop.
///
/// Acquisition captures (and cleans) the workspace; the state is restored
/// when the guard drops, on every exit path including panics. Restore
/// failures cannot be surfaced from `Drop`, so they are logged.
pub struct CleanState<'a> {
    vcs: &'a dyn Vcs,
    state: Option<SavedState>,
}

impl<'a> CleanState<'a> {
    /// Capture the workspace state, failing the whole run on error.
    pub fn acquire(vcs: &'a dyn Vcs) -> Result<Self, VcsError> {
        let state = vcs.save_state()?;
        Ok(Self {
            vcs,
            state: Some(state),
        })
    }
}

impl Drop for CleanState<'_> {
    fn drop(&mut self) {
        if let Some(state) = self.state.take() {
            if let Err(e) = self.vcs.restore_state(&state) {
                tracing::error!("failed to restore workspace state: {e}");
            }
        }
    }
}

/// Resolve the revision references given on the command line.
///
/// An empty list defaults to the current head, so a plain run measures the
/// checked-out revision.
pub fn resolve_minor_versions(
    vcs: &dyn Vcs,
    refs: &[String],
) -> Result<Vec<MinorVersion>, VcsError> {
    if refs.is_empty() {
        return Ok(vec![vcs.minor_version("HEAD")?]);
    }
    refs.iter().map(|r| vcs.minor_version(r)).collect()
}

/// Git-backed VCS collaborator.
#[derive(Debug, Clone)]
pub struct GitVcs {
    root: PathBuf,
}

impl GitVcs {
    /// A git collaborator operating on the repository at `root`.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    fn git(&self, args: &[&str]) -> Result<String, VcsError> {
        let output = Command::new("git")
            .args(args)
            .current_dir(&self.root)
            .output()?;

        if !output.status.success() {
            return Err(VcsError::Command {
                command: format!("git {}", args.join(" ")),
                output: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }
        Ok(String::from_utf8_lossy(&output.stdout).trim().to_string())
    }
}

impl Vcs for GitVcs {
    fn save_state(&self) -> Result<SavedState, VcsError> {
        // Branch name when on one, detached checksum otherwise
        let head = match self.git(&["symbolic-ref", "--short", "-q", "HEAD"]) {
            Ok(branch) if !branch.is_empty() => branch,
            _ => self.git(&["rev-parse", "HEAD"])?,
        };

        let stash_output = self.git(&["stash", "push", "--include-untracked"])?;
        let stashed = !stash_output.contains("No local changes");

        Ok(SavedState { head, stashed })
    }

    fn restore_state(&self, state: &SavedState) -> Result<(), VcsError> {
        self.git(&["checkout", "--quiet", &state.head])?;
        if state.stashed {
            self.git(&["stash", "pop", "--quiet"])?;
        }
        Ok(())
    }

    fn checkout(&self, checksum: &str) -> Result<(), VcsError> {
        self.git(&["checkout", "--quiet", checksum])
            .map(|_| ())
            .map_err(|e| match e {
                VcsError::Command { output, .. } => VcsError::Checkout {
                    revision: checksum.to_string(),
                    output,
                },
                other => other,
            })
    }

    fn minor_version(&self, rev: &str) -> Result<MinorVersion, VcsError> {
        let checksum = self
            .git(&["rev-parse", "--verify", &format!("{rev}^{{commit}}")])
            .map_err(|_| VcsError::UnknownRevision(rev.to_string()))?;

        // Author and subject line are best-effort metadata
        let described = self
            .git(&["log", "-1", "--format=%an\x09%s", &checksum])
            .unwrap_or_default();
        let mut fields = described.splitn(2, '\t');
        let author = fields.next().map(str::to_string).filter(|s| !s.is_empty());
        let description = fields.next().map(str::to_string);

        Ok(MinorVersion {
            checksum,
            author,
            description,
        })
    }
}
