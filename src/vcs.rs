use std::path::Path;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum VcsError {
    #[error("Git error: {0}")]
    Git(#[from] git2::Error),
    #[error("Revision {0} was not found.")]
    RevisionNotFound(String),
    #[error("Repository at {0} has no default branch")]
    NoDefaultBranch(String),
}

/// Version control operations the checkout logic depends on.
pub trait VcsClient {
    fn clone_repository(&self, url: &str, dest: &Path) -> Result<(), VcsError>;

    fn open(&self, path: &Path) -> Result<Box<dyn WorkingCopy + '_>, VcsError>;
}

pub trait WorkingCopy {
    /// Fetches `rev` (or every branch) from `source`, defaulting to the
    /// repository's own remote.
    fn pull(&self, source: Option<&str>, rev: Option<&str>) -> Result<(), VcsError>;

    /// Moves the working tree to `rev`.
    fn update(&self, rev: &str) -> Result<(), VcsError>;

    fn branch(&self) -> Result<String, VcsError>;

    fn current_revision(&self) -> Result<String, VcsError>;
}
