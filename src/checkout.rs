use std::path::{Path, PathBuf};

use log::{debug, info, warn};
use thiserror::Error;

use crate::{
    alias::{AliasError, RepositoryAlias},
    archive::{install_from_archive, ExtractionError},
    artifact::{ArtifactError, ArtifactIndexClient},
    config::Settings,
    validator::is_valid_checkout,
    vcs::{VcsClient, VcsError},
};

#[derive(Error, Debug)]
pub enum CheckoutError {
    #[error(transparent)]
    Alias(#[from] AliasError),
    #[error("{path} exists but is not a checkout of {alias}")]
    InvalidRepository { path: PathBuf, alias: String },
    #[error("Error while extracting cached repository: {0}")]
    Extraction(#[from] ExtractionError),
    #[error("VCS error: {0}")]
    Vcs(#[from] VcsError),
}

/// How the destination directory came to hold a working copy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CheckoutState {
    /// Already there and bound to the right remote.
    Present,
    /// Seeded from a local or remote cache archive.
    CachedExtracted,
    /// Cloned over the network.
    ClonedFresh,
}

pub struct Checkout<'a, V: VcsClient> {
    settings: &'a Settings,
    index: &'a ArtifactIndexClient,
    vcs: &'a V,
}

impl<'a, V: VcsClient> Checkout<'a, V> {
    pub fn new(settings: &'a Settings, index: &'a ArtifactIndexClient, vcs: &'a V) -> Self {
        Checkout {
            settings,
            index,
            vcs,
        }
    }

    /// Brings `dest` to the requested revision of the repository at
    /// `base_url` and returns the resulting revision id.
    ///
    /// `head_url` defaults to `base_url`; `head_rev` defaults to the branch
    /// the working copy is on once it exists.
    pub fn checkout(
        &self,
        dest: &Path,
        base_url: &str,
        head_url: Option<&str>,
        head_rev: Option<&str>,
    ) -> Result<String, CheckoutError> {
        let state = self.prepare(base_url, dest)?;
        debug!("{} prepared as {:?}", dest.display(), state);

        let working_copy = self.vcs.open(dest)?;
        let head_url = head_url.unwrap_or(base_url);
        let head_rev = match head_rev {
            Some(rev) => rev.to_owned(),
            None => working_copy.branch()?,
        };

        info!(
            "Updating {} to revision '{}' from {}",
            dest.display(),
            head_rev,
            head_url
        );
        working_copy.pull(Some(head_url), Some(&head_rev))?;
        working_copy.update(&head_rev)?;

        let revision = working_copy.current_revision()?;
        info!("{} is at {}", dest.display(), revision);
        Ok(revision)
    }

    /// Makes sure `dest` is a working copy of `url`, reusing it when present,
    /// seeding it from a cache archive when possible and cloning otherwise.
    pub fn prepare(&self, url: &str, dest: &Path) -> Result<CheckoutState, CheckoutError> {
        let alias = RepositoryAlias::from_url(url)?;

        let state = if dest.exists() {
            debug!("Path to repository {} at {} already exists", url, dest.display());
            CheckoutState::Present
        } else if self.seed_from_cache(&alias, dest)? {
            CheckoutState::CachedExtracted
        } else {
            info!("Cloning {} without cache", url);
            self.vcs.clone_repository(url, dest)?;
            CheckoutState::ClonedFresh
        };

        if !is_valid_checkout(dest, &alias) {
            return Err(CheckoutError::InvalidRepository {
                path: dest.to_path_buf(),
                alias: alias.to_string(),
            });
        }
        Ok(state)
    }

    /// Current revision of the working copy at `dest`, `None` when `dest`
    /// is not a working copy.
    pub fn revision(&self, dest: &Path) -> Result<Option<String>, CheckoutError> {
        match self.vcs.open(dest) {
            Ok(working_copy) => Ok(Some(working_copy.current_revision()?)),
            Err(error) => {
                debug!("No revision for {}: {}", dest.display(), error);
                Ok(None)
            }
        }
    }

    pub fn local_archive_path(&self, alias: &RepositoryAlias) -> PathBuf {
        self.settings.clones_dir().join(alias.to_cache_path())
    }

    /// Extracts a cached archive of `alias` into `dest`. Returns `false` when
    /// neither the local nor the remote cache can provide one.
    fn seed_from_cache(
        &self,
        alias: &RepositoryAlias,
        dest: &Path,
    ) -> Result<bool, ExtractionError> {
        let local_archive = self.local_archive_path(alias);

        if local_archive.exists() {
            debug!("Using local cache {}", local_archive.display());
        } else if !self.fill_local_cache(alias, &local_archive) {
            return Ok(false);
        }

        install_from_archive(&local_archive, dest)?;
        info!(
            "Seeded {} from cached {}",
            dest.display(),
            local_archive.display()
        );
        Ok(true)
    }

    fn fill_local_cache(&self, alias: &RepositoryAlias, local_archive: &Path) -> bool {
        let namespace = alias.namespace(&self.settings.namespace);
        let artifact_path = format!("public/{}", alias.archive_file_name());

        let url = match self.index.resolve_artifact_url(&namespace, &artifact_path) {
            Ok(Some(url)) => url,
            Ok(None) => {
                info!("Failed to find remote cache for {}", artifact_path);
                return false;
            }
            Err(error @ ArtifactError::MalformedResponse { .. }) => {
                info!("Unable to retrieve task for {}: {}", namespace, error);
                return false;
            }
            Err(error) => {
                warn!("Remote cache lookup for {} failed: {}", namespace, error);
                return false;
            }
        };

        match self.index.download_archive(&url, local_archive) {
            Ok(_) => true,
            Err(error) => {
                warn!("Unable to download {}: {}", url, error);
                false
            }
        }
    }
}
