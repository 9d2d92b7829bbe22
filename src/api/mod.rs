use std::path::Path;

use crate::{
    artifact::ArtifactIndexClient,
    checkout::CheckoutState,
    cli::command_handlers::{do_checkout, do_clear_cache, do_clone, do_revision},
    config::Settings,
    git::GitClient,
};

mod builder;

pub use builder::TcCheckoutBuilder;

pub struct TcCheckout {
    settings: Settings,
    index: ArtifactIndexClient,
    vcs: GitClient,
}

impl TcCheckout {
    pub fn builder() -> TcCheckoutBuilder {
        TcCheckoutBuilder::default()
    }

    /// Clones or reuses `directory` and updates it to `head_rev` pulled from
    /// `head_url`. Returns the revision the working copy ends up at.
    pub fn checkout(
        &self,
        directory: impl AsRef<Path>,
        base_url: &str,
        head_url: Option<&str>,
        head_rev: Option<&str>,
    ) -> anyhow::Result<String> {
        do_checkout(
            &self.settings,
            &self.index,
            &self.vcs,
            directory.as_ref(),
            base_url,
            head_url,
            head_rev,
        )
    }

    /// Makes `directory` a working copy of `url` without moving it to a
    /// particular revision.
    pub fn clone(&self, url: &str, directory: impl AsRef<Path>) -> anyhow::Result<CheckoutState> {
        do_clone(
            &self.settings,
            &self.index,
            &self.vcs,
            url,
            directory.as_ref(),
        )
    }

    /// Revision the working copy at `directory` is at, if it is one.
    pub fn revision(&self, directory: impl AsRef<Path>) -> anyhow::Result<Option<String>> {
        do_revision(&self.settings, &self.index, &self.vcs, directory.as_ref())
    }

    /// Removes every cached archive.
    pub fn clear_cache(&self) -> anyhow::Result<()> {
        do_clear_cache(&self.settings)
    }
}
