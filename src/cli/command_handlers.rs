use std::path::Path;

use log::info;

use crate::{
    artifact::ArtifactIndexClient,
    checkout::{Checkout, CheckoutState},
    config::Settings,
    vcs::VcsClient,
};

/// Handler to checkout command
pub fn do_checkout<V: VcsClient>(
    settings: &Settings,
    index: &ArtifactIndexClient,
    vcs: &V,
    directory: &Path,
    base_url: &str,
    head_url: Option<&str>,
    head_rev: Option<&str>,
) -> anyhow::Result<String> {
    let revision =
        Checkout::new(settings, index, vcs).checkout(directory, base_url, head_url, head_rev)?;
    Ok(revision)
}

/// Handler to clone command
pub fn do_clone<V: VcsClient>(
    settings: &Settings,
    index: &ArtifactIndexClient,
    vcs: &V,
    url: &str,
    directory: &Path,
) -> anyhow::Result<CheckoutState> {
    let state = Checkout::new(settings, index, vcs).prepare(url, directory)?;
    info!("{} is ready ({:?})", directory.display(), state);
    Ok(state)
}

/// Handler to revision command
pub fn do_revision<V: VcsClient>(
    settings: &Settings,
    index: &ArtifactIndexClient,
    vcs: &V,
    directory: &Path,
) -> anyhow::Result<Option<String>> {
    Ok(Checkout::new(settings, index, vcs).revision(directory)?)
}

pub fn do_clear_cache(settings: &Settings) -> anyhow::Result<()> {
    let clones = settings.clones_dir();
    if clones.exists() {
        info!("Clearing repository cache {}.", clones.display());
        std::fs::remove_dir_all(&clones)?;
    } else {
        info!("{} is already removed, nothing to do", clones.display());
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    use crate::config::{DEFAULT_INDEX_URL, DEFAULT_NAMESPACE, DEFAULT_QUEUE_URL};

    fn settings(cache_dir: &Path) -> Settings {
        Settings {
            cache_dir: cache_dir.to_path_buf(),
            index_url: DEFAULT_INDEX_URL.to_owned(),
            queue_url: DEFAULT_QUEUE_URL.to_owned(),
            namespace: DEFAULT_NAMESPACE.to_owned(),
        }
    }

    #[test]
    fn clear_cache_removes_clones_only() {
        let scratch = tempfile::tempdir().unwrap();
        let settings = settings(scratch.path());
        std::fs::create_dir_all(settings.clones_dir().join("bitbucket.org/x")).unwrap();
        std::fs::write(settings.clones_dir().join("bitbucket.org/x/repo.tar.gz"), "").unwrap();
        std::fs::write(scratch.path().join("other"), "keep").unwrap();

        do_clear_cache(&settings).unwrap();

        assert!(!settings.clones_dir().exists());
        assert!(scratch.path().join("other").exists());
    }

    #[test]
    fn clear_missing_cache() {
        let scratch = tempfile::tempdir().unwrap();

        do_clear_cache(&settings(&scratch.path().join("absent"))).unwrap();
    }
}
