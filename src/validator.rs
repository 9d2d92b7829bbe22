use std::path::Path;

use git2::Repository;
use log::debug;

use crate::alias::RepositoryAlias;

const METADATA_DIR: &str = ".git";

/// Whether `path` is a checkout whose configured remotes point at `alias`.
///
/// A remote matches when its url merely contains the alias, so
/// `https://example.com/org/repo-extra` also satisfies `example.com/org/repo`.
pub fn is_valid_checkout(path: &Path, alias: &RepositoryAlias) -> bool {
    if !path.join(METADATA_DIR).exists() {
        debug!("{} is not a git repository", path.display());
        return false;
    }

    let repo = match Repository::open(path) {
        Ok(repo) => repo,
        Err(error) => {
            debug!("Could not open {}: {}", path.display(), error);
            return false;
        }
    };

    let remote_urls = remote_urls(&repo);
    if remote_urls.iter().any(|url| url.contains(alias.as_str())) {
        debug!("{} is a valid repository for {}", path.display(), alias);
        true
    } else {
        debug!(
            "{} is an invalid repository for {}, remotes are {:?}",
            path.display(),
            alias,
            remote_urls
        );
        false
    }
}

fn remote_urls(repo: &Repository) -> Vec<String> {
    let names = match repo.remotes() {
        Ok(names) => names,
        Err(_) => return Vec::new(),
    };
    names
        .iter()
        .flatten()
        .filter_map(|name| repo.find_remote(name).ok())
        .filter_map(|remote| remote.url().map(str::to_owned))
        .collect()
}
