use std::sync::OnceLock;

use git2::{build::CheckoutBuilder, Commit, Remote, Repository};
use log::{debug, trace, warn};
use regex_lite::Regex;

use crate::vcs::{VcsError, WorkingCopy};

use super::client::GitClient;

const ORIGIN: &str = "origin";
const ALL_BRANCHES: &str = "+refs/heads/*:refs/remotes/origin/*";

pub struct GitWorkingCopy<'a> {
    client: &'a GitClient,
    git_repo: Repository,
}

impl<'a> GitWorkingCopy<'a> {
    pub fn new(client: &'a GitClient, git_repo: Repository) -> GitWorkingCopy<'a> {
        GitWorkingCopy { client, git_repo }
    }

    fn fetch(&self, remote: &mut Remote<'_>, refspecs: &[String]) -> Result<(), VcsError> {
        trace!(
            "Fetching {:?} from {}",
            refspecs,
            remote.url().unwrap_or("<unknown>")
        );
        remote.fetch(refspecs, Some(&mut self.client.fetch_options()), None)?;
        Ok(())
    }

    fn fetch_commit(&self, remote: &mut Remote<'_>, commit_hash: &str) -> Result<(), VcsError> {
        if self.find_commit(commit_hash).is_some() {
            debug!("Revision {} is already present", commit_hash);
            return Ok(());
        }

        match self.fetch(remote, &[commit_hash.to_owned()]) {
            Ok(()) if self.find_commit(commit_hash).is_some() => return Ok(()),
            Ok(()) => warn!(
                "Fetching {} did not provide it, falling back to a full fetch",
                commit_hash
            ),
            Err(error) => warn!(
                "Failed to fetch a single commit {}, falling back to a full fetch: {}",
                commit_hash, error
            ),
        }
        self.fetch(remote, &[ALL_BRANCHES.to_owned()])
    }

    fn find_commit(&self, spec: &str) -> Option<Commit<'_>> {
        self.git_repo
            .revparse_single(spec)
            .and_then(|object| object.peel_to_commit())
            .ok()
    }

    fn resolve(&self, rev: &str) -> Result<Commit<'_>, VcsError> {
        self.find_commit(&format!("refs/remotes/{ORIGIN}/{rev}"))
            .or_else(|| self.find_commit(rev))
            .ok_or_else(|| VcsError::RevisionNotFound(rev.to_owned()))
    }
}

impl WorkingCopy for GitWorkingCopy<'_> {
    fn pull(&self, source: Option<&str>, rev: Option<&str>) -> Result<(), VcsError> {
        let mut remote = match source {
            Some(url) => self.git_repo.remote_anonymous(url)?,
            None => self.git_repo.find_remote(ORIGIN)?,
        };

        match rev {
            Some(rev) if is_commit_id(rev) => self.fetch_commit(&mut remote, rev),
            Some(branch) => self.fetch(
                &mut remote,
                &[format!("+refs/heads/{branch}:refs/remotes/{ORIGIN}/{branch}")],
            ),
            None => self.fetch(&mut remote, &[ALL_BRANCHES.to_owned()]),
        }
    }

    fn update(&self, rev: &str) -> Result<(), VcsError> {
        let commit = self.resolve(rev)?;
        debug!("Updating working tree to {} ({})", rev, commit.id());

        self.git_repo
            .checkout_tree(commit.as_object(), Some(CheckoutBuilder::new().force()))?;

        let branch_ref = format!("refs/heads/{rev}");
        if self.git_repo.find_reference(&branch_ref).is_ok() {
            self.git_repo.reference(
                &branch_ref,
                commit.id(),
                true,
                &format!("tc-checkout: update {rev} to {}", commit.id()),
            )?;
            self.git_repo.set_head(&branch_ref)?;
        } else {
            self.git_repo.set_head_detached(commit.id())?;
        }
        Ok(())
    }

    fn branch(&self) -> Result<String, VcsError> {
        let head = self.git_repo.head()?;
        if head.is_branch() {
            if let Some(name) = head.shorthand() {
                return Ok(name.to_owned());
            }
        }

        // Detached: fall back to what the remote calls its default branch.
        let remote_head = self
            .git_repo
            .find_reference(&format!("refs/remotes/{ORIGIN}/HEAD"))
            .ok()
            .and_then(|reference| reference.symbolic_target().map(str::to_owned));
        remote_head
            .as_deref()
            .and_then(|target| target.strip_prefix(&format!("refs/remotes/{ORIGIN}/")))
            .map(str::to_owned)
            .ok_or_else(|| {
                VcsError::NoDefaultBranch(self.git_repo.path().to_string_lossy().to_string())
            })
    }

    fn current_revision(&self) -> Result<String, VcsError> {
        Ok(self.git_repo.head()?.peel_to_commit()?.id().to_string())
    }
}

fn is_commit_id(rev: &str) -> bool {
    static COMMIT_ID: OnceLock<Regex> = OnceLock::new();
    COMMIT_ID
        .get_or_init(|| Regex::new(r"^[0-9a-fA-F]{7,40}$").unwrap())
        .is_match(rev)
}
