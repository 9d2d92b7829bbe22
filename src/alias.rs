use std::{
    fmt::{Display, Formatter},
    path::PathBuf,
};

use md5::{Digest, Md5};
use thiserror::Error;
use url::Url;

#[derive(Error, Debug)]
pub enum AliasError {
    #[error("Invalid repository url {url}: {error}")]
    InvalidUrl { url: String, error: url::ParseError },
    #[error("Repository url {0} has neither a host nor a path")]
    Empty(String),
}

/// Scheme-less identifier of a repository, used as the cache key.
///
/// `https://hg.mozilla.org/build/mozharness/` and
/// `http://hg.mozilla.org/build/mozharness` share the alias
/// `hg.mozilla.org/build/mozharness`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Ord, PartialOrd)]
pub struct RepositoryAlias(String);

impl RepositoryAlias {
    pub fn from_url(url: &str) -> Result<RepositoryAlias, AliasError> {
        let parsed = Url::parse(url).map_err(|error| AliasError::InvalidUrl {
            url: url.to_owned(),
            error,
        })?;

        let mut alias = String::new();
        if let Some(host) = parsed.host_str() {
            alias.push_str(host);
            if let Some(port) = parsed.port() {
                alias.push(':');
                alias.push_str(&port.to_string());
            }
        }
        alias.push_str(parsed.path().trim_end_matches('/'));

        if alias.is_empty() {
            return Err(AliasError::Empty(url.to_owned()));
        }
        Ok(RepositoryAlias(alias))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn namespace(&self, prefix: &str) -> CacheNamespace {
        let digest = Md5::digest(self.0.as_bytes());
        CacheNamespace(format!("{}.{}", prefix, hex::encode(digest)))
    }

    pub fn archive_file_name(&self) -> String {
        format!("{}.tar.gz", self.0)
    }

    /// Relative location of the archive inside the `clones` directory.
    ///
    /// Empty, `.` and `..` segments are dropped so the result never leaves
    /// the directory it is joined onto.
    pub fn to_cache_path(&self) -> PathBuf {
        let segments: Vec<&str> = self
            .0
            .split('/')
            .filter(|segment| !matches!(*segment, "" | "." | ".."))
            .collect();

        let mut result = PathBuf::new();
        if let Some((last, parents)) = segments.split_last() {
            for parent in parents {
                result.push(parent);
            }
            result.push(format!("{last}.tar.gz"));
        }
        result
    }
}

impl Display for RepositoryAlias {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Key under which the remote index registers archives for an alias.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheNamespace(String);

impl CacheNamespace {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Display for CacheNamespace {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Joins url fragments with a single slash, ignoring trailing slashes of
/// every fragment.
pub fn url_join<S: AsRef<str>>(segments: &[S]) -> String {
    segments
        .iter()
        .map(|segment| segment.as_ref().trim_end_matches('/'))
        .collect::<Vec<_>>()
        .join("/")
}

#[cfg(test)]
mod tests {
    use super::*;

    use pretty_assertions::assert_eq;

    #[test]
    fn alias_strips_scheme() {
        let alias = RepositoryAlias::from_url("https://foo.org/bar").unwrap();
        assert_eq!(alias.as_str(), "foo.org/bar");
    }

    #[test]
    fn alias_ignores_scheme_and_trailing_slash() {
        let expected = RepositoryAlias::from_url("https://hg.mozilla.org/build/tools").unwrap();
        for url in [
            "http://hg.mozilla.org/build/tools",
            "https://hg.mozilla.org/build/tools/",
            "ssh://hg.mozilla.org/build/tools",
        ] {
            assert_eq!(RepositoryAlias::from_url(url).unwrap(), expected);
        }
    }

    #[test]
    fn alias_never_contains_scheme() {
        for url in [
            "https://github.com/org/repo",
            "ssh://git@github.com/org/repo.git",
            "git://example.com:9418/repo",
            "file:///srv/repos/repo",
        ] {
            let alias = RepositoryAlias::from_url(url).unwrap();
            assert!(!alias.as_str().contains("://"), "{alias}");
        }
    }

    #[test]
    fn alias_uses_normalized_url() {
        let alias = RepositoryAlias::from_url("https://Bitbucket.org/x/my repo").unwrap();
        assert_eq!(alias.as_str(), "bitbucket.org/x/my%20repo");
    }

    #[test]
    fn alias_drops_userinfo_keeps_port() {
        let alias = RepositoryAlias::from_url("ssh://git@example.com:2222/org/repo").unwrap();
        assert_eq!(alias.as_str(), "example.com:2222/org/repo");
    }

    #[test]
    fn alias_of_file_url_is_its_path() {
        let alias = RepositoryAlias::from_url("file:///srv/repos/repo/").unwrap();
        assert_eq!(alias.as_str(), "/srv/repos/repo");
    }

    #[test]
    fn alias_rejects_garbage() {
        assert!(matches!(
            RepositoryAlias::from_url("not a url"),
            Err(AliasError::InvalidUrl { .. })
        ));
    }

    #[test]
    fn namespace_is_prefixed_md5() {
        let alias = RepositoryAlias::from_url("https://foo.org/bar").unwrap();
        let namespace = alias.namespace("tc-vcs.v1.clones");
        let hash = namespace
            .as_str()
            .strip_prefix("tc-vcs.v1.clones.")
            .unwrap();
        assert_eq!(hash.len(), 32);
        assert!(hash.chars().all(|c| c.is_ascii_hexdigit()));
        assert_eq!(namespace, alias.namespace("tc-vcs.v1.clones"));
        assert_ne!(
            namespace,
            RepositoryAlias::from_url("https://foo.org/baz")
                .unwrap()
                .namespace("tc-vcs.v1.clones")
        );
    }

    #[test]
    fn cache_path_stays_relative() {
        let alias = RepositoryAlias::from_url("file:///srv/../repos/./repo").unwrap();
        let path = alias.to_cache_path();
        assert!(path.is_relative());
        assert!(path.ends_with("repo.tar.gz"));

        let alias = RepositoryAlias::from_url("https://bitbucket.org/x/repo").unwrap();
        assert_eq!(
            alias.to_cache_path(),
            PathBuf::from("bitbucket.org/x/repo.tar.gz")
        );
        assert_eq!(alias.archive_file_name(), "bitbucket.org/x/repo.tar.gz");
    }

    #[test]
    fn url_join_no_slash() {
        assert_eq!(url_join(&["foo", "bar", "baz", "qux"]), "foo/bar/baz/qux");
    }

    #[test]
    fn url_join_right_slashes() {
        assert_eq!(url_join(&["foo/", "bar", "baz/", "qux"]), "foo/bar/baz/qux");
        assert_eq!(
            url_join(&["https://index.taskcluster.net/v1/", "task", "ns"]),
            "https://index.taskcluster.net/v1/task/ns"
        );
    }
}
