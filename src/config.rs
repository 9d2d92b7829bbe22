use std::{collections::HashMap, path::PathBuf};

use config::{Config, ConfigError, Environment};
use serde::Deserialize;

pub const DEFAULT_INDEX_URL: &str = "https://index.taskcluster.net/v1";
pub const DEFAULT_QUEUE_URL: &str = "https://queue.taskcluster.net/v1";
pub const DEFAULT_NAMESPACE: &str = "tc-vcs.v1.clones";

const CLONES_DIR: &str = "clones";

/// Values read from the `TC_CHECKOUT_*` environment.
pub struct TcCheckoutConfig {
    pub cache_dir: Option<PathBuf>,
    pub index_url: Option<String>,
    pub index_namespace: Option<String>,
    pub queue_url: Option<String>,
}

impl TcCheckoutConfig {
    pub fn load() -> anyhow::Result<Self> {
        let raw_config = RawConfig::load(None)?;

        Ok(Self {
            cache_dir: raw_config.cache.dir,
            index_url: raw_config.index.url,
            index_namespace: raw_config.index.namespace,
            queue_url: raw_config.queue.url,
        })
    }
}

/// Fully resolved settings, built once and passed to every component.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    pub cache_dir: PathBuf,
    pub index_url: String,
    pub queue_url: String,
    pub namespace: String,
}

impl Settings {
    pub fn clones_dir(&self) -> PathBuf {
        self.cache_dir.join(CLONES_DIR)
    }
}

#[derive(Default, Debug, Deserialize, PartialEq, Eq)]
struct RawConfig {
    #[serde(default)]
    cache: CacheConfig,
    #[serde(default)]
    index: IndexConfig,
    #[serde(default)]
    queue: QueueConfig,
}

#[derive(Default, Debug, Deserialize, PartialEq, Eq)]
struct CacheConfig {
    dir: Option<PathBuf>,
}

#[derive(Default, Debug, Deserialize, PartialEq, Eq)]
struct IndexConfig {
    url: Option<String>,
    namespace: Option<String>,
}

#[derive(Default, Debug, Deserialize, PartialEq, Eq)]
struct QueueConfig {
    url: Option<String>,
}

impl RawConfig {
    fn load(env: Option<HashMap<String, String>>) -> Result<Self, ConfigError> {
        Config::builder()
            .add_source(
                Environment::with_prefix("TC_CHECKOUT")
                    .separator("_")
                    .source(env),
            )
            .build()?
            .try_deserialize()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use pretty_assertions::assert_eq;

    #[test]
    fn load_empty() {
        let env = HashMap::from([]);
        let config = RawConfig::load(Some(env)).unwrap();
        assert_eq!(config, RawConfig::default())
    }

    #[test]
    fn load_environment() {
        let env = HashMap::from([
            ("TC_CHECKOUT_CACHE_DIR".to_owned(), "/cache".to_owned()),
            (
                "TC_CHECKOUT_INDEX_URL".to_owned(),
                "http://index.local/v1".to_owned(),
            ),
            (
                "TC_CHECKOUT_INDEX_NAMESPACE".to_owned(),
                "tc-vcs.v2.clones".to_owned(),
            ),
            (
                "TC_CHECKOUT_QUEUE_URL".to_owned(),
                "http://queue.local/v1".to_owned(),
            ),
        ]);
        let config = RawConfig::load(Some(env)).unwrap();
        assert_eq!(
            config,
            RawConfig {
                cache: CacheConfig {
                    dir: Some("/cache".into())
                },
                index: IndexConfig {
                    url: Some("http://index.local/v1".to_owned()),
                    namespace: Some("tc-vcs.v2.clones".to_owned()),
                },
                queue: QueueConfig {
                    url: Some("http://queue.local/v1".to_owned())
                },
            }
        )
    }

    #[test]
    fn clones_live_under_cache_dir() {
        let settings = Settings {
            cache_dir: PathBuf::from("/home/worker/.tc-vcs"),
            index_url: DEFAULT_INDEX_URL.to_owned(),
            queue_url: DEFAULT_QUEUE_URL.to_owned(),
            namespace: DEFAULT_NAMESPACE.to_owned(),
        };
        assert_eq!(
            settings.clones_dir(),
            PathBuf::from("/home/worker/.tc-vcs/clones")
        );
    }
}
