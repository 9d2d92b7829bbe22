use std::path::PathBuf;

use home::home_dir;

use crate::{
    artifact::ArtifactIndexClient,
    config::{Settings, TcCheckoutConfig, DEFAULT_INDEX_URL, DEFAULT_NAMESPACE, DEFAULT_QUEUE_URL},
    git::GitClient,
    TcCheckout,
};

#[derive(Default)]
pub struct TcCheckoutBuilder {
    cache_directory_path: Option<PathBuf>,
    index_url: Option<String>,
    queue_url: Option<String>,
    namespace: Option<String>,
}

impl TcCheckoutBuilder {
    /// Location of the cache root holding `clones/<alias>.tar.gz` archives.
    ///
    /// Defaults to `$TC_CHECKOUT_CACHE_DIR`, then `$HOME/.tc-vcs`.
    pub fn cache_directory(mut self, path: impl Into<PathBuf>) -> Self {
        self.cache_directory_path = Some(path.into());
        self
    }

    /// Base url of the index service used to find cached archives.
    pub fn index_url(mut self, url: impl Into<String>) -> Self {
        self.index_url = Some(url.into());
        self
    }

    /// Base url of the queue service serving task artifacts.
    pub fn queue_url(mut self, url: impl Into<String>) -> Self {
        self.queue_url = Some(url.into());
        self
    }

    /// Index namespace prefix, defaults to `tc-vcs.v1.clones`.
    pub fn namespace(mut self, namespace: impl Into<String>) -> Self {
        self.namespace = Some(namespace.into());
        self
    }

    pub fn try_build(self) -> anyhow::Result<TcCheckout> {
        let Self {
            cache_directory_path,
            index_url,
            queue_url,
            namespace,
        } = self;
        let config = TcCheckoutConfig::load()?;

        let cache_dir = match cache_directory_path.or(config.cache_dir) {
            Some(cache_dir) => cache_dir,
            None => default_cache_directory()?,
        };

        let settings = Settings {
            cache_dir,
            index_url: index_url
                .or(config.index_url)
                .unwrap_or_else(|| DEFAULT_INDEX_URL.to_owned()),
            queue_url: queue_url
                .or(config.queue_url)
                .unwrap_or_else(|| DEFAULT_QUEUE_URL.to_owned()),
            namespace: namespace
                .or(config.index_namespace)
                .unwrap_or_else(|| DEFAULT_NAMESPACE.to_owned()),
        };
        log::debug!("Using {:?}", settings);

        let index = ArtifactIndexClient::new(&settings.index_url, &settings.queue_url);
        let vcs = GitClient::open_default()?;

        Ok(TcCheckout {
            settings,
            index,
            vcs,
        })
    }
}

fn default_cache_directory() -> anyhow::Result<PathBuf> {
    let mut cache_directory = home_dir()
        .ok_or_else(|| anyhow::anyhow!("Could not find home dir. Please define $HOME env variable."))?;
    cache_directory.push(".tc-vcs");
    Ok(cache_directory)
}
