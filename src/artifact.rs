use std::{
    fs::File,
    io::{BufWriter, Read, Write},
    path::{Path, PathBuf},
};

use log::{debug, info, trace};
use serde::Deserialize;
use thiserror::Error;

use crate::alias::{url_join, CacheNamespace};

#[derive(Error, Debug)]
pub enum ArtifactError {
    #[error("Request to {url} failed: {message}")]
    Network { url: String, message: String },
    #[error("Unexpected response from {url}: {error}")]
    MalformedResponse {
        url: String,
        error: serde_json::Error,
    },
    #[error("Could not write {path}: {error}")]
    Io {
        path: PathBuf,
        error: std::io::Error,
    },
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct IndexedTask {
    task_id: String,
}

/// Locates archives built by the remote index and downloads them.
pub struct ArtifactIndexClient {
    agent: ureq::Agent,
    index_url: String,
    queue_url: String,
}

impl ArtifactIndexClient {
    pub fn new(index_url: impl Into<String>, queue_url: impl Into<String>) -> Self {
        ArtifactIndexClient {
            agent: ureq::Agent::new(),
            index_url: index_url.into(),
            queue_url: queue_url.into(),
        }
    }

    /// Url of `artifact_path` produced by the latest task indexed under
    /// `namespace`, `None` if nothing is indexed there.
    pub fn resolve_artifact_url(
        &self,
        namespace: &CacheNamespace,
        artifact_path: &str,
    ) -> Result<Option<String>, ArtifactError> {
        let url = url_join(&[self.index_url.as_str(), "task", namespace.as_str()]);
        trace!("Looking up indexed task at {}", url);

        let response = match self.agent.get(&url).call() {
            Ok(response) => response,
            Err(ureq::Error::Status(404, _)) => {
                debug!("No task indexed under {}", namespace);
                return Ok(None);
            }
            Err(error) => return Err(network_error(&url, error)),
        };

        let body = response.into_string().map_err(|error| ArtifactError::Network {
            url: url.clone(),
            message: error.to_string(),
        })?;
        let task: IndexedTask = serde_json::from_str(&body)
            .map_err(|error| ArtifactError::MalformedResponse { url, error })?;

        let artifact_url = url_join(&[
            self.queue_url.as_str(),
            "task",
            task.task_id.as_str(),
            "artifacts",
            artifact_path,
        ]);
        debug!("Remote cache located at {}", artifact_url);
        Ok(Some(artifact_url))
    }

    /// Streams `url` into `dest`, returning the number of bytes written.
    ///
    /// The body lands in a `.part` sibling first and is renamed on success,
    /// so `dest` never holds a truncated archive.
    pub fn download_archive(&self, url: &str, dest: &Path) -> Result<u64, ArtifactError> {
        let response = self
            .agent
            .get(url)
            .call()
            .map_err(|error| network_error(url, error))?;
        trace!("Opened {} for reading", url);

        let partial = partial_path(dest);
        let result = write_body(response.into_reader(), &partial, url);
        let size = match result {
            Ok(size) => size,
            Err(error) => {
                let _ = std::fs::remove_file(&partial);
                return Err(error);
            }
        };

        if let Err(error) = std::fs::rename(&partial, dest) {
            let _ = std::fs::remove_file(&partial);
            return Err(ArtifactError::Io {
                path: dest.to_path_buf(),
                error,
            });
        }
        info!("Downloaded {} ({} bytes) to {}", url, size, dest.display());
        Ok(size)
    }
}

fn write_body(
    mut body: impl Read,
    path: &Path,
    url: &str,
) -> Result<u64, ArtifactError> {
    let io_error = |error: std::io::Error| ArtifactError::Io {
        path: path.to_path_buf(),
        error,
    };

    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).map_err(io_error)?;
    }
    let mut out = BufWriter::new(File::create(path).map_err(io_error)?);

    // Read failures come from the transport, write failures from the disk.
    let mut buffer = [0u8; 8 * 1024];
    let mut size = 0u64;
    loop {
        let read = body
            .read(&mut buffer)
            .map_err(|error| ArtifactError::Network {
                url: url.to_owned(),
                message: error.to_string(),
            })?;
        if read == 0 {
            break;
        }
        out.write_all(&buffer[..read]).map_err(io_error)?;
        size += read as u64;
    }
    out.flush().map_err(io_error)?;
    Ok(size)
}

fn partial_path(dest: &Path) -> PathBuf {
    let mut name = dest.file_name().unwrap_or_default().to_os_string();
    name.push(".part");
    dest.with_file_name(name)
}

fn network_error(url: &str, error: ureq::Error) -> ArtifactError {
    let message = match error {
        ureq::Error::Status(code, _) => format!("HTTP {code}"),
        ureq::Error::Transport(transport) => format!("transport error: {transport}"),
    };
    ArtifactError::Network {
        url: url.to_owned(),
        message,
    }
}
