use std::{
    ffi::OsString,
    fs::File,
    io::BufReader,
    path::{Path, PathBuf},
};

use flate2::read::GzDecoder;
use log::{debug, trace};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ExtractionError {
    #[error("Could not open archive {path}: {error}")]
    Open {
        path: PathBuf,
        error: std::io::Error,
    },
    #[error("Could not unpack {archive} into {dest}: {error}")]
    Unpack {
        archive: PathBuf,
        dest: PathBuf,
        error: std::io::Error,
    },
    #[error("Destination {0} already has content")]
    DestinationNotEmpty(PathBuf),
    #[error("Archive {archive} must contain exactly one top level directory, found {found}")]
    UnexpectedLayout { archive: PathBuf, found: String },
    #[error("IO error: {0}")]
    IO(#[from] std::io::Error),
}

/// Unpacks a `.tar.gz` snapshot into `dest`, dropping the single wrapper
/// directory the archive is packaged with.
pub fn install_from_archive(archive: &Path, dest: &Path) -> Result<(), ExtractionError> {
    if dest.exists() && std::fs::read_dir(dest)?.next().is_some() {
        return Err(ExtractionError::DestinationNotEmpty(dest.to_path_buf()));
    }

    debug!("Extracting {} to {}", archive.display(), dest.display());
    let file = File::open(archive).map_err(|error| ExtractionError::Open {
        path: archive.to_path_buf(),
        error,
    })?;
    let mut tar = tar::Archive::new(GzDecoder::new(BufReader::new(file)));
    tar.set_preserve_permissions(true);
    tar.set_preserve_mtime(true);

    let unpack_error = |error: std::io::Error| ExtractionError::Unpack {
        archive: archive.to_path_buf(),
        dest: dest.to_path_buf(),
        error,
    };
    std::fs::create_dir_all(dest).map_err(unpack_error)?;
    tar.unpack(dest).map_err(unpack_error)?;

    flatten(archive, dest)
}

fn flatten(archive: &Path, dest: &Path) -> Result<(), ExtractionError> {
    let top_level = std::fs::read_dir(dest)?.collect::<Result<Vec<_>, _>>()?;
    let wrapper = match top_level.as_slice() {
        [entry] if entry.path().is_dir() => entry.path(),
        entries => {
            let found = entries
                .iter()
                .map(|entry| entry.file_name().to_string_lossy().into_owned())
                .collect::<Vec<_>>()
                .join(", ");
            return Err(ExtractionError::UnexpectedLayout {
                archive: archive.to_path_buf(),
                found: if found.is_empty() {
                    "nothing".to_string()
                } else {
                    found
                },
            });
        }
    };

    let children = std::fs::read_dir(&wrapper)?
        .map(|entry| entry.map(|entry| entry.file_name()))
        .collect::<Result<Vec<_>, _>>()?;

    // The wrapper may hold an entry sharing its own name.
    let staging = dest.join(staging_name(&children));
    trace!("Staging {} at {}", wrapper.display(), staging.display());
    std::fs::rename(&wrapper, &staging)?;

    for child in &children {
        std::fs::rename(staging.join(child), dest.join(child))?;
    }
    std::fs::remove_dir(&staging)?;

    Ok(())
}

fn staging_name(taken: &[OsString]) -> OsString {
    let mut attempt = 0usize;
    loop {
        let candidate = OsString::from(format!(".tc-checkout-unpack-{attempt}"));
        if !taken.contains(&candidate) {
            return candidate;
        }
        attempt += 1;
    }
}
