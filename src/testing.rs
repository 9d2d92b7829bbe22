//! Fixtures shared by the unit tests: throwaway git repositories and
//! wrapped `.tar.gz` snapshots of them.

use std::{fs::File, path::Path};

use flate2::{write::GzEncoder, Compression};
use git2::{Oid, Repository, RepositoryInitOptions, Signature};

pub fn write_archive(archive: &Path, files: &[(&str, &str)]) {
    let encoder = GzEncoder::new(File::create(archive).unwrap(), Compression::default());
    let mut builder = tar::Builder::new(encoder);
    for (name, content) in files {
        let mut header = tar::Header::new_gnu();
        header.set_size(content.len() as u64);
        header.set_mode(0o644);
        header.set_cksum();
        builder
            .append_data(&mut header, name, content.as_bytes())
            .unwrap();
    }
    builder.into_inner().unwrap().finish().unwrap();
}

/// Packs `source` into `archive`, nested under a single `wrapper` directory.
pub fn pack_directory(source: &Path, wrapper: &str, archive: &Path) {
    if let Some(parent) = archive.parent() {
        std::fs::create_dir_all(parent).unwrap();
    }
    let encoder = GzEncoder::new(File::create(archive).unwrap(), Compression::default());
    let mut builder = tar::Builder::new(encoder);
    builder.follow_symlinks(false);
    builder.append_dir_all(wrapper, source).unwrap();
    builder.into_inner().unwrap().finish().unwrap();
}

pub fn init_repository(path: &Path) -> Repository {
    let mut options = RepositoryInitOptions::new();
    options.initial_head("main");
    Repository::init_opts(path, &options).unwrap()
}

pub fn commit_file(repo: &Repository, name: &str, content: &str) -> Oid {
    let workdir = repo.workdir().unwrap();
    std::fs::write(workdir.join(name), content).unwrap();

    let mut index = repo.index().unwrap();
    index.add_path(Path::new(name)).unwrap();
    index.write().unwrap();
    let tree = repo.find_tree(index.write_tree().unwrap()).unwrap();

    let signature = Signature::now("tc-checkout", "tc-checkout@example.com").unwrap();
    let parent = repo.head().ok().and_then(|head| head.peel_to_commit().ok());
    let parents = parent.iter().collect::<Vec<_>>();
    repo.commit(
        Some("HEAD"),
        &signature,
        &signature,
        &format!("update {name}"),
        &tree,
        &parents,
    )
    .unwrap()
}

pub fn file_url(path: &Path) -> String {
    url::Url::from_file_path(path).unwrap().to_string()
}
