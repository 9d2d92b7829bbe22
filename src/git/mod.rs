mod client;
mod repository;

pub use client::GitClient;
