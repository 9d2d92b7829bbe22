use clap::{Parser, Subcommand};

/// Checkout cached repositories served by TaskCluster.
#[derive(Debug, Parser)]
#[clap(version)]
pub struct CliArgs {
    #[clap(subcommand)]
    pub cmd: Command,
    /// Location of the archive cache. Defaults to $HOME/.tc-vcs
    #[clap(short, long)]
    pub cache_directory: Option<String>,
    /// Base url of the index service
    #[clap(long)]
    pub index_url: Option<String>,
    /// Base url of the queue service
    #[clap(long)]
    pub queue_url: Option<String>,
    /// Namespace prefix of indexed archives
    #[clap(long)]
    pub namespace: Option<String>,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    ///Checkout a repository, seeding it from the cache when possible
    Checkout {
        /// Target directory which to clone and update
        directory: String,
        /// Base repository to clone
        base_url: String,
        /// Head url to fetch changes from. If this value is not given baseUrl is used.
        head_url: Option<String>,
        /// Revision/changeset to pull from the repository. If not given this defaults to
        /// the tip of the default branch.
        head_rev: Option<String>,
        /// Reference on head to fetch. Accepted for compatibility and ignored.
        head_ref: Option<String>,
    },
    ///Clone a repository through the cache without updating it
    Clone {
        url: String,
        directory: String,
    },
    ///Print the revision a working copy is at
    Revision {
        directory: String,
    },
    ///Delete every cached archive
    ClearCache,
}

#[cfg(test)]
mod tests {
    use super::*;

    use clap::CommandFactory;
    use pretty_assertions::assert_eq;

    #[test]
    fn verify_cli() {
        CliArgs::command().debug_assert();
    }

    #[test]
    fn checkout_positionals() {
        let args = CliArgs::parse_from([
            "tc-checkout",
            "checkout",
            "dest",
            "https://hg.mozilla.org/build/tools",
            "https://hg.mozilla.org/try",
            "123df26ca0f5",
        ]);
        match args.cmd {
            Command::Checkout {
                directory,
                base_url,
                head_url,
                head_rev,
                head_ref,
            } => {
                assert_eq!(directory, "dest");
                assert_eq!(base_url, "https://hg.mozilla.org/build/tools");
                assert_eq!(head_url.as_deref(), Some("https://hg.mozilla.org/try"));
                assert_eq!(head_rev.as_deref(), Some("123df26ca0f5"));
                assert_eq!(head_ref, None);
            }
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[test]
    fn global_options() {
        let args = CliArgs::parse_from([
            "tc-checkout",
            "--cache-directory",
            "/tmp/cache",
            "clear-cache",
        ]);
        assert_eq!(args.cache_directory.as_deref(), Some("/tmp/cache"));
        assert!(matches!(args.cmd, Command::ClearCache));
    }
}
