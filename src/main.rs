use clap::Parser;
use log::warn;

use tc_checkout::{
    cli::args::{CliArgs, Command},
    TcCheckout,
};

fn run() -> anyhow::Result<()> {
    let cli_args: CliArgs = CliArgs::parse();

    let mut builder = TcCheckout::builder();
    if let Some(cache_directory) = &cli_args.cache_directory {
        builder = builder.cache_directory(cache_directory);
    }
    if let Some(index_url) = &cli_args.index_url {
        builder = builder.index_url(index_url);
    }
    if let Some(queue_url) = &cli_args.queue_url {
        builder = builder.queue_url(queue_url);
    }
    if let Some(namespace) = &cli_args.namespace {
        builder = builder.namespace(namespace);
    }
    let tc_checkout = builder.try_build()?;

    match cli_args.cmd {
        Command::Checkout {
            directory,
            base_url,
            head_url,
            head_rev,
            head_ref,
        } => {
            if let Some(head_ref) = head_ref {
                warn!("headRef {} is not supported and is ignored", head_ref);
            }
            tc_checkout.checkout(
                directory,
                &base_url,
                head_url.as_deref(),
                head_rev.as_deref(),
            )?;
        }
        Command::Clone { url, directory } => {
            tc_checkout.clone(&url, directory)?;
        }
        Command::Revision { directory } => match tc_checkout.revision(&directory)? {
            Some(revision) => println!("{revision}"),
            None => anyhow::bail!("{} is not a working copy", directory),
        },
        Command::ClearCache => tc_checkout.clear_cache()?,
    }

    Ok(())
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    if let Err(e) = run() {
        log::error!("{}", e);
        std::process::exit(1);
    }
}
