//! npsearch - Browse National Park Service sites by state
//!
//! An interactive command-line tool that lists the protected sites in a U.S.
//! state and finds places near a chosen site. Every HTTP response is cached in
//! a local JSON file.

use std::io;

use clap::Parser;
use tracing::info;
use tracing_subscriber::EnvFilter;

use npsearch::app::App;
use npsearch::cache::{CacheStore, CachedFetcher};
use npsearch::cli::{Cli, Config};
use npsearch::data::{MapQuestClient, NpsClient};

/// Sets up logging on stderr so it never mixes with the session on stdout
///
/// `--verbose` enables debug output for this crate, otherwise `RUST_LOG`
/// applies with a default of `warn`.
fn init_tracing(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("npsearch=debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let config = Config::from_cli(&cli)?;

    init_tracing(config.verbose);

    let store = CacheStore::load(&config.cache_file);
    info!(path = %store.path().display(), entries = store.len(), "cache ready");

    let mapquest_client = MapQuestClient::new(config.api_key)
        .with_base_url(config.mapquest_url)
        .with_radius(config.radius)
        .with_max_matches(config.max_matches);

    let mut app = App::new(
        CachedFetcher::new(store),
        NpsClient::with_base_url(config.nps_url),
        mapquest_client,
    );
    app.load_states().await?;

    let stdin = tokio::io::BufReader::new(tokio::io::stdin());
    app.run(stdin, &mut io::stdout()).await?;

    Ok(())
}
