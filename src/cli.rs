//! Command-line interface parsing for npsearch
//!
//! Every option has a default, so running `npsearch` with no arguments starts
//! the interactive session against the public sites with `nps_cache.json` in
//! the working directory.

use clap::Parser;
use std::path::PathBuf;
use thiserror::Error;
use url::Url;

use crate::cache::DEFAULT_CACHE_FILE;
use crate::data::mapquest::{DEFAULT_MAX_MATCHES, DEFAULT_RADIUS, MAPQUEST_BASE_URL};
use crate::data::nps::NPS_BASE_URL;

/// Error types for CLI argument validation
#[derive(Debug, Error)]
pub enum CliError {
    /// A base URL option could not be parsed
    #[error("Invalid URL for {option}: '{value}' ({source})")]
    InvalidUrl {
        option: &'static str,
        value: String,
        #[source]
        source: url::ParseError,
    },

    /// The result cap must allow at least one result
    #[error("Invalid --max-matches: must be at least 1")]
    InvalidMaxMatches,
}

/// npsearch - Browse National Park Service sites by state and find places nearby
#[derive(Parser, Debug)]
#[command(name = "npsearch")]
#[command(about = "Browse National Park Service sites by state and find places nearby")]
#[command(version)]
pub struct Cli {
    /// JSON file that caches every HTTP response
    #[arg(long, value_name = "PATH", env = "NPSEARCH_CACHE_FILE", default_value = DEFAULT_CACHE_FILE)]
    pub cache_file: PathBuf,

    /// MapQuest API key used for nearby place searches
    #[arg(long, value_name = "KEY", env = "MAPQUEST_API_KEY", hide_env_values = true)]
    pub api_key: Option<String>,

    /// Root of the National Park Service website
    #[arg(long, value_name = "URL", default_value = NPS_BASE_URL)]
    pub nps_url: String,

    /// Root of the MapQuest API
    #[arg(long, value_name = "URL", default_value = MAPQUEST_BASE_URL)]
    pub mapquest_url: String,

    /// Search radius around a site, in miles
    #[arg(long, value_name = "MILES", default_value_t = DEFAULT_RADIUS)]
    pub radius: u32,

    /// Maximum number of nearby places to show
    #[arg(long, value_name = "N", default_value_t = DEFAULT_MAX_MATCHES)]
    pub max_matches: u32,

    /// Enable debug logging (cache hits and fetches)
    #[arg(short, long)]
    pub verbose: bool,
}

/// Validated configuration derived from CLI arguments
#[derive(Debug, Clone)]
pub struct Config {
    pub cache_file: PathBuf,
    pub api_key: Option<String>,
    pub nps_url: Url,
    pub mapquest_url: Url,
    pub radius: u32,
    pub max_matches: u32,
    pub verbose: bool,
}

impl Config {
    /// Creates a Config from parsed CLI arguments.
    ///
    /// # Returns
    /// * `Ok(Config)` with parsed URLs
    /// * `Err(CliError)` if a URL is malformed or `--max-matches` is zero
    pub fn from_cli(cli: &Cli) -> Result<Self, CliError> {
        if cli.max_matches == 0 {
            return Err(CliError::InvalidMaxMatches);
        }

        Ok(Config {
            cache_file: cli.cache_file.clone(),
            api_key: cli.api_key.clone().filter(|key| !key.trim().is_empty()),
            nps_url: parse_url("--nps-url", &cli.nps_url)?,
            mapquest_url: parse_url("--mapquest-url", &cli.mapquest_url)?,
            radius: cli.radius,
            max_matches: cli.max_matches,
            verbose: cli.verbose,
        })
    }
}

fn parse_url(option: &'static str, value: &str) -> Result<Url, CliError> {
    Url::parse(value).map_err(|source| CliError::InvalidUrl {
        option,
        value: value.to_string(),
        source,
    })
}
