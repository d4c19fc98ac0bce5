//! MapQuest radius search client
//!
//! Finds points of interest around a site's postal code. Responses go through
//! the response cache keyed by the full query, so asking twice about the same
//! site never hits the API twice.

use serde::Deserialize;
use serde_json::Value;
use thiserror::Error;
use tracing::debug;
use url::Url;

use super::{site_root, NationalSite, NearbyPlace};
use crate::cache::{CachedFetcher, FetchError};

/// Base URL for the MapQuest API
pub const MAPQUEST_BASE_URL: &str = "http://www.mapquestapi.com";

/// Radius search endpoint, relative to the base URL
const RADIUS_SEARCH_PATH: &str = "search/v2/radius";

/// Default search radius in miles
pub const DEFAULT_RADIUS: u32 = 10;

/// Default cap on the number of results
pub const DEFAULT_MAX_MATCHES: u32 = 10;

/// Errors that can occur when looking up nearby places
#[derive(Debug, Error)]
pub enum NearbyError {
    /// The site has no postal code to search around
    #[error("{0} has no postal code to search around")]
    MissingPostalCode(String),

    /// No API key was configured and the query is not cached
    #[error("No MapQuest API key configured (set MAPQUEST_API_KEY or pass --api-key)")]
    MissingApiKey,

    /// Base URL could not be extended to the search endpoint
    #[error("Invalid search endpoint: {0}")]
    InvalidEndpoint(#[from] url::ParseError),

    /// Request or response handling failed
    #[error(transparent)]
    Fetch(#[from] FetchError),

    /// Response did not have the expected shape
    #[error("Failed to parse search results: {0}")]
    ParseError(#[from] serde_json::Error),
}

/// Top-level radius search response
#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(rename = "searchResults", default)]
    search_results: Vec<SearchResult>,
}

/// A single search hit
#[derive(Debug, Deserialize)]
struct SearchResult {
    #[serde(default)]
    name: String,
    #[serde(default)]
    fields: SearchFields,
}

/// Descriptive fields of a search hit
#[derive(Debug, Default, Deserialize)]
struct SearchFields {
    group_sic_code_name_ext: Option<String>,
    address: Option<String>,
    city: Option<String>,
}

/// Client for the MapQuest radius search API
#[derive(Debug, Clone)]
pub struct MapQuestClient {
    /// API key, if configured
    api_key: Option<String>,
    /// Base URL for the API (allows override for testing)
    base_url: Url,
    /// Search radius in miles
    radius: u32,
    /// Maximum number of results
    max_matches: u32,
}

impl MapQuestClient {
    /// Creates a client for the public MapQuest API
    pub fn new(api_key: Option<String>) -> Self {
        Self {
            api_key,
            base_url: Url::parse(MAPQUEST_BASE_URL).expect("valid base URL"),
            radius: DEFAULT_RADIUS,
            max_matches: DEFAULT_MAX_MATCHES,
        }
    }

    /// Overrides the API base URL; the endpoint path is appended under it
    pub fn with_base_url(mut self, base_url: Url) -> Self {
        self.base_url = site_root(base_url);
        self
    }

    /// Overrides the search radius (miles)
    pub fn with_radius(mut self, radius: u32) -> Self {
        self.radius = radius;
        self
    }

    /// Overrides the maximum number of results
    pub fn with_max_matches(mut self, max_matches: u32) -> Self {
        self.max_matches = max_matches;
        self
    }

    /// Finds places near `site`
    ///
    /// # Returns
    /// * `Ok(Vec<NearbyPlace>)` - Places in the order the API ranked them
    /// * `Err(NearbyError)` - If the site has no postal code, no key is
    ///   configured for an uncached query, or the request fails
    pub async fn get_nearby_places(
        &self,
        fetcher: &mut CachedFetcher,
        site: &NationalSite,
    ) -> Result<Vec<NearbyPlace>, NearbyError> {
        let origin = site
            .zipcode
            .as_deref()
            .ok_or_else(|| NearbyError::MissingPostalCode(site.name.clone()))?;

        let endpoint = self.base_url.join(RADIUS_SEARCH_PATH)?;

        let mut query = vec![
            ("origin", origin.to_string()),
            ("radius", self.radius.to_string()),
            ("units", "m".to_string()),
            ("maxMatches", self.max_matches.to_string()),
            ("ambiguities", "ignore".to_string()),
            ("outFormat", "json".to_string()),
        ];

        if !fetcher.has_json(&endpoint, &query) {
            let key = self.api_key.as_ref().ok_or(NearbyError::MissingApiKey)?;
            query.insert(0, ("key", key.clone()));
        }

        let data = fetcher.get_json(&endpoint, &query).await?;
        let places = parse_places(data)?;
        debug!(site = %site.name, places = places.len(), "found nearby places");
        Ok(places)
    }
}

/// Decodes a radius search payload into places
///
/// A payload without `searchResults` has no places. Empty strings count as
/// absent fields.
pub fn parse_places(data: Value) -> Result<Vec<NearbyPlace>, serde_json::Error> {
    let response: SearchResponse = serde_json::from_value(data)?;
    Ok(response
        .search_results
        .into_iter()
        .map(|result| NearbyPlace {
            name: result.name,
            category: non_empty(result.fields.group_sic_code_name_ext),
            address: non_empty(result.fields.address),
            city: non_empty(result.fields.city),
        })
        .collect())
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|s| !s.trim().is_empty())
}
