//! Fetch-with-cache HTTP access
//!
//! `CachedFetcher` answers requests from the [`CacheStore`] when it can and only
//! goes to the network on a miss, persisting every new response before
//! returning it.

use reqwest::Client;
use serde_json::Value;
use thiserror::Error;
use tracing::{debug, warn};
use url::Url;

use super::CacheStore;

/// Query parameter that carries API credentials; never part of a cache key
const CREDENTIAL_PARAM: &str = "key";

/// Prefix of JSON entries, keeping them apart from page bodies keyed by bare URL
const JSON_KEY_PREFIX: &str = "json:";

/// Errors that can occur when fetching a resource over HTTP
#[derive(Debug, Error)]
pub enum FetchError {
    /// HTTP request failed before a response was received
    #[error("HTTP request failed: {0}")]
    RequestFailed(#[from] reqwest::Error),

    /// Server answered with a non-success status
    #[error("{url} returned HTTP {status}")]
    Status { url: String, status: u16 },

    /// Response body was not valid JSON
    #[error("Failed to parse JSON from {url}: {source}")]
    InvalidJson {
        url: String,
        #[source]
        source: serde_json::Error,
    },
}

/// HTTP client that serves repeated requests from a persistent cache
#[derive(Debug)]
pub struct CachedFetcher {
    /// HTTP client for making requests
    http_client: Client,
    /// Cached responses keyed by URL
    store: CacheStore,
}

impl CachedFetcher {
    /// Creates a fetcher backed by `store`
    pub fn new(store: CacheStore) -> Self {
        Self::with_client(Client::new(), store)
    }

    /// Creates a fetcher with a custom HTTP client
    pub fn with_client(http_client: Client, store: CacheStore) -> Self {
        Self { http_client, store }
    }

    /// The underlying cache store
    pub fn store(&self) -> &CacheStore {
        &self.store
    }

    /// Returns the body of `url` as text, keyed by the exact URL
    ///
    /// # Returns
    /// * `Ok(String)` - The cached body, or the freshly fetched one on a miss
    /// * `Err(FetchError)` - If the request fails; nothing is cached then
    pub async fn get_text(&mut self, url: &Url) -> Result<String, FetchError> {
        let key = url.as_str();

        if let Some(Value::String(body)) = self.store.get(key) {
            debug!(url = key, "using cache");
            return Ok(body.clone());
        }

        debug!(url = key, "fetching");
        let response = self.http_client.get(url.clone()).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status {
                url: key.to_string(),
                status: status.as_u16(),
            });
        }
        let body = response.text().await?;

        self.remember(key.to_string(), Value::String(body.clone()));
        Ok(body)
    }

    /// Returns the JSON document at `endpoint` with `query` appended
    ///
    /// The cache key is the full request URL minus the credential parameter,
    /// so distinct queries never share an entry and secrets never reach disk.
    /// Any cached value is a hit, including a bare JSON string.
    pub async fn get_json(
        &mut self,
        endpoint: &Url,
        query: &[(&str, String)],
    ) -> Result<Value, FetchError> {
        let key = cache_key(endpoint, query);

        if let Some(cached) = self.store.get(&key) {
            debug!(url = %key, "using cache");
            return Ok(cached.clone());
        }

        let mut request_url = endpoint.clone();
        request_url
            .query_pairs_mut()
            .extend_pairs(query.iter().map(|(k, v)| (*k, v.as_str())));

        debug!(url = %key, "fetching");
        let response = self.http_client.get(request_url).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status {
                url: key,
                status: status.as_u16(),
            });
        }
        let text = response.text().await?;
        let value: Value = serde_json::from_str(&text).map_err(|source| FetchError::InvalidJson {
            url: key.clone(),
            source,
        })?;

        self.remember(key, value.clone());
        Ok(value)
    }

    /// Whether [`CachedFetcher::get_json`] would be answered from the cache
    pub fn has_json(&self, endpoint: &Url, query: &[(&str, String)]) -> bool {
        self.store.get(&cache_key(endpoint, query)).is_some()
    }

    /// Inserts a fresh response and rewrites the cache file
    fn remember(&mut self, key: String, value: Value) {
        self.store.insert(key, value);
        if let Err(e) = self.store.save() {
            warn!(path = %self.store.path().display(), error = %e, "failed to persist cache");
        }
    }
}

/// Builds the cache key for a query: the prefixed request URL without credentials
fn cache_key(endpoint: &Url, query: &[(&str, String)]) -> String {
    let mut url = endpoint.clone();
    let public: Vec<_> = query
        .iter()
        .filter(|(k, _)| *k != CREDENTIAL_PARAM)
        .collect();
    if !public.is_empty() {
        url.query_pairs_mut()
            .extend_pairs(public.iter().map(|(k, v)| (*k, v.as_str())));
    }
    format!("{JSON_KEY_PREFIX}{url}")
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tempfile::TempDir;
    use wiremock::{
        matchers::{method, path, query_param},
        Mock, MockServer, ResponseTemplate,
    };

    fn create_test_fetcher() -> (CachedFetcher, TempDir) {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let store = CacheStore::load(temp_dir.path().join("cache.json"));
        (CachedFetcher::new(store), temp_dir)
    }

    #[test]
    fn test_cache_key_drops_credential() {
        let endpoint = Url::parse("http://api.example.com/search/v2/radius").unwrap();
        let query = [
            ("key", "secret".to_string()),
            ("origin", "49931".to_string()),
            ("radius", "10".to_string()),
        ];

        let key = cache_key(&endpoint, &query);

        assert_eq!(
            key,
            "json:http://api.example.com/search/v2/radius?origin=49931&radius=10"
        );
        assert!(!key.contains("secret"));
    }

    #[test]
    fn test_cache_key_distinguishes_queries_sharing_a_substring() {
        let endpoint = Url::parse("http://api.example.com/search").unwrap();
        let short = cache_key(&endpoint, &[("origin", "4993".to_string())]);
        let long = cache_key(&endpoint, &[("origin", "49931".to_string())]);

        assert_ne!(short, long);
    }

    #[tokio::test]
    async fn test_get_text_fetches_once_then_uses_cache() {
        let mock_server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/state/mi/index.htm"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<html>MI</html>"))
            .expect(1)
            .mount(&mock_server)
            .await;

        let (mut fetcher, _temp_dir) = create_test_fetcher();
        let url = Url::parse(&format!("{}/state/mi/index.htm", mock_server.uri())).unwrap();

        let first = fetcher.get_text(&url).await.expect("First fetch should succeed");
        let second = fetcher.get_text(&url).await.expect("Second fetch should succeed");

        assert_eq!(first, "<html>MI</html>");
        assert_eq!(second, first);
    }

    #[tokio::test]
    async fn test_get_text_persists_after_miss() {
        let mock_server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_string("body"))
            .expect(1)
            .mount(&mock_server)
            .await;

        let (mut fetcher, temp_dir) = create_test_fetcher();
        let url = Url::parse(&format!("{}/page", mock_server.uri())).unwrap();
        fetcher.get_text(&url).await.expect("Fetch should succeed");

        // A new process reading the same file gets a hit without the network
        let reloaded = CacheStore::load(temp_dir.path().join("cache.json"));
        assert_eq!(reloaded.get(url.as_str()), Some(&json!("body")));

        let mut second = CachedFetcher::new(reloaded);
        assert_eq!(second.get_text(&url).await.unwrap(), "body");
    }

    #[tokio::test]
    async fn test_get_text_error_status_is_not_cached() {
        let mock_server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(503))
            .expect(2)
            .mount(&mock_server)
            .await;

        let (mut fetcher, _temp_dir) = create_test_fetcher();
        let url = Url::parse(&format!("{}/down", mock_server.uri())).unwrap();

        for _ in 0..2 {
            let err = fetcher.get_text(&url).await.unwrap_err();
            assert!(matches!(err, FetchError::Status { status: 503, .. }));
        }
        assert!(fetcher.store().is_empty());
    }

    #[tokio::test]
    async fn test_get_text_refetches_non_string_entry() {
        let mock_server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_string("text"))
            .expect(1)
            .mount(&mock_server)
            .await;

        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let url = Url::parse(&format!("{}/page", mock_server.uri())).unwrap();
        let mut store = CacheStore::new(temp_dir.path().join("cache.json"));
        store.insert(url.as_str(), json!({"unexpected": true}));
        let mut fetcher = CachedFetcher::new(store);

        assert_eq!(fetcher.get_text(&url).await.unwrap(), "text");
        assert_eq!(fetcher.store().get(url.as_str()), Some(&json!("text")));
    }

    #[tokio::test]
    async fn test_get_json_fetches_once_per_composite_key() {
        let mock_server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/search/v2/radius"))
            .and(query_param("origin", "49931"))
            .and(query_param("key", "secret"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"searchResults": []})))
            .expect(1)
            .mount(&mock_server)
            .await;

        let (mut fetcher, _temp_dir) = create_test_fetcher();
        let endpoint = Url::parse(&format!("{}/search/v2/radius", mock_server.uri())).unwrap();
        let query = [("key", "secret".to_string()), ("origin", "49931".to_string())];

        let first = fetcher.get_json(&endpoint, &query).await.unwrap();
        let second = fetcher.get_json(&endpoint, &query).await.unwrap();

        assert_eq!(first, json!({"searchResults": []}));
        assert_eq!(second, first);
        assert_eq!(fetcher.store().len(), 1);
    }

    #[tokio::test]
    async fn test_get_json_string_body_is_cached() {
        let mock_server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_string(r#""quota exceeded""#))
            .expect(1)
            .mount(&mock_server)
            .await;

        let (mut fetcher, _temp_dir) = create_test_fetcher();
        let endpoint = Url::parse(&format!("{}/search", mock_server.uri())).unwrap();
        let query = [("origin", "49931".to_string())];

        let first = fetcher.get_json(&endpoint, &query).await.unwrap();
        assert!(fetcher.has_json(&endpoint, &query));
        let second = fetcher.get_json(&endpoint, &query).await.unwrap();

        assert_eq!(first, json!("quota exceeded"));
        assert_eq!(second, first);
    }

    #[tokio::test]
    async fn test_json_and_text_entries_do_not_collide() {
        let mock_server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/data"))
            .respond_with(ResponseTemplate::new(200).set_body_string(r#"{"n": 1}"#))
            .expect(2)
            .mount(&mock_server)
            .await;

        let (mut fetcher, _temp_dir) = create_test_fetcher();
        let url = Url::parse(&format!("{}/data", mock_server.uri())).unwrap();

        let text = fetcher.get_text(&url).await.unwrap();
        let value = fetcher.get_json(&url, &[]).await.unwrap();

        assert_eq!(text, r#"{"n": 1}"#);
        assert_eq!(value, json!({"n": 1}));
        assert_eq!(fetcher.store().len(), 2);
    }

    #[tokio::test]
    async fn test_get_json_invalid_body() {
        let mock_server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_string("not json"))
            .mount(&mock_server)
            .await;

        let (mut fetcher, _temp_dir) = create_test_fetcher();
        let endpoint = Url::parse(&format!("{}/search", mock_server.uri())).unwrap();

        let err = fetcher.get_json(&endpoint, &[]).await.unwrap_err();

        assert!(matches!(err, FetchError::InvalidJson { .. }));
        assert!(fetcher.store().is_empty());
    }
}
