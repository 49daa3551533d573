use async_trait::async_trait;
use karaoke_core::{
    ApiLog, CoreError, FetchedLyrics, LogStatus, LyricsPayload, LyricsProvider, LyricsQuery,
    Provenance,
};
use reqwest_middleware::{ClientBuilder, ClientWithMiddleware};
use reqwest_retry::{policies::ExponentialBackoff, RetryTransientMiddleware};
use serde::Deserialize;
use serde_json::{json, Value};
use std::time::Duration;
use tracing::{debug, info, warn};

const LRCLIB_API_URL: &str = "https://lrclib.net/api";

/// Default timeout for HTTP requests (10 seconds)
const DEFAULT_TIMEOUT_SECS: u64 = 10;
/// Default number of retry attempts
const DEFAULT_MAX_RETRIES: u32 = 3;

const ENDPOINT_GET: &str = "lrclib_get";
const ENDPOINT_SEARCH: &str = "lrclib_search";

/// Calculate a score for duration matching (lower is better).
/// Returns 0 for exact matches, higher values for larger differences.
/// Capped at `i32::MAX` to prevent overflow.
fn duration_score(actual: Option<f64>, expected: Option<u32>, scale: f64) -> i32 {
    match (actual, expected) {
        (Some(d), Some(q)) => {
            let diff = (d - f64::from(q)).abs() * scale;
            // Clamp to i32::MAX and safely convert
            #[allow(clippy::cast_possible_truncation)]
            if diff > f64::from(i32::MAX) {
                i32::MAX
            } else {
                diff as i32
            }
        }
        _ => 50, // Default score when duration is unknown
    }
}

/// LRCLIB.net synchronized lyrics provider
pub struct LrclibProvider {
    client: ClientWithMiddleware,
    api_log: ApiLog,
}

impl LrclibProvider {
    /// Create a new LRCLIB provider with default 10-second timeout and 3 retries.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be created.
    pub fn new(api_log: ApiLog) -> Result<Self, CoreError> {
        // Base client with timeout
        let base_client = reqwest::Client::builder()
            .timeout(Duration::from_secs(DEFAULT_TIMEOUT_SECS))
            .connect_timeout(Duration::from_secs(5))
            .user_agent(concat!("karaoke/", env!("CARGO_PKG_VERSION")))
            .build()?;

        // Wrap with retry middleware (exponential backoff)
        let retry_policy =
            ExponentialBackoff::builder().build_with_max_retries(DEFAULT_MAX_RETRIES);
        let client = ClientBuilder::new(base_client)
            .with(RetryTransientMiddleware::new_with_policy(retry_policy))
            .build();

        Ok(Self { client, api_log })
    }
}

/// Response from LRCLIB API
/// Note: API returns additional fields (trackName, albumName) that we don't use;
/// serde ignores unknown fields by default.
#[derive(Debug, Deserialize)]
struct LrclibResponse {
    id: i64,
    #[serde(rename = "artistName")]
    artist_name: String,
    duration: Option<f64>,
    #[serde(default)]
    instrumental: bool,
    #[serde(rename = "plainLyrics")]
    plain_lyrics: Option<String>,
    #[serde(rename = "syncedLyrics")]
    synced_lyrics: Option<String>,
}

#[async_trait]
impl LyricsProvider for LrclibProvider {
    fn name(&self) -> &'static str {
        "lrclib"
    }

    fn provenance(&self) -> Provenance {
        Provenance::SyncedLookup
    }

    async fn fetch(&self, query: &LyricsQuery) -> Result<FetchedLyrics, CoreError> {
        info!(
            "Fetching lyrics from LRCLIB for: {} - {} (duration: {:?}s)",
            query.artist_name, query.track_name, query.duration_secs
        );

        // Try the /get endpoint first for exact match with artist + track + album + duration
        let mut url = format!(
            "{}/get?artist_name={}&track_name={}",
            LRCLIB_API_URL,
            urlencoding::encode(&query.artist_name),
            urlencoding::encode(&query.track_name)
        );

        if let Some(ref album) = query.album_name {
            use std::fmt::Write;
            let _ = write!(url, "&album_name={}", urlencoding::encode(album));
        }

        if let Some(duration) = query.duration_secs {
            use std::fmt::Write;
            let _ = write!(url, "&duration={duration}");
        }

        let request = json!({
            "track": query.track_name,
            "artist": query.artist_name,
            "album": query.album_name,
            "duration": query.duration_secs,
        });

        info!("LRCLIB GET (exact match): {}", url);

        let Some(body) = self.get_json(ENDPOINT_GET, &url, &request).await? else {
            info!("LRCLIB exact match not found, trying search by track name only");
            // Try searching with just track name and match duration manually
            return self.search_by_track_name(query).await;
        };

        let result: LrclibResponse = serde_json::from_value(body)?;
        info!("LRCLIB found match with id: {}", result.id);
        Ok(Self::parse_response(result))
    }
}

/// Duration tolerance for matching (±2 seconds)
const DURATION_TOLERANCE_SECS: f64 = 2.0;

impl LrclibProvider {
    /// GET a JSON document, recording the attempt in the API log.
    ///
    /// Returns `Ok(None)` for 404, which LRCLIB uses for "no match".
    async fn get_json(
        &self,
        endpoint: &str,
        url: &str,
        request: &Value,
    ) -> Result<Option<Value>, CoreError> {
        let response = match self.client.get(url).send().await {
            Ok(response) => response,
            Err(e) => {
                self.api_log.record(
                    endpoint,
                    request,
                    &json!({ "error": e.to_string() }),
                    LogStatus::ConnectionError,
                );
                return Err(e.into());
            }
        };

        let status = response.status();
        info!("LRCLIB response status: {}", status);

        if status == reqwest::StatusCode::NOT_FOUND {
            self.api_log.record(
                endpoint,
                request,
                &json!({ "found": false, "http_status": status.as_u16() }),
                LogStatus::NoResults,
            );
            return Ok(None);
        }

        if !status.is_success() {
            warn!("LRCLIB returned status: {}", status);
            self.api_log.record(
                endpoint,
                request,
                &json!({ "http_status": status.as_u16() }),
                LogStatus::Error,
            );
            return Err(CoreError::LyricsProviderFailed {
                provider: self.name().to_string(),
                reason: format!("LRCLIB returned status: {status}"),
            });
        }

        let body: Value = match response.json().await {
            Ok(body) => body,
            Err(e) => {
                self.api_log.record(
                    endpoint,
                    request,
                    &json!({ "error": e.to_string() }),
                    LogStatus::UnexpectedError,
                );
                return Err(e.into());
            }
        };

        let found = match &body {
            Value::Array(results) => !results.is_empty(),
            Value::Null => false,
            _ => true,
        };
        let log_status = if found {
            LogStatus::Success
        } else {
            LogStatus::NoResults
        };
        self.api_log.record(endpoint, request, &body, log_status);

        Ok(Some(body))
    }

    /// Search by track name only and match duration within ±2 seconds
    async fn search_by_track_name(&self, query: &LyricsQuery) -> Result<FetchedLyrics, CoreError> {
        // Search with just track name
        let url = format!(
            "{}/search?track_name={}",
            LRCLIB_API_URL,
            urlencoding::encode(&query.track_name)
        );
        let request = json!({ "track": query.track_name, "duration": query.duration_secs });

        info!("LRCLIB GET (search by track): {}", url);

        let results: Vec<LrclibResponse> =
            match self.get_json(ENDPOINT_SEARCH, &url, &request).await {
                Ok(Some(body)) => serde_json::from_value(body)?,
                Ok(None) | Err(CoreError::LyricsProviderFailed { .. }) => {
                    // Fall back to full search with artist + track
                    return self.search_fallback(query).await;
                }
                Err(e) => return Err(e),
            };

        if results.is_empty() {
            info!("LRCLIB search by track name returned no results, trying full search");
            return self.search_fallback(query).await;
        }

        // Filter by duration (±2 seconds) if we have a query duration
        let filtered: Vec<_> = if let Some(query_duration) = query.duration_secs {
            let query_duration = f64::from(query_duration);
            results
                .into_iter()
                .filter(|r| {
                    r.duration
                        .is_some_and(|d| (d - query_duration).abs() <= DURATION_TOLERANCE_SECS)
                })
                .collect()
        } else {
            results
        };

        if filtered.is_empty() {
            info!("LRCLIB search by track name: no results within duration tolerance, trying full search");
            return self.search_fallback(query).await;
        }

        if let Some(result) = Self::best_match(filtered, query.duration_secs, 10.0) {
            info!(
                "LRCLIB found match by track name + duration (id: {}, artist: {}, duration: {:?})",
                result.id, result.artist_name, result.duration
            );
            Ok(Self::parse_response(result))
        } else {
            info!("LRCLIB search by track name: no usable lyrics, trying full search");
            self.search_fallback(query).await
        }
    }

    async fn search_fallback(&self, query: &LyricsQuery) -> Result<FetchedLyrics, CoreError> {
        info!("Trying LRCLIB search endpoint with artist + track as final fallback");

        let search_query = format!("{} {}", query.artist_name, query.track_name);
        let url = format!(
            "{}/search?q={}",
            LRCLIB_API_URL,
            urlencoding::encode(&search_query)
        );
        let request = json!({ "q": search_query });

        info!("LRCLIB GET (full search): {}", url);

        let results: Vec<LrclibResponse> =
            match self.get_json(ENDPOINT_SEARCH, &url, &request).await? {
                Some(body) => serde_json::from_value(body)?,
                None => Vec::new(),
            };

        match Self::best_match(results, query.duration_secs, 1.0) {
            Some(result) => {
                info!(
                    "LRCLIB found match via full search (id: {}, artist: {})",
                    result.id, result.artist_name
                );
                Ok(Self::parse_response(result))
            }
            None => Err(CoreError::LyricsNotFound {
                track: query.track_name.clone(),
                artist: query.artist_name.clone(),
            }),
        }
    }

    /// Prefer synced lyrics, then the closest duration
    fn best_match(
        results: Vec<LrclibResponse>,
        duration_secs: Option<u32>,
        scale: f64,
    ) -> Option<LrclibResponse> {
        results
            .into_iter()
            .filter(|r| r.synced_lyrics.is_some() || r.plain_lyrics.is_some())
            .min_by_key(|r| {
                let sync_score = if r.synced_lyrics.is_some() { 0 } else { 100 };
                sync_score + duration_score(r.duration, duration_secs, scale)
            })
    }

    fn parse_response(result: LrclibResponse) -> FetchedLyrics {
        let provider_id = result.id.to_string();

        if result.instrumental {
            debug!("Track is instrumental (lrclib id: {})", result.id);
            return FetchedLyrics::not_found(provider_id);
        }

        // Prefer synced lyrics
        if let Some(synced) = result.synced_lyrics {
            if !synced.trim().is_empty() {
                debug!("Got synced lyrics (lrclib id: {})", result.id);
                return FetchedLyrics {
                    payload: LyricsPayload::Synced(synced),
                    provider_id,
                };
            }
        }

        // Fall back to plain lyrics
        if let Some(plain) = result.plain_lyrics {
            if !plain.trim().is_empty() {
                debug!("Got plain lyrics (lrclib id: {})", result.id);
                return FetchedLyrics {
                    payload: LyricsPayload::Unsynced(plain),
                    provider_id,
                };
            }
        }

        FetchedLyrics::not_found(provider_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn response(json: &str) -> LrclibResponse {
        serde_json::from_str(json).unwrap()
    }

    #[test]
    fn test_duration_score() {
        assert_eq!(duration_score(Some(200.0), Some(200), 10.0), 0);
        assert_eq!(duration_score(Some(201.5), Some(200), 10.0), 15);
        assert_eq!(duration_score(None, Some(200), 10.0), 50);
        assert_eq!(duration_score(Some(1e12), Some(0), 10.0), i32::MAX);
    }

    #[test]
    fn test_parse_response_prefers_synced() {
        let fetched = LrclibProvider::parse_response(response(
            r#"{"id": 7, "artistName": "Queen", "duration": 354.0, "instrumental": false,
                "plainLyrics": "Is this the real life?",
                "syncedLyrics": "[00:01.00]Is this the real life?"}"#,
        ));
        assert_eq!(fetched.provider_id, "7");
        assert_eq!(
            fetched.payload,
            LyricsPayload::Synced("[00:01.00]Is this the real life?".into())
        );
    }

    #[test]
    fn test_parse_response_plain_only() {
        let fetched = LrclibProvider::parse_response(response(
            r#"{"id": 8, "artistName": "A", "duration": null, "instrumental": false,
                "plainLyrics": "words", "syncedLyrics": "  "}"#,
        ));
        assert_eq!(fetched.payload, LyricsPayload::Unsynced("words".into()));
    }

    #[test]
    fn test_parse_response_instrumental() {
        let fetched = LrclibProvider::parse_response(response(
            r#"{"id": 9, "artistName": "A", "duration": 60.0, "instrumental": true,
                "plainLyrics": null, "syncedLyrics": null}"#,
        ));
        assert_eq!(fetched.payload, LyricsPayload::NotFound);
    }

    #[test]
    fn test_best_match_prefers_synced_then_duration() {
        let results: Vec<LrclibResponse> = serde_json::from_str(
            r#"[
                {"id": 1, "artistName": "A", "duration": 200.0, "plainLyrics": "p", "syncedLyrics": null},
                {"id": 2, "artistName": "A", "duration": 230.0, "plainLyrics": "p", "syncedLyrics": "[00:01.00]s"},
                {"id": 3, "artistName": "A", "duration": 201.0, "plainLyrics": "p", "syncedLyrics": "[00:01.00]s"},
                {"id": 4, "artistName": "A", "duration": 200.0, "plainLyrics": null, "syncedLyrics": null}
            ]"#,
        )
        .unwrap();
        let best = LrclibProvider::best_match(results, Some(200), 1.0).unwrap();
        assert_eq!(best.id, 3);
    }

    #[test]
    fn test_best_match_empty() {
        assert!(LrclibProvider::best_match(Vec::new(), None, 1.0).is_none());
    }
}
