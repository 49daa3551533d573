mod response;

pub use response::LyricsMatch;

use async_trait::async_trait;
use karaoke_core::{
    ApiLog, CoreError, FetchedLyrics, LogStatus, LyricsPayload, LyricsProvider, LyricsQuery,
    Provenance,
};
use reqwest::multipart::{Form, Part};
use reqwest_middleware::{ClientBuilder, ClientWithMiddleware};
use reqwest_retry::{policies::ExponentialBackoff, RetryTransientMiddleware};
use response::{payload_from_lyrics, Envelope, RecognitionResult};
use serde_json::{json, Value};
use std::path::Path;
use std::time::Duration;
use tracing::{info, warn};

const AUDD_API_URL: &str = "https://api.audd.io/";
const AUDD_FIND_LYRICS_URL: &str = "https://api.audd.io/findLyrics/";

/// Default timeout for search requests (10 seconds)
const DEFAULT_TIMEOUT_SECS: u64 = 10;
/// Uploads and recognition take considerably longer than a lookup
const UPLOAD_TIMEOUT_SECS: u64 = 60;
/// Default number of retry attempts
const DEFAULT_MAX_RETRIES: u32 = 3;

const ENDPOINT_RECOGNIZE: &str = "recognize_audio";
const ENDPOINT_FIND_LYRICS: &str = "findLyrics";

/// AudD audio recognition provider, used as the fallback when no
/// synchronized lyrics can be looked up
pub struct AuddProvider {
    /// Retrying client for idempotent lookups
    client: ClientWithMiddleware,
    /// Multipart bodies are streamed and cannot be replayed by the retry middleware
    upload_client: reqwest::Client,
    api_token: String,
    api_log: ApiLog,
}

impl AuddProvider {
    /// Create a new AudD provider.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP clients cannot be created.
    pub fn new(api_token: impl Into<String>, api_log: ApiLog) -> Result<Self, CoreError> {
        let user_agent = concat!("karaoke/", env!("CARGO_PKG_VERSION"));

        let base_client = reqwest::Client::builder()
            .timeout(Duration::from_secs(DEFAULT_TIMEOUT_SECS))
            .connect_timeout(Duration::from_secs(5))
            .user_agent(user_agent)
            .build()?;

        let retry_policy =
            ExponentialBackoff::builder().build_with_max_retries(DEFAULT_MAX_RETRIES);
        let client = ClientBuilder::new(base_client)
            .with(RetryTransientMiddleware::new_with_policy(retry_policy))
            .build();

        let upload_client = reqwest::Client::builder()
            .timeout(Duration::from_secs(UPLOAD_TIMEOUT_SECS))
            .connect_timeout(Duration::from_secs(5))
            .user_agent(user_agent)
            .build()?;

        Ok(Self {
            client,
            upload_client,
            api_token: api_token.into(),
            api_log,
        })
    }

    /// Search lyrics by song and artist name.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the response is not JSON.
    pub async fn find_lyrics(
        &self,
        track: &str,
        artist: &str,
    ) -> Result<Vec<LyricsMatch>, CoreError> {
        let q = format!("{artist} {track}");
        let request = json!({ "q": q, "api_token": self.api_token });

        info!("AudD findLyrics: {}", q);

        let response = match self
            .client
            .get(AUDD_FIND_LYRICS_URL)
            .query(&[("q", q.as_str()), ("api_token", self.api_token.as_str())])
            .send()
            .await
            .map_err(CoreError::from)
            .and_then(|r| r.error_for_status().map_err(CoreError::from))
        {
            Ok(response) => response,
            Err(e) => {
                self.log_error(ENDPOINT_FIND_LYRICS, &request, &e, LogStatus::ConnectionError);
                return Err(e);
            }
        };

        let body: Value = match response.json().await {
            Ok(body) => body,
            Err(e) => {
                let e = CoreError::from(e);
                self.log_error(ENDPOINT_FIND_LYRICS, &request, &e, LogStatus::UnexpectedError);
                return Err(e);
            }
        };

        let envelope: Envelope<Vec<LyricsMatch>> = match serde_json::from_value(body.clone()) {
            Ok(envelope) => envelope,
            Err(e) => {
                self.api_log
                    .record(ENDPOINT_FIND_LYRICS, &request, &body, LogStatus::UnexpectedError);
                return Err(e.into());
            }
        };

        let matches = if envelope.is_success() {
            envelope.result.unwrap_or_default()
        } else {
            Vec::new()
        };
        let status = if matches.is_empty() {
            LogStatus::NoResults
        } else {
            LogStatus::Success
        };
        self.api_log.record(ENDPOINT_FIND_LYRICS, &request, &body, status);

        info!("AudD findLyrics returned {} match(es)", matches.len());
        Ok(matches)
    }

    /// Upload an audio file for recognition and return the raw JSON body
    async fn recognize(&self, path: &Path, request: &Value) -> Result<Value, CoreError> {
        let bytes = match tokio::fs::read(path).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                let e = CoreError::AudioFileNotFound {
                    path: path.to_path_buf(),
                };
                self.log_error(ENDPOINT_RECOGNIZE, request, &e, LogStatus::FileNotFound);
                return Err(e);
            }
            Err(e) => {
                let e = CoreError::from(e);
                self.log_error(ENDPOINT_RECOGNIZE, request, &e, LogStatus::ProcessingError);
                return Err(e);
            }
        };

        let file_name = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_default();
        let form = Form::new()
            .text("return", "lyrics")
            .text("api_token", self.api_token.clone())
            .part("file", Part::bytes(bytes).file_name(file_name));

        info!("Uploading {} to AudD for recognition", path.display());

        let sent = self
            .upload_client
            .post(AUDD_API_URL)
            .multipart(form)
            .send()
            .await
            .and_then(reqwest::Response::error_for_status);
        let response = match sent {
            Ok(response) => response,
            Err(e) => {
                let e = CoreError::from(e);
                self.log_error(ENDPOINT_RECOGNIZE, request, &e, LogStatus::ConnectionError);
                return Err(e);
            }
        };

        match response.json::<Value>().await {
            Ok(body) => Ok(body),
            Err(e) => {
                let e = CoreError::from(e);
                self.log_error(ENDPOINT_RECOGNIZE, request, &e, LogStatus::ProcessingError);
                Err(e)
            }
        }
    }

    fn log_error(&self, endpoint: &str, request: &Value, error: &CoreError, status: LogStatus) {
        // Request errors can echo the URL, which carries the token as a query parameter
        let mut message = error.to_string();
        if !self.api_token.is_empty() {
            message = message.replace(&self.api_token, "***");
        }
        self.api_log
            .record(endpoint, request, &json!({ "error": message }), status);
    }
}

#[async_trait]
impl LyricsProvider for AuddProvider {
    fn name(&self) -> &'static str {
        "audd"
    }

    fn provenance(&self) -> Provenance {
        Provenance::RecognitionFallback
    }

    async fn fetch(&self, query: &LyricsQuery) -> Result<FetchedLyrics, CoreError> {
        let Some(path) = query.audio_path() else {
            info!("AudD needs an audio file, skipping query without one");
            return Ok(FetchedLyrics::not_found(String::new()));
        };

        let request = json!({ "file": path.display().to_string(), "return": "lyrics" });
        let body = self.recognize(path, &request).await?;

        let envelope: Envelope<RecognitionResult> = match serde_json::from_value(body.clone()) {
            Ok(envelope) => envelope,
            Err(e) => {
                self.api_log
                    .record(ENDPOINT_RECOGNIZE, &request, &body, LogStatus::ProcessingError);
                return Err(e.into());
            }
        };

        let status = if envelope.is_success() {
            LogStatus::Success
        } else {
            LogStatus::NoResults
        };
        self.api_log.record(ENDPOINT_RECOGNIZE, &request, &body, status);

        let result = match envelope {
            Envelope {
                result: Some(result),
                ..
            } if status == LogStatus::Success => result,
            _ => {
                info!("AudD did not recognize {}", path.display());
                return Ok(FetchedLyrics::not_found(String::new()));
            }
        };

        info!(
            "AudD recognized {} - {}",
            result.artist.as_deref().unwrap_or("?"),
            result.title.as_deref().unwrap_or("?")
        );
        let provider_id = result.song_link.unwrap_or_default();

        let payload = match result.lyrics {
            Some(Value::Null) | None => {
                warn!("AudD recognized the song but returned no lyrics");
                LyricsPayload::NotFound
            }
            Some(lyrics) => payload_from_lyrics(lyrics),
        };

        Ok(FetchedLyrics {
            payload,
            provider_id,
        })
    }
}
