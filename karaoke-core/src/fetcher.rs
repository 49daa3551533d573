//! Lyrics fetcher that orchestrates multiple lyrics providers.

use tracing::{info, warn};

use crate::lyrics::{AcquiredLyrics, Provenance};
use crate::provider::{LyricsProvider, LyricsQuery};

/// Tries lyrics providers in order until one produces a usable document
pub struct LyricsFetcher {
    providers: Vec<Box<dyn LyricsProvider>>,
}

impl LyricsFetcher {
    /// Create a new lyrics fetcher
    ///
    /// # Arguments
    /// * `providers` - List of lyrics providers to try in order
    #[must_use]
    pub fn new(providers: Vec<Box<dyn LyricsProvider>>) -> Self {
        Self { providers }
    }

    #[must_use]
    pub fn provider_names(&self) -> Vec<&'static str> {
        self.providers.iter().map(|p| p.name()).collect()
    }

    /// Acquire timed lyrics for a query.
    ///
    /// Synchronized results win immediately. Plain text from a recognition
    /// provider is accepted with synthetic timing, while plain text from a
    /// lookup provider is held back and used only if nothing later succeeds.
    pub async fn acquire(&self, query: &LyricsQuery) -> Option<AcquiredLyrics> {
        let provider_names = self.provider_names();
        info!(
            "Fetching lyrics for: {} - {} (providers: {:?})",
            query.artist_name, query.track_name, provider_names
        );

        let mut held_back: Option<AcquiredLyrics> = None;

        for provider in &self.providers {
            info!("Trying provider: {}", provider.name());
            let fetched = match provider.fetch(query).await {
                Ok(fetched) => fetched,
                Err(e) => {
                    warn!("Provider {} failed with error: {}", provider.name(), e);
                    continue;
                }
            };

            let Some(document) = fetched.payload.normalize() else {
                info!("Provider {} returned no lyrics", provider.name());
                continue;
            };

            let acquired = AcquiredLyrics {
                document,
                provenance: provider.provenance(),
                provider: provider.name(),
                synced: fetched.payload.is_synced(),
            };

            if acquired.synced || acquired.provenance != Provenance::SyncedLookup {
                info!(
                    "Found lyrics from {} ({} lines, provider_id: {}, synced: {})",
                    provider.name(),
                    acquired.document.len(),
                    fetched.provider_id,
                    fetched.payload.is_synced()
                );
                return Some(acquired);
            }

            info!(
                "Provider {} returned unsynced lyrics, keeping them as a last resort",
                provider.name()
            );
            if held_back.is_none() {
                held_back = Some(acquired);
            }
        }

        if let Some(acquired) = &held_back {
            info!(
                "Using unsynced lyrics from {} with synthetic timing",
                acquired.provider
            );
        } else {
            info!(
                "No lyrics found for {} - {} (tried {} providers: {:?})",
                query.artist_name,
                query.track_name,
                self.providers.len(),
                provider_names
            );
        }
        held_back
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::CoreError;
    use crate::provider::{FetchedLyrics, LyricsPayload};
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    struct StubProvider {
        name: &'static str,
        provenance: Provenance,
        outcome: Option<LyricsPayload>,
        calls: Arc<AtomicUsize>,
    }

    impl StubProvider {
        fn boxed(
            name: &'static str,
            provenance: Provenance,
            outcome: Option<LyricsPayload>,
        ) -> (Box<dyn LyricsProvider>, Arc<AtomicUsize>) {
            let calls = Arc::new(AtomicUsize::new(0));
            let provider = Self {
                name,
                provenance,
                outcome,
                calls: Arc::clone(&calls),
            };
            (Box::new(provider), calls)
        }
    }

    #[async_trait]
    impl LyricsProvider for StubProvider {
        fn name(&self) -> &'static str {
            self.name
        }

        fn provenance(&self) -> Provenance {
            self.provenance
        }

        async fn fetch(&self, _query: &LyricsQuery) -> Result<FetchedLyrics, CoreError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            match &self.outcome {
                Some(payload) => Ok(FetchedLyrics {
                    payload: payload.clone(),
                    provider_id: "1".to_string(),
                }),
                None => Err(CoreError::LyricsProviderFailed {
                    provider: self.name.to_string(),
                    reason: "offline".to_string(),
                }),
            }
        }
    }

    fn query() -> LyricsQuery {
        LyricsQuery::new("Track", "Artist")
    }

    #[tokio::test]
    async fn test_synced_lookup_wins_without_fallback() {
        let (lookup, _) = StubProvider::boxed(
            "lookup",
            Provenance::SyncedLookup,
            Some(LyricsPayload::Synced("[00:01.00]Hi".into())),
        );
        let (recognition, recognition_calls) = StubProvider::boxed(
            "recognition",
            Provenance::RecognitionFallback,
            Some(LyricsPayload::Unsynced("Hi".into())),
        );

        let fetcher = LyricsFetcher::new(vec![lookup, recognition]);
        let acquired = fetcher.acquire(&query()).await.unwrap();

        assert_eq!(acquired.provenance, Provenance::SyncedLookup);
        assert_eq!(acquired.provider, "lookup");
        assert!(acquired.is_synced_lookup());
        assert_eq!(acquired.document.lines[0].timestamp, "00:00:01.000");
        assert_eq!(recognition_calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_falls_back_after_error_and_not_found() {
        let (failing, _) = StubProvider::boxed("failing", Provenance::SyncedLookup, None);
        let (empty, _) = StubProvider::boxed(
            "empty",
            Provenance::SyncedLookup,
            Some(LyricsPayload::Synced("[ti:tags only]".into())),
        );
        let (recognition, _) = StubProvider::boxed(
            "recognition",
            Provenance::RecognitionFallback,
            Some(LyricsPayload::Unsynced("First\nSecond".into())),
        );

        let fetcher = LyricsFetcher::new(vec![failing, empty, recognition]);
        let acquired = fetcher.acquire(&query()).await.unwrap();

        assert_eq!(acquired.provenance, Provenance::RecognitionFallback);
        assert_eq!(acquired.document.len(), 2);
        assert_eq!(acquired.document.lines[1].timestamp, "00:00:05.000");
    }

    #[tokio::test]
    async fn test_unsynced_lookup_is_last_resort() {
        let (lookup, _) = StubProvider::boxed(
            "lookup",
            Provenance::SyncedLookup,
            Some(LyricsPayload::Unsynced("Plain words".into())),
        );
        let (recognition, recognition_calls) = StubProvider::boxed(
            "recognition",
            Provenance::RecognitionFallback,
            Some(LyricsPayload::NotFound),
        );

        let fetcher = LyricsFetcher::new(vec![lookup, recognition]);
        let acquired = fetcher.acquire(&query()).await.unwrap();

        assert_eq!(recognition_calls.load(Ordering::SeqCst), 1);
        assert_eq!(acquired.provider, "lookup");
        assert!(!acquired.synced);
        assert!(!acquired.is_synced_lookup());
        assert_eq!(acquired.document.lines[0].text, "Plain words");
        assert_eq!(acquired.document.lines[0].timestamp, "00:00:00.000");
    }

    #[tokio::test]
    async fn test_nothing_found() {
        let (lookup, _) =
            StubProvider::boxed("lookup", Provenance::SyncedLookup, Some(LyricsPayload::NotFound));
        let fetcher = LyricsFetcher::new(vec![lookup]);
        assert!(fetcher.acquire(&query()).await.is_none());
    }

    #[tokio::test]
    async fn test_no_providers() {
        let fetcher = LyricsFetcher::new(Vec::new());
        assert!(fetcher.acquire(&query()).await.is_none());
    }
}
