//! Translation Engine Client
//!
//! The engine is a black box reached over HTTP: POST a `SourceDocument`,
//! receive a `TranslatedDocument`. Transport blips get a small bounded retry
//! with jittered backoff; a non-success status is a translator failure and is
//! not retried here (the job-level retry path owns that decision).

use super::types::{SourceDocument, TranslatedDocument};
use anyhow::Result;
use async_trait::async_trait;
use std::time::Duration;

/// A translation engine. The pipeline only ever sees this interface.
#[async_trait]
pub trait Translator: Send + Sync {
    /// Translates one document. Errors are per-job: the caller records them
    /// against the job and moves on.
    async fn translate(&self, doc: &SourceDocument) -> Result<TranslatedDocument>;
}

/// HTTP-backed translation engine client.
pub struct HttpTranslator {
    client: reqwest::Client,
    endpoint: String,
    request_timeout: Duration,
    attempts: usize,
}

impl HttpTranslator {
    /// `endpoint` is the engine base URL; the client POSTs to
    /// `{endpoint}/translate`.
    pub fn new(endpoint: impl Into<String>, request_timeout: Duration) -> Self {
        let endpoint: String = endpoint.into();
        Self {
            client: reqwest::Client::new(),
            endpoint: endpoint.trim_end_matches('/').to_string(),
            request_timeout,
            attempts: 3,
        }
    }

    /// Overrides the transport retry bound.
    pub fn with_attempts(mut self, attempts: usize) -> Self {
        self.attempts = attempts.max(1);
        self
    }

    async fn post_with_retry(&self, doc: &SourceDocument) -> Result<reqwest::Response> {
        let url = format!("{}/translate", self.endpoint);
        let mut delay_ms = 150u64;

        for attempt in 0..self.attempts {
            let response = self
                .client
                .post(url.clone())
                .json(doc)
                .timeout(self.request_timeout)
                .send()
                .await;

            match response {
                Ok(resp) => return Ok(resp),
                Err(e) => {
                    if attempt + 1 == self.attempts {
                        return Err(anyhow::anyhow!(e));
                    }
                    // Simple jitter to prevent thundering herd
                    let jitter = rand::random::<u64>() % 50;
                    tokio::time::sleep(Duration::from_millis(delay_ms + jitter)).await;
                    delay_ms = (delay_ms * 2).min(1200);
                }
            }
        }

        Err(anyhow::anyhow!("Retry attempts exhausted"))
    }
}

#[async_trait]
impl Translator for HttpTranslator {
    async fn translate(&self, doc: &SourceDocument) -> Result<TranslatedDocument> {
        let response = self.post_with_retry(doc).await?;

        if !response.status().is_success() {
            return Err(anyhow::anyhow!(
                "Translation request for {} failed: {}",
                doc.doc_id,
                response.status()
            ));
        }

        let translated: TranslatedDocument = response.json().await?;
        Ok(translated)
    }
}
