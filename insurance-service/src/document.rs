//! Eligibility document retrieval.
//!
//! The carrier portal generates the PDF asynchronously, so a URL that exists
//! may still serve an HTML placeholder for a while. [`DocumentTextSource`]
//! keeps fetching with exponential backoff until the bytes start with the PDF
//! header and decode cleanly, or every attempt is spent.

use crate::error::{InsuranceError, InsuranceResult};
use async_trait::async_trait;
use config_engine::DocumentFetchConfig;
use lopdf::{content::Content, Document, Object};
use reqwest::Url;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

pub const PDF_MAGIC: &[u8; 5] = b"%PDF-";

pub fn is_pdf(bytes: &[u8]) -> bool {
    bytes.starts_with(PDF_MAGIC)
}

/// Raw byte transport for a document URL
#[async_trait]
pub trait DocumentFetcher: Send + Sync {
    async fn fetch(&self, url: &str) -> InsuranceResult<Vec<u8>>;
}

/// Bytes to one text stream: pages in order joined by newline, tokens
/// within a page joined by single spaces
pub trait TextDecoder: Send + Sync {
    fn decode(&self, bytes: &[u8]) -> InsuranceResult<String>;
}

#[derive(Debug, Clone, Default)]
pub struct HttpDocumentFetcher {
    client: reqwest::Client,
}

impl HttpDocumentFetcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_client(client: reqwest::Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl DocumentFetcher for HttpDocumentFetcher {
    async fn fetch(&self, url: &str) -> InsuranceResult<Vec<u8>> {
        let response = self.client.get(url).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(InsuranceError::HttpStatus {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }
        Ok(response.bytes().await?.to_vec())
    }
}

/// Text-operator walk over each page's content stream
#[derive(Debug, Clone, Copy, Default)]
pub struct PdfTextDecoder;

impl TextDecoder for PdfTextDecoder {
    fn decode(&self, bytes: &[u8]) -> InsuranceResult<String> {
        let doc = Document::load_mem(bytes).map_err(|e| InsuranceError::DocumentDecode(e.to_string()))?;
        if doc.is_encrypted() {
            return Err(InsuranceError::DocumentDecode("document is encrypted".to_string()));
        }

        let mut pages = Vec::new();
        for (_, page_id) in doc.get_pages() {
            let content_bytes = doc
                .get_page_content(page_id)
                .map_err(|e| InsuranceError::DocumentDecode(e.to_string()))?;
            let content =
                Content::decode(&content_bytes).map_err(|e| InsuranceError::DocumentDecode(e.to_string()))?;

            let mut tokens = Vec::new();
            for operation in &content.operations {
                if matches!(operation.operator.as_str(), "Tj" | "TJ" | "'" | "\"") {
                    tokens.extend(operation.operands.iter().filter_map(object_text));
                }
            }
            pages.push(tokens.join(" "));
        }

        Ok(pages.join("\n"))
    }
}

fn object_text(obj: &Object) -> Option<String> {
    match obj {
        Object::String(bytes, _) => match bytes.strip_prefix(&[0xFE, 0xFF][..]) {
            // UTF-16BE with byte order mark
            Some(wide) => {
                let utf16: Vec<u16> = wide
                    .chunks_exact(2)
                    .filter_map(|pair| match *pair {
                        [hi, lo] => Some(u16::from_be_bytes([hi, lo])),
                        _ => None,
                    })
                    .collect();
                String::from_utf16(&utf16).ok()
            }
            None => Some(bytes.iter().map(|&b| b as char).collect()),
        },
        // TJ arrays interleave strings with kerning offsets
        Object::Array(items) => {
            let text: String = items.iter().filter_map(object_text).collect();
            (!text.is_empty()).then_some(text)
        }
        _ => None,
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct FetchPolicy {
    pub attempts: u32,
    pub initial_delay: Duration,
    pub backoff: f64,
    pub timeout_per_try: Duration,
}

impl Default for FetchPolicy {
    fn default() -> Self {
        Self::from(&DocumentFetchConfig::default())
    }
}

impl From<&DocumentFetchConfig> for FetchPolicy {
    fn from(config: &DocumentFetchConfig) -> Self {
        Self {
            attempts: config.attempts,
            initial_delay: config.initial_delay(),
            backoff: config.backoff,
            timeout_per_try: config.timeout_per_try(),
        }
    }
}

impl FetchPolicy {
    /// Delay after a failed attempt: `floor(previous * backoff)` milliseconds
    pub fn next_delay(&self, delay: Duration) -> Duration {
        Duration::from_millis((delay.as_millis() as f64 * self.backoff).floor() as u64)
    }
}

enum AttemptFailure {
    Timeout,
    NotPdf,
    Failed(InsuranceError),
}

pub struct DocumentTextSource {
    fetcher: Arc<dyn DocumentFetcher>,
    decoder: Arc<dyn TextDecoder>,
    policy: FetchPolicy,
}

impl DocumentTextSource {
    pub fn new(fetcher: Arc<dyn DocumentFetcher>, decoder: Arc<dyn TextDecoder>, policy: FetchPolicy) -> Self {
        Self {
            fetcher,
            decoder,
            policy,
        }
    }

    /// HTTP transport and PDF decoding
    pub fn http(policy: FetchPolicy) -> Self {
        Self::new(Arc::new(HttpDocumentFetcher::new()), Arc::new(PdfTextDecoder), policy)
    }

    pub fn policy(&self) -> &FetchPolicy {
        &self.policy
    }

    pub async fn fetch_and_extract_text(&self, url: &str) -> InsuranceResult<String> {
        let mut delay = self.policy.initial_delay;
        let mut last_failure = AttemptFailure::NotPdf;

        for attempt in 1..=self.policy.attempts {
            match self.attempt(url).await {
                Ok(text) => {
                    info!(attempt, chars = text.len(), "eligibility document decoded");
                    logger_redacted::redacted_debug!(text, "document text");
                    return Ok(text);
                }
                Err(failure) => {
                    match &failure {
                        AttemptFailure::Timeout => warn!(attempt, "document fetch timed out"),
                        AttemptFailure::NotPdf => debug!(attempt, "document not a PDF yet"),
                        AttemptFailure::Failed(e) => warn!(attempt, error = %e, "document fetch failed"),
                    }
                    last_failure = failure;
                }
            }

            if attempt < self.policy.attempts {
                tokio::time::sleep(delay).await;
                delay = self.policy.next_delay(delay);
            }
        }

        let attempts = self.policy.attempts;
        Err(match last_failure {
            AttemptFailure::Timeout => InsuranceError::DocumentFetchTimeout {
                url: url.to_string(),
                attempts,
            },
            AttemptFailure::NotPdf => InsuranceError::DocumentFormatUnavailable {
                url: url.to_string(),
                attempts,
            },
            AttemptFailure::Failed(e) => InsuranceError::DocumentFetchExhausted {
                attempts,
                reason: e.to_string(),
            },
        })
    }

    async fn attempt(&self, url: &str) -> Result<String, AttemptFailure> {
        let bytes = match tokio::time::timeout(self.policy.timeout_per_try, self.fetcher.fetch(url)).await {
            Err(_) => return Err(AttemptFailure::Timeout),
            Ok(Err(e)) => return Err(AttemptFailure::Failed(e)),
            Ok(Ok(bytes)) => bytes,
        };

        if !is_pdf(&bytes) {
            return Err(AttemptFailure::NotPdf);
        }

        let decoder = Arc::clone(&self.decoder);
        tokio::task::spawn_blocking(move || decoder.decode(&bytes))
            .await
            .map_err(|e| AttemptFailure::Failed(InsuranceError::DocumentDecode(e.to_string())))?
            .map_err(AttemptFailure::Failed)
    }
}

/// Set `_tm=<base36 millis>` so intermediaries cannot serve a stale
/// placeholder. Unparseable URLs are returned unchanged.
pub fn cache_bust(url: &str, now_millis: u64) -> String {
    let Ok(mut parsed) = Url::parse(url) else {
        return url.to_string();
    };
    let kept: Vec<(String, String)> = parsed
        .query_pairs()
        .filter(|(key, _)| key != "_tm")
        .map(|(k, v)| (k.into_owned(), v.into_owned()))
        .collect();
    parsed
        .query_pairs_mut()
        .clear()
        .extend_pairs(kept)
        .append_pair("_tm", &to_base36(now_millis));
    parsed.to_string()
}

pub fn cache_bust_now(url: &str) -> String {
    cache_bust(url, chrono::Utc::now().timestamp_millis().max(0) as u64)
}

fn to_base36(mut value: u64) -> String {
    if value == 0 {
        return "0".to_string();
    }
    let mut out = Vec::new();
    while value > 0 {
        // Remainder is always below the radix
        out.extend(char::from_digit((value % 36) as u32, 36));
        value /= 36;
    }
    out.iter().rev().collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pdf_magic() {
        assert!(is_pdf(b"%PDF-1.7\n..."));
        assert!(!is_pdf(b"<html>"));
        assert!(!is_pdf(b"%PDF"));
    }

    #[test]
    fn test_backoff_floors_milliseconds() {
        let policy = FetchPolicy::default();
        let second = policy.next_delay(policy.initial_delay);
        assert_eq!(second, Duration::from_millis(800));
        assert_eq!(policy.next_delay(second), Duration::from_millis(1280));
        assert_eq!(policy.next_delay(Duration::from_millis(333)), Duration::from_millis(532));
    }

    #[test]
    fn test_cache_bust_replaces_previous_marker() {
        let busted = cache_bust("https://portal.example/doc.pdf?id=7&_tm=old", 36);
        assert_eq!(busted, "https://portal.example/doc.pdf?id=7&_tm=10");
    }

    #[test]
    fn test_cache_bust_leaves_relative_urls() {
        assert_eq!(cache_bust("/doc.pdf", 1), "/doc.pdf");
    }

    #[test]
    fn test_string_objects_decode_without_panicking_on_odd_lengths() {
        use lopdf::StringFormat;

        let wide = Object::String(vec![0xFE, 0xFF, 0x00, b'P', 0x00, b'C', 0x00], StringFormat::Hexadecimal);
        assert_eq!(object_text(&wide).as_deref(), Some("PC"));

        let short = Object::String(vec![0xFE], StringFormat::Literal);
        assert_eq!(object_text(&short).as_deref(), Some("\u{fe}"));

        let kerned = Object::Array(vec![
            Object::String(b"PC".to_vec(), StringFormat::Literal),
            Object::Integer(-120),
            Object::String(b"P".to_vec(), StringFormat::Literal),
        ]);
        assert_eq!(object_text(&kerned).as_deref(), Some("PCP"));
    }

    #[test]
    fn test_base36() {
        assert_eq!(to_base36(0), "0");
        assert_eq!(to_base36(35), "z");
        assert_eq!(to_base36(1_700_000_000_000), "loyw3v28");
    }
}
