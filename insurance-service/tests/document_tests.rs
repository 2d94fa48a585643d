use async_trait::async_trait;
use error_common::CodedError;
use insurance_service::{
    DocumentFetcher, DocumentTextSource, FetchPolicy, InsuranceError, InsuranceResult, TextDecoder,
};
use std::collections::VecDeque;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

enum Reply {
    Bytes(&'static [u8]),
    Hang,
    Status(u16),
}

/// Plays back one reply per fetch; the last reply repeats
struct ScriptedFetcher {
    replies: Mutex<VecDeque<Reply>>,
    calls: AtomicU32,
}

impl ScriptedFetcher {
    fn new(replies: Vec<Reply>) -> Arc<Self> {
        Arc::new(Self {
            replies: Mutex::new(replies.into()),
            calls: AtomicU32::new(0),
        })
    }

    fn calls(&self) -> u32 {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl DocumentFetcher for ScriptedFetcher {
    async fn fetch(&self, url: &str) -> InsuranceResult<Vec<u8>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let reply = {
            let mut replies = self.replies.lock().unwrap();
            if replies.len() > 1 {
                replies.pop_front().unwrap()
            } else {
                match replies.front().unwrap() {
                    Reply::Bytes(b) => Reply::Bytes(*b),
                    Reply::Hang => Reply::Hang,
                    Reply::Status(s) => Reply::Status(*s),
                }
            }
        };
        match reply {
            Reply::Bytes(bytes) => Ok(bytes.to_vec()),
            Reply::Hang => std::future::pending().await,
            Reply::Status(status) => Err(InsuranceError::HttpStatus {
                url: url.to_string(),
                status,
            }),
        }
    }
}

/// Treats everything after the header line as the document text
struct HeaderStrippingDecoder;

impl TextDecoder for HeaderStrippingDecoder {
    fn decode(&self, bytes: &[u8]) -> InsuranceResult<String> {
        let text = String::from_utf8_lossy(bytes);
        text.split_once('\n')
            .map(|(_, body)| body.to_string())
            .ok_or_else(|| InsuranceError::DocumentDecode("no body".to_string()))
    }
}

fn source(fetcher: Arc<ScriptedFetcher>) -> DocumentTextSource {
    DocumentTextSource::new(fetcher, Arc::new(HeaderStrippingDecoder), FetchPolicy::default())
}

#[tokio::test]
async fn test_placeholder_then_pdf_succeeds() {
    tokio::time::pause();
    let fetcher = ScriptedFetcher::new(vec![
        Reply::Bytes(b"<html>generating</html>"),
        Reply::Bytes(b"<html>generating</html>"),
        Reply::Bytes(b"%PDF-1.4\nPCP[IN NETWORK]:$25.00"),
    ]);
    let started = tokio::time::Instant::now();

    let text = source(fetcher.clone()).fetch_and_extract_text("https://portal/doc").await.unwrap();

    assert_eq!(text, "PCP[IN NETWORK]:$25.00");
    assert_eq!(fetcher.calls(), 3);
    // 500ms then 800ms of backoff
    let elapsed = started.elapsed();
    assert!(elapsed >= Duration::from_millis(1300), "{:?}", elapsed);
    assert!(elapsed < Duration::from_millis(2000), "{:?}", elapsed);
}

#[tokio::test]
async fn test_never_a_pdf_is_format_unavailable() {
    tokio::time::pause();
    let fetcher = ScriptedFetcher::new(vec![Reply::Bytes(b"<html>still working</html>")]);

    let err = source(fetcher.clone()).fetch_and_extract_text("https://portal/doc").await.unwrap_err();

    assert!(matches!(err, InsuranceError::DocumentFormatUnavailable { attempts: 6, .. }));
    assert_eq!(fetcher.calls(), 6);
    assert!(err.is_transient());
}

#[tokio::test]
async fn test_hanging_server_is_fetch_timeout() {
    tokio::time::pause();
    let fetcher = ScriptedFetcher::new(vec![Reply::Hang]);

    let err = source(fetcher.clone()).fetch_and_extract_text("https://portal/doc").await.unwrap_err();

    assert!(matches!(err, InsuranceError::DocumentFetchTimeout { .. }));
    assert_eq!(err.code(), "DOC_1001");
    assert_eq!(fetcher.calls(), 6);
}

#[tokio::test]
async fn test_http_errors_exhaust_all_attempts() {
    tokio::time::pause();
    let fetcher = ScriptedFetcher::new(vec![Reply::Status(503)]);

    let err = source(fetcher.clone()).fetch_and_extract_text("https://portal/doc").await.unwrap_err();

    assert!(matches!(err, InsuranceError::DocumentFetchExhausted { attempts: 6, .. }));
    assert!(err.to_string().contains("503"));
}

#[tokio::test]
async fn test_decode_failure_is_retried() {
    tokio::time::pause();
    let fetcher = ScriptedFetcher::new(vec![
        Reply::Bytes(b"%PDF-truncated"),
        Reply::Bytes(b"%PDF-1.4\nUrgent Care[IN NETWORK]:$50.00"),
    ]);

    let text = tokio_test::assert_ok!(source(fetcher.clone()).fetch_and_extract_text("https://portal/doc").await);

    assert_eq!(text, "Urgent Care[IN NETWORK]:$50.00");
    assert_eq!(fetcher.calls(), 2);
}

#[test]
fn test_pdf_decoder_rejects_garbage() {
    use insurance_service::PdfTextDecoder;
    let err = PdfTextDecoder.decode(b"%PDF-1.4 not really a pdf").unwrap_err();
    assert!(matches!(err, InsuranceError::DocumentDecode(_)));
}
