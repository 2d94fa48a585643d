use crate::document::{DocumentFetcher, DocumentTextSource, FetchPolicy, HttpDocumentFetcher, PdfTextDecoder, TextDecoder};
use crate::eligibility::EligibilityVerifier;
use crate::error::InsuranceResult;
use crate::models::ExtractionResult;
use crate::pipeline::ExtractionPipeline;
use config_engine::AutomationConfig;
use std::sync::Arc;

/// Insurance service: the extraction pipeline plus document verification
#[derive(Clone)]
pub struct InsuranceService {
    pipeline: Arc<ExtractionPipeline>,
    verifier: Arc<EligibilityVerifier>,
}

impl InsuranceService {
    /// HTTP transport and PDF decoding
    pub fn from_config(config: &AutomationConfig) -> InsuranceResult<Self> {
        Self::with_transport(config, Arc::new(HttpDocumentFetcher::new()), Arc::new(PdfTextDecoder))
    }

    pub fn with_transport(
        config: &AutomationConfig,
        fetcher: Arc<dyn DocumentFetcher>,
        decoder: Arc<dyn TextDecoder>,
    ) -> InsuranceResult<Self> {
        let pipeline = Arc::new(ExtractionPipeline::from_config(&config.extraction)?);
        let source = DocumentTextSource::new(fetcher, decoder, FetchPolicy::from(&config.document_fetch));
        let verifier = Arc::new(EligibilityVerifier::new(source, Arc::clone(&pipeline)));
        Ok(Self { pipeline, verifier })
    }

    pub fn pipeline(&self) -> &ExtractionPipeline {
        &self.pipeline
    }

    pub fn verifier(&self) -> &EligibilityVerifier {
        &self.verifier
    }

    /// Extract from text already in hand
    pub fn extract(&self, raw_text: &str) -> ExtractionResult {
        self.pipeline.extract(raw_text)
    }

    pub async fn verify_document(&self, url: &str) -> InsuranceResult<ExtractionResult> {
        self.verifier.verify_document(url).await
    }
}
