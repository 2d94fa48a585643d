use crate::document::{cache_bust_now, DocumentTextSource};
use crate::error::InsuranceResult;
use crate::models::ExtractionResult;
use crate::pipeline::ExtractionPipeline;
use std::sync::Arc;
use tracing::info;

/// Eligibility verification: document URL in, cost-share fields out
pub struct EligibilityVerifier {
    source: DocumentTextSource,
    pipeline: Arc<ExtractionPipeline>,
}

impl EligibilityVerifier {
    pub fn new(source: DocumentTextSource, pipeline: Arc<ExtractionPipeline>) -> Self {
        Self { source, pipeline }
    }

    pub fn pipeline(&self) -> &ExtractionPipeline {
        &self.pipeline
    }

    /// Fetch the document behind `url` (cache-busted) and extract from it
    pub async fn verify_document(&self, url: &str) -> InsuranceResult<ExtractionResult> {
        let text = self.source.fetch_and_extract_text(&cache_bust_now(url)).await?;
        let result = self.pipeline.extract(&text);
        info!(
            rule_set = %result.rule_set,
            has_primary = result.has_primary(),
            "eligibility document verified"
        );
        Ok(result)
    }
}
