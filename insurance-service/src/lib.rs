//! Insurance eligibility document parsing.
//!
//! Turns an insurer-generated eligibility PDF into the four cost-share
//! fields a front desk needs: primary-care copay and coinsurance, and
//! urgent-care copay and coinsurance.
//!
//! - [`document`]: bounded-retry PDF retrieval and text decoding
//! - [`registry`]: carrier rule sets (grammars, keyword lists)
//! - [`detector`]: picks the rule set for a document
//! - [`extractor`]: grammar matches to validated candidates
//! - [`scoring`]: candidate ranking and per-field selection
//! - [`pipeline`]: detector, extractor and scorer in one call
//!
//! ```rust
//! use config_engine::ExtractionConfig;
//! use insurance_service::ExtractionPipeline;
//!
//! let pipeline = ExtractionPipeline::from_config(&ExtractionConfig::default()).unwrap();
//! let result = pipeline.extract("PCP[IN NETWORK]:$25.00 Urgent Care[IN NETWORK]:$75.00");
//! assert_eq!(result.primary_copay.unwrap().as_str(), "25.00");
//! assert_eq!(result.urgent_copay.unwrap().as_str(), "75.00");
//! ```

pub mod detector;
pub mod document;
pub mod eligibility;
pub mod error;
pub mod extractor;
pub mod models;
pub mod pipeline;
pub mod registry;
pub mod scoring;
pub mod service;

pub use detector::InsurerDetector;
pub use document::{
    cache_bust, is_pdf, DocumentFetcher, DocumentTextSource, FetchPolicy, HttpDocumentFetcher, PdfTextDecoder,
    TextDecoder,
};
pub use eligibility::EligibilityVerifier;
pub use error::{InsuranceError, InsuranceResult};
pub use extractor::{normalize_whitespace, FieldExtractor};
pub use models::*;
pub use pipeline::ExtractionPipeline;
pub use registry::{Fingerprint, Grammar, InsurerPatternRegistry, LineShape, PatternRule};
pub use scoring::{CandidateScorer, FieldWinners};
pub use service::InsuranceService;
