pub mod clients;
pub mod config;
pub mod error;
pub mod extractor;
pub mod http;
pub mod lookup;
pub mod models;
pub mod pipeline;
pub mod reduce;
pub mod report;
pub mod verifier;

pub use error::{ErrorBody, ErrorKind, FactCheckError, Result};
pub use models::{
    Claim, Confidence, Evidence, EvidenceOrigin, Extraction, RegistryEntry, Reliability, Report,
    Verdict, VerdictLabel,
};
pub use pipeline::{FactCheckPipeline, FactCheckRequest};
