//! Final report payload and the delivery collaborator trait.
//!
//! The report is the engine's terminal output: a consolidated record of
//! one concluded engagement, shipped to an external collector. Field
//! names follow the collector's wire contract; evidence sets become
//! ordered sequences at this boundary only.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::ReportError;
use crate::evidence::Evidence;

/// Evidence sets in collector wire format.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExtractedIntelligence {
    pub bank_accounts: Vec<String>,
    pub upi_ids: Vec<String>,
    pub phishing_links: Vec<String>,
    pub phone_numbers: Vec<String>,
    pub suspicious_keywords: Vec<String>,
}

impl From<&Evidence> for ExtractedIntelligence {
    fn from(e: &Evidence) -> Self {
        Self {
            bank_accounts: e.bank_accounts.iter().cloned().collect(),
            upi_ids: e.payment_handles.iter().cloned().collect(),
            phishing_links: e.phishing_links.iter().cloned().collect(),
            phone_numbers: e.phone_numbers.iter().cloned().collect(),
            suspicious_keywords: e.suspicious_keywords.iter().cloned().collect(),
        }
    }
}

/// The consolidated result of one concluded engagement.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FinalReport {
    pub session_id: String,

    /// Always true at the only call site — conclusion is reachable only
    /// via `Engaged`.
    pub scam_detected: bool,

    pub total_messages_exchanged: usize,

    pub extracted_intelligence: ExtractedIntelligence,

    /// Human-readable summary: message count, last known confidence,
    /// per-category evidence counts.
    pub agent_notes: String,
}

/// The delivery collaborator. Retry and transport mechanics live behind
/// this seam; the engine's obligation ends at handing over the payload.
#[async_trait]
pub trait ReportSink: Send + Sync {
    /// A human-readable name for this sink (e.g. "collector", "noop").
    fn name(&self) -> &str;

    async fn deliver(&self, report: &FinalReport) -> std::result::Result<(), ReportError>;
}
