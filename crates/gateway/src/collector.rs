//! Report delivery to the external collector.
//!
//! The engine marks `report_sent` before any delivery attempt, so this
//! client is fire-and-forget: a failed POST is logged and never retried
//! by the core (at-most-once from the engine's perspective).

use async_trait::async_trait;
use mellivora_config::CollectorConfig;
use mellivora_core::error::ReportError;
use mellivora_core::{FinalReport, ReportSink};
use tracing::{debug, info};

/// HTTP report sink posting the final payload to a collector endpoint.
pub struct CollectorClient {
    url: String,
    client: reqwest::Client,
}

impl CollectorClient {
    pub fn new(url: impl Into<String>, timeout_secs: u64) -> Self {
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(timeout_secs))
            .build()
            .expect("Failed to create HTTP client");

        Self {
            url: url.into(),
            client,
        }
    }

    /// Build from configuration; `None` when no collector URL is set.
    pub fn from_config(config: &CollectorConfig) -> Option<Self> {
        config
            .url
            .as_ref()
            .map(|url| Self::new(url.clone(), config.timeout_secs))
    }
}

#[async_trait]
impl ReportSink for CollectorClient {
    fn name(&self) -> &str {
        "collector"
    }

    async fn deliver(&self, report: &FinalReport) -> Result<(), ReportError> {
        debug!(session_id = %report.session_id, url = %self.url, "Posting final report");

        let response = self
            .client
            .post(&self.url)
            .header("Content-Type", "application/json")
            .json(report)
            .send()
            .await
            .map_err(|e| ReportError::DeliveryFailed {
                session_id: report.session_id.clone(),
                reason: e.to_string(),
            })?;

        if !response.status().is_success() {
            return Err(ReportError::Rejected {
                session_id: report.session_id.clone(),
                status_code: response.status().as_u16(),
            });
        }

        Ok(())
    }
}

/// Sink used when no collector is configured: the report is logged in
/// full so nothing is silently lost in development setups.
pub struct LogOnlySink;

#[async_trait]
impl ReportSink for LogOnlySink {
    fn name(&self) -> &str {
        "log-only"
    }

    async fn deliver(&self, report: &FinalReport) -> Result<(), ReportError> {
        info!(
            session_id = %report.session_id,
            payload = %serde_json::to_string(report).unwrap_or_default(),
            "No collector configured — final report logged only"
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mellivora_core::ExtractedIntelligence;

    fn report() -> FinalReport {
        FinalReport {
            session_id: "s1".into(),
            scam_detected: true,
            total_messages_exchanged: 9,
            extracted_intelligence: ExtractedIntelligence::default(),
            agent_notes: "notes".into(),
        }
    }

    #[test]
    fn from_config_requires_url() {
        assert!(CollectorClient::from_config(&CollectorConfig::default()).is_none());

        let config = CollectorConfig {
            url: Some("https://collector.example/api/result".into()),
            ..CollectorConfig::default()
        };
        let client = CollectorClient::from_config(&config).unwrap();
        assert_eq!(client.url, "https://collector.example/api/result");
    }

    #[tokio::test]
    async fn log_only_sink_always_succeeds() {
        let sink = LogOnlySink;
        assert!(sink.deliver(&report()).await.is_ok());
        assert_eq!(sink.name(), "log-only");
    }

    #[tokio::test]
    async fn unreachable_collector_is_delivery_failure() {
        // Nothing listens on this port; the failure must map to
        // DeliveryFailed, not a panic.
        let client = CollectorClient::new("http://127.0.0.1:1/nope", 1);
        let err = client.deliver(&report()).await.unwrap_err();
        assert!(matches!(err, ReportError::DeliveryFailed { .. }));
    }
}
