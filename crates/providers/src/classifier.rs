//! LLM-backed scam classifier.
//!
//! Builds a compact context block (channel metadata + recent history +
//! the message under analysis), asks the model for a strict JSON verdict,
//! and recovers the object from fenced or prose-wrapped output. Anything
//! unrecoverable surfaces as `MalformedOutput`; the engine degrades that
//! to the not-scam default.

use async_trait::async_trait;
use mellivora_core::error::ClassifierError;
use mellivora_core::{ChannelMetadata, Message, ScamClassifier, Sender, Verdict};
use serde::Deserialize;
use tracing::debug;

use crate::client::{ChatClient, ChatRequest};
use crate::json::extract_json_object;

const CLASSIFY_TEMPERATURE: f32 = 0.3;
const CLASSIFY_MAX_TOKENS: u32 = 500;

const SYSTEM_PROMPT: &str = r#"You are a scam-detection system specializing in fraud patterns common in Indian messaging channels.

Given a message and its conversation context, judge whether it is a scam attempt.

Patterns to watch for: fake KYC/verification demands, prize and lottery notifications, courier/delivery fee tricks, account-blocking threats, OTP/PIN/CVV requests, tax refund lures, advance-fee job or loan offers, investment schemes, digital-arrest impersonation of police or courts, Aadhaar/PAN update demands.

Signals: manufactured urgency, requests for credentials or payment, unsolicited offers, threats of legal action or suspension, suspicious links or APK downloads, impersonation of banks/government/couriers, unknown senders claiming authority.

Respond ONLY with a JSON object:
{
  "is_scam": true or false,
  "confidence": 0.0 to 1.0,
  "reasoning": "one short sentence",
  "scam_type": "KYC|Prize|Delivery|Threat|Financial|Other|None"
}"#;

/// What the model is asked to return.
#[derive(Debug, Deserialize)]
struct RawVerdict {
    #[serde(default)]
    is_scam: bool,

    #[serde(default)]
    confidence: f32,

    #[serde(default)]
    scam_type: Option<String>,

    #[serde(default)]
    #[allow(dead_code)]
    reasoning: Option<String>,
}

/// Classifier over an OpenAI-compatible chat endpoint.
pub struct LlmClassifier {
    client: ChatClient,
}

impl LlmClassifier {
    pub fn new(client: ChatClient) -> Self {
        Self { client }
    }

    /// Render the classification context the way the model sees it.
    fn build_context(text: &str, history: &[Message], metadata: &ChannelMetadata) -> String {
        let mut context = format!(
            "Channel: {}\nLanguage: {}\nLocale: {}\n\n",
            metadata.channel, metadata.language, metadata.locale
        );

        if !history.is_empty() {
            context.push_str("Previous messages:\n");
            for msg in history {
                let sender = match msg.sender {
                    Sender::Counterparty => "counterparty",
                    Sender::Agent => "agent",
                };
                context.push_str(&format!("{sender}: {}\n", msg.text));
            }
            context.push('\n');
        }

        context.push_str(&format!("Current message to analyze:\n{text}"));
        context
    }

    fn parse_verdict(content: &str) -> Result<Verdict, ClassifierError> {
        let object = extract_json_object(content).ok_or_else(|| {
            ClassifierError::MalformedOutput(format!(
                "no JSON object in classifier output: {}",
                content.chars().take(120).collect::<String>()
            ))
        })?;

        let raw: RawVerdict = serde_json::from_str(object)
            .map_err(|e| ClassifierError::MalformedOutput(e.to_string()))?;

        Ok(Verdict {
            is_scam: raw.is_scam,
            confidence: raw.confidence,
            category: raw.scam_type.unwrap_or_else(|| "None".into()),
        }
        .clamped())
    }
}

#[async_trait]
impl ScamClassifier for LlmClassifier {
    fn name(&self) -> &str {
        "llm"
    }

    async fn classify(
        &self,
        text: &str,
        history: &[Message],
        metadata: &ChannelMetadata,
    ) -> Result<Verdict, ClassifierError> {
        let request = ChatRequest {
            system: SYSTEM_PROMPT.to_string(),
            user: Self::build_context(text, history, metadata),
            temperature: CLASSIFY_TEMPERATURE,
            max_tokens: CLASSIFY_MAX_TOKENS,
            json_mode: true,
        };

        let content = self.client.complete(&request).await?;
        let verdict = Self::parse_verdict(&content)?;

        debug!(
            is_scam = verdict.is_scam,
            confidence = verdict.confidence,
            category = %verdict.category,
            "Classification verdict"
        );

        Ok(verdict)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_clean_verdict() {
        let v = LlmClassifier::parse_verdict(
            r#"{"is_scam": true, "confidence": 0.92, "reasoning": "KYC urgency", "scam_type": "KYC"}"#,
        )
        .unwrap();
        assert!(v.is_scam);
        assert_eq!(v.confidence, 0.92);
        assert_eq!(v.category, "KYC");
    }

    #[test]
    fn parse_fenced_verdict() {
        let v = LlmClassifier::parse_verdict(
            "```json\n{\"is_scam\": false, \"confidence\": 0.1}\n```",
        )
        .unwrap();
        assert!(!v.is_scam);
        assert_eq!(v.category, "None");
    }

    #[test]
    fn parse_verdict_with_leading_prose() {
        let v = LlmClassifier::parse_verdict(
            "Let me analyze this. {\"is_scam\": true, \"confidence\": 0.8, \"scam_type\": \"Prize\"}",
        )
        .unwrap();
        assert!(v.is_scam);
        assert_eq!(v.category, "Prize");
    }

    #[test]
    fn confidence_out_of_range_is_clamped() {
        let v =
            LlmClassifier::parse_verdict(r#"{"is_scam": true, "confidence": 3.5}"#).unwrap();
        assert_eq!(v.confidence, 1.0);
    }

    #[test]
    fn garbage_is_malformed() {
        let err = LlmClassifier::parse_verdict("I think this might be a scam?").unwrap_err();
        assert!(matches!(err, ClassifierError::MalformedOutput(_)));
    }

    #[test]
    fn context_includes_metadata_and_history() {
        let history = vec![
            Message::counterparty("your parcel is held", 1),
            Message::agent("which parcel?", 2),
        ];
        let metadata = ChannelMetadata {
            channel: "SMS".into(),
            ..ChannelMetadata::default()
        };

        let context =
            LlmClassifier::build_context("pay customs duty now", &history, &metadata);

        assert!(context.starts_with("Channel: SMS"));
        assert!(context.contains("counterparty: your parcel is held"));
        assert!(context.contains("agent: which parcel?"));
        assert!(context.ends_with("Current message to analyze:\npay customs duty now"));
    }

    #[test]
    fn context_without_history_omits_section() {
        let context = LlmClassifier::build_context(
            "hello",
            &[],
            &ChannelMetadata::default(),
        );
        assert!(!context.contains("Previous messages"));
    }
}
