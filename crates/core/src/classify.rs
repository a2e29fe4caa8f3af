//! Scam-classification collaborator trait.
//!
//! The engine asks a classifier whether an inbound message (in context)
//! is a scam attempt. The implementation is irrelevant to the engine —
//! production uses a hosted LLM, tests use scripted fakes.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::ClassifierError;
use crate::message::{ChannelMetadata, Message};

/// A classification judgment.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Verdict {
    pub is_scam: bool,

    /// Confidence in [0, 1]
    pub confidence: f32,

    /// Category label, e.g. "KYC", "Prize", "Delivery", "Threat",
    /// "Financial", "Other", "None"
    pub category: String,
}

impl Verdict {
    /// The safe default used whenever classification fails: never engage
    /// on ambiguous signal.
    pub fn not_scam() -> Self {
        Self {
            is_scam: false,
            confidence: 0.0,
            category: "None".into(),
        }
    }

    /// Clamp confidence into [0, 1]; model output is not trusted.
    pub fn clamped(mut self) -> Self {
        self.confidence = self.confidence.clamp(0.0, 1.0);
        self
    }
}

/// The classification collaborator.
///
/// May fail (timeout, malformed output); the engine degrades every
/// failure to [`Verdict::not_scam`].
#[async_trait]
pub trait ScamClassifier: Send + Sync {
    /// A human-readable name for this classifier (e.g. "groq", "scripted").
    fn name(&self) -> &str;

    /// Classify `text` given up to the last few prior messages and the
    /// channel metadata.
    async fn classify(
        &self,
        text: &str,
        history: &[Message],
        metadata: &ChannelMetadata,
    ) -> std::result::Result<Verdict, ClassifierError>;
}
