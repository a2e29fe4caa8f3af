//! Session state — one per unique conversation identifier.
//!
//! A session owns the append-only message log, the conversation phase,
//! and the cumulative evidence. The session store is the sole owner of
//! `Session` values; other components only ever see a scoped mutable view
//! or a read-only snapshot.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::evidence::Evidence;
use crate::message::{Message, SessionId};

/// The conversation's position in the engagement state machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    /// No positive classification yet — every inbound message is classified
    Unevaluated,
    /// Scam confirmed; the persona agent is engaging
    Engaged,
    /// Conclusion predicate fired; terminal
    Concluded,
}

/// Per-conversation state.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Session {
    /// Opaque externally-supplied key, immutable once created
    pub id: SessionId,

    pub created_at: DateTime<Utc>,

    /// Ordered message log. Append-only; insertion order is conversation
    /// order regardless of caller-supplied timestamps.
    pub messages: Vec<Message>,

    pub phase: Phase,

    /// Last observed classification confidence; 0.0 until first classification
    pub scam_confidence: f32,

    /// Set at the first positive classification
    pub scam_category: Option<String>,

    /// Set on the transition into `Engaged`
    pub engaged_at: Option<DateTime<Utc>>,

    /// Message count at the moment of engagement. The conclusion predicate
    /// counts messages *since* engagement by index, so noisy caller clocks
    /// cannot skew it.
    pub engaged_at_index: Option<usize>,

    /// Monotonically growing intelligence
    pub evidence: Evidence,

    /// Set exactly once when the final report is dispatched; guards
    /// against duplicate reporting.
    pub report_sent: bool,

    pub report_sent_at: Option<DateTime<Utc>>,
}

impl Session {
    /// Create a fresh session with default field values.
    pub fn new(id: SessionId) -> Self {
        Self {
            id,
            created_at: Utc::now(),
            messages: Vec::new(),
            phase: Phase::Unevaluated,
            scam_confidence: 0.0,
            scam_category: None,
            engaged_at: None,
            engaged_at_index: None,
            evidence: Evidence::new(),
            report_sent: false,
            report_sent_at: None,
        }
    }

    /// Append a message to the log.
    pub fn push(&mut self, message: Message) {
        self.messages.push(message);
    }

    pub fn total_messages(&self) -> usize {
        self.messages.len()
    }

    /// Messages appended after the transition into `Engaged`.
    /// Zero while unengaged.
    pub fn messages_since_engagement(&self) -> usize {
        match self.engaged_at_index {
            Some(idx) => self.messages.len().saturating_sub(idx),
            None => 0,
        }
    }

    /// Transition `Unevaluated → Engaged`, recording the classification
    /// outcome and the engagement point.
    pub fn engage(&mut self, confidence: f32, category: impl Into<String>) {
        self.phase = Phase::Engaged;
        self.scam_confidence = confidence;
        self.scam_category = Some(category.into());
        self.engaged_at = Some(Utc::now());
        self.engaged_at_index = Some(self.messages.len());
    }

    /// Transition `Engaged → Concluded`. Terminal.
    pub fn conclude(&mut self) {
        self.phase = Phase::Concluded;
    }

    /// Flip the at-most-once report guard. Call *before* attempting
    /// delivery so a delivery failure cannot re-trigger reporting.
    pub fn mark_report_sent(&mut self) {
        self.report_sent = true;
        self.report_sent_at = Some(Utc::now());
    }

    /// Whether a scam has been positively classified for this session.
    pub fn scam_detected(&self) -> bool {
        matches!(self.phase, Phase::Engaged | Phase::Concluded)
    }

    /// Up to `window` messages preceding the most recent one, for
    /// classification context.
    pub fn recent_history(&self, window: usize) -> &[Message] {
        let upto = self.messages.len().saturating_sub(1);
        let from = upto.saturating_sub(window);
        &self.messages[from..upto]
    }
}
