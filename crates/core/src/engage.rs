//! Reply-generation collaborator trait.
//!
//! Produces the text the honeypot sends back. Which voice to use depends
//! on the conversation phase; the engine picks the [`ReplyKind`], the
//! generator renders it.

use async_trait::async_trait;

use crate::error::ReplyError;
use crate::message::{ChannelMetadata, Message};

/// Which voice a reply should be rendered in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReplyKind {
    /// Pre-engagement: respond naturally, commit to no persona
    Neutral,
    /// First in-persona reply right after scam confirmation
    Opening,
    /// Ongoing in-persona engagement, eliciting identifiers
    Engaged,
    /// Polite wind-down at or after conclusion
    Closing,
}

/// Everything a generator needs to render one reply.
#[derive(Debug, Clone)]
pub struct ReplyContext {
    pub kind: ReplyKind,

    /// The inbound message being replied to
    pub inbound_text: String,

    /// Recent conversation history, oldest first
    pub history: Vec<Message>,

    pub metadata: ChannelMetadata,
}

/// The reply-generation collaborator.
///
/// May fail (timeout, empty output); the engine substitutes a fixed
/// neutral fallback and continues — a generation failure must not stall
/// intelligence gathering or conclusion detection.
#[async_trait]
pub trait ReplyGenerator: Send + Sync {
    /// A human-readable name for this generator.
    fn name(&self) -> &str;

    async fn reply(&self, ctx: &ReplyContext) -> std::result::Result<String, ReplyError>;
}

/// The fixed fallback used when generation fails. Deliberately bland and
/// in-character for any phase.
pub const FALLBACK_REPLY: &str = "Sorry, I am having network issues. Can you please repeat?";
