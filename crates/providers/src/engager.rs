//! LLM-backed persona reply generator.
//!
//! Renders one of four voices depending on the conversation phase: a
//! neutral pre-engagement voice, and the in-persona opening, ongoing and
//! closing voices of the honeypot character. The persona never confronts,
//! never reveals suspicion, and steers toward concrete identifiers.

use async_trait::async_trait;
use mellivora_core::error::ReplyError;
use mellivora_core::{Message, ReplyContext, ReplyGenerator, ReplyKind, Sender};

use crate::client::{ChatClient, ChatRequest};

const REPLY_TEMPERATURE: f32 = 0.8;
const REPLY_MAX_TOKENS: u32 = 200;

const PERSONA_PROMPT: &str = r#"You are roleplaying as Dinesh Rao, a 62-year-old retired schoolteacher from Pune, India.

PERSONA:
- Middle-class, modest savings, not comfortable with technology
- Polite and cooperative, trusts anything that sounds official
- Simple conversational English with an occasional Hindi word
- Small grammar slips typical of Indian English
- Needs instructions repeated, asks clarifying questions
- Mentions his wife or grandchildren now and then

RULES:
1. NEVER reveal you suspect a scam
2. NEVER accuse or confront the sender
3. NEVER use polished grammar or technical vocabulary
4. Show concern about the "problem" and willingness to comply
5. Ask questions that draw out details: which branch, what number to call, where to send money, what is the official link, what is your employee ID
6. Invent small believable delays (reading glasses, slow phone, asking wife)

GOAL: keep the sender talking and coax out phone numbers, payment handles, account numbers, links and names, while staying completely in character."#;

const NEUTRAL_PROMPT: &str = "You are an ordinary person replying to a message that may or may not be legitimate. Reply naturally and briefly, be polite, and give away no personal or sensitive information.";

/// Reply generator over an OpenAI-compatible chat endpoint.
pub struct LlmEngager {
    client: ChatClient,
}

impl LlmEngager {
    pub fn new(client: ChatClient) -> Self {
        Self { client }
    }

    fn transcript(history: &[Message]) -> String {
        let mut out = String::new();
        for msg in history {
            let label = match msg.sender {
                Sender::Counterparty => "Counterparty",
                Sender::Agent => "You (Dinesh)",
            };
            out.push_str(&format!("{label}: {}\n", msg.text));
        }
        out
    }

    /// Render the user-turn instructions for one reply.
    fn build_instructions(ctx: &ReplyContext) -> String {
        match ctx.kind {
            ReplyKind::Neutral => format!(
                "Message received:\n\"{}\"\n\nReply in 1-2 sentences.",
                ctx.inbound_text
            ),
            ReplyKind::Opening => format!(
                "The counterparty just sent this message:\n\"{}\"\n\n\
                 This is your FIRST reply. Show concern about what they describe, \
                 be willing to cooperate, and ask one clarifying question that pulls \
                 out more detail. Keep it to 2-3 sentences.\n\nChannel: {}",
                ctx.inbound_text, ctx.metadata.channel
            ),
            ReplyKind::Engaged => format!(
                "Conversation so far:\n\n{}\n\nChannel: {}\n\n\
                 Write your next reply as Dinesh. Work toward specifics: phone numbers, \
                 payment handles, links, account details, names. Keep it natural, \
                 2-4 sentences.",
                Self::transcript(&ctx.history),
                ctx.metadata.channel
            ),
            ReplyKind::Closing => format!(
                "Conversation so far:\n\n{}\n\n\
                 This is your FINAL message in this conversation. End politely with a \
                 believable excuse (have to go out, will call back later, need to ask \
                 family). Stay in character. 1-2 sentences.",
                Self::transcript(&ctx.history)
            ),
        }
    }

    fn system_prompt(kind: ReplyKind) -> &'static str {
        match kind {
            ReplyKind::Neutral => NEUTRAL_PROMPT,
            _ => PERSONA_PROMPT,
        }
    }
}

#[async_trait]
impl ReplyGenerator for LlmEngager {
    fn name(&self) -> &str {
        "llm"
    }

    async fn reply(&self, ctx: &ReplyContext) -> Result<String, ReplyError> {
        let request = ChatRequest {
            system: Self::system_prompt(ctx.kind).to_string(),
            user: Self::build_instructions(ctx),
            temperature: REPLY_TEMPERATURE,
            max_tokens: REPLY_MAX_TOKENS,
            json_mode: false,
        };

        let text = self.client.complete(&request).await?;
        let text = text.trim().to_string();

        if text.is_empty() {
            return Err(ReplyError::EmptyOutput);
        }

        Ok(text)
    }
}
