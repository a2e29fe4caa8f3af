//! HTTP API handlers.
//!
//! Endpoints:
//!
//! - `POST /api/chat`           — Evaluate one inbound message, return the reply
//! - `GET  /api/sessions`       — List session summaries (monitoring)
//! - `GET  /api/sessions/{id}`  — Read-only projection of one session

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::Json,
};
use serde::{Deserialize, Serialize};
use tracing::info;

use mellivora_core::{ChannelMetadata, ExtractedIntelligence, Message, Phase, Sender, SessionId};

use crate::SharedState;

// ── Request / Response types ──────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct MessageDto {
    pub sender: Sender,
    pub text: String,
    pub timestamp: i64,
}

impl From<MessageDto> for Message {
    fn from(dto: MessageDto) -> Self {
        match dto.sender {
            Sender::Counterparty => Message::counterparty(dto.text, dto.timestamp),
            Sender::Agent => Message::agent(dto.text, dto.timestamp),
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatRequest {
    pub session_id: String,

    pub message: MessageDto,

    #[serde(default)]
    pub conversation_history: Vec<MessageDto>,

    pub metadata: ChannelMetadata,
}

#[derive(Serialize)]
pub struct ChatResponse {
    pub status: &'static str,
    pub reply: String,
}

#[derive(Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionSummaryDto {
    pub session_id: String,
    pub phase: Phase,
    pub message_count: usize,
    pub scam_detected: bool,
    pub report_sent: bool,
    pub created_at: String,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionDetailDto {
    pub session_id: String,
    pub phase: Phase,
    pub scam_detected: bool,
    pub agent_engaged: bool,
    pub scam_confidence: f32,
    pub scam_category: Option<String>,
    pub extracted_intelligence: ExtractedIntelligence,
    pub messages: Vec<SessionMessageDto>,
    pub report_sent: bool,
    pub created_at: String,
}

#[derive(Serialize)]
pub struct SessionMessageDto {
    pub sender: Sender,
    pub text: String,
    pub timestamp: i64,
}

#[derive(Serialize)]
pub struct SessionListResponse {
    pub sessions: Vec<SessionSummaryDto>,
    pub count: usize,
}

// ── Handlers ──────────────────────────────────────────────────────────────

/// `POST /api/chat` — the main honeypot endpoint.
///
/// Collaborator failures never surface here: the engine degrades them
/// internally and the caller always receives a successful reply.
pub async fn chat_handler(
    State(state): State<SharedState>,
    Json(payload): Json<ChatRequest>,
) -> Result<Json<ChatResponse>, (StatusCode, Json<ErrorResponse>)> {
    if payload.session_id.trim().is_empty() {
        return Err(bad_request("sessionId must not be empty"));
    }
    if payload.message.text.trim().is_empty() {
        return Err(bad_request("message.text must not be empty"));
    }

    info!(
        session_id = %payload.session_id,
        channel = %payload.metadata.channel,
        "Inbound message"
    );

    let session_id = SessionId::from(&payload.session_id);
    let history: Vec<Message> = payload
        .conversation_history
        .into_iter()
        .map(Message::from)
        .collect();

    let outcome = state
        .engine
        .handle_message(
            &session_id,
            payload.message.into(),
            &history,
            &payload.metadata,
        )
        .await;

    Ok(Json(ChatResponse {
        status: "success",
        reply: outcome.reply,
    }))
}

/// `GET /api/sessions` — session summaries for monitoring.
pub async fn list_sessions_handler(State(state): State<SharedState>) -> Json<SessionListResponse> {
    let sessions: Vec<SessionSummaryDto> = state
        .engine
        .store()
        .list()
        .await
        .iter()
        .map(|s| SessionSummaryDto {
            session_id: s.id.to_string(),
            phase: s.phase,
            message_count: s.total_messages(),
            scam_detected: s.scam_detected(),
            report_sent: s.report_sent,
            created_at: s.created_at.to_rfc3339(),
        })
        .collect();

    let count = sessions.len();
    Json(SessionListResponse { sessions, count })
}

/// `GET /api/sessions/{id}` — full read-only projection of one session.
pub async fn get_session_handler(
    State(state): State<SharedState>,
    Path(id): Path<String>,
) -> Result<Json<SessionDetailDto>, StatusCode> {
    let session = state
        .engine
        .store()
        .snapshot(&SessionId::from(&id))
        .await
        .ok_or(StatusCode::NOT_FOUND)?;

    Ok(Json(SessionDetailDto {
        session_id: session.id.to_string(),
        phase: session.phase,
        scam_detected: session.scam_detected(),
        agent_engaged: session.engaged_at.is_some(),
        scam_confidence: session.scam_confidence,
        scam_category: session.scam_category.clone(),
        extracted_intelligence: ExtractedIntelligence::from(&session.evidence),
        messages: session
            .messages
            .iter()
            .map(|m| SessionMessageDto {
                sender: m.sender,
                text: m.text.clone(),
                timestamp: m.timestamp,
            })
            .collect(),
        report_sent: session.report_sent,
        created_at: session.created_at.to_rfc3339(),
    }))
}

fn bad_request(message: &str) -> (StatusCode, Json<ErrorResponse>) {
    (
        StatusCode::BAD_REQUEST,
        Json(ErrorResponse {
            error: message.to_string(),
        }),
    )
}
