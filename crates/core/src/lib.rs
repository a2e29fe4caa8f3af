//! # Mellivora Core
//!
//! Domain types, traits, and error definitions for the Mellivora
//! conversational honeypot runtime. This crate has **zero framework
//! dependencies** — it defines the domain model that all other crates
//! implement against.
//!
//! ## Design Philosophy
//!
//! Every external collaborator (scam classification, persona reply
//! generation, report delivery) is defined as a trait here.
//! Implementations live in their respective crates. This enables:
//! - Swapping implementations via configuration
//! - Deterministic engine tests with scripted fakes
//! - Clean dependency graph (all crates depend inward on core)

pub mod classify;
pub mod engage;
pub mod error;
pub mod evidence;
pub mod message;
pub mod report;
pub mod session;

// Re-export key types at crate root for ergonomics
pub use classify::{ScamClassifier, Verdict};
pub use engage::{FALLBACK_REPLY, ReplyContext, ReplyGenerator, ReplyKind};
pub use error::{ClassifierError, Error, ReplyError, ReportError, Result};
pub use evidence::Evidence;
pub use message::{ChannelMetadata, Message, Sender, SessionId};
pub use report::{ExtractedIntelligence, FinalReport, ReportSink};
pub use session::{Phase, Session};
