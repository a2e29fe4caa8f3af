//! # Mellivora Engine
//!
//! The session lifecycle and intelligence aggregation engine — the only
//! part of the system with real state and sequencing logic. On every
//! inbound message it decides what phase the conversation is in, whether
//! to classify, whether to keep the persona engaged, whether enough
//! evidence has accumulated to conclude, and what the final report
//! contains.
//!
//! Everything with I/O sits behind the collaborator traits defined in
//! `mellivora-core`; the engine itself is deterministic given scripted
//! collaborators, which is how its tests drive it.

pub mod extract;
pub mod machine;
pub mod report;
pub mod store;

pub use extract::Extractor;
pub use machine::{EngineReply, HoneypotEngine};
pub use report::build_report;
pub use store::SessionStore;
