//! LLM collaborator implementations for Mellivora.
//!
//! Both collaborators — the scam classifier and the persona reply
//! generator — talk to the same OpenAI-compatible chat endpoint (Groq by
//! default; any `/chat/completions`-shaped service works). The engine
//! only sees the `ScamClassifier` and `ReplyGenerator` traits, so these
//! can be swapped for scripted fakes in tests.

pub mod classifier;
pub mod client;
pub mod engager;
pub mod json;

pub use classifier::LlmClassifier;
pub use client::{ChatClient, ChatError, ChatRequest};
pub use engager::LlmEngager;
