//! Herald core library: source-control extraction, narrative synthesis,
//! report rendering, and idempotent publishing.
//!
//! The main entry point is [`pipeline::ReleasePipeline`], which runs the
//! Locate → Resolve → Aggregate → Narrate → Publish pipeline over a
//! [`extract::SourceControl`], a [`store::ReportStore`] and an
//! [`llm::LlmProvider`].

pub mod analyze;
pub mod config;
pub mod error;
pub mod extract;
mod http;
pub mod llm;
pub mod naming;
pub mod pipeline;
pub mod publish;
pub mod render;
pub mod store;
pub mod types;
