//! Narrative synthesis: model prompts, section extraction, fallbacks.

pub mod narrative;
pub mod sections;

pub use narrative::NarrativeSynthesizer;
pub use sections::extract_sections;
