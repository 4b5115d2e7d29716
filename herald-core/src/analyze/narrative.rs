// Narrative synthesizer: turns a change-set description and diff into
// release prose via an LLM, structured into sections or as one summary.

use tracing::{info, instrument, warn};

use crate::config::NarrativeMode;
use crate::llm::{CostTracker, LlmProvider};
use crate::types::{Narrative, NarrativeSections, OVERVIEW_PLACEHOLDER};

use super::sections::extract_sections;

pub const OVERVIEW_MARKER: &str = "Overview";
pub const HIGHLIGHTS_MARKER: &str = "🎯 Highlights";
pub const ARCHITECTURE_MARKER: &str = "🏗️ Architecture Changes";
pub const DIFF_ANALYSIS_MARKER: &str = "🔍 Code Diff Analysis";
pub const TESTS_MARKER: &str = "🧪 Tests";

/// Section markers in the order the model is asked to emit them.
pub const SECTION_MARKERS: [&str; 5] = [
    OVERVIEW_MARKER,
    HIGHLIGHTS_MARKER,
    ARCHITECTURE_MARKER,
    DIFF_ANALYSIS_MARKER,
    TESTS_MARKER,
];

pub const STRUCTURED_SYSTEM_PROMPT: &str = "You are an expert release notes generator. \
Based on the provided PR summary and code diff, generate detailed release notes structured as follows:

- \"Overview\" (concise summary of the release)
- \"🎯 Highlights\" (list of significant highlights)
- \"🏗️ Architecture Changes\" (technical changes to the system architecture)
- \"🔍 Code Diff Analysis\" (specific code changes, optimizations)
- \"🧪 Tests\" (any updates or changes in testing)

Start each section with a markdown header (###) containing exactly the section name above. \
If a section is not relevant, write \"No information available.\"";

pub const FREEFORM_SYSTEM_PROMPT: &str = "You are an expert release notes generator. \
Based on the provided code diff, write one concise, human-readable paragraph summarizing \
the main changes for a release note. Do not use headers or bullet lists.";

const NO_SUMMARY: &str = "No summary provided.";

/// Single user payload carrying both the PR description and the diff.
pub fn structured_payload(body: Option<&str>, diff: &str) -> String {
    let body = body.filter(|b| !b.trim().is_empty()).unwrap_or(NO_SUMMARY);
    format!("PR Summary:\n\n{body}\n\nCode Diff:\n\n{diff}")
}

/// Freeform mode sends only the diff.
pub fn freeform_payload(diff: &str) -> String {
    format!("Code Diff:\n\n{diff}")
}

/// Map a raw model response onto the five narrative fields. Fields whose
/// marker is absent take their placeholder.
pub fn parse_sections(response: &str) -> NarrativeSections {
    let mut found = extract_sections(response, &SECTION_MARKERS);
    let defaults = NarrativeSections::default();
    let mut take = |marker: &str, default: String| found.remove(marker).unwrap_or(default);

    NarrativeSections {
        overview: take(OVERVIEW_MARKER, defaults.overview),
        highlights: take(HIGHLIGHTS_MARKER, defaults.highlights),
        architecture_changes: take(ARCHITECTURE_MARKER, defaults.architecture_changes),
        diff_analysis: take(DIFF_ANALYSIS_MARKER, defaults.diff_analysis),
        testing: take(TESTS_MARKER, defaults.testing),
    }
}

/// Drop a surrounding ```` ```markdown ```` fence some models wrap output in.
pub fn strip_markdown_fence(text: &str) -> &str {
    let trimmed = text.trim();
    let inner = trimmed
        .strip_prefix("```markdown")
        .or_else(|| trimmed.strip_prefix("```md"))
        .unwrap_or(trimmed);
    inner.strip_suffix("```").unwrap_or(inner).trim()
}

/// Generates release prose, recording token usage as it goes.
#[derive(Debug)]
pub struct NarrativeSynthesizer<'a> {
    provider: &'a dyn LlmProvider,
}

impl<'a> NarrativeSynthesizer<'a> {
    pub fn new(provider: &'a dyn LlmProvider) -> Self {
        Self { provider }
    }

    /// Generate prose in the given mode. Never fails; see the mode methods.
    pub async fn synthesize(
        &self,
        mode: NarrativeMode,
        body: Option<&str>,
        diff: &str,
        costs: &mut CostTracker,
    ) -> Narrative {
        match mode {
            NarrativeMode::Structured => {
                Narrative::Structured(self.structured(body, diff, costs).await)
            }
            NarrativeMode::Freeform => Narrative::Freeform(self.freeform(diff, costs).await),
        }
    }

    /// Five-section narrative. Any generation failure yields the placeholder set.
    #[instrument(skip_all, name = "narrative_structured")]
    pub async fn structured(
        &self,
        body: Option<&str>,
        diff: &str,
        costs: &mut CostTracker,
    ) -> NarrativeSections {
        let payload = structured_payload(body, diff);
        match self.provider.complete(STRUCTURED_SYSTEM_PROMPT, &payload).await {
            Ok((text, usage)) => {
                costs.record_call(
                    &usage,
                    self.provider.cost_per_1k_input(),
                    self.provider.cost_per_1k_output(),
                );
                info!(
                    model = self.provider.model_id(),
                    output_tokens = usage.output_tokens,
                    "Structured narrative generated"
                );
                parse_sections(&text)
            }
            Err(e) => {
                costs.record_failure();
                warn!(error = %e, "Narrative generation failed, using placeholders");
                NarrativeSections::default()
            }
        }
    }

    /// One-paragraph summary of the diff. Failure yields a fixed placeholder.
    #[instrument(skip_all, name = "narrative_freeform")]
    pub async fn freeform(&self, diff: &str, costs: &mut CostTracker) -> String {
        let payload = freeform_payload(diff);
        match self.provider.complete(FREEFORM_SYSTEM_PROMPT, &payload).await {
            Ok((text, usage)) => {
                costs.record_call(
                    &usage,
                    self.provider.cost_per_1k_input(),
                    self.provider.cost_per_1k_output(),
                );
                info!(
                    model = self.provider.model_id(),
                    output_tokens = usage.output_tokens,
                    "Freeform narrative generated"
                );
                let summary = strip_markdown_fence(&text);
                if summary.is_empty() {
                    OVERVIEW_PLACEHOLDER.to_string()
                } else {
                    summary.to_string()
                }
            }
            Err(e) => {
                costs.record_failure();
                warn!(error = %e, "Narrative generation failed, using placeholder");
                OVERVIEW_PLACEHOLDER.to_string()
            }
        }
    }
}
