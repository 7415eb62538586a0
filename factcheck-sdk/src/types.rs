//! Data model shared by the pipeline and its collaborators
//!
//! Every type here crosses a capability boundary at some point, so all of them
//! serialize with serde. List and optional fields default when absent so that
//! loosely-shaped model output still deserializes.

use serde::{Deserialize, Serialize};
use std::fmt;
use url::Url;

// ============================================================================
// Verdicts and Signals
// ============================================================================

/// Final categorical judgment about a whole claim
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum VeracityVerdict {
    #[serde(rename = "Supported")]
    Supported,
    #[serde(rename = "Refuted")]
    Refuted,
    #[serde(rename = "Not Enough Evidence")]
    NotEnoughEvidence,
    #[serde(rename = "Conflicting Evidence/Cherrypicking")]
    Conflicting,
}

impl VeracityVerdict {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Supported => "Supported",
            Self::Refuted => "Refuted",
            Self::NotEnoughEvidence => "Not Enough Evidence",
            Self::Conflicting => "Conflicting Evidence/Cherrypicking",
        }
    }
}

impl fmt::Display for VeracityVerdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What the collected evidence says about one aspect of a claim
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EvidenceSignal {
    Supports,
    Refutes,
    Mixed,
    Insufficient,
}

impl EvidenceSignal {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Supports => "supports",
            Self::Refutes => "refutes",
            Self::Mixed => "mixed",
            Self::Insufficient => "insufficient",
        }
    }
}

impl fmt::Display for EvidenceSignal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ============================================================================
// Evidence
// ============================================================================

/// A single cited source
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SourceEvidence {
    /// Human-readable title of the source
    pub title: String,

    /// URL used during fact-checking
    pub url: String,

    /// Short text span from the source backing the finding
    #[serde(default)]
    pub snippet: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub publisher: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub published_at: Option<String>,
}

impl SourceEvidence {
    pub fn new(
        title: impl Into<String>,
        url: impl Into<String>,
        snippet: impl Into<String>,
    ) -> Self {
        Self {
            title: title.into(),
            url: url.into(),
            snippet: snippet.into(),
            publisher: None,
            published_at: None,
        }
    }

    /// True when `url` is syntactically an absolute http or https URL
    pub fn has_web_url(&self) -> bool {
        Url::parse(self.url.trim())
            .map(|u| {
                matches!(u.scheme(), "http" | "https")
                    && u.host_str().is_some_and(|h| !h.is_empty())
            })
            .unwrap_or(false)
    }
}

// ============================================================================
// Plans
// ============================================================================

/// One independently verifiable aspect of a claim
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VerificationCheck {
    /// Stable check identifier, e.g. `timeline_1`
    #[serde(default)]
    pub aspect_id: String,

    /// Precise verification question for one claim aspect
    #[serde(default)]
    pub question: String,

    /// Why this question matters for claim validation
    #[serde(default)]
    pub rationale: String,

    /// Targeted web queries for the investigator
    #[serde(default)]
    pub search_queries: Vec<String>,
}

impl VerificationCheck {
    pub fn new(aspect_id: impl Into<String>, question: impl Into<String>) -> Self {
        Self {
            aspect_id: aspect_id.into(),
            question: question.into(),
            rationale: String::new(),
            search_queries: Vec::new(),
        }
    }

    pub fn with_rationale(mut self, rationale: impl Into<String>) -> Self {
        self.rationale = rationale.into();
        self
    }

    pub fn with_queries<I, S>(mut self, queries: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.search_queries = queries.into_iter().map(Into::into).collect();
        self
    }
}

/// The claim decomposed into ordered checks
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InvestigationPlan {
    #[serde(default)]
    pub claim: String,

    #[serde(default)]
    pub checks: Vec<VerificationCheck>,

    #[serde(default)]
    pub assumptions: Vec<String>,
}

impl InvestigationPlan {
    pub fn new(claim: impl Into<String>, checks: Vec<VerificationCheck>) -> Self {
        Self {
            claim: claim.into(),
            checks,
            assumptions: Vec::new(),
        }
    }
}

// ============================================================================
// Findings and Reports
// ============================================================================

/// Result of investigating one check
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AspectFinding {
    #[serde(default)]
    pub aspect_id: String,

    #[serde(default)]
    pub question: String,

    pub signal: EvidenceSignal,

    /// What the collected evidence says for this aspect
    #[serde(default)]
    pub summary: String,

    /// 0 to 1 confidence score for this aspect
    #[serde(default)]
    pub confidence: f64,

    #[serde(default)]
    pub sources: Vec<SourceEvidence>,

    #[serde(default)]
    pub caveats: Vec<String>,
}

impl AspectFinding {
    pub fn new(
        aspect_id: impl Into<String>,
        question: impl Into<String>,
        signal: EvidenceSignal,
        summary: impl Into<String>,
        confidence: f64,
    ) -> Self {
        Self {
            aspect_id: aspect_id.into(),
            question: question.into(),
            signal,
            summary: summary.into(),
            confidence,
            sources: Vec::new(),
            caveats: Vec::new(),
        }
    }

    pub fn with_sources(mut self, sources: Vec<SourceEvidence>) -> Self {
        self.sources = sources;
        self
    }
}

/// Terminal artifact of a fact-check run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FactCheckReport {
    #[serde(default)]
    pub claim: String,

    pub verdict: VeracityVerdict,

    /// 0 to 1 confidence in the final verdict
    #[serde(default)]
    pub verdict_confidence: f64,

    /// Tight synthesis of why the verdict is assigned
    #[serde(default)]
    pub justification: String,

    #[serde(default)]
    pub key_points: Vec<String>,

    #[serde(default)]
    pub findings: Vec<AspectFinding>,

    #[serde(default)]
    pub sources: Vec<SourceEvidence>,
}

// ============================================================================
// Claim Extraction
// ============================================================================

/// A decontextualized, atomic claim pulled out of free text
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CheckworthyClaim {
    #[serde(default)]
    pub claim_id: String,

    pub claim_text: String,

    /// Span of the input the claim was taken from
    #[serde(default)]
    pub source_fragment: String,

    #[serde(default)]
    pub checkworthy_reason: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClaimExtractionResult {
    #[serde(default)]
    pub input_text: String,

    #[serde(default)]
    pub claims: Vec<CheckworthyClaim>,
}

// ============================================================================
// Search
// ============================================================================

/// One web search hit
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchHit {
    #[serde(default)]
    pub title: String,

    #[serde(default)]
    pub url: String,

    #[serde(default)]
    pub description: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub age: Option<String>,

    #[serde(default)]
    pub extra_snippets: Vec<String>,
}

/// Results for one query, as handed to a researcher
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchResults {
    pub provider: String,
    pub query: String,
    pub result_count: usize,

    #[serde(default)]
    pub results: Vec<SearchHit>,

    /// Set when the query failed; `results` is then empty
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl SearchResults {
    pub fn failed(
        provider: impl Into<String>,
        query: impl Into<String>,
        error: impl Into<String>,
    ) -> Self {
        Self {
            provider: provider.into(),
            query: query.into(),
            result_count: 0,
            results: Vec::new(),
            error: Some(error.into()),
        }
    }
}
