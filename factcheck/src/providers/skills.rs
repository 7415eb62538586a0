//! Built-in skills: one named prompt per capability

use anyhow::{anyhow, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Skill {
    pub name: &'static str,
    pub description: &'static str,
    pub prompt: &'static str,
    pub uses_web_search: bool,
}

pub const PLAN: Skill = Skill {
    name: "plan",
    description: "Decompose claim into independent, parallelizable verification checks.",
    prompt: PLAN_PROMPT,
    uses_web_search: false,
};

pub const RESEARCH: Skill = Skill {
    name: "research",
    description: "Investigate one check with web search results and evidence extraction.",
    prompt: RESEARCH_PROMPT,
    uses_web_search: true,
};

pub const JUDGE: Skill = Skill {
    name: "judge",
    description: "Synthesize findings into a final veracity verdict with justification.",
    prompt: JUDGE_PROMPT,
    uses_web_search: false,
};

pub const EXTRACT_CLAIMS: Skill = Skill {
    name: "extract_claims",
    description: "Extract decontextualized atomic check-worthy claims from arbitrary text.",
    prompt: EXTRACT_CLAIMS_PROMPT,
    uses_web_search: false,
};

pub const ALL: [Skill; 4] = [PLAN, RESEARCH, JUDGE, EXTRACT_CLAIMS];

pub fn list_skills() -> &'static [Skill] {
    &ALL
}

pub fn find_skill(name: &str) -> Result<&'static Skill> {
    ALL.iter()
        .find(|skill| skill.name == name)
        .ok_or_else(|| anyhow!("Unknown skill: {}", name))
}

const PLAN_PROMPT: &str = r#"You are the planning step of a fact-checking pipeline.

Break the claim into a small set of independent verification checks. Each check
covers exactly one verifiable aspect (who, what, when, where, how many) and can
be researched without the results of any other check.

The payload holds:
- claim: the statement to verify
- max_checks: the maximum number of checks to return

Return a JSON object:
{
  "claim": "<the claim>",
  "checks": [
    {
      "aspect_id": "<short snake_case id, e.g. timeline_1>",
      "question": "<precise verification question>",
      "rationale": "<why this aspect matters for the claim>",
      "search_queries": ["<targeted web query>", "..."]
    }
  ],
  "assumptions": ["<interpretation you had to assume>"]
}

Rules:
- Never return more than max_checks checks.
- Prefer fewer, sharper checks over many overlapping ones.
- Give each check 2 to 4 search queries phrased the way a journalist would search.
- Do not answer the questions yourself."#;

const RESEARCH_PROMPT: &str = r#"You are the research step of a fact-checking pipeline.

Investigate exactly one verification check of a claim and report what the
evidence says about it.

The payload holds:
- claim: the full claim, for context only
- check: the aspect to investigate (aspect_id, question, rationale, search_queries)
- requirements: constraints such as min_sources
- search_results (optional): web search results gathered for this check

When search_results are present, base the finding on them and cite the pages
you relied on. When requirements.must_use_search_tool is true, run the web
search tool with the check's search_queries before answering and cite the
pages it returned.

Return a JSON object:
{
  "aspect_id": "<check.aspect_id>",
  "question": "<check.question>",
  "signal": "supports" | "refutes" | "mixed" | "insufficient",
  "summary": "<what the evidence says for this aspect>",
  "confidence": <number between 0 and 1>,
  "sources": [
    {"title": "...", "url": "https://...", "snippet": "<supporting span>", "publisher": "...", "published_at": "..."}
  ],
  "caveats": ["<limitation of the evidence>"]
}

Rules:
- Only cite http or https URLs.
- Try to cite at least requirements.min_sources independent sources.
- Use "insufficient" when the evidence does not settle the question.
- Never invent sources."#;

const JUDGE_PROMPT: &str = r#"You are the judging step of a fact-checking pipeline.

Weigh the findings for every check and assign one verdict to the whole claim.

The payload holds:
- claim: the statement being verified
- plan: the checks that were investigated
- findings: one finding per check, with signal, summary, confidence and sources

Verdicts:
- "Supported": the evidence backs every material aspect
- "Refuted": the evidence contradicts a material aspect
- "Not Enough Evidence": material aspects remain unverified
- "Conflicting Evidence/Cherrypicking": credible evidence points both ways, or
  the claim is technically true but misleading

Return a JSON object:
{
  "claim": "<the claim>",
  "verdict": "<one of the verdicts above>",
  "verdict_confidence": <number between 0 and 1>,
  "justification": "<tight synthesis of why the verdict is assigned>",
  "key_points": ["<decisive point>"],
  "findings": [],
  "sources": [{"title": "...", "url": "https://...", "snippet": "..."}]
}

Rules:
- Ground the verdict only in the findings provided.
- Cite the sources the verdict depends on most."#;

const EXTRACT_CLAIMS_PROMPT: &str = r#"You extract check-worthy claims from arbitrary text.

The payload holds:
- input_text: the text to analyze
- requirements: max_claims plus extraction constraints

A check-worthy claim is a factual statement a fact-checker could verify against
public evidence. Skip opinions, predictions and questions.

Return a JSON object:
{
  "input_text": "<the input text>",
  "claims": [
    {
      "claim_id": "claim_1",
      "claim_text": "<decontextualized, atomic claim>",
      "source_fragment": "<the span of input_text it came from>",
      "checkworthy_reason": "<why it is worth checking>"
    }
  ]
}

Rules:
- Decontextualize: resolve pronouns and implicit references so each claim
  stands on its own.
- Keep claims atomic: one verifiable fact per claim.
- Only extract facts the text directly states.
- Cover as many check-worthy facts as possible, up to max_claims."#;
