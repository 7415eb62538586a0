//! Pure normalization helpers for plans, queries and source URLs

use factcheck_sdk::VerificationCheck;
use std::collections::HashSet;
use url::{form_urlencoded, Url};

/// Turn an arbitrary label into an identifier-safe slug
///
/// Lowercases, collapses every run of characters outside `[a-z0-9_]` into a
/// single `_`, and trims `_` from both ends. Falls back to
/// `check_{fallback_index}` when nothing is left.
pub fn sanitize_identifier(raw: &str, fallback_index: usize) -> String {
    let lowered = raw.trim().to_lowercase();
    let mut cleaned = String::with_capacity(lowered.len());
    let mut in_run = false;

    for ch in lowered.chars() {
        if ch.is_ascii_lowercase() || ch.is_ascii_digit() || ch == '_' {
            cleaned.push(ch);
            in_run = false;
        } else if !in_run {
            cleaned.push('_');
            in_run = true;
        }
    }

    let trimmed = cleaned.trim_matches('_');
    if trimmed.is_empty() {
        format!("check_{}", fallback_index)
    } else {
        trimmed.to_string()
    }
}

/// Merge `queries` and `fallback` into a trimmed, deduplicated, bounded list
///
/// Deduplication is case-insensitive and the first spelling wins. The result
/// holds at most `max(1, max_queries)` entries.
pub fn normalize_query_list<S, F>(queries: &[S], fallback: &[F], max_queries: usize) -> Vec<String>
where
    S: AsRef<str>,
    F: AsRef<str>,
{
    let limit = max_queries.max(1);
    let mut normalized = Vec::new();
    let mut seen = HashSet::new();

    let candidates = queries
        .iter()
        .map(AsRef::as_ref)
        .chain(fallback.iter().map(AsRef::as_ref));

    for candidate in candidates {
        let query = candidate.trim();
        if query.is_empty() {
            continue;
        }
        if !seen.insert(query.to_lowercase()) {
            continue;
        }
        normalized.push(query.to_string());
        if normalized.len() >= limit {
            break;
        }
    }

    normalized
}

/// Normalize raw planner checks into a schema-valid, bounded list
///
/// Checks with a blank question are skipped. Aspect ids are sanitized and made
/// unique within the plan by appending `_2`, `_3`, ... on collision. Search
/// queries fall back to the question and the claim. Processing stops once
/// `max(1, max_checks)` checks have been produced.
///
/// An empty result is possible; callers substitute their own fallback check.
pub fn normalize_plan_checks(
    claim: &str,
    checks: &[VerificationCheck],
    max_checks: usize,
    max_queries_per_check: usize,
) -> Vec<VerificationCheck> {
    let limit = max_checks.max(1);
    let mut normalized = Vec::new();
    let mut used_ids: HashSet<String> = HashSet::new();

    for (index, check) in checks.iter().enumerate() {
        let question = check.question.trim();
        if question.is_empty() {
            continue;
        }

        let base_id = sanitize_identifier(&check.aspect_id, index + 1);
        let mut aspect_id = base_id.clone();
        let mut suffix = 2;
        while used_ids.contains(&aspect_id) {
            aspect_id = format!("{}_{}", base_id, suffix);
            suffix += 1;
        }
        used_ids.insert(aspect_id.clone());

        normalized.push(VerificationCheck {
            aspect_id,
            question: question.to_string(),
            rationale: check.rationale.trim().to_string(),
            search_queries: normalize_query_list(
                &check.search_queries,
                &[question, claim],
                max_queries_per_check,
            ),
        });

        if normalized.len() >= limit {
            break;
        }
    }

    normalized
}

/// Canonical form of a source URL, for deduplication only
///
/// Lowercases scheme and host, strips trailing slashes from the path, drops
/// `utm_*` query parameters and the fragment. Unparsable input falls back to
/// the lowercased, trimmed string.
pub fn normalize_source_url(url: &str) -> String {
    let stripped = url.trim();
    if stripped.is_empty() {
        return String::new();
    }

    let parsed = match Url::parse(stripped) {
        Ok(parsed) => parsed,
        Err(_) => return stripped.to_lowercase(),
    };

    let mut key = format!("{}:", parsed.scheme().to_lowercase());
    if parsed.has_authority() {
        key.push_str("//");
        if !parsed.username().is_empty() {
            key.push_str(parsed.username());
            if let Some(password) = parsed.password() {
                key.push(':');
                key.push_str(password);
            }
            key.push('@');
        }
        if let Some(host) = parsed.host_str() {
            key.push_str(&host.to_lowercase());
        }
        if let Some(port) = parsed.port() {
            key.push_str(&format!(":{}", port));
        }
    }
    key.push_str(parsed.path().trim_end_matches('/'));

    let kept: Vec<(String, String)> = parsed
        .query_pairs()
        .filter(|(name, _)| !name.to_lowercase().starts_with("utm_"))
        .map(|(name, value)| (name.into_owned(), value.into_owned()))
        .collect();
    if !kept.is_empty() {
        let query = form_urlencoded::Serializer::new(String::new())
            .extend_pairs(kept)
            .finish();
        key.push('?');
        key.push_str(&query);
    }

    key
}
