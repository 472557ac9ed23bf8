//! Action name normalization: kebab-case, snake_case and CamelCase must all
//! resolve to the same canonical action identifier.

use fuzzy_matcher::skim::SkimMatcherV2;
use fuzzy_matcher::FuzzyMatcher;

/// Canonicalize an action name to CamelCase, e.g. `describe-instances` and
/// `describe_instances` both become `DescribeInstances`. Already-CamelCase
/// input passes through unchanged.
pub fn canonical_action(raw: &str) -> String {
    if raw.is_empty() {
        return String::new();
    }
    let words = split_words(raw);
    words
        .iter()
        .map(|w| capitalize(w))
        .collect::<Vec<_>>()
        .join("")
}

fn split_words(raw: &str) -> Vec<String> {
    if raw.contains('-') || raw.contains('_') {
        raw.split(|c| c == '-' || c == '_')
            .filter(|s| !s.is_empty())
            .map(|s| s.to_lowercase())
            .collect()
    } else {
        // Already CamelCase (or a single lowercase word): split on
        // uppercase boundaries so re-joining is idempotent.
        let mut words = Vec::new();
        let mut current = String::new();
        for c in raw.chars() {
            if c.is_uppercase() && !current.is_empty() {
                words.push(std::mem::take(&mut current).to_lowercase());
            }
            current.push(c);
        }
        if !current.is_empty() {
            words.push(current.to_lowercase());
        }
        words
    }
}

fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().collect::<String>() + chars.as_str(),
        None => String::new(),
    }
}

/// Lowercase, trimmed service identifier.
pub fn canonical_service(raw: &str) -> String {
    raw.trim().to_lowercase()
}

/// Derive the entity name an operation is "about" by stripping a leading
/// `List`/`Describe`/`Get` verb and singularizing a trailing `s`/`es`, used
/// by the field-extractor's AWS-fallback heuristic (§4.D rule 4) and by the
/// resolver's candidate ranking (§4.E step 2a).
pub fn entity_name(operation: &str) -> String {
    let canonical = canonical_action(operation);
    let stripped = ["List", "Describe", "Get"]
        .iter()
        .find_map(|verb| canonical.strip_prefix(verb))
        .unwrap_or(canonical.as_str());
    singularize(stripped)
}

/// Derive the entity an unresolved *input field* refers to, e.g.
/// `clusterName` -> `cluster`, `UserName` -> `user`, `Names` -> `name`.
/// Used by the resolver's source-operation ranking heuristic (§4.E step 2a)
/// when no explicit `-i` source hint was given.
pub fn field_entity(field: &str) -> String {
    let canonical = canonical_action(field);
    let stripped = ["Name", "Id", "Arn"]
        .iter()
        .find_map(|suffix| canonical.strip_suffix(suffix))
        .unwrap_or(canonical.as_str());
    singularize(stripped).to_lowercase()
}

/// "Did you mean" suggestion for an unrecognized action or service name,
/// scored the same way the teacher's log-search fuzzy filter scores message
/// text: the highest-scoring candidate under `SkimMatcherV2`, or `None` if
/// nothing scores at all (an empty or totally unrelated input).
pub fn suggest_closest<'a, I>(candidates: I, input: &str) -> Option<String>
where
    I: IntoIterator<Item = &'a str>,
{
    let matcher = SkimMatcherV2::default();
    candidates
        .into_iter()
        .filter_map(|candidate| {
            matcher.fuzzy_match(candidate, input).map(|score| (score, candidate))
        })
        .max_by_key(|(score, _)| *score)
        .map(|(_, candidate)| candidate.to_string())
}

fn singularize(word: &str) -> String {
    if let Some(stem) = word.strip_suffix("ies") {
        format!("{stem}y")
    } else if word.ends_with("sses") || word.ends_with("xes") || word.ends_with("ches") {
        word[..word.len() - 2].to_string()
    } else if let Some(stem) = word.strip_suffix('s') {
        stem.to_string()
    } else {
        word.to_string()
    }
}
