//! Pattern backend.
//!
//! Compiles authored pattern strings into anchored regexes and answers
//! "which registered keys match this input". A pattern is a sequence of
//! whitespace-separated tokens; the `*` token matches any (possibly empty)
//! span of words, and a `*` embedded in a token matches any span of
//! characters. Everything else is matched literally, with whitespace runs
//! in the input tolerated between tokens. The entire input must be covered
//! by the pattern; partial-coverage matching is expressed with leading or
//! trailing wildcards, never implicitly.

use regex::Regex;

/// One compiled pattern.
#[derive(Debug, Clone)]
pub(crate) struct CompiledPattern {
    regex: Regex,
    wildcard: bool,
}

impl CompiledPattern {
    /// Returns true if the source pattern contained a wildcard token.
    pub fn has_wildcard(&self) -> bool {
        self.wildcard
    }

    /// Returns true if the pattern accounts for the whole of `input`.
    pub fn matches(&self, input: &str) -> bool {
        self.regex.is_match(input)
    }
}

/// Compiles one pattern string.
///
/// Fails on blank patterns and on regex assembly errors; the caller reports
/// the failure as a per-rule configuration error and skips the entry.
pub(crate) fn compile_pattern(pattern: &str) -> Result<CompiledPattern, String> {
    let tokens: Vec<&str> = pattern.split_whitespace().collect();
    if tokens.is_empty() {
        return Err("empty pattern".to_string());
    }

    // Consecutive bare wildcards are equivalent to one.
    let mut collapsed: Vec<&str> = Vec::with_capacity(tokens.len());
    for t in tokens {
        if t == "*" && collapsed.last() == Some(&"*") {
            continue;
        }
        collapsed.push(t);
    }

    let last = collapsed.len() - 1;
    let mut wildcard = false;
    let mut source = String::from("^");

    for (i, token) in collapsed.iter().enumerate() {
        if *token == "*" {
            wildcard = true;
            match (i == 0, i == last) {
                (true, true) => source.push_str(".*"),
                (true, false) => source.push_str(r"(?:.*\s+)?"),
                (false, true) => source.push_str(r"(?:\s+.*)?"),
                (false, false) => source.push_str(r"\s+(?:.*\s+)?"),
            }
        } else {
            if i > 0 && collapsed[i - 1] != "*" {
                source.push_str(r"\s+");
            }
            if token.contains('*') {
                wildcard = true;
            }
            let escaped: Vec<String> = token.split('*').map(|p| regex::escape(p)).collect();
            source.push_str(&escaped.join(".*"));
        }
    }
    source.push('$');

    let regex = Regex::new(&source).map_err(|e| format!("invalid pattern '{pattern}': {e}"))?;
    Ok(CompiledPattern { regex, wildcard })
}

/// A set of compiled patterns keyed by opaque backend keys.
///
/// Keys are returned in registration order, which follows rule authoring
/// order, so queries over an unchanged set are deterministic.
#[derive(Debug, Default)]
pub(crate) struct PatternSet {
    entries: Vec<(u64, CompiledPattern)>,
}

impl PatternSet {
    pub fn insert(&mut self, key: u64, pattern: CompiledPattern) {
        self.entries.push((key, pattern));
    }

    /// Returns the keys of all patterns matching the full input.
    pub fn matching_keys(&self, input: &str) -> Vec<u64> {
        self.entries
            .iter()
            .filter(|(_, p)| p.matches(input))
            .map(|(k, _)| *k)
            .collect()
    }
}
