//! Syntactic candidate filtering of extracted model output.
//!
//! The default rule is deliberately loose: a line is a candidate if it
//! contains `http`. The reachability probe does the real validation.

/// Decides whether a line of model output is worth probing.
pub trait CandidateFilter: Send + Sync {
    fn accepts(&self, line: &str) -> bool;
}

/// Accepts any line containing the substring `http`.
#[derive(Debug, Clone, Copy, Default)]
pub struct ContainsHttp;

impl CandidateFilter for ContainsHttp {
    fn accepts(&self, line: &str) -> bool {
        line.contains("http")
    }
}

/// Split `text` into trimmed lines and keep those `filter` accepts, in order.
pub fn extract_candidates(text: &str, filter: &dyn CandidateFilter) -> Vec<String> {
    text.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && filter.accepts(line))
        .map(String::from)
        .collect()
}
