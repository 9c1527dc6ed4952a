//! Expansion of a (company, role) pair into diversified search queries.

/// Ordered query plan for one retrieval call. Higher-signal queries come
/// first: aggregation stops issuing queries once it has enough candidates.
pub fn query_plan(company: &str, role: &str) -> Vec<String> {
    vec![
        joined(&[company, role, "interview experience"]),
        joined(&[company, role, "interview process"]),
        joined(&["glassdoor", company, "interview questions"]),
        joined(&["reddit", company, "interview questions"]),
        joined(&["interview tips for", company]),
    ]
}

fn joined(parts: &[&str]) -> String {
    parts
        .iter()
        .map(|p| p.trim())
        .filter(|p| !p.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}
