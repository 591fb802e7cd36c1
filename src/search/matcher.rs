// src/search/matcher.rs
use crate::types::{JobListing, MatchResult};

/// Share of requirements a job must mention to count as a match
pub const MATCH_THRESHOLD: f64 = 0.5;

/// Score `job_text` against `requirements` by case-insensitive containment.
///
/// An empty requirement set means "no filtering" and scores 1.0.
pub fn match_requirements<S: AsRef<str>>(job_text: &str, requirements: &[S]) -> MatchResult {
    let requirements: Vec<&str> = requirements
        .iter()
        .map(|r| r.as_ref().trim())
        .filter(|r| !r.is_empty())
        .collect();

    if requirements.is_empty() {
        return MatchResult {
            matches: Vec::new(),
            match_score: 1.0,
            is_match: true,
        };
    }

    let haystack = job_text.to_lowercase();
    let matches: Vec<String> = requirements
        .iter()
        .filter(|req| haystack.contains(&req.to_lowercase()))
        .map(|req| req.to_string())
        .collect();

    let match_score = matches.len() as f64 / requirements.len() as f64;

    MatchResult {
        matches,
        match_score,
        is_match: match_score >= MATCH_THRESHOLD,
    }
}

/// Run the matcher over a listing's title and description
pub fn match_job<S: AsRef<str>>(job: &JobListing, requirements: &[S]) -> MatchResult {
    match_requirements(&job.match_text(), requirements)
}
