// src/utils.rs
use regex::Regex;
use std::sync::LazyLock;

use crate::types::JobListing;

/// Collapse all whitespace runs to single spaces
pub fn clean_text(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Cap `text` at `max_chars` characters, `suffix` included
pub fn truncate_text(text: &str, max_chars: usize, suffix: &str) -> String {
    if text.chars().count() <= max_chars {
        return text.to_string();
    }
    let keep = max_chars.saturating_sub(suffix.chars().count());
    let mut truncated: String = text.chars().take(keep).collect();
    truncated.push_str(suffix);
    truncated
}

/// Split free-form requirement text on commas, semicolons and newlines
pub fn parse_job_requirements(text: &str) -> Vec<String> {
    text.split([',', ';', '\n'])
        .map(str::trim)
        .filter(|r| !r.is_empty())
        .map(str::to_string)
        .collect()
}

/// Google spreadsheet ids are 44 chars of `[A-Za-z0-9_-]`
pub fn validate_spreadsheet_id(spreadsheet_id: &str) -> bool {
    spreadsheet_id.len() == 44
        && spreadsheet_id
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
}

// Amount: a digit run with `,`/`.` separators, optional k/M magnitude
static SALARY_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"\$\s?\d(?:[\d,.]*\d)?[kKmM]?(?:\s*[-–]\s*\$?\s?\d(?:[\d,.]*\d)?[kKmM]?)?",
    )
    .expect("salary pattern compiles")
});

/// Pull the first dollar amount or range (`$120k - $160k`) out of free text
pub fn extract_salary(text: &str) -> Option<String> {
    SALARY_RE.find(text).map(|m| m.as_str().to_string())
}

/// Human-readable block for one listing, used by the CLI
pub fn format_job_for_display(job: &JobListing, include_description: bool) -> String {
    let mut lines = vec![format!("{} at {}", job.title, job.company)];

    if !job.location.is_empty() {
        lines.push(format!("  Location: {}", job.location));
    }
    if !job.job_url.is_empty() {
        lines.push(format!("  URL: {}", job.job_url));
    }
    if let Some(posted) = &job.posted_date {
        lines.push(format!("  Posted: {}", posted));
    }

    let details: Vec<&str> = [
        job.employment_type.as_deref(),
        job.experience_level.as_deref(),
        job.salary_range.as_deref(),
    ]
    .into_iter()
    .flatten()
    .collect();
    if !details.is_empty() {
        lines.push(format!("  {}", details.join(" | ")));
    }

    if job.is_synthetic() {
        lines.push(format!("  Source: {} (sample listing)", job.source.as_str()));
    }
    if let Some(score) = job.match_score {
        lines.push(format!("  Match score: {:.0}%", score * 100.0));
    }
    if !job.matches.is_empty() {
        lines.push(format!("  Matching requirements: {}", job.matches.join(", ")));
    }
    if include_description && !job.description.is_empty() {
        lines.push(format!("  {}", truncate_text(&job.description, 300, "...")));
    }

    lines.join("\n")
}

pub fn current_timestamp() -> String {
    chrono::Local::now().to_rfc3339()
}
