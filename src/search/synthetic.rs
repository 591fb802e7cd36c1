// src/search/synthetic.rs
//! Deterministic demo listings for when live extraction yields nothing.
//!
//! Output depends only on `(keywords, location, requirements, max_jobs)`, so the
//! same request always produces the same jobs.

use async_trait::async_trait;
use tracing::info;

use super::{matcher, SearchStrategy};
use crate::types::{JobListing, JobSource, SearchRequest};

/// Upper bound on how many listings one request can synthesize
pub const SYNTHETIC_JOB_CAP: usize = 20;

const SYNTHETIC_URL_BASE: u64 = 3_000_000_000;

const COMPANIES: &[&str] = &[
    "Google", "Microsoft", "Amazon", "Apple", "Meta", "Netflix", "Tesla", "Spotify", "Airbnb",
    "Uber", "LinkedIn", "Twitter", "Adobe", "Salesforce", "Oracle", "IBM", "Intel", "NVIDIA",
    "Dropbox", "Slack", "Stripe", "Square", "Palantir", "Databricks", "Snowflake", "MongoDB",
    "Redis", "Elastic",
];

const TIER_ONE_COMPANIES: &[&str] = &["Google", "Meta", "Apple"];

const LOCATIONS: &[&str] = &[
    "San Francisco, CA",
    "New York, NY",
    "Seattle, WA",
    "Austin, TX",
    "Boston, MA",
    "Remote",
    "Los Angeles, CA",
    "Chicago, IL",
    "Denver, CO",
    "Atlanta, GA",
    "Portland, OR",
    "Miami, FL",
];

const TITLE_BUCKETS: &[(&str, &[&str])] = &[
    (
        "python",
        &[
            "Python Developer",
            "Senior Python Engineer",
            "Python Software Engineer",
            "Backend Python Developer",
        ],
    ),
    (
        "ml",
        &[
            "ML Engineer",
            "Machine Learning Engineer",
            "Senior ML Engineer",
            "AI/ML Engineer",
        ],
    ),
    (
        "data",
        &[
            "Data Scientist",
            "Senior Data Analyst",
            "Data Engineer",
            "Principal Data Scientist",
        ],
    ),
    (
        "frontend",
        &[
            "Frontend Developer",
            "React Developer",
            "UI/UX Engineer",
            "Senior Frontend Engineer",
        ],
    ),
    (
        "backend",
        &[
            "Backend Engineer",
            "API Developer",
            "Server-Side Engineer",
            "Backend Architect",
        ],
    ),
    (
        "fullstack",
        &[
            "Full Stack Developer",
            "Full Stack Engineer",
            "Senior Full Stack Developer",
        ],
    ),
    (
        "devops",
        &[
            "DevOps Engineer",
            "Site Reliability Engineer",
            "Cloud Engineer",
            "Infrastructure Engineer",
        ],
    ),
];

#[derive(Debug, Clone, Default)]
pub struct SyntheticJobGenerator;

impl SyntheticJobGenerator {
    pub fn new() -> Self {
        Self
    }

    /// Title variants for `keywords`, from every bucket whose key it contains
    pub fn title_variants(keywords: &str) -> Vec<String> {
        let lowered = keywords.to_lowercase();
        let titles: Vec<String> = TITLE_BUCKETS
            .iter()
            .filter(|(key, _)| lowered.contains(key))
            .flat_map(|(_, titles)| titles.iter().map(|t| t.to_string()))
            .collect();

        if !titles.is_empty() {
            return titles;
        }

        let keywords = keywords.trim();
        vec![
            keywords.to_string(),
            format!("Senior {}", keywords),
            format!("{} Engineer", keywords),
            format!("{} Specialist", keywords),
        ]
    }

    /// Requirements mentioned by listing `index`: the first two always, the
    /// next two only on some rotations.
    fn mentioned_requirements(index: usize, requirements: &[String]) -> Vec<&str> {
        requirements
            .iter()
            .take(4)
            .enumerate()
            .filter(|(j, _)| *j < 2 || (index + j) % 3 == 0)
            .map(|(_, req)| req.as_str())
            .collect()
    }

    fn description(index: usize, company: &str, title: &str, skills: &str) -> String {
        match index % 4 {
            0 => format!(
                "Join {company} as a {title}! We're seeking someone with expertise in {skills}. \
                 You'll work on cutting-edge projects and collaborate with world-class engineers."
            ),
            1 => format!(
                "Exciting opportunity at {company}! Looking for a {title} with strong background \
                 in {skills}. Competitive salary, great benefits, and innovative work environment."
            ),
            2 => format!(
                "{company} is hiring a {title}! Must have experience with {skills}. Work on \
                 high-impact projects that reach millions of users worldwide."
            ),
            _ => format!(
                "We're looking for a talented {title} to join our {company} team. Key \
                 requirements include {skills} and passion for building scalable solutions."
            ),
        }
    }

    fn salary_range(index: usize, title: &str, company: &str) -> String {
        let mut base = 90 + index * 8;
        if title.contains("Senior") {
            base += 20;
        }
        if TIER_ONE_COMPANIES.contains(&company) {
            base += 30;
        }
        format!("${}k - ${}k", base, base + 40)
    }

    pub fn generate(&self, request: &SearchRequest) -> Vec<JobListing> {
        let requirements = request.effective_requirements();
        let titles = Self::title_variants(&request.keywords);
        let location = request.location.trim();
        let count = request.max_jobs.min(SYNTHETIC_JOB_CAP);

        let jobs: Vec<JobListing> = (0..count)
            .map(|i| {
                let company = COMPANIES[i % COMPANIES.len()];
                let job_location = if location.is_empty() {
                    LOCATIONS[i % LOCATIONS.len()]
                } else {
                    location
                };
                let title = &titles[i % titles.len()];

                let mentioned = Self::mentioned_requirements(i, &requirements);
                let skills = if mentioned.is_empty() {
                    "relevant technical skills".to_string()
                } else {
                    mentioned.join(", ")
                };

                let mut job = JobListing::new(
                    title.clone(),
                    company,
                    job_location,
                    Self::description(i, company, title, &skills),
                    format!(
                        "https://www.linkedin.com/jobs/view/{}",
                        SYNTHETIC_URL_BASE + i as u64
                    ),
                    JobSource::Synthetic,
                )
                .with_posted_date(Some(format!("{} days ago", (i % 14) + 1)))
                .with_salary_range(Some(Self::salary_range(i, title, company)));

                let result = matcher::match_job(&job, &requirements);
                job.apply_match(result);
                job
            })
            .collect();

        info!(
            "Generated {} sample jobs for '{}' (fallback mode)",
            jobs.len(),
            request.keywords
        );
        jobs
    }
}

#[async_trait]
impl SearchStrategy for SyntheticJobGenerator {
    fn name(&self) -> &'static str {
        "synthetic"
    }

    async fn attempt(&self, request: &SearchRequest) -> Option<Vec<JobListing>> {
        Some(self.generate(request))
    }
}
