// src/search/filters.rs
//! LinkedIn search filters and URL building

use serde::Serialize;

use crate::types::SearchRequest;

pub const LINKEDIN_ORIGIN: &str = "https://www.linkedin.com";
pub const JOB_SEARCH_URL: &str = "https://www.linkedin.com/jobs/search";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExperienceLevel {
    Internship,
    Entry,
    Associate,
    Mid,
    Director,
    Executive,
}

impl ExperienceLevel {
    const ALL: [ExperienceLevel; 6] = [
        ExperienceLevel::Internship,
        ExperienceLevel::Entry,
        ExperienceLevel::Associate,
        ExperienceLevel::Mid,
        ExperienceLevel::Director,
        ExperienceLevel::Executive,
    ];

    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_lowercase().as_str() {
            "internship" => Some(Self::Internship),
            "entry" => Some(Self::Entry),
            "associate" => Some(Self::Associate),
            "mid" => Some(Self::Mid),
            "director" => Some(Self::Director),
            "executive" => Some(Self::Executive),
            _ => None,
        }
    }

    pub fn value(&self) -> &'static str {
        match self {
            Self::Internship => "internship",
            Self::Entry => "entry",
            Self::Associate => "associate",
            Self::Mid => "mid",
            Self::Director => "director",
            Self::Executive => "executive",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::Internship => "Internship",
            Self::Entry => "Entry Level",
            Self::Associate => "Associate",
            Self::Mid => "Mid Level",
            Self::Director => "Director",
            Self::Executive => "Executive",
        }
    }

    /// `f_E` code
    pub fn code(&self) -> &'static str {
        match self {
            Self::Internship => "1",
            Self::Entry => "2",
            Self::Associate => "3",
            Self::Mid => "4",
            Self::Director => "5",
            Self::Executive => "6",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EmploymentType {
    FullTime,
    PartTime,
    Contract,
    Temporary,
    Internship,
}

impl EmploymentType {
    const ALL: [EmploymentType; 5] = [
        EmploymentType::FullTime,
        EmploymentType::PartTime,
        EmploymentType::Contract,
        EmploymentType::Temporary,
        EmploymentType::Internship,
    ];

    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_lowercase().as_str() {
            "full-time" => Some(Self::FullTime),
            "part-time" => Some(Self::PartTime),
            "contract" => Some(Self::Contract),
            "temporary" => Some(Self::Temporary),
            "internship" => Some(Self::Internship),
            _ => None,
        }
    }

    pub fn value(&self) -> &'static str {
        match self {
            Self::FullTime => "full-time",
            Self::PartTime => "part-time",
            Self::Contract => "contract",
            Self::Temporary => "temporary",
            Self::Internship => "internship",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::FullTime => "Full-time",
            Self::PartTime => "Part-time",
            Self::Contract => "Contract",
            Self::Temporary => "Temporary",
            Self::Internship => "Internship",
        }
    }

    /// `f_JT` code
    pub fn code(&self) -> &'static str {
        match self {
            Self::FullTime => "F",
            Self::PartTime => "P",
            Self::Contract => "C",
            Self::Temporary => "T",
            Self::Internship => "I",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DatePosted {
    Past24Hours,
    PastWeek,
    PastMonth,
}

impl DatePosted {
    const ALL: [DatePosted; 3] = [
        DatePosted::Past24Hours,
        DatePosted::PastWeek,
        DatePosted::PastMonth,
    ];

    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_lowercase().as_str() {
            "past 24 hours" => Some(Self::Past24Hours),
            "past week" => Some(Self::PastWeek),
            "past month" => Some(Self::PastMonth),
            _ => None,
        }
    }

    pub fn value(&self) -> &'static str {
        match self {
            Self::Past24Hours => "past 24 hours",
            Self::PastWeek => "past week",
            Self::PastMonth => "past month",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::Past24Hours => "Past 24 hours",
            Self::PastWeek => "Past week",
            Self::PastMonth => "Past month",
        }
    }

    /// `f_TPR` code, in seconds since posting
    pub fn code(&self) -> &'static str {
        match self {
            Self::Past24Hours => "r86400",
            Self::PastWeek => "r604800",
            Self::PastMonth => "r2592000",
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct FilterOption {
    pub value: &'static str,
    pub label: &'static str,
}

#[derive(Debug, Clone, Serialize)]
pub struct FilterCatalog {
    pub experience_levels: Vec<FilterOption>,
    pub employment_types: Vec<FilterOption>,
    pub date_posted: Vec<FilterOption>,
}

/// Every filter value the search accepts, with display labels
pub fn filter_catalog() -> FilterCatalog {
    let any = FilterOption {
        value: "",
        label: "Any",
    };

    FilterCatalog {
        experience_levels: std::iter::once(any.clone())
            .chain(ExperienceLevel::ALL.iter().map(|e| FilterOption {
                value: e.value(),
                label: e.label(),
            }))
            .collect(),
        employment_types: std::iter::once(any)
            .chain(EmploymentType::ALL.iter().map(|e| FilterOption {
                value: e.value(),
                label: e.label(),
            }))
            .collect(),
        date_posted: std::iter::once(FilterOption {
            value: "",
            label: "Any time",
        })
        .chain(DatePosted::ALL.iter().map(|d| FilterOption {
            value: d.value(),
            label: d.label(),
        }))
        .collect(),
    }
}

fn filter_params(request: &SearchRequest) -> Vec<(&'static str, &'static str)> {
    let mut params = Vec::new();
    if let Some(level) = request.experience_level() {
        params.push(("f_E", level.code()));
    }
    if let Some(kind) = request.employment_type() {
        params.push(("f_JT", kind.code()));
    }
    if let Some(posted) = request.date_posted() {
        params.push(("f_TPR", posted.code()));
    }
    params
}

fn encode_query(params: &[(&str, String)]) -> String {
    params
        .iter()
        .map(|(k, v)| format!("{}={}", k, urlencoding::encode(v)))
        .collect::<Vec<_>>()
        .join("&")
}

/// Search URL for the rendered results page
pub fn browser_search_url(request: &SearchRequest) -> String {
    let mut params: Vec<(&str, String)> = vec![
        ("keywords", request.keywords.clone()),
        ("location", request.location.clone()),
        ("trk", "public_jobs_jobs-search-bar_search-submit".to_string()),
        ("position", "1".to_string()),
        ("pageNum", "0".to_string()),
    ];

    let filters = filter_params(request);
    if !filters.is_empty() {
        params.push(("f_LF", "f_AL".to_string()));
        params.extend(filters.into_iter().map(|(k, v)| (k, v.to_string())));
    }

    format!("{}?{}", JOB_SEARCH_URL, encode_query(&params))
}

/// Search URL for one page of raw results, `start` being the result offset
pub fn http_search_url(base_url: &str, request: &SearchRequest, start: usize) -> String {
    let mut params: Vec<(&str, String)> = vec![("keywords", request.keywords.clone())];
    if !request.location.trim().is_empty() {
        params.push(("location", request.location.clone()));
    }
    params.extend(
        filter_params(request)
            .into_iter()
            .map(|(k, v)| (k, v.to_string())),
    );
    params.push(("start", start.to_string()));

    format!("{}?{}", base_url, encode_query(&params))
}

/// Make a link absolute against the LinkedIn origin
pub fn absolutize_link(link: &str) -> String {
    if link.starts_with('/') {
        format!("{}{}", LINKEDIN_ORIGIN, link)
    } else {
        link.to_string()
    }
}
