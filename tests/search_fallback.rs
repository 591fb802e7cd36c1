// tests/search_fallback.rs
use async_trait::async_trait;
use job_sheets::search::http::{HttpJobScraper, PAGE_FETCH_DELAY};
use job_sheets::search::synthetic::{SyntheticJobGenerator, SYNTHETIC_JOB_CAP};
use job_sheets::search::{JobSearchService, SearchStrategy};
use job_sheets::types::{JobListing, JobSource, SearchRequest};
use std::sync::{Arc, Mutex};
use std::time::Instant;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;

const PYTHON_TITLES: &[&str] = &[
    "Python Developer",
    "Senior Python Engineer",
    "Python Software Engineer",
    "Backend Python Developer",
];

struct Canned {
    name: &'static str,
    jobs: Option<Vec<JobListing>>,
}

#[async_trait]
impl SearchStrategy for Canned {
    fn name(&self) -> &'static str {
        self.name
    }

    async fn attempt(&self, _request: &SearchRequest) -> Option<Vec<JobListing>> {
        self.jobs.clone()
    }
}

fn canned(name: &'static str, jobs: Option<Vec<JobListing>>) -> Box<dyn SearchStrategy> {
    Box::new(Canned { name, jobs })
}

fn browser_jobs(count: usize) -> Vec<JobListing> {
    (0..count)
        .map(|i| {
            JobListing::new(
                format!("Rust Engineer {}", i),
                "Ferrous",
                "Remote",
                "Async services in Rust",
                format!("https://www.linkedin.com/jobs/view/{}", i),
                JobSource::Browser,
            )
        })
        .collect()
}

/// Address nothing listens on
async fn dead_url() -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    format!("http://{}/jobs/search", addr)
}

/// Answer every request with `body` as an HTML page
async fn serve_page(body: &'static str) -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    tokio::spawn(async move {
        while let Ok((mut socket, _)) = listener.accept().await {
            let mut buf = [0u8; 4096];
            let _ = socket.read(&mut buf).await;
            let response = format!(
                "HTTP/1.1 200 OK\r\nContent-Type: text/html\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                body.len(),
                body
            );
            let _ = socket.write_all(response.as_bytes()).await;
            let _ = socket.shutdown().await;
        }
    });

    format!("http://{}/jobs/search", addr)
}

/// Like `serve_page`, but also keeps every request line it sees
async fn serve_recording(body: String) -> (String, Arc<Mutex<Vec<String>>>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let seen = Arc::new(Mutex::new(Vec::new()));
    let log = Arc::clone(&seen);

    tokio::spawn(async move {
        while let Ok((mut socket, _)) = listener.accept().await {
            let mut buf = [0u8; 4096];
            let n = socket.read(&mut buf).await.unwrap_or(0);
            let request = String::from_utf8_lossy(&buf[..n]).to_string();
            if let Some(line) = request.lines().next() {
                log.lock().unwrap().push(line.to_string());
            }
            let response = format!(
                "HTTP/1.1 200 OK\r\nContent-Type: text/html\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                body.len(),
                body
            );
            let _ = socket.write_all(response.as_bytes()).await;
            let _ = socket.shutdown().await;
        }
    });

    (format!("http://{}/jobs/search", addr), seen)
}

fn results_page(cards: usize) -> String {
    let items: String = (0..cards)
        .map(|i| {
            format!(
                r#"<li class="job-card">
                  <h3 class="base-search-card__title">Systems Engineer {i}</h3>
                  <h4 class="base-search-card__subtitle">Ferrous</h4>
                  <a class="base-card__full-link" href="/jobs/view/{i}">View</a>
                </li>"#
            )
        })
        .collect();
    format!(r#"<html><body><ul class="jobs-search__results-list">{}</ul></body></html>"#, items)
}

fn start_offset(request_line: &str) -> Option<usize> {
    let query = request_line.split_whitespace().nth(1)?.split_once('?')?.1;
    query
        .split('&')
        .find_map(|pair| pair.strip_prefix("start="))
        .and_then(|v| v.parse().ok())
}

#[tokio::test]
async fn test_http_scraper_walks_pages_with_pause() {
    let (url, seen) = serve_recording(results_page(10)).await;
    let scraper = HttpJobScraper::with_search_url(url).unwrap();

    let started = Instant::now();
    let jobs = scraper
        .search_jobs(&SearchRequest::new("systems").with_max_jobs(60))
        .await;
    let elapsed = started.elapsed();

    assert_eq!(jobs.len(), 30);
    assert!(jobs.iter().all(|j| j.source == JobSource::Http));

    let offsets: Vec<Option<usize>> = seen.lock().unwrap().iter().map(|l| start_offset(l)).collect();
    assert_eq!(offsets, vec![Some(0), Some(25), Some(50)]);
    assert!(
        elapsed >= PAGE_FETCH_DELAY * 2,
        "pages fetched too quickly: {:?}",
        elapsed
    );
}

#[tokio::test]
async fn test_single_page_search_does_not_pause() {
    let (url, seen) = serve_recording(results_page(10)).await;
    let scraper = HttpJobScraper::with_search_url(url).unwrap();

    let started = Instant::now();
    let jobs = scraper
        .search_jobs(&SearchRequest::new("systems").with_max_jobs(5))
        .await;

    assert_eq!(jobs.len(), 5);
    assert_eq!(seen.lock().unwrap().len(), 1);
    assert!(started.elapsed() < PAGE_FETCH_DELAY);
}

#[tokio::test]
async fn test_python_scenario_with_unreachable_scrapers() {
    let service = JobSearchService::new(vec![
        canned("browser", None),
        Box::new(HttpJobScraper::with_search_url(dead_url().await).unwrap()),
        Box::new(SyntheticJobGenerator::new()),
    ]);

    let request = SearchRequest::new("python developer")
        .with_location("Remote")
        .with_requirements(["Python", "Django", "REST API"])
        .with_max_jobs(5);

    let jobs = service.search(&request).await.unwrap();
    assert_eq!(jobs.len(), 5);

    let allowed = ["Python", "Django", "REST API"];
    for job in &jobs {
        assert_eq!(job.source, JobSource::Synthetic);
        assert!(PYTHON_TITLES.contains(&job.title.as_str()), "unexpected title {}", job.title);
        assert_eq!(job.location, "Remote");
        assert!(job.matches.iter().all(|m| allowed.contains(&m.as_str())));
        assert!(job.matches.len() >= 2);
        assert_eq!(job.is_match, Some(true));
    }
}

#[tokio::test]
async fn test_synthetic_output_is_capped() {
    let service = JobSearchService::new(vec![
        canned("browser", Some(Vec::new())),
        canned("http", None),
        Box::new(SyntheticJobGenerator::new()),
    ]);

    let jobs = service
        .search(&SearchRequest::new("data engineer").with_max_jobs(80))
        .await
        .unwrap();
    assert_eq!(jobs.len(), SYNTHETIC_JOB_CAP);
    assert!(jobs.iter().all(|j| j.source == JobSource::Synthetic));

    let jobs = service
        .search(&SearchRequest::new("data engineer").with_max_jobs(7))
        .await
        .unwrap();
    assert_eq!(jobs.len(), 7);
}

#[tokio::test]
async fn test_max_jobs_caps_scraper_output() {
    let service = JobSearchService::new(vec![
        canned("browser", Some(browser_jobs(8))),
        Box::new(SyntheticJobGenerator::new()),
    ]);

    let jobs = service
        .search(&SearchRequest::new("rust").with_max_jobs(5))
        .await
        .unwrap();
    assert_eq!(jobs.len(), 5);
    assert!(jobs.iter().all(|j| j.source == JobSource::Browser));
}

#[tokio::test]
async fn test_search_never_comes_back_empty() {
    let service = JobSearchService::new(vec![
        canned("browser", None),
        canned("http", Some(Vec::new())),
        Box::new(SyntheticJobGenerator::new()),
    ]);

    for keywords in ["frontend", "devops engineer", "underwater basket weaving"] {
        let jobs = service.search(&SearchRequest::new(keywords)).await.unwrap();
        assert!(!jobs.is_empty(), "no jobs for {}", keywords);
    }
}

#[tokio::test]
async fn test_http_scraper_results_stop_the_chain() {
    const PAGE: &str = r#"<html><body><ul class="jobs-search__results-list">
        <li class="job-card">
          <h3 class="base-search-card__title">Backend Engineer</h3>
          <h4 class="base-search-card__subtitle">Acme</h4>
          <span class="job-search-card__location">Lisbon</span>
          <a class="base-card__full-link" href="/jobs/view/77">View</a>
          <div class="description__text">Rust and PostgreSQL.</div>
        </li>
    </ul></body></html>"#;

    let service = JobSearchService::new(vec![
        canned("browser", None),
        Box::new(HttpJobScraper::with_search_url(serve_page(PAGE).await).unwrap()),
        Box::new(SyntheticJobGenerator::new()),
    ]);

    let request = SearchRequest::new("backend")
        .with_requirements(["Rust"])
        .with_max_jobs(5);
    let jobs = service.search(&request).await.unwrap();

    assert_eq!(jobs.len(), 1);
    assert_eq!(jobs[0].source, JobSource::Http);
    assert_eq!(jobs[0].job_url, "https://www.linkedin.com/jobs/view/77");
    assert_eq!(jobs[0].matches, vec!["Rust"]);
}

#[tokio::test]
async fn test_placeholder_only_page_falls_through() {
    const PAGE: &str = r#"<html><body>
        <div class="result-card"><span class="company">Sign in</span></div>
    </body></html>"#;

    let service = JobSearchService::new(vec![
        Box::new(HttpJobScraper::with_search_url(serve_page(PAGE).await).unwrap()),
        Box::new(SyntheticJobGenerator::new()),
    ]);

    let jobs = service
        .search(&SearchRequest::new("python").with_max_jobs(3))
        .await
        .unwrap();
    assert_eq!(jobs.len(), 3);
    assert!(jobs.iter().all(|j| j.source == JobSource::Synthetic));
}
