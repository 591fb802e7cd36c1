// tests/export_dedup.rs
use job_sheets::sheets::{export_jobs, MemorySheets, SpreadsheetBackend, MAX_DESCRIPTION_CHARS};
use job_sheets::types::{JobListing, JobSource};

const SHEET_ID: &str = "test-sheet";

fn job(n: usize) -> JobListing {
    JobListing::new(
        format!("Engineer {}", n),
        "Acme",
        "Remote",
        "Build reliable services",
        format!("https://www.linkedin.com/jobs/view/{}", n),
        JobSource::Http,
    )
}

async fn sheets() -> MemorySheets {
    let sheets = MemorySheets::new();
    sheets.insert_sheet(SHEET_ID, "Jobs").await;
    sheets
}

#[tokio::test]
async fn test_export_twice_appends_once() {
    let sheets = sheets().await;
    let jobs = vec![job(1), job(2), job(3)];

    let first = export_jobs(&sheets, &jobs, SHEET_ID, true).await;
    assert!(first.success);
    assert_eq!(first.jobs_added, 3);

    let second = export_jobs(&sheets, &jobs, SHEET_ID, true).await;
    assert!(second.success);
    assert_eq!(second.jobs_added, 0);
    assert!(second.error.is_none());
    assert_eq!(second.message, "No new jobs to add");

    // header plus three rows
    assert_eq!(sheets.rows(SHEET_ID).await.len(), 4);
}

#[tokio::test]
async fn test_only_unseen_urls_are_added() {
    let sheets = sheets().await;
    export_jobs(&sheets, &[job(1), job(2)], SHEET_ID, true).await;

    let result = export_jobs(&sheets, &[job(1), job(2), job(3)], SHEET_ID, true).await;
    assert!(result.success);
    assert_eq!(result.jobs_added, 1);

    let rows = sheets.rows(SHEET_ID).await;
    assert_eq!(rows.len(), 4);
    assert_eq!(rows[3][3], "https://www.linkedin.com/jobs/view/3");
}

#[tokio::test]
async fn test_duplicates_kept_without_filtering() {
    let sheets = sheets().await;
    export_jobs(&sheets, &[job(1)], SHEET_ID, false).await;
    let result = export_jobs(&sheets, &[job(1)], SHEET_ID, false).await;

    assert_eq!(result.jobs_added, 1);
    assert_eq!(sheets.rows(SHEET_ID).await.len(), 3);
}

#[tokio::test]
async fn test_long_description_truncated() {
    let sheets = sheets().await;
    let mut listing = job(1);
    listing.description = "x".repeat(1500);

    let result = export_jobs(&sheets, &[listing], SHEET_ID, true).await;
    assert!(result.success);

    let rows = sheets.rows(SHEET_ID).await;
    let stored = &rows[1][10];
    assert_eq!(stored.chars().count(), MAX_DESCRIPTION_CHARS);
    assert_eq!(stored, &format!("{}...", "x".repeat(997)));
}

#[tokio::test]
async fn test_empty_batch_is_success() {
    let sheets = sheets().await;
    let result = export_jobs(&sheets, &[], SHEET_ID, true).await;

    assert!(result.success);
    assert_eq!(result.jobs_added, 0);
    assert_eq!(
        result.spreadsheet_url.as_deref(),
        Some(sheets.sheet_url(SHEET_ID).as_str())
    );
}

#[tokio::test]
async fn test_backend_failure_becomes_failed_result() {
    let sheets = sheets().await;
    sheets.set_failing(true);

    let result = export_jobs(&sheets, &[job(1)], SHEET_ID, true).await;
    assert!(!result.success);
    assert_eq!(result.jobs_added, 0);
    assert!(result.error.unwrap().contains("unavailable"));
}

#[tokio::test]
async fn test_unknown_sheet_becomes_failed_result() {
    let sheets = MemorySheets::new();
    let result = export_jobs(&sheets, &[job(1)], "missing", false).await;
    assert!(!result.success);
    assert!(result.error.unwrap().contains("Spreadsheet not found"));
}
