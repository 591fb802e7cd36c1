// src/sheets/memory.rs
//! In-process spreadsheet backend for tests and offline runs.

use anyhow::{Context, Result};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use tokio::sync::Mutex;

use super::{SpreadsheetBackend, HEADERS, SHEET_NAME};
use crate::types::SpreadsheetInfo;

#[derive(Debug, Clone, Default)]
struct MemorySheet {
    title: String,
    rows: Vec<Vec<String>>,
}

#[derive(Debug, Default)]
pub struct MemorySheets {
    sheets: Mutex<HashMap<String, MemorySheet>>,
    failing: AtomicBool,
}

/// Zero-based column index of the first column in an A1 range like `Sheet!D:D`
fn column_index(range: &str) -> Result<usize> {
    let cells = range.rsplit('!').next().unwrap_or(range);
    let letters: String = cells
        .chars()
        .take_while(|c| c.is_ascii_alphabetic())
        .collect();
    if letters.is_empty() {
        anyhow::bail!("Range '{}' has no column", range);
    }

    let index = letters
        .to_ascii_uppercase()
        .bytes()
        .fold(0usize, |acc, b| acc * 26 + (b - b'A' + 1) as usize);
    Ok(index - 1)
}

impl MemorySheets {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every call fail until switched back
    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    /// Register a sheet under a known id, header row included
    pub async fn insert_sheet(&self, spreadsheet_id: &str, title: &str) {
        let sheet = MemorySheet {
            title: title.to_string(),
            rows: vec![HEADERS.iter().map(|h| h.to_string()).collect()],
        };
        self.sheets
            .lock()
            .await
            .insert(spreadsheet_id.to_string(), sheet);
    }

    /// All rows, header first
    pub async fn rows(&self, spreadsheet_id: &str) -> Vec<Vec<String>> {
        self.sheets
            .lock()
            .await
            .get(spreadsheet_id)
            .map(|sheet| sheet.rows.clone())
            .unwrap_or_default()
    }

    fn check(&self) -> Result<()> {
        if self.failing.load(Ordering::SeqCst) {
            anyhow::bail!("Spreadsheet backend unavailable");
        }
        Ok(())
    }
}

#[async_trait]
impl SpreadsheetBackend for MemorySheets {
    async fn create_sheet(&self, title: &str) -> Result<String> {
        self.check()?;
        let spreadsheet_id = uuid::Uuid::new_v4().simple().to_string();
        self.insert_sheet(&spreadsheet_id, title).await;
        Ok(spreadsheet_id)
    }

    async fn read_column(&self, spreadsheet_id: &str, range: &str) -> Result<Vec<String>> {
        self.check()?;
        let column = column_index(range)?;
        let sheets = self.sheets.lock().await;
        let sheet = sheets
            .get(spreadsheet_id)
            .with_context(|| format!("Spreadsheet not found: {}", spreadsheet_id))?;

        Ok(sheet
            .rows
            .iter()
            .map(|row| row.get(column).cloned().unwrap_or_default())
            .collect())
    }

    async fn append_rows(&self, spreadsheet_id: &str, rows: Vec<Vec<String>>) -> Result<u64> {
        self.check()?;
        let mut sheets = self.sheets.lock().await;
        let sheet = sheets
            .get_mut(spreadsheet_id)
            .with_context(|| format!("Spreadsheet not found: {}", spreadsheet_id))?;

        let cells = rows.iter().map(|row| row.len() as u64).sum();
        sheet.rows.extend(rows);
        Ok(cells)
    }

    async fn get_metadata(&self, spreadsheet_id: &str) -> Result<SpreadsheetInfo> {
        self.check()?;
        let sheets = self.sheets.lock().await;
        let sheet = sheets
            .get(spreadsheet_id)
            .with_context(|| format!("Spreadsheet not found: {}", spreadsheet_id))?;

        Ok(SpreadsheetInfo {
            title: sheet.title.clone(),
            url: self.sheet_url(spreadsheet_id),
            sheets: vec![SHEET_NAME.to_string()],
        })
    }
}
