//! Home screen figures, computed from what the backend already returns.

use std::cmp::Reverse;
use std::collections::BTreeMap;

use serde::Serialize;
use tracing::debug;

use crate::error::ServiceResult;
use crate::genex::client::ApiClient;
use crate::genex::library::parse_timestamp;
use crate::genex::translate::RecentTranslation;
use crate::types::{DocumentSummary, ExerciseSheet};

pub const LATEST_SHEETS: usize = 5;

#[derive(Clone, Debug, Default, Serialize)]
pub struct DashboardStats {
    pub documents: usize,
    pub sheets: usize,
    pub sheets_with_questions: usize,
    pub sheets_with_answers: usize,
    pub projects: usize,
    pub recent_translations: usize,
    pub sheets_by_status: BTreeMap<String, usize>,
    pub latest_sheets: Vec<ExerciseSheet>,
}

pub fn compute(
    documents: &[DocumentSummary],
    sheets: &[ExerciseSheet],
    recent: &[RecentTranslation],
) -> DashboardStats {
    let mut sheets_by_status = BTreeMap::new();
    for sheet in sheets {
        let status = sheet.status.as_deref().unwrap_or("unknown").to_lowercase();
        *sheets_by_status.entry(status).or_insert(0) += 1;
    }

    let mut projects: Vec<&str> = sheets
        .iter()
        .filter_map(|sheet| sheet.project_id.as_deref())
        .collect();
    projects.sort_unstable();
    projects.dedup();

    let mut latest: Vec<&ExerciseSheet> = sheets.iter().collect();
    latest.sort_by_key(|sheet| Reverse(sheet.created_at.as_deref().and_then(parse_timestamp)));
    latest.truncate(LATEST_SHEETS);

    DashboardStats {
        documents: documents.len(),
        sheets: sheets.len(),
        sheets_with_questions: sheets.iter().filter(|s| has_url(&s.pdf_url_questions)).count(),
        sheets_with_answers: sheets.iter().filter(|s| has_url(&s.pdf_url_answers)).count(),
        projects: projects.len(),
        recent_translations: recent.len(),
        sheets_by_status,
        latest_sheets: latest.into_iter().cloned().collect(),
    }
}

fn has_url(url: &Option<String>) -> bool {
    url.as_deref().is_some_and(|u| !u.trim().is_empty())
}

/// Fetch documents and sheets concurrently, then compute.
pub async fn load(client: &ApiClient, recent: &[RecentTranslation]) -> ServiceResult<DashboardStats> {
    let (documents, sheets) =
        futures::try_join!(client.list_documents(), client.list_exercise_sheets())?;
    debug!(documents = documents.len(), sheets = sheets.len(), "Dashboard data fetched");
    Ok(compute(&documents, &sheets, recent))
}
