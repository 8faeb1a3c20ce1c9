//! Wire types exchanged with the GenEx backend.
//!
//! Unknown fields are kept in `extra` maps where the backend is known to send
//! more than the client reads, so a round trip through the session store does
//! not drop them.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct UserProfile {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Clone, Debug, Serialize)]
pub struct LoginRequest<'a> {
    pub email: &'a str,
    pub password: &'a str,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct LoginResponse {
    pub access_token: String,
    #[serde(default = "default_token_type")]
    pub token_type: String,
    #[serde(default)]
    pub user: Option<UserProfile>,
}

fn default_token_type() -> String {
    "bearer".to_string()
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct RoleSummary {
    pub id: String,
    #[serde(default)]
    pub role_name: String,
    #[serde(default)]
    pub description: Option<String>,
}

/// Body of `POST add_users/`. The display name travels in `profile`.
#[derive(Clone, Debug, Serialize)]
pub struct NewUser {
    pub email: String,
    pub password: String,
    pub role_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub profile: Option<Value>,
}

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct DocumentSummary {
    pub id: String,
    #[serde(default)]
    pub filename: String,
    #[serde(default)]
    pub file_type: String,
    #[serde(default)]
    pub storage_url: Option<String>,
    #[serde(default)]
    pub extracted_text: Option<String>,
    #[serde(default)]
    pub original_language: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub uploaded_at: Option<String>,
    #[serde(default)]
    pub created_at: Option<String>,
    #[serde(default)]
    pub size: Option<u64>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct ExerciseSheet {
    pub id: String,
    #[serde(default)]
    pub project_id: Option<String>,
    #[serde(default)]
    pub pdf_url_questions: Option<String>,
    #[serde(default)]
    pub pdf_url_answers: Option<String>,
    #[serde(default)]
    pub qr_code_link: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub created_at: Option<String>,
}

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct SheetInfo {
    #[serde(flatten)]
    pub sheet: ExerciseSheet,
    #[serde(default)]
    pub exercises_count: u32,
    #[serde(default)]
    pub has_questions_pdf: bool,
    #[serde(default)]
    pub has_answers_pdf: bool,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ProjectSheets {
    pub project_id: String,
    #[serde(default)]
    pub project_title: Option<String>,
    #[serde(default)]
    pub sheets_count: usize,
    #[serde(default)]
    pub sheets: Vec<SheetInfo>,
}

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct FileCheck {
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub exists: bool,
    #[serde(default)]
    pub path: Option<String>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SheetFiles {
    pub sheet_id: String,
    #[serde(default)]
    pub questions: FileCheck,
    #[serde(default)]
    pub answers: FileCheck,
}

/// Descriptor returned by `create/projects/`. Only the id is relied upon.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct ProjectCreated {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct DeleteAck {
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub sheet_id: Option<String>,
    #[serde(default)]
    pub deleted_files: Vec<String>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct TranslationJob {
    pub task_id: String,
    #[serde(default)]
    pub status: Option<TranslationState>,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub original_filename: Option<String>,
    #[serde(default)]
    pub translated_filename: Option<String>,
    #[serde(default)]
    pub download_url: Option<String>,
    #[serde(default)]
    pub word_count: u64,
    #[serde(default)]
    pub pages: u32,
    #[serde(default)]
    pub detected_language: Option<String>,
    #[serde(default)]
    pub processing_time: f64,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TranslationState {
    Pending,
    Processing,
    Completed,
    Error,
    #[serde(other)]
    Unknown,
}

impl TranslationState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, TranslationState::Completed | TranslationState::Error)
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct TranslationStatus {
    pub task_id: String,
    pub status: TranslationState,
    #[serde(default)]
    pub progress: u32,
    #[serde(default)]
    pub word_count: u64,
    #[serde(default)]
    pub pages: u32,
    #[serde(default)]
    pub detected_language: Option<String>,
    #[serde(default)]
    pub processing_time: f64,
    #[serde(default)]
    pub download_url: Option<String>,
    #[serde(default)]
    pub translated_filename: Option<String>,
    #[serde(default)]
    pub error: Option<String>,
}
