//! GenEx HTTP API client
//!
//! Every request reads the bearer token from the shared [`SessionStore`] at
//! call time. Failures are mapped onto [`ServiceError`] so callers can tell a
//! stale session from a missing resource or an unreachable backend.

use std::future::Future;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use reqwest::header::CONTENT_TYPE;
use reqwest::multipart::{Form, Part};
use reqwest::{Method, RequestBuilder, Response, StatusCode};
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::{debug, info, warn};

use crate::error::{ServiceError, ServiceResult};
use crate::genex::blob::{BlobRegistry, BlobSink, DOWNLOAD_GRACE, ObjectUrl, PREVIEW_GRACE};
use crate::genex::project::ProjectPayload;
use crate::genex::translate::TranslationRequest;
use crate::genex::wizard::ProjectApi;
use crate::metadata;
use crate::session::SessionStore;
use crate::types::{
    DeleteAck, DocumentSummary, ExerciseSheet, LoginRequest, LoginResponse, NewUser,
    ProjectCreated, ProjectSheets, RoleSummary, SheetFiles, SheetInfo, TranslationJob,
    TranslationStatus, UserProfile,
};

pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(60);

const UNAUTHORIZED: &str = "Unauthorized. Please log in again.";
const SESSION_EXPIRED: &str = "Session expired. Please log in again.";
const NOT_FOUND: &str = "Resource not found.";
const FILE_NOT_FOUND: &str = "File not found.";
const LOGIN_FAILED: &str = "Login failed. Check your credentials.";

/// Which half of an exercise sheet to fetch.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SheetPart {
    Questions,
    Answers,
}

impl SheetPart {
    fn slug(&self) -> &'static str {
        match self {
            SheetPart::Questions => "questions",
            SheetPart::Answers => "answers",
        }
    }

    pub fn default_filename(&self) -> &'static str {
        match self {
            SheetPart::Questions => "Exercices.pdf",
            SheetPart::Answers => "Corrections.pdf",
        }
    }

    fn download_path(&self, sheet_id: &str) -> String {
        format!("sheets/{sheet_id}/download-{}", self.slug())
    }

    fn preview_path(&self, sheet_id: &str) -> String {
        format!("sheets/{sheet_id}/preview-{}/", self.slug())
    }
}

impl std::str::FromStr for SheetPart {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "questions" | "q" | "exercices" => Ok(SheetPart::Questions),
            "answers" | "a" | "corrections" => Ok(SheetPart::Answers),
            other => Err(format!("unknown sheet part '{other}' (expected questions or answers)")),
        }
    }
}

/// A blob that went through the registry and landed on disk.
#[derive(Clone, Debug)]
pub struct Materialized {
    pub object_url: ObjectUrl,
    pub path: PathBuf,
    pub bytes: usize,
}

/// How non-2xx statuses are worded for a given kind of call.
#[derive(Clone, Copy)]
enum Failure {
    Json,
    File,
}

impl Failure {
    fn unauthorized(self) -> &'static str {
        match self {
            Failure::Json => UNAUTHORIZED,
            Failure::File => SESSION_EXPIRED,
        }
    }

    fn not_found(self) -> &'static str {
        match self {
            Failure::Json => NOT_FOUND,
            Failure::File => FILE_NOT_FOUND,
        }
    }
}

pub struct ApiClient {
    base_url: String,
    http: reqwest::Client,
    session: Arc<SessionStore>,
    blobs: BlobRegistry,
    sink: Arc<dyn BlobSink>,
}

impl ApiClient {
    pub fn new(
        base_url: &str,
        timeout: Duration,
        session: Arc<SessionStore>,
        sink: Arc<dyn BlobSink>,
    ) -> ServiceResult<Self> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(metadata::USER_AGENT)
            .build()?;
        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            http,
            session,
            blobs: BlobRegistry::new(),
            sink,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn session(&self) -> &Arc<SessionStore> {
        &self.session
    }

    pub fn blobs(&self) -> &BlobRegistry {
        &self.blobs
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        let builder = self.http.request(method, self.url(path));
        match self.session.token() {
            Some(token) => builder.bearer_auth(token),
            None => builder,
        }
    }

    async fn send(&self, builder: RequestBuilder) -> ServiceResult<Response> {
        builder.send().await.map_err(|err| {
            if err.is_connect() || err.is_timeout() || err.is_request() {
                warn!(error = %err, base_url = %self.base_url, "Backend unreachable");
                ServiceError::NetworkUnreachable(format!(
                    "Could not reach the GenEx server at {}. Check that it is running.",
                    self.base_url
                ))
            } else {
                ServiceError::Http(err)
            }
        })
    }

    async fn get_json<T: DeserializeOwned>(&self, path: &str) -> ServiceResult<T> {
        debug!(path, "GET");
        let response = self.send(self.request(Method::GET, path)).await?;
        let response = ensure_success(response, Failure::Json).await?;
        Ok(response.json().await?)
    }

    async fn post_json<B, T>(&self, path: &str, body: &B) -> ServiceResult<T>
    where
        B: Serialize + ?Sized + Sync,
        T: DeserializeOwned,
    {
        debug!(path, "POST");
        let response = self
            .send(self.request(Method::POST, path).json(body))
            .await?;
        let response = ensure_success(response, Failure::Json).await?;
        Ok(response.json().await?)
    }

    async fn post_form<T: DeserializeOwned>(&self, path: &str, form: Form) -> ServiceResult<T> {
        debug!(path, "POST multipart");
        let response = self
            .send(self.request(Method::POST, path).multipart(form))
            .await?;
        let response = ensure_success(response, Failure::Json).await?;
        Ok(response.json().await?)
    }

    /// Fetch a binary body. `empty` is the message used when the body has no bytes.
    async fn fetch_bytes(&self, path: &str, require_token: bool, empty: &str) -> ServiceResult<Vec<u8>> {
        if require_token && self.session.token().is_none() {
            return Err(ServiceError::Unauthorized(
                "Unauthorized. Log in to download files.".to_string(),
            ));
        }
        debug!(path, "GET file");
        let response = self.send(self.request(Method::GET, path)).await?;
        let response = ensure_success(response, Failure::File).await?;
        let bytes = response.bytes().await?;
        if bytes.is_empty() {
            return Err(ServiceError::EmptyFile(empty.to_string()));
        }
        Ok(bytes.to_vec())
    }

    /// Register `bytes`, hand them to the sink off the runtime threads, then
    /// schedule revocation.
    async fn materialize(
        &self,
        bytes: Vec<u8>,
        filename: &str,
        preview: bool,
    ) -> ServiceResult<Materialized> {
        let size = bytes.len();
        let object_url = self.blobs.create_object_url(bytes);
        let saved = match self.blobs.resolve(&object_url) {
            Some(blob) => {
                let sink = Arc::clone(&self.sink);
                let url = object_url.clone();
                let filename = filename.to_string();
                tokio::task::spawn_blocking(move || {
                    if preview {
                        sink.open(&url, &blob, &filename)
                    } else {
                        sink.save(&url, &blob, &filename)
                    }
                })
                .await
                .unwrap_or_else(|e| {
                    Err(ServiceError::IoError(std::io::Error::other(format!(
                        "spawn_blocking failed: {e}"
                    ))))
                })
            }
            None => Err(ServiceError::InvalidState(format!(
                "{object_url} was revoked before use"
            ))),
        };
        // revocation is scheduled whether or not the sink succeeded
        let grace = if preview { PREVIEW_GRACE } else { DOWNLOAD_GRACE };
        self.blobs.revoke_after(object_url.clone(), grace);
        Ok(Materialized {
            object_url,
            path: saved?,
            bytes: size,
        })
    }

    // ----- auth -----

    pub async fn login(&self, email: &str, password: &str) -> ServiceResult<LoginResponse> {
        let body = LoginRequest { email, password };
        let response = self
            .send(self.http.post(self.url("auth/login")).json(&body))
            .await?;
        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            let message = detail_message(&text).unwrap_or_else(|| LOGIN_FAILED.to_string());
            warn!(status = status.as_u16(), "Login rejected");
            return Err(if status == StatusCode::UNAUTHORIZED {
                ServiceError::Unauthorized(message)
            } else {
                ServiceError::Server {
                    status: status.as_u16(),
                    message,
                }
            });
        }
        let login: LoginResponse = response.json().await?;
        info!("Login accepted");
        Ok(login)
    }

    /// Log in and record the credentials in the session.
    pub async fn sign_in(&self, email: &str, password: &str) -> ServiceResult<LoginResponse> {
        let login = self.login(email, password).await?;
        self.session.login(&login)?;
        Ok(login)
    }

    pub async fn list_roles(&self) -> ServiceResult<Vec<RoleSummary>> {
        self.get_json("get_roles/").await
    }

    /// Create an account. A taken email comes back as a 400 with its detail.
    pub async fn register(&self, user: &NewUser) -> ServiceResult<UserProfile> {
        let created: UserProfile = self.post_json("add_users/", user).await?;
        info!(user_id = ?created.id, "Account created");
        Ok(created)
    }

    // ----- documents -----

    pub async fn list_documents(&self) -> ServiceResult<Vec<DocumentSummary>> {
        self.get_json("get_documents/").await
    }

    pub async fn get_document(&self, id: &str) -> ServiceResult<DocumentSummary> {
        self.get_json(&format!("get_documents_by_id/{id}")).await
    }

    pub async fn upload_document(&self, path: &Path) -> ServiceResult<DocumentSummary> {
        let bytes = tokio::fs::read(path).await?;
        let filename = file_name(path);
        let part = Part::bytes(bytes)
            .file_name(filename.clone())
            .mime_str(mime_for(&filename))?;
        let document: DocumentSummary = self
            .post_form("documents/upload/", Form::new().part("file", part))
            .await?;
        info!(document_id = %document.id, filename = %filename, "Uploaded document");
        Ok(document)
    }

    // ----- projects and sheets -----

    pub async fn create_project(&self, payload: &ProjectPayload) -> ServiceResult<ProjectCreated> {
        let created: ProjectCreated = self.post_json("create/projects/", payload).await?;
        info!(project_id = ?created.id, "Project created");
        Ok(created)
    }

    pub async fn list_exercise_sheets(&self) -> ServiceResult<Vec<ExerciseSheet>> {
        self.get_json("all_exercise_sheets/").await
    }

    pub async fn exercise_sheets_by_project(&self, project_id: &str) -> ServiceResult<Vec<ExerciseSheet>> {
        self.get_json(&format!("exercise_sheets_by_project_id/{project_id}"))
            .await
    }

    pub async fn sheet_info(&self, sheet_id: &str) -> ServiceResult<SheetInfo> {
        self.get_json(&format!("sheets/{sheet_id}/info/")).await
    }

    pub async fn project_sheets(&self, project_id: &str) -> ServiceResult<ProjectSheets> {
        self.get_json(&format!("projects/{project_id}/sheets/")).await
    }

    pub async fn check_sheet_files(&self, sheet_id: &str) -> ServiceResult<SheetFiles> {
        self.get_json(&format!("sheets/{sheet_id}/check-files/")).await
    }

    /// Some deployments answer DELETE with an empty body.
    pub async fn delete_sheet(&self, sheet_id: &str) -> ServiceResult<DeleteAck> {
        let path = format!("sheets/{sheet_id}/");
        debug!(path = %path, "DELETE");
        let response = self.send(self.request(Method::DELETE, &path)).await?;
        let response = ensure_success(response, Failure::Json).await?;
        let ack = if is_json(&response) {
            response.json().await?
        } else {
            DeleteAck {
                message: "Deleted.".to_string(),
                sheet_id: Some(sheet_id.to_string()),
                deleted_files: Vec::new(),
            }
        };
        info!(sheet_id, "Sheet deleted");
        Ok(ack)
    }

    pub async fn download_sheet(&self, sheet_id: &str, part: SheetPart) -> ServiceResult<Materialized> {
        self.download_sheet_as(sheet_id, part, part.default_filename())
            .await
    }

    pub async fn download_sheet_as(
        &self,
        sheet_id: &str,
        part: SheetPart,
        filename: &str,
    ) -> ServiceResult<Materialized> {
        let bytes = self
            .fetch_bytes(
                &part.download_path(sheet_id),
                true,
                "The downloaded file is empty.",
            )
            .await?;
        self.materialize(bytes, filename, false).await
    }

    pub async fn preview_sheet(&self, sheet_id: &str, part: SheetPart) -> ServiceResult<Materialized> {
        let bytes = self
            .fetch_bytes(&part.preview_path(sheet_id), true, "The file is empty.")
            .await?;
        self.materialize(bytes, part.default_filename(), true)
            .await
    }

    // ----- translation -----

    pub async fn translate_pdf(&self, request: &TranslationRequest) -> ServiceResult<TranslationJob> {
        let bytes = tokio::fs::read(request.path()).await?;
        let filename = file_name(request.path());
        let options = request.options();
        let part = Part::bytes(bytes)
            .file_name(filename.clone())
            .mime_str("application/pdf")?;
        let form = Form::new()
            .part("file", part)
            .text("source_language", request.source_language().to_string())
            .text("target_language", request.target_language().to_string())
            .text("preserve_formatting", options.preserve_formatting.to_string())
            .text("keep_images", options.keep_images.to_string())
            .text("quality", options.quality.as_str());
        let job: TranslationJob = self.post_form("translate/pdf", form).await?;
        info!(task_id = %job.task_id, filename = %filename, "Translation submitted");
        Ok(job)
    }

    pub async fn translation_status(&self, task_id: &str) -> ServiceResult<TranslationStatus> {
        self.get_json(&format!("translate/status/{task_id}")).await
    }

    pub async fn download_translation(&self, task_id: &str, filename: &str) -> ServiceResult<Materialized> {
        let bytes = self
            .fetch_bytes(
                &format!("translate/download/{task_id}"),
                false,
                "The translated file is empty.",
            )
            .await?;
        self.materialize(bytes, filename, false).await
    }
}

impl ProjectApi for ApiClient {
    fn create_project(
        &self,
        payload: &ProjectPayload,
    ) -> impl Future<Output = ServiceResult<ProjectCreated>> + Send {
        ApiClient::create_project(self, payload)
    }
}

async fn ensure_success(response: Response, failure: Failure) -> ServiceResult<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    match status {
        StatusCode::UNAUTHORIZED => Err(ServiceError::Unauthorized(failure.unauthorized().into())),
        StatusCode::NOT_FOUND => Err(ServiceError::NotFound(failure.not_found().into())),
        _ => {
            let text = response.text().await.unwrap_or_default();
            let message = detail_message(&text).unwrap_or_else(|| status_line(status));
            warn!(status = status.as_u16(), message = %message, "Request failed");
            Err(ServiceError::Server {
                status: status.as_u16(),
                message,
            })
        }
    }
}

/// `detail` from a JSON error body: a string, or a list of `{msg}` entries.
pub(crate) fn detail_message(body: &str) -> Option<String> {
    let value: Value = serde_json::from_str(body).ok()?;
    match value.get("detail")? {
        Value::String(detail) if !detail.is_empty() => Some(detail.clone()),
        Value::Array(items) => {
            let messages: Vec<&str> = items
                .iter()
                .filter_map(|item| item.get("msg").and_then(Value::as_str))
                .collect();
            (!messages.is_empty()).then(|| messages.join("; "))
        }
        Value::Null | Value::String(_) => None,
        other => Some(other.to_string()),
    }
}

fn status_line(status: StatusCode) -> String {
    format!(
        "HTTP {}: {}",
        status.as_u16(),
        status.canonical_reason().unwrap_or("Unknown status")
    )
}

fn is_json(response: &Response) -> bool {
    response
        .headers()
        .get(CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .is_some_and(|value| value.contains("application/json"))
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| "upload".to_string())
}

fn mime_for(filename: &str) -> &'static str {
    let extension = filename
        .rsplit_once('.')
        .map(|(_, ext)| ext.to_ascii_lowercase())
        .unwrap_or_default();
    match extension.as_str() {
        "pdf" => "application/pdf",
        "docx" => "application/vnd.openxmlformats-officedocument.wordprocessingml.document",
        "txt" => "text/plain",
        "png" => "image/png",
        "jpg" | "jpeg" => "image/jpeg",
        "gif" => "image/gif",
        _ => "application/octet-stream",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn detail_is_read_from_string_or_list() {
        assert_eq!(
            detail_message(r#"{"detail":"Document missing"}"#).as_deref(),
            Some("Document missing")
        );
        assert_eq!(
            detail_message(r#"{"detail":[{"msg":"field required"},{"msg":"bad id"}]}"#).as_deref(),
            Some("field required; bad id")
        );
        assert_eq!(detail_message(r#"{"error":"x"}"#), None);
        assert_eq!(detail_message("<html>"), None);
        assert_eq!(detail_message(r#"{"detail":""}"#), None);
    }

    #[test]
    fn status_line_uses_reason_phrase() {
        assert_eq!(
            status_line(StatusCode::INTERNAL_SERVER_ERROR),
            "HTTP 500: Internal Server Error"
        );
    }

    #[test]
    fn sheet_part_routes() {
        assert_eq!(
            SheetPart::Questions.download_path("s1"),
            "sheets/s1/download-questions"
        );
        assert_eq!(
            SheetPart::Answers.preview_path("s1"),
            "sheets/s1/preview-answers/"
        );
        assert_eq!(SheetPart::Answers.default_filename(), "Corrections.pdf");
        assert_eq!("Corrections".parse::<SheetPart>(), Ok(SheetPart::Answers));
        assert!("both".parse::<SheetPart>().is_err());
    }

    #[test]
    fn mime_follows_extension() {
        assert_eq!(mime_for("cours.PDF"), "application/pdf");
        assert_eq!(mime_for("photo.jpeg"), "image/jpeg");
        assert_eq!(mime_for("README"), "application/octet-stream");
    }
}
