//! PDF translation: request validation, options and the recent history.

use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::error::{ServiceError, ServiceResult};
use crate::storage::KeyValueStore;
use crate::types::TranslationJob;

pub const AUTO_DETECT: &str = "auto";
pub const MAX_FILE_SIZE: u64 = 50 * 1024 * 1024;
pub const RECENT_KEY: &str = "recentTranslations";
pub const RECENT_LIMIT: usize = 5;

/// Language codes accepted by the backend, with their native names.
pub const LANGUAGES: [(&str, &str); 15] = [
    (AUTO_DETECT, "Détection automatique"),
    ("fr", "Français"),
    ("en", "English"),
    ("es", "Español"),
    ("de", "Deutsch"),
    ("it", "Italiano"),
    ("pt", "Português"),
    ("ru", "Русский"),
    ("zh", "中文"),
    ("ja", "日本語"),
    ("ar", "العربية"),
    ("nl", "Nederlands"),
    ("pl", "Polski"),
    ("tr", "Türkçe"),
    ("ko", "한국어"),
];

/// Native name for `code`, or the code itself when unknown.
pub fn language_name(code: &str) -> &str {
    LANGUAGES
        .iter()
        .find(|(c, _)| *c == code)
        .map(|(_, name)| *name)
        .unwrap_or(code)
}

/// Target languages exclude automatic detection.
pub fn target_languages() -> impl Iterator<Item = (&'static str, &'static str)> {
    LANGUAGES.into_iter().filter(|(code, _)| *code != AUTO_DETECT)
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TranslationQuality {
    Standard,
    #[default]
    High,
    Premium,
}

impl TranslationQuality {
    pub fn as_str(&self) -> &'static str {
        match self {
            TranslationQuality::Standard => "standard",
            TranslationQuality::High => "high",
            TranslationQuality::Premium => "premium",
        }
    }
}

impl fmt::Display for TranslationQuality {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TranslationQuality {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "standard" => Ok(TranslationQuality::Standard),
            "high" => Ok(TranslationQuality::High),
            "premium" => Ok(TranslationQuality::Premium),
            other => Err(format!("unknown quality '{other}'")),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TranslationOptions {
    pub preserve_formatting: bool,
    pub keep_images: bool,
    pub quality: TranslationQuality,
}

impl Default for TranslationOptions {
    fn default() -> Self {
        Self {
            preserve_formatting: true,
            keep_images: true,
            quality: TranslationQuality::High,
        }
    }
}

/// Checks that run before anything is uploaded.
pub fn validate_translation(
    filename: &str,
    size: u64,
    source: &str,
    target: &str,
) -> ServiceResult<()> {
    let is_pdf = Path::new(filename)
        .extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case("pdf"));
    if !is_pdf {
        return Err(ServiceError::validation("file", "Select a PDF file"));
    }
    if size > MAX_FILE_SIZE {
        return Err(ServiceError::validation("file", "File is too large (max 50MB)"));
    }
    if !LANGUAGES.iter().any(|(code, _)| *code == source) {
        return Err(ServiceError::validation(
            "source_language",
            format!("Unsupported language '{source}'"),
        ));
    }
    if target == AUTO_DETECT || !LANGUAGES.iter().any(|(code, _)| *code == target) {
        return Err(ServiceError::validation(
            "target_language",
            format!("Unsupported target language '{target}'"),
        ));
    }
    if source == target {
        return Err(ServiceError::validation(
            "target_language",
            "Source and target languages must differ",
        ));
    }
    Ok(())
}

/// A validated translation request. Only constructible through [`TranslationRequest::new`].
#[derive(Clone, Debug)]
pub struct TranslationRequest {
    path: PathBuf,
    source_language: String,
    target_language: String,
    options: TranslationOptions,
}

impl TranslationRequest {
    pub fn new(
        path: impl Into<PathBuf>,
        source_language: &str,
        target_language: &str,
        options: TranslationOptions,
    ) -> ServiceResult<Self> {
        let path = path.into();
        let metadata = std::fs::metadata(&path)
            .map_err(|_| ServiceError::validation("file", "Select a file"))?;
        if !metadata.is_file() {
            return Err(ServiceError::validation("file", "Select a file"));
        }
        let filename = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_default();
        validate_translation(&filename, metadata.len(), source_language, target_language)?;
        Ok(Self {
            path,
            source_language: source_language.to_string(),
            target_language: target_language.to_string(),
            options,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn source_language(&self) -> &str {
        &self.source_language
    }

    pub fn target_language(&self) -> &str {
        &self.target_language
    }

    pub fn options(&self) -> &TranslationOptions {
        &self.options
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecentTranslation {
    pub id: i64,
    pub original_name: String,
    pub translated_name: String,
    pub source_language: String,
    pub target_language: String,
    pub timestamp: DateTime<Utc>,
    #[serde(default)]
    pub file_url: Option<String>,
    pub task_id: String,
}

impl RecentTranslation {
    /// Record a finished job. The detected language wins over `auto`.
    pub fn from_job(request: &TranslationRequest, job: &TranslationJob, now: DateTime<Utc>) -> Self {
        let original_name = job.original_filename.clone().unwrap_or_else(|| {
            request
                .path()
                .file_name()
                .map(|name| name.to_string_lossy().into_owned())
                .unwrap_or_default()
        });
        Self {
            id: now.timestamp_millis(),
            translated_name: job
                .translated_filename
                .clone()
                .unwrap_or_else(|| format!("translated_{original_name}")),
            original_name,
            source_language: job
                .detected_language
                .clone()
                .unwrap_or_else(|| request.source_language().to_string()),
            target_language: request.target_language().to_string(),
            timestamp: now,
            file_url: job.download_url.clone(),
            task_id: job.task_id.clone(),
        }
    }
}

/// Newest-first history of the last few translations.
pub struct RecentTranslations {
    storage: Arc<dyn KeyValueStore>,
}

impl RecentTranslations {
    pub fn new(storage: Arc<dyn KeyValueStore>) -> Self {
        Self { storage }
    }

    /// Unreadable history is treated as empty.
    pub fn list(&self) -> Vec<RecentTranslation> {
        let raw = match self.storage.get(RECENT_KEY) {
            Ok(Some(raw)) => raw,
            Ok(None) => return Vec::new(),
            Err(err) => {
                warn!(error = %err, "Could not read recent translations");
                return Vec::new();
            }
        };
        serde_json::from_str(&raw).unwrap_or_else(|err| {
            warn!(error = %err, "Discarding unreadable recent translations");
            Vec::new()
        })
    }

    pub fn push(&self, entry: RecentTranslation) -> ServiceResult<Vec<RecentTranslation>> {
        let mut entries = self.list();
        entries.insert(0, entry);
        entries.truncate(RECENT_LIMIT);
        self.storage
            .set(RECENT_KEY, &serde_json::to_string(&entries)?)?;
        Ok(entries)
    }

    pub fn find(&self, task_id: &str) -> Option<RecentTranslation> {
        self.list().into_iter().find(|entry| entry.task_id == task_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MemoryStore;
    use chrono::TimeZone;

    fn job(task_id: &str) -> TranslationJob {
        serde_json::from_value(serde_json::json!({
            "task_id": task_id,
            "translated_filename": format!("{task_id}_en.pdf"),
            "detected_language": "fr",
            "download_url": format!("/translate/download/{task_id}")
        }))
        .unwrap()
    }

    fn request(dir: &tempfile::TempDir) -> TranslationRequest {
        let path = dir.path().join("cours.pdf");
        std::fs::write(&path, b"%PDF-1.7").unwrap();
        TranslationRequest::new(path, "auto", "en", TranslationOptions::default()).unwrap()
    }

    #[test]
    fn defaults_keep_layout_and_images() {
        let options = TranslationOptions::default();
        assert!(options.preserve_formatting);
        assert!(options.keep_images);
        assert_eq!(options.quality.as_str(), "high");
    }

    #[test]
    fn rejects_non_pdf_and_oversized_files() {
        let err = validate_translation("notes.docx", 10, "auto", "en").unwrap_err();
        assert_eq!(err.field(), Some("file"));
        let err = validate_translation("big.pdf", MAX_FILE_SIZE + 1, "auto", "en").unwrap_err();
        assert_eq!(err.field(), Some("file"));
        assert!(validate_translation("edge.PDF", MAX_FILE_SIZE, "auto", "en").is_ok());
    }

    #[test]
    fn same_language_only_allowed_with_auto_source() {
        let err = validate_translation("a.pdf", 1, "fr", "fr").unwrap_err();
        assert_eq!(err.field(), Some("target_language"));
        assert!(validate_translation("a.pdf", 1, "auto", "fr").is_ok());
        assert!(validate_translation("a.pdf", 1, "fr", "auto").is_err());
        assert!(validate_translation("a.pdf", 1, "xx", "fr").is_err());
    }

    #[test]
    fn missing_file_is_a_file_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = TranslationRequest::new(
            dir.path().join("absent.pdf"),
            "auto",
            "en",
            TranslationOptions::default(),
        )
        .unwrap_err();
        assert_eq!(err.field(), Some("file"));
    }

    #[test]
    fn language_names_and_targets() {
        assert_eq!(language_name("de"), "Deutsch");
        assert_eq!(language_name("xx"), "xx");
        assert_eq!(target_languages().count(), LANGUAGES.len() - 1);
        assert!(target_languages().all(|(code, _)| code != AUTO_DETECT));
    }

    #[test]
    fn history_is_newest_first_and_capped() {
        let dir = tempfile::tempdir().unwrap();
        let request = request(&dir);
        let history = RecentTranslations::new(Arc::new(MemoryStore::new()));
        for i in 0..7 {
            let now = Utc.timestamp_opt(1_700_000_000 + i, 0).unwrap();
            history
                .push(RecentTranslation::from_job(&request, &job(&format!("t{i}")), now))
                .unwrap();
        }
        let entries = history.list();
        assert_eq!(entries.len(), RECENT_LIMIT);
        assert_eq!(entries[0].task_id, "t6");
        assert_eq!(entries[4].task_id, "t2");
        assert_eq!(entries[0].source_language, "fr");
        assert_eq!(entries[0].original_name, "cours.pdf");
        assert!(history.find("t0").is_none());
        assert!(history.find("t3").is_some());
    }

    #[test]
    fn history_uses_camel_case_keys() {
        let dir = tempfile::tempdir().unwrap();
        let storage: Arc<dyn KeyValueStore> = Arc::new(MemoryStore::new());
        let history = RecentTranslations::new(storage.clone());
        history
            .push(RecentTranslation::from_job(&request(&dir), &job("t1"), Utc::now()))
            .unwrap();
        let raw = storage.get(RECENT_KEY).unwrap().unwrap();
        assert!(raw.contains("\"taskId\":\"t1\""));
        assert!(raw.contains("\"translatedName\":\"t1_en.pdf\""));
    }

    #[test]
    fn corrupt_history_reads_as_empty() {
        let storage: Arc<dyn KeyValueStore> = Arc::new(MemoryStore::new());
        storage.set(RECENT_KEY, "not json").unwrap();
        assert!(RecentTranslations::new(storage).list().is_empty());
    }
}
