//! Project configuration model
//!
//! The configuration describing a to-be-generated exercise sheet, and the pure
//! functions that update it. Every update consumes the configuration and returns
//! the new value; nothing here performs I/O.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::{ServiceError, ServiceResult};

pub const DEFAULT_LANGUAGE: &str = "fr";
pub const DEFAULT_EXERCISE_TOTAL: u32 = 20;
pub const MAX_DIFFICULTY: u32 = 3;
pub const GENERATION_MODE: &str = "EXERCISES";

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ExerciseKind {
    Mcq,
    FillIn,
    Open,
    Reflection,
    CaseStudy,
    Competence,
    ProblemSolving,
}

impl ExerciseKind {
    /// Display order used by selectors.
    pub const ALL: [ExerciseKind; 7] = [
        ExerciseKind::Mcq,
        ExerciseKind::FillIn,
        ExerciseKind::Open,
        ExerciseKind::Reflection,
        ExerciseKind::CaseStudy,
        ExerciseKind::Competence,
        ExerciseKind::ProblemSolving,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ExerciseKind::Mcq => "MCQ",
            ExerciseKind::FillIn => "FILL_IN",
            ExerciseKind::Open => "OPEN",
            ExerciseKind::Reflection => "REFLECTION",
            ExerciseKind::CaseStudy => "CASE_STUDY",
            ExerciseKind::Competence => "COMPETENCE",
            ExerciseKind::ProblemSolving => "PROBLEM_SOLVING",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            ExerciseKind::Mcq => "Questions à Choix Multiple",
            ExerciseKind::FillIn => "Texte à trous",
            ExerciseKind::Open => "Questions ouvertes",
            ExerciseKind::Reflection => "Questions de réflexion",
            ExerciseKind::CaseStudy => "Études de cas",
            ExerciseKind::Competence => "Exercices de compétence",
            ExerciseKind::ProblemSolving => "Résolution de problèmes",
        }
    }

    /// Bloom taxonomy levels the generator targets for this kind.
    pub fn bloom_levels(&self) -> &'static [&'static str] {
        match self {
            ExerciseKind::Mcq => &["remember", "understand"],
            ExerciseKind::FillIn => &["understand", "apply"],
            ExerciseKind::Open => &["apply", "analyze"],
            ExerciseKind::Reflection => &["analyze", "evaluate"],
            ExerciseKind::CaseStudy => &["analyze", "evaluate", "create"],
            ExerciseKind::Competence => &["apply", "create"],
            ExerciseKind::ProblemSolving => &["apply", "analyze", "create"],
        }
    }
}

impl fmt::Display for ExerciseKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ExerciseKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_ascii_uppercase().replace('-', "_");
        ExerciseKind::ALL
            .into_iter()
            .find(|kind| kind.as_str() == normalized)
            .ok_or_else(|| format!("Unknown exercise type: {s}"))
    }
}

/// Clamp user input to a positive integer; anything invalid becomes 1.
pub fn clamp_positive(value: i64) -> u32 {
    if value < 1 {
        1
    } else {
        u32::try_from(value).unwrap_or(u32::MAX)
    }
}

/// Parse a numeric form field, clamping unparsable or non-positive input to 1.
pub fn parse_positive(input: &str) -> u32 {
    input.trim().parse::<i64>().map(clamp_positive).unwrap_or(1)
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct LanguagePair {
    pub source: String,
    pub target: String,
}

impl Default for LanguagePair {
    fn default() -> Self {
        Self {
            source: DEFAULT_LANGUAGE.to_string(),
            target: DEFAULT_LANGUAGE.to_string(),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct ExerciseTypeEntry {
    #[serde(rename = "type")]
    pub kind: ExerciseKind,
    pub label: String,
    pub count: u32,
    pub questions_per_exercise: u32,
    pub difficulty_level: u32,
}

/// A single editable field of an [`ExerciseTypeEntry`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum EntryField {
    Count(u32),
    QuestionsPerExercise(u32),
    DifficultyLevel(u32),
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct CourseMetadata {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subject_area: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub educational_level: Option<String>,
}

impl CourseMetadata {
    pub fn is_empty(&self) -> bool {
        self.subject_area.is_none() && self.educational_level.is_none()
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct Scaffolding {
    pub provide_hints: bool,
    pub include_examples: bool,
    pub formula_sheet: bool,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "UPPERCASE")]
pub enum OutputFormat {
    #[default]
    Pdf,
}

/// Layout switches, read by the generator from `config.output.structure`.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct OutputStructure {
    pub cover_page: bool,
    pub answer_sheet_separate: bool,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct OutputOptions {
    pub format: OutputFormat,
    pub structure: OutputStructure,
}

/// Options edited on the "advanced" wizard step.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct AdvancedOptions {
    pub metadata: CourseMetadata,
    pub scaffolding: Scaffolding,
    pub include_explanations: bool,
    pub include_rubrics: bool,
    pub output: OutputOptions,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ProjectConfiguration {
    user_id: Option<String>,
    document_id: Option<String>,
    title: String,
    language_pair: LanguagePair,
    exercise_total: u32,
    global_difficulty: u32,
    exercise_types: Vec<ExerciseTypeEntry>,
    generate_answers: bool,
    advanced: AdvancedOptions,
}

impl Default for ProjectConfiguration {
    fn default() -> Self {
        Self {
            user_id: None,
            document_id: None,
            title: String::new(),
            language_pair: LanguagePair::default(),
            exercise_total: DEFAULT_EXERCISE_TOTAL,
            global_difficulty: MAX_DIFFICULTY,
            exercise_types: Vec::new(),
            generate_answers: true,
            advanced: AdvancedOptions::default(),
        }
    }
}

impl ProjectConfiguration {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn user_id(&self) -> Option<&str> {
        self.user_id.as_deref()
    }

    pub fn document_id(&self) -> Option<&str> {
        self.document_id.as_deref()
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn language_pair(&self) -> &LanguagePair {
        &self.language_pair
    }

    pub fn exercise_total(&self) -> u32 {
        self.exercise_total
    }

    pub fn global_difficulty(&self) -> u32 {
        self.global_difficulty
    }

    pub fn exercise_types(&self) -> &[ExerciseTypeEntry] {
        &self.exercise_types
    }

    pub fn generate_answers(&self) -> bool {
        self.generate_answers
    }

    pub fn advanced(&self) -> &AdvancedOptions {
        &self.advanced
    }

    /// Sum of the per-type counts, saturating at `u32::MAX`. Not reconciled
    /// with `exercise_total`, which is entered on its own.
    pub fn configured_exercise_count(&self) -> u32 {
        self.exercise_types
            .iter()
            .fold(0u32, |total, t| total.saturating_add(t.count))
    }

    pub fn set_title(mut self, title: impl Into<String>) -> Self {
        self.title = title.into();
        self
    }

    /// An empty id clears the selection.
    pub fn set_document(mut self, document_id: impl Into<String>) -> Self {
        let id = document_id.into();
        self.document_id = (!id.trim().is_empty()).then_some(id);
        self
    }

    pub fn set_user(mut self, user_id: Option<String>) -> Self {
        self.user_id = user_id;
        self
    }

    /// Empty codes fall back to the default language, per side.
    pub fn set_language_pair(mut self, source: impl Into<String>, target: impl Into<String>) -> Self {
        let or_default = |code: String| {
            if code.trim().is_empty() {
                DEFAULT_LANGUAGE.to_string()
            } else {
                code
            }
        };
        self.language_pair = LanguagePair {
            source: or_default(source.into()),
            target: or_default(target.into()),
        };
        self
    }

    pub fn set_exercise_total(mut self, total: u32) -> Self {
        self.exercise_total = total.max(1);
        self
    }

    pub fn set_global_difficulty(mut self, difficulty: u32) -> Self {
        self.global_difficulty = difficulty.clamp(1, MAX_DIFFICULTY);
        self
    }

    pub fn set_generate_answers(mut self, generate: bool) -> Self {
        self.generate_answers = generate;
        self
    }

    pub fn set_advanced(mut self, advanced: AdvancedOptions) -> Self {
        self.advanced = advanced;
        self
    }

    /// Add `count` exercises of `kind`. An existing entry only accumulates its
    /// count and keeps its position; a new entry is appended with its label.
    pub fn add_or_merge_exercise_type(
        mut self,
        kind: ExerciseKind,
        count: u32,
        questions_per_exercise: u32,
        difficulty_level: u32,
    ) -> Self {
        let count = count.max(1);
        match self.exercise_types.iter_mut().find(|t| t.kind == kind) {
            Some(existing) => {
                existing.count = existing.count.saturating_add(count);
            }
            None => self.exercise_types.push(ExerciseTypeEntry {
                kind,
                label: kind.label().to_string(),
                count,
                questions_per_exercise: questions_per_exercise.max(1),
                difficulty_level: difficulty_level.max(1),
            }),
        }
        self
    }

    /// Out-of-range indices are ignored.
    pub fn update_exercise_type_field(mut self, index: usize, field: EntryField) -> Self {
        if let Some(entry) = self.exercise_types.get_mut(index) {
            match field {
                EntryField::Count(v) => entry.count = v.max(1),
                EntryField::QuestionsPerExercise(v) => entry.questions_per_exercise = v.max(1),
                EntryField::DifficultyLevel(v) => entry.difficulty_level = v.max(1),
            }
        }
        self
    }

    /// Out-of-range indices are ignored.
    pub fn remove_exercise_type(mut self, index: usize) -> Self {
        if index < self.exercise_types.len() {
            self.exercise_types.remove(index);
        }
        self
    }

    /// First blocking problem, checked in form order.
    pub fn validate(&self) -> ServiceResult<()> {
        if self.title.trim().is_empty() {
            return Err(ServiceError::validation("title", "Title is required"));
        }
        if self.document_id.is_none() {
            return Err(ServiceError::validation(
                "document_id",
                "Select a source document",
            ));
        }
        if self.exercise_types.is_empty() {
            return Err(ServiceError::validation(
                "exercise_types",
                "Add at least one exercise type",
            ));
        }
        Ok(())
    }

    pub fn build_submission_payload(&self) -> ProjectPayload {
        let advanced = &self.advanced;
        ProjectPayload {
            user_id: self.user_id.clone(),
            document_id: self.document_id.clone(),
            title: self.title.clone(),
            config: GenerationConfig {
                generation_mode: GENERATION_MODE.to_string(),
                language: self.language_pair.clone(),
                exercises: ExercisesSection {
                    total: self.exercise_total,
                    difficulty: self.global_difficulty,
                    types: self.exercise_types.clone(),
                },
                correction: CorrectionSection {
                    generate_answers: self.generate_answers,
                    include_explanations: advanced.include_explanations,
                    include_rubrics: advanced.include_rubrics,
                },
                scaffolding: advanced.scaffolding.clone(),
                output: advanced.output.clone(),
                metadata: (!advanced.metadata.is_empty()).then(|| advanced.metadata.clone()),
            },
        }
    }
}

/// Body of `POST create/projects/`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct ProjectPayload {
    pub user_id: Option<String>,
    pub document_id: Option<String>,
    pub title: String,
    pub config: GenerationConfig,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct GenerationConfig {
    pub generation_mode: String,
    pub language: LanguagePair,
    pub exercises: ExercisesSection,
    pub correction: CorrectionSection,
    pub scaffolding: Scaffolding,
    pub output: OutputOptions,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<CourseMetadata>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct ExercisesSection {
    pub total: u32,
    pub difficulty: u32,
    pub types: Vec<ExerciseTypeEntry>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct CorrectionSection {
    pub generate_answers: bool,
    pub include_explanations: bool,
    pub include_rubrics: bool,
}
