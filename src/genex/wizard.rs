//! Multi-step project wizard
//!
//! Drives the linear `General → Exercises → Advanced → Preview` flow over a
//! [`ProjectConfiguration`], gates forward moves, and guards submission with a
//! `Submitting` phase so a second submit cannot be issued while one is in flight.

use std::future::Future;

use tracing::{debug, info, warn};

use crate::error::{ServiceError, ServiceResult};
use crate::genex::project::{ProjectConfiguration, ProjectPayload};
use crate::types::ProjectCreated;

/// The project-creation half of the API, as seen by the wizard.
pub trait ProjectApi {
    fn create_project(
        &self,
        payload: &ProjectPayload,
    ) -> impl Future<Output = ServiceResult<ProjectCreated>> + Send;
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum WizardStep {
    General,
    Exercises,
    Advanced,
    Preview,
}

impl WizardStep {
    pub const ALL: [WizardStep; 4] = [
        WizardStep::General,
        WizardStep::Exercises,
        WizardStep::Advanced,
        WizardStep::Preview,
    ];

    /// 1-based position shown in the stepper.
    pub fn number(&self) -> usize {
        match self {
            WizardStep::General => 1,
            WizardStep::Exercises => 2,
            WizardStep::Advanced => 3,
            WizardStep::Preview => 4,
        }
    }

    pub fn title(&self) -> &'static str {
        match self {
            WizardStep::General => "Général",
            WizardStep::Exercises => "Exercices",
            WizardStep::Advanced => "Avancé",
            WizardStep::Preview => "Aperçu",
        }
    }

    fn next(self) -> Option<WizardStep> {
        match self {
            WizardStep::General => Some(WizardStep::Exercises),
            WizardStep::Exercises => Some(WizardStep::Advanced),
            WizardStep::Advanced => Some(WizardStep::Preview),
            WizardStep::Preview => None,
        }
    }

    fn prev(self) -> Option<WizardStep> {
        match self {
            WizardStep::General => None,
            WizardStep::Exercises => Some(WizardStep::General),
            WizardStep::Advanced => Some(WizardStep::Exercises),
            WizardStep::Preview => Some(WizardStep::Advanced),
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub enum WizardPhase {
    Editing(WizardStep),
    Submitting,
    Completed(ProjectCreated),
}

#[derive(Debug, Default)]
pub struct WizardController {
    config: ProjectConfiguration,
    phase: WizardPhase,
}

impl Default for WizardPhase {
    fn default() -> Self {
        WizardPhase::Editing(WizardStep::General)
    }
}

impl WizardController {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(config: ProjectConfiguration) -> Self {
        Self {
            config,
            phase: WizardPhase::default(),
        }
    }

    pub fn config(&self) -> &ProjectConfiguration {
        &self.config
    }

    pub fn phase(&self) -> &WizardPhase {
        &self.phase
    }

    /// Step the user is looking at. Submission and completion both happen on
    /// the preview step.
    pub fn step(&self) -> WizardStep {
        match self.phase {
            WizardPhase::Editing(step) => step,
            WizardPhase::Submitting | WizardPhase::Completed(_) => WizardStep::Preview,
        }
    }

    pub fn is_submitting(&self) -> bool {
        matches!(self.phase, WizardPhase::Submitting)
    }

    pub fn is_completed(&self) -> bool {
        matches!(self.phase, WizardPhase::Completed(_))
    }

    /// `(title, is_reached)` for each step, for progress rendering.
    pub fn progress(&self) -> Vec<(&'static str, bool)> {
        let current = self.step().number();
        WizardStep::ALL
            .iter()
            .map(|s| (s.title(), s.number() <= current))
            .collect()
    }

    fn editing_step(&self) -> ServiceResult<WizardStep> {
        match &self.phase {
            WizardPhase::Editing(step) => Ok(*step),
            WizardPhase::Submitting => Err(ServiceError::SubmissionInProgress),
            WizardPhase::Completed(_) => Err(ServiceError::InvalidState(
                "Project already submitted".to_string(),
            )),
        }
    }

    /// Apply a configuration update. This is the only way the configuration changes.
    pub fn update(
        &mut self,
        apply: impl FnOnce(ProjectConfiguration) -> ProjectConfiguration,
    ) -> ServiceResult<()> {
        self.editing_step()?;
        let current = std::mem::take(&mut self.config);
        self.config = apply(current);
        Ok(())
    }

    /// Move forward one step. Only leaving `General` is validated; the
    /// exercise list is checked at submission, not here.
    pub fn next_step(&mut self) -> ServiceResult<WizardStep> {
        let step = self.editing_step()?;
        if step == WizardStep::General {
            if self.config.title().trim().is_empty() {
                return Err(ServiceError::validation("title", "Title is required"));
            }
            if self.config.document_id().is_none() {
                return Err(ServiceError::validation(
                    "document_id",
                    "Select a source document",
                ));
            }
        }
        if let Some(next) = step.next() {
            debug!(from = step.title(), to = next.title(), "Wizard step forward");
            self.phase = WizardPhase::Editing(next);
        }
        Ok(self.step())
    }

    /// Move back one step without validating or clearing anything.
    pub fn prev_step(&mut self) -> ServiceResult<WizardStep> {
        let step = self.editing_step()?;
        if let Some(prev) = step.prev() {
            debug!(from = step.title(), to = prev.title(), "Wizard step back");
            self.phase = WizardPhase::Editing(prev);
        }
        Ok(self.step())
    }

    /// Validate and enter `Submitting`, returning the payload to send.
    pub fn begin_submission(&mut self) -> ServiceResult<ProjectPayload> {
        let step = self.editing_step()?;
        if step != WizardStep::Preview {
            return Err(ServiceError::InvalidState(format!(
                "Submission is only possible from the preview step (currently on {})",
                step.title()
            )));
        }
        self.config.validate()?;
        self.phase = WizardPhase::Submitting;
        Ok(self.config.build_submission_payload())
    }

    /// Leave `Submitting`: completion on success, back to the preview on failure.
    pub fn finish_submission(
        &mut self,
        outcome: ServiceResult<ProjectCreated>,
    ) -> ServiceResult<ProjectCreated> {
        if !self.is_submitting() {
            return Err(ServiceError::InvalidState(
                "No submission in progress".to_string(),
            ));
        }
        match outcome {
            Ok(created) => {
                info!(project_id = ?created.id, "Project created");
                self.phase = WizardPhase::Completed(created.clone());
                Ok(created)
            }
            Err(err) => {
                warn!(error = %err, "Project submission failed");
                self.phase = WizardPhase::Editing(WizardStep::Preview);
                Err(err)
            }
        }
    }

    pub async fn submit<A: ProjectApi>(&mut self, api: &A) -> ServiceResult<ProjectCreated> {
        let payload = self.begin_submission()?;
        info!(
            title = %payload.title,
            types = payload.config.exercises.types.len(),
            "Submitting project"
        );
        let outcome = api.create_project(&payload).await;
        self.finish_submission(outcome)
    }
}
