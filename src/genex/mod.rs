pub mod blob;
pub mod client;
pub mod dashboard;
pub mod forms;
pub mod library;
pub mod project;
pub mod translate;
pub mod wizard;

pub use client::{ApiClient, Materialized, SheetPart};
pub use project::{EntryField, ExerciseKind, ProjectConfiguration, ProjectPayload};
pub use wizard::{ProjectApi, WizardController, WizardPhase, WizardStep};
