//! Command dispatch for the `genex` binary.

use std::time::Duration;

use colored::Colorize;
use dialoguer::theme::ColorfulTheme;
use dialoguer::{Confirm, Input, Password, Select};
use serde_json::Value;
use tracing::debug;

use crate::cli::{
    Cli, Command, DocumentsArgs, DownloadArgs, LoginArgs, NewProjectArgs, RegisterArgs, ServiceCommand,
    ThemeAction, TranslateArgs,
};
use crate::config::Services;
use crate::error::{ServiceError, ServiceResult};
use crate::genex::client::Materialized;
use crate::genex::dashboard;
use crate::genex::forms::{LoginForm, RegisterForm, password_strength, strength_label};
use crate::genex::library::{self, LibraryQuery};
use crate::genex::project::{
    AdvancedOptions, CourseMetadata, EntryField, ExerciseKind, MAX_DIFFICULTY,
    ProjectConfiguration, ProjectPayload, parse_positive,
};
use crate::genex::translate::{
    RecentTranslation, TranslationOptions, TranslationRequest, language_name,
};
use crate::genex::wizard::{ProjectApi, WizardController, WizardStep};
use crate::metadata::{PKG_NAME, PKG_VERSION};
use crate::theme::THEMES;
use crate::types::{ExerciseSheet, ProjectCreated, TranslationState};

const POLL_INTERVAL: Duration = Duration::from_secs(2);
const MAX_POLLS: usize = 150;

pub async fn run(cli: Cli) -> ServiceResult<()> {
    let Cli { config, command } = cli;
    match command {
        Command::Version => print_version(),
        Command::Schema => print_schema(),
        Command::Service(command) => {
            let mut services = Services::from_config(&config)?;
            dispatch(&mut services, command).await
        }
    }
}

async fn dispatch(services: &mut Services, command: ServiceCommand) -> ServiceResult<()> {
    match command {
        ServiceCommand::Login(args) => login(services, args).await,
        ServiceCommand::Register(args) => register(services, args).await,
        ServiceCommand::Logout => {
            services.session.logout()?;
            println!("{}", "Logged out.".green());
            Ok(())
        }
        ServiceCommand::Whoami => whoami(services),
        ServiceCommand::SetProfile { field, value } => {
            let value = serde_json::from_str(&value).unwrap_or(Value::String(value));
            services.session.update_user_field(&field, value)?;
            whoami(services)
        }
        ServiceCommand::Documents(args) => documents(services, args).await,
        ServiceCommand::Upload { file } => {
            let document = services.client.upload_document(&file).await?;
            println!("{} {} ({})", "Uploaded".green(), document.filename, document.id.bold());
            Ok(())
        }
        ServiceCommand::Sheets { project } => sheets(services, project).await,
        ServiceCommand::SheetInfo { id } => {
            let info = services.client.sheet_info(&id).await?;
            print_sheet(&info.sheet);
            println!("  exercises: {}", info.exercises_count);
            println!("  questions pdf: {}", yes_no(info.has_questions_pdf));
            println!("  answers pdf: {}", yes_no(info.has_answers_pdf));
            Ok(())
        }
        ServiceCommand::CheckFiles { id } => {
            let files = services.client.check_sheet_files(&id).await?;
            println!("{}", files.sheet_id.bold());
            for (name, check) in [("questions", &files.questions), ("answers", &files.answers)] {
                println!(
                    "  {name}: {} {}",
                    yes_no(check.exists),
                    check.path.as_deref().or(check.url.as_deref()).unwrap_or("-").dimmed()
                );
            }
            Ok(())
        }
        ServiceCommand::Download(args) => download(services, args).await,
        ServiceCommand::Preview { id, part } => {
            let preview = services.client.preview_sheet(&id, part).await?;
            print_materialized("Preview ready", &preview);
            Ok(())
        }
        ServiceCommand::DeleteSheet { id, yes } => delete_sheet(services, &id, yes).await,
        ServiceCommand::NewProject(args) => new_project(services, args).await,
        ServiceCommand::Translate(args) => translate(services, args).await,
        ServiceCommand::TranslationStatus { task } => {
            let status = services.client.translation_status(&task).await?;
            println!("{} {:?} ({}%)", status.task_id.bold(), status.status, status.progress);
            if let Some(error) = status.error {
                println!("  {}", error.red());
            }
            if status.status == TranslationState::Completed {
                println!(
                    "  {} pages, {} words, {:.1}s",
                    status.pages, status.word_count, status.processing_time
                );
            }
            Ok(())
        }
        ServiceCommand::TranslationDownload { task, name } => {
            let filename = name
                .or_else(|| services.history.find(&task).map(|entry| entry.translated_name))
                .unwrap_or_else(|| format!("{task}.pdf"));
            let file = services.client.download_translation(&task, &filename).await?;
            print_materialized("Saved", &file);
            Ok(())
        }
        ServiceCommand::History => {
            let entries = services.history.list();
            if entries.is_empty() {
                println!("{}", "No recent translations.".dimmed());
            }
            for entry in entries {
                println!(
                    "{}  {} → {}  {} ({} → {})",
                    entry.timestamp.format("%Y-%m-%d %H:%M").to_string().dimmed(),
                    entry.original_name,
                    entry.translated_name.bold(),
                    entry.task_id.dimmed(),
                    language_name(&entry.source_language),
                    language_name(&entry.target_language),
                );
            }
            Ok(())
        }
        ServiceCommand::Theme { action } => theme(services, action),
        ServiceCommand::Dashboard => {
            let stats = dashboard::load(&services.client, &services.history.list()).await?;
            println!("{}", "GenEx dashboard".bold());
            println!("  documents:            {}", stats.documents);
            println!("  projects:             {}", stats.projects);
            println!("  exercise sheets:      {}", stats.sheets);
            println!("  with questions PDF:   {}", stats.sheets_with_questions);
            println!("  with answers PDF:     {}", stats.sheets_with_answers);
            println!("  recent translations:  {}", stats.recent_translations);
            for (status, count) in &stats.sheets_by_status {
                println!("  status {status}: {count}");
            }
            if !stats.latest_sheets.is_empty() {
                println!("{}", "Latest sheets".bold());
                stats.latest_sheets.iter().for_each(print_sheet);
            }
            Ok(())
        }
    }
}

fn yes_no(value: bool) -> colored::ColoredString {
    if value { "yes".green() } else { "no".red() }
}

fn print_materialized(verb: &str, file: &Materialized) {
    println!(
        "{} {} ({} bytes, {})",
        verb.green(),
        file.path.display(),
        file.bytes,
        file.object_url.to_string().dimmed()
    );
}

fn print_sheet(sheet: &ExerciseSheet) {
    println!(
        "{}  {}  {}  {}",
        sheet.id.bold(),
        sheet.project_id.as_deref().unwrap_or("-"),
        sheet.status.as_deref().unwrap_or("-"),
        sheet.created_at.as_deref().unwrap_or("-").dimmed()
    );
}

fn print_version() -> ServiceResult<()> {
    println!("{PKG_NAME} {PKG_VERSION}");
    Ok(())
}

fn print_schema() -> ServiceResult<()> {
    let schema = schemars::schema_for!(ProjectPayload);
    println!("{}", serde_json::to_string_pretty(&schema)?);
    Ok(())
}

async fn login(services: &Services, args: LoginArgs) -> ServiceResult<()> {
    let theme = ColorfulTheme::default();
    let email = match args.email {
        Some(email) => email,
        None => Input::<String>::with_theme(&theme)
            .with_prompt("Email")
            .interact_text()?,
    };
    let password = match args.password {
        Some(password) => password,
        None => Password::with_theme(&theme).with_prompt("Password").interact()?,
    };

    let form = LoginForm { email, password };
    if let Some(error) = form.validate().into_iter().next() {
        return Err(ServiceError::validation(error.field, error.message));
    }

    let response = services
        .client
        .sign_in(form.email.trim(), &form.password)
        .await?;
    let who = response
        .user
        .as_ref()
        .and_then(|u| u.name.clone().or_else(|| u.email.clone()))
        .unwrap_or_else(|| form.email.trim().to_string());
    println!("{} {}", "Logged in as".green(), who.bold());
    Ok(())
}

async fn register(services: &Services, args: RegisterArgs) -> ServiceResult<()> {
    let theme = ColorfulTheme::default();
    let prompt = |label: &str, value: Option<String>| -> ServiceResult<String> {
        match value {
            Some(value) => Ok(value),
            None => Ok(Input::<String>::with_theme(&theme)
                .with_prompt(label)
                .interact_text()?),
        }
    };
    let name = prompt("Full name", args.name)?;
    let email = prompt("Email", args.email)?;
    let password = Password::with_theme(&theme)
        .with_prompt("Password")
        .interact()?;
    let strength = password_strength(&password);
    println!("  strength: {} ({strength}/4)", strength_label(strength).bold());
    let confirm_password = Password::with_theme(&theme)
        .with_prompt("Confirm password")
        .interact()?;
    let accept_terms = Confirm::with_theme(&theme)
        .with_prompt("Accept the terms and conditions?")
        .default(false)
        .interact()?;

    let form = RegisterForm {
        name,
        email,
        password,
        confirm_password,
        accept_terms,
    };
    let errors = form.validate();
    if let Some(first) = errors.first() {
        for error in &errors {
            println!("{} {}: {}", "✗".red(), error.field, error.message);
        }
        return Err(ServiceError::validation(first.field, first.message));
    }

    let role_id = match args.role {
        Some(role) => role,
        None => {
            let roles = services.client.list_roles().await?;
            if roles.is_empty() {
                return Err(ServiceError::InvalidState(
                    "The server has no roles to assign".to_string(),
                ));
            }
            let labels: Vec<&str> = roles.iter().map(|r| r.role_name.as_str()).collect();
            let choice = Select::with_theme(&theme)
                .with_prompt("Role")
                .items(&labels)
                .default(0)
                .interact()?;
            roles[choice].id.clone()
        }
    };

    let user = services.client.register(&form.to_new_user(role_id)).await?;
    println!(
        "{} {} ({})",
        "Account created for".green(),
        user.email.as_deref().unwrap_or(form.email.trim()).bold(),
        user.id.as_deref().unwrap_or("-").dimmed()
    );
    println!("  Run `genex login` to start a session.");
    Ok(())
}

fn whoami(services: &Services) -> ServiceResult<()> {
    let session = services.session.snapshot();
    if !session.is_authenticated() {
        println!("{}", "Not logged in.".yellow());
        return Ok(());
    }
    match session.user {
        Some(user) => {
            println!(
                "{} {}",
                user.name.as_deref().unwrap_or("(no name)").bold(),
                user.email.as_deref().unwrap_or("").dimmed()
            );
            if let Some(id) = user.id {
                println!("  id: {id}");
            }
            for (key, value) in &user.extra {
                println!("  {key}: {value}");
            }
        }
        None => println!("{}", "Logged in (no profile stored).".green()),
    }
    Ok(())
}

async fn documents(services: &Services, args: DocumentsArgs) -> ServiceResult<()> {
    let entries = library::catalog(services.client.list_documents().await?);
    let query = LibraryQuery {
        search: args.search.unwrap_or_default(),
        category: args.category,
        sort: args.sort,
    };
    let selected = library::filter_and_sort(&entries, &query);
    for entry in &selected {
        let doc = &entry.document;
        println!(
            "{}  {:<9}  {}  {}  {}",
            doc.id.bold(),
            entry.category.label(),
            doc.filename,
            doc.size.map(library::format_size).unwrap_or_else(|| "-".into()),
            entry
                .uploaded
                .map(|at| at.format("%Y-%m-%d").to_string())
                .unwrap_or_default()
                .dimmed()
        );
    }
    let categories: Vec<&str> = library::categories(&entries)
        .iter()
        .map(|c| c.label())
        .collect();
    println!(
        "{}",
        format!(
            "{} of {} documents, {} total. Categories: {}",
            selected.len(),
            entries.len(),
            library::format_size(library::total_size(&entries)),
            categories.join(", ")
        )
        .dimmed()
    );
    Ok(())
}

async fn sheets(services: &Services, project: Option<String>) -> ServiceResult<()> {
    match project {
        Some(project_id) => {
            let project = services.client.project_sheets(&project_id).await?;
            println!(
                "{} {} ({} sheets)",
                project.project_title.as_deref().unwrap_or("Project").bold(),
                project.project_id.dimmed(),
                project.sheets_count
            );
            for info in &project.sheets {
                print_sheet(&info.sheet);
            }
        }
        None => {
            let sheets = services.client.list_exercise_sheets().await?;
            if sheets.is_empty() {
                println!("{}", "No exercise sheets yet.".dimmed());
            }
            sheets.iter().for_each(print_sheet);
        }
    }
    Ok(())
}

async fn download(services: &Services, args: DownloadArgs) -> ServiceResult<()> {
    let filename = args
        .name
        .unwrap_or_else(|| args.part.default_filename().to_string());
    let file = services
        .client
        .download_sheet_as(&args.id, args.part, &filename)
        .await?;
    print_materialized("Saved", &file);
    Ok(())
}

async fn delete_sheet(services: &Services, id: &str, yes: bool) -> ServiceResult<()> {
    let confirmed = yes
        || Confirm::with_theme(&ColorfulTheme::default())
            .with_prompt(format!("Delete sheet {id} and its PDFs?"))
            .default(false)
            .interact()?;
    if !confirmed {
        println!("{}", "Cancelled.".yellow());
        return Ok(());
    }
    let ack = services.client.delete_sheet(id).await?;
    println!("{} {}", "Deleted".green(), ack.message);
    for file in ack.deleted_files {
        println!("  {}", file.dimmed());
    }
    Ok(())
}

async fn translate(services: &Services, args: TranslateArgs) -> ServiceResult<()> {
    let options = TranslationOptions {
        preserve_formatting: !args.no_formatting,
        keep_images: !args.no_images,
        quality: args.quality,
    };
    let request = TranslationRequest::new(&args.file, &args.from, &args.to, options)?;
    let job = services.client.translate_pdf(&request).await?;
    let entry = RecentTranslation::from_job(&request, &job, chrono::Utc::now());
    services.history.push(entry.clone())?;

    println!(
        "{} {} → {} ({})",
        "Translated".green(),
        entry.original_name,
        entry.translated_name.bold(),
        job.task_id.dimmed()
    );
    println!(
        "  {} pages, {} words, {} detected, {:.1}s",
        job.pages,
        job.word_count,
        language_name(&entry.source_language),
        job.processing_time
    );

    if args.download {
        wait_for_translation(services, &job.task_id, job.status).await?;
        let file = services
            .client
            .download_translation(&job.task_id, &entry.translated_name)
            .await?;
        print_materialized("Saved", &file);
    }
    Ok(())
}

async fn wait_for_translation(
    services: &Services,
    task_id: &str,
    initial: Option<TranslationState>,
) -> ServiceResult<()> {
    let mut state = initial.unwrap_or(TranslationState::Pending);
    let mut error = None;
    for attempt in 0..=MAX_POLLS {
        if state.is_terminal() {
            return match state {
                TranslationState::Completed => Ok(()),
                _ => Err(ServiceError::InvalidState(
                    error.unwrap_or_else(|| format!("Translation {task_id} failed")),
                )),
            };
        }
        if attempt == MAX_POLLS {
            break;
        }
        tokio::time::sleep(POLL_INTERVAL).await;
        let status = services.client.translation_status(task_id).await?;
        debug!(task_id, progress = status.progress, "Translation progress");
        state = status.status;
        error = status.error;
    }
    Err(ServiceError::InvalidState(format!(
        "Translation {task_id} did not finish in time"
    )))
}

fn theme(services: &mut Services, action: Option<ThemeAction>) -> ServiceResult<()> {
    match action.unwrap_or(ThemeAction::Show {
        css: false,
        variable: None,
    }) {
        ThemeAction::List => {
            let active = services.themes.active().id;
            for theme in THEMES.iter() {
                let marker = if theme.id == active { "*" } else { " " };
                println!("{marker} {:<6} {} ({:?})", theme.id.bold(), theme.name, theme.appearance);
            }
        }
        ThemeAction::Show {
            variable: Some(property),
            ..
        } => {
            let active = services.themes.active();
            let value = active.variable(&property).ok_or_else(|| {
                ServiceError::InvalidState(format!("{} has no {property}", active.id))
            })?;
            println!("{value}");
        }
        ThemeAction::Show { css, variable: None } => {
            let active = services.themes.active();
            println!(
                "{} (preference: {})",
                active.name.bold(),
                services.themes.preference()
            );
            if css {
                println!("{}", active.css());
            }
        }
        ThemeAction::Set { id } => {
            let active = services.themes.set_preference(&id)?;
            println!("{} {} → {}", "Theme set:".green(), id, active.name.bold());
        }
    }
    Ok(())
}

// ----- project wizard -----

enum Nav {
    Next,
    Back,
    Cancel,
}

fn navigate(theme: &ColorfulTheme, step: WizardStep) -> ServiceResult<Nav> {
    let (items, navs): (Vec<&str>, Vec<Nav>) = match step {
        WizardStep::General => (vec!["Continue", "Cancel"], vec![Nav::Next, Nav::Cancel]),
        WizardStep::Preview => (
            vec!["Create project", "Back", "Cancel"],
            vec![Nav::Next, Nav::Back, Nav::Cancel],
        ),
        _ => (
            vec!["Continue", "Back", "Cancel"],
            vec![Nav::Next, Nav::Back, Nav::Cancel],
        ),
    };
    let choice = Select::with_theme(theme)
        .items(&items)
        .default(0)
        .interact()?;
    navs.into_iter()
        .nth(choice)
        .ok_or_else(|| ServiceError::InvalidState("invalid selection".into()))
}

fn prompt_number(theme: &ColorfulTheme, prompt: &str, default: u32) -> ServiceResult<u32> {
    let raw = Input::<String>::with_theme(theme)
        .with_prompt(prompt)
        .default(default.to_string())
        .interact_text()?;
    Ok(parse_positive(&raw))
}

fn prompt_text(theme: &ColorfulTheme, prompt: &str, default: &str) -> ServiceResult<String> {
    Ok(Input::<String>::with_theme(theme)
        .with_prompt(prompt)
        .default(default.to_string())
        .allow_empty(true)
        .interact_text()?)
}

fn print_progress(wizard: &WizardController) {
    let steps: Vec<String> = wizard
        .progress()
        .into_iter()
        .map(|(title, reached)| {
            if reached {
                title.bold().to_string()
            } else {
                title.dimmed().to_string()
            }
        })
        .collect();
    println!("\n{}", steps.join(" › "));
}

async fn new_project(services: &Services, args: NewProjectArgs) -> ServiceResult<()> {
    if !services.session.is_authenticated() {
        return Err(ServiceError::Unauthorized(
            "Log in before creating a project.".to_string(),
        ));
    }
    let theme = ColorfulTheme::default();
    let user_id = services.session.user().and_then(|user| user.id);
    let mut wizard = WizardController::with_config(
        ProjectConfiguration::new()
            .set_user(user_id)
            .set_title(args.title.unwrap_or_default()),
    );

    let document_id = match args.document {
        Some(id) => id,
        None => pick_document(services, &theme).await?,
    };
    wizard.update(|config| config.set_document(document_id))?;

    loop {
        print_progress(&wizard);
        let step = wizard.step();
        match step {
            WizardStep::General => edit_general(&mut wizard, &theme)?,
            WizardStep::Exercises => edit_exercises(&mut wizard, &theme)?,
            WizardStep::Advanced => edit_advanced(&mut wizard, &theme)?,
            WizardStep::Preview => print_preview(wizard.config()),
        }

        match navigate(&theme, step)? {
            Nav::Cancel => {
                println!("{}", "Project creation cancelled.".yellow());
                return Ok(());
            }
            Nav::Back => {
                wizard.prev_step()?;
            }
            Nav::Next if step == WizardStep::Preview => {
                if let Some(created) = submit_from_preview(&mut wizard, &services.client).await {
                    println!(
                        "{} {}",
                        "Project created:".green(),
                        created.id.as_deref().unwrap_or("(no id returned)").bold()
                    );
                    return Ok(());
                }
            }
            Nav::Next => match wizard.next_step() {
                Ok(_) => {}
                Err(ServiceError::Validation { field, message }) => {
                    println!("{} {field}: {message}", "✗".red());
                }
                Err(err) => return Err(err),
            },
        }
    }
}

/// Submit from the preview. Any failure is reported and leaves the wizard on
/// the preview with its configuration intact, ready for another attempt.
async fn submit_from_preview<A: ProjectApi>(
    wizard: &mut WizardController,
    api: &A,
) -> Option<ProjectCreated> {
    match wizard.submit(api).await {
        Ok(created) => Some(created),
        Err(err) => {
            print_submit_error(&err);
            None
        }
    }
}

fn print_submit_error(err: &ServiceError) {
    match err {
        ServiceError::Validation { field, message } => {
            println!("{} {field}: {message}", "✗".red());
        }
        err => {
            println!("{} {}", "✗ Project creation failed:".red(), err.to_string().red());
            println!("  {}", "Choose \"Create project\" to retry or \"Back\" to edit.".dimmed());
        }
    }
}

async fn pick_document(services: &Services, theme: &ColorfulTheme) -> ServiceResult<String> {
    let documents = services.client.list_documents().await?;
    if documents.is_empty() {
        return Err(ServiceError::validation(
            "document_id",
            "No documents uploaded yet. Run `genex upload <file>` first.",
        ));
    }
    let items: Vec<String> = documents
        .iter()
        .map(|doc| format!("{} ({})", doc.filename, doc.id))
        .collect();
    let choice = Select::with_theme(theme)
        .with_prompt("Source document")
        .items(&items)
        .default(0)
        .interact()?;
    Ok(documents[choice].id.clone())
}

fn edit_general(wizard: &mut WizardController, theme: &ColorfulTheme) -> ServiceResult<()> {
    let config = wizard.config();
    let title = prompt_text(theme, "Title", config.title())?;
    let source = prompt_text(theme, "Source language", &config.language_pair().source)?;
    let target = prompt_text(theme, "Target language", &config.language_pair().target)?;
    wizard.update(|config| config.set_title(title).set_language_pair(source, target))
}

fn edit_exercises(wizard: &mut WizardController, theme: &ColorfulTheme) -> ServiceResult<()> {
    let total = prompt_number(theme, "Total number of exercises", wizard.config().exercise_total())?;
    let difficulty = Select::with_theme(theme)
        .with_prompt("Overall difficulty")
        .items(&["1 - easy", "2 - medium", "3 - hard"])
        .default(wizard.config().global_difficulty().clamp(1, MAX_DIFFICULTY) as usize - 1)
        .interact()?;
    wizard.update(|config| {
        config
            .set_exercise_total(total)
            .set_global_difficulty(difficulty as u32 + 1)
    })?;

    loop {
        print_exercise_types(wizard.config());
        let action = Select::with_theme(theme)
            .with_prompt("Exercise types")
            .items(&["Add a type", "Edit an entry", "Remove an entry", "Done"])
            .default(0)
            .interact()?;
        match action {
            0 => {
                let labels: Vec<String> = ExerciseKind::ALL
                    .iter()
                    .map(|kind| format!("{} ({})", kind.label(), kind.bloom_levels().join(", ")))
                    .collect();
                let index = Select::with_theme(theme)
                    .with_prompt("Type")
                    .items(&labels)
                    .default(0)
                    .interact()?;
                let kind = ExerciseKind::ALL[index];
                let count = prompt_number(theme, "Count", 1)?;
                let per_exercise = prompt_number(theme, "Questions per exercise", 1)?;
                let level = prompt_number(theme, "Difficulty level", MAX_DIFFICULTY)?;
                wizard.update(|config| config.add_or_merge_exercise_type(kind, count, per_exercise, level))?;
            }
            1 | 2 if wizard.config().exercise_types().is_empty() => {
                println!("{}", "No exercise types yet.".dimmed());
            }
            1 => {
                let index = pick_entry(wizard.config(), theme)?;
                let field = Select::with_theme(theme)
                    .with_prompt("Field")
                    .items(&["Count", "Questions per exercise", "Difficulty level"])
                    .default(0)
                    .interact()?;
                let value = prompt_number(theme, "New value", 1)?;
                let field = match field {
                    0 => EntryField::Count(value),
                    1 => EntryField::QuestionsPerExercise(value),
                    _ => EntryField::DifficultyLevel(value),
                };
                wizard.update(|config| config.update_exercise_type_field(index, field))?;
            }
            2 => {
                let index = pick_entry(wizard.config(), theme)?;
                wizard.update(|config| config.remove_exercise_type(index))?;
            }
            _ => return Ok(()),
        }
    }
}

fn pick_entry(config: &ProjectConfiguration, theme: &ColorfulTheme) -> ServiceResult<usize> {
    let labels: Vec<String> = config
        .exercise_types()
        .iter()
        .map(|entry| format!("{} x{}", entry.label, entry.count))
        .collect();
    Ok(Select::with_theme(theme)
        .with_prompt("Entry")
        .items(&labels)
        .default(0)
        .interact()?)
}

fn print_exercise_types(config: &ProjectConfiguration) {
    if config.exercise_types().is_empty() {
        println!("  {}", "(no exercise types)".dimmed());
    }
    for (index, entry) in config.exercise_types().iter().enumerate() {
        println!(
            "  {index}. {} [{}] count {}, {} question(s) each, level {}",
            entry.label, entry.kind, entry.count, entry.questions_per_exercise, entry.difficulty_level
        );
    }
}

fn edit_advanced(wizard: &mut WizardController, theme: &ColorfulTheme) -> ServiceResult<()> {
    let current = wizard.config().advanced().clone();
    let confirm = |prompt: &str, default: bool| -> ServiceResult<bool> {
        Ok(Confirm::with_theme(theme)
            .with_prompt(prompt)
            .default(default)
            .interact()?)
    };

    let generate_answers = confirm("Generate answer key", wizard.config().generate_answers())?;
    let mut advanced = AdvancedOptions {
        include_explanations: confirm("Include explanations", current.include_explanations)?,
        include_rubrics: confirm("Include grading rubrics", current.include_rubrics)?,
        ..current
    };
    advanced.scaffolding.provide_hints = confirm("Provide hints", advanced.scaffolding.provide_hints)?;
    advanced.scaffolding.include_examples =
        confirm("Include worked examples", advanced.scaffolding.include_examples)?;
    advanced.scaffolding.formula_sheet = confirm("Attach a formula sheet", advanced.scaffolding.formula_sheet)?;
    let structure = &mut advanced.output.structure;
    structure.cover_page = confirm("Add a cover page", structure.cover_page)?;
    structure.answer_sheet_separate =
        confirm("Separate answer sheet", structure.answer_sheet_separate)?;

    let non_empty = |value: String| (!value.trim().is_empty()).then_some(value);
    advanced.metadata = CourseMetadata {
        subject_area: non_empty(prompt_text(
            theme,
            "Subject area",
            advanced.metadata.subject_area.as_deref().unwrap_or(""),
        )?),
        educational_level: non_empty(prompt_text(
            theme,
            "Educational level",
            advanced.metadata.educational_level.as_deref().unwrap_or(""),
        )?),
    };

    wizard.update(|config| config.set_generate_answers(generate_answers).set_advanced(advanced))
}

fn print_preview(config: &ProjectConfiguration) {
    println!("{}", config.title().bold());
    println!("  document: {}", config.document_id().unwrap_or("-"));
    println!(
        "  language: {} → {}",
        language_name(&config.language_pair().source),
        language_name(&config.language_pair().target)
    );
    println!(
        "  exercises: {} requested, {} configured across types, difficulty {}",
        config.exercise_total(),
        config.configured_exercise_count(),
        config.global_difficulty()
    );
    print_exercise_types(config);
    println!("  answer key: {}", yes_no(config.generate_answers()));
    if config.exercise_total() != config.configured_exercise_count() {
        println!(
            "  {}",
            "note: the requested total is independent of the per-type counts".dimmed()
        );
    }
}
