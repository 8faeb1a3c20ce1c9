use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

use crate::config::ClientConfig;
use crate::genex::client::SheetPart;
use crate::genex::library::{Category, SortKey};
use crate::genex::translate::{TranslationQuality, target_languages};
use crate::metadata::{PKG_DESCRIPTION, PKG_NAME, PKG_VERSION};

#[derive(Parser, Debug, Clone)]
#[command(name = PKG_NAME)]
#[command(version = PKG_VERSION)]
#[command(about = PKG_DESCRIPTION, long_about = None)]
pub struct Cli {
    #[command(flatten)]
    pub config: ClientConfig,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Print the JSON schema of the project creation payload
    Schema,
    /// Print version information
    Version,
    #[command(flatten)]
    Service(ServiceCommand),
}

/// Commands that need the session store or the backend.
#[derive(Subcommand, Debug, Clone)]
pub enum ServiceCommand {
    /// Log in and store the access token
    Login(LoginArgs),
    /// Create an account
    Register(RegisterArgs),
    /// Forget the stored session
    Logout,
    /// Show the logged-in user
    Whoami,
    /// Set one field of the stored profile (value parsed as JSON when possible)
    SetProfile { field: String, value: String },
    /// List uploaded documents
    Documents(DocumentsArgs),
    /// Upload a course document
    Upload { file: PathBuf },
    /// List exercise sheets
    Sheets {
        /// Only sheets generated for this project
        #[arg(long)]
        project: Option<String>,
    },
    /// Show one sheet with its PDF availability
    SheetInfo { id: String },
    /// Check that a sheet's PDFs exist on the server
    CheckFiles { id: String },
    /// Download the questions or answers PDF of a sheet
    Download(DownloadArgs),
    /// Fetch a PDF into the preview cache
    Preview {
        id: String,
        #[arg(long, default_value = "questions")]
        part: SheetPart,
    },
    /// Delete a sheet and its files
    DeleteSheet {
        id: String,
        /// Skip the confirmation prompt
        #[arg(long, short)]
        yes: bool,
    },
    /// Create a project through the interactive wizard
    NewProject(NewProjectArgs),
    /// Translate a PDF
    Translate(TranslateArgs),
    /// Poll a translation task
    TranslationStatus { task: String },
    /// Download a translated PDF
    TranslationDownload {
        task: String,
        /// File name to save as (defaults to the one in history)
        #[arg(long)]
        name: Option<String>,
    },
    /// List the most recent translations
    History,
    /// Show or change the color theme
    Theme {
        #[command(subcommand)]
        action: Option<ThemeAction>,
    },
    /// Summary of documents, sheets and translations
    Dashboard,
}

#[derive(Args, Debug, Clone)]
pub struct LoginArgs {
    #[arg(long)]
    pub email: Option<String>,

    /// Read from the environment; prompted for when absent
    #[arg(long, env = "GENEX_PASSWORD", hide_env_values = true)]
    pub password: Option<String>,
}

#[derive(Args, Debug, Clone)]
pub struct RegisterArgs {
    #[arg(long)]
    pub name: Option<String>,

    #[arg(long)]
    pub email: Option<String>,

    /// Role id; chosen from the server's roles when absent
    #[arg(long)]
    pub role: Option<String>,
}

#[derive(Args, Debug, Clone)]
pub struct DocumentsArgs {
    /// Case-insensitive match on file name or extracted text
    #[arg(long, short)]
    pub search: Option<String>,

    /// documents, images, videos or other
    #[arg(long, short)]
    pub category: Option<Category>,

    /// date, name or size
    #[arg(long, default_value = "date")]
    pub sort: SortKey,
}

#[derive(Args, Debug, Clone)]
pub struct DownloadArgs {
    pub id: String,

    /// questions or answers
    #[arg(long, default_value = "questions")]
    pub part: SheetPart,

    /// File name to save as
    #[arg(long)]
    pub name: Option<String>,
}

#[derive(Args, Debug, Clone)]
pub struct NewProjectArgs {
    /// Preselect a document instead of choosing from the list
    #[arg(long)]
    pub document: Option<String>,

    #[arg(long)]
    pub title: Option<String>,
}

#[derive(Args, Debug, Clone)]
pub struct TranslateArgs {
    pub file: PathBuf,

    #[arg(long, default_value = "auto")]
    pub from: String,

    /// Any supported language except `auto`
    #[arg(long, value_parser = parse_target_language)]
    pub to: String,

    /// standard, high or premium
    #[arg(long, default_value = "high")]
    pub quality: TranslationQuality,

    /// Do not try to keep the original layout
    #[arg(long)]
    pub no_formatting: bool,

    /// Drop images from the translated document
    #[arg(long)]
    pub no_images: bool,

    /// Download the result once the job completes
    #[arg(long)]
    pub download: bool,
}

#[derive(Subcommand, Debug, Clone)]
pub enum ThemeAction {
    /// List available themes
    List,
    /// Show the active theme
    Show {
        /// Print the CSS custom properties
        #[arg(long)]
        css: bool,

        /// Print one custom property, e.g. `--accent-primary`
        #[arg(long = "var", value_name = "PROPERTY", allow_hyphen_values = true)]
        variable: Option<String>,
    },
    /// Persist a theme preference (`system`, `frost` or `onyx`)
    Set { id: String },
}

fn parse_target_language(value: &str) -> Result<String, String> {
    let code = value.trim().to_ascii_lowercase();
    if target_languages().any(|(known, _)| known == code) {
        return Ok(code);
    }
    let known: Vec<&str> = target_languages().map(|(known, _)| known).collect();
    Err(format!("unsupported target language '{value}' (one of {})", known.join(", ")))
}
