use std::str::FromStr;

use clap::builder::styling::{AnsiColor, Effects, Styles};
use clap::{Args, CommandFactory, Parser, Subcommand};

use crate::app::AppError;
use crate::domain::labor::Labor;
use crate::domain::record::RecordDate;
use crate::domain::worker::Worker;
use crate::history::HistoryFilter;

pub const DEFAULT_DB_PATH: &str = "chosetas_datos.db";
pub const DEFAULT_EXPORT_PATH: &str = "chosetas_datos.csv";

/// Flags `new --interactive` replaces with prompts.
const FORM_FIELD_ARGS: [&str; 9] = [
    "date", "worker", "crop", "labor", "pest", "product", "quantity", "notes", "json",
];

fn cli_styles() -> Styles {
    Styles::styled()
        .header(AnsiColor::BrightCyan.on_default() | Effects::BOLD)
        .usage(AnsiColor::BrightYellow.on_default() | Effects::BOLD)
        .literal(AnsiColor::BrightGreen.on_default() | Effects::BOLD)
        .placeholder(AnsiColor::BrightMagenta.on_default())
}

pub fn styled_command() -> clap::Command {
    Cli::command()
}

#[derive(Debug, Parser)]
#[command(name = "chosetas")]
#[command(bin_name = "chosetas")]
#[command(version)]
#[command(about = "Field log for JD Las Chosetas: labors, pests and treatments")]
#[command(styles = cli_styles())]
pub struct Cli {
    #[arg(
        short = 'd',
        long,
        global = true,
        env = "CHOSETAS_DB_PATH",
        default_value = DEFAULT_DB_PATH,
        help = "Path to the SQLite record store."
    )]
    pub db: String,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    #[command(about = "Register a field activity.")]
    New(NewArgs),
    #[command(about = "List recorded activities, newest first.")]
    History(HistoryArgs),
    #[command(about = "Write the history as CSV.")]
    Export(ExportArgs),
    #[command(about = "Show crops, pests and treatment recommendations.")]
    Catalog(CatalogArgs),
    #[command(about = "Print shell completions.")]
    Completions(CompletionsArgs),
}

#[derive(Debug, Args)]
pub struct NewArgs {
    #[arg(long, help = "Activity date as YYYY-MM-DD (defaults to today).")]
    pub date: Option<String>,

    #[arg(
        short = 'w',
        long,
        help = "Worker: Propietario, Trabajador 1, Trabajador 2 (or owner, worker1, worker2)."
    )]
    pub worker: Option<String>,

    #[arg(short = 'c', long, help = "Crop (defaults to the first catalog crop).")]
    pub crop: Option<String>,

    #[arg(short = 'l', long, help = "Labor performed, by name or alias.")]
    pub labor: Option<String>,

    #[arg(short = 'p', long, help = "Pest detected; must belong to the crop.")]
    pub pest: Option<String>,

    #[arg(long, help = "Product or batch used.")]
    pub product: Option<String>,

    #[arg(
        short = 'q',
        long,
        allow_negative_numbers = true,
        help = "Amount in L, Kg or hours (0 or greater)."
    )]
    pub quantity: Option<String>,

    #[arg(short = 'n', long, help = "Notes or location (sector).")]
    pub notes: Option<String>,

    #[arg(
        short = 'i',
        long,
        conflicts_with_all = FORM_FIELD_ARGS,
        help = "Fill the form field by field on the terminal."
    )]
    pub interactive: bool,

    #[arg(short = 'j', long, help = "Render machine-readable JSON.")]
    pub json: bool,
}

#[derive(Debug, Clone, Default, Args)]
pub struct FilterArgs {
    #[arg(short = 'c', long, help = "Only rows for this crop.")]
    pub crop: Option<String>,

    #[arg(short = 'w', long, help = "Only rows by this worker.")]
    pub worker: Option<String>,

    #[arg(short = 'l', long, help = "Only rows for this labor.")]
    pub labor: Option<String>,

    #[arg(long = "pests-only", help = "Only rows where a pest was detected.")]
    pub pests_only: bool,

    #[arg(long, help = "Earliest date, inclusive (YYYY-MM-DD).")]
    pub from: Option<String>,

    #[arg(long, help = "Latest date, inclusive (YYYY-MM-DD).")]
    pub to: Option<String>,

    #[arg(long, help = "Case-insensitive text search over product and notes.")]
    pub query: Option<String>,
}

impl FilterArgs {
    pub fn to_filter(&self) -> Result<HistoryFilter, AppError> {
        let from = parse_optional::<RecordDate>(self.from.as_deref())?;
        let to = parse_optional::<RecordDate>(self.to.as_deref())?;
        if let (Some(from), Some(to)) = (from, to) {
            if from > to {
                return Err(AppError::InvalidArgument(format!(
                    "--from {} is after --to {}",
                    from, to
                )));
            }
        }
        Ok(HistoryFilter {
            crop: self.crop.clone(),
            worker: parse_optional::<Worker>(self.worker.as_deref())?,
            labor: parse_optional::<Labor>(self.labor.as_deref())?,
            pests_only: self.pests_only,
            from,
            to,
            query: self.query.clone(),
        })
    }
}

fn parse_optional<T>(raw: Option<&str>) -> Result<Option<T>, AppError>
where
    T: FromStr,
    AppError: From<T::Err>,
{
    match raw.map(str::trim).filter(|value| !value.is_empty()) {
        Some(value) => Ok(Some(T::from_str(value)?)),
        None => Ok(None),
    }
}

#[derive(Debug, Args)]
pub struct HistoryArgs {
    #[command(flatten)]
    pub filter: FilterArgs,

    #[arg(short = 'j', long, help = "Render machine-readable JSON.")]
    pub json: bool,
}

#[derive(Debug, Args)]
pub struct ExportArgs {
    #[command(flatten)]
    pub filter: FilterArgs,

    #[arg(
        short = 'o',
        long,
        default_value = DEFAULT_EXPORT_PATH,
        help = "Destination file, or - for stdout."
    )]
    pub output: String,
}

#[derive(Debug, Args)]
pub struct CatalogArgs {
    #[arg(help = "Crop to show (all crops if omitted).")]
    pub crop: Option<String>,

    #[arg(
        short = 'p',
        long,
        requires = "crop",
        help = "Show the recommendation for one pest of the crop."
    )]
    pub pest: Option<String>,

    #[arg(short = 'j', long, help = "Render machine-readable JSON.")]
    pub json: bool,
}

#[derive(Debug, Args)]
pub struct CompletionsArgs {
    #[arg(help = "Shell name (bash, zsh, fish, elvish, powershell). Auto-detected if omitted.")]
    pub shell: Option<String>,
}

#[cfg(test)]
#[path = "cli_tests.rs"]
mod tests;
