use std::error::Error;
use std::fmt;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use tracing::{info, warn};

use crate::catalog::{Catalog, CatalogError};
use crate::db::{RecordStore, SqliteStore, StoreError};
use crate::domain::labor::ParseLaborError;
use crate::domain::quantity::InvalidQuantity;
use crate::domain::record::{FieldRecord, ParseRecordDateError};
use crate::domain::worker::ParseWorkerError;
use crate::form::{Acknowledgement, EntryForm, FormError};
use crate::history::{render_csv, HistoryFilter, HistoryView};

/// Process-wide context: the one store handle plus the catalog. Commands
/// receive it by reference.
pub struct App {
    store: Box<dyn RecordStore>,
    catalog: Catalog,
}

/// Where `export` sends its CSV. `-` on the command line means stdout.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExportDestination {
    File(PathBuf),
    Stdout,
}

impl ExportDestination {
    pub fn from_arg(raw: &str) -> Self {
        if raw == "-" {
            ExportDestination::Stdout
        } else {
            ExportDestination::File(PathBuf::from(raw))
        }
    }
}

impl fmt::Display for ExportDestination {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExportDestination::File(path) => write!(f, "{}", path.display()),
            ExportDestination::Stdout => write!(f, "stdout"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExportOutcome {
    Written {
        destination: ExportDestination,
        rows: usize,
    },
    Skipped { message: &'static str },
}

impl App {
    pub fn open(db_path: &str) -> Result<Self, AppError> {
        let store = SqliteStore::open(db_path)?;
        Self::with_store(Box::new(store))
    }

    pub fn with_store(store: Box<dyn RecordStore>) -> Result<Self, AppError> {
        let catalog = Catalog::load()?;
        Ok(Self { store, catalog })
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    pub fn new_form(&self) -> EntryForm<'_> {
        EntryForm::new(&self.catalog)
    }

    /// Persists the form's current record. Crop and pest must name an entry
    /// of this app's catalog; the store itself never checks them.
    pub fn submit(&self, form: &mut EntryForm<'_>) -> Result<Acknowledgement, AppError> {
        let draft = form.record();
        self.require_catalog_pair(&draft)?;
        let ack = form.submit(self.store.as_ref())?;
        info!(crop = %ack.crop, labor = %ack.labor, "recorded field activity");
        Ok(ack)
    }

    pub fn history(&self, filter: &HistoryFilter) -> Result<HistoryView, AppError> {
        let records = self.store.list_all()?;
        Ok(HistoryView::build(records, filter))
    }

    /// Writes the filtered history as CSV to `destination`. Nothing is
    /// written anywhere when the view is empty.
    pub fn export_csv(
        &self,
        filter: &HistoryFilter,
        destination: &ExportDestination,
    ) -> Result<ExportOutcome, AppError> {
        let mut stdout = io::stdout().lock();
        self.export_csv_with(filter, destination, &mut stdout)
    }

    /// Same as [`App::export_csv`] with `stdout` standing in for the
    /// process's standard output.
    pub fn export_csv_with(
        &self,
        filter: &HistoryFilter,
        destination: &ExportDestination,
        stdout: &mut dyn Write,
    ) -> Result<ExportOutcome, AppError> {
        let view = self.history(filter)?;
        let csv = match &view {
            HistoryView::Empty { message } => {
                let message = *message;
                warn!(reason = message, %destination, "export skipped");
                return Ok(ExportOutcome::Skipped { message });
            }
            HistoryView::Table { rows } => render_csv(rows.iter().map(|row| &row.record)),
        };
        match destination {
            ExportDestination::File(path) => {
                ensure_parent_dir(path)?;
                std::fs::write(path, csv.as_bytes())?;
            }
            ExportDestination::Stdout => {
                stdout.write_all(csv.as_bytes())?;
                stdout.flush()?;
            }
        }
        let rows = view.rows().len();
        info!(%destination, rows, "exported history");
        Ok(ExportOutcome::Written {
            destination: destination.clone(),
            rows,
        })
    }

    fn require_catalog_pair(&self, record: &FieldRecord) -> Result<(), AppError> {
        if self.catalog.contains(&record.crop, &record.pest) {
            return Ok(());
        }
        // distinguishes an unknown crop from a pest that belongs elsewhere
        self.catalog.crop(&record.crop)?;
        Err(CatalogError::UnknownPest {
            crop: record.crop.clone(),
            pest: record.pest.clone(),
        }
        .into())
    }
}

fn ensure_parent_dir(path: &Path) -> Result<(), AppError> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }
    Ok(())
}

#[derive(Debug)]
pub enum AppError {
    Io(std::io::Error),
    Store(StoreError),
    Catalog(CatalogError),
    Form(FormError),
    InvalidQuantity(InvalidQuantity),
    ParseWorker(ParseWorkerError),
    ParseLabor(ParseLaborError),
    ParseDate(ParseRecordDateError),
    Json(serde_json::Error),
    InvalidArgument(String),
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppError::Io(err) => write!(f, "I/O error: {}", err),
            AppError::Store(err) => write!(f, "{}", err),
            AppError::Catalog(err) => write!(f, "{}", err),
            AppError::Form(err) => write!(f, "{}", err),
            AppError::InvalidQuantity(err) => write!(f, "{}", err),
            AppError::ParseWorker(err) => write!(f, "{}", err),
            AppError::ParseLabor(err) => write!(f, "{}", err),
            AppError::ParseDate(err) => write!(f, "{}", err),
            AppError::Json(err) => write!(f, "JSON error: {}", err),
            AppError::InvalidArgument(message) => write!(f, "{}", message),
        }
    }
}

impl Error for AppError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            AppError::Io(err) => Some(err),
            AppError::Store(err) => Some(err),
            AppError::Catalog(err) => Some(err),
            AppError::Form(err) => Some(err),
            AppError::InvalidQuantity(err) => Some(err),
            AppError::ParseWorker(err) => Some(err),
            AppError::ParseLabor(err) => Some(err),
            AppError::ParseDate(err) => Some(err),
            AppError::Json(err) => Some(err),
            AppError::InvalidArgument(_) => None,
        }
    }
}

impl From<std::io::Error> for AppError {
    fn from(value: std::io::Error) -> Self {
        AppError::Io(value)
    }
}

impl From<StoreError> for AppError {
    fn from(value: StoreError) -> Self {
        AppError::Store(value)
    }
}

impl From<CatalogError> for AppError {
    fn from(value: CatalogError) -> Self {
        AppError::Catalog(value)
    }
}

impl From<FormError> for AppError {
    fn from(value: FormError) -> Self {
        AppError::Form(value)
    }
}

impl From<InvalidQuantity> for AppError {
    fn from(value: InvalidQuantity) -> Self {
        AppError::InvalidQuantity(value)
    }
}

impl From<ParseWorkerError> for AppError {
    fn from(value: ParseWorkerError) -> Self {
        AppError::ParseWorker(value)
    }
}

impl From<ParseLaborError> for AppError {
    fn from(value: ParseLaborError) -> Self {
        AppError::ParseLabor(value)
    }
}

impl From<ParseRecordDateError> for AppError {
    fn from(value: ParseRecordDateError) -> Self {
        AppError::ParseDate(value)
    }
}

impl From<serde_json::Error> for AppError {
    fn from(value: serde_json::Error) -> Self {
        AppError::Json(value)
    }
}

#[cfg(test)]
mod tests;
