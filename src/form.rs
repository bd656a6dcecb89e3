use std::error::Error;
use std::fmt;

use serde::Serialize;

use crate::catalog::{Catalog, CatalogError, CropEntry, PestEntry, PestList};
use crate::db::{RecordStore, StoreError};
use crate::domain::labor::Labor;
use crate::domain::quantity::{InvalidQuantity, Quantity};
use crate::domain::record::{FieldRecord, RecordDate};
use crate::domain::worker::Worker;

pub const COMPLIANCE_REMINDER: &str =
    "Nota: Consulte siempre el Registro Oficial de Fitosanitarios (MAPA) antes de aplicar.";

/// Treatment advice shown while a pest other than the sentinel is selected.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Advisory {
    pub crop: String,
    pub pest: String,
    pub recommendation: String,
    pub reminder: &'static str,
}

impl Advisory {
    /// `None` for the no-pest sentinel.
    pub fn for_entry(crop: &CropEntry, pest: &PestEntry) -> Option<Self> {
        if pest.is_none() {
            return None;
        }
        Some(Self {
            crop: crop.name.clone(),
            pest: pest.name.clone(),
            recommendation: pest.recommendation.clone(),
            reminder: COMPLIANCE_REMINDER,
        })
    }

    pub fn headline(&self) -> String {
        format!("ALERTA DETECTADA EN {}", self.crop.to_uppercase())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Acknowledgement {
    pub labor: Labor,
    pub crop: String,
    pub message: String,
}

impl Acknowledgement {
    fn for_record(record: &FieldRecord) -> Self {
        Self {
            labor: record.labor,
            crop: record.crop.clone(),
            message: format!("Registro guardado: {} en {}.", record.labor, record.crop),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FormState {
    Editing,
    /// The last confirmation persisted a record and cleared the fields.
    Submitted(Acknowledgement),
}

#[derive(Debug)]
pub enum FormError {
    Catalog(CatalogError),
    Quantity(InvalidQuantity),
    Store(StoreError),
}

impl fmt::Display for FormError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FormError::Catalog(err) => write!(f, "{}", err),
            FormError::Quantity(err) => write!(f, "{}", err),
            FormError::Store(err) => write!(f, "could not save record: {}", err),
        }
    }
}

impl Error for FormError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            FormError::Catalog(err) => Some(err),
            FormError::Quantity(err) => Some(err),
            FormError::Store(err) => Some(err),
        }
    }
}

impl From<CatalogError> for FormError {
    fn from(value: CatalogError) -> Self {
        FormError::Catalog(value)
    }
}

impl From<InvalidQuantity> for FormError {
    fn from(value: InvalidQuantity) -> Self {
        FormError::Quantity(value)
    }
}

impl From<StoreError> for FormError {
    fn from(value: StoreError) -> Self {
        FormError::Store(value)
    }
}

/// Field state for one new record. The selected pest always belongs to the
/// selected crop's pest list.
#[derive(Debug, Clone)]
pub struct EntryForm<'a> {
    catalog: &'a Catalog,
    date: RecordDate,
    worker: Worker,
    crop: &'a CropEntry,
    labor: Labor,
    pest: &'a PestEntry,
    product: String,
    quantity: Quantity,
    notes: String,
    state: FormState,
}

impl<'a> EntryForm<'a> {
    pub fn new(catalog: &'a Catalog) -> Self {
        let crop = catalog.default_crop();
        Self {
            catalog,
            date: RecordDate::today(),
            worker: Worker::default(),
            crop,
            labor: Labor::default(),
            pest: crop.pests.first(),
            product: String::new(),
            quantity: Quantity::ZERO,
            notes: String::new(),
            state: FormState::Editing,
        }
    }

    pub fn state(&self) -> &FormState {
        &self.state
    }

    pub fn date(&self) -> RecordDate {
        self.date
    }

    pub fn worker(&self) -> Worker {
        self.worker
    }

    pub fn crop(&self) -> &'a CropEntry {
        self.crop
    }

    pub fn labor(&self) -> Labor {
        self.labor
    }

    pub fn pest(&self) -> &'a PestEntry {
        self.pest
    }

    pub fn quantity(&self) -> Quantity {
        self.quantity
    }

    /// Pest choices for the current crop, sentinel first.
    pub fn pest_choices(&self) -> &'a PestList {
        let crop: &'a CropEntry = self.crop;
        &crop.pests
    }

    pub fn set_date(&mut self, date: RecordDate) {
        self.touch();
        self.date = date;
    }

    pub fn set_worker(&mut self, worker: Worker) {
        self.touch();
        self.worker = worker;
    }

    pub fn set_labor(&mut self, labor: Labor) {
        self.touch();
        self.labor = labor;
    }

    pub fn set_product(&mut self, product: &str) {
        self.touch();
        self.product = product.trim().to_string();
    }

    pub fn set_notes(&mut self, notes: &str) {
        self.touch();
        self.notes = notes.trim().to_string();
    }

    /// Rejects negative and non-finite values; the previous quantity stays.
    pub fn set_quantity(&mut self, value: f64) -> Result<(), FormError> {
        let quantity = Quantity::new(value)?;
        self.touch();
        self.quantity = quantity;
        Ok(())
    }

    /// Switches crop and re-derives the pest selection. The current pest
    /// survives only when the new crop lists the same pest.
    pub fn select_crop(&mut self, raw: &str) -> Result<(), FormError> {
        let catalog: &'a Catalog = self.catalog;
        let crop = catalog.crop(raw)?;
        let current = self.pest;
        let pest = crop
            .pests
            .iter()
            .find(|entry| entry.name == current.name)
            .unwrap_or_else(|| crop.pests.first());
        self.touch();
        self.crop = crop;
        self.pest = pest;
        Ok(())
    }

    pub fn select_pest(&mut self, raw: &str) -> Result<(), FormError> {
        let crop: &'a CropEntry = self.crop;
        let pest = crop
            .pests
            .find(raw)
            .ok_or_else(|| CatalogError::UnknownPest {
                crop: crop.name.clone(),
                pest: raw.trim().to_string(),
            })?;
        self.touch();
        self.pest = pest;
        Ok(())
    }

    pub fn advisory(&self) -> Option<Advisory> {
        Advisory::for_entry(self.crop, self.pest)
    }

    pub fn record(&self) -> FieldRecord {
        FieldRecord {
            date: self.date,
            worker: self.worker,
            crop: self.crop.name.clone(),
            labor: self.labor,
            pest: self.pest.name.clone(),
            product: self.product.clone(),
            quantity: self.quantity,
            notes: self.notes.clone(),
        }
    }

    /// Appends the current record and clears the form back to defaults. On a
    /// store failure nothing is cleared so the entry can be retried.
    pub fn submit(&mut self, store: &dyn RecordStore) -> Result<Acknowledgement, FormError> {
        let record = self.record();
        store.append(&record)?;
        let ack = Acknowledgement::for_record(&record);
        self.reset();
        self.state = FormState::Submitted(ack.clone());
        Ok(ack)
    }

    pub fn reset(&mut self) {
        *self = EntryForm::new(self.catalog);
    }

    fn touch(&mut self) {
        self.state = FormState::Editing;
    }
}

#[cfg(test)]
#[path = "form_tests_ext.rs"]
mod tests_ext;
