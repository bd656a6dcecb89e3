use serde::Serialize;

use crate::db::COLUMNS;
use crate::domain::choice_key;
use crate::domain::labor::Labor;
use crate::domain::record::{FieldRecord, RecordDate};
use crate::domain::worker::Worker;

pub const EMPTY_STORE_MESSAGE: &str = "Aún no hay datos registrados.";
pub const NO_MATCH_MESSAGE: &str = "no records matched";

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HistoryFilter {
    pub crop: Option<String>,
    pub worker: Option<Worker>,
    pub labor: Option<Labor>,
    pub pests_only: bool,
    pub from: Option<RecordDate>,
    pub to: Option<RecordDate>,
    pub query: Option<String>,
}

impl HistoryFilter {
    pub fn is_empty(&self) -> bool {
        NormalizedFilter::from(self).has_no_user_filters()
    }
}

#[derive(Debug, Clone, Default)]
struct NormalizedFilter {
    crop: Option<String>,
    worker: Option<Worker>,
    labor: Option<Labor>,
    pests_only: bool,
    from: Option<RecordDate>,
    to: Option<RecordDate>,
    query: Option<String>,
}

impl NormalizedFilter {
    fn has_no_user_filters(&self) -> bool {
        self.crop.is_none()
            && self.worker.is_none()
            && self.labor.is_none()
            && !self.pests_only
            && self.from.is_none()
            && self.to.is_none()
            && self.query.is_none()
    }
}

impl From<&HistoryFilter> for NormalizedFilter {
    fn from(value: &HistoryFilter) -> Self {
        Self {
            crop: value
                .crop
                .as_deref()
                .map(choice_key)
                .filter(|key| !key.is_empty()),
            worker: value.worker,
            labor: value.labor,
            pests_only: value.pests_only,
            from: value.from,
            to: value.to,
            query: value
                .query
                .as_deref()
                .map(|raw| raw.trim().to_lowercase())
                .filter(|query| !query.is_empty()),
        }
    }
}

pub fn apply_filters(records: Vec<FieldRecord>, filter: &HistoryFilter) -> Vec<FieldRecord> {
    let normalized = NormalizedFilter::from(filter);
    if normalized.has_no_user_filters() {
        return records;
    }

    records
        .into_iter()
        .filter(|record| matches_filter(record, &normalized))
        .collect()
}

fn matches_filter(record: &FieldRecord, filter: &NormalizedFilter) -> bool {
    if let Some(expected_crop) = filter.crop.as_deref() {
        if choice_key(&record.crop) != expected_crop {
            return false;
        }
    }

    if filter.worker.is_some_and(|worker| worker != record.worker) {
        return false;
    }

    if filter.labor.is_some_and(|labor| labor != record.labor) {
        return false;
    }

    if filter.pests_only && !record.has_pest() {
        return false;
    }

    if filter.from.is_some_and(|from| record.date < from) {
        return false;
    }

    if filter.to.is_some_and(|to| record.date > to) {
        return false;
    }

    if let Some(query) = filter.query.as_deref() {
        let product = record.product.to_lowercase();
        let notes = record.notes.to_lowercase();
        if !product.contains(query) && !notes.contains(query) {
            return false;
        }
    }

    true
}

/// Display treatment of one history row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RowStyle {
    Normal,
    PestFlagged,
}

pub fn row_style(record: &FieldRecord) -> RowStyle {
    if record.has_pest() {
        RowStyle::PestFlagged
    } else {
        RowStyle::Normal
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HistoryRow {
    #[serde(flatten)]
    pub record: FieldRecord,
    pub style: RowStyle,
}

#[derive(Debug, Clone, PartialEq)]
pub enum HistoryView {
    Empty { message: &'static str },
    Table { rows: Vec<HistoryRow> },
}

impl HistoryView {
    /// Builds the view from the full, already ordered listing. An empty store
    /// and a filter that removes every row get different messages.
    pub fn build(records: Vec<FieldRecord>, filter: &HistoryFilter) -> Self {
        if records.is_empty() {
            return HistoryView::Empty {
                message: EMPTY_STORE_MESSAGE,
            };
        }

        let filtered = apply_filters(records, filter);
        if filtered.is_empty() {
            return HistoryView::Empty {
                message: NO_MATCH_MESSAGE,
            };
        }

        let rows = filtered
            .into_iter()
            .map(|record| HistoryRow {
                style: row_style(&record),
                record,
            })
            .collect();
        HistoryView::Table { rows }
    }

    pub fn rows(&self) -> &[HistoryRow] {
        match self {
            HistoryView::Empty { .. } => &[],
            HistoryView::Table { rows } => rows,
        }
    }
}

/// Comma-separated export with a header row. Fields holding a comma, quote
/// or line break are quoted, with inner quotes doubled.
pub fn render_csv<'r>(records: impl IntoIterator<Item = &'r FieldRecord>) -> String {
    let mut out = COLUMNS.join(",");
    out.push('\n');
    for record in records {
        let fields = [
            record.date.to_string(),
            record.worker.to_string(),
            record.crop.clone(),
            record.labor.to_string(),
            record.pest.clone(),
            record.product.clone(),
            record.quantity.to_string(),
            record.notes.clone(),
        ];
        let line = fields
            .iter()
            .map(|field| csv_field(field))
            .collect::<Vec<_>>()
            .join(",");
        out.push_str(&line);
        out.push('\n');
    }
    out
}

fn csv_field(raw: &str) -> String {
    if raw.contains([',', '"', '\n', '\r']) {
        format!("\"{}\"", raw.replace('"', "\"\""))
    } else {
        raw.to_string()
    }
}

#[cfg(test)]
#[path = "history_tests_ext.rs"]
mod tests_ext;
