use std::io::{self, IsTerminal};

use crate::catalog::{Catalog, CropEntry};
use crate::db::COLUMNS;
use crate::form::{Acknowledgement, Advisory};
use crate::history::{HistoryFilter, HistoryRow, HistoryView, RowStyle};

pub const APP_TITLE: &str = "JD Las Chosetas";

pub fn print_history(view: &HistoryView, filter: &HistoryFilter) {
    let palette = Palette::auto();
    println!("{}", palette.heading("Historial de Registros"));
    if let Some(summary) = filter_summary(filter) {
        println!("{}", palette.dim(&format!("filters: {summary}")));
    }

    match view {
        HistoryView::Empty { message } => println!("{}", palette.dim(message)),
        HistoryView::Table { rows } => {
            for line in format_history_table(rows, &palette) {
                println!("{line}");
            }
            let flagged = rows
                .iter()
                .filter(|row| row.style == RowStyle::PestFlagged)
                .count();
            println!(
                "{}",
                palette.dim(&format!("{} record(s), {} with pests", rows.len(), flagged))
            );
        }
    }
}

fn format_history_table(rows: &[HistoryRow], palette: &Palette) -> Vec<String> {
    let cells = rows.iter().map(row_cells).collect::<Vec<_>>();
    let mut widths = COLUMNS.map(|column| column.chars().count());
    for row in &cells {
        for (width, cell) in widths.iter_mut().zip(row.iter()) {
            *width = (*width).max(cell.chars().count());
        }
    }

    let mut lines = Vec::with_capacity(rows.len() + 1);
    let header = COLUMNS.map(str::to_string);
    lines.push(format!("  {}", palette.heading(&pad_row(&header, &widths))));
    for (row, cells) in rows.iter().zip(cells.iter()) {
        let text = pad_row(cells, &widths);
        let line = match row.style {
            RowStyle::PestFlagged => format!("{} {}", palette.alert("!"), palette.alert(&text)),
            RowStyle::Normal => format!("  {text}"),
        };
        lines.push(line);
    }
    lines
}

fn row_cells(row: &HistoryRow) -> [String; 8] {
    let record = &row.record;
    [
        record.date.to_string(),
        record.worker.to_string(),
        record.crop.clone(),
        record.labor.to_string(),
        record.pest.clone(),
        record.product.clone(),
        record.quantity.to_string(),
        single_line(&record.notes),
    ]
}

fn pad_row(cells: &[String; 8], widths: &[usize; 8]) -> String {
    cells
        .iter()
        .zip(widths.iter())
        .map(|(cell, width)| format!("{cell:<width$}"))
        .collect::<Vec<_>>()
        .join("  ")
        .trim_end()
        .to_string()
}

fn single_line(raw: &str) -> String {
    raw.split_whitespace().collect::<Vec<_>>().join(" ")
}

pub fn print_advisory(advisory: &Advisory) {
    let palette = Palette::auto();
    println!("{}", palette.alert(&advisory.headline()));
    println!("{}", advisory.recommendation);
    println!("{}", palette.dim(advisory.reminder));
}

pub fn print_acknowledgement(ack: &Acknowledgement) {
    let palette = Palette::auto();
    println!("{}", palette.ok(&ack.message));
}

pub fn print_catalog(catalog: &Catalog) {
    let palette = Palette::auto();
    println!("{}", palette.heading(APP_TITLE));
    for crop in catalog.crops() {
        print_crop(crop, &palette);
    }
}

pub fn print_crop_pests(crop: &CropEntry) {
    print_crop(crop, &Palette::auto());
}

fn print_crop(crop: &CropEntry, palette: &Palette) {
    println!("{}", palette.crop(&crop.name));
    for entry in crop.pests.iter() {
        if entry.is_none() {
            println!("  {}", palette.dim(&entry.name));
        } else {
            println!("  {}", entry.name);
            println!("    {}", palette.dim(&entry.recommendation));
        }
    }
}

fn filter_summary(filter: &HistoryFilter) -> Option<String> {
    if filter.is_empty() {
        return None;
    }
    let mut parts = Vec::new();
    if let Some(crop) = filter.crop.as_deref().and_then(non_empty) {
        parts.push(format!("crop={crop}"));
    }
    if let Some(worker) = filter.worker {
        parts.push(format!("worker={worker}"));
    }
    if let Some(labor) = filter.labor {
        parts.push(format!("labor={labor}"));
    }
    if filter.pests_only {
        parts.push("pests_only=true".to_string());
    }
    if let Some(from) = filter.from {
        parts.push(format!("from={from}"));
    }
    if let Some(to) = filter.to {
        parts.push(format!("to={to}"));
    }
    if let Some(query) = filter.query.as_deref().and_then(non_empty) {
        parts.push(format!("query={query}"));
    }

    if parts.is_empty() {
        None
    } else {
        Some(parts.join(" "))
    }
}

fn non_empty(raw: &str) -> Option<&str> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed)
    }
}

pub struct Palette {
    enabled: bool,
}

impl Palette {
    pub fn auto() -> Self {
        let enabled = std::env::var_os("NO_COLOR").is_none() && io::stdout().is_terminal();
        Self { enabled }
    }

    #[cfg(test)]
    fn plain() -> Self {
        Self { enabled: false }
    }

    fn paint(&self, code: &str, text: &str) -> String {
        if self.enabled {
            format!("\x1b[{code}m{text}\x1b[0m")
        } else {
            text.to_string()
        }
    }

    pub fn heading(&self, text: &str) -> String {
        self.paint("1;36", text)
    }

    pub fn dim(&self, text: &str) -> String {
        self.paint("2", text)
    }

    pub fn alert(&self, text: &str) -> String {
        self.paint("1;31", text)
    }

    pub fn ok(&self, text: &str) -> String {
        self.paint("1;32", text)
    }

    fn crop(&self, text: &str) -> String {
        self.paint("1;33", text)
    }
}

#[cfg(test)]
mod tests {
    use std::str::FromStr;

    use super::{filter_summary, format_history_table, single_line, Palette};
    use crate::domain::labor::Labor;
    use crate::domain::quantity::Quantity;
    use crate::domain::record::{FieldRecord, RecordDate};
    use crate::domain::worker::Worker;
    use crate::history::{HistoryFilter, HistoryView};

    fn record(pest: &str, notes: &str) -> FieldRecord {
        FieldRecord {
            date: RecordDate::from_str("2024-03-01").unwrap(),
            worker: Worker::Owner,
            crop: "Naranjos".to_string(),
            labor: Labor::Monitoring,
            pest: pest.to_string(),
            product: "Trampa X".to_string(),
            quantity: Quantity::new(2.5).unwrap(),
            notes: notes.to_string(),
        }
    }

    #[test]
    fn table_marks_pest_rows_and_aligns_columns() {
        let view = HistoryView::build(
            vec![record("Mosca de la fruta", "Sector 3"), record("Ninguna", "")],
            &HistoryFilter::default(),
        );
        let lines = format_history_table(view.rows(), &Palette::plain());
        assert_eq!(lines.len(), 3);
        assert!(lines[0].starts_with("  date"));
        assert!(lines[1].starts_with("! 2024-03-01"));
        assert!(lines[2].starts_with("  2024-03-01"));
        let pest_column = lines[0].find("pest").expect("header should have pest");
        assert_eq!(lines[1].find("Mosca"), Some(pest_column));
        assert_eq!(lines[2].find("Ninguna"), Some(pest_column));
    }

    #[test]
    fn notes_are_flattened_to_one_line() {
        assert_eq!(single_line("Fila 3\n  norte"), "Fila 3 norte");
    }

    #[test]
    fn filter_summary_formats_only_active_filters() {
        let filter = HistoryFilter {
            crop: Some("Naranjos".to_string()),
            worker: Some(Worker::FirstHand),
            labor: Some(Labor::Harvest),
            pests_only: true,
            from: Some(RecordDate::from_str("2024-01-01").unwrap()),
            to: None,
            query: Some(" ".to_string()),
        };
        assert_eq!(
            filter_summary(&filter).expect("summary should exist"),
            "crop=Naranjos worker=Trabajador 1 labor=Cosecha pests_only=true from=2024-01-01"
        );
    }

    #[test]
    fn filter_summary_is_none_for_empty_filters() {
        assert!(filter_summary(&HistoryFilter::default()).is_none());
    }
}
