use std::str::FromStr;

use super::{
    apply_filters, render_csv, row_style, HistoryFilter, HistoryView, RowStyle,
    EMPTY_STORE_MESSAGE, NO_MATCH_MESSAGE,
};
use crate::domain::labor::Labor;
use crate::domain::quantity::Quantity;
use crate::domain::record::{FieldRecord, RecordDate};
use crate::domain::worker::Worker;

fn record(date: &str, crop: &str, pest: &str, notes: &str) -> FieldRecord {
    FieldRecord {
        date: RecordDate::from_str(date).expect("date should parse"),
        worker: Worker::Owner,
        crop: crop.to_string(),
        labor: Labor::Monitoring,
        pest: pest.to_string(),
        product: String::new(),
        quantity: Quantity::ZERO,
        notes: notes.to_string(),
    }
}

fn sample() -> Vec<FieldRecord> {
    let mut treated = record("2024-03-03", "Aguacates", "Trips", "Sector 1");
    treated.worker = Worker::FirstHand;
    treated.labor = Labor::Treatment;
    treated.product = "Spinosad".to_string();
    vec![
        treated,
        record("2024-03-02", "Naranjos", "Ninguna", "Sector 3"),
        record("2024-03-01", "Naranjos", "Piojo Rojo", "Sector 4"),
    ]
}

#[test]
fn flags_only_rows_with_a_pest() {
    let rows = sample();
    assert_eq!(row_style(&rows[0]), RowStyle::PestFlagged);
    assert_eq!(row_style(&rows[1]), RowStyle::Normal);
    assert_eq!(row_style(&rows[2]), RowStyle::PestFlagged);
}

#[test]
fn empty_store_shows_message_and_has_no_rows() {
    let view = HistoryView::build(Vec::new(), &HistoryFilter::default());
    assert_eq!(
        view,
        HistoryView::Empty {
            message: EMPTY_STORE_MESSAGE
        }
    );
    assert!(view.rows().is_empty());
}

#[test]
fn filter_that_matches_nothing_has_its_own_message() {
    let filter = HistoryFilter {
        crop: Some("Cafetos".to_string()),
        ..HistoryFilter::default()
    };
    let view = HistoryView::build(sample(), &filter);
    assert_eq!(
        view,
        HistoryView::Empty {
            message: NO_MATCH_MESSAGE
        }
    );
    assert!(view.rows().is_empty());
}

#[test]
fn table_keeps_listing_order_and_styles() {
    let view = HistoryView::build(sample(), &HistoryFilter::default());
    let styles = view.rows().iter().map(|row| row.style).collect::<Vec<_>>();
    assert_eq!(
        styles,
        vec![RowStyle::PestFlagged, RowStyle::Normal, RowStyle::PestFlagged]
    );
    let dates = view
        .rows()
        .iter()
        .map(|row| row.record.date.to_string())
        .collect::<Vec<_>>();
    assert_eq!(dates, vec!["2024-03-03", "2024-03-02", "2024-03-01"]);
}

#[test]
fn filters_by_crop_worker_labor_and_pest() {
    let by_crop = apply_filters(
        sample(),
        &HistoryFilter {
            crop: Some(" naranjos ".to_string()),
            ..HistoryFilter::default()
        },
    );
    assert_eq!(by_crop.len(), 2);

    let by_worker = apply_filters(
        sample(),
        &HistoryFilter {
            worker: Some(Worker::FirstHand),
            ..HistoryFilter::default()
        },
    );
    assert_eq!(by_worker.len(), 1);
    assert_eq!(by_worker[0].crop, "Aguacates");

    let by_labor = apply_filters(
        sample(),
        &HistoryFilter {
            labor: Some(Labor::Monitoring),
            ..HistoryFilter::default()
        },
    );
    assert_eq!(by_labor.len(), 2);

    let pests_only = apply_filters(
        sample(),
        &HistoryFilter {
            pests_only: true,
            ..HistoryFilter::default()
        },
    );
    assert!(pests_only.iter().all(FieldRecord::has_pest));
    assert_eq!(pests_only.len(), 2);
}

#[test]
fn date_range_is_inclusive() {
    let filter = HistoryFilter {
        from: Some(RecordDate::from_str("2024-03-02").unwrap()),
        to: Some(RecordDate::from_str("2024-03-03").unwrap()),
        ..HistoryFilter::default()
    };
    let rows = apply_filters(sample(), &filter);
    let dates = rows
        .iter()
        .map(|row| row.date.to_string())
        .collect::<Vec<_>>();
    assert_eq!(dates, vec!["2024-03-03", "2024-03-02"]);
}

#[test]
fn query_searches_product_and_notes() {
    let by_product = apply_filters(
        sample(),
        &HistoryFilter {
            query: Some("spino".to_string()),
            ..HistoryFilter::default()
        },
    );
    assert_eq!(by_product.len(), 1);

    let by_notes = apply_filters(
        sample(),
        &HistoryFilter {
            query: Some("SECTOR 4".to_string()),
            ..HistoryFilter::default()
        },
    );
    assert_eq!(by_notes.len(), 1);
    assert_eq!(by_notes[0].pest, "Piojo Rojo");
}

#[test]
fn blank_filters_are_ignored() {
    let filter = HistoryFilter {
        crop: Some("  ".to_string()),
        query: Some("".to_string()),
        ..HistoryFilter::default()
    };
    assert!(filter.is_empty());
    assert_eq!(apply_filters(sample(), &filter).len(), 3);
}

#[test]
fn csv_has_header_and_rows_in_display_order() {
    let view = HistoryView::build(sample(), &HistoryFilter::default());
    let csv = render_csv(view.rows().iter().map(|row| &row.record));
    let lines = csv.lines().collect::<Vec<_>>();
    assert_eq!(
        lines[0],
        "date,worker,crop,labor,pest,product,quantity,notes"
    );
    assert_eq!(
        lines[1],
        "2024-03-03,Trabajador 1,Aguacates,Tratamiento Fito,Trips,Spinosad,0.0,Sector 1"
    );
    assert_eq!(lines.len(), 4);
    assert!(csv.ends_with('\n'));
}

#[test]
fn csv_quotes_fields_with_separators() {
    let mut row = record("2024-03-01", "Naranjos", "Ninguna", "Fila 3, \"norte\"\nrevisar");
    row.quantity = Quantity::new(2.5).unwrap();
    let csv = render_csv([&row]);
    let body = csv.split_once('\n').expect("header line").1;
    assert_eq!(
        body,
        concat!(
            "2024-03-01,Propietario,Naranjos,Monitoreo de Plagas,Ninguna,,2.5,",
            "\"Fila 3, \"\"norte\"\"\nrevisar\"\n"
        )
    );
}

#[test]
fn history_rows_serialize_flat_with_style() {
    let view = HistoryView::build(sample(), &HistoryFilter::default());
    let json = serde_json::to_value(view.rows()).expect("rows should serialize");
    assert_eq!(json[0]["crop"], "Aguacates");
    assert_eq!(json[0]["style"], "pest_flagged");
    assert_eq!(json[1]["style"], "normal");
}
