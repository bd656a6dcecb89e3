use super::{App, AppError, ExportDestination, ExportOutcome};
use crate::catalog::{Catalog, CatalogError};
use crate::db::SqliteStore;
use crate::domain::labor::Labor;
use crate::domain::record::RecordDate;
use crate::form::EntryForm;
use crate::history::{HistoryFilter, HistoryView, EMPTY_STORE_MESSAGE, NO_MATCH_MESSAGE};
use std::path::PathBuf;
use std::str::FromStr;
use uuid::Uuid;

fn unique_workspace() -> PathBuf {
    let root = std::env::temp_dir().join(format!("chosetas-app-test-{}", Uuid::now_v7()));
    std::fs::create_dir_all(&root).expect("temp workspace should be creatable");
    root
}

fn memory_app() -> App {
    let store = SqliteStore::open_in_memory().expect("in-memory store should open");
    App::with_store(Box::new(store)).expect("app should build")
}

fn submit_on(app: &App, date: &str, crop: &str, pest: &str, notes: &str) {
    let mut form = app.new_form();
    form.set_date(RecordDate::from_str(date).expect("date should parse"));
    form.select_crop(crop).expect("crop should exist");
    form.select_pest(pest).expect("pest should exist");
    form.set_notes(notes);
    app.submit(&mut form).expect("submit should succeed");
}

#[test]
fn open_creates_database_under_missing_directories() {
    let root = unique_workspace();
    let db_path = root.join("datos/finca/chosetas_datos.db");
    let app = App::open(db_path.to_str().expect("utf8 path")).expect("app should open");
    assert!(db_path.exists());
    assert!(app.history(&HistoryFilter::default()).is_ok());
    drop(app);
    let _ = std::fs::remove_dir_all(root);
}

#[test]
fn submitted_record_round_trips_through_history() {
    let app = memory_app();
    let mut form = app.new_form();
    form.set_date(RecordDate::from_str("2024-03-01").unwrap());
    form.select_crop("Naranjos").expect("crop should exist");
    form.set_labor(Labor::Monitoring);
    form.select_pest("Mosca de la fruta")
        .expect("pest should exist");
    form.set_product("Trampa X");
    form.set_quantity(2.5).expect("quantity should be accepted");
    form.set_notes("Sector 3");
    let expected = form.record();

    let ack = app.submit(&mut form).expect("submit should succeed");
    assert_eq!(ack.message, "Registro guardado: Monitoreo de Plagas en Naranjos.");

    let view = app
        .history(&HistoryFilter::default())
        .expect("history should load");
    assert_eq!(view.rows().len(), 1);
    assert_eq!(view.rows()[0].record, expected);
}

#[test]
fn history_lists_newest_date_first() {
    let app = memory_app();
    submit_on(&app, "2024-03-01", "Naranjos", "Ninguna", "uno");
    submit_on(&app, "2024-03-02", "Cafetos", "Roya", "dos");

    let view = app
        .history(&HistoryFilter::default())
        .expect("history should load");
    let dates = view
        .rows()
        .iter()
        .map(|row| row.record.date.to_string())
        .collect::<Vec<_>>();
    assert_eq!(dates, vec!["2024-03-02", "2024-03-01"]);
}

#[test]
fn empty_history_is_an_informational_state() {
    let app = memory_app();
    let view = app
        .history(&HistoryFilter::default())
        .expect("history should load");
    assert_eq!(
        view,
        HistoryView::Empty {
            message: EMPTY_STORE_MESSAGE
        }
    );
}

fn export(
    app: &App,
    filter: &HistoryFilter,
    destination: &ExportDestination,
) -> (ExportOutcome, String) {
    let mut stdout = Vec::new();
    let outcome = app
        .export_csv_with(filter, destination, &mut stdout)
        .expect("export should not fail");
    (outcome, String::from_utf8(stdout).expect("csv should be utf8"))
}

#[test]
fn export_writes_nothing_for_empty_store() {
    let root = unique_workspace();
    let path = root.join("chosetas_datos.csv");
    let app = memory_app();

    for destination in [ExportDestination::File(path.clone()), ExportDestination::Stdout] {
        let (outcome, stdout) = export(&app, &HistoryFilter::default(), &destination);
        assert_eq!(
            outcome,
            ExportOutcome::Skipped {
                message: EMPTY_STORE_MESSAGE
            }
        );
        assert!(stdout.is_empty());
    }
    assert!(!path.exists());

    let _ = std::fs::remove_dir_all(root);
}

#[test]
fn export_writes_csv_matching_history_order() {
    let root = unique_workspace();
    let path = root.join("exports/chosetas_datos.csv");
    let destination = ExportDestination::File(path.clone());
    let app = memory_app();
    submit_on(&app, "2024-03-01", "Naranjos", "Piojo Rojo", "Sector 4");
    submit_on(&app, "2024-03-05", "Aguacates", "Ninguna", "Sector 1");

    let (outcome, stdout) = export(&app, &HistoryFilter::default(), &destination);
    assert_eq!(
        outcome,
        ExportOutcome::Written {
            destination,
            rows: 2
        }
    );
    assert!(stdout.is_empty());

    let written = std::fs::read_to_string(&path).expect("csv should be readable");
    let lines = written.lines().collect::<Vec<_>>();
    assert_eq!(lines[0], "date,worker,crop,labor,pest,product,quantity,notes");
    assert!(lines[1].starts_with("2024-03-05,Propietario,Aguacates,"));
    assert!(lines[2].starts_with("2024-03-01,Propietario,Naranjos,"));

    let _ = std::fs::remove_dir_all(root);
}

#[test]
fn export_to_stdout_writes_the_same_csv_as_a_file() {
    let root = unique_workspace();
    let path = root.join("chosetas_datos.csv");
    let app = memory_app();
    submit_on(&app, "2024-03-01", "Naranjos", "Piojo Rojo", "Fila 3, norte");
    let filter = HistoryFilter::default();

    let (outcome, stdout) = export(&app, &filter, &ExportDestination::Stdout);
    assert_eq!(
        outcome,
        ExportOutcome::Written {
            destination: ExportDestination::Stdout,
            rows: 1
        }
    );
    export(&app, &filter, &ExportDestination::File(path.clone()));
    let written = std::fs::read_to_string(&path).expect("csv should be readable");
    assert_eq!(stdout, written);
    assert!(stdout.contains(",0.0,\"Fila 3, norte\"\n"));

    let _ = std::fs::remove_dir_all(root);
}

#[test]
fn export_destination_dash_means_stdout() {
    assert_eq!(ExportDestination::from_arg("-"), ExportDestination::Stdout);
    assert_eq!(
        ExportDestination::from_arg("out/chosetas_datos.csv"),
        ExportDestination::File(PathBuf::from("out/chosetas_datos.csv"))
    );
    assert_eq!(ExportDestination::Stdout.to_string(), "stdout");
}

#[test]
fn export_skips_when_filter_removes_every_row() {
    let root = unique_workspace();
    let path = root.join("chosetas_datos.csv");
    let app = memory_app();
    submit_on(&app, "2024-03-01", "Naranjos", "Ninguna", "uno");

    let filter = HistoryFilter {
        pests_only: true,
        ..HistoryFilter::default()
    };
    let (outcome, _) = export(&app, &filter, &ExportDestination::File(path.clone()));
    assert_eq!(
        outcome,
        ExportOutcome::Skipped {
            message: NO_MATCH_MESSAGE
        }
    );
    assert!(!path.exists());

    let _ = std::fs::remove_dir_all(root);
}

#[test]
fn submit_rejects_crop_missing_from_app_catalog() {
    let app = memory_app();
    let other = Catalog::from_toml(
        r#"
[[crops]]
name = "Olivos"
[[crops.pests]]
name = "Ninguna"
"#,
    )
    .expect("catalog should load");
    let mut form = EntryForm::new(&other);

    let err = app
        .submit(&mut form)
        .expect_err("foreign crop should be rejected");
    assert!(matches!(
        err,
        AppError::Catalog(CatalogError::UnknownCrop(ref crop)) if crop == "Olivos"
    ));
    assert!(app
        .history(&HistoryFilter::default())
        .expect("history should load")
        .rows()
        .is_empty());
}

#[test]
fn submit_rejects_pest_that_belongs_to_another_crop() {
    let app = memory_app();
    let other = Catalog::from_toml(
        r#"
[[crops]]
name = "Naranjos"
[[crops.pests]]
name = "Ninguna"
[[crops.pests]]
name = "Trips"
recommendation = "TRATAMIENTO NARANJOS: Spinosad."
"#,
    )
    .expect("catalog should load");
    let mut form = EntryForm::new(&other);
    form.select_pest("Trips").expect("pest should exist");

    let err = app
        .submit(&mut form)
        .expect_err("mismatched pest should be rejected");
    assert_eq!(err.to_string(), "unknown pest 'Trips' for crop 'Naranjos'");
    assert_eq!(form.pest().name, "Trips");
}
