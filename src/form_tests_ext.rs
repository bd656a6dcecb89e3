use std::cell::RefCell;
use std::str::FromStr;

use super::{EntryForm, FormError, FormState, COMPLIANCE_REMINDER};
use crate::catalog::{Catalog, NO_PEST};
use crate::db::{RecordStore, SqliteStore, StoreError};
use crate::domain::labor::Labor;
use crate::domain::record::{FieldRecord, RecordDate};
use crate::domain::worker::Worker;

#[derive(Default)]
struct VecStore {
    rows: RefCell<Vec<FieldRecord>>,
}

impl RecordStore for VecStore {
    fn append(&self, record: &FieldRecord) -> Result<(), StoreError> {
        self.rows.borrow_mut().push(record.clone());
        Ok(())
    }

    fn list_all(&self) -> Result<Vec<FieldRecord>, StoreError> {
        Ok(self.rows.borrow().clone())
    }
}

struct FailingStore;

impl RecordStore for FailingStore {
    fn append(&self, _record: &FieldRecord) -> Result<(), StoreError> {
        Err(StoreError::Io(std::io::Error::new(
            std::io::ErrorKind::PermissionDenied,
            "read-only filesystem",
        )))
    }

    fn list_all(&self) -> Result<Vec<FieldRecord>, StoreError> {
        Ok(Vec::new())
    }
}

fn catalog() -> Catalog {
    Catalog::load().expect("builtin catalog should load")
}

#[test]
fn starts_editing_with_defaults() {
    let catalog = catalog();
    let form = EntryForm::new(&catalog);
    assert_eq!(form.state(), &FormState::Editing);
    assert_eq!(form.date(), RecordDate::today());
    assert_eq!(form.worker(), Worker::Owner);
    assert_eq!(form.crop().name, "Naranjos");
    assert_eq!(form.labor(), Labor::Monitoring);
    assert_eq!(form.pest().name, NO_PEST);
    assert_eq!(form.quantity().value(), 0.0);
    assert!(form.advisory().is_none());
}

#[test]
fn pest_choices_follow_selected_crop() {
    let catalog = catalog();
    let mut form = EntryForm::new(&catalog);
    form.select_crop("Cafetos").expect("crop should exist");
    let choices = form.pest_choices().names().collect::<Vec<_>>();
    assert_eq!(
        choices,
        vec![NO_PEST, "Roya", "Broca del café", "Minador de la hoja"]
    );
}

#[test]
fn switching_crop_resets_pest_that_is_not_offered() {
    let catalog = catalog();
    let mut form = EntryForm::new(&catalog);
    form.select_crop("Naranjos").expect("crop should exist");
    form.select_pest("Piojo Rojo").expect("pest should exist");
    assert_eq!(form.pest().name, "Piojo Rojo");

    form.select_crop("Aguacates").expect("crop should exist");
    assert_eq!(form.crop().name, "Aguacates");
    assert_eq!(form.pest().name, NO_PEST);
    assert!(form.pest_choices().contains(&form.pest().name));
    assert!(form.advisory().is_none());
}

#[test]
fn switching_crop_keeps_pest_offered_by_both() {
    let raw = r#"
[[crops]]
name = "Limoneros"
[[crops.pests]]
name = "Ninguna"
[[crops.pests]]
name = "Pulgón"
recommendation = "TRATAMIENTO LIMONEROS: Jabón potásico."

[[crops]]
name = "Mandarinos"
[[crops.pests]]
name = "Ninguna"
[[crops.pests]]
name = "Pulgón"
recommendation = "TRATAMIENTO MANDARINOS: Aceite de Neem."
"#;
    let catalog = Catalog::from_toml(raw).expect("catalog should load");
    let mut form = EntryForm::new(&catalog);
    form.select_pest("Pulgón").expect("pest should exist");
    form.select_crop("Mandarinos").expect("crop should exist");
    assert_eq!(form.pest().name, "Pulgón");
    let advisory = form.advisory().expect("pest should advise");
    let recommendation = advisory.recommendation.as_str();
    assert!(recommendation.starts_with("TRATAMIENTO MANDARINOS:"));
}

#[test]
fn rejects_pest_from_another_crop() {
    let catalog = catalog();
    let mut form = EntryForm::new(&catalog);
    form.select_crop("Aguacates").expect("crop should exist");
    let err = form
        .select_pest("Piojo Rojo")
        .expect_err("orange pest should not be offered for avocados");
    assert!(matches!(err, FormError::Catalog(_)));
    assert_eq!(form.pest().name, NO_PEST);
}

#[test]
fn advisory_names_crop_and_carries_reminder() {
    let catalog = catalog();
    let mut form = EntryForm::new(&catalog);
    form.select_pest("Mosca de la fruta")
        .expect("pest should exist");
    let advisory = form.advisory().expect("advisory should be shown");
    assert_eq!(advisory.headline(), "ALERTA DETECTADA EN NARANJOS");
    assert_eq!(advisory.pest, "Mosca de la fruta");
    assert!(advisory
        .recommendation
        .starts_with("TRATAMIENTO NARANJOS: Deltametrina"));
    assert_eq!(advisory.reminder, COMPLIANCE_REMINDER);

    form.select_pest("Ninguna").expect("sentinel should exist");
    assert!(form.advisory().is_none());
}

#[test]
fn negative_quantity_never_reaches_the_store() {
    let catalog = catalog();
    let store = VecStore::default();
    let mut form = EntryForm::new(&catalog);

    form.set_quantity(3.0)
        .expect("positive quantity should be accepted");
    let err = form
        .set_quantity(-1.0)
        .expect_err("negative should be rejected");
    assert!(matches!(err, FormError::Quantity(_)));
    assert_eq!(form.quantity().value(), 3.0);

    form.set_quantity(0.0).expect("zero should be accepted");
    form.submit(&store).expect("submit should succeed");
    let rows = store.list_all().expect("list should succeed");
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].quantity.value(), 0.0);
}

#[test]
fn submit_persists_record_acknowledges_and_resets() {
    let catalog = catalog();
    let store = SqliteStore::open_in_memory().expect("store should open");
    let mut form = EntryForm::new(&catalog);
    form.set_date(RecordDate::from_str("2024-03-01").unwrap());
    form.set_worker(Worker::SecondHand);
    form.select_crop("Aguacates").expect("crop should exist");
    form.set_labor(Labor::Treatment);
    form.select_pest("Trips").expect("pest should exist");
    form.set_product("  Spinosad lote 7 ");
    form.set_quantity(1.5).expect("quantity should be accepted");
    form.set_notes("Sector 2");

    let ack = form.submit(&store).expect("submit should succeed");
    assert_eq!(ack.message, "Registro guardado: Tratamiento Fito en Aguacates.");
    assert_eq!(form.state(), &FormState::Submitted(ack));

    assert_eq!(form.crop().name, "Naranjos");
    assert_eq!(form.pest().name, NO_PEST);
    assert_eq!(form.worker(), Worker::Owner);
    assert_eq!(form.quantity().value(), 0.0);
    assert_eq!(form.date(), RecordDate::today());

    let rows = store.list_all().expect("list should succeed");
    assert_eq!(rows.len(), 1);
    let row = &rows[0];
    assert_eq!(row.date.to_string(), "2024-03-01");
    assert_eq!(row.worker, Worker::SecondHand);
    assert_eq!(row.crop, "Aguacates");
    assert_eq!(row.pest, "Trips");
    assert_eq!(row.product, "Spinosad lote 7");
    assert_eq!(row.notes, "Sector 2");
}

#[test]
fn editing_after_submit_returns_to_editing() {
    let catalog = catalog();
    let store = VecStore::default();
    let mut form = EntryForm::new(&catalog);
    form.submit(&store).expect("submit should succeed");
    assert!(matches!(form.state(), FormState::Submitted(_)));

    form.set_notes("otra");
    assert_eq!(form.state(), &FormState::Editing);
}

#[test]
fn store_failure_keeps_the_entry() {
    let catalog = catalog();
    let mut form = EntryForm::new(&catalog);
    form.select_crop("Cafetos").expect("crop should exist");
    form.set_notes("no se pierde");

    let err = form
        .submit(&FailingStore)
        .expect_err("store failure should surface");
    assert!(matches!(err, FormError::Store(_)));
    assert!(err.to_string().contains("read-only filesystem"));
    assert_eq!(form.state(), &FormState::Editing);
    assert_eq!(form.crop().name, "Cafetos");
    assert_eq!(form.record().notes, "no se pierde");
}
