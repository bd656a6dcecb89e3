use std::io::{self, BufRead, Write};
use std::str::FromStr;

use crate::app::{App, AppError};
use crate::domain::labor::Labor;
use crate::domain::quantity::Quantity;
use crate::domain::record::RecordDate;
use crate::domain::worker::Worker;
use crate::form::{Acknowledgement, FormState};

/// Line-oriented front end for [`crate::form::EntryForm`]. Blank answers
/// keep the shown default; choices accept a number or a name. Returns `None`
/// when the user declines to save.
pub fn run_entry_form<R: BufRead, W: Write>(
    app: &App,
    input: &mut R,
    out: &mut W,
) -> Result<Option<Acknowledgement>, AppError> {
    let mut form = app.new_form();
    writeln!(out, "Registrar Labor en Campo")?;

    ask_value(input, out, "Fecha", &form.date().to_string(), |raw| {
        let date = RecordDate::from_str(raw).map_err(|err| err.to_string())?;
        form.set_date(date);
        Ok(())
    })?;

    let workers = Worker::ALL.map(Worker::as_str);
    let current = form.worker().as_str();
    ask_choice(input, out, "Trabajador", &workers, current, |raw| {
        let worker = Worker::from_str(raw).map_err(|err| err.to_string())?;
        form.set_worker(worker);
        Ok(())
    })?;

    let crops = app.catalog().crop_names().collect::<Vec<_>>();
    let current = form.crop().name.as_str();
    let label = "1. Selecciona el Cultivo";
    ask_choice(input, out, label, &crops, current, |raw| {
        form.select_crop(raw).map_err(|err| err.to_string())
    })?;

    let labors = Labor::ALL.map(Labor::as_str);
    let current = form.labor().as_str();
    ask_choice(input, out, "Labor Realizada", &labors, current, |raw| {
        let labor = Labor::from_str(raw).map_err(|err| err.to_string())?;
        form.set_labor(labor);
        Ok(())
    })?;

    let pests = form.pest_choices().names().collect::<Vec<_>>();
    let current = form.pest().name.as_str();
    let label = "2. Plaga Detectada (Opcional)";
    ask_choice(input, out, label, &pests, current, |raw| {
        form.select_pest(raw).map_err(|err| err.to_string())
    })?;
    if let Some(advisory) = form.advisory() {
        writeln!(out)?;
        writeln!(out, "{}", advisory.headline())?;
        writeln!(out, "{}", advisory.recommendation)?;
        writeln!(out, "{}", advisory.reminder)?;
        writeln!(out)?;
    }

    ask_value(input, out, "Producto Utilizado / Lote", "", |raw| {
        form.set_product(raw);
        Ok(())
    })?;

    let current = form.quantity().to_string();
    ask_value(input, out, "Cantidad (L / Kg / Horas)", &current, |raw| {
        let quantity = Quantity::from_str(raw).map_err(|err| err.to_string())?;
        let value = quantity.value();
        form.set_quantity(value).map_err(|err| err.to_string())
    })?;

    ask_value(input, out, "Notas o ubicación (Sector)", "", |raw| {
        form.set_notes(raw);
        Ok(())
    })?;

    if !confirm(input, out, "¿Guardar registro?")? {
        writeln!(out, "registro descartado")?;
        return Ok(None);
    }
    let ack = app.submit(&mut form)?;
    if let FormState::Submitted(saved) = form.state() {
        writeln!(out, "{}", saved.message)?;
    }
    Ok(Some(ack))
}

fn read_answer<R: BufRead, W: Write>(
    input: &mut R,
    out: &mut W,
    label: &str,
    default: &str,
) -> io::Result<String> {
    if default.is_empty() {
        write!(out, "{label}: ")?;
    } else {
        write!(out, "{label} [{default}]: ")?;
    }
    out.flush()?;

    let mut line = String::new();
    if input.read_line(&mut line)? == 0 {
        return Err(io::Error::new(
            io::ErrorKind::UnexpectedEof,
            "input ended before the record was complete",
        ));
    }
    Ok(line.trim().to_string())
}

/// Free-text or parsed field. `apply` sees the default when the answer is
/// blank and is asked again after every rejection.
fn ask_value<R, W, F>(
    input: &mut R,
    out: &mut W,
    label: &str,
    default: &str,
    mut apply: F,
) -> io::Result<()>
where
    R: BufRead,
    W: Write,
    F: FnMut(&str) -> Result<(), String>,
{
    loop {
        let answer = read_answer(input, out, label, default)?;
        let value = if answer.is_empty() { default } else { &answer };
        match apply(value) {
            Ok(()) => return Ok(()),
            Err(message) => writeln!(out, "  ! {message}")?,
        }
    }
}

fn ask_choice<R, W, F>(
    input: &mut R,
    out: &mut W,
    label: &str,
    options: &[&str],
    current: &str,
    mut apply: F,
) -> io::Result<()>
where
    R: BufRead,
    W: Write,
    F: FnMut(&str) -> Result<(), String>,
{
    writeln!(out, "{label}:")?;
    for (position, option) in options.iter().enumerate() {
        writeln!(out, "  {}) {}", position + 1, option)?;
    }
    ask_value(input, out, label, current, |raw| {
        let picked = match raw.parse::<usize>() {
            Ok(number) if (1..=options.len()).contains(&number) => options[number - 1],
            Ok(number) => {
                let count = options.len();
                return Err(format!("choose a number from 1 to {count}, got {number}"));
            }
            Err(_) => raw,
        };
        apply(picked)
    })
}

fn confirm<R: BufRead, W: Write>(input: &mut R, out: &mut W, label: &str) -> io::Result<bool> {
    let answer = read_answer(input, out, &format!("{label} [s/N]"), "")?;
    Ok(matches!(
        answer.to_lowercase().as_str(),
        "s" | "si" | "sí" | "y" | "yes"
    ))
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;

    use super::run_entry_form;
    use crate::app::{App, AppError};
    use crate::db::SqliteStore;
    use crate::history::HistoryFilter;

    fn memory_app() -> App {
        let store = SqliteStore::open_in_memory().expect("in-memory store should open");
        App::with_store(Box::new(store)).expect("app should build")
    }

    fn run(app: &App, script: &str) -> (Result<Option<String>, AppError>, String) {
        let mut input = Cursor::new(script.as_bytes().to_vec());
        let mut out = Vec::new();
        let result = run_entry_form(app, &mut input, &mut out).map(|ack| ack.map(|a| a.message));
        (result, String::from_utf8(out).expect("output should be utf8"))
    }

    #[test]
    fn accepts_numbers_names_and_defaults() {
        let app = memory_app();
        let script = "2024-03-01\n\n2\nmonitoring\nTrips\nTrampa X\n2,5\nSector 3\ns\n";
        let (result, output) = run(&app, script);
        let message = result
            .expect("form should submit")
            .expect("record should be saved");
        assert_eq!(message, "Registro guardado: Monitoreo de Plagas en Aguacates.");
        assert!(output.contains("ALERTA DETECTADA EN AGUACATES"));
        assert!(output.contains("TRATAMIENTO AGUACATES: Spinosad"));
        assert!(output.contains("Registro Oficial de Fitosanitarios"));

        let view = app
            .history(&HistoryFilter::default())
            .expect("history should load");
        let record = &view.rows()[0].record;
        assert_eq!(record.date.to_string(), "2024-03-01");
        assert_eq!(record.worker.as_str(), "Propietario");
        assert_eq!(record.crop, "Aguacates");
        assert_eq!(record.pest, "Trips");
        assert_eq!(record.product, "Trampa X");
        assert_eq!(record.quantity.value(), 2.5);
        assert_eq!(record.notes, "Sector 3");
    }

    #[test]
    fn pest_prompt_only_offers_pests_of_selected_crop() {
        let app = memory_app();
        let script = "\n\nCafetos\n\nPiojo Rojo\nRoya\n\n\n\nn\n";
        let (result, output) = run(&app, script);
        assert!(result.expect("form should finish").is_none());
        assert!(output.contains("unknown pest 'Piojo Rojo' for crop 'Cafetos'"));
        assert!(output.contains("  2) Roya"));
        assert!(!output.contains(") Piojo Rojo"));
        assert!(output.contains("registro descartado"));
    }

    #[test]
    fn negative_quantity_is_asked_again() {
        let app = memory_app();
        let script = "\n\n\n\n\n\n-1\n4\n\ns\n";
        let (result, output) = run(&app, script);
        assert!(result.expect("form should submit").is_some());
        assert!(output.contains("  ! quantity must be 0 or greater, got -1"));

        let view = app
            .history(&HistoryFilter::default())
            .expect("history should load");
        assert_eq!(view.rows().len(), 1);
        assert_eq!(view.rows()[0].record.quantity.value(), 4.0);
    }

    #[test]
    fn out_of_range_choice_is_rejected() {
        let app = memory_app();
        let script = "\n9\n1\n\n\n\n\n\n\nno\n";
        let (result, output) = run(&app, script);
        assert!(result.expect("form should finish").is_none());
        assert!(output.contains("choose a number from 1 to 3, got 9"));
    }

    #[test]
    fn declined_confirmation_saves_nothing() {
        let app = memory_app();
        let (result, _) = run(&app, "\n\n\n\n\n\n\n\n\n");
        assert!(result.expect("form should finish").is_none());
        assert!(app
            .history(&HistoryFilter::default())
            .expect("history should load")
            .rows()
            .is_empty());
    }

    #[test]
    fn end_of_input_aborts() {
        let app = memory_app();
        let (result, _) = run(&app, "2024-03-01\n");
        match result {
            Err(AppError::Io(err)) => assert_eq!(err.kind(), std::io::ErrorKind::UnexpectedEof),
            other => panic!("expected EOF error, got {:?}", other),
        }
    }
}
