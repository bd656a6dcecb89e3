mod app;
mod catalog;
mod cli;
mod completions;
mod db;
mod domain;
mod form;
mod history;
mod prompt;
mod ui;

use std::io;
use std::str::FromStr;

use serde::Serialize;

use app::{App, AppError, ExportDestination, ExportOutcome};
use domain::labor::Labor;
use domain::quantity::Quantity;
use domain::record::{FieldRecord, RecordDate};
use domain::worker::Worker;
use form::Advisory;

fn main() {
    init_tracing();
    if let Err(err) = run() {
        eprintln!("error: {}", err);
        std::process::exit(1);
    }
}

fn init_tracing() {
    use tracing_subscriber::prelude::*;
    use tracing_subscriber::{fmt, EnvFilter};

    let filter = EnvFilter::try_from_env("CHOSETAS_LOG")
        .unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(io::stderr))
        .init();
}

fn print_json(value: &impl Serialize) -> Result<(), AppError> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

#[derive(Serialize)]
struct NewRecordOutput<'a> {
    record: &'a FieldRecord,
    advisory: Option<&'a Advisory>,
    message: &'a str,
}

fn run() -> Result<(), AppError> {
    use clap::Parser;
    use cli::Commands;

    let cli = cli::Cli::parse();
    if let Commands::Completions(args) = &cli.command {
        return completions::run_completions_command(args.shell.as_deref());
    }

    let app = App::open(&cli.db)?;

    match cli.command {
        Commands::New(args) => run_new(&app, args)?,
        Commands::History(args) => {
            let filter = args.filter.to_filter()?;
            let view = app.history(&filter)?;
            if args.json {
                print_json(&view.rows())?;
            } else {
                ui::print_history(&view, &filter);
            }
        }
        Commands::Export(args) => {
            let filter = args.filter.to_filter()?;
            let destination = ExportDestination::from_arg(&args.output);
            match app.export_csv(&filter, &destination)? {
                ExportOutcome::Written {
                    destination: ExportDestination::File(path),
                    rows,
                } => println!("exported {} record(s) to {}", rows, path.display()),
                ExportOutcome::Written { .. } => {}
                // stdout carries only CSV
                ExportOutcome::Skipped { message } if destination == ExportDestination::Stdout => {
                    eprintln!("{message}")
                }
                ExportOutcome::Skipped { message } => println!("{message}"),
            }
        }
        Commands::Catalog(args) => {
            let catalog = app.catalog();
            match (args.crop.as_deref(), args.pest.as_deref()) {
                (Some(crop), Some(pest)) => {
                    let (crop, pest) = catalog.resolve(crop, pest)?;
                    let advisory = Advisory::for_entry(crop, pest);
                    if args.json {
                        print_json(&advisory)?;
                    } else {
                        match advisory {
                            Some(advisory) => ui::print_advisory(&advisory),
                            None => println!("{}: no pest selected", crop.name),
                        }
                    }
                }
                (Some(crop), None) => {
                    let crop = catalog.crop(crop)?;
                    if args.json {
                        print_json(crop)?;
                    } else {
                        ui::print_crop_pests(crop);
                    }
                }
                _ => {
                    if args.json {
                        print_json(&catalog.crops())?;
                    } else {
                        ui::print_catalog(catalog);
                    }
                }
            }
        }
        Commands::Completions(_) => unreachable!("completions return before the store opens"),
    }

    Ok(())
}

fn run_new(app: &App, args: cli::NewArgs) -> Result<(), AppError> {
    if args.interactive {
        let stdin = io::stdin();
        let mut input = stdin.lock();
        let mut out = io::stdout().lock();
        prompt::run_entry_form(app, &mut input, &mut out)?;
        return Ok(());
    }

    let mut form = app.new_form();
    if let Some(raw) = args.date.as_deref() {
        form.set_date(RecordDate::from_str(raw)?);
    }
    if let Some(raw) = args.worker.as_deref() {
        form.set_worker(Worker::from_str(raw)?);
    }
    if let Some(raw) = args.crop.as_deref() {
        form.select_crop(raw)?;
    }
    if let Some(raw) = args.labor.as_deref() {
        form.set_labor(Labor::from_str(raw)?);
    }
    if let Some(raw) = args.pest.as_deref() {
        form.select_pest(raw)?;
    }
    if let Some(raw) = args.product.as_deref() {
        form.set_product(raw);
    }
    if let Some(raw) = args.quantity.as_deref() {
        form.set_quantity(Quantity::from_str(raw)?.value())?;
    }
    if let Some(raw) = args.notes.as_deref() {
        form.set_notes(raw);
    }

    let record = form.record();
    let advisory = form.advisory();
    let ack = app.submit(&mut form)?;
    if args.json {
        return print_json(&NewRecordOutput {
            record: &record,
            advisory: advisory.as_ref(),
            message: &ack.message,
        });
    }
    if let Some(advisory) = &advisory {
        ui::print_advisory(advisory);
    }
    ui::print_acknowledgement(&ack);
    Ok(())
}
