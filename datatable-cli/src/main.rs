//! Headless driver for the data table engine
//!
//! Wires a table to the in-memory grid source and a headless viewport, replays
//! a burst of key presses under simulated latency, then optionally runs a
//! find and an edit, printing the active cell after each step.

use std::error::Error;
use std::fs::File;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use std::time::Instant;

use clap::Parser;
use datatable_lib::DataTable;
use datatable_lib::config::TableConfig;
use datatable_lib::navigation::NavCommand;
use datatable_lib::source::HeadlessViewport;
use datatable_lib::source::MemorySource;
use log::info;
use simplelog::Config;
use simplelog::LevelFilter;
use simplelog::SimpleLogger;
use simplelog::WriteLogger;

#[derive(Parser, Debug)]
#[command(name = "datatable", about = "Drive a windowed data table without a UI")]
struct Args {
    /// Number of rows in the synthetic grid
    #[arg(long, default_value = "1000")]
    rows: usize,

    /// Number of text columns in the synthetic grid
    #[arg(long, default_value = "5")]
    cols: usize,

    /// Simulated source latency in milliseconds
    #[arg(long, default_value = "300")]
    latency_ms: u64,

    /// Number of Down presses sent before any read returns
    #[arg(long, default_value = "100")]
    presses: usize,

    /// Viewport height in rows
    #[arg(long, default_value = "20")]
    height: usize,

    /// Incremental find term, typed one character at a time
    #[arg(long)]
    find: Option<String>,

    /// Replace the active cell with this text and save
    #[arg(long, value_name = "TEXT")]
    edit: Option<String>,

    /// Log file
    #[arg(long, default_value = "datatable-cli.log")]
    log_file: PathBuf,

    /// Log to the terminal instead of the log file
    #[arg(long)]
    log_stderr: bool,
}

fn init_logging(args: &Args) -> Result<(), Box<dyn Error>> {
    if args.log_stderr {
        SimpleLogger::init(LevelFilter::Debug, Config::default())?;
    } else {
        let log_file = File::create(&args.log_file)?;
        WriteLogger::init(LevelFilter::Debug, Config::default(), log_file)?;
    }
    Ok(())
}

fn print_active(table: &DataTable, step: &str) -> Result<(), Box<dyn Error>> {
    let active = table.active_cell();
    let text = match &active {
        Some(cell) => table.cell_text(cell.data_row_index, &cell.data_column_name)?,
        None => None,
    };

    println!(
        "{step:<12} {} text={}",
        serde_json::to_string(&active)?,
        text.as_deref().unwrap_or("<not loaded>")
    );
    if let Some(notice) = table.notice() {
        println!("{:<12} {notice}", "");
    }
    Ok(())
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    let args = Args::parse();
    init_logging(&args)?;

    let latency = Duration::from_millis(args.latency_ms);
    let source = Arc::new(MemorySource::grid(args.rows, args.cols).with_latency(latency));
    let viewport = Arc::new(HeadlessViewport::new(args.height));
    let config = TableConfig::new("grid", "id")
        .with_title("Synthetic grid")
        .with_columns(MemorySource::grid_columns(args.cols))
        .filterable(true)
        .findable(true)
        .editable(true);

    let table = DataTable::builder(config)
        .source(source.clone())
        .editor(source.clone())
        .finder(source.clone())
        .viewport(viewport)
        .build()?;

    info!(
        "Driving {} rows x {} columns at {latency:?} latency",
        args.rows, args.cols
    );
    table.refresh();
    table.navigate(NavCommand::Right);

    let started = Instant::now();
    for _ in 0..args.presses {
        table.navigate(NavCommand::Down);
    }
    print_active(&table, "burst")?;

    table.settle().await;
    print_active(&table, "settled")?;
    println!(
        "{:<12} {} reads, {:?}",
        "",
        source.request_count(),
        started.elapsed()
    );

    if let Some(term) = &args.find {
        let mut typed = String::new();
        for c in term.chars() {
            typed.push(c);
            table.set_find_term(&typed).await?;
        }
        table.settle().await;
        print_active(&table, "find")?;
    }

    if let Some(text) = &args.edit
        && let Some(cell) = table.active_cell()
    {
        table.begin_edit()?;
        table.set_field(&cell.data_column_name, text.as_str())?;
        let outcome = table.save().await?;
        table.settle().await;
        println!("{:<12} {outcome:?}", "edit");
        print_active(&table, "edited")?;
    }

    Ok(())
}
