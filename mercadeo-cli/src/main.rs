// reset; cargo run -- citas
// reset; RUST_LOG=debug cargo run -- --base-dir /srv/mercadeo pagos --audit-csv pagos.csv
// reset; cargo run -- --config mercadeo.toml --expected-rows 412 ventas

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use mercadeo_lib::{
    Config, ERRORS_LOG_FILE,
    pipeline::{run_appointments, run_payments, run_sales},
    utils::write_error_to_log,
};

#[derive(Parser)]
#[command(name = "mercadeo")]
#[command(about = "Builds the dental marketing master workbook from the clinic exports")]
#[command(version)]
struct Args {
    /// Path to the TOML configuration (defaults to ./mercadeo.toml when present)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Directory every configured path is relative to
    #[arg(long, global = true)]
    base_dir: Option<PathBuf>,

    /// Fail when the resulting master does not have exactly this many rows
    #[arg(long, global = true)]
    expected_rows: Option<usize>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Pass 01: rebuild the configured weeks from the appointments export
    Citas,
    /// Pass 02: reconcile the payments export into the master
    Pagos {
        /// Write every payment assigned to a master row to this CSV file
        #[arg(long)]
        audit_csv: Option<PathBuf>,
    },
    /// Pass 03: merge the radiography income of the sales report into the master
    Ventas {
        /// Write every value merged into the master to this CSV file
        #[arg(long)]
        audit_csv: Option<PathBuf>,
    },
}

impl Command {
    fn label(&self) -> &'static str {
        match self {
            Command::Citas => "Appointments pass",
            Command::Pagos { .. } => "Payments pass",
            Command::Ventas { .. } => "Sales report pass",
        }
    }
}

fn run(args: &Args) -> anyhow::Result<String> {
    let mut config = Config::load(args.config.as_deref())?;
    if let Some(base_dir) = &args.base_dir {
        config.paths.base_dir = base_dir.clone();
    }
    if args.expected_rows.is_some() {
        config.expected_row_count = args.expected_rows;
    }

    let summary = match &args.command {
        Command::Citas => run_appointments(&config)?.to_string(),
        Command::Pagos { audit_csv } => run_payments(&config, audit_csv.as_deref())?.to_string(),
        Command::Ventas { audit_csv } => run_sales(&config, audit_csv.as_deref())?.to_string(),
    };
    Ok(summary)
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    let args = Args::parse();
    let label = args.command.label();
    log::info!("{label} started");

    match run(&args) {
        Ok(summary) => {
            println!("{summary}");
            println!("✅ {label} completed!");
        }
        Err(e) => {
            eprintln!("❌ {label} failed with error: {e:#}");
            eprintln!("❌ Check {} for details.", ERRORS_LOG_FILE);
            write_error_to_log(label, &format!("{e:?}"));
        }
    }
}
