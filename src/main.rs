use book_fee_rust::config;
use book_fee_rust::fee::FeeEngine;
use book_fee_rust::item::library::{CatalogFile, Library};
use book_fee_rust::item::ItemError;
use book_fee_rust::{parse_date, report, today};
use chrono::NaiveDate;
use clap::{Parser, Subcommand, ValueEnum};
use std::error::Error;
use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing::info;

#[derive(Debug, Parser)]
#[command(name = "book-fee", version, about = "Overdue book fee calculator")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// 연체 대출별 정책별 연체료와 이용자별 합계를 출력한다.
    Report {
        /// JSON 카탈로그 파일
        #[arg(long)]
        catalog: PathBuf,

        /// 기준일 (YYYY-MM-DD), 생략시 오늘
        #[arg(long, value_parser = parse_date)]
        date: Option<NaiveDate>,

        #[arg(long, value_enum, default_value_t = Format::Table)]
        format: Format,
    },

    /// 이용자 1명의 연체료 합계를 출력한다.
    Total {
        #[arg(long)]
        catalog: PathBuf,

        #[arg(long)]
        user: String,

        /// standard, progressive, weekend_exclusive
        #[arg(long, default_value = "standard")]
        strategy: String,

        #[arg(long, value_parser = parse_date)]
        date: Option<NaiveDate>,
    },
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum Format {
    Table,
    Json,
}

fn main() -> ExitCode {
    config::load_dotenv();
    let cli = Cli::parse();

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("error: {}", err);
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<(), Box<dyn Error>> {
    let app = config::load_config()?;
    let _guard = config::log::set_global_logging_config(app.logger())?;
    let engine = FeeEngine::new(app.fee().clone());

    match cli.command {
        Command::Report { catalog, date, format } => {
            let library = load_library(&catalog)?;
            let report = report::build_report(&library, &engine, date.unwrap_or_else(today))?;
            match format {
                Format::Table => print!("{}", report.render_table()),
                Format::Json => report.write_json_lines(std::io::stdout().lock())?,
            }
        }
        Command::Total { catalog, user, strategy, date } => {
            let library = load_library(&catalog)?;
            let found = library.find_user(&user)
                .ok_or_else(|| ItemError::NotFound(format!("user {}", user)))?;
            let loans = library.loans_of(found.id())?;
            let total = engine.compute_user_total(found, &loans, &strategy, date.unwrap_or_else(today))?;

            println!(
                "{} {} {}: {:.2} ({} overdue, subtotal {:.2}{})",
                total.user_id(),
                found.name(),
                total.strategy(),
                total.amount(),
                total.overdue_count(),
                total.subtotal(),
                if total.bulk_discount_applied() { ", bulk discount" } else { "" },
            );
        }
    }

    Ok(())
}

fn load_library(path: &Path) -> Result<Library, Box<dyn Error>> {
    let file = File::open(path)?;
    let catalog: CatalogFile = serde_json::from_reader(BufReader::new(file))?;
    let library = Library::try_from(catalog)?;

    info!(catalog = %path.display(), checkouts = library.checkouts().len(), "Catalog loaded");
    Ok(library)
}
