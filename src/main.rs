use amortize::{export, RawLoanParams, Session};
use clap::{Parser, ValueEnum};
use log::{info, LevelFilter};
use simple_logger::SimpleLogger;
use std::{io, process};

/// Level-payment loan amortization schedule
#[derive(Parser, Debug)]
#[command(name = "amortize", version)]
struct Cli {
    /// Amount disbursed
    #[arg(long)]
    principal: String,

    /// Nominal annual interest rate, in percent
    #[arg(long)]
    rate: String,

    /// Loan duration in years (fractions allowed)
    #[arg(long)]
    tenure: String,

    /// monthly, quarterly, semi-annually or annually
    #[arg(long, default_value = "monthly")]
    frequency: String,

    /// Months after disbursement before the first payment
    #[arg(long, default_value = "0")]
    moratorium: String,

    /// Disbursement date as YYYY-MM-DD (default: today)
    #[arg(long)]
    start: Option<String>,

    #[arg(long, value_enum, default_value = "table")]
    output: OutputFormat,

    #[arg(long, default_value = "warn")]
    log_level: LevelFilter,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum OutputFormat {
    Table,
    Csv,
}

fn main() {
    let cli = Cli::parse();

    if let Err(e) = SimpleLogger::new().with_level(cli.log_level).init() {
        eprintln!("error: {}", e);
        process::exit(1);
    }

    let raw = RawLoanParams {
        principal: cli.principal,
        annual_rate_percent: cli.rate,
        tenure_years: cli.tenure,
        frequency: cli.frequency,
        moratorium_months: cli.moratorium,
        start_date: cli.start.unwrap_or_else(|| {
            chrono::Local::now()
                .date_naive()
                .format(amortize::validate::DATE_FORMAT)
                .to_string()
        }),
    };

    let mut session = Session::new();
    let schedule = match session.submit(&raw) {
        Ok(schedule) => schedule,
        Err(errs) => {
            for (field, msg) in errs.iter() {
                eprintln!("error: {}: {}", field, msg);
            }
            process::exit(1);
        }
    };
    info!(
        "{} payments of {:.2}, total interest {:.2}",
        schedule.len(),
        schedule.payment(),
        schedule.total_interest()
    );

    match cli.output {
        OutputFormat::Table => print!("{}", schedule),
        OutputFormat::Csv => {
            if let Err(e) = export::write_csv(schedule, io::stdout().lock()) {
                eprintln!("error: {}", e);
                process::exit(1);
            }
        }
    }
}

// verifies that types can implement the gated traits below
#[cfg(test)]
fn is_normal<T: Sized + Send + Sync + Unpin>() {}

#[test]
fn normal_types() {
    is_normal::<amortize::Period>();
    is_normal::<amortize::Schedule>();
    is_normal::<amortize::FieldErrors>();
    is_normal::<amortize::LoanParams>();
}

#[test]
fn cli_parses_defaults() {
    let cli = Cli::parse_from(["amortize", "--principal", "1000", "--rate", "5", "--tenure", "1"]);
    assert_eq!(cli.frequency, "monthly");
    assert_eq!(cli.moratorium, "0");
    assert!(cli.start.is_none());
    assert_eq!(cli.log_level, LevelFilter::Warn);
}
