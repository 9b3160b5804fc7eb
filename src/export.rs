//! Tabular, CSV and chart views of a computed schedule.

use chrono::NaiveDate;
use std::io;

use crate::loan::{Period, Schedule};

pub const HEADER: [&str; 5] = ["Date", "Payment", "Interest", "Principal", "Balance"];

// medium date, e.g. "Jan 1, 2024"
const MEDIUM_DATE: &str = "%b %-d, %Y";

pub fn format_date(date: NaiveDate) -> String {
    date.format(MEDIUM_DATE).to_string()
}

pub fn format_money(amount: f64) -> String {
    // avoid rendering a rounded-away residual as "-0.00"
    let amount = round(amount, 2);
    format!("{:.2}", if amount == 0. { 0. } else { amount })
}

fn round(amt: f64, dec: i32) -> f64 {
    (amt * 10_f64.powi(dec)).round() / 10_f64.powi(dec)
}

/// `[date, payment, interest, principal, balance]` for one period.
pub fn row(period: &Period) -> [String; 5] {
    [
        format_date(period.date),
        format_money(period.payment),
        format_money(period.interest),
        format_money(period.principal),
        format_money(period.balance_after),
    ]
}

pub fn rows(schedule: &Schedule) -> Vec<[String; 5]> {
    schedule.iter().map(row).collect()
}

pub fn write_csv<W: io::Write>(schedule: &Schedule, writer: W) -> Result<(), csv::Error> {
    let mut wtr = csv::Writer::from_writer(writer);
    wtr.write_record(HEADER)?;
    for period in schedule {
        wtr.write_record(row(period))?;
    }
    wtr.flush()?;
    Ok(())
}

/// Point of the balance/payment line view.
#[derive(Clone, Copy, PartialEq, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct BalancePoint {
    pub date: NaiveDate,
    pub balance: f64,
    pub payment: f64,
}

/// Bar of the stacked principal/interest view.
#[derive(Clone, Copy, PartialEq, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SplitPoint {
    pub number: u32,
    pub principal: f64,
    pub interest: f64,
}

pub fn balance_series(schedule: &Schedule) -> Vec<BalancePoint> {
    schedule
        .iter()
        .map(|p| BalancePoint {
            date: p.date,
            balance: p.balance_after,
            payment: p.payment,
        })
        .collect()
}

pub fn split_series(schedule: &Schedule) -> Vec<SplitPoint> {
    schedule
        .iter()
        .map(|p| SplitPoint {
            number: p.number,
            principal: p.principal,
            interest: p.interest,
        })
        .collect()
}
