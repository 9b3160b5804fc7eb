use chrono::{Months, NaiveDate};
use log::{debug, trace};
use std::{fmt, str::FromStr};
use thiserror::Error;

use crate::error::{Field, FieldErrors};

// tolerance used when deciding whether tenure x periods-per-year is a whole count
const PERIOD_COUNT_EPSILON: f64 = 1e-9;

#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Frequency {
    Monthly,
    Quarterly,
    SemiAnnually,
    Annually,
}

impl Frequency {
    pub const ALL: [Frequency; 4] = [
        Frequency::Monthly,
        Frequency::Quarterly,
        Frequency::SemiAnnually,
        Frequency::Annually,
    ];

    pub fn periods_per_year(&self) -> u32 {
        match self {
            Frequency::Monthly => 12,
            Frequency::Quarterly => 4,
            Frequency::SemiAnnually => 2,
            Frequency::Annually => 1,
        }
    }

    pub fn months_per_period(&self) -> u32 {
        12 / self.periods_per_year()
    }
}

impl fmt::Display for Frequency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Frequency::Monthly => "monthly",
            Frequency::Quarterly => "quarterly",
            Frequency::SemiAnnually => "semi-annually",
            Frequency::Annually => "annually",
        };
        f.write_str(name)
    }
}

#[derive(Clone, PartialEq, Eq, Debug, Error)]
#[error("unknown repayment frequency '{0}'")]
pub struct UnknownFrequency(pub String);

impl FromStr for Frequency {
    type Err = UnknownFrequency;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "monthly" => Ok(Frequency::Monthly),
            "quarterly" => Ok(Frequency::Quarterly),
            "semi-annually" | "semiannually" | "semi_annually" => Ok(Frequency::SemiAnnually),
            "annually" => Ok(Frequency::Annually),
            _ => Err(UnknownFrequency(s.to_string())),
        }
    }
}

/// Validated loan terms. Only obtainable through [`LoanParams::new`] or
/// [`crate::validate`], so every instance yields a complete schedule.
#[derive(Clone, PartialEq, Debug)]
pub struct LoanParams {
    principal: f64,
    annual_rate_percent: f64,
    tenure_years: f64,
    frequency: Frequency,
    moratorium_months: u32,
    start_date: NaiveDate,
    total_periods: u32,
}

impl LoanParams {
    pub fn new(
        principal: f64,
        annual_rate_percent: f64,
        tenure_years: f64,
        frequency: Frequency,
        moratorium_months: u32,
        start_date: NaiveDate,
    ) -> Result<Self, FieldErrors> {
        let mut errs = FieldErrors::new();
        let total_periods = check_terms(
            &mut errs,
            Some(principal),
            Some(annual_rate_percent),
            Some(tenure_years),
            Some(frequency),
            Some(moratorium_months),
            Some(start_date),
        );
        errs.into_result(|| {
            Self::checked(
                principal,
                annual_rate_percent,
                tenure_years,
                frequency,
                moratorium_months,
                start_date,
                total_periods.unwrap_or_default(),
            )
        })
    }

    // Caller has already run `check_terms` over these values without errors.
    pub(crate) fn checked(
        principal: f64,
        annual_rate_percent: f64,
        tenure_years: f64,
        frequency: Frequency,
        moratorium_months: u32,
        start_date: NaiveDate,
        total_periods: u32,
    ) -> Self {
        Self {
            principal,
            annual_rate_percent,
            tenure_years,
            frequency,
            moratorium_months,
            start_date,
            total_periods,
        }
    }

    pub fn principal(&self) -> f64 {
        self.principal
    }

    pub fn annual_rate_percent(&self) -> f64 {
        self.annual_rate_percent
    }

    pub fn tenure_years(&self) -> f64 {
        self.tenure_years
    }

    pub fn frequency(&self) -> Frequency {
        self.frequency
    }

    pub fn moratorium_months(&self) -> u32 {
        self.moratorium_months
    }

    pub fn start_date(&self) -> NaiveDate {
        self.start_date
    }

    pub fn total_periods(&self) -> u32 {
        self.total_periods
    }

    pub fn periodic_rate(&self) -> f64 {
        self.annual_rate_percent / 100. / self.frequency.periods_per_year() as f64
    }
}

// Shared by `LoanParams::new` and the text validator. Fields that failed to
// parse are passed as `None` and only skip the checks that depend on them.
// Returns the period count when it could be established.
pub(crate) fn check_terms(
    errs: &mut FieldErrors,
    principal: Option<f64>,
    annual_rate_percent: Option<f64>,
    tenure_years: Option<f64>,
    frequency: Option<Frequency>,
    moratorium_months: Option<u32>,
    start_date: Option<NaiveDate>,
) -> Option<u32> {
    let principal = principal.filter(|&principal| {
        if !principal.is_finite() {
            errs.add(Field::Principal, "principal must be a number");
        } else if principal <= 0. {
            errs.add(Field::Principal, "principal must be > 0");
        }
        principal.is_finite() && principal > 0.
    });
    let rate = annual_rate_percent.filter(|&rate| {
        if !rate.is_finite() {
            errs.add(Field::Rate, "rate must be a number");
        } else if rate < 0. {
            errs.add(Field::Rate, "rate must be ≥ 0");
        }
        rate.is_finite() && rate >= 0.
    });

    let tenure = tenure_years?;
    if !tenure.is_finite() {
        errs.add(Field::Tenure, "tenure must be a number");
        return None;
    }
    if tenure <= 0. {
        errs.add(Field::Tenure, "tenure must be > 0");
        return None;
    }

    let frequency = frequency?;
    let Some(count) = whole_periods(tenure, frequency) else {
        errs.add(Field::Tenure, "tenure must cover a whole number of periods");
        return None;
    };
    let Ok(total_periods) = u32::try_from(count) else {
        errs.add(Field::Tenure, "tenure extends beyond the supported date range");
        return None;
    };

    // the last payment date must exist for the engine to be total
    if let (Some(moratorium), Some(start)) = (moratorium_months, start_date) {
        let Some(first) = add_months(start, moratorium) else {
            errs.add(
                Field::Moratorium,
                "moratorium extends beyond the supported date range",
            );
            return None;
        };
        let span = (total_periods as u64 - 1) * frequency.months_per_period() as u64;
        let last = u32::try_from(span)
            .ok()
            .and_then(|months| add_months(first, months));
        if last.is_none() {
            errs.add(Field::Tenure, "tenure extends beyond the supported date range");
            return None;
        }
    }

    // amounts must stay finite; the first period carries the largest interest
    if let (Some(principal), Some(rate)) = (principal, rate) {
        let periodic_rate = rate / 100. / frequency.periods_per_year() as f64;
        let payment = level_payment(principal, periodic_rate, total_periods);
        if !payment.is_finite() || !(principal * periodic_rate).is_finite() {
            errs.add(
                Field::Principal,
                "principal and rate give a payment too large to represent",
            );
            return None;
        }
    }

    Some(total_periods)
}

fn whole_periods(tenure_years: f64, frequency: Frequency) -> Option<u64> {
    let raw = tenure_years * frequency.periods_per_year() as f64;
    let count = raw.round();
    if (raw - count).abs() > PERIOD_COUNT_EPSILON || count < 1. {
        None
    } else {
        // saturates for counts past u64::MAX, which are rejected by the caller anyway
        Some(count as u64)
    }
}

/// Calendar-safe month addition: days past the end of the target month are
/// clamped to its last day (2024-01-31 + 1 month = 2024-02-29).
pub fn add_months(date: NaiveDate, months: u32) -> Option<NaiveDate> {
    date.checked_add_months(Months::new(months))
}

/// Level payment that amortizes `principal` over `periods` at `periodic_rate`.
pub fn level_payment(principal: f64, periodic_rate: f64, periods: u32) -> f64 {
    // P.r.(1+r)^n / ((1+r)^n - 1) as P.r / (1 - (1+r)^-n), with 1 - (1+r)^-n
    // taken through ln_1p/exp_m1 so tiny rates keep their precision
    let discount = -(-(periods as f64) * periodic_rate.ln_1p()).exp_m1();
    if periodic_rate == 0. || discount == 0. {
        return principal / periods as f64;
    }
    principal * periodic_rate / discount
}

#[derive(Clone, Copy, PartialEq, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Period {
    pub number: u32,
    pub date: NaiveDate,
    pub payment: f64,
    pub interest: f64,
    pub principal: f64,
    pub balance_after: f64,
}

impl fmt::Display for Period {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "pmt number {}, date {}, payment ${:.2}, interest paid ${:.2}, principal paid ${:.2}, ending balance ${:.2}",
            self.number,
            self.date,
            self.payment,
            self.interest,
            self.principal,
            self.balance_after
        )
    }
}

/// Ordered repayment periods of one computation.
#[derive(Clone, PartialEq, Debug, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Schedule {
    periods: Vec<Period>,
}

impl Schedule {
    pub fn periods(&self) -> &[Period] {
        &self.periods
    }

    pub fn len(&self) -> usize {
        self.periods.len()
    }

    pub fn is_empty(&self) -> bool {
        self.periods.is_empty()
    }

    /// The level payment; zero for an empty schedule.
    pub fn payment(&self) -> f64 {
        self.periods.first().map_or(0., |p| p.payment)
    }

    /// Looks up a period by its 1-based number.
    pub fn get(&self, number: usize) -> Option<&Period> {
        number.checked_sub(1).and_then(|i| self.periods.get(i))
    }

    pub fn last(&self) -> Option<&Period> {
        self.periods.last()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Period> {
        self.periods.iter()
    }

    pub fn total_paid(&self) -> f64 {
        self.periods.iter().map(|p| p.payment).sum()
    }

    pub fn total_interest(&self) -> f64 {
        self.periods.iter().map(|p| p.interest).sum()
    }

    pub fn total_principal(&self) -> f64 {
        self.periods.iter().map(|p| p.principal).sum()
    }
}

impl<'a> IntoIterator for &'a Schedule {
    type Item = &'a Period;
    type IntoIter = std::slice::Iter<'a, Period>;

    fn into_iter(self) -> Self::IntoIter {
        self.periods.iter()
    }
}

impl fmt::Display for Schedule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for period in &self.periods {
            writeln!(f, "{}", period)?;
        }
        Ok(())
    }
}

pub fn compute_schedule(params: &LoanParams) -> Schedule {
    let periodic_rate = params.periodic_rate();
    let total_periods = params.total_periods();
    let payment = level_payment(params.principal(), periodic_rate, total_periods);
    let step = params.frequency().months_per_period();
    debug!(
        "{} periods {}, periodic rate {}, payment {}",
        total_periods,
        params.frequency(),
        periodic_rate,
        payment
    );

    let mut periods = Vec::with_capacity(total_periods as usize);
    let mut balance = params.principal();

    for number in 1..=total_periods {
        let offset = params.moratorium_months() + (number - 1) * step;
        let date = match add_months(params.start_date(), offset) {
            Some(date) => date,
            None => panic!(
                "{} plus {} months is not a representable payment date",
                params.start_date(),
                offset
            ),
        };

        let interest = balance * periodic_rate;
        let principal = payment - interest;
        balance -= principal;
        let balance_after = balance.max(0.);
        trace!(
            "Pmt # {}, date {}, interest {}, end bal {}",
            number,
            date,
            interest,
            balance_after
        );

        periods.push(Period {
            number,
            date,
            payment,
            interest,
            principal,
            balance_after,
        });
    }

    Schedule { periods }
}
