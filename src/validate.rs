//! Parsing and validation of loan parameters entered as free-form text.

use chrono::NaiveDate;
use log::warn;

use crate::error::{Field, FieldErrors};
use crate::loan::{check_terms, Frequency, LoanParams};

pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// Loan parameters exactly as a user typed or selected them.
#[derive(Clone, PartialEq, Eq, Debug, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct RawLoanParams {
    pub principal: String,
    pub annual_rate_percent: String,
    pub tenure_years: String,
    pub frequency: String,
    pub moratorium_months: String,
    pub start_date: String,
}

/// Checks every field and reports one error per invalid field, or the
/// validated parameters when all fields are acceptable.
pub fn validate(raw: &RawLoanParams) -> Result<LoanParams, FieldErrors> {
    let mut errs = FieldErrors::new();

    let principal = parse_number(&mut errs, Field::Principal, &raw.principal);
    let rate = parse_number(&mut errs, Field::Rate, &raw.annual_rate_percent);
    let tenure = parse_number(&mut errs, Field::Tenure, &raw.tenure_years);
    let frequency = parse_frequency(&mut errs, &raw.frequency);
    let moratorium = parse_moratorium(&mut errs, &raw.moratorium_months);
    let start_date = parse_date(&mut errs, &raw.start_date);

    let total_periods = check_terms(
        &mut errs, principal, rate, tenure, frequency, moratorium, start_date,
    );

    match (principal, rate, tenure, frequency, moratorium, start_date, total_periods) {
        (Some(p), Some(r), Some(t), Some(f), Some(m), Some(d), Some(n)) if errs.is_empty() => {
            Ok(LoanParams::checked(p, r, t, f, m, d, n))
        }
        _ => {
            for (field, msg) in errs.iter() {
                warn!("rejected {}: {}", field, msg);
            }
            Err(errs)
        }
    }
}

fn parse_number(errs: &mut FieldErrors, field: Field, text: &str) -> Option<f64> {
    match text.trim().parse::<f64>() {
        Ok(value) if value.is_finite() => Some(value),
        _ => {
            errs.add(field, format!("{} must be a number", field));
            None
        }
    }
}

fn parse_frequency(errs: &mut FieldErrors, text: &str) -> Option<Frequency> {
    match text.parse::<Frequency>() {
        Ok(freq) => Some(freq),
        Err(_) => {
            errs.add(
                Field::Frequency,
                "frequency must be one of monthly, quarterly, semi-annually, annually",
            );
            None
        }
    }
}

fn parse_moratorium(errs: &mut FieldErrors, text: &str) -> Option<u32> {
    let text = text.trim();
    if text.is_empty() {
        return Some(0);
    }
    match text.parse::<i64>() {
        Ok(months) if months < 0 => {
            errs.add(Field::Moratorium, "moratorium must be ≥ 0");
            None
        }
        Ok(months) => match u32::try_from(months) {
            Ok(months) => Some(months),
            Err(_) => {
                errs.add(Field::Moratorium, "moratorium extends beyond the supported date range");
                None
            }
        },
        Err(_) => {
            // "-1.5" is still a negative moratorium, not merely a non-integer one
            let msg = match text.parse::<f64>() {
                Ok(months) if months < 0. => "moratorium must be ≥ 0",
                _ => "moratorium must be a whole number of months",
            };
            errs.add(Field::Moratorium, msg);
            None
        }
    }
}

fn parse_date(errs: &mut FieldErrors, text: &str) -> Option<NaiveDate> {
    match NaiveDate::parse_from_str(text.trim(), DATE_FORMAT) {
        Ok(date) => Some(date),
        Err(_) => {
            errs.add(Field::StartDate, "start date must be a YYYY-MM-DD date");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{validate, RawLoanParams};
    use crate::error::Field;
    use crate::loan::{compute_schedule, Frequency, LoanParams};
    use chrono::NaiveDate;
    use test_log::test;

    fn raw(principal: &str, rate: &str, tenure: &str, moratorium: &str) -> RawLoanParams {
        RawLoanParams {
            principal: principal.to_string(),
            annual_rate_percent: rate.to_string(),
            tenure_years: tenure.to_string(),
            frequency: "monthly".to_string(),
            moratorium_months: moratorium.to_string(),
            start_date: "2024-01-01".to_string(),
        }
    }

    #[test]
    fn test_accepts_valid_input() {
        let params = validate(&raw(" 100000 ", "12", "1", "3")).unwrap();

        assert_eq!(params.principal(), 100000.);
        assert_eq!(params.annual_rate_percent(), 12.);
        assert_eq!(params.tenure_years(), 1.);
        assert_eq!(params.frequency(), Frequency::Monthly);
        assert_eq!(params.moratorium_months(), 3);
        assert_eq!(params.start_date(), NaiveDate::from_ymd_opt(2024, 1, 1).unwrap());
        assert_eq!(params.total_periods(), 12);

        let sched = compute_schedule(&params);
        assert_eq!(
            sched.get(1).unwrap().date,
            NaiveDate::from_ymd_opt(2024, 4, 1).unwrap()
        );
    }

    #[test]
    fn test_zero_rate_and_empty_moratorium() {
        let params = validate(&raw("12000", "0", "1", "")).unwrap();
        assert_eq!(params.moratorium_months(), 0);
        assert_eq!(params.annual_rate_percent(), 0.);
    }

    #[test]
    fn test_zero_principal() {
        let errs = validate(&raw("0", "12", "1", "0")).unwrap_err();
        assert_eq!(errs.len(), 1);
        assert_eq!(errs.get(Field::Principal), Some("principal must be > 0"));
    }

    #[test]
    fn test_negative_tenure() {
        let errs = validate(&raw("1000", "12", "-1", "0")).unwrap_err();
        assert_eq!(errs.len(), 1);
        assert_eq!(errs.get(Field::Tenure), Some("tenure must be > 0"));
    }

    #[test]
    fn test_every_field_reported() {
        let errs = validate(&raw("-5", "-0.5", "0", "-2")).unwrap_err();

        assert_eq!(errs.len(), 4);
        assert_eq!(errs.get(Field::Principal), Some("principal must be > 0"));
        assert_eq!(errs.get(Field::Rate), Some("rate must be ≥ 0"));
        assert_eq!(errs.get(Field::Tenure), Some("tenure must be > 0"));
        assert_eq!(errs.get(Field::Moratorium), Some("moratorium must be ≥ 0"));
    }

    #[test]
    fn test_unparseable_fields() {
        let input = RawLoanParams {
            principal: "ten thousand".to_string(),
            annual_rate_percent: "NaN".to_string(),
            tenure_years: "inf".to_string(),
            frequency: "fortnightly".to_string(),
            moratorium_months: "1.5".to_string(),
            start_date: "01/01/2024".to_string(),
        };
        let errs = validate(&input).unwrap_err();

        assert_eq!(errs.len(), 6);
        assert_eq!(errs.get(Field::Principal), Some("principal must be a number"));
        assert_eq!(errs.get(Field::Rate), Some("rate must be a number"));
        assert_eq!(errs.get(Field::Tenure), Some("tenure must be a number"));
        assert_eq!(
            errs.get(Field::Frequency),
            Some("frequency must be one of monthly, quarterly, semi-annually, annually")
        );
        assert_eq!(
            errs.get(Field::Moratorium),
            Some("moratorium must be a whole number of months")
        );
        assert_eq!(
            errs.get(Field::StartDate),
            Some("start date must be a YYYY-MM-DD date")
        );
    }

    #[test]
    fn test_fractional_period_count() {
        let errs = validate(&raw("1000", "5", "0.1", "0")).unwrap_err();
        assert_eq!(
            errs.get(Field::Tenure),
            Some("tenure must cover a whole number of periods")
        );

        // 1.25 years monthly is exactly 15 periods
        let params = validate(&raw("1000", "5", "1.25", "0")).unwrap();
        assert_eq!(params.total_periods(), 15);

        let mut quarterly = raw("1000", "5", "0.5", "0");
        quarterly.frequency = "Quarterly".to_string();
        assert_eq!(validate(&quarterly).unwrap().total_periods(), 2);

        quarterly.tenure_years = "0.1".to_string();
        assert!(validate(&quarterly).unwrap_err().contains(Field::Tenure));
    }

    #[test]
    fn test_no_upper_bound_on_principal() {
        let params = validate(&raw("1e15", "3", "40", "0")).unwrap();
        assert_eq!(params.total_periods(), 480);
        assert!(compute_schedule(&params).last().unwrap().balance_after < 1e6);
    }

    #[test]
    fn test_moratorium_out_of_range() {
        let errs = validate(&raw("1000", "5", "1", "99999999999")).unwrap_err();
        assert!(errs.contains(Field::Moratorium));

        // the moratorium alone leaves the date range
        let errs = validate(&raw("1000", "5", "1", "4000000")).unwrap_err();
        assert_eq!(errs.len(), 1);
        assert_eq!(
            errs.get(Field::Moratorium),
            Some("moratorium extends beyond the supported date range")
        );

        // the moratorium fits, the periods after it do not
        let errs = validate(&raw("1000", "5", "20000", "3000000")).unwrap_err();
        assert_eq!(errs.len(), 1);
        assert_eq!(
            errs.get(Field::Tenure),
            Some("tenure extends beyond the supported date range")
        );
    }

    #[test]
    fn test_overflowing_payment() {
        let errs = validate(&raw("1e308", "1e6", "1", "0")).unwrap_err();
        assert_eq!(
            errs.get(Field::Principal),
            Some("principal and rate give a payment too large to represent")
        );
    }

    #[test]
    fn test_validated_params_match_typed_constructor() {
        let params = validate(&raw("25000", "7.5", "2.5", "6")).unwrap();
        let typed = LoanParams::new(
            25000.,
            7.5,
            2.5,
            Frequency::Monthly,
            6,
            NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
        )
        .unwrap();
        assert_eq!(params, typed);
        assert_eq!(params.total_periods(), 30);
    }
}
