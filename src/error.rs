use std::{collections::BTreeMap, fmt};
use thiserror::Error;

/// Input fields that can be rejected by validation.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum Field {
    Principal,
    Rate,
    Tenure,
    Frequency,
    Moratorium,
    StartDate,
}

impl Field {
    pub fn name(&self) -> &'static str {
        match self {
            Field::Principal => "principal",
            Field::Rate => "rate",
            Field::Tenure => "tenure",
            Field::Frequency => "frequency",
            Field::Moratorium => "moratorium",
            Field::StartDate => "start_date",
        }
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// One message per invalid field. Never empty when returned as an error.
#[derive(Clone, PartialEq, Eq, Debug, Default, Error)]
#[error("{}", render(.errors))]
pub struct FieldErrors {
    errors: BTreeMap<Field, String>,
}

fn render(errors: &BTreeMap<Field, String>) -> String {
    errors
        .iter()
        .map(|(field, msg)| format!("{}: {}", field, msg))
        .collect::<Vec<_>>()
        .join("; ")
}

impl FieldErrors {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records an error for `field`. The first message recorded for a field wins.
    pub fn add(&mut self, field: Field, msg: impl Into<String>) {
        self.errors.entry(field).or_insert_with(|| msg.into());
    }

    pub fn get(&self, field: Field) -> Option<&str> {
        self.errors.get(&field).map(String::as_str)
    }

    pub fn contains(&self, field: Field) -> bool {
        self.errors.contains_key(&field)
    }

    pub fn len(&self) -> usize {
        self.errors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (Field, &str)> {
        self.errors.iter().map(|(f, m)| (*f, m.as_str()))
    }

    /// `Ok(value)` when nothing was recorded, otherwise the collected errors.
    pub fn into_result<T>(self, value: impl FnOnce() -> T) -> Result<T, FieldErrors> {
        if self.is_empty() {
            Ok(value())
        } else {
            Err(self)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{Field, FieldErrors};
    use test_log::test;

    #[test]
    fn test_first_message_wins() {
        let mut errs = FieldErrors::new();
        errs.add(Field::Tenure, "tenure must be > 0");
        errs.add(Field::Tenure, "tenure must cover a whole number of periods");

        assert_eq!(errs.len(), 1);
        assert_eq!(errs.get(Field::Tenure), Some("tenure must be > 0"));
    }

    #[test]
    fn test_display_lists_every_field() {
        let mut errs = FieldErrors::new();
        errs.add(Field::Rate, "rate must be ≥ 0");
        errs.add(Field::Principal, "principal must be > 0");

        assert_eq!(
            errs.to_string(),
            "principal: principal must be > 0; rate: rate must be ≥ 0"
        );
    }

    #[test]
    fn test_into_result() {
        assert_eq!(FieldErrors::new().into_result(|| 7), Ok(7));

        let mut errs = FieldErrors::new();
        errs.add(Field::StartDate, "start date must be a YYYY-MM-DD date");
        assert!(errs.clone().into_result(|| 7).is_err());
        assert!(errs.contains(Field::StartDate));
        assert_eq!(Field::StartDate.to_string(), "start_date");
    }
}
