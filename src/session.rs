use log::debug;

use crate::error::FieldErrors;
use crate::loan::{compute_schedule, Schedule};
use crate::validate::{validate, RawLoanParams};

/// Latest outcome of a caller's parameter edits. Every submission replaces
/// the previous outcome wholesale; nothing is carried between computations.
#[derive(Clone, PartialEq, Debug, Default)]
pub struct Session {
    outcome: Option<Result<Schedule, FieldErrors>>,
    submissions: u64,
}

impl Session {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn submit(&mut self, raw: &RawLoanParams) -> Result<&Schedule, &FieldErrors> {
        self.submissions += 1;
        debug!("submission {}", self.submissions);

        let outcome = validate(raw).map(|params| compute_schedule(&params));
        let latest: &Result<Schedule, FieldErrors> = self.outcome.insert(outcome);
        latest.as_ref()
    }

    pub fn schedule(&self) -> Option<&Schedule> {
        self.outcome.as_ref().and_then(|o| o.as_ref().ok())
    }

    pub fn errors(&self) -> Option<&FieldErrors> {
        self.outcome.as_ref().and_then(|o| o.as_ref().err())
    }

    pub fn submissions(&self) -> u64 {
        self.submissions
    }
}
