pub mod error;
pub mod export;
pub mod loan;
pub mod session;
pub mod validate;

pub use error::{Field, FieldErrors};
pub use loan::{compute_schedule, Frequency, LoanParams, Period, Schedule};
pub use session::Session;
pub use validate::{validate, RawLoanParams};
