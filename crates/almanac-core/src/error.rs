use thiserror::Error;

/// Faults raised by the calendar and timeline builders.
///
/// Every fault is local to a single build call; nothing here is fatal to
/// the process.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CalendarError {
    /// Month number outside `1..=12`
    #[error("month `{month}` of year {year} is not allowed")]
    InvalidMonth { year: i32, month: u32 },

    /// Date arithmetic left the representable calendar range
    #[error("date out of range: {0}")]
    OutOfRange(String),

    /// A date or date-time string that could not be parsed
    #[error("invalid date: {0}")]
    InvalidDate(String),

    /// An input record that breaks its own invariants (end before start,
    /// progress above 100, empty identifier)
    #[error("invalid record `{id}`: {reason}")]
    InvalidRecord { id: String, reason: String },
}

pub type CalendarResult<T> = Result<T, CalendarError>;
