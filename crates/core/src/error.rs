use thiserror::Error;

/// Failure to parse a string-backed enum read from a stored row.
///
/// Storage backends wrap this into their own corruption variant; it never
/// reaches callers directly.
#[derive(Debug, Error)]
#[error("invalid {what}: {value}")]
pub struct ParseEnumError {
    pub what: &'static str,
    pub value: String,
}

impl ParseEnumError {
    #[must_use]
    pub fn new(what: &'static str, value: &str) -> Self {
        Self { what, value: value.to_owned() }
    }
}
