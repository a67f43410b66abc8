/// Errors that can occur while configuring or delivering a conversion.
///
/// Conversion itself never fails: unresolvable URLs pass through and empty
/// selections yield `None`.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum SuperCopyError {
    #[error("{field} must be one of {allowed}, got \"{value}\"")]
    InvalidOption {
        field: String,
        allowed: String,
        value: String,
    },

    #[error("range boundary offset {offset} is out of bounds (length {len})")]
    InvalidBoundary { offset: usize, len: usize },

    #[error("clipboard write failed: {0}")]
    Delivery(String),
}
