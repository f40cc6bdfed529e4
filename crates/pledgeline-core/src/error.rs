use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum CoreError {
    #[error("disposition name is required")]
    EmptyDispositionName,
    #[error("invalid timeout days: {0}")]
    InvalidTimeoutDays(i32),
    #[error("timeout modifier requires timeout days")]
    MissingTimeoutDays,
    #[error("invalid exclude-after attempts: {0}")]
    InvalidExcludeAttempts(i32),
    #[error("exclude-count modifier requires an attempt threshold")]
    MissingExcludeAttempts,
    #[error("invalid exclude action timeout days: {0}")]
    InvalidExcludeActionDays(i32),
    #[error("timeout exclude action requires timeout days")]
    MissingExcludeActionDays,
    #[error("phone is required")]
    EmptyPhone,
    #[error("invalid amount: {0}")]
    InvalidAmount(String),
    #[error("invalid modifier: {0}")]
    InvalidModifier(String),
    #[error("invalid exclude action: {0}")]
    InvalidExcludeAction(String),
    #[error("invalid customer source: {0}")]
    InvalidCustomerSource(String),
    #[error("invalid timestamp")]
    InvalidTimestamp,
}
