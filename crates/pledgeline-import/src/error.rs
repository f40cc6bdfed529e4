use pledgeline_core::time::TimeParseError;
use pledgeline_core::CoreError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ImportError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("csv error: {0}")]
    Csv(#[from] csv::Error),
    #[error("core error: {0}")]
    Core(#[from] CoreError),
    #[error("time error: {0}")]
    Time(#[from] TimeParseError),
    #[error("missing required column: {0}")]
    MissingColumn(&'static str),
    #[error("parse error: {0}")]
    Parse(String),
}

pub type Result<T> = std::result::Result<T, ImportError>;
