use thiserror::Error;

pub type MediaResult<T> = Result<T, MediaError>;

#[derive(Error, Debug)]
pub enum MediaError {
    #[error("Configuration error: {0}")]
    Config(#[from] ::config::ConfigError),

    #[error("CSV file is empty or has no header row")]
    EmptyFile,

    #[error("Missing required column(s) after cleaning: {}", .0.join(", "))]
    MissingColumns(Vec<String>),

    #[error("Duplicate column after normalization: '{0}'")]
    DuplicateColumn(String),

    #[error("Invalid filter: {0}")]
    InvalidFilter(String),

    #[error("Report generation error: {0}")]
    Report(String),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl MediaError {
    /// Errors caused by the uploaded file or caller input rather than the service.
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            MediaError::EmptyFile
                | MediaError::MissingColumns(_)
                | MediaError::DuplicateColumn(_)
                | MediaError::InvalidFilter(_)
                | MediaError::Csv(_)
        )
    }
}
