use thiserror::Error;

#[derive(Error, Debug)]
pub enum FormError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("workbook error: {0}")]
    Xlsx(#[from] rust_xlsxwriter::XlsxError),

    #[error("unrecognised completion date: {0:?}")]
    InvalidDate(String),

    #[error("unknown form field: {0}")]
    UnknownField(String),

    #[error("work order not found: {0}")]
    RecordNotFound(String),

    #[error("could not load image: {0}")]
    ImageLoad(String),

    #[error("an export is already running")]
    ExportInProgress,

    #[error("export failed: {0}")]
    Export(String),

    #[error("incorrect password")]
    AccessDenied,
}

pub type Result<T> = std::result::Result<T, FormError>;
