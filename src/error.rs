use thiserror::Error;

#[derive(Error, Debug)]
pub enum CromulentError {
    #[error("API error: {0}")]
    Api(String),

    #[error("export failed: {0}")]
    Export(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("archive error: {0}")]
    Zip(#[from] zip::result::ZipError),
}

pub type Result<T> = std::result::Result<T, CromulentError>;
