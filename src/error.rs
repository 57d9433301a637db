use std::path::PathBuf;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum ErrorKind {
    #[error("Failed to parse translation catalog {path:?}: {err}")]
    CatalogError {
        path: PathBuf,
        #[source]
        err: gettext::Error,
    },
    #[error("Expected <{element}> under <{parent}>")]
    MissingElement { parent: String, element: String },
    #[error("No document loaded for nation {0:?}")]
    UnknownNation(String),
    #[error("Error writing zip archive: {err}")]
    ZipError {
        #[from]
        err: zip::result::ZipError,
    },
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

pub type IResult<T> = Result<T, ErrorKind>;
