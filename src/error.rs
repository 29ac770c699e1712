use std::path::PathBuf;
use thiserror::Error;

/// Failures talking to the spreadsheet service.
///
/// None of these are recovered from: they end the current interaction and
/// surface as an unstructured failure to the user.
#[derive(Error, Debug)]
pub enum SheetError {
    #[cfg(feature = "web")]
    #[error("spreadsheet request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("spreadsheet service answered {status}: {body}")]
    Status { status: u16, body: String },

    #[error("worksheet '{0}' not found")]
    TabNotFound(String),

    #[error("row {row} is outside worksheet '{tab}'")]
    RowOutOfRange { tab: String, row: usize },

    #[error("not a spreadsheet URL: {0}")]
    InvalidUrl(String),

    #[error("malformed spreadsheet data: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("{0}")]
    Io(#[from] std::io::Error),
}

/// Structural problems in a worksheet's header line.
#[derive(Error, Debug, PartialEq)]
pub enum TableError {
    #[error("the header row is not unique: '{0}' appears more than once")]
    DuplicateHeader(String),
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("cannot read {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("cannot parse {path}: {source}")]
    Parse {
        path: PathBuf,
        source: serde_json::Error,
    },

    #[error("no access token: set CATALOG_ACCESS_TOKEN or CATALOG_CREDENTIALS")]
    MissingAccessToken,

    #[error("unknown image mode '{0}', expected 'link' or 'inline'")]
    InvalidImageMode(String),
}
