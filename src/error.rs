//! Error types for the board.

use thiserror::Error;

/// Everything that can abort a board operation. Input problems and
/// transport problems are both surfaced to the user as a transient notice;
/// neither is retried.
#[derive(Debug, Error)]
pub enum BoardError {
    /// Generic input validation failure
    #[error("{0}")]
    Validation(String),

    /// A single-script upload that is not a `.py` file
    #[error("only Python files (.py) can be loaded, got {0}")]
    UnsupportedFile(String),

    /// File exceeds the upload limit
    #[error("{name} is larger than the {limit_mib} MiB limit")]
    FileTooLarge { name: String, limit_mib: u64 },

    /// Multi-select above the per-upload cap
    #[error("at most {limit} files can be loaded at once ({count} selected)")]
    TooManyFiles { count: usize, limit: usize },

    /// An operation that needs the main script ran before one was loaded
    #[error("load a main script first")]
    NoMainScript,

    /// The analyzer could not be reached or answered with a failure status
    #[error("analyzer request failed: {0}")]
    Transport(#[from] reqwest::Error),

    /// The analyzer answered but reported an error
    #[error("analyzer rejected the request: {0}")]
    Rejected(String),

    /// Browser API failure (file reads, DOM access)
    #[error("browser error: {0}")]
    Browser(String),
}

impl BoardError {
    /// Whether the failure came from user input rather than the environment.
    pub fn is_input_error(&self) -> bool {
        matches!(
            self,
            Self::Validation(_)
                | Self::UnsupportedFile(_)
                | Self::FileTooLarge { .. }
                | Self::TooManyFiles { .. }
                | Self::NoMainScript
        )
    }
}

impl From<wasm_bindgen::JsValue> for BoardError {
    fn from(value: wasm_bindgen::JsValue) -> Self {
        Self::Browser(value.as_string().unwrap_or_else(|| format!("{:?}", value)))
    }
}

pub type Result<T> = std::result::Result<T, BoardError>;
