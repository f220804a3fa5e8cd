use thiserror::Error;

#[derive(Debug, Error)]
pub enum ComposeError {
    #[error("malformed line {line} on page {page}: {reason}")]
    MalformedLine {
        page: u16,
        line: u16,
        reason: String,
    },

    #[error("page template is corrupted: missing {missing}")]
    TemplateCorrupted { missing: String },

    #[error("unknown line kind `{kind}` at page {page} line {line}")]
    UnknownLineKind { page: u16, line: u16, kind: String },

    #[error("lookup returned no rows: {what}")]
    LookupMiss { what: String },

    #[error("invalid stored record: {detail}")]
    InvalidRecord { detail: String },

    #[error("database error")]
    Store(#[from] rusqlite::Error),
}

impl ComposeError {
    /// Template damage affects every page, so the whole run stops.
    pub fn is_run_fatal(&self) -> bool {
        matches!(self, Self::TemplateCorrupted { .. })
    }

    pub fn line_number(&self) -> Option<u16> {
        match self {
            Self::MalformedLine { line, .. } | Self::UnknownLineKind { line, .. } => Some(*line),
            _ => None,
        }
    }
}

pub type ComposeResult<T> = Result<T, ComposeError>;
