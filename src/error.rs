use thiserror::Error;

/// Failure to retrieve a page.
#[derive(Debug, Error)]
pub enum FetchError {
    /// Non-success status outside the retryable set.
    #[error("GET {url} returned {status}")]
    Status {
        url: String,
        status: reqwest::StatusCode,
    },

    /// Retryable status still returned after the retry budget was spent.
    #[error("GET {url} still returned {status} after {retries} retries")]
    RetriesExhausted {
        url: String,
        status: reqwest::StatusCode,
        retries: u32,
    },

    #[error("GET {url}")]
    Request {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("read body of {url}")]
    Body {
        url: String,
        #[source]
        source: reqwest::Error,
    },
}

/// Failure to turn a fetched document into records.
#[derive(Debug, Error)]
pub enum ExtractError {
    /// Markup the extractor depends on is absent.
    #[error("missing {what} in {url}")]
    MissingStructure { what: &'static str, url: String },

    /// A value that must be numeric (or `"<landed> of <attempted>"`) is not.
    #[error("cannot coerce {field} value {value:?}")]
    TypeCoercion { field: String, value: String },

    #[error("invalid selector {selector:?}: {message}")]
    InvalidSelector { selector: &'static str, message: String },
}

impl ExtractError {
    pub fn missing(what: &'static str, url: &str) -> Self {
        Self::MissingStructure {
            what,
            url: url.to_owned(),
        }
    }

    pub fn coercion(field: impl Into<String>, value: impl Into<String>) -> Self {
        Self::TypeCoercion {
            field: field.into(),
            value: value.into(),
        }
    }
}
