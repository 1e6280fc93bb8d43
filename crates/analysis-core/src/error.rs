use thiserror::Error;

/// Failure while looking up a market snapshot from the data provider.
#[derive(Error, Debug)]
pub enum FetchError {
    #[error("HTTP error: {0}")]
    Http(String),

    #[error("Provider returned HTTP {status}: {body}")]
    Status { status: u16, body: String },

    #[error("Authentication error: {0}")]
    Auth(String),

    #[error("Symbol not found: {0}")]
    SymbolNotFound(String),

    #[error("Parse error: {0}")]
    Parse(String),
}
