use thiserror::Error;

pub type Result<T> = core::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    #[error("Request to {url} failed: {source}")]
    Transport {
        url: String,
        #[source]
        source: reqwest::Error,
    },
    #[error("Request to {url} returned status {status}")]
    Status { url: String, status: u16 },

    #[error("Couldn't parse {surface} page: {reason}")]
    Parse {
        surface: &'static str,
        reason: String,
    },

    #[error("Invalid harvest configuration: {0}")]
    Config(String),

    #[error("Io Error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Csv Error: {0}")]
    Csv(#[from] csv::Error),

    #[error("Tokio Join Error, couldn't await a task! {0}")]
    RuntimeJoin(#[from] tokio::task::JoinError),
}

impl Error {
    pub(crate) fn parse(surface: &'static str, reason: impl Into<String>) -> Self {
        Error::Parse {
            surface,
            reason: reason.into(),
        }
    }

    pub(crate) fn missing(surface: &'static str, field: &str, entry: usize) -> Self {
        Error::parse(
            surface,
            format!("entry {entry} is missing required field `{field}`"),
        )
    }

    /// Errors that only cost the page they happened on. Everything else aborts the run.
    pub fn is_page_local(&self) -> bool {
        matches!(
            self,
            Error::Transport { .. } | Error::Status { .. } | Error::Parse { .. }
        )
    }
}
