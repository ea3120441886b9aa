#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum ScrapeError {
    #[error("HTTP request failed: {0}")]
    RequestFailed(#[source] Box<dyn std::error::Error + Send + Sync>),

    #[error("Page returned status {status}")]
    BadStatus { status: u16 },
}

impl From<wreq::Error> for ScrapeError {
    fn from(e: wreq::Error) -> Self {
        ScrapeError::RequestFailed(Box::new(e))
    }
}
