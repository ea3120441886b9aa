use async_trait::async_trait;

pub mod error;
pub mod extract;
pub mod page;

pub use error::ScrapeError;
pub use extract::PageAnnouncement;
pub use extract::extract_announcement;
pub use page::KaktusPage;

/// Fetches the raw content of the watched page.
#[async_trait]
pub trait PageSource: Send + Sync {
    async fn fetch(&self) -> Result<String, ScrapeError>;
}
