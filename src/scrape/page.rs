//! The watched Kaktus promo page.

use std::time::Duration;

use async_trait::async_trait;
use log::debug;
use wreq::Client;
use wreq::header::HeaderMap;
use wreq::header::HeaderValue;
use wreq::header::USER_AGENT;

use super::PageSource;
use super::error::ScrapeError;

pub struct KaktusPage {
    url: String,
    client: Client,
}

impl KaktusPage {
    pub fn new(url: &str, timeout: Duration) -> anyhow::Result<Self> {
        // The page serves a cookie wall to clients without a browser UA
        let mut headers = HeaderMap::new();
        headers.insert(
            USER_AGENT,
            HeaderValue::from_static(
                "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36",
            ),
        );
        let client = Client::builder()
            .default_headers(headers)
            .timeout(timeout)
            .build()?;

        Ok(Self {
            url: url.to_string(),
            client,
        })
    }
}

#[async_trait]
impl PageSource for KaktusPage {
    async fn fetch(&self) -> Result<String, ScrapeError> {
        let response = self.client.get(&self.url).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(ScrapeError::BadStatus {
                status: status.as_u16(),
            });
        }
        let body = response.text().await?;
        debug!("Fetched {} ({} bytes).", self.url, body.len());
        Ok(body)
    }
}
