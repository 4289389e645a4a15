//! HTTP page source: feeds the incremental list from a running server.

use async_trait::async_trait;
use folio_api_types::BlogsPage;
use reqwest::{Client, StatusCode, Url};
use thiserror::Error;

use crate::application::listing::PageSource;

pub const BLOGS_PATH: &str = "/api/blogs";

#[derive(Debug, Error)]
pub enum ClientError {
    #[error("invalid URL: {0}")]
    Url(#[from] url::ParseError),
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("server responded with {status}: {body}")]
    Status { status: StatusCode, body: String },
    #[error("failed to parse response body: {0}")]
    Decode(#[from] serde_json::Error),
}

#[derive(Clone, Debug)]
pub struct HttpPageSource {
    client: Client,
    endpoint: Url,
}

impl HttpPageSource {
    pub fn new(site: &str) -> Result<Self, ClientError> {
        let endpoint = Url::parse(site)?.join(BLOGS_PATH)?;
        let client = Client::builder().user_agent(Self::user_agent()).build()?;
        Ok(Self { client, endpoint })
    }

    pub fn user_agent() -> &'static str {
        concat!("folio/", env!("CARGO_PKG_VERSION"))
    }

    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }

    fn page_url(&self, cursor: u64, limit: u32) -> Url {
        let mut url = self.endpoint.clone();
        url.query_pairs_mut()
            .clear()
            .append_pair("cursor", &cursor.to_string())
            .append_pair("limit", &limit.to_string());
        url
    }
}

#[async_trait]
impl PageSource for HttpPageSource {
    type Error = ClientError;

    async fn fetch(&self, cursor: u64, limit: u32) -> Result<BlogsPage, ClientError> {
        let response = self.client.get(self.page_url(cursor, limit)).send().await?;
        let status = response.status();
        let bytes = response.bytes().await?;
        if !status.is_success() {
            return Err(ClientError::Status {
                status,
                body: String::from_utf8_lossy(&bytes).into_owned(),
            });
        }
        Ok(serde_json::from_slice(&bytes)?)
    }
}
