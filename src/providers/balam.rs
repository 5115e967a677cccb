use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::{Client, Url, header};
use serde::Deserialize;
use tracing::{debug, instrument};

use crate::core::error::FetchError;
use crate::core::quote::{Quote, QuoteProvider, QuoteRequest};

// Quote provider backed by the Balam quotes API
pub struct BalamQuoteProvider {
    base_url: String,
    token: String,
    client: Client,
}

impl BalamQuoteProvider {
    pub fn new(base_url: &str, token: &str) -> Result<Self> {
        let client = Client::builder()
            .user_agent("balam/1.0")
            .build()
            .context("Failed to build HTTP client")?;
        Ok(BalamQuoteProvider {
            base_url: base_url.trim_end_matches('/').to_string(),
            token: token.to_string(),
            client,
        })
    }

    fn quote_url(&self, request: &QuoteRequest) -> Result<Url, FetchError> {
        Url::parse_with_params(
            &format!("{}/quotes", self.base_url),
            &[
                ("base_currency", request.base_currency.to_string()),
                ("quote_currency", request.quote_currency.to_string()),
                ("amount", request.amount.to_string()),
            ],
        )
        .map_err(|e| FetchError::Request(format!("invalid API URL {}: {e}", self.base_url)))
    }
}

#[derive(Deserialize, Debug)]
struct QuoteResponse {
    data: Quote,
}

#[async_trait]
impl QuoteProvider for BalamQuoteProvider {
    #[instrument(
        name = "QuoteFetch",
        skip(self),
        fields(
            base = %request.base_currency,
            quote = %request.quote_currency,
            amount = %request.amount
        )
    )]
    async fn fetch_quote(&self, request: &QuoteRequest) -> Result<Quote, FetchError> {
        let url = self.quote_url(request)?;
        debug!("Requesting quote from {}", url);

        let response = self
            .client
            .get(url)
            .header(header::CONTENT_TYPE, "application/json")
            .bearer_auth(&self.token)
            .send()
            .await
            .map_err(|e| FetchError::Request(e.to_string()))?;

        debug!(status = %response.status(), "Received quote response");

        if !response.status().is_success() {
            return Err(FetchError::Status(response.status().as_u16()));
        }

        let text = response
            .text()
            .await
            .map_err(|e| FetchError::Request(e.to_string()))?;
        let body: QuoteResponse =
            serde_json::from_str(&text).map_err(|e| FetchError::Decode(e.to_string()))?;

        Ok(body.data)
    }
}
