use anyhow::{Result, anyhow};
use async_trait::async_trait;
use serde::Deserialize;
use std::collections::HashMap;
use std::time::Duration;
use tracing::{debug, instrument};

use crate::core::rates::{RateProvider, RateTable};

/// Client for `GET {base_url}/latest/{CODE}` style exchange rate services.
pub struct ExchangeRateApiProvider {
    base_url: String,
    client: reqwest::Client,
}

impl ExchangeRateApiProvider {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent("fxdash/0.1")
            .timeout(timeout)
            .build()?;
        Ok(ExchangeRateApiProvider {
            base_url: base_url.trim_end_matches('/').to_string(),
            client,
        })
    }
}

#[derive(Debug, Deserialize)]
struct LatestRatesResponse {
    rates: HashMap<String, f64>,
}

#[async_trait]
impl RateProvider for ExchangeRateApiProvider {
    #[instrument(name = "LatestRatesFetch", skip(self), fields(base = %base))]
    async fn fetch_rates(&self, base: &str) -> Result<RateTable> {
        let url = format!("{}/latest/{}", self.base_url, base);
        debug!("Requesting rate table from {}", url);

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| anyhow!("Request error: {} for base currency: {}", e, base))?;

        if !response.status().is_success() {
            return Err(anyhow!(
                "HTTP error: {} for base currency: {}",
                response.status(),
                base
            ));
        }

        let text = response.text().await?;
        let data: LatestRatesResponse = serde_json::from_str(&text)
            .map_err(|e| anyhow!("Failed to parse JSON response for {}: {}", base, e))?;

        debug!(count = data.rates.len(), "Received rate table");
        Ok(RateTable::new(base, data.rates))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    const TIMEOUT: Duration = Duration::from_secs(5);

    async fn create_mock_server(base: &str, response: ResponseTemplate) -> MockServer {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path(format!("/latest/{base}")))
            .respond_with(response)
            .mount(&mock_server)
            .await;

        mock_server
    }

    #[tokio::test]
    async fn test_successful_rates_fetch() {
        let mock_response = r#"{
            "base": "USD",
            "date": "2026-10-18",
            "rates": { "USD": 1, "EUR": 0.92, "HUF": 361.4 }
        }"#;
        let mock_server = create_mock_server(
            "USD",
            ResponseTemplate::new(200).set_body_string(mock_response),
        )
        .await;

        let provider = ExchangeRateApiProvider::new(&mock_server.uri(), TIMEOUT).unwrap();
        let table = provider.fetch_rates("USD").await.unwrap();
        assert_eq!(table.base, "USD");
        assert_eq!(table.rate("EUR"), Some(0.92));
        assert_eq!(table.rate("HUF"), Some(361.4));
        assert_eq!(table.rate("USD"), Some(1.0));
    }

    #[tokio::test]
    async fn test_trailing_slash_in_base_url() {
        let mock_server = create_mock_server(
            "EUR",
            ResponseTemplate::new(200).set_body_string(r#"{"rates": {"HUF": 395.1}}"#),
        )
        .await;

        let provider = ExchangeRateApiProvider::new(&format!("{}/", mock_server.uri()), TIMEOUT).unwrap();
        let table = provider.fetch_rates("EUR").await.unwrap();
        assert_eq!(table.rate("HUF"), Some(395.1));
    }

    #[tokio::test]
    async fn test_api_error_response() {
        let mock_server = create_mock_server("USD", ResponseTemplate::new(500)).await;

        let provider = ExchangeRateApiProvider::new(&mock_server.uri(), TIMEOUT).unwrap();
        let result = provider.fetch_rates("USD").await;
        assert_eq!(
            result.unwrap_err().to_string(),
            "HTTP error: 500 Internal Server Error for base currency: USD"
        );
    }

    #[tokio::test]
    async fn test_malformed_response() {
        let mock_server = create_mock_server(
            "USD",
            ResponseTemplate::new(200).set_body_string(r#"{"result": "error"}"#),
        )
        .await;

        let provider = ExchangeRateApiProvider::new(&mock_server.uri(), TIMEOUT).unwrap();
        let result = provider.fetch_rates("USD").await;
        assert!(
            result
                .unwrap_err()
                .to_string()
                .contains("Failed to parse JSON response for USD")
        );
    }

    #[tokio::test]
    async fn test_unreachable_server() {
        let provider = ExchangeRateApiProvider::new("http://127.0.0.1:9", TIMEOUT).unwrap();
        let result = provider.fetch_rates("USD").await;
        assert!(result.unwrap_err().to_string().starts_with("Request error:"));
    }

    #[tokio::test]
    async fn test_slow_server_times_out() {
        let mock_server = create_mock_server(
            "USD",
            ResponseTemplate::new(200)
                .set_body_string(r#"{"rates": {"EUR": 0.92}}"#)
                .set_delay(Duration::from_secs(3)),
        )
        .await;

        let provider =
            ExchangeRateApiProvider::new(&mock_server.uri(), Duration::from_millis(200)).unwrap();
        let result = provider.fetch_rates("USD").await;
        let message = result.unwrap_err().to_string();
        assert!(message.starts_with("Request error:"), "{message}");
        assert!(message.ends_with("for base currency: USD"), "{message}");
    }
}
