use async_trait::async_trait;
use chrono::DateTime;
use rust_decimal::Decimal;
use serde::Deserialize;
use std::collections::HashMap;
use std::str::FromStr;
use tracing::{debug, instrument, warn};

use crate::core::config::ProviderConfig;
use crate::core::currency::{CurrencyCode, RateProvider, RateTable};
use crate::core::error::ConversionError;

const USER_AGENT: &str = concat!("fxconv/", env!("CARGO_PKG_VERSION"));

/// Client for the ExchangeRate-API `latest` endpoint.
pub struct ExchangeRateApiProvider {
    client: reqwest::Client,
    base_url: String,
    api_key: Option<String>,
}

impl ExchangeRateApiProvider {
    pub fn new(client: reqwest::Client, base_url: &str, api_key: Option<String>) -> Self {
        ExchangeRateApiProvider {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key,
        }
    }

    pub fn from_config(config: &ProviderConfig) -> anyhow::Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(config.timeout())
            .build()?;
        Ok(Self::new(
            client,
            &config.base_url,
            config.api_key.clone(),
        ))
    }

    fn latest_url(&self, base: CurrencyCode) -> Result<reqwest::Url, ConversionError> {
        let raw = format!("{}/v4/latest/{}", self.base_url, base);
        let url = match &self.api_key {
            Some(key) => reqwest::Url::parse_with_params(&raw, &[("apiKey", key)]),
            None => reqwest::Url::parse(&raw),
        };
        url.map_err(|e| ConversionError::NetworkFailure(format!("Invalid rate service URL {raw}: {e}")))
    }
}

#[derive(Debug, Deserialize)]
struct LatestRatesResponse {
    base: Option<String>,
    date: Option<String>,
    time_last_updated: Option<i64>,
    rates: HashMap<String, serde_json::Value>,
}

impl LatestRatesResponse {
    fn as_of(&self) -> Option<String> {
        self.date.clone().or_else(|| {
            self.time_last_updated
                .and_then(|ts| DateTime::from_timestamp(ts, 0))
                .map(|dt| dt.format("%Y-%m-%d").to_string())
        })
    }

    fn into_rate_table(self, requested: CurrencyCode) -> Result<RateTable, ConversionError> {
        if let Some(base) = &self.base {
            if base.parse::<CurrencyCode>().ok() != Some(requested) {
                return Err(ConversionError::ProviderError(format!(
                    "requested rates for {requested} but received base {base}"
                )));
            }
        }

        let mut table = RateTable::new(requested).with_as_of(self.as_of());
        for (code, value) in &self.rates {
            let Ok(code) = code.parse::<CurrencyCode>() else {
                continue;
            };
            let rate = parse_rate(value).ok_or_else(|| {
                ConversionError::ProviderError(format!("invalid rate {value} for {code}"))
            })?;
            table.insert(code, rate)?;
        }

        if table.is_empty() {
            warn!(base = %requested, "Response has no rates for supported currencies");
        }
        Ok(table)
    }
}

/// Reads a JSON number as an exact decimal from its textual form.
fn parse_rate(value: &serde_json::Value) -> Option<Decimal> {
    let serde_json::Value::Number(number) = value else {
        return None;
    };
    let text = number.to_string();
    Decimal::from_str(&text)
        .or_else(|_| Decimal::from_scientific(&text))
        .ok()
}

#[async_trait]
impl RateProvider for ExchangeRateApiProvider {
    #[instrument(
        name = "ExchangeRateFetch",
        skip(self),
        fields(base = %base)
    )]
    async fn fetch_rates(&self, base: CurrencyCode) -> Result<RateTable, ConversionError> {
        let url = self.latest_url(base)?;
        debug!(path = url.path(), "Requesting exchange rates");

        let response = self.client.get(url).send().await.map_err(|e| {
            ConversionError::NetworkFailure(format!("Request error: {e} for base currency: {base}"))
        })?;

        if !response.status().is_success() {
            return Err(ConversionError::ProviderError(format!(
                "HTTP error: {} for base currency: {}",
                response.status(),
                base
            )));
        }

        let text = response.text().await.map_err(|e| {
            ConversionError::NetworkFailure(format!("Failed to read response for {base}: {e}"))
        })?;

        let data: LatestRatesResponse = serde_json::from_str(&text).map_err(|e| {
            ConversionError::ProviderError(format!("Failed to parse JSON response for {base}: {e}"))
        })?;

        let table = data.into_rate_table(base)?;
        debug!(rates = table.len(), as_of = ?table.as_of, "Received exchange rates");
        Ok(table)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::error::ErrorKind;
    use std::time::Duration;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    const USD_RESPONSE: &str = r#"{
        "provider": "https://www.exchangerate-api.com",
        "base": "USD",
        "date": "2024-05-01",
        "time_last_updated": 1714521601,
        "rates": {
            "USD": 1,
            "EUR": 0.92,
            "GBP": 0.79,
            "CHF": 0.88,
            "PLN": 4.02,
            "JPY": 157.3
        }
    }"#;

    pub async fn create_mock_server(base: &str, template: ResponseTemplate) -> MockServer {
        let mock_server = MockServer::start().await;
        let request_path = format!("/v4/latest/{base}");

        Mock::given(method("GET"))
            .and(path(request_path))
            .respond_with(template)
            .mount(&mock_server)
            .await;

        mock_server
    }

    fn provider_for(server: &MockServer) -> ExchangeRateApiProvider {
        ExchangeRateApiProvider::new(reqwest::Client::new(), &server.uri(), None)
    }

    fn dec(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    #[tokio::test]
    async fn test_successful_rates_fetch() {
        let mock_server = create_mock_server(
            "USD",
            ResponseTemplate::new(200).set_body_string(USD_RESPONSE),
        )
        .await;

        let table = provider_for(&mock_server)
            .fetch_rates(CurrencyCode::Usd)
            .await
            .unwrap();

        assert_eq!(table.base, CurrencyCode::Usd);
        assert_eq!(table.as_of.as_deref(), Some("2024-05-01"));
        assert_eq!(table.len(), 5);
        assert_eq!(table.rate(CurrencyCode::Eur), Some(dec("0.92")));
        assert_eq!(table.rate(CurrencyCode::Pln), Some(dec("4.02")));
        assert_eq!(table.rate(CurrencyCode::Usd), Some(Decimal::ONE));
    }

    #[tokio::test]
    async fn test_api_key_is_sent_as_query_parameter() {
        let mock_server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/v4/latest/EUR"))
            .and(query_param("apiKey", "secret"))
            .respond_with(ResponseTemplate::new(200).set_body_string(
                r#"{"base": "EUR", "rates": {"USD": 1.087}}"#,
            ))
            .expect(1)
            .mount(&mock_server)
            .await;

        let provider = ExchangeRateApiProvider::new(
            reqwest::Client::new(),
            &format!("{}/", mock_server.uri()),
            Some("secret".to_string()),
        );
        let table = provider.fetch_rates(CurrencyCode::Eur).await.unwrap();
        assert_eq!(table.rate(CurrencyCode::Usd), Some(dec("1.087")));
        assert!(table.as_of.is_none());
    }

    #[tokio::test]
    async fn test_as_of_falls_back_to_last_updated_timestamp() {
        let body = r#"{"time_last_updated": 1714521601, "rates": {"EUR": 0.92}}"#;
        let mock_server =
            create_mock_server("USD", ResponseTemplate::new(200).set_body_string(body)).await;

        let table = provider_for(&mock_server)
            .fetch_rates(CurrencyCode::Usd)
            .await
            .unwrap();
        assert_eq!(table.as_of.as_deref(), Some("2024-05-01"));
    }

    #[tokio::test]
    async fn test_api_error_response() {
        let mock_server = create_mock_server("USD", ResponseTemplate::new(500)).await;

        let err = provider_for(&mock_server)
            .fetch_rates(CurrencyCode::Usd)
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::ProviderError);
        assert_eq!(
            err.to_string(),
            "Provider error: HTTP error: 500 Internal Server Error for base currency: USD"
        );
    }

    #[tokio::test]
    async fn test_malformed_json_response() {
        let mock_server = create_mock_server(
            "USD",
            ResponseTemplate::new(200).set_body_string("<html>not json</html>"),
        )
        .await;

        let err = provider_for(&mock_server)
            .fetch_rates(CurrencyCode::Usd)
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::ProviderError);
        assert!(
            err.to_string()
                .contains("Failed to parse JSON response for USD")
        );
    }

    #[tokio::test]
    async fn test_missing_rates_key() {
        let body = r#"{"base": "USD", "conversion_rates": {"EUR": 0.92}}"#;
        let mock_server =
            create_mock_server("USD", ResponseTemplate::new(200).set_body_string(body)).await;

        let err = provider_for(&mock_server)
            .fetch_rates(CurrencyCode::Usd)
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::ProviderError);
    }

    #[tokio::test]
    async fn test_invalid_rate_values() {
        for rates in [r#"{"EUR": "0.92"}"#, r#"{"EUR": 0}"#, r#"{"EUR": -1.5}"#] {
            let body = format!(r#"{{"base": "USD", "rates": {rates}}}"#);
            let mock_server =
                create_mock_server("USD", ResponseTemplate::new(200).set_body_string(body)).await;

            let err = provider_for(&mock_server)
                .fetch_rates(CurrencyCode::Usd)
                .await
                .unwrap_err();
            assert_eq!(err.kind(), ErrorKind::ProviderError, "rates {rates}");
        }
    }

    #[tokio::test]
    async fn test_unsupported_codes_are_ignored() {
        let body = r#"{"rates": {"JPY": "n/a", "EUR": 0.92}}"#;
        let mock_server =
            create_mock_server("USD", ResponseTemplate::new(200).set_body_string(body)).await;

        let table = provider_for(&mock_server)
            .fetch_rates(CurrencyCode::Usd)
            .await
            .unwrap();
        assert_eq!(table.len(), 1);
    }

    #[tokio::test]
    async fn test_base_mismatch() {
        let body = r#"{"base": "EUR", "rates": {"USD": 1.08}}"#;
        let mock_server =
            create_mock_server("USD", ResponseTemplate::new(200).set_body_string(body)).await;

        let err = provider_for(&mock_server)
            .fetch_rates(CurrencyCode::Usd)
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::ProviderError);
        assert!(err.to_string().contains("received base EUR"));
    }

    #[tokio::test]
    async fn test_connection_refused() {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let provider = ExchangeRateApiProvider::new(
            reqwest::Client::new(),
            &format!("http://{addr}"),
            None,
        );
        let err = provider.fetch_rates(CurrencyCode::Usd).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NetworkFailure);
    }

    #[tokio::test]
    async fn test_timeout_is_network_failure() {
        let mock_server = create_mock_server(
            "USD",
            ResponseTemplate::new(200)
                .set_body_string(USD_RESPONSE)
                .set_delay(Duration::from_secs(2)),
        )
        .await;

        let client = reqwest::Client::builder()
            .timeout(Duration::from_millis(100))
            .build()
            .unwrap();
        let provider = ExchangeRateApiProvider::new(client, &mock_server.uri(), None);

        let err = provider.fetch_rates(CurrencyCode::Usd).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NetworkFailure);
    }

    #[test]
    fn test_parse_rate() {
        let value: serde_json::Value = serde_json::from_str("0.92").unwrap();
        assert_eq!(parse_rate(&value), Some(dec("0.92")));
        let value: serde_json::Value = serde_json::from_str("1e-7").unwrap();
        assert_eq!(parse_rate(&value), Some(dec("0.0000001")));
        assert_eq!(parse_rate(&serde_json::Value::Null), None);
    }
}
