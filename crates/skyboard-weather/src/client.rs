//! Open-Meteo current conditions client.

use async_trait::async_trait;
use reqwest::Client;
use serde_json::Value;
use tracing::instrument;

use crate::types::{City, WeatherError, WeatherSample};

const USER_AGENT: &str = "Skyboard/0.1.0";

/// Anything that can produce the current weather for a city.
///
/// The dashboard only talks to this trait so it can be driven by a scripted
/// source in tests.
#[async_trait]
pub trait WeatherSource: Send + Sync {
    async fn fetch_current(&self, city: &City) -> Result<WeatherSample, WeatherError>;
}

#[derive(Debug, Clone)]
pub struct WeatherClient {
    client: Client,
    api_url: String,
}

impl WeatherClient {
    /// Client for any Open-Meteo compatible forecast endpoint.
    ///
    /// No timeout is set; the transport default applies.
    pub fn with_api_url(api_url: &str) -> Result<Self, WeatherError> {
        let client = Client::builder().user_agent(USER_AGENT).build()?;

        Ok(Self {
            client,
            api_url: api_url.to_string(),
        })
    }

    /// Fetch current temperature and observation time for `city`.
    #[instrument(skip(self, city), fields(city = %city.id), level = "debug")]
    pub async fn fetch_current(&self, city: &City) -> Result<WeatherSample, WeatherError> {
        let response = self
            .client
            .get(&self.api_url)
            .query(&[
                ("latitude", city.latitude.to_string()),
                ("longitude", city.longitude.to_string()),
                ("current_weather", "true".to_string()),
            ])
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(WeatherError::RequestFailed {
                status: status.as_u16(),
            });
        }

        let body = response.bytes().await?;
        let sample = parse_current_weather(&body)?;

        tracing::debug!(
            "Current weather for {}: {} at {}",
            city.id,
            sample.temperature,
            sample.observed_at
        );
        Ok(sample)
    }
}

#[async_trait]
impl WeatherSource for WeatherClient {
    async fn fetch_current(&self, city: &City) -> Result<WeatherSample, WeatherError> {
        WeatherClient::fetch_current(self, city).await
    }
}

/// Pull `current_weather.temperature` and `current_weather.time` out of a
/// forecast response body.
pub fn parse_current_weather(body: &[u8]) -> Result<WeatherSample, WeatherError> {
    let data: Value = serde_json::from_slice(body)
        .map_err(|e| WeatherError::IncompleteData(format!("response is not JSON: {}", e)))?;

    let current = data
        .get("current_weather")
        .filter(|v| v.is_object())
        .ok_or_else(|| WeatherError::IncompleteData("current_weather missing".into()))?;

    let temperature = current
        .get("temperature")
        .and_then(Value::as_f64)
        .ok_or_else(|| WeatherError::IncompleteData("temperature not found in response".into()))?;

    let observed_at = current
        .get("time")
        .and_then(Value::as_str)
        .filter(|t| !t.is_empty())
        .ok_or_else(|| WeatherError::IncompleteData("observation time missing".into()))?;

    Ok(WeatherSample {
        temperature,
        observed_at: observed_at.to_string(),
    })
}
