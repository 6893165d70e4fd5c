use serde::{Deserialize, Serialize};

/// A named geographic point the dashboard can show weather for.
///
/// Identity is the `id`; two cities with the same id are the same city.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct City {
    pub id: String,
    pub name: String,
    /// Label for selection lists, e.g. "London, United Kingdom"
    pub display_label: String,
    pub latitude: f64,
    pub longitude: f64,
}

impl City {
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        display_label: impl Into<String>,
        latitude: f64,
        longitude: f64,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            display_label: display_label.into(),
            latitude,
            longitude,
        }
    }
}

impl PartialEq for City {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for City {}

/// One current-conditions observation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeatherSample {
    /// Degrees Celsius
    pub temperature: f64,
    /// Observation time exactly as the API reported it
    pub observed_at: String,
}

/// Weather client errors
#[derive(Debug, thiserror::Error)]
pub enum WeatherError {
    #[error("Request failed with status {status}")]
    RequestFailed { status: u16 },
    #[error("Incomplete weather data: {0}")]
    IncompleteData(String),
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),
}
