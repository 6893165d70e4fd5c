//! Weather backend: async per-city fetching.
//! All network work runs on the tokio runtime; results come back via mpsc.

use std::sync::Arc;

use skyboard_weather::{City, WeatherError, WeatherSample, WeatherSource};

/// Messages sent from fetch tasks back to the dashboard thread
#[derive(Debug)]
pub enum WeatherServiceMessage {
    /// Result of fetching one city's current weather
    FetchDone {
        city_id: String,
        generation: u64,
        result: Result<WeatherSample, WeatherError>,
    },
}

/// Spawn an independent fetch for `city`.
/// Sends `FetchDone` tagged with `generation` on the channel when complete.
pub fn request_fetch(
    tx: &std::sync::mpsc::Sender<WeatherServiceMessage>,
    runtime: &tokio::runtime::Handle,
    source: Arc<dyn WeatherSource>,
    city: City,
    generation: u64,
) {
    let tx = tx.clone();

    tracing::debug!("Dispatching weather fetch for {} (gen {})", city.id, generation);

    runtime.spawn(async move {
        let result = source.fetch_current(&city).await;
        let msg = WeatherServiceMessage::FetchDone {
            city_id: city.id,
            generation,
            result,
        };
        if tx.send(msg).is_err() {
            tracing::debug!("Dashboard gone before weather fetch finished");
        }
    });
}
