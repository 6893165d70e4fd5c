use skyboard_core::{AppError, ReqwestErrorExt, WeatherError};
use skyboard_weather::WeatherError as ClientWeatherError;

pub fn weather_app_error(e: ClientWeatherError) -> AppError {
    match e {
        ClientWeatherError::RequestFailed { status } => {
            AppError::Weather(WeatherError::RequestFailed(status))
        }
        ClientWeatherError::IncompleteData(s) => AppError::Weather(WeatherError::IncompleteData(s)),
        ClientWeatherError::Network(e) => AppError::Network(e.into_network_error()),
    }
}
