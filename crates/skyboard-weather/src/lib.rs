//! Weather data for Skyboard
//!
//! City catalog plus an Open-Meteo client for current conditions.

pub mod catalog;
pub mod client;
pub mod types;

pub use catalog::CityCatalog;
pub use client::{parse_current_weather, WeatherClient, WeatherSource};
pub use types::*;
