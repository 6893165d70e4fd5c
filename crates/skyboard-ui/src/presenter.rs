//! Card rendering.
//!
//! Turns a city plus its view state into the text a card shows. Holds no
//! state beyond the `CardHandle` values it hands out.

use chrono::{DateTime, Local, NaiveDateTime, TimeZone, Utc};
use skyboard_weather::{City, WeatherSample};

pub const PLACEHOLDER_TEMPERATURE: &str = "--";
pub const STATUS_LOADING: &str = "Loading...";
pub const STATUS_SUCCESS: &str = "Current temperature";
pub const STATUS_ERROR: &str = "Data unavailable";

/// Open-Meteo sends local-less timestamps like `2024-03-01T10:15` in GMT.
const NAIVE_FORMATS: &[&str] = &["%Y-%m-%dT%H:%M", "%Y-%m-%dT%H:%M:%S"];
const LABEL_FORMAT: &str = "%b %-d, %Y %H:%M";

/// What a card is currently showing.
#[derive(Debug, Clone, PartialEq)]
pub enum CardViewState {
    Loading,
    Success(WeatherSample),
    Error,
}

/// Visual marker on the status line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusClass {
    Loading,
    Neutral,
    Error,
}

/// Actions a view can send back to the dashboard.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DashboardAction {
    Add(String),
    Remove(String),
}

/// One rendered card and its mutable text fields.
#[derive(Debug, Clone, PartialEq)]
pub struct CardHandle {
    city_id: String,
    title: String,
    temperature_text: String,
    status_text: String,
    status_class: StatusClass,
    updated_text: String,
    error_detail: Option<String>,
    state: CardViewState,
}

impl CardHandle {
    pub fn city_id(&self) -> &str {
        &self.city_id
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn temperature_text(&self) -> &str {
        &self.temperature_text
    }

    pub fn status_text(&self) -> &str {
        &self.status_text
    }

    pub fn status_class(&self) -> StatusClass {
        self.status_class
    }

    pub fn updated_text(&self) -> &str {
        &self.updated_text
    }

    /// Longer explanation of a failure, shown under the status line.
    pub fn error_detail(&self) -> Option<&str> {
        self.error_detail.as_deref()
    }

    pub fn state(&self) -> &CardViewState {
        &self.state
    }

    /// The card's remove affordance, bound to its city.
    pub fn remove_action(&self) -> DashboardAction {
        DashboardAction::Remove(self.city_id.clone())
    }

    pub fn set_temperature_text(&mut self, text: impl Into<String>) {
        self.temperature_text = text.into();
    }

    pub fn set_status(&mut self, text: impl Into<String>, class: StatusClass) {
        self.status_text = text.into();
        self.status_class = class;
    }

    pub fn set_updated_text(&mut self, text: impl Into<String>) {
        self.updated_text = text.into();
    }

    pub fn set_error_detail(&mut self, detail: Option<String>) {
        self.error_detail = detail;
    }

    /// Plain-text block for terminal output.
    pub fn render_text(&self) -> String {
        let marker = match self.status_class {
            StatusClass::Loading => "…",
            StatusClass::Neutral => " ",
            StatusClass::Error => "!",
        };
        let mut out = format!(
            "[{}] {} {:>6}  {}",
            self.city_id, self.title, self.temperature_text, self.status_text
        );
        out.push(' ');
        out.push_str(marker);
        if !self.updated_text.is_empty() {
            out.push_str("\n    ");
            out.push_str(&self.updated_text);
        }
        if let Some(detail) = &self.error_detail {
            out.push_str("\n    ");
            out.push_str(detail);
        }
        out
    }
}

/// Fresh card in the loading state.
pub fn create_card(city: &City) -> CardHandle {
    CardHandle {
        city_id: city.id.clone(),
        title: city.name.clone(),
        temperature_text: PLACEHOLDER_TEMPERATURE.to_string(),
        status_text: STATUS_LOADING.to_string(),
        status_class: StatusClass::Loading,
        updated_text: String::new(),
        error_detail: None,
        state: CardViewState::Loading,
    }
}

pub fn show_success(handle: &mut CardHandle, sample: &WeatherSample) {
    handle.set_temperature_text(format_temperature(sample.temperature));
    handle.set_status(STATUS_SUCCESS, StatusClass::Neutral);
    handle.set_updated_text(format_updated_label(&sample.observed_at));
    handle.set_error_detail(None);
    handle.state = CardViewState::Success(sample.clone());
}

pub fn show_error(handle: &mut CardHandle) {
    handle.set_temperature_text(PLACEHOLDER_TEMPERATURE);
    handle.set_status(STATUS_ERROR, StatusClass::Error);
    handle.set_updated_text("");
    handle.state = CardViewState::Error;
}

/// Render any state from scratch.
pub fn present(city: &City, state: &CardViewState) -> CardHandle {
    let mut handle = create_card(city);
    match state {
        CardViewState::Loading => {}
        CardViewState::Success(sample) => show_success(&mut handle, sample),
        CardViewState::Error => show_error(&mut handle),
    }
    handle
}

/// Whole degrees, half away from zero, never "-0".
pub fn format_temperature(celsius: f64) -> String {
    let rounded = celsius.round() as i64;
    format!("{}°C", rounded)
}

pub fn format_updated_label(iso: &str) -> String {
    if iso.is_empty() {
        return String::new();
    }

    match parse_observed_at(iso) {
        Some(utc) => {
            let local = utc.with_timezone(&Local);
            format!("Updated {}", local.format(LABEL_FORMAT))
        }
        None => format!("Updated {}", iso),
    }
}

fn parse_observed_at(iso: &str) -> Option<DateTime<Utc>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(iso) {
        return Some(dt.with_timezone(&Utc));
    }

    NAIVE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(iso, fmt).ok())
        .map(|naive| Utc.from_utc_datetime(&naive))
}
