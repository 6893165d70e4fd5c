use std::io::{self, BufRead, Write};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use skyboard_core::{CityEntry, Config};
use skyboard_ui::{DashboardAction, DashboardController, TextView};
use skyboard_weather::{City, CityCatalog, WeatherClient};

const STARTUP_WAIT: Duration = Duration::from_secs(10);

const HELP: &str = "\
Commands:
  add <id>      show a city
  remove <id>   hide a city
  list          list cities that can be added
  show          redraw the dashboard
  wait          wait for outstanding requests
  help          this text
  quit          exit";

fn main() -> Result<()> {
    let config_path = std::env::args().nth(1).map(PathBuf::from);
    let config = match config_path.as_deref() {
        Some(path) => Config::load_from(path)?,
        None => Config::load()?,
    };

    skyboard_core::init(&config.logging.filter)?;
    let (config, _validation) = config.validated()?;

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .thread_name("skyboard-tokio")
        .build()
        .context("Failed to create tokio runtime")?;

    let catalog = CityCatalog::builtin()
        .with_extra_cities(config.dashboard.extra_cities.iter().map(city_from_entry));
    let client = WeatherClient::with_api_url(&config.weather.api_url)
        .context("Failed to create weather client")?;

    let mut dashboard = DashboardController::new(
        catalog,
        Arc::new(client),
        runtime.handle().clone(),
        TextView::new(),
    );
    dashboard.initialize(&config.dashboard.default_cities);

    tracing::info!("Skyboard started");

    print!("{}", dashboard.view().render());
    dashboard.settle(STARTUP_WAIT);
    print!("{}", dashboard.view().render());
    println!("Type 'help' for commands.");

    let stdin = io::stdin();
    prompt()?;
    for line in stdin.lock().lines() {
        let line = line.context("Failed to read from stdin")?;
        dashboard.poll_results();

        let mut parts = line.split_whitespace();
        match (parts.next(), parts.next()) {
            (Some("add"), Some(id)) => {
                if !dashboard.dispatch(DashboardAction::Add(id.to_string())) {
                    println!("Cannot add '{}': unknown or already shown", id);
                }
            }
            (Some("remove"), Some(id)) => {
                if !dashboard.dispatch(DashboardAction::Remove(id.to_string())) {
                    println!("'{}' is not shown", id);
                }
            }
            (Some("list"), _) => {
                let candidates = dashboard.candidates();
                if !candidates.add_enabled() {
                    println!("Every city is already shown");
                }
                for city in &candidates.entries {
                    println!("  {:<14} {}", city.id, city.display_label);
                }
            }
            (Some("wait"), _) => {
                if !dashboard.settle(STARTUP_WAIT) {
                    println!("Still waiting on {} request(s)", dashboard.pending_fetches());
                }
                print!("{}", dashboard.view().render());
            }
            (Some("show"), _) => print!("{}", dashboard.view().render()),
            (Some("help"), _) => println!("{}", HELP),
            (Some("quit" | "exit"), _) => break,
            (None, _) => {}
            (Some(other), _) => println!("Unknown command '{}'. Type 'help'.", other),
        }
        prompt()?;
    }

    tracing::info!("Skyboard shutting down");
    runtime.shutdown_timeout(Duration::from_secs(1));
    Ok(())
}

fn prompt() -> Result<()> {
    print!("> ");
    io::stdout().flush().context("Failed to flush stdout")?;
    Ok(())
}

fn city_from_entry(entry: &CityEntry) -> City {
    City::new(
        entry.id.clone(),
        entry.name.clone(),
        entry
            .display_label
            .clone()
            .unwrap_or_else(|| entry.name.clone()),
        entry.latitude,
        entry.longitude,
    )
}
