//! Dashboard controller: owns the displayed city set and drives every card
//! through `Loading -> Success | Error`.
//!
//! All state lives on the thread that owns the controller. Fetches run as
//! independent tasks on a tokio runtime and report back over an mpsc channel;
//! nothing is applied until the owner calls `poll_results` (or one of the
//! waiting variants).

use std::collections::{HashMap, HashSet};
use std::sync::mpsc::{self, Receiver, RecvTimeoutError, Sender};
use std::sync::Arc;
use std::time::{Duration, Instant};

use skyboard_weather::{City, CityCatalog, WeatherSource};

use crate::error_mapping::weather_app_error;
use crate::presenter::{self, CardHandle, CardViewState, DashboardAction};
use crate::services::{request_weather_fetch, WeatherServiceMessage};
use crate::view::{CandidateList, DashboardView};

struct TrackedCard {
    handle: CardHandle,
    /// Token of the fetch whose result this card is waiting for
    generation: u64,
}

pub struct DashboardController<V: DashboardView> {
    catalog: CityCatalog,
    source: Arc<dyn WeatherSource>,
    runtime: tokio::runtime::Handle,
    view: V,
    cards: HashMap<String, TrackedCard>,
    /// Display order of `cards`
    order: Vec<String>,
    next_generation: u64,
    in_flight: usize,
    tx: Sender<WeatherServiceMessage>,
    rx: Receiver<WeatherServiceMessage>,
}

impl<V: DashboardView> DashboardController<V> {
    pub fn new(
        catalog: CityCatalog,
        source: Arc<dyn WeatherSource>,
        runtime: tokio::runtime::Handle,
        view: V,
    ) -> Self {
        let (tx, rx) = mpsc::channel();
        let mut controller = Self {
            catalog,
            source,
            runtime,
            view,
            cards: HashMap::new(),
            order: Vec::new(),
            next_generation: 0,
            in_flight: 0,
            tx,
            rx,
        };
        controller.refresh_candidates();
        controller
    }

    /// Add every default city the catalog knows. Returns how many were added.
    pub fn initialize<S: AsRef<str>>(&mut self, default_ids: &[S]) -> usize {
        let mut added = 0;
        for id in default_ids {
            let id = id.as_ref();
            match self.catalog.lookup(id).cloned() {
                Some(city) => {
                    if self.add_city(&city) {
                        added += 1;
                    }
                }
                None => tracing::warn!("Skipping unknown default city: {}", id),
            }
        }
        tracing::info!("Dashboard initialized with {} cities", added);
        added
    }

    /// Show `city` in the loading state and start fetching its weather.
    ///
    /// Returns false without touching anything if the city is already shown.
    /// Returns before the fetch completes.
    pub fn add_city(&mut self, city: &City) -> bool {
        if self.cards.contains_key(&city.id) {
            tracing::debug!("{} already on dashboard", city.id);
            return false;
        }

        let handle = presenter::create_card(city);
        self.view.insert_card(&handle);

        let generation = self.next_generation;
        self.next_generation += 1;

        self.cards.insert(
            city.id.clone(),
            TrackedCard { handle, generation },
        );
        self.order.push(city.id.clone());

        request_weather_fetch(
            &self.tx,
            &self.runtime,
            Arc::clone(&self.source),
            city.clone(),
            generation,
        );
        self.in_flight += 1;

        tracing::info!("Added {} to dashboard", city.id);
        self.refresh_candidates();
        true
    }

    /// Take a city off the dashboard. A fetch still in flight for it is
    /// ignored when it lands.
    pub fn remove_city(&mut self, id: &str) -> bool {
        if self.cards.remove(id).is_none() {
            return false;
        }
        self.order.retain(|o| o != id);
        self.view.remove_card(id);

        tracing::info!("Removed {} from dashboard", id);
        self.refresh_candidates();
        true
    }

    /// Re-present the catalog cities that are not currently shown.
    pub fn refresh_candidates(&mut self) {
        let candidates = self.candidates();
        self.view.set_candidates(&candidates);
    }

    /// The selection control's submit action.
    pub fn submit_selection(&mut self, id: &str) -> bool {
        match self.catalog.lookup(id).cloned() {
            Some(city) => self.add_city(&city),
            None => {
                tracing::warn!("Selected city not in catalog: {}", id);
                false
            }
        }
    }

    pub fn dispatch(&mut self, action: DashboardAction) -> bool {
        match action {
            DashboardAction::Add(id) => self.submit_selection(&id),
            DashboardAction::Remove(id) => self.remove_city(&id),
        }
    }

    /// Apply every finished fetch without blocking. Returns how many results
    /// were received, discarded ones included.
    pub fn poll_results(&mut self) -> usize {
        let mut received = 0;
        while let Ok(msg) = self.rx.try_recv() {
            self.handle_message(msg);
            received += 1;
        }
        received
    }

    /// Block up to `timeout` for one fetch result and apply it.
    pub fn wait_for_result(&mut self, timeout: Duration) -> bool {
        match self.rx.recv_timeout(timeout) {
            Ok(msg) => {
                self.handle_message(msg);
                true
            }
            Err(RecvTimeoutError::Timeout) => false,
            // The controller keeps its own sender alive, so this cannot happen.
            Err(RecvTimeoutError::Disconnected) => false,
        }
    }

    /// Apply results until no fetch is in flight or `timeout` elapses.
    /// Returns true if everything settled.
    pub fn settle(&mut self, timeout: Duration) -> bool {
        let deadline = Instant::now() + timeout;
        while self.in_flight > 0 {
            let now = Instant::now();
            if now >= deadline {
                return false;
            }
            self.wait_for_result(deadline - now);
        }
        true
    }

    fn handle_message(&mut self, msg: WeatherServiceMessage) {
        match msg {
            WeatherServiceMessage::FetchDone {
                city_id,
                generation,
                result,
            } => {
                self.in_flight = self.in_flight.saturating_sub(1);

                let tracked = match self.cards.get_mut(&city_id) {
                    Some(t) if t.generation == generation => t,
                    _ => {
                        tracing::debug!(
                            "Discarding stale weather result for {} (gen {})",
                            city_id,
                            generation
                        );
                        return;
                    }
                };

                match result {
                    Ok(sample) => {
                        tracing::info!(
                            "Weather for {}: {} at {}",
                            city_id,
                            sample.temperature,
                            sample.observed_at
                        );
                        presenter::show_success(&mut tracked.handle, &sample);
                    }
                    Err(e) => {
                        tracing::error!("Failed to load weather for {}: {}", city_id, e);
                        let app_error = weather_app_error(e);
                        presenter::show_error(&mut tracked.handle);
                        tracked
                            .handle
                            .set_error_detail(Some(app_error.user_message().to_string()));
                    }
                }
                self.view.update_card(&tracked.handle);
            }
        }
    }

    pub fn candidates(&self) -> CandidateList {
        let displayed: HashSet<String> = self.cards.keys().cloned().collect();
        CandidateList {
            entries: self.catalog.candidates(&displayed),
        }
    }

    pub fn is_displayed(&self, id: &str) -> bool {
        self.cards.contains_key(id)
    }

    /// Displayed city ids in the order they were added.
    pub fn displayed_ids(&self) -> &[String] {
        &self.order
    }

    pub fn card(&self, id: &str) -> Option<&CardHandle> {
        self.cards.get(id).map(|t| &t.handle)
    }

    pub fn card_state(&self, id: &str) -> Option<&CardViewState> {
        self.card(id).map(CardHandle::state)
    }

    /// Fetches dispatched whose results have not been received yet, including
    /// ones for cities that were removed since.
    pub fn pending_fetches(&self) -> usize {
        self.in_flight
    }

    pub fn catalog(&self) -> &CityCatalog {
        &self.catalog
    }

    pub fn view(&self) -> &V {
        &self.view
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::view::TextView;
    use async_trait::async_trait;
    use parking_lot::Mutex;
    use skyboard_weather::{WeatherError, WeatherSample};
    use tokio::sync::Semaphore;

    const WAIT: Duration = Duration::from_secs(5);

    #[derive(Clone, Copy)]
    enum Outcome {
        Temp(f64),
        Status(u16),
        Incomplete,
    }

    /// Source that answers from a script and only completes a fetch once the
    /// gate hands out a permit.
    struct ScriptedSource {
        outcomes: HashMap<String, Outcome>,
        gate: Arc<Semaphore>,
        calls: Mutex<Vec<String>>,
    }

    impl ScriptedSource {
        fn new(outcomes: &[(&str, Outcome)], permits: usize) -> Arc<Self> {
            Arc::new(Self {
                outcomes: outcomes
                    .iter()
                    .map(|(id, o)| (id.to_string(), *o))
                    .collect(),
                gate: Arc::new(Semaphore::new(permits)),
                calls: Mutex::new(Vec::new()),
            })
        }

        fn open(&self, n: usize) {
            self.gate.add_permits(n);
        }
    }

    #[async_trait]
    impl WeatherSource for ScriptedSource {
        async fn fetch_current(&self, city: &City) -> Result<WeatherSample, WeatherError> {
            self.calls.lock().push(city.id.clone());
            if let Ok(permit) = self.gate.acquire().await {
                permit.forget();
            }
            match self.outcomes.get(&city.id).copied() {
                Some(Outcome::Temp(t)) => Ok(WeatherSample {
                    temperature: t,
                    observed_at: "2024-03-01T10:15".into(),
                }),
                Some(Outcome::Status(status)) => Err(WeatherError::RequestFailed { status }),
                Some(Outcome::Incomplete) | None => {
                    Err(WeatherError::IncompleteData("temperature not found".into()))
                }
            }
        }
    }

    fn runtime() -> tokio::runtime::Runtime {
        tokio::runtime::Builder::new_multi_thread()
            .worker_threads(2)
            .enable_all()
            .build()
            .unwrap()
    }

    fn controller(
        rt: &tokio::runtime::Runtime,
        source: Arc<ScriptedSource>,
    ) -> DashboardController<TextView> {
        DashboardController::new(
            CityCatalog::builtin(),
            source,
            rt.handle().clone(),
            TextView::new(),
        )
    }

    fn assert_partition(c: &DashboardController<TextView>) {
        let candidates = c.candidates();
        for city in &candidates.entries {
            assert!(!c.is_displayed(&city.id), "{} both shown and addable", city.id);
        }
        assert_eq!(
            candidates.entries.len() + c.displayed_ids().len(),
            c.catalog().len()
        );
        assert_eq!(c.view().candidates(), &candidates);
        assert_eq!(c.view().cards().len(), c.displayed_ids().len());
    }

    #[test]
    fn initialize_shows_loading_cards_before_results() {
        let rt = runtime();
        let source = ScriptedSource::new(
            &[
                ("kyiv", Outcome::Temp(3.2)),
                ("singapore", Outcome::Temp(31.0)),
                ("london", Outcome::Temp(21.4)),
                ("sydney", Outcome::Temp(18.5)),
            ],
            0,
        );
        let mut c = controller(&rt, source.clone());

        let added = c.initialize(&["kyiv", "singapore", "atlantis", "london", "sydney"]);

        assert_eq!(added, 4);
        assert_eq!(c.view().cards().len(), 4);
        assert_eq!(c.pending_fetches(), 4);
        for id in ["kyiv", "singapore", "london", "sydney"] {
            assert_eq!(c.card_state(id), Some(&CardViewState::Loading));
        }
        assert_partition(&c);

        source.open(4);
        assert!(c.settle(WAIT));
        assert_eq!(c.card("london").unwrap().temperature_text(), "21°C");
        assert_eq!(c.card("sydney").unwrap().temperature_text(), "19°C");
        assert_eq!(c.view().card("kyiv").unwrap().temperature_text(), "3°C");
    }

    #[test]
    fn add_city_twice_creates_one_card_and_one_fetch() {
        let rt = runtime();
        let source = ScriptedSource::new(&[("tokyo", Outcome::Temp(12.0))], 100);
        let mut c = controller(&rt, source.clone());
        let tokyo = c.catalog().lookup("tokyo").cloned().unwrap();

        assert!(c.add_city(&tokyo));
        assert!(!c.add_city(&tokyo));

        assert_eq!(c.view().cards().len(), 1);
        assert_eq!(c.pending_fetches(), 1);
        assert!(c.settle(WAIT));
        assert_eq!(source.calls.lock().len(), 1);
        assert_partition(&c);
    }

    #[test]
    fn removal_during_flight_discards_result() {
        let rt = runtime();
        let source = ScriptedSource::new(&[("london", Outcome::Temp(21.4))], 0);
        let mut c = controller(&rt, source.clone());

        assert!(c.submit_selection("london"));
        assert!(c.remove_city("london"));
        assert!(c.view().card("london").is_none());

        source.open(1);
        assert!(c.settle(WAIT));

        assert!(!c.is_displayed("london"));
        assert!(c.card("london").is_none());
        assert!(c.view().cards().is_empty());
        assert_partition(&c);
    }

    #[test]
    fn stale_generation_does_not_touch_readded_card() {
        let rt = runtime();
        let source = ScriptedSource::new(&[("london", Outcome::Temp(21.4))], 0);
        let mut c = controller(&rt, source);

        assert!(c.submit_selection("london"));
        assert!(c.remove_city("london"));
        assert!(c.submit_selection("london"));

        // Result of the first, abandoned fetch.
        c.tx
            .send(WeatherServiceMessage::FetchDone {
                city_id: "london".into(),
                generation: 0,
                result: Ok(WeatherSample {
                    temperature: 99.0,
                    observed_at: "2024-03-01T10:15".into(),
                }),
            })
            .unwrap();
        assert_eq!(c.poll_results(), 1);

        assert_eq!(c.card_state("london"), Some(&CardViewState::Loading));
        assert_eq!(c.view().card("london").unwrap().temperature_text(), "--");
    }

    #[test]
    fn server_error_shows_error_card() {
        let rt = runtime();
        let source = ScriptedSource::new(
            &[("london", Outcome::Status(500)), ("kyiv", Outcome::Temp(1.0))],
            100,
        );
        let mut c = controller(&rt, source);

        c.initialize(&["london", "kyiv"]);
        assert!(c.settle(WAIT));

        let card = c.view().card("london").unwrap();
        assert_eq!(card.state(), &CardViewState::Error);
        assert_eq!(card.temperature_text(), "--");
        assert_eq!(card.status_text(), "Data unavailable");
        assert_eq!(card.updated_text(), "");
        assert!(card.error_detail().is_some());

        // One city's failure leaves the others alone.
        assert_eq!(c.card("kyiv").unwrap().temperature_text(), "1°C");
    }

    #[test]
    fn incomplete_data_shows_error_card() {
        let rt = runtime();
        let source = ScriptedSource::new(&[("nairobi", Outcome::Incomplete)], 100);
        let mut c = controller(&rt, source);

        assert!(c.dispatch(DashboardAction::Add("nairobi".into())));
        assert!(c.settle(WAIT));
        assert_eq!(c.card_state("nairobi"), Some(&CardViewState::Error));
    }

    #[test]
    fn remove_unknown_is_noop() {
        let rt = runtime();
        let source = ScriptedSource::new(&[], 100);
        let mut c = controller(&rt, source);

        assert!(!c.remove_city("london"));
        assert!(!c.submit_selection("atlantis"));
        assert_eq!(c.pending_fetches(), 0);
        assert_eq!(c.candidates().entries.len(), c.catalog().len());
    }

    #[test]
    fn candidates_track_add_and_remove() {
        let rt = runtime();
        let source = ScriptedSource::new(&[], 100);
        let mut c = controller(&rt, source);

        let ids: Vec<String> = c.catalog().cities().map(|city| city.id.clone()).collect();
        for id in &ids {
            assert!(c.submit_selection(id));
            assert_partition(&c);
        }
        assert!(!c.view().candidates().add_enabled());

        let card = c.card("tokyo").unwrap().clone();
        assert!(c.dispatch(card.remove_action()));
        assert_partition(&c);
        assert!(c.view().candidates().add_enabled());
        assert_eq!(c.candidates().entries[0].id, "tokyo");
        assert!(c.settle(WAIT));
    }

    #[test]
    fn displayed_order_follows_adds() {
        let rt = runtime();
        let source = ScriptedSource::new(&[], 100);
        let mut c = controller(&rt, source);

        c.initialize(&["sydney", "kyiv", "reykjavik"]);
        c.remove_city("kyiv");
        assert_eq!(c.displayed_ids(), ["sydney", "reykjavik"]);
        let shown: Vec<&str> = c.view().cards().iter().map(|h| h.city_id()).collect();
        assert_eq!(shown, ["sydney", "reykjavik"]);
        assert!(c.settle(WAIT));
    }
}
