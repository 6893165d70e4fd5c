//! The surface cards are drawn on.

use skyboard_weather::City;

use crate::presenter::CardHandle;

/// Entries for the "add a city" selection control.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CandidateList {
    pub entries: Vec<City>,
}

impl CandidateList {
    /// The add affordance is only usable while there is something to add.
    pub fn add_enabled(&self) -> bool {
        !self.entries.is_empty()
    }
}

/// A container that accepts card inserts and removals plus a selection
/// control listing candidates.
pub trait DashboardView {
    fn insert_card(&mut self, card: &CardHandle);
    fn update_card(&mut self, card: &CardHandle);
    fn remove_card(&mut self, city_id: &str);
    fn set_candidates(&mut self, candidates: &CandidateList);
}

/// In-memory view that keeps cards in insertion order and renders them as
/// plain text.
#[derive(Debug, Default)]
pub struct TextView {
    cards: Vec<CardHandle>,
    candidates: CandidateList,
}

impl TextView {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cards(&self) -> &[CardHandle] {
        &self.cards
    }

    pub fn card(&self, city_id: &str) -> Option<&CardHandle> {
        self.cards.iter().find(|c| c.city_id() == city_id)
    }

    pub fn candidates(&self) -> &CandidateList {
        &self.candidates
    }

    pub fn render(&self) -> String {
        let mut out = String::new();
        if self.cards.is_empty() {
            out.push_str("(no cities shown)\n");
        }
        for card in &self.cards {
            out.push_str(&card.render_text());
            out.push('\n');
        }

        if self.candidates.add_enabled() {
            let ids: Vec<&str> = self
                .candidates
                .entries
                .iter()
                .map(|c| c.id.as_str())
                .collect();
            out.push_str(&format!("Add: {}\n", ids.join(", ")));
        } else {
            out.push_str("Add: (all cities shown)\n");
        }
        out
    }
}

impl DashboardView for TextView {
    fn insert_card(&mut self, card: &CardHandle) {
        self.cards.push(card.clone());
    }

    fn update_card(&mut self, card: &CardHandle) {
        if let Some(existing) = self
            .cards
            .iter_mut()
            .find(|c| c.city_id() == card.city_id())
        {
            *existing = card.clone();
        }
    }

    fn remove_card(&mut self, city_id: &str) {
        self.cards.retain(|c| c.city_id() != city_id);
    }

    fn set_candidates(&mut self, candidates: &CandidateList) {
        self.candidates = candidates.clone();
    }
}
