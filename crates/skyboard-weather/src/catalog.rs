//! Registry of the cities the dashboard knows about.

use std::collections::{HashMap, HashSet};

use crate::types::City;

/// (id, name, display label, latitude, longitude)
const BUILTIN_CITIES: &[(&str, &str, &str, f64, f64)] = &[
    ("kyiv", "Kyiv", "Kyiv, Ukraine", 50.4501, 30.5234),
    ("singapore", "Singapore", "Singapore", 1.3521, 103.8198),
    ("london", "London", "London, United Kingdom", 51.5074, -0.1278),
    ("sydney", "Sydney", "Sydney, Australia", -33.8688, 151.2093),
    ("tokyo", "Tokyo", "Tokyo, Japan", 35.6762, 139.6503),
    ("new-york", "New York", "New York, United States", 40.7128, -74.0060),
    ("nairobi", "Nairobi", "Nairobi, Kenya", -1.2921, 36.8219),
    ("buenos-aires", "Buenos Aires", "Buenos Aires, Argentina", -34.6037, -58.3816),
    ("reykjavik", "Reykjavik", "Reykjavik, Iceland", 64.1466, -21.9426),
];

/// Ordered, read-only city list with O(1) lookup by id.
#[derive(Debug, Clone, Default)]
pub struct CityCatalog {
    cities: Vec<City>,
    index: HashMap<String, usize>,
}

impl CityCatalog {
    /// The catalog compiled into the binary.
    pub fn builtin() -> Self {
        Self::from_cities(
            BUILTIN_CITIES
                .iter()
                .map(|&(id, name, label, lat, lon)| City::new(id, name, label, lat, lon)),
        )
    }

    /// Build a catalog keeping the given order. A repeated id keeps its first
    /// entry.
    pub fn from_cities(cities: impl IntoIterator<Item = City>) -> Self {
        let mut catalog = Self::default();
        for city in cities {
            catalog.push(city);
        }
        catalog
    }

    /// Append cities after the existing ones, skipping ids already present.
    pub fn with_extra_cities(mut self, extra: impl IntoIterator<Item = City>) -> Self {
        for city in extra {
            self.push(city);
        }
        self
    }

    fn push(&mut self, city: City) {
        if self.index.contains_key(&city.id) {
            tracing::warn!("Duplicate city id in catalog, keeping first: {}", city.id);
            return;
        }
        self.index.insert(city.id.clone(), self.cities.len());
        self.cities.push(city);
    }

    pub fn lookup(&self, id: &str) -> Option<&City> {
        self.index.get(id).map(|&i| &self.cities[i])
    }

    /// Cities in catalog order.
    pub fn cities(&self) -> impl Iterator<Item = &City> {
        self.cities.iter()
    }

    pub fn len(&self) -> usize {
        self.cities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cities.is_empty()
    }

    /// Catalog cities not in `displayed`, in catalog order.
    pub fn candidates(&self, displayed: &HashSet<String>) -> Vec<City> {
        self.cities
            .iter()
            .filter(|c| !displayed.contains(&c.id))
            .cloned()
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_lookup() {
        let catalog = CityCatalog::builtin();
        let kyiv = catalog.lookup("kyiv").unwrap();
        assert_eq!(kyiv.name, "Kyiv");
        assert!((kyiv.latitude - 50.4501).abs() < f64::EPSILON);
        assert!(catalog.lookup("atlantis").is_none());
    }

    #[test]
    fn test_builtin_order_starts_with_defaults() {
        let catalog = CityCatalog::builtin();
        let ids: Vec<&str> = catalog.cities().take(4).map(|c| c.id.as_str()).collect();
        assert_eq!(ids, ["kyiv", "singapore", "london", "sydney"]);
        assert_eq!(catalog.len(), BUILTIN_CITIES.len());
    }

    #[test]
    fn test_duplicate_ids_keep_first() {
        let catalog = CityCatalog::from_cities([
            City::new("a", "First", "First", 1.0, 1.0),
            City::new("a", "Second", "Second", 2.0, 2.0),
            City::new("b", "B", "B", 3.0, 3.0),
        ]);
        assert_eq!(catalog.len(), 2);
        assert_eq!(catalog.lookup("a").unwrap().name, "First");
    }

    #[test]
    fn test_extra_cities_append() {
        let catalog = CityCatalog::builtin().with_extra_cities([
            City::new("hobart", "Hobart", "Hobart, Australia", -42.8821, 147.3272),
            City::new("london", "London again", "London", 0.0, 0.0),
        ]);
        assert_eq!(catalog.len(), BUILTIN_CITIES.len() + 1);
        assert_eq!(catalog.cities().last().unwrap().id, "hobart");
        assert_eq!(catalog.lookup("london").unwrap().name, "London");
    }

    #[test]
    fn test_candidates_partition_catalog() {
        let catalog = CityCatalog::builtin();
        let displayed: HashSet<String> = ["london", "tokyo"].iter().map(|s| s.to_string()).collect();

        let candidates = catalog.candidates(&displayed);
        assert_eq!(candidates.len(), catalog.len() - 2);
        assert!(candidates.iter().all(|c| !displayed.contains(&c.id)));
        assert_eq!(candidates[0].id, "kyiv");
    }
}
