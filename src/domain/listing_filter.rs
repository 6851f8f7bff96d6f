//! In-memory search over a collection of plant listings.

use serde::Deserialize;

use super::Plant;

/// Free-text and location criteria for browsing listings.
///
/// Both criteria are case-insensitive substring matches; an empty criterion
/// matches everything.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct ListingFilter {
    /// Matched against name, species and description.
    #[serde(default)]
    pub search_term: String,
    /// Matched against the plant's location.
    #[serde(default)]
    pub location: String,
}

impl ListingFilter {
    /// Creates a filter from its two criteria.
    #[must_use]
    pub fn new(search_term: impl Into<String>, location: impl Into<String>) -> Self {
        Self {
            search_term: search_term.into(),
            location: location.into(),
        }
    }

    /// Returns `true` if `plant` satisfies both criteria.
    #[must_use]
    pub fn matches(&self, plant: &Plant) -> bool {
        let term = self.search_term.to_lowercase();
        let location = self.location.to_lowercase();
        matches_term(plant, &term) && matches_location(plant, &location)
    }

    /// Returns the matching plants, preserving input order.
    #[must_use]
    pub fn apply<'a>(&self, plants: &'a [Plant]) -> Vec<&'a Plant> {
        let term = self.search_term.to_lowercase();
        let location = self.location.to_lowercase();
        plants
            .iter()
            .filter(|p| matches_term(p, &term) && matches_location(p, &location))
            .collect()
    }

    /// Owned variant of [`ListingFilter::apply`].
    #[must_use]
    pub fn retain(&self, mut plants: Vec<Plant>) -> Vec<Plant> {
        let term = self.search_term.to_lowercase();
        let location = self.location.to_lowercase();
        plants.retain(|p| matches_term(p, &term) && matches_location(p, &location));
        plants
    }
}

fn matches_term(plant: &Plant, term: &str) -> bool {
    term.is_empty()
        || plant.name.to_lowercase().contains(term)
        || plant.species.to_lowercase().contains(term)
        || plant
            .description
            .as_deref()
            .is_some_and(|d| d.to_lowercase().contains(term))
}

fn matches_location(plant: &Plant, location: &str) -> bool {
    location.is_empty() || plant.location.to_lowercase().contains(location)
}
