//! Camp catalog
//!
//! The assistant answers questions about a fixed set of camps. The catalog is
//! read-only; registration and seat bookkeeping live in the hosted backend.

use serde::{Deserialize, Serialize};

/// A camp the assistant can talk about
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Camp {
    pub id: String,
    pub name: String,
    /// Fee in whole rupees
    pub price_inr: u32,
    pub min_age: u8,
    pub max_age: u8,
    pub duration_days: u16,
    /// One-line activity summary as shown to parents
    pub highlights: String,
    #[serde(default)]
    pub best_value: bool,
}

impl Camp {
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        price_inr: u32,
        ages: (u8, u8),
        highlights: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            price_inr,
            min_age: ages.0,
            max_age: ages.1,
            duration_days: 10,
            highlights: highlights.into(),
            best_value: false,
        }
    }

    pub fn with_duration_days(mut self, days: u16) -> Self {
        self.duration_days = days;
        self
    }

    pub fn best_value(mut self) -> Self {
        self.best_value = true;
        self
    }

    pub fn accepts_age(&self, age: u8) -> bool {
        (self.min_age..=self.max_age).contains(&age)
    }
}

/// Read-only source of camp records
pub trait CatalogProvider: Send + Sync {
    fn camps(&self) -> &[Camp];

    fn find(&self, id: &str) -> Option<&Camp> {
        self.camps().iter().find(|camp| camp.id == id)
    }
}

/// The built-in summer camp lineup
#[derive(Debug, Clone)]
pub struct StaticCatalog {
    camps: Vec<Camp>,
}

impl StaticCatalog {
    pub fn new(camps: Vec<Camp>) -> Self {
        Self { camps }
    }
}

impl Default for StaticCatalog {
    fn default() -> Self {
        Self::new(vec![
            Camp::new(
                "upskilling",
                "Upskilling",
                2_500,
                (8, 16),
                "Leadership, communication, time management",
            ),
            Camp::new(
                "splashfun",
                "SplashFun",
                2_500,
                (6, 14),
                "Swimming, water polo, splash games",
            ),
            Camp::new(
                "chill-and-vibe",
                "Chill & Vibe",
                2_500,
                (7, 15),
                "Music, yoga, outdoor games",
            ),
            Camp::new(
                "handwriting-mastery",
                "Handwriting Mastery",
                1_000,
                (5, 12),
                "Cursive writing, calligraphy",
            ),
            Camp::new(
                "generative-ai",
                "Generative AI",
                1_000,
                (10, 16),
                "AI art, prompt engineering, chatbot building",
            ),
            Camp::new(
                "art-and-crafts",
                "Art & Crafts",
                500,
                (5, 12),
                "Painting, origami, clay modeling",
            ),
            Camp::new(
                "public-speaking",
                "Public Speaking",
                1_000,
                (8, 16),
                "Debates, storytelling, presentations",
            ),
            Camp::new(
                "combo-pack",
                "Combo Pack",
                3_000,
                (6, 16),
                "ALL activities included",
            )
            .best_value(),
        ])
    }
}

impl CatalogProvider for StaticCatalog {
    fn camps(&self) -> &[Camp] {
        &self.camps
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_catalog_has_eight_camps() {
        let catalog = StaticCatalog::default();
        assert_eq!(catalog.camps().len(), 8);
        assert!(catalog.camps().iter().all(|c| c.duration_days == 10));
    }

    #[test]
    fn only_combo_pack_is_best_value() {
        let catalog = StaticCatalog::default();
        let best: Vec<_> = catalog
            .camps()
            .iter()
            .filter(|c| c.best_value)
            .map(|c| c.id.as_str())
            .collect();
        assert_eq!(best, vec!["combo-pack"]);
    }

    #[test]
    fn find_by_id() {
        let catalog = StaticCatalog::default();
        let camp = catalog.find("art-and-crafts").unwrap();
        assert_eq!(camp.price_inr, 500);
        assert!(camp.accepts_age(5));
        assert!(!camp.accepts_age(13));
        assert!(catalog.find("space-camp").is_none());
    }
}
