//! Destination catalog: the fixed table of bodies a rocket can strike.
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;
use std::str::FromStr;
use std::sync::OnceLock;
use thiserror::Error;

/// Identifier of a celestial destination.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DestinationId {
    Mercury,
    Venus,
    Earth,
    Mars,
    Jupiter,
    Saturn,
    Uranus,
    Neptune,
}

impl DestinationId {
    pub const ALL: [Self; 8] = [
        Self::Mercury,
        Self::Venus,
        Self::Earth,
        Self::Mars,
        Self::Jupiter,
        Self::Saturn,
        Self::Uranus,
        Self::Neptune,
    ];

    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Mercury => "Mercury",
            Self::Venus => "Venus",
            Self::Earth => "Earth",
            Self::Mars => "Mars",
            Self::Jupiter => "Jupiter",
            Self::Saturn => "Saturn",
            Self::Uranus => "Uranus",
            Self::Neptune => "Neptune",
        }
    }
}

impl fmt::Display for DestinationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for DestinationId {
    type Err = CatalogError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        Self::ALL
            .into_iter()
            .find(|id| id.name().eq_ignore_ascii_case(trimmed))
            .ok_or_else(|| CatalogError::UnknownName(trimmed.to_string()))
    }
}

/// Static definition of a single destination.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Destination {
    pub id: DestinationId,
    /// Chance in `[0, 1]` that a rocket aimed here actually strikes it.
    pub strike_probability: f64,
    /// Profit multiplier applied to the wager on a hit.
    pub payout_multiplier: f64,
    #[serde(default)]
    pub tagline: String,
    #[serde(default)]
    pub profit_label: String,
}

impl Destination {
    fn stock(
        id: DestinationId,
        strike_probability: f64,
        payout_multiplier: f64,
        tagline: &str,
        profit_label: &str,
    ) -> Self {
        Self {
            id,
            strike_probability,
            payout_multiplier,
            tagline: tagline.to_string(),
            profit_label: profit_label.to_string(),
        }
    }
}

/// Errors raised by catalog construction and lookup.
#[derive(Debug, Error, PartialEq)]
pub enum CatalogError {
    #[error("destination {0} is not in the catalog")]
    NotFound(DestinationId),
    #[error("unknown destination name '{0}'")]
    UnknownName(String),
    #[error("catalog must contain at least one destination")]
    Empty,
    #[error("destination {0} is listed more than once")]
    DuplicateId(DestinationId),
    #[error("strike probability for {id} must be within [0, 1] (got {value})")]
    ProbabilityOutOfRange { id: DestinationId, value: f64 },
    #[error("payout multiplier for {id} must be finite and non-negative (got {value})")]
    InvalidMultiplier { id: DestinationId, value: f64 },
    #[error("catalog has no alternative impact for a missed strike on {0}")]
    NoAlternative(DestinationId),
    #[error("catalog JSON is malformed: {0}")]
    Parse(String),
}

/// Ordered, validated set of destinations.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(transparent)]
pub struct Catalog {
    destinations: Vec<Destination>,
}

impl Catalog {
    /// Build a catalog, enforcing non-emptiness, unique ids, and sane odds.
    ///
    /// # Errors
    ///
    /// Returns an error when the list is empty, repeats an id, or carries an
    /// out-of-range probability or multiplier.
    pub fn new(destinations: Vec<Destination>) -> Result<Self, CatalogError> {
        if destinations.is_empty() {
            return Err(CatalogError::Empty);
        }
        let mut seen = HashSet::with_capacity(destinations.len());
        for dest in &destinations {
            if !seen.insert(dest.id) {
                return Err(CatalogError::DuplicateId(dest.id));
            }
            if !(0.0..=1.0).contains(&dest.strike_probability) {
                return Err(CatalogError::ProbabilityOutOfRange {
                    id: dest.id,
                    value: dest.strike_probability,
                });
            }
            if !dest.payout_multiplier.is_finite() || dest.payout_multiplier < 0.0 {
                return Err(CatalogError::InvalidMultiplier {
                    id: dest.id,
                    value: dest.payout_multiplier,
                });
            }
        }
        Ok(Self { destinations })
    }

    /// Parse and validate a JSON array of destinations.
    ///
    /// # Errors
    ///
    /// Returns [`CatalogError::Parse`] for malformed JSON and any validation
    /// error from [`Catalog::new`].
    pub fn from_json(json: &str) -> Result<Self, CatalogError> {
        let destinations: Vec<Destination> =
            serde_json::from_str(json).map_err(|err| CatalogError::Parse(err.to_string()))?;
        Self::new(destinations)
    }

    /// The stock eight-planet table.
    #[must_use]
    pub fn standard() -> Self {
        static STANDARD: OnceLock<Catalog> = OnceLock::new();
        STANDARD
            .get_or_init(|| Self {
                destinations: standard_destinations(),
            })
            .clone()
    }

    #[must_use]
    pub fn list(&self) -> &[Destination] {
        &self.destinations
    }

    /// Look up a destination by id.
    ///
    /// # Errors
    ///
    /// Returns [`CatalogError::NotFound`] if the id is not part of this catalog.
    pub fn get(&self, id: DestinationId) -> Result<&Destination, CatalogError> {
        self.destinations
            .iter()
            .find(|dest| dest.id == id)
            .ok_or(CatalogError::NotFound(id))
    }

    #[must_use]
    pub fn contains(&self, id: DestinationId) -> bool {
        self.destinations.iter().any(|dest| dest.id == id)
    }

    /// Every destination except `excluding`, in catalog order.
    pub fn others(&self, excluding: DestinationId) -> impl Iterator<Item = &Destination> + '_ {
        self.destinations
            .iter()
            .filter(move |dest| dest.id != excluding)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.destinations.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.destinations.is_empty()
    }
}

impl Default for Catalog {
    fn default() -> Self {
        Self::standard()
    }
}

impl<'de> Deserialize<'de> for Catalog {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let destinations = Vec::<Destination>::deserialize(deserializer)?;
        Self::new(destinations).map_err(serde::de::Error::custom)
    }
}

fn standard_destinations() -> Vec<Destination> {
    use DestinationId::{Earth, Jupiter, Mars, Mercury, Neptune, Saturn, Uranus, Venus};
    vec![
        Destination::stock(Mercury, 0.70, 0.05, "The Swift Messenger", "1.05x"),
        Destination::stock(Venus, 0.60, 0.10, "The Morning Star", "1.10x"),
        Destination::stock(Earth, 0.50, 0.20, "Our Home Base", "1.20x"),
        Destination::stock(Mars, 0.40, 0.15, "The Red Planet", "1.15x"),
        Destination::stock(Jupiter, 0.02, 5.0, "King of Planets", "6.00x"),
        Destination::stock(Saturn, 0.05, 3.0, "Lord of the Rings", "4.00x"),
        Destination::stock(Uranus, 0.10, 1.5, "The Ice Giant", "2.50x"),
        Destination::stock(Neptune, 0.07, 2.5, "The Windy Voyager", "3.50x"),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dest(id: DestinationId, p: f64, m: f64) -> Destination {
        Destination {
            id,
            strike_probability: p,
            payout_multiplier: m,
            tagline: String::new(),
            profit_label: String::new(),
        }
    }

    #[test]
    fn standard_catalog_covers_every_body_once() {
        let catalog = Catalog::standard();
        assert_eq!(catalog.len(), DestinationId::ALL.len());
        for id in DestinationId::ALL {
            assert_eq!(catalog.get(id).unwrap().id, id);
        }
        assert!(Catalog::new(catalog.list().to_vec()).is_ok());
    }

    #[test]
    fn earth_matches_reference_odds() {
        let earth = Catalog::standard()
            .get(DestinationId::Earth)
            .cloned()
            .unwrap();
        assert!((earth.strike_probability - 0.50).abs() < f64::EPSILON);
        assert!((earth.payout_multiplier - 0.20).abs() < f64::EPSILON);
        assert_eq!(earth.profit_label, "1.20x");
    }

    #[test]
    fn lookup_miss_reports_not_found() {
        let catalog = Catalog::new(vec![dest(DestinationId::Mars, 0.4, 0.15)]).unwrap();
        assert_eq!(
            catalog.get(DestinationId::Venus),
            Err(CatalogError::NotFound(DestinationId::Venus))
        );
    }

    #[test]
    fn validation_rejects_bad_tables() {
        assert_eq!(Catalog::new(Vec::new()), Err(CatalogError::Empty));
        assert_eq!(
            Catalog::new(vec![
                dest(DestinationId::Mars, 0.4, 0.1),
                dest(DestinationId::Mars, 0.3, 0.1),
            ]),
            Err(CatalogError::DuplicateId(DestinationId::Mars))
        );
        assert!(matches!(
            Catalog::new(vec![dest(DestinationId::Earth, 1.5, 0.1)]),
            Err(CatalogError::ProbabilityOutOfRange { .. })
        ));
        assert!(matches!(
            Catalog::new(vec![dest(DestinationId::Earth, 0.5, -1.0)]),
            Err(CatalogError::InvalidMultiplier { .. })
        ));
        assert!(matches!(
            Catalog::new(vec![dest(DestinationId::Earth, f64::NAN, 1.0)]),
            Err(CatalogError::ProbabilityOutOfRange { .. })
        ));
    }

    #[test]
    fn others_excludes_only_the_given_id() {
        let catalog = Catalog::standard();
        let others: Vec<_> = catalog.others(DestinationId::Earth).map(|d| d.id).collect();
        assert_eq!(others.len(), 7);
        assert!(!others.contains(&DestinationId::Earth));
        assert_eq!(others[0], DestinationId::Mercury);
    }

    #[test]
    fn parses_names_and_json() {
        assert_eq!("  jupiter ".parse::<DestinationId>(), Ok(DestinationId::Jupiter));
        assert!("pluto".parse::<DestinationId>().is_err());

        let json = r#"[
            {"id": "mars", "strike_probability": 0.4, "payout_multiplier": 0.15},
            {"id": "venus", "strike_probability": 0.6, "payout_multiplier": 0.1, "tagline": "The Morning Star"}
        ]"#;
        let catalog = Catalog::from_json(json).unwrap();
        assert_eq!(catalog.len(), 2);
        assert_eq!(catalog.get(DestinationId::Venus).unwrap().tagline, "The Morning Star");
        assert!(matches!(
            Catalog::from_json("{"),
            Err(CatalogError::Parse(_))
        ));
        let typed: Result<Catalog, _> = serde_json::from_str("[]");
        assert!(typed.is_err());
    }
}
