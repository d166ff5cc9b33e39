//! Doctor roster and location finder.
//!
//! Both are backed by fixed in-memory data.  The roster pages through a
//! [`Carousel`]; the finder filters hospitals and booths by a search string
//! and links out to an external map for directions.

use std::ops::Range;

use serde::Serialize;
use url::Url;

use crate::error::{Error, Result};

/// Number of doctors shown at once.
pub const DOCTOR_PAGE_SIZE: usize = 3;

/// Where the finder assumes the user is when no position is available.
pub const DEFAULT_LOCATION: Coordinates = Coordinates {
    lat: 28.6139,
    lng: 77.2090,
};

const MAPS_BASE_URL: &str = "https://www.google.com/maps";

/// A doctor in the roster.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Doctor {
    pub id: &'static str,
    pub name: &'static str,
    pub specialty: &'static str,
    pub rating: f32,
    pub available: bool,
}

const DOCTORS: &[Doctor] = &[
    Doctor {
        id: "1",
        name: "Dr. Priya Sharma",
        specialty: "Cardiologist",
        rating: 4.9,
        available: true,
    },
    Doctor {
        id: "2",
        name: "Dr. Rajesh Kumar",
        specialty: "Neurologist",
        rating: 4.8,
        available: true,
    },
    Doctor {
        id: "3",
        name: "Dr. Sunita Patel",
        specialty: "Pediatrician",
        rating: 4.9,
        available: false,
    },
    Doctor {
        id: "4",
        name: "Dr. Amit Singh",
        specialty: "Orthopedic Surgeon",
        rating: 4.7,
        available: true,
    },
    Doctor {
        id: "5",
        name: "Dr. Meera Gupta",
        specialty: "Dermatologist",
        rating: 4.8,
        available: true,
    },
];

/// The full roster.
pub fn doctors() -> &'static [Doctor] {
    DOCTORS
}

/// A carousel over the roster, starting at the first page.
pub fn doctor_carousel() -> Carousel {
    Carousel::new(DOCTORS.len(), DOCTOR_PAGE_SIZE)
}

/// A window of `page_size` items sliding over `len` items one at a time.
///
/// The window start ranges over `0..=max_start()`; stepping past either end
/// wraps to the other.  When everything fits on one page the start stays 0.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct Carousel {
    len: usize,
    page_size: usize,
    index: usize,
}

impl Carousel {
    /// Creates a carousel at start index 0.
    pub fn new(len: usize, page_size: usize) -> Self {
        Self {
            len,
            page_size,
            index: 0,
        }
    }

    /// Current start index.
    pub fn index(&self) -> usize {
        self.index
    }

    /// Largest valid start index.
    pub fn max_start(&self) -> usize {
        self.len.saturating_sub(self.page_size)
    }

    /// Advance one item, wrapping to the start.
    pub fn next(&mut self) -> usize {
        self.index = if self.index >= self.max_start() {
            0
        } else {
            self.index + 1
        };
        self.index
    }

    /// Go back one item, wrapping to the end.
    pub fn prev(&mut self) -> usize {
        self.index = if self.index == 0 {
            self.max_start()
        } else {
            self.index - 1
        };
        self.index
    }

    /// Indices currently in view.
    pub fn visible(&self) -> Range<usize> {
        self.index..(self.index + self.page_size).min(self.len)
    }

    /// The visible items of `items`.
    pub fn page<'a, T>(&self, items: &'a [T]) -> &'a [T] {
        let range = self.visible();
        let end = range.end.min(items.len());
        &items[range.start.min(end)..end]
    }
}

/// A latitude/longitude pair.
#[derive(Debug, Copy, Clone, PartialEq, Serialize)]
pub struct Coordinates {
    pub lat: f64,
    pub lng: f64,
}

/// What kind of place a [`Location`] is.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum LocationKind {
    Hospital,
    Booth,
}

/// A hospital or booth.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Location {
    pub id: &'static str,
    pub kind: LocationKind,
    pub name: &'static str,
    pub address: &'static str,
    pub phone: &'static str,
    pub distance_km: f32,
    /// Services offered; empty for hospitals.
    pub services: &'static [&'static str],
    pub position: Coordinates,
}

impl Location {
    fn matches(&self, needle: &str) -> bool {
        self.name.to_lowercase().contains(needle) || self.address.to_lowercase().contains(needle)
    }
}

const HOSPITALS: &[Location] = &[
    Location {
        id: "1",
        kind: LocationKind::Hospital,
        name: "Sarthi General Hospital",
        address: "123 Health Street, Medical District",
        phone: "+91 98765 43210",
        distance_km: 2.5,
        services: &[],
        position: Coordinates {
            lat: 28.6139,
            lng: 77.2090,
        },
    },
    Location {
        id: "2",
        kind: LocationKind::Hospital,
        name: "Sarthi Emergency Center",
        address: "456 Care Avenue, Downtown",
        phone: "+91 98765 43211",
        distance_km: 1.8,
        services: &[],
        position: Coordinates {
            lat: 28.6129,
            lng: 77.2080,
        },
    },
    Location {
        id: "3",
        kind: LocationKind::Hospital,
        name: "Sarthi Specialty Clinic",
        address: "789 Wellness Road, City Center",
        phone: "+91 98765 43212",
        distance_km: 3.2,
        services: &[],
        position: Coordinates {
            lat: 28.6149,
            lng: 77.2100,
        },
    },
];

const BOOTHS: &[Location] = &[
    Location {
        id: "1",
        kind: LocationKind::Booth,
        name: "Sarthi Booth - Central Plaza",
        address: "Central Plaza, Ground Floor",
        phone: "+91 98765 43213",
        distance_km: 0.8,
        services: &[
            "Basic Health Check",
            "BP Monitoring",
            "Consultation",
            "Prescription",
        ],
        position: Coordinates {
            lat: 28.6135,
            lng: 77.2085,
        },
    },
    Location {
        id: "2",
        kind: LocationKind::Booth,
        name: "Sarthi Booth - Mall Complex",
        address: "City Mall, Level 2",
        phone: "+91 98765 43214",
        distance_km: 1.2,
        services: &[
            "Health Screening",
            "Telemedicine",
            "Medicine Pickup",
            "Reports",
        ],
        position: Coordinates {
            lat: 28.6125,
            lng: 77.2095,
        },
    },
    Location {
        id: "3",
        kind: LocationKind::Booth,
        name: "Sarthi Booth - Metro Station",
        address: "Metro Station Complex",
        phone: "+91 98765 43215",
        distance_km: 2.1,
        services: &["Quick Check", "Emergency Support", "Health Advice"],
        position: Coordinates {
            lat: 28.6155,
            lng: 77.2105,
        },
    },
];

/// Finds hospitals and booths and builds directions links.
#[derive(Debug, Clone, Default)]
pub struct LocationFinder {
    user_location: Option<Coordinates>,
}

impl LocationFinder {
    /// A finder that does not know where the user is.
    pub fn new() -> Self {
        Self::default()
    }

    /// A finder with a known user position.
    pub fn with_user_location(position: Coordinates) -> Self {
        Self {
            user_location: Some(position),
        }
    }

    /// Record the outcome of a position lookup.
    ///
    /// A failed lookup falls back to [`DEFAULT_LOCATION`].
    pub fn locate(&mut self, lookup: Result<Coordinates>) -> Coordinates {
        let position = lookup.unwrap_or_else(|err| {
            tracing::warn!(error = %err, "position unavailable; using default location");
            DEFAULT_LOCATION
        });
        self.user_location = Some(position);
        position
    }

    /// The user's position, if known.
    pub fn user_location(&self) -> Option<Coordinates> {
        self.user_location
    }

    /// Every location of `kind`.
    pub fn all(&self, kind: LocationKind) -> &'static [Location] {
        match kind {
            LocationKind::Hospital => HOSPITALS,
            LocationKind::Booth => BOOTHS,
        }
    }

    /// Locations of `kind` whose name or address contains `query`,
    /// ignoring case.  An empty query matches everything.
    pub fn search(&self, kind: LocationKind, query: &str) -> Vec<&'static Location> {
        let needle = query.trim().to_lowercase();
        self.all(kind)
            .iter()
            .filter(|location| location.matches(&needle))
            .collect()
    }

    /// A map link for getting to `target`.
    ///
    /// With a known user position this is a route from there; otherwise
    /// it is a search for the target's name.
    pub fn directions_url(&self, target: &Location) -> Result<Url> {
        let mut url = Url::parse(MAPS_BASE_URL)?;
        {
            let mut segments = url
                .path_segments_mut()
                .map_err(|_| Error::url("map URL cannot take path segments", None))?;
            match self.user_location {
                Some(from) => {
                    segments
                        .push("dir")
                        .push(&format!("{},{}", from.lat, from.lng))
                        .push(&format!("{},{}", target.position.lat, target.position.lng));
                }
                None => {
                    segments.push("search").push(target.name);
                }
            }
        }
        Ok(url)
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use super::*;

    #[test]
    fn roster_pages_three_at_a_time() {
        let mut carousel = doctor_carousel();
        assert_eq!(carousel.max_start(), 2);
        let names: Vec<_> = carousel.page(doctors()).iter().map(|d| d.name).collect();
        assert_eq!(
            names,
            vec!["Dr. Priya Sharma", "Dr. Rajesh Kumar", "Dr. Sunita Patel"]
        );
        carousel.next();
        carousel.next();
        assert_eq!(carousel.page(doctors())[2].name, "Dr. Meera Gupta");
    }

    #[test]
    fn carousel_wraps_both_ways() {
        let mut carousel = Carousel::new(5, 3);
        assert_eq!(carousel.prev(), 2);
        assert_eq!(carousel.next(), 0);
        assert_eq!(carousel.next(), 1);
        assert_eq!(carousel.prev(), 0);
    }

    #[test]
    fn carousel_visits_each_start_once_per_cycle() {
        for len in 0..8 {
            for page_size in 1..5 {
                let mut carousel = Carousel::new(len, page_size);
                let cycle = carousel.max_start() + 1;
                let mut seen = HashSet::new();
                for _ in 0..cycle {
                    assert!(seen.insert(carousel.index()), "len={len} page={page_size}");
                    assert!(carousel.visible().end <= len);
                    carousel.next();
                }
                assert_eq!(carousel.index(), 0);
            }
        }
    }

    #[test]
    fn short_roster_never_moves() {
        let mut carousel = Carousel::new(2, 3);
        assert_eq!(carousel.next(), 0);
        assert_eq!(carousel.prev(), 0);
        assert_eq!(carousel.visible(), 0..2);
    }

    #[test]
    fn search_matches_name_or_address() {
        let finder = LocationFinder::new();
        assert_eq!(finder.search(LocationKind::Hospital, "").len(), 3);
        let hits = finder.search(LocationKind::Hospital, "DOWNTOWN");
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].name, "Sarthi Emergency Center");
        let hits = finder.search(LocationKind::Booth, "mall");
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].services.len(), 4);
        assert!(finder.search(LocationKind::Booth, "hospital").is_empty());
    }

    #[test]
    fn directions_route_from_user() {
        let finder = LocationFinder::with_user_location(Coordinates { lat: 28.5, lng: 77.1 });
        let url = finder.directions_url(&HOSPITALS[1]).unwrap();
        assert_eq!(
            url.as_str(),
            "https://www.google.com/maps/dir/28.5,77.1/28.6129,77.208"
        );
    }

    #[test]
    fn directions_without_position_search_by_name() {
        let finder = LocationFinder::new();
        let url = finder.directions_url(&BOOTHS[0]).unwrap();
        assert_eq!(
            url.as_str(),
            "https://www.google.com/maps/search/Sarthi%20Booth%20-%20Central%20Plaza"
        );
    }

    #[test]
    fn failed_lookup_uses_default() {
        let mut finder = LocationFinder::new();
        let position = finder.locate(Err(Error::permission("location denied")));
        assert_eq!(position, DEFAULT_LOCATION);
        assert_eq!(finder.user_location(), Some(DEFAULT_LOCATION));
    }
}
