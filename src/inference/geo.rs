//! Geocoding rule: latitude and longitude triples for addresses
//!
//! Finds every `(place, location:address, address)` triple, asks a
//! [`Geocoder`] for the address's coordinates and records them as
//! `(address, location:lat, lat)` and `(address, location:lng, lng)`.

use super::{InferenceError, InferenceResult, InferenceRule};
use crate::graph::{Binding, Clause, Graph, Triple, Value};
use crate::query::QueryOptions;
use crate::storage::CallContext;
use serde::Deserialize;
use std::collections::HashSet;
use std::time::Duration;
use tracing::{info, warn};

pub const ADDRESS_PREDICATE: &str = "location:address";
pub const LAT_PREDICATE: &str = "location:lat";
pub const LNG_PREDICATE: &str = "location:lng";

/// A point on the globe
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Coordinates {
    pub lat: f64,
    pub lng: f64,
}

/// Resolves an address to coordinates.
///
/// Implementations report a refused request with
/// `InferenceError::QuotaExceeded`, which stops the rule.
pub trait Geocoder: Send + Sync {
    fn geocode(&self, address: &str) -> InferenceResult<Coordinates>;
}

impl<F> Geocoder for F
where
    F: Fn(&str) -> InferenceResult<Coordinates> + Send + Sync,
{
    fn geocode(&self, address: &str) -> InferenceResult<Coordinates> {
        self(address)
    }
}

#[derive(Debug, Deserialize)]
struct GoogleResponse {
    #[serde(default)]
    results: Vec<GoogleResult>,
    #[serde(default)]
    status: String,
}

#[derive(Debug, Deserialize)]
struct GoogleResult {
    geometry: GoogleGeometry,
}

#[derive(Debug, Deserialize)]
struct GoogleGeometry {
    location: GoogleLocation,
}

#[derive(Debug, Deserialize)]
struct GoogleLocation {
    lat: f64,
    lng: f64,
}

/// Extract the first result's location from a Google geocoding response.
pub fn parse_google_response(body: &[u8]) -> InferenceResult<Coordinates> {
    let response: GoogleResponse = serde_json::from_slice(body)?;
    if response.status == "OVER_QUERY_LIMIT" {
        return Err(InferenceError::QuotaExceeded);
    }
    let first = response
        .results
        .into_iter()
        .next()
        .ok_or(InferenceError::NoResults(response.status))?;
    Ok(Coordinates {
        lat: first.geometry.location.lat,
        lng: first.geometry.location.lng,
    })
}

/// Inference rule adding coordinates to addresses
pub struct GeoRule<G> {
    geocoder: G,
    throttle: Duration,
}

impl<G: Geocoder> GeoRule<G> {
    pub fn new(geocoder: G) -> Self {
        Self {
            geocoder,
            throttle: Duration::ZERO,
        }
    }

    /// Pause before each geocoder request.
    pub fn with_throttle(mut self, throttle: Duration) -> Self {
        self.throttle = throttle;
        self
    }
}

impl<G: Geocoder> InferenceRule for GeoRule<G> {
    fn name(&self) -> &str {
        "geo"
    }

    fn apply(&self, graph: &Graph, cx: &CallContext) -> InferenceResult<usize> {
        let clauses = vec![Clause::new("?placeid", ADDRESS_PREDICATE, "?address")];
        let found = graph.try_query(cx, &clauses, &QueryOptions::new())?;

        let mut seen: HashSet<String> = HashSet::new();
        let mut added = 0;

        for binding in found {
            if !seen.insert(binding.canonical_key()) {
                continue;
            }

            let triples = match self.derive_triples(&binding) {
                Ok(triples) => triples,
                Err(InferenceError::QuotaExceeded) => {
                    warn!(graph = graph.id(), "geocoder quota exceeded, stopping");
                    break;
                }
                Err(e) => {
                    warn!(graph = graph.id(), error = %e, "skipping address");
                    continue;
                }
            };

            match graph.add_many(cx, &triples) {
                Ok(inserted) => added += inserted,
                Err(e) => warn!(graph = graph.id(), error = %e, "failed to add coordinates"),
            }
        }

        info!(graph = graph.id(), added, "geo inference applied");
        Ok(added)
    }

    fn derive_triples(&self, args: &Binding) -> InferenceResult<Vec<Triple>> {
        if !matches!(args.get("placeid"), Some(Value::String(_))) {
            return Ok(Vec::new());
        }
        let address = args
            .get("address")
            .and_then(Value::as_str)
            .ok_or(InferenceError::MissingArgument("address"))?;

        if !self.throttle.is_zero() {
            std::thread::sleep(self.throttle);
        }
        let coordinates = self.geocoder.geocode(address)?;

        Ok(vec![
            Triple::new(address, LAT_PREDICATE, coordinates.lat),
            Triple::new(address, LNG_PREDICATE, coordinates.lng),
        ])
    }
}
