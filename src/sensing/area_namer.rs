//! Human-readable area labels for coordinates.
//!
//! Lookups are best effort: the tracking loop must always be able to persist
//! a complete sample, so every failure collapses into [`UNKNOWN_LOCATION`].

use std::{sync::Arc, time::Duration};

use anyhow::{bail, Context, Result};
use async_trait::async_trait;
use serde::Deserialize;

use crate::geometry::Coordinate;

const ENABLE_LOGS: bool = true;

use crate::{log_debug, log_warn};

pub const UNKNOWN_LOCATION: &str = "Unknown Location";

const LOOKUP_TIMEOUT: Duration = Duration::from_secs(10);
const GOOGLE_GEOCODE_ENDPOINT: &str = "https://maps.googleapis.com/maps/api/geocode/json";

/// Address component types tried first, most specific first.
const AREA_TYPES: [&str; 3] = ["sublocality_level_1", "sublocality", "neighborhood"];
const LOCALITY_TYPES: [&str; 1] = ["locality"];

/// Reverse-geocoding capability. `Ok(None)` means the service answered but
/// had nothing usable.
#[async_trait]
pub trait PlaceNameService: Send + Sync {
    async fn reverse_geocode(&self, coordinate: Coordinate) -> Result<Option<String>>;
}

pub struct AreaNamer {
    service: Option<Arc<dyn PlaceNameService>>,
    timeout: Duration,
}

impl AreaNamer {
    pub fn new(service: Arc<dyn PlaceNameService>) -> Self {
        Self {
            service: Some(service),
            timeout: LOOKUP_TIMEOUT,
        }
    }

    /// Namer with no backing service; every label is [`UNKNOWN_LOCATION`].
    pub fn disabled() -> Self {
        Self {
            service: None,
            timeout: LOOKUP_TIMEOUT,
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub async fn resolve_area_label(&self, coordinate: Coordinate) -> String {
        let Some(service) = &self.service else {
            return UNKNOWN_LOCATION.to_string();
        };

        match tokio::time::timeout(self.timeout, service.reverse_geocode(coordinate)).await {
            Ok(Ok(Some(label))) if !label.trim().is_empty() => {
                log_debug!("area label resolved: {label}");
                label.trim().to_string()
            }
            Ok(Ok(_)) => UNKNOWN_LOCATION.to_string(),
            Ok(Err(err)) => {
                log_warn!("reverse geocode failed: {err:#}");
                UNKNOWN_LOCATION.to_string()
            }
            Err(_) => {
                log_warn!("reverse geocode timed out after {:?}", self.timeout);
                UNKNOWN_LOCATION.to_string()
            }
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct GeocodeResponse {
    pub status: String,
    #[serde(default)]
    pub results: Vec<GeocodeResult>,
}

#[derive(Debug, Deserialize)]
pub struct GeocodeResult {
    #[serde(default)]
    pub address_components: Vec<AddressComponent>,
}

#[derive(Debug, Deserialize)]
pub struct AddressComponent {
    pub long_name: String,
    #[serde(default)]
    pub types: Vec<String>,
}

/// Neighbourhood-level name if any result has one, otherwise the city.
pub fn pick_area_label(response: &GeocodeResponse) -> Option<String> {
    if response.status != "OK" {
        return None;
    }
    first_component_of(response, &AREA_TYPES).or_else(|| first_component_of(response, &LOCALITY_TYPES))
}

fn first_component_of(response: &GeocodeResponse, wanted: &[&str]) -> Option<String> {
    response
        .results
        .iter()
        .flat_map(|result| result.address_components.iter())
        .find(|component| {
            component
                .types
                .iter()
                .any(|kind| wanted.contains(&kind.as_str()))
        })
        .map(|component| component.long_name.clone())
}

/// Google Geocoding API client.
pub struct GoogleGeocoder {
    client: reqwest::Client,
    api_key: String,
    endpoint: String,
}

impl GoogleGeocoder {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            api_key: api_key.into(),
            endpoint: GOOGLE_GEOCODE_ENDPOINT.to_string(),
        }
    }

    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into();
        self
    }
}

#[async_trait]
impl PlaceNameService for GoogleGeocoder {
    async fn reverse_geocode(&self, coordinate: Coordinate) -> Result<Option<String>> {
        let latlng = format!("{},{}", coordinate.latitude, coordinate.longitude);

        let response = self
            .client
            .get(&self.endpoint)
            .query(&[("latlng", latlng.as_str()), ("key", self.api_key.as_str())])
            .send()
            .await
            .context("geocode request failed")?;

        if !response.status().is_success() {
            bail!("geocode request returned HTTP {}", response.status());
        }

        let body: GeocodeResponse = response
            .json()
            .await
            .context("geocode response was not valid JSON")?;

        Ok(pick_area_label(&body))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct FixedService(Result<Option<String>, String>);

    #[async_trait]
    impl PlaceNameService for FixedService {
        async fn reverse_geocode(&self, _coordinate: Coordinate) -> Result<Option<String>> {
            match &self.0 {
                Ok(label) => Ok(label.clone()),
                Err(message) => bail!("{message}"),
            }
        }
    }

    struct StalledService;

    #[async_trait]
    impl PlaceNameService for StalledService {
        async fn reverse_geocode(&self, _coordinate: Coordinate) -> Result<Option<String>> {
            std::future::pending().await
        }
    }

    fn namer(result: Result<Option<String>, String>) -> AreaNamer {
        AreaNamer::new(Arc::new(FixedService(result)))
    }

    fn spot() -> Coordinate {
        Coordinate::new(13.0418, 80.2341)
    }

    #[tokio::test]
    async fn test_label_passes_through() {
        let label = namer(Ok(Some(" T. Nagar ".into()))).resolve_area_label(spot()).await;
        assert_eq!(label, "T. Nagar");
    }

    #[tokio::test]
    async fn test_failures_become_unknown() {
        assert_eq!(namer(Ok(None)).resolve_area_label(spot()).await, UNKNOWN_LOCATION);
        assert_eq!(namer(Ok(Some("  ".into()))).resolve_area_label(spot()).await, UNKNOWN_LOCATION);
        assert_eq!(
            namer(Err("quota exceeded".into())).resolve_area_label(spot()).await,
            UNKNOWN_LOCATION
        );
        assert_eq!(AreaNamer::disabled().resolve_area_label(spot()).await, UNKNOWN_LOCATION);
    }

    #[tokio::test(start_paused = true)]
    async fn test_slow_lookup_times_out() {
        let namer = AreaNamer::new(Arc::new(StalledService)).with_timeout(Duration::from_secs(2));
        assert_eq!(namer.resolve_area_label(spot()).await, UNKNOWN_LOCATION);
    }

    fn response(json: &str) -> GeocodeResponse {
        serde_json::from_str(json).unwrap()
    }

    #[test]
    fn test_prefers_sublocality_over_locality() {
        let body = response(
            r#"{
                "status": "OK",
                "results": [
                    {"address_components": [
                        {"long_name": "Chennai", "types": ["locality", "political"]}
                    ]},
                    {"address_components": [
                        {"long_name": "600017", "types": ["postal_code"]},
                        {"long_name": "T. Nagar", "types": ["sublocality_level_1", "sublocality", "political"]}
                    ]}
                ]
            }"#,
        );
        assert_eq!(pick_area_label(&body).as_deref(), Some("T. Nagar"));
    }

    #[test]
    fn test_falls_back_to_locality() {
        let body = response(
            r#"{"status": "OK", "results": [{"address_components": [
                {"long_name": "Chennai", "types": ["locality"]}
            ]}]}"#,
        );
        assert_eq!(pick_area_label(&body).as_deref(), Some("Chennai"));
    }

    #[test]
    fn test_non_ok_status_has_no_label() {
        let body = response(r#"{"status": "ZERO_RESULTS", "results": []}"#);
        assert_eq!(pick_area_label(&body), None);
        let body = response(r#"{"status": "REQUEST_DENIED"}"#);
        assert_eq!(pick_area_label(&body), None);
    }
}
