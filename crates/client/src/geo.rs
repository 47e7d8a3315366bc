//! Geocoding and routing are unreliable third-party dependencies. Nothing here
//! propagates their failures: a stop that cannot be geocoded keeps
//! `coordinates = None`, and a route that cannot be planned falls back to the
//! straight line through the stops that do have coordinates.

use async_trait::async_trait;
use thiserror::Error;
use tracing::warn;

use movemate_core::coordinates::Coordinates;
use movemate_core::domain::stop::JourneyStop;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum GeoError {
    #[error("geocoding failed: {0}")]
    Geocoding(String),
    #[error("routing failed: {0}")]
    Routing(String),
}

#[async_trait]
pub trait Geocoder: Send + Sync {
    /// `Ok(None)` means the service answered but found nothing usable.
    async fn geocode(&self, address: &str) -> Result<Option<Coordinates>, GeoError>;
}

#[async_trait]
pub trait RouteProvider: Send + Sync {
    /// Ordered polyline from the first waypoint to the last.
    async fn route(&self, waypoints: &[Coordinates]) -> Result<Vec<Coordinates>, GeoError>;
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RouteSource {
    Provider,
    StraightLine,
}

#[derive(Clone, Debug, PartialEq)]
pub struct RoutePreview {
    pub polyline: Vec<Coordinates>,
    pub source: RouteSource,
    /// Indexes of stops left off the map because they have no coordinates.
    pub skipped_stops: Vec<usize>,
}

/// Sets the stop's coordinates from its address. Returns whether the stop is
/// now routable. Any earlier coordinates are cleared first, so a changed
/// address never keeps a stale position.
pub async fn geocode_stop<G>(geocoder: &G, stop: &mut JourneyStop) -> bool
where
    G: Geocoder + ?Sized,
{
    stop.location.coordinates = None;
    let address = stop.location.address.trim();
    if address.is_empty() {
        return false;
    }

    match geocoder.geocode(address).await {
        Ok(Some(found)) => {
            stop.location.coordinates = Coordinates::new(found.lat, found.lng);
        }
        Ok(None) => {
            warn!(event_name = "geo.geocode.empty", stop_id = %stop.id, "address did not resolve");
        }
        Err(error) => {
            warn!(event_name = "geo.geocode.failed", stop_id = %stop.id, error = %error, "geocoding failed");
        }
    }
    stop.is_routable()
}

/// Polyline through the routable stops, in sequence order.
pub async fn plan_route<R>(router: &R, stops: &[JourneyStop]) -> RoutePreview
where
    R: RouteProvider + ?Sized,
{
    let mut waypoints = Vec::with_capacity(stops.len());
    let mut skipped_stops = Vec::new();
    for (index, stop) in stops.iter().enumerate() {
        match stop.location.coordinates {
            Some(point) => waypoints.push(point),
            None => skipped_stops.push(index),
        }
    }

    if waypoints.len() < 2 {
        return RoutePreview { polyline: waypoints, source: RouteSource::StraightLine, skipped_stops };
    }

    match router.route(&waypoints).await {
        Ok(polyline) if polyline.len() >= 2 => {
            RoutePreview { polyline, source: RouteSource::Provider, skipped_stops }
        }
        Ok(_) => {
            warn!(event_name = "geo.route.empty", waypoints = waypoints.len(), "routing returned no path");
            RoutePreview { polyline: waypoints, source: RouteSource::StraightLine, skipped_stops }
        }
        Err(error) => {
            warn!(event_name = "geo.route.failed", error = %error, "routing failed, using straight line");
            RoutePreview { polyline: waypoints, source: RouteSource::StraightLine, skipped_stops }
        }
    }
}

#[cfg(test)]
mod tests {
    use async_trait::async_trait;

    use movemate_core::coordinates::Coordinates;
    use movemate_core::domain::stop::{JourneyStop, StopLocation, StopType};

    use super::{geocode_stop, plan_route, GeoError, Geocoder, RouteProvider, RouteSource};

    struct FixedGeocoder(Result<Option<Coordinates>, GeoError>);

    #[async_trait]
    impl Geocoder for FixedGeocoder {
        async fn geocode(&self, _address: &str) -> Result<Option<Coordinates>, GeoError> {
            self.0.clone()
        }
    }

    struct FailingRouter;

    #[async_trait]
    impl RouteProvider for FailingRouter {
        async fn route(&self, _waypoints: &[Coordinates]) -> Result<Vec<Coordinates>, GeoError> {
            Err(GeoError::Routing("timeout".to_string()))
        }
    }

    struct DetourRouter;

    #[async_trait]
    impl RouteProvider for DetourRouter {
        async fn route(&self, waypoints: &[Coordinates]) -> Result<Vec<Coordinates>, GeoError> {
            let mut path = waypoints.to_vec();
            path.insert(1, Coordinates { lat: 51.0, lng: 0.5 });
            Ok(path)
        }
    }

    fn stop(address: &str, coordinates: Option<Coordinates>) -> JourneyStop {
        let location =
            StopLocation { address: address.to_string(), coordinates, ..StopLocation::default() };
        JourneyStop::new("s", StopType::Stop, location)
    }

    fn point(lat: f64, lng: f64) -> Option<Coordinates> {
        Some(Coordinates { lat, lng })
    }

    #[tokio::test]
    async fn geocoding_failures_leave_coordinates_unset() {
        let mut resolved = stop("1 High St", point(1.0, 1.0));
        let failing = FixedGeocoder(Err(GeoError::Geocoding("quota".to_string())));
        assert!(!geocode_stop(&failing, &mut resolved).await);
        assert_eq!(resolved.location.coordinates, None);

        let null_island = FixedGeocoder(Ok(point(0.0, 0.0)));
        let mut placeholder = stop("Nowhere", None);
        assert!(!geocode_stop(&null_island, &mut placeholder).await);
        assert_eq!(placeholder.location.coordinates, None);

        let found = FixedGeocoder(Ok(point(51.5, -0.1)));
        let mut good = stop("10 Downing St", None);
        assert!(geocode_stop(&found, &mut good).await);
        assert_eq!(good.location.coordinates, point(51.5, -0.1));
    }

    #[tokio::test]
    async fn routing_failure_falls_back_to_straight_line_through_resolved_stops() {
        let stops = vec![
            stop("A", point(51.5, -0.1)),
            stop("B", None),
            stop("C", point(52.2, 0.1)),
        ];

        let preview = plan_route(&FailingRouter, &stops).await;
        assert_eq!(preview.source, RouteSource::StraightLine);
        assert_eq!(preview.polyline.len(), 2);
        assert_eq!(preview.skipped_stops, vec![1]);

        let routed = plan_route(&DetourRouter, &stops).await;
        assert_eq!(routed.source, RouteSource::Provider);
        assert_eq!(routed.polyline.len(), 3);
    }
}
