//! Journey stop model: index-addressed stop edits and reprojection between the
//! flat two-point route and the `journey_stops` sequence.
//!
//! Every mutating operation recomputes `sequence = index`, so callers never
//! have to keep the two in step themselves.

use crate::domain::item::MovingItem;
use crate::domain::request::{RequestType, RouteEndpoint, ServiceRequest};
use crate::domain::stop::{JourneyStop, StopType};
use crate::errors::DomainError;
use crate::identity::IdGenerator;

pub const STOP_ID_PREFIX: &str = "stop";

pub fn renumber(stops: &mut [JourneyStop]) {
    for (index, stop) in stops.iter_mut().enumerate() {
        stop.sequence = index;
    }
}

/// Appends a stop and returns its index.
pub fn add_stop(stops: &mut Vec<JourneyStop>, stop: JourneyStop) -> usize {
    stops.push(stop);
    renumber(stops);
    stops.len() - 1
}

pub fn update_stop(
    stops: &mut [JourneyStop],
    index: usize,
    stop: JourneyStop,
) -> Result<(), DomainError> {
    let len = stops.len();
    let slot = stops.get_mut(index).ok_or(DomainError::StopIndexOutOfRange { index, len })?;
    *slot = stop;
    renumber(stops);
    Ok(())
}

pub fn remove_stop(stops: &mut Vec<JourneyStop>, index: usize) -> Result<JourneyStop, DomainError> {
    if index >= stops.len() {
        return Err(DomainError::StopIndexOutOfRange { index, len: stops.len() });
    }
    let removed = stops.remove(index);
    renumber(stops);
    Ok(removed)
}

/// A fresh two-stop route built from the flat pickup/dropoff fields.
pub fn synthesize_from_flat(values: &ServiceRequest, ids: &dyn IdGenerator) -> Vec<JourneyStop> {
    let mut stops = vec![
        JourneyStop::from_endpoint(ids.next_id(STOP_ID_PREFIX), StopType::Pickup, &values.pickup),
        JourneyStop::from_endpoint(ids.next_id(STOP_ID_PREFIX), StopType::Dropoff, &values.dropoff),
    ];
    renumber(&mut stops);
    stops
}

/// Keeps an existing non-empty `journey_stops` array (renumbered) and only
/// synthesizes from the flat fields when it is empty.
pub fn derive_or_preserve(values: &ServiceRequest, ids: &dyn IdGenerator) -> Vec<JourneyStop> {
    if values.journey_stops.is_empty() {
        return synthesize_from_flat(values, ids);
    }
    let mut stops = values.journey_stops.clone();
    renumber(&mut stops);
    stops
}

/// The primary pickup and dropoff of a request, whichever representation it uses.
pub fn route_endpoints(values: &ServiceRequest) -> (RouteEndpoint, RouteEndpoint) {
    if !values.request_type.uses_journey_stops() {
        return (values.pickup.clone(), values.dropoff.clone());
    }

    let first_of = |stop_type: StopType, fallback: &RouteEndpoint| {
        values
            .journey_stops
            .iter()
            .find(|stop| stop.stop_type == stop_type)
            .map(JourneyStop::to_endpoint)
            .unwrap_or_else(|| fallback.clone())
    };
    (first_of(StopType::Pickup, &values.pickup), first_of(StopType::Dropoff, &values.dropoff))
}

/// Items for a stop: its own `items` when present, otherwise the moving items
/// its `linked_items` reference.
pub fn resolve_stop_items(stop: &JourneyStop, moving_items: &[MovingItem]) -> Vec<MovingItem> {
    if !stop.items.is_empty() {
        return stop.items.clone();
    }
    moving_items
        .iter()
        .filter(|item| item.id.as_ref().is_some_and(|id| stop.linked_items.contains(id)))
        .cloned()
        .collect()
}

pub fn first_unroutable(stops: &[JourneyStop]) -> Option<(usize, &JourneyStop)> {
    stops.iter().enumerate().find(|(_, stop)| !stop.is_routable())
}

#[derive(Clone, Debug, PartialEq)]
pub struct Reprojection {
    pub values: ServiceRequest,
    /// Stops dropped by a journey → two-point collapse, with their item links.
    pub discarded_stops: Vec<JourneyStop>,
}

impl Reprojection {
    pub fn is_lossy(&self) -> bool {
        !self.discarded_stops.is_empty()
    }
}

/// Reprojects the route when the request type changes.
///
/// Two-point → journey keeps an existing non-empty stop list, so repeated calls
/// never duplicate stops. Journey → two-point keeps the first pickup-typed and
/// the first dropoff-typed stop and reports every other stop as discarded.
pub fn switch_request_type(
    from: RequestType,
    to: RequestType,
    values: &ServiceRequest,
    ids: &dyn IdGenerator,
) -> Reprojection {
    let mut next = values.clone();
    next.request_type = to;

    match (from.uses_journey_stops(), to.uses_journey_stops()) {
        (false, true) => {
            next.journey_stops = derive_or_preserve(values, ids);
            Reprojection { values: next, discarded_stops: Vec::new() }
        }
        (true, false) => {
            let (kept, discarded_stops) = collapse(&values.journey_stops);
            for stop in &kept {
                match stop.stop_type {
                    StopType::Pickup => next.pickup = stop.to_endpoint(),
                    StopType::Dropoff => next.dropoff = stop.to_endpoint(),
                    StopType::Stop => {}
                }
            }
            next.journey_stops = kept;
            Reprojection { values: next, discarded_stops }
        }
        _ => Reprojection { values: next, discarded_stops: Vec::new() },
    }
}

fn collapse(stops: &[JourneyStop]) -> (Vec<JourneyStop>, Vec<JourneyStop>) {
    let pickup = stops.iter().position(|stop| stop.stop_type == StopType::Pickup);
    let dropoff = stops.iter().position(|stop| stop.stop_type == StopType::Dropoff);

    let mut kept: Vec<JourneyStop> =
        [pickup, dropoff].into_iter().flatten().map(|index| stops[index].clone()).collect();
    renumber(&mut kept);

    let discarded = stops
        .iter()
        .enumerate()
        .filter(|(index, _)| Some(*index) != pickup && Some(*index) != dropoff)
        .map(|(_, stop)| stop.clone())
        .collect();
    (kept, discarded)
}
