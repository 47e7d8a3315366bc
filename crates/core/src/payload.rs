//! Minimal per-step request bodies.
//!
//! Each step's body carries only what that step's endpoint accepts. Missing
//! numeric building fields fall back to `floor = 0`, `number_of_rooms = 1` and
//! `number_of_floors = 1`; strict downstream consumers reject nulls there.

use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};

use crate::coordinates::Coordinates;
use crate::domain::item::MovingItem;
use crate::domain::request::{PropertyDetails, RouteEndpoint, ServiceRequest};
use crate::domain::stop::{JourneyStop, StopType};
use crate::flows::BookingStep;
use crate::journey::{resolve_stop_items, route_endpoints};

pub const DEFAULT_FLOOR: i32 = 0;
pub const DEFAULT_NUMBER_OF_ROOMS: u32 = 1;
pub const DEFAULT_NUMBER_OF_FLOORS: u32 = 1;

/// How unresolved stop coordinates are written into a step 2 body.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CoordinatePolicy {
    /// Submission is blocked until every stop is resolved; bodies carry `null`.
    #[default]
    RequireResolved,
    /// Unresolved coordinates are written as `0` at submission time only.
    ZeroFillAtSubmission,
}

impl CoordinatePolicy {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::RequireResolved => "require_resolved",
            Self::ZeroFillAtSubmission => "zero_fill_at_submission",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "require_resolved" => Some(Self::RequireResolved),
            "zero_fill_at_submission" => Some(Self::ZeroFillAtSubmission),
            _ => None,
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct FormatOptions {
    pub coordinate_policy: CoordinatePolicy,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct StepPayload {
    pub step: BookingStep,
    pub body: Value,
}

impl StepPayload {
    pub fn contains_key(&self, key: &str) -> bool {
        self.body.get(key).is_some()
    }
}

pub fn format_payload(step: BookingStep, values: &ServiceRequest) -> StepPayload {
    format_payload_with(step, values, FormatOptions::default())
}

pub fn format_payload_with(
    step: BookingStep,
    values: &ServiceRequest,
    options: FormatOptions,
) -> StepPayload {
    let body = match step {
        BookingStep::Contact => contact_body(values),
        BookingStep::Locations => locations_body(values, options),
        BookingStep::Items => items_body(values),
        BookingStep::Schedule => schedule_body(values),
    };
    StepPayload { step, body }
}

fn contact_body(values: &ServiceRequest) -> Value {
    let mut body = Map::new();
    body.insert("request_type".into(), json!(values.request_type.as_str()));
    body.insert("contact_name".into(), json!(values.contact.contact_name.trim()));
    body.insert("contact_phone".into(), json!(values.contact.contact_phone.trim()));
    body.insert("contact_email".into(), json!(values.contact.contact_email.trim()));

    let (pickup, dropoff) = route_endpoints(values);
    flatten_endpoint(&mut body, "pickup", &pickup);
    flatten_endpoint(&mut body, "dropoff", &dropoff);
    Value::Object(body)
}

fn flatten_endpoint(body: &mut Map<String, Value>, prefix: &str, endpoint: &RouteEndpoint) {
    body.insert(format!("{prefix}_address"), json!(endpoint.address.trim()));
    body.insert(format!("{prefix}_unit_number"), json!(endpoint.unit_number));
    for (key, value) in property_fields(&endpoint.property) {
        body.insert(format!("{prefix}_{key}"), value);
    }
}

fn property_fields(property: &PropertyDetails) -> [(&'static str, Value); 6] {
    [
        ("floor", json!(property.floor.unwrap_or(DEFAULT_FLOOR))),
        ("has_elevator", json!(property.has_elevator)),
        ("parking_info", json!(property.parking_info)),
        ("property_type", json!(property.property_type)),
        ("number_of_rooms", json!(property.number_of_rooms.unwrap_or(DEFAULT_NUMBER_OF_ROOMS))),
        ("number_of_floors", json!(property.number_of_floors.unwrap_or(DEFAULT_NUMBER_OF_FLOORS))),
    ]
}

fn locations_body(values: &ServiceRequest, options: FormatOptions) -> Value {
    let stops: Vec<Value> = if values.request_type.uses_journey_stops() {
        values
            .journey_stops
            .iter()
            .enumerate()
            .map(|(index, stop)| {
                let items = resolve_stop_items(stop, &values.moving_items);
                stop_json(Some(&stop.id), stop.stop_type, &stop.to_endpoint(), index, &items, options)
            })
            .collect()
    } else {
        // Two-point requests always submit a fresh pair built from the flat
        // fields, whatever `journey_stops` currently holds.
        vec![
            stop_json(None, StopType::Pickup, &values.pickup, 0, &[], options),
            stop_json(None, StopType::Dropoff, &values.dropoff, 1, &[], options),
        ]
    };

    json!({
        "request_type": values.request_type.as_str(),
        "journey_stops": stops,
    })
}

fn stop_json(
    id: Option<&str>,
    stop_type: StopType,
    endpoint: &RouteEndpoint,
    sequence: usize,
    items: &[MovingItem],
    options: FormatOptions,
) -> Value {
    let (latitude, longitude) = submission_coordinates(endpoint.coordinates, options);
    let mut stop = Map::new();
    if let Some(id) = id {
        stop.insert("id".into(), json!(id));
    }
    stop.insert("type".into(), json!(stop_type.as_str()));
    stop.insert("sequence".into(), json!(sequence));
    stop.insert(
        "location".into(),
        json!({
            "address": endpoint.address.trim(),
            "latitude": latitude,
            "longitude": longitude,
            "unit_number": endpoint.unit_number,
            "contact_name": endpoint.contact_name,
            "contact_phone": endpoint.contact_phone,
            "instructions": endpoint.instructions,
        }),
    );
    for (key, value) in property_fields(&endpoint.property) {
        stop.insert(key.into(), value);
    }
    stop.insert("items".into(), Value::Array(items.iter().map(item_json).collect()));
    Value::Object(stop)
}

fn submission_coordinates(
    coordinates: Option<Coordinates>,
    options: FormatOptions,
) -> (Option<f64>, Option<f64>) {
    match (coordinates, options.coordinate_policy) {
        (Some(point), _) => (Some(point.lat), Some(point.lng)),
        (None, CoordinatePolicy::ZeroFillAtSubmission) => (Some(0.0), Some(0.0)),
        (None, CoordinatePolicy::RequireResolved) => (None, None),
    }
}

fn items_body(values: &ServiceRequest) -> Value {
    json!({
        "moving_items": values.moving_items.iter().map(item_json).collect::<Vec<_>>(),
        "insurance_required": values.commercial.insurance_required,
        "insurance_value": values.commercial.insurance_value,
    })
}

/// Business fields only; UI-only fields such as photo previews are dropped.
fn item_json(item: &MovingItem) -> Value {
    json!({
        "id": item.id,
        "name": item.name.trim(),
        "category_id": item.category_id,
        "quantity": item.quantity,
        "weight_kg": item.weight_kg,
        "dimensions": item.dimensions,
        "fragile": item.fragile,
        "needs_disassembly": item.needs_disassembly,
        "special_instructions": item.special_instructions,
    })
}

fn schedule_body(values: &ServiceRequest) -> Value {
    let schedule = &values.schedule;
    json!({
        "preferred_date": schedule.preferred_date.map(|date| date.format("%Y-%m-%d").to_string()),
        "time_slot": schedule.time_slot,
        "is_flexible": schedule.is_flexible,
        "priority": schedule.priority.as_str(),
    })
}

/// Keys of a step body, for logging.
pub fn body_keys(payload: &StepPayload) -> Vec<&str> {
    payload.body.as_object().map(|map| map.keys().map(String::as_str).collect()).unwrap_or_default()
}

/// Stops of a step 2 body, parsed back into the stop model.
pub fn stops_from_body(payload: &StepPayload) -> Vec<JourneyStop> {
    payload
        .body
        .get("journey_stops")
        .cloned()
        .and_then(|stops| serde_json::from_value(stops).ok())
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;
    use rust_decimal::Decimal;
    use serde_json::json;

    use super::{format_payload, format_payload_with, stops_from_body, CoordinatePolicy, FormatOptions};
    use crate::coordinates::Coordinates;
    use crate::domain::item::MovingItem;
    use crate::domain::request::{ContactDetails, RequestType, RouteEndpoint, ServiceRequest};
    use crate::domain::stop::{JourneyStop, StopLocation, StopType};
    use crate::flows::BookingStep;

    fn filled_values() -> ServiceRequest {
        let mut values = ServiceRequest {
            request_type: RequestType::Instant,
            contact: ContactDetails {
                contact_name: "Ada Lovelace".to_string(),
                contact_phone: "+44 20 7946 0000".to_string(),
                contact_email: "ada@example.com".to_string(),
            },
            pickup: RouteEndpoint {
                address: "1 Pickup Rd".to_string(),
                coordinates: Coordinates::new(51.5, -0.1),
                ..RouteEndpoint::default()
            },
            dropoff: RouteEndpoint {
                address: "2 Dropoff Ave".to_string(),
                coordinates: None,
                ..RouteEndpoint::default()
            },
            ..ServiceRequest::default()
        };
        values.moving_items.push(MovingItem {
            id: Some("i-1".to_string()),
            name: "Piano".to_string(),
            quantity: 1,
            weight_kg: Some(Decimal::new(2_500, 1)),
            fragile: true,
            photo_preview_url: Some("blob:local-preview".to_string()),
            ..MovingItem::default()
        });
        values.schedule.preferred_date = NaiveDate::from_ymd_opt(2026, 11, 2);
        values
    }

    #[test]
    fn contact_step_never_carries_stops_or_items() {
        let payload = format_payload(BookingStep::Contact, &filled_values());

        assert!(!payload.contains_key("journey_stops"));
        assert!(!payload.contains_key("moving_items"));
        assert_eq!(payload.body["contact_name"], "Ada Lovelace");
        assert_eq!(payload.body["pickup_address"], "1 Pickup Rd");
        assert_eq!(payload.body["pickup_floor"], 0);
        assert_eq!(payload.body["dropoff_number_of_rooms"], 1);
        assert_eq!(payload.body["dropoff_number_of_floors"], 1);
    }

    #[test]
    fn items_step_never_carries_contact_fields_or_ui_only_fields() {
        let payload = format_payload(BookingStep::Items, &filled_values());

        for key in ["contact_name", "contact_phone", "contact_email", "journey_stops"] {
            assert!(!payload.contains_key(key), "items body leaked {key}");
        }
        let item = &payload.body["moving_items"][0];
        assert_eq!(item["name"], "Piano");
        assert_eq!(item["fragile"], true);
        assert!(item.get("photo_preview_url").is_none());
    }

    #[test]
    fn instant_locations_overwrite_stale_stop_arrays() {
        let mut values = filled_values();
        values.journey_stops = vec![JourneyStop::new(
            "stale",
            StopType::Stop,
            StopLocation { address: "Old depot".to_string(), ..StopLocation::default() },
        )];

        let payload = format_payload(BookingStep::Locations, &values);
        let stops = payload.body["journey_stops"].as_array().expect("stop array");

        assert_eq!(stops.len(), 2);
        assert_eq!(stops[0]["type"], "pickup");
        assert_eq!(stops[0]["sequence"], 0);
        assert_eq!(stops[0]["location"]["address"], "1 Pickup Rd");
        assert_eq!(stops[1]["type"], "dropoff");
        assert_eq!(stops[1]["sequence"], 1);
        assert!(stops[1]["location"]["latitude"].is_null());
    }

    #[test]
    fn zero_fill_applies_only_under_the_submission_policy() {
        let payload = format_payload_with(
            BookingStep::Locations,
            &filled_values(),
            FormatOptions { coordinate_policy: CoordinatePolicy::ZeroFillAtSubmission },
        );
        let dropoff = &payload.body["journey_stops"][1]["location"];
        assert_eq!(dropoff["latitude"], json!(0.0));
        assert_eq!(dropoff["longitude"], json!(0.0));
    }

    #[test]
    fn journey_locations_carry_linked_items_per_stop() {
        let mut values = filled_values();
        values.request_type = RequestType::Journey;
        let mut pickup = JourneyStop::new(
            "s-1",
            StopType::Pickup,
            StopLocation {
                address: "A".to_string(),
                coordinates: Coordinates::new(1.0, 1.0),
                ..StopLocation::default()
            },
        );
        pickup.linked_items = vec!["i-1".to_string()];
        let dropoff = JourneyStop::new(
            "s-2",
            StopType::Dropoff,
            StopLocation { address: "B".to_string(), ..StopLocation::default() },
        );
        values.journey_stops = vec![pickup, dropoff];

        let payload = format_payload(BookingStep::Locations, &values);
        assert_eq!(payload.body["journey_stops"][0]["items"][0]["name"], "Piano");
        assert_eq!(payload.body["journey_stops"][1]["items"], json!([]));

        let parsed = stops_from_body(&payload);
        assert_eq!(parsed.len(), 2);
        assert_eq!(parsed[0].location.coordinates, Coordinates::new(1.0, 1.0));
        assert!(!parsed[1].is_routable());
    }

    #[test]
    fn schedule_step_is_scheduling_only() {
        let payload = format_payload(BookingStep::Schedule, &filled_values());
        let keys: Vec<_> = super::body_keys(&payload);

        assert_eq!(payload.body["preferred_date"], "2026-11-02");
        assert_eq!(keys.len(), 4);
        assert!(!payload.contains_key("moving_items"));
    }
}
