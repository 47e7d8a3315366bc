use std::fmt;

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::coordinates::Coordinates;
use crate::domain::item::MovingItem;
use crate::domain::stop::JourneyStop;

#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct RequestId(pub String);

impl fmt::Display for RequestId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RequestType {
    #[default]
    Instant,
    Journey,
    Biddable,
}

impl RequestType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Instant => "instant",
            Self::Journey => "journey",
            Self::Biddable => "biddable",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "instant" => Some(Self::Instant),
            "journey" => Some(Self::Journey),
            "biddable" => Some(Self::Biddable),
            _ => None,
        }
    }

    /// Journey requests carry their route as `journey_stops`; the other types
    /// keep a flat pickup/dropoff pair.
    pub fn uses_journey_stops(&self) -> bool {
        matches!(self, Self::Journey)
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ContactDetails {
    pub contact_name: String,
    pub contact_phone: String,
    pub contact_email: String,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PropertyDetails {
    pub floor: Option<i32>,
    pub has_elevator: bool,
    pub parking_info: Option<String>,
    pub property_type: Option<String>,
    pub number_of_rooms: Option<u32>,
    pub number_of_floors: Option<u32>,
}

/// The flat pickup or dropoff side of a two-point request.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RouteEndpoint {
    pub address: String,
    #[serde(default, deserialize_with = "crate::coordinates::deserialize_optional")]
    pub coordinates: Option<Coordinates>,
    pub unit_number: Option<String>,
    pub contact_name: Option<String>,
    pub contact_phone: Option<String>,
    pub instructions: Option<String>,
    #[serde(flatten)]
    pub property: PropertyDetails,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Priority {
    #[default]
    Standard,
    Express,
}

impl Priority {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Standard => "standard",
            Self::Express => "express",
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Schedule {
    pub preferred_date: Option<NaiveDate>,
    pub time_slot: Option<String>,
    pub is_flexible: bool,
    pub priority: Priority,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Commercial {
    pub selected_price: Option<Decimal>,
    pub staff_count: Option<u32>,
    pub base_price: Option<Decimal>,
    pub final_price: Option<Decimal>,
    pub insurance_required: bool,
    pub insurance_value: Option<Decimal>,
}

/// The booking aggregate, as edited across the four steps.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServiceRequest {
    pub id: Option<RequestId>,
    pub request_type: RequestType,
    #[serde(flatten)]
    pub contact: ContactDetails,
    pub pickup: RouteEndpoint,
    pub dropoff: RouteEndpoint,
    pub journey_stops: Vec<JourneyStop>,
    pub moving_items: Vec<MovingItem>,
    pub schedule: Schedule,
    pub commercial: Commercial,
}

impl ServiceRequest {
    /// Folds a successful step response into the form values.
    ///
    /// Only keys present in the response are applied, read in the same flat
    /// shape the step bodies use. The server owns the computed commercial
    /// fields, so any it returns replace local ones. Returned stops and items
    /// keep local data the server left out (coordinates, item links, photo
    /// previews).
    pub fn merge_server_response(&mut self, data: &Value) {
        if let Some(id) = request_id_from(data) {
            self.id = Some(id);
        }
        if let Some(request_type) = data.get("request_type").and_then(Value::as_str).and_then(RequestType::parse) {
            self.request_type = request_type;
        }

        let contact = &mut self.contact;
        for (key, slot) in [
            ("contact_name", &mut contact.contact_name),
            ("contact_phone", &mut contact.contact_phone),
            ("contact_email", &mut contact.contact_email),
        ] {
            if let Some(value) = non_empty_str(data, key) {
                *slot = value.to_string();
            }
        }

        merge_endpoint(&mut self.pickup, data, "pickup");
        merge_endpoint(&mut self.dropoff, data, "dropoff");

        if self.request_type.uses_journey_stops() {
            if let Some(stops) = data.get("journey_stops").and_then(|raw| Vec::<JourneyStop>::deserialize(raw).ok()) {
                self.journey_stops = merge_stops(std::mem::take(&mut self.journey_stops), stops);
            }
        }
        if let Some(items) = data.get("moving_items").and_then(|raw| Vec::<MovingItem>::deserialize(raw).ok()) {
            self.moving_items = merge_items(std::mem::take(&mut self.moving_items), items);
        }

        let schedule = &mut self.schedule;
        if let Some(date) = non_empty_str(data, "preferred_date").and_then(|raw| raw.parse::<NaiveDate>().ok()) {
            schedule.preferred_date = Some(date);
        }
        if let Some(slot) = non_empty_str(data, "time_slot") {
            schedule.time_slot = Some(slot.to_string());
        }
        if let Some(flexible) = data.get("is_flexible").and_then(Value::as_bool) {
            schedule.is_flexible = flexible;
        }

        let commercial = &mut self.commercial;
        for (key, slot) in [
            ("base_price", &mut commercial.base_price),
            ("final_price", &mut commercial.final_price),
            ("selected_price", &mut commercial.selected_price),
        ] {
            if let Some(value) = data.get(key).and_then(decimal_from_value) {
                *slot = Some(value);
            }
        }

        if let Some(staff) = data.get("staff_count").and_then(Value::as_u64) {
            commercial.staff_count = u32::try_from(staff).ok();
        }
    }
}

fn non_empty_str<'a>(data: &'a Value, key: &str) -> Option<&'a str> {
    data.get(key).and_then(Value::as_str).map(str::trim).filter(|value| !value.is_empty())
}

fn merge_endpoint(endpoint: &mut RouteEndpoint, data: &Value, prefix: &str) {
    if let Some(address) = non_empty_str(data, &format!("{prefix}_address")) {
        endpoint.address = address.to_string();
    }
    if let Some(unit) = non_empty_str(data, &format!("{prefix}_unit_number")) {
        endpoint.unit_number = Some(unit.to_string());
    }
}

fn merge_stops(local: Vec<JourneyStop>, returned: Vec<JourneyStop>) -> Vec<JourneyStop> {
    returned
        .into_iter()
        .enumerate()
        .map(|(index, mut stop)| {
            if let Some(previous) = local.get(index) {
                if stop.location.coordinates.is_none() {
                    stop.location.coordinates = previous.location.coordinates;
                }
                if stop.linked_items.is_empty() {
                    stop.linked_items = previous.linked_items.clone();
                }
                if stop.items.is_empty() {
                    stop.items = previous.items.clone();
                }
            }
            stop.sequence = index;
            stop
        })
        .collect()
}

fn merge_items(local: Vec<MovingItem>, returned: Vec<MovingItem>) -> Vec<MovingItem> {
    returned
        .into_iter()
        .enumerate()
        .map(|(index, mut item)| {
            if item.photo_preview_url.is_none() {
                item.photo_preview_url = local.get(index).and_then(|previous| previous.photo_preview_url.clone());
            }
            item
        })
        .collect()
}

/// Reads the request id a create or step endpoint returned, accepting either
/// `request_id` or `id`, as a string or a number.
pub fn request_id_from(data: &Value) -> Option<RequestId> {
    ["request_id", "id"].iter().find_map(|key| match data.get(*key)? {
        Value::String(raw) if !raw.trim().is_empty() => Some(RequestId(raw.trim().to_string())),
        Value::Number(number) => Some(RequestId(number.to_string())),
        _ => None,
    })
}

pub(crate) fn decimal_from_value(value: &Value) -> Option<Decimal> {
    match value {
        Value::String(raw) => raw.trim().parse::<Decimal>().ok(),
        Value::Number(number) => number.to_string().parse::<Decimal>().ok(),
        _ => None,
    }
}
