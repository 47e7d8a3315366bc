//! Canonical coordinates and the shape parser for upstream stop payloads.
//!
//! Upstream integrations describe a stop's position in one of three shapes:
//!
//! - a nested tuple, `{"location": {"coordinates": [lat, lng]}}`
//! - a root-level tuple, `{"coordinates": [lat, lng]}`
//! - discrete fields, `{"location": {"latitude": lat, "longitude": lng}}`
//!   (or the same two fields at the root of the stop)
//!
//! [`CoordinateShape::detect`] picks the first shape present, in that order, and
//! [`CoordinateShape::normalize`] is the only place that turns any of them into
//! [`Coordinates`]. A shape that is present but unparseable or half-filled yields
//! `None`; it never falls back to `(0, 0)`.

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    pub lat: f64,
    pub lng: f64,
}

impl Coordinates {
    /// Builds a position only when both values are finite, in range, and not the
    /// `(0, 0)` placeholder some integrations emit for "unknown".
    pub fn new(lat: f64, lng: f64) -> Option<Self> {
        let finite = lat.is_finite() && lng.is_finite();
        let in_range = (-90.0..=90.0).contains(&lat) && (-180.0..=180.0).contains(&lng);
        let placeholder = lat == 0.0 && lng == 0.0;
        (finite && in_range && !placeholder).then_some(Self { lat, lng })
    }
}

/// Where a stop's coordinates were found.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum CoordinateShape<'a> {
    NestedTuple(&'a Value),
    RootTuple(&'a Value),
    Discrete { latitude: Option<&'a Value>, longitude: Option<&'a Value> },
    Absent,
}

impl<'a> CoordinateShape<'a> {
    pub fn detect(stop: &'a Value) -> Self {
        let location = stop.get("location").filter(|value| value.is_object());

        if let Some(nested) = location.and_then(|loc| present(loc.get("coordinates"))) {
            return Self::NestedTuple(nested);
        }
        if let Some(root) = present(stop.get("coordinates")) {
            return Self::RootTuple(root);
        }

        for holder in [location, Some(stop)].into_iter().flatten() {
            let latitude = present(holder.get("latitude"));
            let longitude = present(holder.get("longitude"));
            if latitude.is_some() || longitude.is_some() {
                return Self::Discrete { latitude, longitude };
            }
        }

        Self::Absent
    }

    pub fn normalize(&self) -> Option<Coordinates> {
        match self {
            Self::NestedTuple(value) | Self::RootTuple(value) => parse_pair(value),
            Self::Discrete { latitude: Some(lat), longitude: Some(lng) } => {
                Coordinates::new(parse_number(lat)?, parse_number(lng)?)
            }
            Self::Discrete { .. } | Self::Absent => None,
        }
    }
}

/// Normalizes any accepted stop shape to canonical coordinates.
pub fn normalize_coordinates(stop: &Value) -> Option<Coordinates> {
    CoordinateShape::detect(stop).normalize()
}

/// Field deserializer for `Option<Coordinates>`. Accepts a `[lat, lng]` tuple
/// or a `{lat, lng}` object and maps anything unusable to `None`.
pub fn deserialize_optional<'de, D>(deserializer: D) -> Result<Option<Coordinates>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(value.as_ref().and_then(parse_pair))
}

fn present(value: Option<&Value>) -> Option<&Value> {
    value.filter(|value| !value.is_null())
}

/// A coordinate pair is either a `[lat, lng]` tuple or an object carrying
/// `lat`/`lng` (the canonical form written back by this crate).
fn parse_pair(value: &Value) -> Option<Coordinates> {
    match value {
        Value::Array(items) if items.len() == 2 => {
            Coordinates::new(parse_number(&items[0])?, parse_number(&items[1])?)
        }
        Value::Object(map) => {
            let lat = map.get("lat").or_else(|| map.get("latitude"))?;
            let lng = map.get("lng").or_else(|| map.get("longitude"))?;
            Coordinates::new(parse_number(lat)?, parse_number(lng)?)
        }
        _ => None,
    }
}

fn parse_number(value: &Value) -> Option<f64> {
    match value {
        Value::Number(number) => number.as_f64(),
        Value::String(raw) => raw.trim().parse::<f64>().ok(),
        _ => None,
    }
}
