use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

use crate::coordinates::{normalize_coordinates, Coordinates};
use crate::domain::item::MovingItem;
use crate::domain::request::{PropertyDetails, RouteEndpoint};

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StopType {
    Pickup,
    Dropoff,
    #[default]
    Stop,
}

impl StopType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pickup => "pickup",
            Self::Dropoff => "dropoff",
            Self::Stop => "stop",
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct StopLocation {
    pub address: String,
    #[serde(default, deserialize_with = "crate::coordinates::deserialize_optional")]
    pub coordinates: Option<Coordinates>,
    pub unit_number: Option<String>,
    pub contact_name: Option<String>,
    pub contact_phone: Option<String>,
    pub instructions: Option<String>,
}

/// One node of a journey route.
///
/// Deserialization accepts every upstream coordinate shape (see
/// [`crate::coordinates`]); serialization always writes the canonical
/// `location.coordinates = {lat, lng}` form.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct JourneyStop {
    pub id: String,
    #[serde(rename = "type")]
    pub stop_type: StopType,
    pub location: StopLocation,
    #[serde(flatten)]
    pub property: PropertyDetails,
    pub sequence: usize,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub items: Vec<MovingItem>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub linked_items: Vec<String>,
}

impl JourneyStop {
    pub fn new(id: impl Into<String>, stop_type: StopType, location: StopLocation) -> Self {
        Self {
            id: id.into(),
            stop_type,
            location,
            property: PropertyDetails::default(),
            sequence: 0,
            items: Vec::new(),
            linked_items: Vec::new(),
        }
    }

    /// Builds a stop from the flat pickup/dropoff fields of a two-point request.
    pub fn from_endpoint(id: impl Into<String>, stop_type: StopType, endpoint: &RouteEndpoint) -> Self {
        Self {
            id: id.into(),
            stop_type,
            location: StopLocation {
                address: endpoint.address.clone(),
                coordinates: endpoint.coordinates,
                unit_number: endpoint.unit_number.clone(),
                contact_name: endpoint.contact_name.clone(),
                contact_phone: endpoint.contact_phone.clone(),
                instructions: endpoint.instructions.clone(),
            },
            property: endpoint.property.clone(),
            sequence: 0,
            items: Vec::new(),
            linked_items: Vec::new(),
        }
    }

    pub fn to_endpoint(&self) -> RouteEndpoint {
        RouteEndpoint {
            address: self.location.address.clone(),
            coordinates: self.location.coordinates,
            unit_number: self.location.unit_number.clone(),
            contact_name: self.location.contact_name.clone(),
            contact_phone: self.location.contact_phone.clone(),
            instructions: self.location.instructions.clone(),
            property: self.property.clone(),
        }
    }

    /// Ready for routing and display only with resolved coordinates.
    pub fn is_routable(&self) -> bool {
        self.location.coordinates.is_some()
    }

    /// Display label used in user-facing messages.
    pub fn label(&self) -> String {
        let address = self.location.address.trim();
        if address.is_empty() {
            format!("{} #{}", self.stop_type.as_str(), self.sequence + 1)
        } else {
            format!("{} ({address})", self.stop_type.as_str())
        }
    }
}

impl<'de> Deserialize<'de> for JourneyStop {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value = Value::deserialize(deserializer)?;
        let coordinates = normalize_coordinates(&value);
        let raw = RawJourneyStop::deserialize(&value).map_err(D::Error::custom)?;
        Ok(raw.into_stop(coordinates))
    }
}

#[derive(Deserialize)]
struct RawJourneyStop {
    #[serde(default)]
    id: Option<Value>,
    #[serde(rename = "type", default)]
    stop_type: StopType,
    #[serde(default)]
    location: Option<RawLocation>,
    #[serde(flatten)]
    property: PropertyDetails,
    #[serde(default)]
    sequence: usize,
    #[serde(default)]
    items: Vec<MovingItem>,
    #[serde(default)]
    linked_items: Vec<Value>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawLocation {
    Address(String),
    Detailed(RawStopLocation),
}

#[derive(Default, Deserialize)]
#[serde(default)]
struct RawStopLocation {
    address: String,
    unit_number: Option<String>,
    contact_name: Option<String>,
    contact_phone: Option<String>,
    instructions: Option<String>,
}

impl RawJourneyStop {
    fn into_stop(self, coordinates: Option<Coordinates>) -> JourneyStop {
        let location = match self.location {
            Some(RawLocation::Address(address)) => StopLocation { address, ..StopLocation::default() },
            Some(RawLocation::Detailed(raw)) => StopLocation {
                address: raw.address,
                coordinates: None,
                unit_number: raw.unit_number,
                contact_name: raw.contact_name,
                contact_phone: raw.contact_phone,
                instructions: raw.instructions,
            },
            None => StopLocation::default(),
        };

        JourneyStop {
            id: self.id.as_ref().and_then(id_string).unwrap_or_default(),
            stop_type: self.stop_type,
            location: StopLocation { coordinates, ..location },
            property: self.property,
            sequence: self.sequence,
            items: self.items,
            linked_items: self.linked_items.iter().filter_map(id_string).collect(),
        }
    }
}

fn id_string(value: &Value) -> Option<String> {
    match value {
        Value::String(raw) if !raw.is_empty() => Some(raw.clone()),
        Value::Number(number) => Some(number.to_string()),
        _ => None,
    }
}
