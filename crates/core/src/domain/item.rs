use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Dimensions {
    pub length_cm: Decimal,
    pub width_cm: Decimal,
    pub height_cm: Decimal,
}

/// One inventory line of a move.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MovingItem {
    pub id: Option<String>,
    pub name: String,
    pub category_id: Option<String>,
    pub quantity: u32,
    pub weight_kg: Option<Decimal>,
    pub dimensions: Option<Dimensions>,
    pub fragile: bool,
    pub needs_disassembly: bool,
    pub special_instructions: Option<String>,
    /// Local preview of an uploaded photo. Never leaves the client.
    pub photo_preview_url: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemCategory {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommonItem {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub category_id: Option<String>,
    #[serde(default)]
    pub weight_kg: Option<Decimal>,
    #[serde(default)]
    pub dimensions: Option<Dimensions>,
}

impl CommonItem {
    /// Starts an inventory line prefilled from a catalog entry.
    pub fn to_moving_item(&self, quantity: u32) -> MovingItem {
        MovingItem {
            id: None,
            name: self.name.clone(),
            category_id: self.category_id.clone(),
            quantity,
            weight_kg: self.weight_kg,
            dimensions: self.dimensions.clone(),
            ..MovingItem::default()
        }
    }
}
