use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::debug;

use movemate_core::domain::item::{CommonItem, ItemCategory};

use crate::endpoints;
use crate::transport::{expect_success, ApiError, ApiRequest, ApiTransport, TransportError};

/// Read-only lookups that feed the item step.
pub struct CatalogClient<T> {
    transport: T,
}

impl<T> CatalogClient<T>
where
    T: ApiTransport,
{
    pub fn new(transport: T) -> Self {
        Self { transport }
    }

    pub async fn item_categories(&self) -> Result<Vec<ItemCategory>, ApiError> {
        let categories = self.fetch(endpoints::ITEM_CATEGORIES, &["id"]).await?;
        debug!(event_name = "catalog.categories.loaded", count = categories.len(), "item categories loaded");
        Ok(categories)
    }

    pub async fn common_items(&self) -> Result<Vec<CommonItem>, ApiError> {
        let items = self.fetch(endpoints::COMMON_ITEMS, &["id", "category_id"]).await?;
        debug!(event_name = "catalog.common_items.loaded", count = items.len(), "common items loaded");
        Ok(items)
    }

    async fn fetch<E: DeserializeOwned>(&self, path: &str, id_keys: &[&str]) -> Result<Vec<E>, ApiError> {
        let body = expect_success(&self.transport, ApiRequest::get(path)).await?;
        list_entries(body)
            .into_iter()
            .map(|mut entry| {
                stringify_ids(&mut entry, id_keys);
                serde_json::from_value(entry)
                    .map_err(|error| ApiError::Transport(TransportError::Decode(error.to_string())))
            })
            .collect()
    }
}

/// Accepts a bare array or a paginated `{results: [...]}` envelope.
pub(crate) fn list_entries(body: Value) -> Vec<Value> {
    match body {
        Value::Array(entries) => entries,
        Value::Object(mut fields) => match fields.remove("results") {
            Some(Value::Array(entries)) => entries,
            _ => Vec::new(),
        },
        _ => Vec::new(),
    }
}

/// Numeric ids become strings so they fit the string-typed id fields.
pub(crate) fn stringify_ids(value: &mut Value, keys: &[&str]) {
    let Some(fields) = value.as_object_mut() else {
        return;
    };
    for key in keys {
        if let Some(Value::Number(number)) = fields.get(*key) {
            let text = number.to_string();
            fields.insert((*key).to_string(), Value::String(text));
        }
    }
}
