use std::fmt;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::Value;

/// Identifier as sent by the clinic API: `_id` or `id`, string or number.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RecordId(String);

impl RecordId {

    pub fn new(value: impl Into<String>) -> Self {
        RecordId(value.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    fn as_number(&self) -> Option<i64> {
        if !self.0.is_empty() && self.0.chars().all(|c| c.is_ascii_digit()) {
            self.0.parse::<i64>().ok()
        } else {
            None
        }
    }
}

impl fmt::Display for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for RecordId {
    fn from(value: &str) -> Self {
        RecordId(value.to_string())
    }
}

impl Serialize for RecordId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self.as_number() {
            Some(number) => serializer.serialize_i64(number),
            None => serializer.serialize_str(&self.0),
        }
    }
}

impl<'de> Deserialize<'de> for RecordId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        match Value::deserialize(deserializer)? {
            Value::String(text) => Ok(RecordId(text)),
            Value::Number(number) => Ok(RecordId(number.to_string())),
            other => Err(serde::de::Error::custom(format!("invalid record id: {}", other))),
        }
    }
}

/// `_id` first, then `id`.
pub fn pick_id<'a>(id: &'a Option<RecordId>, object_id: &'a Option<RecordId>) -> Option<&'a RecordId> {
    object_id.as_ref().or(id.as_ref())
}

/// Treats missing, `null` and blank-string values as `None`.
pub fn blank_as_none<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned,
{
    match Option::<Value>::deserialize(deserializer)? {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(text)) if text.trim().is_empty() => Ok(None),
        Some(value) => serde_json::from_value(value)
            .map(Some)
            .map_err(serde::de::Error::custom),
    }
}

pub fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// Reference embedded by the API in citas and historiales. Either a populated
/// `{ "nombre": ... }` object or a bare id.
#[derive(Serialize, Clone, Debug, Default, PartialEq)]
pub struct NamedRef {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<RecordId>,
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    pub object_id: Option<RecordId>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub nombre: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub especie: Option<String>,
}

#[derive(Deserialize)]
struct PopulatedRef {
    #[serde(default)]
    id: Option<RecordId>,
    #[serde(rename = "_id", default)]
    object_id: Option<RecordId>,
    #[serde(default, deserialize_with = "blank_as_none")]
    nombre: Option<String>,
    #[serde(default, deserialize_with = "blank_as_none")]
    especie: Option<String>,
}

impl<'de> Deserialize<'de> for NamedRef {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        match Value::deserialize(deserializer)? {
            Value::Object(map) => {
                let populated: PopulatedRef = serde_json::from_value(Value::Object(map))
                    .map_err(serde::de::Error::custom)?;
                Ok(NamedRef {
                    id: populated.id,
                    object_id: populated.object_id,
                    nombre: populated.nombre,
                    especie: populated.especie,
                })
            },
            Value::String(id) => Ok(NamedRef { id: Some(RecordId(id)), ..Default::default() }),
            Value::Number(id) => Ok(NamedRef { id: Some(RecordId(id.to_string())), ..Default::default() }),
            other => Err(serde::de::Error::custom(format!("invalid reference: {}", other))),
        }
    }
}

impl NamedRef {

    pub fn record_id(&self) -> Option<&RecordId> {
        pick_id(&self.id, &self.object_id)
    }
}
