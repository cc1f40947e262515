//! Adapter options — tag ids and the event-name → transaction-id mapping,
//! loaded from the environment / config file or supplied directly by the
//! host runtime.

use std::collections::btree_map::Entry;
use std::collections::BTreeMap;
use std::fmt;

use serde::de::{self, Deserializer, MapAccess, SeqAccess, Visitor};
use serde::Deserialize;

use adtag_core::{RelayError, RelayResult};

/// Options for the Twitter Ads adapter.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TwitterAdsOptions {
    /// Transaction id fired for plain page views (empty ⇒ page pixel off).
    #[serde(default)]
    pub page: String,
    /// Universal tag pixel id (empty ⇒ legacy pixel mode).
    #[serde(default)]
    pub universal_tag_pixel_id: String,
    /// Event-name → transaction-id mapping for track calls.
    #[serde(default)]
    pub events: EventMappings,
}

impl TwitterAdsOptions {
    /// Load options from `ADTAG_RELAY__...` environment variables and an
    /// optional config file.
    pub fn load(config_path: Option<&str>) -> Result<Self, config::ConfigError> {
        let mut builder = config::Config::builder();
        if let Some(path) = config_path {
            builder = builder.add_source(config::File::with_name(path));
        }
        let settings = builder
            .add_source(
                config::Environment::with_prefix("ADTAG_RELAY")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;
        settings.try_deserialize()
    }

    /// Whether the universal tag mode is configured.
    pub fn uses_universal_tag(&self) -> bool {
        !self.universal_tag_pixel_id.is_empty()
    }

    /// True when at least one dispatch path can ever fire.
    pub fn any_path_enabled(&self) -> bool {
        !self.page.is_empty() || self.uses_universal_tag() || !self.events.is_empty()
    }
}

/// Normalized event-name → transaction-id mapping.
///
/// Accepts two configuration shapes — a keyed object
/// (`{"signup": "c36462a3"}`) or an array of `{key, value}` pairs — and
/// normalizes both into one case-sensitive map at deserialization time.
/// Mapping values may be non-string JSON scalars; they are coerced to the
/// string that ends up in the pixel URL. Duplicate keys are rejected rather
/// than silently overwritten.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EventMappings {
    entries: BTreeMap<String, String>,
}

impl EventMappings {
    /// Build a mapping from `(name, transaction id)` pairs, rejecting
    /// duplicate names.
    pub fn try_from_pairs<K, V>(pairs: impl IntoIterator<Item = (K, V)>) -> RelayResult<Self>
    where
        K: Into<String>,
        V: Into<String>,
    {
        let mut mappings = Self::default();
        for (key, value) in pairs {
            mappings
                .insert(key.into(), value.into())
                .map_err(RelayError::Config)?;
        }
        Ok(mappings)
    }

    /// Resolve a generic event name to its vendor transaction id.
    /// Case-sensitive exact match; resolution is pure map membership, so
    /// names that only exist as built-in method names ("toString") never
    /// match anything.
    pub fn resolve(&self, event_name: &str) -> Option<&str> {
        self.entries.get(event_name).map(String::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    fn insert(&mut self, key: String, value: String) -> Result<(), String> {
        match self.entries.entry(key) {
            Entry::Occupied(occupied) => {
                Err(format!("duplicate event mapping key `{}`", occupied.key()))
            }
            Entry::Vacant(vacant) => {
                vacant.insert(value);
                Ok(())
            }
        }
    }
}

/// One entry of the array configuration shape.
#[derive(Debug, Deserialize)]
struct MappingPair {
    key: String,
    value: serde_json::Value,
}

fn scalar_to_string(value: &serde_json::Value) -> Option<String> {
    match value {
        serde_json::Value::String(s) => Some(s.clone()),
        serde_json::Value::Number(n) => Some(n.to_string()),
        serde_json::Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

impl<'de> Deserialize<'de> for EventMappings {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        deserializer.deserialize_any(MappingsVisitor)
    }
}

struct MappingsVisitor;

impl<'de> Visitor<'de> for MappingsVisitor {
    type Value = EventMappings;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("an event-name map or an array of {key, value} pairs")
    }

    fn visit_map<A>(self, mut access: A) -> Result<Self::Value, A::Error>
    where
        A: MapAccess<'de>,
    {
        let mut mappings = EventMappings::default();
        while let Some((key, value)) = access.next_entry::<String, serde_json::Value>()? {
            let value = scalar_to_string(&value).ok_or_else(|| {
                de::Error::custom(format!(
                    "mapping value for `{key}` must be a string, number, or bool"
                ))
            })?;
            mappings.insert(key, value).map_err(de::Error::custom)?;
        }
        Ok(mappings)
    }

    fn visit_seq<A>(self, mut access: A) -> Result<Self::Value, A::Error>
    where
        A: SeqAccess<'de>,
    {
        let mut mappings = EventMappings::default();
        while let Some(pair) = access.next_element::<MappingPair>()? {
            let value = scalar_to_string(&pair.value).ok_or_else(|| {
                de::Error::custom(format!(
                    "mapping value for `{}` must be a string, number, or bool",
                    pair.key
                ))
            })?;
            mappings.insert(pair.key, value).map_err(de::Error::custom)?;
        }
        Ok(mappings)
    }
}
