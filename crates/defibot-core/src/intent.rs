//! Intents, entities, and recognition results.
//!
//! An [`Intent`] is one of the five DeFi actions the assistant understands.
//! Each intent declares the entity fields it needs before it can be
//! confirmed; [`Entities`] holds whatever values have been gathered so far.

use serde::de::{self, Deserializer};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

/// The closed set of actions a user utterance can map to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Intent {
    CreatePool,
    CreateToken,
    JoinPool,
    QueryInfo,
    GeneralHelp,
}

impl Intent {
    pub const ALL: [Intent; 5] = [
        Intent::CreatePool,
        Intent::CreateToken,
        Intent::JoinPool,
        Intent::QueryInfo,
        Intent::GeneralHelp,
    ];

    /// Wire name used in prompts, JSON and logs.
    pub fn as_str(&self) -> &'static str {
        match self {
            Intent::CreatePool => "create_pool",
            Intent::CreateToken => "create_token",
            Intent::JoinPool => "join_pool",
            Intent::QueryInfo => "query_info",
            Intent::GeneralHelp => "general_help",
        }
    }

    /// Fields that must be present before the intent can be confirmed,
    /// in the order they are asked for.
    pub fn required_fields(&self) -> &'static [&'static str] {
        match self {
            Intent::CreatePool => &["token1", "token2", "apy"],
            Intent::CreateToken => &["token_name", "supply"],
            Intent::JoinPool => &["pool_id"],
            Intent::QueryInfo => &["entity_type", "entity_id"],
            Intent::GeneralHelp => &[],
        }
    }

    /// First required field with no usable value in `entities`.
    pub fn first_missing(&self, entities: &Entities) -> Option<&'static str> {
        self.required_fields()
            .iter()
            .copied()
            .find(|field| !entities.is_present(field))
    }
}

impl fmt::Display for Intent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown intent `{0}`")]
pub struct UnknownIntent(pub String);

impl FromStr for Intent {
    type Err = UnknownIntent;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Intent::ALL
            .into_iter()
            .find(|intent| intent.as_str() == s)
            .ok_or_else(|| UnknownIntent(s.to_string()))
    }
}

/// Entity values keyed by field name.
///
/// A field counts as present only when it holds a non-blank string.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct Entities(BTreeMap<String, Option<String>>);

impl Entities {
    pub fn new() -> Self {
        Self::default()
    }

    /// Value of `field`, if present and non-blank.
    pub fn get(&self, field: &str) -> Option<&str> {
        self.0
            .get(field)
            .and_then(|v| v.as_deref())
            .filter(|v| !v.trim().is_empty())
    }

    pub fn is_present(&self, field: &str) -> bool {
        self.get(field).is_some()
    }

    pub fn set(&mut self, field: impl Into<String>, value: Option<String>) {
        self.0.insert(field.into(), value);
    }

    pub fn with(mut self, field: &str, value: &str) -> Self {
        self.set(field, Some(value.to_string()));
        self
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Keep only the fields `intent` declares.
    pub fn restricted_to(&self, intent: Intent) -> Entities {
        let mut out = Entities::new();
        for field in intent.required_fields() {
            if let Some(value) = self.0.get(*field) {
                out.set(*field, value.clone());
            }
        }
        out
    }
}

impl<'de> Deserialize<'de> for Entities {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = BTreeMap::<String, serde_json::Value>::deserialize(deserializer)?;
        let mut entities = Entities::new();
        for (field, value) in raw {
            let text = match value {
                serde_json::Value::Null => None,
                serde_json::Value::String(s) => Some(s),
                serde_json::Value::Number(n) => Some(n.to_string()),
                serde_json::Value::Bool(b) => Some(b.to_string()),
                other => {
                    return Err(de::Error::custom(format!(
                        "entity `{field}` must be a string, got {other}"
                    )))
                }
            };
            entities.set(field, text);
        }
        Ok(entities)
    }
}

/// Output of an intent recognizer.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Recognition {
    #[serde(default, deserialize_with = "deserialize_intent")]
    pub intent: Option<Intent>,
    #[serde(default)]
    pub entities: Entities,
}

impl Recognition {
    pub fn new(intent: Intent, entities: Entities) -> Self {
        Self {
            intent: Some(intent),
            entities,
        }
    }

    /// No intent recognized.
    pub fn none() -> Self {
        Self::default()
    }
}

/// Accepts a known intent name, `null`, `""` or `"none"`.
fn deserialize_intent<'de, D>(deserializer: D) -> Result<Option<Intent>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<String>::deserialize(deserializer)?;
    match raw.as_deref().map(str::trim) {
        None | Some("") | Some("none") | Some("null") => Ok(None),
        Some(name) => name.parse().map(Some).map_err(de::Error::custom),
    }
}
