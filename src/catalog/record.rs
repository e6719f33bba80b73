//! Incoming catalog records.
//!
//! Records arrive as loosely-typed JSON. Parsing is lenient about scalar
//! types (numbers and booleans in text fields are coerced to strings) so that
//! validation, not deserialization, decides whether a record is usable.

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

/// Fields that must be present and non-blank for a record to be indexed.
pub const REQUIRED_FIELDS: [&str; 4] = ["name", "category", "industry", "shortDescription"];

/// A text field that may be sent as a single string or a list of strings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FieldText {
    /// Free-form text.
    Text(String),
    /// List of entries.
    List(Vec<String>),
}

impl FieldText {
    /// Human-readable rendering; list entries are joined with ", ".
    pub fn render(&self) -> String {
        match self {
            FieldText::Text(text) => text.clone(),
            FieldText::List(items) => items.join(", "),
        }
    }

    /// True when there is nothing but whitespace to render.
    pub fn is_blank(&self) -> bool {
        match self {
            FieldText::Text(text) => text.trim().is_empty(),
            FieldText::List(items) => items.iter().all(|i| i.trim().is_empty()),
        }
    }
}

/// One catalog entry describing an agent or tool.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Record {
    #[serde(default, deserialize_with = "lenient_string")]
    pub id: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub name: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub slug: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub category: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub industry: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub short_description: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub long_description: Option<String>,
    #[serde(default, deserialize_with = "lenient_text")]
    pub key_features: Option<FieldText>,
    #[serde(default, deserialize_with = "lenient_text")]
    pub use_cases: Option<FieldText>,
    #[serde(default, deserialize_with = "lenient_text")]
    pub tags: Option<FieldText>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub logo: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub logo_file_name: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub image: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub image_file_name: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub video: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub created_by: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub website: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub access: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub pricing_model: Option<String>,
    #[serde(default, deserialize_with = "lenient_i64")]
    pub upvotes: Option<i64>,
    #[serde(default, deserialize_with = "lenient_list")]
    pub upvoters: Option<Vec<Value>>,
    #[serde(default, deserialize_with = "lenient_bool")]
    pub approved: Option<bool>,
    #[serde(default, deserialize_with = "lenient_bool")]
    pub featured: Option<bool>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub version: Option<String>,
}

impl Record {
    /// Parse a record from a JSON value.
    pub fn from_value(value: Value) -> serde_json::Result<Self> {
        serde_json::from_value(value)
    }

    /// First required field that is missing or blank, if any.
    pub fn missing_required_field(&self) -> Option<&'static str> {
        let required = [
            &self.name,
            &self.category,
            &self.industry,
            &self.short_description,
        ];
        required
            .iter()
            .zip(REQUIRED_FIELDS)
            .find(|(value, _)| non_blank(value).is_none())
            .map(|(_, field)| field)
    }

    /// True when every required field is present and non-blank.
    pub fn is_valid(&self) -> bool {
        self.missing_required_field().is_none()
    }

    /// Slug, unless missing or blank.
    pub fn slug_key(&self) -> Option<&str> {
        non_blank(&self.slug)
    }
}

pub(crate) fn non_blank(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|v| !v.trim().is_empty())
}

fn scalar_to_string(value: Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::String(s) => Some(s),
        other => Some(other.to_string()),
    }
}

fn lenient_string<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<Value>::deserialize(deserializer)?.and_then(scalar_to_string))
}

fn lenient_text<'de, D>(deserializer: D) -> Result<Option<FieldText>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Option::<Value>::deserialize(deserializer)? {
        None | Some(Value::Null) => None,
        Some(Value::Array(items)) => Some(FieldText::List(
            items.into_iter().filter_map(scalar_to_string).collect(),
        )),
        Some(other) => scalar_to_string(other).map(FieldText::Text),
    })
}

fn lenient_i64<'de, D>(deserializer: D) -> Result<Option<i64>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Option::<Value>::deserialize(deserializer)? {
        Some(Value::Number(n)) => n.as_i64().or_else(|| n.as_f64().map(|f| f as i64)),
        Some(Value::String(s)) => s.trim().parse().ok(),
        _ => None,
    })
}

fn lenient_bool<'de, D>(deserializer: D) -> Result<Option<bool>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Option::<Value>::deserialize(deserializer)? {
        Some(Value::Bool(b)) => Some(b),
        Some(Value::String(s)) => match s.trim().to_ascii_lowercase().as_str() {
            "true" | "1" | "yes" => Some(true),
            "false" | "0" | "no" => Some(false),
            _ => None,
        },
        Some(Value::Number(n)) => n.as_f64().map(|f| f != 0.0),
        _ => None,
    })
}

fn lenient_list<'de, D>(deserializer: D) -> Result<Option<Vec<Value>>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Option::<Value>::deserialize(deserializer)? {
        None | Some(Value::Null) => None,
        Some(Value::Array(items)) => Some(items),
        Some(other) => Some(vec![other]),
    })
}
