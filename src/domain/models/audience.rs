use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use uuid::Uuid;

use crate::domain::value_objects::NormalizedEmail;

/// Identifiers starting with this marker name a form whose submissions are
/// scanned for leads. Everything else is a static contact list id.
pub const LEAD_SOURCE_PREFIX: &str = "form_";

pub type Attributes = BTreeMap<String, String>;

/// Resolved audience keyed by canonical address.
pub type Audience = BTreeMap<NormalizedEmail, Recipient>;

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", content = "id", rename_all = "snake_case")]
pub enum AudienceSource {
    StaticList(String),
    DerivedLead(String),
}

impl AudienceSource {
    pub fn parse(raw: &str) -> Self {
        match raw.strip_prefix(LEAD_SOURCE_PREFIX) {
            Some(form_name) => AudienceSource::DerivedLead(form_name.to_string()),
            None => AudienceSource::StaticList(raw.to_string()),
        }
    }

    pub fn parse_all<S: AsRef<str>>(raw: &[S]) -> Vec<Self> {
        raw.iter().map(|id| Self::parse(id.as_ref())).collect()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Contact {
    pub id: Uuid,
    pub project_id: Uuid,
    pub list_id: String,
    pub email: String,
    pub name: Option<String>,
    pub custom_fields: Map<String, Value>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Form {
    pub id: Uuid,
    pub project_id: Uuid,
    pub name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FormSubmission {
    pub id: Uuid,
    pub form_id: Uuid,
    pub data: Map<String, Value>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Recipient {
    pub email: NormalizedEmail,
    pub attributes: Attributes,
}

impl Recipient {
    pub fn new(email: NormalizedEmail) -> Self {
        Self {
            email,
            attributes: Attributes::new(),
        }
    }

    pub fn name(&self) -> Option<&str> {
        self.attributes.get("name").map(String::as_str)
    }

    /// Overlays `incoming` onto the current attributes. A non-empty `name`
    /// survives an incoming empty one.
    pub fn absorb(&mut self, incoming: Attributes) {
        for (key, value) in incoming {
            if key == "name"
                && value.is_empty()
                && self.name().is_some_and(|name| !name.is_empty())
            {
                continue;
            }
            self.attributes.insert(key, value);
        }
    }
}

/// String form of a stored field value as it appears in rendered content.
pub fn attribute_value(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => n.to_string(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn attrs(pairs: &[(&str, &str)]) -> Attributes {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn prefixed_ids_are_lead_sources() {
        assert_eq!(
            AudienceSource::parse("form_Newsletter signup"),
            AudienceSource::DerivedLead("Newsletter signup".to_string())
        );
        assert_eq!(
            AudienceSource::parse("list-42"),
            AudienceSource::StaticList("list-42".to_string())
        );
    }

    #[test]
    fn prefix_match_is_case_sensitive() {
        assert_eq!(
            AudienceSource::parse("Form_contact"),
            AudienceSource::StaticList("Form_contact".to_string())
        );
    }

    #[test]
    fn absorb_keeps_existing_name_over_empty_one() {
        let mut recipient = Recipient::new(NormalizedEmail::parse("x@y.z").unwrap());
        recipient.absorb(attrs(&[("name", "Ann"), ("city", "Oslo")]));
        recipient.absorb(attrs(&[("name", ""), ("city", "Bergen")]));

        assert_eq!(recipient.name(), Some("Ann"));
        assert_eq!(recipient.attributes["city"], "Bergen");
    }

    #[test]
    fn absorb_replaces_name_with_non_empty_one() {
        let mut recipient = Recipient::new(NormalizedEmail::parse("x@y.z").unwrap());
        recipient.absorb(attrs(&[("name", "Ann")]));
        recipient.absorb(attrs(&[("name", "Annie")]));

        assert_eq!(recipient.name(), Some("Annie"));
    }

    #[test]
    fn absorb_fills_empty_name() {
        let mut recipient = Recipient::new(NormalizedEmail::parse("x@y.z").unwrap());
        recipient.absorb(attrs(&[("name", "")]));
        recipient.absorb(attrs(&[("name", "Bob")]));

        assert_eq!(recipient.name(), Some("Bob"));
    }

    #[test]
    fn attribute_values_are_stringified() {
        assert_eq!(attribute_value(&json!(null)), "");
        assert_eq!(attribute_value(&json!("text")), "text");
        assert_eq!(attribute_value(&json!(42)), "42");
        assert_eq!(attribute_value(&json!(true)), "true");
        assert_eq!(attribute_value(&json!(["a", "b"])), r#"["a","b"]"#);
    }
}
