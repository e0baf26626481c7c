use std::collections::BTreeMap;
use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Outgoing request parameter map. Ordered so that built URLs and test
/// assertions are deterministic.
pub type RequestParams = BTreeMap<String, String>;

/// Backend identity of an entity. An empty value means "create new".
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EntityUuid(pub String);

impl EntityUuid {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    /// Fresh random identity, for records created client-side before the
    /// backend has assigned one.
    pub fn random() -> Self {
        Self(uuid::Uuid::new_v4().to_string())
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for EntityUuid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for EntityUuid {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuditInfo {
    pub date_created: Option<DateTime<Utc>>,
    pub creator: Option<String>,
    pub date_changed: Option<DateTime<Utc>>,
    pub changed_by: Option<String>,
}

/// Metadata describing one custom attribute a record type may carry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AttributeType {
    pub uuid: Option<EntityUuid>,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub format: Option<String>,
    #[serde(default)]
    pub foreign_key: Option<i64>,
    #[serde(default)]
    pub reg_exp: Option<String>,
    #[serde(default)]
    pub required: bool,
    #[serde(default)]
    pub attribute_order: Option<i32>,
    #[serde(default)]
    pub retired: bool,
}

/// A custom attribute value attached to a record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EntityAttribute {
    pub uuid: Option<EntityUuid>,
    pub attribute_type: Option<EntityUuid>,
    pub value: serde_json::Value,
    #[serde(default)]
    pub order: Option<i32>,
    #[serde(default)]
    pub voided: bool,
}

/// The generic domain record an entity screen edits. Screen-specific payload
/// fields ride along in `extra` untouched, so one record type serves every
/// screen built on the base controller.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EntityRecord {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub uuid: Option<EntityUuid>,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub retired: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub retire_reason: Option<String>,
    /// Transient marker set right before a purge call goes out.
    #[serde(default)]
    pub purge: bool,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub attributes: Vec<EntityAttribute>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub audit: Option<AuditInfo>,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

impl EntityRecord {
    pub fn uuid_str(&self) -> &str {
        self.uuid.as_ref().map(EntityUuid::as_str).unwrap_or("")
    }

    pub fn is_new(&self) -> bool {
        self.uuid_str().is_empty()
    }

    /// Attributes that have not been voided, in attribute order.
    pub fn active_attributes(&self) -> Vec<&EntityAttribute> {
        let mut active: Vec<&EntityAttribute> =
            self.attributes.iter().filter(|a| !a.voided).collect();
        active.sort_by_key(|a| a.order.unwrap_or(i32::MAX));
        active
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_uuid_means_new_record() {
        let record = EntityRecord::default();
        assert!(record.is_new());

        let existing = EntityRecord {
            uuid: Some(EntityUuid::from("abc-123")),
            ..Default::default()
        };
        assert!(!existing.is_new());
    }

    #[test]
    fn random_uuids_are_distinct_and_non_empty() {
        let a = EntityUuid::random();
        let b = EntityUuid::random();
        assert!(!a.is_empty());
        assert_ne!(a, b);
    }

    #[test]
    fn active_attributes_skip_voided_and_sort_by_order() {
        let attr = |order: Option<i32>, voided: bool| EntityAttribute {
            uuid: None,
            attribute_type: None,
            value: serde_json::Value::Null,
            order,
            voided,
        };
        let record = EntityRecord {
            attributes: vec![
                attr(Some(2), false),
                attr(Some(1), true),
                attr(Some(0), false),
            ],
            ..Default::default()
        };

        let active = record.active_attributes();
        assert_eq!(active.len(), 2);
        assert_eq!(active[0].order, Some(0));
        assert_eq!(active[1].order, Some(2));
    }

    #[test]
    fn unknown_payload_fields_survive_a_round_trip() {
        let payload = serde_json::json!({
            "uuid": "dep-9",
            "name": "Pharmacy",
            "retired": false,
            "location": "Building C"
        });
        let record: EntityRecord = serde_json::from_value(payload).expect("decode");
        assert_eq!(
            record.extra.get("location").and_then(|v| v.as_str()),
            Some("Building C")
        );

        let encoded = serde_json::to_value(&record).expect("encode");
        assert_eq!(
            encoded.get("location").and_then(|v| v.as_str()),
            Some("Building C")
        );
    }
}
