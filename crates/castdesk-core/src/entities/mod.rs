//! Typed entity schemas and their [`Resource`](crate::slice::Resource) bindings.
//!
//! Known fields are typed; anything else the server sends is kept in an
//! `extra` map so round-trips through update merges do not lose data.

pub mod admin;
pub mod broadcast;
pub mod customer;
pub mod template;

pub use admin::{Admin, AdminDraft, AdminPatch, Admins};
pub use broadcast::{Broadcast, BroadcastDraft, BroadcastExtras, BroadcastPatch, Broadcasts};
pub use customer::{Customer, CustomerDraft, CustomerPatch, Customers};
use serde::{Deserialize, Deserializer};
use serde_json::Value;
pub use template::{Template, TemplateDraft, TemplateExtras, TemplatePatch, Templates};

/// Entity identifier as issued by the server.
pub type EntityId = u64;

/// Accepts ids sent as numbers or numeric strings.
pub(crate) fn deserialize_id<'de, D>(deserializer: D) -> Result<EntityId, D::Error>
where
    D: Deserializer<'de>,
{
    match Value::deserialize(deserializer)? {
        Value::Number(n) => n
            .as_u64()
            .ok_or_else(|| serde::de::Error::custom(format!("invalid id {n}"))),
        Value::String(s) => s
            .trim()
            .parse::<EntityId>()
            .map_err(|e| serde::de::Error::custom(format!("invalid id {s:?}: {e}"))),
        other => Err(serde::de::Error::custom(format!("invalid id {other}"))),
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[derive(Debug, Deserialize)]
    struct Row {
        #[serde(deserialize_with = "deserialize_id")]
        id: EntityId,
    }

    #[test]
    fn test_id_accepts_numbers_and_numeric_strings() {
        let row: Row = serde_json::from_value(json!({ "id": 7 })).unwrap();
        assert_eq!(row.id, 7);
        let row: Row = serde_json::from_value(json!({ "id": " 8 " })).unwrap();
        assert_eq!(row.id, 8);
        assert!(serde_json::from_value::<Row>(json!({ "id": "x" })).is_err());
        assert!(serde_json::from_value::<Row>(json!({ "id": -1 })).is_err());
    }
}
