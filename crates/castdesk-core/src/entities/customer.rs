use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::{EntityId, deserialize_id};
use crate::slice::{DeleteRoute, Resource};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Customer {
    #[serde(rename = "CusID", deserialize_with = "deserialize_id")]
    pub id: EntityId,
    #[serde(rename = "CusName", default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(rename = "CusEmail", default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(rename = "CusPhone", default, skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(rename = "CusLevel", default, skip_serializing_if = "Option::is_none")]
    pub level: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CustomerDraft {
    #[serde(rename = "CusName")]
    pub name: String,
    #[serde(rename = "CusEmail")]
    pub email: String,
    #[serde(rename = "CusPhone", skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(rename = "CusLevel", skip_serializing_if = "Option::is_none")]
    pub level: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CustomerPatch {
    #[serde(rename = "CusName", default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(rename = "CusEmail", default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(rename = "CusPhone", default, skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(rename = "CusLevel", default, skip_serializing_if = "Option::is_none")]
    pub level: Option<String>,
}

/// Customer records. Levels are filtered through `selectedLevel`; deletes
/// are soft (`PUT /customers/delete/{id}`).
#[derive(Debug, Clone, Copy)]
pub struct Customers;

impl Resource for Customers {
    type Entity = Customer;
    type Id = EntityId;
    type Draft = CustomerDraft;
    type Patch = CustomerPatch;
    type Extras = ();

    const SINGULAR: &'static str = "customer";
    const PLURAL: &'static str = "customers";
    const PATH: &'static str = "/customers";
    const LIST_KEY: &'static str = "customers";
    const TAG_PARAM: &'static str = "selectedLevel";

    fn id(entity: &Customer) -> EntityId {
        entity.id
    }

    fn delete_route(id: &EntityId) -> DeleteRoute {
        DeleteRoute::Put(format!("{}/delete/{id}", Self::PATH))
    }

    // `{"customer": [ {...} ]}`
    fn unwrap_detail(body: Value) -> Option<Value> {
        match body {
            Value::Object(mut map) => match map.remove("customer")? {
                Value::Array(rows) => rows.into_iter().next(),
                single @ Value::Object(_) => Some(single),
                _ => None,
            },
            _ => None,
        }
    }
}
