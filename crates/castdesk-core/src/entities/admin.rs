use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::{EntityId, deserialize_id};
use crate::slice::Resource;

/// Console operator account.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Admin {
    #[serde(rename = "AID", deserialize_with = "deserialize_id")]
    pub id: EntityId,
    #[serde(rename = "AUsername", default, skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    #[serde(rename = "AEmail", default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(rename = "ARole", default, skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AdminDraft {
    #[serde(rename = "AEmail")]
    pub email: String,
    #[serde(rename = "AUsername")]
    pub username: String,
    #[serde(rename = "APassword")]
    pub password: String,
    #[serde(rename = "ARole", skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AdminPatch {
    #[serde(rename = "AEmail", default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(rename = "ARole", default, skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
}

/// Listing body key is the singular `admin`.
#[derive(Debug, Clone, Copy)]
pub struct Admins;

impl Resource for Admins {
    type Entity = Admin;
    type Id = EntityId;
    type Draft = AdminDraft;
    type Patch = AdminPatch;
    type Extras = ();

    const SINGULAR: &'static str = "admin";
    const PLURAL: &'static str = "admins";
    const PATH: &'static str = "/admins";
    const LIST_KEY: &'static str = "admin";

    fn id(entity: &Admin) -> EntityId {
        entity.id
    }
}
