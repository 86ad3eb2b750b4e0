use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::{EntityId, deserialize_id};
use crate::slice::{Resource, Slice};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Template {
    #[serde(rename = "TID", deserialize_with = "deserialize_id")]
    pub id: EntityId,
    #[serde(rename = "TName", default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(rename = "TSubject", default, skip_serializing_if = "Option::is_none")]
    pub subject: Option<String>,
    #[serde(rename = "TContent", default, skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TemplateDraft {
    #[serde(rename = "TName")]
    pub name: String,
    #[serde(rename = "TSubject", skip_serializing_if = "Option::is_none")]
    pub subject: Option<String>,
    #[serde(rename = "TContent")]
    pub content: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TemplatePatch {
    #[serde(rename = "TName", default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(rename = "TSubject", default, skip_serializing_if = "Option::is_none")]
    pub subject: Option<String>,
    #[serde(rename = "TContent", default, skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TemplateExtras {
    /// Template picked in the broadcast composer.
    pub highlighted: Option<EntityId>,
}

#[derive(Debug, Clone, Copy)]
pub struct Templates;

impl Resource for Templates {
    type Entity = Template;
    type Id = EntityId;
    type Draft = TemplateDraft;
    type Patch = TemplatePatch;
    type Extras = TemplateExtras;

    const SINGULAR: &'static str = "template";
    const PLURAL: &'static str = "templates";
    const PATH: &'static str = "/templates";
    const LIST_KEY: &'static str = "templates";

    fn id(entity: &Template) -> EntityId {
        entity.id
    }
}

impl Slice<Templates> {
    pub fn set_highlighted(&self, id: Option<EntityId>) {
        self.with_state(|s| s.extras.highlighted = id);
    }

    pub fn highlighted(&self) -> Option<EntityId> {
        self.with_state(|s| s.extras.highlighted)
    }
}
