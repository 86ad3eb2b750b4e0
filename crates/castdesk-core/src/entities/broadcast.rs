use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::{debug, warn};

use super::{EntityId, deserialize_id};
use crate::error::{FetchError, MutationError};
use crate::slice::{Resource, Slice};

pub const DEFAULT_BROADCAST_NAME: &str = "Untitled Broadcast";
pub const TAGS_FAILED: &str = "Failed to fetch tags";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Broadcast {
    #[serde(rename = "BID", deserialize_with = "deserialize_id")]
    pub id: EntityId,
    #[serde(rename = "BName", default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(rename = "BTag", default, skip_serializing_if = "Option::is_none")]
    pub tag: Option<String>,
    #[serde(rename = "BStatus", default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    /// Who last touched the broadcast.
    #[serde(rename = "BUpdate", default, skip_serializing_if = "Option::is_none")]
    pub updated_by: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Broadcast {
    /// Drafts and scheduled broadcasts can still be edited.
    pub fn is_editable(&self) -> bool {
        matches!(self.status.as_deref(), Some("Draft" | "Schedule"))
    }
}

/// In-progress broadcast composition. Doubles as the create payload.
///
/// Missing fields take their [`Default`] values when deserializing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct BroadcastDraft {
    pub recipient_title: String,
    pub selected_level: Option<String>,
    pub email: String,
    pub tag: String,
    pub blacklist: String,
    pub recipient_everyone: String,
    pub content_name: String,
    pub selected_template: Option<EntityId>,
    pub broadcast_name: String,
    pub from_name: String,
    /// Scheduled send time as the server expects it (`YYYY-MM-DD HH:MM:SS`).
    #[serde(rename = "sqlDate")]
    pub scheduled_at: Option<String>,
}

impl Default for BroadcastDraft {
    fn default() -> Self {
        Self {
            recipient_title: String::new(),
            selected_level: None,
            email: String::new(),
            tag: String::new(),
            blacklist: String::new(),
            recipient_everyone: String::new(),
            content_name: String::new(),
            selected_template: None,
            broadcast_name: DEFAULT_BROADCAST_NAME.to_string(),
            from_name: String::new(),
            scheduled_at: None,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BroadcastPatch {
    #[serde(rename = "BName", default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(rename = "BTag", default, skip_serializing_if = "Option::is_none")]
    pub tag: Option<String>,
    #[serde(rename = "BStatus", default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
}

/// Broadcast-only state: filter tag choices and the composition draft.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BroadcastExtras {
    pub available_tags: Vec<String>,
    pub tags_loading: bool,
    pub draft: BroadcastDraft,
}

#[derive(Debug, Clone, Copy)]
pub struct Broadcasts;

impl Resource for Broadcasts {
    type Entity = Broadcast;
    type Id = EntityId;
    type Draft = BroadcastDraft;
    type Patch = BroadcastPatch;
    type Extras = BroadcastExtras;

    const SINGULAR: &'static str = "broadcast";
    const PLURAL: &'static str = "broadcasts";
    const PATH: &'static str = "/broadcasts";
    const LIST_KEY: &'static str = "broadcasts";

    fn id(entity: &Broadcast) -> EntityId {
        entity.id
    }
}

#[derive(Debug, Default, Deserialize)]
struct FilterTagsBody {
    #[serde(rename = "BTags", default)]
    tags: Vec<FilterTag>,
}

#[derive(Debug, Deserialize)]
struct FilterTag {
    #[serde(rename = "BTag")]
    tag: String,
}

impl Slice<Broadcasts> {
    /// Loads the tag choices offered by the broadcast filter.
    ///
    /// A failure is recorded as the list error.
    ///
    /// # Errors
    /// Returns an error if the request fails or the body has the wrong shape.
    pub async fn fetch_filter_tags(&self) -> Result<Vec<String>, FetchError> {
        self.with_state(|s| s.extras.tags_loading = true);
        let result = self
            .api()
            .get_json::<Option<FilterTagsBody>>("/filtertags", &[])
            .await
            .map(|body| {
                body.unwrap_or_default()
                    .tags
                    .into_iter()
                    .map(|t| t.tag)
                    .collect::<Vec<_>>()
            })
            .map_err(|e| FetchError::from_api(e, TAGS_FAILED));

        self.with_state(|s| {
            s.extras.tags_loading = false;
            match &result {
                Ok(tags) => s.extras.available_tags.clone_from(tags),
                Err(err) => s.set_list_error(err.message.clone()),
            }
        });
        match &result {
            Ok(tags) => debug!(count = tags.len(), "filter tags loaded"),
            Err(err) => warn!("filter tags failed: {}", err.source),
        }
        result
    }

    pub fn draft(&self) -> BroadcastDraft {
        self.with_state(|s| s.extras.draft.clone())
    }

    /// Edits the composition draft in place.
    pub fn edit_draft(&self, f: impl FnOnce(&mut BroadcastDraft)) {
        self.with_state(|s| f(&mut s.extras.draft));
    }

    pub fn reset_draft(&self) {
        self.with_state(|s| s.extras.draft = BroadcastDraft::default());
    }

    /// Submits the current draft as a new broadcast.
    ///
    /// # Errors
    /// Returns an error if the create request fails.
    pub async fn create_from_draft(&self) -> Result<Broadcast, MutationError> {
        let draft = self.draft();
        self.create(&draft).await
    }
}
