//! Generic async resource state: list, pagination, filters, detail and CRUD.
//!
//! [`SliceState`] is the pure reducer; [`Slice`] is the async handle that
//! issues requests and feeds results back through the reducer.

mod handle;
pub mod request;
mod state;

use std::fmt;

use chrono::{DateTime, Utc};
pub use handle::Slice;
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
pub use request::ListTicket;
pub use state::{Collection, EditState, SliceSnapshot, SliceState};
use tracing::warn;

use crate::api::ApiError;

/// Which operation a fallback message is for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    List,
    Detail,
    Create,
    Update,
    Delete,
}

/// How an entity is deleted on the server.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeleteRoute {
    /// `DELETE <path>`
    Delete(String),
    /// `PUT <path>` with no body (soft delete)
    Put(String),
}

/// Describes one entity type served by the API.
pub trait Resource: Send + Sync + 'static {
    type Entity: Clone + fmt::Debug + Serialize + DeserializeOwned + Send + Sync + 'static;
    type Id: Clone + PartialEq + fmt::Debug + fmt::Display + Send + Sync + 'static;
    /// Create payload.
    type Draft: Serialize + Send + Sync;
    /// Update payload. Unset fields must serialize as absent or null.
    type Patch: Serialize + Send + Sync;
    /// Per-entity state beyond the generic list/detail pair.
    type Extras: Default + Clone + fmt::Debug + Send + 'static;

    /// Singular noun used in messages (`customer`).
    const SINGULAR: &'static str;
    /// Plural noun used in messages (`customers`).
    const PLURAL: &'static str;
    /// Collection path (`/customers`).
    const PATH: &'static str;
    /// Key of the entity array in a list response body.
    const LIST_KEY: &'static str;
    /// Wire name of the tag dimension.
    const TAG_PARAM: &'static str = "tag";

    fn id(entity: &Self::Entity) -> Self::Id;

    fn detail_path(id: &Self::Id) -> String {
        format!("{}/{id}", Self::PATH)
    }

    fn delete_route(id: &Self::Id) -> DeleteRoute {
        DeleteRoute::Delete(Self::detail_path(id))
    }

    /// Extracts the entity from a detail response body.
    fn unwrap_detail(body: Value) -> Option<Value> {
        Some(body)
    }

    /// Applies the set fields of `patch` to `entity`.
    fn merge(entity: &mut Self::Entity, patch: &Self::Patch) {
        merge_json(entity, patch);
    }

    /// Message used when the server gives none.
    fn fallback(op: Operation) -> String {
        match op {
            Operation::List => format!("Failed to fetch {}", Self::PLURAL),
            Operation::Detail => format!("Failed to fetch {}", Self::SINGULAR),
            Operation::Create => format!("Failed to create {}", Self::SINGULAR),
            Operation::Update => format!("Failed to update {}", Self::SINGULAR),
            Operation::Delete => format!("Failed to delete {}", Self::SINGULAR),
        }
    }
}

/// One page of a listing.
#[derive(Debug, Clone, PartialEq)]
pub struct Page<E> {
    pub items: Vec<E>,
    pub current_page: u32,
    pub total_pages: u32,
}

impl<E: DeserializeOwned> Page<E> {
    /// Parses `{ <list_key>: [...], currentPage, totalPages }`.
    ///
    /// A missing list is an empty page; missing or zero page numbers are 1.
    ///
    /// # Errors
    /// Returns a decode error if the body is not an object or an item does
    /// not match the entity schema.
    pub fn from_body(body: Value, list_key: &str) -> Result<Self, ApiError> {
        let Value::Object(mut map) = body else {
            return Err(ApiError::decode("Expected a JSON object for a list page"));
        };

        let items = match map.remove(list_key) {
            None | Some(Value::Null) => Vec::new(),
            Some(Value::Array(raw)) => raw
                .into_iter()
                .map(serde_json::from_value)
                .collect::<Result<Vec<E>, _>>()
                .map_err(|e| {
                    warn!(list_key, "list item does not match schema: {e}");
                    ApiError::decode(format!("Unexpected item in `{list_key}`: {e}"))
                })?,
            Some(other) => {
                return Err(ApiError::decode(format!(
                    "Expected `{list_key}` to be an array, got {other}"
                )));
            }
        };

        Ok(Self {
            items,
            current_page: page_number(map.get("currentPage")),
            total_pages: page_number(map.get("totalPages")),
        })
    }
}

fn page_number(value: Option<&Value>) -> u32 {
    let n = match value {
        Some(Value::Number(n)) => n.as_u64(),
        Some(Value::String(s)) => s.trim().parse().ok(),
        _ => None,
    };
    n.filter(|n| *n > 0)
        .map_or(1, |n| u32::try_from(n).unwrap_or(u32::MAX))
}

/// Inclusive date range. Only sent when both ends are set.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DateRange {
    pub start: Option<DateTime<Utc>>,
    pub end: Option<DateTime<Utc>>,
}

impl DateRange {
    pub fn new(start: DateTime<Utc>, end: DateTime<Utc>) -> Self {
        Self {
            start: Some(start),
            end: Some(end),
        }
    }
}

/// Current filter selection for a listing.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FilterSet {
    pub status: Option<String>,
    pub tags: Vec<String>,
    pub date_range: DateRange,
    pub text: Option<String>,
}

impl FilterSet {
    pub fn apply(&mut self, filter: Filter) {
        match filter {
            Filter::Status(status) => self.status = status,
            Filter::Tags(tags) => self.tags = tags,
            Filter::DateRange(range) => self.date_range = range,
            Filter::Text(text) => self.text = text,
        }
    }

    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

/// A change to one filter dimension.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Filter {
    Status(Option<String>),
    Tags(Vec<String>),
    DateRange(DateRange),
    Text(Option<String>),
}

/// Overlays the non-null fields of `patch` onto `entity` through JSON.
///
/// A patch that would make the entity invalid is logged and ignored.
pub fn merge_json<E, P>(entity: &mut E, patch: &P)
where
    E: Serialize + DeserializeOwned,
    P: Serialize + ?Sized,
{
    let (Ok(Value::Object(mut base)), Ok(Value::Object(overlay))) =
        (serde_json::to_value(&*entity), serde_json::to_value(patch))
    else {
        warn!("cannot merge non-object payloads");
        return;
    };
    for (key, value) in overlay {
        if !value.is_null() {
            base.insert(key, value);
        }
    }
    match serde_json::from_value(Value::Object(base)) {
        Ok(merged) => *entity = merged,
        Err(e) => warn!("merged entity does not match schema: {e}"),
    }
}

#[cfg(test)]
mod tests {
    use serde::Deserialize;
    use serde_json::json;

    use super::*;

    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    struct Row {
        id: u64,
        name: String,
        #[serde(default)]
        note: Option<String>,
    }

    #[test]
    fn test_page_from_body_defaults() {
        let page: Page<Row> = Page::from_body(json!({}), "rows").unwrap();
        assert!(page.items.is_empty());
        assert_eq!((page.current_page, page.total_pages), (1, 1));

        let page: Page<Row> = Page::from_body(
            json!({ "rows": [{ "id": 1, "name": "a" }], "currentPage": 0, "totalPages": "4" }),
            "rows",
        )
        .unwrap();
        assert_eq!(page.items.len(), 1);
        assert_eq!((page.current_page, page.total_pages), (1, 4));
    }

    #[test]
    fn test_page_from_body_rejects_bad_shapes() {
        assert!(Page::<Row>::from_body(json!([]), "rows").is_err());
        assert!(Page::<Row>::from_body(json!({ "rows": "nope" }), "rows").is_err());
        assert!(Page::<Row>::from_body(json!({ "rows": [{ "id": "x" }] }), "rows").is_err());
    }

    #[test]
    fn test_merge_json_skips_nulls_and_keeps_schema() {
        let mut row = Row {
            id: 1,
            name: "a".to_string(),
            note: Some("keep".to_string()),
        };
        merge_json(&mut row, &json!({ "name": "b", "note": null }));
        assert_eq!(row.name, "b");
        assert_eq!(row.note.as_deref(), Some("keep"));

        merge_json(&mut row, &json!({ "id": "not-a-number" }));
        assert_eq!(row.id, 1);
    }

    #[test]
    fn test_filter_apply_and_is_empty() {
        let mut filters = FilterSet::default();
        assert!(filters.is_empty());
        filters.apply(Filter::Status(Some("sent".to_string())));
        assert!(!filters.is_empty());
        filters.apply(Filter::Status(None));
        assert!(filters.is_empty());
    }
}
