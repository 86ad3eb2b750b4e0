use std::fmt;

use tracing::debug;

use super::request::{ListTicket, RequestId, RequestSeq, RequestState};
use super::{Filter, FilterSet, Page, Resource};
use crate::api::ListQuery;
use crate::error::FetchError;

/// Paginated list state.
#[derive(Debug, Clone, PartialEq)]
pub struct Collection<E> {
    pub items: Vec<E>,
    pub current_page: u32,
    pub total_pages: u32,
    pub is_loading: bool,
    pub last_error: Option<String>,
}

impl<E> Default for Collection<E> {
    fn default() -> Self {
        Self {
            items: Vec::new(),
            current_page: 1,
            total_pages: 1,
            is_loading: false,
            last_error: None,
        }
    }
}

/// Single-entity detail and edit state.
#[derive(Debug, Clone, PartialEq)]
pub struct EditState<E> {
    pub current: Option<E>,
    pub is_loading: bool,
    pub last_error: Option<String>,
}

impl<E> Default for EditState<E> {
    fn default() -> Self {
        Self {
            current: None,
            is_loading: false,
            last_error: None,
        }
    }
}

/// Cloned view of a slice for rendering.
#[derive(Debug, Clone, PartialEq)]
pub struct SliceSnapshot<E, X> {
    pub list: Collection<E>,
    pub edit: EditState<E>,
    pub filters: FilterSet,
    pub extras: X,
}

/// Reducer for one resource type. All transitions are synchronous.
pub struct SliceState<R: Resource> {
    pub list: Collection<R::Entity>,
    pub edit: EditState<R::Entity>,
    pub filters: FilterSet,
    pub extras: R::Extras,
    seq: RequestSeq,
    list_req: RequestState,
    detail_req: RequestState,
    pending_mutations: usize,
}

impl<R: Resource> Default for SliceState<R> {
    fn default() -> Self {
        Self {
            list: Collection::default(),
            edit: EditState::default(),
            filters: FilterSet::default(),
            extras: R::Extras::default(),
            seq: RequestSeq::default(),
            list_req: RequestState::default(),
            detail_req: RequestState::default(),
            pending_mutations: 0,
        }
    }
}

impl<R: Resource> fmt::Debug for SliceState<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SliceState")
            .field("resource", &R::PLURAL)
            .field("list", &self.list)
            .field("edit", &self.edit)
            .field("filters", &self.filters)
            .field("extras", &self.extras)
            .field("pending_mutations", &self.pending_mutations)
            .finish_non_exhaustive()
    }
}

impl<R: Resource> SliceState<R> {
    pub fn snapshot(&self) -> SliceSnapshot<R::Entity, R::Extras> {
        SliceSnapshot {
            list: self.list.clone(),
            edit: self.edit.clone(),
            filters: self.filters.clone(),
            extras: self.extras.clone(),
        }
    }

    // ---- list ----

    /// Starts a list request for `page` under the current filters.
    /// Supersedes any list request still in flight.
    pub fn begin_list(&mut self, page: u32) -> ListTicket {
        let id = self.seq.next_id();
        self.list_req.on_started(id);
        self.list.current_page = page.max(1);
        self.list.is_loading = true;
        self.list.last_error = None;
        ListTicket {
            id,
            page: self.list.current_page,
            filters: self.filters.clone(),
            query: ListQuery::build(self.list.current_page, &self.filters, R::TAG_PARAM),
        }
    }

    /// Applies a list result if `ticket` is still the active list request
    /// and the selection has not changed since it was issued.
    pub fn finish_list(
        &mut self,
        ticket: &ListTicket,
        result: Result<Page<R::Entity>, FetchError>,
    ) -> bool {
        if !self.list_req.finish_if_active(ticket.id) {
            debug!(resource = R::PLURAL, request = ticket.id.0, "discarding stale list response");
            return false;
        }
        self.list.is_loading = false;
        if !ticket.matches(self.list.current_page, &self.filters) {
            debug!(resource = R::PLURAL, request = ticket.id.0, "discarding list response for an old selection");
            return false;
        }
        match result {
            Ok(page) => {
                self.list.items = page.items;
                self.list.current_page = page.current_page;
                self.list.total_pages = page.total_pages;
            }
            Err(err) => self.list.last_error = Some(err.message),
        }
        true
    }

    pub fn is_list_pending(&self) -> bool {
        self.list_req.is_running()
    }

    /// Records a failure outside the list lifecycle (e.g. auxiliary lookups).
    pub fn set_list_error(&mut self, message: impl Into<String>) {
        self.list.last_error = Some(message.into());
    }

    // ---- detail ----

    pub fn begin_detail(&mut self) -> RequestId {
        let id = self.seq.next_id();
        self.detail_req.on_started(id);
        self.edit.last_error = None;
        self.sync_edit_loading();
        id
    }

    pub fn finish_detail(&mut self, id: RequestId, result: Result<R::Entity, FetchError>) -> bool {
        if !self.detail_req.finish_if_active(id) {
            debug!(resource = R::PLURAL, request = id.0, "discarding stale detail response");
            return false;
        }
        match result {
            Ok(entity) => self.edit.current = Some(entity),
            Err(err) => self.edit.last_error = Some(err.message),
        }
        self.sync_edit_loading();
        true
    }

    // ---- mutations ----

    pub fn begin_mutation(&mut self) {
        self.pending_mutations += 1;
        self.edit.last_error = None;
        self.sync_edit_loading();
    }

    pub fn mutation_failed(&mut self, message: impl Into<String>) {
        self.edit.last_error = Some(message.into());
        self.end_mutation();
    }

    /// Prepends `entity` when page 1 is showing; otherwise the list is left alone.
    pub fn created(&mut self, entity: R::Entity) {
        if self.list.current_page == 1 {
            self.list.items.insert(0, entity);
        }
        self.end_mutation();
    }

    /// Merges `patch` into the matching list entry and the edit target.
    ///
    /// Returns the merged entity, preferring the edit target.
    pub fn updated(&mut self, id: &R::Id, patch: &R::Patch) -> Option<R::Entity> {
        let mut merged = None;
        if let Some(item) = self.list.items.iter_mut().find(|e| R::id(e) == *id) {
            R::merge(item, patch);
            merged = Some(item.clone());
        }
        if let Some(current) = self.edit.current.as_mut().filter(|e| R::id(e) == *id) {
            R::merge(current, patch);
            merged = Some(current.clone());
        }
        self.end_mutation();
        merged
    }

    /// Removes `id` from the list and clears the edit target if it is `id`.
    pub fn deleted(&mut self, id: &R::Id) {
        self.list.items.retain(|e| R::id(e) != *id);
        if self.edit.current.as_ref().is_some_and(|e| R::id(e) == *id) {
            self.edit.current = None;
        }
        self.end_mutation();
    }

    fn end_mutation(&mut self) {
        self.pending_mutations = self.pending_mutations.saturating_sub(1);
        self.sync_edit_loading();
    }

    fn sync_edit_loading(&mut self) {
        self.edit.is_loading = self.detail_req.is_running() || self.pending_mutations > 0;
    }

    // ---- local reducers ----

    // Selection changes supersede any list request in flight.

    pub fn set_page(&mut self, page: u32) {
        self.list.current_page = page.max(1);
        self.abandon_list();
    }

    /// Changes one filter dimension and returns to page 1.
    pub fn set_filter(&mut self, filter: Filter) {
        self.filters.apply(filter);
        self.list.current_page = 1;
        self.abandon_list();
    }

    pub fn reset_filters(&mut self) {
        self.filters = FilterSet::default();
        self.list.current_page = 1;
        self.abandon_list();
    }

    fn abandon_list(&mut self) {
        self.list_req.clear();
        self.list.is_loading = false;
    }

    pub fn clear_error(&mut self) {
        self.list.last_error = None;
        self.edit.last_error = None;
    }

    /// Drops the edit target. A detail fetch still in flight is discarded.
    pub fn clear_current(&mut self) {
        self.edit.current = None;
        self.detail_req.clear();
        self.sync_edit_loading();
    }
}

#[cfg(test)]
mod tests {
    use serde::{Deserialize, Serialize};

    use super::*;
    use crate::api::ApiError;
    use crate::slice::DateRange;

    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    struct Note {
        id: u64,
        title: String,
    }

    #[derive(Debug, Serialize)]
    struct NotePatch {
        #[serde(skip_serializing_if = "Option::is_none")]
        title: Option<String>,
    }

    struct Notes;

    impl Resource for Notes {
        type Entity = Note;
        type Id = u64;
        type Draft = Note;
        type Patch = NotePatch;
        type Extras = ();

        const SINGULAR: &'static str = "note";
        const PLURAL: &'static str = "notes";
        const PATH: &'static str = "/notes";
        const LIST_KEY: &'static str = "notes";

        fn id(entity: &Note) -> u64 {
            entity.id
        }
    }

    fn note(id: u64) -> Note {
        Note {
            id,
            title: format!("note {id}"),
        }
    }

    fn page(ids: &[u64], current_page: u32) -> Page<Note> {
        Page {
            items: ids.iter().copied().map(note).collect(),
            current_page,
            total_pages: 5,
        }
    }

    fn loaded(ids: &[u64], current_page: u32) -> SliceState<Notes> {
        let mut state = SliceState::<Notes>::default();
        let ticket = state.begin_list(current_page);
        assert!(state.finish_list(&ticket, Ok(page(ids, current_page))));
        state
    }

    #[test]
    fn test_last_initiated_list_wins() {
        let mut state = SliceState::<Notes>::default();
        let a = state.begin_list(1);
        let b = state.begin_list(2);

        assert!(state.finish_list(&b, Ok(page(&[20, 21], 2))));
        assert!(!state.finish_list(&a, Ok(page(&[10, 11], 1))));

        assert_eq!(state.list.current_page, 2);
        assert_eq!(state.list.items, vec![note(20), note(21)]);
        assert!(!state.list.is_loading);
    }

    #[test]
    fn test_stale_response_leaves_loading_to_newer_request() {
        let mut state = SliceState::<Notes>::default();
        let a = state.begin_list(1);
        let _b = state.begin_list(2);
        assert!(!state.finish_list(&a, Ok(page(&[1], 1))));
        assert!(state.list.is_loading);
        assert!(state.list.items.is_empty());
    }

    #[test]
    fn test_list_failure_keeps_items() {
        let mut state = loaded(&[1, 2], 1);
        let ticket = state.begin_list(2);
        let err = FetchError::from_api(ApiError::timeout("slow"), "Failed to fetch notes");
        assert!(state.finish_list(&ticket, Err(err)));
        assert_eq!(state.list.items.len(), 2);
        assert_eq!(state.list.last_error.as_deref(), Some("Failed to fetch notes"));
    }

    #[test]
    fn test_set_filter_always_resets_page() {
        let filters = [
            Filter::Status(Some("sent".to_string())),
            Filter::Tags(vec!["vip".to_string()]),
            Filter::DateRange(DateRange::default()),
            Filter::Text(Some("promo".to_string())),
        ];
        for filter in filters {
            let mut state = loaded(&[1], 3);
            assert_eq!(state.list.current_page, 3);
            state.set_filter(filter);
            assert_eq!(state.list.current_page, 1);
        }
    }

    #[test]
    fn test_filter_change_discards_inflight_list() {
        let mut state = loaded(&[1, 2], 1);
        let ticket = state.begin_list(3);
        state.set_filter(Filter::Status(Some("sent".to_string())));
        assert!(!state.list.is_loading);

        assert!(!state.finish_list(&ticket, Ok(page(&[30, 31], 3))));
        assert_eq!(state.list.current_page, 1);
        assert_eq!(state.list.items, vec![note(1), note(2)]);
        assert_eq!(state.filters.status.as_deref(), Some("sent"));
    }

    #[test]
    fn test_page_change_discards_inflight_list() {
        let mut state = SliceState::<Notes>::default();
        let ticket = state.begin_list(2);
        state.set_page(4);
        assert!(!state.finish_list(&ticket, Ok(page(&[20], 2))));
        assert_eq!(state.list.current_page, 4);
        assert!(state.list.items.is_empty());
        assert!(!state.is_list_pending());
    }

    #[test]
    fn test_reset_filters_discards_inflight_list() {
        let mut state = SliceState::<Notes>::default();
        state.set_filter(Filter::Text(Some("promo".to_string())));
        let ticket = state.begin_list(1);
        state.reset_filters();
        assert!(!state.finish_list(&ticket, Ok(page(&[5], 1))));
        assert!(state.list.items.is_empty());
    }

    #[test]
    fn test_reset_filters() {
        let mut state = loaded(&[1], 4);
        state.set_filter(Filter::Text(Some("x".to_string())));
        state.set_page(4);
        state.reset_filters();
        assert!(state.filters.is_empty());
        assert_eq!(state.list.current_page, 1);
    }

    #[test]
    fn test_create_prepends_only_on_first_page() {
        let mut state = loaded(&[1, 2], 1);
        state.begin_mutation();
        state.created(note(9));
        assert_eq!(state.list.items[0], note(9));
        assert_eq!(state.list.items.len(), 3);

        let mut state = loaded(&[1, 2], 2);
        state.begin_mutation();
        state.created(note(9));
        assert_eq!(state.list.items, vec![note(1), note(2)]);
        assert!(!state.edit.is_loading);
    }

    #[test]
    fn test_update_merges_both_targets() {
        let mut state = loaded(&[1, 2], 1);
        state.edit.current = Some(note(2));
        state.begin_mutation();
        let merged = state.updated(
            &2,
            &NotePatch {
                title: Some("renamed".to_string()),
            },
        );
        assert_eq!(merged.unwrap().title, "renamed");
        assert_eq!(state.list.items[1].title, "renamed");
        assert_eq!(state.edit.current.as_ref().unwrap().title, "renamed");
        assert_eq!(state.list.items[0].title, "note 1");
    }

    #[test]
    fn test_update_without_targets_returns_none() {
        let mut state = loaded(&[1], 1);
        state.begin_mutation();
        let merged = state.updated(&7, &NotePatch { title: None });
        assert!(merged.is_none());
        assert_eq!(state.list.items, vec![note(1)]);
    }

    #[test]
    fn test_delete_only_clears_matching_edit_state() {
        let mut state = loaded(&[1, 2, 3], 1);
        state.edit.current = Some(note(3));
        state.begin_mutation();
        state.deleted(&2);
        assert_eq!(state.list.items, vec![note(1), note(3)]);
        assert_eq!(state.edit.current, Some(note(3)));

        state.begin_mutation();
        state.deleted(&3);
        assert_eq!(state.list.items, vec![note(1)]);
        assert_eq!(state.edit.current, None);
    }

    #[test]
    fn test_overlapping_mutations_keep_loading_until_last() {
        let mut state = SliceState::<Notes>::default();
        state.begin_mutation();
        state.begin_mutation();
        state.mutation_failed("Failed to update note");
        assert!(state.edit.is_loading);
        state.deleted(&1);
        assert!(!state.edit.is_loading);
        assert_eq!(state.edit.last_error.as_deref(), Some("Failed to update note"));
    }

    #[test]
    fn test_detail_is_independent_of_list() {
        let mut state = loaded(&[1], 1);
        let id = state.begin_detail();
        assert!(state.edit.is_loading);
        assert!(!state.list.is_loading);
        assert!(state.finish_detail(id, Ok(note(1))));
        assert_eq!(state.edit.current, Some(note(1)));
        assert!(!state.edit.is_loading);
    }

    #[test]
    fn test_clear_current_discards_inflight_detail() {
        let mut state = SliceState::<Notes>::default();
        let id = state.begin_detail();
        state.clear_current();
        assert!(!state.finish_detail(id, Ok(note(1))));
        assert_eq!(state.edit.current, None);
        assert!(!state.edit.is_loading);
    }
}
